//! Host settings read from the environment (after `.env` via dotenvy).

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Postgres connection string. When unset the host runs on an in-memory store.
    pub database_url: Option<String>,
    /// Postgres schema holding entity tables.
    pub pg_schema: String,
    /// JSON schema file used to seed the in-memory store.
    pub schema_path: PathBuf,
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `DATABASE_URL`, `PG_SCHEMA`, `SCHEMA_PATH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".into());
        let bind_addr = bind.parse().map_err(|_| ConfigError::InvalidSetting {
            key: "BIND_ADDR",
            value: bind.clone(),
        })?;
        let pg_schema = lookup("PG_SCHEMA").unwrap_or_else(|| "public".into());
        if pg_schema.is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "PG_SCHEMA",
                value: pg_schema,
            });
        }
        Ok(ServerConfig {
            bind_addr,
            database_url: lookup("DATABASE_URL").filter(|s| !s.trim().is_empty()),
            pg_schema,
            schema_path: lookup("SCHEMA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("schema.json")),
        })
    }
}
