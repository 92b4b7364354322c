//! Example consumer: serves a `users` resource backed by Postgres or an in-memory store.
//!
//! Run from repo root: `SCHEMA_PATH=example_consumer/schema.json cargo run -p example-consumer`
//! Without DATABASE_URL the entities in SCHEMA_PATH are served from memory.

use axum::Router;
use resource_sdk::{
    common_routes, load_schemas, resource_routes, rules, FieldCatalog, MemoryStore, Model, PgStore, ResourceView,
    ServerConfig, Store, ValidationError, ViewConfig,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;

const BODY_LIMIT: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("resource_sdk=info")),
        )
        .init();

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await?;
            Arc::new(PgStore::with_schema(pool, config.pg_schema.clone()))
        }
        None => {
            let schemas = load_schemas(&config.schema_path).await?;
            Arc::new(MemoryStore::from_schemas(schemas))
        }
    };
    let catalog = FieldCatalog::new(store);

    let users = Model::builder("User")
        .fields(["id", "name", "email", "created_at"])
        .required(["name", "email"])
        .validate(|record| {
            if record.get("name") == record.get("email") {
                return Err(ValidationError::rejected("name and email must differ"));
            }
            Ok(())
        })
        .field_rule("email", rules::email())
        .field_rule("name", rules::max_length(80))
        .build(&catalog)
        .await?;
    let users = ResourceView::with_config(Arc::new(users), ViewConfig::default().with_id_param("userId"));

    let app = Router::new()
        .merge(common_routes())
        .merge(resource_routes("users", users))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT));

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
