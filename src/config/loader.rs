//! Load entity schemas from a JSON file.
//!
//! File shape: `{ "User": [ { "name": "id", "type": "Int", "is_id": true, "has_default": true }, ... ] }`.

use crate::config::types::{EntitySchema, FieldDescriptor};
use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::Path;

/// Parse schemas from a JSON string. Entities with no fields are rejected.
pub fn parse_schemas(raw: &str) -> Result<Vec<EntitySchema>, ConfigError> {
    let by_entity: HashMap<String, Vec<FieldDescriptor>> =
        serde_json::from_str(raw).map_err(|e| ConfigError::Load(e.to_string()))?;
    let mut schemas = Vec::with_capacity(by_entity.len());
    for (entity, fields) in by_entity {
        if fields.is_empty() {
            return Err(ConfigError::Load(format!("entity '{}' declares no fields", entity)));
        }
        let ids = fields.iter().filter(|f| f.is_id).count();
        if ids > 1 {
            return Err(ConfigError::Load(format!(
                "entity '{}' declares {} identifier fields",
                entity, ids
            )));
        }
        schemas.push(EntitySchema::new(entity, fields));
    }
    schemas.sort_by(|a, b| a.entity.cmp(&b.entity));
    Ok(schemas)
}

/// Read and parse a schema file.
pub async fn load_schemas(path: impl AsRef<Path>) -> Result<Vec<EntitySchema>, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let schemas = parse_schemas(&raw)?;
    tracing::info!(path = %path.display(), entities = schemas.len(), "loaded schemas");
    Ok(schemas)
}
