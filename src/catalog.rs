//! Field catalog: per-entity schema introspected from the store once, then cached.

use crate::config::{EntitySchema, FieldDescriptor};
use crate::error::{AppError, StoreError};
use crate::store::Store;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Schemas are assumed immutable for the life of the process.
pub struct FieldCatalog {
    store: Arc<dyn Store>,
    cache: RwLock<HashMap<String, Arc<EntitySchema>>>,
}

impl FieldCatalog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        FieldCatalog {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub async fn schema(&self, entity: &str) -> Result<Arc<EntitySchema>, AppError> {
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity)
            .cloned();
        if let Some(schema) = cached {
            return Ok(schema);
        }
        let fields = self.store.model_fields(entity).await.map_err(|e| match e {
            StoreError::UnknownEntity(_) => AppError::unknown_entity(entity),
            other => AppError::Persistence(other),
        })?;
        if fields.is_empty() {
            return Err(AppError::unknown_entity(entity));
        }
        tracing::debug!(entity = %entity, fields = fields.len(), "schema cached");
        let schema = Arc::new(EntitySchema::new(entity, fields));
        let mut guard = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let schema = guard.entry(entity.to_string()).or_insert(schema).clone();
        Ok(schema)
    }

    pub async fn all_fields(&self, entity: &str) -> Result<Vec<FieldDescriptor>, AppError> {
        Ok(self.schema(entity).await?.fields.clone())
    }

    /// Schema-required fields plus `declared`, without duplicates.
    pub async fn required_fields(&self, entity: &str, declared: &[String]) -> Result<Vec<String>, AppError> {
        Ok(self.schema(entity).await?.required_fields(declared))
    }

    pub async fn field_detail(&self, entity: &str, name: &str) -> Result<FieldDescriptor, AppError> {
        self.schema(entity)
            .await?
            .field(name)
            .cloned()
            .ok_or_else(|| AppError::unknown_field(entity, name))
    }
}
