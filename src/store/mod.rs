//! Persistence collaborator contract and its implementations.

mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

use crate::config::FieldDescriptor;
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;

/// Raw record as returned by a store, or a request payload.
pub type Record = serde_json::Map<String, Value>;

/// Offset/limit and projection for `find_many`. `None` means unbounded, or every field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FindMany {
    pub skip: Option<u64>,
    pub take: Option<u64>,
    /// Fields to return. Names the entity does not have are ignored.
    pub select: Option<Vec<String>>,
}

/// Single-field equality lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct Where {
    pub field: String,
    pub value: Value,
}

impl Where {
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Where {
            field: field.into(),
            value,
        }
    }
}

/// Data access keyed by entity name. Each method is one round trip.
///
/// Missing rows are `Ok(None)`, never an error.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_many(&self, entity: &str, args: FindMany) -> Result<Vec<Record>, StoreError>;

    async fn find_unique(&self, entity: &str, by: &Where) -> Result<Option<Record>, StoreError>;

    async fn create(&self, entity: &str, data: Record) -> Result<Record, StoreError>;

    async fn update(&self, entity: &str, by: &Where, data: Record) -> Result<Option<Record>, StoreError>;

    async fn delete(&self, entity: &str, by: &Where) -> Result<Option<Record>, StoreError>;

    /// Ordered field descriptors of `entity`. Unknown entity is `StoreError::UnknownEntity`.
    async fn model_fields(&self, entity: &str) -> Result<Vec<FieldDescriptor>, StoreError>;
}
