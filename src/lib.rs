//! Resource SDK: declarative CRUD resources over an injected store.
//!
//! Describe an entity with a [`ModelBuilder`], wrap it in a [`ResourceView`], and mount
//! [`resource_routes`] to get list/create/retrieve/update/destroy endpoints with field
//! filtering and aggregated validation.

pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod views;

pub use catalog::FieldCatalog;
pub use config::{load_schemas, EntitySchema, FieldDescriptor, FieldType, ServerConfig, ViewConfig};
pub use error::{AppError, ConfigError, FieldError, StoreError, ValidationError};
pub use model::{ListOptions, Model, ModelBuilder};
pub use response::ListPage;
pub use routes::{common_routes, resource_routes};
pub use service::{rules, ValidationReport};
pub use state::ResourceView;
pub use store::{FindMany, MemoryStore, PgStore, Record, Store, Where};
pub use views::{Creator, Destroyer, ListQuery, Lister, Retriever, Updater};
