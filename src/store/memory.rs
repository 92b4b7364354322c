//! In-process store: one ordered row list per entity.

use super::{FindMany, Record, Store, Where};
use crate::config::{EntitySchema, FieldDescriptor};
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct Table {
    fields: Vec<FieldDescriptor>,
    rows: Vec<Record>,
    next_id: i64,
}

impl Table {
    fn id_field(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.is_id)
    }

    fn position(&self, by: &Where) -> Option<usize> {
        self.rows.iter().position(|r| r.get(&by.field) == Some(&by.value))
    }
}

/// Rows live in memory for the life of the store. Integer identifiers with a default
/// are assigned from a per-entity counter when the create payload omits them.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity. Re-registering replaces its schema and drops its rows.
    pub fn with_entity(mut self, entity: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        self.tables.get_mut().insert(
            entity.into(),
            Table {
                fields,
                rows: Vec::new(),
                next_id: 1,
            },
        );
        self
    }

    pub fn from_schemas(schemas: Vec<EntitySchema>) -> Self {
        schemas
            .into_iter()
            .fold(Self::new(), |store, s| store.with_entity(s.entity, s.fields))
    }
}

fn unknown(entity: &str) -> StoreError {
    StoreError::UnknownEntity(entity.to_string())
}

fn duplicate(entity: &str, field: &str) -> StoreError {
    StoreError::Constraint(format!("unique constraint failed on {}.{}", entity, field))
}

fn out_of_range(entity: &str, field: &str) -> StoreError {
    StoreError::Constraint(format!("{}.{} is out of range", entity, field))
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_many(&self, entity: &str, args: FindMany) -> Result<Vec<Record>, StoreError> {
        let tables = self.tables.read().await;
        let table = tables.get(entity).ok_or_else(|| unknown(entity))?;
        let skip = args.skip.unwrap_or(0) as usize;
        let take = args.take.map(|n| n as usize).unwrap_or(usize::MAX);
        let page = table.rows.iter().skip(skip).take(take);
        Ok(match &args.select {
            Some(fields) => page
                .map(|row| {
                    row.iter()
                        .filter(|(k, _)| fields.contains(*k))
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect()
                })
                .collect(),
            None => page.cloned().collect(),
        })
    }

    async fn find_unique(&self, entity: &str, by: &Where) -> Result<Option<Record>, StoreError> {
        let tables = self.tables.read().await;
        let table = tables.get(entity).ok_or_else(|| unknown(entity))?;
        Ok(table.position(by).map(|i| table.rows[i].clone()))
    }

    async fn create(&self, entity: &str, mut data: Record) -> Result<Record, StoreError> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(entity).ok_or_else(|| unknown(entity))?;
        if let Some(id) = table.id_field().cloned() {
            match data.get(&id.name).cloned() {
                Some(value) => {
                    let by = Where::new(id.name.clone(), value.clone());
                    if table.position(&by).is_some() {
                        return Err(duplicate(entity, &id.name));
                    }
                    if let Some(n) = value.as_i64() {
                        let next = n.checked_add(1).ok_or_else(|| out_of_range(entity, &id.name))?;
                        table.next_id = table.next_id.max(next);
                    }
                }
                None if id.field_type.is_integer() && id.has_default => {
                    let next = table
                        .next_id
                        .checked_add(1)
                        .ok_or_else(|| out_of_range(entity, &id.name))?;
                    data.insert(id.name.clone(), Value::from(table.next_id));
                    table.next_id = next;
                }
                None => {}
            }
        }
        table.rows.push(data.clone());
        Ok(data)
    }

    async fn update(&self, entity: &str, by: &Where, data: Record) -> Result<Option<Record>, StoreError> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(entity).ok_or_else(|| unknown(entity))?;
        let Some(i) = table.position(by) else {
            return Ok(None);
        };
        if let Some(id) = table.id_field() {
            if let Some(value) = data.get(&id.name) {
                let target = Where::new(id.name.clone(), value.clone());
                if table.position(&target).is_some_and(|j| j != i) {
                    return Err(duplicate(entity, &id.name));
                }
            }
        }
        let row = &mut table.rows[i];
        row.extend(data);
        Ok(Some(row.clone()))
    }

    async fn delete(&self, entity: &str, by: &Where) -> Result<Option<Record>, StoreError> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(entity).ok_or_else(|| unknown(entity))?;
        Ok(table.position(by).map(|i| table.rows.remove(i)))
    }

    async fn model_fields(&self, entity: &str) -> Result<Vec<FieldDescriptor>, StoreError> {
        let tables = self.tables.read().await;
        let table = tables.get(entity).ok_or_else(|| unknown(entity))?;
        Ok(table.fields.clone())
    }
}
