//! PostgreSQL store: tables introspected from information_schema, CRUD through the SQL builder.

use super::{FindMany, Record, Store, Where};
use crate::config::{FieldDescriptor, FieldType};
use crate::error::StoreError;
use crate::sql::{self, ColumnInfo, PgBindValue, QueryBuf, TableInfo};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

const INTROSPECT_SQL: &str = r#"
SELECT
    c.column_name::text AS column_name,
    c.udt_schema::text AS udt_schema,
    c.udt_name::text AS udt_name,
    c.data_type::text AS data_type,
    c.is_nullable::text AS is_nullable,
    c.column_default::text AS column_default,
    (c.is_identity::text = 'YES') AS is_identity,
    EXISTS (
        SELECT 1
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage k
          ON tc.constraint_name = k.constraint_name
         AND tc.table_schema = k.table_schema
         AND tc.table_name = k.table_name
        WHERE tc.constraint_type = 'PRIMARY KEY'
          AND tc.table_schema = c.table_schema
          AND tc.table_name = c.table_name
          AND k.column_name = c.column_name
    ) AS is_pk
FROM information_schema.columns c
WHERE c.table_schema = $1 AND c.table_name = $2
ORDER BY c.ordinal_position
"#;

/// Entity names map verbatim to table names in `schema`.
pub struct PgStore {
    pool: PgPool,
    schema: String,
    tables: RwLock<HashMap<String, Arc<TableInfo>>>,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self::with_schema(pool, "public")
    }

    pub fn with_schema(pool: PgPool, schema: impl Into<String>) -> Self {
        PgStore {
            pool,
            schema: schema.into(),
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Cached table description; introspected on first use.
    async fn table(&self, entity: &str) -> Result<Arc<TableInfo>, StoreError> {
        let cached = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity)
            .cloned();
        if let Some(t) = cached {
            return Ok(t);
        }
        let table = Arc::new(self.introspect(entity).await?);
        let mut guard = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let table = guard.entry(entity.to_string()).or_insert(table).clone();
        Ok(table)
    }

    async fn introspect(&self, entity: &str) -> Result<TableInfo, StoreError> {
        tracing::debug!(schema = %self.schema, table = %entity, "introspect");
        let rows = sqlx::query(INTROSPECT_SQL)
            .bind(&self.schema)
            .bind(entity)
            .fetch_all(&self.pool)
            .await?;
        if rows.is_empty() {
            return Err(StoreError::UnknownEntity(entity.to_string()));
        }
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            use sqlx::Row;
            let data_type: String = row.try_get("data_type")?;
            let udt_schema: String = row.try_get("udt_schema")?;
            let udt_name: String = row.try_get("udt_name")?;
            let pg_type = if data_type == "USER-DEFINED" {
                format!("{}.{}", udt_schema, udt_name)
            } else {
                udt_name
            };
            let is_nullable: String = row.try_get("is_nullable")?;
            let column_default: Option<String> = row.try_get("column_default")?;
            let is_identity: bool = row.try_get("is_identity")?;
            columns.push(ColumnInfo {
                name: row.try_get("column_name")?,
                pg_type,
                nullable: is_nullable == "YES",
                has_default: column_default.is_some() || is_identity,
                is_pk: row.try_get("is_pk")?,
            });
        }
        Ok(TableInfo {
            schema: self.schema.clone(),
            name: entity.to_string(),
            columns,
        })
    }

    async fn query_many(&self, q: &QueryBuf) -> Result<Vec<Record>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = PgBindValue::from_json(p).bind(query);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(map_db_error)?;
        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn query_optional(&self, q: &QueryBuf) -> Result<Option<Record>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = PgBindValue::from_json(p).bind(query);
        }
        let row = query.fetch_optional(&self.pool).await.map_err(map_db_error)?;
        Ok(row.map(|r| row_to_record(&r)))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_many(&self, entity: &str, args: FindMany) -> Result<Vec<Record>, StoreError> {
        let table = self.table(entity).await?;
        self.query_many(&sql::select_list(&table, args.select.as_deref(), args.skip, args.take)).await
    }

    async fn find_unique(&self, entity: &str, by: &Where) -> Result<Option<Record>, StoreError> {
        let table = self.table(entity).await?;
        self.query_optional(&sql::select_by(&table, by)).await
    }

    async fn create(&self, entity: &str, data: Record) -> Result<Record, StoreError> {
        let table = self.table(entity).await?;
        self.query_optional(&sql::insert(&table, &data))
            .await?
            .ok_or(StoreError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(&self, entity: &str, by: &Where, data: Record) -> Result<Option<Record>, StoreError> {
        let table = self.table(entity).await?;
        self.query_optional(&sql::update(&table, by, &data)).await
    }

    async fn delete(&self, entity: &str, by: &Where) -> Result<Option<Record>, StoreError> {
        let table = self.table(entity).await?;
        self.query_optional(&sql::delete(&table, by)).await
    }

    async fn model_fields(&self, entity: &str) -> Result<Vec<FieldDescriptor>, StoreError> {
        let table = self.table(entity).await?;
        Ok(table.columns.iter().map(column_to_field).collect())
    }
}

/// Unique/foreign-key/not-null/check violations become `Constraint`; everything else stays `Db`.
fn map_db_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().map(|c| c.starts_with("23")).unwrap_or(false) {
            return StoreError::Constraint(db.message().to_string());
        }
    }
    StoreError::Db(e)
}

fn column_to_field(c: &ColumnInfo) -> FieldDescriptor {
    FieldDescriptor {
        name: c.name.clone(),
        field_type: pg_field_type(&c.pg_type),
        is_required: !c.nullable,
        has_default: c.has_default,
        is_id: c.is_pk,
    }
}

fn pg_field_type(udt: &str) -> FieldType {
    match udt {
        "int2" | "int4" => FieldType::Int,
        "int8" => FieldType::BigInt,
        "float4" | "float8" => FieldType::Float,
        "numeric" => FieldType::Decimal,
        "text" | "varchar" | "bpchar" | "citext" | "uuid" => FieldType::String,
        "bool" => FieldType::Boolean,
        "timestamp" | "timestamptz" | "date" | "time" | "timetz" => FieldType::DateTime,
        "json" | "jsonb" => FieldType::Json,
        "bytea" => FieldType::Bytes,
        other => FieldType::Other(other.to_string()),
    }
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> Record {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = Record::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &sqlx::postgres::PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i16>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(u)) = row.try_get::<Option<uuid::Uuid>, _>(name) {
        return Value::String(u.to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn udt_names_map_to_field_types() {
        assert_eq!(pg_field_type("int4"), FieldType::Int);
        assert_eq!(pg_field_type("int8"), FieldType::BigInt);
        assert_eq!(pg_field_type("uuid"), FieldType::String);
        assert_eq!(pg_field_type("timestamptz"), FieldType::DateTime);
        assert_eq!(pg_field_type("public.mood"), FieldType::Other("public.mood".into()));
    }

    #[test]
    fn nullable_and_defaulted_columns_are_not_required() {
        let serial = ColumnInfo {
            name: "id".into(),
            pg_type: "int4".into(),
            nullable: false,
            has_default: true,
            is_pk: true,
        };
        let f = column_to_field(&serial);
        assert!(f.is_id);
        assert!(f.field_type.is_integer());
        assert!(!f.is_schema_required());

        let bio = ColumnInfo {
            name: "bio".into(),
            pg_type: "text".into(),
            nullable: true,
            has_default: false,
            is_pk: false,
        };
        assert!(!column_to_field(&bio).is_schema_required());
    }
}
