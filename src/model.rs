//! Declarative entity model: output projection, input filtering, validation and
//! store-backed CRUD for one entity.
//!
//! A `Model` is built once per registered resource and shared by every request,
//! so it holds no per-call state; validation results are returned, not stored.

use crate::catalog::FieldCatalog;
use crate::config::{EntitySchema, FieldType};
use crate::error::{AppError, ValidationError};
use crate::service::{FieldValidator, RecordValidator, ValidationReport, Validator};
use crate::store::{FindMany, Record, Store, Where};
use serde_json::Value;
use std::sync::Arc;

pub const DEFAULT_IDENTIFIER_FIELD: &str = "id";

/// Offset/limit as requested by a caller; negative `skip` is clamped to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub skip: Option<i64>,
    pub take: Option<u64>,
}

pub struct Model {
    entity_name: String,
    schema: Arc<EntitySchema>,
    exposed_fields: Vec<String>,
    identifier_field: String,
    validator: Validator,
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("entity_name", &self.entity_name)
            .field("exposed_fields", &self.exposed_fields)
            .field("required_fields", &self.validator.required())
            .field("identifier_field", &self.identifier_field)
            .finish()
    }
}

impl Model {
    pub fn builder(entity_name: impl Into<String>) -> ModelBuilder {
        ModelBuilder::new(entity_name)
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn exposed_fields(&self) -> &[String] {
        &self.exposed_fields
    }

    pub fn required_fields(&self) -> &[String] {
        self.validator.required()
    }

    pub fn identifier_field(&self) -> &str {
        &self.identifier_field
    }

    /// Keep only exposed fields present in `record`. Absent keys are skipped, not null-filled.
    pub fn serialize(&self, record: &Record) -> Record {
        self.exposed_fields
            .iter()
            .filter_map(|f| record.get(f).map(|v| (f.clone(), v.clone())))
            .collect()
    }

    /// Keep only keys declared in the schema, whether exposed or not.
    pub fn deserialize(&self, payload: &Record) -> Record {
        self.schema
            .fields
            .iter()
            .filter_map(|f| payload.get(&f.name).map(|v| (f.name.clone(), v.clone())))
            .collect()
    }

    /// Run every rule against `payload` and return the full report.
    pub fn validate_all(&self, payload: &Record) -> Result<ValidationReport, AppError> {
        self.validator.validate(payload)
    }

    /// Convert a path id to the identifier field's declared type.
    pub fn coerce_id(&self, id: &str) -> Result<Value, AppError> {
        let field = self
            .schema
            .field(&self.identifier_field)
            .ok_or_else(|| AppError::unknown_field(&self.entity_name, &self.identifier_field))?;
        let invalid = |_: std::num::ParseIntError| AppError::InvalidIdentifier(id.to_string());
        match field.field_type {
            FieldType::Int => id.trim().parse::<i32>().map(Value::from).map_err(invalid),
            FieldType::BigInt => id.trim().parse::<i64>().map(Value::from).map_err(invalid),
            _ => Ok(Value::String(id.to_string())),
        }
    }

    fn lookup(&self, id: &str) -> Result<Where, AppError> {
        Ok(Where::new(self.identifier_field.clone(), self.coerce_id(id)?))
    }

    fn not_found(&self, id: &str) -> AppError {
        AppError::NotFound(format!("{} {}", self.entity_name, id))
    }

    pub async fn list(&self, options: ListOptions) -> Result<Vec<Record>, AppError> {
        let args = FindMany {
            skip: options.skip.filter(|n| *n != 0).map(|n| n.max(0) as u64),
            take: options.take.filter(|n| *n > 0),
            select: Some(self.exposed_fields.clone()),
        };
        tracing::debug!(entity = %self.entity_name, skip = ?args.skip, take = ?args.take, "list");
        let rows = self.store.find_many(&self.entity_name, args).await?;
        Ok(rows.iter().map(|r| self.serialize(r)).collect())
    }

    pub async fn create(&self, payload: &Record) -> Result<Record, AppError> {
        let data = self.deserialize(payload);
        tracing::debug!(entity = %self.entity_name, fields = data.len(), "create");
        let row = self.store.create(&self.entity_name, data).await?;
        Ok(self.serialize(&row))
    }

    pub async fn retrieve(&self, id: &str) -> Result<Record, AppError> {
        let by = self.lookup(id)?;
        tracing::debug!(entity = %self.entity_name, id = %id, "retrieve");
        let row = self
            .store
            .find_unique(&self.entity_name, &by)
            .await?
            .ok_or_else(|| self.not_found(id))?;
        Ok(self.serialize(&row))
    }

    pub async fn update(&self, id: &str, payload: &Record) -> Result<Record, AppError> {
        let by = self.lookup(id)?;
        let data = self.deserialize(payload);
        tracing::debug!(entity = %self.entity_name, id = %id, fields = data.len(), "update");
        let row = self
            .store
            .update(&self.entity_name, &by, data)
            .await?
            .ok_or_else(|| self.not_found(id))?;
        Ok(self.serialize(&row))
    }

    /// Delete by id and return the serialized removed record.
    pub async fn destroy(&self, id: &str) -> Result<Record, AppError> {
        let by = self.lookup(id)?;
        tracing::debug!(entity = %self.entity_name, id = %id, "destroy");
        let row = self
            .store
            .delete(&self.entity_name, &by)
            .await?
            .ok_or_else(|| self.not_found(id))?;
        Ok(self.serialize(&row))
    }
}

/// Collects the declarative parts of a model; `build` resolves the schema through the catalog.
pub struct ModelBuilder {
    entity_name: String,
    fields: Option<Vec<String>>,
    required: Vec<String>,
    identifier_field: String,
    record_validator: Option<RecordValidator>,
    field_validators: Vec<(String, FieldValidator)>,
}

impl ModelBuilder {
    pub fn new(entity_name: impl Into<String>) -> Self {
        ModelBuilder {
            entity_name: entity_name.into(),
            fields: None,
            required: Vec::new(),
            identifier_field: DEFAULT_IDENTIFIER_FIELD.to_string(),
            record_validator: None,
            field_validators: Vec::new(),
        }
    }

    /// Fields exposed in output. Names missing from the schema are ignored.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Extra required fields on top of the schema-required ones, accepted verbatim.
    pub fn required<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn identifier_field(mut self, field: impl Into<String>) -> Self {
        self.identifier_field = field.into();
        self
    }

    /// Whole-record rule. A later call replaces an earlier one.
    pub fn validate<F>(mut self, rule: F) -> Self
    where
        F: Fn(&Record) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.record_validator = Some(Arc::new(rule));
        self
    }

    /// Per-field rule; rules run in the order they are added.
    pub fn validate_field<F>(self, field: impl Into<String>, rule: F) -> Self
    where
        F: Fn(Option<&Value>, &Record) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.field_rule(field, Arc::new(rule))
    }

    /// Add a prebuilt rule such as those in [`crate::service::rules`].
    pub fn field_rule(mut self, field: impl Into<String>, rule: FieldValidator) -> Self {
        self.field_validators.push((field.into(), rule));
        self
    }

    pub async fn build(self, catalog: &FieldCatalog) -> Result<Model, AppError> {
        let schema = catalog.schema(&self.entity_name).await?;
        let exposed_fields = match self.fields {
            Some(fields) => fields.into_iter().filter(|f| schema.contains(f)).collect(),
            None => schema.field_names(),
        };
        let required = schema.required_fields(&self.required);
        tracing::debug!(
            entity = %self.entity_name,
            exposed = ?exposed_fields,
            required = ?required,
            "model built"
        );
        Ok(Model {
            entity_name: self.entity_name,
            schema,
            exposed_fields,
            identifier_field: self.identifier_field,
            validator: Validator::new(required, self.record_validator, self.field_validators),
            store: catalog.store().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldDescriptor, FieldType};
    use crate::error::{FieldError, StoreError};
    use crate::service::MISSING_REQUIRED;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    fn user_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::id("id", FieldType::Int),
            FieldDescriptor::new("name", FieldType::String),
            FieldDescriptor::new("email", FieldType::String),
            FieldDescriptor::new("password", FieldType::String).optional(),
        ]
    }

    /// Records the arguments of every store call.
    #[derive(Default)]
    struct SpyStore {
        inner: MemoryStore,
        calls: Mutex<Vec<String>>,
    }

    impl SpyStore {
        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl Store for SpyStore {
        async fn find_many(&self, entity: &str, args: FindMany) -> Result<Vec<Record>, StoreError> {
            let select = args.select.as_ref().map(|f| f.join(",")).unwrap_or_default();
            self.log(format!("find_many {:?} {:?} select={}", args.skip, args.take, select));
            self.inner.find_many(entity, args).await
        }
        async fn find_unique(&self, entity: &str, by: &Where) -> Result<Option<Record>, StoreError> {
            self.log(format!("find_unique {}={}", by.field, by.value));
            self.inner.find_unique(entity, by).await
        }
        async fn create(&self, entity: &str, data: Record) -> Result<Record, StoreError> {
            self.log(format!("create {}", Value::Object(data.clone())));
            self.inner.create(entity, data).await
        }
        async fn update(&self, entity: &str, by: &Where, data: Record) -> Result<Option<Record>, StoreError> {
            self.log(format!("update {}={}", by.field, by.value));
            self.inner.update(entity, by, data).await
        }
        async fn delete(&self, entity: &str, by: &Where) -> Result<Option<Record>, StoreError> {
            self.log(format!("delete {}={}", by.field, by.value));
            self.inner.delete(entity, by).await
        }
        async fn model_fields(&self, entity: &str) -> Result<Vec<FieldDescriptor>, StoreError> {
            self.inner.model_fields(entity).await
        }
    }

    async fn setup(builder: ModelBuilder) -> (Model, Arc<SpyStore>) {
        let spy = Arc::new(SpyStore {
            inner: MemoryStore::new()
                .with_entity("User", user_fields())
                .with_entity(
                    "Tag",
                    vec![
                        FieldDescriptor {
                            is_id: true,
                            ..FieldDescriptor::new("slug", FieldType::String)
                        },
                        FieldDescriptor::new("label", FieldType::String),
                    ],
                )
                .with_entity("Event", vec![FieldDescriptor::id("id", FieldType::BigInt)]),
            calls: Mutex::new(Vec::new()),
        });
        let catalog = FieldCatalog::new(spy.clone());
        let model = builder.build(&catalog).await.unwrap();
        (model, spy)
    }

    #[tokio::test]
    async fn serialize_projects_onto_exposed_fields() {
        let (model, _) = setup(Model::builder("User").fields(["id", "name", "email", "nope"])).await;
        assert_eq!(model.exposed_fields(), ["id", "name", "email"]);
        let raw = record(json!({"id": 1, "name": "A", "password": "secret", "extra": true}));
        assert_eq!(model.serialize(&raw), record(json!({"id": 1, "name": "A"})));
    }

    #[tokio::test]
    async fn exposed_fields_default_to_schema() {
        let (model, _) = setup(Model::builder("User")).await;
        assert_eq!(model.exposed_fields(), ["id", "name", "email", "password"]);
    }

    #[tokio::test]
    async fn deserialize_drops_unknown_but_keeps_unexposed() {
        let (model, _) = setup(Model::builder("User").fields(["id", "name"])).await;
        let payload = record(json!({"name": "A", "password": "pw", "is_admin": true}));
        let once = model.deserialize(&payload);
        assert_eq!(once, record(json!({"name": "A", "password": "pw"})));
        assert_eq!(model.deserialize(&once), once);
    }

    #[tokio::test]
    async fn validate_all_reports_one_entry_per_cause() {
        let builder = Model::builder("User")
            .validate_field("email", |_, _| Err(ValidationError::rejected("email is bad!")))
            .validate_field("name", |v, _| match v.and_then(Value::as_str) {
                Some(s) if s.len() < 3 => Err(ValidationError::rejected("name too short")),
                _ => Ok(()),
            });
        let (model, _) = setup(builder).await;
        let report = model.validate_all(&record(json!({"name": "Al"}))).unwrap();
        assert!(!report.is_valid());
        assert_eq!(
            report.errors,
            vec![
                FieldError::field("email", MISSING_REQUIRED),
                FieldError::field("email", "email is bad!"),
                FieldError::field("name", "name too short"),
            ]
        );
    }

    #[tokio::test]
    async fn validation_state_does_not_leak_between_calls() {
        let (model, _) = setup(Model::builder("User")).await;
        assert!(!model.validate_all(&Record::new()).unwrap().is_valid());
        let ok = record(json!({"name": "Alice", "email": "a@x.com"}));
        assert!(model.validate_all(&ok).unwrap().is_valid());
    }

    #[tokio::test]
    async fn declared_required_fields_are_checked() {
        let (model, _) = setup(Model::builder("User").required(["password"])).await;
        let report = model
            .validate_all(&record(json!({"name": "A", "email": "a@x.com"})))
            .unwrap();
        assert_eq!(report.errors, vec![FieldError::field("password", MISSING_REQUIRED)]);
    }

    #[tokio::test]
    async fn record_rule_internal_error_is_fatal() {
        let (model, _) = setup(Model::builder("User").validate(|_| Err(ValidationError::internal("boom")))).await;
        assert!(matches!(
            model.validate_all(&Record::new()),
            Err(AppError::Validator { .. })
        ));
    }

    #[tokio::test]
    async fn integer_identifier_is_parsed() {
        let (model, spy) = setup(Model::builder("User")).await;
        assert!(matches!(model.retrieve("42").await, Err(AppError::NotFound(_))));
        assert_eq!(spy.calls.lock().unwrap().as_slice(), ["find_unique id=42"]);
        assert!(matches!(model.retrieve("abc").await, Err(AppError::InvalidIdentifier(id)) if id == "abc"));
        assert_eq!(spy.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn identifier_must_fit_declared_width() {
        let (model, spy) = setup(Model::builder("User")).await;
        assert_eq!(model.coerce_id("2147483647").unwrap(), json!(2147483647));
        assert!(matches!(model.coerce_id("3000000000"), Err(AppError::InvalidIdentifier(_))));
        assert!(matches!(model.retrieve("99999999999").await, Err(AppError::InvalidIdentifier(_))));
        assert!(spy.calls.lock().unwrap().is_empty());

        let (wide, _) = setup(Model::builder("Event")).await;
        assert_eq!(wide.coerce_id("3000000000").unwrap(), json!(3000000000i64));
        assert!(matches!(wide.coerce_id("1.5"), Err(AppError::InvalidIdentifier(_))));
    }

    #[tokio::test]
    async fn string_identifier_passes_through() {
        let (model, _) = setup(Model::builder("Tag").identifier_field("slug")).await;
        assert_eq!(model.coerce_id("rust-lang").unwrap(), json!("rust-lang"));
        model
            .create(&record(json!({"slug": "rust-lang", "label": "Rust"})))
            .await
            .unwrap();
        let found = model.retrieve("rust-lang").await.unwrap();
        assert_eq!(found.get("label"), Some(&json!("Rust")));
    }

    #[tokio::test]
    async fn unknown_identifier_field_is_schema_lookup() {
        let (model, _) = setup(Model::builder("User").identifier_field("uuid")).await;
        assert!(matches!(model.coerce_id("1"), Err(AppError::SchemaLookup(_))));
    }

    #[tokio::test]
    async fn list_clamps_negative_skip() {
        let (model, spy) = setup(Model::builder("User")).await;
        model.list(ListOptions { skip: Some(-3), take: Some(5) }).await.unwrap();
        model.list(ListOptions { skip: Some(5), take: Some(5) }).await.unwrap();
        model.list(ListOptions::default()).await.unwrap();
        assert_eq!(
            spy.calls.lock().unwrap().as_slice(),
            [
                "find_many Some(0) Some(5) select=id,name,email,password",
                "find_many Some(5) Some(5) select=id,name,email,password",
                "find_many None None select=id,name,email,password",
            ]
        );
    }

    #[tokio::test]
    async fn list_selects_exposed_fields() {
        let (model, spy) = setup(Model::builder("User").fields(["id", "name"])).await;
        model
            .create(&record(json!({"name": "Alice", "email": "a@x.com", "password": "pw"})))
            .await
            .unwrap();
        let rows = model.list(ListOptions::default()).await.unwrap();
        assert_eq!(rows, vec![record(json!({"id": 1, "name": "Alice"}))]);
        assert_eq!(spy.calls.lock().unwrap().last().unwrap(), "find_many None None select=id,name");
    }

    #[tokio::test]
    async fn create_filters_input_and_output() {
        let (model, spy) = setup(Model::builder("User").fields(["id", "name", "email"])).await;
        let created = model
            .create(&record(json!({"name": "Alice", "email": "a@x.com", "password": "pw", "role": "admin"})))
            .await
            .unwrap();
        assert_eq!(created, record(json!({"id": 1, "name": "Alice", "email": "a@x.com"})));
        let calls = spy.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].contains("role"));
        assert!(calls[0].contains("password"));
    }

    #[tokio::test]
    async fn update_and_destroy_missing_record_is_not_found() {
        let (model, _) = setup(Model::builder("User")).await;
        let payload = record(json!({"name": "B"}));
        assert!(matches!(model.update("7", &payload).await, Err(AppError::NotFound(_))));
        assert!(matches!(model.destroy("7").await, Err(AppError::NotFound(_))));

        model
            .create(&record(json!({"name": "A", "email": "a@x.com"})))
            .await
            .unwrap();
        let updated = model.update("1", &payload).await.unwrap();
        assert_eq!(updated.get("name"), Some(&json!("B")));
        let removed = model.destroy("1").await.unwrap();
        assert_eq!(removed.get("id"), Some(&json!(1)));
    }
}
