//! Entity schema types as reported by the store or read from a schema file.

use serde::{Deserialize, Serialize};

/// Declared scalar type of a field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Int,
    BigInt,
    Float,
    Decimal,
    String,
    Boolean,
    DateTime,
    Json,
    Bytes,
    Other(String),
}

impl FieldType {
    pub fn is_integer(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::BigInt)
    }
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Int" => FieldType::Int,
            "BigInt" => FieldType::BigInt,
            "Float" => FieldType::Float,
            "Decimal" => FieldType::Decimal,
            "String" => FieldType::String,
            "Boolean" => FieldType::Boolean,
            "DateTime" => FieldType::DateTime,
            "Json" => FieldType::Json,
            "Bytes" => FieldType::Bytes,
            _ => FieldType::Other(s),
        }
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        match t {
            FieldType::Int => "Int".into(),
            FieldType::BigInt => "BigInt".into(),
            FieldType::Float => "Float".into(),
            FieldType::Decimal => "Decimal".into(),
            FieldType::String => "String".into(),
            FieldType::Boolean => "Boolean".into(),
            FieldType::DateTime => "DateTime".into(),
            FieldType::Json => "Json".into(),
            FieldType::Bytes => "Bytes".into(),
            FieldType::Other(s) => s,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default = "default_true")]
    pub is_required: bool,
    #[serde(default)]
    pub has_default: bool,
    #[serde(default)]
    pub is_id: bool,
}

fn default_true() -> bool {
    true
}

impl FieldDescriptor {
    /// Required, no default, not the identifier.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldDescriptor {
            name: name.into(),
            field_type,
            is_required: true,
            has_default: false,
            is_id: false,
        }
    }

    /// Identifier field with a store-generated default (e.g. autoincrement).
    pub fn id(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldDescriptor {
            is_id: true,
            has_default: true,
            ..FieldDescriptor::new(name, field_type)
        }
    }

    pub fn optional(mut self) -> Self {
        self.is_required = false;
        self
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// A field the client must supply: declared required and not filled by a default.
    pub fn is_schema_required(&self) -> bool {
        self.is_required && !self.has_default
    }
}

/// Ordered field list of one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySchema {
    pub entity: String,
    pub fields: Vec<FieldDescriptor>,
}

impl EntitySchema {
    pub fn new(entity: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        EntitySchema {
            entity: entity.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Schema-required fields in declaration order, then `declared` extras not already present.
    pub fn required_fields(&self, declared: &[String]) -> Vec<String> {
        let mut out: Vec<String> = self
            .fields
            .iter()
            .filter(|f| f.is_schema_required())
            .map(|f| f.name.clone())
            .collect();
        for name in declared {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_schema() -> EntitySchema {
        EntitySchema::new(
            "User",
            vec![
                FieldDescriptor::id("id", FieldType::Int),
                FieldDescriptor::new("name", FieldType::String),
                FieldDescriptor::new("email", FieldType::String),
                FieldDescriptor::new("bio", FieldType::String).optional(),
                FieldDescriptor::new("active", FieldType::Boolean).with_default(),
            ],
        )
    }

    #[test]
    fn descriptor_reads_schema_file_shape() {
        let raw = r#"{"name": "id", "type": "Int", "is_id": true, "has_default": true}"#;
        let f: FieldDescriptor = serde_json::from_str(raw).unwrap();
        assert_eq!(f.field_type, FieldType::Int);
        assert!(f.is_required);
        assert!(!f.is_schema_required());

        let raw = r#"{"name": "tags", "type": "Unsupported(\"tsvector\")"}"#;
        let f: FieldDescriptor = serde_json::from_str(raw).unwrap();
        assert_eq!(f.field_type, FieldType::Other("Unsupported(\"tsvector\")".into()));
    }

    #[test]
    fn required_excludes_optional_and_defaulted() {
        let schema = user_schema();
        assert_eq!(schema.required_fields(&[]), vec!["name", "email"]);
    }

    #[test]
    fn declared_required_extends_schema_verbatim() {
        let schema = user_schema();
        let declared = vec!["bio".to_string(), "email".to_string(), "nickname".to_string()];
        assert_eq!(
            schema.required_fields(&declared),
            vec!["name", "email", "bio", "nickname"]
        );
    }
}
