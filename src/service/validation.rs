//! Payload validation: required fields, a whole-record rule, then per-field rules.
//!
//! Every rejection is collected; nothing fails fast. A validator returning
//! `ValidationError::Internal` aborts the run instead of being reported.

use crate::error::{AppError, FieldError, ValidationError};
use crate::store::Record;
use serde_json::Value;
use std::sync::Arc;

pub const MISSING_REQUIRED: &str = "Missing required field.";

/// Whole-record rule.
pub type RecordValidator = Arc<dyn Fn(&Record) -> Result<(), ValidationError> + Send + Sync>;

/// Per-field rule, called with the field's value (if present) and the whole payload.
pub type FieldValidator = Arc<dyn Fn(Option<&Value>, &Record) -> Result<(), ValidationError> + Send + Sync>;

/// Result of one validation run. Owned by the caller; never stored on the model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Err(ValidationFailed)` carrying every entry when invalid.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(AppError::ValidationFailed(self.errors))
        }
    }
}

#[derive(Clone, Default)]
pub struct Validator {
    required: Vec<String>,
    record: Option<RecordValidator>,
    fields: Vec<(String, FieldValidator)>,
}

impl Validator {
    pub fn new(
        required: Vec<String>,
        record: Option<RecordValidator>,
        fields: Vec<(String, FieldValidator)>,
    ) -> Self {
        Validator {
            required,
            record,
            fields,
        }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn validate(&self, payload: &Record) -> Result<ValidationReport, AppError> {
        let mut errors = Vec::new();

        for field in &self.required {
            if !payload.contains_key(field) {
                errors.push(FieldError::field(field.clone(), MISSING_REQUIRED));
            }
        }

        if let Some(rule) = &self.record {
            match rule(payload) {
                Ok(()) => {}
                Err(ValidationError::Rejected(message)) => errors.push(FieldError::record(message)),
                Err(ValidationError::Internal(reason)) => {
                    return Err(AppError::Validator {
                        target: "record".into(),
                        reason,
                    })
                }
            }
        }

        for (field, rule) in &self.fields {
            match rule(payload.get(field), payload) {
                Ok(()) => {}
                Err(ValidationError::Rejected(message)) => errors.push(FieldError::field(field.clone(), message)),
                Err(ValidationError::Internal(reason)) => {
                    return Err(AppError::Validator {
                        target: format!("field '{}'", field),
                        reason,
                    })
                }
            }
        }

        Ok(ValidationReport { errors })
    }
}

/// Reusable per-field rules. Absent and null values pass; pair with a required field to forbid them.
pub mod rules {
    use super::FieldValidator;
    use crate::error::{ConfigError, ValidationError};
    use crate::store::Record;
    use regex::Regex;
    use serde_json::Value;
    use std::sync::Arc;

    fn on_present<F>(check: F) -> FieldValidator
    where
        F: Fn(&Value) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        Arc::new(move |value: Option<&Value>, _: &Record| match value {
            None | Some(Value::Null) => Ok(()),
            Some(v) => check(v),
        })
    }

    pub fn max_length(max: usize) -> FieldValidator {
        on_present(move |v| match v.as_str() {
            Some(s) if s.chars().count() > max => Err(ValidationError::rejected(format!(
                "must be at most {} characters",
                max
            ))),
            _ => Ok(()),
        })
    }

    pub fn min_length(min: usize) -> FieldValidator {
        on_present(move |v| match v.as_str() {
            Some(s) if s.chars().count() < min => Err(ValidationError::rejected(format!(
                "must be at least {} characters",
                min
            ))),
            _ => Ok(()),
        })
    }

    /// Fails at construction when `pattern` does not compile.
    pub fn pattern(field: &str, pattern: &str) -> Result<FieldValidator, ConfigError> {
        let re = Regex::new(pattern).map_err(|e| ConfigError::InvalidRule {
            field: field.to_string(),
            reason: e.to_string(),
        })?;
        Ok(on_present(move |v| match v.as_str() {
            Some(s) if !re.is_match(s) => Err(ValidationError::rejected("does not match required pattern")),
            _ => Ok(()),
        }))
    }

    pub fn email() -> FieldValidator {
        on_present(|v| match v.as_str() {
            Some(s) if !s.contains('@') || s.len() < 3 => Err(ValidationError::rejected("must be a valid email")),
            Some(_) => Ok(()),
            None => Err(ValidationError::rejected("must be a string")),
        })
    }

    pub fn uuid() -> FieldValidator {
        on_present(|v| match v.as_str() {
            Some(s) if uuid::Uuid::parse_str(s).is_ok() => Ok(()),
            _ => Err(ValidationError::rejected("must be a valid UUID")),
        })
    }

    pub fn one_of(allowed: Vec<Value>) -> FieldValidator {
        on_present(move |v| {
            if allowed.iter().any(|a| value_eq(v, a)) {
                Ok(())
            } else {
                Err(ValidationError::rejected(format!(
                    "must be one of: {:?}",
                    allowed.iter().take(5).collect::<Vec<_>>()
                )))
            }
        })
    }

    pub fn minimum(min: f64) -> FieldValidator {
        on_present(move |v| match v.as_f64() {
            Some(n) if n < min => Err(ValidationError::rejected(format!("must be at least {}", min))),
            _ => Ok(()),
        })
    }

    pub fn maximum(max: f64) -> FieldValidator {
        on_present(move |v| match v.as_f64() {
            Some(n) if n > max => Err(ValidationError::rejected(format!("must be at most {}", max))),
            _ => Ok(()),
        })
    }

    fn value_eq(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
            _ => a == b,
        }
    }
}
