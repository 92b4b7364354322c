//! Validation service: report-producing validator and built-in field rules.

mod validation;
pub use validation::{rules, FieldValidator, RecordValidator, ValidationReport, Validator, MISSING_REQUIRED};
