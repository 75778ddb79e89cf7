//! `jsonschema` validation errors as violations.
//!
//! `field` is the instance path joined with `.`, `message` the error's display
//! text and `code` the schema keyword that failed (`required`, `minimum`, ...).

use jsonschema::{ValidationError, Validator};
use serde_json::Value;

use crate::validation::{IntoViolations, Violation, join_path};

/// Violation for a single schema validation error.
pub fn violation_from_error(error: &ValidationError<'_>) -> Violation {
    Violation {
        field: join_path(error.instance_path().iter()),
        message: error.to_string(),
        code: error
            .schema_path()
            .iter()
            .last()
            .map(|keyword| keyword.to_string()),
    }
}

impl IntoViolations for [ValidationError<'_>] {
    fn violations(&self) -> Vec<Violation> {
        self.iter().map(violation_from_error).collect()
    }
}

impl IntoViolations for Vec<ValidationError<'_>> {
    fn violations(&self) -> Vec<Violation> {
        self.as_slice().violations()
    }
}

/// Validate `instance`, collecting every error instead of stopping at the first.
///
/// # Errors
/// Returns all validation errors when `instance` does not match the schema.
pub fn validate_instance<'i>(
    validator: &'i Validator,
    instance: &'i Value,
) -> Result<&'i Value, Vec<ValidationError<'i>>> {
    let errors: Vec<_> = validator.iter_errors(instance).collect();
    if errors.is_empty() {
        Ok(instance)
    } else {
        Err(errors)
    }
}
