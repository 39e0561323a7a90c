//! Form validation
//!
//! Forms derive `validator::Validate`; this module turns validator reports
//! into [`DashError`] values and provides the [`Validated`] extractor.

pub mod extractor;
pub mod validators;

pub use extractor::Validated;

use crate::core::error::{DashError, FieldValidationError, ValidationError};
use validator::{Validate, ValidationErrors};

/// Run a form's validation rules, converting failures to a field error list
pub fn validate_form<T: Validate>(form: &T) -> Result<(), DashError> {
    form.validate().map_err(into_dash_error)
}

/// Flatten a validator report, sorted by field name
pub fn into_dash_error(errors: ValidationErrors) -> DashError {
    let mut fields: Vec<FieldValidationError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| FieldValidationError {
                field: field.to_string(),
                message: err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string()),
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));

    DashError::Validation(ValidationError::FieldErrors(fields))
}
