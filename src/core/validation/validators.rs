//! Reusable field validators
//!
//! Plugged into `#[derive(Validate)]` forms through
//! `#[validate(custom(function = "..."))]`.

use crate::core::field::FieldFormat;
use croner::Cron;
use std::borrow::Cow;
use validator::ValidationError;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Value must contain something other than whitespace
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error("required", "must not be blank"))
    } else {
        Ok(())
    }
}

/// Percentage in `[0, 100]`
pub fn percentage(value: f64) -> Result<(), ValidationError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(error("percentage", "must lie between 0 and 100"))
    }
}

/// Strictly positive amount
pub fn positive_amount(value: f64) -> Result<(), ValidationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(error("positive", "must be greater than 0"))
    }
}

/// Five-field cron expression (`min hour dom month dow`) with every field
/// in range
pub fn cron_expression(value: &str) -> Result<(), ValidationError> {
    match Cron::new(value).parse() {
        Ok(_) => Ok(()),
        Err(_) => Err(error("cron", "must be a valid five-field cron expression")),
    }
}

/// HTTP(S) URL
pub fn http_url(value: &str) -> Result<(), ValidationError> {
    if FieldFormat::Url.validate(value) {
        Ok(())
    } else {
        Err(error("url", "must be an http(s) URL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Nightly DB").is_ok());
        assert!(not_blank("   ").is_err());
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(percentage(0.0).is_ok());
        assert!(percentage(100.0).is_ok());
        assert!(percentage(100.5).is_err());
        assert!(percentage(-1.0).is_err());
    }

    #[test]
    fn test_positive_amount() {
        assert!(positive_amount(0.01).is_ok());
        assert!(positive_amount(0.0).is_err());
        assert!(positive_amount(f64::NAN).is_err());
    }

    #[test]
    fn test_cron_expression() {
        assert!(cron_expression("0 2 * * *").is_ok());
        assert!(cron_expression("*/15 * * * 1-5").is_ok());
        assert!(cron_expression("every day").is_err());
        assert!(cron_expression("0 2 * *").is_err());
    }

    #[test]
    fn test_cron_fields_out_of_range() {
        assert!(cron_expression("99 99 99 99 99").is_err());
        assert!(cron_expression("0 24 * * *").is_err());
        assert!(cron_expression("0 2 31 13 *").is_err());
        assert!(cron_expression("60 * * * *").is_err());
    }
}
