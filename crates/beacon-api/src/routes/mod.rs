//! HTTP route handlers, one module per endpoint group.

pub mod federation;
pub mod keys;
pub mod subordinates;
pub mod trust_marks;

use beacon_core::ValidationError;

use crate::error::ApiError;

/// Extract a required, non-empty query parameter.
fn require<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ValidationError::MissingParameter(name).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_rejects_missing_and_empty() {
        assert_eq!(require(&Some("x".to_string()), "sub").unwrap(), "x");
        assert!(require(&None, "sub").is_err());
        assert!(require(&Some(String::new()), "sub").is_err());
    }
}
