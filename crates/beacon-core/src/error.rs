//! # Shared Validation Errors
//!
//! Validation failures that can occur at any boundary: request parameter
//! parsing, configuration loading, entity id checks. Uses `thiserror` for
//! structured errors with machine-mappable variants.

use thiserror::Error;

/// Validation errors shared across the Beacon stack.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A required parameter was not supplied.
    #[error("required parameter '{0}' not given")]
    MissingParameter(&'static str),

    /// An entity identifier failed validation.
    #[error("invalid entity id: {0}")]
    InvalidEntityId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parameter_names_the_parameter() {
        let err = ValidationError::MissingParameter("sub");
        assert_eq!(format!("{err}"), "required parameter 'sub' not given");
    }
}
