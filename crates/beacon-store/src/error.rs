//! Storage error types.

use thiserror::Error;

/// Errors from the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A lifecycle transition was attempted on a blocked subject.
    #[error("subject '{subject}' is blocked for trust mark type '{trust_mark_type}'")]
    SubjectBlocked {
        trust_mark_type: String,
        subject: String,
    },

    /// The configured backend name is not one of the supported backends.
    #[error("unknown storage backend '{0}'")]
    UnknownBackend(String),

    /// A stored record could not be encoded or decoded.
    #[error("record serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend itself failed.
    #[error("storage backend: {0}")]
    Backend(String),

    /// Filesystem error underneath a backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub(crate) fn blocked(trust_mark_type: &str, subject: &str) -> Self {
        Self::SubjectBlocked {
            trust_mark_type: trust_mark_type.to_string(),
            subject: subject.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_names_type_and_subject() {
        let err = StorageError::blocked("tm-type", "https://rp.example.org");
        let msg = format!("{err}");
        assert!(msg.contains("tm-type"));
        assert!(msg.contains("https://rp.example.org"));
    }
}
