//! Error type shared by scanning, parsing, field access and the registry.

use thiserror::Error;

/// Every failure in the framework surfaces as one of these.
#[derive(Debug, Error)]
pub enum EmdError {
    /// Malformed input, unknown names, ordering violations and failed
    /// validity checks, tagged with where in the input they happened.
    #[error("{location}:{line}: {message}")]
    Parse {
        location: String,
        line: usize,
        message: String,
    },

    /// Typed access that does not match the field's declaration.
    #[error("Field '{field}': {message}")]
    Field { field: String, message: String },

    #[error("{0}")]
    Registry(String),

    #[error("{0}")]
    Object(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EmdError {
    pub(crate) fn field(field: &str, message: impl Into<String>) -> Self {
        EmdError::Field {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// The human-readable message without location information.
    pub fn message(&self) -> String {
        match self {
            EmdError::Parse { message, .. } => message.clone(),
            EmdError::Field { message, .. } => message.clone(),
            EmdError::Registry(message) | EmdError::Object(message) => message.clone(),
            EmdError::Io(err) => err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EmdError>;
