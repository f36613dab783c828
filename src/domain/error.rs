use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field name → messages, serialized as `{"field": ["message", ...]}`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError(FieldErrors),
    ParseError(String),
    AuthError(String),
    Unauthorized(String),
    StorageError(String),
    DatabaseError(String),
    IoError(String),
}

impl AppError {
    /// Single-field validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::ValidationError(errors)
    }

    /// First message of a validation error, or the display text otherwise.
    pub fn first_message(&self) -> String {
        match self {
            AppError::ValidationError(errors) => errors
                .values()
                .flat_map(|messages| messages.iter())
                .next()
                .cloned()
                .unwrap_or_else(|| "Invalid input".to_string()),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(errors) => {
                let joined = errors
                    .iter()
                    .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "Validation error: {}", joined)
            }
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::AuthError(msg) => write!(f, "Authentication error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors = FieldErrors::new();
        for (field, field_errors) in err.field_errors() {
            let messages = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            errors.insert(field.to_string(), messages);
        }
        AppError::ValidationError(errors)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failures seen by the desktop client; `Display` is shown to the user as is.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    Timeout(u64),
    Network(String),
    Server { status: u16, message: String },
    Io(String),
    InvalidResponse(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Timeout(secs) => write!(f, "Upload timed out after {}s", secs),
            ClientError::Network(msg) => write!(f, "Connection failed: {}", msg),
            ClientError::Server { message, .. } => write!(f, "{}", message),
            ClientError::Io(msg) => write!(f, "Could not read file: {}", msg),
            ClientError::InvalidResponse(msg) => write!(f, "Unexpected server response: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}
