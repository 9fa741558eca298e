use thiserror::Error;

/// Every variant carries a scope string naming where the error originated,
/// e.g. `mongo.forms.save` or `forms.create.answer.required`.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("{message}")]
    Validation { scope: &'static str, message: String },
    #[error("not found")]
    NotFound { scope: &'static str },
    #[error("{message}")]
    Conflict { scope: &'static str, message: String },
    #[error("{message}")]
    Persistence { scope: &'static str, message: String },
}

impl DomainError {
    pub fn validation(scope: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            scope,
            message: message.into(),
        }
    }

    pub fn not_found(scope: &'static str) -> Self {
        Self::NotFound { scope }
    }

    pub fn conflict(scope: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            scope,
            message: message.into(),
        }
    }

    pub fn persistence(scope: &'static str, message: impl Into<String>) -> Self {
        Self::Persistence {
            scope,
            message: message.into(),
        }
    }

    pub fn scope(&self) -> &'static str {
        match self {
            Self::Validation { scope, .. }
            | Self::NotFound { scope }
            | Self::Conflict { scope, .. }
            | Self::Persistence { scope, .. } => scope,
        }
    }

    /// HTTP status the error maps to at the controller boundary. Duplicate
    /// key conflicts surface as 400, matching the persistence contract.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } | Self::Conflict { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Persistence { .. } => 500,
        }
    }
}
