//! Registry Error Types
//!
//! What callers of [`SubscriptionRegistry`](crate::SubscriptionRegistry) see.
//! Each lifecycle failure kind is its own variant so callers can tell
//! "already signed" from "not yours" from "no such subscription".

use thiserror::Error;

use crate::subscription::operations::codes;
use crate::usecase::UseCaseError;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Duplicate subscription id: {message}")]
    DuplicateId { message: String },

    #[error("Subscription not found: {message}")]
    NotFound { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Invalid transition: {message}")]
    InvalidTransition { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Concurrent modification: {message}")]
    Concurrency { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RegistryError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage { message: message.into() }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

impl From<UseCaseError> for RegistryError {
    fn from(err: UseCaseError) -> Self {
        match err {
            UseCaseError::ValidationError { message, .. } => RegistryError::Validation { message },
            UseCaseError::AuthorizationError { message, .. } => {
                RegistryError::Unauthorized { message }
            }
            UseCaseError::NotFoundError { message, .. } => RegistryError::NotFound { message },
            UseCaseError::BusinessRuleViolation { code, message, .. } => {
                if code == codes::SUBSCRIPTION_ID_EXISTS {
                    RegistryError::DuplicateId { message }
                } else {
                    RegistryError::InvalidTransition { message }
                }
            }
            UseCaseError::ConcurrencyError { message, .. } => {
                RegistryError::Concurrency { message }
            }
            UseCaseError::CommitError { message, .. } => RegistryError::Storage { message },
        }
    }
}

/// Storage failures inside a commit surface as commit errors.
impl From<RegistryError> for UseCaseError {
    fn from(err: RegistryError) -> Self {
        UseCaseError::commit(err.to_string())
    }
}
