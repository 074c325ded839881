//! Error taxonomy shared by every resource provider
//!
//! Input and validation errors are raised before any mutation is attempted.
//! Probe errors that a provider can recover from are degraded to "absent" by
//! the provider itself and never reach this type.

use thiserror::Error;

/// Errors that can occur while resolving, validating or reconciling a resource
#[derive(Debug, Error)]
pub enum Error {
    /// Input could not be read or parsed, or no input was supplied at all
    #[error("input error: {0}")]
    Input(String),

    /// The merged input does not satisfy the resource schema
    #[error("validation error: {0}")]
    Validation(String),

    /// Current state could not be determined
    #[error("failed to probe {resource}: {message}")]
    Probe { resource: String, message: String },

    /// Converging the resource failed; it may be partially modified
    #[error("failed to {action} {resource}: {message}")]
    Mutation {
        resource: String,
        action: String,
        message: String,
    },

    /// Anything else
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    pub fn probe(resource: impl Into<String>, message: impl ToString) -> Self {
        Self::Probe {
            resource: resource.into(),
            message: message.to_string(),
        }
    }

    pub fn mutation(
        resource: impl Into<String>,
        action: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        Self::Mutation {
            resource: resource.into(),
            action: action.into(),
            message: message.to_string(),
        }
    }

    /// Whether the error was raised before any mutation could have happened
    pub fn is_pre_mutation(&self) -> bool {
        matches!(self, Self::Input(_) | Self::Validation(_) | Self::Probe { .. })
    }
}

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;
