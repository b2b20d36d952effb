//! Errors surfaced to callers of the service

use thiserror::Error;

use crate::acl::AclError;

/// Call-level failures
///
/// Every variant is terminal for the call and leaves shared state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] AclError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("service is shutting down")]
    ShuttingDown,
}

impl ServiceError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Unauthenticated(_) => "unauthenticated",
            ServiceError::InvalidArgument(_) => "invalid_argument",
            ServiceError::ShuttingDown => "unavailable",
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ServiceError::Unauthenticated(_))
    }
}
