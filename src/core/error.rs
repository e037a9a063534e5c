//! Classified collaborator errors

use crate::core::rate::RateError;
use thiserror::Error;

/// Failures reported by a rate source.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SourceError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Invalid request or response: {0}")]
    Validation(String),

    #[error("Server error: {0}")]
    Server(String),

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),
}

/// Failure reported by the notification channel.
#[derive(Debug, Error, PartialEq)]
#[error("Notification rejected: {0}")]
pub struct DispatchError(pub String);

/// Short class name for logging, taken from the first classified error in
/// the chain.
pub fn classify(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(source) = cause.downcast_ref::<SourceError>() {
            return match source {
                SourceError::Authentication(_) => "authentication",
                SourceError::RateLimit(_) => "rate_limit",
                SourceError::Validation(_) => "validation",
                SourceError::Server(_) => "server",
                SourceError::Network(_) => "network",
            };
        }
        if cause.downcast_ref::<RateError>().is_some() {
            return "invalid_rate";
        }
        if cause.downcast_ref::<DispatchError>().is_some() {
            return "dispatch";
        }
    }
    "other"
}
