//! Unified error types for Gatecheck

use crate::types::Visibility;
use thiserror::Error;

/// Unified error type for all Gatecheck operations
#[derive(Error, Debug)]
pub enum GatecheckError {
    // Authentication errors
    #[error("login surface not ready for '{identity}' after {waited_ms}ms")]
    AuthTimeout { identity: String, waited_ms: u64 },

    #[error("credentials rejected for '{identity}'")]
    AuthRejected { identity: String },

    #[error("logout did not return to the login surface")]
    LogoutIncomplete,

    // Step errors
    #[error("no element matched {locator}")]
    ElementNotFound { locator: String },

    #[error("timed out after {waited_ms}ms waiting for {description}")]
    StepTimeout { description: String, waited_ms: u64 },

    #[error("assertion failed: {predicate} expected {expected}, observed {observed}")]
    AssertionFailed {
        predicate: String,
        expected: Visibility,
        observed: Visibility,
    },

    // Driver errors
    #[error("driver error: {0}")]
    Driver(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatecheckError {
    /// Short kind tag used in report lines and artifact names
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthTimeout { .. } => "auth_timeout",
            Self::AuthRejected { .. } => "auth_rejected",
            Self::LogoutIncomplete => "logout_incomplete",
            Self::ElementNotFound { .. } => "element_not_found",
            Self::StepTimeout { .. } => "step_timeout",
            Self::AssertionFailed { .. } => "assertion_failed",
            Self::Driver(_) => "driver",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Result type alias using GatecheckError
pub type Result<T> = std::result::Result<T, GatecheckError>;
