//! Error types for configuration and gate evaluation

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to load config from {path}: {source}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid CIDR notation: {cidr}")]
    InvalidCidr { cidr: String },

    #[error("Invalid path pattern: {pattern}")]
    InvalidPattern { pattern: String },

    #[error("Invalid upstream URL: {url}")]
    InvalidUpstreamUrl { url: String },

    #[error("Timeout for {operation} must be greater than zero")]
    ZeroTimeout { operation: &'static str },

    #[error("Invalid redirect target: {target}")]
    InvalidRedirect { target: String },
}

/// Why the gate refused to evaluate a request.
///
/// Both variants mean the allow-list is unusable; the gate fails closed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("TEACHER_IPS is not set")]
    AllowListUnset,

    #[error("TEACHER_IPS is set but contains no valid addresses")]
    AllowListEmpty,
}

impl GateError {
    /// Body text returned to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            GateError::AllowListUnset => "Server configuration error",
            GateError::AllowListEmpty => {
                "Server configuration error: No valid teacher IPs configured"
            }
        }
    }
}
