//! Error types for proxy operations

use classguard_core::ConfigError;
use hyper::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProxyError>;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Upstream control API is not fully configured (missing {})", .missing.join(", "))]
    Configuration { missing: Vec<&'static str> },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Upstream authentication failed, check the configured username and password")]
    UpstreamAuth,

    #[error("Upstream control API responded with status {status}")]
    UpstreamResponse {
        status: u16,
        details: Option<Value>,
    },

    #[error("Connection to the upstream control API timed out")]
    UpstreamTimeout,

    #[error("Request to the upstream control API failed: {0}")]
    Transport(String),

    #[error("Unexpected response from the upstream control API: {0}")]
    Decode(String),

    #[error("Method {method} is not allowed on this route")]
    MethodNotAllowed { method: String, allow: &'static str },

    #[error("No API route for {path}")]
    NotFound { path: String },

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON body returned for every failed API call
#[derive(Debug, Serialize, PartialEq)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamAuth => StatusCode::UNAUTHORIZED,
            ProxyError::UpstreamResponse { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ProxyError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::NotFound { .. } => StatusCode::NOT_FOUND,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Configuration { .. }
            | ProxyError::UpstreamTimeout
            | ProxyError::Transport(_)
            | ProxyError::Decode(_)
            | ProxyError::Config(_)
            | ProxyError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let details = match self {
            ProxyError::UpstreamResponse { details, .. } => details.clone(),
            _ => None,
        };
        ErrorBody {
            message: self.to_string(),
            details,
        }
    }

    /// Classify a client-side failure talking to the upstream
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ProxyError::UpstreamTimeout;
        }

        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        ProxyError::Transport(message)
    }
}
