//! Gated HTTP front end for the classroom filter dashboard
//!
//! Every request passes the access gate from `classguard-core`; allowed
//! API calls are forwarded to the filtering appliance's control API.

pub mod api;
pub mod error;
pub mod pages;
pub mod proxy;
pub mod upstream;

// Re-export commonly used types
pub use error::{ErrorBody, ProxyError, Result};
pub use proxy::{shutdown_on, ProxyServer, ProxyServerConfig};
pub use upstream::{ControlEndpoint, UpstreamClient};
