//! HTTP server wiring the gate, the API and the pages together

pub mod server;

pub use server::{handle_request, shutdown_on, ProxyServer, ProxyServerConfig};
