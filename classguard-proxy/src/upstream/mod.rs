//! Forwarding to the upstream filtering appliance

pub mod client;
pub mod types;

pub use client::{ControlEndpoint, UpstreamClient};
pub use types::{
    FilterDescriptor, FilterListing, FilterUpdate, MessageBody, ProtectionState,
    ProtectionToggle,
};
