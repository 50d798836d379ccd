//! IP-based access gate

pub mod identity;
pub mod matcher;
pub mod policy;

pub use identity::{ClientIdentity, IdentitySource, FORWARDED_FOR_HEADER};
pub use matcher::{ExemptMatcher, ProxyTrust};
pub use policy::{AccessGate, GateDecision, GateRequest};
