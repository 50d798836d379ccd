//! Core library for the classroom filter dashboard
//!
//! Holds configuration loading and the access gate that decides, per
//! request, whether the caller is a teacher workstation.

pub mod config;
pub mod error;
pub mod gate;

pub use config::{
    AccessPolicy, Config, ConfigLoader, RuntimeEnv, UpstreamCredentials, UpstreamSettings,
};
pub use error::{ConfigError, GateError, Result, ValidationError};
pub use gate::{AccessGate, ClientIdentity, GateDecision, GateRequest};
