//! Configuration schema types

use crate::error::GateError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Complete server configuration
///
/// The `server`, `gate` and `upstream` sections come from the optional TOML
/// file. The allow-list, credentials and runtime environment only ever come
/// from the process environment and are filled in by the loader.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub gate: GateSettings,
    #[serde(default)]
    pub upstream: UpstreamSettings,
    #[serde(skip)]
    pub access: AccessPolicy,
    #[serde(skip)]
    pub credentials: UpstreamCredentials,
    #[serde(skip)]
    pub environment: RuntimeEnv,
}

/// Listener settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Largest request body accepted by the API routes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Access gate settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GateSettings {
    /// Wildcard path patterns the gate never intercepts
    #[serde(default = "default_exempt_paths")]
    pub exempt_paths: Vec<String>,
    /// Peer ranges whose forwarding header is believed. Empty trusts every peer.
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
    /// Where privileged callers asking for `/` are sent
    #[serde(default = "default_teacher_home")]
    pub teacher_home: String,
    /// Where ordinary callers are sent for anything but `/`
    #[serde(default = "default_forbidden_path")]
    pub forbidden_path: String,
}

fn default_exempt_paths() -> Vec<String> {
    [
        "/_next/static*",
        "/static/*",
        "/_next/image*",
        "/favicon.ico",
        "/forbidden*",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn default_teacher_home() -> String {
    "/teacher".to_string()
}

fn default_forbidden_path() -> String {
    "/forbidden".to_string()
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            exempt_paths: default_exempt_paths(),
            trusted_proxies: Vec::new(),
            teacher_home: default_teacher_home(),
            forbidden_path: default_forbidden_path(),
        }
    }
}

/// Per-operation timeouts for the upstream control API, in milliseconds
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamSettings {
    #[serde(default = "default_read_timeout_ms")]
    pub status_timeout_ms: u64,
    #[serde(default = "default_read_timeout_ms")]
    pub filters_timeout_ms: u64,
    #[serde(default = "default_toggle_timeout_ms")]
    pub toggle_timeout_ms: u64,
    #[serde(default = "default_update_timeout_ms")]
    pub update_timeout_ms: u64,
}

fn default_read_timeout_ms() -> u64 {
    5_000
}

fn default_toggle_timeout_ms() -> u64 {
    8_000
}

fn default_update_timeout_ms() -> u64 {
    7_000
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            status_timeout_ms: default_read_timeout_ms(),
            filters_timeout_ms: default_read_timeout_ms(),
            toggle_timeout_ms: default_toggle_timeout_ms(),
            update_timeout_ms: default_update_timeout_ms(),
        }
    }
}

impl UpstreamSettings {
    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    pub fn filters_timeout(&self) -> Duration {
        Duration::from_millis(self.filters_timeout_ms)
    }

    pub fn toggle_timeout(&self) -> Duration {
        Duration::from_millis(self.toggle_timeout_ms)
    }

    pub fn update_timeout(&self) -> Duration {
        Duration::from_millis(self.update_timeout_ms)
    }
}

/// The set of privileged ("teacher") client addresses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    allowed_ips: HashSet<String>,
    /// Whether the variable carried any text at all
    configured: bool,
    /// First raw comma-separated entry, trimmed; feeds the non-production bypass
    first_entry: Option<String>,
}

impl AccessPolicy {
    /// Build from the raw `TEACHER_IPS` value
    pub fn from_env_value(raw: Option<&str>) -> Self {
        let raw = match raw {
            Some(value) if !value.is_empty() => value,
            _ => return Self::default(),
        };

        let allowed_ips = raw
            .split(',')
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
            .collect();

        let first_entry = raw
            .split(',')
            .next()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string);

        Self {
            allowed_ips,
            configured: true,
            first_entry,
        }
    }

    /// Fail closed unless at least one address is configured
    pub fn check(&self) -> Result<(), GateError> {
        if !self.configured {
            return Err(GateError::AllowListUnset);
        }
        if self.is_empty() {
            return Err(GateError::AllowListEmpty);
        }
        Ok(())
    }

    /// Exact string membership; no prefix, CIDR or case folding
    pub fn contains(&self, address: &str) -> bool {
        self.allowed_ips.contains(address)
    }

    pub fn bypass_identity(&self) -> Option<&str> {
        self.first_entry.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn len(&self) -> usize {
        self.allowed_ips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed_ips.is_empty()
    }
}

/// Basic-auth credentials and base URL for the upstream control API
#[derive(Clone, Default, PartialEq, Eq)]
pub struct UpstreamCredentials {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl UpstreamCredentials {
    /// Empty values count as missing
    pub fn new(url: Option<String>, username: Option<String>, password: Option<String>) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            url: non_empty(url),
            username: non_empty(username),
            password: non_empty(password),
        }
    }

    /// Names of the environment variables that are still missing
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.url.is_none() {
            missing.push(super::ENV_UPSTREAM_URL);
        }
        if self.username.is_none() {
            missing.push(super::ENV_UPSTREAM_USERNAME);
        }
        if self.password.is_none() {
            missing.push(super::ENV_UPSTREAM_PASSWORD);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Base URL with a single trailing slash removed
    pub fn base_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(|url| url.strip_suffix('/').unwrap_or(url))
    }
}

impl fmt::Debug for UpstreamCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamCredentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Deployment environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RuntimeEnv {
    Production,
    /// Anything else, including unset; enables the allow-list identity bypass
    #[default]
    Development,
}

impl RuntimeEnv {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("production") => RuntimeEnv::Production,
            _ => RuntimeEnv::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        *self == RuntimeEnv::Production
    }
}

impl fmt::Display for RuntimeEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeEnv::Production => write!(f, "production"),
            RuntimeEnv::Development => write!(f, "development"),
        }
    }
}
