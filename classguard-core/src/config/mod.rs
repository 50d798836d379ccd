//! Configuration for the gate and the upstream control proxy
//!
//! Settings come from three places:
//! - built-in defaults
//! - an optional TOML file (`--config` or `$CLASSGUARD_CONFIG`)
//! - environment variables for the allow-list, credentials and runtime mode

pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::ConfigLoader;
pub use schema::{
    AccessPolicy, Config, GateSettings, RuntimeEnv, ServerSettings, UpstreamCredentials,
    UpstreamSettings,
};
pub use validator::ConfigValidator;

pub const ENV_TEACHER_IPS: &str = "TEACHER_IPS";
pub const ENV_UPSTREAM_URL: &str = "ADGUARD_URL";
pub const ENV_UPSTREAM_USERNAME: &str = "ADGUARD_USERNAME";
pub const ENV_UPSTREAM_PASSWORD: &str = "ADGUARD_PASSWORD";
pub const ENV_APP_ENV: &str = "APP_ENV";
pub const ENV_NODE_ENV: &str = "NODE_ENV";
pub const ENV_CONFIG_PATH: &str = "CLASSGUARD_CONFIG";
