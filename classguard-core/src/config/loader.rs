//! Configuration loading from file and environment

use super::schema::{AccessPolicy, Config, RuntimeEnv, UpstreamCredentials};
use super::validator::ConfigValidator;
use super::{
    ENV_APP_ENV, ENV_CONFIG_PATH, ENV_NODE_ENV, ENV_TEACHER_IPS, ENV_UPSTREAM_PASSWORD,
    ENV_UPSTREAM_URL, ENV_UPSTREAM_USERNAME,
};
use crate::error::{ConfigError, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Settings file named by `$CLASSGUARD_CONFIG`, if any
    pub fn default_config_path() -> Option<PathBuf> {
        env::var_os(ENV_CONFIG_PATH).map(PathBuf::from)
    }

    /// Load settings from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ConfigLoad {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Fill the environment-only parts of the config
    pub fn apply_env<F>(config: &mut Config, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        config.access = AccessPolicy::from_env_value(lookup(ENV_TEACHER_IPS).as_deref());
        config.credentials = UpstreamCredentials::new(
            lookup(ENV_UPSTREAM_URL),
            lookup(ENV_UPSTREAM_USERNAME),
            lookup(ENV_UPSTREAM_PASSWORD),
        );
        let runtime = lookup(ENV_APP_ENV).or_else(|| lookup(ENV_NODE_ENV));
        config.environment = RuntimeEnv::parse(runtime.as_deref());
    }

    /// Load with an explicit environment lookup
    /// Priority: explicit path > built-in defaults; environment always applies on top
    pub fn from_lookup<F>(path: Option<&Path>, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(p) => Self::load_from_file(p)?,
            None => {
                tracing::debug!("No settings file given, using built-in defaults");
                Config::default()
            }
        };

        Self::apply_env(&mut config, lookup);
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Load from the process environment
    /// Priority: explicit path > $CLASSGUARD_CONFIG > built-in defaults
    pub fn load(path: Option<PathBuf>) -> Result<Config> {
        let path = path.or_else(Self::default_config_path);
        Self::from_lookup(path.as_deref(), |key| env::var(key).ok())
    }
}
