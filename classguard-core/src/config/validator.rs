//! Configuration validation

use super::schema::Config;
use crate::error::{Result, ValidationError};
use crate::gate::matcher::parse_proxy_range;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the entire configuration
    pub fn validate(config: &Config) -> Result<()> {
        Self::validate_patterns(config)?;
        Self::validate_trusted_proxies(config)?;
        Self::validate_redirects(config)?;
        Self::validate_timeouts(config)?;
        Self::validate_upstream_url(config)?;
        Ok(())
    }

    /// Exempt patterns must be absolute paths without control characters
    fn validate_patterns(config: &Config) -> Result<()> {
        for pattern in &config.gate.exempt_paths {
            if !pattern.starts_with('/') || pattern.contains("**") {
                return Err(ValidationError::InvalidPattern {
                    pattern: pattern.clone(),
                }
                .into());
            }

            if pattern.contains('\0') || pattern.contains('\n') {
                return Err(ValidationError::InvalidPattern {
                    pattern: pattern.escape_debug().to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    fn validate_trusted_proxies(config: &Config) -> Result<()> {
        for range in &config.gate.trusted_proxies {
            parse_proxy_range(range)?;
        }
        Ok(())
    }

    fn validate_redirects(config: &Config) -> Result<()> {
        for target in [&config.gate.teacher_home, &config.gate.forbidden_path] {
            // `//host` would be read by browsers as a protocol-relative URL
            if !target.starts_with('/') || target.starts_with("//") {
                return Err(ValidationError::InvalidRedirect {
                    target: target.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn validate_timeouts(config: &Config) -> Result<()> {
        let upstream = &config.upstream;
        let timeouts = [
            ("status", upstream.status_timeout_ms),
            ("filters", upstream.filters_timeout_ms),
            ("toggle", upstream.toggle_timeout_ms),
            ("update", upstream.update_timeout_ms),
        ];

        for (operation, millis) in timeouts {
            if millis == 0 {
                return Err(ValidationError::ZeroTimeout { operation }.into());
            }
        }
        Ok(())
    }

    /// A missing URL is reported per request; a malformed one is caught here
    fn validate_upstream_url(config: &Config) -> Result<()> {
        if let Some(url) = &config.credentials.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ValidationError::InvalidUpstreamUrl { url: url.clone() }.into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::UpstreamCredentials;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ConfigValidator::validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_relative_pattern_rejected() {
        let mut config = Config::default();
        config.gate.exempt_paths.push("static/*".to_string());
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_bad_cidr_rejected() {
        let mut config = Config::default();
        config.gate.trusted_proxies.push("10.0.0.0/33".to_string());
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_protocol_relative_redirect_rejected() {
        let mut config = Config::default();
        config.gate.forbidden_path = "//evil.example".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.upstream.update_timeout_ms = 0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_upstream_url_scheme() {
        let mut config = Config::default();
        config.credentials = UpstreamCredentials::new(Some("adguard:3000".to_string()), None, None);
        assert!(ConfigValidator::validate(&config).is_err());

        config.credentials =
            UpstreamCredentials::new(Some("https://adguard:3000".to_string()), None, None);
        assert!(ConfigValidator::validate(&config).is_ok());
    }
}
