//! Client identity resolution

use crate::config::{AccessPolicy, RuntimeEnv};

/// Header carrying the original client address, set by the fronting proxy
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Where a resolved address came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    ForwardedHeader,
    /// First allow-list entry, outside production only
    DevelopmentBypass,
    Unknown,
}

/// The caller's address as far as the gate can tell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    address: Option<String>,
    source: IdentitySource,
}

impl ClientIdentity {
    pub fn unknown() -> Self {
        Self {
            address: None,
            source: IdentitySource::Unknown,
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn source(&self) -> IdentitySource {
        self.source
    }

    /// Resolve from the forwarding header value, if one is to be believed.
    ///
    /// A present header always wins, even when its first entry is blank.
    pub fn resolve(
        forwarded_for: Option<&str>,
        policy: &AccessPolicy,
        environment: &RuntimeEnv,
    ) -> Self {
        if let Some(header) = forwarded_for {
            let first = header.split(',').next().unwrap_or_default().trim();
            tracing::debug!("Client address from {}: {:?}", FORWARDED_FOR_HEADER, first);
            return Self {
                address: (!first.is_empty()).then(|| first.to_string()),
                source: IdentitySource::ForwardedHeader,
            };
        }

        if !environment.is_production() && policy.is_configured() {
            match policy.bypass_identity() {
                Some(addr) => {
                    tracing::warn!(
                        "Non-production mode: using first teacher address ({}) as client identity",
                        addr
                    );
                    return Self {
                        address: Some(addr.to_string()),
                        source: IdentitySource::DevelopmentBypass,
                    };
                }
                None => {
                    tracing::error!(
                        "Non-production mode: TEACHER_IPS is set but its first entry is empty"
                    );
                }
            }
        }

        tracing::debug!(
            "No {} header and no development bypass; client address unknown",
            FORWARDED_FOR_HEADER
        );
        Self::unknown()
    }
}
