//! Path and peer-address matching for the gate

use crate::error::ValidationError;
use ipnet::IpNet;
use std::net::IpAddr;
use wildmatch::WildMatch;

/// Paths the gate lets through without looking at the caller
#[derive(Debug, Clone, Default)]
pub struct ExemptMatcher {
    patterns: Vec<WildMatch>,
}

impl ExemptMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut matcher = Self::new();
        for pattern in patterns {
            matcher.add_pattern(pattern.as_ref());
        }
        matcher
    }

    /// Add a wildcard pattern (`*` any run, `?` one character)
    pub fn add_pattern(&mut self, pattern: &str) {
        self.patterns.push(WildMatch::new(pattern));
    }

    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }
}

/// Peer ranges allowed to speak for the client through the forwarding header
#[derive(Debug, Clone, Default)]
pub struct ProxyTrust {
    ranges: Vec<IpNet>,
}

impl ProxyTrust {
    pub fn from_ranges<S: AsRef<str>>(ranges: &[S]) -> Result<Self, ValidationError> {
        let ranges = ranges
            .iter()
            .map(|r| parse_proxy_range(r.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { ranges })
    }

    /// With no ranges configured every peer is trusted
    pub fn trusts(&self, peer: Option<IpAddr>) -> bool {
        if self.ranges.is_empty() {
            return true;
        }

        match peer {
            Some(addr) => {
                let addr = addr.to_canonical();
                self.ranges.iter().any(|net| net.contains(&addr))
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Parse a CIDR range, or a bare address as a single-host range
pub fn parse_proxy_range(range: &str) -> Result<IpNet, ValidationError> {
    let range = range.trim();
    if let Ok(net) = range.parse::<IpNet>() {
        return Ok(net);
    }
    range
        .parse::<IpAddr>()
        .map(IpNet::from)
        .map_err(|_| ValidationError::InvalidCidr {
            cidr: range.to_string(),
        })
}
