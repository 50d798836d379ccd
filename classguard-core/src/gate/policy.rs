//! Access gate evaluating every inbound request

use super::identity::ClientIdentity;
use super::matcher::{ExemptMatcher, ProxyTrust};
use crate::config::{AccessPolicy, Config, RuntimeEnv};
use crate::error::{GateError, Result};
use std::net::IpAddr;

/// What the gate needs to know about a request
#[derive(Debug, Clone, Copy, Default)]
pub struct GateRequest<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
    /// Raw forwarding header value
    pub forwarded_for: Option<&'a str>,
    /// TCP peer of the connection
    pub peer: Option<IpAddr>,
}

impl<'a> GateRequest<'a> {
    pub fn new(path: &'a str) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    pub fn forwarded_for(mut self, value: &'a str) -> Self {
        self.forwarded_for = Some(value);
        self
    }

    pub fn peer(mut self, peer: IpAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn query(mut self, query: &'a str) -> Self {
        self.query = Some(query);
        self
    }
}

/// Outcome of gate evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    PassThrough,
    Redirect { location: String },
    Fail(GateError),
}

/// Decides per request whether the caller is a teacher and routes accordingly
///
/// Evaluation never performs I/O: configuration is resolved once at
/// construction and only string comparisons happen per request.
#[derive(Debug, Clone)]
pub struct AccessGate {
    policy: AccessPolicy,
    environment: RuntimeEnv,
    exempt: ExemptMatcher,
    trust: ProxyTrust,
    teacher_home: String,
    forbidden_path: String,
}

impl AccessGate {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            policy: config.access.clone(),
            environment: config.environment.clone(),
            exempt: ExemptMatcher::from_patterns(config.gate.exempt_paths.as_slice()),
            trust: ProxyTrust::from_ranges(config.gate.trusted_proxies.as_slice())?,
            teacher_home: config.gate.teacher_home.clone(),
            forbidden_path: config.gate.forbidden_path.clone(),
        })
    }

    /// Whether the gate skips this path entirely
    ///
    /// The forbidden destination is always exempt, whatever the configured patterns.
    pub fn is_exempt(&self, path: &str) -> bool {
        path == self.forbidden_path || self.exempt.matches(path)
    }

    /// True when the forwarding header is believed from any peer
    pub fn trusts_any_forwarder(&self) -> bool {
        self.trust.is_empty()
    }

    /// Resolve who is calling, ignoring the header from untrusted peers
    pub fn identify(&self, request: &GateRequest<'_>) -> ClientIdentity {
        let forwarded_for = match request.forwarded_for {
            Some(value) if self.trust.trusts(request.peer) => Some(value),
            Some(_) => {
                tracing::warn!(
                    "Ignoring forwarding header from untrusted peer {:?}",
                    request.peer
                );
                None
            }
            None => None,
        };

        ClientIdentity::resolve(forwarded_for, &self.policy, &self.environment)
    }

    pub fn is_privileged(&self, identity: &ClientIdentity) -> bool {
        identity
            .address()
            .map(|addr| self.policy.contains(addr))
            .unwrap_or(false)
    }

    pub fn evaluate(&self, request: &GateRequest<'_>) -> GateDecision {
        if self.is_exempt(request.path) {
            return GateDecision::PassThrough;
        }

        if let Err(e) = self.policy.check() {
            tracing::error!("Refusing {}: {}", request.path, e);
            return GateDecision::Fail(e);
        }

        let identity = self.identify(request);
        let privileged = self.is_privileged(&identity);

        tracing::debug!(
            "Gate: client={:?} path={} privileged={}",
            identity.address(),
            request.path,
            privileged
        );

        match (privileged, request.path == "/") {
            (true, true) => self.redirect(&self.teacher_home, request.query),
            (true, false) => GateDecision::PassThrough,
            (false, true) => GateDecision::PassThrough,
            (false, false) => {
                tracing::info!(
                    "Blocking non-teacher access to {} (client {:?})",
                    request.path,
                    identity.address()
                );
                self.redirect(&self.forbidden_path, request.query)
            }
        }
    }

    fn redirect(&self, target: &str, query: Option<&str>) -> GateDecision {
        let location = match query {
            Some(q) if !q.is_empty() => format!("{}?{}", target, q),
            _ => target.to_string(),
        };
        GateDecision::Redirect { location }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate_with(teacher_ips: Option<&str>, environment: RuntimeEnv) -> AccessGate {
        let mut config = Config::default();
        config.access = AccessPolicy::from_env_value(teacher_ips);
        config.environment = environment;
        AccessGate::new(&config).unwrap()
    }

    fn redirect_to(location: &str) -> GateDecision {
        GateDecision::Redirect {
            location: location.to_string(),
        }
    }

    #[test]
    fn test_teacher_management_passes_and_student_redirected() {
        let gate = gate_with(Some("10.0.0.5"), RuntimeEnv::Production);

        let teacher = GateRequest::new("/management").forwarded_for("10.0.0.5");
        assert_eq!(gate.evaluate(&teacher), GateDecision::PassThrough);

        let student = GateRequest::new("/management").forwarded_for("10.0.0.9");
        assert_eq!(gate.evaluate(&student), redirect_to("/forbidden"));
    }

    #[test]
    fn test_root_routing() {
        let gate = gate_with(Some("10.0.0.5"), RuntimeEnv::Production);

        let teacher = GateRequest::new("/").forwarded_for("10.0.0.5");
        assert_eq!(gate.evaluate(&teacher), redirect_to("/teacher"));

        let student = GateRequest::new("/").forwarded_for("10.0.0.9");
        assert_eq!(gate.evaluate(&student), GateDecision::PassThrough);
    }

    #[test]
    fn test_unknown_identity_is_ordinary() {
        let gate = gate_with(Some("10.0.0.5"), RuntimeEnv::Production);
        assert_eq!(gate.evaluate(&GateRequest::new("/")), GateDecision::PassThrough);
        assert_eq!(
            gate.evaluate(&GateRequest::new("/api/adguard/status")),
            redirect_to("/forbidden")
        );
    }

    #[test]
    fn test_prefix_does_not_match() {
        let gate = gate_with(Some("10.0.0.1x"), RuntimeEnv::Production);
        let request = GateRequest::new("/teacher").forwarded_for("10.0.0.1");
        assert_eq!(gate.evaluate(&request), redirect_to("/forbidden"));
    }

    #[test]
    fn test_fails_closed_without_allow_list() {
        for raw in [None, Some(""), Some(" , ")] {
            let gate = gate_with(raw, RuntimeEnv::Development);
            for path in ["/", "/teacher", "/api/adguard/toggle"] {
                let request = GateRequest::new(path).forwarded_for("10.0.0.5");
                assert!(matches!(gate.evaluate(&request), GateDecision::Fail(_)));
            }
        }
    }

    #[test]
    fn test_exempt_paths_skip_gate() {
        let gate = gate_with(None, RuntimeEnv::Production);
        assert_eq!(
            gate.evaluate(&GateRequest::new("/forbidden")),
            GateDecision::PassThrough
        );
        assert_eq!(
            gate.evaluate(&GateRequest::new("/_next/static/app.js")),
            GateDecision::PassThrough
        );
        assert_eq!(
            gate.evaluate(&GateRequest::new("/favicon.ico")),
            GateDecision::PassThrough
        );
    }

    #[test]
    fn test_custom_forbidden_path_never_redirects_to_itself() {
        let mut config = Config::default();
        config.access = AccessPolicy::from_env_value(Some("10.0.0.5"));
        config.environment = RuntimeEnv::Production;
        config.gate.forbidden_path = "/blocked".to_string();
        config.gate.exempt_paths = Vec::new();
        let gate = AccessGate::new(&config).unwrap();

        let student = GateRequest::new("/blocked").forwarded_for("10.0.0.9");
        assert_eq!(gate.evaluate(&student), GateDecision::PassThrough);

        let student = GateRequest::new("/teacher").forwarded_for("10.0.0.9");
        assert_eq!(gate.evaluate(&student), redirect_to("/blocked"));
    }

    #[test]
    fn test_development_bypass_grants_teacher() {
        let gate = gate_with(Some("10.0.0.5"), RuntimeEnv::Development);
        assert_eq!(gate.evaluate(&GateRequest::new("/")), redirect_to("/teacher"));

        let gate = gate_with(Some("10.0.0.5"), RuntimeEnv::Production);
        assert_eq!(gate.evaluate(&GateRequest::new("/")), GateDecision::PassThrough);
    }

    #[test]
    fn test_redirect_keeps_query() {
        let gate = gate_with(Some("10.0.0.5"), RuntimeEnv::Production);
        let request = GateRequest::new("/adguard")
            .forwarded_for("10.0.0.9")
            .query("tab=filters");
        assert_eq!(gate.evaluate(&request), redirect_to("/forbidden?tab=filters"));
    }

    #[test]
    fn test_untrusted_peer_header_ignored() {
        let mut config = Config::default();
        config.access = AccessPolicy::from_env_value(Some("10.0.0.5"));
        config.environment = RuntimeEnv::Production;
        config.gate.trusted_proxies = vec!["127.0.0.1".to_string()];
        let gate = AccessGate::new(&config).unwrap();

        let forged = GateRequest::new("/teacher")
            .forwarded_for("10.0.0.5")
            .peer("203.0.113.7".parse().unwrap());
        assert_eq!(gate.evaluate(&forged), redirect_to("/forbidden"));

        let proxied = GateRequest::new("/teacher")
            .forwarded_for("10.0.0.5")
            .peer("127.0.0.1".parse().unwrap());
        assert_eq!(gate.evaluate(&proxied), GateDecision::PassThrough);
    }
}
