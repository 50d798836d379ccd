//! Client for the filtering appliance's control API

use super::types::{
    FilterListing, FilterUpdate, FilteringStatus, ProtectionState, ProtectionToggle, SetFilterUrl,
};
use crate::error::{ProxyError, Result};
use bytes::Bytes;
use classguard_core::{UpstreamCredentials, UpstreamSettings};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed control API routes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEndpoint {
    Status,
    FilteringStatus,
    Protection,
    SetFilterUrl,
}

impl ControlEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            ControlEndpoint::Status => "/control/status",
            ControlEndpoint::FilteringStatus => "/control/filtering/status",
            ControlEndpoint::Protection => "/control/protection",
            ControlEndpoint::SetFilterUrl => "/control/filtering/set_url",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            ControlEndpoint::Status | ControlEndpoint::FilteringStatus => Method::GET,
            ControlEndpoint::Protection | ControlEndpoint::SetFilterUrl => Method::POST,
        }
    }

    /// Reads get the short timeout, mutations the longer ones
    pub fn timeout(&self, settings: &UpstreamSettings) -> Duration {
        match self {
            ControlEndpoint::Status => settings.status_timeout(),
            ControlEndpoint::FilteringStatus => settings.filters_timeout(),
            ControlEndpoint::Protection => settings.toggle_timeout(),
            ControlEndpoint::SetFilterUrl => settings.update_timeout(),
        }
    }
}

/// Stateless forwarding client; one outbound call per operation, no retries
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    credentials: UpstreamCredentials,
    settings: UpstreamSettings,
}

impl UpstreamClient {
    pub fn new(credentials: UpstreamCredentials, settings: UpstreamSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ProxyError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            credentials,
            settings,
        })
    }

    pub fn credentials(&self) -> &UpstreamCredentials {
        &self.credentials
    }

    /// `GET /control/status`
    pub async fn status(&self) -> Result<ProtectionState> {
        self.call(ControlEndpoint::Status, None::<&()>, decode_json).await
    }

    /// `GET /control/filtering/status`, blank user rules removed
    pub async fn filters(&self) -> Result<FilterListing> {
        let status: FilteringStatus = self
            .call(ControlEndpoint::FilteringStatus, None::<&()>, decode_json)
            .await?;
        let listing = FilterListing::from(status);
        info!(
            "Fetched {} filters and {} non-empty user rules",
            listing.filters.len(),
            listing.user_rules.len()
        );
        Ok(listing)
    }

    /// `POST /control/protection`
    pub async fn set_protection(&self, enable: bool) -> Result<()> {
        self.call(
            ControlEndpoint::Protection,
            Some(&ProtectionToggle { enable }),
            ignore_body,
        )
        .await?;
        info!(
            "Protection {} on upstream",
            if enable { "enabled" } else { "disabled" }
        );
        Ok(())
    }

    /// `POST /control/filtering/set_url`
    pub async fn update_filter(&self, update: &FilterUpdate) -> Result<()> {
        self.call(
            ControlEndpoint::SetFilterUrl,
            Some(&SetFilterUrl::blocklist(update)),
            ignore_body,
        )
        .await?;
        info!(
            "Filter {} ({}) set to enabled={}",
            update.name, update.url, update.enabled
        );
        Ok(())
    }

    /// Make one authenticated call and classify every failure mode.
    ///
    /// Nothing is sent unless all three credentials are configured.
    pub async fn call<B, T, F>(&self, endpoint: ControlEndpoint, body: Option<&B>, map: F) -> Result<T>
    where
        B: Serialize + ?Sized,
        F: FnOnce(Bytes) -> Result<T>,
    {
        let (base_url, username, password) = match (
            self.credentials.base_url(),
            self.credentials.username.as_deref(),
            self.credentials.password.as_deref(),
        ) {
            (Some(url), Some(user), Some(pass)) => (url, user, pass),
            _ => {
                let missing = self.credentials.missing();
                tracing::error!("Upstream control API not configured, missing {:?}", missing);
                return Err(ProxyError::Configuration { missing });
            }
        };

        let url = format!("{}{}", base_url, endpoint.path());
        let timeout = endpoint.timeout(&self.settings);
        debug!("{} {} (timeout {:?})", endpoint.method(), url, timeout);

        let mut request = self
            .http
            .request(endpoint.method(), &url)
            .basic_auth(username, Some(password))
            .timeout(timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!("Upstream {} failed: {}", endpoint.path(), e);
            ProxyError::from_transport(e)
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("Upstream rejected credentials for {}", endpoint.path());
            return Err(ProxyError::UpstreamAuth);
        }

        if !status.is_success() {
            let details = error_details(endpoint, response.bytes().await);
            warn!(
                "Upstream {} responded {}: {:?}",
                endpoint.path(),
                status,
                details
            );
            return Err(ProxyError::UpstreamResponse {
                status: status.as_u16(),
                details,
            });
        }

        let bytes = response.bytes().await.map_err(ProxyError::from_transport)?;
        map(bytes)
    }
}

fn decode_json<T: DeserializeOwned>(bytes: Bytes) -> Result<T> {
    serde_json::from_slice(&bytes).map_err(|e| ProxyError::Decode(e.to_string()))
}

/// Mutating endpoints answer with an empty body or a bare "OK"
fn ignore_body(_: Bytes) -> Result<()> {
    Ok(())
}

/// Details of an error response; a body that cannot be read is logged and left out
fn error_details(endpoint: ControlEndpoint, body: reqwest::Result<Bytes>) -> Option<Value> {
    match body {
        Ok(bytes) => parse_details(&bytes),
        Err(e) => {
            warn!(
                "Could not read upstream error body from {}: {}",
                endpoint.path(),
                e
            );
            None
        }
    }
}

/// Upstream error body as JSON if possible, else as text; nothing if empty
fn parse_details(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(bytes).ok().or_else(|| {
        Some(Value::String(
            String::from_utf8_lossy(bytes).trim().to_string(),
        ))
    })
}
