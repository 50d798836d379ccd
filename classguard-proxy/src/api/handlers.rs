//! The four proxy operations exposed to the dashboard

use super::response::{self, ResponseBody};
use crate::error::{ProxyError, Result};
use crate::upstream::{FilterUpdate, MessageBody, ProtectionToggle, UpstreamClient};
use hyper::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub async fn get_status(upstream: &UpstreamClient) -> Result<Response<ResponseBody>> {
    let state = upstream.status().await?;
    Ok(response::json(StatusCode::OK, &state))
}

pub async fn get_filters(upstream: &UpstreamClient) -> Result<Response<ResponseBody>> {
    let listing = upstream.filters().await?;
    Ok(response::json(StatusCode::OK, &listing))
}

pub async fn toggle_protection(
    upstream: &UpstreamClient,
    body: &[u8],
) -> Result<Response<ResponseBody>> {
    check_configured(upstream)?;
    let toggle: ProtectionToggle = parse_body(body, "expected a boolean `enable` field")?;

    upstream.set_protection(toggle.enable).await?;

    let state = if toggle.enable { "enabled" } else { "disabled" };
    Ok(response::json(
        StatusCode::OK,
        &MessageBody::new(format!("Protection {} successfully", state)),
    ))
}

pub async fn update_filter(
    upstream: &UpstreamClient,
    body: &[u8],
) -> Result<Response<ResponseBody>> {
    check_configured(upstream)?;
    let update: FilterUpdate = parse_body(
        body,
        "expected string `url`, string `name` and boolean `enabled` fields",
    )?;

    upstream.update_filter(&update).await?;

    Ok(response::json(
        StatusCode::OK,
        &MessageBody::new(format!("Filter {} updated successfully", update.name)),
    ))
}

/// Missing credentials are reported before the payload is looked at
fn check_configured(upstream: &UpstreamClient) -> Result<()> {
    let missing = upstream.credentials().missing();
    if missing.is_empty() {
        Ok(())
    } else {
        tracing::error!("Upstream control API not configured, missing {:?}", missing);
        Err(ProxyError::Configuration { missing })
    }
}

/// Bodies must be JSON objects; arrays and scalars are rejected
fn parse_body<T: DeserializeOwned>(body: &[u8], expected: &str) -> Result<T> {
    let rejected = |e: serde_json::Error| {
        tracing::debug!("Rejected request body: {}", e);
        ProxyError::Validation(format!("{} ({})", expected, e))
    };

    let value: Value = serde_json::from_slice(body).map_err(rejected)?;
    if !value.is_object() {
        tracing::debug!("Rejected non-object request body");
        return Err(ProxyError::Validation(format!(
            "{} (body must be a JSON object)",
            expected
        )));
    }

    serde_json::from_value(value).map_err(rejected)
}
