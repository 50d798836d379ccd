//! Local JSON API in front of the upstream control proxy

pub mod handlers;
pub mod response;

use crate::error::{ProxyError, Result};
use crate::upstream::UpstreamClient;
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Method, Request, Response};
use response::ResponseBody;

pub const API_PREFIX: &str = "/api/";

/// Routes served by the proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiRoute {
    Status,
    Filters,
    Toggle,
    UpdateFilter,
}

impl ApiRoute {
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "/api/adguard/status" => Some(ApiRoute::Status),
            "/api/adguard/filters" => Some(ApiRoute::Filters),
            "/api/adguard/toggle" => Some(ApiRoute::Toggle),
            "/api/adguard/filters/update" => Some(ApiRoute::UpdateFilter),
            _ => None,
        }
    }

    pub fn method(&self) -> Method {
        match self {
            ApiRoute::Status | ApiRoute::Filters => Method::GET,
            ApiRoute::Toggle | ApiRoute::UpdateFilter => Method::POST,
        }
    }

    fn allow_header(&self) -> &'static str {
        match self {
            ApiRoute::Status | ApiRoute::Filters => "GET",
            ApiRoute::Toggle | ApiRoute::UpdateFilter => "POST",
        }
    }
}

pub fn is_api_path(path: &str) -> bool {
    path.starts_with(API_PREFIX)
}

/// Route one API request; every failure becomes a JSON error response
pub async fn dispatch<B>(
    upstream: &UpstreamClient,
    request: Request<B>,
    max_body_bytes: usize,
) -> Response<ResponseBody>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let path = request.uri().path().to_string();
    match route(upstream, request, max_body_bytes).await {
        Ok(response) => response,
        Err(err) => {
            match err.status().as_u16() {
                400..=499 => tracing::info!("{} -> {}: {}", path, err.status(), err),
                _ => tracing::error!("{} -> {}: {}", path, err.status(), err),
            }
            response::error(&err)
        }
    }
}

async fn route<B>(
    upstream: &UpstreamClient,
    request: Request<B>,
    max_body_bytes: usize,
) -> Result<Response<ResponseBody>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let path = request.uri().path();
    let route = ApiRoute::from_path(path).ok_or_else(|| ProxyError::NotFound {
        path: path.to_string(),
    })?;

    if request.method() != route.method() {
        return Err(ProxyError::MethodNotAllowed {
            method: request.method().to_string(),
            allow: route.allow_header(),
        });
    }

    match route {
        ApiRoute::Status => handlers::get_status(upstream).await,
        ApiRoute::Filters => handlers::get_filters(upstream).await,
        ApiRoute::Toggle => {
            let body = read_body(request, max_body_bytes).await?;
            handlers::toggle_protection(upstream, &body).await
        }
        ApiRoute::UpdateFilter => {
            let body = read_body(request, max_body_bytes).await?;
            handlers::update_filter(upstream, &body).await
        }
    }
}

async fn read_body<B>(request: Request<B>, limit: usize) -> Result<Bytes>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(request.into_body(), limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ProxyError::PayloadTooLarge { limit })
        }
        Err(e) => Err(ProxyError::Validation(format!(
            "failed to read request body: {}",
            e
        ))),
    }
}
