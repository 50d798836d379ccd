//! Response builders shared by the gate, the API and the pages

use crate::error::ProxyError;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE, LOCATION};
use hyper::{Response, StatusCode};
use serde::Serialize;

pub type ResponseBody = Full<Bytes>;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";
const HTML: &str = "text/html; charset=utf-8";

fn with_body(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<ResponseBody> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Response<ResponseBody> {
    match serde_json::to_vec(value) {
        Ok(body) => with_body(status, JSON, Bytes::from(body)),
        Err(e) => {
            tracing::error!("Failed to serialize response: {}", e);
            with_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                JSON,
                Bytes::from_static(br#"{"message":"Failed to serialize response"}"#),
            )
        }
    }
}

pub fn error(err: &ProxyError) -> Response<ResponseBody> {
    let mut response = json(err.status(), &err.body());
    if let ProxyError::MethodNotAllowed { allow, .. } = err {
        response
            .headers_mut()
            .insert(ALLOW, HeaderValue::from_static(allow));
    }
    response
}

pub fn text(status: StatusCode, message: &'static str) -> Response<ResponseBody> {
    with_body(status, TEXT, Bytes::from_static(message.as_bytes()))
}

pub fn html(status: StatusCode, page: &'static str) -> Response<ResponseBody> {
    with_body(status, HTML, Bytes::from_static(page.as_bytes()))
}

/// Temporary redirect; the browser repeats the same method
pub fn redirect(location: &str) -> Response<ResponseBody> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::TEMPORARY_REDIRECT;
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(LOCATION, value);
        }
        Err(_) => {
            tracing::warn!("Redirect target {:?} is not a valid header value", location);
            response
                .headers_mut()
                .insert(LOCATION, HeaderValue::from_static("/"));
        }
    }
    response
}
