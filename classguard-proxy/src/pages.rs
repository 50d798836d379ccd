//! Placeholder pages for the routes the gate protects
//!
//! The real dashboard UI is served separately; these only give pass-through
//! requests somewhere to land.

use crate::api::response::{self, ResponseBody};
use hyper::{Response, StatusCode};

const LANDING: &str = r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8"><title>Classroom network</title></head>
<body><main><h1>Classroom network</h1>
<p>Website filtering on this network is managed by your teacher.</p></main></body></html>
"#;

const TEACHER: &str = r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8"><title>Teacher console</title></head>
<body><main><h1>Teacher console</h1>
<p><a href="/adguard">Manage website filters</a></p></main></body></html>
"#;

const MANAGEMENT: &str = r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8"><title>Filter management</title></head>
<body><main><h1>Filter management</h1>
<p>Status: <code>GET /api/adguard/status</code></p>
<p>Filters: <code>GET /api/adguard/filters</code></p></main></body></html>
"#;

const FORBIDDEN: &str = r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8"><title>Access denied</title></head>
<body><main><h1>Access denied</h1>
<p>The network address you are using is not allowed to open this page.</p>
<p><a href="/">Back to start</a></p></main></body></html>
"#;

const NOT_FOUND: &str = r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8"><title>Not found</title></head>
<body><main><h1>Not found</h1><p><a href="/">Back to start</a></p></main></body></html>
"#;

pub fn render(path: &str) -> Response<ResponseBody> {
    match path {
        "/" => response::html(StatusCode::OK, LANDING),
        "/teacher" => response::html(StatusCode::OK, TEACHER),
        "/adguard" | "/management" => response::html(StatusCode::OK, MANAGEMENT),
        "/forbidden" => response::html(StatusCode::OK, FORBIDDEN),
        _ => response::html(StatusCode::NOT_FOUND, NOT_FOUND),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_pages() {
        assert_eq!(render("/").status(), StatusCode::OK);
        assert_eq!(render("/teacher").status(), StatusCode::OK);
        assert_eq!(render("/management").status(), StatusCode::OK);
        assert_eq!(render("/forbidden").status(), StatusCode::OK);
        assert_eq!(render("/missing").status(), StatusCode::NOT_FOUND);
    }
}
