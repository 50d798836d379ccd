use classguard_core::{AccessPolicy, Config, RuntimeEnv, UpstreamCredentials};
use classguard_proxy::{ProxyServer, ProxyServerConfig};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEACHER: &str = "10.0.0.5";
const STUDENT: &str = "10.0.0.9";

async fn spawn_server(upstream_uri: Option<String>, teacher_ips: Option<&str>) -> SocketAddr {
    let mut config = Config::default();
    config.access = AccessPolicy::from_env_value(teacher_ips);
    config.environment = RuntimeEnv::Production;
    config.credentials = UpstreamCredentials::new(
        upstream_uri,
        Some("admin".to_string()),
        Some("secret".to_string()),
    );

    let server_config = ProxyServerConfig::from_config(&config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let server = ProxyServer::new(server_config);
        let _ = server.serve(listener, std::future::pending()).await;
    });

    addr
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_teacher_reads_status_through_gate() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/control/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "protection_enabled": true,
            "running": true,
            "version": "v0.107.43"
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let addr = spawn_server(Some(upstream.uri()), Some(TEACHER)).await;

    let response = client()
        .get(format!("http://{}/api/adguard/status", addr))
        .header("X-Forwarded-For", TEACHER)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["protection_enabled"], json!(true));
    assert_eq!(body["version"], json!("v0.107.43"));
}

#[tokio::test]
async fn test_student_is_redirected_before_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let addr = spawn_server(Some(upstream.uri()), Some(TEACHER)).await;

    let response = client()
        .post(format!("http://{}/api/adguard/toggle", addr))
        .header("X-Forwarded-For", STUDENT)
        .json(&json!({ "enable": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()["location"], "/forbidden");
}

#[tokio::test]
async fn test_landing_page_routing() {
    let addr = spawn_server(None, Some(TEACHER)).await;
    let client = client();

    let student = client
        .get(format!("http://{}/", addr))
        .header("X-Forwarded-For", STUDENT)
        .send()
        .await
        .unwrap();
    assert_eq!(student.status(), StatusCode::OK);

    let teacher = client
        .get(format!("http://{}/", addr))
        .header("X-Forwarded-For", TEACHER)
        .send()
        .await
        .unwrap();
    assert_eq!(teacher.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(teacher.headers()["location"], "/teacher");
}

#[tokio::test]
async fn test_upstream_unauthorized_surfaces_as_401() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/control/filtering/status"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&upstream)
        .await;

    let addr = spawn_server(Some(upstream.uri()), Some(TEACHER)).await;

    let response = client()
        .get(format!("http://{}/api/adguard/filters", addr))
        .header("X-Forwarded-For", TEACHER)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("authentication"));
}

#[tokio::test]
async fn test_invalid_toggle_payload_is_400() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let addr = spawn_server(Some(upstream.uri()), Some(TEACHER)).await;

    let response = client()
        .post(format!("http://{}/api/adguard/toggle", addr))
        .header("X-Forwarded-For", TEACHER)
        .json(&json!({ "enable": "yes" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unconfigured_allow_list_fails_closed() {
    let addr = spawn_server(None, None).await;

    let response = client()
        .get(format!("http://{}/teacher", addr))
        .header("X-Forwarded-For", TEACHER)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text().await.unwrap(), "Server configuration error");
}
