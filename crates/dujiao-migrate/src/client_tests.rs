//! Tests for the admin API client.

use super::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy {
        attempts,
        delay: Duration::from_millis(1),
    }
}

#[test]
fn test_api_response_success_flag() {
    let resp: ApiResponse =
        serde_json::from_str(r#"{"status_code":0,"msg":"","data":{"id":1}}"#).unwrap();
    assert!(resp.is_success());

    let resp: ApiResponse =
        serde_json::from_str(r#"{"status_code":40001,"msg":"slug taken"}"#).unwrap();
    assert!(!resp.is_success());
    assert_eq!(resp.msg, "slug taken");
    assert!(resp.data.is_null());
}

#[test]
fn test_client_trims_trailing_slash() {
    let client = ApiClient::new("http://localhost:8080/api/", RetryPolicy::no_retry());
    assert_eq!(client.base_url(), "http://localhost:8080/api");
    assert_eq!(
        client.endpoint_url("/categories"),
        "http://localhost:8080/api/categories"
    );
}

#[tokio::test]
async fn test_login_stores_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_partial_json(json!({"username": "admin"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 0,
            "msg": "",
            "data": {"token": "tok-123"}
        })))
        .mount(&server)
        .await;

    let mut client = ApiClient::new(server.uri(), RetryPolicy::no_retry());
    client.login("admin", "admin123").await.unwrap();
    assert_eq!(client.token.as_deref(), Some("tok-123"));
}

#[tokio::test]
async fn test_login_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 40101,
            "msg": "bad credentials",
            "data": null
        })))
        .mount(&server)
        .await;

    let mut client = ApiClient::new(server.uri(), RetryPolicy::no_retry());
    let err = client.login("admin", "wrong").await.unwrap_err();
    assert!(matches!(err, Error::Authentication(msg) if msg == "bad credentials"));
}

#[tokio::test]
async fn test_login_missing_token_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 0,
            "msg": "",
            "data": {}
        })))
        .mount(&server)
        .await;

    let mut client = ApiClient::new(server.uri(), RetryPolicy::no_retry());
    assert!(matches!(
        client.login("admin", "admin123").await,
        Err(Error::Authentication(_))
    ));
}

#[tokio::test]
async fn test_post_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/categories"))
        .and(header("Authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 0,
            "msg": "",
            "data": {"id": 5}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = ApiClient::new(server.uri(), RetryPolicy::no_retry());
    client.token = Some("tok-123".to_string());
    let resp = client
        .post("/categories", &json!({"slug": "a"}))
        .await
        .unwrap();
    assert!(resp.is_success());
    assert_eq!(resp.data["id"], 5);
}

#[tokio::test]
async fn test_post_retries_transport_failures() {
    let server = MockServer::start().await;
    // First attempt: unparsable body forces a decode failure.
    Mock::given(method("POST"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 0,
            "msg": "",
            "data": {"id": 9}
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri(), fast_retry(3));
    let resp = client
        .post("/categories", &json!({"slug": "a"}))
        .await
        .unwrap();
    assert_eq!(resp.data["id"], 9);
}

#[tokio::test]
async fn test_post_does_not_retry_application_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 1,
            "msg": "slug already exists",
            "data": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri(), fast_retry(3));
    let resp = client.post("/products", &json!({"slug": "a"})).await.unwrap();
    assert!(!resp.is_success());
    assert_eq!(resp.msg, "slug already exists");
}

#[tokio::test]
async fn test_post_exhausts_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(2)
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri(), fast_retry(2));
    let err = client
        .post("/categories", &json!({"slug": "a"}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RetriesExhausted { attempts: 2, .. }));
}

#[tokio::test]
async fn test_get_decodes_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 0,
            "msg": "",
            "data": [{"id": 1, "slug": "games"}]
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(server.uri(), RetryPolicy::no_retry());
    let resp = client.get("/categories?page=1&page_size=100").await.unwrap();
    assert!(resp.is_success());
    assert!(resp.data.is_array());
}

#[tokio::test]
async fn test_upload_file_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status_code": 0,
            "msg": "",
            "data": {"url": "https://cdn.example.com/goods/x.png"}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("x.png");
    std::fs::write(&file, b"png-bytes").unwrap();

    let client = ApiClient::new(server.uri(), RetryPolicy::no_retry());
    let resp = client.upload_file(&file).await.unwrap();
    assert_eq!(
        resp.data["url"].as_str().unwrap(),
        "https://cdn.example.com/goods/x.png"
    );
}
