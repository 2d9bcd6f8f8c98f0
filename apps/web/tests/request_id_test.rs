//! # Request ID レイヤーのテスト
//!
//! `build_app` のレイヤー構成で Request ID が付与・伝播されることを検証する。
//!
//! - レスポンスに `X-Request-Id` ヘッダーが含まれる
//! - クライアント提供の `X-Request-Id` がそのまま返される
//! - 自動生成の `X-Request-Id` が UUID v7 形式である
//! - Sitecore への呼び出しに同じ `X-Request-Id` を付与する

mod common;

use common::{get, test_app, web_config};
use http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;
use wiremock::{
    Mock,
    MockServer,
    ResponseTemplate,
    matchers::{header, method, path},
};

#[tokio::test]
async fn test_レスポンスにx_request_idヘッダーが含まれる() {
    let app = test_app(&web_config("http://localhost:9", &[]), None);

    let response = app.router.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("x-request-id"),
        "レスポンスに x-request-id ヘッダーが含まれること"
    );
}

#[tokio::test]
async fn test_クライアント提供のx_request_idがそのまま返される() {
    let app = test_app(&web_config("http://localhost:9", &[]), None);
    let mut request = get("/health");
    request
        .headers_mut()
        .insert("x-request-id", "client-provided-request-id-123".parse().unwrap());

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "client-provided-request-id-123"
    );
}

#[tokio::test]
async fn test_自動生成のx_request_idはuuid_v7形式() {
    let app = test_app(&web_config("http://localhost:9", &[]), None);

    let response = app.router.oneshot(get("/health")).await.unwrap();

    let request_id = response
        .headers()
        .get("x-request-id")
        .unwrap()
        .to_str()
        .unwrap();
    let uuid = uuid::Uuid::parse_str(request_id).expect("UUID としてパースできること");
    assert_eq!(uuid.get_version_num(), 7, "UUID v7 であること");
}

#[tokio::test]
async fn test_sitecoreへの呼び出しにx_request_idを引き継ぐ() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sitecore/api/layout/render/jss"))
        .and(header("x-request-id", "trace-me-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sitecore": { "context": {}, "route": { "name": "home" } }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitecore/api/jss/dictionary/sitegate/en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "phrases": {} })))
        .mount(&server)
        .await;
    let app = test_app(&web_config(&server.uri(), &[]), None);
    let mut request = get("/");
    request
        .headers_mut()
        .insert("x-request-id", "trace-me-123".parse().unwrap());

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
