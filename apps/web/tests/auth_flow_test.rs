//! # サインインフローの結合テスト
//!
//! ID プロバイダのトークンエンドポイントを wiremock で模擬し、
//! サインイン → コールバック → セッション取得 → サインアウトの一連の流れを検証する。

mod common;

use std::collections::HashMap;

use axum::body::Body;
use common::{
    PUBLIC_URL,
    TestApp,
    body_json,
    encode_id_token,
    get,
    get_with_cookie,
    location,
    test_app,
    web_config,
};
use http::{Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;
use wiremock::{
    Mock,
    MockServer,
    ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

async fn mount_token_endpoint(server: &MockServer) {
    let id_token = encode_id_token(&json!({
        "sub": "b2c-user-1",
        "name": "Taro Yamada",
        "emails": ["taro@example.com"]
    }));
    Mock::given(method("POST"))
        .and(path("/oauth2/v2.0/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code"))
        .and(body_string_contains("client_secret=client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": "access",
            "id_token": id_token,
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

/// サインインを開始し、保存された `state` を返す
async fn start_sign_in(app: &TestApp, callback_url: &str) -> (String, HashMap<String, String>) {
    let response = app
        .router
        .clone()
        .oneshot(get(&format!(
            "/api/auth/signin?callbackUrl={}",
            urlencoding::encode(callback_url)
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let authorize = url::Url::parse(&location(&response)).unwrap();
    let query: HashMap<String, String> = authorize.query_pairs().into_owned().collect();
    (query["state"].clone(), query)
}

fn session_cookie(response: &axum::response::Response) -> String {
    let set_cookie = response
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_サインインからサインアウトまでの一連フロー() {
    let idp = MockServer::start().await;
    mount_token_endpoint(&idp).await;
    let app = test_app(&web_config("http://localhost:9", &[]), Some(&idp.uri()));

    // サインイン開始
    let (state, authorize_query) = start_sign_in(&app, "/members?tab=1").await;
    assert_eq!(authorize_query["code_challenge_method"], "S256");
    assert_eq!(
        authorize_query["redirect_uri"],
        format!("{PUBLIC_URL}/api/auth/callback/azure-ad-b2c")
    );
    let pending = app.sign_in_state_store.get(&state).unwrap();
    assert_eq!(pending.callback_url, format!("{PUBLIC_URL}/members?tab=1"));

    // コールバック
    let response = app
        .router
        .clone()
        .oneshot(get(&format!(
            "/api/auth/callback/azure-ad-b2c?code=auth-code&state={state}"
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("{PUBLIC_URL}/members?tab=1"));
    let cookie = session_cookie(&response);
    let session_id = cookie.trim_start_matches("session_id=").to_string();
    assert!(app.session_store.contains(&session_id));
    assert!(app.sign_in_state_store.get(&state).is_none());

    // トークン交換で PKCE 検証子を送っている
    let requests = idp.received_requests().await.unwrap();
    let token_body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(token_body.contains(&format!("code_verifier={}", pending.code_verifier)));

    // セッション取得
    let response = app
        .router
        .clone()
        .oneshot(get_with_cookie("/api/auth/session", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["name"], "Taro Yamada");
    assert_eq!(body["user"]["email"], "taro@example.com");
    assert_eq!(body["expires"], "2026-05-01T09:00:00Z");
    assert!(body["id_token"].as_str().unwrap().ends_with(".signature"));

    // サインアウト
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/signout")
                .header("cookie", &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/");
    let cleared = response.headers().get("set-cookie").unwrap().to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"), "{cleared}");
    assert!(!app.session_store.contains(&session_id));

    // サインアウト後は空のセッション
    let response = app
        .router
        .oneshot(get_with_cookie("/api/auth/session", &cookie))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!({}));
}

#[tokio::test]
async fn test_stateは一度しか使えない() {
    let idp = MockServer::start().await;
    mount_token_endpoint(&idp).await;
    let app = test_app(&web_config("http://localhost:9", &[]), Some(&idp.uri()));
    let (state, _) = start_sign_in(&app, "/").await;
    let callback = format!("/api/auth/callback/azure-ad-b2c?code=auth-code&state={state}");

    let first = app.router.clone().oneshot(get(&callback)).await.unwrap();
    let second = app.router.oneshot(get(&callback)).await.unwrap();

    assert_eq!(first.status(), StatusCode::FOUND);
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(second).await["type"], "sign-in-state-expired");
}

#[tokio::test]
async fn test_他オリジンの戻り先は公開urlに置き換える() {
    let app = test_app(&web_config("http://localhost:9", &[]), None);

    let (state, _) = start_sign_in(&app, "https://evil.example.com/").await;

    assert_eq!(
        app.sign_in_state_store.get(&state).unwrap().callback_url,
        PUBLIC_URL
    );
}

#[tokio::test]
async fn test_トークン交換に失敗すると502() {
    let idp = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&idp)
        .await;
    let app = test_app(&web_config("http://localhost:9", &[]), Some(&idp.uri()));
    let (state, _) = start_sign_in(&app, "/").await;

    let response = app
        .router
        .oneshot(get(&format!(
            "/api/auth/callback/azure-ad-b2c?code=bad&state={state}"
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(!response.headers().contains_key("set-cookie"));
}

#[tokio::test]
async fn test_プロバイダの認可エラーは400() {
    let app = test_app(&web_config("http://localhost:9", &[]), None);

    let response = app
        .router
        .oneshot(get(
            "/api/auth/callback/azure-ad-b2c?error=access_denied&error_description=cancelled",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_不明なプロバイダは404() {
    let app = test_app(&web_config("http://localhost:9", &[]), None);

    let response = app
        .router
        .oneshot(get("/api/auth/callback/github?code=c&state=s"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_セッションがなければ空オブジェクト() {
    let app = test_app(&web_config("http://localhost:9", &[]), None);

    let response = app.router.oneshot(get("/api/auth/session")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({}));
}
