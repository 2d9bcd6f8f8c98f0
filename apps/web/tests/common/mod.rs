//! 結合テスト共通のセットアップ
//!
//! Redis の代わりにインメモリストアを使い、Sitecore と ID プロバイダは wiremock で模擬する。

#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use axum::{Router, body::Body, response::Response};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{TimeZone, Utc};
use serde_json::Value;
use sitegate_domain::clock::FixedClock;
use sitegate_infra::mock::{InMemorySessionStore, InMemorySignInStateStore};
use sitegate_web::{
    app_builder::{AppDependencies, build_app},
    client::AzureAdB2cProvider,
    config::WebConfig,
};

pub const PUBLIC_URL: &str = "http://localhost:3000";

pub struct TestApp {
    pub router:              Router,
    pub session_store:       InMemorySessionStore,
    pub sign_in_state_store: InMemorySignInStateStore,
}

/// テスト用の設定
///
/// `overrides` で任意の環境変数を上書きする。
pub fn web_config(sitecore_host: &str, overrides: &[(&'static str, &str)]) -> WebConfig {
    let mut vars: HashMap<&'static str, String> = [
        ("WEB_PORT", "3000"),
        ("PUBLIC_URL", PUBLIC_URL),
        ("REDIS_URL", "redis://localhost:6379"),
        ("SITECORE_API_KEY", "{API-KEY}"),
        ("JSS_APP_NAME", "sitegate"),
        ("AZURE_AD_B2C_TENANT_NAME", "contoso"),
        ("AZURE_AD_B2C_CLIENT_ID", "client-id"),
        ("AZURE_AD_B2C_CLIENT_SECRET", "client-secret"),
        ("AZURE_AD_B2C_PRIMARY_USER_FLOW", "B2C_1_signupsignin"),
    ]
    .into_iter()
    .map(|(k, v)| (k, v.to_string()))
    .collect();
    vars.insert("SITECORE_API_HOST", sitecore_host.to_string());
    for (name, value) in overrides {
        vars.insert(*name, value.to_string());
    }

    WebConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

/// テスト用アプリを構築する
///
/// `authority` を指定すると ID プロバイダのエンドポイントをそこへ向ける。
pub fn test_app(config: &WebConfig, authority: Option<&str>) -> TestApp {
    let session_store = InMemorySessionStore::new();
    let sign_in_state_store = InMemorySignInStateStore::new();

    let mut provider =
        AzureAdB2cProvider::new(&config.azure_ad_b2c, &config.public_url, reqwest::Client::new());
    if let Some(authority) = authority {
        provider = provider.with_authority(authority);
    }

    let deps = AppDependencies {
        sitecore_client:     reqwest::Client::new(),
        identity_provider:   Arc::new(provider),
        session_store:       Arc::new(session_store.clone()),
        sign_in_state_store: Arc::new(sign_in_state_store.clone()),
        clock:               Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap(),
        )),
        readiness_state:     None,
    };

    TestApp {
        router: build_app(config, deps),
        session_store,
        sign_in_state_store,
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn get(uri: &str) -> http::Request<Body> {
    http::Request::builder()
        .uri(uri)
        .header("host", "localhost:3000")
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> http::Request<Body> {
    http::Request::builder()
        .uri(uri)
        .header("host", "localhost:3000")
        .header("cookie", cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

/// 署名なしの ID トークンを組み立てる
pub fn encode_id_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
