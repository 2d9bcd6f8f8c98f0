//! # 認証ヘルパー
//!
//! - 受信リクエストの Cookie からセッションを解決する [`SessionLookup`]
//! - セッション Cookie の構築
//! - サインイン後の戻り先 URL の検証
//! - PKCE（S256）と `state` の生成

use std::sync::Arc;

use async_trait::async_trait;
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use http::HeaderMap;
use sha2::{Digest, Sha256};
use sitegate_domain::{
    auth::{SESSION_MAX_AGE_SECONDS, Session, jwt, session},
    clock::Clock,
};
use sitegate_infra::{InfraError, SessionStore};
use url::Url;

/// Cookie 名
pub const SESSION_COOKIE_NAME: &str = "session_id";

/// 受信リクエストからセッションを解決するトレイト
#[async_trait]
pub trait SessionLookup: Send + Sync {
    /// セッションがなければ `Ok(None)`
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, InfraError>;
}

/// セッションストアを使った [`SessionLookup`] 実装
///
/// 保存済みトークンに `jwt` → `session` コールバックを順に適用してセッションを組み立てる。
pub struct StoreSessionLookup {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl StoreSessionLookup {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

#[async_trait]
impl SessionLookup for StoreSessionLookup {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<Session>, InfraError> {
        let Some(session_id) = session_id_from_headers(headers) else {
            return Ok(None);
        };

        let Some(token) = self.store.get(&session_id).await? else {
            return Ok(None);
        };

        let token = jwt(token, None);
        let default_session = Session::from_token(&token, self.clock.now());
        Ok(Some(session(default_session, &token)))
    }
}

/// Cookie ヘッダーからセッション ID を取り出す
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|id| !id.is_empty())
}

// --- Cookie ヘルパー ---

/// セッション Cookie を構築する
///
/// `secure` は本番環境（`ENV=production`）で有効にする。
pub fn build_session_cookie(session_id: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, session_id.to_string()))
        .path("/")
        .max_age(time::Duration::seconds(SESSION_MAX_AGE_SECONDS))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Cookie をクリアするための Cookie を構築する
pub fn build_clear_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .max_age(time::Duration::seconds(0))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

// --- 戻り先 URL ---

/// サインイン後の戻り先 URL を決める
///
/// - 相対パス（`/` 始まり、`//` は除く）: `public_url` を前置する
/// - `public_url` と同一オリジンの絶対 URL: そのまま
/// - それ以外（未指定・他オリジン・不正な URL）: `public_url`
pub fn resolve_callback_url(callback_url: Option<&str>, public_url: &str) -> String {
    let public_url = public_url.trim_end_matches('/');
    let Some(callback_url) = callback_url.filter(|url| !url.is_empty()) else {
        return public_url.to_string();
    };

    if callback_url.starts_with('/') && !callback_url.starts_with("//") {
        return format!("{public_url}{callback_url}");
    }

    match (Url::parse(callback_url), Url::parse(public_url)) {
        (Ok(callback), Ok(public)) if callback.origin() == public.origin() => {
            callback_url.to_string()
        }
        _ => {
            tracing::debug!(callback_url, "許可されていない戻り先 URL のため既定値を使います");
            public_url.to_string()
        }
    }
}

// --- PKCE / state ---

fn random_token() -> String {
    URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>())
}

/// 認可リクエストの `state` を生成する
pub fn generate_state() -> String {
    random_token()
}

/// PKCE の `code_verifier` を生成する（43 文字）
pub fn generate_code_verifier() -> String {
    random_token()
}

/// PKCE の `code_challenge` を計算する（S256）
pub fn code_challenge(code_verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()))
}
