//! # 認証ハンドラ
//!
//! ID プロバイダ（Azure AD B2C）による認可コードフローを扱う。
//!
//! ## エンドポイント
//!
//! - `GET /api/auth/signin`: 認可エンドポイントへリダイレクト
//! - `GET /api/auth/callback/{provider}`: 認可コードをトークンに交換しセッションを作成
//! - `GET /api/auth/session`: 現在のセッションを返す
//! - `POST /api/auth/signout`: セッションを破棄

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;
use sitegate_domain::auth::{JwtToken, jwt};
use sitegate_infra::{PendingSignIn, SessionStore, SignInStateStore};

use super::found;
use crate::{
    auth::{
        SESSION_COOKIE_NAME,
        SessionLookup,
        build_clear_cookie,
        build_session_cookie,
        code_challenge,
        generate_code_verifier,
        generate_state,
        resolve_callback_url,
    },
    client::IdentityProvider,
    error::{
        bad_request_response,
        log_and_convert_identity_error,
        log_and_convert_infra_error,
        not_found_response,
        sign_in_state_expired_response,
    },
};

/// 認証ハンドラの State
pub struct AuthState {
    pub identity_provider:   Arc<dyn IdentityProvider>,
    pub session_store:       Arc<dyn SessionStore>,
    pub sign_in_state_store: Arc<dyn SignInStateStore>,
    pub session_lookup:      Arc<dyn SessionLookup>,
    /// 外部から見たベース URL
    pub public_url:          String,
    /// Cookie の Secure 属性
    pub secure_cookie:       bool,
}

#[derive(Debug, Deserialize)]
pub struct SignInQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code:              Option<String>,
    pub state:             Option<String>,
    pub error:             Option<String>,
    pub error_description: Option<String>,
}

/// GET /api/auth/signin
///
/// `state` と PKCE 検証子を保存し、ID プロバイダの認可エンドポイントへリダイレクトする。
#[tracing::instrument(skip_all)]
pub async fn sign_in(
    State(state): State<Arc<AuthState>>,
    Query(query): Query<SignInQuery>,
) -> Response {
    let callback_url = resolve_callback_url(query.callback_url.as_deref(), &state.public_url);
    let sign_in_state = generate_state();
    let code_verifier = generate_code_verifier();

    let pending = PendingSignIn {
        callback_url,
        code_verifier: code_verifier.clone(),
    };
    if let Err(e) = state.sign_in_state_store.save(&sign_in_state, &pending).await {
        return log_and_convert_infra_error("サインイン状態の保存", e);
    }

    let location = state
        .identity_provider
        .authorization_url(&sign_in_state, &code_challenge(&code_verifier));
    found(&location)
}

/// GET /api/auth/callback/{provider}
///
/// 1. `state` からサインイン要求を取り出す（一度しか使えない）
/// 2. 認可コードをトークンに交換する
/// 3. `jwt` コールバックを適用したトークンでセッションを作成する
/// 4. セッション Cookie を設定し、戻り先 URL へリダイレクトする
#[tracing::instrument(skip_all, fields(provider = %provider))]
pub async fn callback(
    State(state): State<Arc<AuthState>>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Response {
    if provider != state.identity_provider.id() {
        return not_found_response("不明な ID プロバイダです");
    }

    if let Some(error) = query.error {
        tracing::warn!(
            error.category = "external_service",
            error.kind = "authorization",
            description = query.error_description.as_deref().unwrap_or_default(),
            "ID プロバイダが認可エラーを返しました: {}",
            error
        );
        return bad_request_response("サインインが中断されました");
    }

    let (Some(code), Some(sign_in_state)) = (query.code, query.state) else {
        return bad_request_response("code と state は必須です");
    };

    let pending = match state.sign_in_state_store.take(&sign_in_state).await {
        Ok(Some(pending)) => pending,
        Ok(None) => return sign_in_state_expired_response(),
        Err(e) => return log_and_convert_infra_error("サインイン状態の取得", e),
    };

    let result = match state
        .identity_provider
        .exchange_code(&code, &pending.code_verifier)
        .await
    {
        Ok(result) => result,
        Err(e) => return log_and_convert_identity_error("トークン交換", e),
    };

    let token = jwt(JwtToken::from_profile(&result.profile), Some(&result.account));
    let session_id = match state.session_store.create(&token).await {
        Ok(id) => id,
        Err(e) => return log_and_convert_infra_error("セッション作成", e),
    };

    tracing::info!(provider = %provider, "サインインしました");

    let jar = jar.add(build_session_cookie(&session_id, state.secure_cookie));
    (jar, found(&pending.callback_url)).into_response()
}

/// GET /api/auth/session
///
/// セッションがなければ空オブジェクトを返す。
#[tracing::instrument(skip_all)]
pub async fn get_session(State(state): State<Arc<AuthState>>, headers: HeaderMap) -> Response {
    match state.session_lookup.get_session(&headers).await {
        Ok(Some(session)) => Json(session).into_response(),
        Ok(None) => Json(json!({})).into_response(),
        Err(e) => log_and_convert_infra_error("セッション取得", e),
    }
}

/// POST /api/auth/signout
///
/// ストアからの削除に失敗しても Cookie はクリアする。
#[tracing::instrument(skip_all)]
pub async fn sign_out(State(state): State<Arc<AuthState>>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        let deleted = state.session_store.delete(cookie.value()).await;
        if let Err(e) = deleted {
            tracing::error!(
                error.category = "infrastructure",
                error.kind = "session",
                "セッション削除に失敗しました: {}",
                e
            );
        }
    }

    let jar = jar.add(build_clear_cookie(state.secure_cookie));
    (jar, found("/")).into_response()
}
