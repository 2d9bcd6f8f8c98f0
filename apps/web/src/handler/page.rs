//! # ページハンドラ
//!
//! Sitecore からレイアウトと辞書を取得し、ページのプロパティとして返す。
//!
//! ## エンドポイント
//!
//! - `GET /`, `GET /{*path}`: ページプロパティ
//! - `GET /api/layout/placeholder`: プレースホルダー単位のレイアウトデータ
//!
//! Sitecore が返した `set-cookie` は、リダイレクトやエラーを含むすべての応答に付与する。

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json,
    extract::{ConnectInfo, Query, Request, State},
    http::{HeaderMap, StatusCode, Uri, header::HOST},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sitegate_domain::{dictionary::DictionaryPhrases, layout::LayoutServiceData};

use super::found;
use crate::{
    auth::SessionLookup,
    client::{DictionaryServiceFactory, LayoutServiceFactory, RequestContext, ResponseContext},
    error::{bad_request_response, log_and_convert_dictionary_error, log_and_convert_layout_error},
};

/// ページハンドラの State
pub struct PageState {
    pub layout_service_factory:     LayoutServiceFactory,
    pub dictionary_service_factory: DictionaryServiceFactory,
    pub session_lookup:             Arc<dyn SessionLookup>,
    /// `sc_lang` が指定されなかったときの言語
    pub default_language:           String,
    /// サインイン後の戻り先 URL に使うスキーム（`PUBLIC_URL` 由来）
    pub public_scheme:              String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub sc_lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceholderQuery {
    pub name:    String,
    pub item:    String,
    pub sc_lang: Option<String>,
}

/// ページプロパティ
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageProps {
    pub locale:      String,
    pub layout_data: LayoutServiceData,
    pub dictionary:  DictionaryPhrases,
    pub not_found:   bool,
}

/// GET / および GET /{*path}
///
/// 1. レイアウトを取得する（受信リクエストの Cookie 等を中継）
/// 2. セキュアなルートでセッションがなければサインインへリダイレクト
/// 3. 辞書を取得する
/// 4. ルートがなければ 404 でプロパティを返す
#[tracing::instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn get_page(
    State(state): State<Arc<PageState>>,
    Query(query): Query<PageQuery>,
    request: Request,
) -> Response {
    let language = resolve_language(query.sc_lang, &state.default_language);
    let req_ctx = request_context(&request);
    let res_ctx = ResponseContext::new();

    let mut response = render_page(&state, request.uri(), &language, &req_ctx, &res_ctx).await;
    res_ctx.apply_to(response.headers_mut());
    response
}

async fn render_page(
    state: &PageState,
    uri: &Uri,
    language: &str,
    req_ctx: &RequestContext,
    res_ctx: &ResponseContext,
) -> Response {
    let Ok(item_path) = urlencoding::decode(uri.path()) else {
        return bad_request_response("パスを UTF-8 として解釈できません");
    };

    let layout_data = match state
        .layout_service_factory
        .create()
        .fetch_layout_data(&item_path, Some(language), Some(req_ctx), Some(res_ctx))
        .await
    {
        Ok(data) => data,
        Err(e) => return log_and_convert_layout_error("レイアウト取得", e),
    };

    if layout_data.is_secure_route() && !has_session(state, &req_ctx.headers).await {
        tracing::debug!(path = %item_path, "セキュアなルートのためサインインへリダイレクトします");
        return found(&sign_in_location(
            &state.public_scheme,
            uri,
            &req_ctx.headers,
        ));
    }

    let dictionary = match state
        .dictionary_service_factory
        .create()
        .fetch_dictionary_data(language)
        .await
    {
        Ok(phrases) => phrases,
        Err(e) => return log_and_convert_dictionary_error("辞書取得", e),
    };

    let not_found = layout_data.route().is_none();
    let status = if not_found {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };

    let props = PageProps {
        locale: language.to_string(),
        layout_data,
        dictionary,
        not_found,
    };
    (status, Json(props)).into_response()
}

/// GET /api/layout/placeholder
#[tracing::instrument(skip_all, fields(placeholder = %query.name, item = %query.item))]
pub async fn get_placeholder(
    State(state): State<Arc<PageState>>,
    Query(query): Query<PlaceholderQuery>,
    request: Request,
) -> Response {
    let language = resolve_language(query.sc_lang, &state.default_language);
    let req_ctx = request_context(&request);
    let res_ctx = ResponseContext::new();

    let result = state
        .layout_service_factory
        .create()
        .fetch_placeholder_data(
            &query.name,
            &query.item,
            Some(&language),
            Some(&req_ctx),
            Some(&res_ctx),
        )
        .await;

    let mut response = match result {
        Ok(data) => Json(data).into_response(),
        Err(e) => log_and_convert_layout_error("プレースホルダー取得", e),
    };
    res_ctx.apply_to(response.headers_mut());
    response
}

fn resolve_language(sc_lang: Option<String>, default_language: &str) -> String {
    sc_lang
        .filter(|lang| !lang.is_empty())
        .unwrap_or_else(|| default_language.to_string())
}

fn request_context(request: &Request) -> RequestContext {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    RequestContext::new(request.headers().clone(), remote_addr)
}

/// セッション照会の失敗は未サインインとして扱う
async fn has_session(state: &PageState, headers: &HeaderMap) -> bool {
    match state.session_lookup.get_session(headers).await {
        Ok(session) => session.is_some(),
        Err(e) => {
            tracing::warn!(
                error.category = "infrastructure",
                error.kind = "session",
                "セッション取得に失敗しました: {}",
                e
            );
            false
        }
    }
}

/// サインイン後に元のページへ戻るためのリダイレクト先
///
/// 戻り先にはエンコードされたままのパスを使う。
fn sign_in_location(scheme: &str, uri: &Uri, headers: &HeaderMap) -> String {
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let callback_url = format!("{scheme}://{host}{path_and_query}");

    format!(
        "/api/auth/signin?callbackUrl={}",
        urlencoding::encode(&callback_url)
    )
}
