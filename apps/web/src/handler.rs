//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## ハンドラ一覧
//!
//! - `health`: ヘルスチェック
//! - `auth`: サインイン・コールバック・セッション・サインアウト
//! - `page`: ページプロパティ（レイアウト + 辞書）とプレースホルダー

pub mod auth;
pub mod health;
pub mod page;

use axum::{
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

pub use auth::{AuthState, callback, get_session, sign_in, sign_out};
pub use health::{ReadinessState, health_check, readiness_check};
pub use page::{PageState, get_page, get_placeholder};

/// 302 Found でリダイレクトする
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}
