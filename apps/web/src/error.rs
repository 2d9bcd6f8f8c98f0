//! # Web エラーハンドリング
//!
//! クライアントエラーをログ付きで axum レスポンスに変換する。
//!
//! | エラー | ステータス |
//! |--------|-----------|
//! | Sitecore の 404（プレースホルダー） | 404 |
//! | Sitecore の 404 以外のステータス | 502 |
//! | ネットワーク・解析・GraphQL エラー | 500 |
//! | GraphQL でのプレースホルダー取得 | 501 |
//! | トークン交換の失敗 | 502 |
//! | セッションストアの障害 | 500 |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sitegate_infra::InfraError;
use sitegate_shared::ErrorResponse;

use crate::client::{
    DictionaryServiceError,
    FetchError,
    GraphQLError,
    IdentityProviderError,
    LayoutServiceError,
};

// --- ログ付き変換 ---

/// Layout Service エラーをログ付きでレスポンスに変換する
pub fn log_and_convert_layout_error(context: &str, err: LayoutServiceError) -> Response {
    match err {
        LayoutServiceError::Rest(e) => log_and_convert_fetch_error(context, &e),
        LayoutServiceError::GraphQL(e) => log_and_convert_graphql_error(context, &e),
        LayoutServiceError::PlaceholderNotSupported => {
            not_implemented_response(&LayoutServiceError::PlaceholderNotSupported.to_string())
        }
    }
}

/// Dictionary Service エラーをログ付きでレスポンスに変換する
pub fn log_and_convert_dictionary_error(context: &str, err: DictionaryServiceError) -> Response {
    match err {
        DictionaryServiceError::Rest(e) => log_and_convert_fetch_error(context, &e),
        DictionaryServiceError::GraphQL(e) => log_and_convert_graphql_error(context, &e),
        e @ DictionaryServiceError::AppRootNotFound { .. } => {
            tracing::error!(
                error.category = "external_service",
                error.kind = "sitecore_dictionary",
                "{}で内部エラー: {}",
                context,
                e
            );
            internal_error_response()
        }
    }
}

/// ID プロバイダエラーをログ付きでレスポンスに変換する
pub fn log_and_convert_identity_error(context: &str, err: IdentityProviderError) -> Response {
    tracing::error!(
        error.category = "external_service",
        error.kind = "token_exchange",
        "{}で内部エラー: {}",
        context,
        err
    );
    bad_gateway_response("ID プロバイダとの通信に失敗しました")
}

/// インフラエラーをログ付きでレスポンスに変換する
pub fn log_and_convert_infra_error(context: &str, err: InfraError) -> Response {
    tracing::error!(
        error.category = "infrastructure",
        error.kind = "session",
        "{}で内部エラー: {}",
        context,
        err
    );
    internal_error_response()
}

fn log_and_convert_fetch_error(context: &str, err: &FetchError) -> Response {
    match err {
        FetchError::Status { status, .. } if *status == StatusCode::NOT_FOUND => {
            tracing::debug!("{}: Sitecore が 404 を返しました", context);
            not_found_response("指定されたアイテムが見つかりません")
        }
        FetchError::Status { status, .. } => {
            tracing::error!(
                error.category = "external_service",
                error.kind = "sitecore_status",
                status = status.as_u16(),
                "{}で内部エラー: {}",
                context,
                err
            );
            bad_gateway_response("Sitecore がエラーを返しました")
        }
        FetchError::Network(_) | FetchError::Deserialize(_) => {
            tracing::error!(
                error.category = "external_service",
                error.kind = "sitecore_communication",
                "{}で内部エラー: {}",
                context,
                err
            );
            internal_error_response()
        }
    }
}

fn log_and_convert_graphql_error(context: &str, err: &GraphQLError) -> Response {
    match err {
        GraphQLError::Fetch(e) => log_and_convert_fetch_error(context, e),
        GraphQLError::Errors(_) | GraphQLError::MissingData => {
            tracing::error!(
                error.category = "external_service",
                error.kind = "sitecore_graphql",
                "{}で内部エラー: {}",
                context,
                err
            );
            internal_error_response()
        }
    }
}

// --- レスポンスヘルパー ---

/// 400 Bad Request
pub fn bad_request_response(detail: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::bad_request(detail)),
    )
        .into_response()
}

/// サインイン要求の期限切れ・再利用
pub fn sign_in_state_expired_response() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(
            "sign-in-state-expired",
            "Sign-In State Expired",
            400,
            "サインイン要求の有効期限が切れています。もう一度サインインしてください",
        )),
    )
        .into_response()
}

/// 404 Not Found
pub fn not_found_response(detail: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::not_found(detail))).into_response()
}

/// 内部エラーレスポンス
pub fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::internal_error()),
    )
        .into_response()
}

/// 501 Not Implemented
pub fn not_implemented_response(detail: &str) -> Response {
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(ErrorResponse::not_implemented(detail)),
    )
        .into_response()
}

/// 502 Bad Gateway
pub fn bad_gateway_response(detail: &str) -> Response {
    (StatusCode::BAD_GATEWAY, Json(ErrorResponse::bad_gateway(detail))).into_response()
}
