//! # Request ID 伝播ミドルウェア
//!
//! 受信リクエストの Request ID を Sitecore への呼び出しに引き継ぐ。
//!
//! 1. [`store_request_id`] が `SetRequestIdLayer` の設定した
//!    [`RequestId`](tower_http::request_id::RequestId) を task-local に保存する
//! 2. [`inject_request_id`] が task-local から取り出し、
//!    reqwest の `RequestBuilder` に `X-Request-Id` ヘッダーとして付与する
//!
//! データフェッチャーはリゾルバー経由で生成されるため、引数で渡さず task-local を使う。

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use sitegate_shared::observability::REQUEST_ID_HEADER;
use tower_http::request_id::RequestId;

tokio::task_local! {
    static REQUEST_ID: String;
}

/// 現在のリクエストの Request ID を取得する
///
/// task-local スコープ外（テスト等）では `None` を返す。
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

/// Request ID を task-local に保存するミドルウェア
pub async fn store_request_id(request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("-")
        .to_string();

    REQUEST_ID.scope(request_id, next.run(request)).await
}

/// reqwest リクエストビルダーに `X-Request-Id` ヘッダーを付与する
///
/// task-local スコープ外の場合はビルダーをそのまま返す。
pub fn inject_request_id(builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    match current_request_id() {
        Some(id) => builder.header(REQUEST_ID_HEADER, id),
        None => builder,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_request_id_スコープ外でnoneを返す() {
        assert_eq!(current_request_id(), None);
    }

    #[tokio::test]
    async fn test_inject_request_id_スコープ内ではヘッダーを付与する() {
        let client = reqwest::Client::new();

        let request = REQUEST_ID
            .scope("req-0193".to_string(), async {
                inject_request_id(client.get("http://cm.example.com/sitecore/api/layout/render/jss"))
                    .build()
                    .unwrap()
            })
            .await;

        assert_eq!(
            request.headers().get("x-request-id").unwrap().to_str().unwrap(),
            "req-0193"
        );
    }

    #[test]
    fn test_inject_request_id_スコープ外ではヘッダーを付与しない() {
        let client = reqwest::Client::new();

        let request = inject_request_id(client.get("http://cm.example.com/"))
            .build()
            .unwrap();

        assert!(request.headers().get("x-request-id").is_none());
    }
}
