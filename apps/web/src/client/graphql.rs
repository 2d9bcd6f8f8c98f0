//! # GraphQL リクエストクライアント
//!
//! Sitecore Experience Edge / GraphQL エンドポイントへ `{ query, variables }` を POST する。
//! API キーは `sc_apikey` ヘッダーで渡す。

use std::sync::Arc;

use http::HeaderName;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use thiserror::Error;

use super::{DataFetcher, FetchError, HttpDataFetcher};

const API_KEY_HEADER: HeaderName = HeaderName::from_static("sc_apikey");

/// GraphQL クライアントエラー
#[derive(Debug, Clone, Error)]
pub enum GraphQLError {
    /// HTTP レベルのエラー
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// レスポンスの `errors` に含まれたエラー
    #[error("GraphQL エラー: {}", .0.join(", "))]
    Errors(Vec<String>),

    /// `data` が返されなかった
    #[error("GraphQL レスポンスに data がありません")]
    MissingData,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data:   Option<T>,
    #[serde(default)]
    errors: Vec<GraphQLErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorMessage {
    message: String,
}

/// GraphQL リクエストクライアント
#[derive(Clone)]
pub struct GraphQLRequestClient {
    endpoint: String,
    fetcher:  Arc<dyn DataFetcher>,
}

impl GraphQLRequestClient {
    /// API キー付きのクライアントを作成する
    pub fn new(endpoint: &str, api_key: &str, client: reqwest::Client) -> Self {
        let fetcher = HttpDataFetcher::new(client).with_header(API_KEY_HEADER, api_key);
        Self::with_fetcher(endpoint, Arc::new(fetcher))
    }

    /// 任意のフェッチャーでクライアントを作成する
    pub fn with_fetcher(endpoint: &str, fetcher: Arc<dyn DataFetcher>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            fetcher,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// クエリを実行し、`data` を `T` にデシリアライズして返す
    pub async fn request<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, GraphQLError> {
        let body = json!({ "query": query, "variables": variables });
        let response = self.fetcher.fetch(&self.endpoint, Some(&body)).await?;

        let envelope: GraphQLResponse<T> = serde_json::from_value(response.data)
            .map_err(|e| FetchError::Deserialize(e.to_string()))?;

        if !envelope.errors.is_empty() {
            return Err(GraphQLError::Errors(
                envelope.errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        envelope.data.ok_or(GraphQLError::MissingData)
    }
}
