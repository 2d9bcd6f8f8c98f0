//! # データフェッチャー
//!
//! Sitecore への HTTP 呼び出しを抽象化する。
//!
//! - [`DataFetcher`]: `(url, data?) -> FetchResponse` を実行するトレイト
//! - [`HttpDataFetcher`]: reqwest による既定実装（ヘッダー中継付き）
//! - [`DataFetcherResolver`]: リクエストごとにフェッチャーを生成するトレイト
//! - [`fetch_data`]: クエリパラメータを付与して GET し、JSON をデシリアライズする
//!
//! `data` が `None` なら GET、`Some` なら JSON ボディ付きの POST を送る。

mod header_relay;
mod resolver;

use async_trait::async_trait;
pub use header_relay::{HeaderRelay, RequestContext, ResponseContext};
use http::{HeaderMap, HeaderName, StatusCode};
pub use resolver::DataFetcherResolver;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use url::form_urlencoded;

use crate::middleware::request_id::inject_request_id;

/// フェッチエラー
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// 2xx 以外のステータス
    ///
    /// `data` は解析済みのレスポンスボディ。JSON でなければ文字列、空なら `null`。
    #[error("Sitecore が {status} を返しました")]
    Status {
        status:  StatusCode,
        headers: HeaderMap,
        data:    Value,
    },

    /// ネットワークエラー
    #[error("ネットワークエラー: {0}")]
    Network(String),

    /// レスポンスボディの形式が期待と異なる
    #[error("レスポンスの解析に失敗しました: {0}")]
    Deserialize(String),
}

impl FetchError {
    /// ステータスエラーの場合はそのステータスを返す
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// フェッチ結果
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status:  StatusCode,
    pub headers: HeaderMap,
    pub data:    Value,
}

/// データフェッチャートレイト
///
/// テストやセッション付きフェッチャーで差し替えられるようトレイトで定義。
#[async_trait]
pub trait DataFetcher: Send + Sync {
    async fn fetch(&self, url: &str, data: Option<&Value>) -> Result<FetchResponse, FetchError>;
}

/// Sitecore 用の HTTP クライアントを構築する
///
/// 開発環境の自己署名証明書に対応するため、`accept_invalid_certs` で検証を無効化できる。
pub fn build_http_client(accept_invalid_certs: bool) -> Result<reqwest::Client, FetchError> {
    if accept_invalid_certs {
        tracing::warn!("Sitecore への TLS 証明書検証が無効です");
    }
    let client = reqwest::Client::builder()
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()?;
    Ok(client)
}

/// reqwest を使用した既定のデータフェッチャー
///
/// 接続プールは `reqwest::Client` の clone で共有される。
#[derive(Debug, Clone)]
pub struct HttpDataFetcher {
    client:  reqwest::Client,
    headers: Vec<(HeaderName, String)>,
    relay:   Option<HeaderRelay>,
}

impl HttpDataFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            headers: Vec::new(),
            relay: None,
        }
    }

    /// すべてのリクエストに付与するヘッダーを追加する
    ///
    /// 値がヘッダーとして不正な場合は送信時に [`FetchError::Network`] になる。
    pub fn with_header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// ヘッダー中継を有効にする
    ///
    /// リクエストとレスポンスの両方が渡された場合のみ有効になる。
    pub fn with_relay(
        mut self,
        req: Option<&RequestContext>,
        res: Option<&ResponseContext>,
    ) -> Self {
        if let (Some(req), Some(res)) = (req, res) {
            self.relay = Some(HeaderRelay::new(req, res));
        }
        self
    }

    pub fn has_relay(&self) -> bool {
        self.relay.is_some()
    }
}

#[async_trait]
impl DataFetcher for HttpDataFetcher {
    async fn fetch(&self, url: &str, data: Option<&Value>) -> Result<FetchResponse, FetchError> {
        let mut builder = match data {
            Some(body) => self.client.post(url).json(body),
            None => self.client.get(url),
        };
        for (name, value) in &self.headers {
            builder = builder.header(name, value.as_str());
        }
        if let Some(relay) = &self.relay {
            // 同名の既定ヘッダーは中継ヘッダーで置き換える
            builder = builder.headers(relay.outbound_headers());
        }

        let response = inject_request_id(builder).send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        if let Some(relay) = &self.relay {
            relay.relay_set_cookie(&headers);
        }

        let body = response.bytes().await?;
        let data = parse_body(&body);

        if status.is_success() {
            Ok(FetchResponse {
                status,
                headers,
                data,
            })
        } else {
            Err(FetchError::Status {
                status,
                headers,
                data,
            })
        }
    }
}

/// レスポンスボディを JSON として解析する
///
/// 空なら `null`、JSON でなければ文字列として保持する。
fn parse_body(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

/// URL にクエリパラメータを付与する
pub(crate) fn append_query(url: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{query}")
}

/// クエリパラメータ付きで GET し、ボディを `T` にデシリアライズする
pub async fn fetch_data<T: DeserializeOwned>(
    url: &str,
    fetcher: &dyn DataFetcher,
    params: &[(&str, String)],
) -> Result<T, FetchError> {
    let url = append_query(url, params);
    let response = fetcher.fetch(&url, None).await?;
    serde_json::from_value(response.data).map_err(|e| FetchError::Deserialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_body_空ボディはnull() {
        assert_eq!(parse_body(b""), Value::Null);
    }

    #[test]
    fn test_parse_body_jsonはそのまま解析する() {
        assert_eq!(parse_body(br#"{"a":1}"#), json!({ "a": 1 }));
    }

    #[test]
    fn test_parse_body_json以外は文字列になる() {
        assert_eq!(
            parse_body(b"<html>Not Found</html>"),
            Value::String("<html>Not Found</html>".to_string())
        );
    }

    #[test]
    fn test_append_query_クエリをエンコードして付与する() {
        let url = append_query(
            "https://cm.example.com/sitecore/api/layout/render/jss",
            &[("item", "/home".to_string()), ("sc_lang", String::new())],
        );

        assert_eq!(
            url,
            "https://cm.example.com/sitecore/api/layout/render/jss?item=%2Fhome&sc_lang="
        );
    }

    #[test]
    fn test_append_query_既存クエリには区切りをアンドにする() {
        let url = append_query("http://x/a?b=1", &[("c", "2".to_string())]);

        assert_eq!(url, "http://x/a?b=1&c=2");
    }

    #[test]
    fn test_fetch_error_statusはステータスを返す() {
        let err = FetchError::Status {
            status:  StatusCode::NOT_FOUND,
            headers: HeaderMap::new(),
            data:    Value::Null,
        };

        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(FetchError::Network("x".to_string()).status(), None);
    }

    #[test]
    fn test_with_relay_片方だけでは中継しない() {
        let client = reqwest::Client::new();
        let req = RequestContext::default();
        let res = ResponseContext::new();

        assert!(!HttpDataFetcher::new(client.clone()).with_relay(Some(&req), None).has_relay());
        assert!(!HttpDataFetcher::new(client.clone()).with_relay(None, Some(&res)).has_relay());
        assert!(HttpDataFetcher::new(client).with_relay(Some(&req), Some(&res)).has_relay());
    }

    struct StaticFetcher(Value);

    #[async_trait]
    impl DataFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str, _data: Option<&Value>) -> Result<FetchResponse, FetchError> {
            Ok(FetchResponse {
                status:  StatusCode::OK,
                headers: HeaderMap::new(),
                data:    self.0.clone(),
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_data_形が合わないボディはdeserializeエラー() {
        #[derive(Debug, serde::Deserialize)]
        struct Expected {
            #[allow(dead_code)]
            sitecore: Value,
        }

        let fetcher = StaticFetcher(json!("not an object"));

        let result = fetch_data::<Expected>("http://x", &fetcher, &[]).await;

        assert!(matches!(result, Err(FetchError::Deserialize(_))));
    }
}
