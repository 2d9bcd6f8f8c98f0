//! # セッション付きデータフェッチャー
//!
//! 取得のたびに受信リクエストのセッションを解決し、ID トークンを
//! `Authorization: Bearer <id_token>` として Sitecore へ送る。
//!
//! トークンはサービスインスタンスに保持せず、リクエストごとに付与する。
//! セッションがない、または ID トークンを持たない場合はヘッダーを付けない。

use std::sync::Arc;

use async_trait::async_trait;
use http::header::AUTHORIZATION;
use serde_json::Value;

use super::{
    DataFetcher,
    DataFetcherResolver,
    FetchError,
    FetchResponse,
    HttpDataFetcher,
    RequestContext,
    ResponseContext,
};
use crate::auth::SessionLookup;

/// [`SessionBearerFetcher`] を生成するリゾルバー
pub struct SessionBearerFetcherResolver {
    session_lookup: Arc<dyn SessionLookup>,
    client:         reqwest::Client,
}

impl SessionBearerFetcherResolver {
    pub fn new(session_lookup: Arc<dyn SessionLookup>, client: reqwest::Client) -> Self {
        Self {
            session_lookup,
            client,
        }
    }
}

impl DataFetcherResolver for SessionBearerFetcherResolver {
    fn resolve(
        &self,
        req: Option<&RequestContext>,
        res: Option<&ResponseContext>,
    ) -> Arc<dyn DataFetcher> {
        Arc::new(SessionBearerFetcher {
            session_lookup: self.session_lookup.clone(),
            request:        req.cloned(),
            inner:          HttpDataFetcher::new(self.client.clone()).with_relay(req, res),
        })
    }
}

/// セッションの ID トークンを Bearer として付与するフェッチャー
pub struct SessionBearerFetcher {
    session_lookup: Arc<dyn SessionLookup>,
    request:        Option<RequestContext>,
    inner:          HttpDataFetcher,
}

impl SessionBearerFetcher {
    /// 受信リクエストのセッションから ID トークンを取得する
    ///
    /// 取得に失敗した場合は警告を出して匿名で続行する。
    async fn lookup_id_token(&self) -> Option<String> {
        let request = self.request.as_ref()?;
        match self.session_lookup.get_session(&request.headers).await {
            Ok(session) => session.and_then(|s| s.id_token),
            Err(e) => {
                tracing::warn!(
                    error.category = "infrastructure",
                    error.kind = "session",
                    "セッション取得に失敗したため認証なしで取得します: {}",
                    e
                );
                None
            }
        }
    }
}

#[async_trait]
impl DataFetcher for SessionBearerFetcher {
    async fn fetch(&self, url: &str, data: Option<&Value>) -> Result<FetchResponse, FetchError> {
        match self.lookup_id_token().await {
            Some(id_token) => {
                self.inner
                    .clone()
                    .with_header(AUTHORIZATION, format!("Bearer {id_token}"))
                    .fetch(url, data)
                    .await
            }
            None => self.inner.fetch(url, data).await,
        }
    }
}
