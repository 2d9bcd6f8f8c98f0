//! # REST Layout Service
//!
//! `GET {api_host}/sitecore/api/layout/{render|placeholder}/{configuration_name}` を呼び出す。
//!
//! ## クエリパラメータ
//!
//! | キー | 値 |
//! |------|-----|
//! | `item` | アイテムパス |
//! | `placeholderName` | プレースホルダー名（placeholder のみ） |
//! | `sc_apikey` | API キー |
//! | `sc_site` | サイト名 |
//! | `sc_lang` | 言語（未指定は空文字 = サイトの既定言語） |
//! | `tracking` | `true` / `false` |
//!
//! ## 404 の扱い
//!
//! render の 404 は「ルートなし」として正常系で返す（`route: null`）。
//! placeholder の 404 はそのままエラーとして返す。

use std::sync::Arc;

use http::StatusCode;
use sitegate_domain::layout::{LayoutServiceData, PlaceholderData};

use crate::client::{
    DataFetcher,
    DataFetcherResolver,
    FetchError,
    HttpDataFetcher,
    RequestContext,
    ResponseContext,
    fetch_data,
};

/// 既定の Layout Service 構成名
pub const DEFAULT_CONFIGURATION_NAME: &str = "jss";

/// REST Layout Service の設定
#[derive(Clone)]
pub struct RestLayoutServiceConfig {
    pub api_host:              String,
    pub api_key:               String,
    pub site_name:             String,
    pub configuration_name:    String,
    pub tracking:              bool,
    pub data_fetcher_resolver: Option<Arc<dyn DataFetcherResolver>>,
}

impl RestLayoutServiceConfig {
    pub fn new(api_host: &str, api_key: &str, site_name: &str) -> Self {
        Self {
            api_host:              api_host.trim_end_matches('/').to_string(),
            api_key:               api_key.to_string(),
            site_name:             site_name.to_string(),
            configuration_name:    DEFAULT_CONFIGURATION_NAME.to_string(),
            tracking:              true,
            data_fetcher_resolver: None,
        }
    }

    pub fn with_configuration_name(mut self, configuration_name: &str) -> Self {
        self.configuration_name = configuration_name.to_string();
        self
    }

    pub fn with_tracking(mut self, tracking: bool) -> Self {
        self.tracking = tracking;
        self
    }

    pub fn with_data_fetcher_resolver(mut self, resolver: Arc<dyn DataFetcherResolver>) -> Self {
        self.data_fetcher_resolver = Some(resolver);
        self
    }
}

/// 呼び出すエンドポイントの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutServiceApiType {
    Render,
    Placeholder,
}

impl LayoutServiceApiType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutServiceApiType::Render => "render",
            LayoutServiceApiType::Placeholder => "placeholder",
        }
    }
}

/// すべてのリクエストに付与するクエリパラメータ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchParams {
    pub sc_apikey: String,
    pub sc_site:   String,
    pub sc_lang:   String,
    pub tracking:  bool,
}

impl FetchParams {
    /// クエリ文字列用のキーと値の組
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("sc_apikey", self.sc_apikey.clone()),
            ("sc_site", self.sc_site.clone()),
            ("sc_lang", self.sc_lang.clone()),
            ("tracking", self.tracking.to_string()),
        ]
    }
}

/// REST Layout Service
pub struct RestLayoutService {
    config: RestLayoutServiceConfig,
    client: reqwest::Client,
}

impl RestLayoutService {
    /// # 引数
    ///
    /// - `client`: 既定のフェッチャーが使う HTTP クライアント（接続プールを共有する）
    pub fn new(config: RestLayoutServiceConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &RestLayoutServiceConfig {
        &self.config
    }

    /// ルートのレイアウトデータを取得する
    ///
    /// 404 はエラーにせず、レスポンスボディ（`route: null`）を返す。
    /// ボディがレイアウトデータとして読めない場合は空ルートを組み立てて返す。
    pub async fn fetch_layout_data(
        &self,
        item_path: &str,
        language: Option<&str>,
        req: Option<&RequestContext>,
        res: Option<&ResponseContext>,
    ) -> Result<LayoutServiceData, FetchError> {
        let params = self.get_fetch_params(language);
        tracing::debug!(
            item_path,
            language = %params.sc_lang,
            site = %params.sc_site,
            "レイアウトデータを取得します"
        );

        let fetcher = self.resolve_fetcher(req, res);
        let url = self.resolve_layout_service_url(LayoutServiceApiType::Render);
        let mut query = vec![("item", item_path.to_string())];
        query.extend(params.to_query());

        match fetch_data::<LayoutServiceData>(&url, fetcher.as_ref(), &query).await {
            Ok(data) => Ok(data),
            Err(FetchError::Status { status, data, .. }) if status == StatusCode::NOT_FOUND => {
                tracing::debug!(item_path, "ルートが見つかりません");
                Ok(serde_json::from_value(data)
                    .unwrap_or_else(|_| LayoutServiceData::not_found(language)))
            }
            Err(e) => Err(e),
        }
    }

    /// プレースホルダー単位のレイアウトデータを取得する
    pub async fn fetch_placeholder_data(
        &self,
        placeholder_name: &str,
        item_path: &str,
        language: Option<&str>,
        req: Option<&RequestContext>,
        res: Option<&ResponseContext>,
    ) -> Result<PlaceholderData, FetchError> {
        let params = self.get_fetch_params(language);
        tracing::debug!(
            placeholder_name,
            item_path,
            language = %params.sc_lang,
            site = %params.sc_site,
            "プレースホルダーデータを取得します"
        );

        let fetcher = self.resolve_fetcher(req, res);
        let url = self.resolve_layout_service_url(LayoutServiceApiType::Placeholder);
        let mut query = vec![
            ("placeholderName", placeholder_name.to_string()),
            ("item", item_path.to_string()),
        ];
        query.extend(params.to_query());

        fetch_data(&url, fetcher.as_ref(), &query).await
    }

    /// 設定とリクエスト言語からクエリパラメータを組み立てる
    pub fn get_fetch_params(&self, language: Option<&str>) -> FetchParams {
        FetchParams {
            sc_apikey: self.config.api_key.clone(),
            sc_site:   self.config.site_name.clone(),
            sc_lang:   language.unwrap_or_default().to_string(),
            tracking:  self.config.tracking,
        }
    }

    pub fn resolve_layout_service_url(&self, api_type: LayoutServiceApiType) -> String {
        format!(
            "{}/sitecore/api/layout/{}/{}",
            self.config.api_host,
            api_type.as_str(),
            self.config.configuration_name
        )
    }

    /// 設定のリゾルバーがあればそれを、なければ既定のフェッチャーを使う
    ///
    /// 既定のフェッチャーは呼び出しごとに生成する。
    fn resolve_fetcher(
        &self,
        req: Option<&RequestContext>,
        res: Option<&ResponseContext>,
    ) -> Arc<dyn DataFetcher> {
        match &self.config.data_fetcher_resolver {
            Some(resolver) => resolver.resolve(req, res),
            None => Arc::new(HttpDataFetcher::new(self.client.clone()).with_relay(req, res)),
        }
    }
}
