//! # サービスファクトリ
//!
//! `FETCH_WITH` の値に従って REST / GraphQL の Layout Service・Dictionary Service を生成する。
//!
//! 選択は設定読み込み時に一度だけ確定し、`create()` はその値で分岐するだけ。
//! REST の Layout Service はセッション付きフェッチャーを使い、
//! 取得のたびにサインイン中ユーザーの ID トークンを Bearer として送る。

use std::sync::Arc;

use super::{
    DictionaryService,
    LayoutService,
    SessionBearerFetcherResolver,
    dictionary_service::{
        GraphQLDictionaryService,
        GraphQLDictionaryServiceConfig,
        RestDictionaryService,
        RestDictionaryServiceConfig,
        graphql::DEFAULT_PAGE_SIZE,
    },
    layout_service::{
        GraphQLLayoutService,
        GraphQLLayoutServiceConfig,
        RestLayoutService,
        RestLayoutServiceConfig,
    },
};
use crate::{auth::SessionLookup, config::SitecoreConfig};

/// Layout / Dictionary の取得方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchWith {
    #[default]
    Rest,
    GraphQL,
}

impl FetchWith {
    /// `FETCH_WITH` の値を解釈する
    ///
    /// `"GraphQL"` に完全一致した場合のみ GraphQL。それ以外と未設定は REST。
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("GraphQL") => FetchWith::GraphQL,
            _ => FetchWith::Rest,
        }
    }
}

/// Layout Service ファクトリ
pub struct LayoutServiceFactory {
    fetch_with:     FetchWith,
    sitecore:       SitecoreConfig,
    client:         reqwest::Client,
    session_lookup: Arc<dyn SessionLookup>,
}

impl LayoutServiceFactory {
    pub fn new(
        fetch_with: FetchWith,
        sitecore: SitecoreConfig,
        client: reqwest::Client,
        session_lookup: Arc<dyn SessionLookup>,
    ) -> Self {
        Self {
            fetch_with,
            sitecore,
            client,
            session_lookup,
        }
    }

    pub fn create(&self) -> LayoutService {
        match self.fetch_with {
            FetchWith::GraphQL => LayoutService::GraphQL(GraphQLLayoutService::new(
                GraphQLLayoutServiceConfig {
                    endpoint:  self.sitecore.graphql_endpoint.clone().unwrap_or_default(),
                    api_key:   self.sitecore.api_key.clone(),
                    site_name: self.sitecore.site_name.clone(),
                },
                self.client.clone(),
            )),
            FetchWith::Rest => {
                let resolver = SessionBearerFetcherResolver::new(
                    self.session_lookup.clone(),
                    self.client.clone(),
                );
                let config = RestLayoutServiceConfig::new(
                    &self.sitecore.api_host,
                    &self.sitecore.api_key,
                    &self.sitecore.site_name,
                )
                .with_configuration_name(&self.sitecore.layout_configuration_name)
                .with_tracking(self.sitecore.tracking)
                .with_data_fetcher_resolver(Arc::new(resolver));
                LayoutService::Rest(RestLayoutService::new(config, self.client.clone()))
            }
        }
    }
}

/// Dictionary Service ファクトリ
pub struct DictionaryServiceFactory {
    fetch_with: FetchWith,
    sitecore:   SitecoreConfig,
    client:     reqwest::Client,
}

impl DictionaryServiceFactory {
    pub fn new(fetch_with: FetchWith, sitecore: SitecoreConfig, client: reqwest::Client) -> Self {
        Self {
            fetch_with,
            sitecore,
            client,
        }
    }

    pub fn create(&self) -> DictionaryService {
        match self.fetch_with {
            FetchWith::GraphQL => DictionaryService::GraphQL(GraphQLDictionaryService::new(
                GraphQLDictionaryServiceConfig {
                    endpoint:     self.sitecore.graphql_endpoint.clone().unwrap_or_default(),
                    api_key:      self.sitecore.api_key.clone(),
                    site_name:    self.sitecore.site_name.clone(),
                    root_item_id: self.sitecore.dictionary_root_item_id.clone(),
                    page_size:    DEFAULT_PAGE_SIZE,
                },
                self.client.clone(),
            )),
            FetchWith::Rest => DictionaryService::Rest(RestDictionaryService::new(
                RestDictionaryServiceConfig {
                    api_host:  self.sitecore.api_host.clone(),
                    api_key:   self.sitecore.api_key.clone(),
                    site_name: self.sitecore.site_name.clone(),
                },
                self.client.clone(),
            )),
        }
    }
}
