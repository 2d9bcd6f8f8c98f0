//! # Dictionary Service
//!
//! サイトの翻訳フレーズを言語単位で取得する。
//! REST と GraphQL の実装があり、[`DictionaryServiceFactory`](super::DictionaryServiceFactory)
//! が一方を生成する。キャッシュは持たない。

pub mod graphql;
pub mod rest;

pub use graphql::{GraphQLDictionaryService, GraphQLDictionaryServiceConfig};
pub use rest::{RestDictionaryService, RestDictionaryServiceConfig};
use sitegate_domain::dictionary::DictionaryPhrases;
use thiserror::Error;

use super::{FetchError, GraphQLError};

/// Dictionary Service エラー
#[derive(Debug, Clone, Error)]
pub enum DictionaryServiceError {
    #[error(transparent)]
    Rest(#[from] FetchError),

    #[error(transparent)]
    GraphQL(#[from] GraphQLError),

    /// アプリのルートアイテムが見つからない
    #[error("サイト {site} （{language}）のルートアイテムが見つかりません")]
    AppRootNotFound { site: String, language: String },
}

/// Dictionary Service（REST / GraphQL）
pub enum DictionaryService {
    Rest(RestDictionaryService),
    GraphQL(GraphQLDictionaryService),
}

impl DictionaryService {
    pub async fn fetch_dictionary_data(
        &self,
        language: &str,
    ) -> Result<DictionaryPhrases, DictionaryServiceError> {
        match self {
            DictionaryService::Rest(service) => Ok(service.fetch_dictionary_data(language).await?),
            DictionaryService::GraphQL(service) => service.fetch_dictionary_data(language).await,
        }
    }

    pub fn is_graphql(&self) -> bool {
        matches!(self, DictionaryService::GraphQL(_))
    }
}
