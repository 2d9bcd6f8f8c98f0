//! # Layout Service
//!
//! ページ（ルート）単位・プレースホルダー単位のレイアウトデータを取得する。
//! 実装は REST と GraphQL の 2 種類で、[`LayoutServiceFactory`](super::LayoutServiceFactory)
//! が起動時の設定に従って一方を生成する。

pub mod graphql;
pub mod rest;

pub use graphql::{GraphQLLayoutService, GraphQLLayoutServiceConfig};
pub use rest::{FetchParams, LayoutServiceApiType, RestLayoutService, RestLayoutServiceConfig};
use sitegate_domain::layout::{LayoutServiceData, PlaceholderData};
use thiserror::Error;

use super::{FetchError, GraphQLError, RequestContext, ResponseContext};

/// Layout Service エラー
#[derive(Debug, Clone, Error)]
pub enum LayoutServiceError {
    #[error(transparent)]
    Rest(#[from] FetchError),

    #[error(transparent)]
    GraphQL(#[from] GraphQLError),

    /// GraphQL ではプレースホルダー単位の取得ができない
    #[error("GraphQL Layout Service はプレースホルダー単位の取得に対応していません")]
    PlaceholderNotSupported,
}

/// Layout Service（REST / GraphQL）
pub enum LayoutService {
    Rest(RestLayoutService),
    GraphQL(GraphQLLayoutService),
}

impl LayoutService {
    /// ルートのレイアウトデータを取得する
    ///
    /// `req` / `res` は REST のヘッダー中継にのみ使用される。
    pub async fn fetch_layout_data(
        &self,
        item_path: &str,
        language: Option<&str>,
        req: Option<&RequestContext>,
        res: Option<&ResponseContext>,
    ) -> Result<LayoutServiceData, LayoutServiceError> {
        match self {
            LayoutService::Rest(service) => Ok(service
                .fetch_layout_data(item_path, language, req, res)
                .await?),
            LayoutService::GraphQL(service) => {
                Ok(service.fetch_layout_data(item_path, language).await?)
            }
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
    ) -> Result<PlaceholderData, LayoutServiceError> {
        match self {
            LayoutService::Rest(service) => Ok(service
                .fetch_placeholder_data(placeholder_name, item_path, language, req, res)
                .await?),
            LayoutService::GraphQL(_) => Err(LayoutServiceError::PlaceholderNotSupported),
        }
    }

    pub fn is_graphql(&self) -> bool {
        matches!(self, LayoutService::GraphQL(_))
    }
}
