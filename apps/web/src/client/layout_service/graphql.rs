//! # GraphQL Layout Service
//!
//! `layout(site, routePath, language) { item { rendered } }` を問い合わせる。
//! `item` が `null` の場合は REST の 404 と同じ空ルートを返す。

use serde::Deserialize;
use serde_json::json;
use sitegate_domain::layout::LayoutServiceData;

use crate::client::{GraphQLError, GraphQLRequestClient};

const LAYOUT_QUERY: &str = r#"query LayoutQuery($site: String!, $routePath: String!, $language: String!) {
  layout(site: $site, routePath: $routePath, language: $language) {
    item {
      rendered
    }
  }
}"#;

/// GraphQL Layout Service の設定
#[derive(Debug, Clone)]
pub struct GraphQLLayoutServiceConfig {
    pub endpoint:  String,
    pub api_key:   String,
    pub site_name: String,
}

#[derive(Debug, Deserialize)]
struct LayoutQueryResult {
    layout: Option<LayoutQueryLayout>,
}

#[derive(Debug, Deserialize)]
struct LayoutQueryLayout {
    item: Option<LayoutQueryItem>,
}

#[derive(Debug, Deserialize)]
struct LayoutQueryItem {
    rendered: Option<LayoutServiceData>,
}

/// GraphQL Layout Service
pub struct GraphQLLayoutService {
    site_name: String,
    client:    GraphQLRequestClient,
}

impl GraphQLLayoutService {
    pub fn new(config: GraphQLLayoutServiceConfig, client: reqwest::Client) -> Self {
        Self::with_client(
            &config.site_name,
            GraphQLRequestClient::new(&config.endpoint, &config.api_key, client),
        )
    }

    pub fn with_client(site_name: &str, client: GraphQLRequestClient) -> Self {
        Self {
            site_name: site_name.to_string(),
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }

    pub async fn fetch_layout_data(
        &self,
        item_path: &str,
        language: Option<&str>,
    ) -> Result<LayoutServiceData, GraphQLError> {
        let language = language.unwrap_or_default();
        tracing::debug!(
            item_path,
            language,
            site = %self.site_name,
            "GraphQL でレイアウトデータを取得します"
        );

        let result: LayoutQueryResult = self
            .client
            .request(
                LAYOUT_QUERY,
                json!({
                    "site": self.site_name,
                    "routePath": item_path,
                    "language": language,
                }),
            )
            .await?;

        let rendered = result
            .layout
            .and_then(|layout| layout.item)
            .and_then(|item| item.rendered);

        Ok(rendered.unwrap_or_else(|| LayoutServiceData::not_found(Some(language))))
    }
}
