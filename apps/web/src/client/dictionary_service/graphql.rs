//! # GraphQL Dictionary Service
//!
//! アプリのルートアイテム配下にある辞書エントリを検索クエリでページングしながら集める。
//!
//! ルートアイテム ID が設定されていない場合は、ホームアイテムの祖先のうち
//! JSS アプリテンプレートのものを問い合わせて解決する。

use serde::Deserialize;
use serde_json::json;
use sitegate_domain::dictionary::DictionaryPhrases;

use super::DictionaryServiceError;
use crate::client::GraphQLRequestClient;

/// 辞書エントリのテンプレート ID
pub const DICTIONARY_ENTRY_TEMPLATE_ID: &str = "6d1cd89719364a3aa511289a94c2a7b1";

/// JSS アプリのルートアイテムのテンプレート ID
pub const JSS_APP_TEMPLATE_ID: &str = "061cba1554744b918a0617903b102b82";

/// 1 ページあたりの取得件数
pub const DEFAULT_PAGE_SIZE: u32 = 10;

const DICTIONARY_QUERY: &str = r#"query DictionarySearch($rootItemId: String!, $language: String!, $templates: String!, $pageSize: Int = 10, $after: String) {
  search(
    where: {
      AND: [
        { name: "_path", value: $rootItemId, operator: CONTAINS }
        { name: "_language", value: $language }
        { name: "_templates", value: $templates, operator: CONTAINS }
      ]
    }
    first: $pageSize
    after: $after
  ) {
    pageInfo {
      endCursor
      hasNext
    }
    results {
      key: field(name: "Key") {
        value
      }
      phrase: field(name: "Phrase") {
        value
      }
    }
  }
}"#;

const APP_ROOT_QUERY: &str = r#"query AppRootQuery($jssAppTemplateId: String!, $siteName: String!, $language: String!) {
  layout(site: $siteName, routePath: "/", language: $language) {
    homePage: item {
      rootItem: ancestors(includeTemplateIDs: [$jssAppTemplateId]) {
        id
      }
    }
  }
}"#;

#[derive(Debug, Clone)]
pub struct GraphQLDictionaryServiceConfig {
    pub endpoint:     String,
    pub api_key:      String,
    pub site_name:    String,
    pub root_item_id: Option<String>,
    pub page_size:    u32,
}

// --- レスポンス型 ---

#[derive(Debug, Deserialize)]
struct DictionaryQueryResult {
    search: DictionarySearch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DictionarySearch {
    page_info: PageInfo,
    #[serde(default)]
    results:   Vec<DictionaryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next:   bool,
}

#[derive(Debug, Deserialize)]
struct DictionaryEntry {
    key:    Option<FieldValue>,
    phrase: Option<FieldValue>,
}

#[derive(Debug, Deserialize)]
struct FieldValue {
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AppRootQueryResult {
    layout: Option<AppRootLayout>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppRootLayout {
    home_page: Option<AppRootHomePage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppRootHomePage {
    #[serde(default)]
    root_item: Vec<ItemId>,
}

#[derive(Debug, Deserialize)]
struct ItemId {
    id: String,
}

/// GraphQL Dictionary Service
pub struct GraphQLDictionaryService {
    site_name:    String,
    root_item_id: Option<String>,
    page_size:    u32,
    client:       GraphQLRequestClient,
}

impl GraphQLDictionaryService {
    pub fn new(config: GraphQLDictionaryServiceConfig, client: reqwest::Client) -> Self {
        let graphql = GraphQLRequestClient::new(&config.endpoint, &config.api_key, client);
        Self::with_client(config, graphql)
    }

    pub fn with_client(config: GraphQLDictionaryServiceConfig, client: GraphQLRequestClient) -> Self {
        Self {
            site_name: config.site_name,
            root_item_id: config.root_item_id,
            page_size: config.page_size,
            client,
        }
    }

    pub async fn fetch_dictionary_data(
        &self,
        language: &str,
    ) -> Result<DictionaryPhrases, DictionaryServiceError> {
        tracing::debug!(language, site = %self.site_name, "GraphQL で辞書データを取得します");

        let root_item_id = match &self.root_item_id {
            Some(id) => id.clone(),
            None => self.resolve_app_root_id(language).await?,
        };

        let mut phrases = DictionaryPhrases::new();
        let mut after: Option<String> = None;
        loop {
            let result: DictionaryQueryResult = self
                .client
                .request(
                    DICTIONARY_QUERY,
                    json!({
                        "rootItemId": root_item_id,
                        "language": language,
                        "templates": DICTIONARY_ENTRY_TEMPLATE_ID,
                        "pageSize": self.page_size,
                        "after": after,
                    }),
                )
                .await?;

            for entry in result.search.results {
                let key = entry.key.and_then(|f| f.value);
                let phrase = entry.phrase.and_then(|f| f.value);
                if let (Some(key), Some(phrase)) = (key, phrase) {
                    phrases.insert(key, phrase);
                }
            }

            let page_info = result.search.page_info;
            match page_info.end_cursor {
                Some(cursor) if page_info.has_next && after.as_ref() != Some(&cursor) => {
                    after = Some(cursor);
                }
                Some(cursor) if page_info.has_next => {
                    tracing::warn!(cursor = %cursor, "カーソルが進まないため辞書のページングを打ち切ります");
                    break;
                }
                _ => break,
            }
        }

        Ok(phrases)
    }

    /// JSS アプリのルートアイテム ID を解決する
    async fn resolve_app_root_id(&self, language: &str) -> Result<String, DictionaryServiceError> {
        let result: AppRootQueryResult = self
            .client
            .request(
                APP_ROOT_QUERY,
                json!({
                    "jssAppTemplateId": format!("{{{JSS_APP_TEMPLATE_ID}}}"),
                    "siteName": self.site_name,
                    "language": language,
                }),
            )
            .await?;

        result
            .layout
            .and_then(|layout| layout.home_page)
            .and_then(|home| home.root_item.into_iter().next())
            .map(|item| item.id)
            .ok_or_else(|| DictionaryServiceError::AppRootNotFound {
                site:     self.site_name.clone(),
                language: language.to_string(),
            })
    }
}
