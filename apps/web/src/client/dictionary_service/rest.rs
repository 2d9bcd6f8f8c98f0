//! # REST Dictionary Service
//!
//! `GET {api_host}/sitecore/api/jss/dictionary/{site}/{language}?sc_apikey=...`

use sitegate_domain::dictionary::{DictionaryPhrases, RestDictionaryServiceData};

use crate::client::{FetchError, HttpDataFetcher, fetch_data};

#[derive(Debug, Clone)]
pub struct RestDictionaryServiceConfig {
    pub api_host:  String,
    pub api_key:   String,
    pub site_name: String,
}

pub struct RestDictionaryService {
    config:  RestDictionaryServiceConfig,
    fetcher: HttpDataFetcher,
}

impl RestDictionaryService {
    pub fn new(config: RestDictionaryServiceConfig, client: reqwest::Client) -> Self {
        Self {
            config,
            fetcher: HttpDataFetcher::new(client),
        }
    }

    pub fn dictionary_url(&self, language: &str) -> String {
        format!(
            "{}/sitecore/api/jss/dictionary/{}/{}",
            self.config.api_host.trim_end_matches('/'),
            urlencoding::encode(&self.config.site_name),
            urlencoding::encode(language)
        )
    }

    pub async fn fetch_dictionary_data(
        &self,
        language: &str,
    ) -> Result<DictionaryPhrases, FetchError> {
        tracing::debug!(language, site = %self.config.site_name, "辞書データを取得します");

        let url = self.dictionary_url(language);
        let data: RestDictionaryServiceData = fetch_data(
            &url,
            &self.fetcher,
            &[("sc_apikey", self.config.api_key.clone())],
        )
        .await?;

        Ok(data.phrases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_url_サイト名と言語をパスに含める() {
        let service = RestDictionaryService::new(
            RestDictionaryServiceConfig {
                api_host:  "https://cm.example.com/".to_string(),
                api_key:   "k".to_string(),
                site_name: "sitegate".to_string(),
            },
            reqwest::Client::new(),
        );

        assert_eq!(
            service.dictionary_url("ja-JP"),
            "https://cm.example.com/sitecore/api/jss/dictionary/sitegate/ja-JP"
        );
    }
}
