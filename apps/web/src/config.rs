//! # Web サーバー設定
//!
//! 環境変数から Web サーバー・Sitecore・Azure AD B2C の設定を読み込む。
//!
//! 読み込みは起動時の 1 回のみ。`FETCH_WITH` による REST / GraphQL の選択も
//! ここで確定し、実行中に切り替わることはない。

use std::env;

use thiserror::Error;

use crate::client::FetchWith;

/// 設定読み込みエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません（.env を確認してください）")]
    Missing(&'static str),

    /// 値の形式が不正
    #[error("{name} の値が不正です: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Web サーバーの設定
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// 外部から見たベース URL（リダイレクト先と OIDC の redirect_uri に使用）
    pub public_url: String,
    /// Redis 接続 URL
    pub redis_url: String,
    /// 既定の言語
    pub default_language: String,
    /// 本番環境か（`ENV=production`）
    pub production: bool,
    /// Layout / Dictionary の取得方式
    pub fetch_with: FetchWith,
    /// Sitecore 接続設定
    pub sitecore: SitecoreConfig,
    /// Azure AD B2C 設定
    pub azure_ad_b2c: AzureAdB2cConfig,
}

/// Sitecore 接続設定
#[derive(Debug, Clone)]
pub struct SitecoreConfig {
    /// Sitecore API ホスト（例: `https://cm.example.com`）
    pub api_host: String,
    /// Sitecore API キー
    pub api_key: String,
    /// JSS アプリ名（サイト名）
    pub site_name: String,
    /// GraphQL エンドポイント（`FETCH_WITH=GraphQL` のとき必須）
    pub graphql_endpoint: Option<String>,
    /// Layout Service の構成名
    pub layout_configuration_name: String,
    /// アナリティクス追跡の有効化
    pub tracking: bool,
    /// 自己署名証明書を許可する（開発環境向け）
    pub accept_invalid_certs: bool,
    /// GraphQL Dictionary Service のルートアイテム ID
    pub dictionary_root_item_id: Option<String>,
}

/// Azure AD B2C 設定
#[derive(Debug, Clone)]
pub struct AzureAdB2cConfig {
    pub tenant_name:       String,
    pub client_id:         String,
    pub client_secret:     String,
    pub primary_user_flow: String,
}

impl WebConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意のルックアップ関数から設定を読み込む
    ///
    /// テストでは環境変数を汚さずに HashMap から読み込める。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let fetch_with = FetchWith::parse(vars.optional("FETCH_WITH").as_deref());
        let graphql_endpoint = vars.optional("GRAPH_QL_ENDPOINT");
        if fetch_with == FetchWith::GraphQL && graphql_endpoint.is_none() {
            return Err(ConfigError::Missing("GRAPH_QL_ENDPOINT"));
        }

        Ok(Self {
            host: vars.optional("WEB_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: vars.parse_required("WEB_PORT")?,
            public_url: vars.required("PUBLIC_URL")?.trim_end_matches('/').to_string(),
            redis_url: vars.required("REDIS_URL")?,
            default_language: vars
                .optional("DEFAULT_LANGUAGE")
                .unwrap_or_else(|| "en".to_string()),
            production: vars.optional("ENV").as_deref() == Some("production"),
            fetch_with,
            sitecore: SitecoreConfig {
                api_host: vars.required("SITECORE_API_HOST")?.trim_end_matches('/').to_string(),
                api_key: vars.required("SITECORE_API_KEY")?,
                site_name: vars.required("JSS_APP_NAME")?,
                graphql_endpoint,
                layout_configuration_name: vars
                    .optional("SITECORE_LAYOUT_CONFIGURATION")
                    .unwrap_or_else(|| "jss".to_string()),
                tracking: vars.parse_bool("SITECORE_TRACKING", true)?,
                accept_invalid_certs: vars.parse_bool("SITECORE_ACCEPT_INVALID_CERTS", false)?,
                dictionary_root_item_id: vars.optional("SITECORE_DICTIONARY_ROOT_ITEM_ID"),
            },
            azure_ad_b2c: AzureAdB2cConfig {
                tenant_name:       vars.required("AZURE_AD_B2C_TENANT_NAME")?,
                client_id:         vars.required("AZURE_AD_B2C_CLIENT_ID")?,
                client_secret:     vars.required("AZURE_AD_B2C_CLIENT_SECRET")?,
                primary_user_flow: vars.required("AZURE_AD_B2C_PRIMARY_USER_FLOW")?,
            },
        })
    }
}

/// 環境変数ルックアップのヘルパー
struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&'static str) -> Option<String>,
{
    /// 空文字は未設定として扱う
    fn optional(&self, name: &'static str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn parse_required<T: std::str::FromStr>(&self, name: &'static str) -> Result<T, ConfigError> {
        let value = self.required(name)?;
        value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value })
    }

    fn parse_bool(&self, name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.optional(name) {
            None => Ok(default),
            Some(v) if v.eq_ignore_ascii_case("true") => Ok(true),
            Some(v) if v.eq_ignore_ascii_case("false") => Ok(false),
            Some(value) => Err(ConfigError::Invalid { name, value }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn base_vars() -> HashMap<&'static str, String> {
        [
            ("WEB_PORT", "3000"),
            ("PUBLIC_URL", "http://localhost:3000/"),
            ("REDIS_URL", "redis://localhost:6379"),
            ("SITECORE_API_HOST", "https://cm.example.com/"),
            ("SITECORE_API_KEY", "{API-KEY}"),
            ("JSS_APP_NAME", "sitegate"),
            ("AZURE_AD_B2C_TENANT_NAME", "contoso"),
            ("AZURE_AD_B2C_CLIENT_ID", "client-id"),
            ("AZURE_AD_B2C_CLIENT_SECRET", "secret"),
            ("AZURE_AD_B2C_PRIMARY_USER_FLOW", "B2C_1_signupsignin"),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect()
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<WebConfig, ConfigError> {
        WebConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_必須項目のみで既定値が適用される() {
        let config = load(&base_vars()).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.public_url, "http://localhost:3000");
        assert_eq!(config.default_language, "en");
        assert_eq!(config.fetch_with, FetchWith::Rest);
        assert_eq!(config.sitecore.api_host, "https://cm.example.com");
        assert_eq!(config.sitecore.layout_configuration_name, "jss");
        assert!(config.sitecore.tracking);
        assert!(!config.sitecore.accept_invalid_certs);
        assert!(!config.production);
    }

    #[test]
    fn test_必須項目が欠けているとmissingを返す() {
        let mut vars = base_vars();
        vars.remove("SITECORE_API_KEY");

        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Missing("SITECORE_API_KEY")
        );
    }

    #[test]
    fn test_不正なポート番号でinvalidを返す() {
        let mut vars = base_vars();
        vars.insert("WEB_PORT", "http".to_string());

        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: "WEB_PORT", .. })
        ));
    }

    #[test]
    fn test_graphql選択時はエンドポイントが必須() {
        let mut vars = base_vars();
        vars.insert("FETCH_WITH", "GraphQL".to_string());

        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Missing("GRAPH_QL_ENDPOINT")
        );

        vars.insert(
            "GRAPH_QL_ENDPOINT",
            "https://cm.example.com/sitecore/api/graph/edge".to_string(),
        );
        let config = load(&vars).unwrap();
        assert_eq!(config.fetch_with, FetchWith::GraphQL);
    }

    #[test]
    fn test_trackingの真偽値をパースする() {
        let mut vars = base_vars();
        vars.insert("SITECORE_TRACKING", "FALSE".to_string());
        assert!(!load(&vars).unwrap().sitecore.tracking);

        vars.insert("SITECORE_TRACKING", "yes".to_string());
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: "SITECORE_TRACKING", .. })
        ));
    }

    #[test]
    fn test_env_productionで本番扱い() {
        let mut vars = base_vars();
        vars.insert("ENV", "production".to_string());

        assert!(load(&vars).unwrap().production);
    }
}
