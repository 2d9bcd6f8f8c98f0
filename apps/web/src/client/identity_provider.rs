//! # ID プロバイダクライアント
//!
//! OAuth2 / OIDC の認可コードフロー（PKCE S256）を扱う。
//!
//! ## Azure AD B2C エンドポイント
//!
//! - 認可: `https://{tenant}.b2clogin.com/{tenant}.onmicrosoft.com/{user_flow}/oauth2/v2.0/authorize`
//! - トークン: `https://{tenant}.b2clogin.com/{tenant}.onmicrosoft.com/{user_flow}/oauth2/v2.0/token`
//!
//! プロフィールは ID トークンのペイロードから読み取る。トークンはトークンエンドポイントから
//! TLS で直接受け取ったものなので、署名は検証しない。

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use serde::Deserialize;
use sitegate_domain::auth::{Account, UserProfile};
use thiserror::Error;
use url::form_urlencoded;

use crate::config::AzureAdB2cConfig;

/// Azure AD B2C のプロバイダ ID（コールバック URL の末尾にも使う）
pub const AZURE_AD_B2C_PROVIDER_ID: &str = "azure-ad-b2c";

/// ID プロバイダエラー
#[derive(Debug, Clone, Error)]
pub enum IdentityProviderError {
    /// トークンエンドポイントが 2xx 以外を返した
    #[error("トークンエンドポイントが {status} を返しました: {body}")]
    TokenEndpoint { status: u16, body: String },

    /// ネットワークエラー
    #[error("ネットワークエラー: {0}")]
    Network(String),

    /// トークンレスポンスに ID トークンがない
    #[error("トークンレスポンスに id_token が含まれていません")]
    MissingIdToken,

    /// ID トークンを解析できない
    #[error("ID トークンの解析に失敗しました: {0}")]
    InvalidIdToken(String),
}

impl From<reqwest::Error> for IdentityProviderError {
    fn from(err: reqwest::Error) -> Self {
        IdentityProviderError::Network(err.to_string())
    }
}

/// サインイン結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInResult {
    pub profile: UserProfile,
    pub account: Account,
}

/// ID プロバイダトレイト
///
/// テスト時にスタブを使用できるようトレイトで定義。
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// プロバイダ ID
    fn id(&self) -> &str;

    /// 認可エンドポイントへのリダイレクト URL
    fn authorization_url(&self, state: &str, code_challenge: &str) -> String;

    /// 認可コードをトークンに交換し、プロフィールを取得する
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<SignInResult, IdentityProviderError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token_type:    Option<String>,
    #[serde(default)]
    access_token:  Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token:      Option<String>,
    #[serde(default)]
    scope:         Option<String>,
    #[serde(default)]
    expires_in:    Option<i64>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub:    String,
    #[serde(default)]
    name:   Option<String>,
    #[serde(default)]
    emails: Vec<String>,
    #[serde(default)]
    email:  Option<String>,
}

/// Azure AD B2C プロバイダ
pub struct AzureAdB2cProvider {
    authority:     String,
    client_id:     String,
    client_secret: String,
    redirect_uri:  String,
    scope:         String,
    client:        reqwest::Client,
}

impl AzureAdB2cProvider {
    /// # 引数
    ///
    /// - `public_url`: 外部から見たベース URL（`redirect_uri` の組み立てに使用）
    pub fn new(config: &AzureAdB2cConfig, public_url: &str, client: reqwest::Client) -> Self {
        let tenant = &config.tenant_name;
        Self {
            authority: format!(
                "https://{tenant}.b2clogin.com/{tenant}.onmicrosoft.com/{}",
                config.primary_user_flow
            ),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: format!(
                "{}/api/auth/callback/{AZURE_AD_B2C_PROVIDER_ID}",
                public_url.trim_end_matches('/')
            ),
            scope: format!(
                "https://{tenant}.onmicrosoft.com/api/api.read \
                 https://{tenant}.onmicrosoft.com/api/api.write offline_access openid"
            ),
            client,
        }
    }

    /// 認可・トークンエンドポイントのベース URL を差し替える
    pub fn with_authority(mut self, authority: &str) -> Self {
        self.authority = authority.trim_end_matches('/').to_string();
        self
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    fn token_url(&self) -> String {
        format!("{}/oauth2/v2.0/token", self.authority)
    }
}

#[async_trait]
impl IdentityProvider for AzureAdB2cProvider {
    fn id(&self) -> &str {
        AZURE_AD_B2C_PROVIDER_ID
    }

    fn authorization_url(&self, state: &str, code_challenge: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scope)
            .append_pair("state", state)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "S256")
            .finish();
        format!("{}/oauth2/v2.0/authorize?{query}", self.authority)
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<SignInResult, IdentityProviderError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code_verifier", code_verifier),
            ("scope", self.scope.as_str()),
        ];

        let response = self.client.post(self.token_url()).form(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityProviderError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let token = response.json::<TokenResponse>().await?;
        let id_token = token.id_token.ok_or(IdentityProviderError::MissingIdToken)?;
        let profile = profile_from_id_token(&id_token)?;

        let account = Account {
            provider:            AZURE_AD_B2C_PROVIDER_ID.to_string(),
            provider_account_id: profile.id.clone(),
            token_type:          token.token_type,
            access_token:        token.access_token,
            refresh_token:       token.refresh_token,
            id_token:            Some(id_token),
            scope:               token.scope,
            expires_at:          token.expires_in.map(|s| Utc::now().timestamp() + s),
        };

        Ok(SignInResult { profile, account })
    }
}

/// ID トークンのペイロードからプロフィールを取り出す
///
/// メールアドレスは `emails[0]`、なければ `email` を使う。
pub fn profile_from_id_token(id_token: &str) -> Result<UserProfile, IdentityProviderError> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| IdentityProviderError::InvalidIdToken("JWT の形式ではありません".to_string()))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| IdentityProviderError::InvalidIdToken(e.to_string()))?;
    let claims: IdTokenClaims = serde_json::from_slice(&bytes)
        .map_err(|e| IdentityProviderError::InvalidIdToken(e.to_string()))?;

    Ok(UserProfile {
        id:    claims.sub,
        name:  claims.name,
        email: claims.emails.into_iter().next().or(claims.email),
        image: None,
    })
}
