//! # 認証トークンとセッション
//!
//! Azure AD B2C でのサインイン結果を保持するモデルと、
//! トークン → セッションへ ID トークンを受け渡す 2 つのコールバック。
//!
//! ## データの流れ
//!
//! ```text
//! サインイン時:   Account ──jwt()──▶ JwtToken（Redis に保存）
//! 各リクエスト:   JwtToken ──jwt(None)──▶ JwtToken ──session()──▶ Session
//! ```
//!
//! 検証・リフレッシュ・失効はここでは扱わない。
//! トークンの寿命は ID プロバイダとセッションストアの TTL に従う。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// セッションの最大有効期間（秒）
/// 30日 = 2592000秒
pub const SESSION_MAX_AGE_SECONDS: i64 = 30 * 24 * 60 * 60;

/// 永続化されるトークンオブジェクト
///
/// プロフィール由来のクレームと、プロバイダが発行した ID トークンを持つ。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JwtToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub:      Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name:     Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email:    Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture:  Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(flatten)]
    pub extra:    Map<String, Value>,
}

/// ID プロバイダから取得したユーザープロフィール
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id:    String,
    pub name:  Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

/// トークン交換の結果（OAuth アカウント）
///
/// サインイン直後の 1 回だけ `jwt` コールバックに渡される。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub provider:            String,
    pub provider_account_id: String,
    #[serde(default)]
    pub token_type:          Option<String>,
    #[serde(default)]
    pub access_token:        Option<String>,
    #[serde(default)]
    pub refresh_token:       Option<String>,
    #[serde(default)]
    pub id_token:            Option<String>,
    #[serde(default)]
    pub scope:               Option<String>,
    /// アクセストークンの有効期限（UNIX 秒）
    #[serde(default)]
    pub expires_at:          Option<i64>,
}

/// セッションに含まれるユーザー情報
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub name:  Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
}

/// アプリケーションに公開されるセッション
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user:     SessionUser,
    pub expires:  DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

impl JwtToken {
    /// プロフィールから初期トークンを作成する
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            sub: Some(profile.id.clone()),
            name: profile.name.clone(),
            email: profile.email.clone(),
            picture: profile.image.clone(),
            ..Default::default()
        }
    }
}

impl Session {
    /// トークンのクレームから既定のセッションを作成する
    ///
    /// `id_token` は含めない。受け渡しは [`session`] コールバックの責務。
    pub fn from_token(token: &JwtToken, now: DateTime<Utc>) -> Self {
        Self {
            user:     SessionUser {
                name:  token.name.clone(),
                email: token.email.clone(),
                image: token.picture.clone(),
            },
            expires:  now + Duration::seconds(SESSION_MAX_AGE_SECONDS),
            id_token: None,
        }
    }
}

/// `jwt` コールバック
///
/// サインイン直後（`account` あり）はプロバイダの ID トークンをトークンに保存する。
/// 以降の呼び出し（`account` なし）ではトークンをそのまま返す。
pub fn jwt(mut token: JwtToken, account: Option<&Account>) -> JwtToken {
    if let Some(account) = account {
        token.id_token = account.id_token.clone();
    }
    token
}

/// `session` コールバック
///
/// トークンに保存された ID トークンをセッションへコピーする。
pub fn session(mut session: Session, token: &JwtToken) -> Session {
    session.id_token = token.id_token.clone();
    session
}
