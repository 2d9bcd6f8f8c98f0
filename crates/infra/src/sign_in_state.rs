//! # サインイン状態ストア
//!
//! 認可リクエスト送信からコールバック受信までの間、
//! `state` パラメータに紐づく情報（戻り先 URL、PKCE 検証子）を保持する。
//!
//! ## Redis キー設計
//!
//! | キー | 値 | TTL |
//! |-----|-----|-----|
//! | `sign_in:{state}` | PendingSignIn (JSON) | 600秒（10分） |
//!
//! コールバックで `GETDEL` により取り出し、同じ `state` の再利用を防ぐ。

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use serde::{Deserialize, Serialize};

use crate::InfraError;

/// サインイン状態の有効期限（秒）
pub const SIGN_IN_STATE_TTL_SECONDS: u64 = 600;

/// コールバック待ちのサインイン情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSignIn {
    /// サインイン完了後のリダイレクト先
    pub callback_url:  String,
    /// PKCE の code_verifier
    pub code_verifier: String,
}

/// サインイン状態ストアトレイト
#[async_trait]
pub trait SignInStateStore: Send + Sync {
    /// `state` に紐づけて保存する
    async fn save(&self, state: &str, pending: &PendingSignIn) -> Result<(), InfraError>;

    /// `state` に紐づく情報を取り出して削除する
    ///
    /// 期限切れ・未登録・使用済みの場合は `None`。
    async fn take(&self, state: &str) -> Result<Option<PendingSignIn>, InfraError>;
}

/// Redis を使用したサインイン状態ストア
pub struct RedisSignInStateStore {
    conn: ConnectionManager,
}

impl RedisSignInStateStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn state_key(state: &str) -> String {
        format!("sign_in:{state}")
    }
}

#[async_trait]
impl SignInStateStore for RedisSignInStateStore {
    async fn save(&self, state: &str, pending: &PendingSignIn) -> Result<(), InfraError> {
        let key = Self::state_key(state);
        let json = serde_json::to_string(pending)?;

        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(&key, json, SIGN_IN_STATE_TTL_SECONDS).await?;

        Ok(())
    }

    async fn take(&self, state: &str) -> Result<Option<PendingSignIn>, InfraError> {
        let key = Self::state_key(state);
        let mut conn = self.conn.clone();

        let result: Option<String> = redis::cmd("GETDEL")
            .arg(&key)
            .query_async(&mut conn)
            .await?;

        match result {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
