//! # セッションストア
//!
//! サインイン後のトークン（[`JwtToken`]）を Redis に保持する。
//! ブラウザには不透明なセッション ID のみを Cookie で渡す。
//!
//! ## Redis キー設計
//!
//! | キー | 値 | TTL |
//! |-----|-----|-----|
//! | `session:{session_id}` | JwtToken (JSON) | 2592000秒（30日） |

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use sitegate_domain::auth::{JwtToken, SESSION_MAX_AGE_SECONDS};
use uuid::Uuid;

use crate::InfraError;

/// セッションの有効期限（秒）
pub const SESSION_TTL_SECONDS: u64 = SESSION_MAX_AGE_SECONDS as u64;

/// セッションストアトレイト
///
/// セッションの作成・取得・削除を行う。
/// 実装は Redis を使用する `RedisSessionStore` を参照。
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// トークンを保存し、新しいセッション ID を返す
    ///
    /// # 戻り値
    ///
    /// 生成されたセッション ID（UUID v4）
    async fn create(&self, token: &JwtToken) -> Result<String, InfraError>;

    /// セッションのトークンを取得する
    ///
    /// # 戻り値
    ///
    /// セッションが存在すれば `Some(JwtToken)`、なければ `None`
    async fn get(&self, session_id: &str) -> Result<Option<JwtToken>, InfraError>;

    /// セッションを削除する
    ///
    /// 存在しないセッションを削除しても成功とする。
    async fn delete(&self, session_id: &str) -> Result<(), InfraError>;

    /// セッションの TTL（残り秒数）を取得する
    async fn get_ttl(&self, session_id: &str) -> Result<Option<i64>, InfraError>;
}

/// Redis を使用したセッションストア
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    /// 既存の接続マネージャからセッションストアを作成する
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// セッションキーを生成する
    fn session_key(session_id: &str) -> String {
        format!("session:{session_id}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, token: &JwtToken) -> Result<String, InfraError> {
        // UUID v4 でセッション ID を生成（暗号論的に安全なランダム値）
        let session_id = Uuid::new_v4().to_string();
        let key = Self::session_key(&session_id);
        let json = serde_json::to_string(token)?;

        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(&key, json, SESSION_TTL_SECONDS).await?;

        Ok(session_id)
    }

    async fn get(&self, session_id: &str) -> Result<Option<JwtToken>, InfraError> {
        let key = Self::session_key(session_id);
        let mut conn = self.conn.clone();

        let result: Option<String> = conn.get(&key).await?;

        match result {
            Some(json) => {
                let token: JwtToken = serde_json::from_str(&json)?;
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, session_id: &str) -> Result<(), InfraError> {
        let key = Self::session_key(session_id);
        let mut conn = self.conn.clone();
        let _: () = conn.del(&key).await?;
        Ok(())
    }

    async fn get_ttl(&self, session_id: &str) -> Result<Option<i64>, InfraError> {
        let key = Self::session_key(session_id);
        let mut conn = self.conn.clone();

        let ttl: i64 = conn.ttl(&key).await?;

        // TTL が -2 の場合はキーが存在しない、-1 の場合は TTL が設定されていない
        if ttl < 0 { Ok(None) } else { Ok(Some(ttl)) }
    }
}
