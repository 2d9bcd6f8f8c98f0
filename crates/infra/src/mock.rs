//! # テスト用インメモリストア
//!
//! ハンドラテストで Redis の代わりに使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! sitegate-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use sitegate_domain::auth::JwtToken;
use uuid::Uuid;

use crate::{
    InfraError,
    session::{SESSION_TTL_SECONDS, SessionStore},
    sign_in_state::{PendingSignIn, SignInStateStore},
};

// ===== InMemorySessionStore =====

#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<String, JwtToken>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定 ID でセッションを登録する
    pub fn insert(&self, session_id: &str, token: JwtToken) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), token);
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.lock().unwrap().contains_key(session_id)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, token: &JwtToken) -> Result<String, InfraError> {
        let session_id = Uuid::new_v4().to_string();
        self.insert(&session_id, token.clone());
        Ok(session_id)
    }

    async fn get(&self, session_id: &str) -> Result<Option<JwtToken>, InfraError> {
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }

    async fn delete(&self, session_id: &str) -> Result<(), InfraError> {
        self.sessions.lock().unwrap().remove(session_id);
        Ok(())
    }

    async fn get_ttl(&self, session_id: &str) -> Result<Option<i64>, InfraError> {
        Ok(self
            .contains(session_id)
            .then_some(SESSION_TTL_SECONDS as i64))
    }
}

// ===== FailingSessionStore =====

/// 常にエラーを返すセッションストア（障害時の挙動確認用）
#[derive(Clone, Default)]
pub struct FailingSessionStore;

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn create(&self, _token: &JwtToken) -> Result<String, InfraError> {
        Err(InfraError::unexpected("session store unavailable"))
    }

    async fn get(&self, _session_id: &str) -> Result<Option<JwtToken>, InfraError> {
        Err(InfraError::unexpected("session store unavailable"))
    }

    async fn delete(&self, _session_id: &str) -> Result<(), InfraError> {
        Err(InfraError::unexpected("session store unavailable"))
    }

    async fn get_ttl(&self, _session_id: &str) -> Result<Option<i64>, InfraError> {
        Err(InfraError::unexpected("session store unavailable"))
    }
}

// ===== InMemorySignInStateStore =====

#[derive(Clone, Default)]
pub struct InMemorySignInStateStore {
    states: Arc<Mutex<HashMap<String, PendingSignIn>>>,
}

impl InMemorySignInStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存済みの state 一覧
    pub fn states(&self) -> Vec<String> {
        self.states.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, state: &str) -> Option<PendingSignIn> {
        self.states.lock().unwrap().get(state).cloned()
    }
}

#[async_trait]
impl SignInStateStore for InMemorySignInStateStore {
    async fn save(&self, state: &str, pending: &PendingSignIn) -> Result<(), InfraError> {
        self.states
            .lock()
            .unwrap()
            .insert(state.to_string(), pending.clone());
        Ok(())
    }

    async fn take(&self, state: &str) -> Result<Option<PendingSignIn>, InfraError> {
        Ok(self.states.lock().unwrap().remove(state))
    }
}
