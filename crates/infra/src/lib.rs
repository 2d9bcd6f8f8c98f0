//! # Sitegate インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **キャッシュ接続**: Redis への接続管理
//! - **セッションストア**: サインイン後のトークンを Redis に保持する
//! - **サインイン状態ストア**: 認可リクエストの `state` と PKCE 検証子を一時保存する
//!
//! ## 依存関係
//!
//! ```text
//! web → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`redis`] - Redis 接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`session`] - セッションストア
//! - [`sign_in_state`] - サインイン状態ストア
//! - `mock` - テスト用インメモリ実装（`test-utils` feature 有効時のみ）

pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod redis;
pub mod session;
pub mod sign_in_state;

pub use error::{InfraError, InfraErrorKind};
pub use session::{RedisSessionStore, SessionStore};
pub use sign_in_state::{PendingSignIn, RedisSignInStateStore, SignInStateStore};
