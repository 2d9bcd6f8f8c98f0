//! # Sitegate ドメイン層
//!
//! Sitecore Layout Service / Dictionary Service から受け取るデータと、
//! サインイン後に保持する認証情報のモデルを定義する。
//!
//! ## 依存関係の方向
//!
//! ```text
//! web → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（Redis、HTTP クライアント）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`layout`] - Layout Service のレスポンス（ルート、プレースホルダー）
//! - [`dictionary`] - Dictionary Service のレスポンス
//! - [`auth`] - JWT トークン・セッションと、その受け渡しコールバック
//! - [`clock`] - 時刻プロバイダ

pub mod auth;
pub mod clock;
pub mod dictionary;
pub mod layout;
