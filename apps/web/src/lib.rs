//! # Sitegate Web ライブラリ
//!
//! Sitecore JSS サイトの前段に立つ Web サーバーのコアモジュール。
//!
//! ## モジュール構成
//!
//! - `app_builder`: State の組み立てとルーター構築
//! - `auth`: Cookie からのセッション解決、PKCE・戻り先 URL のヘルパー
//! - `client`: 外部サービスクライアント（Sitecore Layout / Dictionary、Azure AD B2C）
//! - `config`: 環境変数からの設定読み込み
//! - `error`: エラーレスポンスへの変換
//! - `handler`: HTTP ハンドラ
//! - `middleware`: ミドルウェア（Request ID 伝播）

pub mod app_builder;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
