//! # ミドルウェア
//!
//! Web サーバー用のミドルウェアを提供する。

pub mod request_id;
