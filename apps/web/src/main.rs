//! # Sitegate Web サーバー
//!
//! Sitecore JSS サイトのページプロパティ取得とサインインを担う Web サーバー。
//!
//! ## 役割
//!
//! - Sitecore Layout Service / Dictionary Service からのデータ取得（REST / GraphQL）
//! - Azure AD B2C による OIDC サインインとセッション管理
//! - 受信リクエストの Cookie 等の Sitecore への中継
//!
//! ## 起動方法
//!
//! ```bash
//! WEB_PORT=3000 PUBLIC_URL=http://localhost:3000 cargo run -p sitegate-web
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use sitegate_domain::clock::SystemClock;
use sitegate_infra::{RedisSessionStore, RedisSignInStateStore, redis::create_connection_manager};
use sitegate_shared::observability::TracingConfig;
use sitegate_web::{
    app_builder::{AppDependencies, build_app},
    client::{AzureAdB2cProvider, build_http_client},
    config::WebConfig,
    handler::ReadinessState,
};
use tokio::net::TcpListener;

/// Web サーバーのエントリーポイント
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. トレーシングの初期化
/// 3. アプリケーション設定の読み込み
/// 4. Redis 接続とルーターの構築
/// 5. HTTP サーバーの起動
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 本番環境では .env ファイルは使用せず、環境変数を直接設定する
    dotenvy::dotenv().ok();

    let tracing_config = TracingConfig::from_env("web");
    sitegate_shared::observability::init_tracing(tracing_config);
    let _tracing_guard = tracing::info_span!("app", service = "web").entered();

    let config = WebConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        fetch_with = ?config.fetch_with,
        site = %config.sitecore.site_name,
        "Web サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let redis_conn = create_connection_manager(&config.redis_url)
        .await
        .context("Redis への接続に失敗しました")?;

    let sitecore_client = build_http_client(config.sitecore.accept_invalid_certs)
        .context("HTTP クライアントの構築に失敗しました")?;
    let identity_provider = AzureAdB2cProvider::new(
        &config.azure_ad_b2c,
        &config.public_url,
        reqwest::Client::new(),
    );

    let deps = AppDependencies {
        sitecore_client,
        identity_provider: Arc::new(identity_provider),
        session_store: Arc::new(RedisSessionStore::new(redis_conn.clone())),
        sign_in_state_store: Arc::new(RedisSignInStateStore::new(redis_conn.clone())),
        clock: Arc::new(SystemClock),
        readiness_state: Some(Arc::new(ReadinessState { redis_conn })),
    };
    let app = build_app(&config, deps);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Web サーバーが起動しました: {}", addr);

    // X-Forwarded-For の中継に接続元アドレスを使う
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
