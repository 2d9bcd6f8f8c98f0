//! # アプリケーション構築
//!
//! State の組み立てとルーター構築を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use sitegate_domain::clock::Clock;
use sitegate_infra::{SessionStore, SignInStateStore};
use sitegate_shared::observability::{MakeRequestUuidV7, make_request_span};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    auth::{SessionLookup, StoreSessionLookup},
    client::{DictionaryServiceFactory, IdentityProvider, LayoutServiceFactory},
    config::WebConfig,
    handler::{
        AuthState,
        PageState,
        ReadinessState,
        callback,
        get_page,
        get_placeholder,
        get_session,
        health_check,
        readiness_check,
        sign_in,
        sign_out,
    },
    middleware::request_id::store_request_id,
};

/// インフラ初期化済みの依存
pub struct AppDependencies {
    /// Sitecore 向け HTTP クライアント
    pub sitecore_client:     reqwest::Client,
    pub identity_provider:   Arc<dyn IdentityProvider>,
    pub session_store:       Arc<dyn SessionStore>,
    pub sign_in_state_store: Arc<dyn SignInStateStore>,
    pub clock:               Arc<dyn Clock>,
    /// `None` のとき `/health/ready` を公開しない
    pub readiness_state:     Option<Arc<ReadinessState>>,
}

/// State の組み立てとルーター定義を行う
pub fn build_app(config: &WebConfig, deps: AppDependencies) -> Router {
    let session_lookup: Arc<dyn SessionLookup> = Arc::new(StoreSessionLookup::new(
        deps.session_store.clone(),
        deps.clock,
    ));

    // REST の Layout Service はリクエストごとにセッションを解決して Bearer を付与する
    let page_state = Arc::new(PageState {
        layout_service_factory:     LayoutServiceFactory::new(
            config.fetch_with,
            config.sitecore.clone(),
            deps.sitecore_client.clone(),
            session_lookup.clone(),
        ),
        dictionary_service_factory: DictionaryServiceFactory::new(
            config.fetch_with,
            config.sitecore.clone(),
            deps.sitecore_client,
        ),
        session_lookup:             session_lookup.clone(),
        default_language:           config.default_language.clone(),
        public_scheme:              public_scheme(&config.public_url),
    });

    let auth_state = Arc::new(AuthState {
        identity_provider: deps.identity_provider,
        session_store: deps.session_store,
        sign_in_state_store: deps.sign_in_state_store,
        session_lookup,
        public_url: config.public_url.clone(),
        secure_cookie: config.production,
    });

    let mut router = Router::new().route("/health", get(health_check));
    if let Some(readiness_state) = deps.readiness_state {
        router = router.merge(
            Router::new()
                .route("/health/ready", get(readiness_check))
                .with_state(readiness_state),
        );
    }

    router
        .merge(
            Router::new()
                .route("/api/auth/signin", get(sign_in))
                .route("/api/auth/callback/{provider}", get(callback))
                .route("/api/auth/session", get(get_session))
                .route("/api/auth/signout", post(sign_out))
                .with_state(auth_state),
        )
        .merge(
            Router::new()
                .route("/api/layout/placeholder", get(get_placeholder))
                .route("/", get(get_page))
                .route("/{*path}", get(get_page))
                .with_state(page_state),
        )
        // 下に書いたものが外側
        .layer(from_fn(store_request_id))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}

/// `PUBLIC_URL` のスキーム（解釈できなければ `http`）
fn public_scheme(public_url: &str) -> String {
    url::Url::parse(public_url)
        .map(|url| url.scheme().to_string())
        .unwrap_or_else(|_| "http".to_string())
}
