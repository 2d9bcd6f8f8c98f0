//! # 外部サービスクライアント
//!
//! Sitecore（Layout Service / Dictionary Service）と Azure AD B2C との通信を担当する。
//!
//! ## 構成
//!
//! ```text
//! LayoutServiceFactory ──create()──▶ LayoutService::{Rest, GraphQL}
//!                                          │
//!                    RestLayoutService ────┤── DataFetcherResolver ──▶ DataFetcher
//!                                          │        (SessionBearerFetcherResolver)
//!                 GraphQLLayoutService ────┘── GraphQLRequestClient
//! ```

pub mod data_fetcher;
pub mod dictionary_service;
pub mod graphql;
pub mod identity_provider;
pub mod layout_service;
pub mod service_factory;
pub mod session_fetcher;

pub use data_fetcher::{
    DataFetcher,
    DataFetcherResolver,
    FetchError,
    FetchResponse,
    HttpDataFetcher,
    RequestContext,
    ResponseContext,
    build_http_client,
    fetch_data,
};
pub use dictionary_service::{DictionaryService, DictionaryServiceError};
pub use graphql::{GraphQLError, GraphQLRequestClient};
pub use identity_provider::{AzureAdB2cProvider, IdentityProvider, IdentityProviderError, SignInResult};
pub use layout_service::{LayoutService, LayoutServiceError};
pub use service_factory::{DictionaryServiceFactory, FetchWith, LayoutServiceFactory};
pub use session_fetcher::{SessionBearerFetcher, SessionBearerFetcherResolver};
