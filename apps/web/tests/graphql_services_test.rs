//! # GraphQL サービスの結合テスト
//!
//! Sitecore GraphQL エンドポイントを wiremock で模擬する。

use pretty_assertions::assert_eq;
use serde_json::json;
use sitegate_web::client::{
    GraphQLError,
    dictionary_service::{GraphQLDictionaryService, GraphQLDictionaryServiceConfig},
    layout_service::{GraphQLLayoutService, GraphQLLayoutServiceConfig},
};
use wiremock::{
    Mock,
    MockServer,
    ResponseTemplate,
    matchers::{body_string_contains, header, method, path},
};

const GRAPHQL_PATH: &str = "/sitecore/api/graph/edge";

fn layout_service(server: &MockServer) -> GraphQLLayoutService {
    GraphQLLayoutService::new(
        GraphQLLayoutServiceConfig {
            endpoint:  format!("{}{GRAPHQL_PATH}", server.uri()),
            api_key:   "{API-KEY}".to_string(),
            site_name: "sitegate".to_string(),
        },
        reqwest::Client::new(),
    )
}

#[tokio::test]
async fn test_layoutクエリをapiキー付きでpostする() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(header("sc_apikey", "{API-KEY}"))
        .and(body_string_contains("LayoutQuery"))
        .and(body_string_contains(r#""routePath":"/home""#))
        .and(body_string_contains(r#""site":"sitegate""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "layout": {
                    "item": {
                        "rendered": {
                            "sitecore": {
                                "context": { "pageEditing": false, "language": "en" },
                                "route": { "name": "home" }
                            }
                        }
                    }
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let data = layout_service(&server)
        .fetch_layout_data("/home", Some("en"))
        .await
        .unwrap();

    assert_eq!(data.route().map(|r| r.name.as_str()), Some("home"));
}

#[tokio::test]
async fn test_itemがnullなら空ルートを返す() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "layout": { "item": null } } })),
        )
        .mount(&server)
        .await;

    let data = layout_service(&server)
        .fetch_layout_data("/missing", Some("ja-JP"))
        .await
        .unwrap();

    assert!(data.route().is_none());
    assert_eq!(data.sitecore.context.language.as_deref(), Some("ja-JP"));
}

#[tokio::test]
async fn test_graphqlのerrorsはエラーとして返す() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "Site not found" }]
        })))
        .mount(&server)
        .await;

    let err = layout_service(&server)
        .fetch_layout_data("/home", None)
        .await
        .unwrap_err();

    match err {
        GraphQLError::Errors(messages) => assert_eq!(messages, vec!["Site not found".to_string()]),
        other => panic!("GraphQL エラーを期待しました: {other:?}"),
    }
}

#[tokio::test]
async fn test_辞書はカーソルでページングして集める() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains(r#""after":null"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "search": {
                    "pageInfo": { "endCursor": "c1", "hasNext": true },
                    "results": [
                        { "key": { "value": "Documentation" }, "phrase": { "value": "Docs" } }
                    ]
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_string_contains(r#""after":"c1""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "search": {
                    "pageInfo": { "endCursor": null, "hasNext": false },
                    "results": [
                        { "key": { "value": "Styleguide" }, "phrase": { "value": "Style guide" } }
                    ]
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = GraphQLDictionaryService::new(
        GraphQLDictionaryServiceConfig {
            endpoint:     format!("{}{GRAPHQL_PATH}", server.uri()),
            api_key:      "{API-KEY}".to_string(),
            site_name:    "sitegate".to_string(),
            root_item_id: Some("{GUID}".to_string()),
            page_size:    1,
        },
        reqwest::Client::new(),
    );

    let phrases = service.fetch_dictionary_data("en").await.unwrap();

    assert_eq!(phrases.len(), 2);
    assert_eq!(phrases["Documentation"], "Docs");
    assert_eq!(phrases["Styleguide"], "Style guide");
}
