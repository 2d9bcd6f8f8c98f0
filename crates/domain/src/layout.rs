//! # Layout Service データ
//!
//! Sitecore Layout Service（REST / GraphQL）が返すページ構造のモデル。
//!
//! ```json
//! {
//!   "sitecore": {
//!     "context": { "pageEditing": false, "language": "en" },
//!     "route": { "name": "home", "fields": { ... }, "placeholders": { ... } }
//!   }
//! }
//! ```
//!
//! ルートが存在しない場合は `route: null` で表現され、エラーにはならない。
//! 未知のキーは `extra` に保持し、受け取った JSON をそのまま返せるようにする。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// ルートのセキュア判定に使うフィールド名
pub const SECURE_FIELD_NAME: &str = "isSecure";

/// Layout Service のレスポンス全体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutServiceData {
    pub sitecore: LayoutServiceContextData,
}

/// `sitecore` ブロック
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutServiceContextData {
    #[serde(default)]
    pub context: LayoutServiceContext,
    #[serde(default)]
    pub route:   Option<RouteData>,
}

/// `sitecore.context` ブロック
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutServiceContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_editing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language:     Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_state:   Option<String>,
    #[serde(flatten)]
    pub extra:        Map<String, Value>,
}

/// `sitecore.route` ブロック
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteData {
    #[serde(default)]
    pub name:          String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name:  Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields:        Option<Map<String, Value>>,
    #[serde(default)]
    pub placeholders:  Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id:       Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(flatten)]
    pub extra:         Map<String, Value>,
}

/// プレースホルダー単位で取得したレイアウトデータ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderData {
    #[serde(default)]
    pub name:     String,
    #[serde(default)]
    pub path:     String,
    #[serde(default)]
    pub elements: Vec<Value>,
}

impl LayoutServiceData {
    /// ルートが見つからなかった場合のレスポンスを作成する
    ///
    /// GraphQL Layout Service がルート未検出時に返す形と揃える。
    pub fn not_found(language: Option<&str>) -> Self {
        Self {
            sitecore: LayoutServiceContextData {
                context: LayoutServiceContext {
                    page_editing: Some(false),
                    language: Some(language.unwrap_or_default().to_string()),
                    ..Default::default()
                },
                route:   None,
            },
        }
    }

    /// ルートデータを取得する
    pub fn route(&self) -> Option<&RouteData> {
        self.sitecore.route.as_ref()
    }

    /// ルートがセキュア（サインイン必須）としてマークされているか
    ///
    /// ルートが存在しない場合は `false`。
    pub fn is_secure_route(&self) -> bool {
        self.route().is_some_and(RouteData::is_secure)
    }
}

impl RouteData {
    /// フィールドの `value` を取得する
    ///
    /// Layout Service のフィールドは `{ "value": ... }` 形式で返される。
    pub fn field_value(&self, name: &str) -> Option<&Value> {
        self.fields.as_ref()?.get(name)?.get("value")
    }

    /// `isSecure` フィールドが真値か
    ///
    /// チェックボックスフィールドは `true` / `"1"` / `"true"` のいずれかで返る。
    pub fn is_secure(&self) -> bool {
        match self.field_value(SECURE_FIELD_NAME) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "1" || s.eq_ignore_ascii_case("true"),
            Some(Value::Number(n)) => n.as_i64() == Some(1),
            _ => false,
        }
    }
}
