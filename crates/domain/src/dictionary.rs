//! # Dictionary Service データ
//!
//! サイトの翻訳フレーズ（キー → フレーズ）を表す。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 辞書フレーズ（キー → フレーズ）
pub type DictionaryPhrases = BTreeMap<String, String>;

/// REST Dictionary Service のレスポンス
///
/// `GET /sitecore/api/jss/dictionary/{site}/{language}` が返す形。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestDictionaryServiceData {
    #[serde(default)]
    pub lang:    String,
    #[serde(default)]
    pub app:     String,
    #[serde(default)]
    pub phrases: DictionaryPhrases,
}
