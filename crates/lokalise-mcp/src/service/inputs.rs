use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    api::TranslationData,
    search::{NormalizedCriteria, SearchResult},
};

/// A key to create. Only `key_name` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewKey {
    pub key_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl NewKey {
    pub fn named(key_name: impl Into<String>) -> Self {
        Self { key_name: key_name.into(), ..Default::default() }
    }

    pub fn with_default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms = Some(platforms.into_iter().map(Into::into).collect());
        self
    }
}

/// Language code to text, e.g. `{"en": "Hello", "de": "Hallo"}`.
pub type TranslationTexts = BTreeMap<String, String>;

/// Partial update of an existing key, addressed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyUpdate {
    pub key_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translations: Option<TranslationTexts>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyRef {
    pub key_name: String,
}

/// Texts to write for one key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationItem {
    pub key_name: String,
    pub translations: TranslationTexts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark_as_reviewed: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationAction {
    Updated,
    Created,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationChange {
    pub key_name: String,
    pub language: String,
    pub action: TranslationAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TranslationData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationSummaryCounts {
    pub keys_processed: usize,
    pub translations_processed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationOutcome {
    pub project_id: String,
    pub results: Vec<TranslationChange>,
    pub summary: TranslationSummaryCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub total_found: usize,
    pub criteria_used: NormalizedCriteria,
    pub project_id: String,
    pub project_name: String,
}
