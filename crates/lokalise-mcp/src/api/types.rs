//! Wire model of the remote localization API.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::timestamps;

/// Largest page size the remote API accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Platforms a key can be scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Web,
    Ios,
    Android,
    Other,
}

impl Platform {
    pub const ALL: [Platform; 4] = [Platform::Web, Platform::Ios, Platform::Android, Platform::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Web => "web",
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Other => "other",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "web" => Some(Platform::Web),
            "ios" => Some(Platform::Ios),
            "android" => Some(Platform::Android),
            "other" => Some(Platform::Other),
            _ => None,
        }
    }

    /// Comma separated list of every platform, for messages.
    pub fn valid_list() -> String {
        Self::ALL.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Languages this integration reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    De,
}

impl Language {
    pub const SUPPORTED: [Language; 2] = [Language::En, Language::De];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::De => "de",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "en" => Some(Language::En),
            "de" => Some(Language::De),
            _ => None,
        }
    }

    pub fn supported_list() -> String {
        Self::SUPPORTED.iter().map(|l| l.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key name as returned by the remote API: either one string, or one
/// string per platform.
///
/// Matching rule used everywhere (resolution and search): a name matches when
/// the plain string, or any of the per-platform values, satisfies the test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyName {
    Plain(String),
    PerPlatform(BTreeMap<String, String>),
}

impl Default for KeyName {
    fn default() -> Self {
        KeyName::Plain(String::new())
    }
}

impl KeyName {
    /// Every distinct name value, plain name first.
    pub fn names(&self) -> Vec<&str> {
        match self {
            KeyName::Plain(name) => vec![name.as_str()],
            KeyName::PerPlatform(map) => {
                let mut names: Vec<&str> = Vec::with_capacity(map.len());
                for value in self.platform_ordered_values(map) {
                    if !names.contains(&value) {
                        names.push(value);
                    }
                }
                names
            }
        }
    }

    pub fn matches_exact(&self, target: &str) -> bool {
        self.names().into_iter().any(|name| name == target)
    }

    /// Case-insensitive substring test against every name value.
    pub fn contains_ignore_case(&self, pattern: &str) -> bool {
        let needle = pattern.to_lowercase();
        self.names().into_iter().any(|name| name.to_lowercase().contains(&needle))
    }

    /// Single name for display: the plain name, else the first platform value
    /// in `web, ios, android, other` order, else the first remaining entry.
    pub fn display_name(&self) -> &str {
        self.names().first().copied().unwrap_or("")
    }

    fn platform_ordered_values<'a>(&self, map: &'a BTreeMap<String, String>) -> Vec<&'a str> {
        let mut ordered: Vec<&'a str> = Platform::ALL
            .iter()
            .filter_map(|platform| map.get(platform.as_str()).map(String::as_str))
            .collect();
        ordered.extend(
            map.iter()
                .filter(|(platform, _)| Platform::parse(platform).is_none())
                .map(|(_, value)| value.as_str()),
        );
        ordered
    }
}

impl From<&str> for KeyName {
    fn from(value: &str) -> Self {
        KeyName::Plain(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub created_by: u64,
    #[serde(default)]
    pub created_by_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationData {
    #[serde(default)]
    pub translation_id: u64,
    #[serde(default)]
    pub key_id: u64,
    pub language_iso: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub is_fuzzy: bool,
    #[serde(default)]
    pub is_reviewed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

impl TranslationData {
    pub fn text(&self) -> &str {
        self.translation.as_deref().unwrap_or("")
    }

    /// Missing or whitespace-only text means "untranslated".
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// Whitespace-delimited token count of the text.
    pub fn word_count(&self) -> usize {
        self.text().split_whitespace().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyData {
    pub key_id: u64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at_timestamp: Option<i64>,
    #[serde(default)]
    pub key_name: KeyName,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub translations: Vec<TranslationData>,
}

impl KeyData {
    /// Creation instant, preferring the numeric timestamp when present.
    pub fn created_instant(&self) -> Option<OffsetDateTime> {
        self.created_at_timestamp
            .and_then(timestamps::from_unix)
            .or_else(|| timestamps::parse_instant(&self.created_at))
    }

    pub fn has_platform(&self, platform: Platform) -> bool {
        self.platforms.iter().any(|p| Platform::parse(p) == Some(platform))
    }

    pub fn has_description(&self) -> bool {
        self.description.as_deref().map(|d| !d.trim().is_empty()).unwrap_or(false)
    }
}

/// One language's text in a create or update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationInput {
    pub language_iso: String,
    pub translation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewKeyPayload {
    pub key_name: String,
    pub platforms: Vec<Platform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translations: Option<Vec<TranslationInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateKeysRequest {
    pub keys: Vec<NewKeyPayload>,
}

/// Per-key failure reported inside an otherwise successful bulk response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyError {
    pub message: String,
    #[serde(default)]
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateKeysResponse {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub keys: Vec<KeyData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<KeyError>,
}

/// Partial update: only supplied fields are serialized.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyUpdatePayload {
    pub key_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<Platform>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translations: Option<Vec<TranslationInput>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateKeysRequest {
    pub keys: Vec<KeyUpdatePayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateKeysResponse {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub keys: Vec<KeyData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<KeyError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteKeysRequest {
    pub keys: Vec<u64>,
}

/// `keys_removed` is a flag for the whole batch, not a per-key count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteKeysResponse {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub keys_removed: bool,
    #[serde(default)]
    pub keys_locked: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTranslationRequest {
    pub translation: String,
    pub is_reviewed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResponse {
    #[serde(default)]
    pub project_id: String,
    pub translation: TranslationData,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProjectsEnvelope {
    #[serde(default)]
    pub projects: Vec<ProjectData>,
}

/// Single-project responses arrive either bare or wrapped in `project`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProjectEnvelope {
    Wrapped { project: ProjectData },
    Bare(ProjectData),
}

impl ProjectEnvelope {
    pub fn into_project(self) -> ProjectData {
        match self {
            ProjectEnvelope::Wrapped { project } => project,
            ProjectEnvelope::Bare(project) => project,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct KeysEnvelope {
    #[serde(default)]
    pub keys: Vec<KeyData>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TranslationsEnvelope {
    #[serde(default)]
    pub translations: Vec<TranslationData>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_plain_and_per_platform_names() {
        let plain: KeyData =
            serde_json::from_value(json!({ "key_id": 1, "key_name": "hello" })).unwrap();
        assert_eq!(plain.key_name, KeyName::Plain("hello".into()));

        let mapped: KeyData = serde_json::from_value(json!({
            "key_id": 2,
            "key_name": { "ios": "hello_ios", "android": "hello", "web": "hello.web", "other": "hello" }
        }))
        .unwrap();
        assert_eq!(mapped.key_name.display_name(), "hello.web");
        assert_eq!(mapped.key_name.names(), vec!["hello.web", "hello_ios", "hello"]);
        assert!(mapped.key_name.matches_exact("hello_ios"));
        assert!(!mapped.key_name.matches_exact("HELLO"));
        assert!(mapped.key_name.contains_ignore_case("IOS"));
    }

    #[test]
    fn missing_optional_fields_default() {
        let key: KeyData = serde_json::from_value(json!({
            "key_id": 7,
            "key_name": "k",
            "translations": [{ "language_iso": "en", "translation": null }]
        }))
        .unwrap();
        assert!(key.tags.is_empty());
        assert!(!key.has_description());
        assert!(key.translations[0].is_blank());
        assert_eq!(key.created_instant(), None);
    }

    #[test]
    fn word_count_splits_on_whitespace() {
        let translation = TranslationData {
            translation_id: 1,
            key_id: 1,
            language_iso: "en".into(),
            translation: Some("  Welcome to\tour   app ".into()),
            is_fuzzy: false,
            is_reviewed: false,
            words: None,
            modified_at: None,
        };
        assert_eq!(translation.word_count(), 4);
    }

    #[test]
    fn partial_update_serializes_only_supplied_fields() {
        let payload = KeyUpdatePayload {
            key_id: 42,
            description: Some("Greeting".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "key_id": 42, "description": "Greeting" })
        );
    }

    #[test]
    fn project_envelope_accepts_both_shapes() {
        let body = json!({ "project_id": "p1", "name": "Watt" });
        let bare: ProjectEnvelope = serde_json::from_value(body.clone()).unwrap();
        let wrapped: ProjectEnvelope =
            serde_json::from_value(json!({ "project_id": "p1", "project": body })).unwrap();
        assert_eq!(bare.into_project().name, "Watt");
        assert_eq!(wrapped.into_project().project_id, "p1");
    }

    #[test]
    fn parses_platforms_leniently() {
        assert_eq!(Platform::parse(" IOS "), Some(Platform::Ios));
        assert_eq!(Platform::parse("desktop"), None);
        assert_eq!(Language::parse("fr"), None);
        assert_eq!(Platform::valid_list(), "web, ios, android, other");
    }
}
