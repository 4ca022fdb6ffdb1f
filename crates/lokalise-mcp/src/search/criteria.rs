use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use time::OffsetDateTime;
use tracing::warn;

use crate::{
    api::{Language, Platform},
    timestamps,
};

/// Criteria as supplied by a caller. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name_exact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_description: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_after: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_before: Option<String>,
}

impl SearchCriteria {
    /// Validate every field, dropping (with a warning) whatever cannot be
    /// applied. Never fails.
    pub fn normalize(&self) -> NormalizedCriteria {
        let platforms = self
            .platforms
            .iter()
            .flatten()
            .filter_map(|raw| {
                let parsed = Platform::parse(raw);
                if parsed.is_none() {
                    warn!(
                        platform = %raw,
                        valid = %Platform::valid_list(),
                        "ignoring invalid platform in search criteria"
                    );
                }
                parsed
            })
            .fold(Vec::new(), push_unique);

        let requested_languages = self
            .languages
            .iter()
            .flatten()
            .filter_map(|raw| {
                let parsed = Language::parse(raw);
                if parsed.is_none() {
                    warn!(
                        language = %raw,
                        supported = %Language::supported_list(),
                        "ignoring unsupported language in search criteria"
                    );
                }
                parsed
            })
            .fold(Vec::new(), push_unique);
        let languages = if requested_languages.is_empty() {
            Language::SUPPORTED.to_vec()
        } else {
            requested_languages
        };

        let translation_status = non_blank(&self.translation_status).and_then(|raw| {
            let parsed = TranslationStatus::parse(&raw);
            if parsed.is_none() {
                warn!(status = %raw, "ignoring invalid translation status in search criteria");
            }
            parsed
        });

        let tags: Vec<String> = self
            .tags
            .iter()
            .flatten()
            .filter(|tag| !tag.trim().is_empty())
            .cloned()
            .fold(Vec::new(), push_unique);

        NormalizedCriteria {
            key_name_pattern: non_blank(&self.key_name_pattern),
            key_name_exact: non_blank(&self.key_name_exact),
            tags,
            platforms,
            translation_status,
            languages,
            has_description: self.has_description,
            description_pattern: non_blank(&self.description_pattern),
            created_after: DateBound::parse("createdAfter", &self.created_after),
            created_before: DateBound::parse("createdBefore", &self.created_before),
            modified_after: DateBound::parse("modifiedAfter", &self.modified_after),
            modified_before: DateBound::parse("modifiedBefore", &self.modified_before),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

fn push_unique<T: PartialEq>(mut acc: Vec<T>, item: T) -> Vec<T> {
    if !acc.contains(&item) {
        acc.push(item);
    }
    acc
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    Translated,
    Untranslated,
    Fuzzy,
    Reviewed,
    Any,
}

impl TranslationStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "translated" => Some(Self::Translated),
            "untranslated" => Some(Self::Untranslated),
            "fuzzy" => Some(Self::Fuzzy),
            "reviewed" => Some(Self::Reviewed),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Translated => "translated",
            Self::Untranslated => "untranslated",
            Self::Fuzzy => "fuzzy",
            Self::Reviewed => "reviewed",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for TranslationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed date bound that remembers how the caller wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateBound {
    raw: String,
    instant: OffsetDateTime,
}

impl DateBound {
    fn parse(field: &str, raw: &Option<String>) -> Option<Self> {
        let raw = non_blank(raw)?;
        match timestamps::parse_instant(&raw) {
            Some(instant) => Some(Self { raw, instant }),
            None => {
                warn!(field, value = %raw, "ignoring invalid date in search criteria");
                None
            }
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn instant(&self) -> OffsetDateTime {
        self.instant
    }
}

impl Serialize for DateBound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

/// Criteria after validation: only applicable values remain.
///
/// `languages` is never empty. The `modified*` bounds are validated and
/// reported back but take no part in matching.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name_exact: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_status: Option<TranslationStatus>,
    pub languages: Vec<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_description: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_after: Option<DateBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_before: Option<DateBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_after: Option<DateBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_before: Option<DateBound>,
}

impl Default for NormalizedCriteria {
    fn default() -> Self {
        SearchCriteria::default().normalize()
    }
}

impl NormalizedCriteria {
    /// Comma separated effective languages, for match reasons.
    pub fn language_list(&self) -> String {
        self.languages.iter().map(|l| l.as_str()).collect::<Vec<_>>().join(", ")
    }
}
