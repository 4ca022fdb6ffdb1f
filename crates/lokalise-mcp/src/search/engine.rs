use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use super::criteria::{NormalizedCriteria, TranslationStatus};
use crate::api::{KeyData, KeyName, LocalizationApi, Pager, TranslationData};

/// Outcome of evaluating one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub matches: bool,
    pub reasons: Vec<String>,
}

/// A matching key with the reasons it matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub key_id: u64,
    pub key_name: KeyName,
    pub platforms: Vec<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    /// The remote does not expose a modification time on keys.
    pub modified_at: String,
    pub translations: Vec<TranslationSummary>,
    #[serde(rename = "matchReasons")]
    pub match_reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationSummary {
    pub language_iso: String,
    pub translation: String,
    pub is_fuzzy: bool,
    pub is_reviewed: bool,
    pub words: usize,
}

impl From<&TranslationData> for TranslationSummary {
    fn from(t: &TranslationData) -> Self {
        Self {
            language_iso: t.language_iso.clone(),
            translation: t.text().to_string(),
            is_fuzzy: t.is_fuzzy,
            is_reviewed: t.is_reviewed,
            words: t.word_count(),
        }
    }
}

impl SearchResult {
    fn new(key: &KeyData, reasons: Vec<String>) -> Self {
        Self {
            key_id: key.key_id,
            key_name: key.key_name.clone(),
            platforms: key.platforms.clone(),
            description: key.description.clone(),
            tags: key.tags.clone(),
            created_at: key.created_at.clone(),
            modified_at: key.created_at.clone(),
            translations: key.translations.iter().map(TranslationSummary::from).collect(),
            match_reasons: reasons,
        }
    }
}

/// Evaluate every applicable criterion against `key`, in a fixed order.
///
/// A failing criterion clears `matches` but later criteria are still checked,
/// so `reasons` lists everything that did hold.
pub fn evaluate_key(key: &KeyData, criteria: &NormalizedCriteria) -> Evaluation {
    let mut matches = true;
    let mut reasons = Vec::new();
    let mut check = |holds: bool, reason: Option<String>| {
        if holds {
            reasons.extend(reason);
        } else {
            matches = false;
        }
    };

    if let Some(pattern) = &criteria.key_name_pattern {
        check(
            key.key_name.contains_ignore_case(pattern),
            Some(format!("Key name contains \"{pattern}\"")),
        );
    }

    if let Some(exact) = &criteria.key_name_exact {
        check(
            key.key_name.matches_exact(exact),
            Some(format!("Key name exactly matches \"{exact}\"")),
        );
    }

    if !criteria.tags.is_empty() {
        let holds = criteria.tags.iter().all(|tag| key.tags.contains(tag));
        check(holds, Some(format!("Has tags: {}", criteria.tags.join(", "))));
    }

    if !criteria.platforms.is_empty() {
        let holds = criteria.platforms.iter().all(|platform| key.has_platform(*platform));
        let list = criteria.platforms.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ");
        check(holds, Some(format!("Available on platforms: {list}")));
    }

    if let Some(wanted) = criteria.has_description {
        let reason = if wanted { "Has description" } else { "No description" };
        check(key.has_description() == wanted, Some(reason.to_string()));
    }

    if let Some(pattern) = &criteria.description_pattern {
        let needle = pattern.to_lowercase();
        let holds = key
            .description
            .as_deref()
            .is_some_and(|description| description.to_lowercase().contains(&needle));
        check(holds, Some(format!("Description contains \"{pattern}\"")));
    }

    if let Some(status) = criteria.translation_status {
        let (holds, reason) = evaluate_status(key, criteria, status);
        check(holds, reason);
    }

    if let Some(bound) = &criteria.created_after {
        let holds = key.created_instant().is_some_and(|created| created >= bound.instant());
        check(holds, Some(format!("Created after {}", bound.raw())));
    }

    if let Some(bound) = &criteria.created_before {
        let holds = key.created_instant().is_some_and(|created| created <= bound.instant());
        check(holds, Some(format!("Created before {}", bound.raw())));
    }

    Evaluation { matches, reasons }
}

fn evaluate_status(
    key: &KeyData,
    criteria: &NormalizedCriteria,
    status: TranslationStatus,
) -> (bool, Option<String>) {
    let relevant: Vec<&TranslationData> = key
        .translations
        .iter()
        .filter(|t| criteria.languages.iter().any(|lang| lang.as_str() == t.language_iso))
        .collect();
    let languages = criteria.language_list();

    match status {
        TranslationStatus::Translated => (
            relevant.iter().all(|t| !t.is_blank()),
            Some(format!("Fully translated in {languages}")),
        ),
        TranslationStatus::Untranslated => (
            relevant.iter().any(|t| t.is_blank()),
            Some(format!("Has untranslated content in {languages}")),
        ),
        TranslationStatus::Fuzzy => (
            relevant.iter().any(|t| t.is_fuzzy),
            Some(format!("Has fuzzy translations in {languages}")),
        ),
        TranslationStatus::Reviewed => (
            relevant.iter().all(|t| t.is_reviewed),
            Some(format!("All translations reviewed in {languages}")),
        ),
        TranslationStatus::Any => (true, None),
    }
}

/// Walk every key of `project_id` (translations included) and collect up to
/// `limit` matches in page order.
pub async fn search_keys(
    api: &dyn LocalizationApi,
    project_id: &str,
    criteria: &NormalizedCriteria,
    limit: usize,
) -> Result<Vec<SearchResult>> {
    let mut results = Vec::new();
    let mut scanned = 0usize;
    let mut pager = Pager::new();

    while let Some(request) = pager.next_request() {
        if results.len() >= limit {
            break;
        }
        let page = api.list_keys(project_id, request, true).await?;
        scanned += page.items.len();
        for key in &page.items {
            if results.len() >= limit {
                pager.finish();
                break;
            }
            let evaluation = evaluate_key(key, criteria);
            if evaluation.matches {
                results.push(SearchResult::new(key, evaluation.reasons));
            }
        }
        pager.advance(page.items.len(), page.page_count);
    }

    debug!(project_id, scanned, found = results.len(), limit, "key search finished");
    Ok(results)
}
