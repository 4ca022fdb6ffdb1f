//! Operations exposed to the tool server, the HTTP surface and the CLI.
//!
//! Every operation checks its arguments before the first remote call, then
//! resolves names to identifiers and issues one remote write per batch. Calls
//! are strictly sequential.

mod inputs;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

pub use inputs::{
    KeyRef, KeyUpdate, NewKey, SearchResponse, TranslationAction, TranslationChange,
    TranslationItem, TranslationOutcome, TranslationSummaryCounts, TranslationTexts,
};

use crate::{
    api::{
        CreateKeysRequest, CreateKeysResponse, DeleteKeysResponse, KeyData, KeyUpdatePayload,
        Language, LocalizationApi, LokaliseClient, NewKeyPayload, PageRequest, Pager, Platform,
        ProjectData, TranslationData, TranslationInput, UpdateKeysRequest, UpdateKeysResponse,
        UpdateTranslationRequest,
    },
    config::Settings,
    error::CoreError,
    resolve,
    search::{self, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT, SearchCriteria},
};

#[derive(Clone)]
pub struct LocalizationService {
    api: Arc<dyn LocalizationApi>,
}

impl std::fmt::Debug for LocalizationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalizationService").finish_non_exhaustive()
    }
}

impl LocalizationService {
    pub fn new(api: Arc<dyn LocalizationApi>) -> Self {
        Self { api }
    }

    /// Service backed by the HTTP gateway. Fails without a credential.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = LokaliseClient::new(settings)?;
        Ok(Self::new(Arc::new(client)))
    }

    pub fn api(&self) -> &dyn LocalizationApi {
        self.api.as_ref()
    }

    pub async fn find_project_by_name(&self, name: &str) -> Result<Option<ProjectData>> {
        resolve::find_project_by_name(self.api(), name).await
    }

    /// Verifies the credential and base url with a one-item project listing.
    pub async fn check_connection(&self) -> Result<()> {
        self.api.list_projects(PageRequest::new(1, 1)).await?;
        info!("lokalise API connection verified");
        Ok(())
    }

    /// Fetches one project by its remote id.
    pub async fn project(&self, project_id: &str) -> Result<ProjectData> {
        self.api.get_project(project_id).await
    }

    async fn require_project(&self, name: &str) -> Result<ProjectData> {
        self.find_project_by_name(name)
            .await?
            .ok_or_else(|| CoreError::ProjectNotFound { name: name.to_string() }.into())
    }

    async fn require_key(&self, project: &ProjectData, project_name: &str, key: &str) -> Result<KeyData> {
        resolve::find_key_by_name(self.api(), &project.project_id, key).await?.ok_or_else(|| {
            CoreError::KeyNotFound { key: key.to_string(), project: project_name.to_string() }
                .into()
        })
    }

    /// Create keys in one batch. Platforms default to all of them; a supplied
    /// default value becomes the English translation.
    pub async fn add_keys(&self, project_name: &str, keys: &[NewKey]) -> Result<CreateKeysResponse> {
        require_project_name(project_name)?;
        if keys.is_empty() {
            return Err(CoreError::MissingArgument { what: "keys" }.into());
        }
        if keys.iter().any(|key| key.key_name.trim().is_empty()) {
            return Err(CoreError::EmptyKeyName.into());
        }
        let payloads = keys.iter().map(new_key_payload).collect::<Result<Vec<_>>>()?;

        let project = self.require_project(project_name).await?;
        let request = CreateKeysRequest { keys: payloads };
        let response = match self.api.create_keys(&project.project_id, &request).await {
            Ok(response) => response,
            Err(err) => return Err(clarify_create_error(err)),
        };

        info!(
            project = %project.name,
            requested = keys.len(),
            created = response.keys.len(),
            rejected = response.errors.len(),
            "keys added"
        );
        Ok(response)
    }

    /// Apply partial updates. Only supplied fields are sent.
    pub async fn update_keys(
        &self,
        project_name: &str,
        keys: &[KeyUpdate],
    ) -> Result<UpdateKeysResponse> {
        require_project_name(project_name)?;
        if keys.is_empty() {
            return Err(CoreError::MissingArgument { what: "keys" }.into());
        }
        let project = self.require_project(project_name).await?;

        let mut payloads = Vec::with_capacity(keys.len());
        for update in keys {
            let existing = self.require_key(&project, project_name, &update.key_name).await?;
            payloads.push(key_update_payload(existing.key_id, update)?);
        }

        let response = self
            .api
            .update_keys(&project.project_id, &UpdateKeysRequest { keys: payloads })
            .await?;
        info!(project = %project.name, updated = response.keys.len(), "keys updated");
        Ok(response)
    }

    /// Delete keys by name. Every name must resolve before anything is deleted.
    pub async fn delete_keys(&self, project_name: &str, keys: &[KeyRef]) -> Result<DeleteKeysResponse> {
        require_project_name(project_name)?;
        if keys.is_empty() {
            return Err(CoreError::MissingArgument { what: "keys" }.into());
        }
        let project = self.require_project(project_name).await?;

        let mut key_ids = Vec::with_capacity(keys.len());
        for key in keys {
            key_ids.push(self.require_key(&project, project_name, &key.key_name).await?.key_id);
        }

        let response = self.api.delete_keys(&project.project_id, &key_ids).await?;
        info!(
            project = %project.name,
            requested = key_ids.len(),
            keys_removed = response.keys_removed,
            "keys deleted"
        );
        Ok(response)
    }

    /// Write translations per key and language.
    ///
    /// An existing row for the language is updated in place and its reviewed
    /// flag set to `markAsReviewed` (false when absent). Otherwise the text is
    /// attached through a key update, which creates the row.
    pub async fn manage_translations(
        &self,
        project_name: &str,
        items: &[TranslationItem],
    ) -> Result<TranslationOutcome> {
        require_project_name(project_name)?;
        if items.is_empty() {
            return Err(CoreError::MissingArgument { what: "translations" }.into());
        }
        let project = self.require_project(project_name).await?;
        let project_id = project.project_id.as_str();

        let mut results = Vec::new();
        for item in items {
            let key = self.require_key(&project, project_name, &item.key_name).await?;
            let existing = self.key_translations(project_id, key.key_id).await?;

            for code in item.translations.keys() {
                if Language::parse(code).is_none() {
                    warn!(
                        key = %item.key_name,
                        language = %code,
                        supported = %Language::supported_list(),
                        "skipping unsupported language"
                    );
                }
            }

            for language in Language::SUPPORTED {
                let Some(text) = item.translations.get(language.as_str()) else {
                    continue;
                };
                let row = existing.iter().find(|t| t.language_iso == language.as_str());
                let change = match row {
                    Some(row) => {
                        let request = UpdateTranslationRequest {
                            translation: text.clone(),
                            is_reviewed: item.mark_as_reviewed.unwrap_or(false),
                        };
                        let updated =
                            self.api.update_translation(project_id, row.translation_id, &request).await?;
                        TranslationChange {
                            key_name: item.key_name.clone(),
                            language: language.as_str().to_string(),
                            action: TranslationAction::Updated,
                            translation_id: Some(row.translation_id),
                            key_id: None,
                            result: Some(updated.translation),
                        }
                    }
                    None => {
                        let payload = KeyUpdatePayload {
                            key_id: key.key_id,
                            translations: Some(vec![TranslationInput {
                                language_iso: language.as_str().to_string(),
                                translation: text.clone(),
                            }]),
                            ..Default::default()
                        };
                        self.api
                            .update_keys(project_id, &UpdateKeysRequest { keys: vec![payload] })
                            .await?;
                        TranslationChange {
                            key_name: item.key_name.clone(),
                            language: language.as_str().to_string(),
                            action: TranslationAction::Created,
                            translation_id: None,
                            key_id: Some(key.key_id),
                            result: None,
                        }
                    }
                };
                results.push(change);
            }
        }

        let summary = TranslationSummaryCounts {
            keys_processed: items.len(),
            translations_processed: results.len(),
        };
        info!(
            project = %project.name,
            keys = summary.keys_processed,
            translations = summary.translations_processed,
            "translations managed"
        );
        Ok(TranslationOutcome { project_id: project.project_id.clone(), results, summary })
    }

    async fn key_translations(&self, project_id: &str, key_id: u64) -> Result<Vec<TranslationData>> {
        let mut rows = Vec::new();
        let mut pager = Pager::new();
        while let Some(request) = pager.next_request() {
            let page = self.api.list_translations(project_id, request, Some(key_id)).await?;
            pager.advance(page.items.len(), page.page_count);
            rows.extend(page.items.into_iter().filter(|t| t.key_id == 0 || t.key_id == key_id));
        }
        Ok(rows)
    }

    /// Search a project's keys. `limit` defaults to 50 and is capped at 200.
    pub async fn search_keys(
        &self,
        project_name: &str,
        criteria: &SearchCriteria,
        limit: Option<i64>,
    ) -> Result<SearchResponse> {
        require_project_name(project_name)?;
        let limit = effective_limit(limit)?;
        let normalized = criteria.normalize();
        let project = self.require_project(project_name).await?;

        let results =
            search::search_keys(self.api(), &project.project_id, &normalized, limit).await?;
        info!(project = %project.name, found = results.len(), limit, "keys searched");
        Ok(SearchResponse {
            total_found: results.len(),
            results,
            criteria_used: normalized,
            project_id: project.project_id,
            project_name: project.name,
        })
    }

    /// All projects, optionally filtered by a case-insensitive substring of
    /// the name or description.
    pub async fn search_projects(&self, term: Option<&str>) -> Result<Vec<ProjectData>> {
        let mut projects = Vec::new();
        let mut pager = Pager::new();
        while let Some(request) = pager.next_request() {
            let page = self.api.list_projects(request).await?;
            pager.advance(page.items.len(), page.page_count);
            projects.extend(page.items);
        }

        if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
            let needle = term.to_lowercase();
            projects.retain(|project| {
                project.name.to_lowercase().contains(&needle)
                    || project
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            });
        }
        info!(term = term.unwrap_or(""), found = projects.len(), "projects searched");
        Ok(projects)
    }
}

fn require_project_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CoreError::MissingArgument { what: "projectName" }.into());
    }
    Ok(())
}

fn effective_limit(limit: Option<i64>) -> Result<usize> {
    let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    if limit <= 0 {
        return Err(CoreError::InvalidLimit { limit }.into());
    }
    Ok(limit.min(MAX_SEARCH_LIMIT) as usize)
}

fn parse_platforms(raw: &[String]) -> Vec<Platform> {
    let mut platforms = Vec::new();
    for value in raw {
        match Platform::parse(value) {
            Some(platform) if !platforms.contains(&platform) => platforms.push(platform),
            Some(_) => {}
            None => warn!(platform = %value, "dropping unsupported platform"),
        }
    }
    platforms
}

fn no_valid_platforms(key: &str) -> anyhow::Error {
    CoreError::NoValidPlatforms { key: key.to_string(), valid: Platform::valid_list() }.into()
}

fn new_key_payload(key: &NewKey) -> Result<NewKeyPayload> {
    let platforms = match key.platforms.as_deref() {
        Some(raw) if !raw.is_empty() => {
            let platforms = parse_platforms(raw);
            if platforms.is_empty() {
                return Err(no_valid_platforms(&key.key_name));
            }
            platforms
        }
        _ => Platform::ALL.to_vec(),
    };

    let translations = key.default_value.as_ref().filter(|v| !v.is_empty()).map(|value| {
        vec![TranslationInput {
            language_iso: Language::En.as_str().to_string(),
            translation: value.clone(),
        }]
    });

    Ok(NewKeyPayload {
        key_name: key.key_name.clone(),
        platforms,
        translations,
        description: key.description.clone().filter(|d| !d.is_empty()),
        tags: key.tags.clone().filter(|t| !t.is_empty()),
    })
}

fn key_update_payload(key_id: u64, update: &KeyUpdate) -> Result<KeyUpdatePayload> {
    let platforms = match update.platforms.as_deref() {
        Some(raw) if !raw.is_empty() => {
            let platforms = parse_platforms(raw);
            if platforms.is_empty() {
                return Err(no_valid_platforms(&update.key_name));
            }
            Some(platforms)
        }
        _ => None,
    };

    let translations = update.translations.as_ref().and_then(|texts| {
        let inputs: Vec<TranslationInput> = Language::SUPPORTED
            .iter()
            .filter_map(|language| {
                texts.get(language.as_str()).map(|text| TranslationInput {
                    language_iso: language.as_str().to_string(),
                    translation: text.clone(),
                })
            })
            .collect();
        (!inputs.is_empty()).then_some(inputs)
    });

    Ok(KeyUpdatePayload {
        key_id,
        platforms,
        description: update.description.clone(),
        tags: update.tags.clone(),
        translations,
    })
}

/// Turn a 400 from key creation into [`CoreError::InvalidKeyData`].
fn clarify_create_error(err: anyhow::Error) -> anyhow::Error {
    match err.downcast::<CoreError>() {
        Ok(core) if core.remote_status() == Some(400) => {
            let message = match &core {
                CoreError::RemoteStatus { message: Some(message), .. } => message.clone(),
                other => other.to_string(),
            };
            CoreError::InvalidKeyData { message, source: Box::new(core) }.into()
        }
        Ok(core) => core.into(),
        Err(err) => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_caps() {
        assert_eq!(effective_limit(None).unwrap(), 50);
        assert_eq!(effective_limit(Some(500)).unwrap(), 200);
        assert_eq!(effective_limit(Some(1)).unwrap(), 1);
        let err = effective_limit(Some(0)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::InvalidLimit { limit: 0 })
        ));
    }

    #[test]
    fn new_key_defaults_to_every_platform() {
        let payload = new_key_payload(&NewKey::named("hello").with_default_value("Hi")).unwrap();
        assert_eq!(payload.platforms, Platform::ALL.to_vec());
        assert_eq!(
            payload.translations,
            Some(vec![TranslationInput { language_iso: "en".into(), translation: "Hi".into() }])
        );
    }

    #[test]
    fn new_key_rejects_only_invalid_platforms() {
        let err = new_key_payload(&NewKey::named("hello").with_platforms(["desktop"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no valid platforms specified for key: hello. Valid platforms are: web, ios, android, other"
        );

        let payload =
            new_key_payload(&NewKey::named("hello").with_platforms(["web", "desktop", "ios"]))
                .unwrap();
        assert_eq!(payload.platforms, vec![Platform::Web, Platform::Ios]);
    }

    #[test]
    fn update_payload_keeps_supported_languages_only() {
        let update = KeyUpdate {
            key_name: "hello".into(),
            translations: Some(TranslationTexts::from([
                ("fr".to_string(), "Bonjour".to_string()),
                ("de".to_string(), "Hallo".to_string()),
            ])),
            ..Default::default()
        };
        let payload = key_update_payload(9, &update).unwrap();
        assert_eq!(payload.platforms, None);
        assert_eq!(
            payload.translations,
            Some(vec![TranslationInput { language_iso: "de".into(), translation: "Hallo".into() }])
        );

        let only_french = KeyUpdate {
            key_name: "hello".into(),
            translations: Some(TranslationTexts::from([("fr".to_string(), "Salut".to_string())])),
            ..Default::default()
        };
        assert_eq!(key_update_payload(9, &only_french).unwrap().translations, None);
    }

    #[test]
    fn only_bad_requests_are_clarified() {
        let bad = CoreError::RemoteStatus {
            status: 400,
            message: Some("Key name already exists".into()),
            body: serde_json::Value::Null,
        };
        let clarified = clarify_create_error(bad.into());
        assert_eq!(clarified.to_string(), "invalid key data: Key name already exists");

        let other = CoreError::RemoteStatus { status: 500, message: None, body: serde_json::Value::Null };
        let passed = clarify_create_error(other.into());
        assert_eq!(passed.downcast_ref::<CoreError>().and_then(CoreError::remote_status), Some(500));
    }
}
