#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use anyhow::Result;
use async_trait::async_trait;
use lokalise_mcp::{
    CoreError, LocalizationService,
    api::{
        CreateKeysRequest, CreateKeysResponse, DeleteKeysResponse, KeyData, KeyName,
        LocalizationApi, Page, PageRequest, ProjectData, TranslationData, TranslationInput,
        TranslationResponse, UpdateKeysRequest, UpdateKeysResponse, UpdateTranslationRequest,
    },
};
use serde_json::Value;

/// Number of calls made per remote operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Calls {
    pub list_projects: usize,
    pub get_project: usize,
    pub list_keys: usize,
    pub create_keys: usize,
    pub update_keys: usize,
    pub delete_keys: usize,
    pub list_translations: usize,
    pub update_translation: usize,
}

impl Calls {
    pub fn writes(&self) -> usize {
        self.create_keys + self.update_keys + self.delete_keys + self.update_translation
    }
}

#[derive(Debug, Default)]
struct State {
    projects: Vec<ProjectData>,
    keys: BTreeMap<String, Vec<KeyData>>,
    next_key_id: u64,
    next_translation_id: u64,
    calls: Calls,
    create_requests: Vec<CreateKeysRequest>,
    update_requests: Vec<UpdateKeysRequest>,
    translation_updates: Vec<(u64, UpdateTranslationRequest)>,
    deleted: Vec<u64>,
    create_failure: Option<(u16, Value)>,
}

/// In-memory remote. Reports an explicit page count unless told not to.
#[derive(Debug, Clone)]
pub struct FakeApi {
    state: Arc<Mutex<State>>,
    report_page_count: bool,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeApi {
    pub fn new() -> Self {
        let state = State { next_key_id: 1000, next_translation_id: 5000, ..Default::default() };
        Self { state: Arc::new(Mutex::new(state)), report_page_count: true }
    }

    pub fn without_page_count(mut self) -> Self {
        self.report_page_count = false;
        self
    }

    pub fn service(&self) -> LocalizationService {
        LocalizationService::new(Arc::new(self.clone()))
    }

    pub fn with_project(self, project_id: &str, name: &str, description: Option<&str>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.projects.push(ProjectData {
                project_id: project_id.to_string(),
                name: name.to_string(),
                description: description.map(str::to_string),
                created_at: "2024-01-01 00:00:00 (Etc/UTC)".to_string(),
                created_by: 1,
                created_by_email: "owner@example.com".to_string(),
            });
            state.keys.entry(project_id.to_string()).or_default();
        }
        self
    }

    pub fn with_key(self, project_id: &str, key: KeyData) -> Self {
        self.state.lock().unwrap().keys.entry(project_id.to_string()).or_default().push(key);
        self
    }

    /// `count` keys named `key_0000`, `key_0001`, ... with an English text each.
    pub fn with_generated_keys(self, project_id: &str, count: usize) -> Self {
        for index in 0..count {
            let id = 1 + index as u64;
            let key = key(id, &format!("key_{index:04}"))
                .with_translation(translation(10_000 + id, id, "en", "Text"));
            self.state.lock().unwrap().keys.entry(project_id.to_string()).or_default().push(key.0);
        }
        self
    }

    pub fn fail_create_with(&self, status: u16, body: Value) {
        self.state.lock().unwrap().create_failure = Some((status, body));
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn reset_calls(&self) {
        self.state.lock().unwrap().calls = Calls::default();
    }

    pub fn create_requests(&self) -> Vec<CreateKeysRequest> {
        self.state.lock().unwrap().create_requests.clone()
    }

    pub fn update_requests(&self) -> Vec<UpdateKeysRequest> {
        self.state.lock().unwrap().update_requests.clone()
    }

    pub fn translation_updates(&self) -> Vec<(u64, UpdateTranslationRequest)> {
        self.state.lock().unwrap().translation_updates.clone()
    }

    pub fn deleted(&self) -> Vec<u64> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn keys(&self, project_id: &str) -> Vec<KeyData> {
        self.state.lock().unwrap().keys.get(project_id).cloned().unwrap_or_default()
    }

    fn page_of<T: Clone>(&self, items: &[T], request: PageRequest) -> Page<T> {
        let limit = request.limit.max(1) as usize;
        let start = (request.page.saturating_sub(1) as usize) * limit;
        let slice: Vec<T> = items.iter().skip(start).take(limit).cloned().collect();
        let page_count = items.len().div_ceil(limit).max(1) as u32;
        Page::new(slice).with_page_count(self.report_page_count.then_some(page_count))
    }
}

/// Builder wrapper so fixtures read top-down.
pub struct KeyFixture(pub KeyData);

pub fn key(key_id: u64, name: &str) -> KeyFixture {
    KeyFixture(KeyData {
        key_id,
        created_at: "2024-03-01 10:00:00 (Etc/UTC)".to_string(),
        created_at_timestamp: None,
        key_name: KeyName::Plain(name.to_string()),
        platforms: vec!["web".to_string()],
        description: None,
        tags: Vec::new(),
        translations: Vec::new(),
    })
}

impl KeyFixture {
    pub fn per_platform(mut self, names: &[(&str, &str)]) -> Self {
        self.0.key_name = KeyName::PerPlatform(
            names.iter().map(|(p, n)| (p.to_string(), n.to_string())).collect(),
        );
        self
    }

    pub fn platforms(mut self, platforms: &[&str]) -> Self {
        self.0.platforms = platforms.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.0.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.0.description = Some(description.to_string());
        self
    }

    pub fn created_at(mut self, created_at: &str) -> Self {
        self.0.created_at = created_at.to_string();
        self
    }

    pub fn with_translation(mut self, translation: TranslationData) -> Self {
        self.0.translations.push(translation);
        self
    }

    pub fn build(self) -> KeyData {
        self.0
    }
}

pub fn translation(translation_id: u64, key_id: u64, language: &str, text: &str) -> TranslationData {
    TranslationData {
        translation_id,
        key_id,
        language_iso: language.to_string(),
        translation: Some(text.to_string()),
        is_fuzzy: false,
        is_reviewed: false,
        words: None,
        modified_at: None,
    }
}

fn project_keys<'a>(state: &'a mut State, project_id: &str) -> Result<&'a mut Vec<KeyData>> {
    state.keys.get_mut(project_id).ok_or_else(|| {
        CoreError::RemoteStatus {
            status: 404,
            message: Some("Project not found".into()),
            body: serde_json::json!({ "error": { "message": "Project not found", "code": 404 } }),
        }
        .into()
    })
}

fn upsert_translation(state_next_id: &mut u64, key: &mut KeyData, input: &TranslationInput) {
    match key.translations.iter_mut().find(|t| t.language_iso == input.language_iso) {
        Some(row) => row.translation = Some(input.translation.clone()),
        None => {
            *state_next_id += 1;
            key.translations.push(translation(
                *state_next_id,
                key.key_id,
                &input.language_iso,
                &input.translation,
            ));
        }
    }
}

#[async_trait]
impl LocalizationApi for FakeApi {
    async fn list_projects(&self, page: PageRequest) -> Result<Page<ProjectData>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_projects += 1;
        let projects = state.projects.clone();
        Ok(self.page_of(&projects, page))
    }

    async fn get_project(&self, project_id: &str) -> Result<ProjectData> {
        let mut state = self.state.lock().unwrap();
        state.calls.get_project += 1;
        state.projects.iter().find(|p| p.project_id == project_id).cloned().ok_or_else(|| {
            CoreError::RemoteStatus { status: 404, message: None, body: Value::Null }.into()
        })
    }

    async fn list_keys(
        &self,
        project_id: &str,
        page: PageRequest,
        include_translations: bool,
    ) -> Result<Page<KeyData>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_keys += 1;
        let mut keys = project_keys(&mut state, project_id)?.clone();
        if !include_translations {
            keys.iter_mut().for_each(|key| key.translations.clear());
        }
        Ok(self.page_of(&keys, page))
    }

    async fn create_keys(
        &self,
        project_id: &str,
        request: &CreateKeysRequest,
    ) -> Result<CreateKeysResponse> {
        let mut state = self.state.lock().unwrap();
        state.calls.create_keys += 1;
        state.create_requests.push(request.clone());
        if let Some((status, body)) = state.create_failure.clone() {
            let message =
                body.pointer("/error/message").and_then(Value::as_str).map(str::to_string);
            return Err(CoreError::RemoteStatus { status, message, body }.into());
        }

        let mut created = Vec::new();
        for payload in &request.keys {
            state.next_key_id += 1;
            let key_id = state.next_key_id;
            let mut key = KeyData {
                key_id,
                created_at: "2024-06-01 12:00:00 (Etc/UTC)".to_string(),
                created_at_timestamp: Some(1_717_243_200),
                key_name: KeyName::Plain(payload.key_name.clone()),
                platforms: payload.platforms.iter().map(|p| p.as_str().to_string()).collect(),
                description: payload.description.clone(),
                tags: payload.tags.clone().unwrap_or_default(),
                translations: Vec::new(),
            };
            let mut next_translation_id = state.next_translation_id;
            for input in payload.translations.iter().flatten() {
                upsert_translation(&mut next_translation_id, &mut key, input);
            }
            state.next_translation_id = next_translation_id;
            created.push(key);
        }
        project_keys(&mut state, project_id)?.extend(created.iter().cloned());
        Ok(CreateKeysResponse { project_id: project_id.to_string(), keys: created, errors: Vec::new() })
    }

    async fn update_keys(
        &self,
        project_id: &str,
        request: &UpdateKeysRequest,
    ) -> Result<UpdateKeysResponse> {
        let mut state = self.state.lock().unwrap();
        state.calls.update_keys += 1;
        state.update_requests.push(request.clone());
        let mut next_translation_id = state.next_translation_id;
        let mut updated = Vec::new();
        let keys = project_keys(&mut state, project_id)?;
        for payload in &request.keys {
            let Some(key) = keys.iter_mut().find(|k| k.key_id == payload.key_id) else {
                continue;
            };
            if let Some(platforms) = &payload.platforms {
                key.platforms = platforms.iter().map(|p| p.as_str().to_string()).collect();
            }
            if let Some(description) = &payload.description {
                key.description = Some(description.clone());
            }
            if let Some(tags) = &payload.tags {
                key.tags = tags.clone();
            }
            for input in payload.translations.iter().flatten() {
                upsert_translation(&mut next_translation_id, key, input);
            }
            updated.push(key.clone());
        }
        state.next_translation_id = next_translation_id;
        Ok(UpdateKeysResponse { project_id: project_id.to_string(), keys: updated, errors: Vec::new() })
    }

    async fn delete_keys(&self, project_id: &str, key_ids: &[u64]) -> Result<DeleteKeysResponse> {
        let mut state = self.state.lock().unwrap();
        state.calls.delete_keys += 1;
        state.deleted.extend_from_slice(key_ids);
        let keys = project_keys(&mut state, project_id)?;
        let before = keys.len();
        keys.retain(|key| !key_ids.contains(&key.key_id));
        Ok(DeleteKeysResponse {
            project_id: project_id.to_string(),
            keys_removed: keys.len() < before,
            keys_locked: 0,
        })
    }

    async fn list_translations(
        &self,
        project_id: &str,
        page: PageRequest,
        filter_key_id: Option<u64>,
    ) -> Result<Page<TranslationData>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_translations += 1;
        let rows: Vec<TranslationData> = project_keys(&mut state, project_id)?
            .iter()
            .filter(|key| filter_key_id.is_none_or(|id| key.key_id == id))
            .flat_map(|key| key.translations.clone())
            .collect();
        Ok(self.page_of(&rows, page))
    }

    async fn update_translation(
        &self,
        project_id: &str,
        translation_id: u64,
        request: &UpdateTranslationRequest,
    ) -> Result<TranslationResponse> {
        let mut state = self.state.lock().unwrap();
        state.calls.update_translation += 1;
        state.translation_updates.push((translation_id, request.clone()));
        let keys = project_keys(&mut state, project_id)?;
        let row = keys
            .iter_mut()
            .flat_map(|key| key.translations.iter_mut())
            .find(|row| row.translation_id == translation_id)
            .ok_or_else(|| CoreError::RemoteStatus {
                status: 404,
                message: Some("Translation not found".into()),
                body: Value::Null,
            })?;
        row.translation = Some(request.translation.clone());
        row.is_reviewed = request.is_reviewed;
        Ok(TranslationResponse { project_id: project_id.to_string(), translation: row.clone() })
    }
}
