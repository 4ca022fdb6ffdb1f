use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::{
    LocalizationApi,
    pages::{Page, PageRequest},
    types::{
        CreateKeysRequest, CreateKeysResponse, DeleteKeysRequest, DeleteKeysResponse, KeyData,
        KeysEnvelope, ProjectData, ProjectEnvelope, ProjectsEnvelope, TranslationData,
        TranslationResponse, TranslationsEnvelope, UpdateKeysRequest, UpdateKeysResponse,
        UpdateTranslationRequest,
    },
};
use crate::{config::Settings, error::CoreError};

const TOKEN_HEADER: &str = "X-Api-Token";
const PAGE_COUNT_HEADER: &str = "X-Pagination-Page-Count";

/// `reqwest` implementation of [`LocalizationApi`].
#[derive(Clone)]
pub struct LokaliseClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl std::fmt::Debug for LokaliseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LokaliseClient").field("base_url", &self.base_url.as_str()).finish()
    }
}

impl LokaliseClient {
    /// Build a client from settings. Fails when no credential is configured.
    pub fn new(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_api_key()?.to_string();
        let http = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(concat!("lokalise-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| CoreError::Transport { source })?;
        Ok(Self { http, base_url: settings.base_url().clone(), api_key })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CoreError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url).header(TOKEN_HEADER, &self.api_key)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        method: &Method,
        path: &str,
    ) -> Result<(T, Option<u32>)> {
        let started = Instant::now();
        debug!(%method, path, "lokalise request");
        let response = builder.send().await.map_err(|source| CoreError::Transport { source })?;
        let status = response.status();
        debug!(
            %method,
            path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "lokalise response"
        );

        let page_count = response
            .headers()
            .get(PAGE_COUNT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u32>().ok());

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(remote_error(status, text).into());
        }

        let body = response
            .json::<T>()
            .await
            .map_err(|source| CoreError::Decode { path: path.to_string(), source })?;
        Ok((body, page_count))
    }
}

fn page_query(page: PageRequest) -> Vec<(&'static str, String)> {
    vec![("page", page.page.to_string()), ("limit", page.limit.to_string())]
}

fn remote_error(status: StatusCode, text: String) -> CoreError {
    let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
    let message = body
        .pointer("/error/message")
        .and_then(Value::as_str)
        .or_else(|| body.get("message").and_then(Value::as_str))
        .or_else(|| body.get("error").and_then(Value::as_str))
        .map(str::to_string);
    CoreError::RemoteStatus { status: status.as_u16(), message, body }
}

#[async_trait]
impl LocalizationApi for LokaliseClient {
    async fn list_projects(&self, page: PageRequest) -> Result<Page<ProjectData>> {
        let url = self.endpoint(&["projects"])?;
        let builder = self.request(Method::GET, url).query(&page_query(page));
        let (body, page_count): (ProjectsEnvelope, _) =
            self.execute(builder, &Method::GET, "/projects").await?;
        Ok(Page::new(body.projects).with_page_count(page_count))
    }

    async fn get_project(&self, project_id: &str) -> Result<ProjectData> {
        let url = self.endpoint(&["projects", project_id])?;
        let path = format!("/projects/{project_id}");
        let (body, _): (ProjectEnvelope, _) =
            self.execute(self.request(Method::GET, url), &Method::GET, &path).await?;
        Ok(body.into_project())
    }

    async fn list_keys(
        &self,
        project_id: &str,
        page: PageRequest,
        include_translations: bool,
    ) -> Result<Page<KeyData>> {
        let url = self.endpoint(&["projects", project_id, "keys"])?;
        let path = format!("/projects/{project_id}/keys");
        let mut query = page_query(page);
        query.push(("include_translations", if include_translations { "1" } else { "0" }.into()));
        let builder = self.request(Method::GET, url).query(&query);
        let (body, page_count): (KeysEnvelope, _) =
            self.execute(builder, &Method::GET, &path).await?;
        Ok(Page::new(body.keys).with_page_count(page_count))
    }

    async fn create_keys(
        &self,
        project_id: &str,
        request: &CreateKeysRequest,
    ) -> Result<CreateKeysResponse> {
        let url = self.endpoint(&["projects", project_id, "keys"])?;
        let path = format!("/projects/{project_id}/keys");
        let builder = self.request(Method::POST, url).json(request);
        let (body, _) = self.execute(builder, &Method::POST, &path).await?;
        Ok(body)
    }

    async fn update_keys(
        &self,
        project_id: &str,
        request: &UpdateKeysRequest,
    ) -> Result<UpdateKeysResponse> {
        let url = self.endpoint(&["projects", project_id, "keys"])?;
        let path = format!("/projects/{project_id}/keys");
        let builder = self.request(Method::PUT, url).json(request);
        let (body, _) = self.execute(builder, &Method::PUT, &path).await?;
        Ok(body)
    }

    async fn delete_keys(&self, project_id: &str, key_ids: &[u64]) -> Result<DeleteKeysResponse> {
        let url = self.endpoint(&["projects", project_id, "keys"])?;
        let path = format!("/projects/{project_id}/keys");
        let request = DeleteKeysRequest { keys: key_ids.to_vec() };
        let builder = self.request(Method::DELETE, url).json(&request);
        let (body, _) = self.execute(builder, &Method::DELETE, &path).await?;
        Ok(body)
    }

    async fn list_translations(
        &self,
        project_id: &str,
        page: PageRequest,
        filter_key_id: Option<u64>,
    ) -> Result<Page<TranslationData>> {
        let url = self.endpoint(&["projects", project_id, "translations"])?;
        let path = format!("/projects/{project_id}/translations");
        let mut query = page_query(page);
        if let Some(key_id) = filter_key_id {
            query.push(("filter_key_id", key_id.to_string()));
        }
        let builder = self.request(Method::GET, url).query(&query);
        let (body, page_count): (TranslationsEnvelope, _) =
            self.execute(builder, &Method::GET, &path).await?;
        Ok(Page::new(body.translations).with_page_count(page_count))
    }

    async fn update_translation(
        &self,
        project_id: &str,
        translation_id: u64,
        request: &UpdateTranslationRequest,
    ) -> Result<TranslationResponse> {
        let id = translation_id.to_string();
        let url = self.endpoint(&["projects", project_id, "translations", &id])?;
        let path = format!("/projects/{project_id}/translations/{id}");
        let builder = self.request(Method::PUT, url).json(request);
        let (body, _) = self.execute(builder, &Method::PUT, &path).await?;
        Ok(body)
    }
}
