//! Remote localization API gateway.

mod client;
mod pages;
mod types;

use anyhow::Result;
use async_trait::async_trait;

pub use client::LokaliseClient;
pub use pages::{Page, PageRequest, Pager};
pub use types::{
    CreateKeysRequest, CreateKeysResponse, DeleteKeysRequest, DeleteKeysResponse, KeyData,
    KeyError, KeyName, KeyUpdatePayload, Language, MAX_PAGE_SIZE, NewKeyPayload, Platform,
    ProjectData, TranslationData, TranslationInput, TranslationResponse, UpdateKeysRequest,
    UpdateKeysResponse, UpdateTranslationRequest,
};

/// Typed operations against the remote localization service.
///
/// Implementations never retry; any non-2xx response becomes
/// [`crate::CoreError::RemoteStatus`].
#[async_trait]
pub trait LocalizationApi: Send + Sync {
    async fn list_projects(&self, page: PageRequest) -> Result<Page<ProjectData>>;

    async fn get_project(&self, project_id: &str) -> Result<ProjectData>;

    async fn list_keys(
        &self,
        project_id: &str,
        page: PageRequest,
        include_translations: bool,
    ) -> Result<Page<KeyData>>;

    async fn create_keys(
        &self,
        project_id: &str,
        request: &CreateKeysRequest,
    ) -> Result<CreateKeysResponse>;

    async fn update_keys(
        &self,
        project_id: &str,
        request: &UpdateKeysRequest,
    ) -> Result<UpdateKeysResponse>;

    async fn delete_keys(&self, project_id: &str, key_ids: &[u64]) -> Result<DeleteKeysResponse>;

    async fn list_translations(
        &self,
        project_id: &str,
        page: PageRequest,
        filter_key_id: Option<u64>,
    ) -> Result<Page<TranslationData>>;

    async fn update_translation(
        &self,
        project_id: &str,
        translation_id: u64,
        request: &UpdateTranslationRequest,
    ) -> Result<TranslationResponse>;
}
