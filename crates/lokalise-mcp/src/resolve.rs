//! Name to identifier resolution for projects and keys.
//!
//! Names are not unique on the remote side. Both resolvers walk pages in order
//! and return the first match; duplicates further down are never seen.

use anyhow::Result;
use tracing::debug;

use crate::api::{KeyData, LocalizationApi, Pager, ProjectData};

/// First project whose name equals `name`, ignoring case. Whitespace is
/// significant on both sides.
pub async fn find_project_by_name(
    api: &dyn LocalizationApi,
    name: &str,
) -> Result<Option<ProjectData>> {
    let wanted = name.to_lowercase();
    let mut pager = Pager::new();
    while let Some(request) = pager.next_request() {
        let page = api.list_projects(request).await?;
        if let Some(project) =
            page.items.iter().find(|project| project.name.to_lowercase() == wanted)
        {
            debug!(name, project_id = %project.project_id, page = request.page, "resolved project");
            return Ok(Some(project.clone()));
        }
        pager.advance(page.items.len(), page.page_count);
    }
    debug!(name, "project not found");
    Ok(None)
}

/// First key whose name (plain, or any per-platform value) equals `name`.
///
/// Keys are listed without translations.
pub async fn find_key_by_name(
    api: &dyn LocalizationApi,
    project_id: &str,
    name: &str,
) -> Result<Option<KeyData>> {
    let mut pager = Pager::new();
    while let Some(request) = pager.next_request() {
        let page = api.list_keys(project_id, request, false).await?;
        if let Some(key) = page.items.iter().find(|key| key.key_name.matches_exact(name)) {
            debug!(project_id, key = name, key_id = key.key_id, "resolved key");
            return Ok(Some(key.clone()));
        }
        pager.advance(page.items.len(), page.page_count);
    }
    debug!(project_id, key = name, "key not found");
    Ok(None)
}
