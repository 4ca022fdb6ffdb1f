use std::time::Instant;

use anyhow::Result;
use rmcp::{
    ErrorData as McpError,
    model::{
        CallToolRequest, CallToolRequestParam, CallToolResult, ClientRequest,
        CompleteRequestMethod, Content, GetPromptRequestMethod, Implementation, InitializeResult,
        JsonObject, ListPromptsRequestMethod, ListResourceTemplatesRequestMethod,
        ListResourcesRequestMethod, ListToolsResult, ProtocolVersion, ReadResourceRequestMethod,
        ServerCapabilities, ServerResult, SetLevelRequestMethod, SubscribeRequestMethod,
        UnsubscribeRequestMethod,
    },
    service::{NotificationContext, RequestContext, RoleServer, Service},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    audit::ToolAuditLog,
    tools::{
        self, AddKeysArgs, DeleteKeysArgs, SearchKeysArgs, SearchProjectsArgs, TranslationsArgs,
        UpdateKeysArgs,
    },
};
use crate::{
    CoreError,
    api::ProjectData,
    service::{LocalizationService, SearchResponse},
};

pub const MISSING_API_KEY_TEXT: &str = "Error: LOKALISE_API_KEY environment variable is required.";
const MISSING_KEYS_TEXT: &str = "Error: projectName and at least one key are required.";
const MISSING_TRANSLATIONS_TEXT: &str =
    "Error: projectName and at least one translation item are required.";
const MISSING_CRITERIA_TEXT: &str = "Error: projectName and search criteria are required.";

/// Tool server over the localization operations.
///
/// Without a configured credential the server still starts and lists its
/// tools, but every call answers with an error text.
#[derive(Clone)]
pub struct LokaliseMcpService {
    service: Option<LocalizationService>,
    audit: Option<ToolAuditLog>,
}

impl LokaliseMcpService {
    pub fn new(service: Option<LocalizationService>) -> Self {
        Self { service, audit: None }
    }

    pub fn with_audit_log(mut self, audit: ToolAuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    fn server_info(&self) -> InitializeResult {
        let instructions = if self.service.is_some() {
            "Lokalise key management: add, update, delete and search translation keys, \
             manage en/de translations and list projects."
        } else {
            "Lokalise key management. LOKALISE_API_KEY is not configured; tool calls will fail."
        };

        InitializeResult {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "lokalise-mcp".to_string(),
                title: Some("Lokalise MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(instructions.to_string()),
        }
    }

    /// Run one tool call to its reply text. Never fails.
    pub async fn call_text(&self, name: &str, arguments: Option<JsonObject>) -> String {
        let call_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        if let Some(audit) = &self.audit {
            if let Err(err) = audit.request(&call_id, name, arguments.as_ref()).await {
                warn!(error = ?err, "failed to write tool audit entry");
            }
        }

        let (text, failure) = match &self.service {
            None => (MISSING_API_KEY_TEXT.to_string(), Some("precondition")),
            Some(service) => match dispatch(service, name, arguments.unwrap_or_default()).await {
                // Argument and unknown-tool problems come back as ready-made error texts.
                Ok(text) => {
                    let failure = text.starts_with("Error:").then_some("precondition");
                    (text, failure)
                }
                Err(err) => (format!("Error: {err:#}"), Some(failure_kind(&err))),
            },
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match failure {
            Some(kind @ ("precondition" | "not_found")) => {
                info!(tool = name, call_id = %call_id, kind, "tool call rejected");
            }
            Some(kind) => warn!(tool = name, call_id = %call_id, kind, "tool call failed"),
            None => info!(tool = name, call_id = %call_id, elapsed_ms, "tool call completed"),
        }
        if let Some(audit) = &self.audit {
            if let Err(err) = audit.response(&call_id, name, started.elapsed(), &text, failure).await {
                warn!(error = ?err, "failed to write tool audit entry");
            }
        }
        text
    }

    async fn call_tool(&self, params: CallToolRequestParam) -> Result<ServerResult, McpError> {
        debug!(tool = %params.name, "tool call received");
        let text = self.call_text(&params.name, params.arguments).await;
        Ok(ServerResult::CallToolResult(CallToolResult::success(vec![Content::text(text)])))
    }
}

fn failure_kind(err: &anyhow::Error) -> &'static str {
    match err.downcast_ref::<CoreError>() {
        Some(core) => core.kind(),
        None => "internal",
    }
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: JsonObject) -> Result<T> {
    serde_json::from_value(serde_json::Value::Object(arguments))
        .map_err(|err| anyhow::anyhow!("invalid arguments for {tool}: {err}"))
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn present(name: &Option<String>) -> Option<&str> {
    name.as_deref().filter(|v| !v.trim().is_empty())
}

async fn dispatch(service: &LocalizationService, name: &str, arguments: JsonObject) -> Result<String> {
    match name {
        tools::ADD_KEYS => {
            let args: AddKeysArgs = parse_args(name, arguments)?;
            let (Some(project), Some(keys)) = (present(&args.project_name), args.keys.as_ref())
            else {
                return Ok(MISSING_KEYS_TEXT.to_string());
            };
            if keys.is_empty() {
                return Ok(MISSING_KEYS_TEXT.to_string());
            }
            let result = service.add_keys(project, keys).await?;
            Ok(format!(
                "Successfully added {} key(s) to project \"{project}\". Result: {}",
                keys.len(),
                pretty(&result)
            ))
        }
        tools::UPDATE_KEYS => {
            let args: UpdateKeysArgs = parse_args(name, arguments)?;
            let (Some(project), Some(keys)) = (present(&args.project_name), args.keys.as_ref())
            else {
                return Ok(MISSING_KEYS_TEXT.to_string());
            };
            if keys.is_empty() {
                return Ok(MISSING_KEYS_TEXT.to_string());
            }
            let result = service.update_keys(project, keys).await?;
            Ok(format!(
                "Successfully updated {} key(s) in project \"{project}\". Result: {}",
                keys.len(),
                pretty(&result)
            ))
        }
        tools::DELETE_KEYS => {
            let args: DeleteKeysArgs = parse_args(name, arguments)?;
            let (Some(project), Some(keys)) = (present(&args.project_name), args.keys.as_ref())
            else {
                return Ok(MISSING_KEYS_TEXT.to_string());
            };
            if keys.is_empty() {
                return Ok(MISSING_KEYS_TEXT.to_string());
            }
            let result = service.delete_keys(project, keys).await?;
            Ok(format!(
                "Successfully deleted {} key(s) from project \"{project}\". Keys removed: {}. Result: {}",
                keys.len(),
                result.keys_removed,
                pretty(&result)
            ))
        }
        tools::MANAGE_TRANSLATIONS => {
            let args: TranslationsArgs = parse_args(name, arguments)?;
            let (Some(project), Some(items)) =
                (present(&args.project_name), args.translations.as_ref())
            else {
                return Ok(MISSING_TRANSLATIONS_TEXT.to_string());
            };
            if items.is_empty() {
                return Ok(MISSING_TRANSLATIONS_TEXT.to_string());
            }
            let result = service.manage_translations(project, items).await?;
            Ok(format!(
                "Successfully managed translations for {} key(s) in project \"{project}\". Processed {} translation(s). Result: {}",
                items.len(),
                result.summary.translations_processed,
                pretty(&result)
            ))
        }
        tools::SEARCH_KEYS => {
            let args: SearchKeysArgs = parse_args(name, arguments)?;
            let (Some(project), Some(criteria)) =
                (present(&args.project_name), args.criteria.as_ref())
            else {
                return Ok(MISSING_CRITERIA_TEXT.to_string());
            };
            let limit = args.limit.map(|limit| limit.floor() as i64);
            let response = service.search_keys(project, criteria, limit).await?;
            Ok(render_search(&response))
        }
        tools::SEARCH_PROJECTS => {
            let args: SearchProjectsArgs = parse_args(name, arguments)?;
            let term = present(&args.search_term);
            let projects = service.search_projects(term).await?;
            Ok(render_projects(&projects, term))
        }
        other => Err(anyhow::anyhow!("Unknown tool: {other}")),
    }
}

/// Human-readable search summary.
pub fn render_search(response: &SearchResponse) -> String {
    let blocks: Vec<String> = response
        .results
        .iter()
        .map(|key| {
            let translations = key
                .translations
                .iter()
                .map(|t| {
                    let mut line = format!("{}: \"{}\"", t.language_iso, t.translation);
                    if t.is_reviewed {
                        line.push_str(" (reviewed)");
                    }
                    if t.is_fuzzy {
                        line.push_str(" (fuzzy)");
                    }
                    line
                })
                .collect::<Vec<_>>()
                .join(", ");
            let tags = if key.tags.is_empty() { "none".to_string() } else { key.tags.join(", ") };
            format!(
                "Key: {}\nDescription: {}\nTags: [{}]\nPlatforms: [{}]\nTranslations: {}\nMatch reasons: {}\nCreated: {}",
                key.key_name.display_name(),
                key.description.as_deref().filter(|d| !d.is_empty()).unwrap_or("No description"),
                tags,
                key.platforms.join(", "),
                if translations.is_empty() { "none" } else { translations.as_str() },
                key.match_reasons.join(", "),
                key.created_at,
            )
        })
        .collect();

    format!(
        "Search Results for \"{}\"\nFound {} key(s) matching criteria\nCriteria used: {}\n\n{}",
        response.project_name,
        response.total_found,
        pretty(&response.criteria_used),
        blocks.join("\n\n")
    )
}

/// Human-readable project listing.
pub fn render_projects(projects: &[ProjectData], term: Option<&str>) -> String {
    let blocks: Vec<String> = projects
        .iter()
        .map(|project| {
            format!(
                "Project: {}\nDescription: {}\nID: {}\nCreated by: {}\nCreated: {}",
                project.name,
                project.description.as_deref().filter(|d| !d.is_empty()).unwrap_or("No description"),
                project.project_id,
                project.created_by_email,
                project.created_at,
            )
        })
        .collect();
    let filter = term.map(|t| format!(" (filtered by: \"{t}\")")).unwrap_or_default();
    format!(
        "Available Projects{filter}\nFound {} project(s)\n\n{}",
        projects.len(),
        blocks.join("\n\n")
    )
}

impl Service<RoleServer> for LokaliseMcpService {
    async fn handle_request(
        &self,
        request: <RoleServer as rmcp::service::ServiceRole>::PeerReq,
        _context: RequestContext<RoleServer>,
    ) -> Result<ServerResult, McpError> {
        match request {
            ClientRequest::InitializeRequest(_) => {
                Ok(ServerResult::InitializeResult(self.server_info()))
            }
            ClientRequest::PingRequest(_) => Ok(ServerResult::empty(())),
            ClientRequest::ListToolsRequest(_) => {
                Ok(ServerResult::ListToolsResult(ListToolsResult::with_all_items(tools::definitions())))
            }
            ClientRequest::CallToolRequest(CallToolRequest { params, .. }) => {
                self.call_tool(params).await
            }
            ClientRequest::CompleteRequest(_) => {
                Err(McpError::method_not_found::<CompleteRequestMethod>())
            }
            ClientRequest::SetLevelRequest(_) => {
                Err(McpError::method_not_found::<SetLevelRequestMethod>())
            }
            ClientRequest::GetPromptRequest(_) => {
                Err(McpError::method_not_found::<GetPromptRequestMethod>())
            }
            ClientRequest::ListPromptsRequest(_) => {
                Err(McpError::method_not_found::<ListPromptsRequestMethod>())
            }
            ClientRequest::ListResourcesRequest(_) => {
                Err(McpError::method_not_found::<ListResourcesRequestMethod>())
            }
            ClientRequest::ListResourceTemplatesRequest(_) => {
                Err(McpError::method_not_found::<ListResourceTemplatesRequestMethod>())
            }
            ClientRequest::ReadResourceRequest(_) => {
                Err(McpError::method_not_found::<ReadResourceRequestMethod>())
            }
            ClientRequest::SubscribeRequest(_) => {
                Err(McpError::method_not_found::<SubscribeRequestMethod>())
            }
            ClientRequest::UnsubscribeRequest(_) => {
                Err(McpError::method_not_found::<UnsubscribeRequestMethod>())
            }
        }
    }

    async fn handle_notification(
        &self,
        _notification: <RoleServer as rmcp::service::ServiceRole>::PeerNot,
        _context: NotificationContext<RoleServer>,
    ) -> Result<(), McpError> {
        Ok(())
    }

    fn get_info(&self) -> <RoleServer as rmcp::service::ServiceRole>::Info {
        self.server_info()
    }
}
