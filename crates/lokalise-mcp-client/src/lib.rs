//! Minimal stdio client for driving a `lokalise-mcp` tool server.

use std::{borrow::Cow, fmt, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use rmcp::{
    ErrorData as McpError, RoleClient,
    model::{
        CallToolRequestParam, CallToolResult, ClientResult, InitializeResult, JsonObject,
        RawContent, ServerRequest, Tool,
    },
    service::{NotificationContext, Peer, QuitReason, RequestContext, RunningService, Service, ServiceExt},
    transport::{ConfigureCommandExt, child_process::TokioChildProcess},
};
use serde_json::Value;
use tracing::{debug, warn};

/// How to spawn the tool server.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    /// Variables removed from the inherited environment.
    pub env_remove: Vec<String>,
}

impl SpawnConfig {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self { command: command.into(), args: Vec::new(), env: Vec::new(), env_remove: Vec::new() }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn without_env(mut self, key: impl Into<String>) -> Self {
        self.env_remove.push(key.into());
        self
    }
}

/// A connected tool-server child process.
pub struct LokaliseMcpClient {
    runtime: Option<RunningService<RoleClient, ClientHandler>>,
}

impl fmt::Debug for LokaliseMcpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LokaliseMcpClient").field("connected", &self.runtime.is_some()).finish()
    }
}

impl LokaliseMcpClient {
    /// Spawn the server and complete the initialize handshake.
    pub async fn spawn(config: SpawnConfig) -> Result<Self> {
        let mut command = tokio::process::Command::new(&config.command);
        command.args(&config.args);
        for key in &config.env_remove {
            command.env_remove(key);
        }
        command.envs(config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        command.kill_on_drop(true);

        let transport = TokioChildProcess::new(command.configure(|cmd| {
            cmd.stdin(std::process::Stdio::piped());
            cmd.stdout(std::process::Stdio::piped());
            cmd.stderr(std::process::Stdio::inherit());
        }))
        .with_context(|| format!("failed to spawn process {:?}", config.command))?;

        let runtime = ClientHandler
            .serve(transport)
            .await
            .context("failed to initialise tool client")?;
        Ok(Self { runtime: Some(runtime) })
    }

    fn peer(&self) -> Result<&Peer<RoleClient>> {
        self.runtime
            .as_ref()
            .map(|runtime| runtime.peer())
            .ok_or_else(|| anyhow!("client is shut down"))
    }

    pub fn initialize_result(&self) -> Option<InitializeResult> {
        self.runtime.as_ref().and_then(|runtime| runtime.peer().peer_info().cloned())
    }

    pub async fn list_all_tools(&self) -> Result<Vec<Tool>> {
        self.peer()?.list_all_tools().await.context("failed to list tools")
    }

    pub async fn call_tool_raw(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let arguments = json_to_object(arguments).context("invalid tool arguments")?;
        let params =
            CallToolRequestParam { name: Cow::Owned(name.to_string()), arguments: Some(arguments) };
        self.peer()?.call_tool(params).await.context("tool invocation failed")
    }

    /// Call a tool and join the text parts of its reply.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        let result = self.call_tool_raw(name, arguments).await?;
        Ok(result_text(&result))
    }

    pub async fn shutdown(mut self) -> Result<()> {
        let Some(runtime) = self.runtime.take() else {
            return Ok(());
        };
        match runtime.cancel().await {
            Ok(QuitReason::Cancelled) | Ok(QuitReason::Closed) => Ok(()),
            Ok(QuitReason::JoinError(err)) => Err(anyhow!(err)),
            Err(err) => Err(anyhow!(err)),
        }
    }
}

impl Drop for LokaliseMcpClient {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            debug!("dropping client; cancelling tool runtime");
            runtime.cancellation_token().cancel();
        }
    }
}

/// Text parts of a tool result, newline-joined.
pub fn result_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|content| match &content.raw {
            RawContent::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Clone, Copy)]
struct ClientHandler;

impl Service<RoleClient> for ClientHandler {
    async fn handle_request(
        &self,
        request: <RoleClient as rmcp::service::ServiceRole>::PeerReq,
        _context: RequestContext<RoleClient>,
    ) -> Result<ClientResult, McpError> {
        match request {
            ServerRequest::PingRequest(_) => Ok(ClientResult::empty(())),
            other => {
                warn!(request = ?other, "unsupported server request");
                Err(McpError::internal_error("unsupported server-initiated request", None))
            }
        }
    }

    async fn handle_notification(
        &self,
        notification: <RoleClient as rmcp::service::ServiceRole>::PeerNot,
        _context: NotificationContext<RoleClient>,
    ) -> Result<(), McpError> {
        debug!(?notification, "server notification");
        Ok(())
    }

    fn get_info(&self) -> <RoleClient as rmcp::service::ServiceRole>::Info {
        Default::default()
    }
}

fn json_to_object(value: Value) -> Result<JsonObject> {
    match value {
        Value::Null => Ok(JsonObject::new()),
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("tool arguments must be a JSON object, got {other}")),
    }
}
