use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use rmcp::model::JsonObject;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};

use crate::timestamps::now_rfc3339;

const EXCERPT_CHARS: usize = 500;

/// Append-only JSON-lines file shared by every tool call.
#[derive(Clone)]
pub struct ToolAuditLog {
    inner: Arc<Mutex<tokio::fs::File>>,
    path: PathBuf,
}

impl std::fmt::Debug for ToolAuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolAuditLog").field("path", &self.path).finish()
    }
}

impl ToolAuditLog {
    pub async fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to open tool log {}", path.display()))?;
        Ok(Self { inner: Arc::new(Mutex::new(file)), path })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub async fn request(&self, call_id: &str, tool: &str, arguments: Option<&JsonObject>) -> Result<()> {
        self.append(&AuditEntry {
            timestamp: now_rfc3339(),
            level: AuditLevel::Info,
            category: AuditCategory::Request,
            message: format!("tool call started: {tool}"),
            tool: tool.to_string(),
            call_id: call_id.to_string(),
            duration_ms: None,
            details: arguments.map(|args| Value::Object(redact(args.clone()))),
        })
        .await
    }

    /// Record the reply for a call. Only the first [`EXCERPT_CHARS`]
    /// characters of the text are kept, plus its full length.
    pub async fn response(
        &self,
        call_id: &str,
        tool: &str,
        duration: Duration,
        text: &str,
        failure: Option<&str>,
    ) -> Result<()> {
        let (level, category, verb) = if failure.is_some() {
            (AuditLevel::Error, AuditCategory::Error, "failed")
        } else {
            (AuditLevel::Info, AuditCategory::Response, "completed")
        };
        let mut details = json!({
            "excerpt": excerpt(text),
            "length": text.chars().count(),
        });
        if let Some(kind) = failure {
            details["kind"] = json!(kind);
        }
        self.append(&AuditEntry {
            timestamp: now_rfc3339(),
            level,
            category,
            message: format!("tool call {verb}: {tool}"),
            tool: tool.to_string(),
            call_id: call_id.to_string(),
            duration_ms: Some(duration.as_millis()),
            details: Some(details),
        })
        .await
    }

    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        let mut buffer = serde_json::to_vec(entry).context("failed to serialise audit entry")?;
        buffer.push(b'\n');
        let mut file = self.inner.lock().await;
        file.write_all(&buffer).await.context("failed to write audit entry")?;
        file.flush().await.context("failed to flush audit entry")?;
        Ok(())
    }
}

fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn redact(mut args: JsonObject) -> JsonObject {
    for key in ["apiKey", "api_key", "token"] {
        if args.contains_key(key) {
            args.insert(key.to_string(), Value::String("***".into()));
        }
    }
    args
}

#[derive(Copy, Clone, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum AuditLevel {
    Info,
    Error,
}

#[derive(Copy, Clone, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum AuditCategory {
    Request,
    Response,
    Error,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditEntry {
    timestamp: String,
    level: AuditLevel,
    category: AuditCategory,
    message: String,
    tool: String,
    call_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}
