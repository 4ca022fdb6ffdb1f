//! Tool-calling surface served over stdio.

mod audit;
mod server;
pub mod tools;

use anyhow::{Context, Result};
use rmcp::{ServiceExt, transport::stdio};
use tracing::info;

pub use audit::ToolAuditLog;
pub use server::{LokaliseMcpService, MISSING_API_KEY_TEXT, render_projects, render_search};

/// Serve `service` on stdin/stdout until the client disconnects.
pub async fn serve_stdio(service: LokaliseMcpService) -> Result<()> {
    let running = service.serve(stdio()).await.context("failed to start stdio tool server")?;
    info!("lokalise tool server ready on stdio");
    let reason = running.waiting().await.context("tool server task failed")?;
    info!(?reason, "lokalise tool server stopped");
    Ok(())
}
