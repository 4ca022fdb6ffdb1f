use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Args, Parser, Subcommand};
use lokalise_mcp_client::{LokaliseMcpClient, SpawnConfig};
use serde_json::Value;
use tracing::subscriber;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(author, version, about = "Drive a lokalise-mcp tool server over stdio")]
struct Cli {
    /// Sets the log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(flatten)]
    server: ServerArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct ServerArgs {
    /// Server binary to spawn.
    #[arg(long = "cmd", default_value = "lokalise-mcp", global = true)]
    command: PathBuf,

    /// Arguments forwarded to the server (defaults to `serve`).
    #[arg(long = "arg", value_name = "ARG", action = ArgAction::Append, global = true)]
    args: Vec<String>,

    /// Environment variables in KEY=VALUE form.
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_val, global = true)]
    env: Vec<(String, String)>,
}

#[derive(Subcommand)]
enum Command {
    /// List the tools the server exposes.
    ListTools {
        /// Print tools as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Call one tool and print its text reply.
    CallTool {
        name: String,
        /// JSON object of arguments, or `@file.json`.
        #[arg(long = "args-json")]
        args_json: Option<String>,
    },
}

fn parse_key_val(input: &str) -> std::result::Result<(String, String), String> {
    let (key, value) =
        input.split_once('=').ok_or_else(|| format!("invalid KEY=VALUE pair: {input}"))?;
    if key.trim().is_empty() {
        return Err("environment key cannot be empty".into());
    }
    Ok((key.trim().to_string(), value.to_string()))
}

impl ServerArgs {
    fn into_config(self) -> Result<SpawnConfig> {
        let command = resolve_command(self.command)?;
        let args = if self.args.is_empty() { vec!["serve".to_string()] } else { self.args };
        let mut config = SpawnConfig::new(command).with_args(args);
        for (key, value) in self.env {
            config = config.with_env(key, value);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let client = LokaliseMcpClient::spawn(cli.server.into_config()?).await?;
    if let Some(info) = client.initialize_result() {
        eprintln!("connected: {} v{}", info.server_info.name, info.server_info.version);
    }

    match cli.command {
        Command::ListTools { json } => {
            let tools = client.list_all_tools().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tools)?);
            } else {
                println!("Tools ({}):", tools.len());
                for tool in tools {
                    let description = tool.description.as_deref().map(str::trim).unwrap_or("");
                    println!("  - {} :: {}", tool.name, description);
                }
            }
        }
        Command::CallTool { name, args_json } => {
            let arguments = match args_json {
                Some(raw) => parse_json_arg(&raw)?,
                None => Value::Null,
            };
            println!("{}", client.call_tool(&name, arguments).await?);
        }
    }

    client.shutdown().await
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    let _ = subscriber::set_global_default(subscriber);
}

fn parse_json_arg(raw: &str) -> Result<Value> {
    if let Some(path) = raw.strip_prefix('@') {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
        serde_json::from_str(&content).with_context(|| format!("invalid JSON in file {path}"))
    } else {
        serde_json::from_str(raw).context("invalid JSON argument")
    }
}

fn resolve_command(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() || path.exists() {
        return Ok(path);
    }
    if let Some(value) = std::env::var_os("CARGO_BIN_EXE_lokalise-mcp") {
        let candidate = PathBuf::from(value);
        if candidate.exists() {
            return Ok(candidate);
        }
    }
    if let Some(path_env) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&path_env) {
            let candidate = dir.join(&path);
            if candidate.exists() {
                return Ok(candidate);
            }
        }
    }
    Err(anyhow!("command '{}' not found in PATH; specify with --cmd", path.display()))
}
