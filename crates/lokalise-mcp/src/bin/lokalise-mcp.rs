use std::{
    io::{self, IsTerminal, Read},
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
    process,
};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use lokalise_mcp::{
    Layout, LocalizationService, Settings,
    command::parse_command,
    mcp::{self, LokaliseMcpService, ToolAuditLog, render_projects, render_search},
    resolve_root,
    search::SearchCriteria,
    web::http::{self, HttpState},
};
use tokio::signal;
use tracing::{debug, info, warn};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "lokalise-mcp",
    version,
    about = "Manage Lokalise keys and translations from a tool-calling client, HTTP or the shell"
)]
struct Cli {
    /// Config file (defaults to LOKALISE_MCP_CONFIG, then <root>/config.toml).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Override the root directory (defaults to LOKALISE_MCP_ROOT or ~/.lokalise-mcp).
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the tools over stdin/stdout (default).
    Serve,
    /// Serve the HTTP API.
    Http(HttpArgs),
    /// Add a key described in plain language, e.g.
    /// `my project name is "Watt". add a key named hello and default value is "Hi"`.
    Add {
        /// The command; read from stdin when omitted.
        command: Option<String>,
    },
    /// Print what would be extracted from a plain-language command.
    Parse {
        /// The command; read from stdin when omitted.
        command: Option<String>,
    },
    /// List projects, optionally filtered by name or description.
    Projects {
        term: Option<String>,
    },
    /// Verify that the configured credential is accepted.
    Check,
    /// Show one project by id as JSON.
    Project {
        project_id: String,
    },
    /// Search keys in a project.
    Search(SearchArgs),
}

#[derive(Args, Debug)]
struct HttpArgs {
    /// Port to listen on (defaults to PORT, the config file, then 3000).
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct SearchArgs {
    #[arg(long, value_name = "NAME")]
    project: String,
    /// Substring of the key name, case-insensitive.
    #[arg(long)]
    pattern: Option<String>,
    /// Exact key name.
    #[arg(long)]
    exact: Option<String>,
    /// Required tag; repeatable.
    #[arg(long = "tag", value_name = "TAG")]
    tags: Vec<String>,
    /// Required platform; repeatable.
    #[arg(long = "platform", value_name = "PLATFORM")]
    platforms: Vec<String>,
    /// translated, untranslated, fuzzy, reviewed or any.
    #[arg(long)]
    status: Option<String>,
    /// Language the status applies to; repeatable.
    #[arg(long = "language", value_name = "ISO")]
    languages: Vec<String>,
    #[arg(long)]
    limit: Option<i64>,
}

impl SearchArgs {
    fn criteria(&self) -> SearchCriteria {
        let list = |values: &Vec<String>| (!values.is_empty()).then(|| values.clone());
        SearchCriteria {
            key_name_pattern: self.pattern.clone(),
            key_name_exact: self.exact.clone(),
            tags: list(&self.tags),
            platforms: list(&self.platforms),
            translation_status: self.status.clone(),
            languages: list(&self.languages),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let layout = Layout::new(resolve_root(cli.root.clone())?);
    let settings = Settings::load(cli.config.as_deref(), &layout)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let _guard = init_tracing(&layout, "warn")?;
            run_stdio(&layout, &settings).await
        }
        Command::Http(args) => {
            let _guard = init_tracing(&layout, "info")?;
            run_http(settings, args).await
        }
        Command::Add { command } => {
            let _guard = init_tracing(&layout, "warn")?;
            let (project_name, key) = parse_command(&command_text(command)?).into_new_key()?;
            let service = LocalizationService::from_settings(&settings)?;
            let result = service.add_keys(&project_name, std::slice::from_ref(&key)).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Command::Parse { command } => {
            let parsed = parse_command(&command_text(command)?);
            println!("{}", serde_json::to_string_pretty(&parsed)?);
            Ok(())
        }
        Command::Projects { term } => {
            let _guard = init_tracing(&layout, "warn")?;
            let service = LocalizationService::from_settings(&settings)?;
            let term = term.as_deref().map(str::trim).filter(|t| !t.is_empty());
            let projects = service.search_projects(term).await?;
            println!("{}", render_projects(&projects, term));
            Ok(())
        }
        Command::Check => {
            let _guard = init_tracing(&layout, "warn")?;
            let service = LocalizationService::from_settings(&settings)?;
            service.check_connection().await?;
            println!("Connection to the lokalise API is working.");
            Ok(())
        }
        Command::Project { project_id } => {
            let _guard = init_tracing(&layout, "warn")?;
            let service = LocalizationService::from_settings(&settings)?;
            let project = service.project(&project_id).await?;
            println!("{}", serde_json::to_string_pretty(&project)?);
            Ok(())
        }
        Command::Search(args) => {
            let _guard = init_tracing(&layout, "warn")?;
            let service = LocalizationService::from_settings(&settings)?;
            let response = service.search_keys(&args.project, &args.criteria(), args.limit).await?;
            println!("{}", render_search(&response));
            Ok(())
        }
    }
}

async fn run_stdio(layout: &Layout, settings: &Settings) -> Result<()> {
    let service = match LocalizationService::from_settings(settings) {
        Ok(service) => Some(service),
        Err(err) => {
            warn!(error = %err, "starting without a Lokalise credential");
            None
        }
    };

    let mut server = LokaliseMcpService::new(service);
    match ToolAuditLog::open(layout.tool_log_path()).await {
        Ok(audit) => server = server.with_audit_log(audit),
        Err(err) => warn!(error = ?err, "tool audit log disabled"),
    }

    info!(api_key = %settings.masked_api_key(), base_url = %settings.base_url(), "starting stdio tool server");
    mcp::serve_stdio(server).await
}

async fn run_http(mut settings: Settings, args: HttpArgs) -> Result<()> {
    if let Some(port) = args.port {
        settings.set_http_port(port);
    }
    let service = match LocalizationService::from_settings(&settings) {
        Ok(service) => Some(service),
        Err(err) => {
            warn!(error = %err, "mutating endpoints will fail until a credential is configured");
            None
        }
    };

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, settings.http_port()));
    let handle = http::spawn_http_server(HttpState::new(service), addr).await?;
    println!("lokalise-mcp HTTP API listening on http://{}", handle.addr());
    println!("  POST /add-key   add a single translation key");
    println!("  POST /add-keys  add multiple translation keys");
    println!("  GET  /health    health check");

    match signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, shutting down HTTP API"),
        Err(err) => warn!(error = ?err, "failed to listen for Ctrl+C"),
    }
    handle.shutdown();
    Ok(())
}

fn command_text(command: Option<String>) -> Result<String> {
    if let Some(command) = command {
        return Ok(command);
    }
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("no command given; pass it as an argument or pipe it on stdin");
    }
    let mut buffer = String::new();
    stdin.read_to_string(&mut buffer).context("failed to read command from stdin")?;
    Ok(buffer.trim().to_string())
}

/// Log to stderr, and to an hourly JSON file under `<root>/logs/` when the
/// directory can be created. Stdout is left to the tool protocol.
fn init_tracing(layout: &Layout, default_filter: &str) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("invalid log filter")?;

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(io::stderr);

    let log_dir = layout.logs_dir().join("lokalise-mcp");
    let (file_layer, guard) = match std::fs::create_dir_all(&log_dir) {
        Ok(()) => {
            let (writer, guard) =
                tracing_appender::non_blocking(rolling::hourly(&log_dir, "lokalise-mcp.log"));
            let layer = fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        Err(err) => {
            eprintln!("warning: file logging disabled ({}): {err}", log_dir.display());
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    debug!(root = %layout.root().display(), "resolved root directory");
    Ok(guard)
}
