mod config;
mod outline;

use clap::{Parser, Subcommand};
use config::{CliConfig, ConfigError, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use panelpop::content;
use panelpop::protocol::Panel;
use panelpop::{DecodeError, InitError, PanelSession, SessionState};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "panelpop-cli", version, about = "Fetch and inspect PanelPop panels")]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Fetch a panel by token and print it
    Fetch {
        token: String,
        /// Print the raw panel JSON instead of an outline
        #[arg(long)]
        json: bool,
    },
    /// Decode a content schema file offline
    Decode {
        file: PathBuf,
        /// The file holds a whole panel response rather than a bare schema
        #[arg(long)]
        panel: bool,
    },
    /// Show whether this installation is still active
    Status,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("this command requires --config")]
    MissingConfig,
    #[error(transparent)]
    Init(#[from] InitError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid panel document: {0}")]
    Panel(#[from] serde_json::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("panel has no variants")]
    NoVariants,
    #[error("no panel returned for {token} (state: {state:?})")]
    NoPanel { token: String, state: SessionState },
    #[error("could not set up metrics: {0}")]
    Metrics(String),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.config.as_deref().map(CliConfig::from_file).transpose()?;

    let _sentry = init_logging(config.as_ref().and_then(|c| c.logging.as_ref()));
    if let Some(metrics) = config.as_ref().and_then(|c| c.metrics.as_ref()) {
        init_metrics(metrics)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        CliCommand::Fetch { token, json } => {
            let config = config.ok_or(CliError::MissingConfig)?;
            runtime.block_on(fetch(config, &token, json))
        }
        CliCommand::Decode { file, panel } => decode(&file, panel),
        CliCommand::Status => {
            let config = config.ok_or(CliError::MissingConfig)?;
            runtime.block_on(status(config))
        }
    }
}

fn init_logging(logging: Option<&LoggingConfig>) -> Option<sentry::ClientInitGuard> {
    let guard = logging.map(|l| sentry::init((l.sentry_dsn.as_str(), sentry::ClientOptions::default())));
    let sentry_layer = guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_layer)
        .init();

    guard
}

fn init_metrics(config: &MetricsConfig) -> Result<(), CliError> {
    let recorder = StatsdBuilder::from(config.statsd_host.as_str(), config.statsd_port)
        .build(Some("panelpop"))
        .map_err(|e| CliError::Metrics(e.to_string()))?;
    metrics::set_global_recorder(recorder).map_err(|e| CliError::Metrics(e.to_string()))?;
    panelpop::metrics_defs::describe_all();

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "Sending metrics to statsd"
    );
    Ok(())
}

async fn fetch(config: CliConfig, token: &str, json: bool) -> Result<(), CliError> {
    let session = PanelSession::new(config.panelpop).await?;

    let Some(fetched) = session.get_panel(token).await else {
        return Err(CliError::NoPanel {
            token: token.to_string(),
            state: session.state(),
        });
    };

    if json {
        println!("{}", serde_json::to_string_pretty(fetched.panel())?);
    } else {
        print!("{}", outline::render_panel(fetched.panel(), fetched.content()));
    }
    Ok(())
}

fn decode(file: &Path, panel: bool) -> Result<(), CliError> {
    let raw = std::fs::read_to_string(file)?;

    if panel {
        let panel: Panel = serde_json::from_str(&raw)?;
        let variant = panel.primary_variant().ok_or(CliError::NoVariants)?;
        let document = content::decode(&variant.schema)?;
        print!("{}", outline::render_panel(&panel, &document));
    } else {
        let document = content::decode(&raw)?;
        print!("{}", outline::render_document(&document));
    }
    Ok(())
}

async fn status(config: CliConfig) -> Result<(), CliError> {
    let session = PanelSession::new(config.panelpop).await?;
    let config = session.config();

    println!("api_url: {}", config.api_url);
    println!("storage: {:?}", config.storage);
    println!("active: {}", session.is_active());
    println!("state: {:?}", session.state());
    Ok(())
}
