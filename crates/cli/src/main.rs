// mainsite - content importers for the university main site
// Each subcommand fetches one remote source and converges the content store to it.

mod exit_codes;
mod import;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mainsite_config::{ConfigError, Settings};
use mainsite_recon::{SourceError, StoreError, SyncError};
use mainsite_source_client::FetchError;

use exit_codes::*;
use import::colleges::{cmd_colleges, CollegeCommands};
use import::degrees::{cmd_degrees, DegreeCommands};
use import::experts::{cmd_experts, ExpertCommands};
use import::research::{cmd_research, ResearchCommands};
use import::resources::{cmd_resources, ResourceCommands};
use import::thumbnails::{cmd_thumbnails, ThumbnailCommands};
use import::Context;

/// Log filter override, e.g. `MAINSITE_LOG=mainsite_recon=debug`.
const LOG_ENV: &str = "MAINSITE_LOG";

#[derive(Parser)]
#[command(name = "mainsite")]
#[command(about = "Import remote university records into the main site content store")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: $MAINSITE_CONFIG, then ~/.config/mainsite/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Content store snapshot (default: $MAINSITE_STORE, then [store] path)
    #[arg(long, global = true, value_name = "FILE")]
    store: Option<PathBuf>,

    /// Print the run stats as JSON
    #[arg(long, global = true)]
    json: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Degree programs from the search service and the catalog
    #[command(subcommand)]
    Degrees(DegreeCommands),

    /// Faculty profiles and publications from the research service
    #[command(subcommand)]
    Research(ResearchCommands),

    /// Media experts from the experts spreadsheet export
    #[command(subcommand)]
    Experts(ExpertCommands),

    /// Search-service ids for college terms
    #[command(subcommand)]
    Colleges(CollegeCommands),

    /// Person thumbnails from another site's export
    #[command(subcommand)]
    Thumbnails(ThumbnailCommands),

    /// Resource links from an A-Z index export
    #[command(subcommand)]
    Resources(ResourceCommands),
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nrecon:   mainsite-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = Settings::load(cli.config.as_deref())
        .map_err(CliError::from)
        .and_then(|settings| {
            let ctx = Context::new(settings, cli.store, cli.json);
            match cli.command {
                Commands::Degrees(cmd) => cmd_degrees(&ctx, cmd),
                Commands::Research(cmd) => cmd_research(&ctx, cmd),
                Commands::Experts(cmd) => cmd_experts(&ctx, cmd),
                Commands::Colleges(cmd) => cmd_colleges(&ctx, cmd),
                Commands::Thumbnails(cmd) => cmd_thumbnails(&ctx, cmd),
                Commands::Resources(cmd) => cmd_resources(&ctx, cmd),
            }
        });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Error mapping (see exit_codes.rs for the ranges)
// ============================================================================

impl From<FetchError> for CliError {
    fn from(err: FetchError) -> Self {
        let message = err.to_string();
        match err {
            FetchError::InvalidUrl { .. } => {
                Self::new(EXIT_CONFIG_VALUE, message).with_hint("service URLs must be absolute (https://...)")
            }
            FetchError::Connection { .. } | FetchError::Timeout { .. } => Self::new(EXIT_FETCH_NETWORK, message),
            FetchError::Http { .. } => Self::new(EXIT_FETCH_HTTP, message),
            FetchError::Parse { .. } | FetchError::MissingField { .. } | FetchError::Csv { .. } => {
                Self::new(EXIT_FETCH_PARSE, message)
            }
            FetchError::EmptyResult { .. } => {
                Self::new(EXIT_FETCH_EMPTY, message).with_hint("check the service URL and query parameters")
            }
            FetchError::EmptyPage { .. } | FetchError::PaginationStuck { .. } => Self::new(EXIT_FETCH_PROTOCOL, message),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        let code = match err {
            StoreError::Unavailable(_) => EXIT_STORE_UNAVAILABLE,
            StoreError::Io(_) => EXIT_STORE_IO,
            StoreError::Format(_) => EXIT_STORE_FORMAT,
            StoreError::NotFound(_) | StoreError::Rejected(_) => EXIT_STORE_REJECTED,
        };
        let hint = matches!(err, StoreError::Format(_)).then(|| "--store must point at a mainsite store snapshot");
        let cli = Self::new(code, err.to_string());
        match hint {
            Some(hint) => cli.with_hint(hint),
            None => cli,
        }
    }
}

impl From<SyncError> for CliError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Store(err) => err.into(),
            SyncError::Options(message) => Self::usage(format!("invalid run options: {message}")),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        let code = match err {
            ConfigError::NotFound(_) => EXIT_CONFIG_NOT_FOUND,
            ConfigError::Io { .. } | ConfigError::Parse { .. } => EXIT_CONFIG_INVALID,
            ConfigError::Missing { .. } => EXIT_CONFIG_VALUE,
        };
        Self { code, message: err.to_string(), hint: err.hint() }
    }
}

impl From<SourceError> for CliError {
    fn from(err: SourceError) -> Self {
        Self::new(EXIT_SOURCE_PARSE, err.to_string())
    }
}
