//! CLI entry point for the tag ranking engine.
//!
//! Provides commands for inspecting collections, ranking a saved request
//! offline, and serving the HTTP API.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use tagrank::catalog::Catalog;
use tagrank::io::{ExitCode, UpdateTagsRequest, UpdateTagsResponse};
use tagrank::{RankError, Settings, TagRanker};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Interactive document re-ranking with online metric learning
#[derive(Parser)]
#[command(
    name = "tagrank",
    version = env!("CARGO_PKG_VERSION"),
    about = "Re-rank documents per tag from pairwise feedback",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    #[command(about = "Set up .tagrank directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    #[command(about = "Display active settings")]
    Config,

    #[command(about = "List collections under the models directory")]
    Collections,

    #[command(about = "List documents of a collection in natural order")]
    Documents {
        /// Collection name
        collection: String,
    },

    #[command(
        about = "Rank a saved update_tags request and print the response",
        after_help = "Request file format:\n  {\"constraints\": {\"tag\": [[0, 1, 1]]}, \"positiveDocs\": {\"tag\": [0]}}"
    )]
    Rank {
        /// Collection name
        collection: String,

        /// JSON request body
        request: PathBuf,

        /// Pretty-print the JSON response
        #[arg(long)]
        pretty: bool,
    },

    #[command(about = "Start the HTTP API server")]
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },
}

fn init_logging(debug: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn load_settings(config: Option<&Path>) -> Settings {
    match config {
        Some(path) => Settings::load_from(path).unwrap_or_else(|e| {
            eprintln!(
                "Configuration error loading from {}: {e}",
                path.display()
            );
            std::process::exit(ExitCode::ConfigError.into());
        }),
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            eprintln!("Using default configuration.");
            Settings::default()
        }),
    }
}

fn read_request(path: &Path) -> Result<UpdateTagsRequest, RankError> {
    let body = std::fs::read_to_string(path).map_err(|source| RankError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    UpdateTagsRequest::from_json(&body)
}

fn rank(
    settings: &Settings,
    collection: &str,
    request: &Path,
    pretty: bool,
) -> anyhow::Result<ExitCode> {
    let request = read_request(request)?;
    let ranker = TagRanker::from_settings(settings)?;
    let outcome = ranker.process(collection, request.into_batch())?;

    let response = UpdateTagsResponse::from(outcome);
    let exit_code = ExitCode::from_batch(response.errors.len());

    let json = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{json}");

    for (tag, error) in &response.errors {
        eprintln!("tag '{tag}' failed [{}]: {}", error.code, error.message);
    }
    Ok(exit_code)
}

async fn run(cli: Cli, settings: Settings) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Init { force } => {
            let cwd = std::env::current_dir().context("cannot determine current directory")?;
            let path = Settings::init_config_file(&cwd, force)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
        }

        Commands::Config => {
            println!("{}", toml::to_string_pretty(&settings)?);
        }

        Commands::Collections => {
            let catalog = Catalog::new(settings.resolved_models_dir());
            let collections = catalog.list_collections().map_err(RankError::from)?;
            if collections.is_empty() {
                eprintln!(
                    "No collections found in {}",
                    catalog.models_dir().display()
                );
                return Ok(ExitCode::NotFound);
            }
            for info in collections {
                println!("{}\t{} documents", info.name, info.params.num_documents);
            }
        }

        Commands::Documents { collection } => {
            let catalog = Catalog::new(settings.resolved_models_dir());
            for name in catalog
                .list_documents(&collection)
                .map_err(RankError::from)?
            {
                println!("{name}");
            }
        }

        Commands::Rank {
            collection,
            request,
            pretty,
        } => return rank(&settings, &collection, &request, pretty),

        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| settings.server.bind.clone());
            return serve(settings, bind).await;
        }
    }

    Ok(ExitCode::Success)
}

#[cfg(feature = "http-server")]
async fn serve(settings: Settings, bind: String) -> anyhow::Result<ExitCode> {
    tagrank::server::serve(settings, bind).await?;
    Ok(ExitCode::Success)
}

#[cfg(not(feature = "http-server"))]
async fn serve(_settings: Settings, _bind: String) -> anyhow::Result<ExitCode> {
    eprintln!("HTTP server support is not compiled in.");
    eprintln!("Rebuild with: cargo build --features http-server");
    Ok(ExitCode::ConfigError)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref());
    init_logging(cli.debug || settings.debug);

    let exit_code = match run(cli, settings).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            match e.downcast_ref::<RankError>() {
                Some(rank_error) => {
                    for suggestion in rank_error.recovery_suggestions() {
                        eprintln!("  - {suggestion}");
                    }
                    ExitCode::from_error(rank_error)
                }
                None => ExitCode::GeneralError,
            }
        }
    };

    if !exit_code.is_success() {
        tracing::debug!(
            "exiting with code {}: {}",
            i32::from(exit_code),
            exit_code.description()
        );
    }
    std::process::exit(exit_code.into());
}
