mod config;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use config::load_config;
use zodforge_engine::{EmitEngine, EmitOptions, FormatStyle, PassthroughFormatter};
use zodforge_ingest::{JsonFileSource, LoadOptions, Source, snapshot_json_schema};

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("load error: {0}")]
    Load(#[from] zodforge_ingest::LoadError),
    #[error("emit error: {0}")]
    Emit(#[from] zodforge_engine::EmitError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Parser, Debug)]
#[command(name = "zodforge", version, about = "Zodforge CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the validator document from a catalog snapshot.
    Generate(GenerateArgs),
    /// Print the JSON Schema for catalog snapshot files.
    Schema,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Path to the catalog snapshot JSON file.
    #[arg(long, value_name = "PATH")]
    snapshot: PathBuf,
    /// Output path for the generated document; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Schema treated as the primary emission target.
    #[arg(long, value_name = "SCHEMA")]
    default_schema: Option<String>,
    /// Schema name(s) to include.
    #[arg(long, value_name = "SCHEMA")]
    schema: Vec<String>,
    /// Optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Optional output path for the emission report.
    #[arg(long)]
    report: Option<PathBuf>,
    /// Fail on snapshot validation issues instead of warning.
    #[arg(long, default_value_t = false)]
    strict: bool,
    /// Include system schemas such as pg_catalog.
    #[arg(long, default_value_t = false)]
    include_system_schemas: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => run_generate(args).await,
        Command::Schema => run_schema(),
    }
}

async fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;

    let load_options = LoadOptions {
        strict: args.strict,
        include_system_schemas: args.include_system_schemas,
        schemas: if args.schema.is_empty() {
            None
        } else {
            Some(args.schema.clone())
        },
    };

    let source = JsonFileSource::new(&args.snapshot);
    tracing::info!(snapshot = %source.origin(), "loading snapshot");
    let snapshot = source.load(&load_options).await?;

    let emit_options = EmitOptions {
        default_schema: args.default_schema.or(config.emit.default_schema),
        style: FormatStyle {
            indent: config.style.indent.unwrap_or_else(|| FormatStyle::default().indent),
        },
    };

    let engine = EmitEngine::new(emit_options);
    let result = engine.run(&snapshot, &PassthroughFormatter).await?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, &result.document)?;
            tracing::info!(path = %path.display(), bytes = result.document.len(), "document written");
        }
        None => print!("{}", result.document),
    }

    if let Some(path) = &args.report {
        std::fs::write(path, serde_json::to_vec_pretty(&result.report)?)?;
        tracing::info!(path = %path.display(), "report written");
    }

    if result.report.degraded_count > 0 {
        tracing::warn!(
            degraded = result.report.degraded_count,
            "some fields degraded to permissive validators"
        );
    }

    Ok(())
}

fn run_schema() -> Result<(), CliError> {
    let schema = snapshot_json_schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
