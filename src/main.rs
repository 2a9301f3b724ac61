//! CLI entry point for the train delay explorer.
//!
//! Loads the configured delay exports once, then answers one query: the
//! values of a dimension, the mean-delay series for a selection, every series
//! of a dimension, or a per-resource summary.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use train_delays::{
    Dimension, Loader, UnifiedCollection,
    analyzers::{aggregate, aggregate_all, distinct_field_values, distinct_values},
    config::SourceConfig,
    fetch::source_for,
    output::{print_pretty, render_table, to_json, write_csv, write_csv_to, write_json},
};

#[derive(Parser)]
#[command(name = "train_delays")]
#[command(about = "Mean train delays by locality and by cause", long_about = None)]
struct Cli {
    /// JSON source configuration (defaults to the built-in export list)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Directory or URL the resources are read from (overrides the config)
    #[arg(short, long, global = true)]
    base: Option<String>,

    /// Continue with the resources that loaded when some cannot be fetched
    #[arg(long, global = true, default_value_t = false)]
    partial: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the distinct values of a dimension (`locality` or `cause`)
    Values {
        #[arg(value_name = "DIMENSION")]
        dimension: Dimension,
    },
    /// List the distinct values of any raw column
    ColumnValues {
        #[arg(value_name = "COLUMN")]
        column: String,
    },
    /// Mean delay per group for one selected locality or cause
    Aggregate {
        #[arg(value_name = "DIMENSION")]
        dimension: Dimension,

        /// The locality or cause to select
        #[arg(value_name = "SELECTOR")]
        selector: String,

        #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
        format: Format,

        /// File to write json or csv output to (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Every series of a dimension, one per distinct value, as JSON
    Report {
        #[arg(value_name = "DIMENSION")]
        dimension: Dimension,

        /// File to write the report to (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Record counts per resource
    Summary,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/train_delays.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("train_delays.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let collection = load(&cli).await?;

    match cli.command {
        Commands::Values { dimension } => {
            for value in distinct_values(&collection, dimension) {
                println!("{value}");
            }
        }
        Commands::ColumnValues { column } => {
            let column = column.trim().to_lowercase();
            for value in distinct_field_values(&collection, &column) {
                println!("{value}");
            }
        }
        Commands::Aggregate {
            dimension,
            selector,
            format,
            output,
        } => {
            let series = aggregate(&collection, dimension, &selector);
            if series.is_empty() {
                warn!(%dimension, selector = %selector, "No record matches the selection");
            }

            match format {
                Format::Pretty => {
                    print_pretty(&series);
                    print!("{}", render_table(&series));
                }
                Format::Json => match output {
                    Some(path) => write_json(&path, std::slice::from_ref(&series))?,
                    None => println!("{}", to_json(std::slice::from_ref(&series))?),
                },
                Format::Csv => match output {
                    Some(path) => {
                        write_csv(&path, std::slice::from_ref(&series))?;
                        info!(path = %path, "Series written");
                    }
                    None => {
                        write_csv_to(std::io::stdout().lock(), std::slice::from_ref(&series))?;
                    }
                },
            }
        }
        Commands::Report { dimension, output } => {
            let all = aggregate_all(&collection, dimension);
            info!(%dimension, series = all.len(), "Report computed");
            match output {
                Some(path) => write_json(&path, &all)?,
                None => println!("{}", to_json(&all)?),
            }
        }
        Commands::Summary => {
            for segment in collection.segments() {
                let usable = collection.records()[segment.range.clone()]
                    .iter()
                    .filter(|r| r.is_aggregatable())
                    .count();
                println!("{:<50} {:>7} {:>7}", segment.identifier, segment.len(), usable);
            }
            info!(
                resources = collection.segments().len(),
                records = collection.len(),
                usable = collection.iter().filter(|r| r.is_aggregatable()).count(),
                "Dataset summary"
            );
        }
    }

    Ok(())
}

/// Reads the configuration and loads every resource it lists.
#[tracing::instrument(skip_all, fields(partial = cli.partial))]
async fn load(cli: &Cli) -> Result<UnifiedCollection> {
    let config = match &cli.config {
        Some(path) => SourceConfig::load(path)?,
        None => SourceConfig::builtin(),
    }
    .with_env_overrides();

    let base = cli.base.clone().unwrap_or_else(|| config.base.clone());
    let resources = config.raw_resources()?;
    info!(base = %base, resources = resources.len(), "Loading delay exports");

    let loader = Loader::new(source_for(&base))
        .with_columns(config.columns.clone())
        .with_concurrency(config.concurrency);

    if cli.partial {
        let partial = loader.load_partial(&resources).await;
        for failure in &partial.failures {
            warn!(identifier = %failure.identifier, reason = %failure.reason, "Skipping resource");
        }
        return Ok(partial.collection);
    }

    match loader.load_all(&resources).await {
        Ok(collection) => Ok(collection),
        Err(e) => {
            for failure in e.failures() {
                error!(identifier = %failure.identifier, reason = %failure.reason, "Resource unavailable");
            }
            Err(e.into())
        }
    }
}
