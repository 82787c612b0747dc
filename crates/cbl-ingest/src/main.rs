//! CBL Ingest - customer flat file loader

use anyhow::Result;
use cbl_common::logging::{init_logging, LogConfig, LogLevel};
use cbl_ingest::parser::NamePolicy;
use cbl_ingest::progress::LogReporter;
use cbl_ingest::runner::{run_import, ImportConfig};
use cbl_ingest::store::PgClientStore;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "cbl-ingest")]
#[command(author, version, about = "Load a pipe-delimited customer flat file into PostgreSQL")]
struct Cli {
    /// Path to the input file (one record per line, fields separated by '|')
    input: PathBuf,

    /// Records per bulk insert
    #[arg(short, long, default_value_t = 100)]
    batch_size: usize,

    /// Lines between progress reports (0 disables them)
    #[arg(long, default_value_t = 10_000)]
    progress_interval: u64,

    /// Reject full names that are not 2-4 words of letters and spaces
    #[arg(long)]
    strict_names: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    let mut log_config = LogConfig::from_env()
        .unwrap_or_default()
        .with_file_prefix("cbl-ingest");
    if cli.verbose {
        log_config = log_config.with_level(LogLevel::Debug);
    }
    // The loader must still work if logging cannot initialize, but the
    // operator should know why it went silent.
    if let Err(err) = init_logging(&log_config) {
        eprintln!("Warning: could not initialize logging: {}", err);
    }

    if let Err(err) = run(cli).await {
        error!(error = %err, "Import failed");
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let db_config = cbl_ingest::db::DbConfig::from_env()?;
    let pool = cbl_ingest::db::create_pool(&db_config).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let store = Arc::new(PgClientStore::new(pool));
    let config = ImportConfig {
        input_path: cli.input,
        batch_size: cli.batch_size,
        progress_interval: cli.progress_interval,
        name_policy: if cli.strict_names {
            NamePolicy::Strict
        } else {
            NamePolicy::Lenient
        },
    };

    let summary = run_import(&config, store, &LogReporter).await?;
    info!(
        total = summary.total_lines,
        valid = summary.valid,
        invalid = summary.invalid,
        "Import finished"
    );
    Ok(())
}
