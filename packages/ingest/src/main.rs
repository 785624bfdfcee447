#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the tree census ingestion tool.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tree_census_ingest::{DEFAULT_SNAPSHOT_PATH, fetch_to_snapshot, summarize};
use tree_census_source::{FetchOptions, SocrataSource, load_snapshot, socrata};

#[derive(Parser)]
#[command(name = "tree_census_ingest", about = "Tree census ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the census aggregate and save it as a snapshot
    Fetch {
        /// Maximum number of rows to fetch (for testing)
        #[arg(long)]
        limit: Option<u64>,
        /// Rows per request
        #[arg(long)]
        page_size: Option<u64>,
        /// Snapshot file to write
        #[arg(long, default_value = DEFAULT_SNAPSHOT_PATH)]
        output: PathBuf,
        /// Socrata resource URL (overrides `TREE_CENSUS_API_URL`)
        #[arg(long)]
        api_url: Option<String>,
    },
    /// Summarize a snapshot the way the dashboard would load it
    Summary {
        /// Snapshot file to read
        #[arg(long, default_value = DEFAULT_SNAPSHOT_PATH)]
        input: PathBuf,
        /// Number of species to list
        #[arg(long, default_value = "20")]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            limit,
            page_size,
            output,
            api_url,
        } => {
            let api_url = api_url
                .or_else(|| std::env::var("TREE_CENSUS_API_URL").ok())
                .unwrap_or_else(|| socrata::TREE_CENSUS_API_URL.to_string());
            let source = SocrataSource::new(api_url);
            let options = FetchOptions {
                limit,
                page_size,
                app_token: std::env::var("SOCRATA_APP_TOKEN").ok(),
            };

            let start = Instant::now();
            let rows = fetch_to_snapshot(&source, &options, &output).await?;
            let elapsed = start.elapsed();
            log::info!(
                "Saved {rows} rows to {} in {:.1}s",
                output.display(),
                elapsed.as_secs_f64()
            );
        }
        Commands::Summary { input, top } => {
            let records = load_snapshot(&input)?;
            let summary = summarize(&records, top)?;
            print!("{summary}");
        }
    }

    Ok(())
}
