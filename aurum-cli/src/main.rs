//! Aurum CLI: run the gold multi-timeframe analysis and inspect reports.
//!
//! Commands:
//! - `analyze`: load data, run every analyzer, write the JSON report
//! - `show`: print a previously written report as Markdown or JSON

use std::path::PathBuf;

use anyhow::{Context, Result};
use aurum_core::data::{CsvProvider, DataProvider, YahooProvider};
use aurum_runner::{export_json, read_report, render_markdown, run, write_report, RunConfig};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "aurum",
    about = "Aurum: gold multi-timeframe indicators and signal fusion"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the analysis and write the report.
    Analyze {
        /// Path to a TOML config file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Report output path (overrides the config).
        #[arg(long)]
        output: Option<PathBuf>,

        /// Read `{symbol}_{timeframe}.csv` files from this directory instead of the network.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Offline mode: no network access.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Use synthetic data as fallback.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Evaluate the analyzers one after another.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Also print a Markdown summary to stdout.
        #[arg(long, default_value_t = false)]
        markdown: bool,
    },
    /// Print a previously written report.
    Show {
        /// Report path.
        #[arg(default_value = "data.json")]
        path: PathBuf,

        /// Print the raw JSON instead of Markdown.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            config,
            output,
            data_dir,
            offline,
            synthetic,
            sequential,
            markdown,
        } => {
            let mut run_config = match config {
                Some(path) => RunConfig::from_file(&path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => RunConfig::default(),
            };
            if let Some(output) = output {
                run_config.output = output;
            }
            if data_dir.is_some() {
                run_config.data_dir = data_dir;
            }
            run_config.offline |= offline;
            run_config.synthetic |= synthetic;
            run_config.parallel &= !sequential;

            run_analyze(&run_config, markdown)
        }
        Commands::Show { path, json } => run_show(path, json),
    }
}

/// Pick the data source: a CSV directory wins, then the network unless offline.
fn build_provider(config: &RunConfig) -> Result<Option<Box<dyn DataProvider>>> {
    if let Some(dir) = &config.data_dir {
        info!(dir = %dir.display(), "reading series from CSV directory");
        return Ok(Some(Box::new(CsvProvider::new(dir))));
    }
    if config.offline {
        warn!("offline without a data directory; only synthetic data is available");
        return Ok(None);
    }
    let provider = YahooProvider::new().context("building HTTP client")?;
    Ok(Some(Box::new(provider)))
}

fn run_analyze(config: &RunConfig, markdown: bool) -> Result<()> {
    let provider = build_provider(config)?;
    let report = run(config, provider.as_deref(), Utc::now()).context("analysis run failed")?;

    write_report(&report, &config.output)?;

    println!("Symbol:       {}", report.symbol);
    println!("Status:       {}", report.status);
    println!("Reason:       {}", report.reason);
    println!(
        "Composite:    short {:+} / long {:+}",
        report.composite_short, report.composite_long
    );
    println!("Price:        {:.2}", report.price);
    if report.synthetic {
        println!("Data:         SYNTHETIC");
    }
    println!("Report saved to: {}", config.output.display());

    if markdown {
        println!();
        print!("{}", render_markdown(&report));
    }
    Ok(())
}

fn run_show(path: PathBuf, json: bool) -> Result<()> {
    let report = read_report(&path)?;
    if json {
        println!("{}", export_json(&report)?);
    } else {
        print!("{}", render_markdown(&report));
    }
    Ok(())
}
