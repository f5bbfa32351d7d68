//! Day-ahead CLI — download APG EXAA day-ahead prices and merge them into one CSV.
//!
//! Commands:
//! - `fetch` — download every configured year and write the merged CSV
//! - `ranges` — print each year's request window and URL without downloading

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use dayahead_core::data::{
    request_url, year_ranges, ApgProvider, DownloadProgress, HttpTransport, JoinStyle,
    SilentProgress, StdoutProgress,
};
use dayahead_core::{run, FetchConfig, HeaderStyle};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dayahead",
    version,
    about = "Download APG day-ahead prices year by year and merge them into one CSV"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every configured year and write the merged CSV.
    Fetch {
        #[command(flatten)]
        common: CommonArgs,

        /// Output file. Defaults to dayahead_prices_2023-2025.csv.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Keep the first response's header instead of the canonical one.
        #[arg(long, default_value_t = false)]
        keep_first_header: bool,

        /// Start each year's rows on a new line instead of appending verbatim.
        #[arg(long, default_value_t = false)]
        line_separated: bool,

        /// Print the run summary as JSON instead of progress lines.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print each year's request window and URL without downloading.
    Ranges {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// TOML config file. Flags given on the command line take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Years to download, comma-separated (e.g. 2023,2024,2025).
    #[arg(long, value_delimiter = ',')]
    years: Vec<i32>,
}

impl CommonArgs {
    fn load_config(&self) -> Result<FetchConfig> {
        let mut config = match &self.config {
            Some(path) => FetchConfig::from_file(path)?,
            None => FetchConfig::default(),
        };
        if !self.years.is_empty() {
            config.years = self.years.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            common,
            output,
            keep_first_header,
            line_separated,
            json,
        } => {
            let mut config = common.load_config()?;
            if let Some(output) = output {
                config.output = output;
            }
            if keep_first_header {
                config.header_style = HeaderStyle::KeepFirst;
            }
            if line_separated {
                config.join_style = JoinStyle::LineSeparated;
            }
            config.validate()?;
            run_fetch(&config, json)
        }
        Commands::Ranges { common } => {
            let config = common.load_config()?;
            config.validate()?;
            run_ranges(&config, today())
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dayahead_core=info,dayahead_cli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn run_fetch(config: &FetchConfig, json: bool) -> Result<()> {
    let transport = HttpTransport::new(config.connect_timeout(), config.read_timeout())
        .context("build HTTP client")?;
    let provider = ApgProvider::new(transport, &config.endpoint, config.retry_policy());
    let progress: &dyn DownloadProgress = if json { &SilentProgress } else { &StdoutProgress };

    info!(years = ?config.years, output = %config.output.display(), "fetch started");

    match run(config, &provider, today(), progress) {
        Ok(summary) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "fetch failed, no output written");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn run_ranges(config: &FetchConfig, today: NaiveDate) -> Result<()> {
    let ranges = year_ranges(&config.years, today)?;
    println!("{:<6} {:<12} {:<12} URL", "Year", "Start", "End");
    println!("{}", "-".repeat(80));
    for range in &ranges {
        println!(
            "{:<6} {:<12} {:<12} {}",
            range.year,
            range.start,
            range.end,
            request_url(&config.endpoint, range)
        );
    }
    Ok(())
}
