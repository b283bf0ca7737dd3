//! Research digest - command line entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use research_digest::export::{self, ExportFormat};
use research_digest::models::{DataSources, SearchMode};
use research_digest::{Config, DigestService, FetchRequest, Settings};

#[derive(Parser, Debug)]
#[command(name = "research-digest")]
#[command(about = "Fetch, score and rank new papers from arXiv, bioRxiv/medRxiv and PubMed")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and rank papers
    Fetch {
        /// Research settings JSON (defaults are used when omitted)
        #[arg(long, env = "RESEARCH_DIGEST_SETTINGS")]
        settings: Option<PathBuf>,

        /// Sources: comma separated (arxiv,biorxiv,pubmed) or "all"
        #[arg(long, default_value = "all")]
        sources: DataSources,

        /// Search mode: brief, standard or extended
        #[arg(long, default_value = "brief")]
        mode: SearchMode,

        /// Lookback window in days
        #[arg(long, default_value = "7")]
        days_back: u32,

        /// Console output format
        #[arg(long, value_enum, default_value = "markdown")]
        format: ConsoleFormat,

        /// Also export the result in this format
        #[arg(long)]
        export: Option<ExportFormat>,

        /// Export destination (stdout when omitted)
        #[arg(long, requires = "export")]
        output: Option<PathBuf>,
    },

    /// Print the effective, validated settings as JSON
    Settings {
        /// Research settings JSON (defaults are used when omitted)
        #[arg(long, env = "RESEARCH_DIGEST_SETTINGS")]
        settings: Option<PathBuf>,
    },
}

/// Formats printed to stdout; file formats go through `--export`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ConsoleFormat {
    Markdown,
    Json,
}

impl From<ConsoleFormat> for ExportFormat {
    fn from(format: ConsoleFormat) -> Self {
        match format {
            ConsoleFormat::Markdown => Self::Markdown,
            ConsoleFormat::Json => Self::Json,
        }
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    // stdout carries the digest itself
    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn load_settings(path: Option<&PathBuf>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(Settings::default().validated()?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    match cli.command {
        Command::Settings { settings } => {
            let settings = load_settings(settings.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Command::Fetch { settings, sources, mode, days_back, format, export, output } => {
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting research digest");

            let settings = load_settings(settings.as_ref())?;
            let config = Config::from_env()?;
            let service = DigestService::new(&config)?;

            let request = FetchRequest::from_settings(&settings, sources, mode, days_back);
            let result = match service.fetch(&request).await {
                Ok(result) => result,
                Err(err) => anyhow::bail!(err.to_user_message()),
            };

            println!("{}", export::render(&result, format.into()));

            if let Some(export_format) = export {
                let cached = service.export().await.map_err(|e| anyhow::anyhow!(e.to_user_message()))?;
                let rendered = export::render(&cached, export_format);
                match output {
                    Some(path) => {
                        std::fs::write(&path, rendered)
                            .with_context(|| format!("writing export to {}", path.display()))?;
                        tracing::info!(path = %path.display(), format = %export_format, "Export written");
                    }
                    None => println!("{rendered}"),
                }
            }
        }
    }

    Ok(())
}
