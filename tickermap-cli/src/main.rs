//! Tickermap CLI: reconcile the ticker map against the latest universe.
//!
//! Commands:
//! - `run`: full pass: onboarding, enrichment, persist, export
//! - `diff`: show new and blacklisted tickers without changing anything
//! - `duplicates`: list legacy tickers shared by several records

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tickermap_core::data::{
    ArtifactStore, AttributeLookup, CsvMappingBuilder, CsvMappingStore, EnvSecrets, EodhdClient,
    EodhdProvider, FileUniverseSource, HttpUniverseSource, LocalArtifactStore, LogNotifier,
    MappingStore, Notifier, ReferenceTable, SecretSource, SlackNotifier, UniverseSource,
};
use tickermap_core::reconcile::duplicate_message;
use tickermap_core::{diff_universe, duplicate_groups, Blacklist};
use tickermap_runner::{report_failure, run_pipeline, standard_stages, Collaborators, PipelineConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tickermap",
    about = "Reconcile the Numerai ticker map with the latest universe"
)]
struct Cli {
    /// Path to the pipeline TOML config.
    #[arg(long, global = true, default_value = "tickermap.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass.
    Run {
        /// Compute everything but persist and export nothing.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Show which universe tickers are new or blacklisted.
    Diff,
    /// List duplicate legacy tickers in the persisted map.
    Duplicates,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run { dry_run } => cmd_run(&cli.config, dry_run),
        Commands::Diff => cmd_diff(&cli.config),
        Commands::Duplicates => cmd_duplicates(&cli.config),
    };

    if let Err(e) = result {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

fn load_config(path: &Path) -> Result<PipelineConfig> {
    PipelineConfig::from_file(path).with_context(|| format!("loading {}", path.display()))
}

fn cmd_run(config_path: &Path, dry_run: bool) -> Result<()> {
    let mut config = load_config(config_path)?;
    config.dry_run |= dry_run;

    let secrets = EnvSecrets;
    let notifier = build_notifier(&config, &secrets);

    match execute(&config, &secrets, notifier.as_ref()) {
        Ok(()) => Ok(()),
        Err(e) => {
            report_failure(notifier.as_ref(), &config.alerts.channel, &*e);
            Err(e)
        }
    }
}

fn execute(
    config: &PipelineConfig,
    secrets: &dyn SecretSource,
    notifier: &dyn Notifier,
) -> Result<()> {
    let store = CsvMappingStore::new(&config.ticker_map_path);
    let universe = build_universe(config)?;
    let builder = CsvMappingBuilder::new(config.vendor.mapping_tables.clone());

    let country = config
        .vendor
        .country_table
        .as_deref()
        .map(|p| ReferenceTable::from_csv(p, "country"))
        .transpose()
        .context("loading country table")?;
    let polygon = config
        .vendor
        .polygon_table
        .as_deref()
        .map(|p| ReferenceTable::from_csv(p, "polygon_ticker"))
        .transpose()
        .context("loading polygon table")?;
    let eodhd = if config.vendor.eodhd {
        let token = secrets.get_secret_value(&config.secrets.eodhd_api_token)?;
        let client = match &config.vendor.eodhd_base_url {
            Some(url) => EodhdClient::with_base_url(token, url.as_str())?,
            None => EodhdClient::new(token)?,
        };
        Some(client)
    } else {
        None
    };
    let artifacts = config
        .export
        .as_ref()
        .map(|export| LocalArtifactStore::new(&export.root));

    let stages = standard_stages(
        country.as_ref().map(|t| t as &dyn AttributeLookup),
        polygon.as_ref().map(|t| t as &dyn AttributeLookup),
        eodhd.as_ref().map(|c| c as &dyn EodhdProvider),
    );
    tracing::info!(
        stages = ?stages.iter().map(|s| s.name).collect::<Vec<_>>(),
        dry_run = config.dry_run,
        "starting run"
    );

    let report = run_pipeline(
        config,
        Collaborators {
            store: &store,
            universe: universe.as_ref(),
            mapping_builder: &builder,
            notifier,
            stages,
            artifacts: artifacts.as_ref().map(|a| a as &dyn ArtifactStore),
        },
    )?;

    println!("{report}");
    if let Some(onboarding) = &report.onboarding {
        println!("  onboarded: {}", onboarding.inserted());
    }
    for stage in &report.stages {
        if stage.skipped() {
            println!("  {:<14} skipped", stage.name);
        } else {
            println!(
                "  {:<14} selected {:>5}, filled {:>5}",
                stage.name,
                stage.selected,
                stage.cells_filled()
            );
        }
    }
    Ok(())
}

fn cmd_diff(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let map = CsvMappingStore::new(&config.ticker_map_path).read_ticker_map()?;
    let snapshot = build_universe(&config)?.fetch_universe()?;
    let blacklist = Blacklist::from_file(&config.blacklist_path)
        .with_context(|| format!("reading {}", config.blacklist_path.display()))?;

    let diff = diff_universe(&map.bloomberg_tickers(), &snapshot.keys(), &blacklist);

    println!(
        "universe {} | known {} | eligible {} | new {} | blacklisted {}",
        snapshot.keys().len(),
        map.len(),
        diff.eligible.len(),
        diff.new.len(),
        diff.blacklisted.len()
    );
    for ticker in &diff.new {
        println!("+ {ticker}");
    }
    for ticker in &diff.blacklisted {
        println!("x {ticker}");
    }
    Ok(())
}

fn cmd_duplicates(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let map = CsvMappingStore::new(&config.ticker_map_path).read_ticker_map()?;
    let groups = duplicate_groups(&map);
    if groups.is_empty() {
        println!("No duplicate legacy tickers in {} records.", map.len());
    } else {
        println!("{}", duplicate_message(&groups));
    }
    Ok(())
}

fn build_universe(config: &PipelineConfig) -> Result<Box<dyn UniverseSource>> {
    let source: Box<dyn UniverseSource> = match &config.universe_path {
        Some(path) => Box::new(FileUniverseSource::new(path)),
        None => Box::new(HttpUniverseSource::new(config.universe_url.as_str())?),
    };
    Ok(source)
}

/// Slack when a token is available, otherwise log-only. Dry runs never post.
fn build_notifier(config: &PipelineConfig, secrets: &dyn SecretSource) -> Box<dyn Notifier> {
    if config.dry_run {
        return Box::new(LogNotifier);
    }
    let token = match secrets.get_secret_value(&config.secrets.slack_token) {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!("{e}; alerts go to the log only");
            return Box::new(LogNotifier);
        }
    };
    match SlackNotifier::new(token) {
        Ok(slack) => Box::new(slack),
        Err(e) => {
            tracing::warn!(error = %e, "slack client unavailable; alerts go to the log only");
            Box::new(LogNotifier)
        }
    }
}
