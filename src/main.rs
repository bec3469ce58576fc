use anyhow::Context;
use api_client::BinanceClient;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use configuration::{Config, DaysBasis};
use core_types::{BAND_COUNT, GridPoint};
use database::{DbRepository, RiskRepository};
use engine::{DailyUpdater, RiskService, run_daily};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

mod status;

/// The main entry point for the riskband application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; DATABASE_URL may come from the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = configuration::load_config_from(&cli.config.to_string_lossy())
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let _guard = configuration::init_tracing(&config.logging)?;

    let db_pool = database::connect().await?;
    database::run_migrations(&db_pool).await?;
    let repo: Arc<dyn RiskRepository> = Arc::new(DbRepository::new(db_pool));
    let service = RiskService::new(repo.clone());

    match cli.command {
        Commands::ImportGrid(args) => handle_import_grid(args, &service).await,
        Commands::Seed(args) => handle_seed(args, &config, repo).await,
        Commands::Backfill(args) => handle_backfill(args, &config, repo).await,
        Commands::Update(args) => handle_update(args, &config, repo).await,
        Commands::Schedule => handle_schedule(&config, repo).await,
        Commands::Risk(args) => {
            let risk = service.risk_of(&args.symbol, args.price).await?;
            println!("{} @ {} -> risk {}", args.symbol, args.price, risk);
            Ok(())
        }
        Commands::Price(args) => {
            let price = service.price_of(&args.symbol, args.risk).await?;
            println!("{} @ risk {} -> price {}", args.symbol, args.risk, price);
            Ok(())
        }
        Commands::Score(args) => {
            let report = service.score_of(&args.symbol).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Status => {
            let rows = service.status().await?;
            println!("{}", status::render(&rows));
            Ok(())
        }
        Commands::Serve => {
            let addr: SocketAddr =
                format!("{}:{}", config.server.host, config.server.port).parse()?;
            web_server::run_server(addr, service).await
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Risk-band signal engine for crypto assets.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file. Missing is fine: defaults apply.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace a symbol's risk grid with the points in a JSON file.
    ImportGrid(ImportGridArgs),
    /// Replace a symbol's band day counts with externally computed ones.
    Seed(SeedArgs),
    /// Replay historical daily closes through the band tracker.
    Backfill(BackfillArgs),
    /// Run the daily update once.
    Update(UpdateArgs),
    /// Run the daily update every day at the configured time.
    Schedule,
    /// Convert a price to risk.
    Risk(RiskArgs),
    /// Convert a risk value to price.
    Price(PriceArgs),
    /// Show the current signal for a symbol.
    Score(SymbolArgs),
    /// Show every tracked symbol's bands and latest score.
    Status,
    /// Serve the read-only JSON query API.
    Serve,
}

#[derive(Parser)]
struct ImportGridArgs {
    #[arg(long)]
    symbol: String,

    /// JSON array of `{"price": ..., "risk": ...}` objects.
    #[arg(long)]
    file: PathBuf,
}

#[derive(Parser)]
struct SeedArgs {
    #[arg(long)]
    symbol: String,

    /// Ten comma-separated day counts, band 0 first.
    #[arg(long, value_delimiter = ',', num_args = BAND_COUNT)]
    counts: Vec<u32>,
}

#[derive(Parser)]
struct BackfillArgs {
    /// Symbols to backfill. Defaults to every configured asset.
    #[arg(long)]
    symbol: Vec<String>,

    /// First day to replay (YYYY-MM-DD). Defaults per `tracking.days_basis`.
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day to replay (YYYY-MM-DD). Defaults to yesterday.
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Overrides `tracking.days_basis` for the default start date.
    #[arg(long, value_enum)]
    days_basis: Option<DaysBasis>,
}

#[derive(Parser)]
struct UpdateArgs {
    /// The day to record (YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Parser)]
struct RiskArgs {
    #[arg(long)]
    symbol: String,
    #[arg(long)]
    price: Decimal,
}

#[derive(Parser)]
struct PriceArgs {
    #[arg(long)]
    symbol: String,
    #[arg(long)]
    risk: Decimal,
}

#[derive(Parser)]
struct SymbolArgs {
    #[arg(long)]
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct GridFileEntry {
    price: Decimal,
    risk: Decimal,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn updater(config: &Config, repo: Arc<dyn RiskRepository>) -> anyhow::Result<DailyUpdater> {
    let prices = Arc::new(BinanceClient::new(&config.price_source)?);
    Ok(DailyUpdater::new(repo, prices, config))
}

async fn handle_import_grid(args: ImportGridArgs, service: &RiskService) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let entries: Vec<GridFileEntry> = serde_json::from_str(&content)?;
    let points = entries
        .into_iter()
        .map(|e| GridPoint::new(args.symbol.as_str(), e.price, e.risk))
        .collect();

    let grid = service.import_grid(&args.symbol, points).await?;
    let (low, high) = grid.price_range();
    println!(
        "Imported {} points for {} (price {} .. {})",
        grid.points().len(),
        args.symbol,
        low,
        high
    );
    Ok(())
}

async fn handle_seed(
    args: SeedArgs,
    config: &Config,
    repo: Arc<dyn RiskRepository>,
) -> anyhow::Result<()> {
    let counts: [u32; BAND_COUNT] = args
        .counts
        .try_into()
        .map_err(|v: Vec<u32>| anyhow::anyhow!("expected {BAND_COUNT} counts, got {}", v.len()))?;

    let record = updater(config, repo)?
        .seed(&args.symbol, counts, Utc::now().date_naive())
        .await?;
    println!(
        "Seeded {}: {} days, coefficients {:?}",
        record.symbol, record.total_days, record.band_coefficients
    );
    Ok(())
}

/// Backfills each symbol in turn, one progress tick per symbol.
async fn handle_backfill(
    args: BackfillArgs,
    config: &Config,
    repo: Arc<dyn RiskRepository>,
) -> anyhow::Result<()> {
    let symbols = if args.symbol.is_empty() {
        config.tracking.assets.iter().map(|a| a.symbol.clone()).collect()
    } else {
        args.symbol
    };
    if symbols.is_empty() {
        anyhow::bail!("no symbols given and none configured under [tracking]");
    }

    let to = match args.to {
        Some(to) => to,
        None => Utc::now()
            .date_naive()
            .pred_opt()
            .context("no day before today")?,
    };
    let mut config = config.clone();
    if let Some(basis) = args.days_basis {
        config.tracking.days_basis = basis;
    }
    let updater = updater(&config, repo)?;

    let progress_bar = ProgressBar::new(symbols.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let mut failures = 0;
    for symbol in &symbols {
        progress_bar.set_message(format!("Backfilling {symbol}..."));
        match updater.backfill(symbol, args.from, to).await {
            Ok(summary) => progress_bar.println(format!(
                "{}: {} .. {}, {} counted, {} refreshed, {} failed windows",
                summary.symbol,
                summary.from,
                summary.to,
                summary.counted,
                summary.refreshed,
                summary.failed_windows
            )),
            Err(e) => {
                failures += 1;
                tracing::error!(symbol = %symbol, error = %e, "Backfill failed");
                progress_bar.println(format!("{symbol}: failed: {e}"));
            }
        }
        progress_bar.inc(1);
    }
    progress_bar.finish_with_message("Backfill complete!");

    if failures > 0 {
        anyhow::bail!("{failures} of {} backfills failed", symbols.len());
    }
    Ok(())
}

async fn handle_update(
    args: UpdateArgs,
    config: &Config,
    repo: Arc<dyn RiskRepository>,
) -> anyhow::Result<()> {
    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let summary = updater(config, repo)?.run(date).await?;

    println!(
        "Run {} for {}: {} counted, {} refreshed, {} scored",
        summary.run_id,
        summary.date,
        summary.counted.len(),
        summary.refreshed.len(),
        summary.scored.len()
    );
    for skipped in &summary.skipped {
        println!("  skipped {}: {}", skipped.symbol, skipped.reason);
    }
    Ok(())
}

async fn handle_schedule(config: &Config, repo: Arc<dyn RiskRepository>) -> anyhow::Result<()> {
    let updater = updater(config, repo)?;
    tokio::select! {
        _ = run_daily(&updater, config.schedule.run_at_utc) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Received Ctrl-C, stopping scheduler");
        }
    }
    Ok(())
}
