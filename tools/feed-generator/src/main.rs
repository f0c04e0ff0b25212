//! Feed Generator - Write, batch and verify synthetic market-event feeds

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use feed_generator::band::PriceBand;
use feed_generator::export::{self, RunSummary};
use feed_generator::multi_feed;
use feed_generator::price_process::DEFAULT_DT;
use feed_generator::validate::{self, FeedExpectations};
use feed_generator::{Destination, GeneratorConfig, PriceModelConfig, StreamSequencer};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "feed-generator")]
#[command(about = "Generate deterministic synthetic order-book event feeds", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one feed
    Generate {
        /// Informational exchange label
        #[arg(long, default_value = "synthetic")]
        exchange: String,

        /// Output path, `-` for stdout
        #[arg(short, long, default_value = "-")]
        output: Destination,

        #[command(flatten)]
        feed: FeedArgs,

        /// Also write a JSON run summary here
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Write one independent feed per exchange, concurrently
    GenerateMany {
        /// Exchange labels; feed `i` uses seed `seed + i`
        #[arg(long, value_delimiter = ',', required = true)]
        exchanges: Vec<String>,

        /// Directory receiving `<exchange>.ndjson`
        #[arg(long, default_value = "data")]
        dir: PathBuf,

        #[command(flatten)]
        feed: FeedArgs,

        /// Also write a JSON array of run summaries here
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Check a feed file against its stream guarantees
    Verify {
        /// NDJSON feed path
        file: PathBuf,

        /// Expected snapshot depth
        #[arg(long)]
        depth: Option<usize>,

        /// Base price of the band to enforce (requires --band)
        #[arg(long, requires = "band")]
        base_price: Option<f64>,

        /// Band fraction to enforce (requires --base-price)
        #[arg(long, requires = "base_price")]
        band: Option<f64>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Model {
    /// Geometric Brownian motion
    Gbm,
    /// Uniform random step
    Jitter,
}

#[derive(Args)]
struct FeedArgs {
    /// Events after the snapshot
    #[arg(long, default_value_t = 250)]
    events: u64,

    /// Random seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Starting mid and band centre
    #[arg(long, default_value_t = 30000.0)]
    base_price: f64,

    /// Book levels per side
    #[arg(long, default_value_t = 8)]
    depth: usize,

    /// Base quantity at level 0
    #[arg(long, default_value_t = 2500.0)]
    quantity: f64,

    /// Band half-width as a fraction of the base price, in (0, 1). Zero is
    /// rejected: the band must hold at least two cent ticks
    #[arg(long, default_value_t = 0.15)]
    band: f64,

    /// Probability of a cancel while orders are live
    #[arg(long, default_value_t = feed_generator::config::DEFAULT_CANCEL_PROBABILITY)]
    cancel_probability: f64,

    /// Mid-price model
    #[arg(long, value_enum, default_value_t = Model::Gbm)]
    model: Model,

    /// GBM drift
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    drift: f64,

    /// GBM volatility
    #[arg(long, default_value_t = 0.01)]
    volatility: f64,

    /// Jitter model step bound
    #[arg(long, default_value_t = 5.0)]
    max_step: f64,
}

impl FeedArgs {
    fn into_config(self, exchange: String) -> GeneratorConfig {
        let price_model = match self.model {
            Model::Gbm => PriceModelConfig::Gbm {
                drift: self.drift,
                volatility: self.volatility,
                dt: DEFAULT_DT,
            },
            Model::Jitter => PriceModelConfig::Jitter {
                max_step: self.max_step,
            },
        };
        GeneratorConfig {
            exchange,
            events: self.events,
            seed: self.seed,
            base_price: self.base_price,
            depth: self.depth,
            quantity: self.quantity,
            band: self.band,
            cancel_probability: self.cancel_probability,
            price_model,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            exchange,
            output,
            feed,
            summary,
        } => generate(feed.into_config(exchange), &output, summary),
        Commands::GenerateMany {
            exchanges,
            dir,
            feed,
            summary,
        } => generate_many(&exchanges, feed.into_config(String::new()), &dir, summary),
        Commands::Verify {
            file,
            depth,
            base_price,
            band,
        } => verify(&file, depth, base_price.zip(band)),
    }
}

fn generate(config: GeneratorConfig, output: &Destination, summary_path: Option<PathBuf>) -> Result<()> {
    let sequencer = StreamSequencer::new(config)?;
    let summary = sequencer
        .run_to(output)
        .with_context(|| format!("generating feed into {output}"))?;

    if let Some(path) = summary_path {
        export::write_to_file(&summary, &path)
            .with_context(|| format!("writing summary to {}", path.display()))?;
    }
    report(&summary, output);
    Ok(())
}

fn generate_many(
    exchanges: &[String],
    template: GeneratorConfig,
    dir: &Path,
    summary_path: Option<PathBuf>,
) -> Result<()> {
    let plans = multi_feed::plans_for(exchanges, &template, dir)?;
    let summaries = multi_feed::generate_feeds(&plans)?;

    for (plan, summary) in plans.iter().zip(&summaries) {
        report(summary, &plan.destination);
    }
    let combined = multi_feed::aggregate_metrics(&summaries);
    info!(
        feeds = summaries.len(),
        events = combined.total_events(),
        bytes = combined.bytes_written,
        "all feeds complete"
    );

    if let Some(path) = summary_path {
        std::fs::write(&path, export::export_batch_json(&summaries))
            .with_context(|| format!("writing summary to {}", path.display()))?;
    }
    Ok(())
}

fn verify(file: &Path, depth: Option<usize>, band: Option<(f64, f64)>) -> Result<()> {
    let band = band
        .map(|(base_price, fraction)| PriceBand::new(base_price, fraction))
        .transpose()?;
    let expectations = FeedExpectations { depth, band };

    let report = match validate::validate_file(file, expectations) {
        Ok(report) => report,
        Err(err) => bail!("{} is invalid: {err}", file.display()),
    };
    println!(
        "{}: ok, {} events ({} new, {} cancels), {} orders live at end",
        file.display(),
        report.events,
        report.new_orders,
        report.cancels,
        report.live_orders
    );
    Ok(())
}

/// Total event count of a finished feed. Goes to stderr when the feed itself
/// is on stdout.
fn report(summary: &RunSummary, output: &Destination) {
    let line = format!(
        "{}: wrote {} events to {} (sha256 {})",
        summary.exchange, summary.events_written, output, summary.sha256
    );
    match output {
        Destination::Stdout => eprintln!("{line}"),
        Destination::File(_) => println!("{line}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::errors::ConfigError;

    fn feed_args(extra: &[&str]) -> FeedArgs {
        let mut argv = vec!["feed-generator", "generate"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Generate { feed, .. } => feed,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_defaults_map_to_default_config() {
        let config = feed_args(&[]).into_config("synthetic".to_string());
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn test_zero_band_is_rejected() {
        let config = feed_args(&["--band", "0"]).into_config("synthetic".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::BandTooNarrow { .. })));
    }
}
