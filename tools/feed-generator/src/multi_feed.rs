//! Multi-feed generation
//!
//! Runs independent feeds, one per exchange label, on scoped threads. Each
//! feed owns its state and random source; nothing is shared between runs.

use crate::config::GeneratorConfig;
use crate::error::GeneratorError;
use crate::export::RunSummary;
use crate::metrics::FeedMetrics;
use crate::sequencer::{Destination, StreamSequencer};
use std::collections::HashSet;
use std::path::Path;
use std::thread::{self, ScopedJoinHandle};
use tracing::info;
use types::errors::ConfigError;

/// File extension of generated feeds.
pub const FEED_EXTENSION: &str = "ndjson";

/// One feed to generate.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPlan {
    pub config: GeneratorConfig,
    pub destination: Destination,
}

/// One plan per exchange, writing `<dir>/<exchange>.ndjson`.
///
/// The feed at position `i` uses seed `template.seed + i`, so every feed is
/// reproducible on its own and distinct from its siblings.
pub fn plans_for(
    exchanges: &[String],
    template: &GeneratorConfig,
    dir: &Path,
) -> Result<Vec<FeedPlan>, ConfigError> {
    let mut seen = HashSet::new();
    exchanges
        .iter()
        .enumerate()
        .map(|(index, exchange)| {
            if !is_file_name(exchange) {
                return Err(ConfigError::InvalidExchange(exchange.clone()));
            }
            if !seen.insert(exchange.as_str()) {
                return Err(ConfigError::DuplicateExchange(exchange.clone()));
            }
            let config = GeneratorConfig {
                exchange: exchange.clone(),
                seed: template.seed.wrapping_add(index as u64),
                ..template.clone()
            };
            let destination = Destination::File(dir.join(format!("{exchange}.{FEED_EXTENSION}")));
            Ok(FeedPlan { config, destination })
        })
        .collect()
}

fn is_file_name(label: &str) -> bool {
    !label.is_empty() && label != "." && label != ".." && !label.contains(['/', '\\'])
}

/// Generate every plan concurrently. All configurations are validated before
/// any thread starts; summaries come back in plan order.
pub fn generate_feeds(plans: &[FeedPlan]) -> Result<Vec<RunSummary>, GeneratorError> {
    let sequencers = plans
        .iter()
        .map(|plan| StreamSequencer::new(plan.config.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    info!(feeds = plans.len(), "generating feeds");
    thread::scope(|scope| {
        let handles: Vec<_> = sequencers
            .iter()
            .zip(plans)
            .map(|(sequencer, plan)| scope.spawn(move || sequencer.run_to(&plan.destination)))
            .collect();

        join_in_order(handles)
    })
}

/// Generate independent in-memory feeds concurrently, one per configuration.
pub fn generate_in_memory(configs: &[GeneratorConfig]) -> Result<Vec<Vec<u8>>, GeneratorError> {
    let sequencers = configs
        .iter()
        .map(|config| StreamSequencer::new(config.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    thread::scope(|scope| {
        let handles: Vec<_> = sequencers
            .iter()
            .map(|sequencer| {
                scope.spawn(move || {
                    let mut out = Vec::new();
                    sequencer.run(&mut out).map(|_| out)
                })
            })
            .collect();

        join_in_order(handles)
    })
}

/// Join every handle, keeping spawn order. A panicking feed re-raises here.
fn join_in_order<T>(handles: Vec<ScopedJoinHandle<'_, Result<T, GeneratorError>>>) -> Result<Vec<T>, GeneratorError> {
    handles
        .into_iter()
        .map(|handle| match handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        })
        .collect()
}

/// Aggregate metrics across feeds.
pub fn aggregate_metrics(summaries: &[RunSummary]) -> FeedMetrics {
    let mut combined = FeedMetrics::new();
    for summary in summaries {
        let m = &summary.metrics;
        combined.snapshots += m.snapshots;
        combined.new_orders += m.new_orders;
        combined.cancels += m.cancels;
        combined.bid_orders += m.bid_orders;
        combined.ask_orders += m.ask_orders;
        combined.total_quantity += m.total_quantity;
        combined.min_price = match (combined.min_price, m.min_price) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        combined.max_price = match (combined.max_price, m.max_price) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        combined.peak_active = combined.peak_active.max(m.peak_active);
        combined.bytes_written += m.bytes_written;
        combined.elapsed_ns = combined.elapsed_ns.max(m.elapsed_ns);
    }
    combined
}
