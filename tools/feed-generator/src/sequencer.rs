//! Stream sequencing and NDJSON output
//!
//! `EventStream` is the lazy, finite, non-restartable event sequence of one
//! run: the snapshot at sequence 1, then exactly `events` incremental events
//! at sequences 2..=events+1. `StreamSequencer` drains a stream into a sink,
//! one JSON object per line, and reports a `RunSummary`.

use crate::band::PriceBand;
use crate::config::GeneratorConfig;
use crate::error::GeneratorError;
use crate::export::RunSummary;
use crate::metrics::FeedMetrics;
use crate::snapshot::{SnapshotBuilder, SNAPSHOT_SEQUENCE};
use crate::state::GeneratorState;
use crate::synthesizer::EventSynthesizer;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, error, info};
use types::errors::{ConfigError, InvariantViolation};
use types::event::FeedEvent;

/// Lazy event sequence of one run. Owns its `GeneratorState`.
#[derive(Debug)]
pub struct EventStream {
    snapshot: SnapshotBuilder,
    synthesizer: EventSynthesizer,
    band: PriceBand,
    state: GeneratorState,
    remaining: u64,
    started: bool,
    failed: bool,
}

impl EventStream {
    /// Validate `config` and prepare a stream. Nothing is drawn yet.
    pub fn new(config: &GeneratorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let band = config.price_band()?;
        let synthesizer = EventSynthesizer::new(
            config.price_model.build()?,
            band,
            config.depth,
            config.quantity,
            config.cancel_probability,
        );
        Ok(Self {
            snapshot: SnapshotBuilder::new(band, config.depth, config.quantity),
            synthesizer,
            band,
            state: GeneratorState::new(config.seed, config.base_price),
            remaining: config.events,
            started: false,
            failed: false,
        })
    }

    pub fn state(&self) -> &GeneratorState {
        &self.state
    }

    pub fn model_name(&self) -> &'static str {
        self.synthesizer.model_name()
    }

    /// Events still to be produced, snapshot included if not yet emitted.
    pub fn remaining(&self) -> u64 {
        if self.failed {
            return 0;
        }
        self.remaining + u64::from(!self.started)
    }

    fn advance(&mut self) -> Result<FeedEvent, InvariantViolation> {
        let last = self.state.sequence;
        let sequence = self.state.next_sequence()?;

        let event = if !self.started {
            self.started = true;
            if sequence != SNAPSHOT_SEQUENCE {
                return Err(InvariantViolation::SequenceRegression { last, next: sequence });
            }
            FeedEvent::Snapshot(self.snapshot.build(self.state.mid, &mut self.state.rng)?)
        } else {
            self.remaining -= 1;
            self.synthesizer.next_event(&mut self.state)?
        };

        if event.sequence() != last + 1 {
            return Err(InvariantViolation::SequenceRegression {
                last,
                next: event.sequence(),
            });
        }
        if let FeedEvent::NewOrder(order) = &event {
            if !self.band.contains(order.price) {
                return Err(InvariantViolation::PriceOutOfBand {
                    sequence: order.sequence,
                    price: order.price.to_string(),
                });
            }
        }
        Ok(event)
    }
}

impl Iterator for EventStream {
    type Item = Result<FeedEvent, GeneratorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || (self.started && self.remaining == 0) {
            return None;
        }
        match self.advance() {
            Ok(event) => Some(Ok(event)),
            Err(fault) => {
                self.failed = true;
                Some(Err(fault.into()))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

/// Where a feed is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    /// Open the sink, creating parent directories for file targets.
    pub fn open(&self) -> io::Result<Box<dyn Write>> {
        match self {
            Destination::Stdout => Ok(Box::new(io::stdout().lock())),
            Destination::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                Ok(Box::new(File::create(path)?))
            }
        }
    }
}

impl FromStr for Destination {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(Destination::Stdout)
        } else {
            Ok(Destination::File(PathBuf::from(s)))
        }
    }
}

impl From<&Path> for Destination {
    fn from(path: &Path) -> Self {
        Destination::File(path.to_path_buf())
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Stdout => write!(f, "-"),
            Destination::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Counts and hashes every byte on its way to the inner writer.
struct DigestWriter<W: Write> {
    inner: W,
    hasher: Sha256,
    bytes: u64,
}

impl<W: Write> DigestWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            bytes: 0,
        }
    }

    fn finish(mut self) -> io::Result<(String, u64)> {
        self.inner.flush()?;
        Ok((format!("{:x}", self.hasher.finalize()), self.bytes))
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        self.bytes += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Serialize one event as a single NDJSON line, trailing newline included.
pub fn encode_line(event: &FeedEvent) -> Result<Vec<u8>, GeneratorError> {
    let mut line = serde_json::to_vec(event)?;
    line.push(b'\n');
    Ok(line)
}

/// Drives one validated configuration to completion.
#[derive(Debug, Clone)]
pub struct StreamSequencer {
    config: GeneratorConfig,
}

impl StreamSequencer {
    /// Fails fast on an invalid configuration, before any output exists.
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Fresh lazy stream for this configuration.
    pub fn events(&self) -> Result<EventStream, ConfigError> {
        EventStream::new(&self.config)
    }

    /// Write the whole feed to `sink` and summarize it.
    pub fn run<W: Write>(&self, sink: W) -> Result<RunSummary, GeneratorError> {
        let config = &self.config;
        let started = Instant::now();
        let mut stream = self.events()?;
        info!(
            exchange = %config.exchange,
            seed = config.seed,
            events = config.events,
            depth = config.depth,
            model = stream.model_name(),
            "generating feed"
        );

        let mut writer = DigestWriter::new(BufWriter::new(sink));
        let mut metrics = FeedMetrics::new();
        let mut written = 0u64;

        for item in stream.by_ref() {
            let event = match item {
                Ok(event) => event,
                Err(err) => {
                    error!(exchange = %config.exchange, written, error = %err, "feed aborted");
                    return Err(err);
                }
            };
            serde_json::to_writer(&mut writer, &event)?;
            writer.write_all(b"\n")?;
            written += 1;
            metrics.record_event(&event);
            debug!(sequence = event.sequence(), kind = event.kind(), "event written");
        }

        let (sha256, bytes) = writer.finish()?;
        metrics.set_bytes_written(bytes);
        metrics.set_elapsed(u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX));

        let state = stream.state();
        metrics.update_active(state.active.peak());
        info!(
            exchange = %config.exchange,
            events_written = written,
            bytes,
            digest = %sha256,
            "feed complete"
        );
        Ok(RunSummary {
            version: crate::VERSION.to_string(),
            exchange: config.exchange.clone(),
            seed: config.seed,
            config: config.clone(),
            events_written: written,
            final_mid: state.mid,
            active_remaining: state.active.len(),
            sha256,
            metrics,
            generated_at: chrono::Utc::now(),
        })
    }

    /// Open `destination` and write the feed there.
    pub fn run_to(&self, destination: &Destination) -> Result<RunSummary, GeneratorError> {
        let sink = destination.open()?;
        self.run(sink)
    }
}

/// Generate a feed into memory.
pub fn generate_to_vec(config: &GeneratorConfig) -> Result<Vec<u8>, GeneratorError> {
    let mut out = Vec::new();
    StreamSequencer::new(config.clone())?.run(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(events: u64) -> GeneratorConfig {
        GeneratorConfig {
            events,
            depth: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_stream_starts_with_snapshot() {
        let mut stream = EventStream::new(&small(3)).unwrap();
        match stream.next() {
            Some(Ok(FeedEvent::Snapshot(snapshot))) => {
                assert_eq!(snapshot.sequence, 1);
                assert_eq!(snapshot.depth(), 4);
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn test_stream_length_and_sequences() {
        let events: Vec<FeedEvent> = EventStream::new(&small(25)).unwrap().map(Result::unwrap).collect();
        assert_eq!(events.len(), 26);
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.sequence(), i as u64 + 1);
        }
    }

    #[test]
    fn test_zero_events_is_snapshot_only() {
        let events: Vec<_> = EventStream::new(&small(0)).unwrap().collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_size_hint_is_exact() {
        let mut stream = EventStream::new(&small(5)).unwrap();
        assert_eq!(stream.size_hint(), (6, Some(6)));
        stream.next();
        assert_eq!(stream.size_hint(), (5, Some(5)));
        let rest = stream.by_ref().count();
        assert_eq!(rest, 5);
        assert_eq!(stream.remaining(), 0);
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_stream_fuses_after_fault() {
        let mut stream = EventStream::new(&small(5)).unwrap();
        assert!(matches!(stream.next(), Some(Ok(FeedEvent::Snapshot(_)))));

        // The next order id no longer fits in a u64.
        stream.state.sequence = u64::MAX / 100;
        match stream.next() {
            Some(Err(GeneratorError::Invariant(InvariantViolation::IdOverflow(sequence)))) => {
                assert_eq!(sequence, u64::MAX / 100 + 1);
            }
            other => panic!("expected id overflow, got {other:?}"),
        }
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
        assert_eq!(stream.remaining(), 0);
        assert_eq!(stream.size_hint(), (0, Some(0)));
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let config = GeneratorConfig {
            depth: 0,
            ..Default::default()
        };
        assert!(StreamSequencer::new(config.clone()).is_err());
        assert!(matches!(
            generate_to_vec(&config),
            Err(GeneratorError::Config(ConfigError::ZeroDepth))
        ));
    }

    #[test]
    fn test_run_writes_one_line_per_event() {
        let mut out = Vec::new();
        let summary = StreamSequencer::new(small(10)).unwrap().run(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        assert_eq!(text.lines().count(), 11);
        assert_eq!(summary.events_written, 11);
        assert_eq!(summary.metrics.total_events(), 11);
        assert_eq!(summary.metrics.bytes_written, text.len() as u64);
        assert!(text.lines().next().unwrap().starts_with(r#"{"type":"snapshot","sequence":1,"#));
    }

    #[test]
    fn test_digest_matches_bytes() {
        let mut out = Vec::new();
        let summary = StreamSequencer::new(small(10)).unwrap().run(&mut out).unwrap();
        assert_eq!(summary.sha256, format!("{:x}", Sha256::digest(&out)));
        assert_eq!(summary.sha256.len(), 64);
    }

    #[test]
    fn test_encode_line_matches_run_output() {
        let expected: Vec<u8> = EventStream::new(&small(8))
            .unwrap()
            .flat_map(|event| encode_line(&event.unwrap()).unwrap())
            .collect();
        assert_eq!(generate_to_vec(&small(8)).unwrap(), expected);
    }

    #[test]
    fn test_summary_tracks_final_state() {
        let mut out = Vec::new();
        let summary = StreamSequencer::new(small(50)).unwrap().run(&mut out).unwrap();
        let active = summary.metrics.new_orders - summary.metrics.cancels;
        assert_eq!(summary.active_remaining as u64, active);
        assert!(summary.metrics.peak_active >= summary.active_remaining);
    }

    #[test]
    fn test_destination_parsing() {
        assert_eq!("-".parse::<Destination>().unwrap(), Destination::Stdout);
        assert_eq!(
            "out/feed.ndjson".parse::<Destination>().unwrap(),
            Destination::File(PathBuf::from("out/feed.ndjson"))
        );
        assert_eq!(Destination::Stdout.to_string(), "-");
    }

    #[test]
    fn test_run_to_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("feed.ndjson");
        let summary = StreamSequencer::new(small(4))
            .unwrap()
            .run_to(&Destination::File(path.clone()))
            .unwrap();
        let bytes = fs::read(&path).unwrap();
        assert_eq!(summary.metrics.bytes_written, bytes.len() as u64);
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink closed"))
        }
    }

    #[test]
    fn test_io_failure_surfaces() {
        let result = StreamSequencer::new(small(2000)).unwrap().run(FailingSink);
        assert!(matches!(result, Err(GeneratorError::Io(_)) | Err(GeneratorError::Serialization(_))));
    }
}
