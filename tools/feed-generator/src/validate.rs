//! Feed validation
//!
//! Re-reads an NDJSON feed and checks the stream-level guarantees every
//! generated feed carries:
//! - the first record is a snapshot at sequence 1 with equal-length sides
//! - sequence numbers are contiguous, with no gaps or repeats
//! - every cancel references a live order
//! - snapshot levels are uncrossed and every price respects the band

use crate::band::PriceBand;
use crate::config::GeneratorConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};
use types::errors::ConfigError;
use types::event::{FeedEvent, Snapshot};
use types::ids::OrderId;
use types::numeric::Price;

/// A stream-level guarantee broken by one event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamFault {
    #[error("first event must be a snapshot, got {0}")]
    MissingSnapshot(&'static str),

    #[error("snapshot repeated at sequence {0}")]
    RepeatedSnapshot(u64),

    #[error("sequence gap: expected {expected}, got {actual}")]
    SequenceGap { expected: u64, actual: u64 },

    #[error("snapshot sides differ: {bids} bids, {asks} asks")]
    UnevenSnapshot { bids: usize, asks: usize },

    #[error("snapshot depth {actual}, expected {expected}")]
    DepthMismatch { expected: usize, actual: usize },

    #[error("snapshot level {level} crossed: bid {bid} >= ask {ask}")]
    CrossedLevel { level: usize, bid: String, ask: String },

    #[error("price {0} below the absolute floor")]
    BelowFloor(String),

    #[error("price {price} outside band [{floor}, {ceiling}]")]
    OutOfBand { price: String, floor: String, ceiling: String },

    #[error("cancel of order {0} which is not live")]
    UnknownCancel(OrderId),

    #[error("order {0} placed while already live")]
    DuplicateOrder(OrderId),
}

/// Failure to validate a feed.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("read failed: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: malformed event: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: {fault}")]
    Fault {
        line: usize,
        #[source]
        fault: StreamFault,
    },

    #[error("feed is empty")]
    Empty,
}

/// What a feed is checked against beyond its structural guarantees.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedExpectations {
    /// Expected levels per snapshot side.
    pub depth: Option<usize>,
    /// Band every price must lie in.
    pub band: Option<PriceBand>,
}

impl FeedExpectations {
    /// Structural checks only.
    pub fn structural() -> Self {
        Self::default()
    }

    /// Everything the configuration that produced a feed implies.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            depth: Some(config.depth),
            band: Some(config.price_band()?),
        })
    }
}

/// Outcome of a clean validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub events: u64,
    pub new_orders: u64,
    pub cancels: u64,
    pub last_sequence: u64,
    /// Orders still live after the final event.
    pub live_orders: usize,
}

/// Incremental checker over decoded events.
#[derive(Debug)]
pub struct FeedValidator {
    expectations: FeedExpectations,
    next_sequence: u64,
    live: HashSet<OrderId>,
    report: ValidationReport,
}

impl FeedValidator {
    pub fn new(expectations: FeedExpectations) -> Self {
        Self {
            expectations,
            next_sequence: 1,
            live: HashSet::new(),
            report: ValidationReport::default(),
        }
    }

    /// Check one event in stream order.
    pub fn check(&mut self, event: &FeedEvent) -> Result<(), StreamFault> {
        let sequence = event.sequence();
        if sequence != self.next_sequence {
            return Err(StreamFault::SequenceGap {
                expected: self.next_sequence,
                actual: sequence,
            });
        }

        match event {
            FeedEvent::Snapshot(snapshot) => {
                if sequence != 1 {
                    return Err(StreamFault::RepeatedSnapshot(sequence));
                }
                self.check_snapshot(snapshot)?;
            }
            _ if sequence == 1 => return Err(StreamFault::MissingSnapshot(event.kind())),
            FeedEvent::NewOrder(order) => {
                self.check_price(order.price)?;
                if !self.live.insert(order.order_id) {
                    return Err(StreamFault::DuplicateOrder(order.order_id));
                }
                self.report.new_orders += 1;
            }
            FeedEvent::CancelOrder(cancel) => {
                if !self.live.remove(&cancel.order_id) {
                    return Err(StreamFault::UnknownCancel(cancel.order_id));
                }
                self.report.cancels += 1;
            }
        }

        self.next_sequence += 1;
        self.report.events += 1;
        self.report.last_sequence = sequence;
        Ok(())
    }

    pub fn report(&self) -> ValidationReport {
        ValidationReport {
            live_orders: self.live.len(),
            ..self.report.clone()
        }
    }

    /// Final report; an empty feed has no snapshot and is rejected.
    pub fn finish(self) -> Result<ValidationReport, ValidationError> {
        if self.report.events == 0 {
            return Err(ValidationError::Empty);
        }
        Ok(self.report())
    }

    fn check_snapshot(&self, snapshot: &Snapshot) -> Result<(), StreamFault> {
        let (bids, asks) = (snapshot.bids.len(), snapshot.asks.len());
        if bids != asks {
            return Err(StreamFault::UnevenSnapshot { bids, asks });
        }
        if let Some(expected) = self.expectations.depth {
            if bids != expected {
                return Err(StreamFault::DepthMismatch { expected, actual: bids });
            }
        }
        for (level, (bid, ask)) in snapshot.bids.iter().zip(&snapshot.asks).enumerate() {
            if bid.price >= ask.price {
                return Err(StreamFault::CrossedLevel {
                    level,
                    bid: bid.price.to_string(),
                    ask: ask.price.to_string(),
                });
            }
            self.check_price(bid.price)?;
            self.check_price(ask.price)?;
        }
        Ok(())
    }

    fn check_price(&self, price: Price) -> Result<(), StreamFault> {
        if price < Price::FLOOR {
            return Err(StreamFault::BelowFloor(price.to_string()));
        }
        if let Some(band) = &self.expectations.band {
            if !band.contains(price) {
                return Err(StreamFault::OutOfBand {
                    price: price.to_string(),
                    floor: band.floor().to_string(),
                    ceiling: band.ceiling().to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Validate an NDJSON feed from any buffered reader, stopping at the first
/// problem.
pub fn validate_reader<R: BufRead>(
    reader: R,
    expectations: FeedExpectations,
) -> Result<ValidationReport, ValidationError> {
    let mut validator = FeedValidator::new(expectations);

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let event: FeedEvent = serde_json::from_str(&line).map_err(|e| {
            warn!(line = line_no, error = %e, "Malformed feed line");
            ValidationError::Parse {
                line: line_no,
                message: e.to_string(),
            }
        })?;
        if let Err(fault) = validator.check(&event) {
            warn!(line = line_no, sequence = event.sequence(), fault = %fault, "Feed check failed");
            return Err(ValidationError::Fault { line: line_no, fault });
        }
        debug!(line = line_no, kind = event.kind(), "Feed line ok");
    }

    let report = validator.finish()?;
    info!(
        events = report.events,
        new_orders = report.new_orders,
        cancels = report.cancels,
        live_orders = report.live_orders,
        "Feed validated"
    );
    Ok(report)
}

/// Validate a feed file on disk.
pub fn validate_file(
    path: impl AsRef<Path>,
    expectations: FeedExpectations,
) -> Result<ValidationReport, ValidationError> {
    let file = File::open(path)?;
    validate_reader(BufReader::new(file), expectations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::generate_to_vec;

    const SNAPSHOT: &str = r#"{"type":"snapshot","sequence":1,"bids":[{"price":"99.00","quantity":"1.00"}],"asks":[{"price":"101.00","quantity":"0.80"}]}"#;

    fn feed(lines: &[&str]) -> String {
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn check(lines: &[&str]) -> Result<ValidationReport, ValidationError> {
        validate_reader(feed(lines).as_bytes(), FeedExpectations::structural())
    }

    fn fault_of(result: Result<ValidationReport, ValidationError>) -> (usize, StreamFault) {
        match result {
            Err(ValidationError::Fault { line, fault }) => (line, fault),
            other => panic!("expected fault, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_hand_written_feed() {
        let report = check(&[
            SNAPSHOT,
            r#"{"type":"new_order","sequence":2,"order_id":207,"side":"bid","price":"99.50","quantity":"2.00"}"#,
            r#"{"type":"new_order","sequence":3,"order_id":341,"side":"ask","price":"100.50","quantity":"2.00"}"#,
            r#"{"type":"cancel_order","sequence":4,"order_id":207}"#,
        ])
        .unwrap();
        assert_eq!(report.events, 4);
        assert_eq!(report.new_orders, 2);
        assert_eq!(report.cancels, 1);
        assert_eq!(report.live_orders, 1);
        assert_eq!(report.last_sequence, 4);
    }

    #[test]
    fn test_generated_feed_validates() {
        let config = GeneratorConfig {
            events: 400,
            ..Default::default()
        };
        let bytes = generate_to_vec(&config).unwrap();
        let report = validate_reader(bytes.as_slice(), FeedExpectations::from_config(&config).unwrap()).unwrap();
        assert_eq!(report.events, 401);
        assert_eq!(report.new_orders + report.cancels, 400);
    }

    #[test]
    fn test_empty_feed() {
        assert!(matches!(
            validate_reader(&b""[..], FeedExpectations::structural()),
            Err(ValidationError::Empty)
        ));
    }

    #[test]
    fn test_missing_snapshot() {
        let (line, fault) = fault_of(check(&[r#"{"type":"cancel_order","sequence":1,"order_id":5}"#]));
        assert_eq!(line, 1);
        assert_eq!(fault, StreamFault::MissingSnapshot("cancel_order"));
    }

    #[test]
    fn test_sequence_gap() {
        let (line, fault) = fault_of(check(&[
            SNAPSHOT,
            r#"{"type":"new_order","sequence":3,"order_id":307,"side":"bid","price":"99.50","quantity":"2.00"}"#,
        ]));
        assert_eq!(line, 2);
        assert_eq!(fault, StreamFault::SequenceGap { expected: 2, actual: 3 });
    }

    #[test]
    fn test_unknown_cancel() {
        let (_, fault) = fault_of(check(&[SNAPSHOT, r#"{"type":"cancel_order","sequence":2,"order_id":999}"#]));
        assert_eq!(fault, StreamFault::UnknownCancel(OrderId::new(999)));
    }

    #[test]
    fn test_double_cancel() {
        let (line, fault) = fault_of(check(&[
            SNAPSHOT,
            r#"{"type":"new_order","sequence":2,"order_id":207,"side":"bid","price":"99.50","quantity":"2.00"}"#,
            r#"{"type":"cancel_order","sequence":3,"order_id":207}"#,
            r#"{"type":"cancel_order","sequence":4,"order_id":207}"#,
        ]));
        assert_eq!(line, 4);
        assert_eq!(fault, StreamFault::UnknownCancel(OrderId::new(207)));
    }

    #[test]
    fn test_crossed_snapshot() {
        let crossed = r#"{"type":"snapshot","sequence":1,"bids":[{"price":"101.00","quantity":"1.00"}],"asks":[{"price":"101.00","quantity":"1.00"}]}"#;
        let (_, fault) = fault_of(check(&[crossed]));
        assert!(matches!(fault, StreamFault::CrossedLevel { level: 0, .. }));
    }

    #[test]
    fn test_uneven_snapshot() {
        let uneven = r#"{"type":"snapshot","sequence":1,"bids":[{"price":"99.00","quantity":"1.00"}],"asks":[]}"#;
        let (_, fault) = fault_of(check(&[uneven]));
        assert_eq!(fault, StreamFault::UnevenSnapshot { bids: 1, asks: 0 });
    }

    #[test]
    fn test_depth_expectation() {
        let expectations = FeedExpectations {
            depth: Some(4),
            band: None,
        };
        let result = validate_reader(feed(&[SNAPSHOT]).as_bytes(), expectations);
        let (_, fault) = fault_of(result);
        assert_eq!(fault, StreamFault::DepthMismatch { expected: 4, actual: 1 });
    }

    #[test]
    fn test_out_of_band_price() {
        let expectations = FeedExpectations {
            depth: None,
            band: Some(PriceBand::new(100.0, 0.1).unwrap()),
        };
        let result = validate_reader(
            feed(&[
                SNAPSHOT,
                r#"{"type":"new_order","sequence":2,"order_id":207,"side":"ask","price":"120.00","quantity":"2.00"}"#,
            ])
            .as_bytes(),
            expectations,
        );
        let (line, fault) = fault_of(result);
        assert_eq!(line, 2);
        assert!(matches!(fault, StreamFault::OutOfBand { .. }));
    }

    #[test]
    fn test_below_floor() {
        let (_, fault) = fault_of(check(&[
            SNAPSHOT,
            r#"{"type":"new_order","sequence":2,"order_id":207,"side":"bid","price":"0.05","quantity":"2.00"}"#,
        ]));
        assert_eq!(fault, StreamFault::BelowFloor("0.05".to_string()));
    }

    #[test]
    fn test_malformed_line() {
        let result = check(&[SNAPSHOT, r#"{"type":"new_order","sequence":2}"#]);
        assert!(matches!(result, Err(ValidationError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_three_decimal_price_rejected() {
        let result = check(&[
            SNAPSHOT,
            r#"{"type":"new_order","sequence":2,"order_id":207,"side":"bid","price":"99.500","quantity":"2.00"}"#,
        ]);
        assert!(matches!(result, Err(ValidationError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_validate_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.ndjson");
        std::fs::write(&path, feed(&[SNAPSHOT])).unwrap();
        assert_eq!(validate_file(&path, FeedExpectations::structural()).unwrap().events, 1);
    }
}
