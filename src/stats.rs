//! # Statistics Module
//!
//! Collects and stores metrics about the engine's operation.
//!
//! ## Overview
//!
//! The `StatCollector` is updated by the engine as requests move through it:
//! seeded, admitted and fetched, then either routed as a response or reported
//! as a failure. All counters are atomics so that concurrent request tasks can
//! update them without locking.
//!
//! ## Key Metrics Tracked
//!
//! - **Request Metrics**: Enqueued, sent, succeeded, failed
//! - **Response Metrics**: Deliveries to spiders, unmatched responses, status code distribution
//! - **Transfer Metrics**: Bytes downloaded
//! - **Timing Metrics**: Elapsed time and rates
//!
//! ## Example
//!
//! ```rust,ignore
//! let stats = engine.stats();
//! engine.crawl().await?;
//! println!("{}", stats);
//! println!("{}", stats.to_json_string_pretty()?);
//! ```

use crate::error::SpiderError;
use dashmap::DashMap;
use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

// A consistent copy of the counters, shared by every presentation method.
struct StatsSnapshot {
    requests_enqueued: usize,
    requests_sent: usize,
    requests_succeeded: usize,
    requests_failed: usize,
    responses_routed: usize,
    responses_unmatched: usize,
    total_bytes_downloaded: usize,
    response_status_counts: BTreeMap<u16, usize>,
    elapsed_duration: Duration,
}

impl StatsSnapshot {
    fn formatted_duration(&self) -> String {
        format!("{:?}", self.elapsed_duration)
    }

    fn per_second(&self, count: usize) -> f64 {
        let total_seconds = self.elapsed_duration.as_secs_f64();
        if total_seconds > 0.0 {
            count as f64 / total_seconds
        } else {
            0.0
        }
    }

    fn formatted_bytes(&self) -> String {
        const KB: usize = 1024;
        const MB: usize = 1024 * KB;
        const GB: usize = 1024 * MB;

        if self.total_bytes_downloaded >= GB {
            format!("{:.2} GB", self.total_bytes_downloaded as f64 / GB as f64)
        } else if self.total_bytes_downloaded >= MB {
            format!("{:.2} MB", self.total_bytes_downloaded as f64 / MB as f64)
        } else if self.total_bytes_downloaded >= KB {
            format!("{:.2} KB", self.total_bytes_downloaded as f64 / KB as f64)
        } else {
            format!("{} B", self.total_bytes_downloaded)
        }
    }

    fn status_codes(&self, separator: &str, render: impl Fn(u16, usize) -> String) -> Option<String> {
        if self.response_status_counts.is_empty() {
            return None;
        }
        Some(
            self.response_status_counts
                .iter()
                .map(|(code, count)| render(*code, *count))
                .collect::<Vec<String>>()
                .join(separator),
        )
    }
}

/// Collects and stores various statistics about the engine's operation.
#[derive(Debug, Serialize)]
pub struct StatCollector {
    #[serde(skip)]
    pub start_time: Instant,

    // Request-related metrics
    pub requests_enqueued: AtomicUsize,
    pub requests_sent: AtomicUsize,
    pub requests_succeeded: AtomicUsize,
    pub requests_failed: AtomicUsize,

    // Response-related metrics
    pub responses_routed: AtomicUsize,
    pub responses_unmatched: AtomicUsize,
    pub response_status_counts: DashMap<u16, usize>,
    pub total_bytes_downloaded: AtomicUsize,
}

impl StatCollector {
    /// Creates a new `StatCollector` with all counters initialized to zero.
    pub fn new() -> Self {
        StatCollector {
            start_time: Instant::now(),
            requests_enqueued: AtomicUsize::new(0),
            requests_sent: AtomicUsize::new(0),
            requests_succeeded: AtomicUsize::new(0),
            requests_failed: AtomicUsize::new(0),
            responses_routed: AtomicUsize::new(0),
            responses_unmatched: AtomicUsize::new(0),
            response_status_counts: DashMap::new(),
            total_bytes_downloaded: AtomicUsize::new(0),
        }
    }

    fn snapshot(&self) -> StatsSnapshot {
        let response_status_counts = self
            .response_status_counts
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();

        StatsSnapshot {
            requests_enqueued: self.requests_enqueued.load(Ordering::SeqCst),
            requests_sent: self.requests_sent.load(Ordering::SeqCst),
            requests_succeeded: self.requests_succeeded.load(Ordering::SeqCst),
            requests_failed: self.requests_failed.load(Ordering::SeqCst),
            responses_routed: self.responses_routed.load(Ordering::SeqCst),
            responses_unmatched: self.responses_unmatched.load(Ordering::SeqCst),
            total_bytes_downloaded: self.total_bytes_downloaded.load(Ordering::SeqCst),
            response_status_counts,
            elapsed_duration: self.start_time.elapsed(),
        }
    }

    pub(crate) fn increment_requests_enqueued(&self) {
        self.requests_enqueued.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_requests_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_requests_succeeded(&self) {
        self.requests_succeeded.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_requests_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Records how many spiders a response was delivered to.
    pub(crate) fn record_routing(&self, deliveries: usize) {
        if deliveries == 0 {
            self.responses_unmatched.fetch_add(1, Ordering::SeqCst);
        } else {
            self.responses_routed.fetch_add(deliveries, Ordering::SeqCst);
        }
    }

    pub(crate) fn record_response_status(&self, status_code: u16) {
        *self.response_status_counts.entry(status_code).or_insert(0) += 1;
    }

    pub(crate) fn add_bytes_downloaded(&self, bytes: usize) {
        self.total_bytes_downloaded.fetch_add(bytes, Ordering::SeqCst);
    }

    /// Number of responses seen with `status_code`.
    pub fn status_count(&self, status_code: u16) -> usize {
        self.response_status_counts
            .get(&status_code)
            .map(|count| *count)
            .unwrap_or(0)
    }

    pub fn to_json_string(&self) -> Result<String, SpiderError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_string_pretty(&self) -> Result<String, SpiderError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Exports the current statistics to a Markdown formatted string.
    pub fn to_markdown_string(&self) -> String {
        let snapshot = self.snapshot();
        let status_codes_output = snapshot
            .status_codes("\n", |code, count| format!("- **{}**: {}", code, count))
            .unwrap_or_else(|| "N/A".to_string());

        format!(
            r#"# Crawl Statistics Report

- **Duration**: {}
- **Average Speed**: {:.2} req/s, {:.2} resp/s

## Requests
| Metric     | Count |
|------------|-------|
| Enqueued   | {}     |
| Sent       | {}     |
| Succeeded  | {}     |
| Failed     | {}     |

## Responses
| Metric     | Count |
|------------|-------|
| Routed     | {}     |
| Unmatched  | {}     |
| Downloaded | {}     |

## Status Codes
{}
"#,
            snapshot.formatted_duration(),
            snapshot.per_second(snapshot.requests_sent),
            snapshot.per_second(snapshot.requests_succeeded),
            snapshot.requests_enqueued,
            snapshot.requests_sent,
            snapshot.requests_succeeded,
            snapshot.requests_failed,
            snapshot.responses_routed,
            snapshot.responses_unmatched,
            snapshot.formatted_bytes(),
            status_codes_output
        )
    }
}

impl Default for StatCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StatCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();

        writeln!(f, "\nCrawl Statistics")?;
        writeln!(f, "----------------")?;
        writeln!(f, "  duration : {}", snapshot.formatted_duration())?;
        writeln!(
            f,
            "  speed    : req/s: {:.2}, resp/s: {:.2}",
            snapshot.per_second(snapshot.requests_sent),
            snapshot.per_second(snapshot.requests_succeeded)
        )?;
        writeln!(
            f,
            "  requests : enqueued: {}, sent: {}, ok: {}, fail: {}",
            snapshot.requests_enqueued,
            snapshot.requests_sent,
            snapshot.requests_succeeded,
            snapshot.requests_failed
        )?;
        writeln!(
            f,
            "  response : routed: {}, unmatched: {}, downloaded: {}",
            snapshot.responses_routed,
            snapshot.responses_unmatched,
            snapshot.formatted_bytes()
        )?;

        let status_string = snapshot
            .status_codes(", ", |code, count| format!("{}: {}", code, count))
            .unwrap_or_else(|| "none".to_string());
        writeln!(f, "  status   : {}\n", status_string)
    }
}
