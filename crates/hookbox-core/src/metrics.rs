//! Process-wide request counters with Prometheus text rendering.
//!
//! `Counters` is created once at startup and shared behind an `Arc`. Webhook
//! outcome counters are plain atomics; per-route HTTP counters sit behind a
//! mutex that is only held for a map update.

use std::{
    collections::BTreeMap,
    fmt::{self, Write as _},
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};

use crate::events::{EventHandler, IngestEvent};

/// Webhook outcome category used as the `result` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookResult {
    /// New message stored.
    Created,
    /// Known message id, nothing written.
    Duplicate,
    /// Missing or wrong signature.
    InvalidSignature,
    /// Signed payload rejected by validation.
    ValidationError,
}

impl WebhookResult {
    /// Every category, in rendering order.
    pub const ALL: [Self; 4] =
        [Self::Created, Self::Duplicate, Self::InvalidSignature, Self::ValidationError];

    /// Label value for this category.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Duplicate => "duplicate",
            Self::InvalidSignature => "invalid_signature",
            Self::ValidationError => "validation_error",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Created => 0,
            Self::Duplicate => 1,
            Self::InvalidSignature => 2,
            Self::ValidationError => 3,
        }
    }
}

impl fmt::Display for WebhookResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observability counters shared by all request handlers.
#[derive(Debug, Default)]
pub struct Counters {
    webhook_results: [AtomicU64; 4],
    http_requests: Mutex<BTreeMap<(String, u16), u64>>,
}

impl Counters {
    /// Creates a counter set with every value at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one webhook outcome.
    pub fn record_webhook(&self, result: WebhookResult) {
        self.webhook_results[result.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Current count for a webhook outcome.
    pub fn webhook_count(&self, result: WebhookResult) -> u64 {
        self.webhook_results[result.index()].load(Ordering::Relaxed)
    }

    /// Counts one completed HTTP request.
    pub fn record_http(&self, path: &str, status: u16) {
        let mut requests = self.http_requests.lock().unwrap_or_else(|p| p.into_inner());
        *requests.entry((path.to_string(), status)).or_insert(0) += 1;
    }

    /// Current count for a route and status pair.
    pub fn http_count(&self, path: &str, status: u16) -> u64 {
        let requests = self.http_requests.lock().unwrap_or_else(|p| p.into_inner());
        requests.get(&(path.to_string(), status)).copied().unwrap_or(0)
    }

    /// Renders all counters in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("# HELP http_requests_total Total HTTP requests by route and status.\n");
        out.push_str("# TYPE http_requests_total counter\n");
        {
            let requests = self.http_requests.lock().unwrap_or_else(|p| p.into_inner());
            for ((path, status), count) in requests.iter() {
                let _ = writeln!(
                    out,
                    "http_requests_total{{path=\"{}\",status=\"{status}\"}} {count}",
                    escape_label(path)
                );
            }
        }

        out.push_str("# HELP webhook_requests_total Webhook ingestion outcomes.\n");
        out.push_str("# TYPE webhook_requests_total counter\n");
        for result in WebhookResult::ALL {
            let _ = writeln!(
                out,
                "webhook_requests_total{{result=\"{result}\"}} {}",
                self.webhook_count(result)
            );
        }

        out
    }
}

impl EventHandler for Counters {
    fn handle_event(&self, event: &IngestEvent) {
        self.record_webhook(event.result());
    }
}

fn escape_label(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}
