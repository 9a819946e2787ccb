use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use crate::error::CreditPoolError;
use crate::types::Timestamp;
use crate::CreditPoolResult;

/// Source of "now" for time-dependent operations (lateness, default timing).
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().timestamp()
    }
}

/// Manually driven clock for tests and scenario simulation.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Parse an RFC 3339 string into a timestamp.
pub fn parse_timestamp(s: &str) -> CreditPoolResult<Timestamp> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.timestamp())
        .map_err(|e| CreditPoolError::InvalidInput {
            field: "timestamp".into(),
            reason: format!("'{s}' is not RFC 3339: {e}"),
        })
}

/// Render a timestamp as RFC 3339 (UTC). Zero renders as "none".
pub fn format_timestamp(ts: Timestamp) -> String {
    if ts == 0 {
        return "none".to_string();
    }
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
