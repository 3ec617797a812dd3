// sessionlens/src/records.rs
//
// Domain types flowing through the pipeline.
// Every type below is a derived, read-only artifact of one pass over the
// input log: built once, never mutated in place. New data means a re-run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Input ─────────────────────────────────────────────────────────────────────

/// One parsed access-log line: who requested what, when.
/// Produced by the parser layer (`parse`); the core never sees raw lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitRecord {
    pub timestamp: DateTime<Utc>,
    pub client:    String,
    pub url:       String,
}

// ── Sessions ──────────────────────────────────────────────────────────────────

/// A maximal run of one client's hits where no consecutive gap exceeds the
/// inactivity threshold. Belongs to exactly one client; sessions of different
/// clients never merge regardless of timestamp proximity.
///
/// `session_id` is assigned deterministically: clients in ascending order,
/// sessions in time order within a client.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub client:     String,
    pub session_id: u64,
    pub start:      DateTime<Utc>,
    pub end:        DateTime<Utc>,
    pub hits:       Vec<HitRecord>,
}

impl Session {
    /// Whole seconds between the first and last hit. Zero for a single hit.
    pub fn duration_secs(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// Per-session statistics, derived 1:1 from `Session`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub client:           String,
    pub session_id:       u64,
    pub duration_secs:    i64,
    pub unique_url_count: usize,
}

// ── Time series ───────────────────────────────────────────────────────────────

/// One fixed-width window of the gap-free load calendar.
///
/// `observed == false` marks a calendar gap materialized with count 0.
/// `seconds_observed` counts the distinct 1-second slots inside the window
/// that carried traffic: the per-bucket coverage measure used to decide
/// whether a bucket is trustworthy enough for forecast evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeBucket {
    pub window_start:     DateTime<Utc>,
    pub request_count:    u64,
    pub observed:         bool,
    pub seconds_observed: u32,
}

// ── Predictions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    /// The client has prior sessions; the value is its own percentile.
    PerClient,
    /// Unseen client; the value is the global percentile across all sessions.
    GlobalFallback,
}

impl std::fmt::Display for PredictionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PerClient      => write!(f, "per-client"),
            Self::GlobalFallback => write!(f, "global-fallback"),
        }
    }
}

/// A historical-percentile prediction for one client.
/// `n_sessions` is the history size behind the value (0 for the fallback).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub value:      f64,
    pub source:     PredictionSource,
    pub n_sessions: usize,
}
