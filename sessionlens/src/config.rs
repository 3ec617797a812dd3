// sessionlens/src/config.rs
//
// Recognized analysis options and their defaults.
// A wrapper can deserialize this from JSON or build it field by field;
// the CLI in main.rs maps its flags onto it.

use serde::{Deserialize, Serialize};

/// How empty calendar buckets are treated ahead of the moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapFill {
    /// Empty buckets stay at 0 (the plain calendar counts).
    Zeros,
    /// Carry the last observed count forward across empty buckets.
    ForwardFill,
}

impl std::fmt::Display for GapFill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zeros       => write!(f, "zeros"),
            Self::ForwardFill => write!(f, "forward-fill"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Gap strictly greater than this closes a session.
    pub inactivity_threshold_secs: i64,

    /// Rows kept per engagement ranking.
    pub top_n: usize,

    /// Width of one load-calendar bucket.
    pub bucket_width_secs: i64,

    /// Candidate moving-average windows, in buckets (minutes at the
    /// default width). Each is evaluated independently.
    pub moving_average_windows: Vec<usize>,

    /// Fraction of a window that must be non-empty prior buckets for a
    /// bucket to count toward that window's evaluation.
    pub min_confidence_fraction: f64,

    /// Observed buckets with fewer distinct traffic-carrying seconds than
    /// this are treated as low-coverage and excluded from evaluation.
    pub min_seconds_per_bucket: u32,

    /// Percentile used by the historical predictors.
    pub percentile: f64,

    pub gap_fill: GapFill,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            inactivity_threshold_secs: 900, // 15 minutes
            top_n:                     10,
            bucket_width_secs:         60,
            moving_average_windows:    vec![5, 15, 30, 60],
            min_confidence_fraction:   0.10,
            min_seconds_per_bucket:    5,
            percentile:                0.5,
            gap_fill:                  GapFill::Zeros,
        }
    }
}
