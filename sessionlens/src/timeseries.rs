// sessionlens/src/timeseries.rs
//
// Request-load time series and the moving-average forecaster.
//
// Counting hits per minute alone silently drops empty minutes, so every
// windowed average over it would be computed against the wrong calendar.
// The builder therefore materializes a complete reference calendar from the
// floor of the earliest hit to the ceiling of the latest and joins observed
// counts against it; minutes with no traffic are present with count 0.
//
// Window conventions (fixed, both used downstream):
//   - the windowed average at bucket i is inclusive of bucket i and spans
//     the w prior buckets as well (w+1 values, clamped at the series start)
//   - the one-step-ahead forecast averages the final w closed buckets

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::GapFill;
use crate::error::AnalysisError;
use crate::records::{HitRecord, TimeBucket};

/// Gap-free load calendar plus the moving-average forecaster over it.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSeries {
    pub buckets:           Vec<TimeBucket>,
    pub bucket_width_secs: i64,
}

/// One window's held-out evaluation and next-bucket forecast.
#[derive(Debug, Clone, Serialize)]
pub struct WindowEval {
    /// Window size in buckets (minutes at the default width).
    pub window:        usize,
    /// Mean absolute error of the windowed average against eligible buckets.
    pub mae:           f64,
    pub n_evaluated:   usize,
    /// Forecast for the bucket after the series ends.
    pub forecast_next: f64,
}

/// Confidence floor for a window: `round(fraction × window)` non-empty
/// prior buckets must exist inside the trailing window for a bucket to be
/// evaluated (the 10%-of-window rule).
pub fn confidence_floor(window: usize, fraction: f64) -> usize {
    (fraction * window as f64).round() as usize
}

impl LoadSeries {
    /// Build the complete calendar over all hit timestamps.
    ///
    /// Buckets run from `floor(earliest / width) × width` to
    /// `ceil(latest / width) × width` inclusive, in window order; each
    /// bucket counts hits in `[window_start, window_start + width)`.
    pub fn build(hits: &[HitRecord], bucket_width_secs: i64) -> Result<Self, AnalysisError> {
        if hits.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        let width = bucket_width_secs;

        let mut counts: BTreeMap<i64, u64> = BTreeMap::new();
        let mut seconds: BTreeMap<i64, HashSet<i64>> = BTreeMap::new();
        let mut min_ts = i64::MAX;
        let mut max_ts = i64::MIN;

        for hit in hits {
            let ts = hit.timestamp.timestamp();
            min_ts = min_ts.min(ts);
            max_ts = max_ts.max(ts);
            let start = ts.div_euclid(width) * width;
            *counts.entry(start).or_default() += 1;
            seconds.entry(start).or_default().insert(ts);
        }

        let first = min_ts.div_euclid(width) * width;
        let last = if max_ts.rem_euclid(width) == 0 {
            max_ts
        } else {
            max_ts.div_euclid(width) * width + width
        };

        let mut buckets = Vec::with_capacity(((last - first) / width + 1) as usize);
        let mut start = first;
        while start <= last {
            let count = counts.get(&start).copied().unwrap_or(0);
            buckets.push(TimeBucket {
                window_start:     bucket_stamp(start),
                request_count:    count,
                observed:         count > 0,
                seconds_observed: seconds.get(&start).map(|s| s.len() as u32).unwrap_or(0),
            });
            start += width;
        }

        debug!(
            "load calendar: {} bucket(s), {} observed",
            buckets.len(),
            buckets.iter().filter(|b| b.observed).count()
        );
        Ok(Self { buckets, bucket_width_secs })
    }

    /// Bucket counts with the configured gap-fill applied.
    fn filled_counts(&self, gap_fill: GapFill) -> Vec<f64> {
        match gap_fill {
            GapFill::Zeros => self.buckets.iter().map(|b| b.request_count as f64).collect(),
            GapFill::ForwardFill => {
                let mut carry = 0.0;
                self.buckets
                    .iter()
                    .map(|b| {
                        if b.observed {
                            carry = b.request_count as f64;
                        }
                        carry
                    })
                    .collect()
            }
        }
    }

    /// Forecast for the bucket after the series ends: the arithmetic mean
    /// of the final `window` closed buckets.
    pub fn forecast_next(&self, window: usize, gap_fill: GapFill) -> f64 {
        let values = self.filled_counts(gap_fill);
        let lo = values.len().saturating_sub(window);
        let tail = &values[lo..];
        if tail.is_empty() {
            return 0.0;
        }
        tail.iter().sum::<f64>() / tail.len() as f64
    }

    /// Evaluate one candidate window against the observed buckets.
    ///
    /// A bucket is eligible iff it is observed, carries at least
    /// `min_seconds_per_bucket` distinct traffic seconds, and at least
    /// `min_prior_nonempty` (floored at 1) of its `window` prior buckets
    /// are non-empty.
    /// Sparse buckets are excluded, not imputed. A window with no eligible
    /// bucket at all reports `InsufficientWindowData` for that window only,
    /// never for the whole run.
    pub fn evaluate_window(
        &self,
        window: usize,
        min_prior_nonempty: usize,
        min_seconds_per_bucket: u32,
        gap_fill: GapFill,
    ) -> Result<WindowEval, AnalysisError> {
        let values = self.filled_counts(gap_fill);

        let mut abs_err_sum = 0.0;
        let mut n_evaluated = 0usize;

        for (i, bucket) in self.buckets.iter().enumerate() {
            if !bucket.observed || bucket.seconds_observed < min_seconds_per_bucket {
                continue;
            }
            let lo = i.saturating_sub(window);
            let prior_nonempty = self.buckets[lo..i].iter().filter(|b| b.observed).count();
            if prior_nonempty < min_prior_nonempty.max(1) {
                continue;
            }
            let prediction = trailing_mean(&values, i, window);
            abs_err_sum += (prediction - bucket.request_count as f64).abs();
            n_evaluated += 1;
        }

        if n_evaluated == 0 {
            return Err(AnalysisError::InsufficientWindowData {
                window,
                needed:   min_prior_nonempty.max(1),
                eligible: 0,
            });
        }

        Ok(WindowEval {
            window,
            mae: abs_err_sum / n_evaluated as f64,
            n_evaluated,
            forecast_next: self.forecast_next(window, gap_fill),
        })
    }
}

/// Mean of `values[i − window ..= i]`, clamped at the series start: the
/// trailing window is inclusive of the current bucket and spans up to
/// `window + 1` values.
fn trailing_mean(values: &[f64], i: usize, window: usize) -> f64 {
    let span = &values[i.saturating_sub(window)..=i];
    span.iter().sum::<f64>() / span.len() as f64
}

// Bucket starts are aligned epoch seconds derived from valid input
// timestamps, so the conversion back cannot leave chrono's range.
fn bucket_stamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}
