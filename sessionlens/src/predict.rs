// sessionlens/src/predict.rs
//
// Historical percentile predictors over the session table.
//
// A client with prior sessions is predicted by its own percentile (default
// median) duration / unique-URL count; an unseen client gets the global
// percentile across all sessions. The fallback is the designed default for
// cold clients, not an error path.
//
// Percentile is exact nearest-rank over sorted values (index ceil(p·n) − 1),
// so the prediction is always an actually-observed value. Exact and
// approximate percentiles are not bit-identical; this implementation is the
// exact one.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::AnalysisError;
use crate::records::{Prediction, PredictionSource, SessionSummary};

#[derive(Debug, Clone, Serialize)]
struct ClientStats {
    duration_secs: f64,
    unique_urls:   f64,
    n_sessions:    usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoricalPredictor {
    percentile:      f64,
    by_client:       BTreeMap<String, ClientStats>,
    global_duration: f64,
    global_unique:   f64,
}

impl HistoricalPredictor {
    /// Fit per-client and global percentiles from the summary set.
    pub fn fit(summaries: &[SessionSummary], percentile: f64) -> Result<Self, AnalysisError> {
        if summaries.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let mut durations: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        let mut uniques:   BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for s in summaries {
            durations.entry(s.client.as_str()).or_default().push(s.duration_secs as f64);
            uniques.entry(s.client.as_str()).or_default().push(s.unique_url_count as f64);
        }

        let mut by_client = BTreeMap::new();
        for (client, mut dur) in durations {
            let mut uni = uniques.remove(client).unwrap_or_default();
            let n = dur.len();
            by_client.insert(
                client.to_string(),
                ClientStats {
                    duration_secs: nearest_rank(&mut dur, percentile),
                    unique_urls:   nearest_rank(&mut uni, percentile),
                    n_sessions:    n,
                },
            );
        }

        let mut all_durations: Vec<f64> = summaries.iter().map(|s| s.duration_secs as f64).collect();
        let mut all_uniques:   Vec<f64> = summaries.iter().map(|s| s.unique_url_count as f64).collect();

        Ok(Self {
            percentile,
            by_client,
            global_duration: nearest_rank(&mut all_durations, percentile),
            global_unique:   nearest_rank(&mut all_uniques, percentile),
        })
    }

    /// Expected session duration (seconds) for a client.
    pub fn predict_duration(&self, client: &str) -> Prediction {
        match self.by_client.get(client) {
            Some(stats) => Prediction {
                value:      stats.duration_secs,
                source:     PredictionSource::PerClient,
                n_sessions: stats.n_sessions,
            },
            None => Prediction {
                value:      self.global_duration,
                source:     PredictionSource::GlobalFallback,
                n_sessions: 0,
            },
        }
    }

    /// Expected unique-URL count per session for a client.
    pub fn predict_unique_urls(&self, client: &str) -> Prediction {
        match self.by_client.get(client) {
            Some(stats) => Prediction {
                value:      stats.unique_urls,
                source:     PredictionSource::PerClient,
                n_sessions: stats.n_sessions,
            },
            None => Prediction {
                value:      self.global_unique,
                source:     PredictionSource::GlobalFallback,
                n_sessions: 0,
            },
        }
    }

    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    pub fn n_clients(&self) -> usize {
        self.by_client.len()
    }

    pub fn global_duration(&self) -> f64 {
        self.global_duration
    }

    pub fn global_unique_urls(&self) -> f64 {
        self.global_unique
    }
}

/// Exact nearest-rank percentile: sort, take index ceil(p·n) − 1 (clamped).
/// Assumes non-empty input, which `fit` guarantees.
fn nearest_rank(values: &mut [f64], p: f64) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    let rank = ((p * n as f64).ceil() as usize).clamp(1, n);
    values[rank - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(client: &str, id: u64, duration: i64, unique: usize) -> SessionSummary {
        SessionSummary {
            client:           client.to_string(),
            session_id:       id,
            duration_secs:    duration,
            unique_url_count: unique,
        }
    }

    #[test]
    fn known_client_predicted_from_its_own_history() {
        let summaries = vec![
            summary("a", 0, 10, 1),
            summary("a", 1, 50, 3),
            summary("a", 2, 1000, 9),
            summary("b", 3, 7, 2),
        ];
        let p = HistoricalPredictor::fit(&summaries, 0.5).unwrap();

        let d = p.predict_duration("a");
        assert_eq!(d.source, PredictionSource::PerClient);
        assert_eq!(d.n_sessions, 3);
        assert_eq!(d.value, 50.0); // median of {10, 50, 1000}

        let u = p.predict_unique_urls("a");
        assert_eq!(u.value, 3.0);
    }

    #[test]
    fn unseen_client_falls_back_to_global_median() {
        let summaries = vec![
            summary("a", 0, 10, 1),
            summary("b", 1, 20, 2),
            summary("c", 2, 30, 3),
        ];
        let p = HistoricalPredictor::fit(&summaries, 0.5).unwrap();

        let d = p.predict_duration("203.0.113.9");
        assert_eq!(d.source, PredictionSource::GlobalFallback);
        assert_eq!(d.n_sessions, 0);
        assert_eq!(d.value, 20.0);
    }

    #[test]
    fn nearest_rank_returns_an_observed_value() {
        // even count: the lower of the two middles, never an interpolation
        let mut vals = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(nearest_rank(&mut vals, 0.5), 2.0);

        let mut vals = vec![5.0];
        assert_eq!(nearest_rank(&mut vals, 0.5), 5.0);

        let mut vals = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(nearest_rank(&mut vals, 0.95), 4.0);
    }

    #[test]
    fn fitting_nothing_is_an_error() {
        assert!(matches!(
            HistoricalPredictor::fit(&[], 0.5),
            Err(AnalysisError::EmptyInput)
        ));
    }

    #[test]
    fn configurable_percentile_is_honored() {
        let summaries: Vec<_> = (1..=10).map(|i| summary("a", i, i as i64 * 10, 1)).collect();
        let p = HistoricalPredictor::fit(&summaries, 0.9).unwrap();
        assert_eq!(p.predict_duration("a").value, 90.0); // rank ceil(0.9·10) = 9
    }
}
