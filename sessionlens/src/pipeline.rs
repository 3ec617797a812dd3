// sessionlens/src/pipeline.rs
//
// One-call facade: records in, full analysis out.
// Stages run strictly forward; nothing is recomputed between consumers.

use tracing::{info, warn};

use crate::aggregate::{overview, rank, summarize_all, Overview, RankKey};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::predict::HistoricalPredictor;
use crate::records::{HitRecord, Session, SessionSummary};
use crate::sessionize::sessionize;
use crate::timeseries::{confidence_floor, LoadSeries, WindowEval};

/// Everything one run derives. All fields are read-only artifacts; a
/// wrapper picks what it needs (the CLI prints most of it).
#[derive(Debug)]
pub struct AnalysisReport {
    pub n_hits:             usize,
    pub overview:           Overview,
    pub sessions:           Vec<Session>,
    pub summaries:          Vec<SessionSummary>,
    pub top_by_duration:    Vec<SessionSummary>,
    pub top_by_unique_urls: Vec<SessionSummary>,
    pub series:             LoadSeries,
    pub window_evals:       Vec<WindowEval>,
    /// Windows that had no confident bucket to evaluate, with the reason.
    pub skipped_windows:    Vec<AnalysisError>,
    pub predictor:          HistoricalPredictor,
}

impl AnalysisReport {
    /// The evaluated window with the lowest MAE, if any window survived.
    pub fn best_window(&self) -> Option<&WindowEval> {
        self.window_evals
            .iter()
            .min_by(|a, b| a.mae.total_cmp(&b.mae))
    }
}

pub fn run_analysis(
    hits: &[HitRecord],
    cfg: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    if hits.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    let sessions = sessionize(hits, cfg.inactivity_threshold_secs);
    info!("sessionized {} hit(s) into {} session(s)", hits.len(), sessions.len());

    let summaries = summarize_all(&sessions);
    let overview = overview(&summaries);

    let top_by_duration = rank(&summaries, RankKey::Duration, cfg.top_n);
    let top_by_unique_urls = rank(&summaries, RankKey::UniqueUrls, cfg.top_n);

    let series = LoadSeries::build(hits, cfg.bucket_width_secs)?;
    let mut window_evals = Vec::new();
    let mut skipped_windows = Vec::new();
    for &window in &cfg.moving_average_windows {
        let floor = confidence_floor(window, cfg.min_confidence_fraction);
        match series.evaluate_window(window, floor, cfg.min_seconds_per_bucket, cfg.gap_fill) {
            Ok(eval) => window_evals.push(eval),
            Err(e) => {
                warn!("{}", e);
                skipped_windows.push(e);
            }
        }
    }

    let predictor = HistoricalPredictor::fit(&summaries, cfg.percentile)?;

    Ok(AnalysisReport {
        n_hits: hits.len(),
        overview,
        sessions,
        summaries,
        top_by_duration,
        top_by_unique_urls,
        series,
        window_evals,
        skipped_windows,
        predictor,
    })
}
