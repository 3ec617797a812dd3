// sessionlens/src/report.rs
//
// Markdown report to stdout + JSON serialization of a finished analysis.

use serde_json::json;

use crate::pipeline::AnalysisReport;
use crate::records::SessionSummary;

const HISTOGRAM_BINS: usize = 10;

/// Print the full markdown-formatted report to stdout.
pub fn print_markdown(report: &AnalysisReport) {
    println!("# Sessionlens Report\n");
    println!(
        "**Hits**: {}  **Clients**: {}  **Sessions**: {}",
        report.n_hits, report.overview.n_clients, report.overview.n_sessions
    );
    println!();
    println!("| Metric                     | Value    |");
    println!("|----------------------------|----------|");
    println!("| Mean session time          | {:.1} s  |", report.overview.mean_session_secs);
    println!("| Mean unique URLs / session | {:.2}    |", report.overview.mean_unique_urls);
    println!(
        "| Median session time (p{:.0})  | {:.1} s  |",
        report.predictor.percentile() * 100.0,
        report.predictor.global_duration()
    );
    println!(
        "| Median unique URLs (p{:.0})   | {:.2}    |",
        report.predictor.percentile() * 100.0,
        report.predictor.global_unique_urls()
    );
    println!();

    print_ranking("Top sessions by duration", &report.top_by_duration);
    print_ranking("Top sessions by unique URLs", &report.top_by_unique_urls);

    println!("### Request load\n");
    let observed = report.series.buckets.iter().filter(|b| b.observed).count();
    println!(
        "{} bucket(s) of {}s, {} observed, spanning {} → {}\n",
        report.series.buckets.len(),
        report.series.bucket_width_secs,
        observed,
        report.series.buckets.first().map(|b| b.window_start.to_rfc3339()).unwrap_or_default(),
        report.series.buckets.last().map(|b| b.window_start.to_rfc3339()).unwrap_or_default(),
    );

    println!("| Window (min) | MAE     | Evaluated | Next-minute forecast |");
    println!("|--------------|---------|-----------|----------------------|");
    for eval in &report.window_evals {
        println!(
            "| {:12} | {:7.3} | {:9} | {:20.2} |",
            eval.window, eval.mae, eval.n_evaluated, eval.forecast_next
        );
    }
    for err in &report.skipped_windows {
        println!("\nskipped: {}", err);
    }
    if let Some(best) = report.best_window() {
        println!(
            "\nBest window: {} min (MAE {:.3}) → expected load next minute: {:.2} req/min",
            best.window, best.mae, best.forecast_next
        );
    }
    println!();

    println!("### Session duration distribution\n");
    for (lower, count) in duration_histogram(&report.summaries, HISTOGRAM_BINS) {
        let bar = "#".repeat((count as f64 / report.overview.n_sessions.max(1) as f64 * 60.0) as usize);
        println!("{:>8}s | {:5} | {}", lower, count, bar);
    }
}

fn print_ranking(title: &str, rows: &[SessionSummary]) {
    println!("### {}\n", title);
    println!("| #  | Client          | Session | Duration (s) | Unique URLs |");
    println!("|----|-----------------|---------|--------------|-------------|");
    for (i, row) in rows.iter().enumerate() {
        println!(
            "| {:2} | {:15} | {:7} | {:12} | {:11} |",
            i + 1,
            row.client,
            row.session_id,
            row.duration_secs,
            row.unique_url_count
        );
    }
    println!();
}

/// Bin session durations into `n_bins` equal-width bins: (bin_lower, count).
fn duration_histogram(summaries: &[SessionSummary], n_bins: usize) -> Vec<(i64, usize)> {
    if n_bins == 0 {
        return vec![];
    }
    let (Some(min), Some(max)) = (
        summaries.iter().map(|s| s.duration_secs).min(),
        summaries.iter().map(|s| s.duration_secs).max(),
    ) else {
        return vec![];
    };

    let width = ((max - min) / n_bins as i64).max(1);
    let mut bins = vec![0usize; n_bins];
    for s in summaries {
        let idx = (((s.duration_secs - min) / width) as usize).min(n_bins - 1);
        bins[idx] += 1;
    }
    bins.iter()
        .enumerate()
        .map(|(i, &count)| (min + i as i64 * width, count))
        .collect()
}

/// Serialize the analysis to JSON for downstream consumption.
pub fn to_json(report: &AnalysisReport) -> String {
    json!({
        "n_hits":               report.n_hits,
        "n_clients":            report.overview.n_clients,
        "n_sessions":           report.overview.n_sessions,
        "mean_session_secs":    report.overview.mean_session_secs,
        "mean_unique_urls":     report.overview.mean_unique_urls,
        "global_median_secs":   report.predictor.global_duration(),
        "global_median_urls":   report.predictor.global_unique_urls(),
        "top_by_duration":      report.top_by_duration,
        "top_by_unique_urls":   report.top_by_unique_urls,
        "buckets":              report.series.buckets,
        "window_evals":         report.window_evals,
        "skipped_windows":      report.skipped_windows.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
        "best_window":          report.best_window().map(|w| w.window),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(duration: i64) -> SessionSummary {
        SessionSummary {
            client:           "c".to_string(),
            session_id:       0,
            duration_secs:    duration,
            unique_url_count: 1,
        }
    }

    #[test]
    fn histogram_covers_the_full_range() {
        let summaries: Vec<_> = [0, 10, 20, 95, 100].iter().map(|&d| summary(d)).collect();
        let bins = duration_histogram(&summaries, 10);
        assert_eq!(bins.len(), 10);
        assert_eq!(bins.iter().map(|(_, c)| c).sum::<usize>(), 5);
        assert_eq!(bins[0].0, 0);
    }

    #[test]
    fn histogram_of_identical_durations_lands_in_one_bin() {
        let summaries: Vec<_> = (0..4).map(|_| summary(42)).collect();
        let bins = duration_histogram(&summaries, 10);
        assert_eq!(bins[0], (42, 4));
        assert!(bins[1..].iter().all(|&(_, c)| c == 0));
    }

    #[test]
    fn histogram_of_nothing_is_empty() {
        assert!(duration_histogram(&[], 10).is_empty());
    }
}
