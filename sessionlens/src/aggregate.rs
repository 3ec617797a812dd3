// sessionlens/src/aggregate.rs
//
// Session-level aggregation and engagement ranking.

use std::collections::HashSet;

use serde::Serialize;

use crate::records::{Session, SessionSummary};

/// Summarize one session: time span and distinct-URL count.
/// URL comparison is exact and case-sensitive, no normalization.
pub fn summarize(session: &Session) -> SessionSummary {
    let unique: HashSet<&str> = session.hits.iter().map(|h| h.url.as_str()).collect();
    SessionSummary {
        client:           session.client.clone(),
        session_id:       session.session_id,
        duration_secs:    session.duration_secs(),
        unique_url_count: unique.len(),
    }
}

pub fn summarize_all(sessions: &[Session]) -> Vec<SessionSummary> {
    sessions.iter().map(summarize).collect()
}

// ── Corpus overview ───────────────────────────────────────────────────────────

/// Dataset-level aggregates: the "average session time" and "average unique
/// URL visits per session" answers, plus basic cardinalities.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub n_sessions:        usize,
    pub n_clients:         usize,
    pub mean_session_secs: f64,
    pub mean_unique_urls:  f64,
}

pub fn overview(summaries: &[SessionSummary]) -> Overview {
    let n = summaries.len();
    if n == 0 {
        return Overview {
            n_sessions:        0,
            n_clients:         0,
            mean_session_secs: 0.0,
            mean_unique_urls:  0.0,
        };
    }

    let clients: HashSet<&str> = summaries.iter().map(|s| s.client.as_str()).collect();
    Overview {
        n_sessions:        n,
        n_clients:         clients.len(),
        mean_session_secs: summaries.iter().map(|s| s.duration_secs as f64).sum::<f64>() / n as f64,
        mean_unique_urls:  summaries.iter().map(|s| s.unique_url_count as f64).sum::<f64>() / n as f64,
    }
}

// ── Engagement ranking ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankKey {
    Duration,
    UniqueUrls,
}

/// Top-N sessions by the chosen key, descending.
///
/// Ties break by client ascending, then session id ascending: total and
/// deterministic regardless of input order. Both keys rank from the same
/// summary set; nothing is discarded between the two rankings.
pub fn rank(summaries: &[SessionSummary], key: RankKey, top_n: usize) -> Vec<SessionSummary> {
    let mut ranked = summaries.to_vec();
    ranked.sort_by(|a, b| {
        let primary = match key {
            RankKey::Duration   => b.duration_secs.cmp(&a.duration_secs),
            RankKey::UniqueUrls => b.unique_url_count.cmp(&a.unique_url_count),
        };
        primary
            .then_with(|| a.client.cmp(&b.client))
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    ranked.truncate(top_n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::HitRecord;
    use chrono::DateTime;

    fn session(client: &str, id: u64, times_urls: &[(i64, &str)]) -> Session {
        let hits: Vec<HitRecord> = times_urls
            .iter()
            .map(|&(t, u)| HitRecord {
                timestamp: DateTime::from_timestamp(t, 0).unwrap(),
                client:    client.to_string(),
                url:       u.to_string(),
            })
            .collect();
        Session {
            client:     client.to_string(),
            session_id: id,
            start:      hits[0].timestamp,
            end:        hits[hits.len() - 1].timestamp,
            hits,
        }
    }

    fn summary(client: &str, id: u64, duration: i64, unique: usize) -> SessionSummary {
        SessionSummary {
            client:           client.to_string(),
            session_id:       id,
            duration_secs:    duration,
            unique_url_count: unique,
        }
    }

    #[test]
    fn repeated_urls_count_once() {
        let s = session("a", 0, &[(0, "/x"), (10, "/x"), (20, "/y"), (30, "/x")]);
        let sum = summarize(&s);
        assert_eq!(sum.unique_url_count, 2);
        assert_eq!(sum.duration_secs, 30);
    }

    #[test]
    fn url_match_is_case_sensitive() {
        let s = session("a", 0, &[(0, "/Page"), (1, "/page")]);
        assert_eq!(summarize(&s).unique_url_count, 2);
    }

    #[test]
    fn single_hit_session_duration_zero_unique_one() {
        let s = session("a", 0, &[(42, "/only")]);
        let sum = summarize(&s);
        assert_eq!(sum.duration_secs, 0);
        assert_eq!(sum.unique_url_count, 1);
    }

    #[test]
    fn ranking_by_duration_descends() {
        let summaries = vec![
            summary("a", 0, 50, 1),
            summary("b", 1, 200, 2),
            summary("c", 2, 60, 3),
            summary("d", 3, 999, 4),
        ];
        let top = rank(&summaries, RankKey::Duration, 4);
        let durations: Vec<i64> = top.iter().map(|s| s.duration_secs).collect();
        assert_eq!(durations, vec![999, 200, 60, 50]);
    }

    #[test]
    fn ranking_truncates_to_top_n() {
        let summaries: Vec<_> = (0..20).map(|i| summary("a", i, i as i64, 1)).collect();
        assert_eq!(rank(&summaries, RankKey::Duration, 10).len(), 10);
    }

    #[test]
    fn equal_keys_break_ties_by_client_then_id() {
        let summaries = vec![
            summary("zeta", 5, 100, 1),
            summary("alpha", 9, 100, 1),
            summary("alpha", 2, 100, 1),
        ];
        let top = rank(&summaries, RankKey::Duration, 3);
        assert_eq!(
            top.iter().map(|s| (s.client.as_str(), s.session_id)).collect::<Vec<_>>(),
            vec![("alpha", 2), ("alpha", 9), ("zeta", 5)]
        );
    }

    #[test]
    fn both_rankings_come_from_one_summary_set() {
        let summaries = vec![
            summary("a", 0, 999, 1), // longest, fewest URLs
            summary("b", 1, 1, 9),   // shortest, most URLs
        ];
        let by_dur = rank(&summaries, RankKey::Duration, 1);
        let by_url = rank(&summaries, RankKey::UniqueUrls, 1);
        assert_eq!(by_dur[0].client, "a");
        assert_eq!(by_url[0].client, "b");
        // The duration ranking still carries the unique-URL data.
        assert_eq!(by_dur[0].unique_url_count, 1);
    }

    #[test]
    fn overview_means() {
        let summaries = vec![summary("a", 0, 100, 2), summary("b", 1, 300, 4)];
        let ov = overview(&summaries);
        assert_eq!(ov.n_sessions, 2);
        assert_eq!(ov.n_clients, 2);
        assert!((ov.mean_session_secs - 200.0).abs() < 1e-9);
        assert!((ov.mean_unique_urls - 3.0).abs() < 1e-9);
    }

    #[test]
    fn overview_of_nothing_is_zeroed() {
        let ov = overview(&[]);
        assert_eq!(ov.n_sessions, 0);
        assert_eq!(ov.mean_session_secs, 0.0);
    }
}
