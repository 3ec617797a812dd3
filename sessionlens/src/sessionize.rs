// sessionlens/src/sessionize.rs
//
// Gap-based sessionization, the core of the pipeline.
//
// Rule, per client: sort hits by timestamp, scan forward; a gap strictly
// greater than the inactivity threshold closes the current session and
// opens a new one at the current hit. A gap exactly equal to the threshold
// stays in the same session, as do identical timestamps (gap 0).
//
// Invariants:
//   - every input hit lands in exactly one session (partition, no loss)
//   - sessions never span clients, regardless of timestamp proximity
//   - within a session, consecutive gaps are ≤ threshold; the gap between
//     two sessions of the same client is > threshold

use std::collections::BTreeMap;

use tracing::debug;

use crate::records::{HitRecord, Session};

/// Partition `hits` into per-client sessions.
///
/// Clients are processed in ascending order and sessions numbered
/// sequentially in that order, so identical inputs always produce identical
/// session ids. Within a client, same-timestamp hits keep their input order
/// (stable sort). Empty input yields an empty session set.
pub fn sessionize(hits: &[HitRecord], inactivity_threshold_secs: i64) -> Vec<Session> {
    // Group by client, preserving input order within each group.
    let mut by_client: BTreeMap<&str, Vec<&HitRecord>> = BTreeMap::new();
    for hit in hits {
        by_client.entry(hit.client.as_str()).or_default().push(hit);
    }

    let mut sessions = Vec::new();
    let mut next_id = 0u64;

    for (client, mut client_hits) in by_client {
        client_hits.sort_by_key(|h| h.timestamp);

        let runs = split_at_gaps(&client_hits, inactivity_threshold_secs);
        debug!("client {}: {} hits → {} session(s)", client, client_hits.len(), runs.len());

        for run in runs {
            sessions.push(Session {
                client:     client.to_string(),
                session_id: next_id,
                start:      run[0].timestamp,
                end:        run[run.len() - 1].timestamp,
                hits:       run.into_iter().cloned().collect(),
            });
            next_id += 1;
        }
    }
    sessions
}

/// Split one client's chronologically-sorted hits into contiguous runs
/// separated by gaps strictly greater than `threshold_secs`.
/// Every returned run is non-empty.
fn split_at_gaps<'a>(hits: &[&'a HitRecord], threshold_secs: i64) -> Vec<Vec<&'a HitRecord>> {
    let mut runs: Vec<Vec<&HitRecord>> = Vec::new();
    let Some(&first) = hits.first() else {
        return runs;
    };

    let mut current = vec![first];
    let mut prev = first.timestamp;

    for &hit in &hits[1..] {
        if (hit.timestamp - prev).num_seconds() > threshold_secs {
            runs.push(std::mem::replace(&mut current, vec![hit]));
        } else {
            current.push(hit);
        }
        prev = hit.timestamp;
    }
    runs.push(current);
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn hit(secs: i64, client: &str, url: &str) -> HitRecord {
        HitRecord {
            timestamp: DateTime::from_timestamp(secs, 0).unwrap(),
            client:    client.to_string(),
            url:       url.to_string(),
        }
    }

    #[test]
    fn worked_example_two_sessions() {
        // 10.0.0.1 at t = 0, 100, 200, 1200, 1260 with threshold 900
        let hits: Vec<_> = [0, 100, 200, 1200, 1260]
            .iter()
            .map(|&t| hit(t, "10.0.0.1", "/"))
            .collect();

        let sessions = sessionize(&hits, 900);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].hits.len(), 3);
        assert_eq!(sessions[1].hits.len(), 2);
        assert_eq!(sessions[0].duration_secs(), 200);
        assert_eq!(sessions[1].duration_secs(), 60);
    }

    #[test]
    fn gap_equal_to_threshold_stays_in_session() {
        let hits = vec![hit(0, "a", "/"), hit(900, "a", "/")];
        let sessions = sessionize(&hits, 900);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].hits.len(), 2);
    }

    #[test]
    fn gap_one_past_threshold_splits() {
        let hits = vec![hit(0, "a", "/"), hit(901, "a", "/")];
        let sessions = sessionize(&hits, 900);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].duration_secs(), 0);
        assert_eq!(sessions[1].duration_secs(), 0);
    }

    #[test]
    fn identical_timestamps_share_a_session() {
        let hits = vec![hit(50, "a", "/x"), hit(50, "a", "/y"), hit(50, "a", "/z")];
        let sessions = sessionize(&hits, 900);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].hits.len(), 3);
        assert_eq!(sessions[0].duration_secs(), 0);
    }

    #[test]
    fn single_hit_yields_single_hit_session() {
        let sessions = sessionize(&[hit(7, "a", "/")], 900);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].hits.len(), 1);
        assert_eq!(sessions[0].start, sessions[0].end);
    }

    #[test]
    fn clients_never_merge_even_at_identical_times() {
        let hits = vec![hit(10, "a", "/"), hit(10, "b", "/"), hit(11, "a", "/")];
        let sessions = sessionize(&hits, 900);
        assert_eq!(sessions.len(), 2);
        assert!(sessions.iter().all(|s| s.hits.iter().all(|h| h.client == s.client)));
    }

    #[test]
    fn every_hit_lands_in_exactly_one_session() {
        let hits: Vec<_> = (0..50)
            .map(|i| hit(i * 400, if i % 3 == 0 { "a" } else { "b" }, "/p"))
            .collect();
        let sessions = sessionize(&hits, 900);

        let total: usize = sessions.iter().map(|s| s.hits.len()).sum();
        assert_eq!(total, hits.len());

        // Within a session gaps are ≤ threshold; between sessions > threshold.
        for pair in sessions.windows(2) {
            for s in pair {
                for w in s.hits.windows(2) {
                    assert!((w[1].timestamp - w[0].timestamp).num_seconds() <= 900);
                }
            }
            if pair[0].client == pair[1].client {
                assert!((pair[1].start - pair[0].end).num_seconds() > 900);
            }
        }
    }

    #[test]
    fn ids_are_deterministic_across_input_orderings() {
        let mut hits = vec![
            hit(0, "b", "/"),
            hit(2000, "b", "/"),
            hit(5, "a", "/"),
        ];
        let forward = sessionize(&hits, 900);
        hits.reverse();
        let backward = sessionize(&hits, 900);

        let ids = |s: &[Session]| s.iter().map(|x| (x.client.clone(), x.session_id)).collect::<Vec<_>>();
        assert_eq!(ids(&forward), ids(&backward));
        assert_eq!(forward[0].client, "a"); // clients in ascending order
        assert_eq!(forward[0].session_id, 0);
    }

    #[test]
    fn empty_input_yields_empty_session_set() {
        assert!(sessionize(&[], 900).is_empty());
    }
}
