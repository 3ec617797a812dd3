// sessionlens/src/parse.rs
//
// External-collaborator layer: raw log lines → HitRecord.
//
// Two line formats are understood out of the box:
//   elb    — AWS ELB access-log lines (the 2015 marketplace sample format)
//   jsonl  — one HitRecord JSON object per line
//
// `parse_lines` is the generic hook: any wrapper can bring its own per-line
// parser. The analytical core only ever consumes already-parsed records, so
// malformed lines stop here.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::AnalysisError;
use crate::records::HitRecord;

// An ELB line has 15 whitespace-separated fields; we read up to index 12.
const ELB_MIN_FIELDS: usize = 13;

/// Parse one ELB access-log line.
///
/// Whitespace-split field layout (only three fields are kept):
///   0  — ISO-8601 timestamp
///   2  — client address as `ip:port` (port stripped)
///   12 — URL token of the quoted `"METHOD url HTTP/x.y"` request field
pub fn parse_elb_line(line: &str, line_no: usize) -> Result<HitRecord, AnalysisError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < ELB_MIN_FIELDS {
        return Err(AnalysisError::MalformedRecord {
            line:   line_no,
            reason: format!("expected at least {} fields, got {}", ELB_MIN_FIELDS, fields.len()),
        });
    }

    let timestamp: DateTime<Utc> =
        fields[0].parse().map_err(|e| AnalysisError::MalformedRecord {
            line:   line_no,
            reason: format!("bad timestamp {:?}: {}", fields[0], e),
        })?;

    let client = fields[2].split(':').next().unwrap_or_default();
    if client.is_empty() {
        return Err(AnalysisError::MalformedRecord {
            line:   line_no,
            reason: "empty client address".into(),
        });
    }

    Ok(HitRecord {
        timestamp,
        client: client.to_string(),
        url:    fields[12].to_string(),
    })
}

/// Parse one JSONL line holding a serialized `HitRecord`.
pub fn parse_jsonl_line(line: &str, line_no: usize) -> Result<HitRecord, AnalysisError> {
    serde_json::from_str(line).map_err(|e| AnalysisError::MalformedRecord {
        line:   line_no,
        reason: e.to_string(),
    })
}

/// Run a per-line parser over a whole log body.
///
/// Malformed lines are skipped with a warning rather than aborting the run;
/// line numbers are 1-based. Blank lines are ignored.
pub fn parse_lines<F>(content: &str, parser: F) -> Vec<HitRecord>
where
    F: Fn(&str, usize) -> Result<HitRecord, AnalysisError>,
{
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parser(line, idx + 1) {
            Ok(rec) => records.push(rec),
            Err(e) => {
                skipped += 1;
                warn!("{}", e);
            }
        }
    }

    if skipped > 0 {
        warn!("skipped {} malformed line(s), kept {}", skipped, records.len());
    }
    records
}

pub fn parse_elb_log(content: &str) -> Vec<HitRecord> {
    parse_lines(content, parse_elb_line)
}

pub fn parse_jsonl(content: &str) -> Vec<HitRecord> {
    parse_lines(content, parse_jsonl_line)
}
