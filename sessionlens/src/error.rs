// sessionlens/src/error.rs
//
// Library error taxonomy. All core errors are structural (bad or missing
// input) and surfaced to the caller; the only silent default anywhere is
// the predictor's global-fallback median, which is a designed behavior,
// not an error path.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No hit records at all: nothing to sessionize, bucket or fit.
    #[error("empty input: no hit records")]
    EmptyInput,

    /// A raw log line the parser could not turn into a `HitRecord`.
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// A moving-average window left with no bucket passing the confidence
    /// filter. Reported per window; other windows continue.
    #[error("window {window}m: {eligible} eligible buckets, need at least {needed}")]
    InsufficientWindowData {
        window:   usize,
        needed:   usize,
        eligible: usize,
    },
}
