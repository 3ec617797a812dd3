// sessionlens/src/lib.rs
//
// Sessionlens — weblog sessionization, engagement ranking and request-load
// forecasting over a static access log.
//
// Data flows strictly forward:
//
//   parse → sessionize → aggregate → { rank, predict }
//     └──────────────→ timeseries → moving-average forecast
//
// Everything downstream of the parser is a pure transformation over an
// already-materialized record set. The binary in main.rs is one possible
// wrapper; any other wrapper can consume these types directly.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod parse;
pub mod pipeline;
pub mod predict;
pub mod records;
pub mod report;
pub mod sessionize;
pub mod timeseries;

pub use aggregate::{overview, rank, summarize, summarize_all, Overview, RankKey};
pub use config::{AnalysisConfig, GapFill};
pub use error::AnalysisError;
pub use pipeline::{run_analysis, AnalysisReport};
pub use predict::HistoricalPredictor;
pub use records::{HitRecord, Prediction, PredictionSource, Session, SessionSummary, TimeBucket};
pub use sessionize::sessionize;
pub use timeseries::{confidence_floor, LoadSeries, WindowEval};
