//! End-to-end pipeline for the trade-journal system.
//!
//! This crate handles:
//! - The run engine stitching normalize → classify → match → reconcile
//! - The run report (excluded rows, warnings, counts by kind)
//! - Per-chain summaries for downstream reporting
//! - The snapshot store (atomic whole-file JSON replace)

pub mod engine;
pub mod report;
pub mod store;
pub mod summary;

pub use engine::{run, RunOutput};
pub use report::{ExcludedRow, RunReport};
pub use store::{load, load_or_default, save};
pub use summary::{summarize, ChainSummary};
