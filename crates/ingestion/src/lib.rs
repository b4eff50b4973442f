//! Transaction ingestion for the trade-journal system.
//!
//! This crate handles:
//! - Normalizing importer rows into canonical transactions
//! - Instrument classification (grouping-root derivation)
//! - Futures-option month mapping resolution

pub mod normalizer;
pub mod classifier;

pub use normalizer::{normalize, normalize_record, NormalizedBatch, RejectedRow};
pub use classifier::{ClassificationStats, InstrumentClassifier};
