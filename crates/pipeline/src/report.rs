//! Run reporting: accumulated row-level errors and warnings.
//!
//! Row-level failures exclude their row and land here instead of
//! aborting the run. The report carries every exclusion and warning
//! plus counts by kind for the user-visible batch summary.

use std::collections::BTreeMap;

use journal_core::{Error, Warning};

/// One input row or transaction excluded from matching.
#[derive(Debug)]
pub struct ExcludedRow {
    /// Zero-based input row index, when the exclusion happened before a
    /// transaction id existed.
    pub row: Option<usize>,
    /// Transaction id, when known.
    pub id: Option<String>,
    /// Stable error-kind label.
    pub kind: &'static str,
    /// Full error message.
    pub message: String,
}

/// Accumulated diagnostics for one journal run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Rows and transactions excluded from matching.
    pub excluded: Vec<ExcludedRow>,
    /// Non-fatal warnings from linking and chain-id pinning.
    pub warnings: Vec<Warning>,
}

impl RunReport {
    /// Record a row rejected before normalization produced an id.
    pub fn exclude_row(&mut self, row: usize, id: Option<String>, error: &Error) {
        self.excluded.push(ExcludedRow {
            row: Some(row),
            id,
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    /// Record a normalized transaction excluded from matching.
    pub fn exclude_txn(&mut self, id: &str, error: &Error) {
        self.excluded.push(ExcludedRow {
            row: None,
            id: Some(id.to_string()),
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    /// Record a warning, logging it as it lands.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!(kind = warning.kind(), %warning, "run warning");
        self.warnings.push(warning);
    }

    /// Record a batch of warnings.
    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = Warning>) {
        for warning in warnings {
            self.warn(warning);
        }
    }

    /// Exclusion counts by error kind.
    pub fn error_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for excluded in &self.excluded {
            *counts.entry(excluded.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Warning counts by kind.
    pub fn warning_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for warning in &self.warnings {
            *counts.entry(warning.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// True when nothing was excluded and nothing warned.
    pub fn is_clean(&self) -> bool {
        self.excluded.is_empty() && self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_is_clean() {
        let report = RunReport::default();
        assert!(report.is_clean());
        assert!(report.error_counts().is_empty());
        assert!(report.warning_counts().is_empty());
    }

    #[test]
    fn test_error_counts_by_kind() {
        let mut report = RunReport::default();
        report.exclude_row(0, None, &Error::validation("missing symbol"));
        report.exclude_row(3, Some("t4".to_string()), &Error::validation("zero quantity"));
        report.exclude_txn("t7", &Error::unmapped("XW", "H24"));

        let counts = report.error_counts();
        assert_eq!(counts.get("validation"), Some(&2));
        assert_eq!(counts.get("unmapped_instrument"), Some(&1));
        assert!(!report.is_clean());
    }

    #[test]
    fn test_excluded_row_keeps_context() {
        let mut report = RunReport::default();
        report.exclude_row(5, Some("t6".to_string()), &Error::validation("bad price"));
        let excluded = &report.excluded[0];
        assert_eq!(excluded.row, Some(5));
        assert_eq!(excluded.id.as_deref(), Some("t6"));
        assert!(excluded.message.contains("bad price"));
    }

    #[test]
    fn test_warning_counts_by_kind() {
        let mut report = RunReport::default();
        report.extend_warnings([
            Warning::DanglingLink {
                comment: "roll".to_string(),
                id: "t99".to_string(),
            },
            Warning::DanglingLink {
                comment: "roll".to_string(),
                id: "t98".to_string(),
            },
            Warning::ChainIdContention {
                chain_id: "a".to_string(),
                other: "b".to_string(),
            },
        ]);
        let counts = report.warning_counts();
        assert_eq!(counts.get("dangling_link"), Some(&2));
        assert_eq!(counts.get("chain_id_contention"), Some(&1));
    }
}
