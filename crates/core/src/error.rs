//! Error and warning types for the trade-journal system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the trade-journal system.
///
/// Row-level kinds (validation, unmapped instrument, ungroupable) are
/// accumulated into the run report; fatal kinds abort the run.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input row.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Futures option with no month-mapping entry and no default rule.
    #[error("Unmapped instrument: option product {product} month {month}")]
    UnmappedInstrument { product: String, month: String },

    /// Transaction that cannot be keyed to an (account, root) group.
    #[error("Ungroupable transaction {id}: {reason}")]
    Ungroupable { id: String, reason: String },

    /// Operation applied to a chain in the wrong state.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Malformed user-owned configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal consistency check failure.
    #[error("Invariant violation in {account}/{root}: {detail} (transactions {transaction_ids:?})")]
    InvariantViolation {
        account: String,
        root: String,
        transaction_ids: Vec<String>,
        detail: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create an unmapped-instrument error.
    pub fn unmapped(product: impl Into<String>, month: impl Into<String>) -> Self {
        Error::UnmappedInstrument {
            product: product.into(),
            month: month.into(),
        }
    }

    /// Create an ungroupable-transaction error.
    pub fn ungroupable(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Ungroupable {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a precondition error.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Error::Precondition(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an invariant-violation error.
    pub fn invariant(
        account: impl Into<String>,
        root: impl Into<String>,
        transaction_ids: Vec<String>,
        detail: impl Into<String>,
    ) -> Self {
        Error::InvariantViolation {
            account: account.into(),
            root: root.into(),
            transaction_ids,
            detail: detail.into(),
        }
    }

    /// Stable label for report counting.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::UnmappedInstrument { .. } => "unmapped_instrument",
            Error::Ungroupable { .. } => "ungroupable",
            Error::Precondition(_) => "precondition",
            Error::Config(_) => "config",
            Error::InvariantViolation { .. } => "invariant_violation",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
        }
    }

    /// Whether this error aborts a run rather than excluding a row.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::InvariantViolation { .. } | Error::Io(_) | Error::Json(_)
        )
    }
}

/// Non-fatal run diagnostics, accumulated into the run report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Link id that matched no transaction or order in the batch.
    #[error("dangling link id {id} (link {comment:?})")]
    DanglingLink { comment: String, id: String },

    /// Two persisted chain records claim the same transaction id.
    #[error("records {chain_id} and {other} both claim transaction {transaction_id}")]
    DuplicateChainRecord {
        transaction_id: String,
        chain_id: String,
        other: String,
    },

    /// Two persisted records claim members of one computed chain.
    #[error("records {chain_id} and {other} claim members of one chain; {chain_id} wins")]
    ChainIdContention { chain_id: String, other: String },

    /// A persisted record's transactions landed in several computed chains.
    #[error("transactions of record {chain_id} split across {count} chains")]
    PersistedIdsSplit { chain_id: String, count: usize },
}

impl Warning {
    /// Stable label for report counting.
    pub fn kind(&self) -> &'static str {
        match self {
            Warning::DanglingLink { .. } => "dangling_link",
            Warning::DuplicateChainRecord { .. } => "duplicate_chain_record",
            Warning::ChainIdContention { .. } => "chain_id_contention",
            Warning::PersistedIdsSplit { .. } => "persisted_ids_split",
        }
    }
}
