//! Chain construction for the trade-journal system.
//!
//! This crate handles:
//! - Position tables and the transaction index
//! - Matching classified transactions into chains
//! - Manual link overrides and chain merging
//! - Trade-shape classification of opening legs
//! - Aggregation of derived chain fields
//! - Chain-id pinning and persisted-record reconciliation
//! - Lifecycle finalization of closed chains

pub mod table;
pub mod matcher;
pub mod links;
pub mod shape;
pub mod aggregator;
pub mod reconcile;
pub mod lifecycle;

pub use table::{PositionBook, TransactionIndex};
pub use matcher::{match_chains, verify_chains, MatchOutcome, MatchedChain};
pub use links::apply_links;
pub use shape::classify_shape;
pub use aggregator::{aggregate, default_comment};
pub use reconcile::{assign_chain_ids, reconcile_chain};
pub use lifecycle::finalize;
