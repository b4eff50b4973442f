//! Chain summaries for downstream reporting.

use chrono::NaiveDate;
use journal_chains::TransactionIndex;
use journal_core::{Chain, ChainStatus, TradeShape};
use rust_decimal::Decimal;
use serde::Serialize;

/// Flat per-chain record for reports.
#[derive(Debug, Clone, Serialize)]
pub struct ChainSummary {
    /// Chain identifier.
    pub chain_id: String,
    /// Account nickname.
    pub account: String,
    /// Root symbol.
    pub root: String,
    /// Status after reconciliation.
    pub status: ChainStatus,
    /// Trade-shape label.
    pub trade_type: TradeShape,
    /// Finalizer category, when stamped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Narrative comment.
    pub comment: String,
    /// Earliest member date.
    pub min_date: NaiveDate,
    /// Latest member date.
    pub max_date: NaiveDate,
    /// Inclusive calendar span in days.
    pub span_days: i64,
    /// Number of member transactions.
    pub txn_count: usize,
    /// Net cash flow over the members, per unit. Collected premium is
    /// positive; no contract multipliers applied.
    pub net_cash: Decimal,
}

/// Summarize one chain against the batch's transaction index.
pub fn summarize(chain: &Chain, index: &TransactionIndex) -> ChainSummary {
    let net_cash = chain
        .transaction_ids
        .iter()
        .filter_map(|id| index.get(id))
        .map(|txn| txn.cash())
        .sum();

    ChainSummary {
        chain_id: chain.chain_id.clone(),
        account: chain.account.clone(),
        root: chain.root.clone(),
        status: chain.status,
        trade_type: chain.trade_type,
        category: chain.category.clone(),
        comment: chain.comment.clone(),
        min_date: chain.min_date,
        max_date: chain.max_date,
        span_days: chain.span_days(),
        txn_count: chain.txn_count(),
        net_cash,
    }
}
