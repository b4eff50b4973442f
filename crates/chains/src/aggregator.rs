//! Chain aggregation: derived fields from membership.
//!
//! Everything here is a pure function of the member transactions and is
//! recomputed on every run; persisted overrides apply later, during
//! reconciliation.

use journal_core::{Chain, TradeShape};

use crate::matcher::MatchedChain;
use crate::shape::classify_shape;

/// Build the full chain record for a matched chain.
pub fn aggregate(matched: &MatchedChain, chain_id: String) -> Chain {
    let min_date = matched
        .txns
        .iter()
        .map(|ct| ct.txn.date())
        .min()
        .unwrap_or_default();
    let max_date = matched
        .txns
        .iter()
        .map(|ct| ct.txn.date())
        .max()
        .unwrap_or_default();
    let trade_type = classify_shape(&matched.txns);

    let transaction_ids: Vec<String> = matched.txns.iter().map(|ct| ct.txn.id.clone()).collect();
    let mut order_ids: Vec<String> = Vec::new();
    for ct in &matched.txns {
        if let Some(order_id) = &ct.txn.order_id {
            if !order_ids.iter().any(|o| o == order_id) {
                order_ids.push(order_id.clone());
            }
        }
    }

    let comment = matched
        .link_comment
        .clone()
        .unwrap_or_else(|| default_comment(&matched.root, trade_type));

    Chain {
        chain_id,
        account: matched.nickname.clone(),
        root: matched.root.clone(),
        transaction_ids,
        order_ids,
        min_date,
        max_date,
        status: matched.status,
        trade_type,
        category: None,
        comment,
    }
}

/// Default comment for chains with no manual note.
pub fn default_comment(root: &str, shape: TradeShape) -> String {
    format!("{root} {shape}")
}
