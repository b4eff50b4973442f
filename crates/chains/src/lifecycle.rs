//! Chain lifecycle: the finalize step.
//!
//! Finalizing stamps a closed chain with a category label, moving it
//! from "closed" to "reviewed and filed". The label persists as an
//! override, so it survives every later recomputation.

use journal_core::{Chain, ChainStatus, Error, Result};

/// Stamp a closed chain with its category label.
///
/// Fails with a precondition error when the chain is still active or
/// the label is blank; the chain is left unchanged on failure.
pub fn finalize(chain: &mut Chain, category: impl Into<String>) -> Result<()> {
    let category = category.into();
    if category.trim().is_empty() {
        return Err(Error::precondition(format!(
            "cannot finalize chain {} with an empty category",
            chain.chain_id
        )));
    }
    if chain.status != ChainStatus::Closed {
        return Err(Error::precondition(format!(
            "cannot finalize chain {}: status is not CLOSED",
            chain.chain_id
        )));
    }
    chain.category = Some(category);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use journal_core::TradeShape;

    fn make_chain(status: ChainStatus) -> Chain {
        Chain {
            chain_id: "main.240102_100000.XYZ".to_string(),
            account: "main".to_string(),
            root: "XYZ".to_string(),
            transaction_ids: vec!["t1".to_string(), "t2".to_string()],
            order_ids: vec![],
            min_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            max_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            status,
            trade_type: TradeShape::Single,
            category: None,
            comment: "XYZ Single".to_string(),
        }
    }

    #[test]
    fn test_finalize_closed_chain() {
        let mut chain = make_chain(ChainStatus::Closed);
        finalize(&mut chain, "Earnings").unwrap();
        assert_eq!(chain.category.as_deref(), Some("Earnings"));
    }

    #[test]
    fn test_finalize_active_chain_fails_unchanged() {
        let mut chain = make_chain(ChainStatus::Active);
        let err = finalize(&mut chain, "Earnings").unwrap_err();
        assert_eq!(err.kind(), "precondition");
        assert_eq!(chain.category, None);
        assert_eq!(chain.status, ChainStatus::Active);
    }

    #[test]
    fn test_finalize_blank_category_fails() {
        let mut chain = make_chain(ChainStatus::Closed);
        let err = finalize(&mut chain, "  ").unwrap_err();
        assert_eq!(err.kind(), "precondition");
        assert_eq!(chain.category, None);
    }

    #[test]
    fn test_finalize_relabel_overwrites() {
        let mut chain = make_chain(ChainStatus::Closed);
        finalize(&mut chain, "Earnings").unwrap();
        finalize(&mut chain, "Income").unwrap();
        assert_eq!(chain.category.as_deref(), Some("Income"));
    }
}
