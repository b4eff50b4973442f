//! Instrument classification: deriving the grouping root.
//!
//! Equities and equity options root at the underlying symbol; futures
//! root at the slash-prefixed product; futures options resolve through
//! the configured month mapping to the underlying future product, since
//! an option month may deliver a differently-dated contract.

use std::collections::HashMap;

use journal_core::instrument::ContractMonth;
use journal_core::{
    ClassifiedTransaction, Error, FutOptMonthMapping, Instrument, InstrumentClass, Result,
    Transaction,
};

/// Statistics about classification quality.
#[derive(Debug, Clone, Default)]
pub struct ClassificationStats {
    /// Total transactions seen.
    pub total: u64,
    /// Equity transactions.
    pub equities: u64,
    /// Equity option transactions.
    pub equity_options: u64,
    /// Futures transactions.
    pub futures: u64,
    /// Futures option transactions.
    pub futures_options: u64,
    /// Futures options resolved through an explicit mapping entry.
    pub mapped: u64,
    /// Futures options resolved by the strip-`O` default rule.
    pub defaulted: u64,
    /// Transactions that failed classification.
    pub unmapped: u64,
}

/// Classifier resolving transactions to their grouping root.
#[derive(Debug)]
pub struct InstrumentClassifier {
    /// (option product, option month) -> (future product, future month).
    months: HashMap<(String, ContractMonth), (String, ContractMonth)>,
    /// Classification statistics.
    stats: ClassificationStats,
}

impl InstrumentClassifier {
    /// Build a classifier from the configured month mapping.
    ///
    /// A malformed entry is a configuration error: the mapping is
    /// user-owned state and must be fixed, not skipped.
    pub fn new(mapping: &FutOptMonthMapping) -> Result<Self> {
        let mut months = HashMap::with_capacity(mapping.months.len());
        for item in &mapping.months {
            let option_month = ContractMonth::parse(&item.option_month).map_err(|_| {
                Error::config(format!(
                    "bad option_month {:?} for product {:?}",
                    item.option_month, item.option_product
                ))
            })?;
            let future_month = ContractMonth::parse(&item.future_month).map_err(|_| {
                Error::config(format!(
                    "bad future_month {:?} for product {:?}",
                    item.future_month, item.option_product
                ))
            })?;
            months.insert(
                (item.option_product.clone(), option_month),
                (item.future_product.clone(), future_month),
            );
        }
        Ok(Self {
            months,
            stats: ClassificationStats::default(),
        })
    }

    /// Classify a single transaction.
    ///
    /// Failure excludes the transaction from matching; a wrong root would
    /// corrupt grouping, so there is no silent fallback.
    pub fn classify(&mut self, txn: &Transaction) -> Result<ClassifiedTransaction> {
        self.stats.total += 1;
        let class = txn.instrument.class();
        let (root, underlying_month) = match &txn.instrument {
            Instrument::Equity { root } => (root.clone(), None),
            Instrument::EquityOption { underlying, .. } => (underlying.clone(), None),
            Instrument::Future { product, .. } => (format!("/{product}"), None),
            Instrument::FuturesOption { product, month, .. } => {
                match self.resolve_future(product, *month) {
                    Ok((future_product, future_month)) => {
                        (format!("/{future_product}"), Some(future_month))
                    }
                    Err(error) => {
                        self.stats.unmapped += 1;
                        return Err(error);
                    }
                }
            }
        };
        match class {
            InstrumentClass::Equity => self.stats.equities += 1,
            InstrumentClass::EquityOption => self.stats.equity_options += 1,
            InstrumentClass::Future => self.stats.futures += 1,
            InstrumentClass::FuturesOption => self.stats.futures_options += 1,
        }
        Ok(ClassifiedTransaction {
            expiration: txn.instrument.expiration(),
            txn: txn.clone(),
            root,
            class,
            underlying_month,
        })
    }

    /// Classify a batch, splitting failures out for the run report.
    pub fn classify_batch(
        &mut self,
        txns: Vec<Transaction>,
    ) -> (Vec<ClassifiedTransaction>, Vec<(Transaction, Error)>) {
        let mut classified = Vec::with_capacity(txns.len());
        let mut failed = Vec::new();
        for txn in txns {
            match self.classify(&txn) {
                Ok(ct) => classified.push(ct),
                Err(error) => failed.push((txn, error)),
            }
        }
        (classified, failed)
    }

    /// Resolve a futures-option (product, month) to its underlying future.
    fn resolve_future(
        &mut self,
        product: &str,
        month: ContractMonth,
    ) -> Result<(String, ContractMonth)> {
        if let Some((future_product, future_month)) =
            self.months.get(&(product.to_string(), month))
        {
            self.stats.mapped += 1;
            return Ok((future_product.clone(), *future_month));
        }
        // Default rule: an `O`-prefixed option product trades against the
        // same-month future (OZC -> ZC).
        if let Some(stripped) = product.strip_prefix('O') {
            if !stripped.is_empty() {
                self.stats.defaulted += 1;
                return Ok((stripped.to_string(), month));
            }
        }
        Err(Error::unmapped(product, month.to_string()))
    }

    /// Get classification statistics.
    pub fn stats(&self) -> &ClassificationStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use journal_core::config::MonthMappingItem;
    use journal_core::instrument::MonthCode;
    use journal_core::{TxnEffect, TxnSide};
    use rust_decimal_macros::dec;

    fn make_txn(id: &str, symbol: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            account: "x1234".to_string(),
            order_id: None,
            datetime: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            instrument: Instrument::parse(symbol).unwrap(),
            side: TxnSide::Buy,
            quantity: dec!(1),
            price: dec!(1),
            effect: TxnEffect::Open,
        }
    }

    fn make_mapping(items: &[(&str, &str, &str, &str)]) -> FutOptMonthMapping {
        FutOptMonthMapping {
            months: items
                .iter()
                .map(|(op, om, fp, fm)| MonthMappingItem {
                    option_product: op.to_string(),
                    option_month: om.to_string(),
                    future_product: fp.to_string(),
                    future_month: fm.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_classify_equity_and_option() {
        let mut classifier = InstrumentClassifier::new(&FutOptMonthMapping::default()).unwrap();

        let equity = classifier.classify(&make_txn("t1", "XYZ")).unwrap();
        assert_eq!(equity.root, "XYZ");
        assert_eq!(equity.class, InstrumentClass::Equity);

        let option = classifier
            .classify(&make_txn("t2", "XYZ_240119_C150"))
            .unwrap();
        assert_eq!(option.root, "XYZ");
        assert_eq!(option.class, InstrumentClass::EquityOption);
        assert_eq!(
            option.expiration,
            NaiveDate::from_ymd_opt(2024, 1, 19)
        );
    }

    #[test]
    fn test_classify_future() {
        let mut classifier = InstrumentClassifier::new(&FutOptMonthMapping::default()).unwrap();
        let classified = classifier.classify(&make_txn("t1", "/ZCH24")).unwrap();
        assert_eq!(classified.root, "/ZC");
        assert_eq!(classified.class, InstrumentClass::Future);
    }

    #[test]
    fn test_futures_option_explicit_mapping() {
        // A January option delivering the March contract.
        let mapping = make_mapping(&[("OZC", "F24", "ZC", "H24")]);
        let mut classifier = InstrumentClassifier::new(&mapping).unwrap();

        let classified = classifier
            .classify(&make_txn("t1", "/OZCF24_C450"))
            .unwrap();
        assert_eq!(classified.root, "/ZC");
        assert_eq!(
            classified.underlying_month,
            Some(ContractMonth {
                code: MonthCode::H,
                year: 2024
            })
        );
        assert_eq!(classifier.stats().mapped, 1);
    }

    #[test]
    fn test_futures_option_default_rule() {
        let mut classifier = InstrumentClassifier::new(&FutOptMonthMapping::default()).unwrap();
        let classified = classifier
            .classify(&make_txn("t1", "/OZCH24_C450"))
            .unwrap();
        assert_eq!(classified.root, "/ZC");
        assert_eq!(
            classified.underlying_month,
            Some(ContractMonth {
                code: MonthCode::H,
                year: 2024
            })
        );
        assert_eq!(classifier.stats().defaulted, 1);
    }

    #[test]
    fn test_unmapped_futures_option() {
        let mut classifier = InstrumentClassifier::new(&FutOptMonthMapping::default()).unwrap();
        let err = classifier
            .classify(&make_txn("t1", "/XWH24_C650"))
            .unwrap_err();
        assert!(matches!(err, Error::UnmappedInstrument { .. }));
        assert!(err.to_string().contains("XW"));
        assert!(err.to_string().contains("H24"));
        assert_eq!(classifier.stats().unmapped, 1);
    }

    #[test]
    fn test_malformed_mapping_is_config_error() {
        let mapping = make_mapping(&[("OZC", "JAN24", "ZC", "H24")]);
        let err = InstrumentClassifier::new(&mapping).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_classify_batch_splits_failures() {
        let mut classifier = InstrumentClassifier::new(&FutOptMonthMapping::default()).unwrap();
        let txns = vec![
            make_txn("t1", "XYZ"),
            make_txn("t2", "/XWH24_C650"),
            make_txn("t3", "/ZCH24"),
        ];
        let (classified, failed) = classifier.classify_batch(txns);
        assert_eq!(classified.len(), 2);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0.id, "t2");
    }
}
