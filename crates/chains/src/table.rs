//! Transaction index and per-instrument position book.

use std::collections::{BTreeMap, HashMap};

use journal_core::Transaction;
use rust_decimal::Decimal;

/// Lookup over a batch's transactions by id.
#[derive(Debug, Default)]
pub struct TransactionIndex {
    by_id: HashMap<String, Transaction>,
}

impl TransactionIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a transaction; returns false when the id is already taken.
    pub fn insert(&mut self, txn: &Transaction) -> bool {
        if self.by_id.contains_key(&txn.id) {
            return false;
        }
        self.by_id.insert(txn.id.clone(), txn.clone());
        true
    }

    /// Look up a transaction by id.
    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.by_id.get(id)
    }

    /// Number of indexed transactions.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True when nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Running per-instrument position for one chain.
///
/// Keys are canonical symbols; entries are removed as they return to
/// exactly zero, so a flat book is an empty book. Tracking instruments
/// separately is what keeps a long-call/short-put pair from looking
/// closed when the raw quantities happen to cancel.
#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    positions: BTreeMap<String, Decimal>,
}

impl PositionBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a signed quantity to an instrument.
    pub fn apply(&mut self, symbol: &str, quantity: Decimal) {
        let net = {
            let entry = self
                .positions
                .entry(symbol.to_string())
                .or_insert(Decimal::ZERO);
            *entry += quantity;
            *entry
        };
        if net.is_zero() {
            self.positions.remove(symbol);
        }
    }

    /// True when every instrument nets to exactly zero.
    pub fn is_flat(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of instruments holding a position.
    pub fn open_instruments(&self) -> usize {
        self.positions.len()
    }

    /// Net position for one instrument.
    pub fn net(&self, symbol: &str) -> Decimal {
        self.positions.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use journal_core::{Instrument, TxnEffect, TxnSide};
    use rust_decimal_macros::dec;

    fn make_txn(id: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            account: "x1234".to_string(),
            order_id: None,
            datetime: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            instrument: Instrument::Equity {
                root: "XYZ".to_string(),
            },
            side: TxnSide::Buy,
            quantity: dec!(1),
            price: dec!(1),
            effect: TxnEffect::Open,
        }
    }

    #[test]
    fn test_book_zero_removal() {
        let mut book = PositionBook::new();
        book.apply("XYZ", dec!(2));
        assert!(!book.is_flat());
        assert_eq!(book.net("XYZ"), dec!(2));

        book.apply("XYZ", dec!(-2));
        assert!(book.is_flat());
        assert_eq!(book.net("XYZ"), dec!(0));
        assert_eq!(book.open_instruments(), 0);
    }

    #[test]
    fn test_book_tracks_instruments_separately() {
        // Raw quantities cancel but the book is not flat.
        let mut book = PositionBook::new();
        book.apply("XYZ_240119_C150", dec!(1));
        book.apply("XYZ_240119_P140", dec!(-1));
        assert!(!book.is_flat());
        assert_eq!(book.open_instruments(), 2);
    }

    #[test]
    fn test_book_partial_reduction() {
        let mut book = PositionBook::new();
        book.apply("XYZ", dec!(2));
        book.apply("XYZ", dec!(-1));
        assert!(!book.is_flat());
        assert_eq!(book.net("XYZ"), dec!(1));
    }

    #[test]
    fn test_index_rejects_duplicate_ids() {
        let mut index = TransactionIndex::new();
        assert!(index.insert(&make_txn("t1")));
        assert!(!index.insert(&make_txn("t1")));
        assert_eq!(index.len(), 1);
        assert!(index.get("t1").is_some());
        assert!(index.get("t2").is_none());
    }
}
