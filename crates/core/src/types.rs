//! Core data types for the trade-journal system.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::instrument::{ContractMonth, Instrument, InstrumentClass};

/// A raw transaction row as delivered by an importer.
///
/// Every field is optional text; the normalizer decides what is usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    /// Stable transaction key.
    pub id: Option<String>,
    /// Account identifier.
    pub account: Option<String>,
    /// Fill timestamp text.
    pub datetime: Option<String>,
    /// Instrument symbol text.
    pub symbol: Option<String>,
    /// BUY or SELL.
    pub side: Option<String>,
    /// Unsigned quantity text.
    pub quantity: Option<String>,
    /// Per-unit price text.
    pub price: Option<String>,
    /// Position effect text.
    pub effect: Option<String>,
    /// Broker order key, shared by fills of one order.
    pub order_id: Option<String>,
}

/// Side of a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxnSide {
    Buy,
    Sell,
}

impl TxnSide {
    /// Sign applied to quantities: +1 for buys, -1 for sells.
    #[inline]
    pub fn sign(self) -> Decimal {
        match self {
            TxnSide::Buy => Decimal::ONE,
            TxnSide::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}

/// What a transaction does to the position it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxnEffect {
    /// Opens or extends a position.
    Open,
    /// Reduces or closes a position.
    Close,
    /// Option expired worthless.
    Expire,
    /// Short option assigned; delivery follows.
    Assign,
    /// Long option exercised; delivery follows.
    Exercise,
}

impl TxnEffect {
    /// Assignments and exercises convert quantity between instruments
    /// rather than ending the trade.
    #[inline]
    pub fn is_conversion(self) -> bool {
        matches!(self, TxnEffect::Assign | TxnEffect::Exercise)
    }
}

/// A single normalized fill or position event.
///
/// Immutable once normalized; downstream stages reference transactions
/// by id rather than copying them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Stable unique key within a run.
    pub id: String,
    /// Raw account identifier.
    pub account: String,
    /// Broker order key, when available.
    pub order_id: Option<String>,
    /// Local fill timestamp.
    pub datetime: NaiveDateTime,
    /// Parsed instrument descriptor.
    pub instrument: Instrument,
    /// Side of the fill.
    pub side: TxnSide,
    /// Signed quantity: positive for buys, negative for sells.
    pub quantity: Decimal,
    /// Per-unit price; zero for expirations, assignments and exercises.
    pub price: Decimal,
    /// Position effect.
    pub effect: TxnEffect,
}

impl Transaction {
    /// Calendar date of the fill.
    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }

    /// Canonical symbol, used as the per-instrument position key.
    pub fn symbol(&self) -> String {
        self.instrument.to_string()
    }

    /// Cash flow of this fill: negative when paying, positive when
    /// collecting. Per unit, no contract multipliers.
    #[inline]
    pub fn cash(&self) -> Decimal {
        -self.quantity * self.price
    }
}

/// A transaction with its derived grouping facts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedTransaction {
    /// Original transaction.
    pub txn: Transaction,
    /// Root symbol keying the (account, root) group; futures roots keep
    /// the leading slash.
    pub root: String,
    /// Broad instrument classification.
    pub class: InstrumentClass,
    /// Option expiration date, when known from the symbol.
    pub expiration: Option<NaiveDate>,
    /// Mapped underlying future month, for futures options.
    pub underlying_month: Option<ContractMonth>,
}

/// Whether a chain still holds a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChainStatus {
    /// Position still open at the end of the batch.
    Active,
    /// Every per-instrument quantity returned to zero.
    Closed,
}

/// Structural classification of a chain's opening legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeShape {
    /// One leg.
    Single,
    /// Two same-type option legs, opposite sides, distinct strikes.
    Vertical,
    /// Call and put, same side, distinct strikes.
    Strangle,
    /// Call and put, same side, equal strike.
    Straddle,
    /// Four option legs, one long and one short of each type.
    IronCondor,
    /// Anything else.
    Other,
}

impl TradeShape {
    /// Label used in default comments.
    pub fn as_str(self) -> &'static str {
        match self {
            TradeShape::Single => "Single",
            TradeShape::Vertical => "Vertical",
            TradeShape::Strangle => "Strangle",
            TradeShape::Straddle => "Straddle",
            TradeShape::IronCondor => "IronCondor",
            TradeShape::Other => "Other",
        }
    }
}

impl fmt::Display for TradeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chain: the record of one trade from first open to final close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    /// Deterministic identifier: `{account}.{yymmdd_hhmmss}.{root}`.
    pub chain_id: String,
    /// Account nickname, or the raw id when no nickname is configured.
    pub account: String,
    /// Root symbol shared by the members.
    pub root: String,
    /// Member transaction ids in date order.
    pub transaction_ids: Vec<String>,
    /// Member order ids, first-appearance order, deduplicated.
    pub order_ids: Vec<String>,
    /// Date of the earliest member.
    pub min_date: NaiveDate,
    /// Date of the latest member.
    pub max_date: NaiveDate,
    /// Position status at the end of the batch.
    pub status: ChainStatus,
    /// Structural shape of the opening legs.
    pub trade_type: TradeShape,
    /// Free-form label set by the finalizer, e.g. "Earnings".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Narrative comment.
    pub comment: String,
}

impl Chain {
    /// Inclusive calendar span in days.
    pub fn span_days(&self) -> i64 {
        (self.max_date - self.min_date).num_days() + 1
    }

    /// Number of member transactions.
    pub fn txn_count(&self) -> usize {
        self.transaction_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_txn(quantity: Decimal, price: Decimal) -> Transaction {
        Transaction {
            id: "t1".to_string(),
            account: "x1234".to_string(),
            order_id: None,
            datetime: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            instrument: Instrument::Equity {
                root: "XYZ".to_string(),
            },
            side: if quantity >= Decimal::ZERO {
                TxnSide::Buy
            } else {
                TxnSide::Sell
            },
            quantity,
            price,
            effect: TxnEffect::Open,
        }
    }

    #[test]
    fn test_side_sign() {
        assert_eq!(TxnSide::Buy.sign(), dec!(1));
        assert_eq!(TxnSide::Sell.sign(), dec!(-1));
    }

    #[test]
    fn test_effect_conversion() {
        assert!(TxnEffect::Assign.is_conversion());
        assert!(TxnEffect::Exercise.is_conversion());
        assert!(!TxnEffect::Close.is_conversion());
        assert!(!TxnEffect::Expire.is_conversion());
    }

    #[test]
    fn test_transaction_cash() {
        // Buying costs money, selling collects it.
        assert_eq!(make_txn(dec!(2), dec!(5)).cash(), dec!(-10));
        assert_eq!(make_txn(dec!(-2), dec!(5)).cash(), dec!(10));
    }

    #[test]
    fn test_chain_span_days() {
        let chain = Chain {
            chain_id: "main.240102_103000.XYZ".to_string(),
            account: "main".to_string(),
            root: "XYZ".to_string(),
            transaction_ids: vec!["t1".to_string()],
            order_ids: vec![],
            min_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            max_date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            status: ChainStatus::Closed,
            trade_type: TradeShape::Single,
            category: None,
            comment: String::new(),
        };
        assert_eq!(chain.span_days(), 2);
        assert_eq!(chain.txn_count(), 1);
    }

    #[test]
    fn test_chain_status_serde_uppercase() {
        assert_eq!(
            serde_json::to_string(&ChainStatus::Active).unwrap(),
            "\"ACTIVE\""
        );
        assert_eq!(
            serde_json::from_str::<ChainStatus>("\"CLOSED\"").unwrap(),
            ChainStatus::Closed
        );
    }
}
