//! Raw-row normalization.
//!
//! Turns importer rows (all-optional text) into canonical transactions.
//! Per-row failures are accumulated instead of aborting the batch, so one
//! bad row never blocks a journal run.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use journal_core::{Error, Instrument, RawRecord, Result, Transaction, TxnEffect, TxnSide};

/// One rejected input row.
#[derive(Debug)]
pub struct RejectedRow {
    /// Zero-based row index in the input batch.
    pub row: usize,
    /// Transaction id, when the row carried one.
    pub id: Option<String>,
    /// Why the row was rejected.
    pub error: Error,
}

/// Result of normalizing a batch of raw rows.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    /// Canonical transactions in input order.
    pub transactions: Vec<Transaction>,
    /// Rows that failed validation.
    pub rejected: Vec<RejectedRow>,
}

/// Normalize a batch of raw rows, preserving input order.
pub fn normalize(rows: &[RawRecord]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    for (row, record) in rows.iter().enumerate() {
        match normalize_record(record) {
            Ok(txn) => batch.transactions.push(txn),
            Err(error) => {
                tracing::debug!(row, %error, "rejected input row");
                batch.rejected.push(RejectedRow {
                    row,
                    id: record.id.clone(),
                    error,
                });
            }
        }
    }
    batch
}

/// Normalize a single raw row into a canonical transaction.
pub fn normalize_record(record: &RawRecord) -> Result<Transaction> {
    let id = require(&record.id, "id")?;
    let account = require(&record.account, "account")?;
    let datetime = parse_datetime(require(&record.datetime, "datetime")?)?;
    let instrument = Instrument::parse(require(&record.symbol, "symbol")?)?;
    let side = parse_side(require(&record.side, "side")?)?;
    let effect = parse_effect(require(&record.effect, "effect")?)?;
    let quantity = parse_quantity(require(&record.quantity, "quantity")?)? * side.sign();
    let price = parse_price(record, effect)?;
    let order_id = record.order_id.clone().filter(|s| !s.is_empty());

    Ok(Transaction {
        id: id.to_string(),
        account: account.to_string(),
        order_id,
        datetime,
        instrument,
        side,
        quantity,
        price,
        effect,
    })
}

fn require<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str> {
    match field.as_deref() {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(Error::validation(format!("missing {name}"))),
    }
}

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| Error::validation(format!("unparseable datetime {s:?}")))
}

fn parse_side(s: &str) -> Result<TxnSide> {
    match s.to_ascii_uppercase().as_str() {
        "BUY" | "B" => Ok(TxnSide::Buy),
        "SELL" | "S" => Ok(TxnSide::Sell),
        other => Err(Error::validation(format!("unknown side {other:?}"))),
    }
}

fn parse_effect(s: &str) -> Result<TxnEffect> {
    match s.to_ascii_uppercase().as_str() {
        "OPEN" | "OPENING" => Ok(TxnEffect::Open),
        "CLOSE" | "CLOSING" => Ok(TxnEffect::Close),
        "EXPIRE" | "EXPIRATION" => Ok(TxnEffect::Expire),
        "ASSIGN" | "ASSIGNMENT" => Ok(TxnEffect::Assign),
        "EXERCISE" => Ok(TxnEffect::Exercise),
        other => Err(Error::validation(format!("unknown effect {other:?}"))),
    }
}

/// Quantities arrive unsigned; the sign comes from the side.
fn parse_quantity(s: &str) -> Result<Decimal> {
    let qty: Decimal = s
        .parse()
        .map_err(|_| Error::validation(format!("unparseable quantity {s:?}")))?;
    if qty.is_zero() {
        return Err(Error::validation("zero quantity"));
    }
    Ok(qty.abs())
}

/// Price is required for opens and closes; expirations, assignments and
/// exercises are position events and default to zero.
fn parse_price(record: &RawRecord, effect: TxnEffect) -> Result<Decimal> {
    match record.price.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => {
            let price: Decimal = s
                .parse()
                .map_err(|_| Error::validation(format!("unparseable price {s:?}")))?;
            if price < Decimal::ZERO {
                return Err(Error::validation(format!("negative price {s:?}")));
            }
            Ok(price)
        }
        None if matches!(effect, TxnEffect::Open | TxnEffect::Close) => Err(Error::validation(
            format!("missing price for {effect:?} transaction"),
        )),
        None => Ok(Decimal::ZERO),
    }
}
