//! Trade-shape classification from opening legs.
//!
//! The shape is a pure function of the legs opened on the chain's first
//! date: open-effect transactions netted per instrument. Unrecognized
//! structures fall to `Other` rather than guessing.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use journal_core::instrument::ContractMonth;
use journal_core::{ClassifiedTransaction, Instrument, OptionType, TradeShape, TxnEffect};
use rust_decimal::prelude::Signed;
use rust_decimal::Decimal;

/// One netted opening leg.
struct Leg {
    instrument: Instrument,
    net: Decimal,
}

/// Expiration bucket: explicit date, or contract month for futures
/// options quoted without one. Mixed buckets never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpiryBucket {
    Date(NaiveDate),
    Month(ContractMonth),
}

fn expiry_bucket(instrument: &Instrument) -> Option<ExpiryBucket> {
    match instrument.expiration() {
        Some(date) => Some(ExpiryBucket::Date(date)),
        None => instrument.month().map(ExpiryBucket::Month),
    }
}

/// Classify the structural shape of a chain's opening legs.
pub fn classify_shape(txns: &[ClassifiedTransaction]) -> TradeShape {
    let legs = opening_legs(txns);
    match legs.len() {
        1 => TradeShape::Single,
        2 => classify_pair(&legs),
        4 => classify_condor(&legs),
        _ => TradeShape::Other,
    }
}

/// Net the open-effect transactions of the first date per instrument.
fn opening_legs(txns: &[ClassifiedTransaction]) -> Vec<Leg> {
    let first_date = match txns.iter().map(|ct| ct.txn.date()).min() {
        Some(date) => date,
        None => return Vec::new(),
    };
    let mut nets: BTreeMap<String, Leg> = BTreeMap::new();
    for ct in txns {
        if ct.txn.date() != first_date || ct.txn.effect != TxnEffect::Open {
            continue;
        }
        let leg = nets.entry(ct.txn.symbol()).or_insert_with(|| Leg {
            instrument: ct.txn.instrument.clone(),
            net: Decimal::ZERO,
        });
        leg.net += ct.txn.quantity;
    }
    nets.into_values().filter(|leg| !leg.net.is_zero()).collect()
}

fn classify_pair(legs: &[Leg]) -> TradeShape {
    let (a, b) = (&legs[0], &legs[1]);
    let ((type_a, strike_a), (type_b, strike_b)) =
        match (a.instrument.option_leg(), b.instrument.option_leg()) {
            (Some(x), Some(y)) => (x, y),
            _ => return TradeShape::Other,
        };
    match (expiry_bucket(&a.instrument), expiry_bucket(&b.instrument)) {
        (Some(x), Some(y)) if x == y => {}
        _ => return TradeShape::Other,
    }

    if type_a == type_b {
        // Same type: a vertical takes opposite sides at distinct strikes.
        if a.net.signum() != b.net.signum() && strike_a != strike_b {
            TradeShape::Vertical
        } else {
            TradeShape::Other
        }
    } else if a.net.signum() == b.net.signum() {
        // Call plus put on the same side.
        if strike_a == strike_b {
            TradeShape::Straddle
        } else {
            TradeShape::Strangle
        }
    } else {
        TradeShape::Other
    }
}

fn classify_condor(legs: &[Leg]) -> TradeShape {
    // One long and one short leg of each option type, one expiration,
    // four distinct strikes.
    let mut calls: Vec<&Leg> = Vec::new();
    let mut puts: Vec<&Leg> = Vec::new();
    let mut buckets = Vec::new();
    let mut strikes = Vec::new();
    for leg in legs {
        let (option_type, strike) = match leg.instrument.option_leg() {
            Some(pair) => pair,
            None => return TradeShape::Other,
        };
        match option_type {
            OptionType::Call => calls.push(leg),
            OptionType::Put => puts.push(leg),
        }
        match expiry_bucket(&leg.instrument) {
            Some(bucket) => buckets.push(bucket),
            None => return TradeShape::Other,
        }
        strikes.push(strike);
    }
    if calls.len() != 2 || puts.len() != 2 {
        return TradeShape::Other;
    }
    if buckets.windows(2).any(|w| w[0] != w[1]) {
        return TradeShape::Other;
    }
    strikes.sort();
    strikes.dedup();
    if strikes.len() != 4 {
        return TradeShape::Other;
    }
    let balanced =
        |pair: &[&Leg]| pair[0].net.signum() + pair[1].net.signum() == Decimal::ZERO;
    if balanced(&calls) && balanced(&puts) {
        TradeShape::IronCondor
    } else {
        TradeShape::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use journal_core::{Transaction, TxnSide};
    use rust_decimal_macros::dec;

    fn make_classified(
        id: &str,
        symbol: &str,
        datetime: &str,
        quantity: Decimal,
        effect: TxnEffect,
    ) -> ClassifiedTransaction {
        let instrument = Instrument::parse(symbol).unwrap();
        let root = instrument.product().to_string();
        let class = instrument.class();
        let expiration = instrument.expiration();
        ClassifiedTransaction {
            txn: Transaction {
                id: id.to_string(),
                account: "x1".to_string(),
                order_id: None,
                datetime: NaiveDateTime::parse_from_str(datetime, "%Y-%m-%d %H:%M:%S").unwrap(),
                instrument,
                side: if quantity >= Decimal::ZERO {
                    TxnSide::Buy
                } else {
                    TxnSide::Sell
                },
                quantity,
                price: dec!(1),
                effect,
            },
            root,
            class,
            expiration,
            underlying_month: None,
        }
    }

    fn open(id: &str, symbol: &str, quantity: Decimal) -> ClassifiedTransaction {
        make_classified(id, symbol, "2024-01-02 10:00:00", quantity, TxnEffect::Open)
    }

    #[test]
    fn test_single() {
        assert_eq!(classify_shape(&[open("t1", "XYZ", dec!(100))]), TradeShape::Single);
        assert_eq!(
            classify_shape(&[open("t1", "XYZ_240119_C150", dec!(-1))]),
            TradeShape::Single
        );
    }

    #[test]
    fn test_vertical() {
        let legs = [
            open("t1", "XYZ_240119_C150", dec!(1)),
            open("t2", "XYZ_240119_C155", dec!(-1)),
        ];
        assert_eq!(classify_shape(&legs), TradeShape::Vertical);
    }

    #[test]
    fn test_strangle_and_straddle() {
        let strangle = [
            open("t1", "XYZ_240119_P95", dec!(-1)),
            open("t2", "XYZ_240119_C105", dec!(-1)),
        ];
        assert_eq!(classify_shape(&strangle), TradeShape::Strangle);

        let straddle = [
            open("t1", "XYZ_240119_P100", dec!(-1)),
            open("t2", "XYZ_240119_C100", dec!(-1)),
        ];
        assert_eq!(classify_shape(&straddle), TradeShape::Straddle);
    }

    #[test]
    fn test_iron_condor() {
        let legs = [
            open("t1", "XYZ_240119_P90", dec!(1)),
            open("t2", "XYZ_240119_P95", dec!(-1)),
            open("t3", "XYZ_240119_C105", dec!(-1)),
            open("t4", "XYZ_240119_C110", dec!(1)),
        ];
        assert_eq!(classify_shape(&legs), TradeShape::IronCondor);
    }

    #[test]
    fn test_calendar_is_other() {
        let legs = [
            open("t1", "XYZ_240119_C150", dec!(-1)),
            open("t2", "XYZ_240216_C150", dec!(1)),
        ];
        assert_eq!(classify_shape(&legs), TradeShape::Other);
    }

    #[test]
    fn test_same_side_same_type_is_other() {
        let legs = [
            open("t1", "XYZ_240119_C150", dec!(1)),
            open("t2", "XYZ_240119_C155", dec!(1)),
        ];
        assert_eq!(classify_shape(&legs), TradeShape::Other);
    }

    #[test]
    fn test_opened_by_close_is_other() {
        // A chain opened by a closing transaction has no opening legs.
        let legs = [make_classified(
            "t1",
            "XYZ",
            "2024-01-02 10:00:00",
            dec!(-100),
            TxnEffect::Close,
        )];
        assert_eq!(classify_shape(&legs), TradeShape::Other);
    }

    #[test]
    fn test_futures_option_month_bucket() {
        // No explicit expiry date; the contract month is the bucket.
        let legs = [
            open("t1", "/OZCH24_C450", dec!(1)),
            open("t2", "/OZCH24_C460", dec!(-1)),
        ];
        assert_eq!(classify_shape(&legs), TradeShape::Vertical);

        let mixed = [
            open("t1", "/OZCH24_C450", dec!(1)),
            open("t2", "/OZCK24_C460", dec!(-1)),
        ];
        assert_eq!(classify_shape(&mixed), TradeShape::Other);
    }

    #[test]
    fn test_later_legs_do_not_change_shape() {
        // Only first-date opens count; the later add is ignored.
        let legs = [
            open("t1", "XYZ_240119_P95", dec!(-1)),
            open("t2", "XYZ_240119_C105", dec!(-1)),
            make_classified(
                "t3",
                "XYZ_240119_C110",
                "2024-01-05 10:00:00",
                dec!(-1),
                TxnEffect::Open,
            ),
        ];
        assert_eq!(classify_shape(&legs), TradeShape::Strangle);
    }

    #[test]
    fn test_same_instrument_nets_to_one_leg() {
        let legs = [
            open("t1", "XYZ_240119_C150", dec!(1)),
            open("t2", "XYZ_240119_C150", dec!(2)),
        ];
        assert_eq!(classify_shape(&legs), TradeShape::Single);
    }
}
