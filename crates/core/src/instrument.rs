//! Instrument symbology: parsing and canonical rendering of symbols.
//!
//! Four instrument kinds are supported:
//! - Equity:          `XYZ`
//! - Equity option:   `XYZ_240119_C150` (underlying, yymmdd expiry, C|P strike)
//! - Future:          `/ZCH24` (slash, product, month code, two-digit year)
//! - Futures option:  `/OZCH24_C450`, optionally `/OZCH24_240216_C450`
//!
//! The canonical rendering doubles as the per-instrument position key in
//! chain matching, so it must be stable: strikes are normalized (no
//! trailing zeros) and months always render as code plus two-digit year.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Futures month codes, January through December.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonthCode {
    F,
    G,
    H,
    J,
    K,
    M,
    N,
    Q,
    U,
    V,
    X,
    Z,
}

impl MonthCode {
    /// Parse a single month-code letter.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'F' => Some(MonthCode::F),
            'G' => Some(MonthCode::G),
            'H' => Some(MonthCode::H),
            'J' => Some(MonthCode::J),
            'K' => Some(MonthCode::K),
            'M' => Some(MonthCode::M),
            'N' => Some(MonthCode::N),
            'Q' => Some(MonthCode::Q),
            'U' => Some(MonthCode::U),
            'V' => Some(MonthCode::V),
            'X' => Some(MonthCode::X),
            'Z' => Some(MonthCode::Z),
            _ => None,
        }
    }

    /// The code letter.
    pub fn as_char(self) -> char {
        match self {
            MonthCode::F => 'F',
            MonthCode::G => 'G',
            MonthCode::H => 'H',
            MonthCode::J => 'J',
            MonthCode::K => 'K',
            MonthCode::M => 'M',
            MonthCode::N => 'N',
            MonthCode::Q => 'Q',
            MonthCode::U => 'U',
            MonthCode::V => 'V',
            MonthCode::X => 'X',
            MonthCode::Z => 'Z',
        }
    }

    /// Calendar month number, 1 through 12.
    pub fn month_number(self) -> u32 {
        match self {
            MonthCode::F => 1,
            MonthCode::G => 2,
            MonthCode::H => 3,
            MonthCode::J => 4,
            MonthCode::K => 5,
            MonthCode::M => 6,
            MonthCode::N => 7,
            MonthCode::Q => 8,
            MonthCode::U => 9,
            MonthCode::V => 10,
            MonthCode::X => 11,
            MonthCode::Z => 12,
        }
    }
}

/// A futures contract month, e.g. `H24` for March 2024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractMonth {
    /// Month code letter.
    pub code: MonthCode,
    /// Full contract year.
    pub year: u16,
}

impl ContractMonth {
    /// Parse a month string such as `H24`.
    pub fn parse(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        let code = chars
            .next()
            .and_then(MonthCode::from_char)
            .ok_or_else(|| Error::validation(format!("invalid contract month {s:?}")))?;
        let rest = chars.as_str();
        if rest.len() != 2 || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::validation(format!("invalid contract month {s:?}")));
        }
        let yy: u16 = rest
            .parse()
            .map_err(|_| Error::validation(format!("invalid contract month {s:?}")))?;
        Ok(ContractMonth {
            code,
            year: 2000 + yy,
        })
    }
}

impl fmt::Display for ContractMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.code.as_char(), self.year % 100)
    }
}

/// Option type: call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Parse a C/P letter.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'C' => Some(OptionType::Call),
            'P' => Some(OptionType::Put),
            _ => None,
        }
    }

    /// The C/P letter.
    pub fn as_char(self) -> char {
        match self {
            OptionType::Call => 'C',
            OptionType::Put => 'P',
        }
    }
}

/// Broad instrument classification used for grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentClass {
    Equity,
    EquityOption,
    Future,
    FuturesOption,
}

impl InstrumentClass {
    /// Whether this class is an option.
    pub fn is_option(self) -> bool {
        matches!(
            self,
            InstrumentClass::EquityOption | InstrumentClass::FuturesOption
        )
    }
}

/// A parsed instrument descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instrument {
    /// Plain stock or ETF.
    Equity {
        /// Root symbol.
        root: String,
    },
    /// Listed option on an equity.
    EquityOption {
        /// Underlying root symbol.
        underlying: String,
        /// Expiration date.
        expiration: NaiveDate,
        /// Call or put.
        option_type: OptionType,
        /// Strike price, normalized.
        strike: Decimal,
    },
    /// Futures contract.
    Future {
        /// Product code without the slash, e.g. "ZC".
        product: String,
        /// Contract month.
        month: ContractMonth,
    },
    /// Option on a futures contract.
    FuturesOption {
        /// Option product code without the slash, e.g. "OZC".
        product: String,
        /// Option contract month.
        month: ContractMonth,
        /// Expiration date when the symbol carries one.
        expiration: Option<NaiveDate>,
        /// Call or put.
        option_type: OptionType,
        /// Strike price, normalized.
        strike: Decimal,
    },
}

impl Instrument {
    /// Parse a symbol string into an instrument descriptor.
    pub fn parse(symbol: &str) -> Result<Self> {
        if symbol.is_empty() {
            return Err(Error::validation("empty symbol"));
        }
        if !symbol.is_ascii() {
            return Err(Error::validation(format!("non-ascii symbol {symbol:?}")));
        }
        match symbol.strip_prefix('/') {
            Some(rest) => Self::parse_futures(symbol, rest),
            None => Self::parse_equity(symbol),
        }
    }

    fn parse_equity(symbol: &str) -> Result<Self> {
        let parts: Vec<&str> = symbol.split('_').collect();
        match parts.as_slice() {
            [root] => {
                parse_root(symbol, root)?;
                Ok(Instrument::Equity {
                    root: (*root).to_string(),
                })
            }
            [underlying, expiry, tail] => {
                parse_root(symbol, underlying)?;
                let expiration = parse_expiry(symbol, expiry)?;
                let (option_type, strike) = parse_option_tail(symbol, tail)?;
                Ok(Instrument::EquityOption {
                    underlying: (*underlying).to_string(),
                    expiration,
                    option_type,
                    strike,
                })
            }
            _ => Err(Error::validation(format!(
                "unrecognized symbol {symbol:?}"
            ))),
        }
    }

    fn parse_futures(symbol: &str, rest: &str) -> Result<Self> {
        let parts: Vec<&str> = rest.split('_').collect();
        match parts.as_slice() {
            [contract] => {
                let (product, month) = parse_contract(symbol, contract)?;
                Ok(Instrument::Future { product, month })
            }
            [contract, tail] => {
                let (product, month) = parse_contract(symbol, contract)?;
                let (option_type, strike) = parse_option_tail(symbol, tail)?;
                Ok(Instrument::FuturesOption {
                    product,
                    month,
                    expiration: None,
                    option_type,
                    strike,
                })
            }
            [contract, expiry, tail] => {
                let (product, month) = parse_contract(symbol, contract)?;
                let expiration = parse_expiry(symbol, expiry)?;
                let (option_type, strike) = parse_option_tail(symbol, tail)?;
                Ok(Instrument::FuturesOption {
                    product,
                    month,
                    expiration: Some(expiration),
                    option_type,
                    strike,
                })
            }
            _ => Err(Error::validation(format!(
                "unrecognized symbol {symbol:?}"
            ))),
        }
    }

    /// Broad classification of this instrument.
    pub fn class(&self) -> InstrumentClass {
        match self {
            Instrument::Equity { .. } => InstrumentClass::Equity,
            Instrument::EquityOption { .. } => InstrumentClass::EquityOption,
            Instrument::Future { .. } => InstrumentClass::Future,
            Instrument::FuturesOption { .. } => InstrumentClass::FuturesOption,
        }
    }

    /// Underlying product or root symbol, without the futures slash.
    pub fn product(&self) -> &str {
        match self {
            Instrument::Equity { root } => root,
            Instrument::EquityOption { underlying, .. } => underlying,
            Instrument::Future { product, .. } => product,
            Instrument::FuturesOption { product, .. } => product,
        }
    }

    /// Expiration date, when the symbol carries one.
    pub fn expiration(&self) -> Option<NaiveDate> {
        match self {
            Instrument::EquityOption { expiration, .. } => Some(*expiration),
            Instrument::FuturesOption { expiration, .. } => *expiration,
            _ => None,
        }
    }

    /// Contract month for futures and futures options.
    pub fn month(&self) -> Option<ContractMonth> {
        match self {
            Instrument::Future { month, .. } => Some(*month),
            Instrument::FuturesOption { month, .. } => Some(*month),
            _ => None,
        }
    }

    /// Call/put and strike for options.
    pub fn option_leg(&self) -> Option<(OptionType, Decimal)> {
        match self {
            Instrument::EquityOption {
                option_type, strike, ..
            } => Some((*option_type, *strike)),
            Instrument::FuturesOption {
                option_type, strike, ..
            } => Some((*option_type, *strike)),
            _ => None,
        }
    }

    /// Whether this instrument is an option.
    pub fn is_option(&self) -> bool {
        self.class().is_option()
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instrument::Equity { root } => write!(f, "{root}"),
            Instrument::EquityOption {
                underlying,
                expiration,
                option_type,
                strike,
            } => write!(
                f,
                "{underlying}_{}_{}{strike}",
                expiration.format("%y%m%d"),
                option_type.as_char(),
            ),
            Instrument::Future { product, month } => write!(f, "/{product}{month}"),
            Instrument::FuturesOption {
                product,
                month,
                expiration,
                option_type,
                strike,
            } => {
                write!(f, "/{product}{month}")?;
                if let Some(exp) = expiration {
                    write!(f, "_{}", exp.format("%y%m%d"))?;
                }
                write!(f, "_{}{strike}", option_type.as_char())
            }
        }
    }
}

fn parse_root(symbol: &str, root: &str) -> Result<()> {
    let valid = !root.is_empty()
        && root.starts_with(|c: char| c.is_ascii_alphabetic())
        && root.chars().all(|c| c.is_ascii_alphanumeric() || c == '.');
    if valid {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "invalid root in symbol {symbol:?}"
        )))
    }
}

/// Split a futures contract like `ZCH24` into product and month.
fn parse_contract(symbol: &str, contract: &str) -> Result<(String, ContractMonth)> {
    if contract.len() < 4 || !contract.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(Error::validation(format!(
            "invalid futures contract in symbol {symbol:?}"
        )));
    }
    let split = contract.len() - 3;
    let product = &contract[..split];
    let month = ContractMonth::parse(&contract[split..])
        .map_err(|_| Error::validation(format!("invalid contract month in symbol {symbol:?}")))?;
    parse_root(symbol, product)?;
    Ok((product.to_string(), month))
}

fn parse_expiry(symbol: &str, expiry: &str) -> Result<NaiveDate> {
    if expiry.len() != 6 || !expiry.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::validation(format!(
            "invalid expiry in symbol {symbol:?}"
        )));
    }
    NaiveDate::parse_from_str(expiry, "%y%m%d")
        .map_err(|_| Error::validation(format!("invalid expiry in symbol {symbol:?}")))
}

/// Parse an option tail like `C150` or `P32.5`.
fn parse_option_tail(symbol: &str, tail: &str) -> Result<(OptionType, Decimal)> {
    let mut chars = tail.chars();
    let option_type = chars
        .next()
        .and_then(OptionType::from_char)
        .ok_or_else(|| Error::validation(format!("invalid option type in symbol {symbol:?}")))?;
    let strike: Decimal = chars
        .as_str()
        .parse()
        .map_err(|_| Error::validation(format!("invalid strike in symbol {symbol:?}")))?;
    if strike <= Decimal::ZERO {
        return Err(Error::validation(format!(
            "non-positive strike in symbol {symbol:?}"
        )));
    }
    Ok((option_type, strike.normalize()))
}
