//! Core types and configuration for the trade-journal system.
//!
//! This crate provides shared types used across all other crates:
//! - Transaction and chain data types
//! - Instrument symbology (parsing and canonical rendering)
//! - The persisted configuration snapshot
//! - Common error and warning types

pub mod config;
pub mod error;
pub mod instrument;
pub mod types;

pub use config::{Account, ChainRecord, ConfigSnapshot, FutOptMonthMapping, Link};
pub use error::{Error, Result, Warning};
pub use instrument::{ContractMonth, Instrument, InstrumentClass, MonthCode, OptionType};
pub use types::*;
