//! Configuration snapshot: the persisted journal state.
//!
//! One JSON document holds everything the engine needs beyond the
//! transaction log itself: account nicknames, the futures-option month
//! mapping, persisted chain records with their manual overrides,
//! residual chains and manual links. Struct field order is fixed so the
//! saved file diffs cleanly between runs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Chain, ChainStatus, TradeShape};

/// The whole persisted state of the journal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Known accounts and their nicknames.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<Account>,
    /// Futures-option month to future month mapping.
    #[serde(default, skip_serializing_if = "FutOptMonthMapping::is_empty")]
    pub futures_option_month_mapping: FutOptMonthMapping,
    /// Persisted chain records, including manual overrides.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chains: Vec<ChainRecord>,
    /// Records whose transactions did not appear in the latest batch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub residual_chains: Vec<ChainRecord>,
    /// Manual grouping overrides.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

impl ConfigSnapshot {
    /// Nickname for an account id, falling back to the raw id.
    pub fn nickname<'a>(&'a self, account: &'a str) -> &'a str {
        self.accounts
            .iter()
            .find(|a| a.account == account)
            .map(|a| a.nickname.as_str())
            .unwrap_or(account)
    }
}

/// An account known to the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Raw account identifier as delivered by the importer.
    pub account: String,
    /// Short name substituted into chain ids.
    pub nickname: String,
}

/// Mapping from futures-option months to underlying future months.
///
/// Some products list options against a differently-dated future (a
/// January option can deliver the March contract), so the pair
/// (option product, option month) maps explicitly to
/// (future product, future month).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FutOptMonthMapping {
    /// Mapping entries.
    #[serde(default)]
    pub months: Vec<MonthMappingItem>,
}

impl FutOptMonthMapping {
    /// True when no entries are configured.
    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }
}

/// One month-mapping entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthMappingItem {
    /// Option product code, e.g. "OZC".
    pub option_product: String,
    /// Option contract month, e.g. "F24".
    pub option_month: String,
    /// Underlying future product code, e.g. "ZC".
    pub future_product: String,
    /// Underlying future contract month, e.g. "H24".
    pub future_month: String,
}

/// A persisted chain record.
///
/// Structural fields (ids, dates) are refreshed from computation on
/// every save. The optional fields are overrides set by a human or the
/// finalizer; they stay absent until someone sets them, so computed
/// values never freeze into overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainRecord {
    /// Chain identifier, pinned onto recomputed chains that contain any
    /// of this record's transactions.
    pub chain_id: String,
    /// Member transaction ids at last save.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transaction_ids: Vec<String>,
    /// Member order ids at last save.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_ids: Vec<String>,
    /// Earliest member date at last save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<NaiveDate>,
    /// Latest member date at last save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<NaiveDate>,
    /// Status override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ChainStatus>,
    /// Trade-type override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_type: Option<TradeShape>,
    /// Category label set by the finalizer or by hand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Comment override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ChainRecord {
    /// Build a fresh record for a chain with no prior persisted state.
    ///
    /// Only structural fields and the finalizer's category are stored;
    /// narrative fields stay absent so they keep being recomputed.
    pub fn from_chain(chain: &Chain) -> Self {
        ChainRecord {
            chain_id: chain.chain_id.clone(),
            transaction_ids: chain.transaction_ids.clone(),
            order_ids: chain.order_ids.clone(),
            min_date: Some(chain.min_date),
            max_date: Some(chain.max_date),
            status: None,
            trade_type: None,
            category: chain.category.clone(),
            comment: None,
        }
    }
}

/// Manual grouping override: every id names a transaction or an order
/// whose chain must merge with the others.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Link {
    /// Human note carried onto the merged chain's comment.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    /// Transaction or order ids to bind together.
    #[serde(default)]
    pub ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_is_empty() {
        let snapshot = ConfigSnapshot::default();
        assert!(snapshot.accounts.is_empty());
        assert!(snapshot.futures_option_month_mapping.is_empty());
        assert!(snapshot.chains.is_empty());
        assert!(snapshot.residual_chains.is_empty());
        assert!(snapshot.links.is_empty());
        // An empty snapshot serializes to a bare object.
        assert_eq!(serde_json::to_string(&snapshot).unwrap(), "{}");
    }

    #[test]
    fn test_nickname_fallback() {
        let snapshot = ConfigSnapshot {
            accounts: vec![Account {
                account: "x1234".to_string(),
                nickname: "main".to_string(),
            }],
            ..Default::default()
        };
        assert_eq!(snapshot.nickname("x1234"), "main");
        assert_eq!(snapshot.nickname("x9999"), "x9999");
    }

    #[test]
    fn test_record_overrides_stay_absent() {
        let record = ChainRecord {
            chain_id: "main.240102_103000.XYZ".to_string(),
            transaction_ids: vec!["t1".to_string()],
            min_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            max_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            ..Default::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("status"));
        assert!(!json.contains("comment"));
        assert!(!json.contains("category"));
        assert!(!json.contains("order_ids"));

        let back: ChainRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.chain_id, record.chain_id);
        assert_eq!(back.status, None);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let json = r#"{
            "accounts": [{"account": "x1234", "nickname": "main"}],
            "futures_option_month_mapping": {
                "months": [{
                    "option_product": "OZC",
                    "option_month": "F24",
                    "future_product": "ZC",
                    "future_month": "H24"
                }]
            },
            "chains": [{"chain_id": "main.240102_103000.XYZ", "comment": "earnings play"}],
            "links": [{"comment": "roll", "ids": ["t1", "t2"]}]
        }"#;
        let snapshot: ConfigSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.accounts.len(), 1);
        assert_eq!(snapshot.futures_option_month_mapping.months.len(), 1);
        assert_eq!(
            snapshot.chains[0].comment.as_deref(),
            Some("earnings play")
        );
        assert_eq!(snapshot.links[0].ids, vec!["t1", "t2"]);
        assert!(snapshot.residual_chains.is_empty());
    }
}
