//! Chain matching: partitioning transactions into chains.
//!
//! Transactions group by (account, root); within a group a running
//! per-instrument position decides chain boundaries. A chain closes when
//! every instrument returns to exactly zero, except that a zero reached
//! by an assignment or exercise keeps the chain open for the delivered
//! legs. Groups are mutually independent and run in parallel.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDateTime;
use journal_core::{
    Chain, ChainStatus, ClassifiedTransaction, ConfigSnapshot, Error, Result,
};
use rayon::prelude::*;

use crate::table::{PositionBook, TransactionIndex};

/// A chain under construction: members plus closure state.
#[derive(Debug, Clone)]
pub struct MatchedChain {
    /// Raw account id shared by the members.
    pub account: String,
    /// Account nickname used in chain ids.
    pub nickname: String,
    /// Root symbol of the group.
    pub root: String,
    /// Members in date order.
    pub txns: Vec<ClassifiedTransaction>,
    /// Closure status at the end of the batch.
    pub status: ChainStatus,
    /// Comment from a manual link, when one touched this chain.
    pub link_comment: Option<String>,
}

impl MatchedChain {
    /// Datetime of the first member.
    pub fn first_datetime(&self) -> NaiveDateTime {
        self.txns
            .first()
            .map(|ct| ct.txn.datetime)
            .unwrap_or_default()
    }

    /// Deterministic id from the first member:
    /// `{nickname}.{yymmdd_hhmmss}.{root}`.
    pub fn auto_id(&self) -> String {
        format!(
            "{}.{}.{}",
            self.nickname,
            self.first_datetime().format("%y%m%d_%H%M%S"),
            self.root
        )
    }

    /// Whether any member carries this transaction or order id.
    pub fn contains_id(&self, id: &str) -> bool {
        self.txns
            .iter()
            .any(|ct| ct.txn.id == id || ct.txn.order_id.as_deref() == Some(id))
    }
}

/// Result of matching a classified batch into chains.
#[derive(Debug, Default)]
pub struct MatchOutcome {
    /// Chains in chronological order.
    pub chains: Vec<MatchedChain>,
    /// Transactions with no derivable grouping key.
    pub ungroupable: Vec<(ClassifiedTransaction, Error)>,
}

/// Partition classified transactions into chains.
///
/// Groups run under rayon and merge in group-key order, so the outcome
/// is independent of scheduling. Within a group, transactions sort by
/// datetime with identical timestamps kept in input order.
pub fn match_chains(
    txns: Vec<ClassifiedTransaction>,
    snapshot: &ConfigSnapshot,
) -> MatchOutcome {
    let mut groups: BTreeMap<(String, String), Vec<ClassifiedTransaction>> = BTreeMap::new();
    let mut ungroupable = Vec::new();

    for ct in txns {
        if ct.txn.account.is_empty() || ct.root.is_empty() {
            let error = Error::ungroupable(ct.txn.id.clone(), "no account/root grouping key");
            ungroupable.push((ct, error));
            continue;
        }
        groups
            .entry((ct.txn.account.clone(), ct.root.clone()))
            .or_default()
            .push(ct);
    }

    let groups: Vec<((String, String), Vec<ClassifiedTransaction>)> =
        groups.into_iter().collect();
    let mut chains: Vec<MatchedChain> = groups
        .into_par_iter()
        .map(|((account, root), mut group)| {
            // Stable sort: same-timestamp fills keep ingestion order.
            group.sort_by_key(|ct| ct.txn.datetime);
            let nickname = snapshot.nickname(&account).to_string();
            scan_group(&account, &nickname, &root, group)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    chains.sort_by(|a, b| {
        (a.first_datetime(), a.account.as_str(), a.root.as_str())
            .cmp(&(b.first_datetime(), b.account.as_str(), b.root.as_str()))
    });

    tracing::debug!(
        chains = chains.len(),
        ungroupable = ungroupable.len(),
        "matched transactions into chains"
    );

    MatchOutcome { chains, ungroupable }
}

#[derive(Debug, Default)]
struct Builder {
    txns: Vec<ClassifiedTransaction>,
    book: PositionBook,
    pending_conversion: bool,
}

impl Builder {
    fn push(&mut self, ct: ClassifiedTransaction) {
        self.book.apply(&ct.txn.symbol(), ct.txn.quantity);
        self.txns.push(ct);
    }

    fn finish(
        self,
        account: &str,
        nickname: &str,
        root: &str,
        status: ChainStatus,
    ) -> MatchedChain {
        MatchedChain {
            account: account.to_string(),
            nickname: nickname.to_string(),
            root: root.to_string(),
            txns: self.txns,
            status,
            link_comment: None,
        }
    }
}

/// Scan one (account, root) group in date order.
fn scan_group(
    account: &str,
    nickname: &str,
    root: &str,
    txns: Vec<ClassifiedTransaction>,
) -> Vec<MatchedChain> {
    let mut chains = Vec::new();
    let mut current: Option<Builder> = None;

    for ct in txns {
        let is_conversion = ct.txn.effect.is_conversion();

        // A chain left flat by an assignment or exercise waits for the
        // delivered legs; any other transaction closes it first.
        let close_pending = matches!(
            current.as_ref(),
            Some(builder) if builder.pending_conversion && !is_conversion
        );
        if close_pending {
            if let Some(done) = current.take() {
                chains.push(done.finish(account, nickname, root, ChainStatus::Closed));
            }
        }

        let mut builder = current.take().unwrap_or_default();
        builder.push(ct);

        if builder.book.is_flat() {
            if is_conversion {
                builder.pending_conversion = true;
                current = Some(builder);
            } else {
                chains.push(builder.finish(account, nickname, root, ChainStatus::Closed));
            }
        } else {
            builder.pending_conversion = false;
            current = Some(builder);
        }
    }

    if let Some(builder) = current.take() {
        let status = if builder.book.is_flat() {
            ChainStatus::Closed
        } else {
            ChainStatus::Active
        };
        chains.push(builder.finish(account, nickname, root, status));
    }

    chains
}

/// Verify the partition and zero-crossing closure invariants on the
/// final chain set.
///
/// A violation here is an internal defect, never a data problem, so it
/// aborts the run with full diagnostic context.
pub fn verify_chains(
    chains: &[Chain],
    index: &TransactionIndex,
    expected_ids: &[String],
) -> Result<()> {
    // Partition: every classified transaction in exactly one chain.
    let mut seen: HashMap<&str, &str> = HashMap::with_capacity(expected_ids.len());
    for chain in chains {
        for id in &chain.transaction_ids {
            if let Some(prior) = seen.insert(id.as_str(), chain.chain_id.as_str()) {
                return Err(Error::invariant(
                    chain.account.clone(),
                    chain.root.clone(),
                    vec![id.clone()],
                    format!("transaction claimed by chains {prior} and {}", chain.chain_id),
                ));
            }
        }
    }

    let expected: HashSet<&str> = expected_ids.iter().map(String::as_str).collect();
    for id in expected_ids {
        if !seen.contains_key(id.as_str()) {
            let (account, product) = match index.get(id) {
                Some(txn) => (txn.account.clone(), txn.instrument.product().to_string()),
                None => (String::new(), String::new()),
            };
            return Err(Error::invariant(
                account,
                product,
                vec![id.clone()],
                "transaction missing from every chain",
            ));
        }
    }
    for chain in chains {
        for id in &chain.transaction_ids {
            if !expected.contains(id.as_str()) {
                return Err(Error::invariant(
                    chain.account.clone(),
                    chain.root.clone(),
                    vec![id.clone()],
                    "chain member not present in the classified batch",
                ));
            }
        }
    }

    // Zero-crossing closure against computed statuses.
    for chain in chains {
        let mut book = PositionBook::new();
        for id in &chain.transaction_ids {
            let txn = index.get(id).ok_or_else(|| {
                Error::invariant(
                    chain.account.clone(),
                    chain.root.clone(),
                    vec![id.clone()],
                    "chain member missing from the transaction index",
                )
            })?;
            book.apply(&txn.symbol(), txn.quantity);
        }
        match chain.status {
            ChainStatus::Closed if !book.is_flat() => {
                return Err(Error::invariant(
                    chain.account.clone(),
                    chain.root.clone(),
                    chain.transaction_ids.clone(),
                    "closed chain holds a residual position",
                ));
            }
            ChainStatus::Active if book.is_flat() => {
                return Err(Error::invariant(
                    chain.account.clone(),
                    chain.root.clone(),
                    chain.transaction_ids.clone(),
                    "active chain nets to zero",
                ));
            }
            _ => {}
        }
    }

    Ok(())
}
