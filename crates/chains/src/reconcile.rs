//! Chain-id pinning and persisted-record reconciliation.
//!
//! Persisted records claim transaction ids; a recomputed chain holding a
//! claimed id adopts the record's chain id so identities survive
//! regrouping. Reconciliation then overlays the record's manual
//! overrides onto the computed chain.

use std::collections::{hash_map, HashMap, HashSet};

use journal_core::{Chain, ChainRecord, Warning};

use crate::matcher::MatchedChain;

/// Assign a chain id to every matched chain, in order.
///
/// The record claiming the earliest member wins when several records
/// claim one chain; a record already consumed by an earlier chain cannot
/// pin a second one. Unclaimed chains get the deterministic auto id.
/// Collisions take a `-2`, `-3`, ... suffix.
pub fn assign_chain_ids(
    chains: &[MatchedChain],
    records: &[&ChainRecord],
) -> (Vec<String>, Vec<Warning>) {
    let mut warnings = Vec::new();

    // First record to claim a transaction id owns it.
    let mut claims: HashMap<&str, usize> = HashMap::new();
    for (ridx, record) in records.iter().enumerate() {
        for id in &record.transaction_ids {
            match claims.entry(id.as_str()) {
                hash_map::Entry::Vacant(entry) => {
                    entry.insert(ridx);
                }
                hash_map::Entry::Occupied(entry) => {
                    warnings.push(Warning::DuplicateChainRecord {
                        transaction_id: id.clone(),
                        chain_id: records[*entry.get()].chain_id.clone(),
                        other: record.chain_id.clone(),
                    });
                }
            }
        }
    }

    let mut record_spread: Vec<HashSet<usize>> = vec![HashSet::new(); records.len()];
    let mut consumed: HashSet<usize> = HashSet::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut ids = Vec::with_capacity(chains.len());

    for (cidx, chain) in chains.iter().enumerate() {
        // Candidate records in member order, earliest claimed member first.
        let mut candidates: Vec<usize> = Vec::new();
        for ct in &chain.txns {
            if let Some(&ridx) = claims.get(ct.txn.id.as_str()) {
                record_spread[ridx].insert(cidx);
                if !candidates.contains(&ridx) {
                    candidates.push(ridx);
                }
            }
        }
        let pinned = candidates
            .iter()
            .find(|ridx| !consumed.contains(ridx))
            .copied();
        if candidates.len() > 1 {
            // Name the record that actually pins the chain; a candidate
            // consumed by an earlier chain cannot win here.
            let winner = pinned.unwrap_or(candidates[0]);
            if let Some(&other) = candidates.iter().find(|&&ridx| ridx != winner) {
                warnings.push(Warning::ChainIdContention {
                    chain_id: records[winner].chain_id.clone(),
                    other: records[other].chain_id.clone(),
                });
            }
        }
        let id = match pinned {
            Some(ridx) => {
                consumed.insert(ridx);
                records[ridx].chain_id.clone()
            }
            None => chain.auto_id(),
        };
        ids.push(uniquify(id, &mut taken));
    }

    for (ridx, spread) in record_spread.iter().enumerate() {
        if spread.len() > 1 {
            warnings.push(Warning::PersistedIdsSplit {
                chain_id: records[ridx].chain_id.clone(),
                count: spread.len(),
            });
        }
    }

    (ids, warnings)
}

fn uniquify(id: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(id.clone()) {
        return id;
    }
    let mut suffix = 2;
    loop {
        let candidate = format!("{id}-{suffix}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Overlay a persisted record's overrides onto a computed chain.
///
/// Narrative fields (status, trade type, category, comment) come from
/// the record when set there; structural fields (member ids, dates)
/// always keep the computed values.
pub fn reconcile_chain(chain: &mut Chain, record: &ChainRecord) {
    if let Some(status) = record.status {
        chain.status = status;
    }
    if let Some(trade_type) = record.trade_type {
        chain.trade_type = trade_type;
    }
    if let Some(category) = &record.category {
        chain.category = Some(category.clone());
    }
    if let Some(comment) = &record.comment {
        chain.comment = comment.clone();
    }
}
