//! Manual link application: merging chains across automatic boundaries.
//!
//! Links run after automatic matching and act globally: every chain
//! holding one of a link's ids (transaction or order) merges into the
//! earliest involved chain. Membership unions in date order and the
//! closure status recomputes from the unioned position book. Ids that
//! match nothing are warnings, never errors.

use journal_core::{ChainStatus, ClassifiedTransaction, Link, Warning};

use crate::matcher::MatchedChain;
use crate::table::PositionBook;

/// Apply manual links, merging the chains they touch.
pub fn apply_links(
    chains: Vec<MatchedChain>,
    links: &[Link],
) -> (Vec<MatchedChain>, Vec<Warning>) {
    let mut warnings = Vec::new();
    if links.is_empty() {
        return (chains, warnings);
    }

    let mut slots: Vec<Option<MatchedChain>> = chains.into_iter().map(Some).collect();

    for link in links {
        let mut involved: Vec<usize> = Vec::new();
        for id in &link.ids {
            // An order id can span several chains (a roll closing one
            // chain and opening the next in one order); every chain
            // holding the id joins the merge.
            let mut found = false;
            for (idx, slot) in slots.iter().enumerate() {
                if slot.as_ref().is_some_and(|chain| chain.contains_id(id)) {
                    found = true;
                    if !involved.contains(&idx) {
                        involved.push(idx);
                    }
                }
            }
            if !found {
                tracing::debug!(link = %link.comment, id = %id, "dangling link id");
                warnings.push(Warning::DanglingLink {
                    comment: link.comment.clone(),
                    id: id.clone(),
                });
            }
        }
        if involved.is_empty() {
            continue;
        }

        // The earliest involved chain survives and keeps its identity.
        involved.sort_by_key(|&idx| {
            slots[idx]
                .as_ref()
                .map(|chain| (chain.first_datetime(), chain.auto_id()))
        });
        let survivor_idx = involved[0];
        for &idx in &involved[1..] {
            if let Some(other) = slots[idx].take() {
                if let Some(survivor) = slots[survivor_idx].take() {
                    tracing::debug!(link = %link.comment, "merging chains by link");
                    slots[survivor_idx] = Some(merge_chains(survivor, other));
                }
            }
        }
        if !link.comment.is_empty() {
            if let Some(survivor) = slots[survivor_idx].as_mut() {
                survivor.link_comment = Some(link.comment.clone());
            }
        }
    }

    (slots.into_iter().flatten().collect(), warnings)
}

/// Union two chains in date order and recompute closure status.
fn merge_chains(survivor: MatchedChain, other: MatchedChain) -> MatchedChain {
    let txns = merge_members(survivor.txns, other.txns);
    let mut book = PositionBook::new();
    for ct in &txns {
        book.apply(&ct.txn.symbol(), ct.txn.quantity);
    }
    let status = if book.is_flat() {
        ChainStatus::Closed
    } else {
        ChainStatus::Active
    };
    MatchedChain {
        account: survivor.account,
        nickname: survivor.nickname,
        root: survivor.root,
        txns,
        status,
        link_comment: survivor.link_comment.or(other.link_comment),
    }
}

/// Stable two-way merge by datetime; ties keep the survivor's members
/// first.
fn merge_members(
    a: Vec<ClassifiedTransaction>,
    b: Vec<ClassifiedTransaction>,
) -> Vec<ClassifiedTransaction> {
    let mut merged = Vec::with_capacity(a.len() + b.len());
    let mut a = a.into_iter().peekable();
    let mut b = b.into_iter().peekable();
    loop {
        let take_a = match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => x.txn.datetime <= y.txn.datetime,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        if take_a {
            if let Some(x) = a.next() {
                merged.push(x);
            }
        } else if let Some(y) = b.next() {
            merged.push(y);
        }
    }
    merged
}
