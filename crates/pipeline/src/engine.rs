//! The end-to-end journal run.
//!
//! One call takes the importer's raw rows and the persisted snapshot and
//! produces the final chain set: normalize, classify, dedup, match,
//! link, pin ids, aggregate, verify, reconcile. The snapshot threads
//! through by reference and is never mutated; the updated snapshot is a
//! separate value built from the output.

use std::collections::{BTreeMap, HashMap, HashSet};

use journal_chains::{
    aggregate, apply_links, assign_chain_ids, match_chains, reconcile_chain, verify_chains,
    lifecycle, TransactionIndex,
};
use journal_core::{
    Chain, ChainRecord, ConfigSnapshot, Error, RawRecord, Result,
};
use journal_ingestion::{normalize, InstrumentClassifier};

use crate::report::RunReport;
use crate::summary::{summarize, ChainSummary};

/// Everything one journal run produces.
#[derive(Debug)]
pub struct RunOutput {
    /// Final chains after reconciliation, in chronological order.
    pub chains: Vec<Chain>,
    /// Transaction lookup for the batch.
    pub index: TransactionIndex,
    /// Accumulated row-level errors and warnings.
    pub report: RunReport,
    /// The input snapshot, carried for the save.
    snapshot: ConfigSnapshot,
}

/// Run the full pipeline over one batch of raw rows.
///
/// Row-level failures exclude their row and accumulate in the report;
/// only configuration errors, invariant violations and store failures
/// propagate as `Err`.
pub fn run(rows: &[RawRecord], snapshot: &ConfigSnapshot) -> Result<RunOutput> {
    let mut report = RunReport::default();

    // Normalize, accumulating rejected rows.
    let batch = normalize(rows);
    for rejected in batch.rejected {
        report.exclude_row(rejected.row, rejected.id, &rejected.error);
    }

    // Dedup ids while building the index: ids are the identity of
    // everything downstream, so a repeated id keeps its first occurrence
    // and excludes the rest.
    let mut index = TransactionIndex::new();
    let mut txns = Vec::with_capacity(batch.transactions.len());
    for txn in batch.transactions {
        if index.insert(&txn) {
            txns.push(txn);
        } else {
            let error = Error::validation(format!("duplicate transaction id {}", txn.id));
            report.exclude_txn(&txn.id, &error);
        }
    }

    // Classify; unmapped instruments drop out of matching.
    let mut classifier = InstrumentClassifier::new(&snapshot.futures_option_month_mapping)?;
    let (classified, failed) = classifier.classify_batch(txns);
    for (txn, error) in failed {
        report.exclude_txn(&txn.id, &error);
    }
    let mut expected_ids: Vec<String> =
        classified.iter().map(|ct| ct.txn.id.clone()).collect();

    // Match into chains, then apply the manual links.
    let outcome = match_chains(classified, snapshot);
    let ungrouped: HashSet<String> = outcome
        .ungroupable
        .iter()
        .map(|(ct, _)| ct.txn.id.clone())
        .collect();
    expected_ids.retain(|id| !ungrouped.contains(id));
    for (ct, error) in outcome.ungroupable {
        report.exclude_txn(&ct.txn.id, &error);
    }
    let (matched, warnings) = apply_links(outcome.chains, &snapshot.links);
    report.extend_warnings(warnings);

    // Pin chain ids from the persisted records, then aggregate.
    let records: Vec<&ChainRecord> = snapshot
        .chains
        .iter()
        .chain(snapshot.residual_chains.iter())
        .collect();
    let (ids, warnings) = assign_chain_ids(&matched, &records);
    report.extend_warnings(warnings);
    let mut chains: Vec<Chain> = matched
        .iter()
        .zip(ids)
        .map(|(chain, id)| aggregate(chain, id))
        .collect();

    // Verify before overrides can mask a defect.
    verify_chains(&chains, &index, &expected_ids)?;

    // Overlay the persisted overrides.
    let by_id: HashMap<&str, &ChainRecord> = records
        .iter()
        .map(|record| (record.chain_id.as_str(), *record))
        .collect();
    for chain in &mut chains {
        if let Some(record) = by_id.get(chain.chain_id.as_str()) {
            reconcile_chain(chain, record);
        }
    }

    tracing::info!(
        rows = rows.len(),
        chains = chains.len(),
        excluded = report.excluded.len(),
        warnings = report.warnings.len(),
        "journal run complete"
    );

    Ok(RunOutput {
        chains,
        index,
        report,
        snapshot: snapshot.clone(),
    })
}

impl RunOutput {
    /// Look up a chain by id.
    pub fn chain(&self, chain_id: &str) -> Option<&Chain> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    /// Stamp a closed chain with a category label, in place.
    pub fn finalize(&mut self, chain_id: &str, category: &str) -> Result<()> {
        let chain = self
            .chains
            .iter_mut()
            .find(|c| c.chain_id == chain_id)
            .ok_or_else(|| Error::precondition(format!("no chain {chain_id} in this run")))?;
        lifecycle::finalize(chain, category)
    }

    /// Per-chain summaries keyed by chain id.
    pub fn summaries(&self) -> BTreeMap<String, ChainSummary> {
        self.chains
            .iter()
            .map(|chain| (chain.chain_id.clone(), summarize(chain, &self.index)))
            .collect()
    }

    /// Build the updated snapshot.
    ///
    /// Live records refresh in place and keep their relative order;
    /// records with no live chain this run move to `residual_chains`;
    /// resurrected residuals rejoin the live list; new chains append
    /// sorted by (min date, chain id). Accounts, the month mapping and
    /// the links pass through verbatim.
    pub fn to_snapshot(&self) -> ConfigSnapshot {
        let mut live: HashMap<&str, &Chain> = self
            .chains
            .iter()
            .map(|chain| (chain.chain_id.as_str(), chain))
            .collect();

        let mut out_chains = Vec::with_capacity(self.chains.len());
        let mut retired = Vec::new();
        for record in &self.snapshot.chains {
            match live.remove(record.chain_id.as_str()) {
                Some(chain) => out_chains.push(refresh_record(record, chain)),
                None => retired.push(record.clone()),
            }
        }

        let mut out_residuals = Vec::new();
        for record in &self.snapshot.residual_chains {
            match live.remove(record.chain_id.as_str()) {
                Some(chain) => out_chains.push(refresh_record(record, chain)),
                None => out_residuals.push(record.clone()),
            }
        }
        out_residuals.extend(retired);

        let mut fresh: Vec<&Chain> = live.into_values().collect();
        fresh.sort_by(|a, b| {
            (a.min_date, a.chain_id.as_str()).cmp(&(b.min_date, b.chain_id.as_str()))
        });
        out_chains.extend(fresh.into_iter().map(ChainRecord::from_chain));

        ConfigSnapshot {
            accounts: self.snapshot.accounts.clone(),
            futures_option_month_mapping: self.snapshot.futures_option_month_mapping.clone(),
            chains: out_chains,
            residual_chains: out_residuals,
            links: self.snapshot.links.clone(),
        }
    }
}

/// Refresh a persisted record from its live chain: structural facts come
/// from computation, the override fields pass through untouched. The
/// category writes back from the chain so a finalize in this run
/// persists.
fn refresh_record(record: &ChainRecord, chain: &Chain) -> ChainRecord {
    ChainRecord {
        chain_id: record.chain_id.clone(),
        transaction_ids: chain.transaction_ids.clone(),
        order_ids: chain.order_ids.clone(),
        min_date: Some(chain.min_date),
        max_date: Some(chain.max_date),
        status: record.status,
        trade_type: record.trade_type,
        category: chain.category.clone(),
        comment: record.comment.clone(),
    }
}
