//! Per-sender transaction list ordered by nonce

use crate::transaction::PooledTransaction;
use condpool_policy::{BlockContext, TxOptionsError};
use condpool_primitives::U256;
use condpool_state::StateReader;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Minimum price a transaction must offer to replace one priced `price`
/// under a `price_bump` percent margin.
pub fn replacement_threshold(price: U256, price_bump: u64) -> U256 {
    let factor = U256::from(100u64.saturating_add(price_bump));
    price.saturating_mul(factor) / U256::from(100u64)
}

/// Whether `new_price` may replace an incumbent priced `old_price`.
///
/// The candidate must beat the incumbent outright and clear the bump margin;
/// a tie never replaces.
pub fn can_replace(old_price: U256, new_price: U256, price_bump: u64) -> bool {
    new_price > old_price && new_price >= replacement_threshold(old_price, price_bump)
}

/// Transactions of a single sender, keyed by nonce.
///
/// At most one transaction occupies each nonce. The list itself never
/// restores nonce contiguity after a removal; a `strict` list tells its
/// owner that it expects the entries to form a gapless run from the
/// sender's current nonce, and keeping it that way is the owner's job.
#[derive(Debug, Clone)]
pub struct TransactionList {
    strict: bool,
    txs: BTreeMap<u64, Arc<PooledTransaction>>,
}

impl TransactionList {
    /// Create an empty list
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            txs: BTreeMap::new(),
        }
    }

    /// Whether the owner treats this list as contiguous from the current nonce
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Insert `tx`, or replace the transaction at its nonce if `tx` pays at
    /// least `price_bump` percent more.
    ///
    /// Returns whether `tx` was stored and the transaction it displaced.
    /// `on_replaced` sees the displaced transaction before it is returned.
    pub fn add(
        &mut self,
        tx: Arc<PooledTransaction>,
        price_bump: u64,
        on_replaced: Option<&mut dyn FnMut(&Arc<PooledTransaction>)>,
    ) -> (bool, Option<Arc<PooledTransaction>>) {
        match self.txs.entry(tx.nonce) {
            Entry::Vacant(slot) => {
                tracing::trace!(sender = %tx.sender, nonce = tx.nonce, hash = %tx.hash, "queued transaction");
                slot.insert(tx);
                (true, None)
            }
            Entry::Occupied(mut slot) => {
                let old_price = slot.get().gas_price;
                if !can_replace(old_price, tx.gas_price, price_bump) {
                    tracing::trace!(
                        nonce = tx.nonce,
                        %old_price,
                        new_price = %tx.gas_price,
                        price_bump,
                        "replacement underpriced"
                    );
                    return (false, None);
                }
                let old = slot.insert(tx);
                tracing::debug!(
                    nonce = old.nonce,
                    old_hash = %old.hash,
                    new_hash = %slot.get().hash,
                    "replaced transaction"
                );
                if let Some(hook) = on_replaced {
                    hook(&old);
                }
                (true, Some(old))
            }
        }
    }

    /// Remove every transaction priced strictly below `price_limit`.
    ///
    /// Survivors above a removed nonce are kept as they are.
    pub fn filter(&mut self, price_limit: U256) -> Vec<Arc<PooledTransaction>> {
        let mut removed = Vec::new();
        self.txs.retain(|_, tx| {
            if tx.gas_price < price_limit {
                removed.push(Arc::clone(tx));
                return false;
            }
            true
        });
        if !removed.is_empty() {
            tracing::debug!(%price_limit, dropped = removed.len(), "filtered underpriced transactions");
        }
        removed
    }

    /// Remove every transaction whose options no longer hold against `state`
    /// at `block`.
    ///
    /// Entries are visited in ascending nonce order; `errors[i]` is the reason
    /// `dropped[i]` was removed. Unconditional transactions always stay.
    pub fn filter_tx_options<S>(
        &mut self,
        state: &S,
        block: &BlockContext,
    ) -> (Vec<Arc<PooledTransaction>>, Vec<TxOptionsError>)
    where
        S: StateReader + ?Sized,
    {
        let mut dropped = Vec::new();
        let mut errors = Vec::new();
        self.txs.retain(|_, tx| {
            let Some(options) = &tx.options else {
                return true;
            };
            match options.check(state, block) {
                Ok(()) => true,
                Err(err) => {
                    tracing::debug!(
                        sender = %tx.sender,
                        nonce = tx.nonce,
                        hash = %tx.hash,
                        reason = %err,
                        detail = err.detail().unwrap_or_default(),
                        "dropping transaction with unmet options"
                    );
                    dropped.push(Arc::clone(tx));
                    errors.push(err);
                    false
                }
            }
        });
        (dropped, errors)
    }

    /// Remove all transactions with a nonce below `threshold`
    pub fn forward(&mut self, threshold: u64) -> Vec<Arc<PooledTransaction>> {
        let keep = self.txs.split_off(&threshold);
        let removed = std::mem::replace(&mut self.txs, keep);
        if !removed.is_empty() {
            tracing::debug!(threshold, removed = removed.len(), "forwarded list");
        }
        removed.into_values().collect()
    }

    /// Keep at most `threshold` transactions, evicting the highest nonces.
    ///
    /// Evicted transactions are returned in ascending nonce order.
    pub fn cap(&mut self, threshold: usize) -> Vec<Arc<PooledTransaction>> {
        let mut drops = Vec::new();
        while self.txs.len() > threshold {
            match self.txs.pop_last() {
                Some((_, tx)) => drops.push(tx),
                None => break,
            }
        }
        if !drops.is_empty() {
            tracing::debug!(threshold, evicted = drops.len(), "capped list");
        }
        drops.reverse();
        drops
    }

    /// Take the run of consecutive nonces that begins at the lowest stored
    /// nonce, provided that nonce is not above `start`.
    ///
    /// Nonces below `start` are taken too so the list never keeps stale
    /// entries behind a ready run.
    pub fn ready(&mut self, start: u64) -> Vec<Arc<PooledTransaction>> {
        let mut ready = Vec::new();
        let mut next = match self.txs.first_key_value() {
            Some((&first, _)) if first <= start => first,
            _ => return ready,
        };
        while let Some(entry) = self.txs.first_entry() {
            if *entry.key() != next {
                break;
            }
            ready.push(entry.remove());
            match next.checked_add(1) {
                Some(n) => next = n,
                None => break,
            }
        }
        ready
    }

    /// Remove the transaction at `nonce`
    pub fn remove(&mut self, nonce: u64) -> Option<Arc<PooledTransaction>> {
        self.txs.remove(&nonce)
    }

    /// Transaction at `nonce`
    pub fn get(&self, nonce: u64) -> Option<&Arc<PooledTransaction>> {
        self.txs.get(&nonce)
    }

    /// Whether `nonce` is occupied
    pub fn contains(&self, nonce: u64) -> bool {
        self.txs.contains_key(&nonce)
    }

    /// Whether `tx` would land on an occupied nonce
    pub fn overlaps(&self, tx: &PooledTransaction) -> bool {
        self.contains(tx.nonce)
    }

    /// Highest-nonce transaction
    pub fn last(&self) -> Option<&Arc<PooledTransaction>> {
        self.txs.last_key_value().map(|(_, tx)| tx)
    }

    /// Snapshot of all transactions in ascending nonce order
    pub fn flatten(&self) -> Vec<Arc<PooledTransaction>> {
        self.txs.values().cloned().collect()
    }

    /// Iterate in ascending nonce order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<PooledTransaction>> {
        self.txs.values()
    }

    /// Number of transactions
    pub fn len(&self) -> usize {
        self.txs.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}
