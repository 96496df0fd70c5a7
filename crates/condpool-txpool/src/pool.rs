//! Registry of per-sender transaction lists

use crate::config::PoolConfig;
use crate::error::{TxPoolError, TxPoolResult};
use crate::list::TransactionList;
use crate::transaction::PooledTransaction;
use condpool_policy::{BlockContext, TxOptions, TxOptionsError};
use condpool_primitives::{Address, H256, U256};
use condpool_state::StateReader;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Result of a successful [`PendingSet::add`]
#[derive(Debug, Default)]
pub struct AddOutcome {
    /// Transaction displaced at the same nonce
    pub replaced: Option<Arc<PooledTransaction>>,
    /// Transactions evicted to respect the per-sender slot limit, which may
    /// include the one just added
    pub evicted: Vec<Arc<PooledTransaction>>,
}

/// Pending transactions, one strict list per sender.
///
/// Every stored transaction is also indexed by hash. A sender's list is
/// created on its first admitted transaction and dropped once empty.
pub struct PendingSet {
    /// Configuration
    config: PoolConfig,
    /// All transactions by hash
    by_hash: DashMap<H256, Arc<PooledTransaction>>,
    /// Transactions organized by sender
    by_sender: DashMap<Address, Mutex<TransactionList>>,
}

impl PendingSet {
    /// Create new set with config
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            by_hash: DashMap::new(),
            by_sender: DashMap::new(),
        }
    }

    /// Create set with default config
    pub fn with_defaults() -> Self {
        Self::new(PoolConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Admit a transaction.
    ///
    /// Checks run in order: duplicate hash, price floor, then options cost
    /// and consistency. Nothing is stored when any of them fails.
    ///
    /// The hash is claimed in the index before the sender's list is touched,
    /// so concurrent adds of one hash admit at most one transaction.
    pub fn add(&self, tx: PooledTransaction) -> TxPoolResult<AddOutcome> {
        let tx = Arc::new(tx);
        match self.by_hash.entry(tx.hash) {
            Entry::Occupied(_) => return Err(TxPoolError::AlreadyExists(tx.hash)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&tx));
            }
        }

        let result = self.admit(&tx);
        if result.is_err() {
            self.unindex(&tx);
        }
        result
    }

    /// Admission checks and list insertion for a transaction whose hash is
    /// already claimed.
    fn admit(&self, tx: &Arc<PooledTransaction>) -> TxPoolResult<AddOutcome> {
        if tx.gas_price < self.config.price_limit {
            return Err(TxPoolError::Underpriced {
                price: tx.gas_price,
                limit: self.config.price_limit,
            });
        }

        if let Some(options) = &tx.options {
            options.validate(self.config.max_tx_options_cost)?;
        }

        let entry = self
            .by_sender
            .entry(tx.sender)
            .or_insert_with(|| Mutex::new(TransactionList::new(true)));
        let mut list = entry.lock();

        let mut unindex = |old: &Arc<PooledTransaction>| self.unindex(old);
        let (inserted, replaced) =
            list.add(Arc::clone(tx), self.config.price_bump, Some(&mut unindex));
        if !inserted {
            let old = list.get(tx.nonce).map_or(U256::zero(), |old| old.gas_price);
            return Err(TxPoolError::ReplacementUnderpriced {
                old,
                new: tx.gas_price,
            });
        }

        let evicted = list.cap(self.config.account_slots);
        for tx in &evicted {
            self.unindex(tx);
        }

        tracing::trace!(
            sender = %tx.sender,
            nonce = tx.nonce,
            hash = %tx.hash,
            conditional = tx.is_conditional(),
            "admitted transaction"
        );
        Ok(AddOutcome { replaced, evicted })
    }

    /// Drop every conditional transaction whose options no longer hold,
    /// pairing each with the reason.
    pub fn filter_tx_options<S>(
        &self,
        state: &S,
        block: &BlockContext,
    ) -> Vec<(Arc<PooledTransaction>, TxOptionsError)>
    where
        S: StateReader + ?Sized,
    {
        let mut dropped = Vec::new();
        self.by_sender.retain(|_, list| {
            let list = list.get_mut();
            let (txs, errors) = list.filter_tx_options(state, block);
            for (tx, err) in txs.into_iter().zip(errors) {
                self.unindex(&tx);
                dropped.push((tx, err));
            }
            !list.is_empty()
        });
        if !dropped.is_empty() {
            tracing::debug!(
                number = %block.number,
                timestamp = block.timestamp,
                dropped = dropped.len(),
                "swept unmet tx options"
            );
        }
        dropped
    }

    /// Drop every transaction priced below `price_limit`
    pub fn filter_underpriced(&self, price_limit: U256) -> Vec<Arc<PooledTransaction>> {
        let mut dropped = Vec::new();
        self.by_sender.retain(|_, list| {
            let list = list.get_mut();
            for tx in list.filter(price_limit) {
                self.unindex(&tx);
                dropped.push(tx);
            }
            !list.is_empty()
        });
        dropped
    }

    /// Drop a sender's transactions with a nonce below `nonce`
    pub fn forward(&self, sender: &Address, nonce: u64) -> Vec<Arc<PooledTransaction>> {
        self.with_list(sender, |list| list.forward(nonce))
    }

    /// Take a sender's executable run starting at `start`
    pub fn ready(&self, sender: &Address, start: u64) -> Vec<Arc<PooledTransaction>> {
        self.with_list(sender, |list| list.ready(start))
    }

    /// Forward every sender to its nonce in `state`, returning what was
    /// dropped as already included.
    pub fn reset<S>(&self, state: &S) -> TxPoolResult<Vec<Arc<PooledTransaction>>>
    where
        S: StateReader + ?Sized,
    {
        let senders: Vec<Address> = self.by_sender.iter().map(|entry| *entry.key()).collect();
        let mut stale = Vec::new();
        for sender in senders {
            let nonce = state.get_nonce(&sender)?;
            stale.extend(self.forward(&sender, nonce));
        }
        tracing::debug!(removed = stale.len(), "reset pending set");
        Ok(stale)
    }

    /// Remove transaction by hash.
    ///
    /// Only a transaction its sender's list still holds is removed; a hash
    /// whose add has not completed yet reports `None`.
    pub fn remove(&self, hash: &H256) -> Option<Arc<PooledTransaction>> {
        let tx = self.get(hash)?;
        let removed = self.with_list(&tx.sender, |list| {
            let held = list.get(tx.nonce).map_or(false, |held| Arc::ptr_eq(held, &tx));
            if !held {
                return Vec::new();
            }
            list.remove(tx.nonce).into_iter().collect()
        });
        removed.into_iter().next()
    }

    /// Copy of the options attached to a stored transaction
    pub fn tx_options(&self, hash: &H256) -> Option<TxOptions> {
        self.by_hash.get(hash).and_then(|tx| tx.options.clone())
    }

    /// Get transaction by hash
    pub fn get(&self, hash: &H256) -> Option<Arc<PooledTransaction>> {
        self.by_hash.get(hash).map(|tx| Arc::clone(&tx))
    }

    /// Whether a transaction with `hash` is stored
    pub fn contains(&self, hash: &H256) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// A sender's transactions in ascending nonce order
    pub fn pending(&self, sender: &Address) -> Vec<Arc<PooledTransaction>> {
        self.by_sender
            .get(sender)
            .map(|list| list.lock().flatten())
            .unwrap_or_default()
    }

    /// Get total number of transactions
    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    /// Check if set is empty
    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    /// Number of senders with at least one transaction
    pub fn sender_count(&self) -> usize {
        self.by_sender.len()
    }

    /// Run `f` on a sender's list, unindex what it returns and drop the list
    /// if it ends up empty.
    fn with_list<F>(&self, sender: &Address, f: F) -> Vec<Arc<PooledTransaction>>
    where
        F: FnOnce(&mut TransactionList) -> Vec<Arc<PooledTransaction>>,
    {
        let removed = match self.by_sender.get(sender) {
            Some(entry) => f(&mut entry.lock()),
            None => return Vec::new(),
        };
        for tx in &removed {
            self.unindex(tx);
        }
        self.by_sender
            .remove_if(sender, |_, list| list.lock().is_empty());
        removed
    }

    /// Drop `tx` from the hash index unless another transaction now holds
    /// its hash.
    fn unindex(&self, tx: &Arc<PooledTransaction>) {
        self.by_hash
            .remove_if(&tx.hash, |_, held| Arc::ptr_eq(held, tx));
    }
}

impl Default for PendingSet {
    fn default() -> Self {
        Self::with_defaults()
    }
}
