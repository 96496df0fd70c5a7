//! Pooled transaction type

use condpool_policy::TxOptions;
use condpool_primitives::{Address, Nonce, H256, U256};

/// A transaction as the pool sees it.
///
/// Signature recovery and hashing happen before the pool; `sender` and `hash`
/// are taken as given. Once built the transaction is shared as
/// `Arc<PooledTransaction>` and never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PooledTransaction {
    /// Recovered sender address
    pub sender: Address,
    /// Sender nonce
    pub nonce: Nonce,
    /// Price used for replacement and floor comparisons
    pub gas_price: U256,
    /// Gas limit
    pub gas_limit: u64,
    /// Transaction hash
    pub hash: H256,
    /// Inclusion preconditions, if the transaction is conditional
    pub options: Option<TxOptions>,
}

impl PooledTransaction {
    /// Create an unconditional transaction
    pub fn new(sender: Address, nonce: Nonce, gas_price: impl Into<U256>, gas_limit: u64, hash: H256) -> Self {
        Self {
            sender,
            nonce,
            gas_price: gas_price.into(),
            gas_limit,
            hash,
            options: None,
        }
    }

    /// Attach inclusion preconditions
    pub fn with_options(mut self, options: TxOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Whether the transaction carries preconditions
    pub fn is_conditional(&self) -> bool {
        self.options.is_some()
    }

    /// Evaluation cost of the attached options (zero when unconditional)
    pub fn options_cost(&self) -> usize {
        self.options.as_ref().map_or(0, TxOptions::cost)
    }
}
