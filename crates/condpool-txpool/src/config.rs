//! Pool configuration

use condpool_primitives::U256;
use serde::Deserialize;

/// Default minimum price for admission
pub const DEFAULT_PRICE_LIMIT: u64 = 1;

/// Default price bump percentage required to replace a transaction
pub const DEFAULT_PRICE_BUMP: u64 = 10;

/// Default number of transactions held per sender
pub const DEFAULT_ACCOUNT_SLOTS: usize = 16;

/// Default ceiling on [`TxOptions::cost`](condpool_policy::TxOptions::cost)
pub const DEFAULT_MAX_TX_OPTIONS_COST: usize = 1000;

/// Pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoolConfig {
    /// Minimum price for admission
    pub price_limit: U256,
    /// Minimum price bump percentage for replacing a transaction at the same nonce
    pub price_bump: u64,
    /// Maximum transactions held per sender
    pub account_slots: usize,
    /// Maximum evaluation cost of attached tx options
    pub max_tx_options_cost: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            price_limit: U256::from(DEFAULT_PRICE_LIMIT),
            price_bump: DEFAULT_PRICE_BUMP,
            account_slots: DEFAULT_ACCOUNT_SLOTS,
            max_tx_options_cost: DEFAULT_MAX_TX_OPTIONS_COST,
        }
    }
}
