//! # condpool-txpool
//!
//! Per-sender transaction lists for a pool that accepts conditional
//! transactions.
//!
//! This crate provides:
//! - [`TransactionList`]: one sender's transactions keyed by nonce, with
//!   price-bump replacement, price-floor and tx-options sweeps
//! - [`PendingSet`]: a registry of strict lists with admission checks and
//!   list lifecycle
//!
//! ## Architecture
//!
//! ```text
//! +------------------+
//! |    PendingSet    |  <- admission: duplicate, price floor, options cost
//! +------------------+
//!          |
//! +------------------+
//! | TransactionList  |  <- one per sender, unique nonce per entry
//! +------------------+
//!          |
//! +------------------+
//! |   StateReader    |  <- tx options checked against current state
//! +------------------+
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use condpool_txpool::{PendingSet, PooledTransaction};
//!
//! let pool = PendingSet::with_defaults();
//! pool.add(PooledTransaction::new(sender, 0, price, 21_000, hash))?;
//! let dropped = pool.filter_tx_options(&state, &BlockContext::new(number, timestamp));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod list;
mod pool;
mod transaction;

pub use config::{
    PoolConfig, DEFAULT_ACCOUNT_SLOTS, DEFAULT_MAX_TX_OPTIONS_COST, DEFAULT_PRICE_BUMP,
    DEFAULT_PRICE_LIMIT,
};
pub use error::{TxPoolError, TxPoolResult};
pub use list::{can_replace, replacement_threshold, TransactionList};
pub use pool::{AddOutcome, PendingSet};
pub use transaction::PooledTransaction;
