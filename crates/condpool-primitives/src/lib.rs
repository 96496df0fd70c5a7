//! # condpool-primitives
//!
//! Primitive types shared by the condpool crates.
//!
//! - [`Address`] - 20-byte account address
//! - [`H256`] - 32-byte hash, storage slot and storage value
//! - [`U256`] - 256-bit unsigned integer (prices, block numbers)
//!
//! With the `serde` feature enabled every type serializes as a `0x`-prefixed
//! hex string, and [`serde_helpers`] provides the u64 quantity encoding.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod hash;
#[cfg(feature = "serde")]
pub mod serde_helpers;

pub use address::{Address, AddressError};
pub use hash::{HashError, H256};

// Re-export primitive-types for U256
pub use primitive_types::U256;

/// Block number type
pub type BlockNumber = U256;

/// Transaction nonce type
pub type Nonce = u64;

/// Unix timestamp in seconds
pub type Timestamp = u64;
