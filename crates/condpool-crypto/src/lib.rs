//! # condpool-crypto
//!
//! Keccak-256 hashing used to derive storage commitments.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod hash;

pub use hash::{keccak256, keccak256_concat};
