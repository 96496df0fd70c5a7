//! # condpool-policy
//!
//! Policy-level preconditions for conditional transactions.
//!
//! A transaction may carry [`TxOptions`]: expected account state
//! ([`KnownAccount`]) plus block-number and timestamp windows. Block
//! producers should include it only while every precondition holds.
//!
//! - [`TxOptions::cost`] bounds how many checks evaluation takes and is
//!   enforced at admission through [`TxOptions::validate`]
//! - [`TxOptions::check`] evaluates the options against a
//!   [`StateReader`](condpool_state::StateReader) and a [`BlockContext`]
//! - [`TxOptionsError`] is the typed reason a transaction stopped qualifying
//!
//! ## Wire format
//!
//! ```json
//! {
//!   "knownAccounts": {
//!     "0x6b3a8798e5fb9fc5603f3ab5ea2e8136694e55d0": "0x290d...e563",
//!     "0x00000000000000000000000000000000000000aa": { "0xc65a...d2a8": "0x0000...0000" }
//!   },
//!   "blockNumberMin": "0x1",
//!   "timestampMax": "0xffffff"
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod check;
mod error;
mod options;

pub use check::BlockContext;
pub use error::{
    error_code, AdmissionError, TxOptionsError, TxOptionsErrorKind, KNOWN_ACCOUNTS_MISMATCH,
    OUT_OF_BLOCK_NUMBER_RANGE, OUT_OF_TIMESTAMP_RANGE,
};
pub use options::{KnownAccount, KnownAccounts, TxOptions};
