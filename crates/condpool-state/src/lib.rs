//! # condpool-state
//!
//! State access for condpool.
//!
//! This crate provides:
//! - [`StateReader`]: the read capability policy checks are evaluated against
//! - [`StateWriter`]: the write side, owned by the execution layer
//! - [`MemoryState`]: an in-memory implementation that maintains a storage
//!   commitment per account

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod memory;
mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::{storage_root, MemoryState};
pub use traits::{Account, StateReader, StateWriter, EMPTY_STORAGE_ROOT};
