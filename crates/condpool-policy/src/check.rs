//! Evaluation of transaction options against chain state

use crate::error::{
    TxOptionsError, KNOWN_ACCOUNTS_MISMATCH, OUT_OF_BLOCK_NUMBER_RANGE, OUT_OF_TIMESTAMP_RANGE,
};
use crate::options::TxOptions;
use condpool_primitives::{Address, BlockNumber, Timestamp};
use condpool_state::{StateReader, StorageError};
use std::fmt;

/// The block a sweep evaluates inclusion against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockContext {
    /// Block number
    pub number: BlockNumber,
    /// Block timestamp (seconds)
    pub timestamp: Timestamp,
}

impl BlockContext {
    /// Create a new block context
    pub fn new(number: impl Into<BlockNumber>, timestamp: Timestamp) -> Self {
        Self {
            number: number.into(),
            timestamp,
        }
    }
}

/// Whether `value` lies in `[min, max]`, where a missing bound is open
fn within<T: PartialOrd>(value: &T, min: Option<&T>, max: Option<&T>) -> bool {
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

struct Window<'a, T>(Option<&'a T>, Option<&'a T>);

impl<T: fmt::Display> fmt::Display for Window<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(min) => write!(f, "[{}, ", min)?,
            None => f.write_str("(-inf, ")?,
        }
        match self.1 {
            Some(max) => write!(f, "{}]", max),
            None => f.write_str("+inf)"),
        }
    }
}

fn read_failure(address: &Address, err: StorageError) -> TxOptionsError {
    tracing::warn!(%address, %err, "state read failed while checking known accounts");
    KNOWN_ACCOUNTS_MISMATCH.with(format_args!("reading {}: {}", address, err))
}

impl TxOptions {
    /// Check the block-number window against `number`
    pub fn check_block_number(&self, number: &BlockNumber) -> Result<(), TxOptionsError> {
        let (min, max) = (self.block_number_min.as_ref(), self.block_number_max.as_ref());
        if within(number, min, max) {
            return Ok(());
        }
        Err(OUT_OF_BLOCK_NUMBER_RANGE.with(format_args!(
            "block number {} outside {}",
            number,
            Window(min, max)
        )))
    }

    /// Check the timestamp window against `timestamp`
    pub fn check_timestamp(&self, timestamp: Timestamp) -> Result<(), TxOptionsError> {
        let (min, max) = (self.timestamp_min.as_ref(), self.timestamp_max.as_ref());
        if within(&timestamp, min, max) {
            return Ok(());
        }
        Err(OUT_OF_TIMESTAMP_RANGE.with(format_args!(
            "timestamp {} outside {}",
            timestamp,
            Window(min, max)
        )))
    }

    /// Check every declared account against `state`, stopping at the first
    /// mismatch.
    ///
    /// Issues one read per root expectation and one per expected slot. A read
    /// that fails counts as a mismatch.
    pub fn check_known_accounts<S>(&self, state: &S) -> Result<(), TxOptionsError>
    where
        S: StateReader + ?Sized,
    {
        for (address, account) in self.known_accounts.iter().flatten() {
            if let Some(expected) = account.root() {
                let actual = state
                    .get_storage_root(address)
                    .map_err(|e| read_failure(address, e))?;
                if actual != expected {
                    return Err(KNOWN_ACCOUNTS_MISMATCH.with(format_args!(
                        "storage root of {} is {}, expected {}",
                        address, actual, expected
                    )));
                }
            } else if let Some(slots) = account.slots() {
                for (slot, expected) in slots {
                    let actual = state
                        .get_storage(address, slot)
                        .map_err(|e| read_failure(address, e))?;
                    if actual != *expected {
                        return Err(KNOWN_ACCOUNTS_MISMATCH.with(format_args!(
                            "slot {} of {} is {}, expected {}",
                            slot, address, actual, expected
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Evaluate all preconditions: block window, then timestamp window, then
    /// known accounts. The first failing check decides the error.
    pub fn check<S>(&self, state: &S, block: &BlockContext) -> Result<(), TxOptionsError>
    where
        S: StateReader + ?Sized,
    {
        self.check_block_number(&block.number)?;
        self.check_timestamp(block.timestamp)?;
        self.check_known_accounts(state)
    }
}
