//! Policy error types

use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

/// JSON-RPC error codes for conditional transactions
pub mod error_code {
    /// A transaction's declared preconditions do not hold
    pub const TX_OPTIONS_UNSATISFIED: i64 = -32503;
}

/// The closed set of reasons a conditional transaction can become ineligible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxOptionsErrorKind {
    /// Current timestamp is outside `[timestampMin, timestampMax]`
    OutOfTimestampRange,
    /// Current block number is outside `[blockNumberMin, blockNumberMax]`
    OutOfBlockNumberRange,
    /// A declared storage root or slot value differs from current state
    KnownAccountsMismatch,
}

impl TxOptionsErrorKind {
    /// Stable JSON-RPC error code
    pub const fn code(self) -> i64 {
        match self {
            Self::OutOfTimestampRange
            | Self::OutOfBlockNumberRange
            | Self::KnownAccountsMismatch => error_code::TX_OPTIONS_UNSATISFIED,
        }
    }

    /// Human-readable message
    pub const fn message(self) -> &'static str {
        match self {
            Self::OutOfTimestampRange => "Out of timestamp range",
            Self::OutOfBlockNumberRange => "Out of blockNumber range",
            Self::KnownAccountsMismatch => "knownAccounts mismatch",
        }
    }
}

/// A policy violation, optionally carrying a nested diagnostic.
///
/// The displayed message is always the kind's stable message; the detail is
/// exposed separately through [`TxOptionsError::error_data`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .kind.message())]
pub struct TxOptionsError {
    kind: TxOptionsErrorKind,
    detail: Option<String>,
}

/// Current timestamp outside the declared window
pub const OUT_OF_TIMESTAMP_RANGE: TxOptionsError =
    TxOptionsError::new(TxOptionsErrorKind::OutOfTimestampRange);

/// Current block number outside the declared window
pub const OUT_OF_BLOCK_NUMBER_RANGE: TxOptionsError =
    TxOptionsError::new(TxOptionsErrorKind::OutOfBlockNumberRange);

/// Declared account state differs from current state
pub const KNOWN_ACCOUNTS_MISMATCH: TxOptionsError =
    TxOptionsError::new(TxOptionsErrorKind::KnownAccountsMismatch);

impl TxOptionsError {
    /// Create an error of the given kind without detail
    pub const fn new(kind: TxOptionsErrorKind) -> Self {
        Self { kind, detail: None }
    }

    /// Return a copy of this error carrying `detail`.
    ///
    /// Any previous detail is replaced; `self` is left untouched.
    pub fn with(&self, detail: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            detail: Some(detail.to_string()),
        }
    }

    /// Error kind
    pub fn kind(&self) -> TxOptionsErrorKind {
        self.kind
    }

    /// Stable JSON-RPC error code
    pub fn code(&self) -> i64 {
        self.kind.code()
    }

    /// Human-readable message
    pub fn message(&self) -> &'static str {
        self.kind.message()
    }

    /// Nested diagnostic, if any
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// JSON-RPC `data` member: `{"err": detail}` when a detail is attached
    pub fn error_data(&self) -> Option<Value> {
        self.detail.as_ref().map(|err| json!({ "err": err }))
    }

    /// Whether this error has the same kind as `other`, ignoring detail
    pub fn is(&self, other: &TxOptionsError) -> bool {
        self.kind == other.kind
    }
}

impl From<TxOptionsErrorKind> for TxOptionsError {
    fn from(kind: TxOptionsErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Rejections raised on the admission path, before a transaction is queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdmissionError {
    /// Evaluating the options would exceed the configured cost ceiling
    #[error("tx options too large")]
    TooLarge,

    /// The options are contradictory (e.g. an inverted window)
    #[error("invalid tx options")]
    Invalid,
}
