//! Transaction pool error types

use condpool_policy::AdmissionError;
use condpool_primitives::{H256, U256};
use condpool_state::StorageError;
use thiserror::Error;

/// Transaction pool errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxPoolError {
    /// Transaction already exists
    #[error("transaction already exists: {0}")]
    AlreadyExists(H256),

    /// Price below the pool's admission floor
    #[error("transaction underpriced: price {price}, limit {limit}")]
    Underpriced {
        /// Offered price
        price: U256,
        /// Configured floor
        limit: U256,
    },

    /// Transaction underpriced for replacement
    #[error("replacement transaction underpriced: old {old}, new {new}")]
    ReplacementUnderpriced {
        /// Incumbent price
        old: U256,
        /// Offered price
        new: U256,
    },

    /// Attached tx options rejected at admission
    #[error(transparent)]
    TxOptions(#[from] AdmissionError),

    /// State backend failure
    #[error("state error: {0}")]
    State(#[from] StorageError),
}

/// Result type for transaction pool operations
pub type TxPoolResult<T> = Result<T, TxPoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TxPoolError::ReplacementUnderpriced {
            old: U256::from(100u64),
            new: U256::from(105u64),
        };
        assert_eq!(
            err.to_string(),
            "replacement transaction underpriced: old 100, new 105"
        );

        let err: TxPoolError = AdmissionError::TooLarge.into();
        assert_eq!(err.to_string(), "tx options too large");
    }
}
