//! Storage traits for state access

use crate::error::{StorageError, StorageResult};
use condpool_primitives::{Address, H256};

/// Account data as seen by the pool
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    /// Account nonce
    pub nonce: u64,
    /// Storage root (commitment over the account's storage)
    pub storage_root: H256,
}

/// Empty storage root (keccak256 of RLP encoded empty string)
pub const EMPTY_STORAGE_ROOT: H256 = H256::from_bytes([
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6,
    0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0,
    0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
]);

impl Account {
    /// Create a new empty account
    pub fn new() -> Self {
        Self {
            nonce: 0,
            storage_root: EMPTY_STORAGE_ROOT,
        }
    }

    /// Check if the account has any storage
    pub fn has_storage(&self) -> bool {
        self.storage_root != EMPTY_STORAGE_ROOT
    }
}

impl Default for Account {
    fn default() -> Self {
        Self::new()
    }
}

/// Read access to state.
///
/// This is the capability policy evaluation runs against. Implementations
/// must not mutate state as a side effect of a read.
pub trait StateReader {
    /// Get account by address
    fn get_account(&self, address: &Address) -> StorageResult<Option<Account>>;

    /// Get storage value. Slots that were never written read as zero.
    fn get_storage(&self, address: &Address, slot: &H256) -> StorageResult<H256>;

    /// Get the account's current storage root.
    ///
    /// Accounts that do not exist report [`EMPTY_STORAGE_ROOT`].
    fn get_storage_root(&self, address: &Address) -> StorageResult<H256> {
        Ok(self
            .get_account(address)?
            .map(|a| a.storage_root)
            .unwrap_or(EMPTY_STORAGE_ROOT))
    }

    /// Check if account exists
    fn account_exists(&self, address: &Address) -> StorageResult<bool> {
        Ok(self.get_account(address)?.is_some())
    }

    /// Get account nonce
    fn get_nonce(&self, address: &Address) -> StorageResult<u64> {
        Ok(self.get_account(address)?.map(|a| a.nonce).unwrap_or(0))
    }
}

impl<T: StateReader + ?Sized> StateReader for &T {
    fn get_account(&self, address: &Address) -> StorageResult<Option<Account>> {
        (**self).get_account(address)
    }

    fn get_storage(&self, address: &Address, slot: &H256) -> StorageResult<H256> {
        (**self).get_storage(address, slot)
    }

    fn get_storage_root(&self, address: &Address) -> StorageResult<H256> {
        (**self).get_storage_root(address)
    }
}

/// Write access to state
pub trait StateWriter {
    /// Set the account nonce, creating the account if needed
    fn set_nonce(&mut self, address: Address, nonce: u64) -> StorageResult<()>;

    /// Delete account and all of its storage
    fn delete_account(&mut self, address: &Address) -> StorageResult<()>;

    /// Set storage value. Writing zero clears the slot.
    fn set_storage(&mut self, address: Address, slot: H256, value: H256) -> StorageResult<()>;

    /// Increment nonce
    fn increment_nonce(&mut self, address: &Address) -> StorageResult<u64>
    where
        Self: StateReader,
    {
        let nonce = self
            .get_nonce(address)?
            .checked_add(1)
            .ok_or_else(|| StorageError::InvalidFormat("nonce overflow".into()))?;
        self.set_nonce(*address, nonce)?;
        Ok(nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRoot(H256);

    impl StateReader for FixedRoot {
        fn get_account(&self, _address: &Address) -> StorageResult<Option<Account>> {
            Ok(Some(Account {
                nonce: 7,
                storage_root: self.0,
            }))
        }

        fn get_storage(&self, _address: &Address, _slot: &H256) -> StorageResult<H256> {
            Ok(H256::ZERO)
        }
    }

    struct NoAccounts;

    impl StateReader for NoAccounts {
        fn get_account(&self, _address: &Address) -> StorageResult<Option<Account>> {
            Ok(None)
        }

        fn get_storage(&self, _address: &Address, _slot: &H256) -> StorageResult<H256> {
            Ok(H256::ZERO)
        }
    }

    #[test]
    fn test_empty_account() {
        let account = Account::new();
        assert_eq!(account.nonce, 0);
        assert!(!account.has_storage());
        assert_eq!(Account::default(), account);
    }

    #[test]
    fn test_default_storage_root_reads_account() {
        let root = H256::from_bytes([0x02; 32]);
        let state = FixedRoot(root);
        assert_eq!(state.get_storage_root(&Address::ZERO).unwrap(), root);
        assert_eq!(state.get_nonce(&Address::ZERO).unwrap(), 7);
        assert!(state.account_exists(&Address::ZERO).unwrap());
    }

    #[test]
    fn test_missing_account_has_empty_root() {
        let state = NoAccounts;
        assert_eq!(
            state.get_storage_root(&Address::ZERO).unwrap(),
            EMPTY_STORAGE_ROOT
        );
        assert_eq!(state.get_nonce(&Address::ZERO).unwrap(), 0);
        assert!(!state.account_exists(&Address::ZERO).unwrap());
    }

    #[test]
    fn test_reader_through_reference() {
        fn root_of<S: StateReader>(state: S) -> H256 {
            state.get_storage_root(&Address::ZERO).unwrap()
        }
        let state = FixedRoot(H256::from_bytes([0x09; 32]));
        assert_eq!(root_of(&state), H256::from_bytes([0x09; 32]));
    }
}
