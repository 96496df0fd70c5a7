//! In-memory state implementation

use crate::error::StorageResult;
use crate::traits::{Account, StateReader, StateWriter, EMPTY_STORAGE_ROOT};
use condpool_crypto::keccak256_concat;
use condpool_primitives::{Address, H256};
use std::collections::{BTreeMap, HashMap};

/// Commitment over a set of non-zero storage slots.
///
/// An empty set commits to [`EMPTY_STORAGE_ROOT`]; otherwise the root is the
/// keccak256 of the slot/value pairs in ascending slot order. This is a flat
/// commitment, not a Merkle-Patricia trie root: it changes whenever any slot
/// changes, which is the only property root checks rely on.
pub fn storage_root(slots: &BTreeMap<H256, H256>) -> H256 {
    if slots.is_empty() {
        return EMPTY_STORAGE_ROOT;
    }
    keccak256_concat(
        slots
            .iter()
            .flat_map(|(slot, value)| [slot.as_bytes().as_slice(), value.as_bytes().as_slice()]),
    )
}

/// In-memory world state.
///
/// Storage roots are kept current on every write, so reads never recompute.
#[derive(Default, Debug, Clone)]
pub struct MemoryState {
    /// Accounts by address
    accounts: HashMap<Address, Account>,
    /// Non-zero storage slots per account
    storage: HashMap<Address, BTreeMap<H256, H256>>,
}

impl MemoryState {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts present
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Number of non-zero storage slots held for `address`
    pub fn storage_count(&self, address: &Address) -> usize {
        self.storage.get(address).map_or(0, BTreeMap::len)
    }

    /// Check if state is empty
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn refresh_root(&mut self, address: Address) {
        let root = self
            .storage
            .get(&address)
            .map_or(EMPTY_STORAGE_ROOT, storage_root);
        self.accounts.entry(address).or_default().storage_root = root;
    }
}

impl StateReader for MemoryState {
    fn get_account(&self, address: &Address) -> StorageResult<Option<Account>> {
        Ok(self.accounts.get(address).cloned())
    }

    fn get_storage(&self, address: &Address, slot: &H256) -> StorageResult<H256> {
        Ok(self
            .storage
            .get(address)
            .and_then(|slots| slots.get(slot))
            .copied()
            .unwrap_or(H256::ZERO))
    }
}

impl StateWriter for MemoryState {
    fn set_nonce(&mut self, address: Address, nonce: u64) -> StorageResult<()> {
        self.accounts.entry(address).or_default().nonce = nonce;
        Ok(())
    }

    fn delete_account(&mut self, address: &Address) -> StorageResult<()> {
        self.accounts.remove(address);
        self.storage.remove(address);
        Ok(())
    }

    fn set_storage(&mut self, address: Address, slot: H256, value: H256) -> StorageResult<()> {
        tracing::trace!(%address, %slot, %value, "set storage");
        if value.is_zero() {
            if let Some(slots) = self.storage.get_mut(&address) {
                slots.remove(&slot);
                if slots.is_empty() {
                    self.storage.remove(&address);
                }
            }
        } else {
            self.storage.entry(address).or_default().insert(slot, value);
        }
        self.refresh_root(address);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Address::from_bytes(bytes)
    }

    // ==================== Storage ====================

    #[test]
    fn test_unwritten_slot_reads_zero() {
        let state = MemoryState::new();
        assert_eq!(
            state.get_storage(&addr(1), &H256::from_low_u64_be(3)).unwrap(),
            H256::ZERO
        );
        assert!(state.is_empty());
    }

    #[test]
    fn test_set_and_get_storage() {
        let mut state = MemoryState::new();
        let slot = H256::from_low_u64_be(1);
        let value = H256::from_low_u64_be(42);
        state.set_storage(addr(1), slot, value).unwrap();

        assert_eq!(state.get_storage(&addr(1), &slot).unwrap(), value);
        assert_eq!(state.get_storage(&addr(2), &slot).unwrap(), H256::ZERO);
        assert_eq!(state.storage_count(&addr(1)), 1);
    }

    #[test]
    fn test_zero_write_clears_slot() {
        let mut state = MemoryState::new();
        let slot = H256::from_low_u64_be(1);
        state.set_storage(addr(1), slot, H256::from_low_u64_be(5)).unwrap();
        state.set_storage(addr(1), slot, H256::ZERO).unwrap();

        assert_eq!(state.storage_count(&addr(1)), 0);
        assert_eq!(state.get_storage_root(&addr(1)).unwrap(), EMPTY_STORAGE_ROOT);
    }

    // ==================== Storage roots ====================

    #[test]
    fn test_untouched_account_has_empty_root() {
        let state = MemoryState::new();
        assert_eq!(state.get_storage_root(&addr(1)).unwrap(), EMPTY_STORAGE_ROOT);
    }

    #[test]
    fn test_root_changes_on_write() {
        let mut state = MemoryState::new();
        state
            .set_storage(addr(1), H256::ZERO, H256::from_low_u64_be(1))
            .unwrap();
        let first = state.get_storage_root(&addr(1)).unwrap();
        assert_ne!(first, EMPTY_STORAGE_ROOT);

        state
            .set_storage(addr(1), H256::ZERO, H256::from_low_u64_be(2))
            .unwrap();
        let second = state.get_storage_root(&addr(1)).unwrap();
        assert_ne!(first, second);

        // Other accounts are unaffected
        assert_eq!(state.get_storage_root(&addr(2)).unwrap(), EMPTY_STORAGE_ROOT);
    }

    #[test]
    fn test_root_is_order_independent() {
        let (s1, s2) = (H256::from_low_u64_be(1), H256::from_low_u64_be(2));
        let (v1, v2) = (H256::from_low_u64_be(10), H256::from_low_u64_be(20));

        let mut a = MemoryState::new();
        a.set_storage(addr(1), s1, v1).unwrap();
        a.set_storage(addr(1), s2, v2).unwrap();

        let mut b = MemoryState::new();
        b.set_storage(addr(1), s2, v2).unwrap();
        b.set_storage(addr(1), s1, v1).unwrap();

        assert_eq!(
            a.get_storage_root(&addr(1)).unwrap(),
            b.get_storage_root(&addr(1)).unwrap()
        );
    }

    // ==================== Accounts ====================

    #[test]
    fn test_nonce_and_delete() {
        let mut state = MemoryState::new();
        state.set_nonce(addr(1), 4).unwrap();
        assert_eq!(state.increment_nonce(&addr(1)).unwrap(), 5);
        assert_eq!(state.get_nonce(&addr(1)).unwrap(), 5);

        state
            .set_storage(addr(1), H256::ZERO, H256::from_low_u64_be(1))
            .unwrap();
        state.delete_account(&addr(1)).unwrap();
        assert!(!state.account_exists(&addr(1)).unwrap());
        assert_eq!(state.get_storage(&addr(1), &H256::ZERO).unwrap(), H256::ZERO);
        assert_eq!(state.account_count(), 0);
    }
}
