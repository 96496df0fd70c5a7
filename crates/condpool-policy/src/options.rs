//! Conditional transaction options and their wire format

use crate::error::AdmissionError;
use condpool_primitives::serde_helpers::{quantity_opt, quantity_u256_opt};
use condpool_primitives::{Address, H256, U256};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Expected account state, keyed by address
pub type KnownAccounts = HashMap<Address, KnownAccount>;

/// Policy-level preconditions attached to a transaction.
///
/// An honest block producer only includes the transaction while every
/// precondition holds. Nothing in consensus enforces them.
///
/// `Clone` is a deep copy: the clone owns fresh maps and bound values and can
/// be handed across lock boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxOptions {
    /// Expected prestate per account. `None` when the key was omitted,
    /// `Some(empty)` for `"knownAccounts": {}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_accounts: Option<KnownAccounts>,
    /// Lowest block number the transaction may be included in
    #[serde(default, with = "quantity_u256_opt", skip_serializing_if = "Option::is_none")]
    pub block_number_min: Option<U256>,
    /// Highest block number the transaction may be included in
    #[serde(default, with = "quantity_u256_opt", skip_serializing_if = "Option::is_none")]
    pub block_number_max: Option<U256>,
    /// Lowest block timestamp the transaction may be included at
    #[serde(default, with = "quantity_opt", skip_serializing_if = "Option::is_none")]
    pub timestamp_min: Option<u64>,
    /// Highest block timestamp the transaction may be included at
    #[serde(default, with = "quantity_opt", skip_serializing_if = "Option::is_none")]
    pub timestamp_max: Option<u64>,
}

impl TxOptions {
    /// Number of checks evaluating these options takes.
    ///
    /// One per storage-root expectation, one per expected slot, one for the
    /// block-number window and one for the timestamp window when set.
    pub fn cost(&self) -> usize {
        let accounts: usize = self
            .known_accounts
            .iter()
            .flatten()
            .map(|(_, account)| account.cost())
            .sum();
        let block_window = usize::from(self.block_number_min.is_some() || self.block_number_max.is_some());
        let time_window = usize::from(self.timestamp_min.is_some() || self.timestamp_max.is_some());
        accounts + block_window + time_window
    }

    /// Admission-time validation: reject options that are too expensive to
    /// evaluate or can never be satisfied.
    pub fn validate(&self, max_cost: usize) -> Result<(), AdmissionError> {
        let cost = self.cost();
        if cost > max_cost {
            tracing::debug!(cost, max_cost, "rejecting tx options over cost ceiling");
            return Err(AdmissionError::TooLarge);
        }
        if let (Some(min), Some(max)) = (self.block_number_min, self.block_number_max) {
            if min > max {
                tracing::debug!(%min, %max, "rejecting inverted block number window");
                return Err(AdmissionError::Invalid);
            }
        }
        if let (Some(min), Some(max)) = (self.timestamp_min, self.timestamp_max) {
            if min > max {
                tracing::debug!(min, max, "rejecting inverted timestamp window");
                return Err(AdmissionError::Invalid);
            }
        }
        Ok(())
    }

    /// Whether the options declare no precondition at all
    pub fn is_unconditional(&self) -> bool {
        self.cost() == 0
    }
}

/// A precondition on one account: either its full storage root or a set of
/// individual slot values.
///
/// The two forms are mutually exclusive; the only constructors are
/// [`KnownAccount::from_root`] and [`KnownAccount::from_slots`]. The root
/// form carries an empty slot map, the same shape decoding produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownAccount {
    storage_root: Option<H256>,
    storage_slots: HashMap<H256, H256>,
}

impl KnownAccount {
    /// Expect the account's storage root to equal `root`
    pub fn from_root(root: H256) -> Self {
        Self {
            storage_root: Some(root),
            storage_slots: HashMap::new(),
        }
    }

    /// Expect each listed slot to hold the given value
    pub fn from_slots(slots: HashMap<H256, H256>) -> Self {
        Self {
            storage_root: None,
            storage_slots: slots,
        }
    }

    /// The expected storage root, if this is a root precondition
    pub fn root(&self) -> Option<H256> {
        self.storage_root
    }

    /// The expected slot values, if this is a slots precondition
    pub fn slots(&self) -> Option<&HashMap<H256, H256>> {
        match self.storage_root {
            Some(_) => None,
            None => Some(&self.storage_slots),
        }
    }

    /// Number of state reads checking this precondition takes
    pub fn cost(&self) -> usize {
        match self.storage_root {
            Some(_) => 1,
            None => self.storage_slots.len(),
        }
    }
}

impl Serialize for KnownAccount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.storage_root {
            Some(root) => root.serialize(serializer),
            None => self.storage_slots.serialize(serializer),
        }
    }
}

// Ordered parse: a bare hash string is a root, an object is a slot map,
// anything else is rejected.
struct KnownAccountVisitor;

impl<'de> Visitor<'de> for KnownAccountVisitor {
    type Value = KnownAccount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a 32-byte storage root or an object of storage slots")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<KnownAccount, E> {
        let root = H256::deserialize(de::value::StrDeserializer::<E>::new(v))?;
        Ok(KnownAccount::from_root(root))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<KnownAccount, A::Error> {
        let mut slots = HashMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((slot, value)) = map.next_entry::<H256, H256>()? {
            slots.insert(slot, value);
        }
        Ok(KnownAccount::from_slots(slots))
    }
}

impl<'de> Deserialize<'de> for KnownAccount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(KnownAccountVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x6b3A8798E5Fb9fC5603F3aB5eA2e8136694e55d0";
    const ROOT: &str = "0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563";
    const SLOT: &str = "0xc65a7bb8d6351c1cf70c95a316cc6a92839c986682d98bc35f958f4883f9d2a8";

    fn addr() -> Address {
        Address::from_hex(ADDR).unwrap()
    }

    fn slot(n: u64) -> H256 {
        H256::from_low_u64_be(n)
    }

    fn decode(json: &str) -> Result<TxOptions, serde_json::Error> {
        serde_json::from_str(json)
    }

    // ===== Decoding =====

    #[test]
    fn test_decode_storage_root() {
        let json = format!(r#"{{"knownAccounts":{{"{ADDR}":"{ROOT}"}}}}"#);
        let opts = decode(&json).unwrap();

        let expected = TxOptions {
            known_accounts: Some(HashMap::from([(
                addr(),
                KnownAccount::from_root(H256::from_hex(ROOT).unwrap()),
            )])),
            ..Default::default()
        };
        assert_eq!(opts, expected);

        let account = &opts.known_accounts.as_ref().unwrap()[&addr()];
        assert_eq!(account.root(), Some(H256::from_hex(ROOT).unwrap()));
        assert_eq!(account.slots(), None);
    }

    #[test]
    fn test_decode_storage_slots() {
        let json = format!(
            r#"{{"knownAccounts":{{"{ADDR}":{{"{SLOT}":"0x0000000000000000000000000000000000000000000000000000000000000000"}}}}}}"#
        );
        let opts = decode(&json).unwrap();

        let account = &opts.known_accounts.as_ref().unwrap()[&addr()];
        assert_eq!(account.root(), None);
        assert_eq!(
            account.slots(),
            Some(&HashMap::from([(H256::from_hex(SLOT).unwrap(), H256::ZERO)]))
        );
    }

    #[test]
    fn test_decode_empty_known_accounts_is_present() {
        let opts = decode(r#"{"knownAccounts":{}}"#).unwrap();
        assert_eq!(opts.known_accounts, Some(HashMap::new()));

        let omitted = decode("{}").unwrap();
        assert_eq!(omitted.known_accounts, None);
        assert_ne!(opts, omitted);
    }

    #[test]
    fn test_decode_empty_strings_fails() {
        assert!(decode(r#"{"knownAccounts":{"":""}}"#).is_err());

        // Nothing partial survives a failed decode
        let opts = decode(r#"{"knownAccounts":{"":""}}"#).unwrap_or_default();
        assert_eq!(opts.known_accounts, None);
    }

    #[test]
    fn test_decode_rejects_other_shapes() {
        let cases = [
            format!(r#"{{"knownAccounts":{{"{ADDR}":42}}}}"#),
            format!(r#"{{"knownAccounts":{{"{ADDR}":["{ROOT}"]}}}}"#),
            format!(r#"{{"knownAccounts":{{"{ADDR}":"0x1234"}}}}"#),
            format!(r#"{{"knownAccounts":{{"{ADDR}":{{"{SLOT}":""}}}}}}"#),
            format!(r#"{{"knownAccounts":{{"{ADDR}":{{"":"{ROOT}"}}}}}}"#),
            r#"{"knownAccounts":[]}"#.to_string(),
        ];
        for json in &cases {
            assert!(decode(json).is_err(), "expected failure for {}", json);
        }
    }

    #[test]
    fn test_decode_block_number_bounds() {
        let opts = decode(r#"{"blockNumberMin":"0x1"}"#).unwrap();
        assert_eq!(opts.block_number_min, Some(U256::from(1u64)));
        assert_eq!(opts.block_number_max, None);

        let opts = decode(r#"{"blockNumberMin":"0x1", "blockNumberMax":"0x2"}"#).unwrap();
        assert_eq!(opts.block_number_min, Some(U256::from(1u64)));
        assert_eq!(opts.block_number_max, Some(U256::from(2u64)));
        assert_eq!(opts.known_accounts, None);
    }

    #[test]
    fn test_decode_block_number_bounds_strict_quantity() {
        let too_long = format!(r#"{{"blockNumberMax":"0x1{}"}}"#, "0".repeat(64));
        let cases = [
            r#"{"blockNumberMin":"10"}"#,
            r#"{"blockNumberMin":"0x"}"#,
            r#"{"blockNumberMin":"0x01"}"#,
            r#"{"blockNumberMax":"0x0001"}"#,
            r#"{"blockNumberMax":10}"#,
            too_long.as_str(),
        ];
        for json in cases {
            assert!(decode(json).is_err(), "expected failure for {}", json);
        }

        // Bounds and timestamps share one quantity grammar
        assert!(decode(r#"{"timestampMin":"0x01"}"#).is_err());
        let opts = decode(r#"{"blockNumberMin":"0x0"}"#).unwrap();
        assert_eq!(opts.block_number_min, Some(U256::zero()));
    }

    #[test]
    fn test_decode_timestamp_bounds() {
        let opts = decode(r#"{"timestampMin":"0xffff"}"#).unwrap();
        assert_eq!(opts.timestamp_min, Some(0xffff));

        let opts = decode(r#"{"timestampMax":"0xffffff"}"#).unwrap();
        assert_eq!(opts.timestamp_max, Some(0xffffff));
        assert_eq!(opts.timestamp_min, None);

        assert!(decode(r#"{"timestampMax":16777215}"#).is_err());
    }

    // ===== Round trips =====

    #[test]
    fn test_round_trip_variants() {
        let cases = vec![
            TxOptions {
                known_accounts: Some(HashMap::from([(addr(), KnownAccount::from_root(slot(9)))])),
                ..Default::default()
            },
            TxOptions {
                known_accounts: Some(HashMap::from([(
                    addr(),
                    KnownAccount::from_slots(HashMap::from([(slot(1), slot(2)), (slot(3), H256::ZERO)])),
                )])),
                ..Default::default()
            },
            TxOptions {
                known_accounts: Some(HashMap::new()),
                ..Default::default()
            },
            TxOptions {
                block_number_min: Some(U256::from(10u64)),
                block_number_max: Some(U256::from(20u64)),
                timestamp_min: Some(1_700_000_000),
                ..Default::default()
            },
            TxOptions::default(),
        ];

        for opts in cases {
            let json = serde_json::to_string(&opts).unwrap();
            let decoded: TxOptions = serde_json::from_str(&json).unwrap();
            assert_eq!(decoded, opts, "round trip through {}", json);
        }
    }

    #[test]
    fn test_encode_omits_unbounded() {
        let opts = TxOptions {
            block_number_max: Some(U256::from(255u64)),
            timestamp_min: Some(0xffff),
            ..Default::default()
        };
        let value = serde_json::to_value(&opts).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "blockNumberMax": "0xff", "timestampMin": "0xffff" })
        );
    }

    // ===== Cost =====

    #[test]
    fn test_cost_empty() {
        assert_eq!(TxOptions::default().cost(), 0);
        assert!(TxOptions::default().is_unconditional());
    }

    #[test]
    fn test_cost_counts_roots_and_slots() {
        let mut accounts = KnownAccounts::new();
        accounts.insert(Address::from_bytes([1; 20]), KnownAccount::from_root(slot(1)));
        accounts.insert(
            Address::from_bytes([2; 20]),
            KnownAccount::from_slots(HashMap::from([(slot(1), slot(1)), (slot(2), slot(2))])),
        );
        let opts = TxOptions {
            known_accounts: Some(accounts),
            ..Default::default()
        };
        assert_eq!(opts.cost(), 3);
    }

    #[test]
    fn test_cost_windows_count_once() {
        let one_end = TxOptions {
            block_number_min: Some(U256::one()),
            ..Default::default()
        };
        let both_ends = TxOptions {
            block_number_min: Some(U256::one()),
            block_number_max: Some(U256::from(2u64)),
            ..Default::default()
        };
        assert_eq!(one_end.cost(), 1);
        assert_eq!(both_ends.cost(), 1);

        let all = TxOptions {
            timestamp_max: Some(5),
            ..both_ends
        };
        assert_eq!(all.cost(), 2);
    }

    // ===== Copy =====

    #[test]
    fn test_clone_is_independent() {
        let original = TxOptions {
            known_accounts: Some(HashMap::from([(
                addr(),
                KnownAccount::from_slots(HashMap::from([(slot(1), slot(2))])),
            )])),
            block_number_min: Some(U256::from(3u64)),
            timestamp_max: Some(99),
            ..Default::default()
        };

        let mut copy = original.clone();
        assert_eq!(copy, original);

        copy.known_accounts
            .as_mut()
            .unwrap()
            .insert(Address::ZERO, KnownAccount::from_root(slot(7)));
        copy.block_number_min = Some(U256::from(4u64));
        copy.timestamp_max = None;

        assert_eq!(original.known_accounts.as_ref().unwrap().len(), 1);
        assert_eq!(original.block_number_min, Some(U256::from(3u64)));
        assert_eq!(original.timestamp_max, Some(99));
    }

    // ===== Admission validation =====

    #[test]
    fn test_validate_cost_ceiling() {
        let slots: HashMap<H256, H256> = (0..5).map(|i| (slot(i), slot(i))).collect();
        let opts = TxOptions {
            known_accounts: Some(HashMap::from([(addr(), KnownAccount::from_slots(slots))])),
            ..Default::default()
        };
        assert_eq!(opts.validate(5), Ok(()));
        assert_eq!(opts.validate(4), Err(AdmissionError::TooLarge));
    }

    #[test]
    fn test_validate_inverted_windows() {
        let blocks = TxOptions {
            block_number_min: Some(U256::from(10u64)),
            block_number_max: Some(U256::from(9u64)),
            ..Default::default()
        };
        assert_eq!(blocks.validate(100), Err(AdmissionError::Invalid));

        let times = TxOptions {
            timestamp_min: Some(10),
            timestamp_max: Some(10),
            ..Default::default()
        };
        assert_eq!(times.validate(100), Ok(()));

        let inverted = TxOptions {
            timestamp_max: Some(9),
            ..times
        };
        assert_eq!(inverted.validate(100), Err(AdmissionError::Invalid));
    }
}
