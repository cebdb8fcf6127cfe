//! Ledgers: participant → amount mappings
//!
//! One type backs weight tables, per-round distributions and merged
//! ledgers. Entries live in a `BTreeMap`, so iteration order is ascending
//! participant identity everywhere, and serialization is deterministic.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::{Amount, ParticipantId, Result, RewardError};

/// Participant identity → amount, one entry per identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: BTreeMap<ParticipantId, Amount>,
}

/// Point weights of one reward round
pub type WeightTable = Ledger;

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from `(identity, amount)` pairs, rejecting duplicates.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (ParticipantId, Amount)>,
    {
        let mut ledger = Self::new();
        for (id, amount) in entries {
            ledger.insert(id, amount)?;
        }
        Ok(ledger)
    }

    /// Insert a new participant. An identity that is already present is an
    /// error, never an overwrite.
    pub fn insert(&mut self, id: ParticipantId, amount: Amount) -> Result<()> {
        match self.entries.entry(id) {
            btree_map::Entry::Occupied(occupied) => Err(RewardError::DuplicateParticipant(
                occupied.key().to_string(),
            )),
            btree_map::Entry::Vacant(vacant) => {
                vacant.insert(amount);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &ParticipantId) -> Option<Amount> {
        self.entries.get(id).copied()
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in ascending identity order
    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, Amount)> + '_ {
        self.entries.iter().map(|(id, amount)| (id, *amount))
    }

    pub fn amounts(&self) -> impl Iterator<Item = &Amount> + '_ {
        self.entries.values()
    }

    /// Exact sum of every amount
    pub fn total(&self) -> Result<Amount> {
        Amount::checked_sum(self.entries.values())
            .ok_or_else(|| RewardError::InvalidAmount("ledger total exceeds 256 bits".to_string()))
    }

    /// SHA-256 over the canonical `identity=amount\n` lines, hex encoded
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (id, amount) in &self.entries {
            hasher.update(id.as_str().as_bytes());
            hasher.update(b"=");
            hasher.update(amount.to_string().as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }

    /// Parse a JSON object of identity → decimal-integer string.
    ///
    /// Keys are kept in document order until inserted so that a repeated
    /// key (or two spellings of one hex address) is reported as a
    /// duplicate instead of silently collapsing.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawEntries = serde_json::from_str(json)
            .map_err(|e| RewardError::Parse(format!("invalid points JSON: {e}")))?;

        let mut ledger = Self::new();
        for (raw_id, raw_amount) in raw.0 {
            let id = ParticipantId::parse(&raw_id)?;
            let amount = raw_amount.parse::<Amount>().map_err(|e| match e {
                RewardError::Parse(msg) => RewardError::Parse(format!("{id}: {msg}")),
                RewardError::InvalidAmount(msg) => {
                    RewardError::InvalidAmount(format!("{id}: {msg}"))
                }
                other => other,
            })?;
            ledger.insert(id, amount)?;
        }
        Ok(ledger)
    }

    /// Read and parse a points / ledger JSON file
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RewardError::io(path, e))?;
        Self::from_json_str(&content)
    }

    /// Pretty JSON (two-space indent), keys in ascending identity order
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RewardError::Parse(format!("failed to encode ledger: {e}")))
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = (&'a ParticipantId, &'a Amount);
    type IntoIter = btree_map::Iter<'a, ParticipantId, Amount>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for Ledger {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter())
    }
}

/// JSON object entries in document order, duplicates preserved
struct RawEntries(Vec<(String, String)>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct RawVisitor;

        impl<'de> Visitor<'de> for RawVisitor {
            type Value = RawEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object mapping identities to decimal strings")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<RawEntries, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    entries.push((key, value));
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(RawVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ParticipantId {
        ParticipantId::parse(s).unwrap()
    }

    #[test]
    fn test_from_json_str() {
        let ledger = Ledger::from_json_str(r#"{"0xAA": "10", "0xbb": "0", "carol": "7"}"#).unwrap();
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.get(&id("0xaa")), Some(Amount::from(10u64)));
        assert_eq!(ledger.get(&id("0xBB")), Some(Amount::zero()));
        assert_eq!(ledger.total().unwrap(), Amount::from(17u64));
    }

    #[test]
    fn test_from_json_str_rejects_repeated_key() {
        let err = Ledger::from_json_str(r#"{"a": "1", "a": "2"}"#).unwrap_err();
        assert!(matches!(err, RewardError::DuplicateParticipant(ref who) if who == "a"));
    }

    #[test]
    fn test_from_json_str_rejects_case_variants_of_one_address() {
        let err = Ledger::from_json_str(r#"{"0xAbCd": "1", "0xabcd": "2"}"#).unwrap_err();
        assert!(matches!(err, RewardError::DuplicateParticipant(_)));
    }

    #[test]
    fn test_from_json_str_malformed_weight() {
        let err = Ledger::from_json_str(r#"{"a": "1", "b": "1.5"}"#).unwrap_err();
        assert!(matches!(err, RewardError::Parse(ref msg) if msg.starts_with("b:")));
    }

    #[test]
    fn test_from_json_str_negative_weight() {
        let err = Ledger::from_json_str(r#"{"a": "-1"}"#).unwrap_err();
        assert!(matches!(err, RewardError::InvalidAmount(_)));
    }

    #[test]
    fn test_from_json_str_numeric_value_rejected() {
        assert!(matches!(
            Ledger::from_json_str(r#"{"a": 1}"#),
            Err(RewardError::Parse(_))
        ));
    }

    #[test]
    fn test_iteration_is_sorted() {
        let ledger = Ledger::from_json_str(r#"{"c": "3", "a": "1", "b": "2"}"#).unwrap();
        let ids: Vec<&str> = ledger.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_to_json_string_pretty_and_sorted() {
        let ledger = Ledger::from_json_str(r#"{"b": "2", "a": "1"}"#).unwrap();
        assert_eq!(ledger.to_json_string().unwrap(), "{\n  \"a\": \"1\",\n  \"b\": \"2\"\n}");
    }

    #[test]
    fn test_fingerprint_depends_on_content_only() {
        let a = Ledger::from_json_str(r#"{"x": "1", "y": "2"}"#).unwrap();
        let b = Ledger::from_json_str(r#"{"y": "2", "x": "1"}"#).unwrap();
        let c = Ledger::from_json_str(r#"{"x": "1", "y": "3"}"#).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_insert_duplicate_keeps_original() {
        let mut ledger = Ledger::new();
        ledger.insert(id("a"), Amount::from(1u64)).unwrap();
        assert!(ledger.insert(id("a"), Amount::from(9u64)).is_err());
        assert_eq!(ledger.get(&id("a")), Some(Amount::from(1u64)));
    }

    #[test]
    fn test_load_json_missing_file() {
        let path = std::env::temp_dir().join("ssv-rewards-missing-points.json");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(Ledger::load_json(&path), Err(RewardError::Io { .. })));
    }
}
