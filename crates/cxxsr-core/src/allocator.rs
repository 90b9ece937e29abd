//! Hash-based allocation of substitute names.
//!
//! Every identifier is hashed together with the salt and placed into a slot
//! of a numeric range. When the slot is taken the range is doubled and the
//! same hash is reduced again, which moves the candidate without changing
//! the identifier's hash. The slot number, rendered in hexadecimal after the
//! configured prefix, becomes the substitute name.

use std::collections::{BTreeMap, HashSet};

use cxxsr_demangle::length_prefixed;
use sha2::{Digest, Sha256};

use crate::collector::IdentifierSet;
use crate::config::{RenameConfig, COLLISION_HEADROOM};

/// Hash an identifier together with the salt.
///
/// The first eight bytes of `SHA-256(identifier || salt)`, big-endian. The
/// value is stable across platforms and toolchain versions.
pub fn salted_hash(identifier: &str, salt: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(identifier.as_bytes());
    hasher.update(salt.as_bytes());
    let digest = hasher.finalize();

    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

/// Assigns substitute names to identifiers.
#[derive(Debug)]
pub struct HashAllocator<'a> {
    config: &'a RenameConfig,
    used: HashSet<u64>,
}

impl<'a> HashAllocator<'a> {
    pub fn new(config: &'a RenameConfig) -> Self {
        Self {
            config,
            used: HashSet::new(),
        }
    }

    /// Build the rename table for a whole identifier set.
    ///
    /// Identifiers are visited in the set's lexicographic order; results for
    /// one identifier depend on the slots taken by those before it.
    pub fn allocate(mut self, identifiers: &IdentifierSet) -> RenameTable {
        let base = COLLISION_HEADROOM.saturating_mul(identifiers.len() as u64);
        let mut entries = BTreeMap::new();

        for identifier in identifiers.iter() {
            let hash = salted_hash(identifier, &self.config.salt);
            let slot = self.claim(hash, base);
            let substitute = format!("{}{:x}", self.config.prefix, slot);
            tracing::trace!(identifier, hash, slot, %substitute, "allocated substitute");
            entries.insert(identifier.to_string(), substitute);
        }

        tracing::debug!(
            identifiers = entries.len(),
            slots = self.used.len(),
            "rename table built"
        );
        RenameTable { entries }
    }

    /// Find and reserve a free slot for `hash`.
    fn claim(&mut self, hash: u64, base: u64) -> u64 {
        let mut range = base.max(1);
        let mut slot = hash % range;

        while self.used.contains(&slot) {
            // Once the range exceeds the hash, doubling no longer moves the
            // candidate; fall back to probing the next slots.
            if hash < range || range == u64::MAX {
                while self.used.contains(&slot) {
                    slot = slot.wrapping_add(1);
                }
                break;
            }
            range = range.saturating_mul(2);
            slot = hash % range;
            tracing::trace!(hash, range, slot, "slot taken, widening range");
        }

        self.used.insert(slot);
        slot
    }
}

/// Identifier to substitute mapping.
///
/// Injective and total over the identifier set it was built from; immutable
/// once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameTable {
    entries: BTreeMap<String, String>,
}

impl RenameTable {
    /// The substitute name for an identifier.
    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.entries.get(identifier).map(String::as_str)
    }

    /// The substitute in its `<length><name>` form, ready to splice into a
    /// mangled name.
    pub fn encoded(&self, identifier: &str) -> Option<String> {
        self.get(identifier).map(length_prefixed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(identifier, substitute)` pairs in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The reverse mapping, substitute to identifier.
    pub fn inverted(&self) -> RenameTable {
        RenameTable {
            entries: self
                .entries
                .iter()
                .map(|(identifier, substitute)| (substitute.clone(), identifier.clone()))
                .collect(),
        }
    }
}

impl FromIterator<(String, String)> for RenameTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use cxxsr_demangle::Token;

    use super::*;

    fn identifiers(names: &[&str]) -> IdentifierSet {
        let mut set = IdentifierSet::new();
        for name in names {
            set.insert(&Token::new(*name));
        }
        set
    }

    #[test]
    fn test_salted_hash_is_stable() {
        assert_eq!(salted_hash("foo", ""), salted_hash("foo", ""));
        assert_ne!(salted_hash("foo", ""), salted_hash("foo", "salt"));
        assert_ne!(salted_hash("foo", ""), salted_hash("bar", ""));
        // Salt is appended, not separated.
        assert_eq!(salted_hash("foo", "bar"), salted_hash("foob", "ar"));
    }

    #[test]
    fn test_salted_hash_known_value() {
        // SHA-256("") = e3b0c44298fc1c14...
        assert_eq!(salted_hash("", ""), 0xe3b0_c442_98fc_1c14);
    }

    #[test]
    fn test_substitute_shape() {
        let config = RenameConfig::default();
        let table = HashAllocator::new(&config).allocate(&identifiers(&["foo"]));

        let substitute = table.get("foo").unwrap();
        let slot = substitute.strip_prefix("CXXSR_").unwrap();
        let value = u64::from_str_radix(slot, 16).unwrap();
        assert!(value < 100, "single identifier lands in the first range");
        assert_eq!(value, salted_hash("foo", "") % 100);
        assert_eq!(
            table.encoded("foo").unwrap(),
            format!("{}{}", substitute.len(), substitute)
        );
    }

    #[test]
    fn test_injective() {
        let names: Vec<String> = (0..500).map(|i| format!("ident{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let config = RenameConfig::default();
        let table = HashAllocator::new(&config).allocate(&identifiers(&refs));

        assert_eq!(table.len(), 500);
        let unique: HashSet<&str> = table.iter().map(|(_, s)| s).collect();
        assert_eq!(unique.len(), 500);
    }

    #[test]
    fn test_deterministic() {
        let set = identifiers(&["alpha", "beta", "gamma", "delta"]);
        let config = RenameConfig::new("X_", "s").unwrap();
        let first = HashAllocator::new(&config).allocate(&set);
        let second = HashAllocator::new(&config).allocate(&set);
        assert_eq!(first, second);
    }

    #[test]
    fn test_salt_changes_mapping() {
        let set = identifiers(&["alpha", "beta", "gamma", "delta"]);
        let plain = HashAllocator::new(&RenameConfig::default()).allocate(&set);
        let salted = HashAllocator::new(&RenameConfig::new("CXXSR_", "pepper").unwrap()).allocate(&set);
        assert_ne!(plain, salted);
        assert_eq!(plain.len(), salted.len());
    }

    #[test]
    fn test_claim_doubles_range_on_collision() {
        let config = RenameConfig::default();
        let mut allocator = HashAllocator::new(&config);
        assert_eq!(allocator.claim(250, 100), 50);
        // 250 % 100 is taken, 250 % 200 = 50 is taken too, 250 % 400 = 250.
        assert_eq!(allocator.claim(250, 100), 250);
        // 450 collides at ranges 100, 200 and 400 before landing at 800.
        assert_eq!(allocator.claim(450, 100), 450);
    }

    #[test]
    fn test_claim_probes_identical_hashes() {
        let config = RenameConfig::default();
        let mut allocator = HashAllocator::new(&config);
        let first = allocator.claim(7, 100);
        let second = allocator.claim(7, 100);
        let third = allocator.claim(7, 100);
        assert_eq!(first, 7);
        assert_eq!(second, 8);
        assert_eq!(third, 9);
    }

    #[test]
    fn test_empty_set() {
        let table = HashAllocator::new(&RenameConfig::default()).allocate(&IdentifierSet::new());
        assert!(table.is_empty());
    }

    #[test]
    fn test_inverted() {
        let table: RenameTable = [("foo".to_string(), "X_1".to_string())].into_iter().collect();
        let inverse = table.inverted();
        assert_eq!(inverse.get("X_1"), Some("foo"));
        assert_eq!(inverse.inverted(), table);
    }
}
