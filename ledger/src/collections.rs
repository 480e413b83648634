//! Sorted key-value and key-only containers backed by an ordered `Vec`.
//!
//! Cardano's canonical encoding requires map keys to appear in ascending
//! comparator order; a `BTreeMap` would give that for free but loses the
//! ability to carry keys whose `Ord` is a bespoke credential comparator
//! without wrapping them. Following the order-preserving-by-construction
//! approach the ledger binding layer already leans on elsewhere, these
//! containers just keep a `Vec` sorted on every insert.

use cardano_cbor::PeekState;

use crate::{Fragment, LedgerError, Reader, Result, Writer};

/// An ordered array of `(key, value)` pairs, resorted after every insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedMap<K, V> {
    entries: Vec<(K, V)>,
}

impl<K: Ord, V> Default for SortedMap<K, V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K: Ord, V> SortedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(mut pairs: Vec<(K, V)>) -> Self {
        pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
        Self { entries: pairs }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(K, V)> {
        self.entries.iter()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries
            .binary_search_by(|(k, _)| k.cmp(key))
            .ok()
            .map(|i| &self.entries[i].1)
    }

    /// Inserts or replaces `key`'s value, keeping the backing array sorted.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.entries.binary_search_by(|(k, _)| k.cmp(&key)) {
            Ok(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            Err(i) => {
                self.entries.insert(i, (key, value));
                None
            }
        }
    }

    pub fn into_pairs(self) -> Vec<(K, V)> {
        self.entries
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for SortedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter.into_iter().collect())
    }
}

impl<K: Fragment + Ord, V: Fragment> Fragment for SortedMap<K, V> {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        let len = reader.read_start_map()?;
        let mut entries = Vec::new();
        if len >= 0 {
            for _ in 0..len {
                let key = K::from_cbor(reader)?;
                let value = V::from_cbor(reader)?;
                entries.push((key, value));
            }
        } else {
            while reader.peek_state()? != PeekState::EndMap {
                let key = K::from_cbor(reader)?;
                let value = V::from_cbor(reader)?;
                entries.push((key, value));
            }
        }
        reader.read_end_map()?;
        Ok(Self::from_pairs(entries))
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        writer.write_start_map(self.entries.len() as u64);
        for (key, value) in &self.entries {
            key.to_cbor(writer)?;
            value.to_cbor(writer)?;
        }
        writer.write_end_map();
        Ok(())
    }
}

/// An ordered, deduplicated set of keys, resorted after every insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedSet<T> {
    entries: Vec<T>,
}

impl<T: Ord> Default for SortedSet<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: Ord> SortedSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(mut values: Vec<T>) -> Self {
        values.sort();
        values.dedup();
        Self { entries: values }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.entries.binary_search(value).is_ok()
    }

    /// Inserts `value`, returning `false` if it was already present.
    pub fn insert(&mut self, value: T) -> bool {
        match self.entries.binary_search(&value) {
            Ok(_) => false,
            Err(i) => {
                self.entries.insert(i, value);
                true
            }
        }
    }
}

impl<T: Ord> FromIterator<T> for SortedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_values(iter.into_iter().collect())
    }
}

/// `set<a> = #6.258([* a])`, per the CDDL tag Cardano uses for genuine sets.
impl<T: Fragment + Ord> Fragment for SortedSet<T> {
    fn from_cbor(reader: &mut Reader) -> Result<Self> {
        const SET_TAG: u64 = 258;
        let tag = reader.read_tag()?;
        if tag != SET_TAG {
            return Err(LedgerError::invalid_argument(format!(
                "expected tag 258 for a set, got {tag}"
            )));
        }
        let len = reader.read_start_array()?;
        let mut values = Vec::new();
        if len >= 0 {
            for _ in 0..len {
                values.push(T::from_cbor(reader)?);
            }
        } else {
            while reader.peek_state()? != PeekState::EndArray {
                values.push(T::from_cbor(reader)?);
            }
        }
        reader.read_end_array()?;
        Ok(Self::from_values(values))
    }

    fn to_cbor(&self, writer: &mut Writer) -> Result<()> {
        const SET_TAG: u64 = 258;
        writer.write_tag(SET_TAG);
        writer.write_start_array(self.entries.len() as u64);
        for value in &self.entries {
            value.to_cbor(writer)?;
        }
        writer.write_end_array();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_map_stays_sorted_after_inserts() {
        let mut map = SortedMap::new();
        map.insert(5u64, "five");
        map.insert(1u64, "one");
        map.insert(3u64, "three");
        let keys: Vec<_> = map.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![1, 3, 5]);
    }

    #[test]
    fn sorted_map_insert_replaces_existing_key() {
        let mut map = SortedMap::new();
        map.insert(1u64, "one");
        let prior = map.insert(1u64, "uno");
        assert_eq!(prior, Some("one"));
        assert_eq!(map.get(&1), Some(&"uno"));
    }

    #[test]
    fn sorted_set_deduplicates_on_construction() {
        let set = SortedSet::from_values(vec![3u64, 1, 3, 2, 1]);
        let values: Vec<_> = set.iter().copied().collect();
        assert_eq!(values, vec![1, 2, 3]);
    }
}
