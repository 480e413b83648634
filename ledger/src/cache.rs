//! Raw-bytes retention for byte-exact reserialization.
//!
//! A handful of domain entities (transaction bodies, witness sets,
//! redeemers) are decoded from someone else's encoding and must be able to
//! hand that encoding back verbatim, even when Cardano's own producers don't
//! always agree on canonical form (indefinite vs. definite array framing,
//! map key order). Field-level `to_cbor` can't reproduce that by
//! construction alone, so entities that need it carry a [`CborCache`]
//! alongside their typed fields and check it first when serializing.

/// An optional exact copy of the bytes an entity was decoded from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CborCache(Option<Vec<u8>>);

impl CborCache {
    pub fn empty() -> Self {
        Self(None)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(Some(bytes))
    }

    pub fn get(&self) -> Option<&[u8]> {
        self.0.as_deref()
    }

    pub fn set(&mut self, bytes: Vec<u8>) {
        self.0 = Some(bytes);
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

/// Implemented by domain entities that carry a [`CborCache`]. The default
/// `clear_cbor_cache` only clears the entity's own cache; container entities
/// override it to also clear their children's, per the spec's recursive
/// invalidation rule.
pub trait WithCborCache {
    fn cbor_cache(&self) -> &CborCache;
    fn cbor_cache_mut(&mut self) -> &mut CborCache;

    fn clear_cbor_cache(&mut self) {
        self.cbor_cache_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf {
        cache: CborCache,
    }

    impl WithCborCache for Leaf {
        fn cbor_cache(&self) -> &CborCache {
            &self.cache
        }

        fn cbor_cache_mut(&mut self) -> &mut CborCache {
            &mut self.cache
        }
    }

    #[test]
    fn clear_resets_cache_to_none() {
        let mut leaf = Leaf {
            cache: CborCache::from_bytes(vec![1, 2, 3]),
        };
        assert!(leaf.cbor_cache().is_present());
        leaf.clear_cbor_cache();
        assert!(!leaf.cbor_cache().is_present());
    }
}
