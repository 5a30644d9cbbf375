//! Hash containers shared by the `treebind` crates.
//!
//! `HashMap`/`HashSet` are [hashbrown] containers using [foldhash]'s fast
//! random state. [`TypeIdMap`] is a specialized map keyed by [`TypeId`]; a
//! `TypeId` is already a high quality hash, so it uses a pass-through hasher.

use core::any::TypeId;
use core::hash::{BuildHasherDefault, Hasher};

// -----------------------------------------------------------------------------
// Standard containers

/// The default hash state for [`HashMap`] and [`HashSet`].
pub type RandomState = foldhash::fast::RandomState;

/// A [`hashbrown::HashMap`] using foldhash's fast random state.
pub type HashMap<K, V, S = RandomState> = hashbrown::HashMap<K, V, S>;

/// A [`hashbrown::HashSet`] using foldhash's fast random state.
pub type HashSet<T, S = RandomState> = hashbrown::HashSet<T, S>;

// -----------------------------------------------------------------------------
// NoOpHasher

/// A hasher that passes its input through unchanged.
///
/// Only usable with keys that already are hashes, such as [`TypeId`].
#[derive(Default, Clone)]
pub struct NoOpHasher(u64);

impl Hasher for NoOpHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        // Fallback for key types that hash themselves bytewise.
        for &b in bytes {
            self.0 = self.0.rotate_left(8) ^ u64::from(b);
        }
    }

    #[inline]
    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }

    #[inline]
    fn write_u128(&mut self, n: u128) {
        self.0 = n as u64 ^ (n >> 64) as u64;
    }
}

/// Hash state for [`NoOpHasher`].
pub type NoOpHashState = BuildHasherDefault<NoOpHasher>;

// -----------------------------------------------------------------------------
// TypeIdMap

/// A map keyed by [`TypeId`] with a pass-through hasher.
pub type TypeIdMap<V> = hashbrown::HashMap<TypeId, V, NoOpHashState>;

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::TypeIdMap;
    use core::any::TypeId;

    #[test]
    fn typeid_map_round_trip() {
        let mut map = TypeIdMap::<&str>::default();
        map.insert(TypeId::of::<u8>(), "u8");
        map.insert(TypeId::of::<String>(), "String");

        assert_eq!(map.get(&TypeId::of::<u8>()), Some(&"u8"));
        assert_eq!(map.get(&TypeId::of::<String>()), Some(&"String"));
        assert_eq!(map.get(&TypeId::of::<i64>()), None);
    }
}
