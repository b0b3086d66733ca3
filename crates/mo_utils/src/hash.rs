//! Hash containers over *hashbrown*.
//!
//! [`HashMap`] and [`HashSet`] hash with *foldhash* under its fixed default
//! seed, so iteration order is the same from run to run. [`NoOpHashMap`] is
//! for keys that already are unique `u64`s, such as runtime type keys.

use core::hash::{BuildHasher, Hasher};

use foldhash::fast::FixedState;

/// A [`hashbrown::HashMap`] with a deterministic *foldhash* state.
pub type HashMap<K, V> = hashbrown::HashMap<K, V, FixedState>;

/// A [`hashbrown::HashSet`] with a deterministic *foldhash* state.
pub type HashSet<T> = hashbrown::HashSet<T, FixedState>;

/// A map whose keys hash to the `u64` they write, see [`NoOpHasher`].
pub type NoOpHashMap<K, V> = hashbrown::HashMap<K, V, NoOpHashState>;

/// Hasher that keeps the last `u64` written as the hash.
///
/// Keys are expected to write exactly one `u64`. Other writes are folded in
/// eight bytes at a time so that a stray key still hashes to something.
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHasher(u64);

impl Hasher for NoOpHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for chunk in bytes.chunks(8) {
            let mut word = [0_u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            self.0 ^= u64::from_le_bytes(word);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }
}

/// [`BuildHasher`] for [`NoOpHasher`].
///
/// # Examples
///
/// ```
/// use core::hash::{BuildHasher, Hash, Hasher};
/// use mo_utils::hash::NoOpHashState;
///
/// let mut hasher = NoOpHashState.build_hasher();
/// 42_u64.hash(&mut hasher);
/// assert_eq!(hasher.finish(), 42);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHashState;

impl BuildHasher for NoOpHashState {
    type Hasher = NoOpHasher;

    #[inline]
    fn build_hasher(&self) -> NoOpHasher {
        NoOpHasher::default()
    }
}

#[cfg(test)]
mod tests {
    use core::hash::{BuildHasher, Hasher};

    use super::{HashSet, NoOpHashMap, NoOpHashState};

    #[test]
    fn noop_keeps_last_u64() {
        let mut hasher = NoOpHashState.build_hasher();
        hasher.write_u64(7);
        hasher.write_u64(9);
        assert_eq!(hasher.finish(), 9);
    }

    #[test]
    fn containers() {
        let mut keys = NoOpHashMap::with_hasher(NoOpHashState);
        keys.insert(3_u64, "three");
        assert_eq!(keys.get(&3), Some(&"three"));

        let mut names = HashSet::default();
        assert!(names.insert("orders"));
        assert!(!names.insert("orders"));
    }
}
