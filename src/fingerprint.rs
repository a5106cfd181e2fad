use core::hash::BuildHasher;
use core::hash::Hasher;

/// Mask selecting the 63 fingerprint bits of a 64-bit hash. The top bit is
/// reserved for the map's occupied flag.
pub const FINGERPRINT_MASK: u64 = (1 << 63) - 1;

const DJB2_SEED: u64 = 5381;

/// Hashes `bytes` with the multiplicative string hash used by default for
/// fingerprints: seed 5381, then `hash * 33 ^ byte` for every byte.
///
/// # Examples
///
/// ```rust
/// use cacheline_collections::fingerprint::djb2_xor;
///
/// assert_eq!(djb2_xor(b""), 5381);
/// assert_eq!(djb2_xor(b"a"), 5381 * 33 ^ u64::from(b'a'));
/// ```
pub const fn djb2_xor(bytes: &[u8]) -> u64 {
    let mut hash = DJB2_SEED;
    let mut i = 0;
    while i < bytes.len() {
        hash = hash.wrapping_mul(33) ^ bytes[i] as u64;
        i += 1;
    }
    hash
}

/// The 63-bit hash of a key, used by
/// [`FingerprintMap`](crate::FingerprintMap) in place of the key itself.
///
/// Two keys with equal fingerprints are the same key as far as the map is
/// concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Keeps the low 63 bits of `hash`.
    #[inline(always)]
    pub const fn from_hash(hash: u64) -> Self {
        Self(hash & FINGERPRINT_MASK)
    }

    /// Fingerprints `key` with a hasher built by `hash_builder`.
    ///
    /// The bytes are fed with a single [`Hasher::write`] call, without a
    /// length prefix, so hashers like [`Djb2Hasher`] see exactly the key.
    #[inline]
    pub fn of<S: BuildHasher>(key: &[u8], hash_builder: &S) -> Self {
        let mut hasher = hash_builder.build_hasher();
        hasher.write(key);
        Self::from_hash(hasher.finish())
    }

    /// Returns the fingerprint bits.
    #[inline(always)]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Streaming [`Hasher`] computing [`djb2_xor`].
#[derive(Debug, Clone)]
pub struct Djb2Hasher {
    hash: u64,
}

impl Default for Djb2Hasher {
    fn default() -> Self {
        Self { hash: DJB2_SEED }
    }
}

impl Hasher for Djb2Hasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.hash = self.hash.wrapping_mul(33) ^ u64::from(byte);
        }
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }
}

/// Builds [`Djb2Hasher`]s. This is the default hasher builder of
/// [`FingerprintMap`](crate::FingerprintMap).
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildDjb2;

impl BuildHasher for BuildDjb2 {
    type Hasher = Djb2Hasher;

    fn build_hasher(&self) -> Djb2Hasher {
        Djb2Hasher::default()
    }
}
