use std::hash::{Hash, Hasher};

use siphasher::sip::SipHasher13;

use crate::minhash::{MinHasher, Signature, EMPTY_SLOT};

/// Second SipHash key, shared by every seed.
const SALT_KEY: u64 = 0x9e37_79b9_7f4a_7c15;

/// MinHasher that salts a keyed hash with each seed.
///
/// Seed `i` keys a SipHash-1-3 with `(seed_i, SALT_KEY)`; slot `i` of the
/// signature is the minimum keyed hash over all items. Two hashers built from
/// the same seed list produce comparable signatures.
#[derive(Clone, Debug)]
pub struct SaltedMinHasher {
    seeds: Vec<u64>,
}

impl SaltedMinHasher {
    /// Constructs a hasher with seeds `0..num_hashes`.
    /// ```
    /// use neardup::minhash::SaltedMinHasher;
    ///
    /// let min_hash = SaltedMinHasher::new(100);
    /// ```
    pub fn new(num_hashes: usize) -> Self {
        Self::with_seeds((0..num_hashes as u64).collect())
    }

    pub fn with_seeds(seeds: Vec<u64>) -> Self {
        SaltedMinHasher { seeds }
    }

    pub fn seeds(&self) -> &[u64] {
        &self.seeds
    }

    #[inline]
    fn salted_hash<U: Hash>(seed: u64, item: &U) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(seed, SALT_KEY);
        item.hash(&mut hasher);
        hasher.finish()
    }
}

impl MinHasher for SaltedMinHasher {
    fn num_hashes(&self) -> usize {
        self.seeds.len()
    }

    fn create_signature<T, U>(&self, iter: T) -> Signature
    where
        T: Iterator<Item = U>,
        U: Hash,
    {
        let items: Vec<U> = iter.collect();
        if items.is_empty() {
            return vec![EMPTY_SLOT; self.seeds.len()];
        }
        self.seeds
            .iter()
            .map(|seed| {
                items
                    .iter()
                    .map(|item| Self::salted_hash(*seed, item))
                    .min()
                    .unwrap_or(EMPTY_SLOT)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::SaltedMinHasher;
    use crate::minhash::{compute_jaccard_similarity, MinHasher, EMPTY_SLOT};
    use crate::text::shingles;

    static S10: &'static str = "If you're still searching, we can visit a few open houses together in the next few weeks. It might help give clarity on what you're looking for. What do you think? - Gail's assistant w/eXp Realty";
    static S11: &'static str = "If you're still searching, we can visit a few open houses together in the next few weeks. It might help give clarity on what you're looking for. What do you think? - Elle's assistant w/Bright Birch Real Estate";

    #[test]
    fn test_signature_length_matches_seeds() {
        let min_hash = SaltedMinHasher::with_seeds(vec![7, 11, 13]);
        let signature = min_hash.create_signature(shingles("abcdef", 3).into_iter());
        assert_eq!(signature.len(), 3);
    }

    #[test]
    fn test_deterministic_across_instances() {
        let a = SaltedMinHasher::new(32).create_signature(shingles(S10, 3).into_iter());
        let b = SaltedMinHasher::new(32).create_signature(shingles(S10, 3).into_iter());
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input_uses_sentinel() {
        let min_hash = SaltedMinHasher::new(16);
        let empty: Vec<&str> = Vec::new();
        assert_eq!(min_hash.create_signature(empty.into_iter()), vec![EMPTY_SLOT; 16]);
    }

    #[test]
    fn test_min_hash_similarity() {
        let min_hash = SaltedMinHasher::new(256);
        let estimated = min_hash.compute_similarity(
            shingles(S10, 3).into_iter(),
            shingles(S11, 3).into_iter(),
        );
        let actual = compute_jaccard_similarity(
            shingles(S10, 3).into_iter(),
            shingles(S11, 3).into_iter(),
        );
        assert!(f64::abs(estimated - actual) < 0.1, "actual {} estimated {}", actual, estimated);
    }
}
