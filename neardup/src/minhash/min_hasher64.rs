use crate::minhash::{MinHasher, Signature, EMPTY_SLOT};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::hash::{BuildHasher, Hash, Hasher};
use fnv::FnvBuildHasher;


/// MinHasher that hashes every item once and simulates `num_hashes`
/// independent hash functions with universal permutations
/// `(a * h + b) mod (2^61 - 1)`.
///
/// The permutation coefficients are drawn from a seeded RNG, so hashers
/// built with the same `num_hashes` and seed are interchangeable.
#[derive(Clone)]
pub struct PermutationMinHasher<B: BuildHasher> {
    build_hasher: B,
    a: Vec<u64>,
    b: Vec<u64>,
    num_hashes: usize,
}

static MERSENNE_PRIME: u64 = (1 << 61) - 1;

impl PermutationMinHasher<FnvBuildHasher> {
    /// Constructs a new `PermutationMinHasher` with a specified number of hash functions to use.
    /// ```
    /// use neardup::minhash::PermutationMinHasher;
    ///
    /// let min_hash = PermutationMinHasher::new(100);
    /// ```
    pub fn new(num_hashes: usize) -> Self {
        PermutationMinHasher::new_with_hasher(num_hashes, FnvBuildHasher::default())
    }
}

impl<B: BuildHasher> PermutationMinHasher<B> {

    pub fn new_with_hasher(num_hashes: usize, build_hasher: B) -> Self {
       Self::new_with_hasher_and_seed(num_hashes, build_hasher, 3)
    }

    pub fn new_with_hasher_and_seed(num_hashes: usize, build_hasher: B, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let rand_range1 = Uniform::from(1..MERSENNE_PRIME);
        let rand_range2 = Uniform::from(0..MERSENNE_PRIME);
        PermutationMinHasher {
            build_hasher,
            a: (0..num_hashes)
                .map(|_| rand_range1.sample(&mut rng))
                .collect(),
            b: (0..num_hashes)
                .map(|_| rand_range2.sample(&mut rng))
                .collect(),
            num_hashes,
        }
    }
}

impl<B: BuildHasher> MinHasher for PermutationMinHasher<B> {

    /// Returns the number of hash functions being used.
    fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    fn create_signature<T, U>(&self, iter: T) -> Signature
    where
        T: Iterator<Item = U>,
        U: Hash,
    {
        let hashes: Vec<u64> = iter
            .map(|item| {
                let mut hasher = self.build_hasher.build_hasher();
                item.hash(&mut hasher);
                hasher.finish()
            })
            .collect::<Vec<_>>();

        if hashes.is_empty() {
            return vec![EMPTY_SLOT; self.num_hashes];
        }
        self
            .a.iter()
            .zip(self.b.iter())
            .map(|(a, b)| {
                hashes
                    .iter()
                    .map(|hash| hash.wrapping_mul(*a).wrapping_add(*b) % MERSENNE_PRIME)
                    .min()
                    .unwrap_or(EMPTY_SLOT)
            })
            .collect()
    }

}
