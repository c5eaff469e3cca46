mod banding;
mod candidates;
mod hashers;
mod min_hasher;
mod min_hasher64;
mod verifier;

use std::collections::HashSet;
use std::hash::Hash;
use std::iter::FromIterator;
use rayon::prelude::*;

use crate::text::shingles;

pub use self::banding::{lsh_bucket, BandKey, LshBander};
pub use self::candidates::{find_candidate_pairs, BucketStats, CandidatePairFinder, CandidatePairs};
pub use self::hashers::{HashScheme, SignatureHasher};
pub use self::min_hasher::SaltedMinHasher;
pub use self::min_hasher64::PermutationMinHasher;
pub use self::verifier::{jaccard, shingle_jaccard, JaccardVerifier, VerifiedPair};

/// A MinHash signature: one minimum per hash function, in seed order.
pub type Signature = Vec<u64>;

/// Value stored in every slot of the signature of a document with no shingles.
///
/// Empty documents therefore never share a band with each other or anything
/// else, and [`compute_minhash_similarity`] treats the slot as a non-match.
pub const EMPTY_SLOT: u64 = u64::MAX;


pub trait MinHasher {

    /// Number of hash functions, which is also the length of every signature.
    fn num_hashes(&self) -> usize;

    /// Builds the signature of a set of items. An empty iterator yields a
    /// signature filled with [`EMPTY_SLOT`].
    fn create_signature<T, U>(&self, iter: T) -> Signature
        where
            T: Iterator<Item=U>,
            U: Hash;

    fn bulk_create_signature<U>(&self, batch: &[Vec<U>]) -> Vec<Signature>
        where
            U: Hash + Sync,
            Self: Sync + Send {
        batch
            .par_iter()
            .map(|tokens| self.create_signature(tokens.iter()))
            .collect()
    }

    fn compute_similarity<T, U>(&self, iter_1: T, iter_2: T) -> f64
        where
            T: Iterator<Item=U>,
            U: Hash {
        compute_minhash_similarity(
            &self.create_signature(iter_1),
            &self.create_signature(iter_2),
        )
    }
}

/// Computes the signature of `text` over its character `ngram` shingles,
/// using the default salted hash family with seeds `0..num_hashes`.
///
/// The text is shingled as given; run it through
/// [`normalize`](crate::text::normalize) first to match the dedup pipeline.
///
/// ```
/// use neardup::minhash::{minhash_signature, EMPTY_SLOT};
///
/// let signature = minhash_signature("near duplicate detection", 100, 3);
/// assert_eq!(signature.len(), 100);
/// assert_eq!(minhash_signature("ab", 4, 3), vec![EMPTY_SLOT; 4]);
/// ```
pub fn minhash_signature(text: &str, num_hashes: usize, ngram: usize) -> Signature {
    SaltedMinHasher::new(num_hashes).create_signature(shingles(text, ngram).into_iter())
}

/// Exact Jaccard similarity of two item sets. Two empty sets have similarity 0.
pub fn compute_jaccard_similarity<T, U>(iter_1: T, iter_2: T) -> f64
    where
        T: Iterator<Item=U>,
        U: Hash + Eq,
{
    let h1 = HashSet::<U>::from_iter(iter_1);
    let h2 = HashSet::<U>::from_iter(iter_2);
    set_jaccard(&h1, &h2)
}

pub(crate) fn set_jaccard<U, S>(h1: &HashSet<U, S>, h2: &HashSet<U, S>) -> f64
    where
        U: Hash + Eq,
        S: std::hash::BuildHasher,
{
    let intersection_len = h1.intersection(h2).count();
    let union_len = h1.len() + h2.len() - intersection_len;
    if union_len == 0 {
        return 0.0;
    }
    intersection_len as f64 / union_len as f64
}

/// Estimates jaccard similarity from two signatures as the fraction of equal slots.
/// Slots holding [`EMPTY_SLOT`] never count as a match.
///
/// # Examples
///
/// ```
/// use neardup::minhash::compute_minhash_similarity;
///
/// let m1 = [1, 2, 3, 4, 5, 6];
/// let m2 = [1, 2, 3, 7, 5, 8];
/// assert!((compute_minhash_similarity(&m1, &m2) - 0.666) < 0.01);
/// ```
pub fn compute_minhash_similarity(min_hashes_1: &[u64], min_hashes_2: &[u64]) -> f64 {
    debug_assert_eq!(min_hashes_1.len(), min_hashes_2.len());
    let num_hashes = min_hashes_1.len();
    if num_hashes == 0 {
        return 0.0;
    }
    let matches: u64 = min_hashes_1
        .iter()
        .zip(min_hashes_2.iter())
        .map(|(min_hash_1, min_hash_2)| (min_hash_1 == min_hash_2 && *min_hash_1 != EMPTY_SLOT) as u64)
        .sum();
    (matches as f64) / (num_hashes as f64)
}


/// Calculates number of bands `b` and band width `r` (number of rows) given
/// the minimum `jaccard similarity`, number of hashes `num_hashes`, and desired
/// probability `desired_proba` of two sets with similarity > `jaccard_similarity` to
/// share a bucket. Only even partitions (`b * r == num_hashes`) are considered,
/// so the result can always be handed to [`LshBander::new`].
/// For more info see 3.4.2 in http://infolab.stanford.edu/~ullman/mmds/ch3n.pdf
///
/// # Examples
///
/// ```
/// use neardup::minhash::calculate_minhash_params;
/// let (b, r) = calculate_minhash_params(0.5, 100);
/// assert_eq!(b * r, 100);
/// assert_eq!((b, r), (50, 2));
/// ```
pub fn calculate_minhash_params(jaccard_similarity: f64, num_hashes: usize) -> (usize, usize) {
    calculate_b_and_r(jaccard_similarity, num_hashes, 0.99)
}

pub fn calculate_minhash_params_with_proba(jaccard_similarity: f64, num_hashes: usize, desired_proba: f64)
                                -> (usize, usize) {
    calculate_b_and_r(jaccard_similarity, num_hashes, desired_proba)
}

fn calculate_b_and_r(s: f64, n: usize, p: f64) -> (usize, usize) {
    let proba = |b: usize, r: usize| {
        1.0 - (1.0 - s.powf(r as f64)).powf(b as f64)
    };
    let mut best = (n, 1);
    for r in 2..=n {
        if n % r != 0 {
            continue;
        }
        let b = n / r;
        if proba(b, r) > p {
            best = (b, r);
        } else {
            break;
        }
    }
    best
}
