use std::hash::Hash;

use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use rayon::prelude::*;
use smallvec::SmallVec;
use tracing::debug;

use crate::error::Result;
use crate::minhash::{BandKey, LshBander, Signature, EMPTY_SLOT};

/// Bucket occupancy across all bands. `largest_bucket` bounds the pairwise
/// expansion of a band and is the number to watch as the corpus grows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BucketStats {
    pub num_buckets: usize,
    pub num_colliding_buckets: usize,
    pub largest_bucket: usize,
}

impl BucketStats {
    fn merge(self, other: BucketStats) -> BucketStats {
        BucketStats {
            num_buckets: self.num_buckets + other.num_buckets,
            num_colliding_buckets: self.num_colliding_buckets + other.num_colliding_buckets,
            largest_bucket: self.largest_bucket.max(other.largest_bucket),
        }
    }
}

/// Deduplicated candidate pairs. Each pair is stored once with the smaller
/// identifier first, however many bands it collided in.
#[derive(Clone, Debug)]
pub struct CandidatePairs<Id>
where
    Id: Hash + Eq,
{
    pub pairs: AHashSet<(Id, Id)>,
    pub stats: BucketStats,
}

impl<Id> CandidatePairs<Id>
where
    Id: Hash + Eq + Ord,
{
    fn empty() -> Self {
        CandidatePairs {
            pairs: AHashSet::new(),
            stats: BucketStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn contains(&self, a: &Id, b: &Id) -> bool
    where
        Id: Clone,
    {
        self.pairs.contains(&ordered_pair(a, b))
    }

    /// Pairs in ascending order, for deterministic downstream processing.
    pub fn into_sorted_vec(self) -> Vec<(Id, Id)> {
        let mut pairs: Vec<(Id, Id)> = self.pairs.into_iter().collect();
        pairs.sort_unstable();
        pairs
    }
}

/// Groups documents by band key, one hash table per band index.
///
/// Bands are bucketed independently on the rayon pool and their pair sets
/// merged afterwards, so no table is shared between threads.
#[derive(Clone, Copy, Debug)]
pub struct CandidatePairFinder {
    bander: LshBander,
}

impl CandidatePairFinder {
    pub fn new(bander: LshBander) -> Self {
        CandidatePairFinder { bander }
    }

    pub fn find<Id>(&self, corpus: &[(Id, Signature)]) -> Result<CandidatePairs<Id>>
    where
        Id: Hash + Eq + Ord + Clone + Send + Sync,
    {
        for (_, signature) in corpus {
            self.bander.check_len(signature)?;
        }

        let (pairs, stats) = (0..self.bander.num_bands())
            .into_par_iter()
            .map(|band_index| self.band_pairs(corpus, band_index))
            .reduce(
                || (AHashSet::new(), BucketStats::default()),
                |(mut pairs, stats), (other_pairs, other_stats)| {
                    if pairs.len() < other_pairs.len() {
                        let mut other_pairs = other_pairs;
                        other_pairs.extend(pairs);
                        (other_pairs, stats.merge(other_stats))
                    } else {
                        pairs.extend(other_pairs);
                        (pairs, stats.merge(other_stats))
                    }
                },
            );

        debug!(
            documents = corpus.len(),
            bands = self.bander.num_bands(),
            buckets = stats.num_buckets,
            colliding_buckets = stats.num_colliding_buckets,
            largest_bucket = stats.largest_bucket,
            candidate_pairs = pairs.len(),
            "bucketed signatures"
        );
        Ok(CandidatePairs { pairs, stats })
    }

    fn band_pairs<Id>(&self, corpus: &[(Id, Signature)], band_index: usize) -> (AHashSet<(Id, Id)>, BucketStats)
    where
        Id: Hash + Eq + Ord + Clone,
    {
        let mut buckets: AHashMap<BandKey, SmallVec<[usize; 2]>> = AHashMap::with_capacity(corpus.len());
        for (position, (_, signature)) in corpus.iter().enumerate() {
            let key = self.bander.key(signature, band_index);
            // signatures of empty documents must not bucket together
            if key.values().iter().all(|v| *v == EMPTY_SLOT) {
                continue;
            }
            buckets.entry(key).or_default().push(position);
        }

        let mut stats = BucketStats {
            num_buckets: buckets.len(),
            ..BucketStats::default()
        };
        let mut pairs = AHashSet::new();
        for members in buckets.values() {
            stats.largest_bucket = stats.largest_bucket.max(members.len());
            if members.len() < 2 {
                continue;
            }
            stats.num_colliding_buckets += 1;
            for (i, j) in members.iter().tuple_combinations() {
                let (a, b) = (&corpus[*i].0, &corpus[*j].0);
                if a != b {
                    pairs.insert(ordered_pair(a, b));
                }
            }
        }
        (pairs, stats)
    }
}

#[inline]
fn ordered_pair<Id: Ord + Clone>(a: &Id, b: &Id) -> (Id, Id) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Finds every pair of documents that share at least one band.
///
/// All signatures must have the same length, divisible by `num_bands`.
/// An empty corpus yields an empty result.
///
/// ```
/// use neardup::minhash::find_candidate_pairs;
///
/// let corpus = vec![
///     ("a", vec![1, 2, 3, 4]),
///     ("b", vec![1, 2, 9, 9]),
///     ("c", vec![5, 6, 7, 8]),
/// ];
/// let candidates = find_candidate_pairs(&corpus, 2).unwrap();
/// assert_eq!(candidates.len(), 1);
/// assert!(candidates.contains(&"b", &"a"));
/// ```
pub fn find_candidate_pairs<Id>(corpus: &[(Id, Signature)], num_bands: usize) -> Result<CandidatePairs<Id>>
where
    Id: Hash + Eq + Ord + Clone + Send + Sync,
{
    let num_hashes = match corpus.first() {
        Some((_, signature)) => signature.len(),
        None => return Ok(CandidatePairs::empty()),
    };
    CandidatePairFinder::new(LshBander::new(num_hashes, num_bands)?).find(corpus)
}
