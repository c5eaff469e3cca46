use std::hash::Hash;

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

/// A cluster member offered to a [`RepresentativePolicy`].
#[derive(Clone, Copy, Debug)]
pub struct Member<'a, Id> {
    pub id: &'a Id,
    pub text: &'a str,
}

/// Chooses the single document kept from each duplicate cluster.
pub trait RepresentativePolicy<Id> {
    /// Returns the position in `members` of the document to keep.
    /// `members` always holds at least two documents.
    fn select(&mut self, members: &[Member<'_, Id>]) -> usize;
}

/// Keeps the member with the smallest identifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstById;

impl<Id: Ord> RepresentativePolicy<Id> for FirstById {
    fn select(&mut self, members: &[Member<'_, Id>]) -> usize {
        members
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.id.cmp(b.id))
            .map(|(position, _)| position)
            .unwrap_or(0)
    }
}

/// Keeps the member with the most characters, ties going to the smaller identifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct LongestDocument;

impl<Id: Ord> RepresentativePolicy<Id> for LongestDocument {
    fn select(&mut self, members: &[Member<'_, Id>]) -> usize {
        members
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.text
                    .chars()
                    .count()
                    .cmp(&b.text.chars().count())
                    .then_with(|| b.id.cmp(a.id))
            })
            .map(|(position, _)| position)
            .unwrap_or(0)
    }
}

/// Keeps a uniformly random member. Seeded, so runs are reproducible.
#[derive(Clone, Debug)]
pub struct RandomRepresentative {
    rng: Pcg64,
}

impl RandomRepresentative {
    pub fn new(seed: u64) -> Self {
        RandomRepresentative {
            rng: Pcg64::seed_from_u64(seed),
        }
    }
}

impl<Id> RepresentativePolicy<Id> for RandomRepresentative {
    fn select(&mut self, members: &[Member<'_, Id>]) -> usize {
        if members.is_empty() {
            return 0;
        }
        self.rng.gen_range(0..members.len())
    }
}

/// Keeps the member with the highest externally supplied score, for example
/// the confidence of a quality classifier. Unscored members rank last and
/// ties go to the smaller identifier.
#[derive(Clone, Debug)]
pub struct QualityScore<Id>
where
    Id: Hash + Eq,
{
    scores: AHashMap<Id, f64>,
}

impl<Id> QualityScore<Id>
where
    Id: Hash + Eq,
{
    pub fn new(scores: AHashMap<Id, f64>) -> Self {
        QualityScore { scores }
    }

    fn score(&self, id: &Id) -> f64 {
        self.scores.get(id).copied().unwrap_or(f64::NEG_INFINITY)
    }
}

impl<Id> FromIterator<(Id, f64)> for QualityScore<Id>
where
    Id: Hash + Eq,
{
    fn from_iter<I: IntoIterator<Item = (Id, f64)>>(iter: I) -> Self {
        QualityScore::new(iter.into_iter().collect())
    }
}

impl<Id> RepresentativePolicy<Id> for QualityScore<Id>
where
    Id: Hash + Eq + Ord,
{
    fn select(&mut self, members: &[Member<'_, Id>]) -> usize {
        members
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                self.score(a.id)
                    .total_cmp(&self.score(b.id))
                    .then_with(|| b.id.cmp(a.id))
            })
            .map(|(position, _)| position)
            .unwrap_or(0)
    }
}

/// Configurable choice of representative policy.
///
/// Score-based selection needs data from outside the corpus and is passed to
/// [`dedup_with_policy`](crate::dedup::dedup_with_policy) directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RepresentativeSelection {
    #[default]
    FirstById,
    LongestDocument,
    Random { seed: u64 },
}

impl RepresentativeSelection {
    pub fn policy<Id: Ord>(&self) -> Box<dyn RepresentativePolicy<Id>> {
        match self {
            RepresentativeSelection::FirstById => Box::new(FirstById),
            RepresentativeSelection::LongestDocument => Box::new(LongestDocument),
            RepresentativeSelection::Random { seed } => Box::new(RandomRepresentative::new(*seed)),
        }
    }
}
