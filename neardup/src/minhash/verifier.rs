use ahash::AHashSet;
use rayon::prelude::*;
use tracing::debug;

use crate::minhash::set_jaccard;
use crate::text::{normalize, shingles};

/// Exact character-shingle Jaccard similarity of two already normalized texts.
/// Two texts without shingles have similarity 0.
pub fn shingle_jaccard(normalized_a: &str, normalized_b: &str, ngram: usize) -> f64 {
    set_jaccard(&shingles(normalized_a, ngram), &shingles(normalized_b, ngram))
}

/// Exact Jaccard similarity of the `ngram` shingle sets of two raw texts,
/// each normalized first.
///
/// `jaccard(a, a, n)` is 1 unless `a` normalizes to fewer than `n`
/// characters, in which case both shingle sets are empty and the result is 0.
///
/// ```
/// use neardup::minhash::jaccard;
///
/// assert_eq!(jaccard("Same text.", "same TEXT", 3), 1.0);
/// assert_eq!(jaccard("ab", "ab", 3), 0.0);
/// ```
pub fn jaccard(text_a: &str, text_b: &str, ngram: usize) -> f64 {
    shingle_jaccard(&normalize(text_a), &normalize(text_b), ngram)
}

/// A candidate pair that passed verification, with its exact similarity.
#[derive(Clone, Debug, PartialEq)]
pub struct VerifiedPair<Id> {
    pub a: Id,
    pub b: Id,
    pub similarity: f64,
}

/// Re-checks LSH candidates with exact Jaccard similarity, dropping the
/// false positives banding lets through.
#[derive(Clone, Copy, Debug)]
pub struct JaccardVerifier {
    ngram: usize,
    threshold: f64,
}

impl JaccardVerifier {
    pub fn new(ngram: usize, threshold: f64) -> Self {
        JaccardVerifier { ngram, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn similarity(&self, text_a: &str, text_b: &str) -> f64 {
        jaccard(text_a, text_b, self.ngram)
    }

    #[inline]
    pub fn is_duplicate(&self, text_a: &str, text_b: &str) -> bool {
        self.similarity(text_a, text_b) >= self.threshold
    }

    /// Verifies `pairs` in parallel and returns the accepted ones in input order.
    /// `text_of` maps an identifier to its raw text.
    pub fn verify<'t, Id, F>(&self, pairs: &[(Id, Id)], text_of: F) -> Vec<VerifiedPair<Id>>
    where
        Id: Clone + Send + Sync,
        F: Fn(&Id) -> &'t str + Sync,
    {
        self.verify_with(pairs, |a, b| self.similarity(text_of(a), text_of(b)))
    }

    /// Like [`verify`](Self::verify), over shingle sets computed once per
    /// document, so a document in many candidate pairs is not re-shingled.
    pub fn verify_shingles<'s, 't: 's, Id, F>(&self, pairs: &[(Id, Id)], shingles_of: F) -> Vec<VerifiedPair<Id>>
    where
        Id: Clone + Send + Sync,
        F: Fn(&Id) -> &'s AHashSet<&'t str> + Sync,
    {
        self.verify_with(pairs, |a, b| set_jaccard(shingles_of(a), shingles_of(b)))
    }

    fn verify_with<Id, G>(&self, pairs: &[(Id, Id)], similarity_of: G) -> Vec<VerifiedPair<Id>>
    where
        Id: Clone + Send + Sync,
        G: Fn(&Id, &Id) -> f64 + Sync,
    {
        let verified: Vec<VerifiedPair<Id>> = pairs
            .par_iter()
            .filter_map(|(a, b)| {
                let similarity = similarity_of(a, b);
                if similarity >= self.threshold {
                    Some(VerifiedPair {
                        a: a.clone(),
                        b: b.clone(),
                        similarity,
                    })
                } else {
                    None
                }
            })
            .collect();
        debug!(
            candidates = pairs.len(),
            verified = verified.len(),
            threshold = self.threshold,
            "verified candidate pairs"
        );
        verified
    }
}

#[cfg(test)]
mod tests {
    use super::{jaccard, shingle_jaccard, JaccardVerifier};
    use crate::text::{normalize, shingles};

    #[test]
    fn test_identical_text_has_similarity_one() {
        let text = "The quick brown fox jumps over the lazy dog";
        assert_eq!(jaccard(text, text, 3), 1.0);
        assert_eq!(jaccard(text, text, 5), 1.0);
    }

    #[test]
    fn test_empty_texts_are_zero_not_nan() {
        assert_eq!(jaccard("", "", 3), 0.0);
        assert_eq!(jaccard("!!!", "???", 3), 0.0);
        assert_eq!(jaccard("", "some text", 3), 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        // shingles: abc bcd | bcd cde
        let similarity = shingle_jaccard("abcd", "bcde", 3);
        assert!((similarity - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_verify_filters_below_threshold() {
        let texts = ["a cat sat on the mat", "a cat sat on the mat!", "completely unrelated words"];
        let pairs = vec![(0usize, 1usize), (0, 2), (1, 2)];
        let verifier = JaccardVerifier::new(3, 0.5);
        let verified = verifier.verify(&pairs, |i| texts[*i]);
        assert_eq!(verified.len(), 1);
        assert_eq!((verified[0].a, verified[0].b), (0, 1));
        assert_eq!(verified[0].similarity, 1.0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let verifier = JaccardVerifier::new(3, 1.0 / 3.0);
        assert!(verifier.is_duplicate("abcd", "bcde"));
        let strict = JaccardVerifier::new(3, 0.34);
        assert!(!strict.is_duplicate("abcd", "bcde"));
    }

    #[test]
    fn test_verify_shingles_agrees_with_raw_texts() {
        let texts = ["Crème brûlée, again!", "creme brulee again", "a cat sat on the mat", "A cat sat on the mat."];
        let normalized: Vec<String> = texts.iter().map(|t| normalize(t)).collect();
        let sets: Vec<_> = normalized.iter().map(|n| shingles(n, 3)).collect();
        let pairs = vec![(0usize, 1usize), (0, 2), (1, 3), (2, 3)];
        let verifier = JaccardVerifier::new(3, 0.3);
        let from_sets = verifier.verify_shingles(&pairs, |i| &sets[*i]);
        let from_texts = verifier.verify(&pairs, |i| texts[*i]);
        assert_eq!(from_sets, from_texts);
        assert!(from_sets.iter().any(|pair| (pair.a, pair.b) == (2, 3)));
    }
}
