use rand::distributions::{Alphanumeric, Uniform};
use rand::prelude::{Distribution, StdRng};
use rand::{Rng, SeedableRng};
use itertools::Itertools;
use rayon::prelude::*;

pub struct GeneratedCluster {
    /// `(document id, text)`; the first entry is the unmodified base document.
    pub documents: Vec<(u32, String)>,
}

/// DifferenceMode indicates whether the edits inside one cluster hit the same
/// or different word positions.
///
/// With SameIndices we choose num_changes random positions once per cluster
/// and replace the words at those positions in every cluster document.
/// With DiffIndices every document gets its own random positions, so two
/// documents of the same cluster usually differ from each other more than
/// from the base document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DifferenceMode {
    SameIndices,
    DiffIndices,
}

pub struct ClusterGenerator {
    pub jaccard_similarity: f64,
    pub cluster_size: usize,
    pub words_per_document: usize,
    pub num_clusters: usize,
    pub vocabulary_size: usize,
    pub mode: DifferenceMode,
    pub seed: u64,
}

impl ClusterGenerator {
    pub fn new(
        jaccard_similarity: f64,
        cluster_size: usize,
        words_per_document: usize,
        num_clusters: usize,
        vocabulary_size: usize,
        mode: DifferenceMode,
    ) -> Self {
        ClusterGenerator {
            jaccard_similarity,
            cluster_size,
            words_per_document,
            num_clusters,
            vocabulary_size,
            mode,
            seed: 42,
        }
    }

    pub fn generate(&self) -> Vec<GeneratedCluster> {
        let vocabulary = self.vocabulary();
        let num_changes = self.num_changes();
        tracing::info!(num_changes, words = self.words_per_document, "generating clusters");
        (0..self.num_clusters)
            .into_par_iter()
            .map(|cluster_id| self.generate_cluster(&vocabulary, num_changes, cluster_id))
            .collect()
    }

    fn vocabulary(&self) -> Vec<String> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..self.vocabulary_size)
            .map(|_| {
                let length = rng.gen_range(3..10);
                (&mut rng)
                    .sample_iter(&Alphanumeric)
                    .take(length)
                    .map(char::from)
                    .collect()
            })
            .collect()
    }

    /// The largest number of replaced words that keeps the word-level
    /// Jaccard similarity above the target.
    fn num_changes(&self) -> usize {
        let mut k = 1;
        let n = self.words_per_document as f64;
        while (n - k as f64) / (n + k as f64) > self.jaccard_similarity {
            k += 1
        }
        k - 1
    }

    fn generate_cluster(&self, vocabulary: &[String], num_changes: usize, cluster_id: usize) -> GeneratedCluster {
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(cluster_id as u64 + 1));
        let words = Uniform::new(0, vocabulary.len());
        let positions = Uniform::new(0, self.words_per_document);
        let base: Vec<usize> = words
            .sample_iter(&mut rng)
            .take(self.words_per_document)
            .collect();
        let shared_positions: Vec<usize> = positions
            .sample_iter(&mut rng)
            .take(num_changes)
            .collect();

        let first_id = (cluster_id * (self.cluster_size + 1)) as u32;
        let render = |items: &[usize]| items.iter().map(|w| vocabulary[*w].as_str()).join(" ");
        let mut documents = Vec::with_capacity(self.cluster_size + 1);
        documents.push((first_id, render(&base)));
        for i in 0..self.cluster_size {
            let mut items = base.clone();
            for j in 0..num_changes {
                let position = match self.mode {
                    DifferenceMode::SameIndices => shared_positions[j],
                    DifferenceMode::DiffIndices => positions.sample(&mut rng),
                };
                items[position] = words.sample(&mut rng);
            }
            documents.push((first_id + i as u32 + 1, render(&items)));
        }

        GeneratedCluster { documents }
    }
}
