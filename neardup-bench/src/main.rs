mod generate_clusters;
mod metrics;

use std::time::Instant;

use fxhash::FxHashSet;
use neardup::clustering::RepresentativeSelection;
use neardup::config::DedupConfig;
use neardup::dedup::dedup;
use neardup::minhash::HashScheme;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::generate_clusters::*;
use crate::metrics::Metrics;

fn run_dedup(generated_clusters: &[GeneratedCluster], config: &DedupConfig) {
    let (ids, texts): (Vec<u32>, Vec<&str>) = generated_clusters
        .iter()
        .flat_map(|cluster| cluster.documents.iter().map(|(id, text)| (*id, text.as_str())))
        .unzip();

    info!(documents = ids.len(), scheme = %config.hash_scheme, "starting dedup");
    let now = Instant::now();
    let outcome = match dedup(&ids, &texts, config) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "dedup failed");
            return;
        }
    };
    let elapsed = now.elapsed();
    println!(
        "{}: elapsed millis {}. Num clusters {}. Candidates {}. Verified {}. Largest bucket {}",
        config.hash_scheme,
        elapsed.as_millis(),
        outcome.clusters.len(),
        outcome.stats.candidate_pairs,
        outcome.stats.verified_pairs,
        outcome.stats.buckets.largest_bucket,
    );

    let mut metrics = Metrics::new();
    for generated_cluster in generated_clusters {
        let reference: FxHashSet<u32> = generated_cluster.documents.iter().map(|(id, _)| *id).collect();
        let (base_id, _) = &generated_cluster.documents[0];
        let found: FxHashSet<u32> = match outcome.cluster_of(base_id) {
            Some(cluster_id) => outcome.clusters[cluster_id].members.iter().copied().collect(),
            None => FxHashSet::default(),
        };
        metrics.update_metrics(&found, &reference);
    }
    println!("{:?}", metrics.get_result());
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    for mode in [DifferenceMode::SameIndices, DifferenceMode::DiffIndices] {
        let generator = ClusterGenerator::new(0.7, 20, 200, 500, 50_000, mode);
        let generated_clusters = generator.generate();
        println!("{:?}: generated {} clusters", mode, generated_clusters.len());

        let config = DedupConfig::default()
            .with_num_hashes(100)
            .with_num_bands(20)
            .with_jaccard_threshold(0.5)
            .with_representative(RepresentativeSelection::LongestDocument);
        run_dedup(&generated_clusters, &config);
        run_dedup(&generated_clusters, &config.clone().with_hash_scheme(HashScheme::Permutation));
    }
}
