//! The near-duplicate pipeline: signatures, banding, verification,
//! clustering and representative selection.

use std::ffi::OsString;
use std::fmt::Debug;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::clustering::{Member, RepresentativePolicy, UnionFind};
use crate::config::DedupConfig;
use crate::error::{DedupError, Result};
use crate::io::{create_dir, output_path, read_text, write_atomic};
use crate::minhash::{BucketStats, CandidatePairFinder, JaccardVerifier, MinHasher, Signature};
use crate::text::{normalize, shingles};

/// Dense cluster numbering, assigned in order of each cluster's smallest identifier.
pub type ClusterId = usize;

/// Documents connected by verified duplicate pairs, transitively.
#[derive(Clone, Debug, PartialEq)]
pub struct DuplicateCluster<Id> {
    pub id: ClusterId,
    /// Sorted ascending.
    pub members: Vec<Id>,
    pub representative: Id,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DedupStats {
    pub documents: usize,
    /// Documents too short to produce a single shingle.
    pub empty_documents: usize,
    pub candidate_pairs: usize,
    pub verified_pairs: usize,
    pub clusters: usize,
    pub dropped: usize,
    pub buckets: BucketStats,
}

/// Fate of a single document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentStatus {
    /// Written to the output. `cluster` is set when the document represents one.
    Kept { cluster: Option<ClusterId> },
    /// Near-duplicate of the representative of `cluster`.
    Dropped { cluster: ClusterId },
    /// Could not be read or written.
    Failed { reason: String },
}

impl DocumentStatus {
    pub fn is_kept(&self) -> bool {
        matches!(self, DocumentStatus::Kept { .. })
    }
}

/// Result of an in-memory dedup run.
#[derive(Clone, Debug)]
pub struct DedupOutcome<Id>
where
    Id: Hash + Eq,
{
    /// Input identifiers, in input order.
    pub documents: Vec<Id>,
    /// Cluster of every document; `None` for singletons.
    pub assignments: AHashMap<Id, Option<ClusterId>>,
    /// Indexed by [`ClusterId`].
    pub clusters: Vec<DuplicateCluster<Id>>,
    pub stats: DedupStats,
}

impl<Id> DedupOutcome<Id>
where
    Id: Hash + Eq,
{
    pub fn cluster_of(&self, id: &Id) -> Option<ClusterId> {
        self.assignments.get(id).copied().flatten()
    }

    /// `None` for identifiers that were not part of the input.
    pub fn status(&self, id: &Id) -> Option<DocumentStatus> {
        let assignment = self.assignments.get(id)?;
        Some(match assignment {
            None => DocumentStatus::Kept { cluster: None },
            Some(cluster) if self.clusters[*cluster].representative == *id => DocumentStatus::Kept {
                cluster: Some(*cluster),
            },
            Some(cluster) => DocumentStatus::Dropped { cluster: *cluster },
        })
    }

    pub fn is_kept(&self, id: &Id) -> bool {
        self.status(id).map_or(false, |status| status.is_kept())
    }

    /// Surviving documents, in input order.
    pub fn kept(&self) -> Vec<&Id> {
        self.documents.iter().filter(|id| self.is_kept(id)).collect()
    }

    pub fn dropped(&self) -> Vec<&Id> {
        self.documents.iter().filter(|id| !self.is_kept(id)).collect()
    }
}

/// Deduplicates `texts`, where `doc_ids[i]` identifies `texts[i]`, picking
/// representatives with the policy named in `config`.
///
/// ```
/// use neardup::config::DedupConfig;
/// use neardup::dedup::dedup;
///
/// let ids = [1, 2, 3];
/// let texts = [
///     "the quick brown fox jumps over the lazy dog",
///     "The quick brown fox jumps over the lazy dog!",
///     "an entirely different sentence about cats",
/// ];
/// let outcome = dedup(&ids, &texts, &DedupConfig::default()).unwrap();
/// assert_eq!(outcome.kept(), vec![&1, &3]);
/// assert_eq!(outcome.cluster_of(&2), Some(0));
/// ```
pub fn dedup<Id, T>(doc_ids: &[Id], texts: &[T], config: &DedupConfig) -> Result<DedupOutcome<Id>>
where
    Id: Hash + Eq + Ord + Clone + Debug + Send + Sync,
    T: AsRef<str> + Sync,
{
    let mut policy = config.representative.policy::<Id>();
    dedup_with_policy(doc_ids, texts, config, policy.as_mut())
}

/// Like [`dedup`], with a caller-supplied representative policy.
pub fn dedup_with_policy<Id, T>(
    doc_ids: &[Id],
    texts: &[T],
    config: &DedupConfig,
    policy: &mut dyn RepresentativePolicy<Id>,
) -> Result<DedupOutcome<Id>>
where
    Id: Hash + Eq + Ord + Clone + Debug + Send + Sync,
    T: AsRef<str> + Sync,
{
    config.validate()?;
    if doc_ids.len() != texts.len() {
        return Err(DedupError::config(format!(
            "{} identifiers given for {} documents",
            doc_ids.len(),
            texts.len()
        )));
    }
    let mut seen = AHashSet::with_capacity(doc_ids.len());
    for id in doc_ids {
        if !seen.insert(id) {
            return Err(DedupError::config(format!("duplicate document identifier {:?}", id)));
        }
    }

    let hasher = config.hash_scheme.min_hasher(config.num_hashes);
    let normalized: Vec<String> = texts.par_iter().map(|text| normalize(text.as_ref())).collect();
    let shingle_sets: Vec<AHashSet<&str>> = normalized
        .par_iter()
        .map(|text| shingles(text, config.ngram))
        .collect();
    let signatures: Vec<(usize, Signature)> = shingle_sets
        .par_iter()
        .enumerate()
        .map(|(index, set)| (index, hasher.create_signature(set.iter())))
        .collect();
    let empty_documents = shingle_sets.iter().filter(|set| set.is_empty()).count();

    let candidates = CandidatePairFinder::new(config.bander()?).find(&signatures)?;
    let buckets = candidates.stats;
    let candidate_pairs = candidates.into_sorted_vec();

    let verifier = JaccardVerifier::new(config.ngram, config.jaccard_threshold);
    let verified = verifier.verify_shingles(&candidate_pairs, |index: &usize| &shingle_sets[*index]);

    let mut union_find = UnionFind::with_capacity(verified.len() * 2);
    for pair in &verified {
        union_find.union(&pair.a, &pair.b);
    }
    let mut groups: Vec<Vec<usize>> = union_find
        .extract_clusters()
        .into_iter()
        .map(|mut members| {
            members.sort_by(|a, b| doc_ids[*a].cmp(&doc_ids[*b]));
            members
        })
        .collect();
    groups.sort_by(|a, b| doc_ids[a[0]].cmp(&doc_ids[b[0]]));

    let mut assignments: AHashMap<Id, Option<ClusterId>> =
        doc_ids.iter().map(|id| (id.clone(), None)).collect();
    let mut clusters = Vec::with_capacity(groups.len());
    let mut dropped = 0;
    for (cluster_id, group) in groups.into_iter().enumerate() {
        let members: Vec<Member<'_, Id>> = group
            .iter()
            .map(|index| Member {
                id: &doc_ids[*index],
                text: texts[*index].as_ref(),
            })
            .collect();
        let chosen = policy.select(&members).min(group.len() - 1);
        for index in &group {
            assignments.insert(doc_ids[*index].clone(), Some(cluster_id));
        }
        dropped += group.len() - 1;
        clusters.push(DuplicateCluster {
            id: cluster_id,
            representative: doc_ids[group[chosen]].clone(),
            members: group.iter().map(|index| doc_ids[*index].clone()).collect(),
        });
    }

    let stats = DedupStats {
        documents: doc_ids.len(),
        empty_documents,
        candidate_pairs: candidate_pairs.len(),
        verified_pairs: verified.len(),
        clusters: clusters.len(),
        dropped,
        buckets,
    };
    info!(
        documents = stats.documents,
        candidates = stats.candidate_pairs,
        verified = stats.verified_pairs,
        clusters = stats.clusters,
        dropped = stats.dropped,
        "near-duplicate pass finished"
    );

    Ok(DedupOutcome {
        documents: doc_ids.to_vec(),
        assignments,
        clusters,
        stats,
    })
}

/// Outcome of [`minhash_dedup_files`].
#[derive(Clone, Debug)]
pub struct FileDedupReport {
    /// One entry per input path, in input order.
    pub statuses: Vec<(PathBuf, DocumentStatus)>,
    pub clusters: Vec<DuplicateCluster<PathBuf>>,
    pub files_written: usize,
    pub stats: DedupStats,
}

impl FileDedupReport {
    pub fn status(&self, path: impl AsRef<Path>) -> Option<&DocumentStatus> {
        let path = path.as_ref();
        self.statuses
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, status)| status)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PathBuf, &str)> {
        self.statuses.iter().filter_map(|(path, status)| match status {
            DocumentStatus::Failed { reason } => Some((path, reason.as_str())),
            _ => None,
        })
    }
}

/// Deduplicates the documents stored in `files`, one document per file, and
/// writes every surviving file unchanged to `out_dir` under its own file name.
///
/// A file that cannot be read or written is reported as
/// [`DocumentStatus::Failed`] without stopping the run. Two kept inputs with
/// the same file name cannot both be written; the later one fails. When a
/// cluster representative fails to be written, the next member of its
/// cluster that can be written is kept in its place. Listing the same path
/// twice is a configuration error.
pub fn minhash_dedup_files<P>(files: &[P], out_dir: impl AsRef<Path>, config: &DedupConfig) -> Result<FileDedupReport>
where
    P: AsRef<Path> + Sync,
{
    config.validate()?;
    let out_dir = out_dir.as_ref();
    create_dir(out_dir)?;

    let reads: Vec<(PathBuf, Result<String>)> = files
        .par_iter()
        .map(|path| (path.as_ref().to_path_buf(), read_text(path.as_ref())))
        .collect();

    let mut failures: AHashMap<PathBuf, String> = AHashMap::new();
    let mut paths = Vec::with_capacity(reads.len());
    let mut texts = Vec::with_capacity(reads.len());
    for (path, read) in reads {
        match read {
            Ok(text) => {
                paths.push(path);
                texts.push(text);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable document");
                failures.insert(path, e.to_string());
            }
        }
    }

    let outcome = dedup(&paths, &texts, config)?;

    let mut files_written = 0;
    let mut names: AHashSet<OsString> = AHashSet::new();
    let mut orphaned = Vec::new();
    for (path, text) in paths.iter().zip(texts.iter()) {
        if !outcome.is_kept(path) {
            continue;
        }
        match write_document(out_dir, path, text, &mut names) {
            Ok(()) => files_written += 1,
            Err(reason) => {
                failures.insert(path.clone(), reason);
                if let Some(cluster) = outcome.cluster_of(path) {
                    orphaned.push(cluster);
                }
            }
        }
    }

    // a cluster whose representative could not be written keeps its next writable member
    let mut clusters = outcome.clusters.clone();
    let mut promoted: AHashMap<PathBuf, ClusterId> = AHashMap::new();
    let positions: AHashMap<&PathBuf, usize> = paths.iter().enumerate().map(|(i, path)| (path, i)).collect();
    for cluster_id in orphaned {
        let cluster = &mut clusters[cluster_id];
        let mut replacement = None;
        for member in &cluster.members {
            if failures.contains_key(member) {
                continue;
            }
            let Some(position) = positions.get(member) else {
                continue;
            };
            match write_document(out_dir, member, &texts[*position], &mut names) {
                Ok(()) => {
                    replacement = Some(member.clone());
                    break;
                }
                Err(reason) => {
                    failures.insert(member.clone(), reason);
                }
            }
        }
        if let Some(member) = replacement {
            info!(cluster = cluster_id, representative = %member.display(), "promoted cluster member");
            files_written += 1;
            promoted.insert(member.clone(), cluster_id);
            cluster.representative = member;
        }
    }

    let statuses = files
        .iter()
        .map(|path| {
            let path = path.as_ref().to_path_buf();
            let status = match (failures.get(&path), promoted.get(&path)) {
                (Some(reason), _) => DocumentStatus::Failed { reason: reason.clone() },
                (None, Some(cluster)) => DocumentStatus::Kept { cluster: Some(*cluster) },
                (None, None) => outcome.status(&path).unwrap_or(DocumentStatus::Failed {
                    reason: "document was not processed".to_string(),
                }),
            };
            (path, status)
        })
        .collect();

    info!(
        inputs = files.len(),
        written = files_written,
        failed = failures.len(),
        out_dir = %out_dir.display(),
        "wrote deduplicated documents"
    );

    Ok(FileDedupReport {
        statuses,
        clusters,
        files_written,
        stats: outcome.stats,
    })
}

/// Writes one kept document under its file name, refusing a name already used in this run.
fn write_document(
    out_dir: &Path,
    path: &Path,
    text: &str,
    names: &mut AHashSet<OsString>,
) -> std::result::Result<(), String> {
    let target = output_path(out_dir, path).ok_or_else(|| "input path has no file name".to_string())?;
    let name = target.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    if names.contains(&name) {
        warn!(path = %path.display(), "output file name already written by another input");
        return Err(format!("output name {:?} is already taken", name));
    }
    match write_atomic(&target, text.as_bytes()) {
        Ok(()) => {
            names.insert(name);
            Ok(())
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to write document");
            Err(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::{LongestDocument, QualityScore, RepresentativeSelection};

    static S1: &'static str = "
    Lorem Ipsum is simply dummy text of the printing and typesetting industry.
    Lorem Ipsum has been the industry's standard dummy text ever since the 1500s,
    when an unknown printer took a galley of type and scrambled it to make a type specimen book.
    It has survived not only five centuries, but also the leap into electronic typesetting,
    remaining essentially unchanged.";

    static S2: &'static str = "
    Lorem Ipsum is simply dummy text of the printing and typesetting industry.
    Lorem Ipsum has been the industry's standard dummy text ever since the fifteen hundreds,
    when an unknown printer took a galley of type and scrambled it to make a type specimen book.
    It has survived not only five centuries, but also the leap into electronic typesetting,
    remaining essentially unchanged.";

    static S3: &'static str = "
    Contrary to popular belief, Lorem Ipsum is not simply random text.
    It has roots in a piece of classical Latin literature from 45 BC, making it over 2000 years old.
    Richard McClintock, a Latin professor at Hampden-Sydney College in Virginia, looked up one of the
    more obscure Latin words, consectetur, from a Lorem Ipsum passage.";

    #[test]
    fn test_near_duplicates_clustered() {
        let ids = ["a", "b", "c"];
        let texts = [S1, S2, S3];
        let outcome = dedup(&ids, &texts, &DedupConfig::default()).unwrap();
        assert_eq!(outcome.clusters.len(), 1);
        assert_eq!(outcome.clusters[0].members, vec!["a", "b"]);
        assert_eq!(outcome.clusters[0].representative, "a");
        assert_eq!(outcome.kept(), vec![&"a", &"c"]);
        assert_eq!(outcome.dropped(), vec![&"b"]);
        assert_eq!(outcome.status(&"b"), Some(DocumentStatus::Dropped { cluster: 0 }));
        assert_eq!(outcome.status(&"c"), Some(DocumentStatus::Kept { cluster: None }));
        assert_eq!(outcome.status(&"z"), None);
        assert_eq!(outcome.stats.dropped, 1);
    }

    #[test]
    fn test_every_document_assigned() {
        let ids = [3, 1, 2];
        let texts = [S3, S1, S2];
        let outcome = dedup(&ids, &texts, &DedupConfig::default()).unwrap();
        assert_eq!(outcome.assignments.len(), 3);
        assert_eq!(outcome.cluster_of(&3), None);
        assert_eq!(outcome.cluster_of(&1), outcome.cluster_of(&2));
        // input order is preserved
        assert_eq!(outcome.kept(), vec![&3, &1]);
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let ids = [1, 2];
        let texts = ["Hello, World! This is a test.", "hello world this is a test"];
        let outcome = dedup(&ids, &texts, &DedupConfig::default()).unwrap();
        assert_eq!(outcome.kept(), vec![&1]);
    }

    #[test]
    fn test_transitive_cluster() {
        let base = "one two three four five six seven eight nine ten eleven twelve";
        let ids = [1, 2, 3];
        let texts = [
            base.to_string(),
            format!("{} thirteen", base),
            format!("{} thirteen fourteen", base),
        ];
        let config = DedupConfig::default()
            .with_num_bands(50)
            .with_jaccard_threshold(0.8);
        let outcome = dedup(&ids, &texts, &config).unwrap();
        assert_eq!(outcome.clusters.len(), 1);
        assert_eq!(outcome.clusters[0].members, vec![1, 2, 3]);
        assert_eq!(outcome.kept(), vec![&1]);
    }

    #[test]
    fn test_empty_documents_never_merge() {
        let ids = [1, 2, 3];
        let texts = ["", "ab", "!!"];
        let outcome = dedup(&ids, &texts, &DedupConfig::default()).unwrap();
        assert!(outcome.clusters.is_empty());
        assert_eq!(outcome.stats.empty_documents, 3);
        assert_eq!(outcome.kept().len(), 3);
    }

    #[test]
    fn test_empty_corpus() {
        let ids: [u32; 0] = [];
        let texts: [&str; 0] = [];
        let outcome = dedup(&ids, &texts, &DedupConfig::default()).unwrap();
        assert!(outcome.clusters.is_empty());
        assert!(outcome.kept().is_empty());
    }

    #[test]
    fn test_longest_representative() {
        let ids = ["a", "b", "c"];
        let texts = [S1, S2, S3];
        let config = DedupConfig::default().with_representative(RepresentativeSelection::LongestDocument);
        let outcome = dedup(&ids, &texts, &config).unwrap();
        assert_eq!(outcome.clusters[0].representative, "b");

        let mut policy = LongestDocument;
        let outcome = dedup_with_policy(&ids, &texts, &DedupConfig::default(), &mut policy).unwrap();
        assert_eq!(outcome.kept(), vec![&"b", &"c"]);
    }

    #[test]
    fn test_quality_representative() {
        let ids = ["a", "b", "c"];
        let texts = [S1, S2, S3];
        let mut policy: QualityScore<&str> = vec![("a", 0.2), ("b", 0.9)].into_iter().collect();
        let outcome = dedup_with_policy(&ids, &texts, &DedupConfig::default(), &mut policy).unwrap();
        assert_eq!(outcome.clusters[0].representative, "b");
    }

    #[test]
    fn test_random_representative_reproducible() {
        let ids = ["a", "b", "c"];
        let texts = [S1, S2, S3];
        let config = DedupConfig::default().with_representative(RepresentativeSelection::Random { seed: 7 });
        let first = dedup(&ids, &texts, &config).unwrap();
        let second = dedup(&ids, &texts, &config).unwrap();
        assert_eq!(first.clusters, second.clusters);
        assert!(first.kept().contains(&&"c"));
    }

    #[test]
    fn test_invalid_input() {
        let texts = [S1, S2];
        assert!(matches!(
            dedup(&[1, 1], &texts, &DedupConfig::default()),
            Err(DedupError::Config(_))
        ));
        assert!(dedup(&[1], &texts, &DedupConfig::default()).is_err());
        let config = DedupConfig::default().with_num_bands(3);
        assert!(dedup(&[1, 2], &texts, &config).is_err());
    }
}
