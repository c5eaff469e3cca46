/*!
This library finds and removes near-duplicate documents in a text corpus
with MinHash signatures and Locality Sensitive Hashing, and ships the
companion passes usually run around it:

* near-duplicate clustering with a configurable representative per cluster
* exact line deduplication across files
* Gopher quality heuristics and pluggable document gates
* PII masking

Documents are normalized (lowercased, punctuation removed, whitespace
collapsed, NFD), cut into character shingles and signed. Signatures are
split into bands; documents sharing a band become candidate pairs, which are
then verified with exact Jaccard similarity and merged into clusters with a
union-find.

## Example

 ```
 use neardup::config::DedupConfig;
 use neardup::dedup::{dedup, DocumentStatus};

 let corpus = [
     "This is the first document of the corpus.",
     "this is the FIRST document of the corpus",
     "And this is a completely unrelated piece of writing.",
 ];
 let ids = ["doc-a", "doc-b", "doc-c"];
 let config = DedupConfig::default()
     .with_num_hashes(128)
     .with_num_bands(32)
     .with_jaccard_threshold(0.8);
 let outcome = dedup(&ids, &corpus, &config).unwrap();

 assert_eq!(outcome.kept(), vec![&"doc-a", &"doc-c"]);
 assert_eq!(outcome.status(&"doc-b"), Some(DocumentStatus::Dropped { cluster: 0 }));
 ```

## References
[[1] Chapter 3, Mining of Massive Datasets](http://www.mmds.org)

[[2] Scaling Language Models: Methods, Analysis & Insights from Training Gopher](https://arxiv.org/abs/2112.11446)

 */

pub mod clustering;
pub mod config;
pub mod dedup;
pub mod error;
pub mod line_dedup;
pub mod minhash;
pub mod quality;
pub mod text;

mod io;

pub use crate::config::{DedupConfig, NeardupConfig};
pub use crate::dedup::{dedup, dedup_with_policy, minhash_dedup_files, DedupOutcome, DocumentStatus};
pub use crate::error::{DedupError, Result};
pub use crate::io::write_atomic;
pub use crate::line_dedup::{exact_line_dedup, exact_line_dedup_with_config};
pub use crate::quality::gopher_filter;
