//! Configuration for the dedup and filtering passes.
//!
//! Every struct deserializes with `#[serde(default)]`, so a JSON file only
//! needs the keys it overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::clustering::RepresentativeSelection;
use crate::error::{DedupError, Result};
use crate::line_dedup::LineDedupConfig;
use crate::minhash::{HashScheme, LshBander};
use crate::quality::GopherConfig;

/// Parameters of the MinHash near-duplicate pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub num_hashes: usize,
    /// Must evenly divide `num_hashes`.
    pub num_bands: usize,
    /// Character shingle length.
    pub ngram: usize,
    /// Minimum exact Jaccard similarity, inclusive, for two documents to be duplicates.
    pub jaccard_threshold: f64,
    pub hash_scheme: HashScheme,
    pub representative: RepresentativeSelection,
}

impl Default for DedupConfig {
    fn default() -> Self {
        DedupConfig {
            num_hashes: 100,
            num_bands: 10,
            ngram: 3,
            jaccard_threshold: 0.5,
            hash_scheme: HashScheme::default(),
            representative: RepresentativeSelection::default(),
        }
    }
}

impl DedupConfig {
    pub fn with_num_hashes(mut self, num_hashes: usize) -> Self {
        self.num_hashes = num_hashes;
        self
    }

    pub fn with_num_bands(mut self, num_bands: usize) -> Self {
        self.num_bands = num_bands;
        self
    }

    pub fn with_ngram(mut self, ngram: usize) -> Self {
        self.ngram = ngram;
        self
    }

    pub fn with_jaccard_threshold(mut self, jaccard_threshold: f64) -> Self {
        self.jaccard_threshold = jaccard_threshold;
        self
    }

    pub fn with_hash_scheme(mut self, hash_scheme: HashScheme) -> Self {
        self.hash_scheme = hash_scheme;
        self
    }

    pub fn with_representative(mut self, representative: RepresentativeSelection) -> Self {
        self.representative = representative;
        self
    }

    /// The band partition described by this config.
    pub fn bander(&self) -> Result<LshBander> {
        LshBander::new(self.num_hashes, self.num_bands)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ngram == 0 {
            return Err(DedupError::config("ngram must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.jaccard_threshold) {
            return Err(DedupError::config(format!(
                "jaccard_threshold must be within [0, 1], got {}",
                self.jaccard_threshold
            )));
        }
        self.bander()?;
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DedupConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| DedupError::io(path, e))?;
        Self::from_json_str(&json)
    }
}

/// Settings for every pass, as loaded from a single file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeardupConfig {
    pub dedup: DedupConfig,
    pub gopher: GopherConfig,
    pub line_dedup: LineDedupConfig,
}

impl NeardupConfig {
    pub fn validate(&self) -> Result<()> {
        self.dedup.validate()?;
        self.gopher.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: NeardupConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| DedupError::io(path, e))?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::{DedupConfig, NeardupConfig};
    use crate::clustering::RepresentativeSelection;
    use crate::error::DedupError;
    use crate::line_dedup::LineHasher;
    use crate::minhash::HashScheme;

    #[test]
    fn test_defaults() {
        let config = DedupConfig::default();
        assert_eq!(config.num_hashes, 100);
        assert_eq!(config.num_bands, 10);
        assert_eq!(config.ngram, 3);
        assert_eq!(config.jaccard_threshold, 0.5);
        assert_eq!(config.representative, RepresentativeSelection::FirstById);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_indivisible_bands_rejected() {
        let config = DedupConfig::default().with_num_bands(7);
        assert!(matches!(config.validate(), Err(DedupError::Config(_))));
    }

    #[test]
    fn test_invalid_threshold_and_ngram() {
        assert!(DedupConfig::default().with_jaccard_threshold(1.5).validate().is_err());
        assert!(DedupConfig::default().with_jaccard_threshold(f64::NAN).validate().is_err());
        assert!(DedupConfig::default().with_ngram(0).validate().is_err());
    }

    #[test]
    fn test_partial_json() {
        let config = DedupConfig::from_json_str(
            r#"{"num_hashes": 128, "num_bands": 16, "hash_scheme": "permutation"}"#,
        )
        .unwrap();
        assert_eq!(config.num_hashes, 128);
        assert_eq!(config.num_bands, 16);
        assert_eq!(config.ngram, 3);
        assert_eq!(config.hash_scheme, HashScheme::Permutation);

        assert!(DedupConfig::from_json_str(r#"{"num_bands": 3}"#).is_err());
        assert!(matches!(
            DedupConfig::from_json_str("{not json"),
            Err(DedupError::Json(_))
        ));
    }

    #[test]
    fn test_full_config() {
        let config = NeardupConfig::from_json_str(
            r#"{
                "dedup": {"representative": {"policy": "longest_document"}},
                "gopher": {"token_count": {"enabled": true}},
                "line_dedup": {"hasher": "sea"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.dedup.representative, RepresentativeSelection::LongestDocument);
        assert!(config.gopher.token_count.enabled);
        assert_eq!(config.line_dedup.hasher, LineHasher::Sea);
    }
}
