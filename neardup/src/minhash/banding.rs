use std::ops::Range;

use smallvec::SmallVec;

use crate::error::{DedupError, Result};

/// BandKey holds the values of one band of a signature.
///
/// Keys compare structurally, value by value, so `[1, 23]` and `[12, 3]` are
/// different keys. A key is only meaningful together with its band index:
/// two documents are candidates when they share a key at the same index.
/// Bands up to 16 values wide are stored inline.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BandKey(SmallVec<[u64; 16]>);

impl BandKey {
    pub fn new(band: &[u64]) -> Self {
        BandKey(SmallVec::from_slice(band))
    }

    pub fn values(&self) -> &[u64] {
        &self.0
    }
}

/// Partitions signatures into `num_bands` contiguous bands of equal width.
///
/// `num_bands` must divide the signature length exactly; anything else is
/// rejected with [`DedupError::Config`] instead of silently dropping the
/// trailing values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LshBander {
    num_bands: usize,
    band_width: usize,
}

impl LshBander {
    pub fn new(num_hashes: usize, num_bands: usize) -> Result<Self> {
        if num_bands == 0 {
            return Err(DedupError::config("num_bands must be greater than zero"));
        }
        if num_hashes == 0 {
            return Err(DedupError::config("num_hashes must be greater than zero"));
        }
        if num_hashes % num_bands != 0 {
            return Err(DedupError::config(format!(
                "num_bands ({}) must evenly divide num_hashes ({})",
                num_bands, num_hashes
            )));
        }
        Ok(LshBander {
            num_bands,
            band_width: num_hashes / num_bands,
        })
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    pub fn band_width(&self) -> usize {
        self.band_width
    }

    pub fn num_hashes(&self) -> usize {
        self.num_bands * self.band_width
    }

    #[inline]
    pub fn band_range(&self, band_index: usize) -> Range<usize> {
        band_index * self.band_width..(band_index + 1) * self.band_width
    }

    /// Key of a single band. `signature` must have `num_hashes()` values.
    #[inline]
    pub fn key(&self, signature: &[u64], band_index: usize) -> BandKey {
        BandKey::new(&signature[self.band_range(band_index)])
    }

    /// Splits a signature into `(band_index, key)` pairs, in band order.
    pub fn band(&self, signature: &[u64]) -> Result<Vec<(usize, BandKey)>> {
        self.check_len(signature)?;
        Ok((0..self.num_bands)
            .map(|band_index| (band_index, self.key(signature, band_index)))
            .collect())
    }

    pub(crate) fn check_len(&self, signature: &[u64]) -> Result<()> {
        if signature.len() != self.num_hashes() {
            return Err(DedupError::config(format!(
                "signature has {} values, expected {}",
                signature.len(),
                self.num_hashes()
            )));
        }
        Ok(())
    }
}

/// Splits `signature` into `num_bands` keyed bands.
///
/// ```
/// use neardup::minhash::lsh_bucket;
///
/// let signature: Vec<u64> = (0..100).collect();
/// let bands = lsh_bucket(&signature, 10).unwrap();
/// assert_eq!(bands.len(), 10);
/// assert_eq!(bands[3].1.values(), &signature[30..40]);
/// assert!(lsh_bucket(&signature, 7).is_err());
/// ```
pub fn lsh_bucket(signature: &[u64], num_bands: usize) -> Result<Vec<(usize, BandKey)>> {
    LshBander::new(signature.len(), num_bands)?.band(signature)
}
