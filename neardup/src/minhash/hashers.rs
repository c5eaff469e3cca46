use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use fnv::FnvBuildHasher;
use serde::{Deserialize, Serialize};

use crate::minhash::{MinHasher, PermutationMinHasher, SaltedMinHasher, Signature};

/// The family of hash functions used to build signatures.
///
/// `Salted` hashes every shingle once per seed with the seed as the key.
/// `Permutation` hashes every shingle once and derives the other values
/// from random linear permutations modulo a Mersenne prime, which is faster
/// for long signatures. Signatures from different schemes are not comparable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashScheme {
    #[default]
    Salted,
    Permutation,
}

impl HashScheme {
    pub fn min_hasher(&self, num_hashes: usize) -> SignatureHasher {
        match self {
            HashScheme::Salted => SignatureHasher::Salted(SaltedMinHasher::new(num_hashes)),
            HashScheme::Permutation => {
                SignatureHasher::Permutation(PermutationMinHasher::new(num_hashes))
            }
        }
    }
}

impl FromStr for HashScheme {
    type Err = String;

    fn from_str(input: &str) -> Result<HashScheme, String> {
        match input.to_lowercase().as_str() {
            "salted" => Ok(HashScheme::Salted),
            "permutation" => Ok(HashScheme::Permutation),
            _ => Err(format!(
                "Unsupported hash scheme [{}]. Supported schemes [salted, permutation].",
                input
            )),
        }
    }
}

impl fmt::Display for HashScheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A min hasher chosen at runtime from a [`HashScheme`].
#[derive(Clone)]
pub enum SignatureHasher {
    Salted(SaltedMinHasher),
    Permutation(PermutationMinHasher<FnvBuildHasher>),
}

impl MinHasher for SignatureHasher {
    fn num_hashes(&self) -> usize {
        match self {
            SignatureHasher::Salted(hasher) => hasher.num_hashes(),
            SignatureHasher::Permutation(hasher) => hasher.num_hashes(),
        }
    }

    fn create_signature<T, U>(&self, iter: T) -> Signature
    where
        T: Iterator<Item = U>,
        U: Hash,
    {
        match self {
            SignatureHasher::Salted(hasher) => hasher.create_signature(iter),
            SignatureHasher::Permutation(hasher) => hasher.create_signature(iter),
        }
    }
}
