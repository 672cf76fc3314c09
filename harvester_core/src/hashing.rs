//! Content hashing for audited copies
//!
//! Every audited copy feeds the bytes it writes into one streaming hasher.
//! The digest only depends on the byte sequence, never on how it was chunked.

use crate::{Error, Result, error::ValidationError};
use serde::{Deserialize, Serialize};

mod algorithms;

/// Supported content hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1, the historical default for transfer audits
    #[default]
    Sha1,
    /// MD5
    Md5,
    /// CRC32, cheap but not collision resistant
    Crc32,
}

impl HashAlgorithm {
    /// Create a new streaming hasher for this algorithm
    pub fn create_hasher(&self) -> Box<dyn StreamingHasher> {
        match self {
            HashAlgorithm::Sha1 => Box::new(algorithms::Sha1Hasher::new()),
            HashAlgorithm::Md5 => Box::new(algorithms::Md5Hasher::new()),
            HashAlgorithm::Crc32 => Box::new(algorithms::Crc32Hasher::new()),
        }
    }

    /// Hash in-memory data in one go
    pub fn hash_bytes(&self, data: &[u8]) -> String {
        let mut hasher = self.create_hasher();
        hasher.update(data);
        hasher.finalize()
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Sha1 => write!(f, "sha1"),
            HashAlgorithm::Md5 => write!(f, "md5"),
            HashAlgorithm::Crc32 => write!(f, "crc32"),
        }
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sha1" => Ok(HashAlgorithm::Sha1),
            "md5" => Ok(HashAlgorithm::Md5),
            "crc32" => Ok(HashAlgorithm::Crc32),
            _ => Err(Error::Validation(ValidationError::invalid_configuration(
                &format!("Unknown hash algorithm: {s}"),
            ))),
        }
    }
}

/// Trait for streaming hash calculation
pub trait StreamingHasher: Send {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash calculation and return the hex-encoded digest
    fn finalize(self: Box<Self>) -> String;
}
