use crate::format::FormatVersion;
use schem_nbt::{Compression, DecodeLimits, DEFAULT_MAX_DECOMPRESSED_BYTES, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};

/// Bounds applied while reading untrusted buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// Deepest list/compound nesting accepted.
    pub max_depth: usize,
    /// Largest inflated size accepted for gzip or zlib input.
    pub max_decompressed_bytes: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            max_depth: DEFAULT_MAX_DEPTH,
            max_decompressed_bytes: DEFAULT_MAX_DECOMPRESSED_BYTES,
        }
    }
}

impl ReadOptions {
    pub fn limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_depth: self.max_depth,
            max_decompressed_bytes: self.max_decompressed_bytes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    pub version: FormatVersion,
    pub compression: Compression,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            version: FormatVersion::SpongeV3,
            compression: Compression::Gzip,
        }
    }
}
