//! Big-endian binary tag trees, optionally gzip or zlib wrapped.

pub mod compression;
pub mod io;
pub mod tag;

pub use compression::Compression;
pub use io::{Decoder, DEFAULT_MAX_DEPTH};
pub use tag::{type_name_of, Compound, CompoundExt, FromTag, Tag};

use schem_common::{Result, SchemError};

/// Ceiling on inflated input, far above any real schematic.
pub const DEFAULT_MAX_DECOMPRESSED_BYTES: usize = 512 * 1024 * 1024;

/// Resource bounds applied while decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub max_depth: usize,
    pub max_decompressed_bytes: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        DecodeLimits {
            max_depth: DEFAULT_MAX_DEPTH,
            max_decompressed_bytes: DEFAULT_MAX_DECOMPRESSED_BYTES,
        }
    }
}

/// A complete file: one named root tag.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtFile {
    pub name: String,
    pub root: Tag,
}

impl NbtFile {
    pub fn new(name: impl Into<String>, root: Tag) -> Self {
        NbtFile {
            name: name.into(),
            root,
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_with(bytes, &DecodeLimits::default()).map(|(file, _)| file)
    }

    /// Detects the wrapping, inflates and decodes. Returns the detected compression too.
    pub fn decode_with(bytes: &[u8], limits: &DecodeLimits) -> Result<(Self, Compression)> {
        let compression = Compression::detect(bytes);
        let data = compression.decompress(bytes, limits.max_decompressed_bytes)?;
        let file = Self::decode_raw(&data, limits.max_depth)?;
        Ok((file, compression))
    }

    /// Decodes an already uncompressed buffer. Trailing bytes after the root are ignored.
    pub fn decode_raw(bytes: &[u8], max_depth: usize) -> Result<Self> {
        let mut decoder = Decoder::new(bytes, max_depth);
        let (name, root) = decoder.read_named()?;
        if matches!(root, Tag::End) {
            return Err(SchemError::corrupt(0, "root tag is End"));
        }
        Ok(NbtFile { name, root })
    }

    /// Uncompressed encoding.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.root.write(&mut buffer, &self.name)?;
        Ok(buffer)
    }

    pub fn encode_with(&self, compression: Compression) -> Result<Vec<u8>> {
        compression.compress(self.encode()?)
    }

    pub fn root_compound(&self) -> Result<&Compound> {
        self.root.cast::<&Compound>()
    }
}
