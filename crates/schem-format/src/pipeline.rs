//! Whole-buffer entry points: bytes to [`Region`] and back.

use crate::dispatch::detect;
use crate::format::FormatVersion;
use crate::options::{ReadOptions, WriteOptions};
use crate::region::Region;
use schem_common::{Result, SchemError};
use schem_logger::{log, LogSeverity};
use schem_nbt::tag::TAG_COMPOUND;
use schem_nbt::{Compression, NbtFile};

/// Reads a schematic with default limits.
pub fn read(bytes: &[u8]) -> Result<(FormatVersion, Region)> {
    read_with(bytes, &ReadOptions::default())
}

/// Inflates if needed, decodes the tree, picks the layout from its markers and parses it.
/// Returns the detected version alongside the region.
pub fn read_with(bytes: &[u8], options: &ReadOptions) -> Result<(FormatVersion, Region)> {
    if bytes.is_empty() {
        return Err(SchemError::unsupported("empty buffer"));
    }

    let compression = Compression::detect(bytes);
    log(
        format!("Detected {} compression on {} bytes", compression, bytes.len()),
        LogSeverity::Debug,
    );
    let data = compression.decompress(bytes, options.max_decompressed_bytes)?;

    match data.first() {
        Some(&TAG_COMPOUND) => {}
        Some(&id) => {
            return Err(SchemError::unsupported(format!(
                "buffer starts with tag id {}, not a compound",
                id
            )))
        }
        None => return Err(SchemError::unsupported("empty tree after decompression")),
    }

    let file = NbtFile::decode_raw(&data, options.max_depth)?;
    let version = detect(&file)?;
    log(format!("Detected {} layout", version), LogSeverity::Debug);

    let region = version.codec().parse(&file)?;
    Ok((version, region))
}

/// Builds the tag tree for `version` after checking the region's invariants.
pub fn write_tree(region: &Region, version: FormatVersion) -> Result<NbtFile> {
    region.validate()?;
    version.codec().write(region)
}

/// Writes the region in the configured version and compression.
/// The same input always produces the same bytes.
pub fn write(region: &Region, options: &WriteOptions) -> Result<Vec<u8>> {
    let file = write_tree(region, options.version)?;
    let bytes = file.encode_with(options.compression)?;
    log(
        format!(
            "Wrote {} layout with {} compression ({} bytes)",
            options.version,
            options.compression,
            bytes.len()
        ),
        LogSeverity::Debug,
    );
    Ok(bytes)
}
