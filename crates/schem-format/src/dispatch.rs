//! Picks a layout from the root compound's structural markers.

use crate::format::FormatVersion;
use crate::litematic::SUPPORTED_VERSIONS;
use crate::mcedit::MATERIALS;
use schem_common::{Result, SchemError};
use schem_nbt::{Compound, NbtFile, Tag};

fn has_compound(tag: &Compound, key: &str) -> bool {
    matches!(tag.get(key), Some(Tag::Compound(_)))
}

fn has_byte_array(tag: &Compound, key: &str) -> bool {
    matches!(tag.get(key), Some(Tag::ByteArray(_)))
}

fn int(tag: &Compound, key: &str) -> Option<i32> {
    match tag.get(key) {
        Some(Tag::Int(value)) => Some(*value),
        _ => None,
    }
}

fn sponge(version: i32) -> Result<FormatVersion> {
    match version {
        1 => Ok(FormatVersion::SpongeV1),
        2 => Ok(FormatVersion::SpongeV2),
        3 => Ok(FormatVersion::SpongeV3),
        other => Err(SchemError::unsupported(format!(
            "Sponge version {}",
            other
        ))),
    }
}

/// Returns the layout whose markers the file carries. Checks run in a fixed
/// order and the first match wins; nothing is guessed from partial data.
pub fn detect(file: &NbtFile) -> Result<FormatVersion> {
    let root = file
        .root
        .as_compound()
        .ok_or_else(|| SchemError::unsupported("root tag is not a compound"))?;

    if let Some(Tag::Compound(schematic)) = root.get("Schematic") {
        return match int(schematic, "Version") {
            Some(version) => sponge(version),
            None => Err(SchemError::unsupported(
                "Schematic compound without an int Version",
            )),
        };
    }

    if has_compound(root, "Regions") {
        if let Some(version) = int(root, "Version") {
            if SUPPORTED_VERSIONS.contains(&version) {
                return Ok(FormatVersion::Litematic);
            }
            return Err(SchemError::unsupported(format!(
                "Litematica version {}",
                version
            )));
        }
    }

    if has_compound(root, "Palette") && has_byte_array(root, "BlockData") {
        return match int(root, "Version").unwrap_or(1) {
            version @ (1 | 2) => sponge(version),
            other => Err(SchemError::unsupported(format!(
                "flat Sponge layout with version {}",
                other
            ))),
        };
    }

    if has_byte_array(root, "Blocks") && has_byte_array(root, "Data") {
        return match root.get("Materials") {
            None => Ok(FormatVersion::McEdit),
            Some(Tag::String(materials)) if materials == MATERIALS => Ok(FormatVersion::McEdit),
            Some(other) => Err(SchemError::unsupported(format!(
                "legacy materials {:?}",
                other
            ))),
        };
    }

    Err(SchemError::unsupported("no known schematic layout"))
}
