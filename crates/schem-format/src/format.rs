use crate::litematic::Litematic;
use crate::mcedit::McEdit;
use crate::region::Region;
use crate::sponge::Sponge;
use crate::sponge_v3::SpongeV3;
use schem_common::Result;
use schem_nbt::NbtFile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every on-disk layout the codec reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatVersion {
    SpongeV1,
    SpongeV2,
    SpongeV3,
    Litematic,
    McEdit,
}

impl FormatVersion {
    pub const ALL: [FormatVersion; 5] = [
        FormatVersion::SpongeV1,
        FormatVersion::SpongeV2,
        FormatVersion::SpongeV3,
        FormatVersion::Litematic,
        FormatVersion::McEdit,
    ];

    /// The parser/writer pair for this version.
    pub fn codec(self) -> &'static dyn SchematicFormat {
        match self {
            FormatVersion::SpongeV1 => &Sponge::V1,
            FormatVersion::SpongeV2 => &Sponge::V2,
            FormatVersion::SpongeV3 => &SpongeV3,
            FormatVersion::Litematic => &Litematic,
            FormatVersion::McEdit => &McEdit,
        }
    }

    /// Usual file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            FormatVersion::SpongeV1 | FormatVersion::SpongeV2 | FormatVersion::SpongeV3 => "schem",
            FormatVersion::Litematic => "litematic",
            FormatVersion::McEdit => "schematic",
        }
    }

    /// Whether the metadata compound survives a write/read cycle in this version.
    pub fn preserves_metadata(self) -> bool {
        !matches!(self, FormatVersion::McEdit)
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatVersion::SpongeV1 => write!(f, "Sponge v1"),
            FormatVersion::SpongeV2 => write!(f, "Sponge v2"),
            FormatVersion::SpongeV3 => write!(f, "Sponge v3"),
            FormatVersion::Litematic => write!(f, "Litematica"),
            FormatVersion::McEdit => write!(f, "MCEdit"),
        }
    }
}

/// One schematic layout. Contains the functions to read it from and write it to a tag file.
pub trait SchematicFormat: Send + Sync {
    fn version(&self) -> FormatVersion;

    /// Reads the region from a decoded file whose structure matches this layout.
    fn parse(&self, file: &NbtFile) -> Result<Region>;

    /// Writes a valid region as a tag file. Fields the layout cannot hold are dropped.
    fn write(&self, region: &Region) -> Result<NbtFile>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_matches_version() {
        for version in FormatVersion::ALL {
            assert_eq!(version.codec().version(), version);
        }
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&FormatVersion::SpongeV3).unwrap(),
            "\"sponge_v3\""
        );
        let parsed: FormatVersion = serde_json::from_str("\"mc_edit\"").unwrap();
        assert_eq!(parsed, FormatVersion::McEdit);
    }

    #[test]
    fn test_metadata_policy() {
        assert!(FormatVersion::SpongeV2.preserves_metadata());
        assert!(!FormatVersion::McEdit.preserves_metadata());
        assert_eq!(FormatVersion::Litematic.extension(), "litematic");
    }
}
