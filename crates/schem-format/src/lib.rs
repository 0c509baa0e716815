//! Schematic layouts on top of the tag tree: the format-neutral [`Region`],
//! one parser/writer per on-disk version, structural detection, rotation and
//! mirroring, and the byte-level read/write pipeline.

pub mod block_state;
pub mod builder;
pub mod dispatch;
mod fields;
pub mod format;
pub mod litematic;
pub mod mcedit;
pub mod options;
pub mod pipeline;
pub mod region;
pub mod sponge;
pub mod sponge_v3;
pub mod transform;

pub use block_state::BlockState;
pub use builder::SchematicBuilder;
pub use dispatch::detect;
pub use format::{FormatVersion, SchematicFormat};
pub use options::{ReadOptions, WriteOptions};
pub use pipeline::{read, read_with, write, write_tree};
pub use region::{is_air, BiomeLayer, BlockEntity, BlockPalette, Region, AIR};
pub use transform::{Mirror, PropertyRule, Rotation, RotationRules, TransformWarning, Transformed, Transformer};
