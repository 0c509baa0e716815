pub use schem_common as common;
pub use schem_format as format;
pub use schem_logger as logger;
pub use schem_nbt as nbt;
pub use schem_palette as palette;

// Re-export commonly used items
pub use schem_common::{BlockPos, Dimensions, Result, SchemError};
pub use schem_format::{
    read, read_with, write, write_tree, FormatVersion, Mirror, ReadOptions, Region, Rotation,
    RotationRules, SchematicBuilder, Transformer, WriteOptions,
};
pub use schem_logger::{log, LogSeverity};
pub use schem_nbt::{Compression, NbtFile, Tag};
