use crate::region::{BlockEntity, Region};
use schem_common::{BlockPos, Dimensions, Result, SchemError};
use schem_nbt::{Compound, Tag};
use std::collections::HashMap;

/// Collects blocks at absolute positions and turns them into a tight [`Region`].
///
/// The region spans the bounding box of every placed block. Its offset is the
/// configured offset shifted by the box's min corner, air sits at palette index 0
/// and the rest of the palette follows cell order.
#[derive(Debug, Clone, Default)]
pub struct SchematicBuilder {
    blocks: HashMap<BlockPos, String>,
    block_entities: HashMap<BlockPos, Compound>,
    offset: BlockPos,
    metadata: Compound,
    data_version: Option<i32>,
}

// Cell order of the built region: x innermost, then z, then y.
fn cell_order(pos: &BlockPos) -> (i32, i32, i32) {
    (pos.y, pos.z, pos.x)
}

impl SchematicBuilder {
    pub fn new() -> Self {
        SchematicBuilder::default()
    }

    /// Places a block, replacing whatever was set at `pos` before.
    pub fn set_block(&mut self, pos: BlockPos, name: impl Into<String>) -> &mut Self {
        self.blocks.insert(pos, name.into());
        self
    }

    /// Attaches tile data to a placed block.
    pub fn set_block_entity(&mut self, pos: BlockPos, data: Compound) -> &mut Self {
        self.block_entities.insert(pos, data);
        self
    }

    pub fn set_offset(&mut self, offset: BlockPos) -> &mut Self {
        self.offset = offset;
        self
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: Tag) -> &mut Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn set_data_version(&mut self, data_version: i32) -> &mut Self {
        self.data_version = Some(data_version);
        self
    }

    pub fn build(&self) -> Result<Region> {
        let mut positions = self.blocks.keys();
        let first = *positions
            .next()
            .ok_or_else(|| SchemError::invalid("blocks", "no blocks placed"))?;
        let (min, max) = positions.fold((first, first), |(min, max), &pos| (min.min(pos), max.max(pos)));

        let extent = |axis: &str, low: i32, high: i32| -> Result<u16> {
            u16::try_from(i64::from(high) - i64::from(low) + 1).map_err(|_| {
                SchemError::invalid(
                    format!("size.{}", axis),
                    format!("span {}..={} does not fit in 16 bits", low, high),
                )
            })
        };
        let size = Dimensions::new(
            extent("x", min.x, max.x)?,
            extent("y", min.y, max.y)?,
            extent("z", min.z, max.z)?,
        );

        let mut region = Region::new(size);
        let mut placed: Vec<(&BlockPos, &String)> = self.blocks.iter().collect();
        placed.sort_by_key(|(pos, _)| cell_order(pos));
        for (pos, name) in placed {
            region.set_block(pos.sub(min), name)?;
        }

        let mut block_entities: Vec<(&BlockPos, &Compound)> = self.block_entities.iter().collect();
        block_entities.sort_by_key(|(pos, _)| cell_order(pos));
        for (pos, data) in block_entities {
            if !self.blocks.contains_key(pos) {
                return Err(SchemError::invalid(
                    "block_entities",
                    format!("({}, {}, {}) has no placed block", pos.x, pos.y, pos.z),
                ));
            }
            region.block_entities.push(BlockEntity {
                pos: pos.sub(min),
                data: data.clone(),
            });
        }

        region.offset = self.offset.checked_add(min).ok_or_else(|| {
            SchemError::invalid(
                "offset",
                format!(
                    "({}, {}, {}) shifted by the min corner ({}, {}, {}) leaves 32-bit space",
                    self.offset.x, self.offset.y, self.offset.z, min.x, min.y, min.z
                ),
            )
        })?;
        region.metadata = self.metadata.clone();
        region.data_version = self.data_version;
        Ok(region)
    }
}
