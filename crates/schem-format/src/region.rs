use schem_common::{BlockPos, Dimensions, Result, SchemError};
use schem_nbt::Compound;
use std::collections::HashMap;

pub const AIR: &str = "minecraft:air";

pub fn is_air(name: &str) -> bool {
    matches!(
        name,
        "minecraft:air" | "air" | "minecraft:cave_air" | "minecraft:void_air"
    )
}

/// Ordered, duplicate free list of identifier strings with reverse lookup.
#[derive(Debug, Clone, Default)]
pub struct BlockPalette {
    entries: Vec<String>,
    lookup: HashMap<String, u32>,
}

impl BlockPalette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut palette = BlockPalette::new();
        for entry in entries {
            let entry = entry.into();
            if palette.index_of(&entry).is_some() {
                return Err(SchemError::invalid(
                    "palette",
                    format!("duplicate entry '{}'", entry),
                ));
            }
            palette.get_or_insert(&entry);
        }
        Ok(palette)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&str> {
        self.entries.get(index as usize).map(String::as_str)
    }

    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.lookup.get(name).copied()
    }

    pub fn get_or_insert(&mut self, name: &str) -> u32 {
        if let Some(index) = self.index_of(name) {
            return index;
        }
        let index = self.entries.len() as u32;
        self.entries.push(name.to_owned());
        self.lookup.insert(name.to_owned(), index);
        index
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, name)| (i as u32, name.as_str()))
    }
}

impl PartialEq for BlockPalette {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for BlockPalette {}

/// Dense biome grid with the same shape as the block grid.
#[derive(Debug, Clone, PartialEq)]
pub struct BiomeLayer {
    pub palette: BlockPalette,
    pub data: Vec<u32>,
}

/// Opaque tile data anchored to a cell, relative to the region's min corner.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntity {
    pub pos: BlockPos,
    pub data: Compound,
}

/// Format-neutral schematic.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub size: Dimensions,
    /// Where the min corner lands relative to the paste origin.
    pub offset: BlockPos,
    pub palette: BlockPalette,
    /// Palette indices in `x + z*width + y*width*length` order.
    pub blocks: Vec<u32>,
    pub biomes: Option<BiomeLayer>,
    pub block_entities: Vec<BlockEntity>,
    pub entities: Vec<Compound>,
    pub metadata: Compound,
    pub data_version: Option<i32>,
}

impl Region {
    /// An all-air region with air at palette index 0.
    pub fn new(size: Dimensions) -> Self {
        let mut palette = BlockPalette::new();
        palette.get_or_insert(AIR);
        Region {
            size,
            offset: BlockPos::ZERO,
            palette,
            blocks: vec![0; size.volume()],
            biomes: None,
            block_entities: Vec::new(),
            entities: Vec::new(),
            metadata: Compound::new(),
            data_version: None,
        }
    }

    pub fn volume(&self) -> usize {
        self.size.volume()
    }

    pub fn index_of(&self, pos: BlockPos) -> Option<usize> {
        if !self.size.contains(pos.x, pos.y, pos.z) {
            return None;
        }
        Some(
            self.size
                .index_of(pos.x as usize, pos.y as usize, pos.z as usize),
        )
    }

    pub fn block_at(&self, pos: BlockPos) -> Option<&str> {
        let index = self.index_of(pos)?;
        self.palette.get(*self.blocks.get(index)?)
    }

    pub fn set_block(&mut self, pos: BlockPos, name: &str) -> Result<()> {
        let index = self.index_of(pos).ok_or_else(|| {
            SchemError::invalid(
                "pos",
                format!("({}, {}, {}) lies outside the region", pos.x, pos.y, pos.z),
            )
        })?;
        self.blocks[index] = self.palette.get_or_insert(name);
        Ok(())
    }

    pub fn block_entity_at(&self, pos: BlockPos) -> Option<&BlockEntity> {
        self.block_entities.iter().find(|be| be.pos == pos)
    }

    /// Checks every structural invariant a writer relies on.
    pub fn validate(&self) -> Result<()> {
        if self.size.is_empty() {
            return Err(SchemError::invalid(
                "size",
                format!(
                    "dimensions {}x{}x{} must all be positive",
                    self.size.width, self.size.height, self.size.length
                ),
            ));
        }

        let volume = self.volume();
        check_grid("blocks", &self.blocks, volume, self.palette.len())?;

        if let Some(biomes) = &self.biomes {
            check_grid("biomes", &biomes.data, volume, biomes.palette.len())?;
        }

        for (i, be) in self.block_entities.iter().enumerate() {
            if !self.size.contains(be.pos.x, be.pos.y, be.pos.z) {
                return Err(SchemError::invalid(
                    format!("block_entities[{}]", i),
                    format!(
                        "position ({}, {}, {}) lies outside the region",
                        be.pos.x, be.pos.y, be.pos.z
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Whether both regions hold the same block identifier in every cell,
    /// regardless of palette order.
    pub fn same_blocks(&self, other: &Region) -> bool {
        self.size == other.size
            && self.blocks.len() == other.blocks.len()
            && self
                .blocks
                .iter()
                .zip(&other.blocks)
                .all(|(&a, &b)| self.palette.get(a) == other.palette.get(b))
    }

    pub fn non_air_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|&&index| self.palette.get(index).map_or(false, |name| !is_air(name)))
            .count()
    }
}

fn check_grid(name: &str, data: &[u32], volume: usize, palette_len: usize) -> Result<()> {
    if data.len() != volume {
        return Err(SchemError::invalid(
            name,
            format!("holds {} cells, volume is {}", data.len(), volume),
        ));
    }
    if let Some((i, &index)) = data
        .iter()
        .enumerate()
        .find(|&(_, &index)| index as usize >= palette_len)
    {
        return Err(SchemError::invalid(
            format!("{}[{}]", name, i),
            format!("index {} outside palette of {}", index, palette_len),
        ));
    }
    Ok(())
}
