use crate::fields::*;
use crate::format::{FormatVersion, SchematicFormat};
use crate::region::{BiomeLayer, Region};
use schem_common::{BlockPos, Dimensions, Result, SchemError};
use schem_nbt::{Compound, CompoundExt, NbtFile, Tag};

pub(crate) const WE_OFFSET_KEYS: [&str; 3] = ["WEOffsetX", "WEOffsetY", "WEOffsetZ"];

/// Flat Sponge layouts: `Palette` + varint `BlockData` beside the dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sponge {
    V1,
    V2,
}

/// WorldEdit's paste offset. `None` unless `WEOffsetX` is present, then all three are required.
pub(crate) fn read_we_offset(tag: &Compound) -> Result<Option<BlockPos>> {
    if !tag.contains_key(WE_OFFSET_KEYS[0]) {
        return Ok(None);
    }
    Ok(Some(BlockPos::new(
        tag.get_as::<i32>(WE_OFFSET_KEYS[0])?,
        tag.get_as::<i32>(WE_OFFSET_KEYS[1])?,
        tag.get_as::<i32>(WE_OFFSET_KEYS[2])?,
    )))
}

pub(crate) fn write_we_offset(tag: &mut Compound, offset: BlockPos) {
    for (key, value) in WE_OFFSET_KEYS.iter().zip(offset.to_array()) {
        tag.insert((*key).to_owned(), Tag::Int(value));
    }
}

impl Sponge {
    fn number(self) -> i32 {
        match self {
            Sponge::V1 => 1,
            Sponge::V2 => 2,
        }
    }

    fn block_entities_key(self) -> &'static str {
        match self {
            Sponge::V1 => "TileEntities",
            Sponge::V2 => "BlockEntities",
        }
    }

    fn parse_schematic(self, tag: &Compound) -> Result<Region> {
        let version = tag.get_or::<i32>("Version", 1)?;
        if version != self.number() {
            return Err(SchemError::unsupported(format!(
                "Sponge version {} cannot be read as v{}",
                version,
                self.number()
            )));
        }

        let size = read_dimensions(tag)?;

        let mut metadata = tag
            .get_opt::<&Compound>("Metadata")?
            .cloned()
            .unwrap_or_default();
        let offset = match read_we_offset(&metadata).map_err(|e| e.within("Metadata"))? {
            Some(offset) => offset,
            None => read_pos_array(tag, "Offset")?.unwrap_or(BlockPos::ZERO),
        };
        for key in WE_OFFSET_KEYS {
            metadata.remove(key);
        }

        // PaletteMax is advisory; the palette itself is authoritative.
        let palette = read_palette(tag.get_as::<&Compound>("Palette")?)
            .map_err(|e| e.within("Palette"))?;
        let blocks = decode_varint_grid(
            tag.get_as::<&[i8]>("BlockData")?,
            palette.len(),
            size.volume(),
        )
        .map_err(|e| e.within("BlockData"))?;

        // Writers disagree on the key, so accept either.
        let key = [self.block_entities_key(), "TileEntities", "BlockEntities"]
            .into_iter()
            .find(|key| tag.contains_key(*key))
            .unwrap_or(self.block_entities_key());
        let block_entities = read_pos_block_entities(tag, key)?;

        let mut region = Region {
            size,
            offset,
            palette,
            blocks,
            biomes: None,
            block_entities,
            entities: Vec::new(),
            metadata,
            data_version: None,
        };

        if self == Sponge::V2 {
            region.data_version = tag.get_opt::<i32>("DataVersion")?;
            region.entities = read_entities(tag, "Entities")?;
            region.biomes = read_flat_biomes(tag, size)?;
        }

        Ok(region)
    }
}

/// v2 biomes cover one horizontal layer; every y level gets a copy.
fn read_flat_biomes(tag: &Compound, size: Dimensions) -> Result<Option<BiomeLayer>> {
    let Some(palette_tag) = tag.get_opt::<&Compound>("BiomePalette")? else {
        return Ok(None);
    };
    let palette = read_palette(palette_tag).map_err(|e| e.within("BiomePalette"))?;
    let area = size.width as usize * size.length as usize;
    let layer = decode_varint_grid(tag.get_as::<&[i8]>("BiomeData")?, palette.len(), area)
        .map_err(|e| e.within("BiomeData"))?;

    let mut data = Vec::with_capacity(size.volume());
    for _ in 0..size.height {
        data.extend_from_slice(&layer);
    }
    Ok(Some(BiomeLayer { palette, data }))
}

fn write_flat_biomes(tag: &mut Compound, biomes: &BiomeLayer, size: Dimensions) -> Result<()> {
    let area = size.width as usize * size.length as usize;
    let layer = &biomes.data[..area.min(biomes.data.len())];
    let bytes = encode_varint_grid(layer, biomes.palette.len()).map_err(|e| e.within("BiomeData"))?;

    tag.insert(
        "BiomePaletteMax".to_owned(),
        Tag::Int(biomes.palette.len() as i32),
    );
    tag.insert("BiomePalette".to_owned(), write_palette(&biomes.palette));
    tag.insert("BiomeData".to_owned(), Tag::ByteArray(to_signed(bytes)));
    Ok(())
}

impl SchematicFormat for Sponge {
    fn version(&self) -> FormatVersion {
        match self {
            Sponge::V1 => FormatVersion::SpongeV1,
            Sponge::V2 => FormatVersion::SpongeV2,
        }
    }

    fn parse(&self, file: &NbtFile) -> Result<Region> {
        let root = file.root_compound()?;
        let schematic = root.get_opt::<&Compound>("Schematic")?.unwrap_or(root);
        self.parse_schematic(schematic)
            .map_err(|e| e.within("Schematic"))
    }

    fn write(&self, region: &Region) -> Result<NbtFile> {
        let mut tag = Compound::new();
        tag.insert("Version".to_owned(), Tag::Int(self.number()));
        write_dimensions(&mut tag, region.size);
        tag.insert("Offset".to_owned(), pos_array(region.offset));

        let mut metadata = region.metadata.clone();
        write_we_offset(&mut metadata, region.offset);
        tag.insert("Metadata".to_owned(), Tag::Compound(metadata));

        tag.insert(
            "PaletteMax".to_owned(),
            Tag::Int(region.palette.len() as i32),
        );
        tag.insert("Palette".to_owned(), write_palette(&region.palette));
        let bytes = encode_varint_grid(&region.blocks, region.palette.len())
            .map_err(|e| e.within("BlockData"))?;
        tag.insert("BlockData".to_owned(), Tag::ByteArray(to_signed(bytes)));
        tag.insert(
            self.block_entities_key().to_owned(),
            write_pos_block_entities(&region.block_entities),
        );

        if *self == Sponge::V2 {
            if let Some(data_version) = region.data_version {
                tag.insert("DataVersion".to_owned(), Tag::Int(data_version));
            }
            if !region.entities.is_empty() {
                tag.insert(
                    "Entities".to_owned(),
                    compound_list(region.entities.iter().cloned()),
                );
            }
            if let Some(biomes) = &region.biomes {
                write_flat_biomes(&mut tag, biomes, region.size)?;
            }
        }

        Ok(NbtFile::new("Schematic", Tag::Compound(tag)))
    }
}
