use crate::fields::*;
use crate::format::{FormatVersion, SchematicFormat};
use crate::region::{BiomeLayer, BlockEntity, BlockPalette, Region};
use crate::sponge::read_we_offset;
use schem_common::{BlockPos, Dimensions, Result, SchemError};
use schem_nbt::{Compound, CompoundExt, NbtFile, Tag};

/// Sponge v3: a `Schematic` child holding `Blocks` and `Biomes` containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpongeV3;

fn read_block_entities(blocks: &Compound) -> Result<Vec<BlockEntity>> {
    let mut block_entities = Vec::new();
    for (i, entry) in read_compound_list(blocks, "BlockEntities")?.into_iter().enumerate() {
        let read = || -> Result<Option<BlockEntity>> {
            let Some(pos) = read_pos_array(entry, "Pos")? else {
                return Ok(None);
            };
            let mut data = entry
                .get_opt::<&Compound>("Data")?
                .cloned()
                .unwrap_or_default();
            if let Some(id) = entry.get("Id") {
                data.insert("Id".to_owned(), id.clone());
            }
            Ok(Some(BlockEntity { pos, data }))
        };
        if let Some(be) = read().map_err(|e| e.within(&format!("BlockEntities[{}]", i)))? {
            block_entities.push(be);
        }
    }
    Ok(block_entities)
}

fn write_block_entities(block_entities: &[BlockEntity]) -> Tag {
    compound_list(block_entities.iter().map(|be| {
        let mut data = be.data.clone();
        let mut entry = Compound::new();
        entry.insert("Pos".to_owned(), pos_array(be.pos));
        if let Some(id) = data.remove("Id") {
            entry.insert("Id".to_owned(), id);
        }
        if !data.is_empty() {
            entry.insert("Data".to_owned(), Tag::Compound(data));
        }
        entry
    }))
}

fn read_container(tag: &Compound, size: Dimensions) -> Result<(BlockPalette, Vec<u32>)> {
    let palette = read_palette(tag.get_as::<&Compound>("Palette")?)
        .map_err(|e| e.within("Palette"))?;
    let data = decode_varint_grid(tag.get_as::<&[i8]>("Data")?, palette.len(), size.volume())
        .map_err(|e| e.within("Data"))?;
    Ok((palette, data))
}

fn write_container(palette: &BlockPalette, data: &[u32]) -> Result<Compound> {
    let bytes = encode_varint_grid(data, palette.len()).map_err(|e| e.within("Data"))?;
    let mut tag = Compound::new();
    tag.insert("Palette".to_owned(), write_palette(palette));
    tag.insert("Data".to_owned(), Tag::ByteArray(to_signed(bytes)));
    Ok(tag)
}

impl SpongeV3 {
    fn parse_schematic(&self, tag: &Compound) -> Result<Region> {
        let version = tag.get_as::<i32>("Version")?;
        if version != 3 {
            return Err(SchemError::unsupported(format!(
                "Sponge version {} cannot be read as v3",
                version
            )));
        }

        let size = read_dimensions(tag)?;
        let metadata = tag
            .get_opt::<&Compound>("Metadata")?
            .cloned()
            .unwrap_or_default();
        let offset = match read_pos_array(tag, "Offset")? {
            Some(offset) => offset,
            None => read_we_offset(&metadata)
                .map_err(|e| e.within("Metadata"))?
                .unwrap_or(BlockPos::ZERO),
        };

        let blocks_tag = tag.get_as::<&Compound>("Blocks")?;
        let (palette, blocks) = read_container(blocks_tag, size).map_err(|e| e.within("Blocks"))?;
        let block_entities = read_block_entities(blocks_tag).map_err(|e| e.within("Blocks"))?;

        let biomes = match tag.get_opt::<&Compound>("Biomes")? {
            None => None,
            Some(biomes_tag) => {
                let (palette, data) =
                    read_container(biomes_tag, size).map_err(|e| e.within("Biomes"))?;
                Some(BiomeLayer { palette, data })
            }
        };

        Ok(Region {
            size,
            offset,
            palette,
            blocks,
            biomes,
            block_entities,
            entities: read_entities(tag, "Entities")?,
            metadata,
            data_version: tag.get_opt::<i32>("DataVersion")?,
        })
    }
}

impl SchematicFormat for SpongeV3 {
    fn version(&self) -> FormatVersion {
        FormatVersion::SpongeV3
    }

    fn parse(&self, file: &NbtFile) -> Result<Region> {
        let root = file.root_compound()?;
        let schematic = root.get_opt::<&Compound>("Schematic")?.unwrap_or(root);
        self.parse_schematic(schematic)
            .map_err(|e| e.within("Schematic"))
    }

    fn write(&self, region: &Region) -> Result<NbtFile> {
        let mut tag = Compound::new();
        tag.insert("Version".to_owned(), Tag::Int(3));
        if let Some(data_version) = region.data_version {
            tag.insert("DataVersion".to_owned(), Tag::Int(data_version));
        }
        write_dimensions(&mut tag, region.size);
        tag.insert("Offset".to_owned(), pos_array(region.offset));
        tag.insert(
            "Metadata".to_owned(),
            Tag::Compound(region.metadata.clone()),
        );

        let mut blocks = write_container(&region.palette, &region.blocks)
            .map_err(|e| e.within("Blocks"))?;
        blocks.insert(
            "BlockEntities".to_owned(),
            write_block_entities(&region.block_entities),
        );
        tag.insert("Blocks".to_owned(), Tag::Compound(blocks));

        if let Some(biomes) = &region.biomes {
            let biomes = write_container(&biomes.palette, &biomes.data)
                .map_err(|e| e.within("Biomes"))?;
            tag.insert("Biomes".to_owned(), Tag::Compound(biomes));
        }
        if !region.entities.is_empty() {
            tag.insert(
                "Entities".to_owned(),
                compound_list(region.entities.iter().cloned()),
            );
        }

        let root = Compound::from([("Schematic".to_owned(), Tag::Compound(tag))]);
        Ok(NbtFile::new("", Tag::Compound(root)))
    }
}
