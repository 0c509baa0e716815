use crate::block_state::BlockState;
use crate::fields::*;
use crate::format::{FormatVersion, SchematicFormat};
use crate::region::{BlockPalette, Region};
use schem_common::{BlockPos, Dimensions, Result, SchemError};
use schem_nbt::{Compound, CompoundExt, NbtFile, Tag};
use schem_palette::{bits_per_entry, LongLayout, Packed, Scheme};
use std::ops::RangeInclusive;

pub(crate) const SUPPORTED_VERSIONS: RangeInclusive<i32> = 4..=7;
const WRITE_VERSION: i32 = 6;
const WRITE_SUB_VERSION: i32 = 1;
const MIN_BITS: u8 = 2;
const DEFAULT_REGION_NAME: &str = "Unnamed";

// Recomputed on every write, so never part of the model.
const COMPUTED_METADATA: [&str; 4] = ["RegionCount", "TotalVolume", "TotalBlocks", "EnclosingSize"];

/// Litematica's `.litematic`: named regions of spanning bit-packed block states.
/// Only single-region files are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Litematic;

fn read_vec3(tag: &Compound, key: &str) -> Result<[i32; 3]> {
    let vec = tag.get_as::<&Compound>(key)?;
    let read = || -> Result<[i32; 3]> {
        Ok([
            vec.get_as::<i32>("x")?,
            vec.get_as::<i32>("y")?,
            vec.get_as::<i32>("z")?,
        ])
    };
    read().map_err(|e| e.within(key))
}

fn vec3(x: i32, y: i32, z: i32) -> Tag {
    Tag::compound([("x", Tag::Int(x)), ("y", Tag::Int(y)), ("z", Tag::Int(z))])
}

fn read_block_state(entry: &Compound) -> Result<String> {
    let mut state = BlockState::new(entry.get_as::<&str>("Name")?);
    if let Some(properties) = entry.get_opt::<&Compound>("Properties")? {
        for (key, value) in properties {
            let value = value.cast::<&str>().map_err(|e| e.within(key).within("Properties"))?;
            state.properties.push((key.clone(), value.to_owned()));
        }
    }
    Ok(state.to_string())
}

fn write_block_state(name: &str) -> Result<Tag> {
    let state = BlockState::parse(name)?;
    let mut entry = Compound::new();
    entry.insert("Name".to_owned(), Tag::string(state.name.as_str()));
    if state.has_properties() {
        entry.insert(
            "Properties".to_owned(),
            Tag::compound(state.properties.into_iter().map(|(k, v)| (k, Tag::String(v)))),
        );
    }
    Ok(Tag::Compound(entry))
}

/// A negative size extends from `position` towards negative coordinates.
fn normalize_axis(axis: &str, position: i32, size: i32) -> Result<(i32, u16)> {
    let extent = u16::try_from(size.unsigned_abs())
        .ok()
        .filter(|&extent| extent > 0)
        .ok_or_else(|| {
            SchemError::invalid(
                format!("Size.{}", axis),
                format!("extent {} is zero or too large", size),
            )
        })?;
    if size > 0 {
        return Ok((position, extent));
    }
    let min = position.checked_add(size + 1).ok_or_else(|| {
        SchemError::invalid(
            format!("Position.{}", axis),
            format!("far corner {} with size {} lies outside 32-bit space", position, size),
        )
    })?;
    Ok((min, extent))
}

fn parse_region(tag: &Compound) -> Result<Region> {
    let [px, py, pz] = read_vec3(tag, "Position")?;
    let [sx, sy, sz] = read_vec3(tag, "Size")?;
    let (x, width) = normalize_axis("x", px, sx)?;
    let (y, height) = normalize_axis("y", py, sy)?;
    let (z, length) = normalize_axis("z", pz, sz)?;
    let size = Dimensions::new(width, height, length);

    let entries = read_compound_list(tag, "BlockStatePalette")?
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            read_block_state(entry).map_err(|e| e.within(&format!("BlockStatePalette[{}]", i)))
        })
        .collect::<Result<Vec<_>>>()?;
    let palette = BlockPalette::from_entries(entries)?;

    let packed = Packed::Longs {
        bits: bits_per_entry(palette.len(), MIN_BITS),
        layout: LongLayout::Spanning,
        data: tag.get_as::<&[i64]>("BlockStates")?.to_vec(),
    };
    let blocks = schem_palette::decode(&packed, palette.len(), size.volume())
        .map_err(|e| e.within("BlockStates"))?;

    Ok(Region {
        size,
        offset: BlockPos::new(x, y, z),
        palette,
        blocks,
        biomes: None,
        block_entities: read_xyz_block_entities(tag, "TileEntities")?,
        entities: read_entities(tag, "Entities")?,
        metadata: Compound::new(),
        data_version: None,
    })
}

fn write_region(region: &Region) -> Result<Compound> {
    let palette = region
        .palette
        .iter()
        .map(|(i, name)| write_block_state(name).map_err(|e| e.within(&format!("BlockStatePalette[{}]", i))))
        .collect::<Result<Vec<_>>>()?;

    let scheme = Scheme::Longs {
        min_bits: MIN_BITS,
        layout: LongLayout::Spanning,
    };
    let states = match schem_palette::encode(&region.blocks, region.palette.len(), scheme)
        .map_err(|e| e.within("BlockStates"))?
    {
        Packed::Longs { data, .. } => data,
        other => {
            return Err(SchemError::invalid(
                "BlockStates",
                format!("long scheme produced {:?}", other),
            ))
        }
    };

    let size = region.size;
    let mut tag = Compound::new();
    tag.insert(
        "Position".to_owned(),
        vec3(region.offset.x, region.offset.y, region.offset.z),
    );
    tag.insert(
        "Size".to_owned(),
        vec3(size.width as i32, size.height as i32, size.length as i32),
    );
    tag.insert("BlockStatePalette".to_owned(), Tag::List(palette));
    tag.insert("BlockStates".to_owned(), Tag::LongArray(states));
    tag.insert(
        "TileEntities".to_owned(),
        write_xyz_block_entities(&region.block_entities),
    );
    tag.insert(
        "Entities".to_owned(),
        compound_list(region.entities.iter().cloned()),
    );
    tag.insert("PendingBlockTicks".to_owned(), Tag::List(Vec::new()));
    tag.insert("PendingFluidTicks".to_owned(), Tag::List(Vec::new()));
    Ok(tag)
}

impl SchematicFormat for Litematic {
    fn version(&self) -> FormatVersion {
        FormatVersion::Litematic
    }

    fn parse(&self, file: &NbtFile) -> Result<Region> {
        let root = file.root_compound()?;

        let version = root.get_as::<i32>("Version")?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(SchemError::unsupported(format!(
                "Litematica version {}",
                version
            )));
        }

        let regions = root.get_as::<&Compound>("Regions")?;
        let (name, region_tag) = match regions.len() {
            1 => regions.iter().next().ok_or_else(|| SchemError::missing("Regions"))?,
            0 => return Err(SchemError::invalid("Regions", "no regions")),
            n => {
                return Err(SchemError::unsupported(format!(
                    "Litematica file with {} regions",
                    n
                )))
            }
        };
        let region_tag = region_tag
            .cast::<&Compound>()
            .map_err(|e| e.within(&format!("Regions.{}", name)))?;

        let mut region =
            parse_region(region_tag).map_err(|e| e.within(&format!("Regions.{}", name)))?;

        let mut metadata = root
            .get_opt::<&Compound>("Metadata")?
            .cloned()
            .unwrap_or_default();
        for key in COMPUTED_METADATA {
            metadata.remove(key);
        }
        region.metadata = metadata;
        region.data_version = root.get_opt::<i32>("MinecraftDataVersion")?;

        Ok(region)
    }

    fn write(&self, region: &Region) -> Result<NbtFile> {
        let name = region
            .metadata
            .get_opt::<&str>("Name")
            .map_err(|e| e.within("Metadata"))?
            .unwrap_or(DEFAULT_REGION_NAME)
            .to_owned();

        let size = region.size;
        let volume = i32::try_from(region.volume()).unwrap_or(i32::MAX);
        let total_blocks = i32::try_from(region.non_air_count()).unwrap_or(i32::MAX);

        let mut metadata = region.metadata.clone();
        metadata.insert("RegionCount".to_owned(), Tag::Int(1));
        metadata.insert("TotalVolume".to_owned(), Tag::Int(volume));
        metadata.insert("TotalBlocks".to_owned(), Tag::Int(total_blocks));
        metadata.insert(
            "EnclosingSize".to_owned(),
            vec3(size.width as i32, size.height as i32, size.length as i32),
        );

        let region_tag = write_region(region).map_err(|e| e.within(&format!("Regions.{}", name)))?;

        let mut root = Compound::new();
        root.insert("Version".to_owned(), Tag::Int(WRITE_VERSION));
        root.insert("SubVersion".to_owned(), Tag::Int(WRITE_SUB_VERSION));
        if let Some(data_version) = region.data_version {
            root.insert("MinecraftDataVersion".to_owned(), Tag::Int(data_version));
        }
        root.insert("Metadata".to_owned(), Tag::Compound(metadata));
        root.insert(
            "Regions".to_owned(),
            Tag::Compound(Compound::from([(name, Tag::Compound(region_tag))])),
        );

        Ok(NbtFile::new("", Tag::Compound(root)))
    }
}
