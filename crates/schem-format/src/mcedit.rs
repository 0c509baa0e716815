use crate::block_state::namespaced;
use crate::fields::*;
use crate::format::{FormatVersion, SchematicFormat};
use crate::region::{BlockPalette, Region};
use crate::sponge::{read_we_offset, write_we_offset};
use once_cell::sync::Lazy;
use schem_common::{BlockPos, Result, SchemError};
use schem_nbt::{Compound, CompoundExt, NbtFile, Tag};
use schem_palette::{legacy_value, split_legacy_value, LegacyArrays, Packed, Scheme, LEGACY_VALUE_COUNT};
use std::collections::{HashMap, HashSet};

mod generated {
    include!(concat!(env!("OUT_DIR"), "/legacy_blocks.rs"));
}

pub(crate) const MATERIALS: &str = "Alpha";
const MAPPING_KEY: &str = "SchematicaMapping";
const LEGACY_PREFIX: &str = "legacy:";
const FIRST_FREE_ID: u16 = 256;
const ID_LIMIT: u16 = 4096;

static ID_BY_NAME: Lazy<HashMap<&'static str, u16>> =
    Lazy::new(|| generated::LEGACY_BLOCKS.iter().map(|&(id, name)| (name, id)).collect());

static NAME_BY_ID: Lazy<HashMap<u16, &'static str>> =
    Lazy::new(|| generated::LEGACY_BLOCKS.iter().map(|&(id, name)| (id, name)).collect());

/// MCEdit/Schematica `.schematic`: numeric ids in flat byte arrays.
///
/// Cells hold `id << 4 | data`. Names are resolved through the file's
/// `SchematicaMapping` when present, then the built-in id table, and
/// finally written as `legacy:<id>`. Non-zero data is appended as `:<data>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McEdit;

/// `legacy:<id>` or `legacy:<id>:<data>`.
fn parse_explicit(name: &str) -> Option<(&str, u16, u8)> {
    let rest = name.strip_prefix(LEGACY_PREFIX)?;
    let (digits, data) = match rest.split_once(':') {
        Some((digits, data)) => (digits, data.parse::<u8>().ok().filter(|&d| d < 16)?),
        None => (rest, 0),
    };
    let id = digits.parse::<u16>().ok().filter(|&id| id < ID_LIMIT)?;
    Some((&name[..LEGACY_PREFIX.len() + digits.len()], id, data))
}

/// Splits a trailing `:<data>` nibble off the name, if there is one.
fn split_data(name: &str) -> (&str, u8) {
    let Some((base, suffix)) = name.rsplit_once(':') else {
        return (name, 0);
    };
    if base.is_empty() || suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return (name, 0);
    }
    match suffix.parse::<u8>() {
        Ok(data) if data < 16 => (base, data),
        _ => (name, 0),
    }
}

/// `(base, data, preferred id)` for one palette name.
fn classify(name: &str) -> (&str, u8, Option<u16>) {
    if let Some((base, id, data)) = parse_explicit(name) {
        return (base, data, Some(id));
    }
    let (base, data) = split_data(name);
    let block = base.split('[').next().unwrap_or(base);
    (base, data, ID_BY_NAME.get(namespaced(block).as_ref()).copied())
}

/// Assigns each palette entry a cell value. Every distinct base name gets its
/// own id, so the written mapping resolves every name back exactly.
fn assign_values(palette: &BlockPalette) -> Result<(Vec<u32>, Compound)> {
    let entries: Vec<(&str, u8, Option<u16>)> = palette.entries().iter().map(|name| classify(name)).collect();

    let mut id_of: HashMap<&str, u16> = HashMap::new();
    let mut claimed: HashSet<u16> = HashSet::new();
    for &(base, _, preferred) in &entries {
        if id_of.contains_key(base) {
            continue;
        }
        if let Some(id) = preferred.filter(|id| !claimed.contains(id)) {
            claimed.insert(id);
            id_of.insert(base, id);
        }
    }

    let mut next = FIRST_FREE_ID;
    for &(base, _, _) in &entries {
        if id_of.contains_key(base) {
            continue;
        }
        while claimed.contains(&next) {
            next += 1;
        }
        if next >= ID_LIMIT {
            return Err(SchemError::PaletteOverflow {
                palette_len: palette.len(),
                bits: 12,
            });
        }
        claimed.insert(next);
        id_of.insert(base, next);
    }

    let values = entries
        .iter()
        .map(|&(base, data, _)| legacy_value(id_of[base], data))
        .collect();
    let mapping = id_of
        .into_iter()
        .map(|(base, id)| (base.to_owned(), Tag::Short(id as i16)))
        .collect();
    Ok((values, mapping))
}

fn read_mapping(root: &Compound) -> Result<HashMap<u16, &str>> {
    let mut names = HashMap::new();
    let Some(mapping) = root.get_opt::<&Compound>(MAPPING_KEY)? else {
        return Ok(names);
    };
    // Sorted iteration: the first name wins when several share an id.
    for (name, id) in mapping {
        let id = id
            .cast::<i16>()
            .map_err(|e| e.within(name).within(MAPPING_KEY))?;
        let id = u16::try_from(id)
            .ok()
            .filter(|&id| id < ID_LIMIT)
            .ok_or_else(|| {
                SchemError::invalid(
                    format!("{}.{}", MAPPING_KEY, name),
                    format!("id {} outside 0..{}", id, ID_LIMIT),
                )
            })?;
        names.entry(id).or_insert(name.as_str());
    }
    Ok(names)
}

fn legacy_name(value: u32, mapping: &HashMap<u16, &str>) -> String {
    let (id, data) = split_legacy_value(value);
    let base = match mapping.get(&id).or_else(|| NAME_BY_ID.get(&id)) {
        Some(name) => (*name).to_owned(),
        None => format!("{}{}", LEGACY_PREFIX, id),
    };
    if data == 0 {
        base
    } else {
        format!("{}:{}", base, data)
    }
}

impl SchematicFormat for McEdit {
    fn version(&self) -> FormatVersion {
        FormatVersion::McEdit
    }

    fn parse(&self, file: &NbtFile) -> Result<Region> {
        let root = file.root_compound()?;

        if let Some(materials) = root.get_opt::<&str>("Materials")? {
            if materials != MATERIALS {
                return Err(SchemError::unsupported(format!(
                    "legacy materials '{}'",
                    materials
                )));
            }
        }

        let size = read_dimensions(root)?;
        let arrays = LegacyArrays {
            blocks: root.get_as::<&[i8]>("Blocks")?.to_vec(),
            add_blocks: root.get_opt::<&[i8]>("AddBlocks")?.map(<[i8]>::to_vec),
            data: root.get_as::<&[i8]>("Data")?.to_vec(),
        };
        let cells = schem_palette::decode(&Packed::Legacy(arrays), LEGACY_VALUE_COUNT, size.volume())?;

        let mapping = read_mapping(root)?;
        let mut values = cells.clone();
        values.sort_unstable();
        values.dedup();

        let mut palette = BlockPalette::new();
        let index_of: HashMap<u32, u32> = values
            .iter()
            .map(|&value| (value, palette.get_or_insert(&legacy_name(value, &mapping))))
            .collect();
        let blocks = cells.iter().map(|value| index_of[value]).collect();

        Ok(Region {
            size,
            offset: read_we_offset(root)?.unwrap_or(BlockPos::ZERO),
            palette,
            blocks,
            biomes: None,
            block_entities: read_xyz_block_entities(root, "TileEntities")?,
            entities: read_entities(root, "Entities")?,
            metadata: Compound::new(),
            data_version: None,
        })
    }

    fn write(&self, region: &Region) -> Result<NbtFile> {
        let (values, mapping) = assign_values(&region.palette)?;
        let cells = region
            .blocks
            .iter()
            .enumerate()
            .map(|(cell, &index)| {
                values.get(index as usize).copied().ok_or_else(|| {
                    SchemError::invalid(
                        format!("blocks[{}]", cell),
                        format!("index {} is outside a palette of {}", index, values.len()),
                    )
                })
            })
            .collect::<Result<Vec<u32>>>()?;
        let arrays = match schem_palette::encode(&cells, LEGACY_VALUE_COUNT, Scheme::Legacy)? {
            Packed::Legacy(arrays) => arrays,
            other => {
                return Err(SchemError::invalid(
                    "Blocks",
                    format!("legacy scheme produced {:?}", other),
                ))
            }
        };

        let mut root = Compound::new();
        write_dimensions(&mut root, region.size);
        root.insert("Materials".to_owned(), Tag::string(MATERIALS));
        root.insert("Blocks".to_owned(), Tag::ByteArray(arrays.blocks));
        root.insert("Data".to_owned(), Tag::ByteArray(arrays.data));
        if let Some(add) = arrays.add_blocks {
            root.insert("AddBlocks".to_owned(), Tag::ByteArray(add));
        }
        root.insert(
            "TileEntities".to_owned(),
            write_xyz_block_entities(&region.block_entities),
        );
        root.insert(
            "Entities".to_owned(),
            compound_list(region.entities.iter().cloned()),
        );
        write_we_offset(&mut root, region.offset);
        root.insert(MAPPING_KEY.to_owned(), Tag::Compound(mapping));

        Ok(NbtFile::new("Schematic", Tag::Compound(root)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::BlockEntity;
    use assert_matches::assert_matches;
    use schem_common::Dimensions;

    fn sample() -> Region {
        let mut region = Region::new(Dimensions::new(3, 1, 2));
        // Ascending legacy value order: 0, 1<<4, 35<<4|14, 256<<4
        region.palette = BlockPalette::from_entries([
            "minecraft:air",
            "minecraft:stone",
            "minecraft:wool:14",
            "mymod:machine[powered=true]",
        ])
        .unwrap();
        region.blocks = vec![0, 1, 2, 3, 3, 2];
        region.offset = BlockPos::new(-4, 0, 7);
        region.block_entities.push(BlockEntity {
            pos: BlockPos::new(1, 0, 0),
            data: Compound::from([("id".to_owned(), Tag::string("Furnace"))]),
        });
        region
    }

    fn without(file: &NbtFile, key: &str) -> NbtFile {
        let mut root = file.root_compound().unwrap().clone();
        root.remove(key);
        NbtFile::new("Schematic", Tag::Compound(root))
    }

    #[test]
    fn test_round_trip_names_exactly() {
        let region = sample();
        let file = McEdit.write(&region).unwrap();
        assert_eq!(McEdit.parse(&file).unwrap(), region);
    }

    #[test]
    fn test_metadata_and_data_version_reset() {
        let mut region = sample();
        region.metadata.insert("Author".to_owned(), Tag::string("x"));
        region.data_version = Some(1343);

        let read = McEdit.parse(&McEdit.write(&region).unwrap()).unwrap();
        assert!(read.metadata.is_empty());
        assert_eq!(read.data_version, None);
        assert!(read.same_blocks(&region));
    }

    #[test]
    fn test_arrays_and_add_blocks() {
        let file = McEdit.write(&sample()).unwrap();
        let root = file.root_compound().unwrap();

        assert_eq!(root.get_as::<&[i8]>("Blocks"), Ok(&[0, 1, 35, 0, 0, 35][..]));
        assert_eq!(root.get_as::<&[i8]>("Data"), Ok(&[0, 0, 14, 0, 0, 14][..]));
        // id 256 in cells 3 and 4: cell 3 is odd (high nibble), cell 4 even (low nibble)
        assert_eq!(root.get_as::<&[i8]>("AddBlocks"), Ok(&[0, 0x10, 0x01][..]));
        assert_eq!(root.get_as::<&str>("Materials"), Ok("Alpha"));
        assert_eq!(root.get_as::<i32>("WEOffsetX"), Ok(-4));
    }

    #[test]
    fn test_spare_add_blocks_byte_accepted() {
        let file = McEdit.write(&sample()).unwrap();
        let mut root = file.root_compound().unwrap().clone();
        // WorldEdit sizes AddBlocks as volume / 2 + 1
        root.insert("AddBlocks".to_owned(), Tag::ByteArray(vec![0, 0x10, 0x01, 0]));

        let read = McEdit.parse(&NbtFile::new("Schematic", Tag::Compound(root))).unwrap();
        assert!(read.same_blocks(&sample()));
    }

    #[test]
    fn test_unmapped_index_rejected() {
        let mut region = sample();
        region.blocks[2] = 40;
        assert_matches!(
            McEdit.write(&region),
            Err(SchemError::InvalidValue { path, .. }) if path == "blocks[2]"
        );
    }

    #[test]
    fn test_without_mapping_uses_builtin_table() {
        let file = without(&McEdit.write(&sample()).unwrap(), MAPPING_KEY);
        let read = McEdit.parse(&file).unwrap();

        assert_eq!(
            read.palette.entries(),
            &["minecraft:air", "minecraft:stone", "minecraft:wool:14", "legacy:256"]
        );
    }

    #[test]
    fn test_canonical_palette_order() {
        let mut region = Region::new(Dimensions::new(2, 1, 1));
        region.palette = BlockPalette::from_entries(["minecraft:stone", "minecraft:air"]).unwrap();
        region.blocks = vec![0, 1];

        let read = McEdit.parse(&McEdit.write(&region).unwrap()).unwrap();
        assert_eq!(read.palette.entries(), &["minecraft:air", "minecraft:stone"]);
        assert_eq!(read.blocks, vec![1, 0]);
        assert!(read.same_blocks(&region));
    }

    #[test]
    fn test_shared_id_gets_fresh_one() {
        let mut region = Region::new(Dimensions::new(2, 1, 1));
        region.palette = BlockPalette::from_entries([
            "minecraft:oak_stairs[facing=east]",
            "minecraft:oak_stairs[facing=west]",
        ])
        .unwrap();
        region.blocks = vec![0, 1];

        let file = McEdit.write(&region).unwrap();
        let mapping = file
            .root_compound()
            .unwrap()
            .get_as::<&Compound>(MAPPING_KEY)
            .unwrap();
        assert_eq!(mapping.get_as::<i16>("minecraft:oak_stairs[facing=east]"), Ok(53));
        assert_eq!(mapping.get_as::<i16>("minecraft:oak_stairs[facing=west]"), Ok(256));
        assert!(McEdit.parse(&file).unwrap().same_blocks(&region));
    }

    #[test]
    fn test_explicit_legacy_names() {
        assert_eq!(classify("legacy:300"), ("legacy:300", 0, Some(300)));
        assert_eq!(classify("legacy:5:3"), ("legacy:5", 3, Some(5)));
        assert_eq!(classify("minecraft:wool:14").1, 14);
        assert_eq!(classify("stone"), ("stone", 0, Some(1)));
        assert_eq!(classify("mymod:thing").2, None);
    }

    #[test]
    fn test_too_many_unknown_ids() {
        let names = (0..4000).map(|i| format!("mymod:block_{}", i));
        let mut region = Region::new(Dimensions::new(1, 1, 1));
        region.palette = BlockPalette::from_entries(names).unwrap();

        assert_matches!(
            McEdit.write(&region),
            Err(SchemError::PaletteOverflow { bits: 12, .. })
        );
    }

    #[test]
    fn test_other_materials_unsupported() {
        let file = McEdit.write(&sample()).unwrap();
        let mut root = file.root_compound().unwrap().clone();
        root.insert("Materials".to_owned(), Tag::string("Classic"));
        assert_matches!(
            McEdit.parse(&NbtFile::new("Schematic", Tag::Compound(root))),
            Err(SchemError::UnsupportedFormat(_))
        );
    }

    #[test]
    fn test_missing_data_array() {
        let file = without(&McEdit.write(&sample()).unwrap(), "Data");
        assert_eq!(
            McEdit.parse(&file),
            Err(SchemError::MissingKey {
                path: "Data".to_owned()
            })
        );
    }
}
