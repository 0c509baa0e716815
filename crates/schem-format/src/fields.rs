//! Tag shapes shared by several layouts.

use crate::region::{BlockEntity, BlockPalette};
use schem_common::{BlockPos, Dimensions, Result, SchemError};
use schem_nbt::{Compound, CompoundExt, Tag};
use schem_palette::{Packed, Scheme};

pub(crate) fn to_unsigned(bytes: &[i8]) -> Vec<u8> {
    bytes.iter().map(|&b| b as u8).collect()
}

pub(crate) fn to_signed(bytes: Vec<u8>) -> Vec<i8> {
    bytes.into_iter().map(|b| b as i8).collect()
}

pub(crate) fn decode_varint_grid(bytes: &[i8], palette_len: usize, count: usize) -> Result<Vec<u32>> {
    schem_palette::decode(&Packed::Varint(to_unsigned(bytes)), palette_len, count)
}

pub(crate) fn encode_varint_grid(grid: &[u32], palette_len: usize) -> Result<Vec<u8>> {
    match schem_palette::encode(grid, palette_len, Scheme::Varint)? {
        Packed::Varint(bytes) => Ok(bytes),
        other => Err(SchemError::invalid(
            "",
            format!("varint scheme produced {:?}", other),
        )),
    }
}

/// `Width`/`Height`/`Length` shorts. Values are read as unsigned so sizes above 32767 survive.
pub(crate) fn read_dimensions(tag: &Compound) -> Result<Dimensions> {
    let size = Dimensions::new(
        tag.get_as::<i16>("Width")? as u16,
        tag.get_as::<i16>("Height")? as u16,
        tag.get_as::<i16>("Length")? as u16,
    );
    if size.is_empty() {
        return Err(SchemError::invalid(
            "Width",
            format!(
                "dimensions {}x{}x{} must all be positive",
                size.width, size.height, size.length
            ),
        ));
    }
    Ok(size)
}

pub(crate) fn write_dimensions(tag: &mut Compound, size: Dimensions) {
    tag.insert("Width".to_owned(), Tag::Short(size.width as i16));
    tag.insert("Height".to_owned(), Tag::Short(size.height as i16));
    tag.insert("Length".to_owned(), Tag::Short(size.length as i16));
}

pub(crate) fn read_pos_array(tag: &Compound, key: &str) -> Result<Option<BlockPos>> {
    match tag.get_opt::<&[i32]>(key)? {
        None => Ok(None),
        Some(&[x, y, z]) => Ok(Some(BlockPos::new(x, y, z))),
        Some(other) => Err(SchemError::invalid(
            key,
            format!("expected 3 coordinates, found {}", other.len()),
        )),
    }
}

pub(crate) fn pos_array(pos: BlockPos) -> Tag {
    Tag::IntArray(pos.to_array().to_vec())
}

/// Palette compound of `name -> index`. Indices must be exactly `0..len`.
pub(crate) fn read_palette(tag: &Compound) -> Result<BlockPalette> {
    let mut slots: Vec<Option<&str>> = vec![None; tag.len()];
    for (name, value) in tag {
        let index = value.cast::<i32>().map_err(|e| e.within(name))?;
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| slots.get_mut(i))
            .ok_or_else(|| {
                SchemError::invalid(
                    name.as_str(),
                    format!("index {} outside 0..{}", index, tag.len()),
                )
            })?;
        if slot.replace(name.as_str()).is_some() {
            return Err(SchemError::invalid(
                name.as_str(),
                format!("index {} assigned twice", index),
            ));
        }
    }
    // Every slot is filled: len names landed in len distinct slots.
    BlockPalette::from_entries(slots.into_iter().flatten())
}

pub(crate) fn write_palette(palette: &BlockPalette) -> Tag {
    Tag::Compound(
        palette
            .iter()
            .map(|(index, name)| (name.to_owned(), Tag::Int(index as i32)))
            .collect(),
    )
}

pub(crate) fn read_compound_list<'a>(tag: &'a Compound, key: &str) -> Result<Vec<&'a Compound>> {
    let list = tag.get_or::<&[Tag]>(key, &[])?;
    list.iter()
        .enumerate()
        .map(|(i, entry)| {
            entry
                .cast::<&Compound>()
                .map_err(|e| e.within(&format!("{}[{}]", key, i)))
        })
        .collect()
}

pub(crate) fn compound_list(entries: impl IntoIterator<Item = Compound>) -> Tag {
    Tag::List(entries.into_iter().map(Tag::Compound).collect())
}

/// Block entities keyed by a `Pos` int array. Entries without `Pos` are skipped.
pub(crate) fn read_pos_block_entities(tag: &Compound, key: &str) -> Result<Vec<BlockEntity>> {
    let mut block_entities = Vec::new();
    for (i, entry) in read_compound_list(tag, key)?.into_iter().enumerate() {
        let pos = read_pos_array(entry, "Pos").map_err(|e| e.within(&format!("{}[{}]", key, i)))?;
        if let Some(pos) = pos {
            let mut data = entry.clone();
            data.remove("Pos");
            block_entities.push(BlockEntity { pos, data });
        }
    }
    Ok(block_entities)
}

pub(crate) fn write_pos_block_entities(block_entities: &[BlockEntity]) -> Tag {
    compound_list(block_entities.iter().map(|be| {
        let mut entry = be.data.clone();
        entry.insert("Pos".to_owned(), pos_array(be.pos));
        entry
    }))
}

/// Block entities keyed by separate `x`/`y`/`z` ints, as the classic layouts store them.
pub(crate) fn read_xyz_block_entities(tag: &Compound, key: &str) -> Result<Vec<BlockEntity>> {
    let mut block_entities = Vec::new();
    for (i, entry) in read_compound_list(tag, key)?.into_iter().enumerate() {
        let coords = (
            entry.get_opt::<i32>("x"),
            entry.get_opt::<i32>("y"),
            entry.get_opt::<i32>("z"),
        );
        let pos = match coords {
            (Ok(Some(x)), Ok(Some(y)), Ok(Some(z))) => BlockPos::new(x, y, z),
            (Ok(_), Ok(_), Ok(_)) => continue,
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                return Err(e.within(&format!("{}[{}]", key, i)))
            }
        };
        let mut data = entry.clone();
        for axis in ["x", "y", "z"] {
            data.remove(axis);
        }
        block_entities.push(BlockEntity { pos, data });
    }
    Ok(block_entities)
}

pub(crate) fn write_xyz_block_entities(block_entities: &[BlockEntity]) -> Tag {
    compound_list(block_entities.iter().map(|be| {
        let mut entry = be.data.clone();
        entry.insert("x".to_owned(), Tag::Int(be.pos.x));
        entry.insert("y".to_owned(), Tag::Int(be.pos.y));
        entry.insert("z".to_owned(), Tag::Int(be.pos.z));
        entry
    }))
}

pub(crate) fn read_entities(tag: &Compound, key: &str) -> Result<Vec<Compound>> {
    Ok(read_compound_list(tag, key)?
        .into_iter()
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn compound(tag: Tag) -> Compound {
        match tag {
            Tag::Compound(map) => map,
            other => panic!("not a compound: {:?}", other),
        }
    }

    #[test]
    fn test_read_palette_requires_dense_indices() {
        let ok = compound(Tag::compound([
            ("minecraft:stone", Tag::Int(1)),
            ("minecraft:air", Tag::Int(0)),
        ]));
        let palette = read_palette(&ok).unwrap();
        assert_eq!(palette.entries(), &["minecraft:air", "minecraft:stone"]);

        let gap = compound(Tag::compound([("a", Tag::Int(0)), ("b", Tag::Int(2))]));
        assert_matches!(
            read_palette(&gap),
            Err(SchemError::InvalidValue { ref path, .. }) if path == "b"
        );

        let twice = compound(Tag::compound([("a", Tag::Int(0)), ("b", Tag::Int(0))]));
        assert_matches!(read_palette(&twice), Err(SchemError::InvalidValue { .. }));

        let wrong_type = compound(Tag::compound([("a", Tag::Short(0))]));
        assert_matches!(read_palette(&wrong_type), Err(SchemError::TypeMismatch { .. }));
    }

    #[test]
    fn test_dimensions_are_unsigned() {
        let tag = compound(Tag::compound([
            ("Width", Tag::Short(-1)),
            ("Height", Tag::Short(1)),
            ("Length", Tag::Short(2)),
        ]));
        assert_eq!(read_dimensions(&tag).unwrap(), Dimensions::new(65535, 1, 2));

        let zero = compound(Tag::compound([
            ("Width", Tag::Short(0)),
            ("Height", Tag::Short(1)),
            ("Length", Tag::Short(1)),
        ]));
        assert_matches!(read_dimensions(&zero), Err(SchemError::InvalidValue { .. }));
    }

    #[test]
    fn test_pos_block_entities_skip_entries_without_pos() {
        let tag = compound(Tag::compound([(
            "BlockEntities",
            Tag::List(vec![
                Tag::compound([("Pos", Tag::IntArray(vec![1, 2, 3])), ("Id", Tag::string("chest"))]),
                Tag::compound([("Id", Tag::string("orphan"))]),
            ]),
        )]));
        let entities = read_pos_block_entities(&tag, "BlockEntities").unwrap();

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].pos, BlockPos::new(1, 2, 3));
        assert_eq!(entities[0].data.get_as::<&str>("Id"), Ok("chest"));
        assert!(!entities[0].data.contains_key("Pos"));
    }

    #[test]
    fn test_bad_pos_length() {
        let tag = compound(Tag::compound([(
            "BlockEntities",
            Tag::List(vec![Tag::compound([("Pos", Tag::IntArray(vec![1, 2]))])]),
        )]));
        assert_matches!(
            read_pos_block_entities(&tag, "BlockEntities"),
            Err(SchemError::InvalidValue { ref path, .. }) if path == "BlockEntities[0].Pos"
        );
    }

    #[test]
    fn test_xyz_block_entities() {
        let written = write_xyz_block_entities(&[BlockEntity {
            pos: BlockPos::new(4, 5, 6),
            data: compound(Tag::compound([("id", Tag::string("minecraft:sign"))])),
        }]);
        let tag = compound(Tag::compound([("TileEntities", written)]));
        let read = read_xyz_block_entities(&tag, "TileEntities").unwrap();

        assert_eq!(read[0].pos, BlockPos::new(4, 5, 6));
        assert_eq!(read[0].data.len(), 1);
    }
}
