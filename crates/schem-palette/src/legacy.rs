use schem_common::{Result, SchemError};

/// Number of distinct legacy cell values: a 12-bit block id and a 4-bit data nibble.
pub const LEGACY_VALUE_COUNT: usize = 1 << 16;

/// Classic flat arrays. A cell value is `id << 4 | data`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegacyArrays {
    /// Low 8 bits of each block id.
    pub blocks: Vec<i8>,
    /// Bits 8..12 of each id, two cells per byte: even cells in the low nibble.
    /// Only present when some id exceeds 255.
    pub add_blocks: Option<Vec<i8>>,
    /// Block data, one byte per cell, low nibble significant.
    pub data: Vec<i8>,
}

pub fn legacy_value(id: u16, data: u8) -> u32 {
    u32::from(id) << 4 | u32::from(data & 0x0F)
}

pub fn split_legacy_value(value: u32) -> (u16, u8) {
    ((value >> 4) as u16, (value & 0x0F) as u8)
}

pub fn pack_legacy(values: &[u32]) -> Result<LegacyArrays> {
    let mut blocks = Vec::with_capacity(values.len());
    let mut data = Vec::with_capacity(values.len());
    let mut add = vec![0u8; (values.len() + 1) / 2];
    let mut needs_add = false;

    for (index, &value) in values.iter().enumerate() {
        if value as usize >= LEGACY_VALUE_COUNT {
            return Err(SchemError::PaletteOverflow {
                palette_len: value as usize + 1,
                bits: 16,
            });
        }
        let (id, nibble) = split_legacy_value(value);
        blocks.push((id & 0xFF) as u8 as i8);
        data.push(nibble as i8);

        let high = (id >> 8) as u8;
        if high != 0 {
            needs_add = true;
            add[index / 2] |= if index % 2 == 0 { high } else { high << 4 };
        }
    }

    Ok(LegacyArrays {
        blocks,
        add_blocks: needs_add.then(|| add.into_iter().map(|b| b as i8).collect()),
        data,
    })
}

pub fn unpack_legacy(arrays: &LegacyArrays, count: usize) -> Result<Vec<u32>> {
    check_len("Blocks", arrays.blocks.len(), count)?;
    check_len("Data", arrays.data.len(), count)?;
    if let Some(add) = &arrays.add_blocks {
        // WorldEdit allocates `count / 2 + 1` bytes, one spare for even volumes
        let needed = (count + 1) / 2;
        if add.len() < needed {
            return Err(SchemError::corrupt(
                add.len() as u64,
                format!("AddBlocks holds {} bytes, expected at least {}", add.len(), needed),
            ));
        }
    }

    let values = (0..count)
        .map(|index| {
            let low = u16::from(arrays.blocks[index] as u8);
            let high = arrays.add_blocks.as_ref().map_or(0, |add| {
                let byte = add[index / 2] as u8;
                let nibble = if index % 2 == 0 { byte & 0x0F } else { byte >> 4 };
                u16::from(nibble)
            });
            legacy_value(high << 8 | low, arrays.data[index] as u8)
        })
        .collect();

    Ok(values)
}

fn check_len(name: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(SchemError::corrupt(
            actual.min(expected) as u64,
            format!("{} holds {} bytes, expected {}", name, actual, expected),
        ));
    }
    Ok(())
}
