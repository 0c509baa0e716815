//! Dense index grids to and from their packed storage forms.
//!
//! Nothing here knows about tags or files; callers hand in flat palette
//! indices and get back the array payloads a format stores.

pub mod bits;
pub mod legacy;
pub mod varint;

pub use bits::{bits_per_entry, LongLayout};
pub use legacy::{legacy_value, split_legacy_value, LegacyArrays, LEGACY_VALUE_COUNT};

use schem_common::{Result, SchemError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Longs { min_bits: u8, layout: LongLayout },
    Varint,
    Legacy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packed {
    Longs {
        bits: u8,
        layout: LongLayout,
        data: Vec<i64>,
    },
    Varint(Vec<u8>),
    Legacy(LegacyArrays),
}

const MAX_VARINT_PALETTE: usize = 1 << 31;

/// Packs `grid`, whose entries must all be below `palette_len`.
pub fn encode(grid: &[u32], palette_len: usize, scheme: Scheme) -> Result<Packed> {
    if let Some((index, value)) = grid
        .iter()
        .enumerate()
        .find(|&(_, &value)| value as usize >= palette_len)
    {
        return Err(SchemError::invalid(
            format!("[{}]", index),
            format!("index {} outside palette of {}", value, palette_len),
        ));
    }

    match scheme {
        Scheme::Longs { min_bits, layout } => {
            let bits = bits_per_entry(palette_len, min_bits);
            let data = bits::pack_longs(grid, palette_len, bits, layout)?;
            Ok(Packed::Longs { bits, layout, data })
        }
        Scheme::Varint => {
            if palette_len > MAX_VARINT_PALETTE {
                return Err(SchemError::PaletteOverflow {
                    palette_len,
                    bits: 31,
                });
            }
            Ok(Packed::Varint(varint::encode_varints(grid)))
        }
        Scheme::Legacy => {
            if palette_len > LEGACY_VALUE_COUNT {
                return Err(SchemError::PaletteOverflow {
                    palette_len,
                    bits: 16,
                });
            }
            legacy::pack_legacy(grid).map(Packed::Legacy)
        }
    }
}

/// Unpacks exactly `count` entries and checks each against `palette_len`.
pub fn decode(packed: &Packed, palette_len: usize, count: usize) -> Result<Vec<u32>> {
    let values = match packed {
        Packed::Longs { bits, layout, data } => bits::unpack_longs(data, *bits, count, *layout)?,
        Packed::Varint(bytes) => varint::decode_varints(bytes, count)?,
        Packed::Legacy(arrays) => legacy::unpack_legacy(arrays, count)?,
    };

    if let Some((index, value)) = values
        .iter()
        .enumerate()
        .find(|&(_, &value)| value as usize >= palette_len)
    {
        return Err(SchemError::corrupt(
            index as u64,
            format!(
                "cell {} references index {} outside palette of {}",
                index, value, palette_len
            ),
        ));
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SPANNING: Scheme = Scheme::Longs {
        min_bits: 2,
        layout: LongLayout::Spanning,
    };
    const ALIGNED: Scheme = Scheme::Longs {
        min_bits: 1,
        layout: LongLayout::Aligned,
    };

    // Visits every palette entry at least once, then keeps cycling with a stride.
    fn grid_for(palette_len: usize) -> Vec<u32> {
        let count = palette_len.max(64) + 7;
        (0..count).map(|i| ((i * 7919) % palette_len) as u32).collect()
    }

    #[test]
    fn test_round_trip_palette_sizes() {
        for palette_len in [1usize, 2, 255, 256, 65536] {
            let grid = grid_for(palette_len);
            for scheme in [SPANNING, ALIGNED, Scheme::Varint, Scheme::Legacy] {
                let packed = encode(&grid, palette_len, scheme).unwrap();
                let decoded = decode(&packed, palette_len, grid.len()).unwrap();
                assert_eq!(decoded, grid, "palette {} via {:?}", palette_len, scheme);
            }
        }
    }

    #[test]
    fn test_min_bits_respected() {
        let packed = encode(&[0, 0, 0], 1, SPANNING).unwrap();
        assert_matches!(packed, Packed::Longs { bits: 2, .. });
    }

    #[test]
    fn test_encode_rejects_out_of_palette_index() {
        assert_matches!(
            encode(&[0, 3], 3, Scheme::Varint),
            Err(SchemError::InvalidValue { ref path, .. }) if path == "[1]"
        );
    }

    #[test]
    fn test_decode_rejects_out_of_palette_index() {
        let packed = Packed::Varint(vec![0, 1, 5]);
        assert_matches!(
            decode(&packed, 2, 3),
            Err(SchemError::CorruptData { offset: 2, .. })
        );
    }

    #[test]
    fn test_legacy_overflow() {
        assert_matches!(
            encode(&[0], LEGACY_VALUE_COUNT + 1, Scheme::Legacy),
            Err(SchemError::PaletteOverflow { bits: 16, .. })
        );
    }

    #[test]
    fn test_empty_grid() {
        let packed = encode(&[], 1, SPANNING).unwrap();
        assert_eq!(packed, Packed::Longs { bits: 2, layout: LongLayout::Spanning, data: vec![] });
        assert_eq!(decode(&packed, 1, 0).unwrap(), Vec::<u32>::new());
    }
}
