use schem_common::{Result, SchemError};
use serde::{Deserialize, Serialize};

/// How fixed-width entries are laid into 64-bit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LongLayout {
    /// Entries are a continuous bit stream and may straddle two longs.
    Spanning,
    /// Each long holds `64 / bits` whole entries; leftover high bits stay zero.
    Aligned,
}

/// Width needed to address `palette_len` entries, never below `min_bits` or 1.
pub fn bits_per_entry(palette_len: usize, min_bits: u8) -> u8 {
    let needed = if palette_len <= 1 {
        0
    } else {
        (usize::BITS - (palette_len - 1).leading_zeros()) as u8
    };
    needed.max(min_bits).max(1)
}

/// Number of longs `count` entries occupy.
pub fn packed_len(count: usize, bits: u8, layout: LongLayout) -> usize {
    let bits = bits as usize;
    match layout {
        LongLayout::Spanning => (count * bits + 63) / 64,
        LongLayout::Aligned => {
            let per_long = 64 / bits;
            (count + per_long - 1) / per_long
        }
    }
}

fn check_width(palette_len: usize, bits: u8) -> Result<()> {
    if bits == 0 || bits > 32 || palette_len as u64 > 1u64 << bits {
        return Err(SchemError::PaletteOverflow { palette_len, bits });
    }
    Ok(())
}

pub fn pack_longs(values: &[u32], palette_len: usize, bits: u8, layout: LongLayout) -> Result<Vec<i64>> {
    check_width(palette_len, bits)?;

    let width = bits as usize;
    let mask = (1u64 << bits) - 1;
    let mut longs = vec![0u64; packed_len(values.len(), bits, layout)];

    for (index, &value) in values.iter().enumerate() {
        let value = value as u64;
        if value > mask {
            return Err(SchemError::invalid(
                format!("[{}]", index),
                format!("value {} does not fit in {} bits", value, bits),
            ));
        }

        match layout {
            LongLayout::Spanning => {
                let bit_index = index * width;
                let start_long = bit_index / 64;
                let start_offset = bit_index % 64;
                longs[start_long] |= value << start_offset;
                if start_offset + width > 64 {
                    longs[start_long + 1] |= value >> (64 - start_offset);
                }
            }
            LongLayout::Aligned => {
                let per_long = 64 / width;
                let offset = (index % per_long) * width;
                longs[index / per_long] |= value << offset;
            }
        }
    }

    Ok(longs.into_iter().map(|l| l as i64).collect())
}

pub fn unpack_longs(longs: &[i64], bits: u8, count: usize, layout: LongLayout) -> Result<Vec<u32>> {
    if bits == 0 || bits > 32 {
        return Err(SchemError::invalid(
            "bits",
            format!("{} bits per entry is outside 1..=32", bits),
        ));
    }

    let expected = packed_len(count, bits, layout);
    if longs.len() != expected {
        let offset = longs.len().min(expected) as u64 * 8;
        return Err(SchemError::corrupt(
            offset,
            format!(
                "{} entries of {} bits need {} longs, found {}",
                count,
                bits,
                expected,
                longs.len()
            ),
        ));
    }

    let width = bits as usize;
    let mask = (1u64 << bits) - 1;
    let mut values = Vec::with_capacity(count);

    for index in 0..count {
        let value = match layout {
            LongLayout::Spanning => {
                let bit_index = index * width;
                let start_long = bit_index / 64;
                let start_offset = bit_index % 64;
                let low = longs[start_long] as u64 >> start_offset;
                if start_offset + width > 64 {
                    low | (longs[start_long + 1] as u64) << (64 - start_offset)
                } else {
                    low
                }
            }
            LongLayout::Aligned => {
                let per_long = 64 / width;
                let offset = (index % per_long) * width;
                longs[index / per_long] as u64 >> offset
            }
        };
        values.push((value & mask) as u32);
    }

    Ok(values)
}
