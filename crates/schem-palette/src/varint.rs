use schem_common::{Result, SchemError};

/// Appends a VarInt: 7 bits per byte, least significant group first, with the
/// high bit set on every byte except the last.
pub fn write_varint(buffer: &mut Vec<u8>, mut value: u32) {
    while (value & !0x7F) != 0 {
        buffer.push(((value & 0x7F) as u8) | 0x80);
        value >>= 7;
    }
    buffer.push((value & 0x7F) as u8);
}

/// Reads one VarInt starting at `*cursor` and advances the cursor past it.
/// Values above `i32::MAX` are rejected since the formats store signed ints.
pub fn read_varint(bytes: &[u8], cursor: &mut usize) -> Result<u32> {
    let start = *cursor;
    let mut result: u32 = 0;
    let mut shift = 0;

    loop {
        let byte = *bytes.get(*cursor).ok_or_else(|| {
            SchemError::corrupt(*cursor as u64, "EOF while reading VarInt")
        })?;
        *cursor += 1;

        if shift == 28 && (byte & 0x78) != 0 {
            return Err(SchemError::corrupt(start as u64, "VarInt too big"));
        }
        result |= u32::from(byte & 0x7F) << shift;

        if (byte & 0x80) == 0 {
            break;
        }

        shift += 7;
        if shift >= 35 {
            return Err(SchemError::corrupt(start as u64, "VarInt longer than 5 bytes"));
        }
    }

    Ok(result)
}

pub fn encode_varints(values: &[u32]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(values.len());
    for &value in values {
        write_varint(&mut buffer, value);
    }
    buffer
}

/// Decodes exactly `count` VarInts; leftover bytes are corruption.
pub fn decode_varints(bytes: &[u8], count: usize) -> Result<Vec<u32>> {
    let mut cursor = 0;
    let mut values = Vec::with_capacity(count.min(bytes.len()));
    for _ in 0..count {
        values.push(read_varint(bytes, &mut cursor)?);
    }
    if cursor != bytes.len() {
        return Err(SchemError::corrupt(
            cursor as u64,
            format!("{} trailing bytes after {} VarInts", bytes.len() - cursor, count),
        ));
    }
    Ok(values)
}
