use crate::tag::*;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use schem_common::{Result, SchemError};
use std::io::{Cursor, Write};

pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Smallest encoded payload for each tag id, used to reject element counts
/// the remaining input cannot possibly hold before allocating for them.
fn min_payload_size(type_id: u8) -> usize {
    match type_id {
        TAG_END => 0,
        TAG_BYTE => 1,
        TAG_SHORT | TAG_STRING => 2,
        TAG_INT | TAG_FLOAT | TAG_BYTE_ARRAY | TAG_INT_ARRAY | TAG_LONG_ARRAY => 4,
        TAG_LONG | TAG_DOUBLE => 8,
        TAG_LIST => 5,
        TAG_COMPOUND => 1,
        _ => 0,
    }
}

/// Reads a binary tag tree from an uncompressed buffer, tracking the byte
/// offset so every failure points at the exact place it happened.
pub struct Decoder<'a> {
    cursor: Cursor<&'a [u8]>,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8], max_depth: usize) -> Self {
        Decoder {
            cursor: Cursor::new(bytes),
            max_depth,
        }
    }

    pub fn offset(&self) -> u64 {
        self.cursor.position()
    }

    fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    fn need(&self, bytes: usize, what: &str) -> Result<()> {
        let remaining = self.remaining();
        if remaining < bytes {
            return Err(SchemError::corrupt(
                self.offset(),
                format!("{} needs {} bytes but only {} remain", what, bytes, remaining),
            ));
        }
        Ok(())
    }

    fn read_u8(&mut self, what: &str) -> Result<u8> {
        self.need(1, what)?;
        Ok(self.cursor.read_u8()?)
    }

    fn read_length(&mut self, what: &str) -> Result<usize> {
        let start = self.offset();
        self.need(4, what)?;
        let length = self.cursor.read_i32::<BigEndian>()?;
        if length < 0 {
            return Err(SchemError::corrupt(
                start,
                format!("negative {} length {}", what, length),
            ));
        }
        Ok(length as usize)
    }

    fn take_bytes(&mut self, count: usize, what: &str) -> Result<&'a [u8]> {
        self.need(count, what)?;
        let start = self.cursor.position() as usize;
        let bytes: &'a [u8] = *self.cursor.get_ref();
        self.cursor.set_position((start + count) as u64);
        Ok(&bytes[start..start + count])
    }

    fn read_string(&mut self) -> Result<String> {
        self.need(2, "string length")?;
        let length = self.cursor.read_u16::<BigEndian>()? as usize;
        let start = self.offset();
        let bytes = self.take_bytes(length, "string")?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| SchemError::corrupt(start, format!("string is not valid UTF-8: {}", e)))
    }

    /// Reads one named tag. A bare End byte yields an empty name and `Tag::End`.
    pub fn read_named(&mut self) -> Result<(String, Tag)> {
        let start = self.offset();
        let type_id = self.read_u8("tag id")?;
        if type_id == TAG_END {
            return Ok((String::new(), Tag::End));
        }
        if type_id > TAG_LONG_ARRAY {
            return Err(SchemError::corrupt(
                start,
                format!("unknown tag id {}", type_id),
            ));
        }
        let name = self.read_string()?;
        let tag = self.read_payload(type_id, 0)?;
        Ok((name, tag))
    }

    fn read_payload(&mut self, type_id: u8, depth: usize) -> Result<Tag> {
        match type_id {
            TAG_END => Ok(Tag::End),
            TAG_BYTE => {
                self.need(1, "Byte")?;
                Ok(Tag::Byte(self.cursor.read_i8()?))
            }
            TAG_SHORT => {
                self.need(2, "Short")?;
                Ok(Tag::Short(self.cursor.read_i16::<BigEndian>()?))
            }
            TAG_INT => {
                self.need(4, "Int")?;
                Ok(Tag::Int(self.cursor.read_i32::<BigEndian>()?))
            }
            TAG_LONG => {
                self.need(8, "Long")?;
                Ok(Tag::Long(self.cursor.read_i64::<BigEndian>()?))
            }
            TAG_FLOAT => {
                self.need(4, "Float")?;
                Ok(Tag::Float(self.cursor.read_f32::<BigEndian>()?))
            }
            TAG_DOUBLE => {
                self.need(8, "Double")?;
                Ok(Tag::Double(self.cursor.read_f64::<BigEndian>()?))
            }
            TAG_BYTE_ARRAY => {
                let length = self.read_length("ByteArray")?;
                let bytes = self.take_bytes(length, "ByteArray")?;
                Ok(Tag::ByteArray(bytes.iter().map(|&b| b as i8).collect()))
            }
            TAG_STRING => Ok(Tag::String(self.read_string()?)),
            TAG_LIST => self.read_list(depth),
            TAG_COMPOUND => self.read_compound(depth),
            TAG_INT_ARRAY => {
                let length = self.read_length("IntArray")?;
                self.need(length.saturating_mul(4), "IntArray")?;
                let mut ints = Vec::with_capacity(length);
                for _ in 0..length {
                    ints.push(self.cursor.read_i32::<BigEndian>()?);
                }
                Ok(Tag::IntArray(ints))
            }
            TAG_LONG_ARRAY => {
                let length = self.read_length("LongArray")?;
                self.need(length.saturating_mul(8), "LongArray")?;
                let mut longs = Vec::with_capacity(length);
                for _ in 0..length {
                    longs.push(self.cursor.read_i64::<BigEndian>()?);
                }
                Ok(Tag::LongArray(longs))
            }
            _ => Err(SchemError::corrupt(
                self.offset(),
                format!("unknown tag id {}", type_id),
            )),
        }
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth >= self.max_depth {
            return Err(SchemError::corrupt(
                self.offset(),
                format!("nesting deeper than {} levels", self.max_depth),
            ));
        }
        Ok(())
    }

    fn read_list(&mut self, depth: usize) -> Result<Tag> {
        self.check_depth(depth)?;
        let id_offset = self.offset();
        let element_id = self.read_u8("list element id")?;
        if element_id > TAG_LONG_ARRAY {
            return Err(SchemError::corrupt(
                id_offset,
                format!("unknown list element id {}", element_id),
            ));
        }
        let count = self.read_length("List")?;
        if count > 0 && element_id == TAG_END {
            return Err(SchemError::corrupt(
                id_offset,
                format!("list of {} elements declares element type End", count),
            ));
        }
        self.need(count.saturating_mul(min_payload_size(element_id)), "List")?;

        let mut list = Vec::with_capacity(count);
        for _ in 0..count {
            list.push(self.read_payload(element_id, depth + 1)?);
        }
        Ok(Tag::List(list))
    }

    fn read_compound(&mut self, depth: usize) -> Result<Tag> {
        self.check_depth(depth)?;
        let mut compound = Compound::new();
        loop {
            let start = self.offset();
            let type_id = self.read_u8("tag id")?;
            if type_id == TAG_END {
                break;
            }
            if type_id > TAG_LONG_ARRAY {
                return Err(SchemError::corrupt(
                    start,
                    format!("unknown tag id {}", type_id),
                ));
            }
            let name = self.read_string()?;
            let tag = self.read_payload(type_id, depth + 1)?;
            if compound.insert(name.clone(), tag).is_some() {
                return Err(SchemError::corrupt(
                    start,
                    format!("duplicate compound key '{}'", name),
                ));
            }
        }
        Ok(Tag::Compound(compound))
    }
}

impl Tag {
    /// Writes this tag with its id and name, the unit a file root is stored as.
    pub fn write<W: Write>(&self, writer: &mut W, name: &str) -> Result<()> {
        writer.write_u8(self.get_type_id())?;

        if !matches!(self, Tag::End) {
            write_string(writer, name)?;
        }

        self.write_payload(writer)
    }

    fn write_payload<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Tag::End => {}
            Tag::Byte(v) => writer.write_i8(*v)?,
            Tag::Short(v) => writer.write_i16::<BigEndian>(*v)?,
            Tag::Int(v) => writer.write_i32::<BigEndian>(*v)?,
            Tag::Long(v) => writer.write_i64::<BigEndian>(*v)?,
            Tag::Float(v) => writer.write_f32::<BigEndian>(*v)?,
            Tag::Double(v) => writer.write_f64::<BigEndian>(*v)?,
            Tag::ByteArray(v) => {
                write_length(writer, v.len())?;
                let bytes: Vec<u8> = v.iter().map(|&b| b as u8).collect();
                writer.write_all(&bytes)?;
            }
            Tag::String(v) => write_string(writer, v)?,
            Tag::List(v) => {
                let element_id = v.first().map_or(TAG_END, Tag::get_type_id);
                if element_id == TAG_END && !v.is_empty() {
                    return Err(SchemError::invalid("", "list elements cannot be End"));
                }
                if let Some(other) = v.iter().find(|t| t.get_type_id() != element_id) {
                    return Err(SchemError::invalid(
                        "",
                        format!(
                            "list mixes {} and {} elements",
                            type_name_of(element_id),
                            other.type_name()
                        ),
                    ));
                }
                writer.write_u8(element_id)?;
                write_length(writer, v.len())?;
                for (index, tag) in v.iter().enumerate() {
                    tag.write_payload(writer)
                        .map_err(|e| e.within(&index.to_string()))?;
                }
            }
            Tag::Compound(v) => {
                for (name, tag) in v {
                    if matches!(tag, Tag::End) {
                        return Err(SchemError::invalid(
                            name.as_str(),
                            "End cannot be stored in a compound",
                        ));
                    }
                    tag.write(writer, name).map_err(|e| e.within(name))?;
                }
                writer.write_u8(TAG_END)?;
            }
            Tag::IntArray(v) => {
                write_length(writer, v.len())?;
                for &i in v {
                    writer.write_i32::<BigEndian>(i)?;
                }
            }
            Tag::LongArray(v) => {
                write_length(writer, v.len())?;
                for &l in v {
                    writer.write_i64::<BigEndian>(l)?;
                }
            }
        }
        Ok(())
    }
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    let length = u16::try_from(value.len()).map_err(|_| {
        SchemError::invalid(
            "",
            format!("string of {} bytes exceeds 65535", value.len()),
        )
    })?;
    writer.write_u16::<BigEndian>(length)?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

fn write_length<W: Write>(writer: &mut W, length: usize) -> Result<()> {
    let length = i32::try_from(length)
        .map_err(|_| SchemError::invalid("", format!("{} elements exceed i32", length)))?;
    writer.write_i32::<BigEndian>(length)?;
    Ok(())
}
