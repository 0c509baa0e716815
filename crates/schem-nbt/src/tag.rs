use schem_common::{Result, SchemError};
use std::collections::BTreeMap;

/// Compound payload. Sorted keys keep encoding deterministic.
pub type Compound = BTreeMap<String, Tag>;

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<Tag>),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_SHORT: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_FLOAT: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_BYTE_ARRAY: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;
pub const TAG_LONG_ARRAY: u8 = 12;

/// Human readable name for a tag id, used in error messages.
pub fn type_name_of(type_id: u8) -> &'static str {
    match type_id {
        TAG_END => "End",
        TAG_BYTE => "Byte",
        TAG_SHORT => "Short",
        TAG_INT => "Int",
        TAG_LONG => "Long",
        TAG_FLOAT => "Float",
        TAG_DOUBLE => "Double",
        TAG_BYTE_ARRAY => "ByteArray",
        TAG_STRING => "String",
        TAG_LIST => "List",
        TAG_COMPOUND => "Compound",
        TAG_INT_ARRAY => "IntArray",
        TAG_LONG_ARRAY => "LongArray",
        _ => "Unknown",
    }
}

impl Tag {
    pub fn get_type_id(&self) -> u8 {
        match self {
            Tag::End => TAG_END,
            Tag::Byte(_) => TAG_BYTE,
            Tag::Short(_) => TAG_SHORT,
            Tag::Int(_) => TAG_INT,
            Tag::Long(_) => TAG_LONG,
            Tag::Float(_) => TAG_FLOAT,
            Tag::Double(_) => TAG_DOUBLE,
            Tag::ByteArray(_) => TAG_BYTE_ARRAY,
            Tag::String(_) => TAG_STRING,
            Tag::List(_) => TAG_LIST,
            Tag::Compound(_) => TAG_COMPOUND,
            Tag::IntArray(_) => TAG_INT_ARRAY,
            Tag::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    pub fn type_name(&self) -> &'static str {
        type_name_of(self.get_type_id())
    }

    /// Views this tag as `T`, failing with `TypeMismatch` when the variant differs.
    pub fn cast<'a, T: FromTag<'a>>(&'a self) -> Result<T> {
        T::from_tag(self).ok_or_else(|| SchemError::TypeMismatch {
            path: String::new(),
            expected: T::TYPE_NAME,
            found: self.type_name(),
        })
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tag]> {
        match self {
            Tag::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn string(value: impl Into<String>) -> Tag {
        Tag::String(value.into())
    }

    pub fn compound<K: Into<String>>(entries: impl IntoIterator<Item = (K, Tag)>) -> Tag {
        Tag::Compound(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Borrowing conversion from a tag to a concrete payload type.
pub trait FromTag<'a>: Sized {
    const TYPE_NAME: &'static str;

    fn from_tag(tag: &'a Tag) -> Option<Self>;
}

macro_rules! from_tag_copy {
    ($ty:ty, $variant:ident) => {
        impl<'a> FromTag<'a> for $ty {
            const TYPE_NAME: &'static str = stringify!($variant);

            fn from_tag(tag: &'a Tag) -> Option<Self> {
                match tag {
                    Tag::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

macro_rules! from_tag_ref {
    ($ty:ty, $variant:ident) => {
        impl<'a> FromTag<'a> for &'a $ty {
            const TYPE_NAME: &'static str = stringify!($variant);

            fn from_tag(tag: &'a Tag) -> Option<Self> {
                match tag {
                    Tag::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

from_tag_copy!(i8, Byte);
from_tag_copy!(i16, Short);
from_tag_copy!(i32, Int);
from_tag_copy!(i64, Long);
from_tag_copy!(f32, Float);
from_tag_copy!(f64, Double);
from_tag_ref!(str, String);
from_tag_ref!([i8], ByteArray);
from_tag_ref!([Tag], List);
from_tag_ref!(Compound, Compound);
from_tag_ref!([i32], IntArray);
from_tag_ref!([i64], LongArray);

impl<'a> FromTag<'a> for &'a Tag {
    const TYPE_NAME: &'static str = "any";

    fn from_tag(tag: &'a Tag) -> Option<Self> {
        Some(tag)
    }
}

/// Typed lookups on compounds. Errors carry the key as their path.
pub trait CompoundExt {
    /// Fails with `MissingKey` when absent and `TypeMismatch` when the variant differs.
    fn get_as<'a, T: FromTag<'a>>(&'a self, key: &str) -> Result<T>;

    /// Like `get_as`, but an absent key yields `default`.
    fn get_or<'a, T: FromTag<'a>>(&'a self, key: &str, default: T) -> Result<T>;

    /// `Ok(None)` when absent, `TypeMismatch` when present with another variant.
    fn get_opt<'a, T: FromTag<'a>>(&'a self, key: &str) -> Result<Option<T>>;
}

impl CompoundExt for Compound {
    fn get_as<'a, T: FromTag<'a>>(&'a self, key: &str) -> Result<T> {
        self.get_opt(key)?.ok_or_else(|| SchemError::missing(key))
    }

    fn get_or<'a, T: FromTag<'a>>(&'a self, key: &str, default: T) -> Result<T> {
        Ok(self.get_opt(key)?.unwrap_or(default))
    }

    fn get_opt<'a, T: FromTag<'a>>(&'a self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(tag) => tag.cast::<T>().map(Some).map_err(|e| e.within(key)),
        }
    }
}
