//! Static lookup tables keyed by the first byte of an encoded value.

use std::fmt;

/// Semantic type of an encoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    None,
    Illegal,
    Null,
    Bool,
    Array,
    Object,
    Double,
    UtcDate,
    External,
    MinKey,
    MaxKey,
    Int,
    UInt,
    SmallInt,
    String,
    Binary,
    Bcd,
    Custom,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::None => "none",
            ValueType::Illegal => "illegal",
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Array => "array",
            ValueType::Object => "object",
            ValueType::Double => "double",
            ValueType::UtcDate => "utc-date",
            ValueType::External => "external",
            ValueType::MinKey => "min-key",
            ValueType::MaxKey => "max-key",
            ValueType::Int => "int",
            ValueType::UInt => "uint",
            ValueType::SmallInt => "small-int",
            ValueType::String => "string",
            ValueType::Binary => "binary",
            ValueType::Bcd => "bcd",
            ValueType::Custom => "custom",
        }
    }

    /// Int, UInt or SmallInt.
    pub fn is_integer(self) -> bool {
        matches!(self, ValueType::Int | ValueType::UInt | ValueType::SmallInt)
    }

    /// Any integer type or Double.
    pub fn is_number(self) -> bool {
        self.is_integer() || self == ValueType::Double
    }

    pub fn is_compound(self) -> bool {
        matches!(self, ValueType::Array | ValueType::Object)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps a type code to its semantic type. Unassigned codes are `Illegal`.
pub const fn type_of(code: u8) -> ValueType {
    match code {
        0x00 => ValueType::None,
        0x01..=0x09 | 0x13 => ValueType::Array,
        0x0a..=0x12 | 0x14 => ValueType::Object,
        0x15..=0x17 => ValueType::Illegal,
        0x18 => ValueType::Null,
        0x19 | 0x1a => ValueType::Bool,
        0x1b => ValueType::Double,
        0x1c => ValueType::UtcDate,
        0x1d => ValueType::External,
        0x1e => ValueType::MinKey,
        0x1f => ValueType::MaxKey,
        0x20..=0x27 => ValueType::Int,
        0x28..=0x2f => ValueType::UInt,
        0x30..=0x3f => ValueType::SmallInt,
        0x40..=0xbf => ValueType::String,
        0xc0..=0xc7 => ValueType::Binary,
        0xc8..=0xd7 => ValueType::Bcd,
        0xd8..=0xef => ValueType::Illegal,
        0xf0..=0xff => ValueType::Custom,
    }
}

/// Total byte length for types whose length is implied by the tag, 0 when
/// the length has to be read from the payload.
const fn fixed_length_entry(code: u8) -> u8 {
    match code {
        0x00 | 0x01 | 0x0a | 0x17 | 0x18 | 0x19 | 0x1a | 0x1e | 0x1f => 1,
        0x1b | 0x1c | 0x1d => 9,
        0x20..=0x27 => code - 0x1e,
        0x28..=0x2f => code - 0x26,
        0x30..=0x3f => 1,
        0x40..=0xbe => code - 0x3f,
        0xf0 => 2,
        0xf1 => 3,
        0xf2 => 5,
        0xf3 => 9,
        _ => 0,
    }
}

const fn build_fixed_length_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut code = 0usize;
    while code < 256 {
        table[code] = fixed_length_entry(code as u8);
        code += 1;
    }
    table
}

static FIXED_LENGTH: [u8; 256] = build_fixed_length_table();

/// Byte length of a value when the tag alone determines it.
#[inline]
pub fn fixed_byte_length(code: u8) -> Option<usize> {
    match FIXED_LENGTH[code as usize] {
        0 => None,
        len => Some(len as usize),
    }
}

/// Offset of the first child relative to the container start, for the
/// compound tags 0x00..=0x12.
pub(crate) const FIRST_SUB_OFFSET: [u8; 19] = [
    0, // 0x00 none
    1, // 0x01 empty array
    2, 3, 5, 9, // 0x02..0x05 array, no index
    3, 5, 9, 9, // 0x06..0x09 array, indexed
    1, // 0x0a empty object
    3, 5, 9, 9, // 0x0b..0x0e object, sorted
    3, 5, 9, 9, // 0x0f..0x12 object, unsorted
];

/// Width of the byte length, count and index table entries, for the
/// compound tags 0x00..=0x12.
pub(crate) const OFFSET_WIDTH: [u8; 19] = [
    0, // 0x00 none
    1, // 0x01 empty array
    1, 2, 4, 8, // 0x02..0x05 array, no index
    1, 2, 4, 8, // 0x06..0x09 array, indexed
    1, // 0x0a empty object
    1, 2, 4, 8, // 0x0b..0x0e object, sorted
    1, 2, 4, 8, // 0x0f..0x12 object, unsorted
];

/// Offset width for an indexed compound tag, `None` for any other tag.
#[inline]
pub fn offset_width(code: u8) -> Option<usize> {
    OFFSET_WIDTH
        .get(code as usize)
        .map(|w| *w as usize)
        .filter(|w| *w > 0)
}

/// Minimal first-child offset for an indexed compound tag.
#[inline]
pub fn first_sub_offset(code: u8) -> Option<usize> {
    FIRST_SUB_OFFSET
        .get(code as usize)
        .map(|o| *o as usize)
        .filter(|o| *o > 0)
}

/// Object tags whose index table is sorted by key.
#[inline]
pub fn is_sorted_object(code: u8) -> bool {
    (0x0b..=0x0e).contains(&code)
}
