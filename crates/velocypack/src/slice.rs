//! Zero-copy read cursor over an encoded value.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, TimeDelta, Utc};
use velocypack_buffers::{varlen_size, BufferError, Reader};

use crate::constants::*;
use crate::error::{Result, VPackError};
use crate::iter::{ArrayIter, ObjectIter};
use crate::translator::AttributeTranslator;
use crate::value::Value;
use crate::value_type::{
    first_sub_offset, fixed_byte_length, is_sorted_object, offset_width, type_of, ValueType,
};

static NONE_SLICE: [u8; 1] = [NONE];

const INTEGER_TYPES: &[ValueType] = &[ValueType::Int, ValueType::UInt, ValueType::SmallInt];
const NUMBER_TYPES: &[ValueType] = &[
    ValueType::Double,
    ValueType::Int,
    ValueType::UInt,
    ValueType::SmallInt,
];
const COMPOUND_TYPES: &[ValueType] = &[ValueType::Array, ValueType::Object];

/// Minimum number of entries in a sorted object before lookups switch from
/// a linear scan to binary search.
const BINARY_SEARCH_THRESHOLD: usize = 4;

/// A view of one encoded value: a borrowed buffer plus the offset of the
/// value's tag byte.
///
/// Slices never own or mutate their bytes, so they are `Copy` and can be
/// shared across threads freely. Every accessor decodes from the header on
/// demand and bounds-checks all reads, so a truncated buffer yields
/// [`VPackError::Buffer`] rather than a panic.
#[derive(Clone, Copy)]
pub struct Slice<'a> {
    data: &'a [u8],
    start: usize,
    translator: Option<&'a AttributeTranslator>,
}

impl<'a> Slice<'a> {
    /// Views the value at the beginning of `data`, translating integer
    /// object keys through the standard attribute translator.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_translator(data, Some(AttributeTranslator::standard_ref()))
    }

    /// Views the value at the beginning of `data` with an explicit
    /// translator; `None` turns integer keys into
    /// [`VPackError::NeedAttributeTranslator`].
    pub fn with_translator(data: &'a [u8], translator: Option<&'a AttributeTranslator>) -> Self {
        Self {
            data,
            start: 0,
            translator,
        }
    }

    /// The None sentinel returned for missing attributes.
    pub fn none() -> Slice<'static> {
        Slice {
            data: &NONE_SLICE,
            start: 0,
            translator: None,
        }
    }

    /// A slice over the same buffer starting at `start`.
    pub fn at(&self, start: usize) -> Slice<'a> {
        Slice {
            data: self.data,
            start,
            translator: self.translator,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.data
    }

    pub fn translator(&self) -> Option<&'a AttributeTranslator> {
        self.translator
    }

    /// The tag byte. Positions past the end of the buffer read as None.
    #[inline]
    pub fn head(&self) -> u8 {
        self.data.get(self.start).copied().unwrap_or(NONE)
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        type_of(self.head())
    }

    pub fn is_type(&self, ty: ValueType) -> bool {
        self.value_type() == ty
    }

    pub fn is_none(&self) -> bool {
        self.is_type(ValueType::None)
    }

    pub fn is_null(&self) -> bool {
        self.is_type(ValueType::Null)
    }

    pub fn is_bool(&self) -> bool {
        self.is_type(ValueType::Bool)
    }

    pub fn is_true(&self) -> bool {
        self.head() == TRUE
    }

    pub fn is_false(&self) -> bool {
        self.head() == FALSE
    }

    pub fn is_array(&self) -> bool {
        self.is_type(ValueType::Array)
    }

    pub fn is_object(&self) -> bool {
        self.is_type(ValueType::Object)
    }

    pub fn is_string(&self) -> bool {
        self.is_type(ValueType::String)
    }

    pub fn is_binary(&self) -> bool {
        self.is_type(ValueType::Binary)
    }

    pub fn is_double(&self) -> bool {
        self.is_type(ValueType::Double)
    }

    pub fn is_integer(&self) -> bool {
        self.value_type().is_integer()
    }

    pub fn is_number(&self) -> bool {
        self.value_type().is_number()
    }

    pub fn is_compact(&self) -> bool {
        matches!(self.head(), ARRAY_COMPACT | OBJECT_COMPACT)
    }

    /// `None` for a Null value, the slice itself otherwise.
    pub fn nullable(self) -> Option<Slice<'a>> {
        if self.is_null() {
            None
        } else {
            Some(self)
        }
    }

    // -----------------------------------------------------------------------
    // Raw reads relative to the buffer.
    // -----------------------------------------------------------------------

    fn read_uint(&self, pos: usize, width: usize) -> Result<u64> {
        Ok(Reader::at(self.data, pos).try_uint_le(width)?)
    }

    fn read_len(&self, pos: usize, width: usize) -> Result<usize> {
        to_usize(self.read_uint(pos, width)?)
    }

    fn read_varlen(&self, pos: usize) -> Result<usize> {
        to_usize(Reader::at(self.data, pos).try_varlen()?)
    }

    /// Reads a LEB128 value whose lowest group sits at `end - 1`.
    fn read_varlen_reversed(&self, end: usize) -> Result<usize> {
        to_usize(Reader::at(self.data, end).try_varlen_reversed()?)
    }

    fn byte_at(&self, pos: usize) -> Result<u8> {
        self.data
            .get(pos)
            .copied()
            .ok_or(VPackError::Buffer(BufferError::EndOfBuffer))
    }

    fn expect_type(&self, expected: &'static [ValueType]) -> Result<ValueType> {
        let found = self.value_type();
        if expected.contains(&found) {
            Ok(found)
        } else {
            Err(VPackError::unexpected(expected, found))
        }
    }

    // -----------------------------------------------------------------------
    // Sizes.
    // -----------------------------------------------------------------------

    /// Total number of bytes the value occupies, tag included.
    pub fn byte_size(&self) -> Result<usize> {
        let head = self.head();
        if let Some(len) = fixed_byte_length(head) {
            return Ok(len);
        }
        let start = self.start;
        let (header, payload) = match head {
            0x02..=0x09 | 0x0b..=0x12 => {
                let width = offset_width(head).unwrap_or(8);
                return self.read_len(start + 1, width);
            }
            ARRAY_COMPACT | OBJECT_COMPACT => return self.read_varlen(start + 1),
            STRING_LONG => (9, self.read_len(start + 1, 8)?),
            0xc0..=0xc7 => {
                let width = (head - 0xbf) as usize;
                (1 + width, self.read_len(start + 1, width)?)
            }
            0xc8..=0xcf => {
                let width = (head - 0xc7) as usize;
                (1 + width, self.read_len(start + 1, width)?)
            }
            0xd0..=0xd7 => {
                let width = (head - 0xcf) as usize;
                (1 + width, self.read_len(start + 1, width)?)
            }
            0xf4..=0xf6 => (2, self.read_len(start + 1, 1)?),
            0xf7..=0xf9 => (3, self.read_len(start + 1, 2)?),
            0xfa..=0xfc => (5, self.read_len(start + 1, 4)?),
            0xfd..=0xff => (9, self.read_len(start + 1, 8)?),
            _ => return Err(VPackError::InvalidTypeCode(head)),
        };
        header.checked_add(payload).ok_or(VPackError::Buffer(BufferError::EndOfBuffer))
    }

    /// The raw encoded bytes of this value.
    pub fn as_bytes(&self) -> Result<&'a [u8]> {
        let size = self.byte_size()?;
        self.start
            .checked_add(size)
            .and_then(|end| self.data.get(self.start..end))
            .ok_or(VPackError::Buffer(BufferError::EndOfBuffer))
    }

    /// Buffer position one past the last byte of this value.
    pub(crate) fn end(&self) -> Result<usize> {
        checked_add(self.start, self.byte_size()?)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(self.as_bytes()?.to_vec())
    }

    /// Offset of the first child of an indexed container.
    ///
    /// Relies on the padding between the header and the first child being
    /// zeroed, which every builder guarantees.
    fn find_data_offset(&self, head: u8) -> Result<usize> {
        let fsm = first_sub_offset(head).unwrap_or(9);
        let start = self.start;
        if fsm <= 2 && self.byte_at(start + 2)? != 0 {
            return Ok(2);
        }
        if fsm <= 3 && self.byte_at(start + 3)? != 0 {
            return Ok(3);
        }
        if fsm <= 5 && self.byte_at(start + 5)? != 0 {
            return Ok(5);
        }
        Ok(9)
    }

    /// Number of members of an Array or Object, or the byte length of a
    /// String.
    pub fn length(&self) -> Result<usize> {
        let head = self.head();
        match self.value_type() {
            ValueType::Array | ValueType::Object => {}
            ValueType::String => return self.string_length(),
            found => {
                return Err(VPackError::unexpected(
                    &[ValueType::Array, ValueType::Object, ValueType::String],
                    found,
                ))
            }
        }
        let start = self.start;
        match head {
            ARRAY_EMPTY | OBJECT_EMPTY => Ok(0),
            ARRAY_COMPACT | OBJECT_COMPACT => {
                let end = self.read_varlen(start + 1)?;
                self.read_varlen_reversed(checked_add(start, end)?)
            }
            0x02..=0x05 => {
                let end = self.byte_size()?;
                let data_offset = self.find_data_offset(head)?;
                let first = self.at(start + data_offset).byte_size()?;
                if first == 0 {
                    return Err(VPackError::InvalidTypeCode(head));
                }
                Ok(end.saturating_sub(data_offset) / first)
            }
            _ => {
                let width = offset_width(head).unwrap_or(8);
                if width < 8 {
                    self.read_len(start + 1 + width, width)
                } else {
                    let end = self.byte_size()?;
                    self.read_len(checked_sub(checked_add(start, end)?, 8)?, 8)
                }
            }
        }
    }

    /// Offset, relative to the container start, of the `index`-th member
    /// (the key for objects).
    fn nth_offset(&self, index: usize) -> Result<usize> {
        self.expect_type(COMPOUND_TYPES)?;
        let length = self.length()?;
        if index >= length {
            return Err(VPackError::IndexOutOfRange { index, length });
        }
        let head = self.head();
        let start = self.start;

        if head == ARRAY_COMPACT || head == OBJECT_COMPACT {
            let end = self.read_varlen(start + 1)?;
            let mut offset = 1 + varlen_size(end as u64);
            let members = if head == OBJECT_COMPACT { 2 } else { 1 };
            for _ in 0..index {
                for _ in 0..members {
                    let member = self.at(checked_add(start, offset)?);
                    offset = checked_sub(member.end()?, start)?;
                }
            }
            return Ok(offset);
        }

        let data_offset = self.find_data_offset(head)?;
        if head <= 0x05 || length == 1 {
            let item_size = self.at(start + data_offset).byte_size()?;
            return Ok(data_offset + index * item_size);
        }

        let width = offset_width(head).unwrap_or(8);
        let end = self.byte_size()?;
        let index_base = checked_add(start, self.index_table_base(end, length, width)?)?;
        self.read_len(checked_add(index_base, index * width)?, width)
    }

    /// Offset of the index table relative to the container start.
    fn index_table_base(&self, end: usize, length: usize, width: usize) -> Result<usize> {
        let table = length
            .checked_mul(width)
            .ok_or(VPackError::Buffer(BufferError::EndOfBuffer))?;
        let tail = if width == 8 { 8 } else { 0 };
        checked_sub(end, checked_add(table, tail)?)
    }

    // -----------------------------------------------------------------------
    // Member access.
    // -----------------------------------------------------------------------

    /// The `index`-th array item, or the `index`-th value of an object.
    pub fn value_at(&self, index: usize) -> Result<Slice<'a>> {
        let item = self.at(checked_add(self.start, self.nth_offset(index)?)?);
        if self.is_object() {
            Ok(self.at(item.end()?))
        } else {
            Ok(item)
        }
    }

    /// The `index`-th key of an object, translated to its string form when
    /// it is stored as an attribute code.
    pub fn key_at(&self, index: usize) -> Result<Slice<'a>> {
        if !self.is_object() {
            return Err(VPackError::unexpected(&[ValueType::Object], self.value_type()));
        }
        let key = self.at(checked_add(self.start, self.nth_offset(index)?)?);
        key.make_key()
    }

    /// Resolves an object key to a string slice, translating integer
    /// attribute codes.
    pub fn make_key(&self) -> Result<Slice<'a>> {
        match self.value_type() {
            ValueType::String => Ok(*self),
            ValueType::SmallInt | ValueType::Int | ValueType::UInt => {
                let translator = self.translator.ok_or(VPackError::NeedAttributeTranslator)?;
                let code = self.as_i64()?;
                translator
                    .translate_key(code)
                    .ok_or(VPackError::UnknownAttributeCode(code))
            }
            found => Err(VPackError::KeyType { found }),
        }
    }

    /// The key at this position as `&str`, translating attribute codes.
    pub(crate) fn key_str(&self) -> Result<&'a str> {
        self.make_key()?.as_str()
    }

    /// Looks up an attribute of an object. Missing attributes yield the
    /// None sentinel, not an error.
    pub fn get(&self, name: &str) -> Result<Slice<'a>> {
        let head = self.head();
        if !self.is_object() {
            return Err(VPackError::unexpected(&[ValueType::Object], self.value_type()));
        }
        if head == OBJECT_EMPTY {
            return Ok(Slice::none());
        }
        if head == OBJECT_COMPACT {
            for (key, value) in self.iter_object()? {
                if key == name {
                    return Ok(value);
                }
            }
            return Ok(Slice::none());
        }

        let length = self.length()?;
        if length == 1 {
            let key = self.at(self.start + self.find_data_offset(head)?);
            return match self.key_matches(key, name)? {
                Some(true) => Ok(self.at(key.end()?)),
                _ => Ok(Slice::none()),
            };
        }

        let width = offset_width(head).unwrap_or(8);
        let end = self.byte_size()?;
        let index_base = checked_add(self.start, self.index_table_base(end, length, width)?)?;
        if is_sorted_object(head) && length >= BINARY_SEARCH_THRESHOLD {
            self.search_binary(name, index_base, length, width)
        } else {
            self.search_linear(name, index_base, length, width)
        }
    }

    /// Follows a path of attribute names through nested objects.
    ///
    /// The receiver must be an object; an intermediate value that is not an
    /// object ends the walk with the None sentinel.
    pub fn get_path(&self, path: &[&str]) -> Result<Slice<'a>> {
        let mut current = *self;
        for (depth, name) in path.iter().enumerate() {
            if depth > 0 && !current.is_object() {
                return Ok(Slice::none());
            }
            current = current.get(name)?;
            if current.is_none() {
                break;
            }
        }
        Ok(current)
    }

    pub fn has_key(&self, name: &str) -> Result<bool> {
        Ok(!self.get(name)?.is_none())
    }

    /// Compares a stored key against `name`. `None` for keys that are
    /// neither strings nor attribute codes.
    fn key_matches(&self, key: Slice<'a>, name: &str) -> Result<Option<bool>> {
        Ok(self.compare_key(key, name)?.map(|ord| ord.is_eq()))
    }

    fn compare_key(&self, key: Slice<'a>, name: &str) -> Result<Option<std::cmp::Ordering>> {
        match key.key_str() {
            Ok(stored) => Ok(Some(stored.cmp(name))),
            Err(VPackError::KeyType { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn entry_key(&self, index_base: usize, index: usize, width: usize) -> Result<Slice<'a>> {
        let offset = self.read_len(checked_add(index_base, index * width)?, width)?;
        Ok(self.at(checked_add(self.start, offset)?))
    }

    fn search_linear(
        &self,
        name: &str,
        index_base: usize,
        length: usize,
        width: usize,
    ) -> Result<Slice<'a>> {
        for index in 0..length {
            let key = self.entry_key(index_base, index, width)?;
            if self.key_matches(key, name)? == Some(true) {
                return Ok(self.at(key.end()?));
            }
        }
        Ok(Slice::none())
    }

    fn search_binary(
        &self,
        name: &str,
        index_base: usize,
        length: usize,
        width: usize,
    ) -> Result<Slice<'a>> {
        use std::cmp::Ordering;

        let mut l = 0usize;
        let mut r = length - 1;
        loop {
            let mid = l + (r - l) / 2;
            let key = self.entry_key(index_base, mid, width)?;
            match self.compare_key(key, name)? {
                Some(Ordering::Equal) => return Ok(self.at(key.end()?)),
                Some(Ordering::Greater) => {
                    if mid == 0 {
                        return Ok(Slice::none());
                    }
                    r = mid - 1;
                }
                Some(Ordering::Less) => l = mid + 1,
                None => return Ok(Slice::none()),
            }
            if r < l {
                return Ok(Slice::none());
            }
        }
    }

    // -----------------------------------------------------------------------
    // Iteration.
    // -----------------------------------------------------------------------

    /// Offset of the first member, for non-empty containers.
    pub(crate) fn first_member_offset(&self) -> Result<usize> {
        let head = self.head();
        match head {
            ARRAY_COMPACT | OBJECT_COMPACT => {
                let end = self.read_varlen(self.start + 1)?;
                Ok(1 + varlen_size(end as u64))
            }
            _ => self.find_data_offset(head),
        }
    }

    pub fn iter_array(&self) -> Result<ArrayIter<'a>> {
        self.expect_type(&[ValueType::Array])?;
        ArrayIter::new(*self, self.length()?)
    }

    pub fn iter_object(&self) -> Result<ObjectIter<'a>> {
        self.expect_type(&[ValueType::Object])?;
        ObjectIter::new(*self, self.length()?)
    }

    // -----------------------------------------------------------------------
    // Scalar decoders.
    // -----------------------------------------------------------------------

    /// Decodes into the [`Value`] union.
    pub fn value(&self) -> Result<Value<'a>> {
        Value::from_slice(*self)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self.head() {
            TRUE => Ok(true),
            FALSE => Ok(false),
            _ => Err(VPackError::unexpected(&[ValueType::Bool], self.value_type())),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self.expect_type(NUMBER_TYPES)? {
            ValueType::Double => Ok(f64::from_bits(self.read_uint(self.start + 1, 8)?)),
            ValueType::UInt => Ok(self.read_uint_unchecked()? as f64),
            _ => Ok(self.read_int_unchecked()? as f64),
        }
    }

    pub fn as_f32(&self) -> Result<f32> {
        Ok(self.as_f64()? as f32)
    }

    /// Signed payload of an Int or SmallInt tag.
    pub(crate) fn read_int_unchecked(&self) -> Result<i64> {
        let head = self.head();
        match head {
            0x30..=0x39 => Ok((head - SMALL_INT_POS) as i64),
            0x3a..=0x3f => Ok((head - SMALL_INT_NEG) as i64 - 6),
            _ => {
                let width = (head - 0x1f) as usize;
                Ok(Reader::at(self.data, self.start + 1).try_int_le(width)?)
            }
        }
    }

    /// Payload of a UInt tag.
    pub(crate) fn read_uint_unchecked(&self) -> Result<u64> {
        let width = (self.head() - 0x27) as usize;
        self.read_uint(self.start + 1, width)
    }

    fn as_int<T>(&self, target: &'static str) -> Result<T>
    where
        T: TryFrom<i64> + TryFrom<u64>,
    {
        let out_of_range = || VPackError::NumberOutOfRange { target };
        match self.expect_type(INTEGER_TYPES)? {
            ValueType::UInt => {
                <T as TryFrom<u64>>::try_from(self.read_uint_unchecked()?).map_err(|_| out_of_range())
            }
            _ => <T as TryFrom<i64>>::try_from(self.read_int_unchecked()?).map_err(|_| out_of_range()),
        }
    }

    pub fn as_i64(&self) -> Result<i64> {
        self.as_int("i64")
    }

    pub fn as_i32(&self) -> Result<i32> {
        self.as_int("i32")
    }

    pub fn as_i16(&self) -> Result<i16> {
        self.as_int("i16")
    }

    pub fn as_i8(&self) -> Result<i8> {
        self.as_int("i8")
    }

    pub fn as_u64(&self) -> Result<u64> {
        self.as_int("u64")
    }

    pub fn as_u32(&self) -> Result<u32> {
        self.as_int("u32")
    }

    pub fn as_u16(&self) -> Result<u16> {
        self.as_int("u16")
    }

    pub fn as_u8(&self) -> Result<u8> {
        self.as_int("u8")
    }

    /// Byte length of a String.
    pub fn string_length(&self) -> Result<usize> {
        let head = self.head();
        match head {
            STRING_LONG => self.read_len(self.start + 1, 8),
            0x40..=0xbe => Ok((head - STRING_SHORT) as usize),
            _ => Err(VPackError::unexpected(&[ValueType::String], self.value_type())),
        }
    }

    pub fn as_str(&self) -> Result<&'a str> {
        let length = self.string_length()?;
        let offset = if self.head() == STRING_LONG { 9 } else { 1 };
        Ok(Reader::at(self.data, self.start + offset).try_utf8(length)?)
    }

    pub fn binary_length(&self) -> Result<usize> {
        let head = self.head();
        if !self.is_binary() {
            return Err(VPackError::unexpected(&[ValueType::Binary], self.value_type()));
        }
        self.read_len(self.start + 1, (head - 0xbf) as usize)
    }

    pub fn as_binary(&self) -> Result<&'a [u8]> {
        let length = self.binary_length()?;
        let width = (self.head() - 0xbf) as usize;
        Ok(Reader::at(self.data, self.start + 1 + width).try_buf(length)?)
    }

    /// Milliseconds since the Unix epoch of a UtcDate.
    pub fn as_utc_millis(&self) -> Result<i64> {
        self.expect_type(&[ValueType::UtcDate])?;
        Ok(Reader::at(self.data, self.start + 1).try_int_le(8)?)
    }

    /// A UtcDate, or a String holding an RFC 3339 timestamp.
    pub fn as_date_time(&self) -> Result<DateTime<Utc>> {
        match self.expect_type(&[ValueType::UtcDate, ValueType::String])? {
            ValueType::UtcDate => DateTime::from_timestamp_millis(self.as_utc_millis()?)
                .ok_or(VPackError::NumberOutOfRange { target: "DateTime" }),
            _ => DateTime::parse_from_rfc3339(self.as_str()?)
                .map(|date| date.with_timezone(&Utc))
                .map_err(|_| VPackError::DateParse),
        }
    }

    /// An integer count of 100ns ticks as a duration.
    pub fn as_duration(&self) -> Result<TimeDelta> {
        let ticks = self.as_i64()?;
        TimeDelta::microseconds(ticks / TICKS_PER_MICRO)
            .checked_add(&TimeDelta::nanoseconds((ticks % TICKS_PER_MICRO) * 100))
            .ok_or(VPackError::NumberOutOfRange { target: "TimeDelta" })
    }
}

fn to_usize(value: u64) -> Result<usize> {
    usize::try_from(value).map_err(|_| VPackError::Buffer(BufferError::EndOfBuffer))
}

fn checked_add(a: usize, b: usize) -> Result<usize> {
    a.checked_add(b).ok_or(VPackError::Buffer(BufferError::EndOfBuffer))
}

fn checked_sub(a: usize, b: usize) -> Result<usize> {
    a.checked_sub(b).ok_or(VPackError::Buffer(BufferError::EndOfBuffer))
}

impl PartialEq for Slice<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
            && match (self.as_bytes(), other.as_bytes()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            }
    }
}

impl Eq for Slice<'_> {}

impl Hash for Slice<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.as_bytes().unwrap_or_default().hash(state);
    }
}

impl fmt::Debug for Slice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slice")
            .field("start", &self.start)
            .field("head", &format_args!("{:#04x}", self.head()))
            .field("type", &self.value_type())
            .finish()
    }
}
