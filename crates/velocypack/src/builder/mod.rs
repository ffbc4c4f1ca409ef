//! Incremental encoder with deferred container layout.

mod close;
mod options;

pub use options::BuilderOptions;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use velocypack_buffers::Writer;

use crate::constants::*;
use crate::error::{Result, VPackError};
use crate::slice::Slice;
use crate::translator::AttributeTranslator;
use crate::value_type::ValueType;
use crate::vpack::VPack;

/// A value to append to a [`Builder`].
///
/// Most callers go through the `From` conversions, e.g.
/// `builder.add(42u16)` or `builder.add_keyed("name", "x")`.
#[derive(Debug, Clone, Copy)]
pub enum BuildValue<'v> {
    Null,
    Illegal,
    MinKey,
    MaxKey,
    Bool(bool),
    Double(f64),
    /// Signed integer with the byte width of its source type.
    Int { value: i64, width: usize },
    /// Unsigned integer with the byte width of its source type.
    UInt { value: u64, width: usize },
    /// Always encoded with the smallest signed tag.
    CompactInt(i64),
    /// Always encoded with the smallest unsigned tag.
    CompactUInt(u64),
    /// Encoded when it fits 64 bits, `Unsupported` otherwise.
    Int128(i128),
    String(&'v str),
    Char(char),
    Binary(&'v [u8]),
    /// Milliseconds since the Unix epoch.
    UtcDate(i64),
    /// Stored as a signed count of 100ns ticks.
    Duration(TimeDelta),
    /// Opens an indexed array.
    Array,
    /// Opens an indexed object.
    Object,
    CompactArray,
    CompactObject,
    /// Copies an already encoded value verbatim.
    Slice(Slice<'v>),
}

impl BuildValue<'_> {
    pub fn value_type(&self) -> ValueType {
        match self {
            BuildValue::Null => ValueType::Null,
            BuildValue::Illegal => ValueType::Illegal,
            BuildValue::MinKey => ValueType::MinKey,
            BuildValue::MaxKey => ValueType::MaxKey,
            BuildValue::Bool(_) => ValueType::Bool,
            BuildValue::Double(_) => ValueType::Double,
            BuildValue::Int { .. }
            | BuildValue::CompactInt(_)
            | BuildValue::Int128(_)
            | BuildValue::Duration(_) => ValueType::Int,
            BuildValue::UInt { .. } | BuildValue::CompactUInt(_) => ValueType::UInt,
            BuildValue::String(_) | BuildValue::Char(_) => ValueType::String,
            BuildValue::Binary(_) => ValueType::Binary,
            BuildValue::UtcDate(_) => ValueType::UtcDate,
            BuildValue::Array | BuildValue::CompactArray => ValueType::Array,
            BuildValue::Object | BuildValue::CompactObject => ValueType::Object,
            BuildValue::Slice(slice) => slice.value_type(),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty => $variant:ident, $repr:ty;)*) => {
        $(
            impl From<$ty> for BuildValue<'_> {
                fn from(value: $ty) -> Self {
                    BuildValue::$variant {
                        value: value as $repr,
                        width: std::mem::size_of::<$ty>(),
                    }
                }
            }
        )*
    };
}

impl_from_int! {
    i8 => Int, i64;
    i16 => Int, i64;
    i32 => Int, i64;
    i64 => Int, i64;
    isize => Int, i64;
    u8 => UInt, u64;
    u16 => UInt, u64;
    u32 => UInt, u64;
    u64 => UInt, u64;
    usize => UInt, u64;
}

impl From<i128> for BuildValue<'_> {
    fn from(value: i128) -> Self {
        BuildValue::Int128(value)
    }
}

impl From<bool> for BuildValue<'_> {
    fn from(value: bool) -> Self {
        BuildValue::Bool(value)
    }
}

impl From<f64> for BuildValue<'_> {
    fn from(value: f64) -> Self {
        BuildValue::Double(value)
    }
}

impl From<f32> for BuildValue<'_> {
    fn from(value: f32) -> Self {
        BuildValue::Double(value as f64)
    }
}

impl<'v> From<&'v str> for BuildValue<'v> {
    fn from(value: &'v str) -> Self {
        BuildValue::String(value)
    }
}

impl<'v> From<&'v String> for BuildValue<'v> {
    fn from(value: &'v String) -> Self {
        BuildValue::String(value)
    }
}

impl From<char> for BuildValue<'_> {
    fn from(value: char) -> Self {
        BuildValue::Char(value)
    }
}

impl<'v> From<&'v [u8]> for BuildValue<'v> {
    fn from(value: &'v [u8]) -> Self {
        BuildValue::Binary(value)
    }
}

impl<'v> From<&'v Vec<u8>> for BuildValue<'v> {
    fn from(value: &'v Vec<u8>) -> Self {
        BuildValue::Binary(value)
    }
}

impl From<DateTime<Utc>> for BuildValue<'_> {
    fn from(value: DateTime<Utc>) -> Self {
        BuildValue::UtcDate(value.timestamp_millis())
    }
}

impl From<TimeDelta> for BuildValue<'_> {
    fn from(value: TimeDelta) -> Self {
        BuildValue::Duration(value)
    }
}

impl<'v> From<Slice<'v>> for BuildValue<'v> {
    fn from(value: Slice<'v>) -> Self {
        BuildValue::Slice(value)
    }
}

impl<'v> From<&'v VPack> for BuildValue<'v> {
    fn from(value: &'v VPack) -> Self {
        BuildValue::Slice(value.slice())
    }
}

impl<'v, T: Into<BuildValue<'v>>> From<Option<T>> for BuildValue<'v> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => BuildValue::Null,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Array,
    Object,
}

/// An open array or object.
#[derive(Debug)]
struct Frame {
    start: usize,
    kind: FrameKind,
    compact: bool,
    /// Member offsets relative to `start` (key offsets for objects).
    children: Vec<usize>,
}

/// Appends values to a growing buffer, finalizing each container's layout
/// when it is closed.
///
/// ```
/// use velocypack::Builder;
///
/// let mut builder = Builder::new();
/// builder.open_object().unwrap();
/// builder.add_keyed("a", 1u8).unwrap();
/// builder.add_keyed("b", "two").unwrap();
/// builder.close().unwrap();
///
/// let slice = builder.slice();
/// assert_eq!(slice.get("b").unwrap().as_str(), Ok("two"));
/// ```
pub struct Builder {
    writer: Writer,
    stack: Vec<Frame>,
    key_written: bool,
    options: BuilderOptions,
    translator: Option<Arc<AttributeTranslator>>,
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("len", &self.writer.len())
            .field("depth", &self.stack.len())
            .field("key_written", &self.key_written)
            .field("options", &self.options)
            .finish()
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// A builder with default options and the standard attribute translator.
    pub fn new() -> Self {
        Self::without_translator().with_translator(Some(AttributeTranslator::standard()))
    }

    /// A builder that writes every key as a string.
    pub fn without_translator() -> Self {
        Self {
            writer: Writer::new(),
            stack: Vec::new(),
            key_written: false,
            options: BuilderOptions::default(),
            translator: None,
        }
    }

    pub fn with_options(mut self, options: BuilderOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the attribute translator; `None` writes every key as a
    /// string.
    pub fn with_translator(mut self, translator: Option<Arc<AttributeTranslator>>) -> Self {
        self.translator = translator;
        self
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    pub fn translator(&self) -> Option<&AttributeTranslator> {
        self.translator.as_deref()
    }

    /// Discards everything written so far.
    pub fn clear(&mut self) {
        self.writer.truncate(0);
        self.stack.clear();
        self.key_written = false;
    }

    /// `true` when no array or object is open.
    pub fn is_closed(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn is_open_array(&self) -> bool {
        matches!(self.stack.last(), Some(frame) if frame.kind == FrameKind::Array)
    }

    pub fn is_open_object(&self) -> bool {
        matches!(self.stack.last(), Some(frame) if frame.kind == FrameKind::Object)
    }

    pub fn len(&self) -> usize {
        self.writer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writer.is_empty()
    }

    /// The bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        self.writer.as_slice()
    }

    /// A view of the first value written, or the None sentinel when the
    /// builder is empty. The borrow ends before the next mutation.
    pub fn slice(&self) -> Slice<'_> {
        if self.writer.is_empty() {
            return Slice::none();
        }
        Slice::with_translator(self.writer.as_slice(), self.translator.as_deref())
    }

    /// Hands out the finished buffer.
    pub fn finish(self) -> Result<VPack> {
        if !self.stack.is_empty() {
            return Err(VPackError::UnclosedCompound {
                depth: self.stack.len(),
            });
        }
        Ok(VPack::new(self.writer.into_vec(), self.translator))
    }

    // -----------------------------------------------------------------------
    // Appending.
    // -----------------------------------------------------------------------

    /// Appends a value. Inside an object with no pending key, a string
    /// becomes the key for the next value.
    pub fn add<'v>(&mut self, value: impl Into<BuildValue<'v>>) -> Result<()> {
        self.add_entry(None, value.into())
    }

    /// Appends `key` and `value` to the innermost open object.
    pub fn add_keyed<'v>(&mut self, key: &str, value: impl Into<BuildValue<'v>>) -> Result<()> {
        self.add_entry(Some(key), value.into())
    }

    /// Writes a key; the next `add` supplies its value.
    pub fn add_key(&mut self, key: &str) -> Result<()> {
        self.check_key_allowed()?;
        self.report_add();
        self.write_key(key)?;
        self.key_written = true;
        Ok(())
    }

    pub fn add_compact_int(&mut self, value: i64) -> Result<()> {
        self.add(BuildValue::CompactInt(value))
    }

    pub fn add_compact_uint(&mut self, value: u64) -> Result<()> {
        self.add(BuildValue::CompactUInt(value))
    }

    pub fn add_null(&mut self) -> Result<()> {
        self.add(BuildValue::Null)
    }

    pub fn add_binary(&mut self, value: &[u8]) -> Result<()> {
        self.add(BuildValue::Binary(value))
    }

    pub fn add_utc_millis(&mut self, millis: i64) -> Result<()> {
        self.add(BuildValue::UtcDate(millis))
    }

    pub fn add_slice(&mut self, slice: Slice<'_>) -> Result<()> {
        self.add(BuildValue::Slice(slice))
    }

    pub fn open_array(&mut self) -> Result<()> {
        self.add(BuildValue::Array)
    }

    pub fn open_object(&mut self) -> Result<()> {
        self.add(BuildValue::Object)
    }

    pub fn open_compact_array(&mut self) -> Result<()> {
        self.add(BuildValue::CompactArray)
    }

    pub fn open_compact_object(&mut self) -> Result<()> {
        self.add(BuildValue::CompactObject)
    }

    pub(crate) fn add_entry(&mut self, key: Option<&str>, value: BuildValue<'_>) -> Result<()> {
        match key {
            Some(_) => self.check_key_allowed()?,
            None if self.is_open_object() && !self.key_written => {
                return self.add_value_as_key(value);
            }
            None => {}
        }

        let mark = self.writer.len();
        let had_key = self.key_written;
        let reported = !self.stack.is_empty() && !had_key;
        if reported {
            self.report_add();
        }
        self.key_written = false;

        let result = match key {
            Some(key) => self.write_key(key).and_then(|_| self.write_value(value)),
            None => self.write_value(value),
        };
        if result.is_err() {
            self.writer.truncate(mark);
            if reported {
                if let Some(frame) = self.stack.last_mut() {
                    frame.children.pop();
                }
            }
            self.key_written = had_key;
        }
        result
    }

    fn add_value_as_key(&mut self, value: BuildValue<'_>) -> Result<()> {
        match value {
            BuildValue::String(key) => self.add_key(key),
            BuildValue::Char(key) => self.add_key(key.encode_utf8(&mut [0u8; 4])),
            BuildValue::Slice(slice) if slice.is_string() => self.add_key(slice.as_str()?),
            other => Err(VPackError::KeyMustBeString {
                found: other.value_type(),
            }),
        }
    }

    fn check_key_allowed(&self) -> Result<()> {
        if !self.is_open_object() {
            return Err(VPackError::NeedOpenObject);
        }
        if self.key_written {
            return Err(VPackError::KeyAlreadyWritten);
        }
        Ok(())
    }

    fn report_add(&mut self) {
        let pos = self.writer.len();
        if let Some(frame) = self.stack.last_mut() {
            frame.children.push(pos - frame.start);
        }
    }

    fn write_key(&mut self, key: &str) -> Result<()> {
        if let Some(translator) = &self.translator {
            if let Some(code) = translator.translate_name(key) {
                self.writer.buf(code.as_bytes()?);
                return Ok(());
            }
        }
        append_string(&mut self.writer, key);
        Ok(())
    }

    fn write_value(&mut self, value: BuildValue<'_>) -> Result<()> {
        let compact = self.options.build_compact_integers;
        let writer = &mut self.writer;
        match value {
            BuildValue::Null => writer.u8(NULL),
            BuildValue::Illegal => writer.u8(ILLEGAL),
            BuildValue::MinKey => writer.u8(MIN_KEY),
            BuildValue::MaxKey => writer.u8(MAX_KEY),
            BuildValue::Bool(value) => writer.u8(if value { TRUE } else { FALSE }),
            BuildValue::Double(value) => {
                writer.u8(DOUBLE);
                writer.f64_le(value);
            }
            BuildValue::Int { value, width } if !compact => append_int_fixed(writer, value, width),
            BuildValue::Int { value, .. } | BuildValue::CompactInt(value) => {
                append_compact_int(writer, value)
            }
            BuildValue::UInt { value, width } if !compact => {
                append_uint_fixed(writer, value, width)
            }
            BuildValue::UInt { value, .. } | BuildValue::CompactUInt(value) => {
                append_compact_uint(writer, value)
            }
            BuildValue::Int128(value) => {
                if let Ok(value) = i64::try_from(value) {
                    if compact {
                        append_compact_int(writer, value);
                    } else {
                        append_int_fixed(writer, value, 8);
                    }
                } else if let Ok(value) = u64::try_from(value) {
                    if compact {
                        append_compact_uint(writer, value);
                    } else {
                        append_uint_fixed(writer, value, 8);
                    }
                } else {
                    return Err(VPackError::Unsupported("integer wider than 64 bits"));
                }
            }
            BuildValue::String(value) => append_string(writer, value),
            BuildValue::Char(value) => append_string(writer, value.encode_utf8(&mut [0u8; 4])),
            BuildValue::Binary(value) => append_binary(writer, value),
            BuildValue::UtcDate(millis) => {
                writer.u8(UTC_DATE);
                writer.uint_le(millis as u64, 8);
            }
            BuildValue::Duration(value) => append_int_fixed(writer, duration_ticks(value)?, 8),
            BuildValue::Array => self.open(FrameKind::Array, false),
            BuildValue::Object => self.open(FrameKind::Object, false),
            BuildValue::CompactArray => self.open(FrameKind::Array, true),
            BuildValue::CompactObject => self.open(FrameKind::Object, true),
            BuildValue::Slice(slice) if slice.is_none() => {
                return Err(VPackError::Unsupported("none value"));
            }
            BuildValue::Slice(slice) => writer.buf(slice.as_bytes()?),
        }
        Ok(())
    }

    /// Writes a placeholder head plus the zeroed header reserve.
    fn open(&mut self, kind: FrameKind, compact: bool) {
        let start = self.writer.len();
        let head = match (kind, compact) {
            (FrameKind::Array, false) => ARRAY_INDEXED_1,
            (FrameKind::Array, true) => ARRAY_COMPACT,
            (FrameKind::Object, false) => OBJECT_SORTED_1,
            (FrameKind::Object, true) => OBJECT_COMPACT,
        };
        self.writer.u8(head);
        self.writer.zeros(RESERVED_HEADER - 1);
        self.stack.push(Frame {
            start,
            kind,
            compact,
            children: Vec::new(),
        });
    }
}

fn duration_ticks(value: TimeDelta) -> Result<i64> {
    if let Some(nanos) = value.num_nanoseconds() {
        return Ok(nanos / 100);
    }
    value
        .num_microseconds()
        .and_then(|micros| micros.checked_mul(TICKS_PER_MICRO))
        .ok_or(VPackError::NumberOutOfRange { target: "i64 ticks" })
}

pub(crate) fn append_int_fixed(writer: &mut Writer, value: i64, width: usize) {
    writer.u8(INT_1 + width as u8 - 1);
    writer.uint_le(value as u64, width);
}

pub(crate) fn append_uint_fixed(writer: &mut Writer, value: u64, width: usize) {
    writer.u8(UINT_1 + width as u8 - 1);
    writer.uint_le(value, width);
}

/// Smallest signed representation: small int, then 1, 2, 4 or 8 bytes.
pub(crate) fn append_compact_int(writer: &mut Writer, value: i64) {
    if (SMALL_INT_MIN..=SMALL_INT_MAX).contains(&value) {
        let tag = if value >= 0 {
            SMALL_INT_POS + value as u8
        } else {
            (SMALL_INT_NEG as i64 + 6 + value) as u8
        };
        writer.u8(tag);
        return;
    }
    let width = if i8::try_from(value).is_ok() {
        1
    } else if i16::try_from(value).is_ok() {
        2
    } else if i32::try_from(value).is_ok() {
        4
    } else {
        8
    };
    append_int_fixed(writer, value, width);
}

/// Smallest unsigned representation: small int, then 1, 2, 4 or 8 bytes.
pub(crate) fn append_compact_uint(writer: &mut Writer, value: u64) {
    if value <= SMALL_INT_MAX as u64 {
        writer.u8(SMALL_INT_POS + value as u8);
        return;
    }
    let width = if u8::try_from(value).is_ok() {
        1
    } else if u16::try_from(value).is_ok() {
        2
    } else if u32::try_from(value).is_ok() {
        4
    } else {
        8
    };
    append_uint_fixed(writer, value, width);
}

pub(crate) fn append_string(writer: &mut Writer, value: &str) {
    let length = value.len();
    if length <= STRING_SHORT_MAX_LEN {
        writer.u8(STRING_SHORT + length as u8);
    } else {
        writer.u8(STRING_LONG);
        writer.uint_le(length as u64, 8);
    }
    writer.utf8(value);
}

pub(crate) fn append_binary(writer: &mut Writer, value: &[u8]) {
    let length = value.len() as u64;
    if length <= u32::MAX as u64 {
        writer.u8(BINARY_4);
        writer.uint_le(length, 4);
    } else {
        writer.u8(BINARY_8);
        writer.uint_le(length, 8);
    }
    writer.buf(value);
}
