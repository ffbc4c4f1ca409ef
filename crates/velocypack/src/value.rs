use crate::error::Result;
use crate::slice::Slice;
use crate::value_type::ValueType;

/// A decoded value. Scalars are materialized, containers stay as slices so
/// decoding is never recursive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    None,
    Illegal,
    Null,
    Bool(bool),
    Array(Slice<'a>),
    Object(Slice<'a>),
    Double(f64),
    /// Milliseconds since the Unix epoch.
    UtcDate(i64),
    /// Opaque 8-byte external reference.
    External(u64),
    MinKey,
    MaxKey,
    Int(i64),
    UInt(u64),
    SmallInt(i8),
    String(&'a str),
    Binary(&'a [u8]),
    /// Raw bytes of a BCD value, tag included.
    Bcd(&'a [u8]),
    /// Raw bytes of a custom value, tag included.
    Custom(&'a [u8]),
}

impl<'a> Value<'a> {
    pub fn from_slice(slice: Slice<'a>) -> Result<Self> {
        Ok(match slice.value_type() {
            ValueType::None => Value::None,
            ValueType::Illegal => Value::Illegal,
            ValueType::Null => Value::Null,
            ValueType::Bool => Value::Bool(slice.as_bool()?),
            ValueType::Array => Value::Array(slice),
            ValueType::Object => Value::Object(slice),
            ValueType::Double => Value::Double(slice.as_f64()?),
            ValueType::UtcDate => Value::UtcDate(slice.as_utc_millis()?),
            ValueType::External => {
                let bytes = slice.as_bytes()?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes[1..9]);
                Value::External(u64::from_le_bytes(raw))
            }
            ValueType::MinKey => Value::MinKey,
            ValueType::MaxKey => Value::MaxKey,
            ValueType::Int => Value::Int(slice.read_int_unchecked()?),
            ValueType::UInt => Value::UInt(slice.read_uint_unchecked()?),
            ValueType::SmallInt => Value::SmallInt(slice.as_i8()?),
            ValueType::String => Value::String(slice.as_str()?),
            ValueType::Binary => Value::Binary(slice.as_binary()?),
            ValueType::Bcd => Value::Bcd(slice.as_bytes()?),
            ValueType::Custom => Value::Custom(slice.as_bytes()?),
        })
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::None => ValueType::None,
            Value::Illegal => ValueType::Illegal,
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
            Value::Double(_) => ValueType::Double,
            Value::UtcDate(_) => ValueType::UtcDate,
            Value::External(_) => ValueType::External,
            Value::MinKey => ValueType::MinKey,
            Value::MaxKey => ValueType::MaxKey,
            Value::Int(_) => ValueType::Int,
            Value::UInt(_) => ValueType::UInt,
            Value::SmallInt(_) => ValueType::SmallInt,
            Value::String(_) => ValueType::String,
            Value::Binary(_) => ValueType::Binary,
            Value::Bcd(_) => ValueType::Bcd,
            Value::Custom(_) => ValueType::Custom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(data: &[u8]) -> Value<'_> {
        Slice::with_translator(data, None).value().unwrap()
    }

    #[test]
    fn scalars() {
        assert_eq!(decode(&[0x18]), Value::Null);
        assert_eq!(decode(&[0x1a]), Value::Bool(true));
        assert_eq!(decode(&[0x3c]), Value::SmallInt(-4));
        assert_eq!(decode(&[0x28, 0xff]), Value::UInt(255));
        assert_eq!(decode(&[0x20, 0xff]), Value::Int(-1));
        assert_eq!(decode(&[0x42, b'h', b'i']), Value::String("hi"));
        assert_eq!(decode(&[0xc0, 0x01, 0x07]), Value::Binary(&[0x07]));
        assert_eq!(decode(&[0x1e]), Value::MinKey);
        assert_eq!(decode(&[0x17]), Value::Illegal);
        assert_eq!(decode(&[0xf0, 0x09]), Value::Custom(&[0xf0, 0x09]));
    }

    #[test]
    fn external_reads_eight_bytes() {
        let mut data = vec![0x1d];
        data.extend_from_slice(&42u64.to_le_bytes());
        assert_eq!(decode(&data), Value::External(42));
        assert_eq!(decode(&data).value_type(), ValueType::External);
    }

    #[test]
    fn containers_stay_lazy() {
        let data = [0x01];
        match decode(&data) {
            Value::Array(slice) => assert_eq!(slice.length(), Ok(0)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
