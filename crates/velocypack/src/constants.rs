// Wire tags. Multi-byte payloads are little-endian.

pub const NONE: u8 = 0x00;
pub const ARRAY_EMPTY: u8 = 0x01;
/// Array without index table, 1-byte offsets; 0x03..0x05 for 2/4/8 bytes.
pub const ARRAY_NO_INDEX_1: u8 = 0x02;
/// Array with index table, 1-byte offsets; 0x07..0x09 for 2/4/8 bytes.
pub const ARRAY_INDEXED_1: u8 = 0x06;
pub const OBJECT_EMPTY: u8 = 0x0a;
/// Object with sorted index table, 1-byte offsets; 0x0c..0x0e for 2/4/8 bytes.
pub const OBJECT_SORTED_1: u8 = 0x0b;
/// Object with unsorted index table, 1-byte offsets; 0x10..0x12 for 2/4/8 bytes.
pub const OBJECT_UNSORTED_1: u8 = 0x0f;
pub const ARRAY_COMPACT: u8 = 0x13;
pub const OBJECT_COMPACT: u8 = 0x14;

pub const ILLEGAL: u8 = 0x17;
pub const NULL: u8 = 0x18;
pub const FALSE: u8 = 0x19;
pub const TRUE: u8 = 0x1a;
pub const DOUBLE: u8 = 0x1b;
pub const UTC_DATE: u8 = 0x1c;
pub const EXTERNAL: u8 = 0x1d;
pub const MIN_KEY: u8 = 0x1e;
pub const MAX_KEY: u8 = 0x1f;

/// Signed int, 1 byte; width `w` uses `INT_1 + w - 1`.
pub const INT_1: u8 = 0x20;
pub const INT_2: u8 = 0x21;
pub const INT_4: u8 = 0x23;
pub const INT_8: u8 = 0x27;
/// Unsigned int, 1 byte; width `w` uses `UINT_1 + w - 1`.
pub const UINT_1: u8 = 0x28;
pub const UINT_2: u8 = 0x29;
pub const UINT_4: u8 = 0x2b;
pub const UINT_8: u8 = 0x2f;

/// Small ints 0..=9 are `SMALL_INT_POS + v`.
pub const SMALL_INT_POS: u8 = 0x30;
/// Small ints -6..=-1 are `SMALL_INT_NEG + 6 + v`.
pub const SMALL_INT_NEG: u8 = 0x3a;
pub const SMALL_INT_MIN: i64 = -6;
pub const SMALL_INT_MAX: i64 = 9;

pub const STRING_SHORT: u8 = 0x40;
pub const STRING_SHORT_MAX_LEN: usize = 126;
pub const STRING_LONG: u8 = 0xbf;

/// Binary with a 1-byte length; 0xc1..=0xc7 for 2..=8 length bytes.
pub const BINARY_1: u8 = 0xc0;
pub const BINARY_4: u8 = 0xc3;
pub const BINARY_8: u8 = 0xc7;

pub const BCD_POS_1: u8 = 0xc8;
pub const BCD_NEG_1: u8 = 0xd0;
pub const CUSTOM_1: u8 = 0xf0;

/// Bytes reserved for a container header when it is opened.
pub const RESERVED_HEADER: usize = 9;

/// 100ns ticks per microsecond, the unit durations are stored in.
pub const TICKS_PER_MICRO: i64 = 10;
