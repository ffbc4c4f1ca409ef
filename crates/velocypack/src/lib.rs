//! VelocyPack: a compact, self-describing binary format for JSON-like data.
//!
//! Values are appended with a [`Builder`], which lays out arrays and objects
//! with index tables (or compact LEB128 trailers) when they close. Finished
//! buffers are read in place through [`Slice`], without decoding the whole
//! document.
//!
//! ```
//! let mut builder = velocypack::Builder::new();
//! builder.open_object()?;
//! builder.add_keyed("name", "vpack")?;
//! builder.close()?;
//! let vpack = builder.finish()?;
//! assert_eq!(vpack.slice().get("name")?.as_str()?, "vpack");
//! # Ok::<(), velocypack::VPackError>(())
//! ```

mod builder;
mod error;
mod iter;
mod json;
mod slice;
mod translator;
mod value;
mod value_type;
mod vpack;

pub mod constants;

pub use builder::{BuildValue, Builder, BuilderOptions};
pub use error::{ErrorKind, Result, VPackError};
pub use iter::{ArrayIter, ObjectIter};
pub use json::from_json;
pub use slice::Slice;
pub use translator::{AttributeTranslator, STANDARD_ATTRIBUTES};
pub use value::Value;
pub use value_type::{fixed_byte_length, type_of, ValueType};
pub use vpack::VPack;

pub use velocypack_buffers::BufferError;
