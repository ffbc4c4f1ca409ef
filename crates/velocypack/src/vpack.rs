use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::slice::Slice;
use crate::translator::AttributeTranslator;

/// A finished, immutable encoded buffer.
///
/// Cloning shares the bytes; a `VPack` can be sent to and read from many
/// threads at once. Read it through [`slice`](Self::slice).
#[derive(Clone)]
pub struct VPack {
    bytes: Arc<[u8]>,
    translator: Option<Arc<AttributeTranslator>>,
}

impl VPack {
    pub(crate) fn new(bytes: Vec<u8>, translator: Option<Arc<AttributeTranslator>>) -> Self {
        Self {
            bytes: bytes.into(),
            translator,
        }
    }

    /// Wraps bytes produced elsewhere, reading integer keys through the
    /// standard attribute translator.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
            translator: Some(AttributeTranslator::standard()),
        }
    }

    pub fn with_translator(mut self, translator: Option<Arc<AttributeTranslator>>) -> Self {
        self.translator = translator;
        self
    }

    /// The top-level value, or the None sentinel for an empty buffer.
    pub fn slice(&self) -> Slice<'_> {
        if self.bytes.is_empty() {
            return Slice::none();
        }
        Slice::with_translator(&self.bytes, self.translator.as_deref())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn translator(&self) -> Option<&AttributeTranslator> {
        self.translator.as_deref()
    }

    /// Size of the top-level value, which may be smaller than the buffer
    /// when several values were appended.
    pub fn byte_size(&self) -> Result<usize> {
        self.slice().byte_size()
    }
}

impl PartialEq for VPack {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for VPack {}

impl fmt::Debug for VPack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VPack")
            .field("len", &self.bytes.len())
            .field("type", &self.slice().value_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use std::thread;

    #[test]
    fn empty_buffer_is_none() {
        let vpack = Builder::new().finish().unwrap();
        assert!(vpack.is_empty());
        assert!(vpack.slice().is_none());
    }

    #[test]
    fn shared_across_threads() {
        let mut builder = Builder::new();
        builder.open_array().unwrap();
        for i in 0..50u32 {
            builder.add(i * 1000).unwrap();
        }
        builder.close().unwrap();
        let vpack = builder.finish().unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let vpack = vpack.clone();
                thread::spawn(move || {
                    let slice = vpack.slice();
                    (0..50)
                        .map(|i| slice.value_at(i).and_then(|v| v.as_u32()).unwrap())
                        .sum::<u32>()
                })
            })
            .collect();
        let expected: u32 = (0..50u32).map(|i| i * 1000).sum();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn from_bytes_reads_foreign_buffers() {
        let vpack = VPack::from_bytes(vec![0x43, b'a', b'b', b'c']);
        assert_eq!(vpack.slice().as_str(), Ok("abc"));
        assert_eq!(vpack.byte_size(), Ok(4));
    }
}
