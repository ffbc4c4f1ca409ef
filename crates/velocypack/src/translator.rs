//! Bidirectional dictionary between well-known attribute names and small
//! integer codes.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tracing::{debug, error};

use crate::builder::Builder;
use crate::error::{Result, VPackError};
use crate::slice::Slice;

/// Entries of the standard translator, stored as small ints 0x31..=0x35.
pub const STANDARD_ATTRIBUTES: [(&str, i64); 5] =
    [("_key", 1), ("_rev", 2), ("_id", 3), ("_from", 4), ("_to", 5)];

static STANDARD: OnceLock<Arc<AttributeTranslator>> = OnceLock::new();

/// Maps attribute names to integer codes and back.
///
/// Entries are collected with [`add`](Self::add) and become visible once
/// [`seal`](Self::seal) has encoded them into an internal object. A sealed
/// translator is immutable and can be shared behind an `Arc`.
#[derive(Debug, Default)]
pub struct AttributeTranslator {
    pending: Vec<(String, i64)>,
    sealed: Option<Table>,
}

#[derive(Debug)]
struct Table {
    bytes: Vec<u8>,
    /// Offset of the encoded code for each name.
    by_name: HashMap<String, usize>,
    /// Offset of the encoded name for each code.
    by_code: HashMap<i64, usize>,
}

impl AttributeTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide sealed instance holding [`STANDARD_ATTRIBUTES`].
    pub fn standard() -> Arc<AttributeTranslator> {
        Arc::clone(Self::standard_arc())
    }

    pub(crate) fn standard_ref() -> &'static AttributeTranslator {
        Self::standard_arc().as_ref()
    }

    fn standard_arc() -> &'static Arc<AttributeTranslator> {
        STANDARD.get_or_init(|| {
            let mut translator = AttributeTranslator::new();
            for (name, code) in STANDARD_ATTRIBUTES {
                translator.pending.push((name.to_owned(), code));
            }
            if let Err(err) = translator.seal() {
                error!(%err, "failed to seal standard attribute translator");
            }
            Arc::new(translator)
        })
    }

    /// Registers `name` under `code`. An entry reusing either the name or
    /// the code replaces the earlier one.
    pub fn add(&mut self, name: &str, code: i64) -> Result<()> {
        if self.sealed.is_some() {
            return Err(VPackError::TranslatorSealed);
        }
        self.pending.retain(|(n, c)| n != name && *c != code);
        self.pending.push((name.to_owned(), code));
        Ok(())
    }

    /// Encodes the collected entries and freezes the translator.
    pub fn seal(&mut self) -> Result<()> {
        if self.sealed.is_some() {
            return Err(VPackError::TranslatorSealed);
        }
        let mut builder = Builder::without_translator();
        builder.open_object()?;
        for (name, code) in &self.pending {
            builder.add_key(name)?;
            builder.add_compact_int(*code)?;
        }
        builder.close()?;
        let bytes = builder.finish()?.to_vec();

        let mut by_name = HashMap::with_capacity(self.pending.len());
        let mut by_code = HashMap::with_capacity(self.pending.len());
        let object = Slice::with_translator(&bytes, None);
        for index in 0..object.length()? {
            let key = object.key_at(index)?;
            let value = object.value_at(index)?;
            by_name.insert(key.as_str()?.to_owned(), value.start());
            by_code.insert(value.as_i64()?, key.start());
        }
        debug!(entries = by_name.len(), bytes = bytes.len(), "sealed attribute translator");

        self.pending.clear();
        self.sealed = Some(Table {
            bytes,
            by_name,
            by_code,
        });
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.is_some()
    }

    /// Number of entries, sealed or pending.
    pub fn len(&self) -> usize {
        match &self.sealed {
            Some(table) => table.by_name.len(),
            None => self.pending.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The encoded integer code for `name`. `None` before sealing.
    pub fn translate_name(&self, name: &str) -> Option<Slice<'_>> {
        let table = self.sealed.as_ref()?;
        let offset = *table.by_name.get(name)?;
        Some(Slice::with_translator(&table.bytes, None).at(offset))
    }

    /// The encoded attribute name for `code`. `None` before sealing.
    pub fn translate_key(&self, code: i64) -> Option<Slice<'_>> {
        let table = self.sealed.as_ref()?;
        let offset = *table.by_code.get(&code)?;
        Some(Slice::with_translator(&table.bytes, None).at(offset))
    }
}
