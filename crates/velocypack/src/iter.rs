//! Forward iteration over array items and object entries.
//!
//! Both iterators walk the payload by byte size instead of consulting the
//! index table, so every container layout iterates in O(n).

use std::iter::FusedIterator;

use crate::error::Result;
use crate::slice::Slice;

/// Iterator over the items of an array. Created by [`Slice::iter_array`].
///
/// Stops early if an item's size cannot be decoded.
#[derive(Debug, Clone)]
pub struct ArrayIter<'a> {
    container: Slice<'a>,
    position: usize,
    remaining: usize,
}

impl<'a> ArrayIter<'a> {
    pub(crate) fn new(container: Slice<'a>, length: usize) -> Result<Self> {
        let position = if length == 0 {
            container.start()
        } else {
            container.start() + container.first_member_offset()?
        };
        Ok(Self {
            container,
            position,
            remaining: length,
        })
    }
}

impl<'a> Iterator for ArrayIter<'a> {
    type Item = Slice<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.container.at(self.position);
        match item.end() {
            Ok(end) => {
                self.position = end;
                self.remaining -= 1;
                Some(item)
            }
            Err(_) => {
                self.remaining = 0;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl FusedIterator for ArrayIter<'_> {}

/// Iterator over the `(key, value)` entries of an object. Created by
/// [`Slice::iter_object`].
///
/// Keys stored as attribute codes are translated. A key that cannot be
/// turned into a string (no translator, unknown code, non-string key type)
/// ends the iteration instead of producing an error.
#[derive(Debug, Clone)]
pub struct ObjectIter<'a> {
    container: Slice<'a>,
    position: usize,
    remaining: usize,
}

impl<'a> ObjectIter<'a> {
    pub(crate) fn new(container: Slice<'a>, length: usize) -> Result<Self> {
        let position = if length == 0 {
            container.start()
        } else {
            container.start() + container.first_member_offset()?
        };
        Ok(Self {
            container,
            position,
            remaining: length,
        })
    }

    fn advance(&mut self) -> Result<(&'a str, Slice<'a>)> {
        let key = self.container.at(self.position);
        let name = key.key_str()?;
        let value = self.container.at(key.end()?);
        self.position = value.end()?;
        Ok((name, value))
    }
}

impl<'a> Iterator for ObjectIter<'a> {
    type Item = (&'a str, Slice<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        match self.advance() {
            Ok(entry) => {
                self.remaining -= 1;
                Some(entry)
            }
            Err(_) => {
                self.remaining = 0;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl FusedIterator for ObjectIter<'_> {}
