//! Container finalization: picks the layout and offset width once all
//! members are known.

use tracing::trace;
use velocypack_buffers::varlen_size;

use super::{Builder, Frame, FrameKind};
use crate::constants::*;
use crate::error::{Result, VPackError};
use crate::slice::Slice;

/// Head byte increment for offset widths 1, 2, 4 and 8.
fn width_code(width: usize) -> u8 {
    width.trailing_zeros() as u8
}

/// Smallest offset width whose range holds `span` plus the index table.
///
/// `shrink` is the number of reserved header bytes the 1-byte layout gives
/// back.
fn pick_width(span: usize, entries: usize, shrink: usize) -> usize {
    if span + entries - shrink <= 0xff {
        1
    } else if span + 2 * entries <= 0xffff {
        2
    } else if span + 4 * entries <= 0xffff_ffff {
        4
    } else {
        8
    }
}

impl Builder {
    /// Closes the innermost array or object. Objects get a sorted index
    /// table.
    pub fn close(&mut self) -> Result<()> {
        self.close_compound(true)
    }

    /// Closes the innermost array or object, keeping object members in
    /// insertion order.
    pub fn close_unsorted(&mut self) -> Result<()> {
        self.close_compound(false)
    }

    fn close_compound(&mut self, sort: bool) -> Result<()> {
        if self.key_written {
            return Err(VPackError::DanglingKey);
        }
        let mut frame = self.stack.pop().ok_or(VPackError::NeedOpenCompound)?;
        let is_array = frame.kind == FrameKind::Array;
        let n = frame.children.len();

        if n == 0 {
            let head = if is_array { ARRAY_EMPTY } else { OBJECT_EMPTY };
            self.writer.set_u8(frame.start, head);
            self.writer.truncate(frame.start + 1);
            trace!(start = frame.start, head, "closed empty container");
            return Ok(());
        }

        let try_compact = frame.compact
            || (is_array && self.options.build_unindexed_arrays)
            || (!is_array && (self.options.build_unindexed_objects || n == 1));
        if try_compact && self.close_compact(&frame) {
            return Ok(());
        }

        if is_array {
            self.close_array(&mut frame);
            return Ok(());
        }
        if sort && n >= 2 {
            if let Err(err) = self.sort_keys(&mut frame) {
                self.stack.push(frame);
                return Err(err);
            }
        }
        self.close_object(&mut frame, sort);
        Ok(())
    }

    /// Orders the member offsets of an object by key.
    fn sort_keys(&self, frame: &mut Frame) -> Result<()> {
        let container = Slice::with_translator(self.writer.as_slice(), self.translator.as_deref());
        let mut keyed = Vec::with_capacity(frame.children.len());
        for &offset in &frame.children {
            keyed.push((container.at(frame.start + offset).key_str()?, offset));
        }
        keyed.sort_by(|a, b| a.0.cmp(b.0));
        for (child, (_, offset)) in frame.children.iter_mut().zip(keyed) {
            *child = offset;
        }
        Ok(())
    }

    /// Writes the LEB128 length/count layout. Returns `false`, leaving the
    /// buffer untouched, when the length needs more than 8 bytes.
    fn close_compact(&mut self, frame: &Frame) -> bool {
        let start = frame.start;
        let n = frame.children.len();
        let n_len = varlen_size(n as u64);
        let mut byte_size = self.writer.len() - (start + 8) + n_len;
        let mut b_len = varlen_size(byte_size as u64);
        byte_size += b_len;
        if varlen_size(byte_size as u64) != b_len {
            byte_size += 1;
            b_len += 1;
        }
        if b_len >= RESERVED_HEADER || n_len >= RESERVED_HEADER {
            trace!(start, byte_size, "compact layout does not fit, using index table");
            return false;
        }

        let head = match frame.kind {
            FrameKind::Array => ARRAY_COMPACT,
            FrameKind::Object => OBJECT_COMPACT,
        };
        self.writer.set_u8(start, head);
        self.writer.remove(start + 1 + b_len, RESERVED_HEADER - 1 - b_len);
        self.writer.set_varlen(start + 1, byte_size as u64);
        self.writer.zeros(n_len);
        self.writer.set_varlen_reversed(start + byte_size, n as u64);
        trace!(start, children = n, head, byte_size, "closed compact container");
        true
    }

    fn close_array(&mut self, frame: &mut Frame) {
        let start = frame.start;
        let children = &mut frame.children;
        let n = children.len();
        let span = self.writer.len() - start;

        // Equal-sized members can be located from the first one, so neither
        // the table nor the count is needed.
        let mut need_table = n > 1;
        if need_table && span - children[0] == n * (children[1] - children[0]) {
            let item = children[1] - children[0];
            let uniform = span - children[n - 1] == item
                && children.windows(2).all(|pair| pair[1] - pair[0] == item);
            need_table = !uniform;
        }
        let need_count = need_table;

        let width = pick_width(
            span,
            if need_table { n } else { 0 },
            if need_count { 6 } else { 7 },
        );
        if width == 1 {
            let target = if need_table { 3 } else { 2 };
            let diff = RESERVED_HEADER - target;
            self.writer.remove(start + target, diff);
            for child in children.iter_mut() {
                *child -= diff;
            }
        }

        if need_table {
            for &child in children.iter() {
                self.writer.uint_le(child as u64, width);
            }
        }
        let base = if need_table { ARRAY_INDEXED_1 } else { ARRAY_NO_INDEX_1 };
        let head = base + width_code(width);
        self.writer.set_u8(start, head);
        self.finish_header(start, n, width, need_count);
        trace!(start, children = n, head, width, "closed array");
    }

    fn close_object(&mut self, frame: &mut Frame, sorted: bool) {
        let start = frame.start;
        let children = &mut frame.children;
        let n = children.len();
        let span = self.writer.len() - start;

        let width = pick_width(span, n, 6);
        if width == 1 {
            let diff = RESERVED_HEADER - 3;
            self.writer.remove(start + 3, diff);
            for child in children.iter_mut() {
                *child -= diff;
            }
        }

        for &child in children.iter() {
            self.writer.uint_le(child as u64, width);
        }
        let base = if sorted { OBJECT_SORTED_1 } else { OBJECT_UNSORTED_1 };
        let head = base + width_code(width);
        self.writer.set_u8(start, head);
        self.finish_header(start, n, width, true);
        trace!(start, children = n, head, width, sorted, "closed object");
    }

    /// Stores the byte length and member count. With 8-byte offsets the
    /// count goes after the index table instead of into the header.
    fn finish_header(&mut self, start: usize, n: usize, width: usize, need_count: bool) {
        if width == 8 && need_count {
            self.writer.uint_le(n as u64, 8);
        }
        let byte_length = self.writer.len() - start;
        self.writer.set_uint_le(start + 1, byte_length as u64, width);
        if width < 8 && need_count {
            self.writer.set_uint_le(start + 1 + width, n as u64, width);
        }
    }
}
