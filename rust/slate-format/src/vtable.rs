//! Vtables: the per-object field directory.
//!
//! A vtable is a sequence of `u16` values: its own byte length, the byte length
//! of the object's inline data, then one entry per slot holding the field's
//! position relative to the start of the object (`0` when the field is absent).
//! Trailing absent slots are omitted, so readers treat slots past the end of the
//! vtable as absent. That is what lets a newer schema with more fields read an
//! older buffer, and the other way round.

use ahash::AHashMap;

use crate::{SIZE_VOFFSET, VTABLE_HEADER_SIZE, scalar::Scalar};

/// A field written into the currently open object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldLoc {
    /// Builder offset (distance from the end of the buffer) of the field value.
    pub off: usize,
    pub slot: u16,
}

/// Encodes the vtable of an object into `out`.
///
/// `object_offset` is the builder offset of the object's soffset, and
/// `object_size` the size of its inline data including the soffset.
pub(crate) fn encode_vtable(
    fields: &[FieldLoc],
    object_offset: usize,
    object_size: usize,
    out: &mut Vec<u8>,
) {
    let slot_count = fields.iter().map(|f| f.slot as usize + 1).max().unwrap_or(0);
    let vtable_size = VTABLE_HEADER_SIZE + slot_count * SIZE_VOFFSET;
    out.clear();
    out.resize(vtable_size, 0);
    (vtable_size as u16).write_le(&mut out[0..]);
    (object_size as u16).write_le(&mut out[SIZE_VOFFSET..]);
    for field in fields {
        let voffset = (object_offset - field.off) as u16;
        let pos = VTABLE_HEADER_SIZE + field.slot as usize * SIZE_VOFFSET;
        voffset.write_le(&mut out[pos..]);
    }
}

/// Counters describing how many vtables a builder emitted and how many objects
/// reused an existing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VTableStats {
    pub written: usize,
    pub reused: usize,
}

/// Vtables already written to the current message, keyed by their encoding.
#[derive(Debug, Default)]
pub(crate) struct VTableCache {
    offsets: AHashMap<Box<[u8]>, usize>,
    stats: VTableStats,
}

impl VTableCache {
    /// Looks up an identical vtable, counting a hit as a reuse.
    pub fn find(&mut self, vtable: &[u8]) -> Option<usize> {
        let offset = self.offsets.get(vtable).copied();
        if offset.is_some() {
            self.stats.reused += 1;
        }
        offset
    }

    /// Records a newly written vtable. It only becomes shareable when `share` is set.
    pub fn record(&mut self, vtable: &[u8], offset: usize, share: bool) {
        self.stats.written += 1;
        if share {
            self.offsets.insert(vtable.into(), offset);
        }
    }

    pub fn stats(&self) -> VTableStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.offsets.clear();
        self.stats = VTableStats::default();
    }
}

/// A validated vtable inside a finished buffer.
#[derive(Clone, Copy)]
pub struct VTable<'a> {
    buf: &'a [u8],
    loc: usize,
    size: usize,
    object_size: usize,
}

impl<'a> VTable<'a> {
    /// The caller guarantees that `loc..loc + size` lies inside `buf`.
    pub(crate) fn from_validated(
        buf: &'a [u8],
        loc: usize,
        size: usize,
        object_size: usize,
    ) -> VTable<'a> {
        debug_assert!(loc + size <= buf.len());
        VTable {
            buf,
            loc,
            size,
            object_size,
        }
    }

    /// Absolute position of the vtable in the buffer.
    pub fn loc(&self) -> usize {
        self.loc
    }

    /// Byte length of the vtable, header included.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Byte length of the object's inline data.
    pub fn object_size(&self) -> usize {
        self.object_size
    }

    /// Number of slots the vtable describes.
    pub fn slot_count(&self) -> usize {
        (self.size - VTABLE_HEADER_SIZE) / SIZE_VOFFSET
    }

    /// The entry for `slot`, or `0` if the slot is absent or past the end of the vtable.
    #[inline]
    pub fn entry(&self, slot: u16) -> u16 {
        let pos = VTABLE_HEADER_SIZE + slot as usize * SIZE_VOFFSET;
        if pos + SIZE_VOFFSET > self.size {
            return 0;
        }
        u16::read_le(&self.buf[self.loc + pos..])
    }

    pub fn entries(self) -> impl Iterator<Item = u16> + 'a {
        (0..self.slot_count()).map(move |slot| self.entry(slot as u16))
    }
}

impl std::fmt::Debug for VTable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VTable")
            .field("loc", &self.loc)
            .field("object_size", &self.object_size)
            .field("entries", &self.entries().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_vtable_trims_trailing_slots() {
        // Object started at builder offset 16, fields written at 20 and 24,
        // soffset at 28.
        let fields = [FieldLoc { off: 20, slot: 2 }, FieldLoc { off: 24, slot: 0 }];
        let mut out = Vec::new();
        encode_vtable(&fields, 28, 12, &mut out);
        let words: Vec<u16> = out.chunks(2).map(u16::read_le).collect();
        assert_eq!(words, [10, 12, 4, 0, 8]);

        encode_vtable(&[], 4, 4, &mut out);
        assert_eq!(out, [4, 0, 4, 0]);
    }

    #[test]
    fn test_vtable_entries_past_end_are_absent() {
        let buf = [6u8, 0, 8, 0, 4, 0];
        let vtable = VTable::from_validated(&buf, 0, 6, 8);
        assert_eq!(vtable.slot_count(), 1);
        assert_eq!(vtable.entry(0), 4);
        assert_eq!(vtable.entry(1), 0);
        assert_eq!(vtable.entry(u16::MAX), 0);
    }

    #[test]
    fn test_vtable_cache() {
        let mut cache = VTableCache::default();
        assert_eq!(cache.find(&[4, 0, 4, 0]), None);
        cache.record(&[4, 0, 4, 0], 12, true);
        cache.record(&[6, 0, 8, 0, 4, 0], 40, false);
        assert_eq!(cache.find(&[4, 0, 4, 0]), Some(12));
        assert_eq!(cache.find(&[6, 0, 8, 0, 4, 0]), None);
        assert_eq!(
            cache.stats(),
            VTableStats {
                written: 2,
                reused: 1
            }
        );
        cache.clear();
        assert_eq!(cache.stats(), VTableStats::default());
    }
}
