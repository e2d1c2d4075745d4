//! Back-to-front message construction.
//!
//! The builder writes every object before anything that refers to it: strings
//! and vectors first, then the tables holding their offsets, and the root last.
//! Data is prepended to a [`BackVec`], so positions are tracked as offsets from
//! the end of the buffer, which do not move as the buffer grows.

use ahash::AHashMap;
use slate_bytes::{BackVec, Bytes, align::back_padding};
use slate_common::{Error, result::Result, verify_arg, verify_state};

use crate::{
    FILE_IDENTIFIER_LENGTH, MAX_FIELD_COUNT, SIZE_SOFFSET, SIZE_UOFFSET,
    offset::{AnyTable, Offset},
    options::BuilderOptions,
    owned::OwnedRoot,
    scalar::Scalar,
    vtable::{FieldLoc, VTableCache, VTableStats, encode_vtable},
};

#[derive(Debug, Clone, Copy)]
struct OpenObject {
    /// Buffer length when the object was started.
    start: usize,
    field_count: u16,
}

/// Largest scalar an object field can hold.
const MAX_FIELD_SIZE: usize = 8;

/// A field value held back until [`Builder::end_object`] lays out the object.
#[derive(Debug, Clone, Copy)]
enum PendingValue {
    Scalar {
        bytes: [u8; MAX_FIELD_SIZE],
        size: usize,
    },
    /// Builder offset of the referenced object.
    Offset(u32),
}

#[derive(Debug, Clone, Copy)]
struct PendingField {
    slot: u16,
    value: PendingValue,
}

impl PendingField {
    fn size(&self) -> usize {
        match self.value {
            PendingValue::Scalar { size, .. } => size,
            PendingValue::Offset(_) => SIZE_UOFFSET,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenVector {
    len: usize,
    elem_size: usize,
    pushed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finished {
    No,
    Plain,
    SizePrefixed,
}

/// Incrementally assembles one message.
///
/// Between [`start_object`](Self::start_object) and
/// [`end_object`](Self::end_object) only field additions are allowed; strings,
/// vectors and nested tables must be created before the object that refers to
/// them. Protocol violations are reported as `InvalidState` errors.
///
/// After [`finish`](Self::finish) the builder is frozen until
/// [`reset`](Self::reset), which keeps the allocation for the next message.
#[derive(Debug)]
pub struct Builder {
    buf: BackVec,
    options: BuilderOptions,
    /// Largest alignment requested so far; the finished buffer is padded to it.
    min_align: usize,
    object: Option<OpenObject>,
    vector: Option<OpenVector>,
    pending: Vec<PendingField>,
    fields: Vec<FieldLoc>,
    vtable_scratch: Vec<u8>,
    vtables: VTableCache,
    shared_strings: AHashMap<String, u32>,
    finished: Finished,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::with_options(BuilderOptions::default())
    }

    pub fn with_capacity(capacity: usize) -> Builder {
        Builder::with_options(BuilderOptions::default().with_initial_capacity(capacity))
    }

    pub fn with_options(options: BuilderOptions) -> Builder {
        Builder {
            buf: BackVec::with_capacity(options.initial_capacity),
            options,
            min_align: 1,
            object: None,
            vector: None,
            pending: Vec::new(),
            fields: Vec::new(),
            vtable_scratch: Vec::new(),
            vtables: VTableCache::default(),
            shared_strings: AHashMap::new(),
            finished: Finished::No,
        }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.finished != Finished::No
    }

    /// Vtable counters for the message being built.
    pub fn vtable_stats(&self) -> VTableStats {
        self.vtables.stats()
    }

    /// Discards the current message and prepares the builder for a new one,
    /// keeping its allocations.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.min_align = 1;
        self.object = None;
        self.vector = None;
        self.pending.clear();
        self.fields.clear();
        self.vtables.clear();
        self.shared_strings.clear();
        self.finished = Finished::No;
    }

    /// Begins a table with room for `field_count` slots.
    pub fn start_object(&mut self, field_count: u16) -> Result<()> {
        self.assert_not_nested("start_object")?;
        verify_state!(
            "start_object",
            field_count <= MAX_FIELD_COUNT,
            "field count exceeds the vtable capacity"
        );
        self.pending.clear();
        self.object = Some(OpenObject {
            start: self.buf.len(),
            field_count,
        });
        Ok(())
    }

    /// Adds a scalar field to the open object.
    ///
    /// A value equal to `default` is not written unless
    /// [`BuilderOptions::force_defaults`] is set; readers substitute the same
    /// default for absent fields.
    pub fn add_scalar<T: Scalar>(&mut self, slot: u16, value: T, default: T) -> Result<()> {
        self.check_slot(slot, "add_scalar")?;
        if value == default && !self.options.force_defaults {
            return Ok(());
        }
        self.push_field(slot, value)
    }

    /// Adds a scalar field that is stored whenever it is `Some`, even if it
    /// equals the type's zero value.
    pub fn add_scalar_opt<T: Scalar>(&mut self, slot: u16, value: Option<T>) -> Result<()> {
        self.check_slot(slot, "add_scalar_opt")?;
        match value {
            Some(value) => self.push_field(slot, value),
            None => Ok(()),
        }
    }

    /// Adds a reference field to the open object. A null offset leaves the slot absent.
    pub fn add_offset<T: ?Sized>(&mut self, slot: u16, offset: Offset<T>) -> Result<()> {
        let object = self.check_slot(slot, "add_offset")?;
        if offset.is_null() {
            return Ok(());
        }
        verify_state!(
            "add_offset",
            offset.value() as usize <= object.start,
            "offset refers to data that has not been written"
        );
        self.pending.push(PendingField {
            slot,
            value: PendingValue::Offset(offset.value()),
        });
        Ok(())
    }

    /// Completes the open object, writing (or reusing) its vtable.
    ///
    /// Field values are laid out here rather than as they are added: the object
    /// starts aligned to its largest field and fields follow in order of
    /// decreasing size, then slot. The layout, and with it the vtable, depends
    /// only on which fields are present, so objects with the same fields share
    /// one vtable wherever they land in the buffer.
    pub fn end_object(&mut self) -> Result<Offset<AnyTable>> {
        verify_state!("end_object", self.object.is_some(), "no object is open");

        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_by(|a, b| b.size().cmp(&a.size()).then(a.slot.cmp(&b.slot)));
        let result = self.write_object(&pending);
        pending.clear();
        self.pending = pending;
        result
    }

    /// Writes a length-prefixed, NUL-terminated UTF-8 string.
    pub fn create_string(&mut self, s: &str) -> Result<Offset<str>> {
        self.write_string_bytes("create_string", s.as_bytes()).map(Offset::new)
    }

    /// Writes arbitrary bytes in the string layout. The result reads back as a
    /// `u8` vector.
    pub fn create_byte_string(&mut self, bytes: &[u8]) -> Result<Offset<[u8]>> {
        self.write_string_bytes("create_byte_string", bytes).map(Offset::new)
    }

    /// Like [`create_string`](Self::create_string), but returns the offset of an
    /// identical string already written to this message instead of writing it again.
    pub fn create_shared_string(&mut self, s: &str) -> Result<Offset<str>> {
        self.assert_not_nested("create_shared_string")?;
        if let Some(&offset) = self.shared_strings.get(s) {
            return Ok(Offset::new(offset));
        }
        let offset = self.write_string_bytes("create_shared_string", s.as_bytes())?;
        self.shared_strings.insert(s.to_string(), offset);
        Ok(Offset::new(offset))
    }

    /// Writes a vector of scalars.
    pub fn create_vector<T: Scalar>(&mut self, items: &[T]) -> Result<Offset<[T]>> {
        self.start_vector(items.len(), T::SIZE, T::SIZE)?;
        let dst = self.buf.make_space(items.len() * T::SIZE);
        for (chunk, item) in dst.chunks_exact_mut(T::SIZE).zip(items) {
            item.write_le(chunk);
        }
        if let Some(vector) = self.vector.as_mut() {
            vector.pushed = items.len();
        }
        self.end_vector()
    }

    /// Writes a vector of references to previously written objects.
    pub fn create_vector_of_offsets<T: ?Sized>(
        &mut self,
        items: &[Offset<T>],
    ) -> Result<Offset<[Offset<T>]>> {
        self.start_vector(items.len(), SIZE_UOFFSET, SIZE_UOFFSET)?;
        for &item in items.iter().rev() {
            self.push_offset_element(item)?;
        }
        self.end_vector()
    }

    /// Writes each string, then a vector referring to them.
    pub fn create_vector_of_strings<S: AsRef<str>>(
        &mut self,
        items: &[S],
    ) -> Result<Offset<[Offset<str>]>> {
        let offsets = items
            .iter()
            .map(|s| self.create_string(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.create_vector_of_offsets(&offsets)
    }

    /// Begins a vector of `len` elements, each `elem_size` bytes and aligned to
    /// `alignment`. Elements are then pushed last to first with
    /// [`push_element`](Self::push_element) or
    /// [`push_offset_element`](Self::push_offset_element).
    pub fn start_vector(&mut self, len: usize, elem_size: usize, alignment: usize) -> Result<()> {
        self.assert_not_nested("start_vector")?;
        verify_arg!(elem_size, elem_size > 0);
        verify_arg!(alignment, alignment.is_power_of_two());
        let size = len
            .checked_mul(elem_size)
            .ok_or_else(|| Error::buffer_too_large(usize::MAX, self.options.buffer_limit()))?;
        self.prep(SIZE_UOFFSET, size)?;
        self.prep(alignment, size)?;
        self.check_limit(size.saturating_add(SIZE_UOFFSET))?;
        self.vector = Some(OpenVector {
            len,
            elem_size,
            pushed: 0,
        });
        Ok(())
    }

    pub fn push_element<T: Scalar>(&mut self, value: T) -> Result<()> {
        self.next_vector_slot("push_element", T::SIZE)?;
        self.push_scalar(value)?;
        self.count_vector_element();
        Ok(())
    }

    pub fn push_offset_element<T: ?Sized>(&mut self, offset: Offset<T>) -> Result<()> {
        self.next_vector_slot("push_offset_element", SIZE_UOFFSET)?;
        verify_state!(
            "push_offset_element",
            !offset.is_null(),
            "vector elements cannot be null offsets"
        );
        self.push_uoffset(offset.value(), "push_offset_element")?;
        self.count_vector_element();
        Ok(())
    }

    /// Completes the vector started by [`start_vector`](Self::start_vector).
    pub fn end_vector<T>(&mut self) -> Result<Offset<[T]>> {
        let vector = self
            .vector
            .ok_or_else(|| Error::invalid_state("end_vector", "no vector is open"))?;
        if vector.pushed != vector.len {
            return Err(Error::invalid_state(
                "end_vector",
                format!(
                    "{} of {} declared elements were pushed",
                    vector.pushed, vector.len
                ),
            ));
        }
        self.vector = None;
        let offset = self.push_scalar(vector.len as u32)?;
        Ok(Offset::new(offset as u32))
    }

    /// Writes the root offset, preceded by an optional file identifier, and
    /// returns the finished buffer.
    pub fn finish<T: ?Sized>(
        &mut self,
        root: Offset<T>,
        file_identifier: Option<&[u8; FILE_IDENTIFIER_LENGTH]>,
    ) -> Result<&[u8]> {
        self.finish_with("finish", root, file_identifier, false)
    }

    /// Like [`finish`](Self::finish), but additionally prefixes the buffer with
    /// its own length as a `u32`.
    pub fn finish_size_prefixed<T: ?Sized>(
        &mut self,
        root: Offset<T>,
        file_identifier: Option<&[u8; FILE_IDENTIFIER_LENGTH]>,
    ) -> Result<&[u8]> {
        self.finish_with("finish_size_prefixed", root, file_identifier, true)
    }

    /// The finished buffer. Fails before [`finish`](Self::finish).
    pub fn finished_data(&self) -> Result<&[u8]> {
        self.assert_finished("finished_data")?;
        Ok(self.buf.as_slice())
    }

    /// Hands the finished buffer over as shared [`Bytes`] without copying.
    pub fn into_bytes(self) -> Result<Bytes> {
        self.assert_finished("into_bytes")?;
        Ok(self.buf.into_bytes())
    }

    /// Hands the finished buffer over as a validated [`OwnedRoot`].
    pub fn into_owned_root(self) -> Result<OwnedRoot> {
        let size_prefixed = self.finished == Finished::SizePrefixed;
        let bytes = self.into_bytes()?;
        if size_prefixed {
            OwnedRoot::size_prefixed(bytes)
        } else {
            OwnedRoot::new(bytes)
        }
    }
}

impl Builder {
    fn finish_with<T: ?Sized>(
        &mut self,
        operation: &'static str,
        root: Offset<T>,
        file_identifier: Option<&[u8; FILE_IDENTIFIER_LENGTH]>,
        size_prefixed: bool,
    ) -> Result<&[u8]> {
        self.assert_not_nested(operation)?;
        verify_state!(operation, !root.is_null(), "the root offset is null");

        let trailer = SIZE_UOFFSET
            + file_identifier.map_or(0, |_| FILE_IDENTIFIER_LENGTH)
            + if size_prefixed { SIZE_UOFFSET } else { 0 };
        self.prep(self.min_align.max(SIZE_UOFFSET), trailer)?;
        if let Some(identifier) = file_identifier {
            self.check_limit(FILE_IDENTIFIER_LENGTH)?;
            self.buf.push_front(identifier);
        }
        self.push_uoffset(root.value(), operation)?;
        if size_prefixed {
            let size = self.buf.len() as u32;
            self.push_scalar(size)?;
        }

        self.finished = if size_prefixed {
            Finished::SizePrefixed
        } else {
            Finished::Plain
        };
        let stats = self.vtables.stats();
        log::debug!(
            "finished message: {} bytes, {} vtables written, {} reused",
            self.buf.len(),
            stats.written,
            stats.reused
        );
        Ok(self.buf.as_slice())
    }

    /// Writes the fields of the open object, its soffset and its vtable.
    fn write_object(&mut self, pending: &[PendingField]) -> Result<Offset<AnyTable>> {
        let align = pending
            .first()
            .map_or(SIZE_SOFFSET, |f| f.size().max(SIZE_SOFFSET));
        self.prep(align, 0)?;
        let start = self.buf.len();

        self.fields.clear();
        for field in pending {
            let off = match field.value {
                PendingValue::Scalar { bytes, size } => {
                    self.prep(size, 0)?;
                    self.check_limit(size)?;
                    self.buf.push_front(&bytes[..size]);
                    self.buf.len()
                }
                PendingValue::Offset(target) => self.push_uoffset(target, "end_object")?,
            };
            self.fields.push(FieldLoc {
                off,
                slot: field.slot,
            });
        }

        // Placeholder for the soffset to the vtable.
        let object_offset = self.push_scalar(0i32)?;
        let object_size = object_offset - start;
        verify_state!(
            "end_object",
            object_size <= u16::MAX as usize,
            "object inline data exceeds the vtable range"
        );

        encode_vtable(
            &self.fields,
            object_offset,
            object_size,
            &mut self.vtable_scratch,
        );
        let shared = if self.options.dedup_vtables {
            self.vtables.find(&self.vtable_scratch)
        } else {
            None
        };
        let vtable_offset = match shared {
            Some(vtable_offset) => {
                log::trace!(
                    "object at {object_offset} reuses vtable at {vtable_offset} ({} bytes)",
                    self.vtable_scratch.len()
                );
                vtable_offset
            }
            None => {
                self.check_limit(self.vtable_scratch.len())?;
                self.buf.push_front(&self.vtable_scratch);
                let vtable_offset = self.buf.len();
                self.vtables.record(
                    &self.vtable_scratch,
                    vtable_offset,
                    self.options.dedup_vtables,
                );
                log::trace!(
                    "object at {object_offset} writes vtable at {vtable_offset} ({} fields)",
                    self.fields.len()
                );
                vtable_offset
            }
        };

        // Both offsets are bounded by the buffer limit, which fits in an i32.
        let soffset = (vtable_offset as i64 - object_offset as i64) as i32;
        soffset.write_le(self.buf.at_offset_mut(object_offset, SIZE_SOFFSET));

        self.object = None;
        self.fields.clear();
        Ok(Offset::new(object_offset as u32))
    }

    fn assert_not_nested(&self, operation: &'static str) -> Result<()> {
        verify_state!(
            operation,
            self.finished == Finished::No,
            "the message is finished; call reset() to build another"
        );
        verify_state!(operation, self.object.is_none(), "an object is still open");
        verify_state!(operation, self.vector.is_none(), "a vector is still open");
        Ok(())
    }

    fn assert_finished(&self, operation: &'static str) -> Result<()> {
        verify_state!(
            operation,
            self.finished != Finished::No,
            "the message has not been finished"
        );
        Ok(())
    }

    /// Validates that `slot` can be set on the open object and returns the object.
    fn check_slot(&self, slot: u16, operation: &'static str) -> Result<OpenObject> {
        let Some(object) = self.object else {
            return Err(Error::invalid_state(operation, "no object is open"));
        };
        if slot >= object.field_count {
            return Err(Error::invalid_state(
                operation,
                format!(
                    "slot {slot} is out of range for an object with {} fields",
                    object.field_count
                ),
            ));
        }
        if self.pending.iter().any(|f| f.slot == slot) {
            return Err(Error::invalid_state(
                operation,
                format!("slot {slot} is already set"),
            ));
        }
        Ok(object)
    }

    fn next_vector_slot(&self, operation: &'static str, elem_size: usize) -> Result<()> {
        let Some(vector) = self.vector else {
            return Err(Error::invalid_state(operation, "no vector is open"));
        };
        verify_state!(
            operation,
            vector.elem_size == elem_size,
            "element size does not match the size given to start_vector"
        );
        verify_state!(
            operation,
            vector.pushed < vector.len,
            "more elements pushed than declared"
        );
        Ok(())
    }

    fn count_vector_element(&mut self) {
        if let Some(vector) = self.vector.as_mut() {
            vector.pushed += 1;
        }
    }

    fn check_limit(&self, additional: usize) -> Result<()> {
        let limit = self.options.buffer_limit();
        let requested = self.buf.len().saturating_add(additional);
        if requested > limit {
            return Err(Error::buffer_too_large(requested, limit));
        }
        Ok(())
    }

    /// Pads the buffer so that, after `additional` more bytes are written, the
    /// next value of `alignment` bytes lands aligned.
    fn prep(&mut self, alignment: usize, additional: usize) -> Result<()> {
        self.min_align = self.min_align.max(alignment);
        let pad = back_padding(self.buf.len().wrapping_add(additional), alignment);
        self.check_limit(additional.saturating_add(pad))?;
        self.buf.push_zeros(pad);
        Ok(())
    }

    /// Writes an aligned scalar and returns its offset.
    fn push_scalar<T: Scalar>(&mut self, value: T) -> Result<usize> {
        self.prep(T::SIZE, 0)?;
        self.check_limit(T::SIZE)?;
        value.write_le(self.buf.make_space(T::SIZE));
        Ok(self.buf.len())
    }

    fn push_field<T: Scalar>(&mut self, slot: u16, value: T) -> Result<()> {
        verify_arg!(T::SIZE, T::SIZE <= MAX_FIELD_SIZE && T::SIZE.is_power_of_two());
        let mut bytes = [0u8; MAX_FIELD_SIZE];
        value.write_le(&mut bytes);
        self.pending.push(PendingField {
            slot,
            value: PendingValue::Scalar {
                bytes,
                size: T::SIZE,
            },
        });
        Ok(())
    }

    /// Writes a uoffset referring to the object at builder offset `target`.
    fn push_uoffset(&mut self, target: u32, operation: &'static str) -> Result<usize> {
        self.prep(SIZE_UOFFSET, 0)?;
        let target = target as usize;
        verify_state!(
            operation,
            target <= self.buf.len(),
            "offset refers to data that has not been written"
        );
        let relative = self.buf.len() + SIZE_UOFFSET - target;
        self.push_scalar(relative as u32)
    }

    fn write_string_bytes(&mut self, operation: &'static str, bytes: &[u8]) -> Result<u32> {
        self.assert_not_nested(operation)?;
        self.prep(SIZE_UOFFSET, bytes.len().saturating_add(1))?;
        self.check_limit(bytes.len().saturating_add(1 + SIZE_UOFFSET))?;
        self.buf.push_zeros(1);
        self.buf.push_front(bytes);
        let offset = self.push_scalar(bytes.len() as u32)?;
        Ok(offset as u32)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
