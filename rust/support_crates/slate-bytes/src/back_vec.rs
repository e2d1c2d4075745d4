use crate::{
    Bytes,
    align::{align_down, align_up},
};

/// A growable byte vector that is filled from the back toward the front.
///
/// Data is prepended: the most recently written bytes are at the start of
/// [`as_slice`](Self::as_slice) and the first bytes ever written stay at its end.
/// Positions inside the vector are therefore naturally expressed as *offsets from
/// the end*, which remain stable as the vector grows.
///
/// The end of the used region is always 16-byte aligned in memory, so a value
/// aligned relative to the end (up to 16 bytes) is also aligned in memory.
///
/// # Performance
/// - Growth doubles the capacity and copies the used bytes to the tail of the
///   new storage
/// - Capacity is managed in 64-byte blocks
pub struct BackVec {
    /// Fully initialized storage; the used region is `inner[head..end]`.
    inner: Vec<u8>,
    /// Index of the first used byte.
    head: usize,
    /// Index one past the last used byte, aligned to `ALIGNMENT` in memory.
    end: usize,
}

impl BackVec {
    /// Alignment of the end of the used region.
    pub const ALIGNMENT: usize = 16;
    /// Block size for capacity calculations.
    const BLOCK_SIZE: usize = 64;

    /// Creates a new empty vector with no capacity allocation.
    pub fn new() -> BackVec {
        BackVec {
            inner: Vec::new(),
            head: 0,
            end: 0,
        }
    }

    /// Creates a new vector able to hold at least `capacity` bytes without reallocating.
    pub fn with_capacity(capacity: usize) -> BackVec {
        let (inner, end) = Self::make(capacity);
        BackVec {
            inner,
            head: end,
            end,
        }
    }

    /// Returns the number of used bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.head
    }

    /// Returns true if nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == self.end
    }

    /// Returns the number of bytes the vector can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.end
    }

    /// Returns the used bytes, most recently written first.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner[self.head..self.end]
    }

    /// Reserves capacity for at least `additional` more bytes.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        if self.head >= additional {
            return;
        }
        self.grow(additional);
    }

    /// Prepends the given bytes.
    #[inline]
    pub fn push_front(&mut self, bytes: &[u8]) {
        self.make_space(bytes.len()).copy_from_slice(bytes);
    }

    /// Prepends `count` zero bytes.
    #[inline]
    pub fn push_zeros(&mut self, count: usize) {
        self.make_space(count).fill(0);
    }

    /// Prepends `count` bytes and returns them for the caller to fill in.
    ///
    /// The returned region may contain stale data from before a [`clear`](Self::clear);
    /// the caller is expected to overwrite all of it.
    #[inline]
    pub fn make_space(&mut self, count: usize) -> &mut [u8] {
        self.reserve(count);
        self.head -= count;
        &mut self.inner[self.head..self.head + count]
    }

    /// Returns `len` bytes starting at the position located `offset` bytes before
    /// the end of the vector.
    ///
    /// # Panics
    ///
    /// Panics if `offset` exceeds the used length or `len` exceeds `offset`.
    pub fn at_offset(&self, offset: usize, len: usize) -> &[u8] {
        assert!(offset <= self.len() && len <= offset, "offset out of range");
        let start = self.end - offset;
        &self.inner[start..start + len]
    }

    /// Mutable counterpart of [`at_offset`](Self::at_offset).
    pub fn at_offset_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        assert!(offset <= self.len() && len <= offset, "offset out of range");
        let start = self.end - offset;
        &mut self.inner[start..start + len]
    }

    /// Discards all written bytes, keeping the allocation.
    pub fn clear(&mut self) {
        self.head = self.end;
    }

    /// Consumes the vector and returns the used bytes as a shared [`Bytes`]
    /// without copying.
    pub fn into_bytes(self) -> Bytes {
        Bytes::from_parts(self.inner, self.head..self.end)
    }

    /// Consumes the vector and returns the used bytes as a plain `Vec<u8>`.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.inner.truncate(self.end);
        self.inner.drain(..self.head);
        self.inner
    }
}

impl BackVec {
    /// Allocates zeroed storage with at least `capacity` usable bytes and returns it
    /// together with the aligned end index.
    fn make(capacity: usize) -> (Vec<u8>, usize) {
        if capacity == 0 {
            return (Vec::new(), 0);
        }
        let capacity = align_up(capacity, Self::BLOCK_SIZE);
        let inner = vec![0u8; capacity.checked_add(Self::ALIGNMENT).expect("add")];
        let base = inner.as_ptr() as usize;
        let end = align_down(base + inner.len(), Self::ALIGNMENT) - base;
        debug_assert!(end >= capacity);
        (inner, end)
    }

    /// Grows the storage to accommodate at least `additional` more bytes.
    #[cold]
    fn grow(&mut self, additional: usize) {
        let len = self.len();
        let required = len.checked_add(additional).expect("add");
        let new_cap = std::cmp::max(self.capacity() * 2, required);
        let (mut inner, end) = Self::make(new_cap);
        let head = end - len;
        inner[head..end].copy_from_slice(self.as_slice());
        log::trace!(
            "back vec grown from {} to {} bytes ({} used)",
            self.capacity(),
            end,
            len
        );
        self.inner = inner;
        self.head = head;
        self.end = end;
    }
}

impl Default for BackVec {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for BackVec {
    fn clone(&self) -> BackVec {
        let mut v = BackVec::with_capacity(self.len());
        v.push_front(self.as_slice());
        v
    }
}

impl std::fmt::Debug for BackVec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackVec")
            .field("len", &self.len())
            .field("cap", &self.capacity())
            .field("head", &self.head)
            .field("internal_cap", &self.inner.capacity())
            .finish_non_exhaustive()
    }
}
