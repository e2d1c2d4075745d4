//! Byte buffers for the Slate serialization runtime: a back-to-front growable
//! arena used while building a message, and a shared immutable buffer holding
//! finished messages.

use std::{
    ops::{Range, RangeBounds},
    sync::Arc,
};

pub mod align;
pub mod back_vec;

pub use back_vec::BackVec;

/// A contiguous, immutable memory region that can be shared with other buffers and across
/// thread boundaries.
///
/// `Bytes` can be sliced and cloned without copying the underlying data.
///
/// When produced by [`BackVec::into_bytes`] or [`Bytes::copy_from_slice`], the end of
/// the region is 16-byte aligned in memory.
#[derive(Clone)]
pub struct Bytes {
    owner: Arc<Vec<u8>>,
    start: usize,
    end: usize,
}

impl Bytes {
    /// Creates a new empty `Bytes`.
    #[inline]
    pub fn new() -> Self {
        Bytes {
            owner: Arc::new(Vec::new()),
            start: 0,
            end: 0,
        }
    }

    /// Creates a new `Bytes` by copying data from a slice.
    pub fn copy_from_slice(data: &[u8]) -> Bytes {
        let mut vec = BackVec::with_capacity(data.len());
        vec.push_front(data);
        vec.into_bytes()
    }

    pub(crate) fn from_parts(owner: Vec<u8>, range: Range<usize>) -> Bytes {
        assert!(range.start <= range.end && range.end <= owner.len());
        Bytes {
            owner: Arc::new(owner),
            start: range.start,
            end: range.end,
        }
    }

    /// Returns the length of the `Bytes`.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the `Bytes` is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns a reference to the contents as a byte slice.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.owner[self.start..self.end]
    }

    /// Creates a new `Bytes` by slicing the current `Bytes` within the given range.
    ///
    /// This operation is zero-copy; it does not allocate new memory.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Bytes {
        let range = self.verify_range(range);
        Bytes {
            owner: self.owner.clone(),
            start: self.start + range.start,
            end: self.start + range.end,
        }
    }

    fn verify_range(&self, range: impl RangeBounds<usize>) -> Range<usize> {
        use std::ops::Bound;

        let len = self.len();
        let start = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n.checked_add(1).expect("out of range"),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&n) => n.checked_add(1).expect("out of range"),
            Bound::Excluded(&n) => n,
            Bound::Unbounded => len,
        };
        assert!(
            start <= end,
            "range start must not be greater than end: {start:?} <= {end:?}",
        );
        assert!(end <= len, "range end out of bounds: {end:?} <= {len:?}");
        start..end
    }
}

impl std::ops::Deref for Bytes {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Default for Bytes {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Bytes {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Bytes {}

impl std::fmt::Debug for Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bytes")
            .field("len", &self.len())
            .field("start", &self.start)
            .finish_non_exhaustive()
    }
}

impl From<BackVec> for Bytes {
    fn from(vec: BackVec) -> Self {
        vec.into_bytes()
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(vec: Vec<u8>) -> Self {
        let len = vec.len();
        Bytes::from_parts(vec, 0..len)
    }
}

impl From<&[u8]> for Bytes {
    fn from(s: &[u8]) -> Self {
        Self::copy_from_slice(s)
    }
}
