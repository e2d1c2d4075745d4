use std::marker::PhantomData;

use slate_common::{result::Result, verify_arg};

use crate::{follow::Follow, follow::read_length_prefixed, scalar::Scalar};

/// A length-prefixed sequence of `T` inside a finished buffer.
///
/// The header and the full element region are validated on construction;
/// elements that are offsets (strings, tables, nested vectors) are validated
/// as they are followed.
pub struct Vector<'a, T> {
    buf: &'a [u8],
    /// Absolute position of the first element.
    loc: usize,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T> Clone for Vector<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Vector<'_, T> {}

impl<'a, T: Follow<'a>> Vector<'a, T> {
    /// Opens the vector whose length prefix is at absolute position `loc`.
    pub(crate) fn at(buf: &'a [u8], loc: usize) -> Result<Vector<'a, T>> {
        let (start, len) = read_length_prefixed(buf, loc, T::INLINE_SIZE, "vector")?;
        Ok(Vector {
            buf,
            loc: start,
            len,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Decodes the element at `index`.
    pub fn get(&self, index: usize) -> Result<T::Inner> {
        verify_arg!(index, index < self.len);
        T::follow(self.buf, self.loc + index * T::INLINE_SIZE)
    }

    pub fn iter(&self) -> VectorIter<'a, T> {
        VectorIter {
            vector: *self,
            index: 0,
        }
    }

    /// The raw bytes of the element region.
    pub fn bytes(&self) -> &'a [u8] {
        &self.buf[self.loc..self.loc + self.len * T::INLINE_SIZE]
    }

    /// Decodes all elements into a `Vec`, failing on the first malformed one.
    pub fn to_vec(&self) -> Result<Vec<T::Inner>> {
        self.iter().collect()
    }
}

impl<'a, T: Scalar + bytemuck::Pod> Vector<'a, T> {
    /// Views the elements as a native slice without copying.
    ///
    /// Returns `None` on big-endian targets, and when the element region is not
    /// aligned in memory (which can happen for buffers that were not produced
    /// into an aligned allocation).
    pub fn as_slice(&self) -> Option<&'a [T]> {
        if cfg!(target_endian = "big") {
            return None;
        }
        bytemuck::try_cast_slice(self.bytes()).ok()
    }
}

impl<'a, T: Follow<'a>> IntoIterator for Vector<'a, T> {
    type Item = Result<T::Inner>;
    type IntoIter = VectorIter<'a, T>;

    fn into_iter(self) -> VectorIter<'a, T> {
        self.iter()
    }
}

impl<'a, T: Follow<'a>> std::fmt::Debug for Vector<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vector")
            .field("loc", &self.loc)
            .field("len", &self.len)
            .finish()
    }
}

/// Iterator over the decoded elements of a [`Vector`].
pub struct VectorIter<'a, T> {
    vector: Vector<'a, T>,
    index: usize,
}

impl<'a, T: Follow<'a>> Iterator for VectorIter<'a, T> {
    type Item = Result<T::Inner>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.vector.len {
            return None;
        }
        let loc = self.vector.loc + self.index * T::INLINE_SIZE;
        self.index += 1;
        Some(T::follow(self.vector.buf, loc))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vector.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<'a, T: Follow<'a>> ExactSizeIterator for VectorIter<'a, T> {}
