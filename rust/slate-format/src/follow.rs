//! Bounds-checked primitives for reading a finished buffer, and the [`Follow`]
//! trait describing how a stored value is decoded.
//!
//! Every read goes through [`check_range`], so a corrupted or truncated buffer
//! produces an error instead of a panic.

use slate_common::{Error, result::Result};

use crate::{
    SIZE_UOFFSET,
    offset::{AnyTable, Offset},
    scalar::Scalar,
    table::Table,
    vector::Vector,
};

/// Checks that `size` bytes starting at `loc` lie inside `buf`.
#[inline]
pub(crate) fn check_range(buf: &[u8], loc: usize, size: usize, element: &str) -> Result<()> {
    match loc.checked_add(size) {
        Some(end) if end <= buf.len() => Ok(()),
        _ => Err(Error::out_of_bounds(element, loc, size, buf.len())),
    }
}

#[inline]
pub(crate) fn read_scalar<T: Scalar>(buf: &[u8], loc: usize, element: &str) -> Result<T> {
    check_range(buf, loc, T::SIZE, element)?;
    Ok(T::read_le(&buf[loc..]))
}

/// Reads the uoffset stored at `loc` and returns the absolute position it refers to.
pub(crate) fn follow_uoffset(buf: &[u8], loc: usize, element: &str) -> Result<usize> {
    let relative = read_scalar::<u32>(buf, loc, element)? as usize;
    match loc.checked_add(relative) {
        Some(target) if target < buf.len() => Ok(target),
        _ => Err(Error::out_of_bounds(element, loc, relative, buf.len())),
    }
}

/// Reads the length prefix of a vector or string at `loc` and validates that
/// `len * elem_size` bytes of payload follow it.
///
/// Returns the position of the first element and the element count.
pub(crate) fn read_length_prefixed(
    buf: &[u8],
    loc: usize,
    elem_size: usize,
    element: &str,
) -> Result<(usize, usize)> {
    let len = read_scalar::<u32>(buf, loc, element)? as usize;
    let start = loc + SIZE_UOFFSET;
    let size = len
        .checked_mul(elem_size)
        .ok_or_else(|| Error::out_of_bounds(element, start, usize::MAX, buf.len()))?;
    check_range(buf, start, size, element)?;
    Ok((start, len))
}

/// A value stored inline in a table field or vector element, together with the
/// rule for decoding it from the buffer.
///
/// Scalars decode to themselves. Offsets are followed to the referenced string,
/// vector or table.
pub trait Follow<'a> {
    /// The decoded value, possibly borrowing from the buffer.
    type Inner;

    /// Number of bytes occupied at the storage location.
    const INLINE_SIZE: usize;

    /// Decodes the value stored at `loc`.
    fn follow(buf: &'a [u8], loc: usize) -> Result<Self::Inner>;
}

impl<'a, T: Scalar> Follow<'a> for T {
    type Inner = T;

    const INLINE_SIZE: usize = T::SIZE;

    #[inline]
    fn follow(buf: &'a [u8], loc: usize) -> Result<T> {
        read_scalar(buf, loc, "scalar")
    }
}

impl<'a> Follow<'a> for Offset<str> {
    type Inner = &'a str;

    const INLINE_SIZE: usize = SIZE_UOFFSET;

    fn follow(buf: &'a [u8], loc: usize) -> Result<&'a str> {
        let target = follow_uoffset(buf, loc, "string offset")?;
        let (start, len) = read_length_prefixed(buf, target, 1, "string")?;
        std::str::from_utf8(&buf[start..start + len]).map_err(|e| Error::invalid_utf8("string", e))
    }
}

impl<'a, T: Follow<'a>> Follow<'a> for Offset<[T]> {
    type Inner = Vector<'a, T>;

    const INLINE_SIZE: usize = SIZE_UOFFSET;

    fn follow(buf: &'a [u8], loc: usize) -> Result<Vector<'a, T>> {
        let target = follow_uoffset(buf, loc, "vector offset")?;
        Vector::at(buf, target)
    }
}

impl<'a> Follow<'a> for Offset<AnyTable> {
    type Inner = Table<'a>;

    const INLINE_SIZE: usize = SIZE_UOFFSET;

    fn follow(buf: &'a [u8], loc: usize) -> Result<Table<'a>> {
        let target = follow_uoffset(buf, loc, "table offset")?;
        Table::new(buf, target)
    }
}
