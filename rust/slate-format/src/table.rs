//! Read access to tables inside a finished buffer.

use slate_common::{Error, result::Result, verify_data};

use crate::{
    FILE_IDENTIFIER_LENGTH, MIN_BUFFER_SIZE, SIZE_SOFFSET, SIZE_UOFFSET, VTABLE_HEADER_SIZE,
    adapter::FlatTable,
    follow::{Follow, check_range, follow_uoffset, read_scalar},
    offset::{AnyTable, Offset},
    scalar::Scalar,
    vector::Vector,
    vtable::VTable,
};

/// Positions of a table and its vtable, validated against a specific buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TableLayout {
    pub loc: usize,
    pub vtable_loc: usize,
    pub vtable_size: usize,
    pub object_size: usize,
}

/// A view of one table inside a buffer.
///
/// Construction validates the table header and its vtable; individual field
/// reads validate the field's own extent. Fields are decoded on demand and
/// strings, byte vectors and nested tables borrow directly from the buffer.
#[derive(Clone, Copy)]
pub struct Table<'a> {
    buf: &'a [u8],
    layout: TableLayout,
}

impl<'a> Table<'a> {
    /// Opens the table starting at absolute position `loc`.
    pub fn new(buf: &'a [u8], loc: usize) -> Result<Table<'a>> {
        let soffset = read_scalar::<i32>(buf, loc, "table soffset")?;
        let vtable_loc = usize::try_from(loc as i64 - soffset as i64).map_err(|_| {
            Error::invalid_format("vtable", format!("soffset {soffset} points before the buffer"))
        })?;
        let vtable_size = read_scalar::<u16>(buf, vtable_loc, "vtable")? as usize;
        let object_size = read_scalar::<u16>(buf, vtable_loc + 2, "vtable")? as usize;
        verify_data!(vtable_size, vtable_size >= VTABLE_HEADER_SIZE);
        verify_data!(vtable_size, vtable_size % 2 == 0);
        verify_data!(object_size, object_size >= SIZE_SOFFSET);
        check_range(buf, vtable_loc, vtable_size, "vtable")?;
        check_range(buf, loc, object_size, "table")?;
        Ok(Table {
            buf,
            layout: TableLayout {
                loc,
                vtable_loc,
                vtable_size,
                object_size,
            },
        })
    }

    /// Rebuilds a table from a layout previously validated against the same bytes.
    pub(crate) fn from_layout(buf: &'a [u8], layout: TableLayout) -> Table<'a> {
        debug_assert!(layout.loc + layout.object_size <= buf.len());
        Table { buf, layout }
    }

    pub(crate) fn layout(&self) -> TableLayout {
        self.layout
    }

    /// The buffer the table lives in.
    pub fn buf(&self) -> &'a [u8] {
        self.buf
    }

    /// Absolute position of the table in the buffer.
    pub fn loc(&self) -> usize {
        self.layout.loc
    }

    pub fn vtable(&self) -> VTable<'a> {
        VTable::from_validated(
            self.buf,
            self.layout.vtable_loc,
            self.layout.vtable_size,
            self.layout.object_size,
        )
    }

    /// Returns `true` if the buffer stores a value for `slot`.
    ///
    /// A scalar equal to its default is usually not stored, so `false` does not
    /// mean the logical value is missing.
    pub fn has_field(&self, slot: u16) -> bool {
        self.vtable().entry(slot) != 0
    }

    /// Absolute position of the value stored in `slot`, if any, after checking
    /// that `size` bytes of it fit in the object.
    fn field_loc(&self, slot: u16, size: usize) -> Result<Option<usize>> {
        let voffset = self.vtable().entry(slot) as usize;
        if voffset == 0 {
            return Ok(None);
        }
        if voffset < SIZE_SOFFSET || voffset + size > self.layout.object_size {
            return Err(Error::invalid_format(
                "table field",
                format!(
                    "slot {slot} at {voffset} (size {size}) exceeds the object size {}",
                    self.layout.object_size
                ),
            ));
        }
        Ok(Some(self.layout.loc + voffset))
    }

    /// Reads a scalar field, substituting `default` when it is absent.
    pub fn field<T: Scalar>(&self, slot: u16, default: T) -> Result<T> {
        Ok(self.field_opt(slot)?.unwrap_or(default))
    }

    /// Reads a scalar field, returning `None` when it is absent.
    pub fn field_opt<T: Scalar>(&self, slot: u16) -> Result<Option<T>> {
        Ok(self
            .field_loc(slot, T::SIZE)?
            .map(|loc| T::read_le(&self.buf[loc..])))
    }

    /// Decodes the field in `slot` as a `T`, following offsets as needed.
    pub fn follow<T: Follow<'a>>(&self, slot: u16) -> Result<Option<T::Inner>> {
        match self.field_loc(slot, T::INLINE_SIZE)? {
            Some(loc) => T::follow(self.buf, loc).map(Some),
            None => Ok(None),
        }
    }

    pub fn string(&self, slot: u16) -> Result<Option<&'a str>> {
        self.follow::<Offset<str>>(slot)
    }

    /// Reads a string or byte vector field as raw bytes, without UTF-8 validation.
    pub fn bytes(&self, slot: u16) -> Result<Option<&'a [u8]>> {
        Ok(self.vector::<u8>(slot)?.map(|v| v.bytes()))
    }

    pub fn vector<T: Follow<'a>>(&self, slot: u16) -> Result<Option<Vector<'a, T>>> {
        self.follow::<Offset<[T]>>(slot)
    }

    pub fn table(&self, slot: u16) -> Result<Option<Table<'a>>> {
        self.follow::<Offset<AnyTable>>(slot)
    }

    /// Reads a union stored as a `u8` type tag in `type_slot` and a table in `value_slot`.
    ///
    /// Returns `None` for the tag `0` (no value). A non-zero tag without a value
    /// is a format error.
    pub fn union(&self, type_slot: u16, value_slot: u16) -> Result<Option<(u8, Table<'a>)>> {
        let tag = self.field::<u8>(type_slot, 0)?;
        if tag == 0 {
            return Ok(None);
        }
        match self.table(value_slot)? {
            Some(table) => Ok(Some((tag, table))),
            None => Err(Error::invalid_format(
                "union",
                format!("type tag {tag} is set in slot {type_slot} but slot {value_slot} is empty"),
            )),
        }
    }
}

impl std::fmt::Debug for Table<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("loc", &self.layout.loc)
            .field("vtable", &self.vtable())
            .finish()
    }
}

/// Opens the root table of a buffer produced by
/// [`Builder::finish`](crate::builder::Builder::finish).
pub fn root_table(buf: &[u8]) -> Result<Table<'_>> {
    if buf.len() < MIN_BUFFER_SIZE {
        return Err(Error::invalid_format(
            "buffer",
            format!(
                "{} bytes is shorter than the minimal message of {MIN_BUFFER_SIZE} bytes",
                buf.len()
            ),
        ));
    }
    let loc = follow_uoffset(buf, 0, "root offset")?;
    Table::new(buf, loc)
}

/// Opens the root table of a buffer produced by
/// [`Builder::finish_size_prefixed`](crate::builder::Builder::finish_size_prefixed).
///
/// The returned table is confined to the length recorded in the prefix; trailing
/// bytes after it are ignored.
pub fn size_prefixed_root_table(buf: &[u8]) -> Result<Table<'_>> {
    let size = read_scalar::<u32>(buf, 0, "size prefix")? as usize;
    check_range(buf, SIZE_UOFFSET, size, "size-prefixed buffer")?;
    root_table(&buf[SIZE_UOFFSET..SIZE_UOFFSET + size])
}

/// Opens the root table of `buf` as a `T`.
pub fn root<'a, T: FlatTable<'a>>(buf: &'a [u8]) -> Result<T> {
    root_table(buf).map(T::from_table)
}

/// Size-prefixed counterpart of [`root`].
pub fn size_prefixed_root<'a, T: FlatTable<'a>>(buf: &'a [u8]) -> Result<T> {
    size_prefixed_root_table(buf).map(T::from_table)
}

/// Returns `true` if the buffer carries `identifier` right after its root offset.
pub fn buffer_has_identifier(
    buf: &[u8],
    identifier: &[u8; FILE_IDENTIFIER_LENGTH],
    size_prefixed: bool,
) -> bool {
    let start = if size_prefixed { SIZE_UOFFSET } else { 0 } + SIZE_UOFFSET;
    buf.get(start..start + FILE_IDENTIFIER_LENGTH) == Some(&identifier[..])
}
