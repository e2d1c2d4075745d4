//! Traits that generated message types implement on top of [`Table`] and
//! [`Builder`], so that each message only declares its slots and defaults.

use std::marker::PhantomData;

use slate_common::{result::Result, try_or_ret_some_err};

use crate::{
    builder::Builder,
    follow::Follow,
    offset::{AnyTable, Offset},
    scalar::Scalar,
    table::Table,
    vector::{Vector, VectorIter},
};

/// A typed view over a [`Table`].
///
/// Implementors provide the wrapping; the provided methods cover the common
/// field reads so that accessors stay one-liners.
pub trait FlatTable<'a>: Sized {
    /// Number of slots declared by the schema for this table.
    const FIELD_COUNT: u16;

    fn from_table(table: Table<'a>) -> Self;

    fn as_table(&self) -> Table<'a>;

    fn read_field<T: Scalar>(&self, slot: u16, default: T) -> Result<T> {
        self.as_table().field(slot, default)
    }

    fn read_field_opt<T: Scalar>(&self, slot: u16) -> Result<Option<T>> {
        self.as_table().field_opt(slot)
    }

    fn read_string(&self, slot: u16) -> Result<Option<&'a str>> {
        self.as_table().string(slot)
    }

    fn read_bytes(&self, slot: u16) -> Result<Option<&'a [u8]>> {
        self.as_table().bytes(slot)
    }

    fn read_vector<T: Follow<'a>>(&self, slot: u16) -> Result<Option<Vector<'a, T>>> {
        self.as_table().vector(slot)
    }

    fn read_table<U: FlatTable<'a>>(&self, slot: u16) -> Result<Option<U>> {
        Ok(self.as_table().table(slot)?.map(U::from_table))
    }

    /// Reads a vector of tables as `U` values.
    fn read_tables<U: FlatTable<'a>>(&self, slot: u16) -> Result<Option<TableIter<'a, U>>> {
        Ok(self
            .as_table()
            .vector::<Offset<AnyTable>>(slot)?
            .map(|v| v.tables()))
    }
}

/// Writes one object of type `T` into a [`Builder`].
///
/// Created with [`start`](Self::start), filled with `write_*` calls and closed
/// with [`finish`](Self::finish), which returns an offset typed for `T`.
pub struct ObjectWriter<'b, T: ?Sized> {
    builder: &'b mut Builder,
    _marker: PhantomData<fn(&T)>,
}

impl<'b, T: ?Sized> ObjectWriter<'b, T> {
    pub fn start(builder: &'b mut Builder, field_count: u16) -> Result<ObjectWriter<'b, T>> {
        builder.start_object(field_count)?;
        Ok(ObjectWriter {
            builder,
            _marker: PhantomData,
        })
    }

    pub fn write_field<V: Scalar>(&mut self, slot: u16, value: V, default: V) -> Result<()> {
        self.builder.add_scalar(slot, value, default)
    }

    pub fn write_field_opt<V: Scalar>(&mut self, slot: u16, value: Option<V>) -> Result<()> {
        self.builder.add_scalar_opt(slot, value)
    }

    pub fn write_offset<U: ?Sized>(&mut self, slot: u16, offset: Offset<U>) -> Result<()> {
        self.builder.add_offset(slot, offset)
    }

    pub fn finish(self) -> Result<Offset<T>> {
        Ok(self.builder.end_object()?.cast())
    }
}

impl<'a> Vector<'a, Offset<AnyTable>> {
    /// Iterates the tables of the vector as `T` values.
    pub fn tables<T: FlatTable<'a>>(&self) -> TableIter<'a, T> {
        TableIter {
            inner: self.iter(),
            _marker: PhantomData,
        }
    }
}

/// Iterator over a vector of tables, yielding typed views.
pub struct TableIter<'a, T> {
    inner: VectorIter<'a, Offset<AnyTable>>,
    _marker: PhantomData<T>,
}

impl<'a, T: FlatTable<'a>> Iterator for TableIter<'a, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let table = try_or_ret_some_err!(self.inner.next()?);
        Some(Ok(T::from_table(table)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, T: FlatTable<'a>> ExactSizeIterator for TableIter<'a, T> {}
