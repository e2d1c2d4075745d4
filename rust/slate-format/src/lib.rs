//! Zero-copy table serialization: a back-to-front [`Builder`](builder::Builder)
//! producing FlatBuffers-compatible buffers, and bounds-checked accessors
//! ([`Table`](table::Table), [`Vector`](vector::Vector)) reading fields in place.
//!
//! The generated-style adapters for concrete message types live in [`defs`].

pub mod adapter;
pub mod builder;
pub mod defs;
pub mod follow;
pub mod offset;
pub mod options;
pub mod owned;
pub mod scalar;
pub mod table;
pub mod vector;
pub mod vtable;
#[cfg(test)]
mod tests;

pub use adapter::{FlatTable, ObjectWriter, TableIter};
pub use builder::Builder;
pub use follow::Follow;
pub use offset::{AnyTable, Offset};
pub use options::BuilderOptions;
pub use owned::OwnedRoot;
pub use scalar::Scalar;
pub use table::{
    Table, buffer_has_identifier, root, root_table, size_prefixed_root, size_prefixed_root_table,
};
pub use vector::{Vector, VectorIter};
pub use vtable::{VTable, VTableStats};

pub use slate_bytes::Bytes;
pub use slate_common::{Error, ErrorClass, ErrorKind, Result};

/// Size of an unsigned forward offset (`uoffset`).
pub const SIZE_UOFFSET: usize = 4;

/// Size of the signed offset from a table to its vtable (`soffset`).
pub const SIZE_SOFFSET: usize = 4;

/// Size of a vtable entry (`voffset`).
pub const SIZE_VOFFSET: usize = 2;

/// Length of the optional file identifier following the root offset.
pub const FILE_IDENTIFIER_LENGTH: usize = 4;

/// Size of the vtable header: the vtable length and the inline object length.
pub const VTABLE_HEADER_SIZE: usize = 2 * SIZE_VOFFSET;

/// Largest number of slots a single table can declare; bounded by the `u16`
/// length of its vtable.
pub const MAX_FIELD_COUNT: u16 = ((u16::MAX as usize - VTABLE_HEADER_SIZE) / SIZE_VOFFSET) as u16;

/// Largest buffer a builder will produce. Offsets are stored as 32-bit values
/// and soffsets are signed, so the format cannot address more.
pub const MAX_BUFFER_SIZE: usize = i32::MAX as usize;

/// Smallest buffer that can hold a root offset, a table and its vtable.
pub const MIN_BUFFER_SIZE: usize = SIZE_UOFFSET + SIZE_SOFFSET + VTABLE_HEADER_SIZE;
