use slate_bytes::Bytes;
use slate_common::result::Result;

use crate::{
    SIZE_UOFFSET,
    adapter::FlatTable,
    table::{Table, TableLayout, root_table, size_prefixed_root_table},
};

/// A finished message that owns its bytes.
///
/// The root table is validated once, when the `OwnedRoot` is created; handing
/// out views afterwards is infallible. Cloning shares the underlying buffer, so
/// one message can be read from many threads at once.
#[derive(Clone)]
pub struct OwnedRoot {
    bytes: Bytes,
    root: TableLayout,
}

impl OwnedRoot {
    pub fn new(bytes: Bytes) -> Result<OwnedRoot> {
        let root = root_table(&bytes)?.layout();
        Ok(OwnedRoot { bytes, root })
    }

    /// Accepts a size-prefixed buffer. The prefix is stripped and the kept bytes
    /// are limited to the recorded size.
    pub fn size_prefixed(bytes: Bytes) -> Result<OwnedRoot> {
        let (len, root) = {
            let table = size_prefixed_root_table(&bytes)?;
            (table.buf().len(), table.layout())
        };
        Ok(OwnedRoot {
            bytes: bytes.slice(SIZE_UOFFSET..SIZE_UOFFSET + len),
            root,
        })
    }

    pub fn table(&self) -> Table<'_> {
        Table::from_layout(&self.bytes, self.root)
    }

    /// The root table as a `T`.
    pub fn get<'a, T: FlatTable<'a>>(&'a self) -> T {
        T::from_table(self.table())
    }

    /// The message bytes, without any size prefix.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl std::fmt::Debug for OwnedRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnedRoot")
            .field("len", &self.bytes.len())
            .field("root", &self.root.loc)
            .finish()
    }
}
