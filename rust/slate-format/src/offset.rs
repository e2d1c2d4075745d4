use std::marker::PhantomData;

/// Position of a previously written object, measured in bytes from the end of
/// the builder's buffer.
///
/// Offsets are handed out by the [`Builder`](crate::builder::Builder) and stay
/// valid for the lifetime of the message being built. The type parameter records
/// what the offset refers to: `str`, `[T]`, [`AnyTable`] or a concrete table adapter.
/// The value `0` is the null offset and never refers to written data.
pub struct Offset<T: ?Sized> {
    value: u32,
    _marker: PhantomData<fn(&T)>,
}

/// Marker for an offset to a table whose concrete type is not known.
pub enum AnyTable {}

impl<T: ?Sized> Offset<T> {
    #[inline]
    pub const fn new(value: u32) -> Offset<T> {
        Offset {
            value,
            _marker: PhantomData,
        }
    }

    /// The null offset, used to express an absent reference.
    #[inline]
    pub const fn null() -> Offset<T> {
        Offset::new(0)
    }

    #[inline]
    pub fn value(self) -> u32 {
        self.value
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self.value == 0
    }

    /// Reinterprets the offset as referring to a `U`.
    #[inline]
    pub fn cast<U: ?Sized>(self) -> Offset<U> {
        Offset::new(self.value)
    }
}

impl<T: ?Sized> Clone for Offset<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Offset<T> {}

impl<T: ?Sized> PartialEq for Offset<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: ?Sized> Eq for Offset<T> {}

impl<T: ?Sized> std::hash::Hash for Offset<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: ?Sized> Default for Offset<T> {
    fn default() -> Self {
        Offset::null()
    }
}

impl<T: ?Sized> std::fmt::Debug for Offset<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Offset({})", self.value)
    }
}
