//! Fixed-width values stored inline in tables and vectors.

/// A fixed-width little-endian value that can be stored inline.
///
/// Scalars are aligned to their own size, both when written by the builder and
/// when read back through [`Vector::as_slice`](crate::vector::Vector::as_slice).
pub trait Scalar: Copy + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Encoded size in bytes, which is also the required alignment.
    const SIZE: usize;

    /// Writes the little-endian encoding into the first `SIZE` bytes of `dst`.
    fn write_le(self, dst: &mut [u8]);

    /// Reads a value from the first `SIZE` bytes of `src`.
    fn read_le(src: &[u8]) -> Self;
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn write_le(self, dst: &mut [u8]) {
                    dst[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn read_le(src: &[u8]) -> Self {
                    let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                    bytes.copy_from_slice(&src[..Self::SIZE]);
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_scalar!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl Scalar for bool {
    const SIZE: usize = 1;

    #[inline]
    fn write_le(self, dst: &mut [u8]) {
        dst[0] = self as u8;
    }

    /// Any non-zero byte reads as `true`.
    #[inline]
    fn read_le(src: &[u8]) -> Self {
        src[0] != 0
    }
}
