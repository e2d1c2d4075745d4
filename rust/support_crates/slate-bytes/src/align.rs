/// Aligns a number up to the next multiple of the specified alignment.
///
/// # Arguments
///
/// * `n` - The number to align up
/// * `alignment` - The alignment boundary (must be a power of 2 and non-zero)
///
/// # Examples
///
/// ```
/// use slate_bytes::align::align_up;
///
/// assert_eq!(align_up(0, 8), 0);
/// assert_eq!(align_up(1, 8), 8);
/// assert_eq!(align_up(8, 8), 8);
/// assert_eq!(align_up(9, 8), 16);
/// ```
///
/// # Panics
///
/// Panics in debug builds if `alignment` is 0 or not a power of 2.
#[inline]
pub fn align_up(n: usize, alignment: usize) -> usize {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    (n + alignment - 1) & !(alignment - 1)
}

/// Aligns a number down to the previous multiple of the specified alignment.
///
/// # Examples
///
/// ```
/// use slate_bytes::align::align_down;
///
/// assert_eq!(align_down(0, 8), 0);
/// assert_eq!(align_down(7, 8), 0);
/// assert_eq!(align_down(9, 8), 8);
/// assert_eq!(align_down(16, 8), 16);
/// ```
#[inline]
pub fn align_down(n: usize, alignment: usize) -> usize {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    n & !(alignment - 1)
}

/// Checks if a number is aligned to the specified alignment boundary.
///
/// # Examples
///
/// ```
/// use slate_bytes::align::is_aligned;
///
/// assert!(is_aligned(0, 8));
/// assert!(!is_aligned(7, 8));
/// assert!(is_aligned(16, 8));
/// ```
#[inline]
pub fn is_aligned(n: usize, alignment: usize) -> bool {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    (n & (alignment - 1)) == 0
}

/// Number of padding bytes to prepend to a back-to-front buffer currently holding
/// `len` bytes, so that a value of `alignment` bytes written next ends up aligned
/// relative to the end of the buffer.
///
/// # Examples
///
/// ```
/// use slate_bytes::align::back_padding;
///
/// assert_eq!(back_padding(0, 4), 0);
/// assert_eq!(back_padding(5, 4), 3);
/// assert_eq!(back_padding(6, 8), 2);
/// assert_eq!(back_padding(12, 4), 0);
/// ```
#[inline]
pub fn back_padding(len: usize, alignment: usize) -> usize {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    len.wrapping_neg() & (alignment - 1)
}

/// Checks whether a pointer is aligned to the specified alignment.
#[inline]
pub fn is_ptr_aligned(ptr: *const u8, alignment: usize) -> bool {
    is_aligned(ptr as usize, alignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_padding_makes_total_aligned() {
        for alignment in [1usize, 2, 4, 8, 16] {
            for len in 0..64usize {
                let pad = back_padding(len, alignment);
                assert!(pad < alignment);
                assert!(is_aligned(len + pad, alignment));
            }
        }
    }

    #[test]
    fn test_align_up_down_bracket() {
        for n in 0..100usize {
            assert!(align_down(n, 4) <= n);
            assert!(align_up(n, 4) >= n);
            assert!(align_up(n, 4) - align_down(n, 4) <= 4);
        }
    }
}
