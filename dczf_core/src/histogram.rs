//! Byte-frequency counting over a chunk buffer.

/// Counts occurrences of each byte value in `buf`.
///
/// Single pass, no allocation beyond the returned array. Safe to call on an
/// empty slice, which yields all zeros.
///
/// # Examples
///
/// ```
/// use dczf_core::histogram::histogram;
/// let freq = histogram(&[0u8, 255, 0]);
/// assert_eq!(freq[0], 2);
/// assert_eq!(freq[255], 1);
/// ```
pub fn histogram(buf: &[u8]) -> [u64; 256] {
    let mut freq = [0u64; 256];
    for &byte in buf {
        freq[byte as usize] += 1;
    }
    freq
}
