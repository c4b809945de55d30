/// Alignment quantum for every payload address and every block capacity.
pub const ALIGNMENT: usize = 16;

/// Rounds the given size up to the allocator's 16 byte alignment quantum.
/// Values that are already a multiple of 16 are left unchanged.
///
/// # Examples
///
/// ```rust
/// use flist::align;
///
/// assert_eq!(align!(16), 16);
/// assert_eq!(align!(17), 32);
/// assert_eq!(align!(100), 112);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, $crate::align::ALIGNMENT)
  };
}

/// Rounds `value` up to a multiple of `quantum`, which must be a power of two.
///
/// # Examples
///
/// ```rust
/// use flist::align_to;
///
/// assert_eq!(align_to!(13, 8), 16);
/// assert_eq!(align_to!(4096, 4096), 4096);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $quantum:expr) => {
    ($value + $quantum - 1) & !($quantum - 1)
  };
}

/// Same rounding as [`align!`] but returns `None` instead of wrapping when
/// `value` is within one quantum of `usize::MAX`.
pub fn checked_align(value: usize) -> Option<usize> {
  value
    .checked_add(ALIGNMENT - 1)
    .map(|rounded| rounded & !(ALIGNMENT - 1))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_align() {
    let mut alignments = Vec::new();

    for i in 0..10 {
      let sizes = (ALIGNMENT * i + 1)..=(ALIGNMENT * (i + 1));

      let expected_alignment = ALIGNMENT * (i + 1);

      alignments.push((sizes, expected_alignment));
    }

    for (sizes, expected) in alignments {
      for size in sizes {
        assert_eq!(expected, align!(size));
      }
    }
  }

  #[test]
  fn test_align_zero() {
    assert_eq!(align!(0usize), 0);
  }

  #[test]
  fn test_align_to() {
    assert_eq!(align_to!(1usize, 8), 8);
    assert_eq!(align_to!(8192usize, 8192), 8192);
    assert_eq!(align_to!(8193usize, 8192), 16384);
  }

  #[test]
  fn test_checked_align() {
    assert_eq!(checked_align(17), Some(32));
    assert_eq!(checked_align(usize::MAX - 15), Some(usize::MAX - 15));
    assert_eq!(checked_align(usize::MAX - 14), None);
    assert_eq!(checked_align(usize::MAX), None);
  }
}
