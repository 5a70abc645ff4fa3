/// Alignment every block handed out by this crate satisfies.
///
/// Matches the guarantee of the platform `malloc` (two machine words), so
/// arena blocks and heap blocks can hold the same element types.
pub const BLOCK_ALIGN: usize = 2 * ::core::mem::size_of::<usize>();

/// Rounds `value` up to the next multiple of the machine word size.
///
/// # Examples
///
/// ```rust
/// use std::mem;
/// use blockstd::align;
///
/// match mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align_to!($value, ::core::mem::size_of::<usize>())
  };
}

/// Rounds `value` up to the next multiple of `align`, which must be a power
/// of two.
///
/// ```rust
/// use blockstd::align_to;
///
/// assert_eq!(align_to!(17, 16), 32);
/// assert_eq!(align_to!(32, 16), 32);
/// assert_eq!(align_to!(0, 16), 0);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $align:expr) => {
    (($value + $align - 1) & !($align - 1))
  };
}
