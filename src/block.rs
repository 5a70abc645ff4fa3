use std::{ptr, slice};

/// A contiguous byte range handed out by an [`Allocator`](crate::Allocator).
///
/// A block is a capability token, not a smart pointer: it does not free
/// itself and it is only meaningful relative to the allocator that produced
/// it. The empty block has a null `data` pointer and a `size` of zero, and
/// those two facts always go together.
///
/// ```text
///   MemoryBlock { data, size }
///
///   data ──►┌────┬────┬────┬─────────┬────┐
///           │ b0 │ b1 │ b2 │   ...   │    │
///           └────┴────┴────┴─────────┴────┘
///           ◄──────────── size ────────────►
/// ```
///
/// Blocks are deliberately neither `Clone` nor `Copy`; duplicating a token
/// is an explicit [`MemoryBlock::from_raw_parts`] call.
#[derive(Debug, PartialEq, Eq)]
pub struct MemoryBlock {
  data: *mut u8,
  size: usize,
}

impl MemoryBlock {
  /// The empty block.
  pub const fn empty() -> Self {
    Self {
      data: ptr::null_mut(),
      size: 0,
    }
  }

  /// Builds a block from a raw pointer and a size.
  ///
  /// # Safety
  ///
  /// `data` must point to `size` bytes that stay valid for as long as the
  /// block is used, and `data` must be null exactly when `size` is zero.
  pub const unsafe fn from_raw_parts(
    data: *mut u8,
    size: usize,
  ) -> Self {
    Self { data, size }
  }

  pub fn data(&self) -> *mut u8 {
    self.data
  }

  pub fn size(&self) -> usize {
    self.size
  }

  pub fn is_empty(&self) -> bool {
    self.data.is_null()
  }

  /// Invalidates the block in place, leaving the empty block behind.
  pub(crate) fn invalidate(&mut self) {
    self.data = ptr::null_mut();
    self.size = 0;
  }

  /// Moves the block out, leaving the empty block behind.
  pub(crate) fn take(&mut self) -> MemoryBlock {
    std::mem::take(self)
  }

  /// Views the bytes of the block.
  ///
  /// # Safety
  ///
  /// The block must still be live: not freed, and not issued by an arena
  /// that has been reset or dropped since.
  pub unsafe fn as_slice(&self) -> &[u8] {
    if self.data.is_null() {
      return &[];
    }
    unsafe { slice::from_raw_parts(self.data, self.size) }
  }

  /// Mutably views the bytes of the block.
  ///
  /// # Safety
  ///
  /// Same as [`MemoryBlock::as_slice`], and no other view of the same
  /// bytes may be alive.
  pub unsafe fn as_mut_slice(&mut self) -> &mut [u8] {
    if self.data.is_null() {
      return &mut [];
    }
    unsafe { slice::from_raw_parts_mut(self.data, self.size) }
  }
}

impl Default for MemoryBlock {
  fn default() -> Self {
    Self::empty()
  }
}

/// Returns whether `ptr` lies within `[block.data, block.data + block.size)`.
pub fn is_pointer_inside_block(
  ptr: *const u8,
  block: &MemoryBlock,
) -> bool {
  let begin = block.data as usize;
  let end = begin + block.size;
  let addr = ptr as usize;

  addr >= begin && addr < end
}

/// Returns whether `small` lies entirely inside `big`.
///
/// The empty block is never inside anything.
pub fn is_block_inside(
  big: &MemoryBlock,
  small: &MemoryBlock,
) -> bool {
  if small.is_empty() || big.is_empty() {
    return false;
  }

  let begin = big.data as usize;
  let end = begin + big.size;
  let small_begin = small.data as usize;

  small_begin >= begin && small.size <= end - small_begin.min(end)
}

/// Overwrites every byte of the block with zero.
///
/// ```compile_fail,E0133
/// use blockstd::{Allocator, HeapAllocator, block::zero_block};
///
/// let heap = HeapAllocator::new();
/// let mut block = heap.allocate(8).unwrap();
/// drop(heap);
/// zero_block(&mut block);
/// ```
///
/// # Safety
///
/// `block` must describe live, writable memory: its allocator still exists,
/// has not freed it, and has not been reset since issuing it.
pub unsafe fn zero_block(block: &mut MemoryBlock) {
  if !block.is_empty() {
    unsafe { ptr::write_bytes(block.data, 0, block.size) };
  }
}

const MEGABYTE: usize = 1024 * 1024;
const GIGABYTE: usize = 1024 * MEGABYTE;

pub fn bytes_to_megabytes(bytes: usize) -> f64 {
  bytes as f64 / MEGABYTE as f64
}

pub fn bytes_to_gigabytes(bytes: usize) -> f64 {
  bytes as f64 / GIGABYTE as f64
}

pub fn megabytes_to_bytes(megabytes: usize) -> usize {
  megabytes * MEGABYTE
}

pub fn gigabytes_to_bytes(gigabytes: usize) -> usize {
  gigabytes * GIGABYTE
}

#[cfg(test)]
mod tests {
  use super::*;

  fn block_over(bytes: &mut [u8]) -> MemoryBlock {
    unsafe { MemoryBlock::from_raw_parts(bytes.as_mut_ptr(), bytes.len()) }
  }

  #[test]
  fn empty_block_is_null_and_zero_sized() {
    let block = MemoryBlock::default();
    assert!(block.is_empty());
    assert!(block.data().is_null());
    assert_eq!(block.size(), 0);
    assert!(unsafe { block.as_slice() }.is_empty());
  }

  #[test]
  fn pointer_inside_block_is_half_open() {
    let mut storage = [0u8; 16];
    let block = block_over(&mut storage);
    let base = block.data() as *const u8;

    assert!(is_pointer_inside_block(base, &block));
    assert!(is_pointer_inside_block(unsafe { base.add(15) }, &block));
    assert!(!is_pointer_inside_block(unsafe { base.add(16) }, &block));
  }

  #[test]
  fn block_ending_at_the_boundary_is_inside() {
    let mut storage = [0u8; 16];
    let big = block_over(&mut storage);
    let tail = unsafe { MemoryBlock::from_raw_parts(big.data().add(8), 8) };
    let overhang = unsafe { MemoryBlock::from_raw_parts(big.data().add(8), 9) };

    assert!(is_block_inside(&big, &tail));
    assert!(!is_block_inside(&big, &overhang));
    assert!(!is_block_inside(&big, &MemoryBlock::empty()));
  }

  #[test]
  fn block_before_the_range_is_not_inside() {
    let mut storage = [0u8; 32];
    let big = unsafe { MemoryBlock::from_raw_parts(storage.as_mut_ptr().add(16), 16) };
    let before = unsafe { MemoryBlock::from_raw_parts(storage.as_mut_ptr(), 4) };

    assert!(!is_block_inside(&big, &before));
  }

  #[test]
  fn zero_block_clears_bytes() {
    let mut storage = [0xABu8; 8];
    let mut block = block_over(&mut storage);
    unsafe { zero_block(&mut block) };
    assert_eq!(storage, [0u8; 8]);
  }

  #[test]
  fn unit_conversions() {
    assert_eq!(megabytes_to_bytes(3), 3 * 1024 * 1024);
    assert_eq!(gigabytes_to_bytes(2), 2 * 1024 * 1024 * 1024);
    assert_eq!(bytes_to_megabytes(megabytes_to_bytes(5)), 5.0);
    assert_eq!(bytes_to_gigabytes(512 * 1024 * 1024), 0.5);
  }
}
