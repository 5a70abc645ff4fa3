use std::{cell::Cell, ptr};

use libc::{c_void, calloc, free};

use crate::{
  align::BLOCK_ALIGN,
  align_to,
  allocator::Allocator,
  block::{MemoryBlock, is_block_inside},
  error::AllocError,
};

/// A bump-pointer allocator over one fixed, upfront heap allocation.
///
/// ```text
///   base                                              base + capacity
///   ┌──────┬──┬────────┬──┬─────┬─────────────────────────────┐
///   │  A1  │░░│   A2   │░░│ A3  │          free               │
///   └──────┴──┴────────┴──┴─────┴─────────────────────────────┘
///                                ▲
///                              offset         ░ = alignment padding
/// ```
///
/// Each allocation starts at the next [`BLOCK_ALIGN`] boundary after
/// `offset` and moves `offset` past its end. The arena never grows: a
/// request that does not fit fails with [`AllocError::ArenaExhausted`].
///
/// [`Allocator::free`] only checks that the block lies inside the arena and
/// invalidates it; the space is not returned. Blocks are leases that are
/// reclaimed all at once by [`Allocator::reset`].
pub struct ArenaAllocator {
  arena: MemoryBlock,
  offset: Cell<usize>,
}

impl ArenaAllocator {
  /// Creates an arena with room for `capacity` bytes, zero-filled.
  pub fn new(capacity: usize) -> Result<Self, AllocError> {
    let arena = if capacity == 0 {
      MemoryBlock::empty()
    } else {
      let data = unsafe { calloc(capacity, 1) } as *mut u8;
      if data.is_null() {
        return Err(AllocError::OutOfMemory {
          requested: capacity,
        });
      }
      unsafe { MemoryBlock::from_raw_parts(data, capacity) }
    };

    log::debug!("created arena of {capacity} bytes at {:?}", arena.data());

    Ok(Self {
      arena,
      offset: Cell::new(0),
    })
  }

  pub fn capacity(&self) -> usize {
    self.arena.size()
  }

  /// Bytes consumed so far, including alignment padding.
  pub fn used(&self) -> usize {
    self.offset.get()
  }

  pub fn remaining(&self) -> usize {
    self.capacity() - self.used()
  }

  /// Returns whether `block` lies inside this arena's backing allocation.
  pub fn contains(
    &self,
    block: &MemoryBlock,
  ) -> bool {
    is_block_inside(&self.arena, block)
  }
}

impl Allocator for ArenaAllocator {
  fn allocate(
    &self,
    bytes: usize,
  ) -> Result<MemoryBlock, AllocError> {
    if bytes == 0 {
      return Ok(MemoryBlock::empty());
    }

    let exhausted = AllocError::ArenaExhausted {
      requested: bytes,
      remaining: self.remaining(),
    };

    if self.arena.is_empty() {
      return Err(exhausted);
    }

    let base = self.arena.data() as usize;
    let start = align_to!(base + self.offset.get(), BLOCK_ALIGN) - base;

    match start.checked_add(bytes) {
      Some(end) if end <= self.capacity() => {
        let data = unsafe { self.arena.data().add(start) };
        unsafe { ptr::write_bytes(data, 0, bytes) };
        self.offset.set(end);

        log::trace!("arena allocated {bytes} bytes at offset {start}");

        Ok(unsafe { MemoryBlock::from_raw_parts(data, bytes) })
      }
      _ => Err(exhausted),
    }
  }

  fn free(
    &self,
    block: &mut MemoryBlock,
  ) -> bool {
    if !self.contains(block) {
      if !block.is_empty() {
        log::warn!(
          "rejected free of {} bytes at {:?}: block is outside the arena",
          block.size(),
          block.data()
        );
      }
      return false;
    }

    // Space comes back only on reset.
    block.invalidate();
    true
  }

  fn reset(&mut self) {
    log::debug!("resetting arena, reclaiming {} bytes", self.offset.get());
    self.offset.set(0);
  }
}

impl Drop for ArenaAllocator {
  fn drop(&mut self) {
    if !self.arena.is_empty() {
      unsafe { free(self.arena.data() as *mut c_void) };
      self.arena.invalidate();
    }
  }
}
