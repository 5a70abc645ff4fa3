use std::cell::RefCell;

use libc::{c_void, calloc, free};
use rustc_hash::FxHashMap;

use crate::{allocator::Allocator, block::MemoryBlock, error::AllocError};

/// An allocator backed by the C heap.
///
/// Every block is an independent `calloc` and can be released on its own.
/// The allocator remembers the address and size of each live block, which
/// lets [`Allocator::free`] turn away blocks it never issued and blocks that
/// were already released instead of handing them to `free(3)`.
///
/// ```text
///   HeapAllocator
///   ┌──────────────────────────┐
///   │ live: addr -> size       │       C heap
///   │  0x7f..10 -> 24  ────────┼────► [24 bytes]
///   │  0x7f..90 -> 4096 ───────┼────► [4096 bytes]
///   └──────────────────────────┘
/// ```
pub struct HeapAllocator {
  live: RefCell<FxHashMap<usize, usize>>,
}

impl HeapAllocator {
  pub fn new() -> Self {
    Self {
      live: RefCell::new(FxHashMap::default()),
    }
  }

  /// Number of blocks issued and not yet freed.
  pub fn live_blocks(&self) -> usize {
    self.live.borrow().len()
  }

  /// Total size of the blocks issued and not yet freed.
  pub fn live_bytes(&self) -> usize {
    self.live.borrow().values().sum()
  }
}

impl Default for HeapAllocator {
  fn default() -> Self {
    Self::new()
  }
}

impl Allocator for HeapAllocator {
  fn allocate(
    &self,
    bytes: usize,
  ) -> Result<MemoryBlock, AllocError> {
    if bytes == 0 {
      return Ok(MemoryBlock::empty());
    }

    let data = unsafe { calloc(bytes, 1) } as *mut u8;

    if data.is_null() {
      log::warn!("heap allocation of {bytes} bytes failed");
      return Err(AllocError::OutOfMemory { requested: bytes });
    }

    self.live.borrow_mut().insert(data as usize, bytes);
    log::trace!("heap allocated {bytes} bytes at {data:?}");

    Ok(unsafe { MemoryBlock::from_raw_parts(data, bytes) })
  }

  fn free(
    &self,
    block: &mut MemoryBlock,
  ) -> bool {
    if block.is_empty() {
      return false;
    }

    let addr = block.data() as usize;
    let issued = self.live.borrow().get(&addr).copied();

    if issued != Some(block.size()) {
      log::warn!(
        "rejected free of {} bytes at {:?}: not a live block of this heap allocator",
        block.size(),
        block.data()
      );
      return false;
    }

    self.live.borrow_mut().remove(&addr);
    unsafe { free(block.data() as *mut c_void) };
    log::trace!("heap freed {} bytes at {:?}", block.size(), block.data());
    block.invalidate();

    true
  }

  fn reset(&mut self) {}
}

impl Drop for HeapAllocator {
  fn drop(&mut self) {
    let live = self.live.get_mut();

    if !live.is_empty() {
      log::warn!(
        "heap allocator dropped with {} live blocks, releasing them",
        live.len()
      );
    }

    for (addr, _) in live.drain() {
      unsafe { free(addr as *mut c_void) };
    }
  }
}
