use std::cell::Cell;

use crate::{block::MemoryBlock, error::AllocError, heap::HeapAllocator};

/// The allocation capability every container and consumer in this crate is
/// written against.
///
/// Two strategies implement it: [`HeapAllocator`] and
/// [`ArenaAllocator`](crate::ArenaAllocator). Allocators are single-threaded
/// and keep their bookkeeping behind interior mutability, so any number of
/// containers can share one through `&dyn Allocator`.
pub trait Allocator {
  /// Allocates `bytes` zero-filled bytes.
  ///
  /// `allocate(0)` succeeds with the empty block. On failure no block is
  /// produced at all.
  fn allocate(
    &self,
    bytes: usize,
  ) -> Result<MemoryBlock, AllocError>;

  /// Releases `block` back to this allocator.
  ///
  /// Returns `false`, leaving `block` untouched, when the block was not
  /// issued by this allocator, was already freed, or is empty. On success
  /// `block` is invalidated.
  fn free(
    &self,
    block: &mut MemoryBlock,
  ) -> bool;

  /// Invalidates every block this allocator has issued.
  ///
  /// Taking `&mut self` means no container can still be borrowing the
  /// allocator when this runs. Raw blocks obtained earlier must not be
  /// dereferenced afterwards.
  fn reset(&mut self);
}

thread_local! {
  static DEFAULT_ALLOCATOR: Cell<&'static dyn Allocator> = {
    let heap: &'static dyn Allocator = Box::leak(Box::new(HeapAllocator::new()));
    Cell::new(heap)
  };
}

/// Returns the allocator containers bind to when none is given.
///
/// Each thread starts out with its own [`HeapAllocator`].
pub fn default_allocator() -> &'static dyn Allocator {
  DEFAULT_ALLOCATOR.get()
}

/// Installs `allocator` as this thread's default and returns the previous
/// one.
///
/// Intended to run once at startup, before any container is built.
/// Containers already bound to the previous default keep using it.
pub fn set_default_allocator(allocator: &'static dyn Allocator) -> &'static dyn Allocator {
  log::debug!("replacing the default allocator");
  DEFAULT_ALLOCATOR.replace(allocator)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ArenaAllocator;

  fn addr(allocator: &dyn Allocator) -> *const () {
    allocator as *const dyn Allocator as *const ()
  }

  #[test]
  fn default_allocator_is_stable_within_a_thread() {
    assert_eq!(addr(default_allocator()), addr(default_allocator()));
  }

  #[test]
  fn default_allocator_allocates_zeroed_blocks() {
    let allocator = default_allocator();
    let mut block = allocator.allocate(32).unwrap();
    assert_eq!(block.size(), 32);
    assert!(unsafe { block.as_slice() }.iter().all(|&b| b == 0));
    assert!(allocator.free(&mut block));
  }

  #[test]
  fn set_default_allocator_swaps_and_restores() {
    let arena: &'static ArenaAllocator = Box::leak(Box::new(ArenaAllocator::new(64).unwrap()));

    let previous = set_default_allocator(arena);
    assert_eq!(addr(default_allocator()), addr(arena));

    let block = default_allocator().allocate(16).unwrap();
    assert_eq!(arena.used(), 16);
    assert!(default_allocator().free(&mut { block }));

    let replaced = set_default_allocator(previous);
    assert_eq!(addr(replaced), addr(arena));
    assert_eq!(addr(default_allocator()), addr(previous));
  }

  #[test]
  fn default_is_per_thread() {
    let here = addr(default_allocator()) as usize;
    let there = std::thread::spawn(|| addr(default_allocator()) as usize)
      .join()
      .unwrap();
    assert_ne!(here, there);
  }
}
