use std::{
  fmt,
  marker::PhantomData,
  mem,
  ops::{Deref, DerefMut},
  ptr, slice,
};

use bytemuck::Zeroable;

use crate::{
  align::BLOCK_ALIGN,
  allocator::{Allocator, default_allocator},
  block::MemoryBlock,
  error::{AllocError, alloc_failed},
};

/// A growable sequence that keeps its elements in one [`MemoryBlock`].
///
/// The array is bound to the allocator it was built with and every block it
/// ever owns comes from, and goes back to, that allocator.
///
/// ```text
///   Array<T>
///   ┌────────────────────┐
///   │ allocator ─────────┼──► &dyn Allocator
///   │ block.data ────────┼──► ┌────┬────┬────┬────┬────┬────┬────┬────┐
///   │ block.size         │    │ T0 │ T1 │ T2 │ T3 │    │    │    │    │
///   │ count = 4          │    └────┴────┴────┴────┴────┴────┴────┴────┘
///   └────────────────────┘    ◄──── count ─────►
///                             ◄──────────── capacity ──────────────────►
/// ```
///
/// Growing past the current capacity goes to `max(8, 2 * len)` elements,
/// with exactly one allocate, copy and free. Indexing goes through the
/// slice of live elements, so it is bounds-checked against `len`, never
/// against `capacity`.
///
/// Moving an array moves the block with it. [`Array::take`] does the same
/// through a `&mut`, leaving behind an empty array that is not bound to any
/// allocator; such an array binds to the default allocator the next time it
/// grows.
pub struct Array<'a, T> {
  allocator: Option<&'a dyn Allocator>,
  block: MemoryBlock,
  count: usize,
  _marker: PhantomData<T>,
}

impl<T> Array<'static, T> {
  /// Creates an empty array bound to the thread's default allocator.
  pub fn new() -> Self {
    Self::new_in(default_allocator())
  }
}

impl<'a, T> Array<'a, T> {
  /// Capacity of the first block an empty array allocates when pushed to.
  pub const BASE_CAPACITY: usize = 8;

  const VALID_ELEMENT: () = {
    assert!(mem::size_of::<T>() != 0, "zero-sized elements are not supported");
    assert!(mem::align_of::<T>() <= BLOCK_ALIGN, "element alignment exceeds BLOCK_ALIGN");
  };

  /// Creates an empty array bound to `allocator`. Nothing is allocated until
  /// the first element arrives.
  pub fn new_in(allocator: &'a dyn Allocator) -> Self {
    let () = Self::VALID_ELEMENT;

    Self {
      allocator: Some(allocator),
      block: MemoryBlock::empty(),
      count: 0,
      _marker: PhantomData,
    }
  }

  pub fn with_capacity_in(
    capacity: usize,
    allocator: &'a dyn Allocator,
  ) -> Self {
    let mut array = Self::new_in(allocator);
    array.reserve(capacity);
    array
  }

  /// Builds an array holding clones of `items`, sized exactly to fit them.
  pub fn from_slice_in(
    items: &[T],
    allocator: &'a dyn Allocator,
  ) -> Self
  where
    T: Clone,
  {
    let mut array = Self::with_capacity_in(items.len(), allocator);
    for item in items {
      array.push_back(item.clone());
    }
    array
  }

  /// The allocator this array draws from.
  pub fn allocator(&self) -> &'a dyn Allocator {
    self.allocator.unwrap_or_else(|| default_allocator())
  }

  /// Returns whether the array is bound to an allocator. Only a moved-from
  /// array is not.
  pub fn is_bound(&self) -> bool {
    self.allocator.is_some()
  }

  /// The block backing the array; empty until the first allocation.
  pub fn block(&self) -> &MemoryBlock {
    &self.block
  }

  pub fn len(&self) -> usize {
    self.count
  }

  /// Same as [`len`](Self::len).
  pub fn size(&self) -> usize {
    self.count
  }

  pub fn is_empty(&self) -> bool {
    self.count == 0
  }

  pub fn capacity(&self) -> usize {
    self.block.size() / mem::size_of::<T>()
  }

  pub fn as_ptr(&self) -> *const T {
    self.block.data() as *const T
  }

  pub fn as_mut_ptr(&mut self) -> *mut T {
    self.block.data() as *mut T
  }

  pub fn as_slice(&self) -> &[T] {
    if self.block.is_empty() {
      return &[];
    }
    unsafe { slice::from_raw_parts(self.as_ptr(), self.count) }
  }

  pub fn as_mut_slice(&mut self) -> &mut [T] {
    if self.block.is_empty() {
      return &mut [];
    }
    unsafe { slice::from_raw_parts_mut(self.as_mut_ptr(), self.count) }
  }

  fn bind(&mut self) -> &'a dyn Allocator {
    *self.allocator.get_or_insert_with(|| default_allocator())
  }

  /// Makes room for at least `capacity` elements.
  ///
  /// Does nothing when the array already has that much room. Otherwise
  /// allocates a block of exactly `capacity` elements, moves the live
  /// elements across and frees the old block.
  pub fn try_reserve(
    &mut self,
    capacity: usize,
  ) -> Result<(), AllocError> {
    if capacity <= self.capacity() {
      return Ok(());
    }

    let bytes = capacity
      .checked_mul(mem::size_of::<T>())
      .ok_or(AllocError::CapacityOverflow)?;

    let allocator = self.bind();
    let block = allocator.allocate(bytes)?;

    if self.count > 0 {
      unsafe { ptr::copy_nonoverlapping(self.as_ptr(), block.data() as *mut T, self.count) };
    }

    let mut old = mem::replace(&mut self.block, block);
    if !old.is_empty() {
      let released = allocator.free(&mut old);
      debug_assert!(released, "array block was not issued by its own allocator");
    }

    Ok(())
  }

  /// Like [`Array::try_reserve`], panicking if the allocation fails.
  pub fn reserve(
    &mut self,
    capacity: usize,
  ) {
    if let Err(err) = self.try_reserve(capacity) {
      alloc_failed(err);
    }
  }

  pub fn try_push_back(
    &mut self,
    value: T,
  ) -> Result<(), AllocError> {
    if self.count == self.capacity() {
      self.try_reserve(Self::BASE_CAPACITY.max(2 * self.count))?;
    }

    unsafe { self.as_mut_ptr().add(self.count).write(value) };
    self.count += 1;

    Ok(())
  }

  /// Appends `value`, growing to `max(8, 2 * len)` when full.
  ///
  /// # Panics
  ///
  /// Panics if the allocator cannot provide the larger block.
  pub fn push_back(
    &mut self,
    value: T,
  ) {
    if let Err(err) = self.try_push_back(value) {
      alloc_failed(err);
    }
  }

  /// Removes and returns the last element.
  pub fn pop_back(&mut self) -> Option<T> {
    if self.count == 0 {
      return None;
    }

    self.count -= 1;
    Some(unsafe { self.as_ptr().add(self.count).read() })
  }

  /// Drops every element past `len`. Capacity is unchanged.
  pub fn truncate(
    &mut self,
    len: usize,
  ) {
    if len >= self.count {
      return;
    }

    let tail = ptr::slice_from_raw_parts_mut(unsafe { self.as_mut_ptr().add(len) }, self.count - len);
    self.count = len;
    unsafe { ptr::drop_in_place(tail) };
  }

  pub fn clear(&mut self) {
    self.truncate(0);
  }

  /// Sets the length to `len`, filling new slots with zeroed elements.
  pub fn try_resize(
    &mut self,
    len: usize,
  ) -> Result<(), AllocError>
  where
    T: Zeroable,
  {
    if len <= self.count {
      self.truncate(len);
      return Ok(());
    }

    self.try_reserve(len)?;

    // Popped elements leave their bytes behind.
    unsafe { ptr::write_bytes(self.as_mut_ptr().add(self.count), 0, len - self.count) };
    self.count = len;

    Ok(())
  }

  pub fn resize(
    &mut self,
    len: usize,
  )
  where
    T: Zeroable,
  {
    if let Err(err) = self.try_resize(len) {
      alloc_failed(err);
    }
  }

  /// Moves the contents out, leaving `self` empty and unbound.
  ///
  /// The returned array owns the block and the allocator binding; dropping
  /// `self` afterwards releases nothing.
  pub fn take(&mut self) -> Self {
    Self {
      allocator: self.allocator.take(),
      block: self.block.take(),
      count: mem::replace(&mut self.count, 0),
      _marker: PhantomData,
    }
  }

  /// Drops the elements and hands the block back to the allocator.
  fn release(&mut self) {
    self.clear();

    if self.block.is_empty() {
      return;
    }

    if let Some(allocator) = self.allocator {
      let released = allocator.free(&mut self.block);
      debug_assert!(released, "array block was not issued by its own allocator");
    }
    self.block = MemoryBlock::empty();
  }

  /// Fills an empty, blockless array with clones of `source`, using a block
  /// the same size as the source's.
  fn clone_elements_from(
    &mut self,
    source: &Self,
  )
  where
    T: Clone,
  {
    debug_assert!(self.block.is_empty() && self.count == 0);

    if source.block.is_empty() {
      return;
    }

    self.block = match self.bind().allocate(source.block.size()) {
      Ok(block) => block,
      Err(err) => alloc_failed(err),
    };

    for item in source.iter() {
      unsafe { self.as_mut_ptr().add(self.count).write(item.clone()) };
      self.count += 1;
    }
  }
}

impl<'a, T> Drop for Array<'a, T> {
  fn drop(&mut self) {
    self.release();
  }
}

impl<'a, T: Clone> Clone for Array<'a, T> {
  /// Deep copy through the source's allocator, keeping the source's
  /// capacity.
  fn clone(&self) -> Self {
    let mut copy = Self {
      allocator: self.allocator,
      block: MemoryBlock::empty(),
      count: 0,
      _marker: PhantomData,
    };
    copy.clone_elements_from(self);
    copy
  }

  /// Releases the current block before allocating the copy, and adopts the
  /// source's allocator.
  fn clone_from(
    &mut self,
    source: &Self,
  ) {
    self.release();
    self.allocator = source.allocator;
    self.clone_elements_from(source);
  }
}

impl<T> Default for Array<'static, T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<'a, T> Deref for Array<'a, T> {
  type Target = [T];

  fn deref(&self) -> &[T] {
    self.as_slice()
  }
}

impl<'a, T> DerefMut for Array<'a, T> {
  fn deref_mut(&mut self) -> &mut [T] {
    self.as_mut_slice()
  }
}

impl<'s, 'a, T> IntoIterator for &'s Array<'a, T> {
  type Item = &'s T;
  type IntoIter = slice::Iter<'s, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.as_slice().iter()
  }
}

impl<'s, 'a, T> IntoIterator for &'s mut Array<'a, T> {
  type Item = &'s mut T;
  type IntoIter = slice::IterMut<'s, T>;

  fn into_iter(self) -> Self::IntoIter {
    self.as_mut_slice().iter_mut()
  }
}

impl<'a, T> Extend<T> for Array<'a, T> {
  fn extend<I: IntoIterator<Item = T>>(
    &mut self,
    iter: I,
  ) {
    for value in iter {
      self.push_back(value);
    }
  }
}

impl<T> FromIterator<T> for Array<'static, T> {
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    let mut array = Self::new();
    array.extend(iter);
    array
  }
}

impl<'a, 'b, T: PartialEq> PartialEq<Array<'b, T>> for Array<'a, T> {
  fn eq(
    &self,
    other: &Array<'b, T>,
  ) -> bool {
    self.as_slice() == other.as_slice()
  }
}

impl<'a, T: Eq> Eq for Array<'a, T> {}

impl<'a, T: PartialEq> PartialEq<[T]> for Array<'a, T> {
  fn eq(
    &self,
    other: &[T],
  ) -> bool {
    self.as_slice() == other
  }
}

impl<'a, T: fmt::Debug> fmt::Debug for Array<'a, T> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_list().entries(self.iter()).finish()
  }
}
