use std::{
  fmt,
  ops::{Deref, DerefMut},
};

/// A fixed-capacity array stored inline, holding at most `N` elements.
///
/// It never allocates. Pushing past `N` is a bounds violation and panics.
#[derive(Clone)]
pub struct StaticArray<T: Copy + Default, const N: usize> {
  vals: [T; N],
  count: usize,
}

impl<T: Copy + Default, const N: usize> StaticArray<T, N> {
  pub fn new() -> Self {
    Self {
      vals: [T::default(); N],
      count: 0,
    }
  }

  pub fn len(&self) -> usize {
    self.count
  }

  pub fn is_empty(&self) -> bool {
    self.count == 0
  }

  pub const fn capacity(&self) -> usize {
    N
  }

  pub fn is_full(&self) -> bool {
    self.count == N
  }

  /// # Panics
  ///
  /// Panics if the array already holds `N` elements.
  #[track_caller]
  pub fn push_back(
    &mut self,
    value: T,
  ) {
    assert!(self.count < N, "push_back on a full StaticArray of capacity {N}");
    self.vals[self.count] = value;
    self.count += 1;
  }

  pub fn pop_back(&mut self) -> Option<T> {
    if self.count == 0 {
      return None;
    }
    self.count -= 1;
    Some(self.vals[self.count])
  }

  /// Sets the length to `len`. Slots exposed by growing hold `T::default()`.
  ///
  /// # Panics
  ///
  /// Panics if `len > N`.
  #[track_caller]
  pub fn resize(
    &mut self,
    len: usize,
  ) {
    assert!(len <= N, "resize to {len} exceeds StaticArray capacity {N}");
    if len > self.count {
      self.vals[self.count..len].fill(T::default());
    }
    self.count = len;
  }

  pub fn clear(&mut self) {
    self.count = 0;
  }

  pub fn as_slice(&self) -> &[T] {
    &self.vals[..self.count]
  }

  pub fn as_mut_slice(&mut self) -> &mut [T] {
    &mut self.vals[..self.count]
  }
}

impl<T: Copy + Default, const N: usize> Default for StaticArray<T, N> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Copy + Default, const N: usize> Deref for StaticArray<T, N> {
  type Target = [T];

  fn deref(&self) -> &[T] {
    self.as_slice()
  }
}

impl<T: Copy + Default, const N: usize> DerefMut for StaticArray<T, N> {
  fn deref_mut(&mut self) -> &mut [T] {
    self.as_mut_slice()
  }
}

impl<T: Copy + Default + fmt::Debug, const N: usize> fmt::Debug for StaticArray<T, N> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_list().entries(self.iter()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn push_until_full() {
    let mut array: StaticArray<u32, 4> = StaticArray::new();

    for i in 0..4 {
      array.push_back(i);
    }

    assert!(array.is_full());
    assert_eq!(array.capacity(), 4);
    assert_eq!(array.as_slice(), &[0, 1, 2, 3]);
  }

  #[test]
  #[should_panic(expected = "full StaticArray")]
  fn push_past_capacity_panics() {
    let mut array: StaticArray<u8, 2> = StaticArray::new();
    array.push_back(1);
    array.push_back(2);
    array.push_back(3);
  }

  #[test]
  #[should_panic(expected = "exceeds StaticArray capacity")]
  fn resize_past_capacity_panics() {
    let mut array: StaticArray<u8, 2> = StaticArray::new();
    array.resize(3);
  }

  #[test]
  fn resize_exposes_default_values() {
    let mut array: StaticArray<i32, 8> = StaticArray::new();
    array.push_back(5);
    array.push_back(6);
    array.pop_back();

    array.resize(3);

    assert_eq!(array.as_slice(), &[5, 0, 0]);
  }

  #[test]
  #[should_panic]
  fn indexing_is_checked_against_len() {
    let mut array: StaticArray<u8, 8> = StaticArray::new();
    array.push_back(1);
    let _ = array[1];
  }

  #[test]
  fn clear_and_pop() {
    let mut array: StaticArray<char, 3> = StaticArray::new();
    array.push_back('a');
    array.push_back('b');

    assert_eq!(array.pop_back(), Some('b'));
    array.clear();
    assert_eq!(array.pop_back(), None);
    assert!(array.is_empty());
  }
}
