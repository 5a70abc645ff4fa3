use std::{
  mem::ManuallyDrop,
  ops::{Deref, DerefMut},
};

/// Runs a closure when it goes out of scope.
///
/// The closure runs on every exit path of the enclosing scope: falling off
/// the end, an early `return`, a `?` propagating an error, or a panic
/// unwinding through. [`Defer::cancel`] disarms it.
///
/// ```rust
/// use std::cell::Cell;
/// use blockstd::defer;
///
/// let closed = Cell::new(false);
/// {
///     defer!(closed.set(true));
///     assert!(!closed.get());
/// }
/// assert!(closed.get());
/// ```
#[must_use = "a guard that is dropped immediately runs its action immediately"]
pub struct Defer<F: FnOnce()> {
  action: Option<F>,
}

impl<F: FnOnce()> Defer<F> {
  pub fn new(action: F) -> Self {
    Self {
      action: Some(action),
    }
  }

  /// Disarms the guard; the action will not run.
  pub fn cancel(mut self) {
    self.action = None;
  }
}

impl<F: FnOnce()> Drop for Defer<F> {
  fn drop(&mut self) {
    if let Some(action) = self.action.take() {
      action();
    }
  }
}

/// Defers the given statements to the end of the enclosing scope.
///
/// Multiple `defer!`s in one scope run in reverse order, like any other
/// locals being dropped.
#[macro_export]
macro_rules! defer {
  ($($body:tt)*) => {
    let _guard = $crate::Defer::new(|| {
      $($body)*;
    });
  };
}

/// Owns a resource and releases it with `release` when dropped, unless the
/// scope hands the resource on with [`Guard::into_inner`].
///
/// This is how a function acquires something mid-scope and gives it back on
/// every failure path, but returns it to the caller on success:
///
/// ```rust
/// use blockstd::{Allocator, Guard, HeapAllocator, guard};
///
/// let heap = HeapAllocator::new();
///
/// let block = guard(heap.allocate(16).unwrap(), |mut block| {
///     heap.free(&mut block);
/// });
/// assert_eq!(block.size(), 16);
/// drop(block);
///
/// assert_eq!(heap.live_blocks(), 0);
/// ```
pub struct Guard<T, F: FnOnce(T)> {
  value: ManuallyDrop<T>,
  release: ManuallyDrop<F>,
}

/// Wraps `value` in a [`Guard`] that calls `release` on it at scope exit.
pub fn guard<T, F: FnOnce(T)>(
  value: T,
  release: F,
) -> Guard<T, F> {
  Guard {
    value: ManuallyDrop::new(value),
    release: ManuallyDrop::new(release),
  }
}

impl<T, F: FnOnce(T)> Guard<T, F> {
  /// Disarms the guard and returns the resource.
  pub fn into_inner(guard: Self) -> T {
    let mut guard = ManuallyDrop::new(guard);
    unsafe {
      ManuallyDrop::drop(&mut guard.release);
      ManuallyDrop::take(&mut guard.value)
    }
  }
}

impl<T, F: FnOnce(T)> Deref for Guard<T, F> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.value
  }
}

impl<T, F: FnOnce(T)> DerefMut for Guard<T, F> {
  fn deref_mut(&mut self) -> &mut T {
    &mut self.value
  }
}

impl<T, F: FnOnce(T)> Drop for Guard<T, F> {
  fn drop(&mut self) {
    let (value, release) = unsafe { (ManuallyDrop::take(&mut self.value), ManuallyDrop::take(&mut self.release)) };
    release(value);
  }
}
