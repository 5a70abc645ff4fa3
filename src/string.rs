use std::{
  borrow::Borrow,
  ffi::{CStr, c_char},
  fmt, mem,
  ops::{Deref, DerefMut},
  ptr, slice,
  str::Utf8Error,
};

use crate::{
  allocator::{Allocator, default_allocator},
  array::Array,
  block::MemoryBlock,
  error::{AllocError, alloc_failed},
};

/// An owned byte string kept in one [`MemoryBlock`], always followed by a
/// zero byte.
///
/// ```text
///   "hello" with capacity 8
///
///   ┌───┬───┬───┬───┬───┬───┬───┬───┬───┐
///   │ h │ e │ l │ l │ o │ 0 │ 0 │ 0 │ 0 │   block.size = capacity + 1
///   └───┴───┴───┴───┴───┴───┴───┴───┴───┘
///   ◄────── len ──────►
/// ```
///
/// Every byte from `len` to the end of the block is zero, so the contents
/// can be handed to C as a terminated string ([`ByteString::as_c_str`],
/// [`ByteString::as_ptr`]) without copying. The block always has one more
/// byte than [`ByteString::capacity`] reports.
///
/// Ownership and growth follow [`Array`]: one block from one allocator,
/// single-byte pushes grow to `max(8, 2 * len)`, appends grow to exactly
/// what they need.
pub struct ByteString<'a> {
  allocator: Option<&'a dyn Allocator>,
  block: MemoryBlock,
  count: usize,
}

impl ByteString<'static> {
  pub fn new() -> Self {
    Self::new_in(default_allocator())
  }
}

impl<'a> ByteString<'a> {
  pub const BASE_CAPACITY: usize = 8;

  pub fn new_in(allocator: &'a dyn Allocator) -> Self {
    Self {
      allocator: Some(allocator),
      block: MemoryBlock::empty(),
      count: 0,
    }
  }

  pub fn with_capacity_in(
    capacity: usize,
    allocator: &'a dyn Allocator,
  ) -> Self {
    let mut string = Self::new_in(allocator);
    string.reserve(capacity);
    string
  }

  pub fn from_bytes_in(
    bytes: &[u8],
    allocator: &'a dyn Allocator,
  ) -> Self {
    let mut string = Self::new_in(allocator);
    string.append(bytes);
    string
  }

  pub fn from_c_str_in(
    string: &CStr,
    allocator: &'a dyn Allocator,
  ) -> Self {
    Self::from_bytes_in(string.to_bytes(), allocator)
  }

  /// Copies a C string, measuring it by scanning for its terminator.
  ///
  /// # Safety
  ///
  /// `string` must point to a valid, zero-terminated byte sequence.
  pub unsafe fn from_ptr_in(
    string: *const c_char,
    allocator: &'a dyn Allocator,
  ) -> Self {
    Self::from_c_str_in(unsafe { CStr::from_ptr(string) }, allocator)
  }

  /// Takes ownership of `block`.
  ///
  /// The length is the number of bytes before the first zero. Anything after
  /// it is cleared, and a block with no zero byte at all is regrown by one
  /// so the terminator fits.
  ///
  /// ```rust
  /// use blockstd::{Allocator, ByteString, HeapAllocator};
  ///
  /// let heap = HeapAllocator::new();
  /// let mut block = heap.allocate(6).unwrap();
  /// (unsafe { block.as_mut_slice() })[..2].copy_from_slice(b"hi");
  ///
  /// let string = unsafe { ByteString::from_block(block, &heap) };
  /// assert_eq!(string, "hi");
  /// ```
  ///
  /// Nothing ties the block to its allocator's lifetime, so adopting one
  /// needs an `unsafe` block:
  ///
  /// ```compile_fail,E0133
  /// use blockstd::{Allocator, ArenaAllocator, ByteString};
  ///
  /// let mut arena = ArenaAllocator::new(16).unwrap();
  /// let stale = arena.allocate(16).unwrap();
  /// arena.reset();
  /// let string = ByteString::from_block(stale, &arena);
  /// ```
  ///
  /// # Safety
  ///
  /// `block` must be live and issued by `allocator`: not freed, not issued
  /// before a [`reset`](Allocator::reset) of it, and not owned by anything
  /// else. The string frees it through `allocator` when dropped.
  pub unsafe fn from_block(
    mut block: MemoryBlock,
    allocator: &'a dyn Allocator,
  ) -> Self {
    let bytes = unsafe { block.as_mut_slice() };
    let count = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    bytes[count..].fill(0);

    let mut string = Self {
      allocator: Some(allocator),
      block,
      count,
    };
    string.reserve(count);
    string
  }

  pub fn allocator(&self) -> &'a dyn Allocator {
    self.allocator.unwrap_or_else(|| default_allocator())
  }

  pub fn is_bound(&self) -> bool {
    self.allocator.is_some()
  }

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

  /// Bytes that fit before the block has to grow. The terminator's byte is
  /// not counted.
  pub fn capacity(&self) -> usize {
    self.block.size().saturating_sub(1)
  }

  pub fn as_bytes(&self) -> &[u8] {
    if self.block.is_empty() {
      return &[];
    }
    unsafe { slice::from_raw_parts(self.block.data(), self.count) }
  }

  pub fn as_bytes_mut(&mut self) -> &mut [u8] {
    if self.block.is_empty() {
      return &mut [];
    }
    unsafe { slice::from_raw_parts_mut(self.block.data(), self.count) }
  }

  /// The contents plus the trailing zero byte.
  pub fn as_bytes_with_nul(&self) -> &[u8] {
    if self.block.is_empty() {
      return b"\0";
    }
    unsafe { slice::from_raw_parts(self.block.data(), self.count + 1) }
  }

  /// Views the contents as a C string. An interior zero byte ends the view
  /// early.
  pub fn as_c_str(&self) -> &CStr {
    CStr::from_bytes_until_nul(self.as_bytes_with_nul()).unwrap_or_default()
  }

  /// Pointer to a zero-terminated copy-free view of the contents.
  pub fn as_ptr(&self) -> *const c_char {
    self.as_bytes_with_nul().as_ptr() as *const c_char
  }

  pub fn to_str(&self) -> Result<&str, Utf8Error> {
    std::str::from_utf8(self.as_bytes())
  }

  fn bind(&mut self) -> &'a dyn Allocator {
    *self.allocator.get_or_insert_with(|| default_allocator())
  }

  /// Makes room for at least `capacity` bytes plus the terminator.
  pub fn try_reserve(
    &mut self,
    capacity: usize,
  ) -> Result<(), AllocError> {
    if capacity <= self.capacity() {
      return Ok(());
    }

    let bytes = capacity
      .checked_add(1)
      .ok_or(AllocError::CapacityOverflow)?;

    let allocator = self.bind();
    let block = allocator.allocate(bytes)?;

    if self.count > 0 {
      unsafe { ptr::copy_nonoverlapping(self.block.data(), block.data(), self.count) };
    }

    let mut old = mem::replace(&mut self.block, block);
    if !old.is_empty() {
      let released = allocator.free(&mut old);
      debug_assert!(released, "string block was not issued by its own allocator");
    }

    Ok(())
  }

  pub fn reserve(
    &mut self,
    capacity: usize,
  ) {
    if let Err(err) = self.try_reserve(capacity) {
      alloc_failed(err);
    }
  }

  pub fn try_push(
    &mut self,
    byte: u8,
  ) -> Result<(), AllocError> {
    if self.count == self.capacity() {
      self.try_reserve(Self::BASE_CAPACITY.max(2 * self.count))?;
    }

    unsafe { self.block.data().add(self.count).write(byte) };
    self.count += 1;

    Ok(())
  }

  /// Appends one byte, growing to `max(8, 2 * len)` when full.
  pub fn push(
    &mut self,
    byte: u8,
  ) {
    if let Err(err) = self.try_push(byte) {
      alloc_failed(err);
    }
  }

  pub fn try_append(
    &mut self,
    bytes: impl AsRef<[u8]>,
  ) -> Result<(), AllocError> {
    let bytes = bytes.as_ref();
    if bytes.is_empty() {
      return Ok(());
    }

    let needed = self
      .count
      .checked_add(bytes.len())
      .ok_or(AllocError::CapacityOverflow)?;
    self.try_reserve(needed)?;

    unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), self.block.data().add(self.count), bytes.len()) };
    self.count = needed;

    Ok(())
  }

  /// Appends `bytes`, growing to exactly the new length when full.
  pub fn append(
    &mut self,
    bytes: impl AsRef<[u8]>,
  ) {
    if let Err(err) = self.try_append(bytes) {
      alloc_failed(err);
    }
  }

  pub fn pop(&mut self) -> Option<u8> {
    if self.count == 0 {
      return None;
    }

    self.count -= 1;
    let byte = unsafe { self.block.data().add(self.count) };
    Some(unsafe { byte.replace(0) })
  }

  /// Shortens the string to `len` bytes, zeroing what was cut off.
  pub fn truncate(
    &mut self,
    len: usize,
  ) {
    if len >= self.count {
      return;
    }

    unsafe { ptr::write_bytes(self.block.data().add(len), 0, self.count - len) };
    self.count = len;
  }

  pub fn clear(&mut self) {
    self.truncate(0);
  }

  /// Sets the length to `len`; new bytes are zero.
  pub fn resize(
    &mut self,
    len: usize,
  ) {
    if len <= self.count {
      self.truncate(len);
      return;
    }

    self.reserve(len);
    self.count = len;
  }

  /// Moves the contents out, leaving `self` empty and unbound.
  pub fn take(&mut self) -> Self {
    Self {
      allocator: self.allocator.take(),
      block: self.block.take(),
      count: mem::replace(&mut self.count, 0),
    }
  }

  fn release(&mut self) {
    self.count = 0;

    if self.block.is_empty() {
      return;
    }

    if let Some(allocator) = self.allocator {
      let released = allocator.free(&mut self.block);
      debug_assert!(released, "string block was not issued by its own allocator");
    }
    self.block = MemoryBlock::empty();
  }

  fn copy_from(
    &mut self,
    source: &Self,
  ) {
    if source.block.is_empty() {
      return;
    }

    self.block = match self.bind().allocate(source.block.size()) {
      Ok(block) => block,
      Err(err) => alloc_failed(err),
    };

    unsafe { ptr::copy_nonoverlapping(source.block.data(), self.block.data(), source.count) };
    self.count = source.count;
  }
}

impl Drop for ByteString<'_> {
  fn drop(&mut self) {
    self.release();
  }
}

impl Clone for ByteString<'_> {
  fn clone(&self) -> Self {
    let mut copy = Self {
      allocator: self.allocator,
      block: MemoryBlock::empty(),
      count: 0,
    };
    copy.copy_from(self);
    copy
  }

  fn clone_from(
    &mut self,
    source: &Self,
  ) {
    self.release();
    self.allocator = source.allocator;
    self.copy_from(source);
  }
}

impl Default for ByteString<'static> {
  fn default() -> Self {
    Self::new()
  }
}

impl Deref for ByteString<'_> {
  type Target = [u8];

  fn deref(&self) -> &[u8] {
    self.as_bytes()
  }
}

impl DerefMut for ByteString<'_> {
  fn deref_mut(&mut self) -> &mut [u8] {
    self.as_bytes_mut()
  }
}

impl AsRef<[u8]> for ByteString<'_> {
  fn as_ref(&self) -> &[u8] {
    self.as_bytes()
  }
}

impl Borrow<[u8]> for ByteString<'_> {
  fn borrow(&self) -> &[u8] {
    self.as_bytes()
  }
}

impl From<&str> for ByteString<'static> {
  fn from(string: &str) -> Self {
    Self::from_bytes_in(string.as_bytes(), default_allocator())
  }
}

impl fmt::Write for ByteString<'_> {
  fn write_str(
    &mut self,
    s: &str,
  ) -> fmt::Result {
    self.try_append(s).map_err(|_| fmt::Error)
  }
}

impl PartialEq<ByteString<'_>> for ByteString<'_> {
  fn eq(
    &self,
    other: &ByteString<'_>,
  ) -> bool {
    self.as_bytes() == other.as_bytes()
  }
}

impl Eq for ByteString<'_> {}

impl PartialEq<[u8]> for ByteString<'_> {
  fn eq(
    &self,
    other: &[u8],
  ) -> bool {
    self.as_bytes() == other
  }
}

impl PartialEq<&[u8]> for ByteString<'_> {
  fn eq(
    &self,
    other: &&[u8],
  ) -> bool {
    self.as_bytes() == *other
  }
}

impl PartialEq<str> for ByteString<'_> {
  fn eq(
    &self,
    other: &str,
  ) -> bool {
    self.as_bytes() == other.as_bytes()
  }
}

impl PartialEq<&str> for ByteString<'_> {
  fn eq(
    &self,
    other: &&str,
  ) -> bool {
    self.as_bytes() == other.as_bytes()
  }
}

impl fmt::Debug for ByteString<'_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "\"{}\"", self.as_bytes().escape_ascii())
  }
}

impl fmt::Display for ByteString<'_> {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    fmt::Display::fmt(&String::from_utf8_lossy(self.as_bytes()), f)
  }
}

/// Byte-wise equality of two strings.
pub fn compare_strings(
  a: impl AsRef<[u8]>,
  b: impl AsRef<[u8]>,
) -> bool {
  a.as_ref() == b.as_ref()
}

/// Returns the extension of a file name, starting at its last `.`.
pub fn file_extension(name: &[u8]) -> Option<&[u8]> {
  let dot = name.iter().rposition(|&b| b == b'.')?;
  Some(&name[dot..])
}

/// Joins `strings` into one newly allocated string.
///
/// When `separator` is a non-zero byte it is placed between consecutive
/// strings, never after the last one. The result is sized up front, so
/// exactly one block is allocated.
///
/// ```rust
/// use blockstd::{HeapAllocator, concat_strings};
///
/// let heap = HeapAllocator::new();
/// let joined = concat_strings(&["line1", "line2"], Some(b'\n'), &heap);
/// assert_eq!(joined, "line1\nline2");
/// ```
pub fn concat_strings<'a, S: AsRef<[u8]>>(
  strings: &[S],
  separator: Option<u8>,
  allocator: &'a dyn Allocator,
) -> ByteString<'a> {
  let separator = separator.filter(|&b| b != 0);

  let mut total: usize = strings.iter().map(|s| s.as_ref().len()).sum();
  if separator.is_some() {
    total += strings.len().saturating_sub(1);
  }

  let mut result = ByteString::with_capacity_in(total, allocator);

  for (i, string) in strings.iter().enumerate() {
    if i > 0 {
      if let Some(separator) = separator {
        result.push(separator);
      }
    }
    result.append(string);
  }

  result
}

fn segments(
  string: &[u8],
  delim: u8,
) -> impl Iterator<Item = &[u8]> + Clone {
  string.split(move |&b| b == delim).filter(|segment| !segment.is_empty())
}

fn lines(string: &[u8]) -> impl Iterator<Item = &[u8]> + Clone {
  string
    .split(|&b| b == b'\n')
    .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
    .filter(|line| !line.is_empty())
}

/// Counts the pieces first so the result array is allocated exactly once.
fn collect_exact<'s, 'a, I, T>(
  pieces: I,
  make: impl FnMut(&'s [u8]) -> T,
  allocator: &'a dyn Allocator,
) -> Array<'a, T>
where
  I: Iterator<Item = &'s [u8]> + Clone,
{
  let mut array = Array::with_capacity_in(pieces.clone().count(), allocator);
  array.extend(pieces.map(make));
  array
}

/// Splits `string` on `delim` into views of the original bytes.
///
/// Runs of delimiters, and delimiters at either end, produce no empty
/// segments.
pub fn split_string_view<'s, 'a>(
  string: &'s [u8],
  delim: u8,
  allocator: &'a dyn Allocator,
) -> Array<'a, &'s [u8]> {
  collect_exact(segments(string, delim), |segment| segment, allocator)
}

/// Splits `string` on `delim` into newly allocated strings, one block per
/// segment. Empty segments are dropped.
pub fn split_string<'a>(
  string: &[u8],
  delim: u8,
  allocator: &'a dyn Allocator,
) -> Array<'a, ByteString<'a>> {
  collect_exact(
    segments(string, delim),
    |segment| ByteString::from_bytes_in(segment, allocator),
    allocator,
  )
}

/// Splits `string` into lines as views. A trailing `\r` is not part of the
/// line, and blank lines are dropped.
pub fn split_lines_view<'s, 'a>(
  string: &'s [u8],
  allocator: &'a dyn Allocator,
) -> Array<'a, &'s [u8]> {
  collect_exact(lines(string), |line| line, allocator)
}

/// Splits `string` into newly allocated lines. A trailing `\r` is not part
/// of the line, and blank lines are dropped.
pub fn split_lines<'a>(
  string: &[u8],
  allocator: &'a dyn Allocator,
) -> Array<'a, ByteString<'a>> {
  collect_exact(
    lines(string),
    |line| ByteString::from_bytes_in(line, allocator),
    allocator,
  )
}
