//! Whole-file reads and writes on top of [`Allocator`] blocks.

use std::{fs::File, io::Read, path::Path};

use crate::{
  allocator::Allocator,
  block::MemoryBlock,
  defer::{Guard, guard},
  error::{AllocError, Error, Result},
  string::ByteString,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathType {
  File,
  Directory,
  /// Exists, but is neither a regular file nor a directory.
  Other,
}

/// Reads a whole file into a block from `allocator`.
///
/// The block is one byte longer than the file and that last byte is zero, so
/// text files can be used as C strings directly. On failure nothing is left
/// allocated.
pub fn read_file(
  path: impl AsRef<Path>,
  allocator: &dyn Allocator,
) -> Result<MemoryBlock> {
  let path = path.as_ref();

  let mut file = File::open(path).map_err(|e| Error::io(format!("failed to open {}", path.display()), e))?;
  let len = file
    .metadata()
    .map_err(|e| Error::io(format!("failed to stat {}", path.display()), e))?
    .len();
  let len = usize::try_from(len).map_err(|_| AllocError::CapacityOverflow)?;
  let size = len.checked_add(1).ok_or(AllocError::CapacityOverflow)?;

  let mut block = guard(allocator.allocate(size)?, |mut block| {
    allocator.free(&mut block);
  });

  let contents = unsafe { block.as_mut_slice() };
  file
    .read_exact(&mut contents[..len])
    .map_err(|e| Error::io(format!("failed to read {}", path.display()), e))?;

  log::debug!("read {len} bytes from {}", path.display());

  Ok(Guard::into_inner(block))
}

/// Reads a whole text file into a [`ByteString`]. The string ends at the
/// first zero byte, if the file contains one.
pub fn read_file_to_string<'a>(
  path: impl AsRef<Path>,
  allocator: &'a dyn Allocator,
) -> Result<ByteString<'a>> {
  let block = read_file(path, allocator)?;
  // Freshly issued by `allocator` and owned by nobody else.
  Ok(unsafe { ByteString::from_block(block, allocator) })
}

/// Writes `contents` to `path`, creating or truncating the file.
pub fn write_file(
  path: impl AsRef<Path>,
  contents: impl AsRef<[u8]>,
) -> Result<()> {
  let path = path.as_ref();
  let contents = contents.as_ref();

  std::fs::write(path, contents).map_err(|e| Error::io(format!("failed to write {}", path.display()), e))?;
  log::debug!("wrote {} bytes to {}", contents.len(), path.display());

  Ok(())
}

/// Returns whether `path` names an existing regular file.
pub fn file_exists(path: impl AsRef<Path>) -> bool {
  path.as_ref().is_file()
}

pub fn file_size(path: impl AsRef<Path>) -> Result<u64> {
  let path = path.as_ref();
  let metadata = std::fs::metadata(path).map_err(|e| Error::io(format!("failed to stat {}", path.display()), e))?;
  Ok(metadata.len())
}

pub fn path_type(path: impl AsRef<Path>) -> Result<PathType> {
  let path = path.as_ref();
  let metadata = std::fs::metadata(path).map_err(|e| Error::io(format!("failed to stat {}", path.display()), e))?;

  Ok(if metadata.is_dir() {
    PathType::Directory
  } else if metadata.is_file() {
    PathType::File
  } else {
    PathType::Other
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ArenaAllocator, HeapAllocator};

  #[test]
  fn read_file_appends_a_terminator() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    write_file(&path, b"hello").unwrap();

    let heap = HeapAllocator::new();
    let mut block = read_file(&path, &heap).unwrap();

    assert_eq!(block.size(), 6);
    assert_eq!(unsafe { block.as_slice() }, b"hello\0");
    assert!(heap.free(&mut block));
  }

  #[test]
  fn read_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty");
    write_file(&path, b"").unwrap();

    let heap = HeapAllocator::new();
    let mut block = read_file(&path, &heap).unwrap();

    assert_eq!(unsafe { block.as_slice() }, b"\0");
    assert!(heap.free(&mut block));
  }

  #[test]
  fn missing_file_is_an_io_error_and_allocates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let heap = HeapAllocator::new();

    let err = read_file(dir.path().join("missing"), &heap).unwrap_err();

    assert!(matches!(err, Error::Io { .. }));
    assert!(err.to_string().starts_with("failed to open"));
    assert_eq!(heap.live_blocks(), 0);
  }

  #[test]
  fn reading_a_directory_releases_the_block() {
    let dir = tempfile::tempdir().unwrap();
    let heap = HeapAllocator::new();

    // Opening succeeds on unix; the read is what fails.
    let result = read_file(dir.path(), &heap);

    assert!(result.is_err());
    assert_eq!(heap.live_blocks(), 0);
  }

  #[test]
  fn arena_too_small_for_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big");
    write_file(&path, [7u8; 64]).unwrap();

    let arena = ArenaAllocator::new(32).unwrap();
    let err = read_file(&path, &arena).unwrap_err();

    assert!(matches!(
      err,
      Error::Alloc(AllocError::ArenaExhausted { requested: 65, .. })
    ));
  }

  #[test]
  fn read_file_to_string_adopts_the_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lines.txt");
    write_file(&path, "one\ntwo\n").unwrap();

    let heap = HeapAllocator::new();
    let text = read_file_to_string(&path, &heap).unwrap();

    assert_eq!(text, "one\ntwo\n");
    assert_eq!(heap.live_blocks(), 1);
  }

  #[test]
  fn path_queries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sized.bin");
    write_file(&path, [0u8; 42]).unwrap();

    assert!(file_exists(&path));
    assert!(!file_exists(dir.path()));
    assert!(!file_exists(dir.path().join("nope")));

    assert_eq!(file_size(&path).unwrap(), 42);
    assert!(file_size(dir.path().join("nope")).is_err());

    assert_eq!(path_type(&path).unwrap(), PathType::File);
    assert_eq!(path_type(dir.path()).unwrap(), PathType::Directory);
    assert!(path_type(dir.path().join("nope")).is_err());
  }
}
