use thiserror::Error;

/// Failures of [`Allocator::allocate`](crate::Allocator::allocate) and of the
/// fallible container operations built on it.
///
/// There is no partial success: an allocation either yields a zero-filled
/// block of the requested size or one of these, and no block at all.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AllocError {
  /// The general-purpose heap could not satisfy the request.
  #[error("out of memory: failed to allocate {requested} bytes")]
  OutOfMemory { requested: usize },

  /// An arena has no room left for the request. Arenas never grow.
  #[error("arena exhausted: requested {requested} bytes, {remaining} bytes remaining")]
  ArenaExhausted { requested: usize, remaining: usize },

  /// The requested element count does not fit in `usize` bytes.
  #[error("capacity overflow")]
  CapacityOverflow,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Alloc(#[from] AllocError),

  #[error("{context}: {source}")]
  Io {
    context: String,
    #[source]
    source: std::io::Error,
  },
}

impl Error {
  pub fn io(
    context: impl Into<String>,
    source: std::io::Error,
  ) -> Error {
    Error::Io {
      context: context.into(),
      source,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Aborts an infallible container operation whose allocation failed.
#[cold]
#[track_caller]
pub(crate) fn alloc_failed(err: AllocError) -> ! {
  panic!("{err}")
}
