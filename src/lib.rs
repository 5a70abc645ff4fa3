//! # blockstd - Explicit Allocators and the Containers Built on Them
//!
//! This crate provides a small foundation library where **every allocation
//! goes through an allocator you can see**: a general-purpose heap allocator,
//! a bump-pointer arena, and growable containers that remember which
//! allocator they draw from.
//!
//! ## Overview
//!
//! Allocators hand out [`MemoryBlock`]s, plain `{data, size}` descriptors, and
//! take them back:
//!
//! ```text
//!   Allocator Concept:
//!
//!   ┌───────────────┐  allocate(n)   ┌──────────────────────┐
//!   │               │ ─────────────► │ MemoryBlock          │
//!   │   Allocator   │                │   data ──► n zeroed  │
//!   │               │ ◄───────────── │   size = n   bytes   │
//!   └───────────────┘  free(&mut b)  └──────────────────────┘
//!                      (b becomes {null, 0} when accepted)
//! ```
//!
//! Two implementations ship with the crate:
//!
//! ```text
//!   HeapAllocator: each block is its own C-heap allocation.
//!
//!     ┌────┐   ┌──────────┐   ┌───────┐
//!     │ B1 │   │    B2    │   │  B3   │     free(B2) releases B2 alone
//!     └────┘   └──────────┘   └───────┘
//!
//!   ArenaAllocator: one upfront region, carved front to back.
//!
//!   ┌─────┬───────────┬──────┬─────────────────────────────────────┐
//!   │ A1  │    A2     │  A3  │             Free Space              │
//!   └─────┴───────────┴──────┴─────────────────────────────────────┘
//!                            ▲                                     ▲
//!                         offset                               capacity
//!
//!   free(A2) is a no-op that answers true; reset() rewinds offset to 0.
//! ```
//!
//! Containers own one block at a time and grow by asking their allocator for
//! a bigger one:
//!
//! ```text
//!   Array<T> growth (push 9 into capacity 8):
//!
//!   old ┌──┬──┬──┬──┬──┬──┬──┬──┐
//!       │0 │1 │2 │3 │4 │5 │6 │7 │              freed after the copy
//!       └──┴──┴──┴──┴──┴──┴──┴──┘
//!   new ┌──┬──┬──┬──┬──┬──┬──┬──┬──┬──┬──┬──┬──┬──┬──┬──┐
//!       │0 │1 │2 │3 │4 │5 │6 │7 │8 │  │  │  │  │  │  │  │  capacity 16
//!       └──┴──┴──┴──┴──┴──┴──┴──┴──┴──┴──┴──┴──┴──┴──┴──┘
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   blockstd
//!   ├── align         - Alignment macros (align!, align_to!)
//!   ├── block         - MemoryBlock and block helpers
//!   ├── allocator     - Allocator trait and the per-thread default
//!   ├── heap          - HeapAllocator
//!   ├── arena         - ArenaAllocator
//!   ├── array         - Array<T>, the growable sequence
//!   ├── static_array  - StaticArray<T, N>, fixed capacity inline
//!   ├── string        - ByteString, concat and split
//!   ├── defer         - Scope guards (Defer, Guard, defer!)
//!   ├── fs            - Whole-file reads into blocks
//!   ├── bitmap        - Masks and RGBA surfaces
//!   └── error         - AllocError and the crate Error
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use blockstd::{ArenaAllocator, Array, ByteString, concat_strings};
//!
//! let arena = ArenaAllocator::new(4096).unwrap();
//!
//! let mut numbers: Array<u64> = Array::new_in(&arena);
//! for i in 0..9 {
//!     numbers.push_back(i);
//! }
//! assert_eq!(numbers.capacity(), 16);
//!
//! let joined = concat_strings(&["line1", "line2"], Some(b'\n'), &arena);
//! assert_eq!(joined, "line1\nline2");
//! assert_eq!(joined.as_bytes_with_nul().last(), Some(&0));
//!
//! // Strings and arrays without an explicit allocator use the default one.
//! let mut greeting = ByteString::new();
//! greeting.append("hello");
//! assert_eq!(greeting.len(), 5);
//! ```
//!
//! ## Features
//!
//! - **Explicit allocators**: every container is bound to a `&dyn Allocator`
//! - **Validated frees**: the heap allocator refuses foreign and stale blocks
//! - **Aligned arena blocks**: every block starts on a [`BLOCK_ALIGN`] boundary
//! - **Zero-filled memory**: fresh blocks, and the slack of a string, read as zero
//! - **Fallible variants**: `try_*` methods return [`AllocError`] instead of panicking
//!
//! ## Limitations
//!
//! - **Single-threaded only**: allocators are `!Sync`; the default is per thread
//! - **No reclamation inside an arena**: only `reset` reuses its space
//! - **Byte strings only**: no UTF-8 validation on append
//! - **Unix-oriented**: the heap allocator sits on `libc::calloc`
//!
//! ## Safety
//!
//! A [`MemoryBlock`] is a descriptor, not an owner. Reading its bytes is
//! `unsafe`, and a block must go back to the allocator that produced it. The
//! containers uphold this for you.

pub mod align;
mod allocator;
mod arena;
mod array;
mod bitmap;
pub mod block;
mod defer;
mod error;
pub mod fs;
mod heap;
mod static_array;
pub mod string;

pub use align::BLOCK_ALIGN;
pub use allocator::{Allocator, default_allocator, set_default_allocator};
pub use arena::ArenaAllocator;
pub use array::Array;
pub use bitmap::{Bitmap, Color, ColorBitmap, Rect};
pub use block::MemoryBlock;
pub use defer::{Defer, Guard, guard};
pub use error::{AllocError, Error, Result};
pub use heap::HeapAllocator;
pub use static_array::StaticArray;
pub use string::{
  ByteString, compare_strings, concat_strings, file_extension, split_lines, split_lines_view, split_string,
  split_string_view,
};
