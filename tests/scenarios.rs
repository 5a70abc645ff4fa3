use blockstd::{
  AllocError, Allocator, ArenaAllocator, Array, ByteString, HeapAllocator, MemoryBlock, concat_strings, defer,
  default_allocator, split_lines, split_string_view,
};

#[test]
fn heap_block_round_trip() {
  let heap = HeapAllocator::new();

  let mut block = heap.allocate(3).unwrap();
  unsafe { block.as_mut_slice() }.copy_from_slice(&[1, 2, 3]);
  assert_eq!(unsafe { block.as_slice() }, &[1, 2, 3]);

  assert!(heap.free(&mut block));
  assert_eq!(block, MemoryBlock::empty());
  assert!(!heap.free(&mut block));
}

#[test]
fn arena_exhaustion_and_reset() {
  let mut arena = ArenaAllocator::new(16).unwrap();

  let first = arena.allocate(10).unwrap();
  assert_eq!(first.size(), 10);
  assert_eq!(
    arena.allocate(10),
    Err(AllocError::ArenaExhausted {
      requested: 10,
      remaining: 6,
    })
  );

  arena.reset();

  let whole = arena.allocate(16).unwrap();
  assert_eq!(whole.size(), 16);
  assert_eq!(arena.remaining(), 0);
}

#[test]
fn array_doubles_past_base_capacity() {
  let heap = HeapAllocator::new();
  let mut numbers: Array<i32> = Array::new_in(&heap);

  for i in 0..9 {
    numbers.push_back(i);
  }

  assert_eq!(numbers.len(), 9);
  assert_eq!(numbers.capacity(), 16);
  assert_eq!(heap.live_blocks(), 1);
}

#[test]
fn concat_with_separator() {
  let heap = HeapAllocator::new();

  let joined = concat_strings(&["line1", "line2"], Some(b'\n'), &heap);

  assert_eq!(joined, "line1\nline2");
  assert_eq!(joined.len(), 11);
  assert_eq!(joined.as_bytes_with_nul()[11], 0);
}

#[test]
fn copies_are_independent() {
  let heap = HeapAllocator::new();
  let original = Array::from_slice_in(&[1u8, 2, 3], &heap);

  let mut copy = original.clone();
  copy[0] = 9;
  copy.push_back(4);

  assert_eq!(original.as_slice(), &[1, 2, 3]);
  assert_eq!(copy.as_slice(), &[9, 2, 3, 4]);
  assert_ne!(original.block().data(), copy.block().data());
}

#[test]
fn moving_transfers_the_block() {
  let heap = HeapAllocator::new();
  let mut source = ByteString::from_bytes_in(b"moved", &heap);
  let data = source.block().data();

  let target = source.take();

  assert_eq!(target, "moved");
  assert_eq!(target.block().data(), data);
  assert!(source.is_empty());
  assert!(!source.is_bound());

  drop(source);
  assert_eq!(heap.live_blocks(), 1);
  drop(target);
  assert_eq!(heap.live_blocks(), 0);
}

#[test]
fn moved_from_array_rebinds_to_the_default() {
  let heap = HeapAllocator::new();
  let mut source: Array<u16> = Array::from_slice_in(&[1, 2], &heap);
  let _target = source.take();

  source.push_back(7);

  assert!(source.is_bound());
  assert!(std::ptr::addr_eq(source.allocator(), default_allocator()));
  assert_eq!(heap.live_blocks(), 1);
}

#[test]
fn split_a_file_worth_of_lines() {
  let arena = ArenaAllocator::new(4096).unwrap();
  let text = ByteString::from_bytes_in(b"alpha\r\nbeta\n\ngamma\n", &arena);

  let lines = split_lines(text.as_bytes(), &arena);
  let words = split_string_view(b"  a  b c ", b' ', &arena);

  assert_eq!(lines.len(), 3);
  assert_eq!(lines[0], "alpha");
  assert_eq!(lines[2], "gamma");
  assert_eq!(words.as_slice(), &[&b"a"[..], &b"b"[..], &b"c"[..]]);
}

#[test]
fn deferred_action_sees_scratch_usage() {
  let arena = ArenaAllocator::new(256).unwrap();
  let used = std::cell::Cell::new(0);

  {
    defer!(used.set(arena.used()));
    let mut scratch = ByteString::new_in(&arena);
    scratch.append("temporary");
  }

  assert!(used.get() > 0);
}
