use std::{
  alloc::{self, Layout},
  ptr::NonNull,
};

use flist::{AllocError, Config, FreeListAllocator, HEADER_SIZE, HostMemory, LibcHost};

fn init() {
  let _ = env_logger::builder().is_test(true).try_init();
}

/// Forwards to libc until `budget` bytes have been handed out, then refuses.
struct LimitedHost {
  budget: usize,
  requests: usize,
  refused: usize,
}

impl LimitedHost {
  fn new(budget: usize) -> Self {
    Self {
      budget,
      requests: 0,
      refused: 0,
    }
  }
}

impl HostMemory for LimitedHost {
  fn request(
    &mut self,
    length: usize,
  ) -> Option<NonNull<u8>> {
    self.requests += 1;

    if length > self.budget {
      self.refused += 1;
      return None;
    }

    self.budget -= length;
    LibcHost.request(length)
  }

  unsafe fn release(
    &mut self,
    address: NonNull<u8>,
    length: usize,
  ) {
    unsafe { LibcHost.release(address, length) }
  }
}

/// Hands out consecutive slices of one buffer, so every region starts where
/// the previous one ended.
struct ContiguousHost {
  base: NonNull<u8>,
  layout: Layout,
  used: usize,
}

impl ContiguousHost {
  fn new(length: usize) -> Self {
    let layout = Layout::from_size_align(length, 16).unwrap();
    let base = NonNull::new(unsafe { alloc::alloc(layout) }).unwrap();

    Self {
      base,
      layout,
      used: 0,
    }
  }
}

impl HostMemory for ContiguousHost {
  fn request(
    &mut self,
    length: usize,
  ) -> Option<NonNull<u8>> {
    if self.used + length > self.layout.size() {
      return None;
    }

    let region = unsafe { self.base.add(self.used) };
    self.used += length;
    Some(region)
  }

  unsafe fn release(
    &mut self,
    _address: NonNull<u8>,
    _length: usize,
  ) {
  }
}

impl Drop for ContiguousHost {
  fn drop(&mut self) {
    unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) }
  }
}

#[test]
fn refused_growth_keeps_existing_free_blocks() {
  init();
  let host = LimitedHost::new(8192 + HEADER_SIZE);
  let mut allocator = FreeListAllocator::with_host(host, Config::default()).unwrap();

  let small = allocator.allocate(512).unwrap();
  let before = allocator.stats();

  assert_eq!(
    allocator.try_allocate(9000),
    Err(AllocError::OutOfMemory { requested: 9008 })
  );

  assert_eq!(allocator.stats(), before);
  assert_eq!(allocator.host().refused, 1);
  assert_eq!(allocator.verify(), Ok(()));

  // Whatever was free before the failure is still usable.
  let again = allocator.allocate(4096).unwrap();
  assert_ne!(again, small);
  assert_eq!(allocator.host().requests, 2);
}

#[test]
fn refused_first_growth_leaves_empty_pool() {
  init();
  let mut allocator = FreeListAllocator::with_host(LimitedHost::new(0), Config::default()).unwrap();

  assert_eq!(allocator.allocate(1), None);
  assert_eq!(allocator.stats().total_from_host, 0);
  assert_eq!(allocator.stats().free_block_count, 0);
}

#[test]
fn growth_happens_once_per_request() {
  init();
  let host = LimitedHost::new(usize::MAX);
  let config = Config::default().with_expand_unit(1024);
  let mut allocator = FreeListAllocator::with_host(host, config).unwrap();

  allocator.allocate(800).unwrap();
  allocator.allocate(800).unwrap();
  allocator.allocate(4000).unwrap();

  assert_eq!(allocator.host().requests, 3);
  assert_eq!(
    allocator.stats().total_from_host,
    2 * (1024 + HEADER_SIZE) + 4000 + HEADER_SIZE
  );
}

#[test]
fn contiguous_regions_are_merged() {
  init();
  let config = Config::default().with_expand_unit(1024);
  let host = ContiguousHost::new(4 * (1024 + HEADER_SIZE));
  let mut allocator = FreeListAllocator::with_host(host, config).unwrap();

  let first = allocator.allocate(1024).unwrap();
  let second = allocator.allocate(1024).unwrap();
  assert_eq!(allocator.stats().free_block_count, 0);

  unsafe {
    allocator.free(Some(second));
    allocator.free(Some(first));
  }

  let blocks: Vec<_> = allocator.free_blocks().collect();
  assert_eq!(blocks.len(), 1);
  assert_eq!(blocks[0].capacity, 2 * 1024 + HEADER_SIZE);
  assert_eq!(allocator.verify(), Ok(()));

  // Two merged regions serve a request neither could hold alone.
  let big = allocator.allocate(2000).unwrap();
  assert_eq!(big, first);
  assert_eq!(allocator.stats().total_from_host, 2 * (1024 + HEADER_SIZE));
}

#[test]
fn rejects_invalid_config() {
  assert!(FreeListAllocator::with_config(Config::default().with_expand_unit(0)).is_err());
  assert!(FreeListAllocator::with_config(Config::default().with_min_split(8)).is_err());

  let config = Config::default().with_min_split(64).with_expand_unit(4096);
  let mut allocator = FreeListAllocator::with_config(config).unwrap();
  assert_eq!(*allocator.config(), config);

  // 4096 - 4000 - 16 leaves 80 bytes, above the raised threshold.
  let address = allocator.allocate(4000).unwrap();
  assert_eq!(unsafe { allocator.capacity_of(address) }, 4000);
  assert_eq!(allocator.stats().total_from_host, allocator.config().expand_unit + HEADER_SIZE);
}
