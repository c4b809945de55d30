use std::{io, ptr::NonNull};

use log::{debug, trace, warn};

use crate::{
  align::{ALIGNMENT, checked_align},
  block::{BlockRef, HEADER_SIZE},
  config::Config,
  error::{AllocError, ConfigError, HeapError},
  freelist::FreeList,
  host::{HostMemory, LibcHost},
  stats::Stats,
};

/// A free block as seen from outside the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeBlock {
  /// Address of the block header.
  pub header: usize,
  /// Payload bytes following the header.
  pub capacity: usize,
}

impl FreeBlock {
  /// One past the last payload byte.
  pub fn end(&self) -> usize {
    self.header + HEADER_SIZE + self.capacity
  }
}

/// First-fit allocator over an address ordered free list.
///
/// The pool starts empty and grows in chunks of at least
/// [`Config::expand_unit`] bytes taken from `H`. Memory obtained from the
/// host stays in the pool until the allocator is dropped, at which point every
/// region goes back to the host and all outstanding pointers dangle.
///
/// Not thread safe: callers sharing one instance must serialize access.
pub struct FreeListAllocator<H: HostMemory = LibcHost> {
  free: FreeList,
  total_from_host: usize,
  regions: Vec<(NonNull<u8>, usize)>,
  config: Config,
  host: H,
}

impl FreeListAllocator {
  pub fn new() -> Self {
    Self {
      free: FreeList::new(),
      total_from_host: 0,
      regions: Vec::new(),
      config: Config::default(),
      host: LibcHost,
    }
  }

  pub fn with_config(config: Config) -> Result<Self, ConfigError> {
    Self::with_host(LibcHost, config)
  }
}

impl Default for FreeListAllocator {
  fn default() -> Self {
    Self::new()
  }
}

impl<H: HostMemory> FreeListAllocator<H> {
  pub fn with_host(
    host: H,
    config: Config,
  ) -> Result<Self, ConfigError> {
    config.validate()?;

    Ok(Self {
      free: FreeList::new(),
      total_from_host: 0,
      regions: Vec::new(),
      config,
      host,
    })
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn host(&self) -> &H {
    &self.host
  }

  /// Returns a 16 byte aligned address with room for at least `size` bytes,
  /// or `None` if `size` is zero or no memory could be found.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Option<NonNull<u8>> {
    self.try_allocate(size).ok()
  }

  /// Like [`FreeListAllocator::allocate`] for callers holding signed sizes.
  /// Zero and negative sizes are rejected without touching the pool.
  pub fn allocate_signed(
    &mut self,
    size: i64,
  ) -> Option<NonNull<u8>> {
    match usize::try_from(size) {
      Ok(size) => self.allocate(size),
      Err(_) => {
        trace!("allocate({size}) -> rejected");
        None
      }
    }
  }

  /// Finds the first free block with enough room for `size` bytes rounded up
  /// to 16, growing the pool at most once when nothing fits.
  pub fn try_allocate(
    &mut self,
    size: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    if size == 0 {
      return Err(AllocError::InvalidRequest);
    }

    let size = checked_align(size).ok_or(AllocError::OutOfMemory { requested: size })?;

    if self.free.is_empty() {
      self.expand(size)?;
    }

    let fit = match self.free.first_fit(size) {
      Some(fit) => fit,
      None => {
        self.expand(size)?;
        self
          .free
          .first_fit(size)
          .ok_or(AllocError::OutOfMemory { requested: size })?
      }
    };

    let block = self.free.take(fit, size, self.config.min_split);
    let address = block.payload();

    trace!("allocate({size}) -> {address:?}");

    Ok(address)
  }

  /// Returns a block to the pool and merges it with any free neighbours.
  /// `None` is ignored.
  ///
  /// # Safety
  ///
  /// `address` must be `None` or a pointer returned by this allocator that
  /// has not been freed yet. Double frees and foreign pointers are not
  /// detected.
  pub unsafe fn free(
    &mut self,
    address: Option<NonNull<u8>>,
  ) {
    let Some(address) = address else {
      return;
    };

    unsafe {
      let block = BlockRef::from_payload(address);
      let capacity = block.read().capacity;
      self.free.insert(block, capacity);
    }

    let merged = self.free.coalesce();

    trace!("free({address:?}) merged {merged} blocks");
  }

  /// Usable bytes behind an allocated address. Can exceed the requested size
  /// when a block was handed out whole.
  ///
  /// # Safety
  ///
  /// `address` must be a live allocation of this allocator.
  pub unsafe fn capacity_of(
    &self,
    address: NonNull<u8>,
  ) -> usize {
    unsafe { BlockRef::from_payload(address).read() }.capacity
  }

  pub fn stats(&self) -> Stats {
    Stats::collect(&self.free, self.total_from_host)
  }

  /// Free blocks in address order.
  pub fn free_blocks(&self) -> impl Iterator<Item = FreeBlock> + '_ {
    self.free.iter().map(|span| FreeBlock {
      header: span.at.address(),
      capacity: span.capacity,
    })
  }

  /// Checks the free list invariants: increasing addresses, no overlap, no
  /// unmerged neighbours, 16 byte alignment.
  pub fn verify(&self) -> Result<(), HeapError> {
    self.free.verify()
  }

  /// Writes one line per free block followed by the totals.
  pub fn dump<W: io::Write>(
    &self,
    out: &mut W,
  ) -> io::Result<()> {
    for block in self.free_blocks() {
      writeln!(
        out,
        "block {:#x}: {} bytes, ends at {:#x}",
        block.header,
        block.capacity,
        block.end()
      )?;
    }

    writeln!(out, "{}", self.stats())
  }

  /// Takes a new region from the host, large enough for `size` payload bytes
  /// and never smaller than the expand unit, and adds it to the free list.
  /// A refused request leaves the free list as it was.
  fn expand(
    &mut self,
    size: usize,
  ) -> Result<(), AllocError> {
    let out_of_memory = AllocError::OutOfMemory { requested: size };

    let capacity = self.config.expand_unit.max(size);
    let length = capacity.checked_add(HEADER_SIZE).ok_or(out_of_memory)?;

    let Some(region) = self.host.request(length) else {
      warn!("host refused {length} bytes, keeping {} free blocks", self.free.len());
      return Err(out_of_memory);
    };

    debug_assert_eq!(region.as_ptr().addr() % ALIGNMENT, 0);

    self.regions.push((region, length));
    self.total_from_host += length;

    debug!(
      "pool grew by {length} bytes at {region:?}, {} bytes from host so far",
      self.total_from_host
    );

    unsafe { self.free.insert(BlockRef::from_region(region), capacity) };
    self.free.coalesce();

    Ok(())
  }
}

impl<H: HostMemory> Drop for FreeListAllocator<H> {
  fn drop(&mut self) {
    for (region, length) in self.regions.drain(..) {
      unsafe { self.host.release(region, length) };
    }
  }
}
