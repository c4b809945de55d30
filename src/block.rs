use std::{mem, ptr::NonNull};

/// Bookkeeping record stored right before every payload, free or allocated.
///
/// ```text
///   ┌──────────────────────┬──────────────────────────────┐
///   │       Header         │           Payload            │
///   │  capacity: N         │                              │
///   │  next_free: ptr/None │       N usable bytes         │
///   │      16 bytes        │                              │
///   └──────────────────────┴──────────────────────────────┘
///   ▲                      ▲
///   BlockRef               BlockRef::payload()
/// ```
///
/// `next_free` only means something while the block sits in the free list.
/// The alignment pins the record to 16 bytes on 32 bit targets too, so that a
/// payload starting right after a header stays 16 byte aligned.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
  pub capacity: usize,
  pub next_free: Option<BlockRef>,
}

/// Size of [`Header`]. Every payload starts exactly this many bytes after its
/// header.
pub const HEADER_SIZE: usize = mem::size_of::<Header>();

/// Handle to a block header living somewhere in the arena.
///
/// Handles are ordered by address, which is the order of the free list. Only
/// [`BlockRef::read`] and [`BlockRef::write`] touch the memory behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockRef(NonNull<Header>);

impl BlockRef {
  /// Wraps the start of a fresh host region.
  pub fn from_region(start: NonNull<u8>) -> Self {
    Self(start.cast())
  }

  /// Recovers the header of a block from the payload address that was handed
  /// out for it.
  ///
  /// # Safety
  ///
  /// `payload` must have been returned by the allocator that owns this
  /// header and must not have been freed since.
  pub unsafe fn from_payload(payload: NonNull<u8>) -> Self {
    Self(unsafe { payload.byte_sub(HEADER_SIZE) }.cast())
  }

  pub fn address(self) -> usize {
    self.0.as_ptr().addr()
  }

  /// First byte after the header.
  pub fn payload(self) -> NonNull<u8> {
    self.offset(HEADER_SIZE).0.cast()
  }

  /// Handle to the header placed `bytes` after this one. Nothing is read or
  /// written.
  pub fn offset(
    self,
    bytes: usize,
  ) -> Self {
    debug_assert!(
      self.address().checked_add(bytes).is_some(),
      "block offset overflows the address space"
    );
    Self(self.0.map_addr(|address| address.saturating_add(bytes)))
  }

  /// # Safety
  ///
  /// `self` must point to an initialized header inside a live arena region.
  pub unsafe fn read(self) -> Header {
    unsafe { self.0.read() }
  }

  /// # Safety
  ///
  /// `self` must point to at least [`HEADER_SIZE`] writable bytes inside a
  /// live arena region, and no live allocation may overlap them.
  pub unsafe fn write(
    self,
    header: Header,
  ) {
    unsafe { self.0.write(header) }
  }

  #[cfg(test)]
  pub(crate) fn dangling_at(address: usize) -> Self {
    Self(NonNull::new(std::ptr::without_provenance_mut(address)).unwrap())
  }
}

/// Plain value copy of a header together with its location. Splitting and
/// merging are computed on spans and written back by the free list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
  pub at: BlockRef,
  pub capacity: usize,
  pub next: Option<BlockRef>,
}

impl Span {
  /// # Safety
  ///
  /// Same contract as [`BlockRef::read`].
  pub unsafe fn load(at: BlockRef) -> Self {
    let header = unsafe { at.read() };

    Self {
      at,
      capacity: header.capacity,
      next: header.next_free,
    }
  }

  /// # Safety
  ///
  /// Same contract as [`BlockRef::write`].
  pub unsafe fn store(self) {
    unsafe {
      self.at.write(Header {
        capacity: self.capacity,
        next_free: self.next,
      })
    }
  }

  /// One past the last payload byte.
  pub fn end(&self) -> usize {
    self.at.address() + HEADER_SIZE + self.capacity
  }

  /// Bytes left over for a new free block if `size` payload bytes are carved
  /// off the front, or `None` if the remainder could not even hold a header.
  pub fn remainder_after(
    &self,
    size: usize,
  ) -> Option<usize> {
    self.capacity.checked_sub(size)?.checked_sub(HEADER_SIZE)
  }

  /// Carves `size` bytes off the front. The first span keeps this location and
  /// exactly `size` bytes and links to the second, which describes what is
  /// left and inherits the old successor.
  pub fn split(
    self,
    size: usize,
  ) -> (Span, Span) {
    debug_assert!(self.capacity >= size + HEADER_SIZE);

    let rest = Span {
      at: self.at.offset(HEADER_SIZE + size),
      capacity: self.capacity - size - HEADER_SIZE,
      next: self.next,
    };

    let front = Span {
      at: self.at,
      capacity: size,
      next: Some(rest.at),
    };

    (front, rest)
  }

  pub fn is_adjacent_to(
    &self,
    upper: &Span,
  ) -> bool {
    self.end() == upper.at.address()
  }

  /// Lower span absorbs `upper` when they touch. The merged span takes over
  /// the successor of `upper`.
  pub fn merge(
    self,
    upper: Span,
  ) -> Option<Span> {
    if !self.is_adjacent_to(&upper) {
      return None;
    }

    Some(Span {
      at: self.at,
      capacity: self.capacity + HEADER_SIZE + upper.capacity,
      next: upper.next,
    })
  }
}
