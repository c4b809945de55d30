use thiserror::Error;

/// Why an allocation request could not be served.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
  /// Requested size was zero or negative. Nothing was mutated.
  #[error("invalid allocation request: size must be positive")]
  InvalidRequest,

  /// No free block fits even after growing the pool once, or the host
  /// refused to give us more memory.
  #[error("out of memory: could not serve {requested} bytes")]
  OutOfMemory { requested: usize },
}

/// Broken free list invariant found by [`crate::FreeListAllocator::verify`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
  #[error("free list out of order: block {next:#x} follows block {prev:#x}")]
  Unordered { prev: usize, next: usize },

  #[error("free block {prev:#x} ({capacity} bytes) overlaps block {next:#x}")]
  Overlap {
    prev: usize,
    capacity: usize,
    next: usize,
  },

  #[error("free blocks {prev:#x} and {next:#x} are adjacent but were not merged")]
  Uncoalesced { prev: usize, next: usize },

  #[error("block {address:#x} is not aligned to 16 bytes")]
  Misaligned { address: usize },

  #[error("free list holds {counted} blocks but tracks {tracked}")]
  LengthMismatch { counted: usize, tracked: usize },
}

/// Rejected allocator configuration.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
  #[error("expand unit must be positive")]
  ZeroExpandUnit,

  #[error("min split {0} is not a multiple of 16")]
  UnalignedMinSplit(usize),

  #[error("expand unit {0} is not a multiple of 16")]
  UnalignedExpandUnit(usize),
}
