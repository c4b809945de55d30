//! # flist - A First-Fit Free List Allocator
//!
//! This crate provides a general purpose **free list allocator** that manages a
//! growable pool of memory obtained from the host (`posix_memalign` by default)
//! and serves variable sized blocks out of it.
//!
//! ## Overview
//!
//! Every block, free or allocated, starts with a 16 byte header. Free blocks
//! are chained together in a singly linked list sorted by address:
//!
//! ```text
//!   Pool after a few allocations and frees:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │ region 1                                                             │
//!   │  ┌───┬──────┬───┬──────┬───┬──────┬───┬────────────────────────────┐ │
//!   │  │ H │ used │ H │ free │ H │ used │ H │           free             │ │
//!   │  └───┴──────┴───┴──────┴───┴──────┴───┴────────────────────────────┘ │
//!   │               ▲                     ▲                                │
//!   └───────────────┼─────────────────────┼────────────────────────────────┘
//!        head ──────┘        next_free ───┘
//! ```
//!
//! - **Allocation** is first-fit: the list is walked from the lowest address
//!   and the first block that fits is taken. Large blocks are split and the
//!   tail stays in the list. If nothing fits, the pool grows once and the
//!   search is repeated.
//! - **Deallocation** puts the block back at its address ordered position and
//!   then merges every run of physically contiguous free blocks.
//!
//! ## Crate Structure
//!
//! ```text
//!   flist
//!   ├── align      - Alignment macros (align!, align_to!)
//!   ├── allocator  - FreeListAllocator: allocate, free, stats
//!   ├── block      - Block header layout and split/merge arithmetic (internal)
//!   ├── config     - Tunables and their defaults
//!   ├── error      - AllocError, HeapError, ConfigError
//!   ├── freelist   - Address ordered free list (internal)
//!   ├── host       - HostMemory trait and the libc backed host
//!   └── stats      - Pool statistics
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use flist::FreeListAllocator;
//!
//! let mut allocator = FreeListAllocator::new();
//!
//! let ptr = allocator.allocate(100).unwrap();
//! assert_eq!(ptr.as_ptr() as usize % 16, 0);
//!
//! unsafe {
//!   ptr.cast::<u64>().write(42);
//!   allocator.free(Some(ptr));
//! }
//!
//! let stats = allocator.stats();
//! assert_eq!(stats.free_block_count, 1);
//! assert_eq!(stats.total_free_bytes + flist::HEADER_SIZE, stats.total_from_host);
//! ```
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **Linear time**: Search and coalescing walk the whole free list
//! - **Unchecked frees**: Double frees and foreign pointers are undefined
//!   behaviour
//! - **No shrinking**: Regions go back to the host only when the allocator is
//!   dropped

pub mod align;
mod allocator;
mod block;
mod config;
mod error;
mod freelist;
mod host;
mod stats;

pub use allocator::{FreeBlock, FreeListAllocator};
pub use align::{ALIGNMENT, checked_align};
pub use block::HEADER_SIZE;
pub use config::{Config, EXPAND_UNIT, MIN_SPLIT};
pub use error::{AllocError, ConfigError, HeapError};
pub use host::{HostMemory, LibcHost};
pub use stats::Stats;
