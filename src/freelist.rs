use std::marker::PhantomData;

use crate::{
  align::ALIGNMENT,
  block::{BlockRef, Span},
  error::HeapError,
};

/// Singly linked chain of free blocks, kept sorted by header address. The
/// links live inside the free blocks themselves:
///
/// ```text
///   head
///    │
///    ▼
///   ┌────────┬─────────┐      ┌────────┬───────┐      ┌────────┬─────────────┐
///   │ Header │  free   │ ───► │ Header │ free  │ ───► │ Header │    free     │ ──► None
///   └────────┴─────────┘      └────────┴───────┘      └────────┴─────────────┘
///   low address                                                  high address
/// ```
///
/// Every block reachable from `head` was handed to [`FreeList::insert`], whose
/// contract makes the safe methods below sound.
#[derive(Debug, Default)]
pub(crate) struct FreeList {
  head: Option<BlockRef>,
  len: usize,
}

/// Result of a first-fit search: the matching block and the block linking to
/// it, if any. Only [`FreeList::first_fit`] builds these.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fit {
  prev: Option<BlockRef>,
  span: Span,
}

impl FreeList {
  pub const fn new() -> Self {
    Self { head: None, len: 0 }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.head.is_none()
  }

  pub fn iter(&self) -> Iter<'_> {
    Iter {
      next: self.head,
      marker: PhantomData,
    }
  }

  /// Writes a header with `capacity` at `at` and links it before the first
  /// block with a higher address.
  ///
  /// # Safety
  ///
  /// `at` must start `HEADER_SIZE + capacity` bytes of arena memory that is
  /// not used by anything else and does not overlap any block of the list.
  pub unsafe fn insert(
    &mut self,
    at: BlockRef,
    capacity: usize,
  ) {
    let mut prev = None;
    let mut next = self.head;

    while let Some(block) = next {
      if block > at {
        break;
      }
      prev = Some(block);
      next = unsafe { block.read() }.next_free;
    }

    unsafe {
      Span { at, capacity, next }.store();
      self.link(prev, Some(at));
    }

    self.len += 1;
  }

  /// First block able to hold `size` bytes, looking at the head first.
  pub fn first_fit(
    &self,
    size: usize,
  ) -> Option<Fit> {
    let mut prev = None;

    for span in self.iter() {
      if span.capacity >= size {
        return Some(Fit { prev, span });
      }
      prev = Some(span.at);
    }

    None
  }

  /// Unlinks the block found by [`FreeList::first_fit`] and returns it.
  ///
  /// When more than `min_split` bytes would be left over after reserving
  /// `size` bytes and a new header, the tail is carved into a new free block
  /// that takes the old one's place in the list and the returned block shrinks
  /// to exactly `size`. Otherwise the whole block is handed out as is.
  pub fn take(
    &mut self,
    fit: Fit,
    size: usize,
    min_split: usize,
  ) -> BlockRef {
    let Fit { prev, span } = fit;

    let replacement = match span.remainder_after(size) {
      Some(remainder) if remainder > min_split => {
        let (front, rest) = span.split(size);
        unsafe {
          rest.store();
          front.store();
        }
        Some(rest.at)
      }
      _ => {
        self.len -= 1;
        span.next
      }
    };

    unsafe { self.link(prev, replacement) };

    span.at
  }

  /// Single forward pass merging every run of physically contiguous blocks
  /// into its lowest block. Returns how many blocks were absorbed.
  pub fn coalesce(&mut self) -> usize {
    let Some(head) = self.head else {
      return 0;
    };

    let mut merged = 0;
    let mut current = unsafe { Span::load(head) };

    while let Some(next) = current.next {
      let next = unsafe { Span::load(next) };

      match current.merge(next) {
        Some(grown) => {
          unsafe { grown.store() };
          current = grown;
          merged += 1;
        }
        None => current = next,
      }
    }

    self.len -= merged;
    merged
  }

  /// Walks the whole list checking order, overlap, coalescing and alignment.
  pub fn verify(&self) -> Result<(), HeapError> {
    let mut counted = 0;
    let mut prev: Option<Span> = None;

    for span in self.iter() {
      counted += 1;

      if span.at.address() % ALIGNMENT != 0 || span.capacity % ALIGNMENT != 0 {
        return Err(HeapError::Misaligned {
          address: span.at.address(),
        });
      }

      if let Some(prev) = prev {
        if span.at <= prev.at {
          return Err(HeapError::Unordered {
            prev: prev.at.address(),
            next: span.at.address(),
          });
        }
        if prev.end() > span.at.address() {
          return Err(HeapError::Overlap {
            prev: prev.at.address(),
            capacity: prev.capacity,
            next: span.at.address(),
          });
        }
        if prev.is_adjacent_to(&span) {
          return Err(HeapError::Uncoalesced {
            prev: prev.at.address(),
            next: span.at.address(),
          });
        }
      }

      prev = Some(span);
    }

    if counted != self.len {
      return Err(HeapError::LengthMismatch {
        counted,
        tracked: self.len,
      });
    }

    Ok(())
  }

  /// Points `prev` (or the head when `prev` is `None`) at `next`.
  unsafe fn link(
    &mut self,
    prev: Option<BlockRef>,
    next: Option<BlockRef>,
  ) {
    match prev {
      None => self.head = next,
      Some(block) => unsafe {
        let mut header = block.read();
        header.next_free = next;
        block.write(header);
      },
    }
  }
}

/// Iterator over the free blocks in address order.
pub(crate) struct Iter<'a> {
  next: Option<BlockRef>,
  marker: PhantomData<&'a FreeList>,
}

impl Iterator for Iter<'_> {
  type Item = Span;

  fn next(&mut self) -> Option<Span> {
    let at = self.next?;
    let span = unsafe { Span::load(at) };
    self.next = span.next;
    Some(span)
  }
}
