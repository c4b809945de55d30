use std::fmt;

use crate::freelist::FreeList;

/// Snapshot of the pool: what was taken from the host and what is free.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
  /// Bytes ever obtained from the host, headers included. Never decreases.
  pub total_from_host: usize,
  /// Sum of the capacities of all free blocks.
  pub total_free_bytes: usize,
  pub free_block_count: usize,
}

impl Stats {
  pub(crate) fn collect(
    list: &FreeList,
    total_from_host: usize,
  ) -> Self {
    let (total_free_bytes, free_block_count) = list
      .iter()
      .fold((0, 0), |(bytes, count), span| (bytes + span.capacity, count + 1));

    Self {
      total_from_host,
      total_free_bytes,
      free_block_count,
    }
  }

  /// Mean capacity of a free block, 0 when there are none.
  pub fn average_free_block(&self) -> usize {
    self
      .total_free_bytes
      .checked_div(self.free_block_count)
      .unwrap_or(0)
  }
}

impl fmt::Display for Stats {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    writeln!(f, "Total Amount of Storage: {} bytes", self.total_from_host)?;
    writeln!(f, "Total Number of free blocks: {}", self.free_block_count)?;
    write!(f, "Average size of the free blocks: {} bytes", self.average_free_block())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_list() {
    let stats = Stats::collect(&FreeList::new(), 0);

    assert_eq!(stats, Stats::default());
    assert_eq!(stats.average_free_block(), 0);
  }

  #[test]
  fn test_display() {
    let stats = Stats {
      total_from_host: 8208,
      total_free_bytes: 8000,
      free_block_count: 4,
    };

    assert_eq!(
      stats.to_string(),
      "Total Amount of Storage: 8208 bytes\n\
       Total Number of free blocks: 4\n\
       Average size of the free blocks: 2000 bytes"
    );
  }
}
