use std::ptr::{self, NonNull};

use crate::align::ALIGNMENT;

/// Where the allocator gets its memory from. The allocator only ever asks for
/// whole regions and gives them back when it is dropped, it does not care
/// which system API sits behind this.
///
/// Regions that happen to be contiguous are merged into one free block, and a
/// later split may write a header into the upper region through a pointer
/// derived from the lower one. That is fine for a single underlying buffer
/// handed out in slices, but separate `posix_memalign` allocations are
/// separate objects under Rust's provenance rules, so tools such as Miri may
/// flag such an access. Hosts that care should avoid returning regions that
/// touch each other.
pub trait HostMemory {
  /// Requests a region where `length` bytes can be written safely. The start
  /// of the region must be aligned to 16 bytes.
  fn request(
    &mut self,
    length: usize,
  ) -> Option<NonNull<u8>>;

  /// Gives back a region obtained from [`HostMemory::request`].
  ///
  /// # Safety
  ///
  /// `address` and `length` must describe a region returned by `request` on
  /// this same host, and nothing may use that region afterwards.
  unsafe fn release(
    &mut self,
    address: NonNull<u8>,
    length: usize,
  );
}

/// Host backed by the C library's `posix_memalign` and `free`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibcHost;

impl HostMemory for LibcHost {
  fn request(
    &mut self,
    length: usize,
  ) -> Option<NonNull<u8>> {
    let mut address: *mut libc::c_void = ptr::null_mut();

    // posix_memalign wants a power of two multiple of the pointer size.
    let alignment = ALIGNMENT.max(std::mem::size_of::<usize>());

    match unsafe { libc::posix_memalign(&mut address, alignment, length) } {
      0 => NonNull::new(address.cast()),
      _ => None,
    }
  }

  unsafe fn release(
    &mut self,
    address: NonNull<u8>,
    _length: usize,
  ) {
    unsafe { libc::free(address.as_ptr().cast()) }
  }
}
