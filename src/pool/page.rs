//! Page layout and geometry
//!
//! Each page is one platform region with its own metadata embedded at the
//! start, so the platform mapping is the only per-page memory source.
//! Objects are carved from the high end of the region and the boundary
//! moves down, closed-stack convention: it points at the first allocated
//! byte.
//!
//! ```text
//! +--------+--------------------+-----------------+
//! | header |      free space    | allocated space |
//! +--------+--------------------+-----------------+
//! 0        HEADER_SIZE          boundary          capacity
//! ```
//!
//! ## Invariants
//!
//! - `boundary >= HEADER_SIZE` at all times; the header area is never
//!   handed out
//! - `boundary` only ever decreases, and stays a multiple of the last
//!   requested alignment
//! - `capacity` is the mapped length, which may exceed what the pool
//!   asked for; teardown must use it, not the configured page size
//! - `read_only` is monotonic: set once, never cleared

use core::mem;
use std::ptr::NonNull;

use tracing::debug;

use crate::platform;
use crate::utils::{align_down, is_aligned};

/// Metadata embedded at offset zero of every mapped page region.
#[repr(C)]
pub(crate) struct PageHeader {
    /// Older page in the chain, exclusively owned through this link.
    pub next: Option<NonNull<PageHeader>>,
    /// Mapped length of this region in bytes.
    pub capacity: usize,
    /// Offset of the most recently allocated byte; free space ends here.
    pub boundary: usize,
    /// Whether this page has (ever) been sealed read-only.
    pub read_only: bool,
}

/// Bytes reserved for the header at the start of each region.
pub(crate) const HEADER_SIZE: usize = mem::size_of::<PageHeader>();

impl PageHeader {
    /// Maps a region of at least `min_len` bytes, installs the header,
    /// and carves the first object of `size` bytes from the top.
    ///
    /// Returns the new page and the offset of that first object. The
    /// caller guarantees `min_len >= align_up(HEADER_SIZE, align) + size`,
    /// which makes the boundary invariants hold by construction.
    pub fn create(
        min_len: usize,
        size: usize,
        align: usize,
        huge: bool,
        next: Option<NonNull<PageHeader>>,
    ) -> (NonNull<PageHeader>, usize) {
        let region = platform::reserve(min_len, huge);
        let capacity = region.len;

        let boundary = align_down(capacity - size, align);
        debug_assert!(boundary >= HEADER_SIZE);
        debug_assert!(is_aligned(boundary, align));

        let page = region.ptr.cast::<PageHeader>();
        // SAFETY: the region is freshly mapped read-write, at least
        // HEADER_SIZE bytes long (boundary >= HEADER_SIZE), and its base
        // is page-aligned, which satisfies PageHeader's alignment.
        unsafe {
            page.as_ptr().write(PageHeader {
                next,
                capacity,
                boundary,
                read_only: false,
            });
        }

        debug!(capacity, boundary, huge, "mapped pool page");
        (page, boundary)
    }

    /// Address of the object at `offset` within this page.
    ///
    /// This is the one place a raw object address is materialized from a
    /// `(page, offset)` pair.
    ///
    /// # Safety
    ///
    /// `page` must be a live page of this pool and `offset` must lie
    /// within `[HEADER_SIZE, capacity)`.
    #[inline]
    pub unsafe fn object_at(page: NonNull<PageHeader>, offset: usize) -> NonNull<u8> {
        // SAFETY: offset stays inside the mapped region per the caller
        // contract, so the add cannot leave the allocation, and the
        // result is non-null because the region base is.
        unsafe { NonNull::new_unchecked(page.cast::<u8>().as_ptr().add(offset)) }
    }

    /// Releases the region backing this page. The header dies with it.
    ///
    /// # Safety
    ///
    /// `page` must be a live page that is never accessed again; the
    /// caller must have read `next` out before calling.
    pub unsafe fn destroy(page: NonNull<PageHeader>) {
        // SAFETY: the header is live until the release below.
        let capacity = unsafe { page.as_ref().capacity };
        // SAFETY: the region spans `capacity` bytes from the header base,
        // exactly as reserve returned it, and is released exactly once.
        unsafe { platform::release(page.cast(), capacity) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_fits_well_under_a_page() {
        assert!(HEADER_SIZE <= 64);
        assert!(HEADER_SIZE >= mem::size_of::<usize>() * 3);
    }

    #[test]
    fn create_carves_from_the_top() {
        let (page, offset) = PageHeader::create(4096, 7, 1, false, None);
        // SAFETY: page is live until destroyed below.
        let (capacity, boundary) = unsafe {
            let header = page.as_ref();
            (header.capacity, header.boundary)
        };
        assert_eq!(offset, boundary);
        assert_eq!(boundary, capacity - 7);
        // SAFETY: offset is within the region, which destroy consumes.
        unsafe {
            let object = PageHeader::object_at(page, offset);
            object.as_ptr().write_bytes(0xEE, 7);
            PageHeader::destroy(page);
        }
    }

    #[test]
    fn create_respects_alignment() {
        let (page, offset) = PageHeader::create(4096, 7, 16, false, None);
        assert!(is_aligned(offset, 16));
        // SAFETY: page is live and destroyed exactly once.
        unsafe { PageHeader::destroy(page) };
    }
}
