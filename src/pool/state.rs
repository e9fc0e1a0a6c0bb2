//! The allocation/protection engine shared by both pool front-ends
//!
//! `PoolState` owns the page chain and implements every operation under
//! the assumption of exclusive access; [`Pool`](crate::Pool) provides
//! that exclusivity with a mutex, [`LocalPool`](crate::LocalPool) with a
//! `RefCell`. Nothing here synchronizes on its own.
//!
//! ## Invariants
//!
//! - `head` is the most recently created page; the chain behind it is
//!   singly owned and never cyclic
//! - allocation only ever touches the front page; once a page is
//!   superseded it is never written again, even if it has unused room
//! - a read-only front page is treated as full, so the next allocation
//!   opens a fresh writable page

use std::ptr::NonNull;

use tracing::debug;

use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::pool::page::{PageHeader, HEADER_SIZE};
use crate::pool::PageInfo;
use crate::utils::{align_down, align_up, is_aligned};

pub(crate) struct PoolState {
    head: Option<NonNull<PageHeader>>,
    config: PoolConfig,
}

// SAFETY: the page chain is reachable only through this state and is
// exclusively owned by it; moving the state to another thread moves the
// whole chain with it.
unsafe impl Send for PoolState {}

impl PoolState {
    pub fn new(config: PoolConfig) -> Self {
        Self { head: None, config }
    }

    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    pub fn default_align_log2(&self) -> u32 {
        self.config.align_log2
    }

    /// Bump-allocates `size` bytes at `1 << align_log2` alignment.
    pub fn alloc_bytes_aligned(
        &mut self,
        size: usize,
        align_log2: u32,
    ) -> PoolResult<NonNull<u8>> {
        if size == 0 {
            return Err(PoolError::ZeroSize);
        }
        if align_log2 >= usize::BITS {
            return Err(PoolError::invalid_alignment(align_log2));
        }
        let align = 1usize << align_log2;

        // Room the request needs in a fresh page: the header, padded up to
        // the alignment, plus the object itself.
        let header_room = align_up(HEADER_SIZE, align);
        let min_capacity = header_room
            .checked_add(size)
            .ok_or_else(|| PoolError::too_large(size, self.config.page_size))?;

        // Oversized request: gets a dedicated page or is refused outright.
        if min_capacity > self.config.page_size {
            if !self.config.multipage {
                return Err(PoolError::too_large(size, self.config.page_size));
            }
            return Ok(self.grow(min_capacity, size, align));
        }

        if let Some(head) = self.head {
            // SAFETY: head is a live page exclusively owned by this state.
            let (read_only, boundary) = {
                let header = unsafe { head.as_ref() };
                (header.read_only, header.boundary)
            };
            // The new boundary must clear the padded header, which is
            // exactly `boundary >= min_capacity`. A sealed front page is
            // full by definition.
            if !read_only && boundary >= min_capacity {
                let new_boundary = align_down(boundary - size, align);
                debug_assert!(new_boundary >= HEADER_SIZE);
                debug_assert!(is_aligned(new_boundary, align));
                // SAFETY: the front page is not sealed, so its header is
                // still writable, and this state owns it exclusively.
                unsafe { (*head.as_ptr()).boundary = new_boundary };
                // SAFETY: the boundary stays within [HEADER_SIZE, capacity).
                return Ok(unsafe { PageHeader::object_at(head, new_boundary) });
            }
        }

        Ok(self.grow(self.config.page_size, size, align))
    }

    /// Bump-allocates `size` bytes at the pool's default alignment.
    pub fn alloc_bytes(&mut self, size: usize) -> PoolResult<NonNull<u8>> {
        self.alloc_bytes_aligned(size, self.config.align_log2)
    }

    /// Maps a new front page of at least `min_len` bytes (never below the
    /// configured page size) and carves the first object out of it.
    fn grow(&mut self, min_len: usize, size: usize, align: usize) -> NonNull<u8> {
        let request = min_len.max(self.config.page_size);
        let (page, boundary) = PageHeader::create(
            request,
            size,
            align,
            self.config.huge_pages,
            self.head.take(),
        );
        self.head = Some(page);
        // SAFETY: boundary came from create and is within the region.
        unsafe { PageHeader::object_at(page, boundary) }
    }

    /// Seals every page currently in the pool read-only.
    ///
    /// Repeated calls walk the chain again and reissue the OS call; that
    /// is idempotent in effect, cheap but not free. The flag itself flips
    /// only on the first pass over a page: once the region is protected
    /// its embedded header has no write permission left, so the store
    /// must happen before the OS call revokes it and never again after.
    pub fn protect(&mut self) {
        let mut sealed = 0usize;
        let mut cursor = self.head;
        while let Some(page) = cursor {
            // SAFETY: chain nodes are live and exclusively owned.
            let (next, capacity, already_sealed) = {
                let header = unsafe { page.as_ref() };
                (header.next, header.capacity, header.read_only)
            };
            if !already_sealed {
                // SAFETY: the region still has write permission; the flag
                // flips exactly once, before the call below revokes it.
                unsafe { (*page.as_ptr()).read_only = true };
            }
            // SAFETY: the region spans `capacity` bytes from the header.
            unsafe { crate::platform::protect_read_only(page.cast(), capacity) };
            sealed += 1;
            cursor = next;
        }
        debug!(pages = sealed, "sealed pool");
    }

    /// Number of pages currently in the chain.
    pub fn page_count(&self) -> usize {
        let mut count = 0;
        let mut cursor = self.head;
        while let Some(page) = cursor {
            count += 1;
            // SAFETY: chain nodes are live while the pool exists.
            cursor = unsafe { page.as_ref().next };
        }
        count
    }

    /// Snapshots every page header, front page first.
    pub fn pages(&self) -> Vec<PageInfo> {
        let mut out = Vec::new();
        let mut cursor = self.head;
        while let Some(page) = cursor {
            // SAFETY: chain nodes are live while the pool exists.
            let header = unsafe { page.as_ref() };
            out.push(PageInfo {
                capacity: header.capacity,
                boundary: header.boundary,
                read_only: header.read_only,
            });
            cursor = header.next;
        }
        out
    }

    /// Total bytes handed out across all pages.
    pub fn used(&self) -> usize {
        self.pages()
            .iter()
            .map(|page| page.capacity - page.boundary)
            .sum()
    }

    /// Total mapped bytes across all pages.
    pub fn capacity(&self) -> usize {
        self.pages().iter().map(|page| page.capacity).sum()
    }
}

impl Drop for PoolState {
    fn drop(&mut self) {
        let mut cursor = self.head.take();
        while let Some(page) = cursor {
            // Read the link out before the region disappears.
            // SAFETY: the page is live until destroy below, which is the
            // only release of this region.
            let next = unsafe { page.as_ref().next };
            unsafe { PageHeader::destroy(page) };
            cursor = next;
        }
    }
}
