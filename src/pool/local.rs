//! Single-threaded pool front-end

use core::cell::RefCell;
use core::mem;
use std::ptr::NonNull;

use crate::config::PoolConfig;
use crate::error::PoolResult;
use crate::pool::state::PoolState;
use crate::pool::PageInfo;

/// A pool confined to one thread
///
/// Same allocation and sealing behavior as [`Pool`](crate::Pool) with the
/// lock compiled away: the state sits in a `RefCell`, so the type is
/// `!Sync` and the compiler rejects sharing it across threads instead of
/// leaving that as a documented precondition. Moving a `LocalPool` to
/// another thread wholesale is fine.
pub struct LocalPool {
    state: RefCell<PoolState>,
}

impl LocalPool {
    /// Creates a pool with the library default configuration.
    pub fn new() -> Self {
        Self {
            state: RefCell::new(PoolState::new(PoolConfig::default())),
        }
    }

    /// Creates a pool with a custom page size.
    ///
    /// A zero page size yields no pool: the error comes back before
    /// anything is mapped.
    pub fn with_page_size(page_size: usize) -> PoolResult<Self> {
        Self::with_config(PoolConfig::new().with_page_size(page_size))
    }

    /// Creates a pool from a full configuration.
    pub fn with_config(config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;
        Ok(Self {
            state: RefCell::new(PoolState::new(config)),
        })
    }

    /// Allocates `size` bytes at the pool's default alignment.
    pub fn alloc_bytes(&self, size: usize) -> PoolResult<NonNull<u8>> {
        self.state.borrow_mut().alloc_bytes(size)
    }

    /// Allocates `size` bytes aligned to `1 << align_log2`.
    pub fn alloc_bytes_aligned(&self, size: usize, align_log2: u32) -> PoolResult<NonNull<u8>> {
        self.state.borrow_mut().alloc_bytes_aligned(size, align_log2)
    }

    /// Allocates room for `value` and moves it in.
    ///
    /// Zero-sized types are refused like zero-byte requests. Writes
    /// through the returned reference after [`protect`](Self::protect)
    /// will fault; reads stay valid until the pool is dropped.
    pub fn alloc_value<T>(&self, value: T) -> PoolResult<&mut T> {
        let align_log2 = mem::align_of::<T>().trailing_zeros();
        let ptr = self
            .alloc_bytes_aligned(mem::size_of::<T>(), align_log2)?
            .cast::<T>();
        // SAFETY: the allocation is fresh, sized and aligned for T; the
        // write initializes it, and the reference cannot outlive the pool
        // that owns the page.
        unsafe {
            ptr.as_ptr().write(value);
            Ok(&mut *ptr.as_ptr())
        }
    }

    /// Seals every page currently in the pool read-only.
    pub fn protect(&self) {
        self.state.borrow_mut().protect();
    }

    /// The configured page size request.
    pub fn page_size(&self) -> usize {
        self.state.borrow().page_size()
    }

    /// The pool's default allocation alignment, as a log2.
    pub fn default_align_log2(&self) -> u32 {
        self.state.borrow().default_align_log2()
    }

    /// Number of pages currently mapped.
    pub fn page_count(&self) -> usize {
        self.state.borrow().page_count()
    }

    /// Snapshots every page header, front page first.
    pub fn pages(&self) -> Vec<PageInfo> {
        self.state.borrow().pages()
    }

    /// Total bytes handed out.
    pub fn used(&self) -> usize {
        self.state.borrow().used()
    }

    /// Total mapped bytes.
    pub fn capacity(&self) -> usize {
        self.state.borrow().capacity()
    }
}

impl Default for LocalPool {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for LocalPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("LocalPool")
            .field("page_size", &state.page_size())
            .field("pages", &state.page_count())
            .field("used", &state.used())
            .finish()
    }
}
