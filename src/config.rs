//! Pool configuration
//!
//! A [`PoolConfig`] is fixed at pool creation and never changes afterward.
//! Threading mode is not part of it: that choice is made by picking
//! [`Pool`](crate::Pool) or [`LocalPool`](crate::LocalPool).

use crate::error::{PoolError, PoolResult};

/// Default page capacity request, in bytes.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default allocation alignment as a log2, i.e. 8-byte alignment.
pub const DEFAULT_ALIGN_LOG2: u32 = 3;

/// Configuration for a pool
///
/// The page size is a *request*: the platform may round it up to page (or
/// huge-page) granularity, and each page records the size it actually got.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Write-permission granularity in bytes. Must be nonzero.
    pub page_size: usize,
    /// Alignment used by [`alloc_bytes`](crate::Pool::alloc_bytes), as a
    /// log2 of the byte alignment.
    pub align_log2: u32,
    /// Whether a single allocation larger than `page_size` may force a
    /// dedicated, oversized page. When disabled such requests are refused.
    pub multipage: bool,
    /// Prefer huge pages for the backing regions where the platform
    /// supports them.
    pub huge_pages: bool,
}

impl PoolConfig {
    /// Creates a config with the library defaults
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            align_log2: DEFAULT_ALIGN_LOG2,
            multipage: true,
            huge_pages: false,
        }
    }

    /// Sets the page size request
    #[must_use = "builder methods must be chained or built"]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the default allocation alignment (log2 of bytes)
    #[must_use = "builder methods must be chained or built"]
    pub fn with_align_log2(mut self, align_log2: u32) -> Self {
        self.align_log2 = align_log2;
        self
    }

    /// Enables/disables dedicated pages for oversized allocations
    #[must_use = "builder methods must be chained or built"]
    pub fn with_multipage(mut self, enabled: bool) -> Self {
        self.multipage = enabled;
        self
    }

    /// Enables/disables huge-page preference for backing regions
    #[must_use = "builder methods must be chained or built"]
    pub fn with_huge_pages(mut self, enabled: bool) -> Self {
        self.huge_pages = enabled;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> PoolResult<()> {
        if self.page_size == 0 {
            return Err(PoolError::invalid_config("page size must be nonzero"));
        }
        if self.align_log2 >= usize::BITS {
            return Err(PoolError::invalid_config(
                "default alignment shift exceeds pointer width",
            ));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}
