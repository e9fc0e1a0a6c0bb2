//! Pool allocation with page-granularity write protection
//!
//! This crate hands out objects from contiguous mapped pages using a
//! downward bump allocator, and can later *seal* a whole pool: every
//! page it currently holds is marked read-only at the OS level, so
//! writes to previously-allocated objects fault, while new allocations
//! keep landing in fresh, writable pages. The intended use is building
//! immutable data structures incrementally and then freezing them.
//!
//! # Pool types
//!
//! - [`Pool`]: shareable across threads, one pool-wide mutex
//! - [`LocalPool`]: single-threaded, no lock, `!Sync`
//!
//! # Example
//!
//! ```
//! use sealpool::{Pool, PoolConfig};
//!
//! let pool = Pool::with_config(PoolConfig::new().with_page_size(64 * 1024))?;
//!
//! let ptr = pool.alloc_bytes_aligned(48, 4)?; // 16-byte aligned
//! assert_eq!(ptr.as_ptr() as usize % 16, 0);
//!
//! pool.protect(); // the 48 bytes above are now read-only
//!
//! // Still allocatable: this lands in a new page that starts writable.
//! let fresh = pool.alloc_value([0u8; 32])?;
//! fresh[0] = 1;
//! # Ok::<(), sealpool::PoolError>(())
//! ```
//!
//! # What this is not
//!
//! There is no per-object deallocation, no reuse of the slack left in
//! superseded pages, no unseal, and no shrinking: a pool only grows
//! until it is dropped. Platform mapping failures abort the process
//! rather than surfacing as errors.

#![warn(missing_docs)]

pub mod config;
pub mod error;
mod platform;
pub mod pool;
pub mod utils;

pub use config::{PoolConfig, DEFAULT_ALIGN_LOG2, DEFAULT_PAGE_SIZE};
pub use error::{PoolError, PoolResult};
pub use pool::{LocalPool, PageInfo, Pool};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
