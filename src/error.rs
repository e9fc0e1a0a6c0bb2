//! Error types for pool operations

use thiserror::Error;

/// Result type for pool operations
pub type PoolResult<T> = core::result::Result<T, PoolError>;

/// Recoverable pool operation errors
///
/// Every variant here is a caller-input rejection with no side effects:
/// nothing was mapped, linked, or protected when one of these comes back.
/// Platform failures (a mapping or protection call the OS refuses) are not
/// errors; the platform layer logs them and aborts the process, since an
/// allocator has no meaningful recovery path for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// A zero-byte allocation was requested.
    #[error("zero-size allocation")]
    ZeroSize,

    /// The request cannot fit in a page and multipage allocation is
    /// disabled, or the padded size overflowed.
    #[error("allocation of {requested} bytes cannot fit a {page_size}-byte page")]
    TooLarge {
        /// Requested object size in bytes.
        requested: usize,
        /// The pool's configured page size.
        page_size: usize,
    },

    /// The alignment shift is too large to express as a byte alignment.
    #[error("alignment shift {align_log2} exceeds pointer width")]
    InvalidAlignment {
        /// The rejected log2 alignment.
        align_log2: u32,
    },

    /// The pool configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl PoolError {
    /// Create a too-large error
    pub fn too_large(requested: usize, page_size: usize) -> Self {
        Self::TooLarge {
            requested,
            page_size,
        }
    }

    /// Create an invalid alignment error
    pub fn invalid_alignment(align_log2: u32) -> Self {
        Self::InvalidAlignment { align_log2 }
    }

    /// Create a configuration error
    pub fn invalid_config(message: &'static str) -> Self {
        Self::InvalidConfig(message)
    }
}
