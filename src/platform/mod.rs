//! OS page mapping, one implementation per target
//!
//! The rest of the crate talks to memory through three operations:
//! [`reserve`], [`release`], and [`protect_read_only`]. Each either
//! succeeds or terminates the process; no failure value ever reaches the
//! allocation engine, which keeps the engine free of retry logic it could
//! not meaningfully implement anyway.
//!
//! Page-size and huge-page discovery are computed once per process and
//! cached; the values are fixed for the process lifetime.

use std::io;
use std::ptr::NonNull;
use std::sync::OnceLock;

use tracing::{error, warn};

use crate::utils::align_up;

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        use unix as imp;
    } else if #[cfg(windows)] {
        mod windows;
        use windows as imp;
    } else {
        compile_error!("sealpool supports unix and windows targets only");
    }
}

/// A mapped, read-write, anonymous region.
///
/// `len` is the size actually granted, which is `min_len` rounded up to
/// mapping granularity; callers must record it for [`release`].
pub(crate) struct Region {
    pub ptr: NonNull<u8>,
    pub len: usize,
}

/// Maps a region of at least `min_len` bytes.
///
/// The request is rounded up to page granularity, or to huge-page
/// granularity when `huge` is set and the platform reports a huge-page
/// size. On Linux a huge mapping that the kernel refuses (an empty
/// hugetlb pool is common) falls back to normal pages with a warning;
/// any remaining failure aborts the process.
pub(crate) fn reserve(min_len: usize, huge: bool) -> Region {
    debug_assert!(min_len > 0);

    if huge {
        if let Some(granule) = huge_page_size() {
            let len = align_up(min_len, granule);
            match imp::map(len, true) {
                Ok(ptr) => return Region { ptr, len },
                Err(err) => {
                    warn!(len, %err, "huge-page mapping refused, falling back");
                }
            }
        }
    }

    let len = align_up(min_len, page_size());
    match imp::map(len, false) {
        Ok(ptr) => Region { ptr, len },
        Err(err) => die("reserve", len, &err),
    }
}

/// Unmaps a region previously returned by [`reserve`].
///
/// # Safety
///
/// `ptr` and `len` must come from one [`reserve`] call, the region must
/// not be accessed afterward, and it must be released exactly once.
pub(crate) unsafe fn release(ptr: NonNull<u8>, len: usize) {
    if let Err(err) = unsafe { imp::unmap(ptr, len) } {
        die("release", len, &err);
    }
}

/// Revokes write permission on a mapped region.
///
/// # Safety
///
/// `ptr` and `len` must come from one [`reserve`] call. Existing pointers
/// into the region stay valid for reads; writes through them will fault.
pub(crate) unsafe fn protect_read_only(ptr: NonNull<u8>, len: usize) {
    if let Err(err) = unsafe { imp::protect_read_only(ptr, len) } {
        die("protect", len, &err);
    }
}

/// OS page size, queried once and cached for the process lifetime.
pub(crate) fn page_size() -> usize {
    static PAGE_SIZE: OnceLock<usize> = OnceLock::new();
    *PAGE_SIZE.get_or_init(imp::query_page_size)
}

/// Huge-page size if the platform reports one, queried once and cached.
pub(crate) fn huge_page_size() -> Option<usize> {
    static HUGE_PAGE_SIZE: OnceLock<Option<usize>> = OnceLock::new();
    *HUGE_PAGE_SIZE.get_or_init(imp::query_huge_page_size)
}

fn die(op: &'static str, len: usize, err: &io::Error) -> ! {
    error!(op, len, %err, "page provider failure");
    std::process::abort();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_cached_and_sane() {
        let first = page_size();
        assert!(first.is_power_of_two());
        assert!(first >= 512);
        assert_eq!(page_size(), first);
    }

    #[test]
    fn reserve_rounds_up_to_page_granularity() {
        let region = reserve(1, false);
        assert_eq!(region.len % page_size(), 0);
        assert!(region.len >= page_size());
        // SAFETY: region was just mapped read-write and is released once.
        unsafe {
            region.ptr.as_ptr().write(0xA5);
            assert_eq!(region.ptr.as_ptr().read(), 0xA5);
            release(region.ptr, region.len);
        }
    }

    #[test]
    fn huge_page_size_is_stable() {
        assert_eq!(huge_page_size(), huge_page_size());
        if let Some(granule) = huge_page_size() {
            assert!(granule >= page_size());
        }
    }
}
