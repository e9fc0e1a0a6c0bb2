//! Unix mapping primitives (mmap/munmap/mprotect)

use std::io;
use std::ptr::NonNull;

pub(super) fn query_page_size() -> usize {
    // SAFETY: FFI call to sysconf with a valid parameter; no memory is
    // touched. A negative result means the query itself failed.
    let n = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if n <= 0 {
        4096
    } else {
        n as usize
    }
}

#[cfg(target_os = "linux")]
pub(super) fn query_huge_page_size() -> Option<usize> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    for line in meminfo.lines() {
        if let Some(rest) = line.strip_prefix("Hugepagesize:") {
            let kb: usize = rest.trim().trim_end_matches("kB").trim().parse().ok()?;
            return Some(kb * 1024);
        }
    }
    None
}

#[cfg(not(target_os = "linux"))]
pub(super) fn query_huge_page_size() -> Option<usize> {
    None
}

#[cfg(target_os = "linux")]
fn huge_flag(huge: bool) -> libc::c_int {
    if huge {
        libc::MAP_HUGETLB
    } else {
        0
    }
}

#[cfg(not(target_os = "linux"))]
fn huge_flag(_huge: bool) -> libc::c_int {
    0
}

pub(super) fn map(len: usize, huge: bool) -> io::Result<NonNull<u8>> {
    let flags = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | huge_flag(huge);

    // SAFETY: FFI call to mmap requesting a fresh anonymous mapping.
    // - addr is null, so the kernel picks the placement
    // - len is nonzero (callers reserve at least one page)
    // - fd -1 / offset 0 is the anonymous-mapping convention
    // The kernel validates everything and returns MAP_FAILED on error.
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            flags,
            -1,
            0,
        )
    };

    if ptr == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: ptr is not MAP_FAILED, and the kernel never places an
    // anonymous mapping at address zero for a null hint.
    Ok(unsafe { NonNull::new_unchecked(ptr.cast::<u8>()) })
}

/// # Safety
///
/// `ptr`/`len` must describe one mapping returned by [`map`], not yet
/// unmapped.
pub(super) unsafe fn unmap(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
    // SAFETY: FFI call to munmap; caller guarantees ptr/len come from mmap.
    let rc = unsafe { libc::munmap(ptr.as_ptr().cast::<libc::c_void>(), len) };
    if rc == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// # Safety
///
/// `ptr`/`len` must describe one live mapping returned by [`map`].
pub(super) unsafe fn protect_read_only(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
    // SAFETY: FFI call to mprotect; ptr is page-aligned (it came from
    // mmap) and len covers exactly the mapped region.
    let rc = unsafe {
        libc::mprotect(ptr.as_ptr().cast::<libc::c_void>(), len, libc::PROT_READ)
    };
    if rc == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}
