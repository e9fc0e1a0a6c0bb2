//! Windows mapping primitives (VirtualAlloc/VirtualFree/VirtualProtect)

use std::io;
use std::ptr::NonNull;

use winapi::um::memoryapi::{GetLargePageMinimum, VirtualAlloc, VirtualFree, VirtualProtect};
use winapi::um::sysinfoapi::{GetSystemInfo, SYSTEM_INFO};
use winapi::um::winnt::{
    MEM_COMMIT, MEM_LARGE_PAGES, MEM_RELEASE, MEM_RESERVE, PAGE_READONLY, PAGE_READWRITE,
};

pub(super) fn query_page_size() -> usize {
    // SAFETY: FFI call to GetSystemInfo; a zeroed SYSTEM_INFO is a valid
    // output buffer and the OS fills every field.
    unsafe {
        let mut info: SYSTEM_INFO = std::mem::zeroed();
        GetSystemInfo(&mut info);
        info.dwPageSize as usize
    }
}

pub(super) fn query_huge_page_size() -> Option<usize> {
    // SAFETY: FFI call with no arguments; zero means large pages are
    // unsupported on this system.
    let min = unsafe { GetLargePageMinimum() };
    if min == 0 {
        None
    } else {
        Some(min)
    }
}

pub(super) fn map(len: usize, huge: bool) -> io::Result<NonNull<u8>> {
    let mut alloc_type = MEM_COMMIT | MEM_RESERVE;
    if huge {
        alloc_type |= MEM_LARGE_PAGES;
    }

    // SAFETY: FFI call to VirtualAlloc requesting a fresh committed
    // region; a null address lets the OS pick the placement. The OS
    // validates the parameters and returns null on failure.
    let ptr = unsafe {
        VirtualAlloc(
            std::ptr::null_mut(),
            len,
            alloc_type,
            PAGE_READWRITE,
        )
    };

    NonNull::new(ptr.cast::<u8>()).ok_or_else(io::Error::last_os_error)
}

/// # Safety
///
/// `ptr` must be the base of one region returned by [`map`], not yet
/// released.
pub(super) unsafe fn unmap(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
    let _ = len; // MEM_RELEASE frees the whole region; size must be zero

    // SAFETY: FFI call to VirtualFree on a region VirtualAlloc returned.
    let rc = unsafe {
        VirtualFree(
            ptr.as_ptr().cast::<winapi::ctypes::c_void>(),
            0,
            MEM_RELEASE,
        )
    };
    if rc == 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// # Safety
///
/// `ptr`/`len` must describe one live region returned by [`map`].
pub(super) unsafe fn protect_read_only(ptr: NonNull<u8>, len: usize) -> io::Result<()> {
    let mut old_protect = 0;

    // SAFETY: FFI call to VirtualProtect; ptr is region-aligned (it came
    // from VirtualAlloc) and len covers the committed pages.
    let rc = unsafe {
        VirtualProtect(
            ptr.as_ptr().cast::<winapi::ctypes::c_void>(),
            len,
            PAGE_READONLY,
            &mut old_protect,
        )
    };
    if rc == 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}
