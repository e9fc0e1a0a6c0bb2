//! Sealing behavior: idempotence, new-page writability, write faults

use sealpool::{LocalPool, Pool};

#[test]
fn protect_on_an_empty_pool_is_a_no_op() {
    let pool = Pool::new();
    for _ in 0..10 {
        pool.protect();
    }
    assert_eq!(pool.page_count(), 0);
}

#[test]
fn protect_leaves_page_metadata_intact() {
    let pool = Pool::new();
    let value = pool.alloc_value(b'A').unwrap();

    let before = pool.pages()[0];
    pool.protect();
    let after = pool.pages()[0];

    assert_eq!(pool.page_count(), 1);
    assert_eq!(after.capacity, before.capacity);
    assert_eq!(after.boundary, before.boundary);
    assert!(after.read_only);

    // Reads through pre-seal pointers stay valid.
    assert_eq!(*value, b'A');
}

#[test]
fn repeated_protect_is_idempotent() {
    let pool = Pool::new();
    pool.alloc_bytes(16).unwrap();

    for _ in 0..10 {
        pool.protect();
    }
    assert!(pool.pages().iter().all(|page| page.read_only));
}

#[test]
fn allocation_after_protect_opens_a_writable_page() {
    let pool = Pool::new();
    pool.alloc_bytes(1).unwrap();
    pool.protect();

    let fresh = pool.alloc_value(0u8).unwrap();
    *fresh = 7; // the new page must accept writes
    assert_eq!(*fresh, 7);

    let pages = pool.pages();
    assert_eq!(pages.len(), 2);
    assert!(!pages[0].read_only);
    assert!(pages[1].read_only);
}

#[test]
fn older_pages_seal_while_the_front_stays_writable() {
    let pool = Pool::new();
    let mut values = Vec::new();

    for i in 0..4u8 {
        pool.protect();
        let value = pool.alloc_value(b'A' + i).unwrap();
        values.push(value);

        let pages = pool.pages();
        assert!(!pages[0].read_only);
        assert!(pages[1..].iter().all(|page| page.read_only));

        for (j, older) in values.iter().enumerate() {
            assert_eq!(**older, b'A' + j as u8);
        }
    }
    assert_eq!(pool.page_count(), 4);
}

#[test]
fn local_pool_seals_the_same_way() {
    let pool = LocalPool::new();
    let value = pool.alloc_value(5u32).unwrap();
    pool.protect();

    assert!(pool.pages()[0].read_only);
    assert_eq!(*value, 5);

    pool.alloc_bytes(8).unwrap();
    assert!(!pool.pages()[0].read_only);
}

/// A write through a pre-seal pointer must fault. The faulting write has
/// to happen in a separate process, so the test re-runs itself as a
/// child and expects the child to die by signal rather than exit.
#[test]
#[cfg(unix)]
fn write_after_protect_faults() {
    use std::os::unix::process::ExitStatusExt;
    use std::process::Command;

    if std::env::var_os("SEALPOOL_FAULT_CHILD").is_some() {
        let pool = Pool::new();
        let ptr = pool.alloc_bytes(1).unwrap();
        pool.protect();
        // A fresh allocation right before the faulting write, to show the
        // pool itself is still usable after sealing.
        pool.alloc_bytes(1).unwrap();
        // SAFETY: deliberately invalid. The page was sealed; this write
        // must kill the process.
        unsafe { ptr.as_ptr().write(b'A') };
        std::process::exit(0);
    }

    let exe = std::env::current_exe().unwrap();
    let status = Command::new(exe)
        .args(["write_after_protect_faults", "--exact", "--test-threads=1"])
        .env("SEALPOOL_FAULT_CHILD", "1")
        .status()
        .unwrap();

    assert!(
        !status.success(),
        "child survived a write to a sealed page"
    );
    assert!(
        status.signal().is_some(),
        "child exited without a fault signal: {status}"
    );
}
