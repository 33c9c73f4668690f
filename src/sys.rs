//! Kernel interfaces consumed by the allocator: program break extension,
//! anonymous mapping, unmapping, and the page-size query.
//!
//! Every function here is a thin, fallible wrapper around a single syscall.
//! None of them allocate; `backing` and `engine` are the only callers.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Grow the program break by `delta` bytes and return the *old* break, i.e.
/// the start address of the newly-available region.
///
/// Uses the raw `SYS_brk` syscall rather than glibc's `sbrk`, because `sbrk`
/// is not available on every libc this crate might be built against and the
/// raw syscall gives the exact "query-or-set an absolute break, returns the
/// resulting break" semantics needed to return the old break. `delta` must
/// be positive; this module never lowers the break.
pub fn brk_grow(delta: usize) -> Option<*mut u8> {
    debug_assert!(delta > 0, "brk_grow is only ever called with a positive delta");

    let current = current_break()?;
    let requested = (current as usize).checked_add(delta)?;

    // SAFETY: SYS_brk with a non-null address requests the kernel to set the
    // break to that address; it returns the resulting break, which is >=
    // the requested address only on success.
    let result = unsafe { libc::syscall(libc::SYS_brk, requested as *mut libc::c_void) };
    if result < 0 || (result as usize) < requested {
        return None;
    }
    Some(current)
}

/// Query the current program break without moving it.
fn current_break() -> Option<*mut u8> {
    // SAFETY: SYS_brk with a null argument is the documented way to query
    // the current break without changing it.
    let result = unsafe { libc::syscall(libc::SYS_brk, std::ptr::null_mut::<libc::c_void>()) };
    if result <= 0 {
        None
    } else {
        Some(result as *mut u8)
    }
}

/// Obtain a fresh, private, anonymous, read-write mapping of `len` bytes.
pub fn mmap_anon(len: usize) -> Option<*mut u8> {
    // SAFETY: standard anonymous mapping request; no file descriptor is
    // used, so the fd/offset arguments are ignored by the kernel.
    let region = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };
    if region == libc::MAP_FAILED {
        None
    } else {
        Some(region as *mut u8)
    }
}

/// Release a mapping previously obtained from [`mmap_anon`].
///
/// # Safety
/// `ptr`/`len` must exactly match a still-live mapping previously returned
/// by [`mmap_anon`].
pub unsafe fn munmap(ptr: *mut u8, len: usize) -> bool {
    libc::munmap(ptr as *mut libc::c_void, len) == 0
}


/// The system page size, as reported by the configuration syscall
/// (`sysconf(_SC_PAGESIZE)`). Memoized: the value cannot change over the
/// lifetime of a process, so we query the kernel at most once.
pub fn page_size() -> usize {
    static CACHED: AtomicUsize = AtomicUsize::new(0);

    let cached = CACHED.load(Ordering::Relaxed);
    if cached != 0 {
        return cached;
    }

    // SAFETY: sysconf with _SC_PAGESIZE never fails in practice on a
    // POSIX-conforming system; a negative return only happens for
    // unsupported queries, which this is not.
    let queried = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    let size = if queried > 0 { queried as usize } else { 4096 };
    CACHED.store(size, Ordering::Relaxed);
    size
}
