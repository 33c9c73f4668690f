//! The diagnostic print facility used on the fatal-abort path.
//!
//! This writes directly to `stderr` via `write(2)`, bypassing `std::io`'s
//! buffered writers (which may themselves allocate) and bypassing the
//! `tracing` subscriber entirely. It exists solely for the fatal-abort path
//! in [`crate::engine`], which must be able to report a kernel-backing
//! failure even if the process's allocator is the very thing that just
//! failed.
use std::os::unix::io::RawFd;

const STDERR: RawFd = 2;

/// Write `line` (plus a trailing newline) to `stderr`, ignoring errors.
///
/// Does not allocate and does not call back into this crate's allocator.
pub fn write_line(line: &str) {
    // SAFETY: writing a borrowed byte slice to a fixed, always-valid fd.
    // Short writes are possible but are not actionable for a diagnostic
    // best-effort print, so the result is intentionally discarded.
    unsafe {
        libc::write(STDERR, line.as_ptr() as *const libc::c_void, line.len());
        libc::write(STDERR, b"\n".as_ptr() as *const libc::c_void, 1);
    }
}

/// Report a fatal kernel-backing failure and abort the process.
///
/// A failure of the underlying break-extension, mapping, or unmapping
/// syscall is unrecoverable: the address-space invariants the allocator
/// depends on no longer hold, so it makes no attempt to continue and aborts
/// after printing a diagnostic.
pub fn fatal(message: &str) -> ! {
    tracing::error!(%message, "fatal kernel-backing failure, aborting process");
    write_line("breakalloc: fatal: ");
    write_line(message);
    std::process::abort()
}
