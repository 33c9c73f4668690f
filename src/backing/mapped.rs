//! Mapped backing: standalone anonymous mappings for large allocations.
//!
//! Each mapped block is released by exactly one `munmap` call sized to the
//! same length it was created with: mapped blocks are never split, never
//! coalesced, and never reused.

use crate::diagnostics;
use crate::sys;

/// Obtain a fresh private, anonymous, read-write mapping of `total` bytes.
///
/// A failure of the underlying `mmap` syscall is fatal.
pub fn create(total: usize) -> *mut u8 {
    match sys::mmap_anon(total) {
        Some(ptr) => ptr,
        None => diagnostics::fatal("anonymous mapping failed"),
    }
}

/// Release a mapping previously obtained from [`create`].
///
/// # Safety
/// `ptr`/`total` must exactly match a still-live mapping previously
/// returned by [`create`]. A failure of the underlying `munmap` syscall is
/// fatal.
pub unsafe fn release(ptr: *mut u8, total: usize) {
    if !sys::munmap(ptr, total) {
        diagnostics::fatal("unmapping a released block failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_release_roundtrip() {
        let ptr = create(8192);
        assert!(!ptr.is_null());
        assert_eq!(ptr as usize % 8, 0);
        // SAFETY: ptr/8192 exactly match the mapping just created.
        unsafe { release(ptr, 8192) };
    }
}
