//! Heap backing: growing the program break.
//!
//! The very first heap extension ever performed always preallocates
//! [`PREALLOCATION_SIZE`] bytes regardless of the triggering request's size;
//! every subsequent extension grows by exactly the rounded request.

use crate::config::PREALLOCATION_SIZE;
use crate::diagnostics;
use crate::sys;

/// Extend the program break to back a new block.
///
/// `total` is `round8(requested_payload + META_SIZE)`, the number of bytes
/// the new block (header + payload) will occupy, *except* on the very first
/// call (`first_alloc == false`), where the break is always extended by
/// [`PREALLOCATION_SIZE`] instead.
///
/// Returns the start address of the newly available region (the old break)
/// and the number of bytes actually made available (which may exceed
/// `total` on the first call).
///
/// A failure of the underlying `brk` syscall is fatal: the monotonic-break
/// invariant (the program break never decreases) would otherwise be
/// unrecoverable to uphold.
pub fn extend(first_alloc: bool, total: usize) -> (*mut u8, usize) {
    let delta = if first_alloc { PREALLOCATION_SIZE } else { total };

    match sys::brk_grow(delta) {
        Some(start) => (start, delta),
        None => diagnostics::fatal("program break extension failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_extension_always_preallocates() {
        let _guard = sys::test_utils::lock_brk();
        let (_start, size) = extend(true, 64);
        assert_eq!(size, PREALLOCATION_SIZE);
    }

    #[test]
    fn later_extension_matches_requested_total() {
        let _guard = sys::test_utils::lock_brk();
        let (_start, size) = extend(false, 256);
        assert_eq!(size, 256);
    }

    #[test]
    fn successive_extensions_do_not_overlap() {
        let _guard = sys::test_utils::lock_brk();
        let (first, first_size) = extend(false, 128);
        let (second, _) = extend(false, 128);
        assert!(second as usize >= first as usize + first_size);
    }
}
