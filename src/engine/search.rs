//! Free-list search: a best-fit scan over the registry.

use crate::engine::registry;
use crate::layout::{Header, Status};

/// Scan the registry starting at `first` for the smallest `FREE` block
/// whose size is `>= need`. Ties are broken by first-encountered.
///
/// Uses `usize::MAX` as the "no candidate yet" sentinel rather than a
/// signed sentinel, so the comparison stays correct for blocks larger
/// than `isize::MAX`.
///
/// # Safety
/// `first` must either be null or point to the head of a valid, acyclic
/// registry.
pub unsafe fn best_fit(first: *mut Header, need: usize) -> Option<*mut Header> {
    let mut best: Option<*mut Header> = None;
    let mut best_size = usize::MAX;

    for block in registry::iter(first) {
        if (*block).status != Status::Free {
            continue;
        }
        let size = (*block).size;
        if size >= need && size < best_size {
            best = Some(block);
            best_size = size;
        }
    }
    best
}
