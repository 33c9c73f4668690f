//! Size-class router: chooses heap vs. mapped backing by comparing the
//! rounded request against a threshold.

use crate::layout::{round8, META_SIZE};

/// Which backing source a request should be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Heap,
    Mapped,
}

/// Route a request of `requested` payload bytes given the routing
/// `threshold` in effect for the calling operation.
///
/// A request of rounded total size `round8(size + META_SIZE)` is routed to
/// the heap when strictly less than the threshold, and to a mapping
/// otherwise.
pub fn route(requested: usize, threshold: usize) -> Class {
    if rounded_total(requested) < threshold {
        Class::Heap
    } else {
        Class::Mapped
    }
}

/// `round8(requested + META_SIZE)`, the total on-disk footprint of a block
/// for `requested` payload bytes.
pub fn rounded_total(requested: usize) -> usize {
    round8(requested + META_SIZE)
}
