//! Splitter/coalescer: carving an over-fit block's unused suffix into a
//! new free block, and merging adjacent free blocks back together.

use crate::layout::{Header, Status, META_SIZE, MIN_SPLIT_RESIDUAL};

/// Whether splitting `block` down to a payload of `new_size` bytes is legal,
/// i.e. the residual can hold a header plus at least one aligned byte.
///
/// # Safety
/// `block` must point to a valid, live [`Header`].
pub unsafe fn can_split(block: *mut Header, new_size: usize) -> bool {
    (*block).size - new_size >= MIN_SPLIT_RESIDUAL
}

/// Split `block` down to a payload of `new_size` bytes, carving the suffix
/// off into a new `FREE` block spliced into the registry right after
/// `block`.
///
/// The caller is responsible for setting `block`'s final status (`Alloc` or
/// otherwise) after calling this; this function only shrinks its size and
/// creates the remainder.
///
/// # Safety
/// `block` must point to a valid, live [`Header`] and [`can_split`] must
/// hold for `(block, new_size)`.
pub unsafe fn split(block: *mut Header, new_size: usize) {
    debug_assert!(can_split(block, new_size));

    let old_size = (*block).size;
    let remainder_size = old_size - new_size - META_SIZE;

    let remainder = Header::payload(block).add(new_size) as *mut Header;
    *remainder = Header {
        size: remainder_size,
        status: Status::Free,
        next: (*block).next,
    };

    (*block).size = new_size;
    (*block).next = remainder;

    tracing::trace!(
        block = ?block,
        new_size,
        remainder = ?remainder,
        remainder_size,
        "split block"
    );
}

/// Run one coalescing sweep of the registry starting at `first`: merge any
/// two adjacent `FREE` blocks by absorbing the right into the left, and
/// keep re-examining the same left position in case a newly exposed right
/// neighbour is also free.
///
/// Mapped blocks never participate: their status is never `Free` while they
/// are live, so they are naturally skipped by the `Free`-status check.
///
/// # Safety
/// `first` must either be null or point to the head of a valid, acyclic
/// registry.
pub unsafe fn coalesce(first: *mut Header) {
    let mut left = first;
    while !left.is_null() {
        while (*left).status == Status::Free {
            let right = (*left).next;
            if right.is_null() || (*right).status != Status::Free {
                break;
            }
            (*left).size += META_SIZE + (*right).size;
            (*left).next = (*right).next;
            tracing::trace!(left = ?left, right = ?right, merged_size = (*left).size, "coalesced adjacent free blocks");
        }
        left = (*left).next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::registry::tests_support::make_free_block;

    #[test]
    fn split_produces_a_free_remainder_of_the_correct_size() {
        unsafe {
            let block = make_free_block(1000);
            assert!(can_split(block, 64));
            split(block, 64);

            assert_eq!((*block).size, 64);
            let remainder = (*block).next;
            assert!(!remainder.is_null());
            assert_eq!((*remainder).status, Status::Free);
            assert_eq!((*remainder).size, 1000 - 64 - META_SIZE);
        }
    }

    #[test]
    fn split_is_illegal_when_residual_too_small() {
        unsafe {
            let block = make_free_block(64);
            assert!(!can_split(block, 64 - MIN_SPLIT_RESIDUAL + 1));
        }
    }

    #[test]
    fn coalesce_merges_two_adjacent_free_blocks() {
        unsafe {
            let left = make_free_block(32);
            split(left, 8);
            // after split: left.size=8 (Free), right is Free with remainder
            let right = (*left).next;
            assert_eq!((*right).status, Status::Free);

            coalesce(left);
            assert_eq!((*left).size, 8 + META_SIZE + (32 - 8 - META_SIZE));
            assert!((*left).next.is_null());
        }
    }

    #[test]
    fn coalesce_merges_a_chain_of_three_free_blocks() {
        unsafe {
            let a = make_free_block(200);
            split(a, 16);
            let b = (*a).next;
            split(b, 16);
            let c = (*b).next;
            assert_eq!((*c).status, Status::Free);

            coalesce(a);
            assert!((*a).next.is_null());
            // Merging reclaims b's and c's headers back into usable payload,
            // so the total is exactly the original, pre-split size.
            assert_eq!((*a).size, 200);
        }
    }

    #[test]
    fn coalesce_does_not_merge_across_an_alloc_block() {
        unsafe {
            let a = make_free_block(64);
            split(a, 8);
            let b = (*a).next;
            (*b).status = Status::Alloc;

            coalesce(a);
            assert_eq!((*a).status, Status::Free);
            assert_eq!((*a).size, 8);
            assert_eq!((*a).next, b);
        }
    }
}
