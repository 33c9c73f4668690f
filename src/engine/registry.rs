//! The block registry: an intrusive singly-linked list of every block the
//! allocator has ever created, in acquisition order.

use crate::layout::Header;

/// Iterate the registry starting at `first`, yielding each block's header
/// pointer in acquisition/list order.
///
/// # Safety
/// `first` must either be null or point to the head of a valid, acyclic
/// registry.
pub unsafe fn iter(first: *mut Header) -> RegistryIter {
    RegistryIter { current: first }
}

pub struct RegistryIter {
    current: *mut Header,
}

impl Iterator for RegistryIter {
    type Item = *mut Header;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_null() {
            return None;
        }
        let block = self.current;
        // SAFETY: `block` is non-null and, by this type's safety contract,
        // part of a valid registry.
        self.current = unsafe { (*block).next };
        Some(block)
    }
}

/// Find the predecessor of `target` in the registry started by `first`, if
/// any. Returns `None` if `target` has no predecessor (i.e. it is `first`
/// itself, or not part of the registry at all).
///
/// # Safety
/// Same as [`iter`].
pub unsafe fn predecessor_of(first: *mut Header, target: *mut Header) -> Option<*mut Header> {
    let mut current = first;
    while !current.is_null() {
        if (*current).next == target {
            return Some(current);
        }
        current = (*current).next;
    }
    None
}

#[cfg(test)]
pub(crate) mod tests_support {
    use crate::layout::{Header, Status};
    use std::alloc::{alloc, Layout};

    /// Leak a standalone, isolated `Free` block of the given payload `size`
    /// for use in unit tests that exercise `engine::split`/`engine::search`
    /// directly, without going through the real heap/mapped backing.
    pub fn make_free_block(size: usize) -> *mut Header {
        let total = crate::layout::META_SIZE + size;
        let layout = Layout::from_size_align(total, 8).unwrap();
        // SAFETY: a fresh, appropriately sized and aligned allocation.
        let raw = unsafe { alloc(layout) } as *mut Header;
        assert!(!raw.is_null(), "test allocation failed");
        unsafe {
            *raw = Header {
                size,
                status: Status::Free,
                next: std::ptr::null_mut(),
            };
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::make_free_block;
    use super::*;

    #[test]
    fn iter_yields_blocks_in_list_order() {
        unsafe {
            let a = make_free_block(8);
            let b = make_free_block(8);
            (*a).next = b;

            let collected: Vec<_> = iter(a).collect();
            assert_eq!(collected, vec![a, b]);
        }
    }

    #[test]
    fn iter_over_empty_registry_yields_nothing() {
        unsafe {
            assert_eq!(iter(std::ptr::null_mut()).count(), 0);
        }
    }

    #[test]
    fn predecessor_of_finds_the_right_block() {
        unsafe {
            let a = make_free_block(8);
            let b = make_free_block(8);
            let c = make_free_block(8);
            (*a).next = b;
            (*b).next = c;

            assert_eq!(predecessor_of(a, c), Some(b));
            assert_eq!(predecessor_of(a, a), None);
            assert_eq!(predecessor_of(a, std::ptr::null_mut()), None);
        }
    }
}
