//! Configuration surface: the thresholds and sizes the routing and backing
//! logic depend on, plus the page-size probe.

/// The heap-vs-mapping routing threshold used by `alloc` and `realloc`:
/// 128 KiB.
pub const LARGE_ALLOC_LIMIT: usize = 128 * 1024;

/// The size of the one-shot heap preallocation performed on first heap use:
/// a full 128 KiB chunk, regardless of the triggering request's size.
pub const PREALLOCATION_SIZE: usize = 128 * 1024;

/// The routing threshold used by `alloc_zeroed`: the system page size.
/// Zero-allocate routes page-sized-and-larger requests through mappings
/// because freshly mapped pages are already zero-filled by the kernel.
pub fn zeroed_alloc_limit() -> usize {
    crate::sys::page_size()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn large_alloc_limit_is_128_kib() {
        assert_eq!(LARGE_ALLOC_LIMIT, 131_072);
    }

    #[test]
    fn zeroed_alloc_limit_matches_page_size() {
        assert_eq!(zeroed_alloc_limit(), crate::sys::page_size());
    }
}
