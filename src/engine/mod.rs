//! The block-tracking engine. This module ties together the size-class
//! router ([`class`]), the free-list search ([`search`]), the
//! splitter/coalescer ([`split`]), the reallocation planner ([`realloc`])
//! and the registry traversal helpers ([`registry`]) into the four public
//! operations, operating on raw block sizes (the wrapping `Layout`-alignment
//! handling lives in [`crate`]'s top level, above this raw, size-only
//! engine).

pub mod class;
pub mod realloc;
pub mod registry;
pub mod search;
pub mod split;

use crate::backing;
use crate::config::LARGE_ALLOC_LIMIT;
use crate::layout::{round8, Header, Status, META_SIZE};

/// The block-tracking engine: the process-wide registry state, plus the
/// four public operations built on top of it.
///
/// The most recently created block is not tracked as a separate field.
/// This implementation derives it on demand instead via [`Engine::tail`],
/// which always walks to the actual last node in the registry: a block
/// most recently *created* is not always the registry's actual tail once
/// splits start carving new trailing blocks out of existing ones without
/// any fresh backing acquisition, so tracking it separately would mean
/// updating it at every split call site instead of in one place. See
/// `DESIGN.md`.
///
/// `Engine` is not thread-safe by itself; [`crate::Allocator`] serializes
/// access with a single mutex.
pub struct Engine {
    /// The head of the registry, used for free-list traversal and
    /// coalescing.
    first_block: *mut Header,
    /// Whether the one-shot heap preallocation has occurred.
    first_alloc: bool,
}

// SAFETY: `Engine` is only ever reached through `crate::Allocator`'s mutex,
// which provides the exclusive access the raw pointers inside `Engine`
// require. The pointers themselves refer to kernel-provided memory that
// outlives the process, not to any thread-local state.
unsafe impl Send for Engine {}

impl Engine {
    /// Construct an empty engine. Process-wide state starts out empty:
    /// nothing is acquired from the kernel until the first allocation.
    pub const fn new() -> Self {
        Self {
            first_block: std::ptr::null_mut(),
            first_alloc: false,
        }
    }

    /// The current tail of the registry: the most recently created block
    /// is, after any split has run, not necessarily the block
    /// `create_backing` most recently produced (a split can carve a fresh
    /// trailing block out of an existing one without any new backing
    /// acquisition). The actual tail of the list is the block that matters
    /// for tail-growth, so that is what this computes, fresh, rather than
    /// tracking a separate field that split and coalesce would otherwise
    /// have to keep in lockstep.
    fn tail(&self) -> *mut Header {
        let mut current = self.first_block;
        if current.is_null() {
            return std::ptr::null_mut();
        }
        unsafe {
            while !(*current).next.is_null() {
                current = (*current).next;
            }
        }
        current
    }

    /// Allocate `requested` payload bytes, routed via `threshold`.
    ///
    /// Returns `None` only for a zero-sized request; any kernel-backing
    /// failure is fatal and never surfaces here.
    pub fn alloc(&mut self, requested: usize, threshold: usize) -> Option<*mut u8> {
        if requested == 0 {
            return None;
        }
        let need = round8(requested);

        // bootstrap the registry.
        if self.first_block.is_null() {
            let block = self.create_backing(requested, threshold);
            self.append(block);
            return Some(self.finish_alloc(block, need));
        }

        // coalesce, then best-fit scan.
        unsafe { split::coalesce(self.first_block) };
        if let Some(block) = unsafe { search::best_fit(self.first_block, need) } {
            return Some(self.reuse_free_block(block, need));
        }

        // grow the tail in place if it is a free heap block. A block can
        // only be `Free` in this registry if it was created as a heap
        // block: mapped blocks are excised before they are ever observed
        // as `Free` (see `free`/`excise_and_unmap`), so this check also
        // rejects growth-in-place on a mapped tail.
        let tail = self.tail();
        if !tail.is_null() {
            if unsafe { (*tail).status } == Status::Free {
                debug_assert!(self.first_alloc, "a free heap tail implies prior heap use");
                let deficit = need - unsafe { (*tail).size };
                let (_start, _grown) = backing::heap::extend(false, deficit);
                unsafe {
                    (*tail).size = need;
                    (*tail).status = Status::Alloc;
                }
                tracing::debug!(block = ?tail, need, "grew tail block in place");
                return Some(unsafe { Header::payload(tail) });
            }
        }

        // create a fresh backing region and append.
        let block = self.create_backing(requested, threshold);
        self.append(block);
        Some(self.finish_alloc(block, need))
    }

    /// Allocate `n * size` bytes of zero-filled memory. `n = 0` or
    /// `size = 0` yields `None`. The `n * size` multiplication is
    /// overflow-checked via `checked_mul`, returning `None` (a degenerate
    /// request, not a fatal error) on overflow.
    pub fn alloc_zeroed(&mut self, n: usize, size: usize) -> Option<*mut u8> {
        if n == 0 || size == 0 {
            return None;
        }
        let total = n.checked_mul(size)?;
        let threshold = crate::config::zeroed_alloc_limit();
        let ptr = self.alloc(total, threshold)?;
        // SAFETY: `alloc` returns a valid pointer to at least `total` bytes.
        unsafe { std::ptr::write_bytes(ptr, 0, total) };
        Some(ptr)
    }

    /// Reallocate the block at `ptr` (or allocate, if `ptr` is `None`) to
    /// `new_size` bytes. Evaluates a decision table top to bottom: shrink
    /// in place, grow in place at the registry tail, grow by absorbing a
    /// following free block, or fall back to allocate-copy-free.
    pub fn realloc(&mut self, ptr: Option<*mut u8>, new_size: usize) -> Option<*mut u8> {
        let Some(ptr) = ptr else {
            return self.alloc(new_size, LARGE_ALLOC_LIMIT);
        };
        if new_size == 0 {
            self.free(Some(ptr));
            return None;
        }

        let header = unsafe { Header::from_payload(ptr) };
        let status = unsafe { (*header).status };
        if status == Status::Free {
            // use-after-free: reallocating an already-freed block is an
            // error, reported as `None` without modifying any state.
            tracing::error!(block = ?header, "realloc called on a freed block");
            return None;
        }

        let need = round8(new_size);
        let new_total = class::rounded_total(new_size);

        if realloc::needs_class_switch(status, new_total, LARGE_ALLOC_LIMIT) {
            tracing::debug!(block = ?header, new_size, "realloc crossing size classes, falling back to copy");
            return self.fallback_copy(header, ptr, new_size);
        }

        let current_size = unsafe { (*header).size };

        // row 5: shrink in place.
        if current_size >= need {
            if status == Status::Alloc && unsafe { split::can_split(header, need) } {
                unsafe {
                    split::split(header, need);
                    (*header).status = Status::Alloc;
                }
            }
            return Some(ptr);
        }

        if status == Status::Alloc {
            // row 6: grow in place at the registry tail.
            if self.tail() == header && need < LARGE_ALLOC_LIMIT {
                let deficit = need - current_size;
                let (_start, _grown) = backing::heap::extend(false, deficit);
                unsafe { (*header).size = need };
                tracing::debug!(block = ?header, need, "grew reallocated tail block in place");
                return Some(ptr);
            }

            // row 7: absorb a following free block.
            let next = unsafe { (*header).next };
            if !next.is_null() && unsafe { (*next).status } == Status::Free {
                let combined = current_size + META_SIZE + unsafe { (*next).size };
                if combined >= need {
                    unsafe {
                        (*header).size = combined;
                        (*header).next = (*next).next;
                        if split::can_split(header, need) {
                            split::split(header, need);
                            (*header).status = Status::Alloc;
                        }
                    }
                    tracing::debug!(block = ?header, need, "absorbed following free block");
                    return Some(ptr);
                }
            }
        }

        // row 8: otherwise, fallback copy.
        self.fallback_copy(header, ptr, new_size)
    }

    /// Release the block at `ptr`. A `None` pointer is a no-op.
    pub fn free(&mut self, ptr: Option<*mut u8>) {
        let Some(ptr) = ptr else { return };
        let header = unsafe { Header::from_payload(ptr) };
        let status = unsafe { (*header).status };

        if status == Status::Mapped {
            // A mapped block is excised from the registry and unmapped
            // directly, without ever being marked `Free` and exposed to
            // the generic coalescing sweep, which has no physical-adjacency
            // check and would otherwise be free to "merge" a just-freed
            // mapped block into an unrelated registry-adjacent heap block.
            self.excise_and_unmap(header);
            return;
        }

        unsafe {
            (*header).status = Status::Free;
            split::coalesce(self.first_block);
        }
        tracing::trace!(block = ?header, "freed heap block");
    }

    /// Create a new block for `requested` payload bytes, routed via
    /// `threshold`. The block's `size` is set to the full capacity of the
    /// region actually obtained (which, for heap blocks, may exceed the
    /// request on the very first allocation ever); callers are responsible
    /// for splitting off any surplus.
    fn create_backing(&mut self, requested: usize, threshold: usize) -> *mut Header {
        let total = class::rounded_total(requested);
        match class::route(requested, threshold) {
            class::Class::Heap => {
                let (start, delta) = backing::heap::extend(!self.first_alloc, total);
                self.first_alloc = true;
                let header = start as *mut Header;
                let capacity = delta - META_SIZE;
                unsafe {
                    *header = Header {
                        size: capacity,
                        status: Status::Alloc,
                        next: std::ptr::null_mut(),
                    };
                }
                tracing::debug!(block = ?header, capacity, "created heap-backed block");
                header
            }
            class::Class::Mapped => {
                let start = backing::mapped::create(total);
                let header = start as *mut Header;
                unsafe {
                    *header = Header {
                        size: total - META_SIZE,
                        status: Status::Mapped,
                        next: std::ptr::null_mut(),
                    };
                }
                tracing::debug!(block = ?header, size = total - META_SIZE, "created mapped block");
                header
            }
        }
    }

    /// Append `block` to the registry as the new tail.
    fn append(&mut self, block: *mut Header) {
        unsafe { (*block).next = std::ptr::null_mut() };
        let tail = self.tail();
        if tail.is_null() {
            self.first_block = block;
        } else {
            unsafe { (*tail).next = block };
        }
    }

    /// Shared tail of both the bootstrap path and the "create new backing"
    /// path: split off any surplus down to `need` bytes (only ever
    /// possible for heap blocks; mapped blocks are created at exactly
    /// `need` bytes and so never have a splittable surplus) and return the
    /// payload pointer.
    fn finish_alloc(&mut self, block: *mut Header, need: usize) -> *mut u8 {
        unsafe {
            // `create_backing` already set the right status (`Alloc` for a
            // heap block, `Mapped` for a mapped one); only heap blocks can
            // ever have a splittable surplus (mapped blocks are created at
            // exactly `need` bytes and must never be split), so the split
            // is gated on status rather than class.
            if (*block).status == Status::Alloc && split::can_split(block, need) {
                split::split(block, need);
            }
            Header::payload(block)
        }
    }

    /// Reuse a `Free` block found by the best-fit scan: split off any
    /// surplus down to `need` bytes and mark it `Alloc`.
    fn reuse_free_block(&mut self, block: *mut Header, need: usize) -> *mut u8 {
        unsafe {
            if split::can_split(block, need) {
                split::split(block, need);
            }
            (*block).status = Status::Alloc;
            Header::payload(block)
        }
    }

    /// Allocate a new block, copy the old contents over, and free the old
    /// block: the fallback path taken whenever no in-place reallocation
    /// strategy applies.
    fn fallback_copy(&mut self, header: *mut Header, ptr: *mut u8, new_size: usize) -> Option<*mut u8> {
        let new_ptr = self.alloc(new_size, LARGE_ALLOC_LIMIT)?;
        unsafe {
            let copy_len = (*header).size.min(round8(new_size));
            std::ptr::copy_nonoverlapping(ptr, new_ptr, copy_len);
        }
        self.free(Some(ptr));
        Some(new_ptr)
    }

    /// Splice `header` out of the registry and unmap its region. A mapped
    /// block is excised regardless of its position in the registry, not
    /// just when it happens to be the head or tail.
    fn excise_and_unmap(&mut self, header: *mut Header) {
        let size = unsafe { (*header).size };
        let total = size + META_SIZE;
        let next = unsafe { (*header).next };
        let pred = unsafe { registry::predecessor_of(self.first_block, header) };

        match pred {
            Some(p) => unsafe { (*p).next = next },
            None => self.first_block = next,
        }

        tracing::debug!(block = ?header, total, "excising and unmapping block");
        // SAFETY: `header` was created by `backing::mapped::create` with
        // exactly `total` bytes and has just been removed from the
        // registry, so nothing else can reach it after this call.
        unsafe { backing::mapped::release(header as *mut u8, total) };
    }
}
