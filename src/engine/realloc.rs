//! Reallocation planner and the class switch rule. The decision table
//! itself is implemented by [`super::Engine::realloc`]; this module holds
//! the one pure classification rule the table depends on, kept separate so
//! it can be tested in isolation from the pointer arithmetic of the rest
//! of the engine.

use crate::layout::Status;

/// Whether growing/shrinking a block of `current_status` to `new_total`
/// bytes (its `round8(size + META_SIZE)` footprint) requires moving to a
/// different backing source: a mapped block shrinking below the threshold
/// must move to the heap, and a heap block growing past the threshold must
/// move to a mapping.
pub fn needs_class_switch(current_status: Status, new_total: usize, threshold: usize) -> bool {
    match current_status {
        Status::Mapped => new_total < threshold,
        Status::Alloc => new_total >= threshold,
        Status::Free => false,
    }
}
