//! Backing creation: obtaining raw, header-sized-and-ready
//! memory regions from the kernel. `heap` extends the program break;
//! `mapped` obtains/releases standalone `mmap` regions. Neither module
//! knows about the block registry; they only hand back raw pointers plus
//! the amount of memory actually obtained.

pub mod heap;
pub mod mapped;
