//! Byte-addressable memory system of the KLang numeric runtime.
//!
//! The runtime owns a growable little-endian byte heap and layers a
//! free-list allocator, a downward-growing frame allocator, a DATA/BSS name
//! table, typed views and C-style string/memory primitives on top of it.
//! All state lives in an explicit [`Runtime`] context the caller constructs
//! and threads through; no facility is process-global. A `Runtime` is not
//! safe to mutate from multiple threads.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

extern crate alloc;

pub mod clib;
pub mod fastmem;
pub mod gdata;
pub mod heap;
pub mod kaligned;
pub mod kmalloc;
pub mod kstack;
pub mod limbs;
pub mod runtime;
pub mod scalar;
pub mod view;

pub use heap::{
    Heap,
    ToAddr,
};
pub use klang_types::{
    Fault,
    KernelResult,
    Word,
};
pub use runtime::Runtime;
