//! Aligned allocation over the free-list allocator.
//!
//! The aligned payload is carved out of an over-sized chunk; the 4 bytes
//! immediately before the aligned address stash the original payload base
//! so `aligned_free` can hand the real chunk back.

use klang_types::{
    Fault,
    KernelResult,
};

use crate::{
    heap::Heap,
    kmalloc::Malloc,
};

/// `posix_memalign` invalid-argument errno.
pub const EINVAL: i32 = 22;

/// `posix_memalign` out-of-memory errno.
pub const ENOMEM: i32 = 12;

/// Allocate `size` bytes aligned to `alignment` (a power of two).
pub fn aligned_alloc(
    malloc: &mut Malloc,
    heap: &mut Heap,
    alignment: u32,
    size: usize,
) -> KernelResult<u32> {
    if alignment == 0 || !alignment.is_power_of_two() {
        return Err(Fault::InvalidAlignment);
    }
    let slack = alignment as usize - 1 + 4;
    let base = malloc.malloc(heap, size.checked_add(slack).ok_or(Fault::OutOfMemory)?)?;
    let aligned = (base + 4).checked_add(alignment - 1).ok_or(Fault::OutOfMemory)?
        & !(alignment - 1);
    heap.sw(aligned - 4, base as i64)?;
    Ok(aligned)
}

/// Release an address produced by [`aligned_alloc`].
pub fn aligned_free(malloc: &mut Malloc, heap: &mut Heap, addr: u32) -> KernelResult<()> {
    if addr == 0 {
        return Ok(());
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let base = heap.lwu(addr - 4)? as u32;
    malloc.free(heap, base)
}

/// POSIX-shaped aligned allocation: returns `(errno, addr)`.
///
/// The alignment must be a power of two and a multiple of 8, else
/// `(EINVAL, 0)`; allocation failure yields `(ENOMEM, 0)`.
pub fn posix_memalign(
    malloc: &mut Malloc,
    heap: &mut Heap,
    alignment: u32,
    size: usize,
) -> (i32, u32) {
    if alignment == 0 || !alignment.is_power_of_two() || alignment % 8 != 0 {
        return (EINVAL, 0);
    }
    match aligned_alloc(malloc, heap, alignment, size) {
        Ok(addr) => (0, addr),
        Err(_) => (ENOMEM, 0),
    }
}
