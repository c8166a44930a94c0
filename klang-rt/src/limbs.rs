//! Heap-backed limb arrays: in-place 16-bit limb shifts and 128-bit
//! integers stored as packed little-endian bytes.
//!
//! These are the heap-address overloads of the slice kernels in
//! `klang_bits`: the window is loaded through the heap's little-endian
//! halfword accessors, run through the same limb algorithms, and stored
//! back, so both forms produce identical limbs and `(carry_out, sticky)`.

use alloc::vec::Vec;
use core::cmp::Ordering;

use klang_bits::{
    limbs as bits_limbs,
    limbs::LimbShift,
    Swar128,
};
use klang_types::KernelResult;

use crate::heap::Heap;

/// Bytes per 128-bit heap integer.
pub const U128_BYTES: usize = 16;

fn load_window(heap: &Heap, addr: u32, len: usize) -> KernelResult<Vec<u16>> {
    let mut limbs = Vec::with_capacity(len);
    for i in 0..len {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        limbs.push(heap.lhu(addr + 2 * i as u32)? as u16);
    }
    Ok(limbs)
}

fn store_window(heap: &mut Heap, addr: u32, limbs: &[u16]) -> KernelResult<()> {
    for (i, &limb) in limbs.iter().enumerate() {
        heap.sh(addr + 2 * i as u32, limb as i64)?;
    }
    Ok(())
}

/// In-place left shift of `len` packed limbs at `addr` by `s ∈ [0, 15]`.
pub fn shl16_le_in_place(
    heap: &mut Heap,
    addr: u32,
    len: usize,
    s: u32,
    carry_in: u16,
) -> KernelResult<LimbShift> {
    let mut limbs = load_window(heap, addr, len)?;
    let shift = bits_limbs::shl16_le_in_place(&mut limbs, 0, len, s, carry_in)?;
    store_window(heap, addr, &limbs)?;
    Ok(shift)
}

/// In-place right shift of `len` packed limbs at `addr` by `s ∈ [0, 15]`.
pub fn rsh16_le_in_place(
    heap: &mut Heap,
    addr: u32,
    len: usize,
    s: u32,
) -> KernelResult<LimbShift> {
    let mut limbs = load_window(heap, addr, len)?;
    let shift = bits_limbs::rsh16_le_in_place(&mut limbs, 0, len, s)?;
    store_window(heap, addr, &limbs)?;
    Ok(shift)
}

/// In-place whole-limb left shift of the window at `addr`.
pub fn shl16_le_words_in_place(
    heap: &mut Heap,
    addr: u32,
    len: usize,
    words: usize,
) -> KernelResult<()> {
    let mut limbs = load_window(heap, addr, len)?;
    bits_limbs::shl16_le_words_in_place(&mut limbs, 0, len, words)?;
    store_window(heap, addr, &limbs)
}

/// Heap-backed 128-bit unsigned integers as 16 packed little-endian bytes.
pub mod heap_u128 {
    use super::*;

    /// Read the 128-bit value at `addr`.
    pub fn load(heap: &Heap, addr: u32) -> KernelResult<Swar128> {
        Ok(Swar128::from_le_bytes(heap.read_bytes(addr)?))
    }

    /// Write a 128-bit value to `addr`.
    pub fn store(heap: &mut Heap, addr: u32, value: Swar128) -> KernelResult<()> {
        heap.write_bytes(addr, value.to_le_bytes())
    }

    /// `dst ← a + b`; returns the carry-out bit.
    pub fn add(heap: &mut Heap, dst: u32, a: u32, b: u32) -> KernelResult<u32> {
        let (sum, carry) = load(heap, a)?.add(load(heap, b)?);
        store(heap, dst, sum)?;
        Ok(carry)
    }

    /// `dst ← a − b`; returns the borrow-out bit.
    pub fn sub(heap: &mut Heap, dst: u32, a: u32, b: u32) -> KernelResult<u32> {
        let (diff, borrow) = load(heap, a)?.sub(load(heap, b)?);
        store(heap, dst, diff)?;
        Ok(borrow)
    }

    /// `dst ← src << n`; returns the 128-bit spill.
    pub fn shift_left(
        heap: &mut Heap,
        dst: u32,
        src: u32,
        n: u32,
    ) -> KernelResult<Swar128> {
        let (value, spill) = load(heap, src)?.shift_left(n)?;
        store(heap, dst, value)?;
        Ok(spill)
    }

    /// `dst ← src >> n`; returns the 128-bit spill.
    pub fn shift_right(
        heap: &mut Heap,
        dst: u32,
        src: u32,
        n: u32,
    ) -> KernelResult<Swar128> {
        let (value, spill) = load(heap, src)?.shift_right(n)?;
        store(heap, dst, value)?;
        Ok(spill)
    }

    /// Unsigned comparison of the values at `a` and `b`.
    pub fn compare(heap: &Heap, a: u32, b: u32) -> KernelResult<Ordering> {
        Ok(load(heap, a)?.compare(load(heap, b)?))
    }

    /// `dst ← src × factor`; returns the overflow limb.
    pub fn mul_small(
        heap: &mut Heap,
        dst: u32,
        src: u32,
        factor: u16,
    ) -> KernelResult<u16> {
        let (product, overflow) = load(heap, src)?.mul_small(factor);
        store(heap, dst, product)?;
        Ok(overflow)
    }
}
