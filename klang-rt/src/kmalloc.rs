//! Free-list allocator with segregated bins and boundary-tag coalescing.
//!
//! Every chunk is framed by a 4-byte header and a 4-byte footer holding
//! `(payload << 1) | in_use`, so the previous chunk is reachable through
//! its footer without any side table. Free chunks keep their list link in
//! the first 4 bytes of the payload. Payload sizes are rounded up to
//! multiples of 16 with a 16-byte minimum; address 0 is never handed out
//! and serves as the null pointer.

use klang_types::{
    Fault,
    KernelResult,
};

use crate::heap::Heap;

/// Header plus footer bytes around every payload.
pub const OVERHEAD: u32 = 8;

/// Smallest payload ever carved.
pub const MIN_PAYLOAD: u32 = 16;

/// Payloads up to this size live in the segregated bins.
pub const MAX_SMALL: u32 = 1024;

/// Number of segregated bins, one per 16-byte size class.
pub const BIN_COUNT: usize = 64;

/// First header address; keeps payload addresses nonzero and 8-aligned.
const BASE: u32 = 4;

/// Empty-list marker. No chunk lives at address zero.
const NIL: u32 = 0;

/// The smallest remainder worth splitting off as a new free chunk.
const SPLIT_MIN: u32 = MIN_PAYLOAD + OVERHEAD;

/// Allocator state over a byte heap.
#[derive(Debug, Clone)]
pub struct Malloc {
    bins: [u32; BIN_COUNT],
    large: u32,
    brk: u32,
}

impl Default for Malloc {
    fn default() -> Self {
        Self::new()
    }
}

impl Malloc {
    /// A fresh allocator with an empty arena.
    pub fn new() -> Self {
        Self {
            bins: [NIL; BIN_COUNT],
            large: NIL,
            brk: BASE,
        }
    }

    /// Current break: one past the last carved chunk.
    pub fn brk(&self) -> u32 {
        self.brk
    }

    /// Allocate `size` bytes; the payload address is 8-aligned and nonzero.
    pub fn malloc(&mut self, heap: &mut Heap, size: usize) -> KernelResult<u32> {
        let payload = normalize_size(size)?;

        if let Some((chunk, chunk_payload)) = self.take_fit(heap, payload)? {
            return self.place(heap, chunk, chunk_payload, payload);
        }

        // No fit anywhere: carve at the break.
        let total = payload
            .checked_add(OVERHEAD)
            .ok_or(Fault::OutOfMemory)?;
        let chunk = self.brk;
        let end = chunk.checked_add(total).ok_or(Fault::OutOfMemory)?;
        heap.ensure_capacity(end as usize);
        write_tags(heap, chunk, payload, true)?;
        self.brk = end;
        tracing::trace!(chunk, payload, brk = self.brk, "bump allocation");
        Ok(chunk + OVERHEAD / 2)
    }

    /// Allocate `count * size` zeroed bytes.
    pub fn calloc(&mut self, heap: &mut Heap, count: usize, size: usize) -> KernelResult<u32> {
        let total = count.checked_mul(size).ok_or(Fault::OutOfMemory)?;
        let addr = self.malloc(heap, total)?;
        heap.memset(addr, 0, total)?;
        Ok(addr)
    }

    /// Return a payload to the allocator, coalescing with free neighbors.
    ///
    /// Freeing address 0 is a no-op. Double frees are undefined behavior
    /// per the contract.
    pub fn free(&mut self, heap: &mut Heap, addr: u32) -> KernelResult<()> {
        if addr == NIL {
            return Ok(());
        }
        if addr < BASE + OVERHEAD / 2 {
            return Err(Fault::InvalidAddress);
        }
        let mut chunk = addr - OVERHEAD / 2;
        let (mut payload, _) = read_tag(heap, chunk)?;

        // Absorb the next chunk if it is inside the arena and free.
        let next = chunk + OVERHEAD + payload;
        if next < self.brk {
            let (next_payload, next_used) = read_tag(heap, next)?;
            if !next_used {
                self.unlink(heap, next, next_payload)?;
                payload += next_payload + OVERHEAD;
            }
        }

        // Absorb the previous chunk through its footer.
        if chunk > BASE {
            let (prev_payload, prev_used) = read_tag(heap, chunk - OVERHEAD / 2)?;
            if !prev_used {
                let prev = chunk - OVERHEAD - prev_payload;
                self.unlink(heap, prev, prev_payload)?;
                payload += prev_payload + OVERHEAD;
                chunk = prev;
            }
        }

        write_tags(heap, chunk, payload, false)?;
        self.push(heap, chunk, payload)?;
        tracing::trace!(chunk, payload, "freed chunk");
        Ok(())
    }

    /// Resize a payload, preserving its leading bytes.
    pub fn realloc(&mut self, heap: &mut Heap, addr: u32, new_size: usize) -> KernelResult<u32> {
        if addr == NIL {
            return self.malloc(heap, new_size);
        }
        if new_size == 0 {
            self.free(heap, addr)?;
            return Ok(NIL);
        }
        let chunk = addr - OVERHEAD / 2;
        let (payload, _) = read_tag(heap, chunk)?;
        let wanted = normalize_size(new_size)?;

        if wanted <= payload {
            // Shrink in place, splitting when the tail is a viable chunk.
            if payload - wanted >= SPLIT_MIN {
                write_tags(heap, chunk, wanted, true)?;
                let tail = chunk + OVERHEAD + wanted;
                let tail_payload = payload - wanted - OVERHEAD;
                write_tags(heap, tail, tail_payload, true)?;
                self.free(heap, tail + OVERHEAD / 2)?;
            }
            return Ok(addr);
        }

        // Growth copies: allocate, move the old payload, release it.
        let new_addr = self.malloc(heap, wanted as usize)?;
        heap.memcpy(new_addr, addr, payload as usize)?;
        self.free(heap, addr)?;
        Ok(new_addr)
    }

    /// First fit: the request's bin upward, then the large list.
    fn take_fit(&mut self, heap: &Heap, payload: u32) -> KernelResult<Option<(u32, u32)>> {
        let first_bin = if payload <= MAX_SMALL {
            bin_index(payload)
        } else {
            BIN_COUNT
        };
        for bin in first_bin..BIN_COUNT {
            if let Some(found) = scan_list(heap, self.bins[bin], payload)? {
                return Ok(Some(found));
            }
        }
        Ok(scan_list(heap, self.large, payload)?)
    }

    /// Carve `wanted` out of a free chunk already off its list.
    fn place(
        &mut self,
        heap: &mut Heap,
        chunk: u32,
        chunk_payload: u32,
        wanted: u32,
    ) -> KernelResult<u32> {
        self.unlink(heap, chunk, chunk_payload)?;
        if chunk_payload - wanted >= SPLIT_MIN {
            write_tags(heap, chunk, wanted, true)?;
            let tail = chunk + OVERHEAD + wanted;
            let tail_payload = chunk_payload - wanted - OVERHEAD;
            write_tags(heap, tail, tail_payload, false)?;
            self.push(heap, tail, tail_payload)?;
            tracing::trace!(chunk, wanted, tail_payload, "split chunk");
        } else {
            write_tags(heap, chunk, chunk_payload, true)?;
        }
        Ok(chunk + OVERHEAD / 2)
    }

    fn head_of(&mut self, payload: u32) -> &mut u32 {
        if payload <= MAX_SMALL {
            &mut self.bins[bin_index(payload)]
        } else {
            &mut self.large
        }
    }

    /// Head-insert a free chunk onto its list.
    fn push(&mut self, heap: &mut Heap, chunk: u32, payload: u32) -> KernelResult<()> {
        let head = *self.head_of(payload);
        heap.sw(chunk + OVERHEAD / 2, head as i64)?;
        *self.head_of(payload) = chunk;
        Ok(())
    }

    /// Remove a free chunk from its list.
    fn unlink(&mut self, heap: &mut Heap, chunk: u32, payload: u32) -> KernelResult<()> {
        let next = next_of(heap, chunk)?;
        let head = self.head_of(payload);
        if *head == chunk {
            *head = next;
            return Ok(());
        }
        let mut cursor = *head;
        while cursor != NIL {
            let after = next_of(heap, cursor)?;
            if after == chunk {
                heap.sw(cursor + OVERHEAD / 2, next as i64)?;
                return Ok(());
            }
            cursor = after;
        }
        unreachable!("free chunk is always on the list its size selects")
    }
}

/// Round a request up to the 16-byte granule with the 16-byte floor.
fn normalize_size(size: usize) -> KernelResult<u32> {
    let size = u32::try_from(size).map_err(|_| Fault::OutOfMemory)?;
    let size = size.max(MIN_PAYLOAD);
    size.checked_add(15).map(|s| s & !15).ok_or(Fault::OutOfMemory)
}

fn bin_index(payload: u32) -> usize {
    ((payload >> 4) - 1) as usize
}

fn read_tag(heap: &Heap, at: u32) -> KernelResult<(u32, bool)> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let tag = heap.lwu(at)? as u32;
    Ok((tag >> 1, tag & 1 == 1))
}

/// Stamp matching header and footer tags around a payload.
fn write_tags(heap: &mut Heap, chunk: u32, payload: u32, used: bool) -> KernelResult<()> {
    let tag = ((payload << 1) | used as u32) as i64;
    heap.sw(chunk, tag)?;
    heap.sw(chunk + OVERHEAD / 2 + payload, tag)?;
    Ok(())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn next_of(heap: &Heap, chunk: u32) -> KernelResult<u32> {
    Ok(heap.lwu(chunk + OVERHEAD / 2)? as u32)
}

/// Walk one free list for the first chunk with `payload >= wanted`.
fn scan_list(heap: &Heap, head: u32, wanted: u32) -> KernelResult<Option<(u32, u32)>> {
    let mut cursor = head;
    while cursor != NIL {
        let (payload, _) = read_tag(heap, cursor)?;
        if payload >= wanted {
            return Ok(Some((cursor, payload)));
        }
        cursor = next_of(heap, cursor)?;
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn arena() -> (Heap, Malloc) {
        (Heap::with_capacity(1 << 20), Malloc::new())
    }

    #[test]
    fn payloads_are_aligned_and_disjoint() {
        let (mut heap, mut malloc) = arena();
        let mut chunks = Vec::new();
        for (i, size) in [1usize, 16, 17, 100, 1024, 1025, 5000].iter().enumerate() {
            let addr = malloc.malloc(&mut heap, *size).unwrap();
            assert_ne!(addr, 0);
            assert_eq!(addr % 8, 0, "payload must be 8-aligned");
            heap.memset(addr, i as u8 + 1, *size).unwrap();
            chunks.push((addr, *size, i as u8 + 1));
        }
        for (addr, size, pattern) in chunks {
            assert!(
                heap.read(addr, size).unwrap().iter().all(|&b| b == pattern),
                "chunk at {addr} was clobbered"
            );
            malloc.free(&mut heap, addr).unwrap();
        }
    }

    #[test]
    fn header_and_footer_tags_match() {
        let (mut heap, mut malloc) = arena();
        let addr = malloc.malloc(&mut heap, 48).unwrap();
        let chunk = addr - 4;
        let header = heap.lwu(chunk).unwrap();
        let footer = heap.lwu(chunk + 4 + 48).unwrap();
        assert_eq!(header, footer);
        assert_eq!(header, (48 << 1) | 1);
        malloc.free(&mut heap, addr).unwrap();
        assert_eq!(heap.lwu(chunk).unwrap(), 48 << 1);
    }

    #[test]
    fn free_then_malloc_reuses_the_chunk() {
        let (mut heap, mut malloc) = arena();
        let a = malloc.malloc(&mut heap, 64).unwrap();
        let _pin = malloc.malloc(&mut heap, 64).unwrap();
        malloc.free(&mut heap, a).unwrap();
        let b = malloc.malloc(&mut heap, 64).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn adjacent_frees_coalesce() {
        let (mut heap, mut malloc) = arena();
        let p = malloc.malloc(&mut heap, 128).unwrap();
        let q = malloc.malloc(&mut heap, 128).unwrap();
        // Pin the arena so the coalesced block is interior.
        let _pin = malloc.malloc(&mut heap, 16).unwrap();
        malloc.free(&mut heap, p).unwrap();
        malloc.free(&mut heap, q).unwrap();

        // 128 + 8 + 128 = 264 payload after the merge.
        let r = malloc.malloc(&mut heap, 200).unwrap();
        assert_eq!(r, p, "the merged region satisfies the larger request");
        heap.memset(r, 0x77, 200).unwrap();
        assert!(heap.read(r, 200).unwrap().iter().all(|&b| b == 0x77));
        malloc.free(&mut heap, r).unwrap();
    }

    #[test]
    fn coalescing_works_in_both_directions() {
        let (mut heap, mut malloc) = arena();
        let a = malloc.malloc(&mut heap, 32).unwrap();
        let b = malloc.malloc(&mut heap, 32).unwrap();
        let c = malloc.malloc(&mut heap, 32).unwrap();
        let _pin = malloc.malloc(&mut heap, 16).unwrap();
        // Free the outer chunks first, then the middle: both sides merge.
        malloc.free(&mut heap, a).unwrap();
        malloc.free(&mut heap, c).unwrap();
        malloc.free(&mut heap, b).unwrap();
        let whole = malloc.malloc(&mut heap, 32 * 3 + 16).unwrap();
        assert_eq!(whole, a);
        malloc.free(&mut heap, whole).unwrap();
    }

    #[test]
    fn realloc_preserves_the_prefix() {
        let (mut heap, mut malloc) = arena();
        let p = malloc.malloc(&mut heap, 40).unwrap();
        for i in 0..40 {
            heap.sb(p + i, i as i64 + 1).unwrap();
        }
        let q = malloc.realloc(&mut heap, p, 400).unwrap();
        for i in 0..40 {
            assert_eq!(heap.lbu(q + i).unwrap(), i as i64 + 1);
        }
        let r = malloc.realloc(&mut heap, q, 8).unwrap();
        assert_eq!(r, q, "shrink stays in place");
        for i in 0..8 {
            assert_eq!(heap.lbu(r + i).unwrap(), i as i64 + 1);
        }
        malloc.free(&mut heap, r).unwrap();
    }

    #[test]
    fn realloc_of_null_allocates_and_zero_frees() {
        let (mut heap, mut malloc) = arena();
        let p = malloc.realloc(&mut heap, 0, 32).unwrap();
        assert_ne!(p, 0);
        assert_eq!(malloc.realloc(&mut heap, p, 0).unwrap(), 0);
    }

    #[test]
    fn calloc_zeroes_recycled_memory() {
        let (mut heap, mut malloc) = arena();
        let p = malloc.malloc(&mut heap, 64).unwrap();
        heap.memset(p, 0xFF, 64).unwrap();
        malloc.free(&mut heap, p).unwrap();
        let q = malloc.calloc(&mut heap, 16, 4).unwrap();
        assert_eq!(q, p);
        assert!(heap.read(q, 64).unwrap().iter().all(|&b| b == 0));
        assert_eq!(
            malloc.calloc(&mut heap, usize::MAX, 2),
            Err(Fault::OutOfMemory)
        );
    }

    #[test]
    fn arena_grows_on_demand() {
        let mut heap = Heap::new();
        let mut malloc = Malloc::new();
        let p = malloc.malloc(&mut heap, 4096).unwrap();
        heap.memset(p, 1, 4096).unwrap();
        assert!(heap.size() >= 4096);
        malloc.free(&mut heap, p).unwrap();
    }

    #[test]
    fn mixed_traffic_stays_consistent() {
        use rand::{
            rngs::StdRng,
            Rng,
            SeedableRng,
        };
        let (mut heap, mut malloc) = arena();
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        let mut live: Vec<(u32, usize, u8)> = Vec::new();
        for round in 0..400u32 {
            if live.len() > 24 || (rng.gen_bool(0.4) && !live.is_empty()) {
                let (addr, size, pattern) = live.swap_remove(rng.gen_range(0..live.len()));
                assert!(
                    heap.read(addr, size).unwrap().iter().all(|&b| b == pattern),
                    "round {round}: chunk {addr} corrupted"
                );
                malloc.free(&mut heap, addr).unwrap();
            } else {
                let size = rng.gen_range(1..2500);
                let pattern = (round % 251) as u8;
                let addr = malloc.malloc(&mut heap, size).unwrap();
                heap.memset(addr, pattern, size).unwrap();
                live.push((addr, size, pattern));
            }
        }
        for (addr, size, pattern) in live {
            assert!(heap.read(addr, size).unwrap().iter().all(|&b| b == pattern));
            malloc.free(&mut heap, addr).unwrap();
        }
    }
}
