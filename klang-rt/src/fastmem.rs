//! Word-at-a-time memory and string primitives over raw byte slices.
//!
//! Bulk loops move eight bytes per step with a scalar epilogue for the
//! tail; `strlen` uses the SWAR zero-byte test. The heap's `memset`,
//! `memcpy` and `memmove` route through here.

use klang_types::{
    Fault,
    KernelResult,
};

const WORD: usize = 8;

/// SWAR constants for the zero-byte test.
const LOW_ONES: u64 = 0x0101_0101_0101_0101;
const HIGH_BITS: u64 = 0x8080_8080_8080_8080;

fn check_range(len: usize, start: usize, count: usize) -> KernelResult<()> {
    match start.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        _ => Err(Fault::HeapBounds),
    }
}

/// Fill `[start, start+count)` with `value`, a word at a time.
pub fn fill(buf: &mut [u8], start: usize, count: usize, value: u8) -> KernelResult<()> {
    check_range(buf.len(), start, count)?;
    let pattern = (value as u64).wrapping_mul(LOW_ONES);
    let window = &mut buf[start..start + count];
    let mut chunks = window.chunks_exact_mut(WORD);
    for chunk in &mut chunks {
        chunk.copy_from_slice(&pattern.to_le_bytes());
    }
    for byte in chunks.into_remainder() {
        *byte = value;
    }
    Ok(())
}

fn load_word(buf: &[u8], at: usize) -> u64 {
    let mut word = [0u8; WORD];
    word.copy_from_slice(&buf[at..at + WORD]);
    u64::from_le_bytes(word)
}

fn store_word(buf: &mut [u8], at: usize, word: u64) {
    buf[at..at + WORD].copy_from_slice(&word.to_le_bytes());
}

/// Copy `count` bytes from `src` to `dst`, ascending.
///
/// Safe for overlap only when `dst <= src`.
pub fn copy_forward(
    buf: &mut [u8],
    dst: usize,
    src: usize,
    count: usize,
) -> KernelResult<()> {
    check_range(buf.len(), dst, count)?;
    check_range(buf.len(), src, count)?;
    let words = count / WORD;
    for i in 0..words {
        let word = load_word(buf, src + i * WORD);
        store_word(buf, dst + i * WORD, word);
    }
    for i in words * WORD..count {
        buf[dst + i] = buf[src + i];
    }
    Ok(())
}

/// Copy `count` bytes from `src` to `dst`, descending.
///
/// Safe for overlap only when `dst >= src`.
pub fn copy_backward(
    buf: &mut [u8],
    dst: usize,
    src: usize,
    count: usize,
) -> KernelResult<()> {
    check_range(buf.len(), dst, count)?;
    check_range(buf.len(), src, count)?;
    let words = count / WORD;
    for i in (words * WORD..count).rev() {
        buf[dst + i] = buf[src + i];
    }
    for i in (0..words).rev() {
        let word = load_word(buf, src + i * WORD);
        store_word(buf, dst + i * WORD, word);
    }
    Ok(())
}

/// Overlap-aware copy: picks the direction that preserves the source.
pub fn move_bytes(
    buf: &mut [u8],
    dst: usize,
    src: usize,
    count: usize,
) -> KernelResult<()> {
    if dst <= src {
        copy_forward(buf, dst, src, count)
    } else {
        copy_backward(buf, dst, src, count)
    }
}

/// Length of the NUL-terminated string at `start`.
///
/// Scans a word at a time once aligned; fails with [`Fault::HeapBounds`] if
/// no terminator exists before the end of the buffer.
pub fn strlen(buf: &[u8], start: usize) -> KernelResult<usize> {
    if start > buf.len() {
        return Err(Fault::HeapBounds);
    }
    let mut at = start;
    // Byte-wise prologue up to word alignment.
    while at < buf.len() && at % WORD != 0 {
        if buf[at] == 0 {
            return Ok(at - start);
        }
        at += 1;
    }
    // Word-wise scan with the zero-byte test.
    while at + WORD <= buf.len() {
        let word = load_word(buf, at);
        if word.wrapping_sub(LOW_ONES) & !word & HIGH_BITS != 0 {
            break;
        }
        at += WORD;
    }
    // Scalar epilogue inside the hit word or buffer tail.
    while at < buf.len() {
        if buf[at] == 0 {
            return Ok(at - start);
        }
        at += 1;
    }
    Err(Fault::HeapBounds)
}

/// Find `byte` in `[start, start+count)`, returning its absolute offset.
pub fn memchr(buf: &[u8], start: usize, byte: u8, count: usize) -> KernelResult<Option<usize>> {
    check_range(buf.len(), start, count)?;
    Ok(buf[start..start + count]
        .iter()
        .position(|&b| b == byte)
        .map(|i| start + i))
}

/// Compare `[a, a+count)` against `[b, b+count)` as unsigned bytes.
pub fn memcmp(buf: &[u8], a: usize, b: usize, count: usize) -> KernelResult<i32> {
    check_range(buf.len(), a, count)?;
    check_range(buf.len(), b, count)?;
    let words = count / WORD;
    for i in 0..words {
        // Word-sized equality fast path; byte scan only on mismatch.
        if load_word(buf, a + i * WORD) != load_word(buf, b + i * WORD) {
            for j in i * WORD..(i + 1) * WORD {
                let (x, y) = (buf[a + j], buf[b + j]);
                if x != y {
                    return Ok(x as i32 - y as i32);
                }
            }
        }
    }
    for j in words * WORD..count {
        let (x, y) = (buf[a + j], buf[b + j]);
        if x != y {
            return Ok(x as i32 - y as i32);
        }
    }
    Ok(0)
}
