//! Little-endian byte manipulation helpers.
//!
//! Every multi-byte value in the runtime crosses the byte boundary in
//! little-endian order: a 32-bit store of `0x12345678` places
//! `0x78, 0x56, 0x34, 0x12` at ascending addresses.

use crate::Word;

/// Memory size of a [`Word`].
pub const WORD_SIZE: usize = core::mem::size_of::<Word>();

/// Return the word-padded length of an arbitrary length.
pub const fn padded_len(len: usize) -> usize {
    let pad = len % WORD_SIZE;
    len + (pad != 0) as usize * (WORD_SIZE - pad)
}

/// Compose up to eight little-endian bytes into an unsigned value.
///
/// Bytes past the end of `bytes` read as zero.
pub fn compose_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; WORD_SIZE];
    let take = bytes.len().min(WORD_SIZE);
    buf[..take].copy_from_slice(&bytes[..take]);
    u64::from_le_bytes(buf)
}

/// Decompose an unsigned value into its eight little-endian bytes.
pub fn decompose_le(value: u64) -> [u8; WORD_SIZE] {
    value.to_le_bytes()
}

/// Store a word into this buffer, little-endian.
pub fn store_word_le(buf: &mut [u8; WORD_SIZE], value: Word) {
    buf.copy_from_slice(&value.to_le_bytes());
}

/// Read a word from a buffer, little-endian.
pub fn restore_word_le(buf: [u8; WORD_SIZE]) -> Word {
    Word::from_le_bytes(buf)
}

/// Compose a 16-bit limb from its little-endian byte pair.
pub const fn limb_from_le(lo: u8, hi: u8) -> u16 {
    (lo as u16) | ((hi as u16) << 8)
}

/// Decompose a 16-bit limb into its little-endian byte pair.
#[allow(clippy::cast_possible_truncation)]
pub const fn limb_to_le(limb: u16) -> (u8, u8) {
    (limb as u8, (limb >> 8) as u8)
}
