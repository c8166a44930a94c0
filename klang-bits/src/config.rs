//! Runtime auto-validation and caching of the shift mode per width.
//!
//! The first `Auto`-mode operation on a width cross-checks the native and
//! arithmetic implementations over a fixed corpus and memoizes the winner in
//! a process-wide atomic slot (first writer wins, so concurrent first use
//! stays deterministic). Reassigning the default mode clears the cache.

use core::sync::atomic::{
    AtomicU8,
    Ordering,
};

use klang_types::{
    BitWidth,
    ResolvedMode,
    ShiftMode,
    Word,
};
use strum::IntoEnumIterator;

use crate::engine::BitEngine;

static DEFAULT_MODE: AtomicU8 = AtomicU8::new(ShiftMode::Auto as u8);

const UNRESOLVED: u8 = 0;

static RESOLVED: [AtomicU8; 4] = [
    AtomicU8::new(UNRESOLVED),
    AtomicU8::new(UNRESOLVED),
    AtomicU8::new(UNRESOLVED),
    AtomicU8::new(UNRESOLVED),
];

fn slot(width: BitWidth) -> &'static AtomicU8 {
    match width {
        BitWidth::W8 => &RESOLVED[0],
        BitWidth::W16 => &RESOLVED[1],
        BitWidth::W32 => &RESOLVED[2],
        BitWidth::W64 => &RESOLVED[3],
    }
}

fn decode(raw: u8) -> ResolvedMode {
    if raw == ResolvedMode::Arithmetic as u8 {
        ResolvedMode::Arithmetic
    } else {
        ResolvedMode::Native
    }
}

/// The process-wide default mode applied to `Auto` engines.
pub fn default_mode() -> ShiftMode {
    ShiftMode::from(DEFAULT_MODE.load(Ordering::Relaxed))
}

/// Reassign the default mode and clear every cached resolution.
pub fn set_default_mode(mode: ShiftMode) {
    DEFAULT_MODE.store(mode as u8, Ordering::Relaxed);
    for width in BitWidth::iter() {
        slot(width).store(UNRESOLVED, Ordering::Relaxed);
    }
}

/// Resolve `Auto` for a width, memoized per process.
pub fn resolve(width: BitWidth) -> ResolvedMode {
    let cached = slot(width).load(Ordering::Relaxed);
    if cached != UNRESOLVED {
        return decode(cached);
    }
    let resolved = resolve_uncached(width);
    // First writer wins; a concurrent resolution computed the same value.
    let _ = slot(width).compare_exchange(
        UNRESOLVED,
        resolved as u8,
        Ordering::Relaxed,
        Ordering::Relaxed,
    );
    decode(slot(width).load(Ordering::Relaxed))
}

fn resolve_uncached(width: BitWidth) -> ResolvedMode {
    match default_mode() {
        ShiftMode::Native => return ResolvedMode::Native,
        ShiftMode::Arithmetic => {
            return if width == BitWidth::W64 {
                ResolvedMode::Native
            } else {
                ResolvedMode::Arithmetic
            }
        }
        ShiftMode::Auto => {}
    }
    if width == BitWidth::W64 {
        // No arithmetic implementation above 32 bits.
        tracing::debug!(width = width.bits(), "auto mode resolved to native");
        return ResolvedMode::Native;
    }
    let diverged = corpus_diverges(width);
    let resolved = if diverged {
        ResolvedMode::Arithmetic
    } else {
        ResolvedMode::Native
    };
    tracing::debug!(
        width = width.bits(),
        diverged,
        mode = %ShiftMode::from(resolved),
        "auto shift mode resolved"
    );
    resolved
}

/// Compare native and arithmetic outputs over the validation corpus.
///
/// Returns `true` if any `(value, carry)` pair differs, in which case the
/// host's native operators cannot be trusted for this width.
fn corpus_diverges(width: BitWidth) -> bool {
    let native = BitEngine::new(width, ShiftMode::Native);
    let arith = BitEngine::new(width, ShiftMode::Arithmetic);
    for value in corpus_values(width) {
        for n in 0..width.bits() {
            let (ln, la) = (native.left_shift(value, n), arith.left_shift(value, n));
            if ln.value != la.value || ln.carry != la.carry {
                return true;
            }
            if native.right_shift(value, n).value != arith.right_shift(value, n).value {
                return true;
            }
            let (un, ua) = (
                native.unsigned_right_shift(value, n),
                arith.unsigned_right_shift(value, n),
            );
            if un.value != ua.value {
                return true;
            }
        }
    }
    false
}

#[allow(clippy::cast_possible_wrap)]
fn corpus_values(width: BitWidth) -> [Word; 7] {
    let max = width.max_value();
    [
        0,
        1,
        max,
        max - 1,
        (width.sign_bit() & width.mask()) as Word,
        (0x5555_5555_5555_5555u64 & width.mask()) as Word,
        (0xAAAA_AAAA_AAAA_AAAAu64 & width.mask()) as Word,
    ]
}

/// Restores the previous default mode when dropped.
#[must_use = "dropping the guard immediately restores the previous mode"]
pub struct ModeGuard {
    prev: ShiftMode,
}

impl Drop for ModeGuard {
    fn drop(&mut self) {
        set_default_mode(self.prev);
    }
}

/// Run `f` with `mode` as the default, restoring the previous default on
/// both normal and unwinding exit.
pub fn with_mode<R>(mode: ShiftMode, f: impl FnOnce() -> R) -> R {
    let guard = ModeGuard {
        prev: default_mode(),
    };
    set_default_mode(mode);
    let out = f();
    drop(guard);
    out
}
