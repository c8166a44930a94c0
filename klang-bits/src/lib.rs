//! Deterministic bit and shift kernel.
//!
//! The kernel implements shifts, masks, rotations, bit-field access and
//! logical operations in two interchangeable modes: *native* (host bitwise
//! operators) and *arithmetic* (add/sub/mul/div/mod only). Mode selection is
//! auto-validated once per width by cross-checking both implementations over
//! a fixed corpus, so callers get bit-identical behavior on hosts with
//! quirky shift or sign-extension semantics.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod arith;
pub mod config;
pub mod engine;
#[cfg(feature = "alloc")]
pub mod limbs;
pub mod pack;
pub mod prim;
pub mod swar;
pub mod tables;
pub mod twiddle;

pub use arith::ArithOps;
pub use config::{
    default_mode,
    resolve,
    set_default_mode,
    with_mode,
};
pub use engine::BitEngine;
pub use klang_types::{
    BitWidth,
    Fault,
    KernelResult,
    ResolvedMode,
    ShiftMode,
    ShiftResult,
    Word,
};
pub use swar::Swar128;
