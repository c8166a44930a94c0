//! Atomic types of the KLang numeric runtime.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

#[cfg(feature = "alloc")]
extern crate alloc;

mod fault;
mod width;

pub mod bytes;

pub use fault::{
    Fault,
    KernelResult,
};
pub use width::{
    BitWidth,
    ResolvedMode,
    ShiftMode,
    ShiftResult,
};

/// Host-wide signed value type carried through every kernel operation.
///
/// Inputs outside `[0, 2^w)` are accepted everywhere and normalized first;
/// negative values are interpreted as host-wide two's complement.
pub type Word = i64;

/// Unsigned view of a [`Word`], used by native-mode operators.
pub type UWord = u64;
