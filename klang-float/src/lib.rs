//! Software IEEE-754 arithmetic for binary16/32/64/128.
//!
//! Every operation takes and returns raw bit patterns; no host
//! floating-point arithmetic is used outside of tests. Algorithms follow
//! the shift-and-round style of compiler-rt with round-to-nearest,
//! ties-to-even. Binary128 values are carried as eight 16-bit limbs
//! ([`klang_bits::Swar128`]).

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

#[cfg(feature = "alloc")]
extern crate alloc;

mod ops;

pub mod classify;
pub mod convert;
pub mod quad;

pub use classify::FpClass;
pub use ops::{
    double,
    half,
    single,
};
