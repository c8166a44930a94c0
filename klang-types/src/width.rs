use crate::{
    Fault,
    Word,
};

/// Bit width of a shift-engine instance.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::EnumIter,
    derive_more::Display,
)]
#[repr(u8)]
pub enum BitWidth {
    /// 8-bit operations.
    #[display(fmt = "8")]
    W8 = 8,
    /// 16-bit operations.
    #[display(fmt = "16")]
    W16 = 16,
    /// 32-bit operations.
    #[display(fmt = "32")]
    W32 = 32,
    /// 64-bit operations, capped to the signed host word.
    #[display(fmt = "64")]
    W64 = 64,
}

impl BitWidth {
    /// Number of bits covered by this width.
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// Number of whole bytes covered by this width.
    pub const fn bytes(self) -> usize {
        (self as usize) / 8
    }

    /// Number of value bits actually representable.
    ///
    /// 64-bit engines carry values in a signed host word, so their domain is
    /// capped to 63 bits; every other width uses all of its bits.
    pub const fn value_bits(self) -> u32 {
        match self {
            Self::W64 => 63,
            w => w.bits(),
        }
    }

    /// Largest representable value: `2^w − 1`, except `2^63 − 1` at width 64.
    pub const fn max_value(self) -> Word {
        match self {
            Self::W8 => 0xFF,
            Self::W16 => 0xFFFF,
            Self::W32 => 0xFFFF_FFFF,
            Self::W64 => Word::MAX,
        }
    }

    /// Mask of the representable value bits, unsigned form.
    #[allow(clippy::cast_sign_loss)]
    pub const fn mask(self) -> u64 {
        self.max_value() as u64
    }

    /// The conventional sign bit, `2^(w−1)`.
    ///
    /// At width 64 this lies outside the capped value domain and normalizes
    /// to zero.
    pub const fn sign_bit(self) -> u64 {
        1u64 << (self.bits() - 1)
    }
}

impl TryFrom<u32> for BitWidth {
    type Error = Fault;

    fn try_from(bits: u32) -> Result<Self, Fault> {
        match bits {
            8 => Ok(Self::W8),
            16 => Ok(Self::W16),
            32 => Ok(Self::W32),
            64 => Ok(Self::W64),
            _ => Err(Fault::InvalidWidth),
        }
    }
}

/// Requested dispatch mode of a shift engine.
///
/// `Auto` is a request; it resolves to one of the other two before any
/// operation executes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::EnumIter,
    derive_more::Display,
)]
#[repr(u8)]
pub enum ShiftMode {
    /// Resolve to native or arithmetic on first use, per width.
    #[default]
    Auto = 0,
    /// Host bitwise operators.
    Native = 1,
    /// Add/sub/mul/div/mod only; defined up to 32 bits.
    Arithmetic = 2,
}

impl From<u8> for ShiftMode {
    fn from(b: u8) -> Self {
        match b {
            1 => Self::Native,
            2 => Self::Arithmetic,
            _ => Self::Auto,
        }
    }
}

/// A [`ShiftMode`] with `Auto` resolved away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[repr(u8)]
pub enum ResolvedMode {
    /// Host bitwise operators.
    Native = 1,
    /// Pure-arithmetic implementation.
    Arithmetic = 2,
}

impl From<ResolvedMode> for ShiftMode {
    fn from(m: ResolvedMode) -> Self {
        match m {
            ResolvedMode::Native => Self::Native,
            ResolvedMode::Arithmetic => Self::Arithmetic,
        }
    }
}

/// Outcome of a shift operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShiftResult {
    /// Shifted value, masked to the engine width.
    pub value: Word,
    /// Bits shifted out, right-aligned. Always zero for right shifts.
    pub carry: Word,
    /// Whether the unmasked result exceeded the width's maximum.
    pub overflow: bool,
}

impl ShiftResult {
    /// Build a result from its parts.
    pub const fn new(value: Word, carry: Word, overflow: bool) -> Self {
        Self {
            value,
            carry,
            overflow,
        }
    }

    /// Sentinel for a left shift whose count is outside `[0, w)`.
    pub const OUT_OF_RANGE: Self = Self::new(0, 0, true);
}
