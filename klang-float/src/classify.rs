//! IEEE-754 classification predicates per width.

use crate::{
    double,
    half,
    single,
};

bitflags::bitflags! {
    /// Classification mask of one floating-point value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FpClass: u8 {
        /// The sign bit is set (including −0 and negative NaN payloads).
        const NEGATIVE = 0x01;
        /// Positive or negative zero.
        const ZERO = 0x02;
        /// Nonzero with a zero exponent field.
        const SUBNORMAL = 0x04;
        /// Finite with a regular exponent.
        const NORMAL = 0x08;
        /// Positive or negative infinity.
        const INFINITE = 0x10;
        /// Any NaN.
        const NAN = 0x20;
        /// A NaN with the quiet bit clear.
        const SIGNALING = 0x40;
    }
}

macro_rules! classify_ops {
    ($name:ident, $rep:ty, $module:ident) => {
        paste::paste! {
            /// Whether the pattern encodes any NaN.
            pub fn [<is_nan_ $name>](a: $rep) -> bool {
                a & $module::ABS_MASK > $module::INF_REP
            }

            /// Whether the pattern encodes a signaling NaN.
            pub fn [<is_signaling_nan_ $name>](a: $rep) -> bool {
                [<is_nan_ $name>](a) && a & $module::QUIET_BIT == 0
            }

            /// Whether the pattern encodes ±∞.
            pub fn [<is_inf_ $name>](a: $rep) -> bool {
                a & $module::ABS_MASK == $module::INF_REP
            }

            /// Whether the pattern encodes ±0.
            pub fn [<is_zero_ $name>](a: $rep) -> bool {
                a & $module::ABS_MASK == 0
            }

            /// Whether the sign bit is set.
            pub fn [<is_negative_ $name>](a: $rep) -> bool {
                a & $module::SIGN_MASK != 0
            }

            /// Whether the pattern encodes a subnormal value.
            pub fn [<is_subnormal_ $name>](a: $rep) -> bool {
                a & $module::EXP_MASK == 0 && a & $module::SIG_MASK != 0
            }

            /// Whether the pattern encodes a normal finite value.
            pub fn [<is_normal_ $name>](a: $rep) -> bool {
                let exp = a & $module::EXP_MASK;
                exp != 0 && exp != $module::EXP_MASK
            }

            /// Full classification mask.
            pub fn [<classify_ $name>](a: $rep) -> FpClass {
                let mut class = FpClass::empty();
                if [<is_negative_ $name>](a) {
                    class |= FpClass::NEGATIVE;
                }
                if [<is_nan_ $name>](a) {
                    class |= FpClass::NAN;
                    if [<is_signaling_nan_ $name>](a) {
                        class |= FpClass::SIGNALING;
                    }
                } else if [<is_inf_ $name>](a) {
                    class |= FpClass::INFINITE;
                } else if [<is_zero_ $name>](a) {
                    class |= FpClass::ZERO;
                } else if [<is_subnormal_ $name>](a) {
                    class |= FpClass::SUBNORMAL;
                } else {
                    class |= FpClass::NORMAL;
                }
                class
            }
        }
    };
}

classify_ops!(f16, u16, half);
classify_ops!(f32, u32, single);
classify_ops!(f64, u64, double);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_covers_every_class() {
        assert_eq!(classify_f32(0x0000_0000), FpClass::ZERO);
        assert_eq!(
            classify_f32(0x8000_0000),
            FpClass::ZERO | FpClass::NEGATIVE
        );
        assert_eq!(classify_f32(0x3F80_0000), FpClass::NORMAL);
        assert_eq!(classify_f32(0x0000_0001), FpClass::SUBNORMAL);
        assert_eq!(classify_f32(0x7F80_0000), FpClass::INFINITE);
        assert_eq!(classify_f32(single::QNAN), FpClass::NAN);
        assert_eq!(
            classify_f32(0x7F80_0001),
            FpClass::NAN | FpClass::SIGNALING
        );
    }

    #[test]
    fn predicates_match_host_classification() {
        for bits in [
            0u32,
            0x8000_0000,
            1,
            0x007F_FFFF,
            0x0080_0000,
            0x3F80_0000,
            0x7F7F_FFFF,
            0x7F80_0000,
            0xFF80_0000,
            0x7FC0_0000,
        ] {
            let host = f32::from_bits(bits);
            assert_eq!(is_nan_f32(bits), host.is_nan(), "{bits:#x}");
            assert_eq!(is_inf_f32(bits), host.is_infinite(), "{bits:#x}");
            assert_eq!(is_zero_f32(bits), host == 0.0 && !host.is_nan(), "{bits:#x}");
            assert_eq!(
                is_subnormal_f32(bits),
                host.classify() == core::num::FpCategory::Subnormal
            );
            assert_eq!(is_normal_f32(bits), host.is_normal(), "{bits:#x}");
            assert_eq!(is_negative_f32(bits), host.is_sign_negative(), "{bits:#x}");
        }
    }

    #[test]
    fn half_and_double_widths_classify() {
        assert_eq!(classify_f16(0x7C00), FpClass::INFINITE);
        assert_eq!(classify_f16(0x03FF), FpClass::SUBNORMAL);
        assert!(is_signaling_nan_f16(0x7C01));
        assert_eq!(classify_f64(0x7FF8_0000_0000_0000), FpClass::NAN);
        assert!(is_normal_f64(0x3FF0_0000_0000_0000));
    }
}
