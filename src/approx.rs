//! Fast approximate exponential and logarithm.
//!
//! `fast_ex2_f16` is an attenuation helper, not a power function: its
//! output is confined to [0, 1]. The reference models below stand in for
//! `ex2.approx.f16` and `lg2.approx.f32` by evaluating the exact function
//! and rounding to the instruction's result type; the hardware result
//! stays within [`EX2_F16_MAX_REL_ERR`] / [`LG2_F32_MAX_ABS_ERR`] of the
//! exact value.

use half::f16;

/// Inputs are clamped to [EX2_INPUT_MIN, EX2_INPUT_MAX] before evaluation.
pub const EX2_INPUT_MIN: f32 = -10.0;
pub const EX2_INPUT_MAX: f32 = 10.0;
/// Clamped inputs strictly below this return exactly zero.
pub const EX2_ZERO_BELOW: f32 = -7.0;

/// Documented maximum relative error of `ex2.approx.f16` (2^-9.9), about
/// two binary16 ulps at the top of a binade.
pub const EX2_F16_MAX_REL_ERR: f32 = 1.046_653_8e-3;
/// Documented absolute error bound of `lg2.approx.f32` (2^-22).
pub const LG2_F32_MAX_ABS_ERR: f32 = 2.384_185_8e-7;

/// Model of the raw `ex2.approx.f16` instruction.
#[inline]
pub fn ex2_approx_f16(x: f16) -> f16 {
    f16::from_f32(x.to_f32().exp2())
}

/// Model of the raw `lg2.approx.f32` instruction.
#[inline]
pub fn lg2_approx_f32(x: f32) -> f32 {
    x.log2()
}

/// Approximate 2^x with the output confined to [0, 1].
///
/// The input is clamped to [-10, 10]; anything below -7 after clamping
/// short-circuits to exactly 0 instead of entering the hardware
/// approximation. NaN clamps to +10 and so yields 1.
#[inline]
pub fn fast_ex2_f16(x: f16) -> f16 {
    let clamped = x.to_f32().min(EX2_INPUT_MAX).max(EX2_INPUT_MIN);
    if clamped < EX2_ZERO_BELOW {
        return f16::ZERO;
    }
    let y = ex2_approx_f16(f16::from_f32(clamped));
    f16::from_f32(y.to_f32().min(1.0).max(0.0))
}

/// Approximate log2(x). Not checked: x must be positive and finite.
#[inline]
pub fn fast_lg2_f32(x: f32) -> f32 {
    lg2_approx_f32(x)
}
