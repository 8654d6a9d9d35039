//! Packed half-precision codec.
//!
//! Conversions between single-precision pairs and the packed `f16x2`
//! register the matrix unit consumes, plus the bit-casts between the packed
//! type and raw integer registers.

use half::f16;

use crate::constants::HALF_MAX;
use crate::types::Half2;

/// Clamp to the finite binary16 range.
///
/// `f32::min`/`f32::max` return the non-NaN operand, so a NaN input clamps
/// to `+HALF_MAX`, matching `fmaxf(fminf(x, 65504), -65504)` on device.
#[inline(always)]
pub fn clamp_to_half_range(v: f32) -> f32 {
    v.min(HALF_MAX).max(-HALF_MAX)
}

/// Convert two floats into one packed `f16x2` register, `x` in the low lane.
///
/// Each lane is clamped to ±65504 first, so finite inputs never become
/// infinity. Rounding is to nearest, ties to even.
#[inline]
pub fn float22reg(x: f32, y: f32) -> u32 {
    let packed = Half2::new(
        f16::from_f32(clamp_to_half_range(x)),
        f16::from_f32(clamp_to_half_range(y)),
    );
    half22uint(packed)
}

#[inline(always)]
pub const fn half22uint(v: Half2) -> u32 {
    v.to_bits()
}

#[inline(always)]
pub const fn uint2half2(v: u32) -> Half2 {
    Half2::from_bits(v)
}

#[inline(always)]
pub const fn half2ushort(v: f16) -> u16 {
    v.to_bits()
}

#[inline(always)]
pub const fn ushort2half(v: u16) -> f16 {
    f16::from_bits(v)
}

/// Unpack a register produced by [`float22reg`] back to `(x, y)`.
#[inline]
pub fn reg2float2(v: u32) -> (f32, f32) {
    uint2half2(v).to_f32s()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_exact_values() {
        let reg = float22reg(1.5, -2.25);
        assert_eq!(reg2float2(reg), (1.5, -2.25));
        assert_eq!(reg, 0xc080_3e00);
    }

    #[test]
    fn test_pack_clamps_overflow() {
        let reg = float22reg(100_000.0, -100_000.0);
        assert_eq!(reg2float2(reg), (65504.0, -65504.0));
        assert_eq!(reg, 0xfbff_7bff);
    }

    #[test]
    fn test_pack_boundary_is_not_clamped_to_inf() {
        // 65519 would round up to infinity without the clamp.
        let (x, y) = reg2float2(float22reg(65519.0, f32::INFINITY));
        assert_eq!(x, 65504.0);
        assert_eq!(y, 65504.0);
    }

    #[test]
    fn test_pack_nan_clamps_to_max() {
        let (x, y) = reg2float2(float22reg(f32::NAN, -0.0));
        assert_eq!(x, 65504.0);
        assert_eq!(y, 0.0);
        assert!(uint2half2(float22reg(0.0, -0.0)).y().is_sign_negative());
    }

    #[test]
    fn test_pack_rounds_to_nearest_even() {
        // 1 + 2^-11 sits halfway between 1.0 and 1 + 2^-10: ties to even.
        let tie = 1.0 + f32::powi(2.0, -11);
        let (x, _) = reg2float2(float22reg(tie, 0.0));
        assert_eq!(x, 1.0);
        // 1 + 3 * 2^-11 ties between odd and even mantissas: rounds up.
        let tie_up = 1.0 + 3.0 * f32::powi(2.0, -11);
        let (x, _) = reg2float2(float22reg(tie_up, 0.0));
        assert_eq!(x, 1.0 + f32::powi(2.0, -9));
    }

    #[test]
    fn test_bitcast_round_trip() {
        for v in [0u32, 1, 0x3c00_3c00, 0x7fff_ffff, 0xffff_ffff, 0x8000_0001] {
            assert_eq!(half22uint(uint2half2(v)), v);
        }
        assert_eq!(half2ushort(ushort2half(0x7e00)), 0x7e00);
    }
}
