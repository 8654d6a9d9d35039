//! Exact binary16 accumulation with a single final rounding.
//!
//! Every binary16 value is an integer multiple of 2^-24, so every product of
//! two binary16 values is an integer multiple of 2^-48. Holding sums as a
//! signed integer count of 2^-48 units is therefore exact for any sum of
//! products the matrix unit and the packed FMA can form, and the only
//! rounding happens once in [`Accumulator::finish`].

use half::f16;

/// Fractional bits of the fixed-point accumulator.
const FRAC_BITS: u32 = 48;
/// Fractional bits of one binary16 subnormal unit (2^-24).
const HALF_UNIT_BITS: u32 = 24;

const EXP_MASK: u16 = 0x7c00;
const FRAC_MASK: u16 = 0x03ff;
const SIGN_MASK: u16 = 0x8000;

/// The NaN pattern the f16 arithmetic pipes return.
pub const CANONICAL_NAN: u16 = 0x7fff;

#[inline]
pub fn is_subnormal(bits: u16) -> bool {
    bits & EXP_MASK == 0 && bits & FRAC_MASK != 0
}

/// Replace a subnormal with a zero of the same sign.
#[inline]
pub fn flush_subnormal(bits: u16) -> u16 {
    if is_subnormal(bits) {
        bits & SIGN_MASK
    } else {
        bits
    }
}

/// Significand and binary exponent of a finite binary16, `v = sig * 2^(exp - 24)`.
#[inline]
fn decompose(bits: u16) -> (i64, u32) {
    let exp = u32::from((bits & EXP_MASK) >> 10);
    let frac = i64::from(bits & FRAC_MASK);
    let (sig, shift) = if exp == 0 {
        (frac, 0)
    } else {
        (frac | 0x400, exp - 1)
    };
    if bits & SIGN_MASK != 0 {
        (-sig, shift)
    } else {
        (sig, shift)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Accumulator {
    /// Finite part, in units of 2^-48.
    fixed: i128,
    /// Running sum of non-finite terms; only meaningful when `has_nonfinite`.
    nonfinite: f64,
    has_nonfinite: bool,
    /// All terms so far were -0, so an exact zero result keeps its sign.
    all_negative_zero: bool,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            fixed: 0,
            nonfinite: 0.0,
            has_nonfinite: false,
            all_negative_zero: true,
        }
    }

    /// Add a single binary16 term.
    pub fn add(&mut self, v: f16) {
        let bits = v.to_bits();
        if !v.is_finite() {
            self.push_nonfinite(v.to_f64());
            return;
        }
        self.all_negative_zero &= bits == SIGN_MASK;
        let (sig, shift) = decompose(bits);
        self.fixed += i128::from(sig) << (shift + FRAC_BITS - HALF_UNIT_BITS);
    }

    /// Add the exact product `a * b`.
    pub fn add_product(&mut self, a: f16, b: f16) {
        if !a.is_finite() || !b.is_finite() {
            // inf * 0 is NaN in f64 just as in binary16.
            self.push_nonfinite(a.to_f64() * b.to_f64());
            return;
        }
        let (sa, ea) = decompose(a.to_bits());
        let (sb, eb) = decompose(b.to_bits());
        let product_negative = a.is_sign_negative() != b.is_sign_negative();
        self.all_negative_zero &= (sa == 0 || sb == 0) && product_negative;
        // sa * sb * 2^(ea + eb - 48): already in 2^-48 units.
        self.fixed += i128::from(sa * sb) << (ea + eb);
    }

    fn push_nonfinite(&mut self, v: f64) {
        self.nonfinite += v;
        self.has_nonfinite = true;
        self.all_negative_zero = false;
    }

    /// Round once to nearest-even binary16.
    ///
    /// With `flush_to_zero`, a subnormal result becomes a signed zero.
    /// Overflow rounds to infinity; any NaN or `inf - inf` yields
    /// [`CANONICAL_NAN`].
    pub fn finish(&self, flush_to_zero: bool) -> f16 {
        if self.has_nonfinite {
            if self.nonfinite.is_nan() {
                return f16::from_bits(CANONICAL_NAN);
            }
            return if self.nonfinite > 0.0 {
                f16::INFINITY
            } else {
                f16::NEG_INFINITY
            };
        }
        if self.fixed == 0 {
            return if self.all_negative_zero {
                f16::NEG_ZERO
            } else {
                f16::ZERO
            };
        }

        let sign = if self.fixed < 0 { SIGN_MASK } else { 0 };
        let magnitude = self.fixed.unsigned_abs();
        let bits = round_magnitude(magnitude);
        let bits = if flush_to_zero {
            flush_subnormal(bits)
        } else {
            bits
        };
        f16::from_bits(sign | bits)
    }
}

/// Round `magnitude * 2^-48` (non-zero) to an unsigned binary16 pattern.
fn round_magnitude(magnitude: u128) -> u16 {
    let msb = 127 - magnitude.leading_zeros();
    // Normal range starts at 2^-14, i.e. bit 34 of the fixed-point value.
    let shift = if msb >= FRAC_BITS - 14 {
        msb - 10
    } else {
        HALF_UNIT_BITS
    };

    let mut sig = magnitude >> shift;
    let rem = magnitude & ((1u128 << shift) - 1);
    let halfway = 1u128 << (shift - 1);
    if rem > halfway || (rem == halfway && sig & 1 == 1) {
        sig += 1;
    }

    if shift == HALF_UNIT_BITS {
        // Subnormal; a carry into bit 10 lands exactly on the smallest normal.
        return sig as u16;
    }

    // Biased exponent of 2^(msb - 48) is msb - 48 + 15.
    let mut biased = msb - (FRAC_BITS - 15);
    if sig == 0x800 {
        sig >>= 1;
        biased += 1;
    }
    if biased >= 31 {
        return EXP_MASK;
    }
    ((biased as u16) << 10) | (sig as u16 & FRAC_MASK)
}
