//! Packed `fma.rn.ftz.f16x2`.

use half::f16;

use crate::rounding::{flush_subnormal, Accumulator};
use crate::types::Half2;

/// One lane of `fma.rn.ftz.f16`: `a * b + c`, rounded once to nearest-even.
///
/// Subnormal inputs are read as signed zeros and subnormal results are
/// flushed. Overflow goes to infinity, invalid operations to the canonical
/// NaN.
#[inline]
pub fn fma_rn_ftz_f16(a: f16, b: f16, c: f16) -> f16 {
    let a = f16::from_bits(flush_subnormal(a.to_bits()));
    let b = f16::from_bits(flush_subnormal(b.to_bits()));
    let c = f16::from_bits(flush_subnormal(c.to_bits()));

    let mut acc = Accumulator::new();
    acc.add_product(a, b);
    acc.add(c);
    acc.finish(true)
}

/// Two independent half-precision FMAs, one per packed lane.
#[inline]
pub fn fast_fma_rn_ftz_f16x2(a: u32, b: u32, c: u32) -> u32 {
    let (a, b, c) = (Half2::from_bits(a), Half2::from_bits(b), Half2::from_bits(c));
    Half2::new(
        fma_rn_ftz_f16(a.x(), b.x(), c.x()),
        fma_rn_ftz_f16(a.y(), b.y(), c.y()),
    )
    .to_bits()
}
