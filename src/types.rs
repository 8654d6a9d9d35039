//! Register-level value types.

use core::fmt;

use half::f16;

/// Two binary16 lanes packed in one 32-bit register.
///
/// Lane `x` lives in the low 16 bits and lane `y` in the high 16 bits, the
/// same order `cvt.rn.f16x2.f32` and `mov.b32 {lo, hi}` use on device.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Half2 {
    bits: u32,
}

impl Half2 {
    pub const ZERO: Self = Self { bits: 0 };

    #[inline(always)]
    pub const fn new(x: f16, y: f16) -> Self {
        Self {
            bits: (x.to_bits() as u32) | ((y.to_bits() as u32) << 16),
        }
    }

    #[inline(always)]
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    #[inline(always)]
    pub const fn to_bits(self) -> u32 {
        self.bits
    }

    /// Round both lanes to nearest-even. No clamping: out-of-range inputs
    /// become infinity. Use [`crate::codec::float22reg`] for the clamped form.
    #[inline]
    pub fn from_f32s(x: f32, y: f32) -> Self {
        Self::new(f16::from_f32(x), f16::from_f32(y))
    }

    #[inline(always)]
    pub const fn x(self) -> f16 {
        f16::from_bits(self.bits as u16)
    }

    #[inline(always)]
    pub const fn y(self) -> f16 {
        f16::from_bits((self.bits >> 16) as u16)
    }

    #[inline]
    pub fn to_f32s(self) -> (f32, f32) {
        (self.x().to_f32(), self.y().to_f32())
    }
}

impl fmt::Debug for Half2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Half2({}, {} ; {:#010x})", self.x(), self.y(), self.bits)
    }
}

impl From<(f16, f16)> for Half2 {
    fn from((x, y): (f16, f16)) -> Self {
        Self::new(x, y)
    }
}
