//! `mma.sync.aligned.m16n8k8.row.col.f16.f16.f16.f16`.

use crate::fragment::{FragmentA, FragmentB, FragmentC, Matrix16x8, Matrix8x8};
use crate::rounding::Accumulator;
use crate::warp::{Warp, WarpResult};

/// Dense `D = A * B + C` in binary16.
///
/// Each element is the exact sum of its eight products and the accumulator,
/// rounded once to nearest-even. This is the reference the distributed
/// form is checked against; it involves no fragment layout at all.
pub fn reference_mma(a: &Matrix16x8, b: &Matrix8x8, c: &Matrix16x8) -> Matrix16x8 {
    Matrix16x8::from_fn(|row, col| {
        let mut acc = Accumulator::new();
        for k in 0..8 {
            acc.add_product(a.get(row, k), b.get(k, col));
        }
        acc.add(c.get(row, col));
        acc.finish(false)
    })
}

impl Warp {
    /// Warp-wide 16x8x8 multiply-accumulate on distributed fragments.
    ///
    /// Larger products are tiled by the caller, feeding each result back
    /// in as the next `c`.
    pub fn mma_16x8x8_f16_f16(
        &self,
        a: &FragmentA,
        b: &FragmentB,
        c: &FragmentC,
    ) -> WarpResult<FragmentC> {
        self.require_converged()?;
        let d = reference_mma(&a.to_matrix(), &b.to_matrix(), &c.to_matrix());
        Ok(FragmentC::from_matrix(&d))
    }
}
