use half::f16;

use crate::approx::{fast_ex2_f16, fast_lg2_f32};
use crate::backend_trait::{check_len, BackendResult, PrimitiveBackend};
use crate::codec::float22reg;
use crate::constants::TILE_BYTES;
use crate::fma::fast_fma_rn_ftz_f16x2;
use crate::fragment::{FragmentA, FragmentB, FragmentC};
use crate::ldmatrix::LoadWidth;
use crate::warp::{LaneAddrs, SharedMemory, Warp};

/// Host reference backend: the bit-level software models.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend {
    warp: Warp,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PrimitiveBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn pack_f32x2(&self, xs: &[f32], ys: &[f32]) -> BackendResult<Vec<u32>> {
        check_len("pack_f32x2 ys", xs.len(), ys.len())?;
        Ok(xs.iter().zip(ys).map(|(&x, &y)| float22reg(x, y)).collect())
    }

    fn ex2_f16(&self, xs: &[f16]) -> BackendResult<Vec<f16>> {
        Ok(xs.iter().map(|&x| fast_ex2_f16(x)).collect())
    }

    fn lg2_f32(&self, xs: &[f32]) -> BackendResult<Vec<f32>> {
        Ok(xs.iter().map(|&x| fast_lg2_f32(x)).collect())
    }

    fn fma_f16x2(&self, a: &[u32], b: &[u32], c: &[u32]) -> BackendResult<Vec<u32>> {
        check_len("fma_f16x2 b", a.len(), b.len())?;
        check_len("fma_f16x2 c", a.len(), c.len())?;
        Ok(a
            .iter()
            .zip(b)
            .zip(c)
            .map(|((&a, &b), &c)| fast_fma_rn_ftz_f16x2(a, b, c))
            .collect())
    }

    fn load_matrix(&self, width: LoadWidth, tiles: &[f16]) -> BackendResult<Vec<u32>> {
        check_len("load_matrix tiles", width.tiles() * 64, tiles.len())?;
        let mut smem = SharedMemory::new(width.tiles() * TILE_BYTES);
        smem.write_halves(0, tiles)?;
        Ok(self
            .warp
            .load_matrix(width, &smem, &LaneAddrs::contiguous(0))?)
    }

    fn mma_16x8x8(&self, a: &FragmentA, b: &FragmentB, c: &FragmentC) -> BackendResult<FragmentC> {
        Ok(self.warp.mma_16x8x8_f16_f16(a, b, c)?)
    }
}
