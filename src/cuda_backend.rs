use std::sync::Arc;

use cudarc::driver::CudaContext;
use half::f16;

use crate::backend_trait::{BackendResult, PrimitiveBackend};
use crate::cuda_kernels::{PrimitiveProbes, ProbeError};
use crate::fragment::{FragmentA, FragmentB, FragmentC};
use crate::ldmatrix::LoadWidth;

/// Runs each primitive on a real GPU through the probe kernels.
pub struct CudaBackend {
    ordinal: usize,
    ctx: Arc<CudaContext>,
    probes: PrimitiveProbes,
}

impl CudaBackend {
    pub fn new(ordinal: usize) -> BackendResult<Self> {
        let ctx = CudaContext::new(ordinal).map_err(ProbeError::from)?;
        let probes = PrimitiveProbes::new(&ctx)?;
        log::info!("CUDA primitive backend ready on device {}", ordinal);
        Ok(Self {
            ordinal,
            ctx,
            probes,
        })
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn context(&self) -> &Arc<CudaContext> {
        &self.ctx
    }
}

impl PrimitiveBackend for CudaBackend {
    fn name(&self) -> &'static str {
        "cuda"
    }

    fn pack_f32x2(&self, xs: &[f32], ys: &[f32]) -> BackendResult<Vec<u32>> {
        Ok(self.probes.pack_f32x2(xs, ys)?)
    }

    fn ex2_f16(&self, xs: &[f16]) -> BackendResult<Vec<f16>> {
        Ok(self.probes.ex2_f16(xs)?)
    }

    fn lg2_f32(&self, xs: &[f32]) -> BackendResult<Vec<f32>> {
        Ok(self.probes.lg2_f32(xs)?)
    }

    fn fma_f16x2(&self, a: &[u32], b: &[u32], c: &[u32]) -> BackendResult<Vec<u32>> {
        Ok(self.probes.fma_f16x2(a, b, c)?)
    }

    fn load_matrix(&self, width: LoadWidth, tiles: &[f16]) -> BackendResult<Vec<u32>> {
        Ok(self.probes.load_matrix(width, tiles)?)
    }

    fn mma_16x8x8(&self, a: &FragmentA, b: &FragmentB, c: &FragmentC) -> BackendResult<FragmentC> {
        Ok(self.probes.mma_16x8x8(a, b, c)?)
    }
}
