//! Launchers for the probe kernels in `kernels/tcgs_primitives.ptx`.
//!
//! Every probe runs one primitive on the GPU and copies the raw result
//! bits back, so tests can diff the hardware against the host reference.

use std::sync::Arc;

use cudarc::driver::{
    CudaContext, CudaFunction, CudaModule, CudaStream, DriverError, LaunchConfig, PushKernelArg,
};
use half::f16;
use thiserror::Error;

use crate::constants::WARP_SIZE;
use crate::cuda_kernels::ptx_loader::{PtxCollection, PtxLoadError};
use crate::fragment::{FragmentA, FragmentB, FragmentC};
use crate::ldmatrix::LoadWidth;

const KERNEL_PACK: &str = "pack_f32x2_probe";
const KERNEL_EX2: &str = "ex2_f16_probe";
const KERNEL_LG2: &str = "lg2_f32_probe";
const KERNEL_FMA: &str = "fma_f16x2_probe";
const KERNEL_LDMATRIX_X1: &str = "ldmatrix_x1_probe";
const KERNEL_LDMATRIX_X2: &str = "ldmatrix_x2_probe";
const KERNEL_LDMATRIX_X4: &str = "ldmatrix_x4_probe";
const KERNEL_MMA: &str = "mma_m16n8k8_probe";

/// Every entry point the probe module must export.
pub const PROBE_KERNEL_NAMES: &[&str] = &[
    KERNEL_PACK,
    KERNEL_EX2,
    KERNEL_LG2,
    KERNEL_FMA,
    KERNEL_LDMATRIX_X1,
    KERNEL_LDMATRIX_X2,
    KERNEL_LDMATRIX_X4,
    KERNEL_MMA,
];

pub static PRIMITIVES_PTX: PtxCollection = PtxCollection {
    kernel_name: "tcgs_primitives",
    ptx_versions: &[(75, include_str!("kernels/tcgs_primitives.ptx"))],
};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("CUDA driver error: {0}")]
    Driver(#[from] DriverError),
    #[error("PTX loading error: {0}")]
    PtxLoad(#[from] PtxLoadError),
    #[error("Kernel not found: {0}")]
    KernelMissing(&'static str),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type ProbeResult<T> = Result<T, ProbeError>;

/// One warp, one block.
fn warp_launch() -> LaunchConfig {
    LaunchConfig {
        grid_dim: (1, 1, 1),
        block_dim: (WARP_SIZE as u32, 1, 1),
        shared_mem_bytes: 0,
    }
}

fn elem_count(len: usize) -> ProbeResult<u32> {
    u32::try_from(len).map_err(|_| ProbeError::InvalidConfig("len exceeds u32".into()))
}

fn require_same_len(what: &str, expected: usize, actual: usize) -> ProbeResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ProbeError::InvalidConfig(format!(
            "{what}: expected {expected} elements, got {actual}"
        )))
    }
}

/// Loaded probe module plus the stream it launches on.
pub struct PrimitiveProbes {
    #[allow(dead_code)]
    module: Arc<CudaModule>,
    stream: Arc<CudaStream>,
    pack: CudaFunction,
    ex2: CudaFunction,
    lg2: CudaFunction,
    fma: CudaFunction,
    ldmatrix_x1: CudaFunction,
    ldmatrix_x2: CudaFunction,
    ldmatrix_x4: CudaFunction,
    mma: CudaFunction,
}

impl PrimitiveProbes {
    pub fn new(ctx: &Arc<CudaContext>) -> ProbeResult<Self> {
        let ptx = PRIMITIVES_PTX.load(ctx)?;
        let module = ctx.load_module(ptx)?;
        let load = |name: &'static str| {
            module
                .load_function(name)
                .map_err(|_| ProbeError::KernelMissing(name))
        };

        Ok(Self {
            pack: load(KERNEL_PACK)?,
            ex2: load(KERNEL_EX2)?,
            lg2: load(KERNEL_LG2)?,
            fma: load(KERNEL_FMA)?,
            ldmatrix_x1: load(KERNEL_LDMATRIX_X1)?,
            ldmatrix_x2: load(KERNEL_LDMATRIX_X2)?,
            ldmatrix_x4: load(KERNEL_LDMATRIX_X4)?,
            mma: load(KERNEL_MMA)?,
            stream: ctx.default_stream(),
            module,
        })
    }

    pub fn stream(&self) -> &Arc<CudaStream> {
        &self.stream
    }

    /// `float22reg` over paired inputs.
    pub fn pack_f32x2(&self, xs: &[f32], ys: &[f32]) -> ProbeResult<Vec<u32>> {
        require_same_len("pack_f32x2 ys", xs.len(), ys.len())?;
        if xs.is_empty() {
            return Ok(Vec::new());
        }
        let n = elem_count(xs.len())?;

        let xs_dev = self.stream.clone_htod(xs)?;
        let ys_dev = self.stream.clone_htod(ys)?;
        let mut out = self.stream.alloc_zeros::<u32>(xs.len())?;
        unsafe {
            let mut builder = self.stream.launch_builder(&self.pack);
            builder.arg(&xs_dev);
            builder.arg(&ys_dev);
            builder.arg(&mut out);
            builder.arg(&n);
            builder.launch(LaunchConfig::for_num_elems(n))
        }?;
        Ok(self.stream.clone_dtoh(&out)?)
    }

    /// `fast_ex2_f16`, including its input and output clamps.
    pub fn ex2_f16(&self, xs: &[f16]) -> ProbeResult<Vec<f16>> {
        if xs.is_empty() {
            return Ok(Vec::new());
        }
        let n = elem_count(xs.len())?;
        let bits: Vec<u16> = xs.iter().map(|v| v.to_bits()).collect();

        let xs_dev = self.stream.clone_htod(&bits)?;
        let mut out = self.stream.alloc_zeros::<u16>(xs.len())?;
        unsafe {
            let mut builder = self.stream.launch_builder(&self.ex2);
            builder.arg(&xs_dev);
            builder.arg(&mut out);
            builder.arg(&n);
            builder.launch(LaunchConfig::for_num_elems(n))
        }?;
        let out = self.stream.clone_dtoh(&out)?;
        Ok(out.into_iter().map(f16::from_bits).collect())
    }

    pub fn lg2_f32(&self, xs: &[f32]) -> ProbeResult<Vec<f32>> {
        if xs.is_empty() {
            return Ok(Vec::new());
        }
        let n = elem_count(xs.len())?;

        let xs_dev = self.stream.clone_htod(xs)?;
        let mut out = self.stream.alloc_zeros::<f32>(xs.len())?;
        unsafe {
            let mut builder = self.stream.launch_builder(&self.lg2);
            builder.arg(&xs_dev);
            builder.arg(&mut out);
            builder.arg(&n);
            builder.launch(LaunchConfig::for_num_elems(n))
        }?;
        Ok(self.stream.clone_dtoh(&out)?)
    }

    pub fn fma_f16x2(&self, a: &[u32], b: &[u32], c: &[u32]) -> ProbeResult<Vec<u32>> {
        require_same_len("fma_f16x2 b", a.len(), b.len())?;
        require_same_len("fma_f16x2 c", a.len(), c.len())?;
        if a.is_empty() {
            return Ok(Vec::new());
        }
        let n = elem_count(a.len())?;

        let a_dev = self.stream.clone_htod(a)?;
        let b_dev = self.stream.clone_htod(b)?;
        let c_dev = self.stream.clone_htod(c)?;
        let mut out = self.stream.alloc_zeros::<u32>(a.len())?;
        unsafe {
            let mut builder = self.stream.launch_builder(&self.fma);
            builder.arg(&a_dev);
            builder.arg(&b_dev);
            builder.arg(&c_dev);
            builder.arg(&mut out);
            builder.arg(&n);
            builder.launch(LaunchConfig::for_num_elems(n))
        }?;
        Ok(self.stream.clone_dtoh(&out)?)
    }

    /// `ldmatrix` over `width.tiles()` contiguous row-major 8x8 tiles.
    /// Registers come back lane-major, `width.tiles()` per lane.
    pub fn load_matrix(&self, width: LoadWidth, tiles: &[f16]) -> ProbeResult<Vec<u32>> {
        let per_lane = width.tiles();
        require_same_len("load_matrix tiles", per_lane * 64, tiles.len())?;
        let bits: Vec<u16> = tiles.iter().map(|v| v.to_bits()).collect();
        let func = match width {
            LoadWidth::X1 => &self.ldmatrix_x1,
            LoadWidth::X2 => &self.ldmatrix_x2,
            LoadWidth::X4 => &self.ldmatrix_x4,
        };

        let tiles_dev = self.stream.clone_htod(&bits)?;
        let mut out = self.stream.alloc_zeros::<u32>(WARP_SIZE * per_lane)?;
        unsafe {
            let mut builder = self.stream.launch_builder(func);
            builder.arg(&tiles_dev);
            builder.arg(&mut out);
            builder.launch(warp_launch())
        }?;
        Ok(self.stream.clone_dtoh(&out)?)
    }

    pub fn mma_16x8x8(
        &self,
        a: &FragmentA,
        b: &FragmentB,
        c: &FragmentC,
    ) -> ProbeResult<FragmentC> {
        let a_dev = self.stream.clone_htod(a.regs.as_flattened())?;
        let b_dev = self.stream.clone_htod(&b.regs[..])?;
        let c_dev = self.stream.clone_htod(c.regs.as_flattened())?;
        let mut d_dev = self.stream.alloc_zeros::<u32>(WARP_SIZE * 2)?;
        unsafe {
            let mut builder = self.stream.launch_builder(&self.mma);
            builder.arg(&a_dev);
            builder.arg(&b_dev);
            builder.arg(&c_dev);
            builder.arg(&mut d_dev);
            builder.launch(warp_launch())
        }?;

        let d = self.stream.clone_dtoh(&d_dev)?;
        let mut out = FragmentC::zeros();
        for (lane, regs) in out.regs.iter_mut().enumerate() {
            *regs = [d[2 * lane], d[2 * lane + 1]];
        }
        Ok(out)
    }
}
