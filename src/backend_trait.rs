use half::f16;
use thiserror::Error;

use crate::fragment::{FragmentA, FragmentB, FragmentC};
use crate::ldmatrix::LoadWidth;
use crate::warp::WarpError;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid backend override: {0}")]
    InvalidBackendOverride(String),
    #[error("CUDA support not compiled in (enable the `cuda` feature)")]
    CudaUnavailable,
    #[error("length mismatch: {what} expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Warp(#[from] WarpError),
    #[cfg(feature = "cuda")]
    #[error(transparent)]
    Probe(#[from] crate::cuda_kernels::ProbeError),
}

pub type BackendResult<T> = Result<T, BackendError>;

pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> BackendResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(BackendError::LengthMismatch {
            what,
            expected,
            actual,
        })
    }
}

/// Batched forms of every primitive, so the same test or tool can run
/// against the host reference and against real hardware.
pub trait PrimitiveBackend {
    fn name(&self) -> &'static str;

    /// `float22reg(xs[i], ys[i])`.
    fn pack_f32x2(&self, xs: &[f32], ys: &[f32]) -> BackendResult<Vec<u32>>;

    /// `fast_ex2_f16` per element.
    fn ex2_f16(&self, xs: &[f16]) -> BackendResult<Vec<f16>>;

    /// `fast_lg2_f32` per element.
    fn lg2_f32(&self, xs: &[f32]) -> BackendResult<Vec<f32>>;

    /// `fast_fma_rn_ftz_f16x2(a[i], b[i], c[i])`.
    fn fma_f16x2(&self, a: &[u32], b: &[u32], c: &[u32]) -> BackendResult<Vec<u32>>;

    /// One converged warp loading `width.tiles()` contiguous row-major
    /// tiles; registers returned lane-major.
    fn load_matrix(&self, width: LoadWidth, tiles: &[f16]) -> BackendResult<Vec<u32>>;

    /// One converged warp issuing a single 16x8x8 multiply-accumulate.
    fn mma_16x8x8(&self, a: &FragmentA, b: &FragmentB, c: &FragmentC) -> BackendResult<FragmentC>;
}
