//! tcgs-primitives: numeric building blocks for a tensor-core Gaussian
//! splatting rasterizer.
//!
//! Every primitive exists in up to three forms:
//! - **device** (`device`, nvptx64 only): thin inline-asm wrappers over the
//!   PTX instructions the rasterizer kernels issue.
//! - **reference** (host): bit-level software models of the same
//!   instructions, usable in tests and on machines without a GPU.
//! - **probe** (`cuda` feature): embedded PTX kernels that run each
//!   instruction on real hardware so the two can be compared.
//!
//! # Quick Start
//!
//! ```ignore
//! use tcgs_primitives::{auto_select_backend, PrimitiveBackend};
//!
//! let backend = auto_select_backend()?; // honors TCGS_DEVICE
//! let packed = backend.as_backend().pack_f32x2(&[1.5], &[-2.25])?;
//! ```

#![cfg_attr(target_arch = "nvptx64", no_std)]
#![cfg_attr(target_arch = "nvptx64", feature(asm_experimental_arch))]

pub mod codec;
pub mod constants;
pub mod types;

#[cfg(target_arch = "nvptx64")]
pub mod device;

#[cfg(not(target_arch = "nvptx64"))]
pub mod approx;
#[cfg(not(target_arch = "nvptx64"))]
pub mod fma;
#[cfg(not(target_arch = "nvptx64"))]
pub mod fragment;
#[cfg(not(target_arch = "nvptx64"))]
pub mod ldmatrix;
#[cfg(not(target_arch = "nvptx64"))]
pub mod mma;
#[cfg(not(target_arch = "nvptx64"))]
pub mod rounding;
#[cfg(not(target_arch = "nvptx64"))]
pub mod warp;

// Backend selection
#[cfg(not(target_arch = "nvptx64"))]
pub mod backend;
#[cfg(not(target_arch = "nvptx64"))]
pub mod backend_trait;
#[cfg(not(target_arch = "nvptx64"))]
pub mod cpu_backend;

// CUDA probes use cudarc's dynamic-loading feature
#[cfg(all(feature = "cuda", not(target_arch = "nvptx64")))]
pub mod cuda_backend;
#[cfg(all(feature = "cuda", not(target_arch = "nvptx64")))]
pub mod cuda_kernels;

pub use codec::{float22reg, half22uint, half2ushort, uint2half2, ushort2half};
pub use constants::*;
pub use types::Half2;

#[cfg(not(target_arch = "nvptx64"))]
pub use approx::{
    fast_ex2_f16, fast_lg2_f32, EX2_F16_MAX_REL_ERR, EX2_INPUT_MAX, EX2_INPUT_MIN,
    EX2_ZERO_BELOW, LG2_F32_MAX_ABS_ERR,
};
#[cfg(not(target_arch = "nvptx64"))]
pub use backend::{auto_select_backend, BackendKind, DeviceOverride, DEVICE_ENV};
#[cfg(not(target_arch = "nvptx64"))]
pub use backend_trait::{BackendError, BackendResult, PrimitiveBackend};
#[cfg(not(target_arch = "nvptx64"))]
pub use cpu_backend::CpuBackend;
#[cfg(not(target_arch = "nvptx64"))]
pub use fma::{fast_fma_rn_ftz_f16x2, fma_rn_ftz_f16};
#[cfg(not(target_arch = "nvptx64"))]
pub use fragment::{FragmentA, FragmentB, FragmentC, Matrix, Matrix16x8, Matrix8x8};
#[cfg(not(target_arch = "nvptx64"))]
pub use ldmatrix::LoadWidth;
#[cfg(not(target_arch = "nvptx64"))]
pub use mma::reference_mma;
#[cfg(not(target_arch = "nvptx64"))]
pub use warp::{LaneAddrs, SharedMemory, Warp, WarpError, WarpResult, FULL_MASK};

#[cfg(all(feature = "cuda", not(target_arch = "nvptx64")))]
pub use cuda_backend::CudaBackend;
#[cfg(all(feature = "cuda", not(target_arch = "nvptx64")))]
pub use cuda_kernels::{PrimitiveProbes, ProbeError};

#[cfg(target_arch = "nvptx64")]
pub use device::{
    fast_ex2_f16, fast_fma_rn_ftz_f16x2, fast_lg2_f32, load_matrix_x1, load_matrix_x2,
    load_matrix_x4, mma_16x8x8_f16_f16,
};
