//! SM-aware loader for the embedded probe PTX.
//!
//! PTX is precompiled and embedded at build time; there is no runtime
//! compilation fallback. PTX built for a lower SM runs on any newer GPU, so
//! the loader picks the highest embedded version not above the device's.
//!
//! | SM  | Architecture | Needed for                                  |
//! |-----|--------------|---------------------------------------------|
//! | 75  | Turing       | `ldmatrix`, `mma.m16n8k8` f16, `ex2.approx.f16` |
//! | 80+ | Ampere and newer | runs the sm_75 PTX via JIT            |

use std::fmt;
use std::sync::Arc;

use cudarc::driver::{sys, CudaContext, DriverError};
use cudarc::nvrtc::Ptx;

/// Minimum SM version the primitives can run on.
pub const MIN_SM_VERSION: u32 = 75;

#[derive(Debug)]
pub enum PtxLoadError {
    /// GPU SM version is too old for the tensor-core instructions.
    UnsupportedSm(u32),
    SmDetectionFailed(String),
    /// No embedded PTX at or below the device's SM version.
    NoPtxAvailable(String),
    Driver(DriverError),
}

impl fmt::Display for PtxLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedSm(sm) => write!(
                f,
                "GPU compute capability sm_{} is not supported. Minimum required: sm_{}",
                sm, MIN_SM_VERSION
            ),
            Self::SmDetectionFailed(msg) => write!(f, "Failed to detect SM version: {}", msg),
            Self::NoPtxAvailable(msg) => write!(f, "No PTX available: {}", msg),
            Self::Driver(e) => write!(f, "CUDA driver error: {}", e),
        }
    }
}

impl std::error::Error for PtxLoadError {}

impl From<DriverError> for PtxLoadError {
    fn from(e: DriverError) -> Self {
        Self::Driver(e)
    }
}

pub fn detect_sm_version(ctx: &Arc<CudaContext>) -> Result<u32, PtxLoadError> {
    let major = ctx
        .attribute(sys::CUdevice_attribute::CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MAJOR)
        .map_err(|e| PtxLoadError::SmDetectionFailed(format!("compute capability major: {}", e)))?;
    let minor = ctx
        .attribute(sys::CUdevice_attribute::CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MINOR)
        .map_err(|e| PtxLoadError::SmDetectionFailed(format!("compute capability minor: {}", e)))?;

    let sm_version = (major * 10 + minor) as u32;
    log::debug!("Detected GPU compute capability: sm_{} (major={}, minor={})", sm_version, major, minor);
    Ok(sm_version)
}

/// Highest available SM version that is <= `gpu_sm`.
pub fn find_best_sm_match(gpu_sm: u32, available_sms: &[u32]) -> Option<u32> {
    available_sms.iter().filter(|&&sm| sm <= gpu_sm).max().copied()
}

/// Precompiled PTX for one module, keyed by target SM.
pub struct PtxCollection {
    /// Module name for logging.
    pub kernel_name: &'static str,
    pub ptx_versions: &'static [(u32, &'static str)],
}

impl PtxCollection {
    pub fn available_sms(&self) -> Vec<u32> {
        self.ptx_versions.iter().map(|(sm, _)| *sm).collect()
    }

    /// Pick the PTX for a device of compute capability `gpu_sm`.
    pub fn select(&self, gpu_sm: u32) -> Result<&'static str, PtxLoadError> {
        if gpu_sm < MIN_SM_VERSION {
            return Err(PtxLoadError::UnsupportedSm(gpu_sm));
        }

        let available_sms = self.available_sms();
        find_best_sm_match(gpu_sm, &available_sms)
            .and_then(|best| self.ptx_versions.iter().find(|(sm, _)| *sm == best))
            .map(|(_, ptx)| *ptx)
            .filter(|ptx| !ptx.trim().is_empty())
            .ok_or_else(|| {
                PtxLoadError::NoPtxAvailable(format!(
                    "No precompiled PTX for {} (GPU sm_{}). Available SM versions: {:?}",
                    self.kernel_name, gpu_sm, available_sms
                ))
            })
    }

    pub fn load(&self, ctx: &Arc<CudaContext>) -> Result<Ptx, PtxLoadError> {
        let gpu_sm = detect_sm_version(ctx)?;
        let ptx = self.select(gpu_sm)?;
        log::info!("Loading {} PTX for GPU sm_{}", self.kernel_name, gpu_sm);
        Ok(Ptx::from_src(ptx))
    }
}
