use std::env;

use crate::backend_trait::{BackendError, BackendResult, PrimitiveBackend};
use crate::cpu_backend::CpuBackend;
#[cfg(feature = "cuda")]
use crate::cuda_backend::CudaBackend;

/// Environment variable that pins the backend: `cpu`, `cuda` or `cuda:N`.
pub const DEVICE_ENV: &str = "TCGS_DEVICE";

pub enum BackendKind {
    #[cfg(feature = "cuda")]
    Cuda(CudaBackend),
    Cpu(CpuBackend),
}

impl BackendKind {
    pub fn as_backend(&self) -> &dyn PrimitiveBackend {
        match self {
            #[cfg(feature = "cuda")]
            BackendKind::Cuda(cuda) => cuda,
            BackendKind::Cpu(cpu) => cpu,
        }
    }

    pub fn name(&self) -> &'static str {
        self.as_backend().name()
    }
}

/// Parsed value of [`DEVICE_ENV`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOverride {
    Cpu,
    Cuda(usize),
}

pub fn parse_device_override(value: &str) -> BackendResult<DeviceOverride> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("cpu") {
        return Ok(DeviceOverride::Cpu);
    }
    if let Some(rest) = value.strip_prefix("cuda") {
        let ordinal = match rest.strip_prefix(':') {
            Some(idx) => idx
                .parse::<usize>()
                .map_err(|_| BackendError::InvalidBackendOverride(value.to_string()))?,
            None if rest.is_empty() => 0,
            None => return Err(BackendError::InvalidBackendOverride(value.to_string())),
        };
        return Ok(DeviceOverride::Cuda(ordinal));
    }
    Err(BackendError::InvalidBackendOverride(value.to_string()))
}

#[cfg(feature = "cuda")]
fn open_cuda(ordinal: usize) -> BackendResult<BackendKind> {
    Ok(BackendKind::Cuda(CudaBackend::new(ordinal)?))
}

#[cfg(not(feature = "cuda"))]
fn open_cuda(_ordinal: usize) -> BackendResult<BackendKind> {
    Err(BackendError::CudaUnavailable)
}

/// Honor [`DEVICE_ENV`] if set, otherwise try CUDA device 0 and fall back
/// to the host reference.
pub fn auto_select_backend() -> BackendResult<BackendKind> {
    if let Ok(value) = env::var(DEVICE_ENV) {
        return match parse_device_override(&value)? {
            DeviceOverride::Cpu => Ok(BackendKind::Cpu(CpuBackend::new())),
            DeviceOverride::Cuda(ordinal) => open_cuda(ordinal),
        };
    }

    match open_cuda(0) {
        Ok(backend) => Ok(backend),
        Err(err) => {
            log::warn!("CUDA primitives unavailable, using CPU reference: {err}");
            Ok(BackendKind::Cpu(CpuBackend::new()))
        }
    }
}
