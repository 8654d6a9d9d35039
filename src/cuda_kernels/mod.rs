//! CUDA probe kernels for the device primitives.
//!
//! The PTX is embedded at build time and loaded through cudarc's dynamic
//! loader, so building with `--features cuda` needs no CUDA toolkit; a
//! missing driver surfaces as an error from [`PrimitiveProbes::new`].

pub mod probes;
pub mod ptx_loader;

pub use cudarc::driver::LaunchConfig;
pub use probes::{PrimitiveProbes, ProbeError, ProbeResult, PRIMITIVES_PTX, PROBE_KERNEL_NAMES};
pub use ptx_loader::{PtxCollection, PtxLoadError, MIN_SM_VERSION};
