//! Device-side primitives for `nvptx64-nvidia-cuda` kernels.
//!
//! Each function lowers to the single PTX instruction it is named after
//! (plus the range clamps where noted) and is meant to be inlined into a
//! rasterizer kernel. Nothing here checks its preconditions:
//!
//! - `load_matrix_*` and `mma_16x8x8_f16_f16` must be reached by all 32
//!   lanes of the warp with no divergence, otherwise the warp hangs or
//!   reads garbage.
//! - `load_matrix_*` addresses must point into `.shared` memory and be
//!   16-byte aligned, and the caller must have issued a block barrier
//!   after writing them.
//! - `fast_lg2_f32` expects a positive finite input.
//!
//! Requires sm_75 or newer (`ldmatrix`, `mma.m16n8k8`, `ex2.approx.f16`).

use core::arch::asm;

use half::f16;

use crate::codec::clamp_to_half_range;
use crate::types::Half2;

pub use crate::codec::{half22uint, half2ushort, uint2half2, ushort2half};

/// Convert a generic pointer into the shared window, as `__cvta_generic_to_shared`.
#[inline(always)]
unsafe fn cvta_to_shared(ptr: *const u32) -> u32 {
    let addr: u32;
    asm!(
        "{{ .reg .u64 t; cvta.to.shared.u64 t, {p}; cvt.u32.u64 {a}, t; }}",
        p = in(reg64) ptr as u64,
        a = out(reg32) addr,
        options(pure, nomem, nostack),
    );
    addr
}

/// Two floats to one clamped, round-to-nearest-even `f16x2` register.
#[inline(always)]
pub fn float22reg(x: f32, y: f32) -> u32 {
    let (x, y) = (clamp_to_half_range(x), clamp_to_half_range(y));
    let packed: u32;
    unsafe {
        asm!(
            "{{ .reg .b16 lo, hi; cvt.rn.f16.f32 lo, {x}; cvt.rn.f16.f32 hi, {y}; mov.b32 {d}, {{lo, hi}}; }}",
            x = in(reg32) x,
            y = in(reg32) y,
            d = out(reg32) packed,
            options(pure, nomem, nostack),
        );
    }
    packed
}

/// `ldmatrix.sync.aligned.x4.m8n8.shared.b16`.
///
/// # Safety
/// `addr` must be a 16-byte aligned pointer into shared memory holding this
/// lane's tile row, and every lane of the warp must call this together.
#[inline(always)]
pub unsafe fn load_matrix_x4(addr: *const u32) -> [u32; 4] {
    let smem = cvta_to_shared(addr);
    let (r0, r1, r2, r3): (u32, u32, u32, u32);
    asm!(
        "ldmatrix.sync.aligned.x4.m8n8.shared.b16 {{{}, {}, {}, {}}}, [{}];",
        out(reg32) r0,
        out(reg32) r1,
        out(reg32) r2,
        out(reg32) r3,
        in(reg32) smem,
        options(readonly, nostack),
    );
    [r0, r1, r2, r3]
}

/// `ldmatrix.sync.aligned.x2.m8n8.shared.b16`.
///
/// # Safety
/// Same contract as [`load_matrix_x4`]; only lanes 0..16 supply addresses.
#[inline(always)]
pub unsafe fn load_matrix_x2(addr: *const u32) -> [u32; 2] {
    let smem = cvta_to_shared(addr);
    let (r0, r1): (u32, u32);
    asm!(
        "ldmatrix.sync.aligned.x2.m8n8.shared.b16 {{{}, {}}}, [{}];",
        out(reg32) r0,
        out(reg32) r1,
        in(reg32) smem,
        options(readonly, nostack),
    );
    [r0, r1]
}

/// `ldmatrix.sync.aligned.x1.m8n8.shared.b16`.
///
/// # Safety
/// Same contract as [`load_matrix_x4`]; only lanes 0..8 supply addresses.
#[inline(always)]
pub unsafe fn load_matrix_x1(addr: *const u32) -> u32 {
    let smem = cvta_to_shared(addr);
    let r: u32;
    asm!(
        "ldmatrix.sync.aligned.x1.m8n8.shared.b16 {{{}}}, [{}];",
        out(reg32) r,
        in(reg32) smem,
        options(readonly, nostack),
    );
    r
}

/// `D = A * B + C` on one warp's fragments, all binary16.
///
/// # Safety
/// Every lane of the warp must call this together from converged code.
#[inline(always)]
pub unsafe fn mma_16x8x8_f16_f16(a: [u32; 2], b: u32, c: [u32; 2]) -> [u32; 2] {
    let (d0, d1): (u32, u32);
    asm!(
        "mma.sync.aligned.m16n8k8.row.col.f16.f16.f16.f16 {{{}, {}}}, {{{}, {}}}, {{{}}}, {{{}, {}}};",
        out(reg32) d0,
        out(reg32) d1,
        in(reg32) a[0],
        in(reg32) a[1],
        in(reg32) b,
        in(reg32) c[0],
        in(reg32) c[1],
        // not pure: the warp must issue it exactly where the caller does
        options(nostack),
    );
    [d0, d1]
}

/// 2^x confined to [0, 1]; inputs clamped to [-10, 10], below -7 gives 0.
#[inline(always)]
pub fn fast_ex2_f16(x: f16) -> f16 {
    let clamped = x.to_f32().min(10.0).max(-10.0);
    if clamped < -7.0 {
        return f16::ZERO;
    }
    let input = f16::from_f32(clamped).to_bits();
    let y: u16;
    unsafe {
        asm!(
            "ex2.approx.f16 {}, {};",
            out(reg16) y,
            in(reg16) input,
            options(pure, nomem, nostack),
        );
    }
    f16::from_f32(f16::from_bits(y).to_f32().min(1.0).max(0.0))
}

/// `lg2.approx.f32`.
#[inline(always)]
pub fn fast_lg2_f32(x: f32) -> f32 {
    let y: f32;
    unsafe {
        asm!(
            "lg2.approx.f32 {}, {};",
            out(reg32) y,
            in(reg32) x,
            options(pure, nomem, nostack),
        );
    }
    y
}

/// `fma.rn.ftz.f16x2`: two independent FMAs, one per packed lane.
#[inline(always)]
pub fn fast_fma_rn_ftz_f16x2(a: u32, b: u32, c: u32) -> u32 {
    let d: u32;
    unsafe {
        asm!(
            "fma.rn.ftz.f16x2 {}, {}, {}, {};",
            out(reg32) d,
            in(reg32) a,
            in(reg32) b,
            in(reg32) c,
            options(pure, nomem, nostack),
        );
    }
    d
}

/// Packed FMA on [`Half2`] values.
#[inline(always)]
pub fn fma_half2(a: Half2, b: Half2, c: Half2) -> Half2 {
    Half2::from_bits(fast_fma_rn_ftz_f16x2(a.to_bits(), b.to_bits(), c.to_bits()))
}
