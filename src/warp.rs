//! Host-side model of one warp and its block's shared memory.
//!
//! On device, the warp-synchronous primitives trust the caller: a diverged
//! warp, a misaligned row address or a read past the shared allocation is
//! undefined behavior. The emulator checks all three and reports them as
//! [`WarpError`], which is what makes it usable as a test oracle for kernels
//! that compose these primitives.

use half::f16;
use thiserror::Error;

use crate::constants::{TILE_BYTES, TILE_ROW_BYTES, WARP_SIZE};

/// Every lane active.
pub const FULL_MASK: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WarpError {
    #[error("warp-synchronous primitive issued from divergent code (active mask {active_mask:#010x})")]
    Divergent { active_mask: u32 },
    #[error("lane {lane}: shared address {addr:#x} is not 16-byte aligned")]
    Misaligned { lane: usize, addr: u32 },
    #[error("lane {lane}: row at {addr:#x} overruns shared memory of {len} bytes")]
    OutOfBounds { lane: usize, addr: u32, len: usize },
}

pub type WarpResult<T> = Result<T, WarpError>;

/// One warp, described by which of its lanes reach the current instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Warp {
    active_mask: u32,
}

impl Default for Warp {
    fn default() -> Self {
        Self::converged()
    }
}

impl Warp {
    pub const fn converged() -> Self {
        Self {
            active_mask: FULL_MASK,
        }
    }

    /// A warp where only the lanes set in `active_mask` are executing.
    pub const fn with_active_mask(active_mask: u32) -> Self {
        Self { active_mask }
    }

    pub const fn active_mask(&self) -> u32 {
        self.active_mask
    }

    pub const fn is_converged(&self) -> bool {
        self.active_mask == FULL_MASK
    }

    pub(crate) fn require_converged(&self) -> WarpResult<()> {
        if self.is_converged() {
            Ok(())
        } else {
            Err(WarpError::Divergent {
                active_mask: self.active_mask,
            })
        }
    }
}

/// Byte-addressed shared scratch memory of one thread block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedMemory {
    bytes: Vec<u8>,
}

impl SharedMemory {
    pub fn new(len: usize) -> Self {
        Self {
            bytes: vec![0; len],
        }
    }

    /// Shared memory sized for `tiles` 8x8 binary16 tiles.
    pub fn with_tiles(tiles: usize) -> Self {
        Self::new(tiles * TILE_BYTES)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Store halves little-endian starting at byte `offset`.
    pub fn write_halves(&mut self, offset: usize, values: &[f16]) -> WarpResult<()> {
        let end = values
            .len()
            .checked_mul(2)
            .and_then(|n| offset.checked_add(n))
            .filter(|&end| end <= self.bytes.len())
            .ok_or(WarpError::OutOfBounds {
                lane: 0,
                addr: u32::try_from(offset).unwrap_or(u32::MAX),
                len: self.bytes.len(),
            })?;
        for (chunk, v) in self.bytes[offset..end].chunks_exact_mut(2).zip(values) {
            chunk.copy_from_slice(&v.to_bits().to_le_bytes());
        }
        Ok(())
    }

    pub fn read_half(&self, offset: usize) -> Option<f16> {
        let bytes = self.bytes.get(offset..offset.checked_add(2)?)?;
        Some(f16::from_bits(u16::from_le_bytes([bytes[0], bytes[1]])))
    }

    /// Fetch one 16-byte tile row on behalf of `lane`, as four packed pairs.
    ///
    /// Bounds are checked before alignment, so an address past the end is
    /// always `OutOfBounds`.
    pub(crate) fn read_row(&self, lane: usize, addr: u32) -> WarpResult<[u32; 4]> {
        let start = addr as usize;
        let row = start
            .checked_add(TILE_ROW_BYTES)
            .and_then(|end| self.bytes.get(start..end))
            .ok_or(WarpError::OutOfBounds {
                lane,
                addr,
                len: self.bytes.len(),
            })?;
        if start % TILE_ROW_BYTES != 0 {
            return Err(WarpError::Misaligned { lane, addr });
        }
        let mut words = [0u32; 4];
        for (word, chunk) in words.iter_mut().zip(row.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(words)
    }
}

/// The shared-memory address each lane hands to `ldmatrix`.
///
/// Lanes `8m..8m+7` name rows 0..7 of matrix `m`; lanes past the last
/// matrix of a narrower load are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneAddrs([u32; WARP_SIZE]);

impl LaneAddrs {
    pub fn from_fn(f: impl FnMut(usize) -> u32) -> Self {
        Self(core::array::from_fn(f))
    }

    /// Tiles stored back to back from `base`: lane `i` points at `base + 16 * i`.
    ///
    /// Addresses that would pass `u32::MAX` saturate there, which every
    /// load rejects as out of bounds.
    pub fn contiguous(base: u32) -> Self {
        Self::from_fn(|lane| base.saturating_add((lane * TILE_ROW_BYTES) as u32))
    }

    /// 8-column tiles cut from a row-major matrix with `row_stride` bytes
    /// per row. Tile `m` starts `tile_offsets[m]` bytes after `base`.
    /// Saturates like [`LaneAddrs::contiguous`].
    pub fn strided(base: u32, row_stride: u32, tile_offsets: [u32; 4]) -> Self {
        Self::from_fn(|lane| {
            let (matrix, row) = (lane / 8, (lane % 8) as u64);
            let addr = base as u64 + tile_offsets[matrix] as u64 + row * row_stride as u64;
            u32::try_from(addr).unwrap_or(u32::MAX)
        })
    }

    pub fn lane(&self, lane: usize) -> u32 {
        self.0[lane]
    }

    pub fn as_array(&self) -> &[u32; WARP_SIZE] {
        &self.0
    }
}
