//! Dense tiles and their warp-distributed fragment layouts.
//!
//! With `group = lane / 4` and `pair = lane % 4`, every packed register
//! holds columns `2 * pair` (low half) and `2 * pair + 1` (high half):
//!
//! | operand | register | row           | columns               |
//! |---------|----------|---------------|-----------------------|
//! | A 16x8  | 0        | `group`       | `2*pair, 2*pair+1`    |
//! | A 16x8  | 1        | `group + 8`   | `2*pair, 2*pair+1`    |
//! | B 8x8   | 0        | `2*pair, 2*pair+1` (k) | `group` (n)  |
//! | C/D     | 0 / 1    | `group` / `group + 8` | `2*pair, 2*pair+1` |
//!
//! This is exactly what `ldmatrix` produces for one 8x8 tile, so A is two
//! stacked tiles and B is one tile stored transposed (n-major).

use half::f16;

use crate::constants::{TILE_DIM, WARP_SIZE};
use crate::types::Half2;
use crate::warp::{SharedMemory, WarpResult};

/// Row-major binary16 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix<const ROWS: usize, const COLS: usize> {
    data: [[f16; COLS]; ROWS],
}

/// A and C/D operand shape of `mma.m16n8k8`.
pub type Matrix16x8 = Matrix<16, 8>;
/// B operand shape, and one `ldmatrix` tile.
pub type Matrix8x8 = Matrix<8, 8>;

impl<const ROWS: usize, const COLS: usize> Default for Matrix<ROWS, COLS> {
    fn default() -> Self {
        Self::zeros()
    }
}

impl<const ROWS: usize, const COLS: usize> Matrix<ROWS, COLS> {
    pub fn zeros() -> Self {
        Self {
            data: [[f16::ZERO; COLS]; ROWS],
        }
    }

    pub fn from_fn(mut f: impl FnMut(usize, usize) -> f16) -> Self {
        Self {
            data: core::array::from_fn(|r| core::array::from_fn(|c| f(r, c))),
        }
    }

    /// Round each element of a row-major f32 slice to nearest-even.
    pub fn from_f32_slice(values: &[f32]) -> Option<Self> {
        if values.len() != ROWS * COLS {
            return None;
        }
        Some(Self::from_fn(|r, c| f16::from_f32(values[r * COLS + c])))
    }

    pub fn get(&self, row: usize, col: usize) -> f16 {
        self.data[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, v: f16) {
        self.data[row][col] = v;
    }

    pub fn rows(&self) -> &[[f16; COLS]; ROWS] {
        &self.data
    }

    pub fn transpose(&self) -> Matrix<COLS, ROWS> {
        Matrix::from_fn(|r, c| self.data[c][r])
    }

    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.data.iter().flatten().map(|v| v.to_f32()).collect()
    }

    /// Store row-major at byte `offset`.
    pub fn store(&self, smem: &mut SharedMemory, offset: usize) -> WarpResult<()> {
        let flat: Vec<f16> = self.data.iter().flatten().copied().collect();
        smem.write_halves(offset, &flat)
    }
}

impl<const N: usize> Matrix<N, N> {
    pub fn identity() -> Self {
        Self::from_fn(|r, c| if r == c { f16::ONE } else { f16::ZERO })
    }
}

#[inline]
fn group_pair(lane: usize) -> (usize, usize) {
    (lane / 4, lane % 4)
}

/// Pack `row[2 * pair]` and `row[2 * pair + 1]`.
#[inline]
fn pack_pair<const COLS: usize>(row: &[f16; COLS], pair: usize) -> u32 {
    Half2::new(row[2 * pair], row[2 * pair + 1]).to_bits()
}

/// Distribute one 8x8 tile the way `ldmatrix` does: lane holds row
/// `lane / 4`, columns `2 * (lane % 4)..+2`.
pub fn tile_to_lane_regs(tile: &Matrix8x8) -> [u32; WARP_SIZE] {
    core::array::from_fn(|lane| {
        let (group, pair) = group_pair(lane);
        pack_pair(&tile.data[group], pair)
    })
}

/// Inverse of [`tile_to_lane_regs`].
pub fn lane_regs_to_tile(regs: &[u32; WARP_SIZE]) -> Matrix8x8 {
    let mut tile = Matrix8x8::zeros();
    for (lane, &reg) in regs.iter().enumerate() {
        let (group, pair) = group_pair(lane);
        let h = Half2::from_bits(reg);
        tile.data[group][2 * pair] = h.x();
        tile.data[group][2 * pair + 1] = h.y();
    }
    tile
}

/// A operand: 16x8 row-major, two registers per lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentA {
    pub regs: [[u32; 2]; WARP_SIZE],
}

/// B operand: 8x8 column layout, one register per lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentB {
    pub regs: [u32; WARP_SIZE],
}

/// C and D operands: 16x8 accumulator, two registers per lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentC {
    pub regs: [[u32; 2]; WARP_SIZE],
}

/// Split a 16x8 matrix into its top and bottom 8x8 tiles.
fn split_rows(m: &Matrix16x8) -> [Matrix8x8; 2] {
    [
        Matrix8x8::from_fn(|r, c| m.data[r][c]),
        Matrix8x8::from_fn(|r, c| m.data[r + TILE_DIM][c]),
    ]
}

fn stack_rows(top: &Matrix8x8, bottom: &Matrix8x8) -> Matrix16x8 {
    Matrix16x8::from_fn(|r, c| {
        if r < TILE_DIM {
            top.data[r][c]
        } else {
            bottom.data[r - TILE_DIM][c]
        }
    })
}

fn to_split_regs(m: &Matrix16x8) -> [[u32; 2]; WARP_SIZE] {
    let [top, bottom] = split_rows(m);
    let (top, bottom) = (tile_to_lane_regs(&top), tile_to_lane_regs(&bottom));
    core::array::from_fn(|lane| [top[lane], bottom[lane]])
}

fn from_split_regs(regs: &[[u32; 2]; WARP_SIZE]) -> Matrix16x8 {
    let top: [u32; WARP_SIZE] = core::array::from_fn(|lane| regs[lane][0]);
    let bottom: [u32; WARP_SIZE] = core::array::from_fn(|lane| regs[lane][1]);
    stack_rows(&lane_regs_to_tile(&top), &lane_regs_to_tile(&bottom))
}

impl FragmentA {
    pub fn from_matrix(m: &Matrix16x8) -> Self {
        Self {
            regs: to_split_regs(m),
        }
    }

    pub fn to_matrix(&self) -> Matrix16x8 {
        from_split_regs(&self.regs)
    }
}

impl FragmentB {
    /// B is k x n; lanes hold columns, so distribute the transpose.
    pub fn from_matrix(m: &Matrix8x8) -> Self {
        Self {
            regs: tile_to_lane_regs(&m.transpose()),
        }
    }

    pub fn to_matrix(&self) -> Matrix8x8 {
        lane_regs_to_tile(&self.regs).transpose()
    }
}

impl FragmentC {
    pub fn zeros() -> Self {
        Self {
            regs: [[0; 2]; WARP_SIZE],
        }
    }

    pub fn from_matrix(m: &Matrix16x8) -> Self {
        Self {
            regs: to_split_regs(m),
        }
    }

    pub fn to_matrix(&self) -> Matrix16x8 {
        from_split_regs(&self.regs)
    }
}

impl Default for FragmentC {
    fn default() -> Self {
        Self::zeros()
    }
}
