//! Numeric and launch-shape constants shared by the rasterizer and the primitives.

/// log2(e), rounded to f32.
pub const LOG2E: f32 = 1.442_695_021_629_333_496_1_f32;
/// log2(e) / 2, for exp(-x²/2)-style Gaussian falloff in base 2.
pub const LOG2E_2: f32 = LOG2E * 0.5;
pub const LOG2E_N: f32 = -LOG2E;
pub const LOG2E_N_2: f32 = -LOG2E_2;
/// ln(2), converts a base-2 logarithm back to natural log.
pub const LN2: f32 = 0.693_147_180_559_945_3_f32;

/// Lanes per warp.
pub const WARP_SIZE: usize = 32;
/// Width of the half-warp shuffle reduction.
pub const REDUCE_SIZE: usize = 16;
/// Halves per 128-bit vector load.
pub const VECTOR_SIZE: usize = 8;

pub const BLOCK_X: usize = 16;
pub const BLOCK_Y: usize = 16;
/// Threads per rasterizer block (one 16x16 pixel tile).
pub const BLOCK_SIZE: usize = BLOCK_X * BLOCK_Y;

/// Largest finite binary16 magnitude.
pub const HALF_MAX: f32 = 65504.0;

/// Edge length of one ldmatrix tile.
pub const TILE_DIM: usize = 8;
/// Bytes in one tile row (8 halves).
pub const TILE_ROW_BYTES: usize = TILE_DIM * 2;
/// Bytes in one 8x8 binary16 tile.
pub const TILE_BYTES: usize = TILE_DIM * TILE_ROW_BYTES;
