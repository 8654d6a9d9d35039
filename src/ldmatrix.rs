//! `ldmatrix.sync.aligned.m8n8.shared.b16` in its x1, x2 and x4 forms.

use crate::constants::WARP_SIZE;
use crate::warp::{LaneAddrs, SharedMemory, Warp, WarpResult};

/// Number of 8x8 tiles moved by one `ldmatrix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadWidth {
    X1,
    X2,
    X4,
}

impl LoadWidth {
    pub const fn tiles(self) -> usize {
        match self {
            LoadWidth::X1 => 1,
            LoadWidth::X2 => 2,
            LoadWidth::X4 => 4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            LoadWidth::X1 => "x1",
            LoadWidth::X2 => "x2",
            LoadWidth::X4 => "x4",
        }
    }
}

impl Warp {
    /// Shared body of the three widths: lane `l` receives, from matrix `m`,
    /// the pair at columns `2 * (l % 4)` of the row whose address lane
    /// `8m + l / 4` supplied.
    fn load_matrices<const N: usize>(
        &self,
        smem: &SharedMemory,
        addrs: &LaneAddrs,
    ) -> WarpResult<[[u32; N]; WARP_SIZE]> {
        self.require_converged()?;

        let mut rows = [[0u32; 4]; WARP_SIZE];
        for (src_lane, row) in rows.iter_mut().enumerate().take(N * 8) {
            *row = smem.read_row(src_lane, addrs.lane(src_lane))?;
        }

        Ok(core::array::from_fn(|lane| {
            core::array::from_fn(|matrix| rows[matrix * 8 + lane / 4][lane % 4])
        }))
    }

    /// Load one tile. Only lanes 0..8 supply addresses.
    pub fn load_matrix_x1(
        &self,
        smem: &SharedMemory,
        addrs: &LaneAddrs,
    ) -> WarpResult<[u32; WARP_SIZE]> {
        let regs = self.load_matrices::<1>(smem, addrs)?;
        Ok(core::array::from_fn(|lane| regs[lane][0]))
    }

    /// Load two tiles. Lanes 0..16 supply addresses.
    pub fn load_matrix_x2(
        &self,
        smem: &SharedMemory,
        addrs: &LaneAddrs,
    ) -> WarpResult<[[u32; 2]; WARP_SIZE]> {
        self.load_matrices::<2>(smem, addrs)
    }

    /// Load four tiles. Every lane supplies an address.
    pub fn load_matrix_x4(
        &self,
        smem: &SharedMemory,
        addrs: &LaneAddrs,
    ) -> WarpResult<[[u32; 4]; WARP_SIZE]> {
        self.load_matrices::<4>(smem, addrs)
    }

    /// Width chosen at runtime; registers returned lane-major,
    /// `width.tiles()` per lane.
    pub fn load_matrix(
        &self,
        width: LoadWidth,
        smem: &SharedMemory,
        addrs: &LaneAddrs,
    ) -> WarpResult<Vec<u32>> {
        Ok(match width {
            LoadWidth::X1 => self.load_matrix_x1(smem, addrs)?.to_vec(),
            LoadWidth::X2 => self.load_matrix_x2(smem, addrs)?.concat(),
            LoadWidth::X4 => self.load_matrix_x4(smem, addrs)?.concat(),
        })
    }
}
