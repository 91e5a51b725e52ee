//! Ore deposits.
//!
//! Each configured ore samples its own 3D noise channel at the voxel's world
//! position divided by the ore's per-axis scale. Wherever the value exceeds
//! the ore's scarcity threshold the voxel becomes that ore. Ores are visited
//! in configuration order, so where two deposits overlap the later ore wins.
//!
//! This pass runs before terrain. Terrain only fills stone into air, so the
//! deposits survive inside the stone layer and are cleared everywhere else.

use cgmath::Point3;

use super::{ChunkGrid, PassContext};

pub fn place_ores(ctx: &PassContext, grid: &mut ChunkGrid) {
    for (index, ore) in ctx.params.ores.iter().enumerate() {
        let [sx, sy, sz] = ore.scale;
        for (x, z) in ctx.columns() {
            let (wx, wz) = ctx.world_xz(x, z);
            for y in 0..ctx.size.height {
                let value = ctx.noise.ore(index, wx / sx, y as f64 / sy, wz / sz);
                if value > ore.scarcity {
                    grid.set(Point3::new(x, y, z), ore.block);
                }
            }
        }
    }
}
