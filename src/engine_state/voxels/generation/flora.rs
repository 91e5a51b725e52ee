//! Tall grass patches and flowers.
//!
//! Each column is scanned from the top. Leaves end the scan, since nothing
//! grows under a canopy. At the first grass voxel with air above it the
//! column may seed a tall grass tuft, which then spreads by a short random
//! walk to neighboring grass at the same level. Columns that do not seed
//! grass may instead grow a single rose or dandelion.

use std::f64::consts::TAU;

use cgmath::Point3;

use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::noise_field::Channel;

use super::{ChunkGrid, PassContext};

pub fn grow_flora(ctx: &PassContext, grid: &mut ChunkGrid) {
    let grass = &ctx.params.grass;
    let flowers = &ctx.params.flowers;
    let mut rng = ctx.noise.rng(ctx.chunk, Channel::Flora);

    for (x, z) in ctx.columns() {
        for y in (0..ctx.size.height).rev() {
            let block = grid.get(Point3::new(x, y, z));
            if block == Some(BlockType::Leaves) {
                break;
            }
            if block != Some(BlockType::Grass) {
                continue;
            }

            let base_y = y + 1;
            if !grid.is(Point3::new(x, base_y, z), BlockType::Air) {
                break;
            }

            if rng.f64() < grass.frequency {
                grid.set(Point3::new(x, base_y, z), BlockType::TallGrass);
                let (mut walk_x, mut walk_z) = (x, z);
                for _ in 0..grass.patch_size {
                    let direction = rng.f64() * TAU;
                    walk_x += direction.cos().round() as i32;
                    walk_z += direction.sin().round() as i32;
                    if grid.is(Point3::new(walk_x, y, walk_z), BlockType::Grass) {
                        grid.set_if_air(Point3::new(walk_x, base_y, walk_z), BlockType::TallGrass);
                    }
                }
            } else if rng.f64() < flowers.frequency {
                let flower = if rng.bool() {
                    BlockType::FlowerRose
                } else {
                    BlockType::FlowerDandelion
                };
                grid.set(Point3::new(x, base_y, z), flower);
            }
            break;
        }
    }
}
