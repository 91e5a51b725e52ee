//! Oak trees.
//!
//! Candidate columns are inset from the chunk border far enough that a full
//! canopy always fits, and every write is additionally bounds-checked. A
//! column grows a tree when its tree noise, remapped to [0, 1], reaches
//! `1 - frequency`. The trunk starts above the topmost grass voxel and the
//! canopy is built in four layers, counting down from the trunk top:
//!
//! * layer 0: a plus shape at the trunk top
//! * layer 1: a plus shape plus a disk of random radius, each free cell
//!   leafed with 50% probability
//! * layers 2 and 3: 5×5 squares whose corners are each cleared with 50%
//!   probability
//!
//! Trees only fill air. They never displace terrain, ore or another tree.

use cgmath::Point3;

use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::noise_field::Channel;

use super::{topmost, ChunkGrid, PassContext};

/// Half-extent of the square canopy layers.
const SQUARE_RADIUS: i32 = 2;

const PLUS: [(i32, i32); 5] = [(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)];

fn leaf_plus(grid: &mut ChunkGrid, x: i32, y: i32, z: i32) {
    for (dx, dz) in PLUS {
        grid.set_if_air(Point3::new(x + dx, y, z + dz), BlockType::Leaves);
    }
}

pub fn plant_trees(ctx: &PassContext, grid: &mut ChunkGrid) {
    let trees = &ctx.params.trees;
    if trees.frequency <= 0.0 {
        return;
    }
    let mut rng = ctx.noise.rng(ctx.chunk, Channel::Trees);
    let inset = (trees.canopy_size.max as i32).max(SQUARE_RADIUS);
    let width = ctx.size.width;

    for base_x in inset..width - inset {
        for base_z in inset..width - inset {
            let (wx, wz) = ctx.world_xz(base_x, base_z);
            let n = ctx.noise.trees(wx, wz) * 0.5 + 0.5;
            if n < 1.0 - trees.frequency {
                continue;
            }
            let Some(ground) = topmost(grid, base_x, base_z, BlockType::Grass) else {
                continue;
            };

            let base_y = ground + 1;
            let trunk_height =
                rng.u32(trees.trunk_height.min..=trees.trunk_height.max) as i32;
            let top_y = base_y + trunk_height;
            if top_y >= ctx.size.height {
                continue;
            }

            for y in base_y..top_y {
                grid.set_if_air(Point3::new(base_x, y, base_z), BlockType::OakLog);
            }

            leaf_plus(grid, base_x, top_y, base_z);

            let y = top_y - 1;
            leaf_plus(grid, base_x, y, base_z);
            let radius = rng.u32(trees.canopy_size.min..=trees.canopy_size.max) as i32;
            for dx in -radius..=radius {
                for dz in -radius..=radius {
                    if dx * dx + dz * dz > radius * radius {
                        continue;
                    }
                    let p = Point3::new(base_x + dx, y, base_z + dz);
                    if grid.is(p, BlockType::Air) && rng.bool() {
                        grid.set(p, BlockType::Leaves);
                    }
                }
            }

            for layer in 2..=3 {
                let y = top_y - layer;
                for dx in -SQUARE_RADIUS..=SQUARE_RADIUS {
                    for dz in -SQUARE_RADIUS..=SQUARE_RADIUS {
                        grid.set_if_air(Point3::new(base_x + dx, y, base_z + dz), BlockType::Leaves);
                    }
                }
                for dx in [-SQUARE_RADIUS, SQUARE_RADIUS] {
                    for dz in [-SQUARE_RADIUS, SQUARE_RADIUS] {
                        let corner = Point3::new(base_x + dx, y, base_z + dz);
                        if rng.bool() && grid.is(corner, BlockType::Leaves) {
                            grid.set(corner, BlockType::Air);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenerationParams, IntRange, TreeParams};
    use crate::engine_state::voxels::coordinates::{ChunkCoordinate, ChunkSize};
    use crate::engine_state::voxels::generation::terrain::shape_terrain;
    use crate::engine_state::voxels::noise_field::NoiseField;

    fn flat_params(frequency: f64) -> GenerationParams {
        let mut params = GenerationParams {
            seed: 5,
            ores: Vec::new(),
            trees: TreeParams {
                frequency,
                trunk_height: IntRange::new(4, 4),
                canopy_size: IntRange::new(1, 3),
            },
            ..GenerationParams::default()
        };
        params.terrain.magnitude = 0.0;
        params
    }

    fn grow(params: &GenerationParams) -> ChunkGrid {
        let noise = NoiseField::new(params);
        let size = ChunkSize::new(16, 32);
        let ctx = PassContext {
            size,
            params,
            noise: &noise,
            chunk: ChunkCoordinate::new(0, 0),
        };
        let mut grid = ChunkGrid::new(size);
        shape_terrain(&ctx, &mut grid);
        plant_trees(&ctx, &mut grid);
        grid
    }

    #[test]
    fn zero_frequency_grows_nothing() {
        let grid = grow(&flat_params(0.0));
        assert_eq!(grid.count(BlockType::OakLog), 0);
        assert_eq!(grid.count(BlockType::Leaves), 0);
    }

    #[test]
    fn trunks_stand_on_grass_inside_the_inset() {
        let grid = grow(&flat_params(1.0));
        assert!(grid.count(BlockType::OakLog) > 0);
        for (p, block) in grid.iter() {
            if block != BlockType::OakLog {
                continue;
            }
            assert!(p.x >= 3 && p.x < 13 && p.z >= 3 && p.z < 13);
            // Flat terrain puts grass at y = 16, trunks are 4 tall.
            assert!(p.y >= 17 && p.y < 21, "trunk at {p:?}");
        }
        // Terrain below the trees is untouched.
        for x in 0..16 {
            for z in 0..16 {
                assert_eq!(grid.get(Point3::new(x, 16, z)), Some(BlockType::Grass));
            }
        }
    }

    #[test]
    fn trees_that_would_poke_out_of_the_chunk_are_skipped() {
        let mut params = flat_params(1.0);
        params.terrain.offset = 0.9;
        params.trees.trunk_height = IntRange::new(10, 10);
        let grid = grow(&params);
        assert_eq!(grid.count(BlockType::OakLog), 0);
    }
}
