//! Heightfield terrain.
//!
//! For every column the surface height is
//! `floor(height * (offset + magnitude * noise))`, clamped to the chunk.
//! Below the surface the column is layered, bottom to top:
//!
//! * bedrock up to the bedrock thickness (overwrites ore)
//! * stone up to `surface height - surface thickness`, filled only into air
//!   so that ore deposits are preserved
//! * dirt for the rest of the band
//!
//! The surface voxel itself becomes grass and everything above it is air.

use cgmath::Point3;

use crate::config::ThicknessParams;
use crate::engine_state::voxels::block::block_type::BlockType;

use super::{ChunkGrid, PassContext};

/// Horizontal period, in voxels, of the layer thickness noise.
const THICKNESS_PERIOD: f64 = 8.0;

fn thickness(params: &ThicknessParams, sample: f64) -> f64 {
    params.offset + (sample * params.magnitude).abs()
}

/// Surface height of a column from a terrain noise sample.
pub fn column_height(chunk_height: i32, offset: f64, magnitude: f64, sample: f64) -> i32 {
    let scaled = offset + magnitude * sample;
    let height = (chunk_height as f64 * scaled).floor() as i32;
    height.clamp(0, chunk_height - 1)
}

pub fn shape_terrain(ctx: &PassContext, grid: &mut ChunkGrid) {
    let terrain = &ctx.params.terrain;
    for (x, z) in ctx.columns() {
        let (wx, wz) = ctx.world_xz(x, z);
        let sample = ctx.noise.terrain(wx / terrain.scale, wz / terrain.scale);
        let height = column_height(ctx.size.height, terrain.offset, terrain.magnitude, sample);

        let (tx, tz) = (wx / THICKNESS_PERIOD, wz / THICKNESS_PERIOD);
        let surface = thickness(&ctx.params.surface, ctx.noise.surface(tx, tz));
        let bedrock = thickness(&ctx.params.bedrock, ctx.noise.bedrock(tx, tz));

        for y in 0..ctx.size.height {
            let p = Point3::new(x, y, z);
            let fy = y as f64;
            if y < height {
                if fy < bedrock {
                    grid.set(p, BlockType::Bedrock);
                } else if fy < height as f64 - surface {
                    grid.set_if_air(p, BlockType::Stone);
                } else {
                    grid.set(p, BlockType::Dirt);
                }
            } else if y == height {
                grid.set(p, BlockType::Grass);
            } else {
                grid.set(p, BlockType::Air);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_is_clamped_to_the_chunk() {
        assert_eq!(column_height(32, 0.5, 0.0, 0.9), 16);
        assert_eq!(column_height(32, 1.0, 1.0, 1.0), 31);
        assert_eq!(column_height(32, 0.0, 1.0, -1.0), 0);
    }

    #[test]
    fn thickness_uses_the_noise_magnitude() {
        let params = ThicknessParams {
            offset: 4.0,
            magnitude: 2.0,
        };
        assert_eq!(thickness(&params, -0.5), 5.0);
        assert_eq!(thickness(&params, 0.0), 4.0);
    }
}
