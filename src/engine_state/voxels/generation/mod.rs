//! # Chunk Generation
//!
//! Procedural content for one chunk, built by layering independent passes
//! over a dense grid of block kinds:
//!
//! 1. [`ores`] - 3D noise deposits, written into empty space
//! 2. [`terrain`] - heightfield columns of bedrock, stone, dirt and grass
//! 3. [`trees`] - oak trunks and leaf canopies on the topmost grass
//! 4. [`flora`] - tall grass patches and single flowers
//!
//! The passes run in that fixed order. [`generate_chunk`] is a pure function
//! of its inputs: the same size, parameters, noise field and chunk coordinate
//! always produce the same grid, so results can be cached and regenerated
//! freely. Nothing here writes outside the chunk bounds.

use cgmath::Point3;

use crate::config::GenerationParams;

use super::block::block_type::BlockType;
use super::coordinates::{ChunkCoordinate, ChunkSize, LocalCoordinate};
use super::noise_field::NoiseField;

pub mod flora;
pub mod ores;
pub mod terrain;
pub mod trees;

/// Dense width × height × width grid of block kinds for one chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkGrid {
    size: ChunkSize,
    blocks: Vec<BlockType>,
}

impl ChunkGrid {
    /// Creates a grid filled with air.
    pub fn new(size: ChunkSize) -> Self {
        ChunkGrid {
            size,
            blocks: vec![BlockType::Air; size.volume()],
        }
    }

    pub fn size(&self) -> ChunkSize {
        self.size
    }

    /// Block at a local coordinate, or `None` outside the grid.
    #[inline]
    pub fn get(&self, local: LocalCoordinate) -> Option<BlockType> {
        self.size.index(local).map(|i| self.blocks[i])
    }

    /// Writes a block. Returns `false` and does nothing outside the grid.
    #[inline]
    pub fn set(&mut self, local: LocalCoordinate, block: BlockType) -> bool {
        match self.size.index(local) {
            Some(i) => {
                self.blocks[i] = block;
                true
            }
            None => false,
        }
    }

    /// Writes a block only into an in-bounds air cell.
    pub fn set_if_air(&mut self, local: LocalCoordinate, block: BlockType) -> bool {
        match self.size.index(local) {
            Some(i) if self.blocks[i] == BlockType::Air => {
                self.blocks[i] = block;
                true
            }
            _ => false,
        }
    }

    /// Whether the cell holds `block`. Out-of-bounds cells never match.
    #[inline]
    pub fn is(&self, local: LocalCoordinate, block: BlockType) -> bool {
        self.get(local) == Some(block)
    }

    /// Raw blocks in Y-major, then Z, then X order.
    pub fn blocks(&self) -> &[BlockType] {
        &self.blocks
    }

    /// Iterates over every cell with its local coordinate.
    pub fn iter(&self) -> impl Iterator<Item = (LocalCoordinate, BlockType)> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, block)| (self.size.local_from_index(i), *block))
    }

    /// Number of cells holding `block`.
    pub fn count(&self, block: BlockType) -> usize {
        self.blocks.iter().filter(|b| **b == block).count()
    }

    pub(crate) fn into_blocks(self) -> Vec<BlockType> {
        self.blocks
    }
}

/// Inputs shared by every pass over one chunk.
pub struct PassContext<'a> {
    pub size: ChunkSize,
    pub params: &'a GenerationParams,
    pub noise: &'a NoiseField,
    pub chunk: ChunkCoordinate,
}

impl PassContext<'_> {
    /// World-space X/Z of a local column.
    #[inline]
    pub fn world_xz(&self, x: i32, z: i32) -> (f64, f64) {
        let origin = self.size.origin(self.chunk);
        ((origin.x + x) as f64, (origin.z + z) as f64)
    }

    /// Iterates over every (x, z) column of the chunk.
    pub fn columns(&self) -> impl Iterator<Item = (i32, i32)> {
        let width = self.size.width;
        (0..width).flat_map(move |x| (0..width).map(move |z| (x, z)))
    }
}

/// Generates the content of one chunk.
///
/// # Arguments
/// * `size` - Chunk dimensions
/// * `params` - Generation knobs
/// * `noise` - Noise field built from the same `params`
/// * `chunk` - Coordinate of the chunk to generate
///
/// # Returns
/// The generated grid, before any player edits are applied.
pub fn generate_chunk(
    size: ChunkSize,
    params: &GenerationParams,
    noise: &NoiseField,
    chunk: ChunkCoordinate,
) -> ChunkGrid {
    let ctx = PassContext {
        size,
        params,
        noise,
        chunk,
    };
    let mut grid = ChunkGrid::new(size);
    ores::place_ores(&ctx, &mut grid);
    terrain::shape_terrain(&ctx, &mut grid);
    trees::plant_trees(&ctx, &mut grid);
    flora::grow_flora(&ctx, &mut grid);
    grid
}

/// Topmost cell of a column holding `block`.
pub(crate) fn topmost(grid: &ChunkGrid, x: i32, z: i32, block: BlockType) -> Option<i32> {
    (0..grid.size().height)
        .rev()
        .find(|y| grid.is(Point3::new(x, *y, z), block))
}
