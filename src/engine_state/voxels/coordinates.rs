//! Coordinate spaces of the voxel world.
//!
//! * [`ChunkCoordinate`] names a chunk column on the XZ plane.
//! * [`LocalCoordinate`] addresses a voxel inside one chunk.
//! * [`GlobalCoordinate`] addresses a voxel in world space.
//!
//! `global = chunk * width + local` on X and Z; Y is not partitioned.

use cgmath::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Voxel address inside a chunk, bounded by [`ChunkSize`].
pub type LocalCoordinate = Point3<i32>;

/// Voxel address in world space.
pub type GlobalCoordinate = Point3<i32>;

/// Chunk indices on the XZ plane.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChunkCoordinate {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoordinate {
    pub const fn new(x: i32, z: i32) -> Self {
        ChunkCoordinate { x, z }
    }

    /// Squared Euclidean distance in chunk units.
    pub fn distance_squared(&self, other: &ChunkCoordinate) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dz * dz
    }
}

/// Dimensions of every chunk in the world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkSize {
    /// Extent on X and Z.
    pub width: i32,
    /// Extent on Y.
    pub height: i32,
}

impl Default for ChunkSize {
    fn default() -> Self {
        ChunkSize {
            width: 16,
            height: 32,
        }
    }
}

impl ChunkSize {
    pub const fn new(width: i32, height: i32) -> Self {
        ChunkSize { width, height }
    }

    /// Total number of voxels in one chunk.
    pub fn volume(&self) -> usize {
        (self.width as usize) * (self.width as usize) * (self.height as usize)
    }

    /// Whether a local coordinate lies inside the chunk.
    #[inline]
    pub fn contains(&self, local: LocalCoordinate) -> bool {
        local.x >= 0
            && local.x < self.width
            && local.y >= 0
            && local.y < self.height
            && local.z >= 0
            && local.z < self.width
    }

    /// Flat index of an in-bounds local coordinate, Y-major then Z then X.
    ///
    /// Returns `None` when the coordinate is out of bounds.
    #[inline]
    pub fn index(&self, local: LocalCoordinate) -> Option<usize> {
        if !self.contains(local) {
            return None;
        }
        Some(((local.y * self.width + local.z) * self.width + local.x) as usize)
    }

    /// Inverse of [`ChunkSize::index`].
    pub fn local_from_index(&self, index: usize) -> LocalCoordinate {
        let index = index as i32;
        let x = index % self.width;
        let z = (index / self.width) % self.width;
        let y = index / (self.width * self.width);
        Point3::new(x, y, z)
    }

    /// Whether a local coordinate sits on the outer shell of the chunk.
    pub fn is_on_shell(&self, local: LocalCoordinate) -> bool {
        local.x == 0
            || local.x == self.width - 1
            || local.y == 0
            || local.y == self.height - 1
            || local.z == 0
            || local.z == self.width - 1
    }

    /// Chunk containing a world-space voxel.
    pub fn chunk_of(&self, global: GlobalCoordinate) -> ChunkCoordinate {
        ChunkCoordinate::new(
            global.x.div_euclid(self.width),
            global.z.div_euclid(self.width),
        )
    }

    /// Chunk containing a continuous world-space position.
    pub fn chunk_of_position(&self, position: Point3<f32>) -> ChunkCoordinate {
        let width = self.width as f32;
        ChunkCoordinate::new(
            (position.x / width).floor() as i32,
            (position.z / width).floor() as i32,
        )
    }

    /// Splits a world-space voxel into its chunk and local coordinate.
    pub fn split(&self, global: GlobalCoordinate) -> (ChunkCoordinate, LocalCoordinate) {
        let chunk = self.chunk_of(global);
        let local = Point3::new(
            global.x.rem_euclid(self.width),
            global.y,
            global.z.rem_euclid(self.width),
        );
        (chunk, local)
    }

    /// Joins a chunk and local coordinate into world space.
    pub fn to_global(&self, chunk: ChunkCoordinate, local: LocalCoordinate) -> GlobalCoordinate {
        Point3::new(
            chunk.x * self.width + local.x,
            local.y,
            chunk.z * self.width + local.z,
        )
    }

    /// World-space offset of a chunk's local origin.
    pub fn origin(&self, chunk: ChunkCoordinate) -> Vector3<i32> {
        Vector3::new(chunk.x * self.width, 0, chunk.z * self.width)
    }
}
