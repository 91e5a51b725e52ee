//! # Block Side Module
//!
//! This module defines the six faces of a voxel block. Faces are used in two
//! places: as the index order of per-face visual handles, and as the set of
//! axis-aligned neighbor directions walked by occlusion checks and edit
//! propagation.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// The order is: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The front face (facing positive Z)
    FRONT = 0,

    /// The back face (facing negative Z)
    BACK = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The left face (facing negative X)
    LEFT = 4,

    /// The right face (facing positive X)
    RIGHT = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in a consistent order.
    ///
    /// # Returns
    /// An array containing all `BlockSide` variants.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// Unit offset from a voxel to the neighbor sharing this face.
    pub fn offset(&self) -> Vector3<i32> {
        match self {
            BlockSide::FRONT => Vector3::new(0, 0, 1),
            BlockSide::BACK => Vector3::new(0, 0, -1),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
        }
    }

    /// Offsets to all six face neighbors, in [`BlockSide::all`] order.
    pub fn neighbor_offsets() -> [Vector3<i32>; 6] {
        Self::all().map(|side| side.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_unit_and_cancel_out() {
        let offsets = BlockSide::neighbor_offsets();
        let sum = offsets.iter().fold(Vector3::new(0, 0, 0), |acc, o| acc + o);
        assert_eq!(sum, Vector3::new(0, 0, 0));
        for o in offsets {
            assert_eq!(o.x.abs() + o.y.abs() + o.z.abs(), 1);
        }
    }
}
