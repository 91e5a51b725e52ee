//! # Instance Buffers
//!
//! Dense per-kind arrays of render-instance transforms.
//!
//! Each block kind owns one [`InstanceBuffer`]. Adding an instance appends at
//! the end; removing one moves the last transform into the freed slot
//! (swap-remove) so the array never has holes. The buffer records which voxel
//! owns every slot so the caller can re-point the relocated voxel at its new
//! slot. Getting that remap wrong either draws a stale transform or leaves an
//! instance that can never be removed.

use cgmath::{Matrix4, Rad, Vector3};

use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::RenderShape;
use crate::engine_state::voxels::coordinates::LocalCoordinate;

/// A single instance transform, laid out for direct upload as a vertex
/// buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    /// Column-major model matrix, chunk-local.
    pub model: [[f32; 4]; 4],
}

impl InstanceRaw {
    pub fn from_matrix(matrix: Matrix4<f32>) -> Self {
        InstanceRaw {
            model: matrix.into(),
        }
    }

    /// Translation part of the model matrix.
    pub fn translation(&self) -> Vector3<f32> {
        let w = self.model[3];
        Vector3::new(w[0], w[1], w[2])
    }

    /// Transforms for a voxel drawn with `shape`.
    ///
    /// Cubes get one translation to the cell centre. Crossed planes get two,
    /// rotated by +45° and -45° about the vertical axis.
    pub fn for_voxel(local: LocalCoordinate, shape: RenderShape) -> Vec<InstanceRaw> {
        let centre = Vector3::new(
            local.x as f32 + 0.5,
            local.y as f32 + 0.5,
            local.z as f32 + 0.5,
        );
        let translation = Matrix4::from_translation(centre);
        match shape {
            RenderShape::Cube => vec![InstanceRaw::from_matrix(translation)],
            RenderShape::Cross => {
                let quarter = Rad(std::f32::consts::FRAC_PI_4);
                vec![
                    InstanceRaw::from_matrix(translation * Matrix4::from_angle_y(quarter)),
                    InstanceRaw::from_matrix(translation * Matrix4::from_angle_y(-quarter)),
                ]
            }
        }
    }
}

/// Render slots held by one voxel: none, one (cube) or two (crossed planes).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InstanceIds {
    ids: [u32; 2],
    len: u8,
}

impl InstanceIds {
    pub const EMPTY: InstanceIds = InstanceIds { ids: [0; 2], len: 0 };

    pub fn as_slice(&self) -> &[u32] {
        &self.ids[..self.len as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Appends a slot. Returns `false` when both slots are already taken.
    pub fn push(&mut self, id: u32) -> bool {
        if self.len as usize >= self.ids.len() {
            return false;
        }
        self.ids[self.len as usize] = id;
        self.len += 1;
        true
    }

    /// Removes and returns the first slot.
    pub fn pop_front(&mut self) -> Option<u32> {
        if self.len == 0 {
            return None;
        }
        let first = self.ids[0];
        self.ids[0] = self.ids[1];
        self.len -= 1;
        Some(first)
    }

    /// Re-points slot `from` at `to`. Returns whether `from` was held.
    pub fn replace(&mut self, from: u32, to: u32) -> bool {
        let len = self.len as usize;
        match self.ids[..len].iter_mut().find(|id| **id == from) {
            Some(id) => {
                *id = to;
                true
            }
            None => false,
        }
    }
}

/// Incremental change to a chunk's instance buffers, for the render
/// collaborator.
#[derive(Clone, Debug, PartialEq)]
pub enum InstanceEvent {
    Added {
        kind: BlockType,
        local: LocalCoordinate,
        transforms: Vec<InstanceRaw>,
    },
    Removed {
        kind: BlockType,
        local: LocalCoordinate,
    },
}

/// Dense, swap-remove array of instance transforms for one block kind.
#[derive(Clone, Debug, Default)]
pub struct InstanceBuffer {
    transforms: Vec<InstanceRaw>,
    owners: Vec<LocalCoordinate>,
    needs_update: bool,
}

impl InstanceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active instances.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Active transforms, slot-ordered.
    pub fn transforms(&self) -> &[InstanceRaw] {
        &self.transforms
    }

    /// Active transforms as raw bytes, ready to upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.transforms)
    }

    /// Voxel owning a slot.
    pub fn owner(&self, slot: u32) -> Option<LocalCoordinate> {
        self.owners.get(slot as usize).copied()
    }

    /// Whether the buffer changed since the last call. Clears the flag.
    pub fn take_needs_update(&mut self) -> bool {
        std::mem::take(&mut self.needs_update)
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Appends a transform owned by `owner` and returns its slot.
    pub fn push(&mut self, owner: LocalCoordinate, transform: InstanceRaw) -> u32 {
        let slot = self.transforms.len() as u32;
        self.transforms.push(transform);
        self.owners.push(owner);
        self.needs_update = true;
        slot
    }

    /// Frees `slot` by moving the last instance into it.
    ///
    /// # Returns
    /// The owner of the relocated instance, whose slot changed from
    /// `self.len()` (the former last index) to `slot`. `None` if `slot` was
    /// the last one or out of range.
    pub fn swap_remove(&mut self, slot: u32) -> Option<LocalCoordinate> {
        let index = slot as usize;
        if index >= self.transforms.len() {
            return None;
        }
        self.transforms.swap_remove(index);
        self.owners.swap_remove(index);
        self.needs_update = true;
        self.owners.get(index).copied()
    }

    /// Drops every instance.
    pub fn clear(&mut self) {
        if !self.transforms.is_empty() {
            self.needs_update = true;
        }
        self.transforms.clear();
        self.owners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;

    #[test]
    fn swap_remove_reports_the_moved_owner() {
        let mut buffer = InstanceBuffer::new();
        let a = Point3::new(0, 0, 0);
        let b = Point3::new(1, 0, 0);
        let c = Point3::new(2, 0, 0);
        for p in [a, b, c] {
            buffer.push(p, InstanceRaw::for_voxel(p, RenderShape::Cube)[0]);
        }
        assert!(buffer.take_needs_update());

        assert_eq!(buffer.swap_remove(0), Some(c));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.owner(0), Some(c));
        assert_eq!(buffer.transforms()[0].translation(), Vector3::new(2.5, 0.5, 0.5));
        assert!(buffer.take_needs_update());

        assert_eq!(buffer.swap_remove(1), None);
        assert_eq!(buffer.swap_remove(5), None);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn crossed_planes_share_a_centre() {
        let transforms = InstanceRaw::for_voxel(Point3::new(3, 4, 5), RenderShape::Cross);
        assert_eq!(transforms.len(), 2);
        assert_ne!(transforms[0], transforms[1]);
        for t in transforms {
            assert_eq!(t.translation(), Vector3::new(3.5, 4.5, 5.5));
        }
    }

    #[test]
    fn instance_ids_hold_at_most_two() {
        let mut ids = InstanceIds::EMPTY;
        assert!(ids.push(4));
        assert!(ids.push(9));
        assert!(!ids.push(1));
        assert!(ids.replace(9, 2));
        assert!(!ids.replace(9, 3));
        assert_eq!(ids.as_slice(), &[4, 2]);
        assert_eq!(ids.pop_front(), Some(4));
        assert_eq!(ids.as_slice(), &[2]);
    }

    #[test]
    fn raw_bytes_match_the_transform_count() {
        let mut buffer = InstanceBuffer::new();
        let p = Point3::new(0, 0, 0);
        buffer.push(p, InstanceRaw::for_voxel(p, RenderShape::Cube)[0]);
        assert_eq!(buffer.as_bytes().len(), std::mem::size_of::<InstanceRaw>());
    }
}
