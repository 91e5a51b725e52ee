//! # Chunk Module
//!
//! This module provides [`VoxelChunk`], one loaded chunk of the world: its
//! dense block grid plus the live mapping from voxels to render instances.
//!
//! ## Storage
//!
//! Blocks are stored densely, one [`BlockType`] per voxel, in Y-major, then Z,
//! then X order. Two bit vectors mirror the grid for the hot queries:
//! - `solid_array`: 1 bit per voxel, set when agents collide with the block
//! - `opaque_array`: 1 bit per voxel, set when the block hides its neighbors
//!
//! Both are kept in sync by [`VoxelChunk::set_block`].
//!
//! ## Instances
//!
//! A voxel is drawn iff it is not air, not obscured and not suppressed by the
//! border rule:
//! - **obscured**: all six face neighbors exist inside this chunk and are
//!   opaque. A missing neighbor (outside the chunk) or a transparent one
//!   exposes the voxel.
//! - **border rule**: voxels on the outer shell of the chunk are not drawn
//!   unless the voxel directly above is passable.
//!
//! [`VoxelChunk::refresh_instance`] re-evaluates one voxel against that rule
//! and adds or removes its instances, so the instance count of every kind
//! always matches the number of voxels that pass it.

use bitvec::vec::BitVec;

use super::block::block_side::BlockSide;
use super::block::block_type::BlockType;
use super::block::BlockRegistry;
use super::coordinates::{ChunkCoordinate, ChunkSize, LocalCoordinate};
use super::generation::ChunkGrid;
use instances::{InstanceBuffer, InstanceEvent, InstanceIds, InstanceRaw};

pub mod instances;

/// One loaded chunk: block grid plus render instance bookkeeping.
pub struct VoxelChunk {
    /// The position of this chunk in chunk coordinates.
    coordinate: ChunkCoordinate,
    size: ChunkSize,
    registry: BlockRegistry,
    blocks: Vec<BlockType>,
    solid_array: BitVec,
    opaque_array: BitVec,
    /// Render slots per voxel, indexed like `blocks`.
    instance_ids: Vec<InstanceIds>,
    /// One buffer per block kind, indexed by `BlockType as usize`.
    buffers: Vec<InstanceBuffer>,
    /// Changes not yet collected by the world.
    pending_events: Vec<InstanceEvent>,
}

impl VoxelChunk {
    /// Wraps a generated grid. No instances are built yet.
    ///
    /// # Arguments
    /// * `coordinate` - Where the chunk sits in the world
    /// * `grid` - Generated content, with or without edits applied
    /// * `registry` - Block catalog used for occlusion and solidity
    pub fn from_grid(coordinate: ChunkCoordinate, grid: ChunkGrid, registry: &BlockRegistry) -> Self {
        let size = grid.size();
        let blocks = grid.into_blocks();
        let mut chunk = VoxelChunk {
            coordinate,
            size,
            registry: registry.clone(),
            solid_array: BitVec::repeat(false, blocks.len()),
            opaque_array: BitVec::repeat(false, blocks.len()),
            instance_ids: vec![InstanceIds::EMPTY; blocks.len()],
            blocks,
            buffers: (0..BlockType::COUNT).map(|_| InstanceBuffer::new()).collect(),
            pending_events: Vec::new(),
        };
        chunk.update_masks();
        chunk
    }

    fn update_masks(&mut self) {
        for (i, block) in self.blocks.iter().enumerate() {
            let props = self.registry.get(*block);
            self.solid_array.set(i, props.solid);
            self.opaque_array.set(i, props.opaque);
        }
    }

    pub fn coordinate(&self) -> ChunkCoordinate {
        self.coordinate
    }

    pub fn size(&self) -> ChunkSize {
        self.size
    }

    /// Gets the block at a local coordinate.
    ///
    /// # Returns
    /// `None` when the coordinate lies outside the chunk.
    pub fn get_block(&self, local: LocalCoordinate) -> Option<BlockType> {
        self.size.index(local).map(|i| self.blocks[i])
    }

    /// Whether the voxel is solid. Out-of-bounds voxels are not.
    pub fn is_solid(&self, local: LocalCoordinate) -> bool {
        self.size.index(local).is_some_and(|i| self.solid_array[i])
    }

    fn is_opaque(&self, local: LocalCoordinate) -> bool {
        self.size.index(local).is_some_and(|i| self.opaque_array[i])
    }

    /// Overwrites a voxel without touching instances.
    ///
    /// Used for applying edits before the initial build; gameplay edits go
    /// through [`VoxelChunk::add_block`] and [`VoxelChunk::remove_block`].
    ///
    /// # Returns
    /// `false` when the coordinate lies outside the chunk.
    pub fn set_block(&mut self, local: LocalCoordinate, block: BlockType) -> bool {
        let Some(i) = self.size.index(local) else {
            return false;
        };
        let props = self.registry.get(block);
        self.blocks[i] = block;
        self.solid_array.set(i, props.solid);
        self.opaque_array.set(i, props.opaque);
        true
    }

    /// Whether every face neighbor exists inside the chunk and is opaque.
    pub fn is_obscured(&self, local: LocalCoordinate) -> bool {
        BlockSide::neighbor_offsets()
            .into_iter()
            .all(|offset| self.is_opaque(local + offset))
    }

    /// Whether the border rule hides this voxel.
    ///
    /// Shell voxels are hidden unless the voxel above is passable. The top
    /// layer has no voxel above inside the chunk, so it is always hidden.
    pub fn is_border_suppressed(&self, local: LocalCoordinate) -> bool {
        let above = self.get_block(local + BlockSide::TOP.offset());
        if above.is_some_and(|block| self.registry.is_passable(block)) {
            return false;
        }
        self.size.is_on_shell(local)
    }

    /// Whether the voxel should currently have render instances.
    pub fn should_render(&self, local: LocalCoordinate) -> bool {
        match self.get_block(local) {
            None | Some(BlockType::Air) => false,
            Some(_) => !self.is_obscured(local) && !self.is_border_suppressed(local),
        }
    }

    /// Builds the initial instance set for every voxel.
    ///
    /// Emits no instance events; the world announces the whole chunk with a
    /// single ready notification instead.
    pub fn build_instances(&mut self) {
        for i in 0..self.blocks.len() {
            let local = self.size.local_from_index(i);
            self.refresh_instance(local);
        }
        self.pending_events.clear();
    }

    /// Re-evaluates one voxel and adds or removes its instances to match.
    ///
    /// # Returns
    /// `true` if the instance set changed.
    pub fn refresh_instance(&mut self, local: LocalCoordinate) -> bool {
        let Some(i) = self.size.index(local) else {
            return false;
        };
        let has_instance = !self.instance_ids[i].is_empty();
        match (self.should_render(local), has_instance) {
            (true, false) => self.add_instance(local),
            (false, true) => self.remove_instance(local),
            _ => false,
        }
    }

    /// Creates the render instance(s) for a voxel that has none.
    ///
    /// # Returns
    /// `false` for air, out-of-bounds voxels, or voxels already instanced.
    pub fn add_instance(&mut self, local: LocalCoordinate) -> bool {
        let Some(i) = self.size.index(local) else {
            return false;
        };
        let kind = self.blocks[i];
        if kind == BlockType::Air || !self.instance_ids[i].is_empty() {
            return false;
        }
        let transforms = InstanceRaw::for_voxel(local, self.registry.render_shape(kind));
        let buffer = &mut self.buffers[kind.index()];
        let mut ids = InstanceIds::EMPTY;
        for transform in &transforms {
            ids.push(buffer.push(local, *transform));
        }
        self.instance_ids[i] = ids;
        self.pending_events.push(InstanceEvent::Added {
            kind,
            local,
            transforms,
        });
        true
    }

    /// Frees every render slot held by a voxel.
    ///
    /// Each slot is released with a swap-remove; the voxel whose instance
    /// moved into the freed slot is re-pointed at it.
    ///
    /// # Returns
    /// `false` if the voxel held no instances.
    pub fn remove_instance(&mut self, local: LocalCoordinate) -> bool {
        let Some(i) = self.size.index(local) else {
            return false;
        };
        if self.instance_ids[i].is_empty() {
            return false;
        }
        let kind = self.blocks[i];
        let buffer = &mut self.buffers[kind.index()];
        while let Some(slot) = self.instance_ids[i].pop_front() {
            if let Some(moved) = buffer.swap_remove(slot) {
                let last = buffer.len() as u32;
                if let Some(j) = self.size.index(moved) {
                    self.instance_ids[j].replace(last, slot);
                }
            }
        }
        self.pending_events.push(InstanceEvent::Removed { kind, local });
        true
    }

    /// Places a block into an air voxel and instances it if visible.
    ///
    /// Neighbors are not re-evaluated here; the world does that across chunk
    /// boundaries.
    ///
    /// # Returns
    /// `false` if the voxel is out of bounds, not air, or `block` is air.
    pub fn add_block(&mut self, local: LocalCoordinate, block: BlockType) -> bool {
        if block == BlockType::Air || self.get_block(local) != Some(BlockType::Air) {
            return false;
        }
        self.set_block(local, block);
        self.refresh_instance(local);
        true
    }

    /// Clears a non-air voxel, freeing its instances.
    ///
    /// # Returns
    /// The removed block kind, or `None` if the voxel was air or out of
    /// bounds.
    pub fn remove_block(&mut self, local: LocalCoordinate) -> Option<BlockType> {
        let previous = self.get_block(local)?;
        if previous == BlockType::Air {
            return None;
        }
        self.remove_instance(local);
        self.set_block(local, BlockType::Air);
        Some(previous)
    }

    /// Render slots held by a voxel. Empty for out-of-bounds voxels.
    pub fn instance_ids(&self, local: LocalCoordinate) -> &[u32] {
        match self.size.index(local) {
            Some(i) => self.instance_ids[i].as_slice(),
            None => &[],
        }
    }

    /// The instance buffer of one block kind.
    pub fn instance_buffer(&self, kind: BlockType) -> &InstanceBuffer {
        &self.buffers[kind.index()]
    }

    /// Mutable access for the render collaborator to clear update flags.
    pub fn instance_buffer_mut(&mut self, kind: BlockType) -> &mut InstanceBuffer {
        &mut self.buffers[kind.index()]
    }

    /// Number of active instances of one kind.
    pub fn instance_count(&self, kind: BlockType) -> usize {
        self.buffers[kind.index()].len()
    }

    /// Total active instances across all kinds.
    pub fn total_instances(&self) -> usize {
        self.buffers.iter().map(InstanceBuffer::len).sum()
    }

    /// Iterates over every voxel with its local coordinate.
    pub fn iter_blocks(&self) -> impl Iterator<Item = (LocalCoordinate, BlockType)> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, block)| (self.size.local_from_index(i), *block))
    }

    /// Takes the instance changes accumulated since the last call.
    pub fn drain_instance_events(&mut self) -> Vec<InstanceEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Frees every instance and forgets every slot.
    pub fn dispose(&mut self) {
        for buffer in &mut self.buffers {
            buffer.clear();
        }
        self.instance_ids.fill(InstanceIds::EMPTY);
        self.pending_events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;
    use proptest::prelude::*;

    fn face_neighbors(local: LocalCoordinate) -> [LocalCoordinate; 6] {
        BlockSide::neighbor_offsets().map(|offset| local + offset)
    }

    fn all_locals(size: ChunkSize) -> impl Iterator<Item = LocalCoordinate> {
        (0..size.height).flat_map(move |y| {
            (0..size.width).flat_map(move |z| (0..size.width).map(move |x| Point3::new(x, y, z)))
        })
    }

    fn registry() -> BlockRegistry {
        BlockRegistry::new()
    }

    fn solid_chunk(size: ChunkSize, block: BlockType) -> VoxelChunk {
        let mut grid = ChunkGrid::new(size);
        for local in all_locals(size) {
            grid.set(local, block);
        }
        VoxelChunk::from_grid(ChunkCoordinate::new(0, 0), grid, &registry())
    }

    /// Counts voxels of `kind` that pass the visibility rule.
    fn expected_instances(chunk: &VoxelChunk, kind: BlockType) -> usize {
        let per_voxel = chunk.registry.render_shape(kind).instance_count();
        chunk
            .iter_blocks()
            .filter(|(local, block)| *block == kind && chunk.should_render(*local))
            .count()
            * per_voxel
    }

    /// Every slot's owner points back at that slot.
    fn assert_consistent(chunk: &VoxelChunk) {
        for kind in BlockType::all() {
            let buffer = chunk.instance_buffer(kind);
            for slot in 0..buffer.len() as u32 {
                let owner = buffer.owner(slot).unwrap();
                assert!(chunk.instance_ids(owner).contains(&slot));
                assert_eq!(chunk.get_block(owner), Some(kind));
                let centre = buffer.transforms()[slot as usize].translation();
                assert_eq!(centre.x, owner.x as f32 + 0.5);
                assert_eq!(centre.y, owner.y as f32 + 0.5);
                assert_eq!(centre.z, owner.z as f32 + 0.5);
            }
            assert_eq!(buffer.len(), expected_instances(chunk, kind));
        }
    }

    #[test]
    fn out_of_bounds_reads_are_none() {
        let chunk = solid_chunk(ChunkSize::new(4, 4), BlockType::Stone);
        assert_eq!(chunk.get_block(Point3::new(-1, 0, 0)), None);
        assert_eq!(chunk.get_block(Point3::new(0, 4, 0)), None);
        assert!(!chunk.is_solid(Point3::new(0, 0, 4)));
        assert!(chunk.is_solid(Point3::new(3, 3, 3)));
    }

    #[test]
    fn solid_block_hides_interior_and_shell() {
        let mut chunk = solid_chunk(ChunkSize::new(5, 5), BlockType::Stone);
        chunk.build_instances();
        // Interior is obscured, shell is border-suppressed.
        assert_eq!(chunk.total_instances(), 0);
        assert!(chunk.drain_instance_events().is_empty());
    }

    #[test]
    fn occlusion_toggles_when_a_neighbor_opens() {
        let mut chunk = solid_chunk(ChunkSize::new(5, 5), BlockType::Stone);
        chunk.build_instances();
        let centre = Point3::new(2, 2, 2);
        assert!(chunk.is_obscured(centre));
        assert!(chunk.instance_ids(centre).is_empty());

        let above = Point3::new(2, 3, 2);
        assert_eq!(chunk.remove_block(above), Some(BlockType::Stone));
        assert!(chunk.refresh_instance(centre));
        assert_eq!(chunk.instance_ids(centre).len(), 1);
        assert_eq!(chunk.instance_count(BlockType::Stone), 1);

        chunk.add_block(above, BlockType::Stone);
        assert!(chunk.refresh_instance(centre));
        assert!(chunk.instance_ids(centre).is_empty());
        assert_consistent(&chunk);
    }

    #[test]
    fn crossed_flora_takes_two_slots_and_frees_both() {
        let size = ChunkSize::new(5, 5);
        let mut chunk = solid_chunk(size, BlockType::Air);
        let p = Point3::new(2, 2, 2);
        assert!(chunk.add_block(p, BlockType::TallGrass));
        assert_eq!(chunk.instance_ids(p).len(), 2);
        assert_eq!(chunk.instance_count(BlockType::TallGrass), 2);
        let q = Point3::new(1, 2, 2);
        assert!(chunk.add_block(q, BlockType::TallGrass));
        assert_eq!(chunk.instance_count(BlockType::TallGrass), 4);

        assert_eq!(chunk.remove_block(p), Some(BlockType::TallGrass));
        assert_eq!(chunk.instance_count(BlockType::TallGrass), 2);
        let mut slots = chunk.instance_ids(q).to_vec();
        slots.sort();
        assert_eq!(slots, vec![0, 1]);
        assert_consistent(&chunk);
    }

    #[test]
    fn add_only_into_air_and_remove_only_non_air() {
        let mut chunk = solid_chunk(ChunkSize::new(4, 4), BlockType::Air);
        let p = Point3::new(1, 1, 1);
        assert!(!chunk.add_block(p, BlockType::Air));
        assert!(chunk.add_block(p, BlockType::Stone));
        assert!(!chunk.add_block(p, BlockType::Dirt));
        assert_eq!(chunk.get_block(p), Some(BlockType::Stone));
        assert_eq!(chunk.remove_block(Point3::new(0, 0, 0)), None);
        assert_eq!(chunk.remove_block(Point3::new(9, 0, 0)), None);
    }

    #[test]
    fn border_voxels_show_only_under_passable_blocks() {
        let size = ChunkSize::new(4, 4);
        let mut grid = ChunkGrid::new(size);
        for x in 0..4 {
            for z in 0..4 {
                grid.set(Point3::new(x, 0, z), BlockType::Stone);
                grid.set(Point3::new(x, 1, z), BlockType::Grass);
            }
        }
        let mut chunk = VoxelChunk::from_grid(ChunkCoordinate::new(0, 0), grid, &registry());
        chunk.build_instances();
        // Grass sits under air and is visible everywhere, including the edge.
        assert_eq!(chunk.instance_count(BlockType::Grass), 16);
        // The floor layer is on the shell and covered by grass.
        assert_eq!(chunk.instance_count(BlockType::Stone), 0);
        assert!(chunk.is_border_suppressed(Point3::new(0, 0, 0)));
        assert!(!chunk.is_border_suppressed(Point3::new(0, 1, 0)));
        assert_consistent(&chunk);
    }

    #[test]
    fn instance_events_describe_each_change() {
        let mut chunk = solid_chunk(ChunkSize::new(4, 4), BlockType::Air);
        let p = Point3::new(1, 1, 1);
        chunk.add_block(p, BlockType::StoneBrick);
        chunk.remove_block(p);
        let events = chunk.drain_instance_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            InstanceEvent::Added { kind: BlockType::StoneBrick, local, transforms } if *local == p && transforms.len() == 1
        ));
        assert_eq!(
            events[1],
            InstanceEvent::Removed {
                kind: BlockType::StoneBrick,
                local: p
            }
        );
        assert!(chunk.drain_instance_events().is_empty());
    }

    #[test]
    fn dispose_frees_everything() {
        let mut chunk = solid_chunk(ChunkSize::new(4, 4), BlockType::Air);
        chunk.add_block(Point3::new(1, 1, 1), BlockType::Stone);
        chunk.add_block(Point3::new(2, 1, 1), BlockType::FlowerRose);
        chunk.dispose();
        assert_eq!(chunk.total_instances(), 0);
        assert!(chunk.instance_ids(Point3::new(1, 1, 1)).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn swap_remove_keeps_slots_consistent(
            ops in prop::collection::vec((1i32..5, 1i32..5, 1i32..5, any::<bool>(), 0usize..3), 1..80)
        ) {
            let kinds = [BlockType::Stone, BlockType::TallGrass, BlockType::Leaves];
            let size = ChunkSize::new(6, 6);
            let mut chunk = solid_chunk(size, BlockType::Air);
            for (x, y, z, add, kind) in ops {
                let p = Point3::new(x, y, z);
                if add {
                    chunk.add_block(p, kinds[kind]);
                } else {
                    chunk.remove_block(p);
                }
                for neighbor in face_neighbors(p) {
                    chunk.refresh_instance(neighbor);
                }
            }
            assert_consistent(&chunk);
        }
    }
}
