//! # Edit Store
//!
//! In-memory overlay of player edits, keyed per chunk.
//!
//! Every accepted gameplay edit is recorded here as a block kind override for
//! `(chunk, local)`. When a chunk is (re)loaded the world replays its edits on
//! top of the generated grid, so edits win over generated content and survive
//! eviction. Entries live for the lifetime of the store; there is no disk
//! persistence.

use std::collections::HashMap;

use cgmath::Point3;

use super::block::block_type::BlockType;
use super::coordinates::{ChunkCoordinate, LocalCoordinate};

#[derive(Debug, Default, Clone)]
pub struct EditStore {
    inner: HashMap<ChunkCoordinate, HashMap<LocalCoordinate, BlockType>>,
}

impl EditStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn key(chunk_x: i32, chunk_z: i32, x: i32, y: i32, z: i32) -> (ChunkCoordinate, LocalCoordinate) {
        (ChunkCoordinate::new(chunk_x, chunk_z), Point3::new(x, y, z))
    }

    /// Whether an override exists for the voxel.
    pub fn contains(&self, chunk_x: i32, chunk_z: i32, x: i32, y: i32, z: i32) -> bool {
        self.get(chunk_x, chunk_z, x, y, z).is_some()
    }

    /// The override recorded for the voxel, if any.
    pub fn get(&self, chunk_x: i32, chunk_z: i32, x: i32, y: i32, z: i32) -> Option<BlockType> {
        let (chunk, local) = Self::key(chunk_x, chunk_z, x, y, z);
        self.inner.get(&chunk).and_then(|m| m.get(&local).copied())
    }

    /// Records an override, replacing any earlier one for the voxel.
    pub fn set(&mut self, chunk_x: i32, chunk_z: i32, x: i32, y: i32, z: i32, block: BlockType) {
        let (chunk, local) = Self::key(chunk_x, chunk_z, x, y, z);
        self.record(chunk, local, block);
    }

    /// Typed form of [`EditStore::set`].
    pub fn record(&mut self, chunk: ChunkCoordinate, local: LocalCoordinate, block: BlockType) {
        self.inner.entry(chunk).or_default().insert(local, block);
    }

    /// Snapshot of all edits for a specific chunk.
    pub fn edits_for_chunk(&self, chunk: ChunkCoordinate) -> Vec<(LocalCoordinate, BlockType)> {
        self.inner
            .get(&chunk)
            .map(|m| m.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default()
    }

    /// Total number of recorded overrides.
    pub fn len(&self) -> usize {
        self.inner.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every edit.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}
