//! # World Module
//!
//! This module provides the `World` struct, which owns every loaded chunk and
//! streams chunks in and out around a moving viewer.
//!
//! ## Streaming
//!
//! Each [`World::update`] runs the same phases:
//!
//! 1. compute the visible set: a square of chunks around the viewer, within
//!    the render distance, ordered nearest first
//! 2. diff it against the tracked chunks; evict what left the set and queue
//!    what entered it (new chunks go to the front, the queue never holds a
//!    coordinate twice)
//! 3. dispatch at most one queued chunk for generation
//! 4. apply finished generation results
//! 5. cancel and requeue generations that exceeded the timeout
//!
//! A chunk moves `Queued → Generating → Ready`. Evicting a chunk that is still
//! generating cancels its token, and a result only merges when its token is
//! the chunk's current one and uncancelled. A late result can therefore never
//! resurrect an evicted chunk.
//!
//! ## Edits
//!
//! Gameplay edits go through [`World::add_block`] and
//! [`World::remove_block`]. Accepted edits are recorded in the [`EditStore`]
//! and replayed over the generated grid whenever the chunk is loaded again.
//! After every edit the six face neighbors are re-evaluated so occlusion stays
//! exact, including across chunk borders.
//!
//! ## Events
//!
//! The render and audio collaborators observe the world through
//! [`World::drain_events`]: chunk readiness and eviction, incremental
//! instance changes, light placement and dig sounds.

use std::collections::{HashMap, HashSet, VecDeque};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use cgmath::Point3;
use log::{debug, info, warn};
use lru::LruCache;

use crate::config::{GenerationParams, WorldConfig};
use crate::engine_state::physics::collision::WorldQuery;
use crate::engine_state::task_management::task::{CancellationToken, StartStamp};
use crate::engine_state::task_management::TaskManager;
use crate::error::{ConfigResult, GenerationFailure};

use super::block::block_side::BlockSide;
use super::block::block_type::BlockType;
use super::block::{BlockRegistry, DigSound, LightEmission};
use super::chunk::instances::InstanceEvent;
use super::chunk::VoxelChunk;
use super::coordinates::{ChunkCoordinate, ChunkSize, GlobalCoordinate};
use super::edit_store::EditStore;
use super::generation::ChunkGrid;
use super::noise_field::NoiseField;
use super::tasks::chunk_generation_task::ChunkGenerationTask;

/// Lifecycle of a chunk coordinate as seen from outside the world.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkState {
    Unloaded,
    Queued,
    Generating,
    Ready,
}

enum ChunkEntry {
    Queued,
    Generating {
        token: CancellationToken,
        /// Unset until a worker takes the task.
        started: StartStamp,
    },
    Ready(Box<VoxelChunk>),
}

impl ChunkEntry {
    fn state(&self) -> ChunkState {
        match self {
            ChunkEntry::Queued => ChunkState::Queued,
            ChunkEntry::Generating { .. } => ChunkState::Generating,
            ChunkEntry::Ready(_) => ChunkState::Ready,
        }
    }
}

/// Outcome of diffing the visible set against the tracked chunks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamingDiff {
    /// Coordinates that entered the visible set and were queued.
    pub added: Vec<ChunkCoordinate>,
    /// Coordinates that left the visible set and were evicted.
    pub removed: Vec<ChunkCoordinate>,
}

/// A point light attached to a placed light-emitting block.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointLight {
    /// The block the light belongs to.
    pub block: GlobalCoordinate,
    /// Light origin, at the block centre.
    pub position: Point3<f32>,
    pub emission: LightEmission,
}

/// Notifications for the render and audio collaborators.
#[derive(Clone, Debug, PartialEq)]
pub enum WorldEvent {
    /// A chunk finished loading; its instance buffers are ready to upload.
    ChunkReady(ChunkCoordinate),
    /// A ready chunk was evicted; drop its GPU resources.
    ChunkUnloaded(ChunkCoordinate),
    /// An incremental instance change inside a ready chunk.
    Instance {
        chunk: ChunkCoordinate,
        event: InstanceEvent,
    },
    LightPlaced(PointLight),
    LightRemoved {
        block: GlobalCoordinate,
    },
    /// A block was dug out. Carries the sound to play.
    BlockRemoved {
        position: GlobalCoordinate,
        kind: BlockType,
        sound: DigSound,
    },
}

/// Owns all loaded chunks and streams them around a viewer.
pub struct World {
    config: WorldConfig,
    registry: BlockRegistry,
    params: Arc<GenerationParams>,
    noise: Arc<NoiseField>,
    chunks: HashMap<ChunkCoordinate, ChunkEntry>,
    queue: VecDeque<ChunkCoordinate>,
    edits: EditStore,
    task_manager: TaskManager,
    /// Recently generated grids, before edits are applied.
    grid_cache: Option<LruCache<ChunkCoordinate, Arc<ChunkGrid>>>,
    lights: HashMap<GlobalCoordinate, PointLight>,
    events: Vec<WorldEvent>,
    last_viewer: Option<Point3<f32>>,
    generation_timeout: Duration,
}

impl World {
    /// Creates an empty world.
    ///
    /// # Arguments
    /// * `config` - Validated before anything is built
    ///
    /// # Returns
    /// A world with no chunks loaded, or the first configuration error.
    pub fn new(config: WorldConfig) -> ConfigResult<Self> {
        config.validate()?;
        let registry = BlockRegistry::new();
        let noise = Arc::new(NoiseField::new(&config.generation));
        let params = Arc::new(config.generation.clone());
        let task_manager = TaskManager::new(config.worker_threads);
        let grid_cache = NonZeroUsize::new(config.grid_cache_capacity).map(LruCache::new);
        let generation_timeout = Duration::from_millis(config.generation_timeout_ms);

        info!(
            "World created: seed {}, chunk {}x{}x{}, render distance {}",
            params.seed,
            config.chunk_size.width,
            config.chunk_size.height,
            config.chunk_size.width,
            config.render_distance
        );

        Ok(World {
            config,
            registry,
            params,
            noise,
            chunks: HashMap::new(),
            queue: VecDeque::new(),
            edits: EditStore::new(),
            task_manager,
            grid_cache,
            lights: HashMap::new(),
            events: Vec::new(),
            last_viewer: None,
            generation_timeout,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn chunk_size(&self) -> ChunkSize {
        self.config.chunk_size
    }

    pub fn generation_params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn edits(&self) -> &EditStore {
        &self.edits
    }

    /// Streams chunks around the viewer. See the module docs for the phases.
    ///
    /// # Returns
    /// The chunks queued and evicted by this call.
    pub fn update(&mut self, viewer: Point3<f32>) -> StreamingDiff {
        self.last_viewer = Some(viewer);
        let visible = self.visible_chunks(viewer);
        let diff = self.apply_visible_set(&visible);
        self.dispatch_next();
        self.process_generation_results();
        self.check_timeouts();
        diff
    }

    /// Chunk coordinates within render distance of the viewer, nearest first.
    ///
    /// Ties in distance keep their enumeration order.
    pub fn visible_chunks(&self, viewer: Point3<f32>) -> Vec<ChunkCoordinate> {
        let centre = self.chunk_size().chunk_of_position(viewer);
        let r = self.config.render_distance as i32;
        let mut visible: Vec<ChunkCoordinate> = (-r..=r)
            .flat_map(|dx| (-r..=r).map(move |dz| ChunkCoordinate::new(centre.x + dx, centre.z + dz)))
            .collect();
        visible.sort_by_key(|c| c.distance_squared(&centre));
        visible
    }

    /// Makes `visible` the tracked set: evicts tracked chunks not in it and
    /// queues the ones not yet tracked, in the given order, ahead of
    /// anything already waiting.
    pub fn apply_visible_set(&mut self, visible: &[ChunkCoordinate]) -> StreamingDiff {
        let visible_set: HashSet<ChunkCoordinate> = visible.iter().copied().collect();
        let removed: Vec<ChunkCoordinate> = self
            .chunks
            .keys()
            .filter(|c| !visible_set.contains(c))
            .copied()
            .collect();
        for coordinate in &removed {
            self.evict(*coordinate);
        }

        let mut seen = HashSet::with_capacity(visible.len());
        let mut added = Vec::new();
        for coordinate in visible {
            if self.chunks.contains_key(coordinate) || !seen.insert(*coordinate) {
                continue;
            }
            added.push(*coordinate);
        }
        for coordinate in added.iter().rev() {
            self.chunks.insert(*coordinate, ChunkEntry::Queued);
            self.queue.retain(|c| c != coordinate);
            self.queue.push_front(*coordinate);
        }
        if !added.is_empty() {
            debug!("Queued {} chunk(s), {} waiting", added.len(), self.queue.len());
        }

        StreamingDiff { added, removed }
    }

    fn evict(&mut self, coordinate: ChunkCoordinate) {
        match self.chunks.remove(&coordinate) {
            Some(ChunkEntry::Ready(mut chunk)) => {
                chunk.dispose();
                self.events.push(WorldEvent::ChunkUnloaded(coordinate));
                debug!("Evicted chunk {:?}", coordinate);
            }
            Some(ChunkEntry::Generating { token, .. }) => {
                token.cancel();
                debug!("Evicted chunk {:?} while generating, cancelled", coordinate);
            }
            Some(ChunkEntry::Queued) => {
                self.queue.retain(|c| *c != coordinate);
                debug!("Dropped queued chunk {:?}", coordinate);
            }
            None => {}
        }
    }

    /// Moves the front of the queue into generation.
    ///
    /// Served from the grid cache when possible, otherwise published to the
    /// task manager.
    ///
    /// # Returns
    /// The dispatched coordinate, if the queue was not empty.
    pub fn dispatch_next(&mut self) -> Option<ChunkCoordinate> {
        let coordinate = loop {
            let next = self.queue.pop_front()?;
            if matches!(self.chunks.get(&next), Some(ChunkEntry::Queued)) {
                break next;
            }
        };

        if let Some(grid) = self.grid_cache.as_mut().and_then(|cache| cache.get(&coordinate).cloned()) {
            debug!("Chunk {:?} served from grid cache", coordinate);
            self.install_chunk(coordinate, &grid);
            return Some(coordinate);
        }

        let token = CancellationToken::new();
        let started = StartStamp::new();
        self.chunks.insert(
            coordinate,
            ChunkEntry::Generating {
                token: token.clone(),
                started: started.clone(),
            },
        );
        let task = ChunkGenerationTask::new(
            coordinate,
            self.chunk_size(),
            self.params.clone(),
            self.noise.clone(),
            token,
            started,
        );
        debug!("Dispatched chunk {:?}", coordinate);
        self.task_manager.publish_task(Box::new(task));
        Some(coordinate)
    }

    /// Applies every generation result that has arrived.
    pub fn process_generation_results(&mut self) {
        for result in self.task_manager.process_completed_tasks() {
            result.handle_result(self);
        }
        self.task_manager.process_queued_tasks();
    }

    /// Cancels and requeues generations running longer than the configured
    /// timeout. Tasks still waiting for a worker are never timed out.
    pub fn check_timeouts(&mut self) {
        let timeout = self.generation_timeout;
        let expired: Vec<ChunkCoordinate> = self
            .chunks
            .iter()
            .filter_map(|(coordinate, entry)| match entry {
                ChunkEntry::Generating { started, .. }
                    if started.started_at().is_some_and(|at| at.elapsed() > timeout) =>
                {
                    Some(*coordinate)
                }
                _ => None,
            })
            .collect();
        for coordinate in expired {
            if let Some(ChunkEntry::Generating { token, .. }) = self.chunks.get(&coordinate) {
                token.cancel();
            }
            self.fail_generation(coordinate, GenerationFailure::TimedOut);
        }
    }

    fn fail_generation(&mut self, coordinate: ChunkCoordinate, failure: GenerationFailure) {
        warn!("Chunk {:?}: {}, requeueing", coordinate, failure);
        self.chunks.insert(coordinate, ChunkEntry::Queued);
        self.queue.retain(|c| *c != coordinate);
        self.queue.push_back(coordinate);
    }

    /// The token of a chunk that is currently generating.
    pub fn generation_token(&self, coordinate: ChunkCoordinate) -> Option<CancellationToken> {
        match self.chunks.get(&coordinate) {
            Some(ChunkEntry::Generating { token, .. }) => Some(token.clone()),
            _ => None,
        }
    }

    /// Merges a generation outcome for `coordinate`.
    ///
    /// The outcome is discarded unless the chunk is still generating under
    /// `token` and the token is not cancelled. A failure puts the chunk back
    /// at the end of the queue for retry.
    ///
    /// # Returns
    /// `true` if the chunk became ready.
    pub fn complete_generation(
        &mut self,
        coordinate: ChunkCoordinate,
        token: &CancellationToken,
        outcome: Result<Arc<ChunkGrid>, GenerationFailure>,
    ) -> bool {
        let current = matches!(
            self.chunks.get(&coordinate),
            Some(ChunkEntry::Generating { token: t, .. }) if t.same_as(token)
        );
        if !current || token.is_cancelled() {
            debug!("Discarding stale generation result for {:?}", coordinate);
            return false;
        }

        match outcome {
            Ok(grid) => {
                if let Some(cache) = self.grid_cache.as_mut() {
                    cache.put(coordinate, grid.clone());
                }
                self.install_chunk(coordinate, &grid);
                true
            }
            Err(failure) => {
                self.fail_generation(coordinate, failure);
                false
            }
        }
    }

    /// Builds a ready chunk from a generated grid plus recorded edits.
    fn install_chunk(&mut self, coordinate: ChunkCoordinate, grid: &ChunkGrid) {
        let mut chunk = VoxelChunk::from_grid(coordinate, grid.clone(), &self.registry);
        let edits = self.edits.edits_for_chunk(coordinate);
        for (local, block) in &edits {
            chunk.set_block(*local, *block);
        }
        chunk.build_instances();
        debug!(
            "Chunk {:?} ready: {} edit(s), {} instance(s)",
            coordinate,
            edits.len(),
            chunk.total_instances()
        );
        self.chunks.insert(coordinate, ChunkEntry::Ready(Box::new(chunk)));
        self.events.push(WorldEvent::ChunkReady(coordinate));
    }

    /// Lifecycle state of a chunk coordinate.
    pub fn chunk_state(&self, coordinate: ChunkCoordinate) -> ChunkState {
        self.chunks
            .get(&coordinate)
            .map_or(ChunkState::Unloaded, ChunkEntry::state)
    }

    /// A ready chunk.
    pub fn chunk(&self, coordinate: ChunkCoordinate) -> Option<&VoxelChunk> {
        match self.chunks.get(&coordinate) {
            Some(ChunkEntry::Ready(chunk)) => Some(chunk.as_ref()),
            _ => None,
        }
    }

    pub fn chunk_mut(&mut self, coordinate: ChunkCoordinate) -> Option<&mut VoxelChunk> {
        match self.chunks.get_mut(&coordinate) {
            Some(ChunkEntry::Ready(chunk)) => Some(chunk.as_mut()),
            _ => None,
        }
    }

    /// Coordinates of every ready chunk.
    pub fn ready_chunks(&self) -> Vec<ChunkCoordinate> {
        self.chunks
            .iter()
            .filter(|(_, entry)| matches!(entry, ChunkEntry::Ready(_)))
            .map(|(c, _)| *c)
            .collect()
    }

    /// Coordinates waiting to be dispatched, front first.
    pub fn queued(&self) -> Vec<ChunkCoordinate> {
        self.queue.iter().copied().collect()
    }

    /// Chunks queued or generating.
    pub fn pending_chunks(&self) -> usize {
        self.chunks
            .values()
            .filter(|entry| !matches!(entry, ChunkEntry::Ready(_)))
            .count()
    }

    /// Gets the block at a world-space voxel.
    ///
    /// # Returns
    /// `None` if the chunk is not ready or `y` is outside the chunk height.
    pub fn get_block(&self, global: GlobalCoordinate) -> Option<BlockType> {
        let (coordinate, local) = self.chunk_size().split(global);
        self.chunk(coordinate)?.get_block(local)
    }

    /// Places a block into an air voxel of a ready chunk.
    ///
    /// # Returns
    /// `false` (and no change) if the chunk is not ready, the voxel is out of
    /// bounds or not air, or `block` is air.
    pub fn add_block(&mut self, global: GlobalCoordinate, block: BlockType) -> bool {
        let (coordinate, local) = self.chunk_size().split(global);
        let Some(chunk) = self.chunk_mut(coordinate) else {
            return false;
        };
        if !chunk.add_block(local, block) {
            return false;
        }
        self.edits.record(coordinate, local, block);
        self.flush_instance_events(coordinate);

        if let Some(emission) = self.registry.get(block).light {
            let light = PointLight {
                block: global,
                position: Point3::new(
                    global.x as f32 + 0.5,
                    global.y as f32 + 0.5,
                    global.z as f32 + 0.5,
                ),
                emission,
            };
            self.lights.insert(global, light);
            self.events.push(WorldEvent::LightPlaced(light));
        }

        self.refresh_neighbors(global);
        debug!("Placed {} at {:?}", block, global);
        true
    }

    /// Digs out a non-air voxel of a ready chunk.
    ///
    /// # Returns
    /// `false` (and no change) if the chunk is not ready, the voxel is out of
    /// bounds, or it is already air.
    pub fn remove_block(&mut self, global: GlobalCoordinate) -> bool {
        let (coordinate, local) = self.chunk_size().split(global);
        let Some(chunk) = self.chunk_mut(coordinate) else {
            return false;
        };
        let Some(kind) = chunk.remove_block(local) else {
            return false;
        };
        self.edits.record(coordinate, local, BlockType::Air);
        self.flush_instance_events(coordinate);

        self.events.push(WorldEvent::BlockRemoved {
            position: global,
            kind,
            sound: self.registry.get(kind).dig_sound,
        });
        if self.lights.remove(&global).is_some() {
            self.events.push(WorldEvent::LightRemoved { block: global });
        }

        self.refresh_neighbors(global);
        debug!("Removed {} at {:?}", kind, global);
        true
    }

    /// Re-evaluates the instances of the six face neighbors of a voxel.
    fn refresh_neighbors(&mut self, global: GlobalCoordinate) {
        let size = self.chunk_size();
        for offset in BlockSide::neighbor_offsets() {
            let (coordinate, local) = size.split(global + offset);
            let changed = self
                .chunk_mut(coordinate)
                .is_some_and(|chunk| chunk.refresh_instance(local));
            if changed {
                self.flush_instance_events(coordinate);
            }
        }
    }

    fn flush_instance_events(&mut self, coordinate: ChunkCoordinate) {
        let Some(chunk) = self.chunk_mut(coordinate) else {
            return;
        };
        let events = chunk.drain_instance_events();
        self.events.extend(
            events
                .into_iter()
                .map(|event| WorldEvent::Instance {
                    chunk: coordinate,
                    event,
                }),
        );
    }

    /// Active point lights.
    pub fn lights(&self) -> Vec<PointLight> {
        self.lights.values().copied().collect()
    }

    /// Takes every event raised since the last call.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Full world reset.
    ///
    /// Drops every chunk, edit, cached grid and light, then streams again
    /// from the last viewer position, if any.
    pub fn regenerate(&mut self) {
        info!("Regenerating world with seed {}", self.params.seed);
        let tracked: Vec<ChunkCoordinate> = self.chunks.keys().copied().collect();
        for coordinate in tracked {
            self.evict(coordinate);
        }
        self.queue.clear();
        self.edits.clear();
        if let Some(cache) = self.grid_cache.as_mut() {
            cache.clear();
        }
        for (block, _) in self.lights.drain() {
            self.events.push(WorldEvent::LightRemoved { block });
        }
        if let Some(viewer) = self.last_viewer {
            self.update(viewer);
        }
    }

    /// Replaces the generation parameters and regenerates the world.
    ///
    /// # Returns
    /// The validation error, in which case nothing changes.
    pub fn set_generation_params(&mut self, params: GenerationParams) -> ConfigResult<()> {
        params.validate(&self.registry)?;
        self.noise = Arc::new(NoiseField::new(&params));
        self.params = Arc::new(params.clone());
        self.config.generation = params;
        self.regenerate();
        Ok(())
    }
}

impl WorldQuery for World {
    fn is_solid(&self, global: GlobalCoordinate) -> bool {
        self.get_block(global)
            .is_some_and(|block| self.registry.is_solid(block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline_world(render_distance: u32) -> World {
        let config = WorldConfig {
            chunk_size: ChunkSize::new(8, 32),
            render_distance,
            worker_threads: 0,
            ..WorldConfig::default()
        };
        World::new(config).expect("valid config")
    }

    fn load(world: &mut World, coordinates: &[ChunkCoordinate]) {
        world.apply_visible_set(coordinates);
        while world.dispatch_next().is_some() {
            world.process_generation_results();
        }
    }

    #[test]
    fn visible_set_is_nearest_first() {
        let world = inline_world(1);
        let visible = world.visible_chunks(Point3::new(12.0, 3.0, -1.0));
        assert_eq!(visible.len(), 9);
        assert_eq!(visible[0], ChunkCoordinate::new(1, -1));
        let centre = ChunkCoordinate::new(1, -1);
        assert!(visible
            .windows(2)
            .all(|w| w[0].distance_squared(&centre) <= w[1].distance_squared(&centre)));
    }

    #[test]
    fn diff_evicts_departed_and_queues_new() {
        let mut world = inline_world(0);
        let a = ChunkCoordinate::new(0, 0);
        let b = ChunkCoordinate::new(1, 0);
        let c = ChunkCoordinate::new(1, 1);
        load(&mut world, &[a, b]);
        assert_eq!(world.chunk_state(a), ChunkState::Ready);
        assert_eq!(world.chunk_state(b), ChunkState::Ready);
        world.drain_events();

        let diff = world.apply_visible_set(&[b, c]);
        assert_eq!(diff.removed, vec![a]);
        assert_eq!(diff.added, vec![c]);
        assert_eq!(world.chunk_state(a), ChunkState::Unloaded);
        assert_eq!(world.queued(), vec![c]);
        assert_eq!(world.drain_events(), vec![WorldEvent::ChunkUnloaded(a)]);
    }

    #[test]
    fn queue_never_holds_a_coordinate_twice() {
        let mut world = inline_world(0);
        let a = ChunkCoordinate::new(0, 0);
        let b = ChunkCoordinate::new(0, 1);
        world.apply_visible_set(&[a, b]);
        world.apply_visible_set(&[a, b]);
        assert_eq!(world.queued(), vec![a, b]);
    }

    #[test]
    fn repeated_coordinates_in_the_visible_set_are_queued_once() {
        let mut world = inline_world(0);
        let a = ChunkCoordinate::new(0, 0);
        let b = ChunkCoordinate::new(0, 1);
        let diff = world.apply_visible_set(&[a, b, a]);
        assert_eq!(diff.added, vec![a, b]);
        assert_eq!(world.queued(), vec![a, b]);
    }

    #[test]
    fn full_radius_step_swaps_one_column() {
        let mut world = inline_world(8);
        let diff = world.update(Point3::new(4.0, 8.0, 4.0));
        assert_eq!(diff.added.len(), 17 * 17);

        let diff = world.update(Point3::new(12.0, 8.0, 4.0));
        assert_eq!(diff.removed.len(), 17);
        assert!(diff.removed.iter().all(|c| c.x == -8));
        assert_eq!(diff.added.len(), 17);
        assert!(diff.added.iter().all(|c| c.x == 9));
    }

    #[test]
    fn generation_waiting_for_a_worker_does_not_time_out() {
        let config = WorldConfig {
            chunk_size: ChunkSize::new(8, 32),
            render_distance: 0,
            worker_threads: 1,
            generation_timeout_ms: 1,
            ..WorldConfig::default()
        };
        let mut world = World::new(config).expect("valid config");
        let a = ChunkCoordinate::new(0, 0);
        let b = ChunkCoordinate::new(0, 1);
        world.apply_visible_set(&[a, b]);
        // The single worker takes `a`; `b` waits in the task queue until
        // results are next processed.
        world.dispatch_next();
        world.dispatch_next();

        std::thread::sleep(Duration::from_millis(20));
        world.check_timeouts();

        assert_eq!(world.chunk_state(a), ChunkState::Queued);
        assert_eq!(world.chunk_state(b), ChunkState::Generating);
        let token = world.generation_token(b).expect("generating");
        assert!(!token.is_cancelled());
    }

    #[test]
    fn one_dispatch_per_update() {
        let mut world = inline_world(1);
        let diff = world.update(Point3::new(4.0, 8.0, 4.0));
        assert_eq!(diff.added.len(), 9);
        assert_eq!(world.ready_chunks(), vec![ChunkCoordinate::new(0, 0)]);
        assert_eq!(world.queued().len(), 8);
    }

    #[test]
    fn late_result_of_evicted_chunk_is_discarded() {
        let mut world = inline_world(0);
        let a = ChunkCoordinate::new(0, 0);
        world.apply_visible_set(&[a]);
        world.dispatch_next();
        assert_eq!(world.chunk_state(a), ChunkState::Generating);
        let token = world.generation_token(a).expect("generating");

        world.apply_visible_set(&[]);
        assert!(token.is_cancelled());
        world.process_generation_results();
        assert_eq!(world.chunk_state(a), ChunkState::Unloaded);
        assert!(world.chunk(a).is_none());
    }

    #[test]
    fn result_with_foreign_token_is_discarded() {
        let mut world = inline_world(0);
        let a = ChunkCoordinate::new(0, 0);
        world.apply_visible_set(&[a]);
        world.dispatch_next();

        let grid = Arc::new(ChunkGrid::new(world.chunk_size()));
        assert!(!world.complete_generation(a, &CancellationToken::new(), Ok(grid)));
        assert_eq!(world.chunk_state(a), ChunkState::Generating);
    }

    #[test]
    fn failed_generation_is_requeued_at_the_back() {
        let mut world = inline_world(0);
        let a = ChunkCoordinate::new(0, 0);
        let b = ChunkCoordinate::new(0, 1);
        world.apply_visible_set(&[a, b]);
        world.dispatch_next();
        let token = world.generation_token(a).expect("generating");

        let failure = GenerationFailure::Panicked("boom".to_string());
        assert!(!world.complete_generation(a, &token, Err(failure)));
        assert_eq!(world.chunk_state(a), ChunkState::Queued);
        assert_eq!(world.queued(), vec![b, a]);

        // The first inline result is now stale.
        world.process_generation_results();
        assert_eq!(world.chunk_state(a), ChunkState::Queued);
    }

    #[test]
    fn edits_outside_ready_chunks_are_rejected() {
        let mut world = inline_world(0);
        assert!(!world.add_block(Point3::new(0, 31, 0), BlockType::Stone));
        assert!(!world.remove_block(Point3::new(0, 0, 0)));
        assert_eq!(world.get_block(Point3::new(0, 0, 0)), None);
        assert!(world.edits().is_empty());
    }

    #[test]
    fn lamp_placement_tracks_a_light() {
        let mut world = inline_world(0);
        let a = ChunkCoordinate::new(0, 0);
        load(&mut world, &[a]);
        world.drain_events();

        let top = Point3::new(3, 31, 3);
        assert_eq!(world.get_block(top), Some(BlockType::Air));
        assert!(world.add_block(top, BlockType::RedstoneLamp));
        assert_eq!(world.lights().len(), 1);
        assert!(world
            .drain_events()
            .iter()
            .any(|e| matches!(e, WorldEvent::LightPlaced(light) if light.block == top)));

        assert!(world.remove_block(top));
        assert!(world.lights().is_empty());
        let events = world.drain_events();
        assert!(events.contains(&WorldEvent::LightRemoved { block: top }));
        assert!(events.contains(&WorldEvent::BlockRemoved {
            position: top,
            kind: BlockType::RedstoneLamp,
            sound: DigSound::Stone,
        }));
    }

    #[test]
    fn adding_air_or_into_occupied_space_is_a_no_op() {
        let mut world = inline_world(0);
        let a = ChunkCoordinate::new(0, 0);
        load(&mut world, &[a]);
        let bottom = Point3::new(0, 0, 0);
        assert_eq!(world.get_block(bottom), Some(BlockType::Bedrock));
        assert!(!world.add_block(bottom, BlockType::Stone));
        assert!(!world.add_block(Point3::new(0, 31, 0), BlockType::Air));
        assert!(world.edits().is_empty());
    }
}
