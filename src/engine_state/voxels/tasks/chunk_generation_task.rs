//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask` which handles asynchronous
//! generation of chunk data. The world schedules one whenever a queued chunk
//! is dispatched.
//!
//! The task owns shared, immutable snapshots of everything generation needs
//! (parameters, noise field, chunk size), so it can run on any worker without
//! touching world state. Its result is applied back on the owning thread,
//! where the world checks the cancellation token before merging anything.

use std::sync::Arc;

use crate::config::GenerationParams;
use crate::engine_state::task_management::task::{CancellationToken, StartStamp, Task, TaskResult};
use crate::engine_state::voxels::coordinates::{ChunkCoordinate, ChunkSize};
use crate::engine_state::voxels::generation::{generate_chunk, ChunkGrid};
use crate::engine_state::voxels::noise_field::NoiseField;
use crate::engine_state::voxels::world::World;
use crate::error::GenerationFailure;

/// A task that generates one chunk's grid.
pub struct ChunkGenerationTask {
    /// The chunk to generate.
    coordinate: ChunkCoordinate,
    size: ChunkSize,
    params: Arc<GenerationParams>,
    noise: Arc<NoiseField>,
    /// Cancelled when the chunk leaves the visible set or times out.
    token: CancellationToken,
    /// Marked when a worker takes the task; the timeout runs from here.
    started: StartStamp,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `coordinate` - The chunk to generate
    /// * `size` - Chunk dimensions
    /// * `params` - Generation parameters snapshot
    /// * `noise` - Noise field built from `params`
    /// * `token` - Token the world will check when the result arrives
    /// * `started` - Stamp shared with the world's timeout check
    pub fn new(
        coordinate: ChunkCoordinate,
        size: ChunkSize,
        params: Arc<GenerationParams>,
        noise: Arc<NoiseField>,
        token: CancellationToken,
        started: StartStamp,
    ) -> Self {
        ChunkGenerationTask {
            coordinate,
            size,
            params,
            noise,
            token,
            started,
        }
    }
}

impl Task for ChunkGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let grid = generate_chunk(self.size, &self.params, &self.noise, self.coordinate);
        Box::new(ChunkGenerationTaskResult {
            coordinate: self.coordinate,
            token: self.token.clone(),
            outcome: Ok(Arc::new(grid)),
        })
    }

    fn on_failure(&self, failure: GenerationFailure) -> Box<dyn TaskResult + Send> {
        Box::new(ChunkGenerationTaskResult {
            coordinate: self.coordinate,
            token: self.token.clone(),
            outcome: Err(failure),
        })
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn on_started(&self) {
        self.started.mark();
    }
}

/// The result of a chunk generation task.
pub struct ChunkGenerationTaskResult {
    coordinate: ChunkCoordinate,
    token: CancellationToken,
    outcome: Result<Arc<ChunkGrid>, GenerationFailure>,
}

impl TaskResult for ChunkGenerationTaskResult {
    /// Hands the generated grid (or the failure) to the world, which decides
    /// whether it is still wanted.
    fn handle_result(self: Box<Self>, world: &mut World) {
        world.complete_generation(self.coordinate, &self.token, self.outcome);
    }
}
