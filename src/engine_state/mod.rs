//! # Engine State Module
//!
//! The composition root of the simulation core.
//!
//! ## Key Components
//!
//! * `EngineState` - Owns the world, the physics integrator and the agent
//! * `physics` - Fixed-step agent integration and voxel collision
//! * `task_management` - Worker threads for chunk generation
//! * `voxels` - Block catalog, chunk storage, generation and streaming
//!
//! ## Architecture
//!
//! Every subsystem is a plain value owned here and threaded explicitly
//! through method calls. Nothing is a process-wide singleton. The render and
//! audio collaborators sit outside the core and observe it through
//! [`World::drain_events`] and the per-chunk instance buffers.

use cgmath::Point3;
use log::info;

use crate::config::WorldConfig;
use crate::error::ConfigResult;

use physics::agent::Agent;
use physics::Physics;
use voxels::world::{StreamingDiff, World};

pub mod physics;
pub mod task_management;
pub mod voxels;

/// The main state container of the simulation.
///
/// # Examples
///
/// ```ignore
/// let mut engine = EngineState::new(WorldConfig::default(), Point3::new(32.0, 64.0, 32.0))?;
///
/// loop {
///     engine.tick(frame_time);
///     for event in engine.world.drain_events() {
///         // hand to the renderer and audio
///     }
/// }
/// ```
pub struct EngineState {
    /// The streamed voxel world
    pub world: World,
    /// Fixed-step integrator for the agent
    pub physics: Physics,
    /// The player body
    pub agent: Agent,
    /// Where `reset_agent` puts the agent
    spawn: Point3<f32>,
}

impl EngineState {
    /// Creates the engine with an empty world and the agent at `spawn`.
    ///
    /// # Arguments
    /// * `config` - World configuration; validated by [`World::new`]
    /// * `spawn` - Initial agent position (top of its cylinder)
    ///
    /// # Returns
    /// The engine, or the first configuration error.
    pub fn new(config: WorldConfig, spawn: Point3<f32>) -> ConfigResult<Self> {
        let world = World::new(config)?;
        info!("Engine started, agent spawned at {:?}", spawn);
        Ok(EngineState {
            world,
            physics: Physics::new(),
            agent: Agent::new(spawn),
            spawn,
        })
    }

    /// Advances one frame: physics first, then streaming around the agent.
    ///
    /// # Arguments
    /// * `dt` - Elapsed real time in seconds
    ///
    /// # Returns
    /// The streaming diff computed for this frame.
    pub fn tick(&mut self, dt: f32) -> StreamingDiff {
        self.physics.update(dt, &mut self.agent, &self.world);
        self.world.update(self.agent.position)
    }

    /// Teleports the agent back to its spawn point.
    pub fn reset_agent(&mut self) {
        self.agent.reset(self.spawn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::coordinates::ChunkSize;

    #[test]
    fn tick_streams_around_the_agent() {
        let config = WorldConfig {
            chunk_size: ChunkSize::new(8, 32),
            render_distance: 0,
            worker_threads: 0,
            ..WorldConfig::default()
        };
        let mut engine = EngineState::new(config, Point3::new(20.0, 60.0, 4.0)).expect("valid config");
        let diff = engine.tick(0.0);
        assert_eq!(diff.added.len(), 1);
        assert_eq!(engine.world.ready_chunks().len(), 1);
    }

    #[test]
    fn reset_returns_to_spawn() {
        let mut engine = EngineState::new(WorldConfig::default(), Point3::new(1.0, 2.0, 3.0)).expect("valid config");
        engine.agent.position = Point3::new(9.0, 9.0, 9.0);
        engine.reset_agent();
        assert_eq!(engine.agent.position, Point3::new(1.0, 2.0, 3.0));
    }
}
