//! # Physics
//!
//! Fixed-timestep integration of the [`Agent`] against the voxel world.
//!
//! Real elapsed time is accumulated and consumed in steps of
//! `1 / SIMULATION_RATE` seconds. Each step applies gravity, then the
//! agent's movement input, then collision resolution. Time left over carries
//! into the next call, so behavior does not depend on frame timing.

use log::trace;

use agent::Agent;
use collision::{CollisionReport, CollisionSystem, WorldQuery};

pub mod agent;
pub mod collision;

/// Vertical acceleration in voxels per second squared.
pub const GRAVITY: f32 = -32.0;

/// Physics steps per second.
pub const SIMULATION_RATE: f32 = 250.0;

#[derive(Debug)]
pub struct Physics {
    step_size: f32,
    accumulator: f32,
    collisions: CollisionSystem,
}

impl Default for Physics {
    fn default() -> Self {
        Self::new()
    }
}

impl Physics {
    pub fn new() -> Self {
        Physics {
            step_size: 1.0 / SIMULATION_RATE,
            accumulator: 0.0,
            collisions: CollisionSystem::new(),
        }
    }

    pub fn step_size(&self) -> f32 {
        self.step_size
    }

    /// Time not yet consumed by a step.
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Advances the agent by `dt` seconds of real time.
    ///
    /// # Arguments
    /// * `dt` - Elapsed time since the last call, in seconds
    /// * `agent` - The agent to move; `on_ground` reflects the last step
    /// * `world` - Solidity lookup for collision
    ///
    /// # Returns
    /// The number of fixed steps taken.
    pub fn update<W: WorldQuery + ?Sized>(&mut self, dt: f32, agent: &mut Agent, world: &W) -> usize {
        self.accumulator += dt.max(0.0);
        let mut steps = 0;
        while self.accumulator >= self.step_size {
            agent.velocity.y += GRAVITY * self.step_size;
            agent.apply_inputs(self.step_size);
            self.collisions.detect_and_resolve(agent, world);
            self.accumulator -= self.step_size;
            steps += 1;
        }
        if steps > 0 {
            trace!(
                "Physics: {} step(s), position {:?}, on ground {}",
                steps,
                agent.position,
                agent.on_ground
            );
        }
        steps
    }

    /// Collision details from the most recent step.
    pub fn last_report(&self) -> &CollisionReport {
        self.collisions.last_report()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::engine_state::voxels::coordinates::GlobalCoordinate;

    struct Empty;

    impl WorldQuery for Empty {
        fn is_solid(&self, _: GlobalCoordinate) -> bool {
            false
        }
    }

    #[test]
    fn leftover_time_carries_over() {
        let mut physics = Physics::new();
        let mut agent = Agent::new(Point3::new(0.0, 100.0, 0.0));
        let step = physics.step_size();

        assert_eq!(physics.update(step * 2.5, &mut agent, &Empty), 2);
        assert!((physics.accumulator() - step * 0.5).abs() < 1e-6);
        assert_eq!(physics.update(step * 0.6, &mut agent, &Empty), 1);
    }

    #[test]
    fn free_fall_accelerates_downward() {
        let mut physics = Physics::new();
        let mut agent = Agent::new(Point3::new(0.0, 100.0, 0.0));
        physics.update(1.0, &mut agent, &Empty);
        assert!(agent.velocity.y < -30.0);
        assert!(agent.position.y < 90.0);
        assert!(!agent.on_ground);
    }
}
