//! The simulated player body.
//!
//! An [`Agent`] is a vertical cylinder. `position` is the top of the
//! cylinder (the eye point); the cylinder spans `position.y - height` up to
//! `position.y`.

use cgmath::{Point3, Rad, Vector3, Zero};

/// Horizontal radius of the default agent.
pub const AGENT_RADIUS: f32 = 0.5;
/// Height of the default agent.
pub const AGENT_HEIGHT: f32 = 1.75;

#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    /// Top of the bounding cylinder.
    pub position: Point3<f32>,
    /// World-space velocity.
    pub velocity: Vector3<f32>,
    pub radius: f32,
    pub height: f32,
    /// Whether the last physics step stood the agent on a block.
    pub on_ground: bool,
    /// Heading about the vertical axis.
    pub yaw: Rad<f32>,
    /// Desired movement in agent space: `x` is strafe right, `z` is forward.
    pub input: Vector3<f32>,
    pub max_speed: f32,
    pub jump_speed: f32,
}

impl Agent {
    /// Creates an agent at rest with the default body and speeds.
    pub fn new(position: Point3<f32>) -> Self {
        Agent {
            position,
            velocity: Vector3::zero(),
            radius: AGENT_RADIUS,
            height: AGENT_HEIGHT,
            on_ground: false,
            yaw: Rad(0.0),
            input: Vector3::zero(),
            max_speed: 5.0,
            jump_speed: 10.0,
        }
    }

    /// Vertical centre of the bounding cylinder.
    #[inline]
    pub fn centre_y(&self) -> f32 {
        self.position.y - self.height / 2.0
    }

    /// Sets the movement intent. Each axis is clamped to `[-1, 1]` and scaled
    /// by `max_speed`.
    ///
    /// # Arguments
    /// * `forward` - Positive moves along the heading
    /// * `right` - Positive strafes to the right
    pub fn set_movement(&mut self, forward: f32, right: f32) {
        self.input = Vector3::new(
            right.clamp(-1.0, 1.0) * self.max_speed,
            0.0,
            forward.clamp(-1.0, 1.0) * self.max_speed,
        );
    }

    /// Starts a jump. Only works while grounded.
    ///
    /// # Returns
    /// `true` if the jump started.
    pub fn jump(&mut self) -> bool {
        if !self.on_ground {
            return false;
        }
        self.velocity.y = self.jump_speed;
        self.on_ground = false;
        true
    }

    /// Teleports the agent and brings it to rest.
    pub fn reset(&mut self, position: Point3<f32>) {
        self.position = position;
        self.velocity = Vector3::zero();
        self.on_ground = false;
    }

    /// Forward and right unit vectors on the XZ plane for the current yaw.
    pub fn heading(&self) -> (Vector3<f32>, Vector3<f32>) {
        let (sin, cos) = self.yaw.0.sin_cos();
        (Vector3::new(cos, 0.0, sin), Vector3::new(-sin, 0.0, cos))
    }

    /// Replaces horizontal velocity with the rotated input, then integrates
    /// position over `dt`.
    pub fn apply_inputs(&mut self, dt: f32) {
        let (forward, right) = self.heading();
        let horizontal = forward * self.input.z + right * self.input.x;
        self.velocity.x = horizontal.x;
        self.velocity.z = horizontal.z;
        self.position += self.velocity * dt;
    }
}
