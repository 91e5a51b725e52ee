//! # Collision System
//!
//! Cylinder-versus-voxel collision for a single [`Agent`].
//!
//! Every step runs three phases:
//!
//! 1. **Broad phase**: every solid voxel whose cell touches the agent's
//!    bounding box becomes a candidate.
//! 2. **Narrow phase**: for each candidate, the point of the unit cube
//!    closest to the cylinder centre is tested against the cylinder. A hit
//!    yields a contact whose axis is the one with the smaller overlap.
//! 3. **Resolve**: contacts are applied smallest overlap first. Each is
//!    re-checked against the moved cylinder, corrects the position, and
//!    strips the velocity component along its normal.
//!
//! Voxels outside loaded chunks are not solid.

use std::cmp::Ordering;

use cgmath::{InnerSpace, Point3, Vector3};
use log::trace;

use crate::engine_state::voxels::coordinates::GlobalCoordinate;

use super::agent::Agent;

/// Upward velocity given to an agent pushed down out of a ceiling.
pub const UNSTICK_IMPULSE: f32 = 10.0;

/// Solidity lookup used by the broad phase.
pub trait WorldQuery {
    /// Whether the voxel blocks movement. Missing data is not solid.
    fn is_solid(&self, global: GlobalCoordinate) -> bool;
}

/// A narrow-phase hit between the agent and one voxel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Contact {
    pub block: GlobalCoordinate,
    /// Closest point of the voxel to the cylinder centre.
    pub point: Point3<f32>,
    /// Direction the agent is pushed, unit length.
    pub normal: Vector3<f32>,
    /// Penetration depth along `normal`.
    pub overlap: f32,
    /// Whether the vertical axis had the smaller overlap.
    pub vertical: bool,
}

/// What the last step saw, for debug overlays.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionReport {
    pub candidates: Vec<GlobalCoordinate>,
    pub contacts: Vec<Contact>,
    /// Contacts that were still penetrating when their turn came.
    pub corrections: usize,
}

#[derive(Debug, Default)]
pub struct CollisionSystem {
    report: CollisionReport,
}

impl CollisionSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_report(&self) -> &CollisionReport {
        &self.report
    }

    /// Runs broad phase, narrow phase and resolution for one step.
    ///
    /// Sets `agent.on_ground` for this step.
    pub fn detect_and_resolve<W: WorldQuery + ?Sized>(&mut self, agent: &mut Agent, world: &W) {
        agent.on_ground = false;
        let candidates = Self::broad_phase(agent, world);
        let contacts = Self::narrow_phase(agent, &candidates);
        let corrections = if contacts.is_empty() {
            0
        } else {
            Self::resolve(agent, &contacts)
        };
        self.report = CollisionReport {
            candidates,
            contacts,
            corrections,
        };
    }

    /// Solid voxels whose cells intersect the agent's bounding box.
    pub fn broad_phase<W: WorldQuery + ?Sized>(agent: &Agent, world: &W) -> Vec<GlobalCoordinate> {
        let p = agent.position;
        let min_x = (p.x - agent.radius).floor() as i32;
        let max_x = (p.x + agent.radius).ceil() as i32;
        let min_y = (p.y - agent.height).floor() as i32;
        let max_y = p.y.ceil() as i32;
        let min_z = (p.z - agent.radius).floor() as i32;
        let max_z = (p.z + agent.radius).ceil() as i32;

        let mut candidates = Vec::new();
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                for z in min_z..=max_z {
                    let block = Point3::new(x, y, z);
                    if world.is_solid(block) {
                        candidates.push(block);
                    }
                }
            }
        }
        candidates
    }

    /// Contacts for every candidate whose closest point is inside the
    /// cylinder.
    ///
    /// A contact with no direction to push in is dropped: a horizontal one
    /// whose point lies on the cylinder axis, or a vertical one whose point is
    /// level with the cylinder centre.
    pub fn narrow_phase(agent: &Agent, candidates: &[GlobalCoordinate]) -> Vec<Contact> {
        let centre = Point3::new(agent.position.x, agent.centre_y(), agent.position.z);
        let mut contacts = Vec::new();

        for &block in candidates {
            let (bx, by, bz) = (block.x as f32, block.y as f32, block.z as f32);
            let point = Point3::new(
                centre.x.clamp(bx, bx + 1.0),
                centre.y.clamp(by, by + 1.0),
                centre.z.clamp(bz, bz + 1.0),
            );
            if !point_in_cylinder(agent, point) {
                continue;
            }

            let dx = point.x - centre.x;
            let dy = point.y - centre.y;
            let dz = point.z - centre.z;
            let overlap_y = agent.height / 2.0 - dy.abs();
            let overlap_xz = agent.radius - (dx * dx + dz * dz).sqrt();

            let contact = if overlap_y < overlap_xz {
                if dy.abs() <= f32::EPSILON {
                    trace!("Skipping degenerate contact with {:?}", block);
                    continue;
                }
                Contact {
                    block,
                    point,
                    normal: Vector3::new(0.0, -dy.signum(), 0.0),
                    overlap: overlap_y,
                    vertical: true,
                }
            } else {
                let away = Vector3::new(-dx, 0.0, -dz);
                if away.magnitude2() <= f32::EPSILON {
                    trace!("Skipping degenerate contact with {:?}", block);
                    continue;
                }
                Contact {
                    block,
                    point,
                    normal: away.normalize(),
                    overlap: overlap_xz,
                    vertical: false,
                }
            };
            trace!(
                "Contact with {:?}: normal {:?}, overlap {:.4}",
                block,
                contact.normal,
                contact.overlap
            );
            contacts.push(contact);
        }
        contacts
    }

    /// Applies contacts in order of increasing overlap.
    ///
    /// Vertical corrections only apply when at least one contact was
    /// vertical, so a stale vertical hit cannot lift an airborne agent.
    ///
    /// # Returns
    /// The number of corrections applied.
    pub fn resolve(agent: &mut Agent, contacts: &[Contact]) -> usize {
        let mut ordered: Vec<&Contact> = contacts.iter().collect();
        ordered.sort_by(|a, b| a.overlap.partial_cmp(&b.overlap).unwrap_or(Ordering::Equal));
        let grounded = contacts.iter().any(|c| c.vertical);

        let mut applied = 0;
        for contact in ordered {
            if !point_in_cylinder(agent, contact.point) {
                continue;
            }

            let mut delta = contact.normal * contact.overlap;
            if !grounded {
                delta.y = 0.0;
            }
            agent.position += delta;

            if contact.normal.y < 0.0 {
                agent.velocity.y += UNSTICK_IMPULSE;
            }

            let into_surface = agent.velocity.dot(contact.normal);
            agent.velocity -= contact.normal * into_surface;

            if contact.vertical && contact.normal.y > 0.0 {
                agent.on_ground = true;
            }
            applied += 1;
        }
        applied
    }
}

/// Whether `point` lies strictly inside the agent's bounding cylinder.
pub fn point_in_cylinder(agent: &Agent, point: Point3<f32>) -> bool {
    let dx = point.x - agent.position.x;
    let dy = point.y - agent.centre_y();
    let dz = point.z - agent.position.z;
    dy.abs() < agent.height / 2.0 && dx * dx + dz * dz < agent.radius * agent.radius
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct Blocks(HashSet<GlobalCoordinate>);

    impl WorldQuery for Blocks {
        fn is_solid(&self, global: GlobalCoordinate) -> bool {
            self.0.contains(&global)
        }
    }

    fn blocks(cells: &[(i32, i32, i32)]) -> Blocks {
        Blocks(cells.iter().map(|&(x, y, z)| Point3::new(x, y, z)).collect())
    }

    #[test]
    fn broad_phase_covers_the_bounding_box() {
        let world = blocks(&[(0, 0, 0), (5, 0, 0), (0, 3, 0)]);
        let agent = Agent::new(Point3::new(0.5, 2.5, 0.5));
        let candidates = CollisionSystem::broad_phase(&agent, &world);
        assert!(candidates.contains(&Point3::new(0, 0, 0)));
        assert!(candidates.contains(&Point3::new(0, 3, 0)));
        assert!(!candidates.contains(&Point3::new(5, 0, 0)));
    }

    #[test]
    fn resting_on_a_block_is_a_vertical_contact() {
        let agent = Agent::new(Point3::new(0.5, 1.0 + 1.75 - 0.01, 0.5));
        let contacts = CollisionSystem::narrow_phase(&agent, &[Point3::new(0, 0, 0)]);
        assert_eq!(contacts.len(), 1);
        let contact = contacts[0];
        assert!(contact.vertical);
        assert_eq!(contact.normal, Vector3::new(0.0, 1.0, 0.0));
        assert!((contact.overlap - 0.01).abs() < 1e-4);
    }

    #[test]
    fn wall_pushes_horizontally_and_stops_motion() {
        // Block at x in [1, 2], agent centre 0.3 to its left.
        let world = blocks(&[(1, 1, 0)]);
        let mut agent = Agent::new(Point3::new(0.7, 2.5, 0.5));
        agent.velocity = Vector3::new(3.0, 0.0, 0.0);

        let mut system = CollisionSystem::new();
        system.detect_and_resolve(&mut agent, &world);

        assert_eq!(system.last_report().corrections, 1);
        assert!((agent.position.x - 0.5).abs() < 1e-5);
        assert!(agent.velocity.x.abs() < 1e-5);
        assert!(!agent.on_ground);
    }

    #[test]
    fn axis_through_the_cube_is_skipped() {
        // Centre sits inside the block horizontally; vertical overlap is the
        // larger one, so the horizontal normal would be zero length.
        let mut agent = Agent::new(Point3::new(0.5, 1.5, 0.5));
        agent.height = 1.0;
        agent.radius = 0.2;
        let contacts = CollisionSystem::narrow_phase(&agent, &[Point3::new(0, 0, 0)]);
        assert!(contacts.is_empty());
        let before = agent.clone();
        assert_eq!(CollisionSystem::resolve(&mut agent, &contacts), 0);
        assert_eq!(agent, before);
    }

    #[test]
    fn contact_level_with_the_centre_is_skipped() {
        // Wide, short cylinder beside the block; its centre is level with the
        // closest point, so the vertical normal has no sign.
        let mut agent = Agent::new(Point3::new(1.2, 1.0, 0.5));
        agent.radius = 1.0;
        agent.height = 1.0;
        let contacts = CollisionSystem::narrow_phase(&agent, &[Point3::new(0, 0, 0)]);
        assert!(contacts.is_empty());

        let world = blocks(&[(0, 0, 0)]);
        let mut system = CollisionSystem::new();
        system.detect_and_resolve(&mut agent, &world);
        assert_eq!(system.last_report().corrections, 0);
        assert_eq!(agent.position, Point3::new(1.2, 1.0, 0.5));
        assert!(!agent.on_ground);
    }

    #[test]
    fn ceiling_hit_pushes_down_and_boosts_up() {
        // Block above the head, agent overlapping it by 0.05.
        let world = blocks(&[(0, 3, 0), (0, 0, 0)]);
        let mut agent = Agent::new(Point3::new(0.5, 3.05, 0.5));
        agent.velocity = Vector3::new(0.0, 4.0, 0.0);

        let mut system = CollisionSystem::new();
        system.detect_and_resolve(&mut agent, &world);

        assert!((agent.position.y - 3.0).abs() < 1e-4);
        // Boosted, then the upward component is removed along the normal.
        assert!(agent.velocity.y <= 0.0 + 1e-5);
        assert!(!agent.on_ground);
    }

    #[test]
    fn separated_contacts_are_not_applied_twice() {
        // Cylinder centre at y = 1.2, both contacts at the same point.
        let mut agent = Agent::new(Point3::new(0.5, 2.075, 0.5));
        let point = Point3::new(0.5, 1.0, 0.5);
        let contact = |overlap: f32| Contact {
            block: Point3::new(0, 0, 0),
            point,
            normal: Vector3::new(0.0, 1.0, 0.0),
            overlap,
            vertical: true,
        };
        // Deliberately out of order; the smaller one goes first and lifts the
        // cylinder clear of the shared point.
        let contacts = [contact(0.8), contact(0.7)];

        assert_eq!(CollisionSystem::resolve(&mut agent, &contacts), 1);
        assert!((agent.position.y - 2.775).abs() < 1e-4);
        assert!(agent.on_ground);
    }
}
