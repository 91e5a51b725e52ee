//! Agent physics against simple block layouts and a generated world.

use std::collections::HashSet;

use cgmath::Point3;
use voxel_world_core::{Agent, ChunkSize, GlobalCoordinate, Physics, World, WorldConfig, WorldQuery};

struct Blocks(HashSet<GlobalCoordinate>);

impl WorldQuery for Blocks {
    fn is_solid(&self, global: GlobalCoordinate) -> bool {
        self.0.contains(&global)
    }
}

#[test]
fn agent_settles_on_a_single_block() {
    let world = Blocks([Point3::new(0, 0, 0)].into_iter().collect());
    let mut physics = Physics::new();
    let mut agent = Agent::new(Point3::new(0.5, 4.0, 0.5));

    for _ in 0..120 {
        physics.update(1.0 / 60.0, &mut agent, &world);
    }

    let feet = agent.position.y - agent.height;
    assert!((feet - 1.0).abs() < 0.01, "feet at {feet}");
    assert!(agent.on_ground);
    assert!(agent.velocity.y <= 0.0);
    assert!(physics.last_report().corrections >= 1);
}

#[test]
fn agent_falls_past_the_edge_of_a_block() {
    let world = Blocks([Point3::new(0, 0, 0)].into_iter().collect());
    let mut physics = Physics::new();
    let mut agent = Agent::new(Point3::new(5.5, 4.0, 0.5));

    physics.update(1.0, &mut agent, &world);
    assert!(!agent.on_ground);
    assert!(agent.position.y < 0.0);
}

#[test]
fn walking_into_a_wall_stops_at_the_wall() {
    let mut cells: HashSet<GlobalCoordinate> = (-2..6)
        .flat_map(|x| (-2..3).map(move |z| Point3::new(x, 0, z)))
        .collect();
    // A two-high wall at x = 3.
    for z in -2..3 {
        cells.insert(Point3::new(3, 1, z));
        cells.insert(Point3::new(3, 2, z));
    }
    let world = Blocks(cells);
    let mut physics = Physics::new();
    let mut agent = Agent::new(Point3::new(0.5, 2.75, 0.5));
    // Yaw 0 faces +x.
    agent.set_movement(1.0, 0.0);

    for _ in 0..180 {
        physics.update(1.0 / 60.0, &mut agent, &world);
    }
    assert!(agent.position.x <= 3.0 - agent.radius + 0.01, "x = {}", agent.position.x);
    assert!(agent.position.x > 2.0);
    assert!(agent.on_ground);
}

#[test]
fn grounded_agent_can_jump() {
    let world = Blocks([Point3::new(0, 0, 0)].into_iter().collect());
    let mut physics = Physics::new();
    let mut agent = Agent::new(Point3::new(0.5, 2.75, 0.5));
    physics.update(0.1, &mut agent, &world);
    assert!(agent.on_ground);

    assert!(agent.jump());
    physics.update(0.1, &mut agent, &world);
    assert!(agent.position.y > 2.9);
}

#[test]
fn agent_lands_on_generated_terrain() {
    let config = WorldConfig {
        chunk_size: ChunkSize::new(8, 32),
        render_distance: 0,
        worker_threads: 0,
        ..WorldConfig::default()
    };
    let mut world = World::new(config).expect("valid config");
    let spawn = Point3::new(4.5, 31.0, 4.5);
    world.update(spawn);

    let mut physics = Physics::new();
    let mut agent = Agent::new(spawn);
    for _ in 0..240 {
        physics.update(1.0 / 60.0, &mut agent, &world);
    }

    assert!(agent.on_ground);
    let below = Point3::new(4, (agent.position.y - agent.height - 0.5).floor() as i32, 4);
    assert!(world.is_solid(below));
}
