#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World Core
//!
//! The simulation core of a chunked voxel world: deterministic procedural
//! generation, chunk streaming around a moving viewer with a persistent edit
//! overlay, incremental render instances with occlusion culling, and
//! fixed-step cylinder-versus-voxel collision.
//!
//! Rendering, input, audio and UI are external collaborators. They drive the
//! core through [`EngineState`] and observe it through
//! [`World::drain_events`] and the per-chunk instance buffers.
//!
//! ## Key Modules
//!
//! * `config` - JSON-loadable world and generation settings
//! * `error` - Configuration and generation error types
//! * `engine_state` - World streaming, generation, chunks, physics and the
//!   worker pool
//!
//! ## Usage
//!
//! ```ignore
//! fn main() {
//!     if let Err(err) = voxel_world_core::run() {
//!         eprintln!("{err}");
//!     }
//! }
//! ```

use cgmath::Point3;
use log::info;

pub mod config;
pub mod engine_state;
pub mod error;

pub use config::{GenerationParams, WorldConfig};
pub use engine_state::physics::agent::Agent;
pub use engine_state::physics::collision::{CollisionSystem, WorldQuery};
pub use engine_state::physics::Physics;
pub use engine_state::voxels::block::block_type::BlockType;
pub use engine_state::voxels::block::BlockRegistry;
pub use engine_state::voxels::coordinates::{ChunkCoordinate, ChunkSize, GlobalCoordinate, LocalCoordinate};
pub use engine_state::voxels::edit_store::EditStore;
pub use engine_state::voxels::generation::{generate_chunk, ChunkGrid};
pub use engine_state::voxels::noise_field::NoiseField;
pub use engine_state::voxels::world::{ChunkState, StreamingDiff, World, WorldEvent};
pub use engine_state::EngineState;
pub use error::{ConfigError, ConfigResult, GenerationFailure};

pub const APPLICATION_INITIALIZATION_STOPWATCH: &str = "Application Initialization";

/// Where the agent starts.
const SPAWN: Point3<f32> = Point3::new(32.0, 64.0, 32.0);

/// Frames simulated by the headless driver.
const HEADLESS_FRAMES: u32 = 600;

/// Frame time of the headless driver, in seconds.
const FRAME_TIME: f32 = 1.0 / 60.0;

/// Runs the core headlessly.
///
/// Initializes logging from `RUST_LOG`, loads the world configuration from
/// the JSON file named by the first argument (or uses the defaults), then
/// walks the agent forward for a fixed number of frames while chunks stream
/// in around it.
///
/// # Returns
/// The configuration error that prevented startup, if any.
pub fn run() -> ConfigResult<()> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");
    let started = web_time::Instant::now();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            WorldConfig::from_json_file(path)?
        }
        None => WorldConfig::default(),
    };

    let mut engine = EngineState::new(config, SPAWN)?;
    info!(
        "{} took {:?}",
        APPLICATION_INITIALIZATION_STOPWATCH,
        started.elapsed()
    );

    engine.agent.set_movement(1.0, 0.0);
    let mut rendered_events = 0usize;
    for frame in 0..HEADLESS_FRAMES {
        engine.tick(FRAME_TIME);
        rendered_events += engine.world.drain_events().len();

        if frame % 60 == 0 {
            info!(
                "Frame {}: agent at {:?} (on ground: {}), {} chunk(s) ready, {} pending",
                frame,
                engine.agent.position,
                engine.agent.on_ground,
                engine.world.ready_chunks().len(),
                engine.world.pending_chunks()
            );
        }
    }

    info!(
        "Simulated {} frames in {:?}, {} world event(s) delivered",
        HEADLESS_FRAMES,
        started.elapsed(),
        rendered_events
    );
    Ok(())
}
