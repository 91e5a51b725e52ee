//! # Configuration
//!
//! [`WorldConfig`] gathers every tunable of the world core: chunk dimensions,
//! streaming radius, worker pool size and the [`GenerationParams`] knob set.
//! Configurations are plain serde values and can be loaded from JSON. Every
//! field has a default, so a partial file (or `{}`) is valid.
//!
//! Values are checked by [`WorldConfig::validate`]. Out-of-range values are
//! rejected with a [`ConfigError`]; nothing is silently clamped.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::BlockRegistry;
use crate::engine_state::voxels::coordinates::ChunkSize;
use crate::error::{ConfigError, ConfigResult};

/// Heightfield shape.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Horizontal noise period in voxels. Larger values give smoother hills.
    pub scale: f64,
    /// Fraction of the chunk height the noise can swing the surface by.
    pub magnitude: f64,
    /// Base surface height as a fraction of the chunk height.
    pub offset: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        TerrainParams {
            scale: 50.0,
            magnitude: 0.1,
            offset: 0.5,
        }
    }
}

/// Thickness of a layer, in voxels: `offset + |noise * magnitude|`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThicknessParams {
    pub offset: f64,
    pub magnitude: f64,
}

impl Default for ThicknessParams {
    fn default() -> Self {
        ThicknessParams {
            offset: 4.0,
            magnitude: 4.0,
        }
    }
}

/// Inclusive integer range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: u32,
    pub max: u32,
}

impl IntRange {
    pub const fn new(min: u32, max: u32) -> Self {
        IntRange { min, max }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    /// Probability-like gate in [0, 1]. 0 disables trees.
    pub frequency: f64,
    pub trunk_height: IntRange,
    /// Radius of the randomized canopy disk.
    pub canopy_size: IntRange,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams {
            frequency: 0.04,
            trunk_height: IntRange::new(5, 7),
            canopy_size: IntRange::new(1, 3),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrassParams {
    pub frequency: f64,
    /// Number of random-walk steps taken from a seeded tuft.
    pub patch_size: u32,
}

impl Default for GrassParams {
    fn default() -> Self {
        GrassParams {
            frequency: 0.02,
            patch_size: 5,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowerParams {
    pub frequency: f64,
}

impl Default for FlowerParams {
    fn default() -> Self {
        FlowerParams { frequency: 0.0075 }
    }
}

/// One ore kind placed by 3D noise.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OreParams {
    pub block: BlockType,
    /// Per-axis noise period (x, y, z).
    pub scale: [f64; 3],
    /// Noise threshold in [-1, 1]; the ore is placed where noise exceeds it.
    pub scarcity: f64,
}

/// Seed plus every per-pass knob of the chunk generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub seed: u32,
    pub terrain: TerrainParams,
    pub surface: ThicknessParams,
    pub bedrock: ThicknessParams,
    pub trees: TreeParams,
    pub grass: GrassParams,
    pub flowers: FlowerParams,
    /// Ore kinds in placement order. Later entries win where two overlap.
    pub ores: Vec<OreParams>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            seed: 0,
            terrain: TerrainParams::default(),
            surface: ThicknessParams::default(),
            bedrock: ThicknessParams {
                offset: 1.0,
                magnitude: 1.0,
            },
            trees: TreeParams::default(),
            grass: GrassParams::default(),
            flowers: FlowerParams::default(),
            ores: vec![
                OreParams {
                    block: BlockType::CoalOre,
                    scale: [8.0, 8.0, 8.0],
                    scarcity: 0.75,
                },
                OreParams {
                    block: BlockType::IronOre,
                    scale: [5.0, 5.0, 5.0],
                    scarcity: 0.8,
                },
            ],
        }
    }
}

fn check_positive(field: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be > 0, got {value}")))
    }
}

fn check_non_negative(field: &'static str, value: f64) -> ConfigResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be >= 0, got {value}")))
    }
}

fn check_unit(field: &'static str, value: f64) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be in [0, 1], got {value}")))
    }
}

fn check_range(field: &'static str, range: IntRange, min_allowed: u32) -> ConfigResult<()> {
    if range.min < min_allowed {
        return Err(ConfigError::invalid(
            field,
            format!("min must be >= {min_allowed}, got {}", range.min),
        ));
    }
    if range.min > range.max {
        return Err(ConfigError::invalid(
            field,
            format!("min ({}) exceeds max ({})", range.min, range.max),
        ));
    }
    Ok(())
}

impl GenerationParams {
    /// Checks every knob against its documented range.
    pub fn validate(&self, registry: &BlockRegistry) -> ConfigResult<()> {
        check_positive("generation.terrain.scale", self.terrain.scale)?;
        check_non_negative("generation.terrain.magnitude", self.terrain.magnitude)?;
        check_unit("generation.terrain.offset", self.terrain.offset)?;
        check_non_negative("generation.surface.offset", self.surface.offset)?;
        check_non_negative("generation.surface.magnitude", self.surface.magnitude)?;
        check_non_negative("generation.bedrock.offset", self.bedrock.offset)?;
        check_non_negative("generation.bedrock.magnitude", self.bedrock.magnitude)?;
        check_unit("generation.trees.frequency", self.trees.frequency)?;
        check_range("generation.trees.trunk_height", self.trees.trunk_height, 1)?;
        check_range("generation.trees.canopy_size", self.trees.canopy_size, 0)?;
        check_unit("generation.grass.frequency", self.grass.frequency)?;
        check_unit("generation.flowers.frequency", self.flowers.frequency)?;
        for ore in &self.ores {
            for axis in ore.scale {
                check_positive("generation.ores.scale", axis)?;
            }
            if !ore.scarcity.is_finite() {
                return Err(ConfigError::invalid(
                    "generation.ores.scarcity",
                    "must be a finite number",
                ));
            }
            if !registry.is_solid(ore.block) {
                return Err(ConfigError::invalid(
                    "generation.ores.block",
                    format!("`{}` is not a solid block", ore.block),
                ));
            }
        }
        Ok(())
    }
}

/// Largest accepted chunk width, so voxel indices fit in `i32`.
pub const MAX_CHUNK_WIDTH: i32 = 256;
/// Largest accepted chunk height.
pub const MAX_CHUNK_HEIGHT: i32 = 1024;
/// Largest accepted render distance, in chunks.
pub const MAX_RENDER_DISTANCE: u32 = 64;

/// Top-level configuration of a [`World`](crate::World).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub chunk_size: ChunkSize,
    /// Radius, in chunks, of the streamed square around the viewer.
    pub render_distance: u32,
    /// Generation worker threads. 0 runs generation on the owning thread.
    pub worker_threads: usize,
    /// A chunk whose generation has been running on a worker for this long
    /// is cancelled and requeued. Time spent waiting for a free worker does
    /// not count.
    pub generation_timeout_ms: u64,
    /// Number of generated grids kept for quick reloads. 0 disables the cache.
    pub grid_cache_capacity: usize,
    pub generation: GenerationParams,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            chunk_size: ChunkSize::default(),
            render_distance: 8,
            worker_threads: 2,
            generation_timeout_ms: 5000,
            grid_cache_capacity: 64,
            generation: GenerationParams::default(),
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from JSON text and validates it.
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let config: WorldConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks every value against its documented range.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(1..=MAX_CHUNK_WIDTH).contains(&self.chunk_size.width) {
            return Err(ConfigError::invalid(
                "chunk_size.width",
                format!("must be in 1..={}, got {}", MAX_CHUNK_WIDTH, self.chunk_size.width),
            ));
        }
        if !(2..=MAX_CHUNK_HEIGHT).contains(&self.chunk_size.height) {
            return Err(ConfigError::invalid(
                "chunk_size.height",
                format!("must be in 2..={}, got {}", MAX_CHUNK_HEIGHT, self.chunk_size.height),
            ));
        }
        if self.render_distance > MAX_RENDER_DISTANCE {
            return Err(ConfigError::invalid(
                "render_distance",
                format!("must be <= {}, got {}", MAX_RENDER_DISTANCE, self.render_distance),
            ));
        }
        if self.generation_timeout_ms == 0 {
            return Err(ConfigError::invalid("generation_timeout_ms", "must be >= 1"));
        }
        self.generation.validate(&BlockRegistry::new())
    }
}
