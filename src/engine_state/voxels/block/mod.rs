//! # Block Module
//!
//! This module provides the static block catalog for the voxel world.
//! It includes block kind definitions, block face handling, and the
//! [`BlockRegistry`] property table consulted by generation, occlusion
//! culling, collision and the render collaborator.
//!
//! The registry is a plain value built once at startup and shared by
//! reference (or behind an `Arc` when handed to worker threads). It is never
//! mutated after construction.

use block_type::BlockType;

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory.
pub type BlockTypeSize = u8;

/// Per-face texture indices for one block kind.
///
/// The array contains 6 texture indices, one for each face in the order:
/// [Front, Back, Bottom, Top, Left, Right]
pub type VisualHandle = [u16; 6];

/// How a block kind is drawn by the render collaborator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderShape {
    /// A unit cube. One render instance per visible voxel.
    Cube,
    /// Two intersecting planes rotated by ±45° about the vertical axis.
    /// Two render instances per visible voxel.
    Cross,
}

impl RenderShape {
    /// Number of render instances a visible voxel of this shape occupies.
    pub fn instance_count(&self) -> usize {
        match self {
            RenderShape::Cube => 1,
            RenderShape::Cross => 2,
        }
    }
}

/// Sound family played by the audio collaborator when a block is removed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DigSound {
    Grass,
    Wood,
    Stone,
}

/// Point light attached to a light-emitting block.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightEmission {
    /// Packed `0xRRGGBB` color.
    pub color: u32,
    pub intensity: f32,
    /// Distance at which the light's contribution reaches zero.
    pub distance: f32,
    pub decay: f32,
}

/// Static attributes of a block kind.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlockProperties {
    /// Whether agents collide with the block. The inverse of passable.
    pub solid: bool,
    /// Whether the block fully hides the faces of its neighbors.
    pub opaque: bool,
    pub render_shape: RenderShape,
    pub visual: VisualHandle,
    pub dig_sound: DigSound,
    pub light: Option<LightEmission>,
}

impl BlockProperties {
    const fn cube(visual: VisualHandle, dig_sound: DigSound) -> Self {
        BlockProperties {
            solid: true,
            opaque: true,
            render_shape: RenderShape::Cube,
            visual,
            dig_sound,
            light: None,
        }
    }

    const fn flora(texture: u16) -> Self {
        BlockProperties {
            solid: false,
            opaque: false,
            render_shape: RenderShape::Cross,
            visual: [texture; 6],
            dig_sound: DigSound::Grass,
            light: None,
        }
    }

    /// Whether agents can move through the block.
    #[inline]
    pub fn passable(&self) -> bool {
        !self.solid
    }
}

/// Light cast by a placed redstone lamp.
pub const LAMP_LIGHT: LightEmission = LightEmission {
    color: 0xdfa658,
    intensity: 15.0,
    distance: 10.0,
    decay: 1.0,
};

/// Maps each block kind to its properties.
///
/// Indexed by `BlockType as usize`.
static BLOCK_PROPERTIES: [BlockProperties; BlockType::COUNT] = [
    // Air
    BlockProperties {
        solid: false,
        opaque: false,
        render_shape: RenderShape::Cube,
        visual: [0; 6],
        dig_sound: DigSound::Stone,
        light: None,
    },
    // Grass (top: 3, bottom: 1, sides: 2)
    BlockProperties::cube([2, 2, 1, 3, 2, 2], DigSound::Grass),
    // Dirt
    BlockProperties::cube([1; 6], DigSound::Grass),
    // Stone
    BlockProperties::cube([4; 6], DigSound::Stone),
    // CoalOre
    BlockProperties::cube([5; 6], DigSound::Stone),
    // IronOre
    BlockProperties::cube([6; 6], DigSound::Stone),
    // Bedrock
    BlockProperties::cube([7; 6], DigSound::Stone),
    // OakLog (rings on top and bottom)
    BlockProperties::cube([8, 8, 9, 9, 8, 8], DigSound::Wood),
    // Leaves
    BlockProperties {
        solid: true,
        opaque: false,
        render_shape: RenderShape::Cube,
        visual: [10; 6],
        dig_sound: DigSound::Grass,
        light: None,
    },
    // TallGrass
    BlockProperties::flora(11),
    // FlowerRose
    BlockProperties::flora(12),
    // FlowerDandelion
    BlockProperties::flora(13),
    // StoneBrick
    BlockProperties::cube([14; 6], DigSound::Stone),
    // RedstoneLamp
    BlockProperties {
        solid: true,
        opaque: false,
        render_shape: RenderShape::Cube,
        visual: [15; 6],
        dig_sound: DigSound::Stone,
        light: Some(LAMP_LIGHT),
    },
];

/// Read-only catalog of block properties.
///
/// Constructed once by the world root and passed by reference to every
/// consumer. Lookups are a single array index.
#[derive(Debug, Clone)]
pub struct BlockRegistry {
    properties: &'static [BlockProperties; BlockType::COUNT],
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRegistry {
    /// Creates the registry over the built-in block catalog.
    pub fn new() -> Self {
        BlockRegistry {
            properties: &BLOCK_PROPERTIES,
        }
    }

    /// Looks up the properties of a block kind.
    ///
    /// # Arguments
    /// * `block_type` - The kind to look up
    ///
    /// # Returns
    /// The static property row for that kind.
    #[inline]
    pub fn get(&self, block_type: BlockType) -> &BlockProperties {
        &self.properties[block_type.index()]
    }

    #[inline]
    pub fn is_solid(&self, block_type: BlockType) -> bool {
        self.get(block_type).solid
    }

    #[inline]
    pub fn is_passable(&self, block_type: BlockType) -> bool {
        self.get(block_type).passable()
    }

    #[inline]
    pub fn is_opaque(&self, block_type: BlockType) -> bool {
        self.get(block_type).opaque
    }

    #[inline]
    pub fn render_shape(&self, block_type: BlockType) -> RenderShape {
        self.get(block_type).render_shape
    }

    /// Gets the texture indices for all faces of a block kind.
    pub fn visual(&self, block_type: BlockType) -> VisualHandle {
        self.get(block_type).visual
    }
}
