//! # Block Type Module
//!
//! This module defines the different kinds of blocks in the voxel world.
//! It provides block kind identification, integer conversion, and the stable
//! string keys used by configuration files.

use std::fmt;

use num_derive::FromPrimitive;
use phf::phf_map;
use serde::{Deserialize, Serialize};

use super::BlockTypeSize;

/// Enumerates all possible block kinds in the voxel world.
///
/// Each variant maps to one row of the [`BlockRegistry`](super::BlockRegistry)
/// property table. The `FromPrimitive` derive allows conversion from the compact
/// integer form, which is how instance buffers are indexed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BlockType {
    /// Empty space. Passable and transparent.
    Air,
    /// Surface block with a grass top and dirt sides.
    Grass,
    /// Sub-surface band between the grass and the stone layer.
    Dirt,
    /// Bulk underground material.
    Stone,
    /// Common ore, placed by 3D noise before terrain.
    CoalOre,
    /// Rarer ore, placed after coal so it wins ties.
    IronOre,
    /// Unbreakable floor of the world.
    Bedrock,
    /// Tree trunk.
    OakLog,
    /// Tree canopy. Solid but see-through.
    Leaves,
    /// Cross-shaped flora grown in patches.
    TallGrass,
    /// Cross-shaped single flower.
    FlowerRose,
    /// Cross-shaped single flower.
    FlowerDandelion,
    /// Player building material.
    StoneBrick,
    /// Player-placed light source.
    RedstoneLamp,
}

/// Stable keys for each block kind, as they appear in configuration files.
static BLOCK_KEYS: phf::Map<&'static str, BlockType> = phf_map! {
    "air" => BlockType::Air,
    "grass" => BlockType::Grass,
    "dirt" => BlockType::Dirt,
    "stone" => BlockType::Stone,
    "coal_ore" => BlockType::CoalOre,
    "iron_ore" => BlockType::IronOre,
    "bedrock" => BlockType::Bedrock,
    "oak_log" => BlockType::OakLog,
    "leaves" => BlockType::Leaves,
    "tall_grass" => BlockType::TallGrass,
    "flower_rose" => BlockType::FlowerRose,
    "flower_dandelion" => BlockType::FlowerDandelion,
    "stone_brick" => BlockType::StoneBrick,
    "redstone_lamp" => BlockType::RedstoneLamp,
};

impl BlockType {
    /// Number of block kinds. Instance buffers are allocated once per kind.
    pub const COUNT: usize = 14;

    /// Converts a compact `BlockTypeSize` back into a `BlockType`.
    ///
    /// Returns `None` for values that don't name a block kind.
    pub fn from_int(btype: BlockTypeSize) -> Option<Self> {
        num::FromPrimitive::from_u8(btype)
    }

    /// Iterates over every block kind in declaration order.
    pub fn all() -> impl Iterator<Item = BlockType> {
        (0..Self::COUNT as BlockTypeSize).filter_map(Self::from_int)
    }

    /// Looks up a block kind by its configuration key (e.g. `"coal_ore"`).
    pub fn from_key(key: &str) -> Option<Self> {
        BLOCK_KEYS.get(key).copied()
    }

    /// Returns the configuration key of this block kind.
    pub fn key(&self) -> &'static str {
        BLOCK_KEYS
            .entries()
            .find(|(_, block_type)| *block_type == self)
            .map(|(key, _)| *key)
            .unwrap_or("air")
    }

    /// Index of this kind in per-kind tables.
    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl TryFrom<String> for BlockType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BlockType::from_key(&value).ok_or_else(|| format!("unknown block kind `{value}`"))
    }
}

impl From<BlockType> for String {
    fn from(value: BlockType) -> Self {
        value.key().to_string()
    }
}
