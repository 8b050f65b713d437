//! Map cell types

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::feature::Feat;

bitflags! {
    /// Per-grid flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u16 {
        /// Part of a room
        const ROOM = 0x0001;
        /// Permanently lit
        const GLOW = 0x0002;
        /// In the player's raw field of view
        const VIEW = 0x0004;
        /// In view and illuminated
        const SEEN = 0x0008;
        /// Memorized by the player
        const MARK = 0x0010;
        /// Edge of a trap-detected region
        const TRAP_EDGE = 0x0020;
        /// Scratch bit for the visibility pass
        const TEMP = 0x0040;
        /// Reserved by a vault or formation
        const ICKY = 0x0080;
        /// Terrain blocks sight (kept in step with the feature)
        const WALL = 0x0100;
        /// Inside a trap-detected region
        const DETECTED = 0x0200;
    }
}

// Manual serde impl for CellFlags
impl Serialize for CellFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CellFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u16::deserialize(deserializer)?;
        Ok(CellFlags::from_bits_truncate(bits))
    }
}

/// Who stands on a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occupant {
    Empty,
    Player,
    Monster(u16),
}

impl Occupant {
    /// Decode the signed occupancy index stored in a cell
    pub const fn from_index(index: i16) -> Self {
        if index == 0 {
            Occupant::Empty
        } else if index < 0 {
            Occupant::Player
        } else {
            Occupant::Monster(index as u16)
        }
    }

    /// Encode as the signed occupancy index
    pub const fn index(self) -> i16 {
        match self {
            Occupant::Empty => 0,
            Occupant::Player => -1,
            Occupant::Monster(idx) => idx as i16,
        }
    }
}

/// A single map cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Terrain
    pub feat: Feat,

    pub flags: CellFlags,

    /// 0 = empty, negative = player, positive = monster list index
    pub occupant: i16,

    /// First object stacked here (0 = none)
    pub object: u16,

    /// Noise flow cost (0 = unknown, 255 = being recomputed)
    pub noise: u8,

    /// Scent stamp (0 = none)
    pub scent: u8,
}

impl Cell {
    /// A cell of the given terrain, with the wall bit set to match
    pub const fn new(feat: Feat) -> Self {
        let flags = if feat.projects() {
            CellFlags::empty()
        } else {
            CellFlags::WALL
        };
        Self {
            feat,
            flags,
            occupant: 0,
            object: 0,
            noise: 0,
            scent: 0,
        }
    }

    pub const fn occupant(&self) -> Occupant {
        Occupant::from_index(self.occupant)
    }

    pub const fn is_occupied(&self) -> bool {
        self.occupant != 0
    }

    pub const fn has_object(&self) -> bool {
        self.object != 0
    }

    pub const fn is_icky(&self) -> bool {
        self.flags.contains(CellFlags::ICKY)
    }

    /// Blocks sight (wall bit)
    pub const fn is_wall(&self) -> bool {
        self.flags.contains(CellFlags::WALL)
    }

    /// Replace the terrain, keeping the wall bit consistent
    pub fn set_feat(&mut self, feat: Feat) {
        self.feat = feat;
        self.flags.set(CellFlags::WALL, !feat.projects());
    }
}
