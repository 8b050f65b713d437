//! Terrain features
//!
//! Every grid holds one `Feat`. Behaviour is never keyed off the variant
//! directly outside this file: callers ask for capability flags.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr};

bitflags! {
    /// Terrain capability flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FeatFlags: u32 {
        /// Does not block sight or projections
        const PROJECT = 1 << 0;
        /// Can be walked on without special ability
        const PASSABLE = 1 << 1;
        /// Carries sound
        const NOISE = 1 << 2;
        /// Can hold scent
        const SCENT = 1 << 3;
        const DOOR = 1 << 4;
        const LOCKED = 1 << 5;
        const JAMMED = 1 << 6;
        const SECRET = 1 << 7;
        const WALL = 1 << 8;
        const FLOOR = 1 << 9;
        const PERMANENT = 1 << 10;
        /// Worth memorizing when first seen
        const INTERESTING = 1 << 11;
        const WATER = 1 << 12;
        const LAVA = 1 << 13;
        /// Bottomless; walkers fall
        const FALL = 1 << 14;
        const TREE = 1 << 15;
        const RUBBLE = 1 << 16;
        const GRANITE = 1 << 17;
        const OUTER = 1 << 18;
        const INNER = 1 << 19;
        /// Leads to a neighbouring wilderness stage
        const EXIT = 1 << 20;
        const STAIR = 1 << 21;
        /// Mineral vein with treasure
        const TREASURE = 1 << 22;
    }
}

const OPEN_GROUND: FeatFlags = FeatFlags::PROJECT
    .union(FeatFlags::PASSABLE)
    .union(FeatFlags::NOISE)
    .union(FeatFlags::SCENT);

const SOLID_WALL: FeatFlags = FeatFlags::WALL.union(FeatFlags::INTERESTING);

const CLOSED_DOOR: FeatFlags = FeatFlags::DOOR
    .union(FeatFlags::NOISE)
    .union(FeatFlags::INTERESTING);

/// Terrain type
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    FromRepr,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Feat {
    #[default]
    Nothing = 0,
    Floor = 1,
    Grass = 2,
    Road = 3,
    Sand = 4,
    Tree = 5,
    DenseTree = 6,
    Rubble = 7,
    PassRubble = 8,
    Water = 9,
    Lava = 10,
    Void = 11,
    UpStair = 12,
    DownStair = 13,
    PathNorth = 14,
    PathEast = 15,
    PathSouth = 16,
    PathWest = 17,
    OpenDoor = 18,
    BrokenDoor = 19,
    ClosedDoor = 20,
    LockedDoor1 = 21,
    LockedDoor2 = 22,
    LockedDoor3 = 23,
    LockedDoor4 = 24,
    LockedDoor5 = 25,
    LockedDoor6 = 26,
    LockedDoor7 = 27,
    JammedDoor0 = 28,
    JammedDoor1 = 29,
    JammedDoor2 = 30,
    JammedDoor3 = 31,
    JammedDoor4 = 32,
    JammedDoor5 = 33,
    JammedDoor6 = 34,
    JammedDoor7 = 35,
    SecretDoor = 36,
    Magma = 37,
    Quartz = 38,
    MagmaTreasure = 39,
    QuartzTreasure = 40,
    /// Plain dungeon granite
    Granite = 41,
    InnerWall = 42,
    OuterWall = 43,
    SolidWall = 44,
    PermExtra = 45,
    PermInner = 46,
    PermOuter = 47,
    PermSolid = 48,
}

impl Feat {
    /// Capability flags for this terrain
    pub const fn flags(self) -> FeatFlags {
        use Feat::*;
        match self {
            Nothing => FeatFlags::empty(),
            Floor | Grass | Road | Sand => OPEN_GROUND.union(FeatFlags::FLOOR),
            Tree => OPEN_GROUND
                .union(FeatFlags::TREE)
                .union(FeatFlags::INTERESTING),
            // Dense trees hide what is behind them
            DenseTree => FeatFlags::PASSABLE
                .union(FeatFlags::NOISE)
                .union(FeatFlags::SCENT)
                .union(FeatFlags::TREE)
                .union(FeatFlags::INTERESTING),
            // Rubble blocks sight but not sound
            Rubble => FeatFlags::NOISE
                .union(FeatFlags::RUBBLE)
                .union(FeatFlags::INTERESTING),
            PassRubble => OPEN_GROUND
                .union(FeatFlags::RUBBLE)
                .union(FeatFlags::INTERESTING),
            Water => FeatFlags::PROJECT
                .union(FeatFlags::PASSABLE)
                .union(FeatFlags::NOISE)
                .union(FeatFlags::WATER)
                .union(FeatFlags::INTERESTING),
            Lava => FeatFlags::PROJECT
                .union(FeatFlags::PASSABLE)
                .union(FeatFlags::NOISE)
                .union(FeatFlags::LAVA)
                .union(FeatFlags::INTERESTING),
            Void => FeatFlags::PROJECT
                .union(FeatFlags::PASSABLE)
                .union(FeatFlags::FALL)
                .union(FeatFlags::INTERESTING),
            UpStair | DownStair => OPEN_GROUND
                .union(FeatFlags::STAIR)
                .union(FeatFlags::INTERESTING),
            PathNorth | PathEast | PathSouth | PathWest => OPEN_GROUND
                .union(FeatFlags::EXIT)
                .union(FeatFlags::INTERESTING),
            OpenDoor | BrokenDoor => OPEN_GROUND
                .union(FeatFlags::DOOR)
                .union(FeatFlags::INTERESTING),
            ClosedDoor => CLOSED_DOOR,
            LockedDoor1 | LockedDoor2 | LockedDoor3 | LockedDoor4 | LockedDoor5
            | LockedDoor6 | LockedDoor7 => CLOSED_DOOR.union(FeatFlags::LOCKED),
            JammedDoor0 | JammedDoor1 | JammedDoor2 | JammedDoor3 | JammedDoor4
            | JammedDoor5 | JammedDoor6 | JammedDoor7 => CLOSED_DOOR.union(FeatFlags::JAMMED),
            // Looks like granite until found
            SecretDoor => FeatFlags::WALL
                .union(FeatFlags::DOOR)
                .union(FeatFlags::SECRET)
                .union(FeatFlags::GRANITE),
            Magma | Quartz => SOLID_WALL,
            MagmaTreasure | QuartzTreasure => SOLID_WALL.union(FeatFlags::TREASURE),
            Granite | SolidWall => SOLID_WALL.union(FeatFlags::GRANITE),
            InnerWall => SOLID_WALL
                .union(FeatFlags::GRANITE)
                .union(FeatFlags::INNER),
            OuterWall => SOLID_WALL
                .union(FeatFlags::GRANITE)
                .union(FeatFlags::OUTER),
            PermExtra | PermSolid => SOLID_WALL.union(FeatFlags::PERMANENT),
            PermInner => SOLID_WALL
                .union(FeatFlags::PERMANENT)
                .union(FeatFlags::INNER),
            PermOuter => SOLID_WALL
                .union(FeatFlags::PERMANENT)
                .union(FeatFlags::OUTER),
        }
    }

    /// Check a capability flag
    pub const fn has(self, flag: FeatFlags) -> bool {
        self.flags().contains(flag)
    }

    /// Does not block sight or projections
    pub const fn projects(self) -> bool {
        self.has(FeatFlags::PROJECT)
    }

    pub const fn is_passable(self) -> bool {
        self.has(FeatFlags::PASSABLE)
    }

    pub const fn is_wall(self) -> bool {
        self.has(FeatFlags::WALL)
    }

    pub const fn is_floor(self) -> bool {
        self.has(FeatFlags::FLOOR)
    }

    pub const fn is_permanent(self) -> bool {
        self.has(FeatFlags::PERMANENT)
    }

    pub const fn is_door(self) -> bool {
        self.has(FeatFlags::DOOR)
    }

    /// Closed, locked, jammed or secret door
    pub const fn is_closed_door(self) -> bool {
        self.is_door() && !self.is_passable()
    }

    /// Plain granite that starburst rooms may promote to an outer wall
    pub const fn is_extra_granite(self) -> bool {
        matches!(self, Feat::Granite)
    }

    /// Lock power (1..=7) for locked doors, jam power (0..=7) for jammed ones
    pub const fn door_power(self) -> i32 {
        let id = self as i32;
        if self.has(FeatFlags::LOCKED) {
            id - Feat::ClosedDoor as i32
        } else if self.has(FeatFlags::JAMMED) {
            id - Feat::JammedDoor0 as i32
        } else {
            0
        }
    }

    /// Locked door of the given power; power 0 is a plain closed door
    pub fn locked_door(power: i32) -> Feat {
        let power = power.clamp(0, 7) as u8;
        Feat::from_repr(Feat::ClosedDoor as u8 + power).unwrap_or(Feat::ClosedDoor)
    }

    /// Jammed door of the given power
    pub fn jammed_door(power: i32) -> Feat {
        let power = power.clamp(0, 7) as u8;
        Feat::from_repr(Feat::JammedDoor0 as u8 + power).unwrap_or(Feat::JammedDoor0)
    }

    /// Drawing priority; higher wins when a map is scaled down
    pub const fn priority(self) -> u8 {
        use Feat::*;
        match self {
            Nothing => 1,
            Floor | Grass | Road | Sand => 5,
            Void | Water | Lava => 8,
            Tree | DenseTree | Rubble | PassRubble => 13,
            Magma | Quartz | Granite | InnerWall | OuterWall | SolidWall | PermExtra
            | PermInner | PermOuter | PermSolid | SecretDoor => 10,
            MagmaTreasure | QuartzTreasure => 19,
            UpStair | DownStair | PathNorth | PathEast | PathSouth | PathWest => 25,
            _ => 17,
        }
    }

    /// Display character, used for map dumps
    pub const fn symbol(self) -> char {
        use Feat::*;
        match self {
            Nothing => ' ',
            Floor | Road => '.',
            Grass => ',',
            Sand => ':',
            Tree | DenseTree => '%',
            Rubble | PassRubble => ';',
            Water => '~',
            Lava => '&',
            Void => '_',
            UpStair => '<',
            DownStair => '>',
            PathNorth | PathEast | PathSouth | PathWest => '=',
            OpenDoor | BrokenDoor => '\'',
            Magma | Quartz => '*',
            MagmaTreasure | QuartzTreasure => '$',
            Granite | InnerWall | OuterWall | SolidWall | SecretDoor => '#',
            PermExtra | PermInner | PermOuter | PermSolid => 'X',
            _ => '+',
        }
    }
}
