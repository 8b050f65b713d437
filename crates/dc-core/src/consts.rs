//! Core simulation constants
//!
//! Dungeon extent, sight limits and the tuning numbers shared by the
//! visibility, flow, AI and generation code.

/// Dungeon dimensions (fixed for every level)
pub const DUNGEON_HGT: usize = 66;
pub const DUNGEON_WID: usize = 198;

/// Maximum distance at which the player can see anything
pub const MAX_SIGHT: i32 = 20;

/// Maximum range of projections and monster ranged attacks
pub const MAX_RANGE: i32 = 20;

/// Largest axis delta `los` accepts.
///
/// The fixed-point slope math scales by `2 * ay * ax`; staying inside the
/// dungeon extent keeps that far away from `i32` overflow.
pub const MAX_LOS_DELTA: i32 = DUNGEON_WID as i32;

/// Cost assigned to the player's grid on a full noise rebuild
pub const NOISE_CENTER_COST: i32 = 100;

/// How far (in flow steps) noise propagates from the player
pub const NOISE_STRENGTH: i32 = 45;

/// Player movement (Chebyshev) from the last flow center that forces a
/// full noise rebuild
pub const NOISE_REBUILD_DIST: i32 = 15;

/// Noise cost sentinel: grid is being recomputed
pub const NOISE_RECOMPUTE: u8 = 255;

/// Oldest scent kept across an epoch rollover
pub const SMELL_STRENGTH: i32 = 50;

/// Scent epoch counter value right after a rollover
pub const SCENT_EPOCH_MAX: i32 = 250 - SMELL_STRENGTH;

/// Scent deposit template value meaning "too far, skip"
pub const SCENT_SKIP: u8 = 250;

/// Distance at which frightened monsters feel safe
pub const FLEE_RANGE: i32 = MAX_SIGHT + 5;

/// Distance at which a cornered monster turns to fight
pub const TURN_RANGE: i32 = 3;

/// Half-width of the square searched for hiding places
pub const HIDE_RADIUS: i32 = 15;

/// Coarse block size used by the room allocator
pub const BLOCK_HGT: usize = 11;
pub const BLOCK_WID: usize = 11;

/// Number of coarse blocks on each axis
pub const MAX_ROOMS_ROW: usize = DUNGEON_HGT / BLOCK_HGT;
pub const MAX_ROOMS_COL: usize = DUNGEON_WID / BLOCK_WID;

/// Placement attempts `find_space` makes before giving up
pub const FIND_SPACE_TRIES: usize = 25;

/// Maximum number of recorded room centers
pub const CENT_MAX: usize = 100;

/// Maximum number of starburst arcs
pub const MAX_ARCS: usize = 45;

/// Native span of the starburst angle table
pub const ANGLE_TABLE_SPAN: i32 = 40;

/// Baseline monster speed (energy per game turn at normal speed)
pub const NORMAL_SPEED: i32 = 110;

/// Minimum monsters on a wilderness level before depth scaling
pub const MIN_M_ALLOC_LEVEL: i32 = 14;
