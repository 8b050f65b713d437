//! Level generation
//!
//! The free-space allocator, carving primitives, the ten room builders,
//! starburst rooms, vault templates and the wilderness generators. Object
//! and monster placement is delegated to a [`Populator`].

mod blocks;
mod carve;
mod populate;
mod rooms;
mod starburst;
mod templates;
mod vault;
mod wilderness;

pub use blocks::{BlockMap, BlockRect, Placement};
pub use populate::{NullPopulator, PopulationPlan, Populator, SpeciesPopulator};
pub use rooms::{build_room, generate_dungeon_rooms, select_room_kind, RoomKind};
pub use starburst::generate_starburst_room;
pub use templates::{VaultKind, VaultLibrary, VaultTemplate};
pub use vault::build_vault;
pub use wilderness::{alloc_paths, generate_wilderness, make_formation, path_start, Side};

use crate::consts::CENT_MAX;
use crate::dungeon::{Coord, LevelKind};
use crate::error::GenError;
use crate::rng::GameRng;

/// Generation state for a single level
#[derive(Debug, Clone)]
pub struct GenContext {
    pub depth: i32,
    pub kind: LevelKind,

    /// Coarse room-placement grid
    pub blocks: BlockMap,

    /// Room centers, in placement order (at most `CENT_MAX`)
    pub centers: Vec<Coord>,

    /// Rooms successfully built
    pub rooms: usize,

    /// How special this level is; vaults and pits raise it
    pub rating: i32,

    pub templates: VaultLibrary,
}

impl GenContext {
    pub fn new(depth: i32, kind: LevelKind) -> Self {
        Self {
            depth,
            kind,
            blocks: BlockMap::new(),
            centers: Vec::new(),
            rooms: 0,
            rating: 0,
            templates: VaultLibrary::builtin(),
        }
    }

    /// Use a different template set
    pub fn with_templates(mut self, templates: VaultLibrary) -> Self {
        self.templates = templates;
        self
    }

    /// Reserve room for a `height` x `width` room and return its center
    ///
    /// Running out of space is an ordinary outcome; callers skip the room.
    pub fn find_space(
        &mut self,
        height: i32,
        width: i32,
        rng: &mut GameRng,
    ) -> Result<Coord, GenError> {
        let placement = self
            .blocks
            .find_space(height, width, rng)
            .ok_or(GenError::NoSpace { height, width })?;

        if self.centers.len() < CENT_MAX {
            self.centers.push(placement.center);
        }
        Ok(placement.center)
    }
}
