//! The grid store
//!
//! One `Cave` per level: the cell array, the monster list and the flow
//! trackers. Everything in the simulation borrows it mutably in turn.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::cell::{Cell, CellFlags, Occupant};
use super::feature::{Feat, FeatFlags};
use super::flow::FlowState;
use super::geometry::Coord;
use crate::consts::{DUNGEON_HGT, DUNGEON_WID};
use crate::error::GridError;
use crate::monster::{Monster, MonsterId};

/// What sort of level this is
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum LevelKind {
    #[default]
    Dungeon,
    Cavern,
    Plain,
    Forest,
    Mountain,
    Swamp,
    Desert,
    River,
    Valley,
    Mountaintop,
}

impl LevelKind {
    pub const fn is_wilderness(self) -> bool {
        !matches!(self, LevelKind::Dungeon | LevelKind::Cavern)
    }
}

bitflags! {
    /// Deferred recomputation requests raised by terrain changes
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Update: u8 {
        const VIEW = 0x01;
        const FLOW = 0x02;
    }
}

/// A dungeon level
#[derive(Debug, Clone)]
pub struct Cave {
    cells: Vec<Cell>,

    /// Monster list; slot 0 is never used so a cell index of 0 means empty
    monsters: Vec<Option<Monster>>,

    /// Noise and scent trackers
    pub flow: FlowState,

    pub kind: LevelKind,
    pub depth: i32,

    /// Level holds the way down into a dungeon
    pub dungeon_entrance: bool,

    player: Option<Coord>,
    updates: Update,
}

impl Default for Cave {
    fn default() -> Self {
        Self::new()
    }
}

impl Cave {
    /// A level of solid granite
    pub fn new() -> Self {
        Self {
            cells: vec![Cell::new(Feat::Granite); DUNGEON_HGT * DUNGEON_WID],
            monsters: vec![None],
            flow: FlowState::default(),
            kind: LevelKind::Dungeon,
            depth: 0,
            dungeon_entrance: false,
            player: None,
            updates: Update::empty(),
        }
    }

    /// Reset every cell to `feat` and drop all occupants
    pub fn wipe(&mut self, feat: Feat) {
        self.cells.fill(Cell::new(feat));
        self.monsters.truncate(1);
        self.flow = FlowState::default();
        self.player = None;
        self.updates = Update::VIEW | Update::FLOW;
    }

    pub const fn height(&self) -> i32 {
        DUNGEON_HGT as i32
    }

    pub const fn width(&self) -> i32 {
        DUNGEON_WID as i32
    }

    /// Inside the dungeon array
    pub const fn in_bounds(&self, at: Coord) -> bool {
        at.y >= 0 && at.x >= 0 && at.y < DUNGEON_HGT as i32 && at.x < DUNGEON_WID as i32
    }

    /// Inside the dungeon array and not on its outer edge
    pub const fn in_bounds_fully(&self, at: Coord) -> bool {
        at.y > 0 && at.x > 0 && at.y < DUNGEON_HGT as i32 - 1 && at.x < DUNGEON_WID as i32 - 1
    }

    /// Validate a coordinate at the API boundary
    pub fn checked(&self, at: Coord) -> Result<Coord, GridError> {
        if self.in_bounds(at) {
            Ok(at)
        } else {
            Err(GridError::OutOfBounds { y: at.y, x: at.x })
        }
    }

    fn index(at: Coord) -> usize {
        at.y as usize * DUNGEON_WID + at.x as usize
    }

    /// Cell at a validated coordinate
    ///
    /// Panics on out-of-bounds coordinates; use `get` for unchecked input.
    pub fn cell(&self, at: Coord) -> &Cell {
        &self.cells[Self::index(at)]
    }

    pub fn cell_mut(&mut self, at: Coord) -> &mut Cell {
        &mut self.cells[Self::index(at)]
    }

    pub fn get(&self, at: Coord) -> Result<&Cell, GridError> {
        let at = self.checked(at)?;
        Ok(self.cell(at))
    }

    pub fn get_mut(&mut self, at: Coord) -> Result<&mut Cell, GridError> {
        let at = self.checked(at)?;
        Ok(self.cell_mut(at))
    }

    pub fn feat(&self, at: Coord) -> Feat {
        self.cell(at).feat
    }

    pub fn has_flag(&self, at: Coord, flag: CellFlags) -> bool {
        self.cell(at).flags.contains(flag)
    }

    /// Record a trap detection over a rectangle; its outline becomes the edge
    pub fn mark_detected(&mut self, y1: i32, x1: i32, y2: i32, x2: i32) {
        for y in y1..=y2 {
            for x in x1..=x2 {
                let at = Coord::new(y, x);
                if !self.in_bounds(at) {
                    continue;
                }
                let flags = &mut self.cell_mut(at).flags;
                flags.insert(CellFlags::DETECTED);
                flags.set(CellFlags::TRAP_EDGE, y == y1 || y == y2 || x == x1 || x == x2);
            }
        }
    }

    /// Last grid of a detected area before undetected ground
    pub fn on_detect_edge(&self, at: Coord) -> bool {
        self.in_bounds(at) && self.has_flag(at, CellFlags::DETECTED | CellFlags::TRAP_EDGE)
    }

    pub fn feat_has(&self, at: Coord, flag: FeatFlags) -> bool {
        self.cell(at).feat.has(flag)
    }

    /// Terrain at `(y, x)` lets sight and projections through
    pub fn projects_at(&self, y: i32, x: i32) -> bool {
        self.cells[y as usize * DUNGEON_WID + x as usize].feat.projects()
    }

    /// Change the terrain of a grid
    ///
    /// Requests a view update when the grid is in view and a flow rebuild
    /// when noise permeability changed.
    pub fn set_feat(&mut self, at: Coord, feat: Feat) {
        let cell = self.cell_mut(at);
        let old = cell.feat;
        cell.set_feat(feat);
        let in_view = cell.flags.contains(CellFlags::VIEW);

        if in_view && old.projects() != feat.projects() {
            self.updates |= Update::VIEW;
        }
        if old.has(FeatFlags::NOISE) != feat.has(FeatFlags::NOISE) {
            self.updates |= Update::FLOW;
        }
    }

    /// Queue a deferred update
    pub fn request(&mut self, update: Update) {
        self.updates |= update;
    }

    pub fn pending(&self) -> Update {
        self.updates
    }

    /// Clear and return whether `update` was pending
    pub fn take_update(&mut self, update: Update) -> bool {
        let was = self.updates.intersects(update);
        self.updates.remove(update);
        was
    }

    /// Empty of occupants and open ground
    pub fn is_empty_floor(&self, at: Coord) -> bool {
        let cell = self.cell(at);
        cell.feat.is_floor() && !cell.is_occupied()
    }

    /// Can hold a new monster or object
    pub fn is_open(&self, at: Coord) -> bool {
        let cell = self.cell(at);
        cell.feat.is_passable() && !cell.feat.has(FeatFlags::FALL) && !cell.is_occupied()
    }

    // ========================================================================
    // Occupants
    // ========================================================================

    pub fn player_pos(&self) -> Option<Coord> {
        self.player
    }

    /// Put the player on a grid, moving them if already placed
    pub fn place_player(&mut self, at: Coord) -> Result<(), GridError> {
        let at = self.checked(at)?;
        if let Some(old) = self.player.take() {
            if self.cell(old).occupant() == Occupant::Player {
                self.cell_mut(old).occupant = 0;
            }
        }
        self.cell_mut(at).occupant = Occupant::Player.index();
        self.player = Some(at);
        self.updates |= Update::VIEW;
        Ok(())
    }

    /// Add a monster at its own position. Fails if the grid is taken.
    pub fn add_monster(&mut self, monster: Monster) -> Option<MonsterId> {
        let at = monster.pos;
        if !self.in_bounds(at) || self.cell(at).is_occupied() {
            return None;
        }

        // Reuse a dead slot before growing the list
        let slot = match self.monsters.iter().skip(1).position(Option::is_none) {
            Some(free) => free + 1,
            None => {
                if self.monsters.len() > i16::MAX as usize {
                    return None;
                }
                self.monsters.push(None);
                self.monsters.len() - 1
            }
        };

        self.monsters[slot] = Some(monster);
        let id = MonsterId(slot as u16);
        self.cell_mut(at).occupant = Occupant::Monster(id.0).index();
        Some(id)
    }

    pub fn monster(&self, id: MonsterId) -> Option<&Monster> {
        self.monsters.get(id.0 as usize)?.as_ref()
    }

    pub fn monster_mut(&mut self, id: MonsterId) -> Option<&mut Monster> {
        self.monsters.get_mut(id.0 as usize)?.as_mut()
    }

    pub fn monster_at(&self, at: Coord) -> Option<MonsterId> {
        match self.cell(at).occupant() {
            Occupant::Monster(idx) => Some(MonsterId(idx)),
            _ => None,
        }
    }

    /// Ids of all live monsters, in list order
    pub fn monster_ids(&self) -> Vec<MonsterId> {
        self.monsters
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, m)| m.is_some())
            .map(|(i, _)| MonsterId(i as u16))
            .collect()
    }

    pub fn monster_count(&self) -> usize {
        self.monsters.iter().filter(|m| m.is_some()).count()
    }

    /// Remove a monster from the level
    pub fn remove_monster(&mut self, id: MonsterId) -> Option<Monster> {
        let monster = self.monsters.get_mut(id.0 as usize)?.take()?;
        if self.in_bounds(monster.pos) && self.monster_at(monster.pos) == Some(id) {
            self.cell_mut(monster.pos).occupant = 0;
        }
        Some(monster)
    }

    /// Move a monster to an empty grid
    pub fn move_monster(&mut self, id: MonsterId, to: Coord) -> bool {
        if !self.in_bounds(to) || self.cell(to).is_occupied() {
            return false;
        }
        let Some(monster) = self.monster_mut(id) else {
            return false;
        };
        let from = monster.pos;
        monster.pos = to;
        self.cell_mut(from).occupant = 0;
        self.cell_mut(to).occupant = Occupant::Monster(id.0).index();
        true
    }

    /// Exchange whoever stands on two grids, fixing up positions
    pub fn swap_occupants(&mut self, a: Coord, b: Coord) {
        let occ_a = self.cell(a).occupant();
        let occ_b = self.cell(b).occupant();

        self.cell_mut(a).occupant = occ_b.index();
        self.cell_mut(b).occupant = occ_a.index();

        for (occ, to) in [(occ_a, b), (occ_b, a)] {
            match occ {
                Occupant::Monster(idx) => {
                    if let Some(monster) = self.monster_mut(MonsterId(idx)) {
                        monster.pos = to;
                    }
                }
                Occupant::Player => {
                    self.player = Some(to);
                    self.updates |= Update::VIEW;
                }
                Occupant::Empty => {}
            }
        }
    }

    /// Iterate over every coordinate of the level
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<> {
        (0..DUNGEON_HGT as i32)
            .flat_map(|y| (0..DUNGEON_WID as i32).map(move |x| Coord::new(y, x)))
    }

    /// All cells, row-major
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Text rendering of a rectangle, one line per row
    pub fn dump(&self, y1: i32, x1: i32, y2: i32, x2: i32) -> String {
        let mut out = String::new();
        for y in y1.max(0)..=y2.min(self.height() - 1) {
            for x in x1.max(0)..=x2.min(self.width() - 1) {
                let cell = self.cell(Coord::new(y, x));
                let ch = match cell.occupant() {
                    Occupant::Player => '@',
                    Occupant::Monster(_) => 'm',
                    Occupant::Empty => cell.feat.symbol(),
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monster::RaceId;

    #[test]
    fn test_bounds() {
        let cave = Cave::new();
        assert!(cave.in_bounds(Coord::new(0, 0)));
        assert!(!cave.in_bounds(Coord::new(-1, 0)));
        assert!(!cave.in_bounds(Coord::new(DUNGEON_HGT as i32, 0)));
        assert!(!cave.in_bounds_fully(Coord::new(0, 5)));
        assert!(cave.in_bounds_fully(Coord::new(1, 1)));
        assert!(cave.get(Coord::new(3, DUNGEON_WID as i32)).is_err());
        assert_eq!(
            cave.checked(Coord::new(-2, 3)),
            Err(GridError::OutOfBounds { y: -2, x: 3 })
        );
    }

    #[test]
    fn test_set_feat_requests_updates() {
        let mut cave = Cave::new();
        let at = Coord::new(5, 5);
        cave.set_feat(at, Feat::Floor);
        assert!(cave.take_update(Update::FLOW));
        assert!(!cave.pending().contains(Update::VIEW));

        cave.cell_mut(at).flags.insert(CellFlags::VIEW);
        cave.set_feat(at, Feat::Granite);
        assert!(cave.pending().contains(Update::VIEW));
        assert!(cave.cell(at).is_wall());

        cave.take_update(Update::VIEW | Update::FLOW);
        assert!(cave.pending().is_empty());
        cave.request(Update::FLOW);
        assert_eq!(cave.pending(), Update::FLOW);
    }

    #[test]
    fn test_monster_bookkeeping() {
        let mut cave = Cave::new();
        let a = Coord::new(4, 4);
        let b = Coord::new(4, 5);
        cave.set_feat(a, Feat::Floor);
        cave.set_feat(b, Feat::Floor);
        assert!(cave.is_empty_floor(a));

        let id = cave.add_monster(Monster::new(RaceId(0), a, 10)).unwrap();
        assert_eq!(id, MonsterId(1));
        assert_eq!(cave.monster_at(a), Some(id));
        assert!(!cave.is_empty_floor(a));

        // Grid already taken
        assert!(cave.add_monster(Monster::new(RaceId(0), a, 10)).is_none());

        assert!(cave.move_monster(id, b));
        assert_eq!(cave.monster_at(a), None);
        assert_eq!(cave.monster(id).unwrap().pos, b);

        cave.place_player(a).unwrap();
        cave.swap_occupants(a, b);
        assert_eq!(cave.player_pos(), Some(b));
        assert_eq!(cave.monster(id).unwrap().pos, a);

        let removed = cave.remove_monster(id).unwrap();
        assert_eq!(removed.pos, a);
        assert!(!cave.cell(a).is_occupied());

        // Slot is reused
        let again = cave.add_monster(Monster::new(RaceId(0), a, 10)).unwrap();
        assert_eq!(again, id);
        assert_eq!(cave.monster_ids(), vec![id]);
    }

    #[test]
    fn test_detected_area_edge() {
        let mut cave = Cave::new();
        cave.mark_detected(10, 10, 14, 20);
        assert!(cave.has_flag(Coord::new(12, 15), CellFlags::DETECTED));
        assert!(!cave.on_detect_edge(Coord::new(12, 15)));
        assert!(cave.on_detect_edge(Coord::new(10, 15)));
        assert!(cave.on_detect_edge(Coord::new(12, 20)));
        assert!(!cave.on_detect_edge(Coord::new(9, 15)));

        // A newer detection swallows the old edge
        cave.mark_detected(8, 8, 16, 22);
        assert!(!cave.on_detect_edge(Coord::new(10, 15)));
        assert!(cave.on_detect_edge(Coord::new(8, 15)));
    }

    #[test]
    fn test_dump() {
        let mut cave = Cave::new();
        cave.set_feat(Coord::new(1, 1), Feat::Floor);
        cave.place_player(Coord::new(1, 2)).unwrap();
        assert_eq!(cave.dump(0, 0, 1, 2), "###\n#.@\n");
    }
}
