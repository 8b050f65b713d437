//! Level population
//!
//! The generator decides *where* things go; a [`Populator`] decides *what*.
//! The core has no item model, so objects, gold and traps are entirely the
//! embedder's business. [`SpeciesPopulator`] places monsters from a species
//! table and is enough to get a playable level.

use crate::consts::{MAX_SIGHT, MIN_M_ALLOC_LEVEL};
use crate::dungeon::{Cave, Coord};
use crate::monster::{Monster, MonsterId, RaceId, RaceTable};
use crate::rng::GameRng;

/// How much to scatter over a freshly generated level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopulationPlan {
    pub depth: i32,
    pub monsters: i32,
    pub objects: i32,
    pub gold: i32,
    pub traps: i32,
}

impl PopulationPlan {
    /// Standard amounts for a room-and-corridor level
    pub fn dungeon(depth: i32, rng: &mut GameRng) -> Self {
        Self {
            depth,
            monsters: MIN_M_ALLOC_LEVEL + rng.rnd(8),
            objects: rng.normal(9, 3).max(0),
            gold: rng.normal(3, 2).max(0),
            traps: rng.rnd(depth.max(0) / 3 + 3),
        }
    }

    /// Outdoor levels: more monsters the deeper the stage
    pub fn wilderness(depth: i32, rng: &mut GameRng) -> Self {
        Self {
            depth,
            monsters: MIN_M_ALLOC_LEVEL + depth.max(0) / 3 + rng.rnd(4),
            objects: rng.normal(4, 2).max(0),
            gold: rng.normal(2, 1).max(0),
            traps: rng.rnd(depth.max(0) / 6 + 1),
        }
    }
}

/// Places monsters, objects, gold and traps for the generator
///
/// Every method has a do-nothing default, so an implementation only
/// provides what its game has. The `place_*` methods return whether
/// something was actually placed.
pub trait Populator {
    fn place_monster(
        &mut self,
        _cave: &mut Cave,
        _at: Coord,
        _depth: i32,
        _asleep: bool,
        _rng: &mut GameRng,
    ) -> bool {
        false
    }

    fn place_object(
        &mut self,
        _cave: &mut Cave,
        _at: Coord,
        _depth: i32,
        _good: bool,
        _great: bool,
        _rng: &mut GameRng,
    ) -> bool {
        false
    }

    fn place_gold(&mut self, _cave: &mut Cave, _at: Coord, _depth: i32, _rng: &mut GameRng) -> bool {
        false
    }

    fn place_trap(&mut self, _cave: &mut Cave, _at: Coord, _depth: i32, _rng: &mut GameRng) -> bool {
        false
    }

    /// Vault grids marked with a letter want a monster with that symbol
    fn populate_vault_symbols(
        &mut self,
        _cave: &mut Cave,
        _spots: &[(Coord, char)],
        _depth: i32,
        _rng: &mut GameRng,
    ) {
    }

    /// Fill a nest or pit
    ///
    /// `ordered` pits are filled weakest at the edges, strongest at the center.
    fn populate_pit(
        &mut self,
        cave: &mut Cave,
        spots: &[Coord],
        depth: i32,
        ordered: bool,
        rng: &mut GameRng,
    ) {
        for (i, &at) in spots.iter().enumerate() {
            let boost = if ordered {
                (i as i32 * 10) / spots.len().max(1) as i32
            } else {
                rng.rn2(6)
            };
            self.place_monster(cave, at, depth + boost, true, rng);
        }
    }

    /// Scatter a whole level's worth of things
    ///
    /// Monsters start out of the player's sight where possible.
    fn populate_level(&mut self, cave: &mut Cave, plan: &PopulationPlan, rng: &mut GameRng) {
        for _ in 0..plan.monsters {
            if let Some(at) = random_spot(cave, true, rng) {
                self.place_monster(cave, at, plan.depth, true, rng);
            }
        }
        for _ in 0..plan.objects {
            if let Some(at) = random_spot(cave, false, rng) {
                self.place_object(cave, at, plan.depth, false, false, rng);
            }
        }
        for _ in 0..plan.gold {
            if let Some(at) = random_spot(cave, false, rng) {
                self.place_gold(cave, at, plan.depth, rng);
            }
        }
        for _ in 0..plan.traps {
            if let Some(at) = random_spot(cave, false, rng) {
                self.place_trap(cave, at, plan.depth, rng);
            }
        }
    }
}

/// Populator that places nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPopulator;

impl Populator for NullPopulator {}

/// Populator that draws monsters from a species table
#[derive(Debug, Clone)]
pub struct SpeciesPopulator<'a> {
    races: &'a RaceTable,
    /// Everything placed so far
    pub placed: Vec<MonsterId>,
}

impl<'a> SpeciesPopulator<'a> {
    pub fn new(races: &'a RaceTable) -> Self {
        Self {
            races,
            placed: Vec::new(),
        }
    }

    /// Pick a species no deeper than `depth`, optionally by symbol
    fn pick_race(&self, depth: i32, symbol: Option<char>, rng: &mut GameRng) -> Option<RaceId> {
        let matching: Vec<RaceId> = self
            .races
            .iter()
            .filter(|(_, race)| symbol.is_none_or(|ch| race.symbol == ch))
            .filter(|(_, race)| race.level <= depth.max(1))
            .map(|(id, _)| id)
            .collect();
        if let Some(&id) = rng.choose(&matching) {
            return Some(id);
        }

        // Nothing shallow enough: take the shallowest that matches
        self.races
            .iter()
            .filter(|(_, race)| symbol.is_none_or(|ch| race.symbol == ch))
            .min_by_key(|(_, race)| race.level)
            .map(|(id, _)| id)
    }

    fn spawn(
        &mut self,
        cave: &mut Cave,
        at: Coord,
        race_id: RaceId,
        asleep: bool,
        rng: &mut GameRng,
    ) -> bool {
        let Some(race) = self.races.get(race_id) else {
            return false;
        };
        if !cave.in_bounds(at) || !cave.is_open(at) {
            return false;
        }
        let monster = Monster::spawn(race_id, race, at, asleep, rng);
        match cave.add_monster(monster) {
            Some(id) => {
                self.placed.push(id);
                true
            }
            None => false,
        }
    }
}

impl Populator for SpeciesPopulator<'_> {
    fn place_monster(
        &mut self,
        cave: &mut Cave,
        at: Coord,
        depth: i32,
        asleep: bool,
        rng: &mut GameRng,
    ) -> bool {
        match self.pick_race(depth, None, rng) {
            Some(race) => self.spawn(cave, at, race, asleep, rng),
            None => false,
        }
    }

    fn populate_vault_symbols(
        &mut self,
        cave: &mut Cave,
        spots: &[(Coord, char)],
        depth: i32,
        rng: &mut GameRng,
    ) {
        for &(at, symbol) in spots {
            if let Some(race) = self.pick_race(depth + 10, Some(symbol), rng) {
                self.spawn(cave, at, race, true, rng);
            }
        }
    }
}

/// A random open grid, optionally out of the player's sight
pub(crate) fn random_spot(cave: &Cave, hidden: bool, rng: &mut GameRng) -> Option<Coord> {
    for _ in 0..1000 {
        let at = Coord::new(
            1 + rng.rn2(cave.height() - 2),
            1 + rng.rn2(cave.width() - 2),
        );
        if !cave.is_open(at) || cave.cell(at).is_icky() {
            continue;
        }
        if hidden
            && let Some(player) = cave.player_pos()
            && at.chebyshev(player) <= MAX_SIGHT
            && cave.los(player, at)
        {
            continue;
        }
        return Some(at);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::Feat;
    use crate::monster::Race;

    fn races() -> RaceTable {
        let mut races = RaceTable::new();
        let mut orc = Race::new("cave orc", 7);
        orc.symbol = 'o';
        races.push(orc);
        let mut rat = Race::new("giant rat", 1);
        rat.symbol = 'r';
        races.push(rat);
        races
    }

    #[test]
    fn test_null_populator_places_nothing() {
        let mut cave = Cave::new();
        let mut rng = GameRng::new(1);
        cave.fill_rect(1, 1, 30, 60, Feat::Floor);
        let plan = PopulationPlan::dungeon(10, &mut rng);
        NullPopulator.populate_level(&mut cave, &plan, &mut rng);
        assert_eq!(cave.monster_count(), 0);
    }

    #[test]
    fn test_species_populator_respects_depth() {
        let races = races();
        let mut cave = Cave::new();
        let mut rng = GameRng::new(2);
        cave.fill_rect(1, 1, 30, 60, Feat::Floor);

        let mut populator = SpeciesPopulator::new(&races);
        for x in 2..20 {
            assert!(populator.place_monster(&mut cave, Coord::new(5, x), 2, false, &mut rng));
        }
        for &id in &populator.placed {
            let monster = cave.monster(id).unwrap();
            assert_eq!(races.get(monster.race).unwrap().symbol, 'r');
        }
        // Occupied grids are refused
        assert!(!populator.place_monster(&mut cave, Coord::new(5, 2), 2, false, &mut rng));
    }

    #[test]
    fn test_vault_symbols_pick_matching_species() {
        let races = races();
        let mut cave = Cave::new();
        let mut rng = GameRng::new(3);
        cave.fill_rect(1, 1, 30, 60, Feat::Floor);

        let mut populator = SpeciesPopulator::new(&races);
        let spots = [(Coord::new(4, 4), 'o'), (Coord::new(4, 6), 'o'), (Coord::new(4, 8), 'z')];
        populator.populate_vault_symbols(&mut cave, &spots, 1, &mut rng);
        assert_eq!(cave.monster_count(), 2);
        let id = cave.monster_at(Coord::new(4, 4)).unwrap();
        assert_eq!(races.get(cave.monster(id).unwrap().race).unwrap().symbol, 'o');
    }

    #[test]
    fn test_populate_level_hides_monsters() {
        let races = races();
        let mut cave = Cave::new();
        let mut rng = GameRng::new(4);
        cave.fill_rect(1, 1, 60, 190, Feat::Floor);
        let player = Coord::new(30, 100);
        cave.place_player(player).unwrap();

        let plan = PopulationPlan::wilderness(5, &mut rng);
        let mut populator = SpeciesPopulator::new(&races);
        populator.populate_level(&mut cave, &plan, &mut rng);

        assert_eq!(populator.placed.len() as i32, plan.monsters);
        for &id in &populator.placed {
            let pos = cave.monster(id).unwrap().pos;
            assert!(pos.chebyshev(player) > MAX_SIGHT);
        }
    }
}
