//! Terrain entry model
//!
//! How likely a monster is to get into a grid this turn, and how: by
//! walking, by dealing with a door, or by shoving the occupant aside.

use crate::dungeon::{Cave, Coord, Feat, FeatFlags, Occupant};

use super::monst::Monster;
use super::race::{Race, RaceFlags, RaceTable};

/// How a monster gets through a closed door
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoorMethod {
    /// Plain closed door
    Open,
    Unlock,
    Bash,
}

/// What happens to a monster already standing on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Displace {
    Kill,
    Push,
}

/// Entry chance for one grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Entry {
    /// Percent chance of success (0 = impossible)
    pub chance: i32,
    pub door: Option<DoorMethod>,
    pub displace: Option<Displace>,
}

impl Entry {
    const BLOCKED: Entry = Entry {
        chance: 0,
        door: None,
        displace: None,
    };

    const fn open(chance: i32) -> Self {
        Entry {
            chance,
            door: None,
            displace: None,
        }
    }

    pub fn is_possible(&self) -> bool {
        self.chance > 0
    }
}

/// Hit points above which a flyer shrugs off lava heat
const TOUGH_FLYER_HP: i32 = 50;

/// Chance that a monster of `race` with `hp` hit points can enter `feat`
pub fn terrain_entry(race: &Race, hp: i32, feat: Feat) -> Entry {
    let flags = race.flags;

    if feat.is_permanent() {
        return Entry::BLOCKED;
    }

    if feat.is_closed_door() {
        if flags.contains(RaceFlags::PASS_WALL) {
            return Entry::open(100);
        }
        return door_entry(race, hp, feat);
    }

    if feat.is_wall() {
        return if race.through_walls() {
            Entry::open(100)
        } else {
            Entry::BLOCKED
        };
    }

    if feat.has(FeatFlags::RUBBLE) || feat.has(FeatFlags::TREE) {
        return if flags.contains(RaceFlags::PASS_WALL) {
            Entry::open(100)
        } else {
            Entry::open(50)
        };
    }

    if feat.has(FeatFlags::WATER) {
        let chance = if flags
            .intersects(RaceFlags::FLYING | RaceFlags::AQUATIC | RaceFlags::IM_WATER)
        {
            100
        } else if flags.contains(RaceFlags::AVOID_WATER) {
            0
        } else if flags.contains(RaceFlags::UNDEAD) {
            50
        } else if flags.contains(RaceFlags::HUMANOID) {
            80
        } else {
            100
        };
        return Entry::open(chance);
    }

    if feat.has(FeatFlags::LAVA) {
        let safe = flags.contains(RaceFlags::IM_FIRE)
            || (flags.contains(RaceFlags::FLYING) && hp >= TOUGH_FLYER_HP);
        return Entry::open(if safe { 100 } else { 0 });
    }

    if feat.has(FeatFlags::FALL) {
        return Entry::open(if flags.contains(RaceFlags::FLYING) { 100 } else { 0 });
    }

    if feat.is_passable() {
        Entry::open(100)
    } else {
        Entry::BLOCKED
    }
}

/// Pick the better of unlocking and bashing a closed door
fn door_entry(race: &Race, hp: i32, feat: Feat) -> Entry {
    let flags = race.flags;
    let power = feat.door_power();
    let locked = feat.has(FeatFlags::LOCKED);
    let jammed = feat.has(FeatFlags::JAMMED);

    // Unlocking: plain and secret doors just open
    let mut unlock = (0, DoorMethod::Unlock);
    if flags.contains(RaceFlags::OPEN_DOOR) && !jammed {
        unlock = if locked {
            let mut skill = race.level / 2 + 10;
            if flags.contains(RaceFlags::SMART) {
                skill += 10;
            }
            if flags.contains(RaceFlags::HUMANOID) {
                skill += 5;
            }
            (100 * skill / (skill + 10 * power), DoorMethod::Unlock)
        } else {
            (100, DoorMethod::Open)
        };
    }

    // Bashing
    let mut bash = 0;
    if flags.contains(RaceFlags::KILL_WALL) {
        bash = 100;
    } else if flags.contains(RaceFlags::BASH_DOOR) {
        let mut skill = race.level + hp.max(0) / 10;
        if flags.intersects(RaceFlags::GIANT | RaceFlags::TROLL) {
            skill += 20;
        }
        let strength = 20 + 10 * power;
        bash = 100 * skill / (skill + strength).max(1);
    }

    if unlock.0 == 0 && bash == 0 {
        return Entry::BLOCKED;
    }

    if unlock.0 >= bash {
        Entry {
            chance: unlock.0,
            door: Some(unlock.1),
            displace: None,
        }
    } else {
        Entry {
            chance: bash,
            door: Some(DoorMethod::Bash),
            displace: None,
        }
    }
}

/// Chance that `monster` can enter `at`, including occupancy
///
/// A grid holding another monster is only enterable by killing it
/// (`KILL_BODY`, strictly stronger) or pushing past it (`MOVE_BODY`, at
/// least as strong). The player's grid counts as enterable: stepping there
/// is an attack.
pub fn monster_entry(cave: &Cave, races: &RaceTable, monster: &Monster, at: Coord) -> Entry {
    if !cave.in_bounds(at) {
        return Entry::BLOCKED;
    }
    let Some(race) = races.get(monster.race) else {
        return Entry::BLOCKED;
    };

    let mut entry = terrain_entry(race, monster.hp, cave.feat(at));
    if !entry.is_possible() {
        return entry;
    }

    match cave.cell(at).occupant() {
        Occupant::Empty | Occupant::Player => entry,
        Occupant::Monster(_) if at == monster.pos => entry,
        Occupant::Monster(idx) => {
            let other_exp = cave
                .monster(super::MonsterId(idx))
                .and_then(|other| races.get(other.race))
                .map_or(i32::MAX, |r| r.exp);
            if race.has(RaceFlags::KILL_BODY) && race.exp > other_exp {
                entry.displace = Some(Displace::Kill);
            } else if race.has(RaceFlags::MOVE_BODY) && race.exp >= other_exp {
                entry.displace = Some(Displace::Push);
            } else {
                return Entry::BLOCKED;
            }
            entry
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn race(flags: RaceFlags) -> Race {
        Race {
            flags,
            ..Race::new("test", 10)
        }
    }

    #[test]
    fn test_walls_all_or_nothing() {
        let ghost = race(RaceFlags::PASS_WALL);
        let orc = race(RaceFlags::OPEN_DOOR | RaceFlags::BASH_DOOR);
        for feat in Feat::iter() {
            if feat.is_wall() && !feat.is_permanent() && !feat.is_door() {
                assert_eq!(terrain_entry(&ghost, 20, feat).chance, 100, "{feat}");
                assert_eq!(terrain_entry(&orc, 20, feat).chance, 0, "{feat}");
            }
            if feat.is_permanent() {
                assert_eq!(terrain_entry(&ghost, 20, feat).chance, 0);
            }
        }
    }

    #[test]
    fn test_floor_and_rubble() {
        let orc = race(RaceFlags::empty());
        assert_eq!(terrain_entry(&orc, 20, Feat::Floor).chance, 100);
        assert_eq!(terrain_entry(&orc, 20, Feat::Rubble).chance, 50);
        assert_eq!(terrain_entry(&orc, 20, Feat::Tree).chance, 50);
        assert_eq!(terrain_entry(&race(RaceFlags::PASS_WALL), 20, Feat::Rubble).chance, 100);
    }

    #[test]
    fn test_water_and_lava() {
        let plain = race(RaceFlags::empty());
        let human = race(RaceFlags::HUMANOID);
        let zombie = race(RaceFlags::HUMANOID | RaceFlags::UNDEAD);
        let fire = race(RaceFlags::AVOID_WATER | RaceFlags::IM_FIRE);
        let bat = race(RaceFlags::FLYING);

        assert_eq!(terrain_entry(&plain, 20, Feat::Water).chance, 100);
        assert_eq!(terrain_entry(&human, 20, Feat::Water).chance, 80);
        assert_eq!(terrain_entry(&zombie, 20, Feat::Water).chance, 50);
        assert_eq!(terrain_entry(&fire, 20, Feat::Water).chance, 0);
        assert_eq!(terrain_entry(&fire, 20, Feat::Lava).chance, 100);
        assert_eq!(terrain_entry(&plain, 20, Feat::Lava).chance, 0);
        assert_eq!(terrain_entry(&bat, 5, Feat::Lava).chance, 0);
        assert_eq!(terrain_entry(&bat, 80, Feat::Lava).chance, 100);
        assert_eq!(terrain_entry(&bat, 5, Feat::Void).chance, 100);
        assert_eq!(terrain_entry(&plain, 20, Feat::Void).chance, 0);
    }

    #[test]
    fn test_doors() {
        let orc = race(RaceFlags::OPEN_DOOR | RaceFlags::BASH_DOOR);
        let open = terrain_entry(&orc, 20, Feat::ClosedDoor);
        assert_eq!(open.chance, 100);
        assert_eq!(open.door, Some(DoorMethod::Open));

        let locked = terrain_entry(&orc, 20, Feat::LockedDoor7);
        assert!(locked.chance > 0 && locked.chance < 100);

        let jammed = terrain_entry(&orc, 20, Feat::JammedDoor3);
        assert_eq!(jammed.door, Some(DoorMethod::Bash));

        let rat = race(RaceFlags::empty());
        assert_eq!(terrain_entry(&rat, 20, Feat::ClosedDoor).chance, 0);

        // Smarter monsters pick locks better
        let dumb = terrain_entry(&race(RaceFlags::OPEN_DOOR), 20, Feat::LockedDoor4).chance;
        let smart = terrain_entry(
            &race(RaceFlags::OPEN_DOOR | RaceFlags::SMART | RaceFlags::HUMANOID),
            20,
            Feat::LockedDoor4,
        )
        .chance;
        assert!(smart > dumb);

        // Giants bash harder
        let weak = terrain_entry(&race(RaceFlags::BASH_DOOR), 20, Feat::JammedDoor7).chance;
        let giant = terrain_entry(
            &race(RaceFlags::BASH_DOOR | RaceFlags::GIANT),
            20,
            Feat::JammedDoor7,
        )
        .chance;
        assert!(giant > weak);
    }
}
