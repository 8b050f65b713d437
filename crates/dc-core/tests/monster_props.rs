use dc_core::dungeon::{Cave, Coord, Feat, NullSink};
use dc_core::monster::{terrain_entry, Monster, Race, RaceFlags, RaceTable, TurnOutcome};
use dc_core::{process_world_turn, GameRng, PlayerState, SimOptions};
use proptest::prelude::*;
use strum::IntoEnumIterator;

fn diggable_walls() -> Vec<Feat> {
    Feat::iter()
        .filter(|feat| feat.is_wall() && !feat.is_permanent() && !feat.is_door())
        .collect()
}

#[test]
fn test_monsters_close_in_over_several_turns() {
    let mut cave = Cave::new();
    cave.fill_rect(1, 1, 30, 60, Feat::Floor);
    let player = PlayerState::new(Coord::new(15, 40), 10);
    let mut races = RaceTable::new();
    let orc = races.push(Race::new("cave orc", 30));
    let id = cave.add_monster(Monster::new(orc, Coord::new(15, 30), 40)).unwrap();

    let opts = SimOptions::default();
    let mut rng = GameRng::new(7);
    let mut attacked = false;
    for turn in 0..20 {
        let report = process_world_turn(&mut cave, &player, &races, &opts, turn, &mut rng, &mut NullSink);
        if report.attacks().any(|(who, at)| who == id && at == player.pos) {
            attacked = true;
            break;
        }
    }
    assert!(attacked);
    let pos = cave.monster(id).unwrap().pos;
    assert!(pos.is_adjacent(player.pos));
}

proptest! {
    #[test]
    fn wall_entry_is_all_or_nothing(bits in any::<u64>(), hp in 1i32..500) {
        let flags = RaceFlags::from_bits_truncate(bits) - RaceFlags::PASS_WALL - RaceFlags::KILL_WALL;
        let walker = Race { flags, ..Race::new("walker", 10) };
        let ghost = Race { flags: flags | RaceFlags::PASS_WALL, ..Race::new("ghost", 10) };

        for feat in diggable_walls() {
            prop_assert_eq!(terrain_entry(&ghost, hp, feat).chance, 100, "{}", feat);
            prop_assert_eq!(terrain_entry(&walker, hp, feat).chance, 0, "{}", feat);
        }
    }

    #[test]
    fn every_monster_reports_once_per_turn(seed in any::<u64>(), count in 1usize..8) {
        let mut cave = Cave::new();
        cave.fill_rect(1, 1, 30, 60, Feat::Floor);
        let player = PlayerState::new(Coord::new(15, 30), 10);
        let mut races = RaceTable::new();
        let rat = races.push(Race::new("rat", 2));

        let mut rng = GameRng::new(seed);
        let mut ids = Vec::new();
        for i in 0..count {
            let at = Coord::new(5 + 2 * i as i32, 5 + rng.rn2(20));
            if let Some(id) = cave.add_monster(Monster::new(rat, at, 10)) {
                ids.push(id);
            }
        }

        let opts = SimOptions::default();
        let report = process_world_turn(&mut cave, &player, &races, &opts, 1, &mut rng, &mut NullSink);
        let reported: Vec<_> = report.outcomes.iter().map(|&(id, _)| id).collect();
        prop_assert_eq!(reported, ids);
        for (_, outcome) in &report.outcomes {
            prop_assert!(!matches!(outcome, TurnOutcome::Died));
        }
    }
}
