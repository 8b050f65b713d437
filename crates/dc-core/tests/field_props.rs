use std::collections::VecDeque;

use dc_core::dungeon::{Cave, CellFlags, Coord, Feat, FeatFlags, NullSink, DDD};
use dc_core::monster::movement::follow_scent;
use dc_core::monster::{Monster, Race, RaceId};
use dc_core::{PlayerState, SimOptions, NOISE_CENTER_COST, NOISE_STRENGTH};
use proptest::collection::vec;
use proptest::prelude::*;

const ORIGIN: i32 = 2;
const SIDE: i32 = 24;
const AREA: usize = (SIDE * SIDE) as usize;

fn walled(pattern: &[u8], keep_open: Coord) -> Cave {
    let mut cave = Cave::new();
    cave.fill_rect(ORIGIN, ORIGIN, ORIGIN + SIDE - 1, ORIGIN + SIDE - 1, Feat::Floor);
    for (i, &roll) in pattern.iter().enumerate() {
        let i = i as i32;
        let at = Coord::new(ORIGIN + i / SIDE, ORIGIN + i % SIDE);
        if roll < 3 && at != keep_open {
            cave.set_feat(at, Feat::Granite);
        }
    }
    cave
}

fn grid() -> impl Strategy<Value = Coord> {
    (0..SIDE, 0..SIDE).prop_map(|(y, x)| Coord::new(ORIGIN + y, ORIGIN + x))
}

/// Steps from `from` through sound-carrying terrain
fn sound_steps(cave: &Cave, from: Coord) -> Vec<Option<i32>> {
    let width = cave.width() as usize;
    let index = |at: Coord| at.y as usize * width + at.x as usize;
    let mut steps = vec![None; cave.cells().len()];
    steps[index(from)] = Some(0);

    let mut queue = VecDeque::from([from]);
    while let Some(at) = queue.pop_front() {
        let Some(here) = steps[index(at)] else {
            continue;
        };
        for dir in DDD {
            let next = at.step(dir);
            if !cave.in_bounds(next) || !cave.feat_has(next, FeatFlags::NOISE) {
                continue;
            }
            if steps[index(next)].is_none() {
                steps[index(next)] = Some(here + 1);
                queue.push_back(next);
            }
        }
    }
    steps
}

#[test]
fn test_noise_scenario() {
    let mut cave = Cave::new();
    cave.fill_rect(1, 1, 20, 20, Feat::Floor);
    let player = Coord::new(10, 10);
    cave.update_noise(player);

    assert_eq!(cave.noise_cost(player), Some(NOISE_CENTER_COST));
    let next = cave.noise_cost(Coord::new(10, 11)).unwrap();
    assert!(next > NOISE_CENTER_COST);
    assert!(next <= NOISE_CENTER_COST + NOISE_STRENGTH);
}

#[test]
fn test_scent_trail_leads_to_player() {
    let mut cave = Cave::new();
    cave.fill_rect(1, 1, 20, 30, Feat::Floor);
    for x in 10..=12 {
        cave.update_scent(Coord::new(10, x));
    }

    let hound = Race::new("jackal", 1);
    let mon = Monster::new(RaceId(0), Coord::new(10, 10), 8);
    let next = follow_scent(&cave, &mon, &hound).expect("trail is fresh");
    assert_eq!(next.x, 11);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn seen_grids_are_always_in_view(
        pattern in vec(0u8..10, AREA),
        start in grid(),
        end in grid(),
        light in 0i32..4,
        lit_room in any::<bool>(),
        blind in any::<bool>(),
    ) {
        let mut cave = walled(&pattern, start);
        cave.set_feat(end, Feat::Floor);
        if lit_room {
            cave.glow_rect(ORIGIN, ORIGIN, ORIGIN + SIDE - 1, ORIGIN + SIDE - 1);
        }

        let opts = SimOptions::default();
        let mut player = PlayerState::new(start, 10);
        player.light_radius = light;
        player.blind = u16::from(blind);

        for pos in [start, end] {
            player.pos = pos;
            cave.place_player(pos).unwrap();
            cave.update_view(&player, &opts, &mut NullSink);
            for at in cave.coords() {
                if cave.has_flag(at, CellFlags::SEEN) {
                    prop_assert!(cave.has_flag(at, CellFlags::VIEW), "{:?}", at);
                }
            }
            prop_assert!(cave.player_has_los(pos));
        }
    }

    #[test]
    fn noise_cost_grows_one_step_at_a_time(pattern in vec(0u8..10, AREA), player in grid()) {
        let mut cave = walled(&pattern, player);
        // A sealed pocket the flood must never reach
        cave.fill_rect(40, 40, 44, 44, Feat::Granite);
        cave.set_feat(Coord::new(42, 42), Feat::Floor);

        cave.update_noise(player);
        let steps = sound_steps(&cave, player);
        for (at, reach) in cave.coords().zip(steps) {
            let expected = reach
                .filter(|&d| d <= NOISE_STRENGTH)
                .map(|d| NOISE_CENTER_COST + d);
            prop_assert_eq!(cave.noise_cost(at), expected, "{:?}", at);
        }
        prop_assert_eq!(cave.noise_cost(Coord::new(42, 42)), None);
    }

    #[test]
    fn scent_follower_picks_the_freshest_neighbour(rolls in vec(0u8..=50, 9)) {
        let mut cave = Cave::new();
        cave.fill_rect(1, 1, 20, 20, Feat::Floor);
        let here = Coord::new(10, 10);

        // 0 leaves no scent; anything else is a stamp against the initial epoch
        let stamp = |roll: u8| if roll == 0 { 0 } else { 199 + roll };
        cave.cell_mut(here).scent = stamp(rolls[8]);
        for (dir, &roll) in DDD.iter().zip(&rolls) {
            cave.cell_mut(here.step(*dir)).scent = stamp(roll);
        }

        let race = Race::new("hound", 10);
        let mon = Monster::new(RaceId(0), here, 20);
        let own = cave.scent_age(here).unwrap_or(i32::MAX);
        let freshest = DDD
            .iter()
            .filter_map(|&dir| cave.scent_age(here.step(dir)))
            .filter(|&age| age < race.smell && age < own)
            .min();

        match (follow_scent(&cave, &mon, &race), freshest) {
            (Some(at), Some(best)) => prop_assert_eq!(cave.scent_age(at), Some(best)),
            (None, None) => {}
            (got, want) => prop_assert!(false, "picked {:?}, freshest age {:?}", got, want),
        }
    }
}
