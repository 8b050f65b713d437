//! Monster movement
//!
//! Range preferences, the where-to-go decision (attack, advance, retreat,
//! hide) and turning a goal grid into a single step.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::consts::{FLEE_RANGE, HIDE_RADIUS, MAX_RANGE, MAX_SIGHT, TURN_RANGE};
use crate::dungeon::{Cave, Coord, ProjectFlags, Projection, DDD, direction_of, distance};
use crate::options::SimOptions;
use crate::player::PlayerState;
use crate::rng::GameRng;

use super::monst::Monster;
use super::passable::{Entry, monster_entry};
use super::race::{Race, RaceFlags, RaceTable};
use super::spells::SpellKind;

/// Where the monster wants to go this turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlan {
    /// Stay put
    Hold,
    /// Melee the player
    Attack,
    /// Close in on a grid
    Advance(Coord),
    /// Get away, toward a grid
    Retreat(Coord),
}

/// A chosen step and how the grid will be entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub to: Coord,
    pub entry: Entry,
}

/// Step order per direction: rows 1-9 lean right, rows 11-19 lean left
const SIDE_DIRS: [[u8; 8]; 20] = [
    [0; 8],
    [1, 4, 2, 7, 3, 8, 6, 9],
    [2, 1, 3, 4, 6, 7, 9, 8],
    [3, 2, 6, 1, 9, 4, 8, 7],
    [4, 7, 1, 8, 2, 9, 3, 6],
    [5, 5, 5, 5, 5, 5, 5, 5],
    [6, 3, 9, 2, 8, 1, 7, 4],
    [7, 8, 4, 9, 1, 6, 2, 3],
    [8, 9, 7, 6, 4, 3, 1, 2],
    [9, 6, 8, 3, 7, 2, 4, 1],
    [0; 8],
    [1, 2, 4, 3, 7, 6, 8, 9],
    [2, 3, 1, 6, 4, 9, 7, 8],
    [3, 6, 2, 9, 1, 8, 4, 7],
    [4, 1, 7, 2, 8, 3, 9, 6],
    [5, 5, 5, 5, 5, 5, 5, 5],
    [6, 9, 3, 8, 2, 7, 1, 4],
    [7, 4, 8, 1, 9, 2, 6, 3],
    [8, 7, 9, 4, 6, 1, 3, 2],
    [9, 8, 6, 7, 3, 4, 2, 1],
];

/// Whether the monster can see the player from where it stands
pub fn sees_player(cave: &Cave, mon: &Monster, player: &PlayerState) -> bool {
    mon.pos.chebyshev(player.pos) <= MAX_SIGHT && cave.los(mon.pos, player.pos)
}

// ============================================================================
// Range preferences
// ============================================================================

/// Work out how close the monster wants to be
///
/// Sets `min_range` (closer than this and it backs off; `FLEE_RANGE` means
/// it is running) and `best_range` (the distance it tries to hold).
pub fn find_range(mon: &mut Monster, race: &Race, player: &PlayerState) {
    if mon.is_afraid() {
        mon.min_range = FLEE_RANGE;
    } else {
        mon.min_range = 1;

        let m_lev = race.level + mon.morale + 25;
        let p_lev = player.level;

        if m_lev + 3 < p_lev {
            mon.min_range = FLEE_RANGE;
        } else if m_lev - 5 < p_lev {
            // Close match: compare level weighted by health
            let p_val = p_lev * player.max_hp + (player.hp << 2);
            let m_val = m_lev * mon.max_hp + (mon.hp << 2);
            if i64::from(p_val) * i64::from(mon.max_hp)
                > i64::from(m_val) * i64::from(player.max_hp)
            {
                mon.min_range = FLEE_RANGE;
            }
        }

        if mon.min_range < FLEE_RANGE {
            if race.has(RaceFlags::NEVER_MOVE) {
                mon.min_range += 3;
            }
            if race.has(RaceFlags::NEVER_BLOW) {
                mon.min_range += 3;
            }
        }
    }

    // Cornered and slower than the player
    if mon.min_range == FLEE_RANGE && mon.cdis < TURN_RANGE && mon.speed < player.speed {
        mon.min_range = 1;
    }

    mon.min_range = mon.min_range.min(FLEE_RANGE);
    mon.best_range = mon.min_range;

    if race.freq_ranged > 24 {
        if race.spells.has_kind(SpellKind::Breath) && mon.hp > mon.max_hp / 2 {
            mon.best_range = mon.best_range.max(6);
        } else {
            mon.best_range += 3;
        }
    }
    if race.has(RaceFlags::ARCHER) {
        mon.best_range += 3;
    }
    mon.best_range = mon.best_range.min(MAX_RANGE);
}

// ============================================================================
// Where to go
// ============================================================================

/// Decide where a monster goes this turn
///
/// May update the monster's cached ranges, fear and target.
pub fn get_move(
    cave: &Cave,
    mon: &mut Monster,
    race: &Race,
    player: &PlayerState,
    opts: &SimOptions,
    rng: &mut GameRng,
) -> MovePlan {
    if mon.min_range == 0 || mon.best_range == 0 {
        find_range(mon, race, player);
    }

    let in_los = sees_player(cave, mon, player);
    if in_los {
        mon.target = Some(player.pos);
    }
    let adjacent = mon.pos.is_adjacent(player.pos);

    if race.has(RaceFlags::NEVER_MOVE) {
        return if adjacent && !race.has(RaceFlags::NEVER_BLOW) {
            MovePlan::Attack
        } else {
            MovePlan::Hold
        };
    }

    if mon.min_range == FLEE_RANGE {
        // A faster monster right next to the player may reconsider
        if mon.cdis < TURN_RANGE && mon.speed > player.speed {
            mon.calm();
            find_range(mon, race, player);
        }
        if mon.min_range == FLEE_RANGE {
            if mon.cdis >= FLEE_RANGE {
                return MovePlan::Hold;
            }
            return retreat(cave, mon, player, in_los);
        }
    }

    if adjacent && !race.has(RaceFlags::NEVER_BLOW) {
        return MovePlan::Attack;
    }

    if race.has(RaceFlags::FRIENDS) {
        if let Some(plan) = pack_move(cave, mon, race, player, in_los) {
            return plan;
        }
    }

    if race.through_walls() {
        return MovePlan::Advance(player.pos);
    }

    if !in_los {
        return advance(cave, mon, race, opts, rng);
    }

    let projection = cave.can_project(mon.pos, player.pos, ProjectFlags::empty());
    if projection == Projection::No || mon.cdis > mon.best_range {
        return MovePlan::Advance(player.pos);
    }
    if mon.cdis > mon.min_range {
        return if rng.one_in(2) {
            MovePlan::Advance(player.pos)
        } else {
            MovePlan::Hold
        };
    }
    if mon.cdis < mon.min_range {
        return retreat(cave, mon, player, in_los);
    }

    if race.flags.intersects(RaceFlags::RAND_25 | RaceFlags::RAND_50) {
        let dir = DDD[rng.rn2(8) as usize];
        return MovePlan::Advance(mon.pos.step(dir));
    }
    MovePlan::Hold
}

/// Pick a retreat: a hiding place, a last stand, or straight away
fn retreat(cave: &Cave, mon: &mut Monster, player: &PlayerState, in_los: bool) -> MovePlan {
    if in_los {
        if let Some(hide) = find_hiding(cave, mon.pos, player.pos) {
            return MovePlan::Retreat(hide);
        }
        if mon.cdis < TURN_RANGE {
            // Nowhere to go: turn and fight
            mon.calm();
            mon.min_range = 1;
            mon.best_range = 1;
            return if mon.pos.is_adjacent(player.pos) {
                MovePlan::Attack
            } else {
                MovePlan::Advance(player.pos)
            };
        }
    }

    let sy = (mon.pos.y - player.pos.y).signum();
    let sx = (mon.pos.x - player.pos.x).signum();
    MovePlan::Retreat(mon.pos.offset(sy * 3, sx * 3))
}

/// Group tactics: pack charges, shadowing and flanking
fn pack_move(
    cave: &Cave,
    mon: &Monster,
    race: &Race,
    player: &PlayerState,
    in_los: bool,
) -> Option<MovePlan> {
    if race.has(RaceFlags::ANIMAL) {
        if mon.hp < mon.max_hp || race.through_walls() {
            return None;
        }

        let open = DDD
            .iter()
            .map(|&d| player.pos.step(d))
            .filter(|&at| cave.in_bounds(at) && cave.feat(at).is_passable())
            .count();
        let needed = if player.hp_percent() < 25 { 3 } else { 6 };
        if open >= needed {
            return Some(MovePlan::Advance(player.pos));
        }

        // The player holds a corridor: wait out of sight
        if in_los {
            if let Some(hide) = find_hiding(cave, mon.pos, player.pos) {
                return Some(MovePlan::Retreat(hide));
            }
        }
        return Some(MovePlan::Hold);
    }

    if !in_los || !(2..=3).contains(&mon.cdis) {
        return None;
    }

    // Fan out to a free grid beside the player rather than queueing
    DDD.iter()
        .map(|&d| player.pos.step(d))
        .filter(|&at| cave.in_bounds(at) && cave.is_open(at) && at != mon.pos)
        .min_by_key(|&at| distance(mon.pos, at))
        .map(MovePlan::Advance)
}

/// Head for the player without seeing them
fn advance(
    cave: &Cave,
    mon: &mut Monster,
    race: &Race,
    opts: &SimOptions,
    rng: &mut GameRng,
) -> MovePlan {
    if let Some(target) = mon.target {
        if target != mon.pos {
            return MovePlan::Advance(target);
        }
        mon.target = None;
    }

    if let Some(at) = follow_noise(cave, mon, race, opts) {
        return MovePlan::Advance(at);
    }
    if let Some(at) = follow_scent(cave, mon, race) {
        return MovePlan::Advance(at);
    }

    let dir = DDD[rng.rn2(8) as usize];
    MovePlan::Advance(mon.pos.step(dir))
}

/// Adjacent grid with the lowest noise cost, if the monster can hear the
/// player at all
pub fn follow_noise(cave: &Cave, mon: &Monster, race: &Race, opts: &SimOptions) -> Option<Coord> {
    let here = cave.noise_cost(mon.pos)?;
    let heard = cave.noise_distance(mon.pos)?;
    if heard > race.hearing + opts.monster_flow_depth {
        return None;
    }

    let mut best: Option<(i32, Coord)> = None;
    for &dir in &DDD {
        let at = mon.pos.step(dir);
        if !cave.in_bounds(at) {
            continue;
        }
        let Some(cost) = cave.noise_cost(at) else {
            continue;
        };
        if cost >= here {
            continue;
        }
        if best.is_none_or(|(top, _)| cost < top) {
            best = Some((cost, at));
        }
    }
    best.map(|(_, at)| at)
}

/// Adjacent grid with strictly younger scent than the monster's own
pub fn follow_scent(cave: &Cave, mon: &Monster, race: &Race) -> Option<Coord> {
    let here = cave.scent_age(mon.pos).unwrap_or(i32::MAX);

    let mut best: Option<(i32, Coord)> = None;
    for &dir in &DDD {
        let at = mon.pos.step(dir);
        if !cave.in_bounds(at) {
            continue;
        }
        let Some(age) = cave.scent_age(at) else {
            continue;
        };
        if age >= race.smell || age >= here {
            continue;
        }
        if best.is_none_or(|(top, _)| age < top) {
            best = Some((age, at));
        }
    }
    best.map(|(_, at)| at)
}

/// Nearest hiding place from `from`, out of the player's sight
///
/// Floods passable terrain within `HIDE_RADIUS`, charging extra for steps
/// toward the player. A hiding place must have an escape route (two or
/// more passable neighbours) and must not touch the player.
pub fn find_hiding(cave: &Cave, from: Coord, player: Coord) -> Option<Coord> {
    let side = (HIDE_RADIUS * 2 + 1) as usize;
    let index = |at: Coord| -> Option<usize> {
        let dy = at.y - from.y + HIDE_RADIUS;
        let dx = at.x - from.x + HIDE_RADIUS;
        if dy < 0 || dx < 0 || dy >= side as i32 || dx >= side as i32 {
            return None;
        }
        Some(dy as usize * side + dx as usize)
    };

    let mut cost = vec![i32::MAX; side * side];
    let mut queue = BinaryHeap::new();
    cost[index(from)?] = 0;
    queue.push(Reverse((0, from.y, from.x)));

    let mut best: Option<(i32, Coord)> = None;

    while let Some(Reverse((c, y, x))) = queue.pop() {
        let at = Coord::new(y, x);
        let Some(i) = index(at) else { continue };
        if c > cost[i] {
            continue;
        }
        if best.is_some_and(|(top, _)| c >= top) {
            break;
        }

        if at != from && is_hiding_place(cave, at, player) {
            best = Some((c, at));
            continue;
        }

        for &dir in &DDD {
            let next = at.step(dir);
            let Some(j) = index(next) else { continue };
            if !cave.in_bounds(next) || !cave.feat(next).is_passable() {
                continue;
            }
            if next == player || cave.cell(next).is_occupied() {
                continue;
            }
            let mut step = 1;
            if distance(next, player) < distance(at, player) {
                step += 2;
            }
            let nc = c + step;
            if nc < cost[j] {
                cost[j] = nc;
                queue.push(Reverse((nc, next.y, next.x)));
            }
        }
    }

    best.map(|(_, at)| at)
}

fn is_hiding_place(cave: &Cave, at: Coord, player: Coord) -> bool {
    if cave.cell(at).is_occupied() || at.chebyshev(player) <= 1 {
        return false;
    }
    if at.chebyshev(player) <= MAX_SIGHT && cave.los(player, at) {
        return false;
    }
    let exits = DDD
        .iter()
        .map(|&d| at.step(d))
        .filter(|&n| cave.in_bounds(n) && cave.feat(n).is_passable())
        .count();
    exits >= 2
}

// ============================================================================
// Choosing a step
// ============================================================================

/// Turn a goal grid into one step
///
/// Confused monsters lurch in a random direction and take it whatever is
/// there; the caller handles bumping into things. Returns `None` when no
/// neighbour can be entered.
pub fn choose_step(
    cave: &Cave,
    races: &RaceTable,
    mon: &Monster,
    goal: Coord,
    turn: u64,
    rng: &mut GameRng,
) -> Option<Step> {
    if mon.confused > 0 {
        let to = mon.pos.step(DDD[rng.rn2(8) as usize]);
        if !cave.in_bounds(to) {
            return None;
        }
        return Some(Step {
            to,
            entry: monster_entry(cave, races, mon, to),
        });
    }

    if goal == mon.pos {
        return None;
    }

    if mon.pos.is_adjacent(goal) {
        let entry = monster_entry(cave, races, mon, goal);
        return entry.is_possible().then_some(Step { to: goal, entry });
    }

    let dy = goal.y - mon.pos.y;
    let dx = goal.x - mon.pos.x;
    let ay = dy.abs();
    let ax = dx.abs();

    // Pick the dominant axis, or a diagonal
    let (dy, dx) = if ay > ax * 2 {
        (dy, 0)
    } else if ax > ay * 2 {
        (0, dx)
    } else {
        (dy, dx)
    };
    let mut row = direction_of(dy, dx) as usize;
    if turn & 1 == 1 {
        row += 10;
    }

    let mut best: Option<Step> = None;
    for (i, &dir) in SIDE_DIRS[row].iter().enumerate() {
        let to = mon.pos.step(dir);
        let entry = monster_entry(cave, races, mon, to);
        if !entry.is_possible() {
            continue;
        }

        let good_enough = match i {
            0 | 1 => 50,
            2..=4 => 80,
            _ => 101,
        };
        if entry.chance >= good_enough {
            return Some(Step { to, entry });
        }
        if best.is_none_or(|b| entry.chance > b.entry.chance) {
            best = Some(Step { to, entry });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::Feat;
    use crate::monster::RaceId;

    fn arena() -> Cave {
        let mut cave = Cave::new();
        cave.fill_rect(5, 5, 25, 45, Feat::Floor);
        cave
    }

    fn setup(race: Race) -> (RaceTable, Monster) {
        let mut races = RaceTable::new();
        let id = races.push(race);
        let mon = Monster::new(id, Coord::new(10, 10), 30);
        (races, mon)
    }

    #[test]
    fn test_find_range_weak_monster_flees() {
        let race = Race::new("kobold", 1);
        let mut mon = Monster::new(RaceId(0), Coord::new(10, 10), 5);
        mon.cdis = 10;
        let player = PlayerState::new(Coord::new(10, 20), 40);
        find_range(&mut mon, &race, &player);
        assert_eq!(mon.min_range, FLEE_RANGE);
    }

    #[test]
    fn test_find_range_strong_monster_closes() {
        let race = Race::new("dragon", 40);
        let mut mon = Monster::new(RaceId(0), Coord::new(10, 10), 300);
        mon.cdis = 10;
        let player = PlayerState::new(Coord::new(10, 20), 5);
        find_range(&mut mon, &race, &player);
        assert_eq!(mon.min_range, 1);
        assert_eq!(mon.best_range, 1);
    }

    #[test]
    fn test_find_range_archer_keeps_distance() {
        let race = Race {
            flags: RaceFlags::ARCHER,
            ..Race::new("archer", 30)
        };
        let mut mon = Monster::new(RaceId(0), Coord::new(10, 10), 100);
        let player = PlayerState::new(Coord::new(10, 20), 5);
        find_range(&mut mon, &race, &player);
        assert_eq!(mon.best_range, 4);
    }

    #[test]
    fn test_step_straight_line() {
        let cave = arena();
        let (races, mon) = setup(Race::new("orc", 5));
        let mut rng = GameRng::new(1);
        let step = choose_step(&cave, &races, &mon, Coord::new(10, 20), 0, &mut rng);
        assert_eq!(step.map(|s| s.to), Some(Coord::new(10, 11)));
    }

    #[test]
    fn test_step_around_wall() {
        let mut cave = arena();
        cave.set_feat(Coord::new(10, 11), Feat::Granite);
        let (races, mon) = setup(Race::new("orc", 5));
        let mut rng = GameRng::new(1);
        for turn in 0..2 {
            let step = choose_step(&cave, &races, &mon, Coord::new(10, 20), turn, &mut rng)
                .map(|s| s.to);
            assert!(
                step == Some(Coord::new(9, 11)) || step == Some(Coord::new(11, 11)),
                "{step:?}"
            );
        }
    }

    #[test]
    fn test_step_boxed_in() {
        let mut cave = arena();
        cave.fill_rect(9, 9, 11, 11, Feat::Granite);
        cave.set_feat(Coord::new(10, 10), Feat::Floor);
        let (races, mon) = setup(Race::new("orc", 5));
        let mut rng = GameRng::new(1);
        assert_eq!(
            choose_step(&cave, &races, &mon, Coord::new(10, 20), 0, &mut rng),
            None
        );
    }

    #[test]
    fn test_follow_noise_downhill() {
        let mut cave = arena();
        cave.update_noise(Coord::new(10, 20));
        let race = Race::new("orc", 5);
        let mon = Monster::new(RaceId(0), Coord::new(10, 10), 30);
        let next = follow_noise(&cave, &mon, &race, &SimOptions::default());
        let next = next.expect("player is within hearing");
        assert_eq!(next.x, 11);

        let deaf = Race {
            hearing: 2,
            ..race
        };
        assert_eq!(follow_noise(&cave, &mon, &deaf, &SimOptions::default()), None);
    }

    #[test]
    fn test_follow_scent_prefers_fresh() {
        let mut cave = arena();
        // Older trail to the west, fresher to the east
        cave.cell_mut(Coord::new(10, 9)).scent = 230;
        cave.cell_mut(Coord::new(10, 11)).scent = 202;
        cave.cell_mut(Coord::new(10, 10)).scent = 210;
        let race = Race::new("dog", 5);
        let mon = Monster::new(RaceId(0), Coord::new(10, 10), 30);
        assert_eq!(follow_scent(&cave, &mon, &race), Some(Coord::new(10, 11)));

        // Nothing fresher than here: stay off the trail
        cave.cell_mut(Coord::new(10, 10)).scent = 201;
        assert_eq!(follow_scent(&cave, &mon, &race), None);
    }

    #[test]
    fn test_hiding_place_out_of_sight() {
        let mut cave = arena();
        // A pillar to duck behind
        cave.fill_rect(12, 14, 14, 16, Feat::Granite);
        let player = Coord::new(10, 15);
        let hide = find_hiding(&cave, Coord::new(11, 17), player).expect("pillar hides");
        assert!(!cave.los(player, hide));
        assert!(hide.chebyshev(player) > 1);
    }

    #[test]
    fn test_afraid_monster_retreats() {
        let cave = arena();
        let race = Race::new("kobold", 1);
        let mut mon = Monster::new(RaceId(0), Coord::new(10, 12), 5);
        mon.frighten(10);
        mon.cdis = 2;
        mon.speed = 100;
        let player = PlayerState::new(Coord::new(10, 10), 30);
        let mut rng = GameRng::new(5);
        match get_move(&cave, &mut mon, &race, &player, &SimOptions::default(), &mut rng) {
            MovePlan::Retreat(to) => assert!(to.x > 12),
            MovePlan::Attack | MovePlan::Advance(_) => {
                // Cornered and slower: turned to fight
                assert_eq!(mon.min_range, 1);
            }
            MovePlan::Hold => panic!("a frightened monster in sight should act"),
        }
    }

    #[test]
    fn test_adjacent_attacks() {
        let cave = arena();
        let race = Race::new("orc", 30);
        let mut mon = Monster::new(RaceId(0), Coord::new(10, 11), 100);
        mon.cdis = 1;
        let player = PlayerState::new(Coord::new(10, 10), 5);
        let mut rng = GameRng::new(5);
        let plan = get_move(&cave, &mut mon, &race, &player, &SimOptions::default(), &mut rng);
        assert_eq!(plan, MovePlan::Attack);
        assert_eq!(mon.target, Some(player.pos));
    }

    #[test]
    fn test_stationary_holds() {
        let cave = arena();
        let race = Race {
            flags: RaceFlags::NEVER_MOVE,
            ..Race::new("mold", 30)
        };
        let mut mon = Monster::new(RaceId(0), Coord::new(10, 15), 100);
        mon.cdis = 5;
        let player = PlayerState::new(Coord::new(10, 10), 5);
        let mut rng = GameRng::new(5);
        assert_eq!(
            get_move(&cave, &mut mon, &race, &player, &SimOptions::default(), &mut rng),
            MovePlan::Hold
        );
    }
}
