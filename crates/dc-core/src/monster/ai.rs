//! Monster turn processing
//!
//! One call per monster turn: tick timers, wake up or stay asleep, decide
//! between a ranged attack and moving, and carry out whatever was chosen.
//! Attacks aimed at the player come back as outcomes for the combat code
//! to resolve; everything that only touches the map or the monster itself
//! is resolved here.

use log::trace;

use crate::consts::{FLEE_RANGE, MAX_SIGHT};
use crate::dungeon::{Cave, Coord, Feat, FeatFlags, Occupant, DDD, distance};
use crate::options::SimOptions;
use crate::player::PlayerState;
use crate::rng::GameRng;

use super::monst::{Monster, MonsterId};
use super::movement::{MovePlan, Step, choose_step, get_move, sees_player};
use super::passable::{Displace, DoorMethod, terrain_entry};
use super::race::{Race, RaceFlags, RaceId, RaceTable};
use super::select::{RangedChoice, choose_ranged_attack, ranged_chance};
use super::spells::{Spell, SpellKind};

/// Everything a monster turn reads besides the map
#[derive(Debug, Clone, Copy)]
pub struct AiContext<'a> {
    pub races: &'a RaceTable,
    pub player: &'a PlayerState,
    pub options: &'a SimOptions,
    /// Game turn, used to alternate step preferences
    pub turn: u64,
}

/// What a monster decided to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonsterAction {
    Idle,
    /// Melee whoever stands on the grid
    Attack(Coord),
    Cast { spell: Spell, target: Coord },
    Shapeshift(RaceId),
    Move(Step),
}

/// What actually happened on a monster's turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Had nothing to do
    Idle,
    Asleep,
    /// Shook off sleep (the turn is still spent)
    Woke,
    InStasis,
    /// Too far from the action to bother
    Passive,
    Moved(Coord),
    /// Melee against the player on this grid
    Attacked(Coord),
    /// Ranged attack or spell aimed at the player
    Cast { spell: Spell, target: Coord },
    /// Spell on itself, already resolved
    CastSelf(Spell),
    Shapeshifted(RaceId),
    OpenedDoor(Coord),
    /// Broke a door down and stepped through
    BashedDoor(Coord),
    /// Tried a door and failed
    DoorHeld(Coord),
    PushedPast { to: Coord, other: MonsterId },
    KilledOccupant { to: Coord, other: MonsterId },
    /// Dug through a wall
    Tunnelled(Coord),
    /// Confused and walked into something
    Stumbled { at: Coord, stunned: bool },
    /// Hurt by terrain
    Hurt(i32),
    Died,
}

/// Run one turn for a monster
pub fn process_monster(
    cave: &mut Cave,
    id: MonsterId,
    ctx: &AiContext<'_>,
    rng: &mut GameRng,
) -> TurnOutcome {
    let Some(mut mon) = cave.monster(id).cloned() else {
        return TurnOutcome::Idle;
    };
    let Some(race) = ctx.races.get(mon.race) else {
        return TurnOutcome::Idle;
    };
    let player = ctx.player;

    mon.cdis = distance(mon.pos, player.pos);
    mon.tick_timers();

    if mon.stasis > 0 {
        mon.stasis -= 1;
        store(cave, id, mon);
        return TurnOutcome::InStasis;
    }

    if mon.is_asleep() {
        let woke = disturb(cave, &mut mon, race, ctx, rng);
        store(cave, id, mon);
        return if woke {
            TurnOutcome::Woke
        } else {
            TurnOutcome::Asleep
        };
    }

    if !update_activity(cave, &mut mon, race, ctx) {
        store(cave, id, mon);
        return TurnOutcome::Passive;
    }

    let action = decide_action(cave, &mut mon, race, ctx, rng);
    trace!("monster {} at ({}, {}): {:?}", id.0, mon.pos.y, mon.pos.x, action);

    match action {
        MonsterAction::Idle => {
            store(cave, id, mon);
            TurnOutcome::Idle
        }
        MonsterAction::Attack(at) => {
            store(cave, id, mon);
            TurnOutcome::Attacked(at)
        }
        MonsterAction::Cast { spell, target } => {
            cast(cave, id, mon, race, spell, target, rng)
        }
        MonsterAction::Shapeshift(form) => {
            mon.race = form;
            mon.reset_ranges();
            store(cave, id, mon);
            TurnOutcome::Shapeshifted(form)
        }
        MonsterAction::Move(step) => {
            let confused = mon.confused > 0;
            store(cave, id, mon);
            if confused && !step.entry.is_possible() {
                stumble(cave, id, step.to, rng)
            } else {
                execute_step(cave, ctx.races, id, step, rng)
            }
        }
    }
}

fn store(cave: &mut Cave, id: MonsterId, mon: Monster) {
    if let Some(slot) = cave.monster_mut(id) {
        *slot = mon;
    }
}

/// Let the player's noise work on a sleeping monster; true if it woke
fn disturb(
    cave: &Cave,
    mon: &mut Monster,
    race: &Race,
    ctx: &AiContext<'_>,
    rng: &mut GameRng,
) -> bool {
    if ctx.player.aggravate {
        mon.sleep = 0;
        return true;
    }

    let reach = race.hearing + ctx.options.monster_flow_depth;
    let heard = cave
        .noise_distance(mon.pos)
        .is_some_and(|d| d <= reach);
    if !heard && mon.cdis > race.aaf {
        return false;
    }

    let mut shake = rng.rnd(ctx.player.noise.max(1));
    if mon.cdis <= race.aaf / 2 {
        shake *= 2;
    }
    mon.sleep = (mon.sleep - shake).max(0);
    mon.sleep == 0
}

/// Switch between passive and active; returns whether the monster acts
fn update_activity(cave: &Cave, mon: &mut Monster, race: &Race, ctx: &AiContext<'_>) -> bool {
    let reach = race.hearing + ctx.options.monster_flow_depth;
    let hears = cave
        .noise_distance(mon.pos)
        .is_some_and(|d| d <= reach);
    let smells = cave.scent_age(mon.pos).is_some_and(|age| age < race.smell);
    let near = mon.cdis <= race.aaf;

    if mon.active {
        if mon.cdis >= FLEE_RANGE && !near && mon.target.is_none() && !smells && !hears {
            mon.active = false;
        }
    } else if near || mon.target.is_some() || smells || hears {
        mon.active = true;
        if !mon.engaged {
            mon.engaged = true;
            mon.harass = (2 + race.level / 10).clamp(0, u8::MAX as i32) as u8;
        }
    }
    mon.active
}

/// Choose this turn's action, updating the monster's plans
pub fn decide_action(
    cave: &Cave,
    mon: &mut Monster,
    race: &Race,
    ctx: &AiContext<'_>,
    rng: &mut GameRng,
) -> MonsterAction {
    let player = ctx.player;

    let has_los = sees_player(cave, mon, player);
    let chance = ranged_chance(mon, race, has_los);
    if chance > 0 && rng.percent(chance) {
        match choose_ranged_attack(cave, mon, race, player, ctx.options, has_los, rng) {
            Some(RangedChoice::Cast(spell)) => {
                if spell.info().harass && mon.harass > 0 {
                    mon.harass -= 1;
                }
                return MonsterAction::Cast {
                    spell,
                    target: player.pos,
                };
            }
            Some(RangedChoice::Shapeshift(form)) => return MonsterAction::Shapeshift(form),
            None => {}
        }
    }

    // Erratic movers
    let mut erratic = 0;
    if race.has(RaceFlags::RAND_25) {
        erratic += 25;
    }
    if race.has(RaceFlags::RAND_50) {
        erratic += 50;
    }
    if erratic > 0 && !race.has(RaceFlags::NEVER_MOVE) && rng.percent(erratic) {
        let goal = mon.pos.step(DDD[rng.rn2(8) as usize]);
        return match choose_step(cave, ctx.races, mon, goal, ctx.turn, rng) {
            Some(step) => MonsterAction::Move(step),
            None => MonsterAction::Idle,
        };
    }

    let goal = match get_move(cave, mon, race, player, ctx.options, rng) {
        MovePlan::Hold => return MonsterAction::Idle,
        MovePlan::Attack => return MonsterAction::Attack(player.pos),
        MovePlan::Advance(goal) | MovePlan::Retreat(goal) => goal,
    };

    match choose_step(cave, ctx.races, mon, goal, ctx.turn, rng) {
        Some(step) => MonsterAction::Move(step),
        None => MonsterAction::Idle,
    }
}

// ============================================================================
// Casting
// ============================================================================

fn cast(
    cave: &mut Cave,
    id: MonsterId,
    mut mon: Monster,
    race: &Race,
    spell: Spell,
    target: Coord,
    rng: &mut GameRng,
) -> TurnOutcome {
    if race.mana > 0 {
        mon.mana = (mon.mana - spell.info().mana).max(0);
    }

    let blink = match spell.kind() {
        SpellKind::Heal => {
            mon.hp = (mon.hp + race.spell_power.max(1) * 6).min(mon.max_hp);
            None
        }
        SpellKind::Haste => {
            mon.speed = (mon.speed + 10).min(race.speed + 10);
            None
        }
        SpellKind::Blink => Some(10),
        SpellKind::Teleport => Some(MAX_SIGHT * 2 + 5),
        SpellKind::DrainMana => {
            mon.mana = race.mana;
            None
        }
        _ => None,
    };
    store(cave, id, mon);

    if let Some(range) = blink {
        teleport_monster(cave, id, range, rng);
    }

    if spell.is_self_targeted() {
        TurnOutcome::CastSelf(spell)
    } else {
        TurnOutcome::Cast { spell, target }
    }
}

/// Move a monster to a random open grid up to `range` away
pub fn teleport_monster(
    cave: &mut Cave,
    id: MonsterId,
    range: i32,
    rng: &mut GameRng,
) -> Option<Coord> {
    let from = cave.monster(id)?.pos;
    let mut range = range.max(1);

    for _ in 0..10 {
        let min = range / 3;
        for _ in 0..500 {
            let at = from.offset(rng.spread(0, range), rng.spread(0, range));
            if !cave.in_bounds_fully(at) || at == from {
                continue;
            }
            let d = distance(from, at);
            if d > range || d < min {
                continue;
            }
            if !cave.is_open(at) || cave.cell(at).is_icky() {
                continue;
            }
            if cave.move_monster(id, at) {
                return Some(at);
            }
        }
        range *= 2;
    }
    None
}

// ============================================================================
// Moving
// ============================================================================

/// Carry out a chosen step
pub fn execute_step(
    cave: &mut Cave,
    races: &RaceTable,
    id: MonsterId,
    step: Step,
    rng: &mut GameRng,
) -> TurnOutcome {
    let to = step.to;
    if !cave.in_bounds(to) {
        return TurnOutcome::Idle;
    }

    if cave.cell(to).occupant() == Occupant::Player {
        return TurnOutcome::Attacked(to);
    }

    if !rng.percent(step.entry.chance) {
        return if step.entry.door.is_some() {
            TurnOutcome::DoorHeld(to)
        } else {
            TurnOutcome::Idle
        };
    }

    if let Some(DoorMethod::Open | DoorMethod::Unlock) = step.entry.door {
        cave.set_feat(to, Feat::OpenDoor);
        return TurnOutcome::OpenedDoor(to);
    }

    // The occupant's fate is settled before any terrain changes
    let mut displaced = None;
    if let Some(how) = step.entry.displace {
        let Some(other) = cave.monster_at(to) else {
            return TurnOutcome::Idle;
        };
        let landing = match how {
            Displace::Kill => None,
            Displace::Push => match push_target(cave, races, other, to) {
                Some(at) => Some(at),
                None => return TurnOutcome::Idle,
            },
        };
        displaced = Some((how, other, landing));
    }

    let bashed = step.entry.door == Some(DoorMethod::Bash);
    if bashed {
        let feat = if rng.one_in(2) {
            Feat::BrokenDoor
        } else {
            Feat::OpenDoor
        };
        cave.set_feat(to, feat);
    }

    // Diggers leave a hole; wall-walkers leave the wall alone
    let feat = cave.feat(to);
    let digs = cave
        .monster(id)
        .and_then(|m| races.get(m.race))
        .is_some_and(|r| r.has(RaceFlags::KILL_WALL) && !r.has(RaceFlags::PASS_WALL));
    let tunnelled = digs && feat.is_wall() && !feat.is_permanent();
    if tunnelled {
        cave.set_feat(to, Feat::Floor);
    }

    if let Some((_, other, landing)) = displaced {
        match landing {
            Some(at) => {
                cave.move_monster(other, at);
            }
            None => {
                cave.remove_monster(other);
            }
        }
    }

    if !cave.move_monster(id, to) {
        return TurnOutcome::Idle;
    }
    if let Some(mon) = cave.monster_mut(id) {
        if mon.target == Some(to) {
            mon.target = None;
        }
    }

    match displaced {
        Some((Displace::Kill, other, _)) => TurnOutcome::KilledOccupant { to, other },
        Some((Displace::Push, other, _)) => TurnOutcome::PushedPast { to, other },
        None if bashed => TurnOutcome::BashedDoor(to),
        None if tunnelled => TurnOutcome::Tunnelled(to),
        None => TurnOutcome::Moved(to),
    }
}

/// An empty grid next to `at` that the pushed monster can surely enter
fn push_target(cave: &Cave, races: &RaceTable, other: MonsterId, at: Coord) -> Option<Coord> {
    let pushed = cave.monster(other)?;
    let race = races.get(pushed.race)?;
    DDD.iter().map(|&d| at.step(d)).find(|&spot| {
        cave.in_bounds(spot)
            && !cave.cell(spot).is_occupied()
            && terrain_entry(race, pushed.hp, cave.feat(spot)).chance == 100
    })
}

/// A confused monster walks into something it cannot enter
fn stumble(cave: &mut Cave, id: MonsterId, at: Coord, rng: &mut GameRng) -> TurnOutcome {
    if !cave.in_bounds(at) {
        return TurnOutcome::Idle;
    }
    let feat = cave.feat(at);

    if feat.has(FeatFlags::FALL) {
        cave.remove_monster(id);
        return TurnOutcome::Died;
    }

    let damage = if feat.has(FeatFlags::LAVA) {
        rng.dice(4, 8)
    } else if feat.has(FeatFlags::WATER) {
        rng.dice(2, 6)
    } else {
        0
    };
    if damage > 0 {
        let Some(mon) = cave.monster_mut(id) else {
            return TurnOutcome::Idle;
        };
        mon.hp -= damage;
        if mon.hp < 0 {
            cave.remove_monster(id);
            return TurnOutcome::Died;
        }
        return TurnOutcome::Hurt(damage);
    }

    let stunned = rng.one_in(3);
    if stunned {
        if let Some(mon) = cave.monster_mut(id) {
            mon.stunned = mon.stunned.saturating_add(rng.rnd(5) as u16);
        }
    }
    TurnOutcome::Stumbled { at, stunned }
}
