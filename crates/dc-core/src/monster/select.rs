//! Ranged attack and spell selection
//!
//! Decides whether a monster shoots or casts this turn and, if so, which of
//! its attacks suits the situation best.

use crate::consts::MAX_RANGE;
use crate::dungeon::{Cave, Coord, ProjectFlags, Projection};
use crate::options::SimOptions;
use crate::player::{PlayerState, Resists};
use crate::rng::GameRng;

use super::monst::Monster;
use super::race::{Race, RaceFlags, RaceId};
use super::spells::{ResistCategory, Spell, SpellKind, SpellSet};

/// Result of the ranged-attack decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangedChoice {
    Cast(Spell),
    Shapeshift(RaceId),
}

/// Situational pressure behind a spell choice, each 0..=3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Wants {
    pub hps: i32,
    pub mana: i32,
    pub escape: i32,
    pub tactic: i32,
    /// Wants the player closer (for teleport-to)
    pub pull: i32,
    pub summon: i32,
}

/// Percent of an attack of category `cat` the monster expects the player to
/// shrug off, given what it knows
pub fn find_resist(known: Resists, cat: ResistCategory) -> i32 {
    use ResistCategory as C;

    let element = |res: Resists, opp: Resists, imm: Resists| {
        if known.contains(imm) {
            100
        } else if known.contains(res | opp) {
            70
        } else if known.intersects(res | opp) {
            40
        } else {
            0
        }
    };
    let single = |res: Resists, pct: i32| if known.contains(res) { pct } else { 0 };
    let saving = |res: Resists| {
        if known.contains(res) {
            100
        } else if known.contains(Resists::GOOD_SAVE) {
            30
        } else {
            0
        }
    };

    match cat {
        C::Acid => element(Resists::RES_ACID, Resists::OPP_ACID, Resists::IMM_ACID),
        C::Elec => element(Resists::RES_ELEC, Resists::OPP_ELEC, Resists::IMM_ELEC),
        C::Fire => element(Resists::RES_FIRE, Resists::OPP_FIRE, Resists::IMM_FIRE),
        C::Cold => element(Resists::RES_COLD, Resists::OPP_COLD, Resists::IMM_COLD),
        // No immunity to poison
        C::Poison => {
            if known.contains(Resists::RES_POIS | Resists::OPP_POIS) {
                80
            } else if known.intersects(Resists::RES_POIS | Resists::OPP_POIS) {
                55
            } else {
                0
            }
        }
        C::Light => single(Resists::RES_LIGHT, 50),
        C::Dark => single(Resists::RES_DARK, 50),
        C::Sound => single(Resists::RES_SOUND, 50),
        C::Shards => single(Resists::RES_SHARD, 50),
        C::Nexus => single(Resists::RES_NEXUS, 50),
        C::Nether => single(Resists::RES_NETHER, 50),
        C::Chaos => single(Resists::RES_CHAOS, 50),
        C::Disen => single(Resists::RES_DISEN, 50),
        C::Mana => single(Resists::IMM_MANA, 100),
        C::Confusion => saving(Resists::RES_CONF),
        C::Fear => saving(Resists::RES_FEAR),
        C::Blind => saving(Resists::RES_BLIND),
        C::FreeAction => saving(Resists::FREE_ACT),
        C::Save => {
            if known.contains(Resists::PERFECT_SAVE) {
                100
            } else if known.contains(Resists::GOOD_SAVE) {
                30
            } else {
                0
            }
        }
    }
}

/// Percent chance of trying a ranged attack this turn
pub fn ranged_chance(mon: &Monster, race: &Race, has_los: bool) -> i32 {
    if race.freq_ranged <= 0 || race.spells.is_empty() {
        return 0;
    }
    if mon.confused > 0 || !has_los || mon.cdis > MAX_RANGE {
        return 0;
    }

    let mut chance = race.freq_ranged;
    if mon.stunned > 0 {
        chance /= 2;
    }
    if race.has(RaceFlags::ARCHER) && race.spells.has_kind(SpellKind::Archery) {
        chance = chance.max(33);
    }
    chance.min(100)
}

/// 3, 2 or 1 when `cur` drops below an eighth, a quarter or half of `max`
fn shortfall(cur: i32, max: i32) -> i32 {
    if max <= 0 {
        0
    } else if cur < max / 8 {
        3
    } else if cur < max / 4 {
        2
    } else if cur < max / 2 {
        1
    } else {
        0
    }
}

/// Open grids in the 5x5 square around the player, as a 0..=3 pressure
fn summon_room(cave: &Cave, player: Coord) -> i32 {
    let mut open = 0;
    for dy in -2..=2 {
        for dx in -2..=2 {
            let at = player.offset(dy, dx);
            if cave.in_bounds(at) && cave.is_open(at) {
                open += 1;
            }
        }
    }
    match open {
        n if n > 10 => 3,
        n if n > 3 => 2,
        n if n > 0 => 1,
        _ => 0,
    }
}

/// Compute the monster's situational wants
pub fn assess(cave: &Cave, mon: &Monster, race: &Race, player: &PlayerState) -> Wants {
    let hps = shortfall(mon.hp, mon.max_hp);
    let mana = if race.mana > 0 {
        shortfall(mon.mana, race.mana)
    } else {
        0
    };

    let mut escape = 0;
    if mon.is_afraid() {
        escape += 2;
    }
    if hps >= 2 {
        escape += 1;
    }

    let tactic = if mon.min_range > 0 && mon.cdis < mon.min_range {
        (mon.min_range - mon.cdis).min(3)
    } else {
        0
    };
    let best = mon.best_range.max(1);
    let pull = if mon.cdis > best + 1 {
        ((mon.cdis - best) / 3).clamp(1, 3)
    } else {
        0
    };

    Wants {
        hps,
        mana,
        escape: escape.min(3),
        tactic,
        pull,
        summon: summon_room(cave, player.pos),
    }
}

/// Resistances the monster scores against
fn known_resists(mon: &Monster, player: &PlayerState, opts: &SimOptions) -> Resists {
    if opts.smart_cheat {
        player.resists
    } else if opts.smart_monsters {
        mon.smart
    } else {
        Resists::empty()
    }
}

/// Desirability of one spell before jitter
pub fn rate_spell(spell: Spell, mon: &Monster, wants: &Wants, known: Resists) -> i32 {
    let info = spell.info();
    let desire = &info.desire;
    let mut rating = desire.base;

    // Breath strength follows the breather's health
    if info.kind == SpellKind::Breath {
        rating = rating * mon.hp.max(0) / mon.max_hp.max(1);
    }

    let tactic = if spell == Spell::TeleportTo {
        wants.pull
    } else {
        wants.tactic
    };
    rating += desire.summon * wants.summon
        + desire.hurt * wants.hps
        + desire.mana * wants.mana
        + desire.escape * wants.escape
        + desire.tactic * tactic;

    if let Some(cat) = info.resist {
        rating = rating * (100 - find_resist(known, cat)) / 100;
    }

    if info.range > 0 && mon.cdis > info.range {
        let over = mon.cdis - info.range;
        rating = rating * (10 - over).max(0) / 10;
    }

    if info.harass && mon.harass > 0 {
        rating += rating * 2 / 3;
    }

    rating
}

/// Scale a rating by a random factor, tighter for smart species
fn jitter(rating: i32, smart: bool, rng: &mut GameRng) -> i32 {
    let factor = if smart {
        75 + rng.rn2(51)
    } else {
        50 + rng.rn2(101)
    };
    rating * factor / 100
}

/// Remove spells that cannot work or would do nothing right now
fn filter_spells(
    cave: &Cave,
    mon: &Monster,
    race: &Race,
    player: &PlayerState,
    has_los: bool,
    rng: &mut GameRng,
) -> SpellSet {
    let mut spells = race.spells;
    let projection = cave.can_project(mon.pos, player.pos, ProjectFlags::CHCK);

    if !has_los || projection == Projection::No {
        spells.retain(|s| !s.needs_los());
    }
    if projection == Projection::NotClear {
        spells.retain(|s| !s.is_bolt());
    }

    // Species without a mana pool cast freely
    if race.mana > 0 {
        let budget = if race.has(RaceFlags::SMART) && mon.mana > 0 {
            mon.mana * (50 + rng.rn2(51)) / 100
        } else {
            mon.mana
        };
        spells.retain(|s| s.info().mana <= budget);
    }

    let adjacent = mon.pos.is_adjacent(player.pos);
    let room = summon_room(cave, player.pos) > 0;
    spells.retain(|s| match s {
        Spell::Heal => mon.max_hp - mon.hp >= mon.max_hp / 10 && mon.hp < mon.max_hp,
        Spell::DrainMana => race.mana > 0 && mon.mana < race.mana && player.mana > 0,
        Spell::Haste => mon.speed < race.speed + 10,
        Spell::TeleportTo => !adjacent,
        Spell::Blind => !player.is_blind(),
        Spell::Confuse => player.confused == 0,
        _ if s.kind() == SpellKind::Summon => room,
        _ => true,
    });

    spells
}

/// Pick a ranged attack, a spell or a change of form for this turn
///
/// Returns `None` when nothing useful is left after filtering.
pub fn choose_ranged_attack(
    cave: &Cave,
    mon: &Monster,
    race: &Race,
    player: &PlayerState,
    opts: &SimOptions,
    has_los: bool,
    rng: &mut GameRng,
) -> Option<RangedChoice> {
    let spells = filter_spells(cave, mon, race, player, has_los, rng);
    let candidates: Vec<Spell> = spells.iter().collect();
    let smart = race.has(RaceFlags::SMART);
    let stupid = race.has(RaceFlags::STUPID);

    let wants = assess(cave, mon, race, player);
    let shapeshift = shapeshift_rating(mon, race, &wants, rng);

    if candidates.is_empty() {
        return shapeshift.map(|(form, _)| RangedChoice::Shapeshift(form));
    }

    let random_pick = candidates.len() == 1
        || stupid
        || (smart && rng.one_in(10))
        || (!stupid && rng.one_in(5));
    if random_pick {
        return rng.choose(&candidates).map(|&s| RangedChoice::Cast(s));
    }

    let known = known_resists(mon, player, opts);
    let mut best: Option<(Spell, i32)> = None;
    for &spell in &candidates {
        let rating = jitter(rate_spell(spell, mon, &wants, known), smart, rng);
        let better = match best {
            None => true,
            Some((_, top)) => rating > top || (rating == top && rng.one_in(2)),
        };
        if better {
            best = Some((spell, rating));
        }
    }

    let (spell, rating) = best?;
    match shapeshift {
        Some((form, shift)) if shift > rating => Some(RangedChoice::Shapeshift(form)),
        _ => Some(RangedChoice::Cast(spell)),
    }
}

/// Desire to change form, with the form to take
fn shapeshift_rating(
    mon: &Monster,
    race: &Race,
    wants: &Wants,
    rng: &mut GameRng,
) -> Option<(RaceId, i32)> {
    if !race.has(RaceFlags::SHAPECHANGER) {
        return None;
    }
    let forms: Vec<RaceId> = race
        .forms
        .iter()
        .copied()
        .filter(|&f| f != mon.race)
        .collect();
    let form = *rng.choose(&forms)?;
    let rating = 20 + 10 * wants.tactic + 10 * wants.hps;
    Some((form, jitter(rating, race.has(RaceFlags::SMART), rng)))
}
