//! Monster instances

use serde::{Deserialize, Serialize};

use super::race::{Race, RaceId};
use crate::dungeon::Coord;
use crate::player::Resists;
use crate::rng::GameRng;

/// Index into the level's monster list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MonsterId(pub u16);

/// A monster on the level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    /// Current species (differs from `base_race` while shapechanged)
    pub race: RaceId,
    pub base_race: RaceId,

    pub pos: Coord,

    pub hp: i32,
    pub max_hp: i32,
    pub mana: i32,

    /// Energy speed (110 is normal)
    pub speed: i32,

    /// Sleep counter; asleep while positive
    pub sleep: i32,
    /// Held in stasis for this many turns
    pub stasis: u16,
    pub stunned: u16,
    pub confused: u16,
    /// Scalar fear counter
    pub fear: u16,
    /// Courage bonus rolled at birth (0 or 8)
    pub morale: i32,

    /// Currently running away
    pub fleeing: bool,
    /// Close enough to the action to take turns
    pub active: bool,
    /// Has been active at least once
    pub engaged: bool,

    /// Desired distance to the player (0 = recompute)
    pub best_range: i32,
    /// Closest the monster is willing to be (0 = recompute)
    pub min_range: i32,

    /// Cached destination
    pub target: Option<Coord>,

    /// Harassment spells left before it gets serious
    pub harass: u8,

    /// What it believes about the player's resistances
    pub smart: Resists,

    /// Distance to the player at the start of its turn
    pub cdis: i32,
}

impl Monster {
    /// A fresh, awake monster
    pub fn new(race: RaceId, pos: Coord, hp: i32) -> Self {
        Self {
            race,
            base_race: race,
            pos,
            hp,
            max_hp: hp,
            mana: 0,
            speed: crate::consts::NORMAL_SPEED,
            sleep: 0,
            stasis: 0,
            stunned: 0,
            confused: 0,
            fear: 0,
            morale: 0,
            fleeing: false,
            active: false,
            engaged: false,
            best_range: 0,
            min_range: 0,
            target: None,
            harass: 0,
            smart: Resists::empty(),
            cdis: 0,
        }
    }

    /// Instantiate a member of a species, rolling hp and sleep
    pub fn spawn(id: RaceId, race: &Race, pos: Coord, asleep: bool, rng: &mut GameRng) -> Self {
        let hp = rng.spread(race.hp, race.hp / 4).max(1);
        let mut monster = Self::new(id, pos, hp);
        monster.speed = race.speed;
        monster.mana = race.mana;
        monster.morale = rng.rn2(2) * 8;
        if asleep && race.sleep > 0 {
            monster.sleep = race.sleep * 2 + rng.rnd(race.sleep * 10);
        }
        monster
    }

    pub fn is_asleep(&self) -> bool {
        self.sleep > 0
    }

    pub fn is_afraid(&self) -> bool {
        self.fear > 0 || self.fleeing
    }

    /// Note something learned about the player's defences
    pub fn learn(&mut self, what: Resists) {
        self.smart |= what;
    }

    /// Forget cached ranges so they are recomputed next turn
    pub fn reset_ranges(&mut self) {
        self.best_range = 0;
        self.min_range = 0;
    }

    /// Scare the monster
    pub fn frighten(&mut self, turns: u16) {
        self.fear = self.fear.saturating_add(turns);
        self.fleeing = true;
        self.reset_ranges();
    }

    /// Stop being afraid
    pub fn calm(&mut self) {
        self.fear = 0;
        self.fleeing = false;
        self.reset_ranges();
    }

    /// Count down status timers by one turn
    pub fn tick_timers(&mut self) {
        self.stunned = self.stunned.saturating_sub(1);
        self.confused = self.confused.saturating_sub(1);
        if self.fear > 0 {
            self.fear -= 1;
            if self.fear == 0 {
                self.calm();
            }
        }
    }
}
