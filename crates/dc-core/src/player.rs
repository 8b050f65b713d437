//! Player state snapshot
//!
//! The core never owns the player. Each turn the embedder hands in a
//! snapshot of the fields that visibility and monster AI read.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::consts::NORMAL_SPEED;
use crate::dungeon::Coord;

bitflags! {
    /// Resistances and saves, as the player has them or as a monster
    /// believes the player has them
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Resists: u32 {
        const RES_ACID = 1 << 0;
        const RES_ELEC = 1 << 1;
        const RES_FIRE = 1 << 2;
        const RES_COLD = 1 << 3;
        const RES_POIS = 1 << 4;
        /// Temporary ("opposition") resistances
        const OPP_ACID = 1 << 5;
        const OPP_ELEC = 1 << 6;
        const OPP_FIRE = 1 << 7;
        const OPP_COLD = 1 << 8;
        const OPP_POIS = 1 << 9;
        const IMM_ACID = 1 << 10;
        const IMM_ELEC = 1 << 11;
        const IMM_FIRE = 1 << 12;
        const IMM_COLD = 1 << 13;
        const RES_LIGHT = 1 << 14;
        const RES_DARK = 1 << 15;
        const RES_CONF = 1 << 16;
        const RES_SOUND = 1 << 17;
        const RES_SHARD = 1 << 18;
        const RES_NEXUS = 1 << 19;
        const RES_NETHER = 1 << 20;
        const RES_CHAOS = 1 << 21;
        const RES_DISEN = 1 << 22;
        const RES_BLIND = 1 << 23;
        const RES_FEAR = 1 << 24;
        const FREE_ACT = 1 << 25;
        const GOOD_SAVE = 1 << 26;
        const PERFECT_SAVE = 1 << 27;
        const IMM_MANA = 1 << 28;
    }
}

// Serialize as the raw bits, like the cell flags
impl Serialize for Resists {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Resists {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u32::deserialize(deserializer)?;
        Ok(Resists::from_bits_truncate(bits))
    }
}

/// What the simulation core needs to know about the player this turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub pos: Coord,
    pub level: i32,
    pub hp: i32,
    pub max_hp: i32,
    pub mana: i32,
    pub max_mana: i32,
    /// Energy speed (110 is normal)
    pub speed: i32,
    /// Radius of the current light source (0 = unlit)
    pub light_radius: i32,
    /// Can see nearby grids without light
    pub unlight: bool,
    pub blind: u16,
    pub confused: u16,
    pub hallucinating: u16,
    /// Noise made this turn; feeds the sleep roll of nearby monsters
    pub noise: i32,
    pub resists: Resists,
    pub aggravate: bool,
}

impl PlayerState {
    /// A healthy, torch-carrying player at `pos`
    pub fn new(pos: Coord, level: i32) -> Self {
        Self {
            pos,
            level,
            hp: 10 + level * 10,
            max_hp: 10 + level * 10,
            mana: 0,
            max_mana: 0,
            speed: NORMAL_SPEED,
            light_radius: 1,
            unlight: false,
            blind: 0,
            confused: 0,
            hallucinating: 0,
            noise: 10,
            resists: Resists::empty(),
            aggravate: false,
        }
    }

    pub fn is_blind(&self) -> bool {
        self.blind > 0
    }

    /// Current HP as a percentage of maximum
    pub fn hp_percent(&self) -> i32 {
        if self.max_hp <= 0 {
            return 100;
        }
        self.hp.max(0) * 100 / self.max_hp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hp_percent() {
        let mut p = PlayerState::new(Coord::new(5, 5), 10);
        assert_eq!(p.hp_percent(), 100);
        p.hp = p.max_hp / 4;
        assert_eq!(p.hp_percent(), 25);
        p.max_hp = 0;
        assert_eq!(p.hp_percent(), 100);
    }

    #[test]
    fn test_resists_serde() {
        let r = Resists::RES_FIRE | Resists::FREE_ACT;
        let json = serde_json::to_string(&r).unwrap();
        let back: Resists = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
