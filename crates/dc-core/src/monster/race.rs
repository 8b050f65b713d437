//! Monster species templates
//!
//! Static, read-only data shared by every monster of a kind. Behaviour
//! keys off these capability flags, never off the display symbol.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::spells::SpellSet;
use crate::consts::NORMAL_SPEED;

/// Index into the species table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RaceId(pub u16);

bitflags! {
    /// Species capability flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RaceFlags: u64 {
        // Movement
        const NEVER_MOVE = 1 << 0;
        const NEVER_BLOW = 1 << 1;
        const RAND_25 = 1 << 2;
        const RAND_50 = 1 << 3;
        const PASS_WALL = 1 << 4;
        const KILL_WALL = 1 << 5;
        const KILL_BODY = 1 << 6;
        const MOVE_BODY = 1 << 7;
        const OPEN_DOOR = 1 << 8;
        const BASH_DOOR = 1 << 9;
        const FLYING = 1 << 10;
        /// Comfortable in water
        const AQUATIC = 1 << 11;

        // Nature
        const ANIMAL = 1 << 12;
        const HUMANOID = 1 << 13;
        const UNDEAD = 1 << 14;
        const GIANT = 1 << 15;
        const TROLL = 1 << 16;
        const UNIQUE = 1 << 17;

        // Mind
        const SMART = 1 << 18;
        const STUPID = 1 << 19;
        const FRIENDS = 1 << 20;
        const ARCHER = 1 << 21;
        const TERRITORIAL = 1 << 22;
        const NO_FEAR = 1 << 23;
        /// Flees when out of mana
        const LOW_MANA_RUN = 1 << 24;
        const SHAPECHANGER = 1 << 25;

        // Elements
        const IM_FIRE = 1 << 26;
        /// Fire creatures that water destroys
        const AVOID_WATER = 1 << 27;
        const IM_WATER = 1 << 28;
    }
}

// Serialize as the raw bits
impl Serialize for RaceFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RaceFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u64::deserialize(deserializer)?;
        Ok(RaceFlags::from_bits_truncate(bits))
    }
}

/// A monster species
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Race {
    pub name: String,
    /// Display symbol; cosmetic only
    pub symbol: char,
    pub level: i32,
    /// Energy speed (110 is normal)
    pub speed: i32,
    /// Average hit points
    pub hp: i32,
    /// Experience value, also the strength measure for pushing past
    pub exp: i32,
    /// Detection radius
    pub aaf: i32,
    /// How far (in flow steps) it can hear the player
    pub hearing: i32,
    /// Oldest scent it can follow (0 = no sense of smell)
    pub smell: i32,
    /// Initial sleep counter
    pub sleep: i32,
    /// Percent chance to use a ranged attack when able
    pub freq_ranged: i32,
    pub spell_power: i32,
    pub mana: i32,
    pub spells: SpellSet,
    pub flags: RaceFlags,
    /// Forms a shapechanger can take
    pub forms: Vec<RaceId>,
}

impl Default for Race {
    fn default() -> Self {
        Self {
            name: String::new(),
            symbol: '?',
            level: 1,
            speed: NORMAL_SPEED,
            hp: 10,
            exp: 1,
            aaf: 20,
            hearing: 20,
            smell: 20,
            sleep: 0,
            freq_ranged: 0,
            spell_power: 1,
            mana: 0,
            spells: SpellSet::empty(),
            flags: RaceFlags::empty(),
            forms: Vec::new(),
        }
    }
}

impl Race {
    /// A plain melee species of the given level
    pub fn new(name: &str, level: i32) -> Self {
        Self {
            name: name.to_string(),
            level,
            hp: 5 + level * 5,
            exp: level.max(1) * 5,
            spell_power: level.max(1),
            ..Self::default()
        }
    }

    pub fn has(&self, flag: RaceFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Can tunnel or phase through ordinary walls
    pub fn through_walls(&self) -> bool {
        self.flags.intersects(RaceFlags::PASS_WALL | RaceFlags::KILL_WALL)
    }
}

/// The species table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceTable {
    races: Vec<Race>,
}

impl RaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a species and return its id
    pub fn push(&mut self, race: Race) -> RaceId {
        self.races.push(race);
        RaceId((self.races.len() - 1) as u16)
    }

    pub fn get(&self, id: RaceId) -> Option<&Race> {
        self.races.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.races.len()
    }

    pub fn is_empty(&self) -> bool {
        self.races.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RaceId, &Race)> {
        self.races
            .iter()
            .enumerate()
            .map(|(i, r)| (RaceId(i as u16), r))
    }

    /// Load a table from JSON
    pub fn from_json(text: &str) -> Result<Self, crate::error::ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_race_table() {
        let mut table = RaceTable::new();
        let kobold = table.push(Race::new("kobold", 2));
        let wraith = table.push(Race {
            flags: RaceFlags::UNDEAD | RaceFlags::PASS_WALL,
            ..Race::new("wraith", 20)
        });
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(kobold).unwrap().name, "kobold");
        assert!(table.get(wraith).unwrap().through_walls());
        assert!(table.get(RaceId(7)).is_none());
    }

    #[test]
    fn test_race_table_json() {
        let text = r#"{ "races": [ { "name": "orc", "level": 5, "flags": 8448 } ] }"#;
        let table = RaceTable::from_json(text).unwrap();
        let orc = table.get(RaceId(0)).unwrap();
        assert_eq!(orc.level, 5);
        assert!(orc.has(RaceFlags::OPEN_DOOR));
        assert!(orc.has(RaceFlags::HUMANOID));
        assert_eq!(orc.speed, NORMAL_SPEED);
    }
}
