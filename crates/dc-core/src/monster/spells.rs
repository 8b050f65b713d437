//! Monster ranged attacks and spells
//!
//! One descriptor per attack: what kind of effect it is, what it costs,
//! how much a monster wants it along each situational axis, its useful
//! range and the resistance that blunts it.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, FromRepr, IntoEnumIterator};

/// Monster ranged attack or spell
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
    FromRepr,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Spell {
    Shriek = 0,
    Arrow,
    Shot,
    Bolt,
    Missile,
    BreathAcid,
    BreathElec,
    BreathFire,
    BreathCold,
    BreathPoison,
    BreathLight,
    BreathDark,
    BreathSound,
    BreathShards,
    BreathNexus,
    BreathNether,
    BreathChaos,
    BreathDisen,
    BallAcid,
    BallElec,
    BallFire,
    BallCold,
    BallPoison,
    BallDark,
    BallMana,
    BoltAcid,
    BoltElec,
    BoltFire,
    BoltCold,
    BoltNether,
    BoltMana,
    Scare,
    Blind,
    Confuse,
    Slow,
    Hold,
    MindBlast,
    Wound,
    DrainMana,
    Heal,
    Haste,
    Blink,
    Teleport,
    TeleportTo,
    TeleportAway,
    Darkness,
    Traps,
    Forget,
    SummonKin,
    SummonMonsters,
    SummonUndead,
    SummonDragon,
}

/// Broad effect class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SpellKind {
    /// Missile weapons
    Archery,
    Bolt,
    Ball,
    Breath,
    /// Status effect on the player
    Curse,
    /// Nuisance with no direct damage
    Annoy,
    Heal,
    Haste,
    Blink,
    Teleport,
    TeleportTo,
    TeleportAway,
    DrainMana,
    Summon,
}

/// Damage or effect type, for resistance-based penalties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ResistCategory {
    Acid,
    Elec,
    Fire,
    Cold,
    Poison,
    Light,
    Dark,
    Sound,
    Shards,
    Nexus,
    Nether,
    Chaos,
    Disen,
    Mana,
    Confusion,
    Fear,
    Blind,
    FreeAction,
    /// Mind attacks resisted by a good saving throw
    Save,
}

/// How much a monster wants a spell along each situational axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Desire {
    pub base: i32,
    pub summon: i32,
    pub hurt: i32,
    pub mana: i32,
    pub escape: i32,
    pub tactic: i32,
}

/// Static description of one spell
#[derive(Debug, Clone, Copy)]
pub struct SpellInfo {
    pub spell: Spell,
    pub kind: SpellKind,
    pub mana: i32,
    /// Beyond this many grids the spell rates lower (0 = no falloff)
    pub range: i32,
    pub desire: Desire,
    pub resist: Option<ResistCategory>,
    /// Nuisance attacks favoured early in a fight
    pub harass: bool,
}

const fn d(base: i32, summon: i32, hurt: i32, mana: i32, escape: i32, tactic: i32) -> Desire {
    Desire {
        base,
        summon,
        hurt,
        mana,
        escape,
        tactic,
    }
}

const fn info(
    spell: Spell,
    kind: SpellKind,
    mana: i32,
    range: i32,
    desire: Desire,
    resist: Option<ResistCategory>,
    harass: bool,
) -> SpellInfo {
    SpellInfo {
        spell,
        kind,
        mana,
        range,
        desire,
        resist,
        harass,
    }
}

use ResistCategory as R;
use SpellKind as K;

/// The descriptor table, in `Spell` order
static SPELL_TABLE: [SpellInfo; Spell::COUNT] = [
    info(Spell::Shriek, K::Annoy, 0, 0, d(30, 0, 0, 0, 0, 0), None, true),
    info(Spell::Arrow, K::Archery, 0, 0, d(40, 0, 0, 0, 0, 0), None, false),
    info(Spell::Shot, K::Archery, 0, 0, d(40, 0, 0, 0, 0, 0), None, false),
    info(Spell::Bolt, K::Archery, 0, 0, d(40, 0, 0, 0, 0, 0), None, false),
    info(Spell::Missile, K::Bolt, 1, 0, d(40, 0, 0, 0, 0, 0), None, false),
    info(Spell::BreathAcid, K::Breath, 0, 6, d(65, 0, 0, 0, 0, 0), Some(R::Acid), false),
    info(Spell::BreathElec, K::Breath, 0, 6, d(65, 0, 0, 0, 0, 0), Some(R::Elec), false),
    info(Spell::BreathFire, K::Breath, 0, 6, d(65, 0, 0, 0, 0, 0), Some(R::Fire), false),
    info(Spell::BreathCold, K::Breath, 0, 6, d(65, 0, 0, 0, 0, 0), Some(R::Cold), false),
    info(Spell::BreathPoison, K::Breath, 0, 6, d(65, 0, 0, 0, 0, 0), Some(R::Poison), false),
    info(Spell::BreathLight, K::Breath, 0, 6, d(50, 0, 0, 0, 0, 0), Some(R::Light), false),
    info(Spell::BreathDark, K::Breath, 0, 6, d(50, 0, 0, 0, 0, 0), Some(R::Dark), false),
    info(Spell::BreathSound, K::Breath, 0, 6, d(50, 0, 0, 0, 0, 5), Some(R::Sound), false),
    info(Spell::BreathShards, K::Breath, 0, 6, d(50, 0, 0, 0, 0, 0), Some(R::Shards), false),
    info(Spell::BreathNexus, K::Breath, 0, 6, d(50, 0, 0, 0, 0, 5), Some(R::Nexus), false),
    info(Spell::BreathNether, K::Breath, 0, 6, d(50, 0, 0, 0, 0, 0), Some(R::Nether), false),
    info(Spell::BreathChaos, K::Breath, 0, 6, d(50, 0, 0, 0, 0, 0), Some(R::Chaos), false),
    info(Spell::BreathDisen, K::Breath, 0, 6, d(50, 0, 0, 0, 0, 0), Some(R::Disen), false),
    info(Spell::BallAcid, K::Ball, 6, 0, d(50, 0, 0, 0, 0, 0), Some(R::Acid), false),
    info(Spell::BallElec, K::Ball, 4, 0, d(50, 0, 0, 0, 0, 0), Some(R::Elec), false),
    info(Spell::BallFire, K::Ball, 6, 0, d(50, 0, 0, 0, 0, 0), Some(R::Fire), false),
    info(Spell::BallCold, K::Ball, 6, 0, d(50, 0, 0, 0, 0, 0), Some(R::Cold), false),
    info(Spell::BallPoison, K::Ball, 3, 0, d(50, 0, 0, 0, 0, 0), Some(R::Poison), false),
    info(Spell::BallDark, K::Ball, 8, 0, d(50, 0, 0, 0, 0, 0), Some(R::Dark), false),
    info(Spell::BallMana, K::Ball, 12, 0, d(55, 0, 0, 0, 0, 0), Some(R::Mana), false),
    info(Spell::BoltAcid, K::Bolt, 4, 0, d(50, 0, 0, 0, 0, 0), Some(R::Acid), false),
    info(Spell::BoltElec, K::Bolt, 3, 0, d(50, 0, 0, 0, 0, 0), Some(R::Elec), false),
    info(Spell::BoltFire, K::Bolt, 4, 0, d(50, 0, 0, 0, 0, 0), Some(R::Fire), false),
    info(Spell::BoltCold, K::Bolt, 4, 0, d(50, 0, 0, 0, 0, 0), Some(R::Cold), false),
    info(Spell::BoltNether, K::Bolt, 6, 0, d(50, 0, 0, 0, 0, 0), Some(R::Nether), false),
    info(Spell::BoltMana, K::Bolt, 8, 0, d(55, 0, 0, 0, 0, 0), Some(R::Mana), false),
    info(Spell::Scare, K::Curse, 1, 0, d(10, 0, 0, 0, 0, 0), Some(R::Fear), true),
    info(Spell::Blind, K::Curse, 1, 0, d(10, 0, 0, 0, 0, 0), Some(R::Blind), true),
    info(Spell::Confuse, K::Curse, 1, 0, d(10, 0, 0, 0, 0, 0), Some(R::Confusion), true),
    info(Spell::Slow, K::Curse, 2, 0, d(15, 0, 0, 0, 0, 0), Some(R::FreeAction), true),
    info(Spell::Hold, K::Curse, 3, 0, d(15, 0, 0, 0, 0, 0), Some(R::FreeAction), true),
    info(Spell::MindBlast, K::Curse, 2, 0, d(30, 0, 0, 0, 0, 0), Some(R::Save), false),
    info(Spell::Wound, K::Curse, 2, 0, d(30, 0, 0, 0, 0, 0), Some(R::Save), false),
    info(Spell::DrainMana, K::DrainMana, 0, 0, d(0, 0, 0, 25, 0, 0), None, false),
    info(Spell::Heal, K::Heal, 4, 0, d(0, 0, 30, 0, 0, 0), None, false),
    info(Spell::Haste, K::Haste, 5, 0, d(15, 0, 5, 0, 0, 5), None, false),
    info(Spell::Blink, K::Blink, 1, 0, d(5, 0, 0, 0, 10, 20), None, false),
    info(Spell::Teleport, K::Teleport, 3, 0, d(0, 0, 0, 0, 40, 0), None, false),
    info(Spell::TeleportTo, K::TeleportTo, 3, 0, d(10, 0, 0, 0, 0, 20), None, false),
    info(Spell::TeleportAway, K::TeleportAway, 4, 0, d(5, 0, 0, 0, 30, 0), Some(R::Nexus), false),
    info(Spell::Darkness, K::Annoy, 1, 0, d(10, 0, 0, 0, 0, 5), None, true),
    info(Spell::Traps, K::Annoy, 3, 0, d(10, 0, 0, 0, 0, 5), None, true),
    info(Spell::Forget, K::Curse, 3, 0, d(10, 0, 0, 0, 0, 0), Some(R::Save), true),
    info(Spell::SummonKin, K::Summon, 6, 0, d(0, 17, 0, 0, 0, 0), None, false),
    info(Spell::SummonMonsters, K::Summon, 8, 0, d(0, 20, 0, 0, 0, 0), None, false),
    info(Spell::SummonUndead, K::Summon, 10, 0, d(0, 20, 0, 0, 0, 0), None, false),
    info(Spell::SummonDragon, K::Summon, 10, 0, d(0, 20, 0, 0, 0, 0), None, false),
];

impl Spell {
    pub fn info(self) -> &'static SpellInfo {
        &SPELL_TABLE[self as usize]
    }

    pub fn kind(self) -> SpellKind {
        self.info().kind
    }

    /// Missiles and bolts hit the first creature in the way
    pub fn is_bolt(self) -> bool {
        matches!(self.kind(), SpellKind::Archery | SpellKind::Bolt)
    }

    pub fn is_breath(self) -> bool {
        self.kind() == SpellKind::Breath
    }

    /// Affects the caster only
    pub fn is_self_targeted(self) -> bool {
        matches!(
            self.kind(),
            SpellKind::Heal | SpellKind::Haste | SpellKind::Blink | SpellKind::Teleport
        )
    }

    /// Must be aimed at (or need sight of) the player
    pub fn needs_los(self) -> bool {
        !self.is_self_targeted() && self != Spell::Shriek
    }
}

/// A set of spells, one bit per `Spell`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpellSet(u64);

impl SpellSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn of(spells: &[Spell]) -> Self {
        let mut set = Self::empty();
        for &spell in spells {
            set.insert(spell);
        }
        set
    }

    pub fn insert(&mut self, spell: Spell) {
        self.0 |= 1 << spell as u8;
    }

    pub fn remove(&mut self, spell: Spell) {
        self.0 &= !(1 << spell as u8);
    }

    pub const fn contains(self, spell: Spell) -> bool {
        self.0 & (1 << spell as u8) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Keep only the spells matching `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(Spell) -> bool) {
        for spell in self.iter() {
            if !keep(spell) {
                self.remove(spell);
            }
        }
    }

    pub fn iter(self) -> impl Iterator<Item = Spell> {
        Spell::iter().filter(move |&s| self.contains(s))
    }

    /// Any spell of the given kind
    pub fn has_kind(self, kind: SpellKind) -> bool {
        self.iter().any(|s| s.kind() == kind)
    }
}

impl FromIterator<Spell> for SpellSet {
    fn from_iter<I: IntoIterator<Item = Spell>>(iter: I) -> Self {
        let mut set = Self::empty();
        for spell in iter {
            set.insert(spell);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order() {
        for spell in Spell::iter() {
            assert_eq!(spell.info().spell, spell, "table out of order at {spell}");
        }
        assert!(Spell::COUNT <= 64);
    }

    #[test]
    fn test_spell_set() {
        let mut set = SpellSet::of(&[Spell::Arrow, Spell::BreathFire, Spell::Heal]);
        assert_eq!(set.len(), 3);
        assert!(set.contains(Spell::BreathFire));
        set.retain(|s| !s.is_breath());
        assert!(!set.contains(Spell::BreathFire));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Spell::Arrow, Spell::Heal]);
        assert!(set.has_kind(SpellKind::Heal));
    }

    #[test]
    fn test_spell_classes() {
        assert!(Spell::Arrow.is_bolt());
        assert!(Spell::BoltFire.is_bolt());
        assert!(!Spell::BallFire.is_bolt());
        assert!(Spell::Blink.is_self_targeted());
        assert!(!Spell::Blink.needs_los());
        assert!(Spell::SummonKin.needs_los());
        assert!(!Spell::Shriek.needs_los());
    }
}
