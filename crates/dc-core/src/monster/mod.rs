//! Monster system
//!
//! Contains species (race) and instance (monst) data, the spell table, and
//! the AI: terrain entry, spell selection, movement and turn processing.

pub mod ai;
mod monst;
pub mod movement;
mod passable;
mod race;
pub mod select;
mod spells;

pub use ai::{process_monster, AiContext, MonsterAction, TurnOutcome};
pub use monst::{Monster, MonsterId};
pub use movement::{MovePlan, Step};
pub use passable::{monster_entry, terrain_entry, Displace, DoorMethod, Entry};
pub use race::{Race, RaceFlags, RaceId, RaceTable};
pub use select::RangedChoice;
pub use spells::{Desire, ResistCategory, Spell, SpellInfo, SpellKind, SpellSet};
