//! The turn pipeline
//!
//! One world turn: field of view, then the noise and scent fields, then
//! every monster once. The exclusive borrow of the `Cave` is the only lock
//! the simulation needs.

use log::{trace, warn};

use crate::dungeon::{Cave, Coord, MapSink, Update};
use crate::monster::{AiContext, MonsterId, RaceTable, TurnOutcome, process_monster};
use crate::options::SimOptions;
use crate::player::PlayerState;
use crate::rng::GameRng;

/// What happened during a world turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// How many times the field of view was recomputed
    pub view_updates: u32,
    /// One entry per monster that got a turn, in list order
    pub outcomes: Vec<(MonsterId, TurnOutcome)>,
    /// The player stands on the edge of a trap-detected area
    pub detect_edge: bool,
}

impl TurnReport {
    /// Melee attacks aimed at the player
    pub fn attacks(&self) -> impl Iterator<Item = (MonsterId, Coord)> + '_ {
        self.outcomes.iter().filter_map(|&(id, outcome)| match outcome {
            TurnOutcome::Attacked(at) => Some((id, at)),
            _ => None,
        })
    }

    /// Monsters that did something other than sleep or idle
    pub fn active(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| {
                !matches!(
                    outcome,
                    TurnOutcome::Idle
                        | TurnOutcome::Asleep
                        | TurnOutcome::InStasis
                        | TurnOutcome::Passive
                )
            })
            .count()
    }
}

/// Run one world turn
///
/// The player snapshot is authoritative for the player's position; the
/// map is brought in line with it first. Terrain changes made by monsters
/// are reflected in a second view pass before returning.
#[allow(clippy::too_many_arguments)]
pub fn process_world_turn(
    cave: &mut Cave,
    player: &PlayerState,
    races: &RaceTable,
    opts: &SimOptions,
    turn: u64,
    rng: &mut GameRng,
    sink: &mut dyn MapSink,
) -> TurnReport {
    let mut report = TurnReport::default();

    if !cave.in_bounds(player.pos) {
        warn!("player at ({}, {}) is off the map", player.pos.y, player.pos.x);
        return report;
    }
    if cave.player_pos() != Some(player.pos) {
        if cave.monster_at(player.pos).is_some() {
            warn!(
                "player moved onto a monster at ({}, {}); keeping the old position",
                player.pos.y, player.pos.x
            );
        } else if cave.place_player(player.pos).is_err() {
            return report;
        }
    }

    report.detect_edge = cave.player_pos().is_some_and(|at| cave.on_detect_edge(at));

    if cave.pending().contains(Update::VIEW) {
        cave.update_view(player, opts, sink);
        report.view_updates += 1;
    }

    cave.update_noise(player.pos);
    cave.update_scent(player.pos);

    let ctx = AiContext {
        races,
        player,
        options: opts,
        turn,
    };
    for id in cave.monster_ids() {
        // Killed or displaced out of existence earlier this turn
        if cave.monster(id).is_none() {
            continue;
        }
        let outcome = process_monster(cave, id, &ctx, rng);
        report.outcomes.push((id, outcome));
    }

    if cave.pending().contains(Update::VIEW) {
        cave.update_view(player, opts, sink);
        report.view_updates += 1;
    }

    trace!(
        "turn {turn}: {} monsters, {} active",
        report.outcomes.len(),
        report.active()
    );
    report
}
