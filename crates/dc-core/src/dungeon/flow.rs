//! Noise and scent propagation
//!
//! Noise is a breadth-first travel cost from the player through terrain
//! that carries sound. Scent is a stamp per grid compared against a global
//! epoch counter that ticks down once per player turn.

use log::debug;
use serde::{Deserialize, Serialize};

use super::cave::{Cave, Update};
use super::feature::FeatFlags;
use super::geometry::{Coord, DDD};
use crate::consts::{
    NOISE_CENTER_COST, NOISE_REBUILD_DIST, NOISE_RECOMPUTE, NOISE_STRENGTH, SCENT_EPOCH_MAX,
    SCENT_SKIP, SMELL_STRENGTH,
};

/// Scent freshness offsets around the player; `SCENT_SKIP` is not laid down
const SCENT_ADJUST: [[u8; 5]; 5] = [
    [250, 2, 2, 2, 250],
    [2, 1, 1, 1, 2],
    [2, 1, 0, 1, 2],
    [2, 1, 1, 1, 2],
    [250, 2, 2, 2, 250],
];

/// Trackers for the noise and scent fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowState {
    /// Where the last full noise rebuild started
    pub flow_center: Option<Coord>,
    /// Where the last incremental noise update started
    pub update_center: Option<Coord>,
    /// Noise cost of the update center
    pub cost_at_center: i32,
    /// Global scent counter, ticks down once per turn
    pub scent_epoch: i32,
}

impl Default for FlowState {
    fn default() -> Self {
        Self {
            flow_center: None,
            update_center: None,
            cost_at_center: 0,
            scent_epoch: SCENT_EPOCH_MAX,
        }
    }
}

impl Cave {
    /// Noise cost of a grid, if known
    pub fn noise_cost(&self, at: Coord) -> Option<i32> {
        match self.cell(at).noise {
            0 | NOISE_RECOMPUTE => None,
            cost => Some(i32::from(cost)),
        }
    }

    /// Flow steps from the player's current grid, if known
    pub fn noise_distance(&self, at: Coord) -> Option<i32> {
        self.noise_cost(at)
            .map(|cost| cost - self.flow.cost_at_center)
    }

    /// Age of the scent on a grid (0 is freshest), if there is any
    pub fn scent_age(&self, at: Coord) -> Option<i32> {
        match self.cell(at).scent {
            0 => None,
            stamp => Some(i32::from(stamp) - self.flow.scent_epoch),
        }
    }

    /// Bring the noise field up to date for a player standing at `player`
    pub fn update_noise(&mut self, player: Coord) {
        let forced = self.take_update(Update::FLOW);
        let full = forced
            || self.cell(player).noise == 0
            || match self.flow.flow_center {
                None => true,
                Some(center) => center.chebyshev(player) >= NOISE_REBUILD_DIST,
            };

        if full {
            self.rebuild_noise(player);
            return;
        }

        let Some(update_center) = self.flow.update_center else {
            self.rebuild_noise(player);
            return;
        };

        // Barely moved and can still see the last center
        if update_center.chebyshev(player) < 3 && self.los(player, update_center) {
            return;
        }

        let steps = self.erase_noise(player, update_center);
        let cost = self.flow.cost_at_center - steps;
        if cost < 1 {
            self.rebuild_noise(player);
            return;
        }

        self.flow.cost_at_center = cost;
        self.flow.update_center = Some(player);
        self.spread_noise(player, false);
    }

    /// Zero the noise field and flood it out from `player`
    fn rebuild_noise(&mut self, player: Coord) {
        for cell in self.cells_mut() {
            cell.noise = 0;
        }
        self.flow.flow_center = Some(player);
        self.flow.update_center = Some(player);
        self.flow.cost_at_center = NOISE_CENTER_COST;
        self.spread_noise(player, true);
        debug!("full noise rebuild from ({}, {})", player.y, player.x);
    }

    /// Mark stale costs around the player for recomputation until the old
    /// update center is reached; returns the number of rings walked
    fn erase_noise(&mut self, player: Coord, old_center: Coord) -> i32 {
        let mut this_ring = vec![player];
        let mut next_ring = Vec::new();
        let mut steps = 0;

        while steps < NOISE_STRENGTH && !this_ring.is_empty() {
            steps += 1;
            for &at in &this_ring {
                for dir in DDD {
                    let next = at.step(dir);
                    if !self.in_bounds(next) {
                        continue;
                    }
                    let cost = self.cell(next).noise;
                    if cost == 0 || cost == NOISE_RECOMPUTE {
                        continue;
                    }
                    if next == old_center {
                        return steps;
                    }
                    self.cell_mut(next).noise = NOISE_RECOMPUTE;
                    next_ring.push(next);
                }
            }
            std::mem::swap(&mut this_ring, &mut next_ring);
            next_ring.clear();
        }

        steps + 1
    }

    /// Breadth-first flood of noise costs from `origin`
    ///
    /// A full flood fills every unknown grid; an incremental one fills only
    /// grids marked for recomputation (and grids never reached before).
    fn spread_noise(&mut self, origin: Coord, full: bool) {
        let center = self.flow.cost_at_center;
        self.cell_mut(origin).noise = center.min(254) as u8;

        let mut this_ring = vec![origin];
        let mut next_ring = Vec::new();
        let mut cost = center;

        while cost < center + NOISE_STRENGTH && !this_ring.is_empty() {
            cost += 1;
            let stamp = cost.min(254) as u8;
            for &at in &this_ring {
                for dir in DDD {
                    let next = at.step(dir);
                    if !self.in_bounds(next) {
                        continue;
                    }
                    let cell = self.cell(next);
                    let fill = match cell.noise {
                        0 => true,
                        NOISE_RECOMPUTE => !full,
                        _ => false,
                    };
                    if !fill || !cell.feat.has(FeatFlags::NOISE) {
                        continue;
                    }
                    self.cell_mut(next).noise = stamp;
                    next_ring.push(next);
                }
            }
            std::mem::swap(&mut this_ring, &mut next_ring);
            next_ring.clear();
        }

        // Anything erased but not reached again is unknown
        if !full {
            for cell in self.cells_mut() {
                if cell.noise == NOISE_RECOMPUTE {
                    cell.noise = 0;
                }
            }
        }
    }

    /// Tick the scent epoch and lay fresh scent around the player
    pub fn update_scent(&mut self, player: Coord) {
        self.flow.scent_epoch -= 1;

        // Epoch rollover: drop stale scent, rebase the rest
        if self.flow.scent_epoch <= 0 {
            for cell in self.cells_mut() {
                let stamp = i32::from(cell.scent);
                if stamp == 0 {
                    continue;
                }
                cell.scent = if stamp > SMELL_STRENGTH {
                    0
                } else {
                    (SCENT_EPOCH_MAX + stamp) as u8
                };
            }
            self.flow.scent_epoch = SCENT_EPOCH_MAX;
        }

        let epoch = self.flow.scent_epoch;
        for (i, row) in SCENT_ADJUST.iter().enumerate() {
            for (j, &adjust) in row.iter().enumerate() {
                if adjust == SCENT_SKIP {
                    continue;
                }
                let at = player.offset(i as i32 - 2, j as i32 - 2);
                if !self.in_bounds(at) || !self.feat_has(at, FeatFlags::SCENT) {
                    continue;
                }
                if !self.los(player, at) {
                    continue;
                }
                self.cell_mut(at).scent = (epoch + i32::from(adjust)) as u8;
            }
        }
    }
}
