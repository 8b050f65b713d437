//! Field of view
//!
//! Recomputes which grids the player can see. "In view" (`VIEW`) is pure
//! geometry; "seen" (`SEEN`) additionally needs light, either from the
//! player's light source or from a permanently lit (`GLOW`) grid.

use std::sync::OnceLock;

use super::cave::{Cave, Update};
use super::cell::CellFlags;
use super::feature::FeatFlags;
use super::geometry::{Coord, distance};
use crate::consts::MAX_SIGHT;
use crate::options::SimOptions;
use crate::player::PlayerState;

/// Receives per-grid notifications from the visibility pass
pub trait MapSink {
    /// The grid's appearance may have changed
    fn redraw(&mut self, at: Coord);

    /// The grid was memorized for the first time
    fn memorized(&mut self, _at: Coord) {}
}

/// Sink that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MapSink for NullSink {
    fn redraw(&mut self, _at: Coord) {}
}

/// Sink that records redraw requests
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub redrawn: Vec<Coord>,
    pub memorized: Vec<Coord>,
}

impl MapSink for RecordingSink {
    fn redraw(&mut self, at: Coord) {
        self.redrawn.push(at);
    }

    fn memorized(&mut self, at: Coord) {
        self.memorized.push(at);
    }
}

/// Offsets within sight range, nearest first
///
/// Ties in distance are broken by Manhattan length so a grid's neighbours
/// on the player's side are always handled before it.
fn view_offsets() -> &'static [(i32, i32)] {
    static OFFSETS: OnceLock<Vec<(i32, i32)>> = OnceLock::new();
    OFFSETS.get_or_init(|| {
        let origin = Coord::new(0, 0);
        let mut offsets = Vec::new();
        for dy in -MAX_SIGHT..=MAX_SIGHT {
            for dx in -MAX_SIGHT..=MAX_SIGHT {
                if (dy, dx) == (0, 0) {
                    continue;
                }
                if distance(origin, Coord::new(dy, dx)) <= MAX_SIGHT {
                    offsets.push((dy, dx));
                }
            }
        }
        offsets.sort_by_key(|&(dy, dx)| {
            (distance(origin, Coord::new(dy, dx)), dy.abs() + dx.abs())
        });
        offsets
    })
}

impl Cave {
    /// Recompute the player's field of view
    pub fn update_view(&mut self, player: &PlayerState, opts: &SimOptions, sink: &mut dyn MapSink) {
        self.take_update(Update::VIEW);

        // Remember what was seen, then forget it
        for cell in self.cells_mut() {
            if cell.flags.contains(CellFlags::SEEN) {
                cell.flags.insert(CellFlags::TEMP);
            }
            cell.flags.remove(CellFlags::VIEW | CellFlags::SEEN);
        }

        let blind = player.is_blind();
        let radius = if player.light_radius > 0 {
            player.light_radius + 1
        } else if player.unlight {
            opts.unlight_radius
        } else {
            0
        };

        let origin = player.pos;
        if self.in_bounds(origin) {
            let flags = &mut self.cell_mut(origin).flags;
            flags.insert(CellFlags::VIEW);
            if !blind && (radius > 0 || flags.contains(CellFlags::GLOW)) {
                flags.insert(CellFlags::SEEN);
            }

            for &(dy, dx) in view_offsets() {
                let at = origin.offset(dy, dx);
                if self.in_bounds(at) {
                    self.update_view_one(origin, at, radius, blind);
                }
            }
        }

        // Commit: memorize and redraw whatever changed
        for at in self.coords() {
            let flags = self.cell(at).flags;
            let seen = flags.contains(CellFlags::SEEN);
            if seen != flags.contains(CellFlags::TEMP) {
                if seen {
                    self.note_spot(at, opts, sink);
                }
                sink.redraw(at);
            }
            self.cell_mut(at).flags.remove(CellFlags::TEMP);
        }
    }

    fn update_view_one(&mut self, origin: Coord, at: Coord, radius: i32, blind: bool) {
        let wall = self.cell(at).is_wall();
        let sy = (origin.y - at.y).signum();
        let sx = (origin.x - at.x).signum();

        // Walls are tested one step closer so their near face lights up
        let mut target = at;
        if wall {
            let nudged = at.offset(sy, sx);
            if !self.cell(nudged).is_wall() {
                target = nudged;
            }
        }

        if !self.los(origin, target) {
            return;
        }

        self.cell_mut(at).flags.insert(CellFlags::VIEW);
        if blind {
            return;
        }

        let flags = self.cell(at).flags;
        let seen = if distance(origin, at) < radius {
            true
        } else if !flags.contains(CellFlags::GLOW) {
            false
        } else if !wall {
            true
        } else {
            // Lit walls need a lit, visible neighbour on the player's side
            let lit_view = CellFlags::VIEW | CellFlags::GLOW;
            [(sy, 0), (0, sx), (sy, sx)]
                .into_iter()
                .filter(|&step| step != (0, 0))
                .any(|(dy, dx)| self.cell(at.offset(dy, dx)).flags.contains(lit_view))
        };

        if seen {
            self.cell_mut(at).flags.insert(CellFlags::SEEN);
        }
    }

    /// Memorize a grid the player has just seen
    pub fn note_spot(&mut self, at: Coord, opts: &SimOptions, sink: &mut dyn MapSink) {
        let cell = self.cell(at);
        if cell.flags.contains(CellFlags::MARK) {
            return;
        }
        let memorable = cell.feat.has(FeatFlags::INTERESTING)
            || (opts.remember_floors && cell.feat.is_floor());
        if memorable {
            self.cell_mut(at).flags.insert(CellFlags::MARK);
            sink.memorized(at);
        }
    }

    /// Drop the whole field of view (level change, blindness onset)
    pub fn forget_view(&mut self, sink: &mut dyn MapSink) {
        for at in self.coords() {
            let flags = &mut self.cell_mut(at).flags;
            let was_seen = flags.contains(CellFlags::SEEN);
            flags.remove(CellFlags::VIEW | CellFlags::SEEN | CellFlags::TEMP);
            if was_seen {
                sink.redraw(at);
            }
        }
    }

    /// Grid is in the player's raw field of view
    pub fn player_has_los(&self, at: Coord) -> bool {
        self.in_bounds(at) && self.has_flag(at, CellFlags::VIEW)
    }

    /// Grid is in view and lit
    pub fn player_can_see(&self, at: Coord) -> bool {
        self.in_bounds(at) && self.has_flag(at, CellFlags::SEEN)
    }

    /// Light a rectangle permanently (used by generation)
    pub fn glow_rect(&mut self, y1: i32, x1: i32, y2: i32, x2: i32) {
        for y in y1..=y2 {
            for x in x1..=x2 {
                let at = Coord::new(y, x);
                if self.in_bounds(at) {
                    self.cell_mut(at).flags.insert(CellFlags::GLOW);
                }
            }
        }
    }
}
