//! Carving primitives shared by the room builders

use crate::dungeon::{Cave, CellFlags, Coord, Feat};
use crate::rng::GameRng;

impl Cave {
    /// Set every grid of a rectangle (inclusive) to `feat`
    ///
    /// Grids outside the level are skipped.
    pub fn fill_rect(&mut self, y1: i32, x1: i32, y2: i32, x2: i32, feat: Feat) {
        for y in y1..=y2 {
            for x in x1..=x2 {
                let at = Coord::new(y, x);
                if self.in_bounds(at) {
                    self.set_feat(at, feat);
                }
            }
        }
    }

    /// Draw the outline of a rectangle
    pub fn draw_rect(&mut self, y1: i32, x1: i32, y2: i32, x2: i32, feat: Feat) {
        for y in y1..=y2 {
            self.set_in_bounds(Coord::new(y, x1), feat);
            self.set_in_bounds(Coord::new(y, x2), feat);
        }
        for x in x1..=x2 {
            self.set_in_bounds(Coord::new(y1, x), feat);
            self.set_in_bounds(Coord::new(y2, x), feat);
        }
    }

    /// Draw a vertical and a horizontal line through the middle of a rectangle
    pub fn draw_plus(&mut self, y1: i32, x1: i32, y2: i32, x2: i32, feat: Feat) {
        let y0 = (y1 + y2) / 2;
        let x0 = (x1 + x2) / 2;
        for y in y1..=y2 {
            self.set_in_bounds(Coord::new(y, x0), feat);
        }
        for x in x1..=x2 {
            self.set_in_bounds(Coord::new(y0, x), feat);
        }
    }

    /// Draw both diagonals of a rectangle
    pub fn draw_cross(&mut self, y1: i32, x1: i32, y2: i32, x2: i32, feat: Feat) {
        let height = y2 - y1;
        let width = x2 - x1;
        let steps = height.max(width);
        if steps <= 0 {
            self.set_in_bounds(Coord::new(y1, x1), feat);
            return;
        }
        for i in 0..=steps {
            let dy = i * height / steps;
            let dx = i * width / steps;
            self.set_in_bounds(Coord::new(y1 + dy, x1 + dx), feat);
            self.set_in_bounds(Coord::new(y1 + dy, x2 - dx), feat);
        }
    }

    /// Open the middle of one random side of a rectangle
    pub fn open_one_side(&mut self, y1: i32, x1: i32, y2: i32, x2: i32, feat: Feat, rng: &mut GameRng) {
        let y0 = (y1 + y2) / 2;
        let x0 = (x1 + x2) / 2;
        let at = match rng.rn2(4) {
            0 => Coord::new(y1, x0),
            1 => Coord::new(y2, x0),
            2 => Coord::new(y0, x1),
            _ => Coord::new(y0, x2),
        };
        self.set_in_bounds(at, feat);
    }

    /// Open the middle of all four sides of a rectangle
    pub fn open_all_sides(&mut self, y1: i32, x1: i32, y2: i32, x2: i32, feat: Feat) {
        let y0 = (y1 + y2) / 2;
        let x0 = (x1 + x2) / 2;
        for at in [
            Coord::new(y1, x0),
            Coord::new(y2, x0),
            Coord::new(y0, x1),
            Coord::new(y0, x2),
        ] {
            self.set_in_bounds(at, feat);
        }
    }

    /// Flag a rectangle as part of a room, optionally lit
    pub fn mark_room(&mut self, y1: i32, x1: i32, y2: i32, x2: i32, light: bool) {
        let mut flags = CellFlags::ROOM;
        if light {
            flags |= CellFlags::GLOW;
        }
        self.add_flags(y1, x1, y2, x2, flags);
    }

    /// Reserve a rectangle so later carving leaves it alone
    pub fn mark_icky(&mut self, y1: i32, x1: i32, y2: i32, x2: i32) {
        self.add_flags(y1, x1, y2, x2, CellFlags::ICKY);
    }

    /// True if no grid in the rectangle is reserved or occupied
    pub fn is_rect_clear(&self, y1: i32, x1: i32, y2: i32, x2: i32) -> bool {
        (y1..=y2).all(|y| {
            (x1..=x2).all(|x| {
                let at = Coord::new(y, x);
                self.in_bounds(at) && {
                    let cell = self.cell(at);
                    !cell.is_icky() && !cell.is_occupied()
                }
            })
        })
    }

    fn add_flags(&mut self, y1: i32, x1: i32, y2: i32, x2: i32, flags: CellFlags) {
        for y in y1..=y2 {
            for x in x1..=x2 {
                let at = Coord::new(y, x);
                if self.in_bounds(at) {
                    self.cell_mut(at).flags |= flags;
                }
            }
        }
    }

    fn set_in_bounds(&mut self, at: Coord, feat: Feat) {
        if self.in_bounds(at) {
            self.set_feat(at, feat);
        }
    }
}

/// A random grid strictly inside a rectangle
pub(crate) fn random_inside(y1: i32, x1: i32, y2: i32, x2: i32, rng: &mut GameRng) -> Coord {
    Coord::new(
        y1 + 1 + rng.rn2((y2 - y1 - 1).max(1)),
        x1 + 1 + rng.rn2((x2 - x1 - 1).max(1)),
    )
}
