//! Distance, line of sight and projection paths
//!
//! All three use integer fixed-point slopes so results are exact and
//! reproducible. `los` and `trace_path` deliberately use different
//! stepping rules: sight is symmetric, projectiles follow the octagonal
//! distance metric.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::cave::Cave;
use crate::consts::{MAX_LOS_DELTA, MAX_RANGE};

/// A dungeon grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coord {
    pub y: i32,
    pub x: i32,
}

impl Coord {
    pub const fn new(y: i32, x: i32) -> Self {
        Self { y, x }
    }

    pub const fn offset(self, dy: i32, dx: i32) -> Self {
        Self {
            y: self.y + dy,
            x: self.x + dx,
        }
    }

    /// Neighbour in a keypad direction (1-9, 5 is "stay")
    pub const fn step(self, dir: u8) -> Self {
        let d = if dir > 9 { 5 } else { dir as usize };
        self.offset(DDY[d], DDX[d])
    }

    /// King-move distance
    pub const fn chebyshev(self, other: Coord) -> i32 {
        let ay = (self.y - other.y).abs();
        let ax = (self.x - other.x).abs();
        if ay > ax { ay } else { ax }
    }

    /// Adjacent or identical
    pub const fn is_adjacent(self, other: Coord) -> bool {
        self.chebyshev(other) <= 1
    }
}

/// Keypad direction offsets, indexed by direction 0-9
pub const DDY: [i32; 10] = [0, 1, 1, 1, 0, 0, 0, -1, -1, -1];
pub const DDX: [i32; 10] = [0, -1, 0, 1, -1, 0, 1, -1, 0, 1];

/// The eight directions, orthogonals first
pub const DDD: [u8; 8] = [2, 8, 6, 4, 3, 1, 9, 7];

/// Keypad direction for a unit offset
pub const fn direction_of(dy: i32, dx: i32) -> u8 {
    let sy = dy.signum();
    let sx = dx.signum();
    ((1 - sy) * 3 + sx + 2) as u8
}

/// Approximate Euclidean distance: `max + min / 2` of the axis deltas
pub fn distance(a: Coord, b: Coord) -> i32 {
    let ay = (a.y - b.y).abs();
    let ax = (a.x - b.x).abs();
    if ay > ax { ay + ax / 2 } else { ax + ay / 2 }
}

bitflags! {
    /// Projection path options
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ProjectFlags: u8 {
        /// Stop at the first occupied grid
        const STOP = 0x01;
        /// Continue past the destination
        const THRU = 0x02;
        /// Note (without stopping) that an occupied grid was crossed
        const CHCK = 0x04;
    }
}

/// Outcome of `Cave::can_project`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Projection {
    /// The destination cannot be reached at all
    No,
    /// Reachable, but something may be in the way
    NotClear,
    /// Verified clear shot
    Clear,
}

/// Path buffer size used by `can_project`
pub const PATH_SIZE: usize = 512;

impl Cave {
    /// Whether a sight line exists between two grid centers
    ///
    /// Adjacent grids always see each other. A knight's move sees past a
    /// single blocking corner when the grid one step along the long axis is
    /// open. Apart from that special case the result is symmetric.
    pub fn los(&self, from: Coord, to: Coord) -> bool {
        let dy = to.y - from.y;
        let dx = to.x - from.x;
        let ay = dy.abs();
        let ax = dx.abs();

        debug_assert!(
            ay <= MAX_LOS_DELTA && ax <= MAX_LOS_DELTA,
            "los delta ({dy}, {dx}) out of range"
        );

        if ax < 2 && ay < 2 {
            return true;
        }

        // Directly north/south
        if dx == 0 {
            let sy = dy.signum();
            let mut ty = from.y + sy;
            while ty != to.y {
                if !self.projects_at(ty, from.x) {
                    return false;
                }
                ty += sy;
            }
            return true;
        }

        // Directly east/west
        if dy == 0 {
            let sx = dx.signum();
            let mut tx = from.x + sx;
            while tx != to.x {
                if !self.projects_at(from.y, tx) {
                    return false;
                }
                tx += sx;
            }
            return true;
        }

        let sy = dy.signum();
        let sx = dx.signum();

        // Knight's moves
        if ax == 1 {
            if ay == 2 && self.projects_at(from.y + sy, from.x) {
                return true;
            }
        } else if ay == 1 && ax == 2 && self.projects_at(from.y, from.x + sx) {
            return true;
        }

        // Scale factor div 2, and scale factor
        let f2 = ax * ay;
        let f1 = f2 << 1;

        if ax >= ay {
            // Travel horizontally; m = dy / dx * f1
            let mut qy = ay * ay;
            let m = qy << 1;
            let mut tx = from.x + sx;
            let mut ty = from.y;

            // Slope of exactly one
            if qy == f2 {
                ty += sy;
                qy -= f1;
            }

            while tx != to.x {
                if !self.projects_at(ty, tx) {
                    return false;
                }
                qy += m;
                if qy < f2 {
                    tx += sx;
                } else if qy > f2 {
                    ty += sy;
                    if !self.projects_at(ty, tx) {
                        return false;
                    }
                    qy -= f1;
                    tx += sx;
                } else {
                    // Line meets the corner exactly
                    ty += sy;
                    qy -= f1;
                    tx += sx;
                }
            }
        } else {
            // Travel vertically; m = dx / dy * f1
            let mut qx = ax * ax;
            let m = qx << 1;
            let mut ty = from.y + sy;
            let mut tx = from.x;

            if qx == f2 {
                tx += sx;
                qx -= f1;
            }

            while ty != to.y {
                if !self.projects_at(ty, tx) {
                    return false;
                }
                qx += m;
                if qx < f2 {
                    ty += sy;
                } else if qx > f2 {
                    tx += sx;
                    if !self.projects_at(ty, tx) {
                        return false;
                    }
                    qx -= f1;
                    ty += sy;
                } else {
                    tx += sx;
                    qx -= f1;
                    ty += sy;
                }
            }
        }

        true
    }

    /// Trace the grids a projection passes through from `src` toward `dst`
    ///
    /// Writes into `path` and returns the number of grids written. The path
    /// always stops at the first grid that blocks projections, at `range`
    /// (octagonal distance) and before overrunning the buffer, so the count
    /// is always below `path.len()`. `STOP` ends the path at the first
    /// occupied grid, `THRU` continues past the destination.
    ///
    /// With `CHCK`, crossing an occupied grid other than the destination is
    /// reported by returning the count negated. Returns 0 iff `src == dst`.
    pub fn trace_path(
        &self,
        path: &mut [Coord],
        range: i32,
        src: Coord,
        dst: Coord,
        flags: ProjectFlags,
    ) -> i32 {
        assert!(path.len() >= 2, "trace_path needs room for at least one grid");

        if src == dst {
            return 0;
        }

        let cap = path.len() - 1;
        let (ay, sy) = if dst.y < src.y {
            (src.y - dst.y, -1)
        } else {
            (dst.y - src.y, 1)
        };
        let (ax, sx) = if dst.x < src.x {
            (src.x - dst.x, -1)
        } else {
            (dst.x - src.x, 1)
        };

        // Units in half a grid, and in a full grid
        let half = ay * ax;
        let full = half << 1;

        let mut n: usize = 0;
        let mut k: i32 = 0;
        let mut blocked = false;

        // Stop tests shared by every branch; true means "end the path here"
        let mut stop_here = |at: Coord, n: usize| -> bool {
            if !flags.contains(ProjectFlags::THRU) && at == dst {
                return true;
            }
            if !self.in_bounds(at) || !self.projects_at(at.y, at.x) {
                return true;
            }
            let occupied = self.cell(at).is_occupied();
            if flags.contains(ProjectFlags::STOP) && occupied {
                return true;
            }
            if flags.contains(ProjectFlags::CHCK) && occupied && at != dst {
                blocked = true;
            }
            n >= cap
        };

        if ay > ax {
            // Vertical: start at the tile edge
            let mut frac = ax * ax;
            let m = frac << 1;
            let mut at = Coord::new(src.y + sy, src.x);
            loop {
                path[n] = at;
                n += 1;
                if n as i32 + (k >> 1) >= range {
                    break;
                }
                if stop_here(at, n) {
                    break;
                }
                if m != 0 {
                    frac += m;
                    if frac >= half {
                        at.x += sx;
                        frac -= full;
                        k += 1;
                    }
                }
                at.y += sy;
            }
        } else if ax > ay {
            // Horizontal
            let mut frac = ay * ay;
            let m = frac << 1;
            let mut at = Coord::new(src.y, src.x + sx);
            loop {
                path[n] = at;
                n += 1;
                if n as i32 + (k >> 1) >= range {
                    break;
                }
                if stop_here(at, n) {
                    break;
                }
                if m != 0 {
                    frac += m;
                    if frac >= half {
                        at.y += sy;
                        frac -= full;
                        k += 1;
                    }
                }
                at.x += sx;
            }
        } else {
            // Diagonal
            let mut at = Coord::new(src.y + sy, src.x + sx);
            loop {
                path[n] = at;
                n += 1;
                if n as i32 + (n as i32 >> 1) >= range {
                    break;
                }
                if stop_here(at, n) {
                    break;
                }
                at.y += sy;
                at.x += sx;
            }
        }

        if blocked { -(n as i32) } else { n as i32 }
    }

    /// Whether a projection from `src` can reach `dst`
    ///
    /// The path must end on `dst` and `dst` must be open to projections.
    /// A clear shot is only promised when `STOP` or `CHCK` verified it.
    pub fn can_project(&self, src: Coord, dst: Coord, flags: ProjectFlags) -> Projection {
        let mut path = [Coord::default(); PATH_SIZE];
        let n = self.trace_path(&mut path, MAX_RANGE, src, dst, flags);
        if n == 0 {
            return Projection::No;
        }

        let blocked = n < 0;
        let last = path[n.unsigned_abs() as usize - 1];
        if last != dst || !self.in_bounds(last) || !self.projects_at(last.y, last.x) {
            return Projection::No;
        }
        if blocked {
            return Projection::NotClear;
        }
        if flags.intersects(ProjectFlags::STOP | ProjectFlags::CHCK) {
            Projection::Clear
        } else {
            Projection::NotClear
        }
    }

    /// Whether a bolt from `src` would hit `dst` without striking anyone
    /// on the way
    pub fn clean_shot(&self, src: Coord, dst: Coord) -> bool {
        self.can_project(src, dst, ProjectFlags::CHCK) == Projection::Clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::Feat;

    fn open_cave() -> Cave {
        let mut cave = Cave::new();
        cave.fill_rect(1, 1, 40, 80, Feat::Floor);
        cave
    }

    #[test]
    fn test_distance_scenarios() {
        assert_eq!(distance(Coord::new(0, 0), Coord::new(0, 5)), 5);
        assert_eq!(distance(Coord::new(0, 0), Coord::new(3, 4)), 5);
        assert_eq!(distance(Coord::new(7, 7), Coord::new(7, 7)), 0);
        assert_eq!(distance(Coord::new(2, 9), Coord::new(12, 9)), 10);
    }

    #[test]
    fn test_direction_of() {
        for dir in [1u8, 2, 3, 4, 6, 7, 8, 9] {
            let d = dir as usize;
            assert_eq!(direction_of(DDY[d], DDX[d]), dir);
        }
        assert_eq!(direction_of(0, 0), 5);
        assert_eq!(direction_of(-7, 3), 9);
    }

    #[test]
    fn test_los_straight_line() {
        let mut cave = open_cave();
        let a = Coord::new(5, 5);
        let b = Coord::new(5, 8);
        assert!(cave.los(a, b));
        cave.set_feat(Coord::new(5, 6), Feat::Granite);
        assert!(!cave.los(a, b));
        assert!(!cave.los(b, a));
    }

    #[test]
    fn test_los_adjacent_through_walls() {
        let mut cave = Cave::new();
        let a = Coord::new(10, 10);
        assert!(cave.los(a, a.offset(1, 1)));
        cave.set_feat(a, Feat::Granite);
        assert!(cave.los(a, a.offset(-1, 0)));
    }

    #[test]
    fn test_los_knight_move() {
        let mut cave = open_cave();
        let a = Coord::new(10, 10);
        let b = Coord::new(12, 11);
        // Block the diagonal side so only the knight shortcut can succeed
        cave.set_feat(Coord::new(11, 11), Feat::Granite);
        assert!(cave.los(a, b));
    }

    #[test]
    fn test_los_diagonal_blocked() {
        let mut cave = open_cave();
        let a = Coord::new(10, 10);
        let b = Coord::new(14, 14);
        assert!(cave.los(a, b));
        cave.set_feat(Coord::new(12, 12), Feat::Rubble);
        assert!(!cave.los(a, b));
    }

    #[test]
    fn test_trace_path_basic() {
        let cave = open_cave();
        let mut path = [Coord::default(); 32];
        let src = Coord::new(10, 10);
        let dst = Coord::new(10, 15);
        let n = cave.trace_path(&mut path, MAX_RANGE, src, dst, ProjectFlags::empty());
        assert_eq!(n, 5);
        assert_eq!(path[4], dst);
        assert_eq!(cave.trace_path(&mut path, MAX_RANGE, src, src, ProjectFlags::empty()), 0);
    }

    #[test]
    fn test_trace_path_stops_at_wall() {
        let mut cave = open_cave();
        cave.set_feat(Coord::new(10, 13), Feat::Granite);
        let mut path = [Coord::default(); 32];
        let n = cave.trace_path(
            &mut path,
            MAX_RANGE,
            Coord::new(10, 10),
            Coord::new(10, 20),
            ProjectFlags::empty(),
        );
        assert_eq!(n, 3);
        assert_eq!(path[2], Coord::new(10, 13));
    }

    #[test]
    fn test_trace_path_respects_small_buffer() {
        let cave = open_cave();
        let mut path = [Coord::default(); 4];
        let n = cave.trace_path(
            &mut path,
            MAX_RANGE,
            Coord::new(10, 10),
            Coord::new(10, 30),
            ProjectFlags::empty(),
        );
        assert!(n.unsigned_abs() < 4);
    }

    #[test]
    fn test_trace_path_range_limit() {
        let cave = open_cave();
        let mut path = [Coord::default(); 64];
        let n = cave.trace_path(
            &mut path,
            5,
            Coord::new(10, 10),
            Coord::new(10, 40),
            ProjectFlags::empty(),
        );
        assert_eq!(n, 5);
    }

    #[test]
    fn test_can_project_and_occupancy() {
        let mut cave = open_cave();
        let src = Coord::new(10, 10);
        let dst = Coord::new(10, 16);
        assert_eq!(cave.can_project(src, dst, ProjectFlags::CHCK), Projection::Clear);
        assert_eq!(cave.can_project(src, dst, ProjectFlags::empty()), Projection::NotClear);
        assert_eq!(cave.can_project(src, src, ProjectFlags::empty()), Projection::No);

        // Someone standing in the line of fire
        cave.cell_mut(Coord::new(10, 13)).occupant = 3;
        assert_eq!(cave.can_project(src, dst, ProjectFlags::CHCK), Projection::NotClear);
        assert_eq!(cave.can_project(src, dst, ProjectFlags::STOP), Projection::No);
        assert!(!cave.clean_shot(src, dst));

        // Destination inside a wall
        cave.set_feat(dst, Feat::Granite);
        assert_eq!(cave.can_project(src, dst, ProjectFlags::empty()), Projection::No);
    }
}
