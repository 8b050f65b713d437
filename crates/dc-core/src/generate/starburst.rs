//! Starburst rooms
//!
//! Organic room shapes. The room is cut into angular arcs around its
//! center; each arc gets a radius that varies only a little from its
//! neighbour's, and every grid within its arc's radius is carved.

use std::sync::OnceLock;

use crate::consts::{ANGLE_TABLE_SPAN, MAX_ARCS};
use crate::dungeon::{distance, Cave, CellFlags, Coord, Feat, FeatFlags, DDD};
use crate::error::GenError;
use crate::rng::GameRng;

const TABLE_SIZE: usize = ANGLE_TABLE_SPAN as usize + 1;
const TABLE_MID: i32 = ANGLE_TABLE_SPAN / 2;

/// Half-degree angle (0..180) from the table center to each entry
fn angle_table() -> &'static [[u8; TABLE_SIZE]; TABLE_SIZE] {
    static TABLE: OnceLock<[[u8; TABLE_SIZE]; TABLE_SIZE]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [[0u8; TABLE_SIZE]; TABLE_SIZE];
        for (ny, row) in table.iter_mut().enumerate() {
            for (nx, entry) in row.iter_mut().enumerate() {
                let dy = ny as i32 - TABLE_MID;
                let dx = nx as i32 - TABLE_MID;
                if dy == 0 && dx == 0 {
                    continue;
                }
                let mut degrees = f64::from(-dy).atan2(f64::from(dx)).to_degrees();
                if degrees < 0.0 {
                    degrees += 360.0;
                }
                *entry = ((degrees / 2.0) as i32).clamp(0, 179) as u8;
            }
        }
        table
    })
}

/// One angular slice of the room
#[derive(Debug, Clone, Copy)]
struct Arc {
    /// First half-degree covered
    start: i32,
    radius: i32,
}

/// Carve a starburst of `feat` inside the rectangle (inclusive)
///
/// Only grids strictly inside the rectangle are carved. Reserved (icky)
/// and occupied grids are left alone. Floor rooms get their granite rim
/// promoted to outer walls.
#[allow(clippy::too_many_arguments)]
pub fn generate_starburst_room(
    cave: &mut Cave,
    y1: i32,
    x1: i32,
    y2: i32,
    x2: i32,
    feat: Feat,
    light: bool,
    special_ok: bool,
    rng: &mut GameRng,
) -> Result<(), GenError> {
    if y2 - y1 < 2
        || x2 - x1 < 2
        || !cave.in_bounds(Coord::new(y1, x1))
        || !cave.in_bounds(Coord::new(y2, x2))
    {
        return Err(GenError::BadBounds { y1, x1, y2, x2 });
    }

    let height = 1 + y2 - y1;
    let width = 1 + x2 - x1;

    if height > 5 * width / 2 || width > 5 * height / 2 {
        split_room(cave, y1, x1, y2, x2, feat, light, rng);
        return Ok(());
    }

    // The angle table only spans 40 grids; shrink offsets for bigger rooms
    let dist_conv = if width > 44 || height > 44 {
        10 * width.max(height) / 44
    } else {
        10
    };

    let cloverleaf = special_ok && height > 10 && rng.one_in(20);
    let arc_num = if cloverleaf {
        12
    } else {
        (8 + height * width / 80 + 3 - rng.rn2(7)).clamp(8, MAX_ARCS as i32)
    };

    let arcs = plan_arcs(arc_num, height, width, feat, cloverleaf, rng);

    let y0 = y1 + height / 2;
    let x0 = x1 + width / 2;
    let center = Coord::new(y0, x0);
    let dist_check = 21 * dist_conv / 10;
    let table = angle_table();
    let seamless = !feat.is_floor() && feat.is_passable();

    for y in (y1 + 1)..y2 {
        for x in (x1 + 1)..x2 {
            let at = Coord::new(y, x);
            if !is_carvable(cave, at) {
                continue;
            }

            let dist = distance(center, at);
            if dist >= dist_check {
                continue;
            }

            let ny = TABLE_MID + 10 * (y - y0) / dist_conv;
            let nx = TABLE_MID + 10 * (x - x0) / dist_conv;
            if !(0..=ANGLE_TABLE_SPAN).contains(&ny) || !(0..=ANGLE_TABLE_SPAN).contains(&nx) {
                continue;
            }
            let degree = i32::from(table[ny as usize][nx as usize]);

            let Some(arc) = arcs.iter().rev().find(|arc| arc.start <= degree) else {
                continue;
            };
            if arc.radius < dist {
                continue;
            }

            // Passable decorations only cover open ground, thicker in the middle
            if seamless
                && !(cave.feat(at).is_floor() && rng.rnd(arc.radius + 5) >= dist + 5)
            {
                continue;
            }

            place(cave, at, feat, light);
        }
    }

    if feat.is_floor() || feat.is_extra_granite() {
        outline_room(cave, y1, x1, y2, x2, light);
    }

    Ok(())
}

/// Pick start angles and radii for every arc
fn plan_arcs(
    arc_num: i32,
    height: i32,
    width: i32,
    feat: Feat,
    cloverleaf: bool,
    rng: &mut GameRng,
) -> Vec<Arc> {
    let mut arcs: Vec<Arc> = Vec::with_capacity(arc_num as usize);
    let mut degree_first = 0;

    for i in 0..arc_num {
        let start = degree_first;

        degree_first += (180 + rng.rn2(arc_num)) / arc_num;
        degree_first = degree_first
            .max(180 * (i + 1) / arc_num)
            .min((180 + arc_num) * (i + 1) / arc_num);

        // Sum of two half-degrees: the arc's midpoint in whole degrees
        let center_of_arc = degree_first + start;
        let previous = arcs.last().map(|arc| arc.radius);

        let mut radius = if (45 < center_of_arc && center_of_arc < 135)
            || (225 < center_of_arc && center_of_arc < 315)
        {
            height / 4 + rng.rn2((height + 3) / 4)
        } else if center_of_arc < 45
            || center_of_arc > 315
            || (135 < center_of_arc && center_of_arc < 225)
        {
            width / 4 + rng.rn2((width + 3) / 4)
        } else if let Some(previous) = previous {
            if cloverleaf { 0 } else { previous + 3 - rng.rn2(7) }
        } else {
            0
        };

        if !cloverleaf && i != 0 && i != arc_num - 1 {
            if let Some(previous) = previous {
                radius = if feat.has(FeatFlags::WATER) {
                    radius.clamp(previous - 2, previous + 2)
                } else {
                    radius.clamp(2 * (previous - 1) / 3, 3 * (previous + 1) / 2)
                };
            }
        }

        // Make the last arc meet the first smoothly
        if i == arc_num - 1 {
            if let Some(first) = arcs.first().map(|arc| arc.radius) {
                if (radius - first).abs() > 3 {
                    if radius > first {
                        radius -= rng.rn2(radius - first);
                    } else {
                        radius += rng.rn2(first - radius);
                    }
                }
            }
        }

        arcs.push(Arc {
            start,
            radius: radius.max(0),
        });
    }

    arcs
}

/// Split an elongated room into two overlapping starbursts
#[allow(clippy::too_many_arguments)]
fn split_room(
    cave: &mut Cave,
    y1: i32,
    x1: i32,
    y2: i32,
    x2: i32,
    feat: Feat,
    light: bool,
    rng: &mut GameRng,
) {
    let height = 1 + y2 - y1;
    let width = 1 + x2 - x1;
    let tall = height > width;

    // First room: top or left two thirds
    let (ay, ax) = if tall {
        (y1 + 2 * height / 3, x2)
    } else {
        (y2, x1 + 2 * width / 3)
    };
    // Second room: bottom or right two thirds
    let (by, bx) = if tall {
        (y1 + height / 3, x1)
    } else {
        (y1, x1 + width / 3)
    };

    // Pieces too small to carve are simply skipped
    let _ = generate_starburst_room(cave, y1, x1, ay, ax, feat, light, false, rng);
    let _ = generate_starburst_room(cave, by, bx, y2, x2, feat, light, false, rng);

    if feat.is_floor() {
        // Join the two centers with a straight corridor
        for y in (y1 + ay) / 2..=(by + y2) / 2 {
            for x in (x1 + ax) / 2..=(bx + x2) / 2 {
                let at = Coord::new(y, x);
                if y > y1 && y < y2 && x > x1 && x < x2 && is_carvable(cave, at) {
                    place(cave, at, feat, light);
                }
            }
        }
        outline_room(cave, y1, x1, y2, x2, light);
    } else {
        // Terrain needs smooth edges: a third starburst covers the seam
        let (cy1, cx1, cy2, cx2) = if tall {
            (y1 + (1 + ay - y1) / 2, x1, by + (1 + y2 - by) / 2, x2)
        } else {
            (y1, x1 + (1 + ax - x1) / 2, y2, bx + (1 + x2 - bx) / 2)
        };
        let _ = generate_starburst_room(cave, cy1, cx1, cy2, cx2, feat, light, false, rng);
    }
}

fn is_carvable(cave: &Cave, at: Coord) -> bool {
    let cell = cave.cell(at);
    !cell.is_icky() && !cell.is_occupied() && !cell.has_object()
}

fn place(cave: &mut Cave, at: Coord, feat: Feat, light: bool) {
    cave.set_feat(at, feat);
    let flags = &mut cave.cell_mut(at).flags;
    flags.set(CellFlags::ROOM, feat.is_floor());
    if light {
        flags.insert(CellFlags::GLOW);
    } else if !flags.contains(CellFlags::ROOM) {
        flags.remove(CellFlags::GLOW);
    }
}

/// Turn granite touching the new floor into outer wall
fn outline_room(cave: &mut Cave, y1: i32, x1: i32, y2: i32, x2: i32, light: bool) {
    for y in (y1 + 1)..y2 {
        for x in (x1 + 1)..x2 {
            let at = Coord::new(y, x);
            if cave.feat(at) != Feat::Floor {
                continue;
            }
            for dir in DDD {
                let next = at.step(dir);
                if !cave.in_bounds(next)
                    || !cave.feat(next).is_extra_granite()
                    || !is_carvable(cave, next)
                {
                    continue;
                }
                cave.set_feat(next, Feat::OuterWall);
                if light {
                    cave.cell_mut(next).flags.insert(CellFlags::GLOW);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(cave: &Cave) -> Vec<crate::dungeon::Cell> {
        cave.cells().to_vec()
    }

    #[test]
    fn test_angle_table_quadrants() {
        let table = angle_table();
        let mid = TABLE_MID as usize;
        // East, north, west, south
        assert_eq!(table[mid][mid + 10], 0);
        assert_eq!(table[mid - 10][mid], 45);
        assert_eq!(table[mid][mid - 10], 90);
        assert_eq!(table[mid + 10][mid], 135);
    }

    #[test]
    fn test_floor_room_is_carved_and_walled() {
        let mut cave = Cave::new();
        let mut rng = GameRng::new(42);
        generate_starburst_room(&mut cave, 10, 20, 30, 50, Feat::Floor, true, false, &mut rng)
            .unwrap();

        let center = Coord::new(20, 35);
        assert_eq!(cave.feat(center), Feat::Floor);
        assert!(cave.has_flag(center, CellFlags::ROOM | CellFlags::GLOW));

        // Every floor grid is ringed by floor or outer wall, never raw granite
        for at in cave.coords() {
            if cave.feat(at) != Feat::Floor {
                continue;
            }
            for dir in DDD {
                assert_ne!(cave.feat(at.step(dir)), Feat::Granite, "granite next to {at:?}");
            }
        }
    }

    #[test]
    fn test_stays_inside_bounds() {
        let mut cave = Cave::new();
        let mut rng = GameRng::new(7);
        let before = snapshot(&cave);
        generate_starburst_room(&mut cave, 5, 5, 25, 70, Feat::Floor, false, true, &mut rng)
            .unwrap();

        for (at, (old, new)) in cave.coords().zip(before.iter().zip(cave.cells())) {
            if old != new {
                assert!(at.y >= 5 && at.y <= 25 && at.x >= 5 && at.x <= 70, "{at:?}");
            }
        }
    }

    #[test]
    fn test_respects_icky_grids() {
        let mut cave = Cave::new();
        let mut rng = GameRng::new(3);
        cave.mark_icky(15, 30, 20, 40);
        let before = snapshot(&cave);
        generate_starburst_room(&mut cave, 10, 20, 30, 50, Feat::Floor, false, false, &mut rng)
            .unwrap();

        for y in 15..=20 {
            for x in 30..=40 {
                let at = Coord::new(y, x);
                let idx = (y as usize) * cave.width() as usize + x as usize;
                assert_eq!(*cave.cell(at), before[idx]);
            }
        }
    }

    #[test]
    fn test_long_room_splits() {
        let mut cave = Cave::new();
        let mut rng = GameRng::new(11);
        generate_starburst_room(&mut cave, 10, 10, 20, 90, Feat::Floor, false, false, &mut rng)
            .unwrap();
        assert_eq!(cave.feat(Coord::new(15, 25)), Feat::Floor);
        assert_eq!(cave.feat(Coord::new(15, 75)), Feat::Floor);
        assert_eq!(cave.feat(Coord::new(15, 50)), Feat::Floor);
    }

    #[test]
    fn test_lake_only_covers_floor() {
        let mut cave = Cave::new();
        let mut rng = GameRng::new(19);
        cave.fill_rect(10, 10, 30, 24, Feat::Floor);
        generate_starburst_room(&mut cave, 10, 10, 30, 40, Feat::Water, false, false, &mut rng)
            .unwrap();
        for at in cave.coords() {
            if cave.feat(at) == Feat::Water {
                assert!(at.x <= 24);
            }
        }
    }

    #[test]
    fn test_rejects_degenerate_bounds() {
        let mut cave = Cave::new();
        let mut rng = GameRng::new(1);
        let err = generate_starburst_room(&mut cave, 10, 10, 11, 20, Feat::Floor, false, false, &mut rng);
        assert!(matches!(err, Err(GenError::BadBounds { .. })));
    }
}
