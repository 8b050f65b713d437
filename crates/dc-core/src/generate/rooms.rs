//! Room builders
//!
//! Ten room types, all placed through the block allocator. Each builder
//! either carves a complete room or fails without touching the level
//! (beyond the blocks it reserved); failure just means "try another room".

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::carve::random_inside;
use super::populate::Populator;
use super::starburst::generate_starburst_room;
use super::templates::VaultKind;
use super::vault::build_vault;
use super::GenContext;
use crate::dungeon::{Cave, Coord, Feat};
use crate::error::GenError;
use crate::rng::GameRng;

/// Room type
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum RoomKind {
    /// Plain rectangle, sometimes pillared or ragged
    Simple,
    /// Two overlapping rectangles
    Overlapping,
    /// Plus-shaped room with a central feature
    Cross,
    /// Large room around an inner room
    Large,
    /// Inner room packed with monsters
    Nest,
    /// Inner room of monsters ordered by strength
    Pit,
    LesserVault,
    GreaterVault,
    /// Template room without the vault rating
    Interesting,
    /// Cave-like starburst spanning several blocks
    HugeStarburst,
}

impl RoomKind {
    /// Shallowest depth the type normally appears at
    pub const fn min_depth(self) -> i32 {
        match self {
            RoomKind::Simple | RoomKind::Overlapping | RoomKind::Cross => 0,
            RoomKind::Large | RoomKind::Interesting => 3,
            RoomKind::HugeStarburst => 5,
            RoomKind::LesserVault => 10,
            RoomKind::Nest => 15,
            RoomKind::Pit => 20,
            RoomKind::GreaterVault => 30,
        }
    }
}

/// Build one room of the given type
pub fn build_room(
    cave: &mut Cave,
    ctx: &mut GenContext,
    kind: RoomKind,
    populator: &mut dyn Populator,
    rng: &mut GameRng,
) -> Result<(), GenError> {
    match kind {
        RoomKind::Simple => build_simple(cave, ctx, rng),
        RoomKind::Overlapping => build_overlapping(cave, ctx, rng),
        RoomKind::Cross => build_cross(cave, ctx, populator, rng),
        RoomKind::Large => build_large(cave, ctx, populator, rng),
        RoomKind::Nest => build_monster_room(cave, ctx, false, populator, rng),
        RoomKind::Pit => build_monster_room(cave, ctx, true, populator, rng),
        RoomKind::LesserVault => build_template_room(cave, ctx, VaultKind::Lesser, populator, rng),
        RoomKind::GreaterVault => build_template_room(cave, ctx, VaultKind::Greater, populator, rng),
        RoomKind::Interesting => {
            build_template_room(cave, ctx, VaultKind::Interesting, populator, rng)
        }
        RoomKind::HugeStarburst => build_huge_starburst(cave, ctx, rng),
    }?;

    ctx.rooms += 1;
    trace!("built {kind} room");
    Ok(())
}

/// Pick a room type for the current depth
pub fn select_room_kind(depth: i32, rng: &mut GameRng) -> RoomKind {
    // Rarer types are tried first, each gated on depth
    if depth >= RoomKind::GreaterVault.min_depth() && rng.one_in(40) {
        return RoomKind::GreaterVault;
    }
    if depth >= RoomKind::Pit.min_depth() && rng.one_in(20) {
        return RoomKind::Pit;
    }
    if depth >= RoomKind::Nest.min_depth() && rng.one_in(20) {
        return RoomKind::Nest;
    }
    if depth >= RoomKind::LesserVault.min_depth() && rng.one_in(15) {
        return RoomKind::LesserVault;
    }
    if depth >= RoomKind::HugeStarburst.min_depth() && rng.one_in(12) {
        return RoomKind::HugeStarburst;
    }
    if depth >= RoomKind::Interesting.min_depth() && rng.one_in(10) {
        return RoomKind::Interesting;
    }
    if depth >= RoomKind::Large.min_depth() && rng.one_in(8) {
        return RoomKind::Large;
    }

    match rng.rn2(10) {
        0..=1 => RoomKind::Cross,
        2..=4 => RoomKind::Overlapping,
        _ => RoomKind::Simple,
    }
}

/// Fill a level with rooms
///
/// Wipes the level to granite inside a permanent border, then keeps picking
/// room types until `attempts` tries are used up. Corridors are left to the
/// caller. Fails only if not a single room fit.
pub fn generate_dungeon_rooms(
    cave: &mut Cave,
    ctx: &mut GenContext,
    attempts: usize,
    populator: &mut dyn Populator,
    rng: &mut GameRng,
) -> Result<usize, GenError> {
    cave.wipe(Feat::Granite);
    cave.kind = ctx.kind;
    cave.depth = ctx.depth;
    cave.draw_rect(0, 0, cave.height() - 1, cave.width() - 1, Feat::PermSolid);

    let mut skipped = 0;
    for _ in 0..attempts {
        if ctx.blocks.is_full() {
            break;
        }
        let kind = select_room_kind(ctx.depth, rng);
        if let Err(err) = build_room(cave, ctx, kind, populator, rng) {
            trace!("skipped {kind} room: {err}");
            skipped += 1;
        }
    }

    debug!(
        "depth {}: {} rooms placed, {} skipped, rating {}",
        ctx.depth, ctx.rooms, skipped, ctx.rating
    );

    if ctx.rooms == 0 {
        return Err(GenError::LevelFailed("no room could be placed".to_string()));
    }
    Ok(ctx.rooms)
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Interior rectangle of `height` x `width` centered on `center`
fn around(center: Coord, height: i32, width: i32) -> (i32, i32, i32, i32) {
    let y1 = center.y - height / 2;
    let x1 = center.x - width / 2;
    (y1, x1, y1 + height - 1, x1 + width - 1)
}

fn check_bounds(cave: &Cave, y1: i32, x1: i32, y2: i32, x2: i32) -> Result<(), GenError> {
    if cave.in_bounds_fully(Coord::new(y1, x1)) && cave.in_bounds_fully(Coord::new(y2, x2)) {
        Ok(())
    } else {
        Err(GenError::BadBounds { y1, x1, y2, x2 })
    }
}

/// Rooms are more often lit near the surface
fn is_lit(depth: i32, rng: &mut GameRng) -> bool {
    depth <= rng.rnd(25)
}

/// Walled floor rectangle; `(y1, x1)-(y2, x2)` is the floor
fn carve_box(cave: &mut Cave, y1: i32, x1: i32, y2: i32, x2: i32, light: bool) {
    cave.fill_rect(y1 - 1, x1 - 1, y2 + 1, x2 + 1, Feat::OuterWall);
    cave.fill_rect(y1, x1, y2, x2, Feat::Floor);
    cave.mark_room(y1 - 1, x1 - 1, y2 + 1, x2 + 1, light);
}

// ============================================================================
// Builders
// ============================================================================

fn build_simple(cave: &mut Cave, ctx: &mut GenContext, rng: &mut GameRng) -> Result<(), GenError> {
    let height = 1 + rng.rnd(4) + rng.rnd(3);
    let width = 1 + rng.rnd(11) + rng.rnd(11);
    let center = ctx.find_space(height + 2, width + 2, rng)?;
    let (y1, x1, y2, x2) = around(center, height, width);
    check_bounds(cave, y1 - 1, x1 - 1, y2 + 1, x2 + 1)?;

    let light = is_lit(ctx.depth, rng);
    carve_box(cave, y1, x1, y2, x2, light);

    if rng.one_in(20) {
        // Pillars on every other grid
        for y in (y1 + 1..y2).step_by(2) {
            for x in (x1 + 1..x2).step_by(2) {
                cave.set_feat(Coord::new(y, x), Feat::InnerWall);
            }
        }
    } else if rng.one_in(50) {
        // Ragged edges
        for y in (y1 + 2..y2 - 1).step_by(2) {
            cave.set_feat(Coord::new(y, x1), Feat::InnerWall);
            cave.set_feat(Coord::new(y, x2), Feat::InnerWall);
        }
        for x in (x1 + 2..x2 - 1).step_by(2) {
            cave.set_feat(Coord::new(y1, x), Feat::InnerWall);
            cave.set_feat(Coord::new(y2, x), Feat::InnerWall);
        }
    }
    Ok(())
}

fn build_overlapping(cave: &mut Cave, ctx: &mut GenContext, rng: &mut GameRng) -> Result<(), GenError> {
    let center = ctx.find_space(11, 25, rng)?;
    let (y0, x0) = (center.y, center.x);

    let a = (y0 - rng.rnd(4), x0 - rng.rnd(11), y0 + rng.rnd(3), x0 + rng.rnd(10));
    let b = (y0 - rng.rnd(3), x0 - rng.rnd(10), y0 + rng.rnd(4), x0 + rng.rnd(11));
    check_bounds(cave, a.0.min(b.0) - 1, a.1.min(b.1) - 1, a.2.max(b.2) + 1, a.3.max(b.3) + 1)?;

    let light = is_lit(ctx.depth, rng);
    for (y1, x1, y2, x2) in [a, b] {
        cave.fill_rect(y1 - 1, x1 - 1, y2 + 1, x2 + 1, Feat::OuterWall);
        cave.mark_room(y1 - 1, x1 - 1, y2 + 1, x2 + 1, light);
    }
    for (y1, x1, y2, x2) in [a, b] {
        cave.fill_rect(y1, x1, y2, x2, Feat::Floor);
    }
    Ok(())
}

fn build_cross(
    cave: &mut Cave,
    ctx: &mut GenContext,
    populator: &mut dyn Populator,
    rng: &mut GameRng,
) -> Result<(), GenError> {
    let center = ctx.find_space(11, 25, rng)?;
    let (y0, x0) = (center.y, center.x);

    // Half-extents of the vertical and horizontal bars
    let wx = 1 + rng.rn2(2);
    let wy = 1 + rng.rn2(2);
    let dx = 7 + rng.rn2(5);
    let vertical = (y0 - 4, x0 - wx, y0 + 4, x0 + wx);
    let horizontal = (y0 - wy, x0 - dx, y0 + wy, x0 + dx);
    check_bounds(cave, y0 - 5, x0 - dx - 1, y0 + 5, x0 + dx + 1)?;

    let light = is_lit(ctx.depth, rng);
    for (y1, x1, y2, x2) in [vertical, horizontal] {
        cave.fill_rect(y1 - 1, x1 - 1, y2 + 1, x2 + 1, Feat::OuterWall);
        cave.mark_room(y1 - 1, x1 - 1, y2 + 1, x2 + 1, light);
    }
    for (y1, x1, y2, x2) in [vertical, horizontal] {
        cave.fill_rect(y1, x1, y2, x2, Feat::Floor);
    }

    match rng.rn2(4) {
        // Inner treasure room, when the bars leave a walkway around it
        1 if wx == 2 && wy == 2 => {
            let (y1, x1, y2, x2) = (y0 - 1, x0 - 1, y0 + 1, x0 + 1);
            cave.draw_rect(y1, x1, y2, x2, Feat::InnerWall);
            cave.open_one_side(y1, x1, y2, x2, Feat::SecretDoor, rng);
            populator.place_object(cave, center, ctx.depth + 2, true, false, rng);
            populator.place_monster(cave, center, ctx.depth + 2, true, rng);
        }
        // Central pillar
        1 | 2 => {
            cave.fill_rect(y0 - wy + 1, x0 - wx + 1, y0 + wy - 1, x0 + wx - 1, Feat::InnerWall);
        }
        // Checkerboard where the bars meet
        3 => {
            for y in y0 - wy..=y0 + wy {
                for x in x0 - wx..=x0 + wx {
                    if (y + x) % 2 == 0 {
                        cave.set_feat(Coord::new(y, x), Feat::InnerWall);
                    }
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn build_large(
    cave: &mut Cave,
    ctx: &mut GenContext,
    populator: &mut dyn Populator,
    rng: &mut GameRng,
) -> Result<(), GenError> {
    let center = ctx.find_space(11, 25, rng)?;
    let (y1, x1, y2, x2) = around(center, 9, 23);
    check_bounds(cave, y1 - 1, x1 - 1, y2 + 1, x2 + 1)?;

    let light = is_lit(ctx.depth, rng);
    carve_box(cave, y1, x1, y2, x2, light);

    // The inner room's walls
    let (iy1, ix1, iy2, ix2) = (y1 + 2, x1 + 2, y2 - 2, x2 - 2);
    cave.draw_rect(iy1, ix1, iy2, ix2, Feat::InnerWall);

    match rng.rn2(4) {
        // Inner room with a monster and maybe some treasure
        0 => {
            cave.open_one_side(iy1, ix1, iy2, ix2, Feat::SecretDoor, rng);
            populator.place_monster(cave, center, ctx.depth + 2, true, rng);
            if rng.one_in(2) {
                let at = random_inside(iy1, ix1, iy2, ix2, rng);
                populator.place_object(cave, at, ctx.depth, false, false, rng);
            }
        }
        // Inner vault: a closet inside the inner room
        1 => {
            cave.open_one_side(iy1, ix1, iy2, ix2, Feat::SecretDoor, rng);
            cave.draw_rect(center.y - 1, center.x - 1, center.y + 1, center.x + 1, Feat::InnerWall);
            let side = if rng.one_in(2) { -1 } else { 1 };
            let door = Feat::locked_door(rng.rnd(7));
            cave.set_feat(Coord::new(center.y, center.x + side), door);
            populator.place_object(cave, center, ctx.depth + 4, true, false, rng);
            for _ in 0..2 {
                let at = random_inside(iy1, ix1, iy2, ix2, rng);
                populator.place_monster(cave, at, ctx.depth + 2, true, rng);
            }
        }
        // Pillared inner room behind a locked door
        2 => {
            cave.open_one_side(iy1, ix1, iy2, ix2, Feat::locked_door(rng.rnd(7)), rng);
            for x in (ix1 + 2..ix2 - 1).step_by(2) {
                cave.set_feat(Coord::new(center.y, x), Feat::InnerWall);
            }
            if rng.one_in(3) {
                cave.set_feat(Coord::new(center.y, center.x), Feat::MagmaTreasure);
            }
        }
        // Checkerboard maze with a door on every side
        _ => {
            for y in iy1 + 1..iy2 {
                for x in ix1 + 1..ix2 {
                    if (y + x) % 2 == 0 {
                        cave.set_feat(Coord::new(y, x), Feat::InnerWall);
                    }
                }
            }
            cave.open_all_sides(iy1, ix1, iy2, ix2, Feat::SecretDoor);
            for _ in 0..rng.rnd(3) {
                let at = random_inside(iy1, ix1, iy2, ix2, rng);
                populator.place_monster(cave, at, ctx.depth + 3, true, rng);
                populator.place_object(cave, at, ctx.depth, false, false, rng);
            }
        }
    }
    Ok(())
}

/// Nests and pits: an inner room full of monsters
fn build_monster_room(
    cave: &mut Cave,
    ctx: &mut GenContext,
    ordered: bool,
    populator: &mut dyn Populator,
    rng: &mut GameRng,
) -> Result<(), GenError> {
    let center = ctx.find_space(11, 25, rng)?;
    let (y1, x1, y2, x2) = around(center, 9, 23);
    check_bounds(cave, y1 - 1, x1 - 1, y2 + 1, x2 + 1)?;

    carve_box(cave, y1, x1, y2, x2, false);
    let (iy1, ix1, iy2, ix2) = (y1 + 2, x1 + 2, y2 - 2, x2 - 2);
    cave.draw_rect(iy1, ix1, iy2, ix2, Feat::InnerWall);
    cave.open_one_side(iy1, ix1, iy2, ix2, Feat::SecretDoor, rng);

    let mut spots: Vec<Coord> = (iy1 + 1..iy2)
        .flat_map(|y| (ix1 + 1..ix2).map(move |x| Coord::new(y, x)))
        .collect();
    if ordered {
        // Outermost first, so the strongest end up in the middle
        spots.sort_by_key(|at| std::cmp::Reverse(at.chebyshev(center) * 4 + (at.y - center.y).abs()));
    }
    populator.populate_pit(cave, &spots, ctx.depth, ordered, rng);

    ctx.rating += 10;
    Ok(())
}

fn build_template_room(
    cave: &mut Cave,
    ctx: &mut GenContext,
    kind: VaultKind,
    populator: &mut dyn Populator,
    rng: &mut GameRng,
) -> Result<(), GenError> {
    let template = ctx
        .templates
        .pick(kind, cave.height() - 4, cave.width() - 4, rng)
        .cloned()
        .ok_or(GenError::NoTemplate(kind))?;

    let center = ctx.find_space(template.height() + 2, template.width() + 2, rng)?;
    build_vault(cave, ctx, center, &template, populator, rng)
}

fn build_huge_starburst(cave: &mut Cave, ctx: &mut GenContext, rng: &mut GameRng) -> Result<(), GenError> {
    let height = 15 + rng.rn2(12);
    let width = 25 + rng.rn2(40);
    let center = ctx.find_space(height, width, rng)?;
    let (y1, x1, y2, x2) = around(center, height, width);
    check_bounds(cave, y1, x1, y2, x2)?;

    let light = is_lit(ctx.depth, rng);
    generate_starburst_room(cave, y1, x1, y2, x2, Feat::Floor, light, true, rng)?;

    if rng.one_in(3) {
        add_centerpiece(cave, center, height / 2, width / 2, light, ctx.depth, rng);
    }
    Ok(())
}

/// Lake or thicket in the middle of a starburst; the room stands without it
fn add_centerpiece(
    cave: &mut Cave,
    center: Coord,
    height: i32,
    width: i32,
    light: bool,
    depth: i32,
    rng: &mut GameRng,
) {
    let feat = match rng.rn2(4) {
        0 if depth > 20 => Feat::Lava,
        0 | 1 => Feat::Water,
        2 => Feat::Tree,
        _ => Feat::PassRubble,
    };
    let (y1, x1, y2, x2) = around(center, height, width);
    if let Err(err) = generate_starburst_room(cave, y1, x1, y2, x2, feat, light, false, rng) {
        debug!("no centerpiece at {center:?}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::{CellFlags, LevelKind};
    use crate::generate::NullPopulator;
    use strum::IntoEnumIterator;

    fn floor_count(cave: &Cave) -> usize {
        cave.coords().filter(|&at| cave.feat(at).is_floor()).count()
    }

    #[test]
    fn test_every_room_kind_builds() {
        for kind in RoomKind::iter() {
            let mut built = false;
            for seed in 0..20 {
                let mut cave = Cave::new();
                let mut ctx = GenContext::new(40, LevelKind::Dungeon);
                let mut rng = GameRng::new(seed);
                if build_room(&mut cave, &mut ctx, kind, &mut NullPopulator, &mut rng).is_ok() {
                    assert_eq!(ctx.rooms, 1);
                    assert!(floor_count(&cave) > 0, "{kind} carved no floor");
                    built = true;
                    break;
                }
            }
            assert!(built, "{kind} never built");
        }
    }

    #[test]
    fn test_simple_room_is_walled() {
        let mut cave = Cave::new();
        let mut ctx = GenContext::new(1, LevelKind::Dungeon);
        let mut rng = GameRng::new(9);
        build_room(&mut cave, &mut ctx, RoomKind::Simple, &mut NullPopulator, &mut rng).unwrap();

        let center = ctx.centers[0];
        assert!(cave.feat(center).is_passable() || cave.feat(center) == Feat::InnerWall);
        assert!(cave.has_flag(center, CellFlags::ROOM));

        // Walk out from the center until the wall
        let mut at = center;
        while cave.feat(at) != Feat::OuterWall {
            at = at.offset(-1, 0);
            assert!(at.y > 0);
        }
        assert_eq!(cave.feat(at), Feat::OuterWall);
    }

    #[test]
    fn test_simple_room_takes_one_block_row() {
        for seed in 0..30 {
            let mut cave = Cave::new();
            let mut ctx = GenContext::new(1, LevelKind::Dungeon);
            let mut rng = GameRng::new(seed);
            if build_room(&mut cave, &mut ctx, RoomKind::Simple, &mut NullPopulator, &mut rng).is_err() {
                continue;
            }
            let rows: Vec<i32> = cave
                .coords()
                .filter(|&at| cave.has_flag(at, CellFlags::ROOM))
                .map(|at| at.y)
                .collect();
            let outer = rows.iter().max().unwrap() - rows.iter().min().unwrap() + 1;
            assert!(outer <= crate::consts::BLOCK_HGT as i32);
            assert_eq!(ctx.blocks.reserved()[0].height(), 1, "seed {seed}");
        }
    }

    #[test]
    fn test_centerpiece_off_the_map_is_skipped() {
        let mut cave = Cave::new();
        let before = cave.cells().to_vec();
        let mut rng = GameRng::new(4);
        add_centerpiece(&mut cave, Coord::new(1, 1), 10, 20, true, 30, &mut rng);
        assert_eq!(cave.cells(), before.as_slice());
    }

    #[test]
    fn test_generate_rooms_fills_level() {
        let mut cave = Cave::new();
        let mut ctx = GenContext::new(25, LevelKind::Dungeon);
        let mut rng = GameRng::new(1234);
        let rooms = generate_dungeon_rooms(&mut cave, &mut ctx, 50, &mut NullPopulator, &mut rng).unwrap();

        assert!(rooms > 3);
        assert_eq!(rooms, ctx.rooms);
        assert_eq!(cave.depth, 25);
        for at in [Coord::new(0, 0), Coord::new(65, 197), Coord::new(0, 100)] {
            assert_eq!(cave.feat(at), Feat::PermSolid);
        }
        let placed = ctx.blocks.reserved();
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                assert!(!a.intersects(b));
            }
        }
    }

    #[test]
    fn test_select_room_kind_respects_depth() {
        let mut rng = GameRng::new(77);
        for _ in 0..500 {
            let kind = select_room_kind(1, &mut rng);
            assert!(kind.min_depth() <= 1, "{kind} at depth 1");
        }
    }
}
