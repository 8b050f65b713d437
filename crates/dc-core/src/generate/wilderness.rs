//! Wilderness levels
//!
//! Outdoor stages: a base terrain, ragged boundary walls inside a permanent
//! ring, two to four paths to the neighbouring stages, formations of
//! terrain grown by random walk (or the occasional wilderness vault), and
//! finally the population pass.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::populate::{PopulationPlan, Populator};
use super::starburst::generate_starburst_room;
use super::templates::VaultKind;
use super::vault::build_vault;
use super::GenContext;
use crate::dungeon::{Cave, CellFlags, Coord, Feat, FeatFlags, LevelKind, DDD};
use crate::error::GenError;
use crate::rng::GameRng;

/// Deepest the ragged boundary band reaches
const EDGE_MAX: i32 = 7;

/// Formations and vaults keep this far from the level edge
const EDGE_CLEARANCE: i32 = EDGE_MAX + 1;

/// Edge of a wilderness stage
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    North,
    East,
    South,
    West,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    /// Terrain marking the exit on this side
    pub const fn path_feat(self) -> Feat {
        match self {
            Side::North => Feat::PathNorth,
            Side::East => Feat::PathEast,
            Side::South => Feat::PathSouth,
            Side::West => Feat::PathWest,
        }
    }
}

/// Terrain recipe for one wilderness type
struct Terrain {
    base: Feat,
    edge: Feat,
    formations: &'static [Feat],
    formation_count: i32,
}

impl Terrain {
    fn for_kind(kind: LevelKind) -> Terrain {
        let (base, edge, formations, formation_count): (Feat, Feat, &'static [Feat], i32) =
            match kind {
                LevelKind::Forest => (
                    Feat::Grass,
                    Feat::DenseTree,
                    &[Feat::DenseTree, Feat::Tree, Feat::Grass],
                    15,
                ),
                LevelKind::Mountain => (
                    Feat::Floor,
                    Feat::Granite,
                    &[Feat::Granite, Feat::Rubble, Feat::PassRubble, Feat::Magma, Feat::Quartz],
                    25,
                ),
                LevelKind::Swamp => (
                    Feat::Grass,
                    Feat::DenseTree,
                    &[Feat::Water, Feat::Water, Feat::Tree, Feat::Grass],
                    30,
                ),
                LevelKind::Desert => (
                    Feat::Sand,
                    Feat::Rubble,
                    &[Feat::Rubble, Feat::PassRubble, Feat::Sand, Feat::Grass],
                    10,
                ),
                LevelKind::River => (
                    Feat::Grass,
                    Feat::DenseTree,
                    &[Feat::Tree, Feat::Grass, Feat::Sand],
                    10,
                ),
                LevelKind::Valley => (
                    Feat::Grass,
                    Feat::Granite,
                    &[Feat::Tree, Feat::PassRubble, Feat::Grass],
                    12,
                ),
                LevelKind::Mountaintop => (
                    Feat::Floor,
                    Feat::Void,
                    &[Feat::PassRubble, Feat::Rubble],
                    6,
                ),
                _ => (
                    Feat::Grass,
                    Feat::DenseTree,
                    &[Feat::Tree, Feat::Sand, Feat::Water, Feat::PassRubble],
                    12,
                ),
            };
        Terrain {
            base,
            edge,
            formations,
            formation_count,
        }
    }
}

/// Generate a whole wilderness stage and place the player
///
/// `arrived_from` is the side of this stage the player enters on; they
/// start on its exit grid if there is one. Returns the start grid.
pub fn generate_wilderness(
    cave: &mut Cave,
    ctx: &mut GenContext,
    arrived_from: Option<Side>,
    populator: &mut dyn Populator,
    rng: &mut GameRng,
) -> Result<Coord, GenError> {
    if !ctx.kind.is_wilderness() {
        return Err(GenError::LevelFailed(format!(
            "{} is not a wilderness level",
            ctx.kind
        )));
    }

    let terrain = Terrain::for_kind(ctx.kind);
    cave.wipe(terrain.base);
    cave.kind = ctx.kind;
    cave.depth = ctx.depth;

    if ctx.kind == LevelKind::Mountaintop {
        return build_mountaintop(cave, ctx, &terrain, populator, rng);
    }

    match ctx.kind {
        LevelKind::Forest => scatter(cave, &[(Feat::Tree, 3), (Feat::DenseTree, 10)], rng),
        LevelKind::River => carve_river(cave, rng),
        LevelKind::Valley => raise_ridges(cave, rng),
        _ => {}
    }

    ragged_edges(cave, terrain.edge, rng);
    perm_ring(cave);

    let count = 1 + rng.rnd(3) as usize;
    let exits = alloc_paths(cave, count, arrived_from, rng);

    let start = arrived_from
        .and_then(|side| exits.iter().find(|(s, _)| *s == side))
        .or(exits.first())
        .map(|&(_, at)| at)
        .or_else(|| super::populate::random_spot(cave, false, rng))
        .ok_or_else(|| GenError::LevelFailed("no grid to start on".to_string()))?;
    cave.place_player(start)
        .map_err(|err| GenError::LevelFailed(err.to_string()))?;

    let mut formations = 0;
    let mut vaults = 0;
    for _ in 0..terrain.formation_count + rng.rn2(terrain.formation_count / 2 + 1) {
        let Some(at) = formation_spot(cave, start, rng) else {
            continue;
        };
        if rng.one_in(8) && try_wilderness_vault(cave, ctx, at, start, populator, rng) {
            vaults += 1;
            continue;
        }
        let size = 10 + rng.rn2(40);
        if make_formation(cave, at, terrain.formations, size, rng) > 0 {
            formations += 1;
        }
    }

    populator.populate_level(cave, &PopulationPlan::wilderness(ctx.depth, rng), rng);

    debug!(
        "{} stage at depth {}: {} exits, {} formations, {} vaults",
        ctx.kind,
        ctx.depth,
        exits.len(),
        formations,
        vaults
    );
    Ok(start)
}

/// Thread `count` paths in from distinct sides of the level
///
/// Each exit is marked with its side's path terrain just inside the
/// permanent ring, and a road is walked from it toward the middle. The
/// side the player arrived from always gets a path.
pub fn alloc_paths(
    cave: &mut Cave,
    count: usize,
    arrived_from: Option<Side>,
    rng: &mut GameRng,
) -> Vec<(Side, Coord)> {
    let mut sides = Side::ALL;
    rng.shuffle(&mut sides);
    if let Some(side) = arrived_from
        && let Some(pos) = sides.iter().position(|&s| s == side)
    {
        sides.swap(0, pos);
    }

    let height = cave.height();
    let width = cave.width();
    let target = Coord::new(
        height / 2 + rng.spread(0, height / 8),
        width / 2 + rng.spread(0, width / 8),
    );

    let mut exits = Vec::with_capacity(count);
    for &side in sides.iter().take(count.clamp(1, 4)) {
        let exit = match side {
            Side::North => Coord::new(1, width / 4 + rng.rn2(width / 2)),
            Side::South => Coord::new(height - 2, width / 4 + rng.rn2(width / 2)),
            Side::West => Coord::new(height / 4 + rng.rn2(height / 2), 1),
            Side::East => Coord::new(height / 4 + rng.rn2(height / 2), width - 2),
        };
        cave.set_feat(exit, side.path_feat());
        path_start(cave, exit, target, 3, rng);
        exits.push((side, exit));
    }
    exits
}

/// Walk a road from `from` toward `to`, stopping within `tolerance`
///
/// Three steps in four head for the target, the rest wander. Returns
/// where the road ended.
pub fn path_start(cave: &mut Cave, from: Coord, to: Coord, tolerance: i32, rng: &mut GameRng) -> Coord {
    let budget = 4 * (cave.height() + cave.width());
    let mut at = from;

    for _ in 0..budget {
        if at.chebyshev(to) <= tolerance {
            return at;
        }

        let next = if rng.rn2(4) < 3 {
            let dy = (to.y - at.y).signum();
            let dx = (to.x - at.x).signum();
            // Favour the longer axis so roads are not all diagonals
            if (to.y - at.y).abs() > 2 * (to.x - at.x).abs() {
                at.offset(dy, 0)
            } else if (to.x - at.x).abs() > 2 * (to.y - at.y).abs() {
                at.offset(0, dx)
            } else {
                at.offset(dy, dx)
            }
        } else {
            let dir = DDD[rng.rn2(8) as usize];
            at.step(dir)
        };

        if !cave.in_bounds_fully(next) {
            continue;
        }
        at = next;

        let feat = cave.feat(at);
        if !feat.has(FeatFlags::EXIT) && !feat.is_permanent() && !cave.cell(at).is_icky() {
            cave.set_feat(at, Feat::Road);
        }
    }

    warn!(
        "path from ({}, {}) gave up {} grids short of ({}, {})",
        from.y,
        from.x,
        at.chebyshev(to),
        to.y,
        to.x
    );
    at
}

/// Grow a blob of terrain by self-avoiding random walk
///
/// Each step lays one of `feats`; reserved, occupied, road and exit grids
/// are stepped over but never changed. Stops early when boxed in. Returns
/// the number of grids changed.
pub fn make_formation(cave: &mut Cave, at: Coord, feats: &[Feat], size: i32, rng: &mut GameRng) -> usize {
    if feats.is_empty() || !cave.in_bounds_fully(at) {
        return 0;
    }

    let mut visited = vec![at];
    let mut changed = 0;
    let mut here = at;
    cave.cell_mut(here).flags.insert(CellFlags::TEMP);

    for _ in 0..size {
        let cell = cave.cell(here);
        let feat = cell.feat;
        if !cell.is_icky()
            && !cell.is_occupied()
            && feat != Feat::Road
            && !feat.has(FeatFlags::EXIT)
            && !feat.is_permanent()
            && let Some(&new) = rng.choose(feats)
        {
            cave.set_feat(here, new);
            changed += 1;
        }

        let open: Vec<Coord> = DDD
            .iter()
            .map(|&dir| here.step(dir))
            .filter(|&next| {
                cave.in_bounds_fully(next) && !cave.has_flag(next, CellFlags::TEMP)
            })
            .collect();
        let Some(&next) = rng.choose(&open) else {
            break;
        };
        here = next;
        cave.cell_mut(here).flags.insert(CellFlags::TEMP);
        visited.push(here);
    }

    for at in visited {
        cave.cell_mut(at).flags.remove(CellFlags::TEMP);
    }
    changed
}

// ============================================================================
// Shared pieces
// ============================================================================

/// Permanent wall around the whole level
fn perm_ring(cave: &mut Cave) {
    cave.draw_rect(0, 0, cave.height() - 1, cave.width() - 1, Feat::PermSolid);
}

/// Boundary band of `edge` whose thickness wanders along each side
fn ragged_edges(cave: &mut Cave, edge: Feat, rng: &mut GameRng) {
    let height = cave.height();
    let width = cave.width();

    for (first, last, vertical) in [(1, width - 2, false), (1, height - 2, true)] {
        let mut near = rng.rn2(3);
        let mut far = rng.rn2(3);
        for i in first..=last {
            near = (near + 1 - rng.rn2(3)).clamp(0, EDGE_MAX);
            far = (far + 1 - rng.rn2(3)).clamp(0, EDGE_MAX);
            for depth in 1..=near {
                let at = if vertical { Coord::new(i, depth) } else { Coord::new(depth, i) };
                cave.set_feat(at, edge);
            }
            for depth in 1..=far {
                let at = if vertical {
                    Coord::new(i, width - 1 - depth)
                } else {
                    Coord::new(height - 1 - depth, i)
                };
                cave.set_feat(at, edge);
            }
        }
    }
}

/// Sprinkle terrain: each `(feat, n)` covers one grid in `n`
fn scatter(cave: &mut Cave, mix: &[(Feat, i32)], rng: &mut GameRng) {
    for at in cave.coords() {
        for &(feat, n) in mix {
            if rng.one_in(n) {
                cave.set_feat(at, feat);
                break;
            }
        }
    }
}

/// A meandering river across the level, with sandy banks
fn carve_river(cave: &mut Cave, rng: &mut GameRng) {
    let vertical = rng.one_in(2);
    let (length, span) = if vertical {
        (cave.height(), cave.width())
    } else {
        (cave.width(), cave.height())
    };

    let mut middle = span / 2 + rng.spread(0, span / 4);
    for i in 1..length - 1 {
        let half = 1 + rng.rn2(2);
        for offset in -half - 1..=half + 1 {
            let across = middle + offset;
            let at = if vertical { Coord::new(i, across) } else { Coord::new(across, i) };
            if !cave.in_bounds_fully(at) {
                continue;
            }
            let bank = offset.abs() > half;
            if !bank {
                cave.set_feat(at, Feat::Water);
            } else if rng.one_in(2) {
                cave.set_feat(at, Feat::Sand);
            }
        }
        middle = (middle + 1 - rng.rn2(3)).clamp(span / 4, 3 * span / 4);
    }
}

/// Mountain ridges along the top and bottom of a valley
fn raise_ridges(cave: &mut Cave, rng: &mut GameRng) {
    let height = cave.height();
    let width = cave.width();
    let mut top = height / 6 + rng.rn2(height / 8);
    let mut bottom = height / 6 + rng.rn2(height / 8);

    for x in 1..width - 1 {
        for y in (1..=top).chain(height - 1 - bottom..=height - 2) {
            let feat = if rng.one_in(6) { Feat::Rubble } else { Feat::Granite };
            cave.set_feat(Coord::new(y, x), feat);
        }
        top = (top + 1 - rng.rn2(3)).clamp(height / 8, height / 3);
        bottom = (bottom + 1 - rng.rn2(3)).clamp(height / 8, height / 3);
    }
}

/// A random grid for a formation, clear of the edges and the player
fn formation_spot(cave: &Cave, player: Coord, rng: &mut GameRng) -> Option<Coord> {
    for _ in 0..100 {
        let at = Coord::new(
            EDGE_CLEARANCE + rng.rn2(cave.height() - 2 * EDGE_CLEARANCE),
            EDGE_CLEARANCE + rng.rn2(cave.width() - 2 * EDGE_CLEARANCE),
        );
        if at.chebyshev(player) <= 5 || cave.cell(at).is_icky() {
            continue;
        }
        return Some(at);
    }
    None
}

/// Place a wilderness vault centered on `at` if the ground is clear
fn try_wilderness_vault(
    cave: &mut Cave,
    ctx: &mut GenContext,
    at: Coord,
    player: Coord,
    populator: &mut dyn Populator,
    rng: &mut GameRng,
) -> bool {
    let Some(template) = ctx
        .templates
        .pick(VaultKind::Wilderness, cave.height() / 3, cave.width() / 3, rng)
        .cloned()
    else {
        return false;
    };

    let y1 = at.y - template.height() / 2;
    let x1 = at.x - template.width() / 2;
    let y2 = y1 + template.height() - 1;
    let x2 = x1 + template.width() - 1;

    let clear_of_edges = y1 >= EDGE_CLEARANCE
        && x1 >= EDGE_CLEARANCE
        && y2 < cave.height() - EDGE_CLEARANCE
        && x2 < cave.width() - EDGE_CLEARANCE;
    let clear_of_player = at.chebyshev(player) > template.height().max(template.width()) + 5;
    if !clear_of_edges || !clear_of_player || !cave.is_rect_clear(y1, x1, y2, x2) {
        return false;
    }
    let crosses_exit = (y1..=y2)
        .any(|y| (x1..=x2).any(|x| cave.feat_has(Coord::new(y, x), FeatFlags::EXIT)));
    if crosses_exit {
        return false;
    }

    build_vault(cave, ctx, at, &template, populator, rng).is_ok()
}

/// The summit: an island of rock ringed by a sheer drop
///
/// No paths and no vaults; the only way on is the staircase down, which is
/// also where the player arrives.
fn build_mountaintop(
    cave: &mut Cave,
    ctx: &mut GenContext,
    terrain: &Terrain,
    populator: &mut dyn Populator,
    rng: &mut GameRng,
) -> Result<Coord, GenError> {
    cave.wipe(terrain.edge);
    perm_ring(cave);

    let center = Coord::new(cave.height() / 2, cave.width() / 2);
    let half_height = 12 + rng.rn2(6);
    let half_width = 24 + rng.rn2(12);
    generate_starburst_room(
        cave,
        center.y - half_height,
        center.x - half_width,
        center.y + half_height,
        center.x + half_width,
        terrain.base,
        false,
        false,
        rng,
    )?;

    for at in cave.coords() {
        if cave.feat(at) != terrain.base || at.chebyshev(center) <= 1 {
            continue;
        }
        if rng.one_in(6) {
            cave.set_feat(at, Feat::PassRubble);
        } else if rng.one_in(15) {
            cave.set_feat(at, Feat::Rubble);
        }
    }

    cave.set_feat(center, Feat::DownStair);
    cave.place_player(center)
        .map_err(|err| GenError::LevelFailed(err.to_string()))?;

    populator.populate_level(cave, &PopulationPlan::wilderness(ctx.depth, rng), rng);
    debug!("mountaintop at depth {}", ctx.depth);
    Ok(center)
}
