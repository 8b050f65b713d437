//! Vault placement
//!
//! Copies a template onto the level in two passes: terrain first, then
//! everything that stands on it. Letters are collected and handed to the
//! populator in one batch so it can resolve them against its species list.

use log::debug;

use super::populate::Populator;
use super::templates::{VaultKind, VaultTemplate};
use super::GenContext;
use crate::dungeon::{Cave, CellFlags, Coord, Feat, LevelKind};
use crate::error::GenError;
use crate::rng::GameRng;

/// What a digit asks for: monster depth boost, and object boost with quality
struct DigitRule {
    monster: Option<i32>,
    object: Option<(i32, bool, bool)>,
}

/// The out-of-depth ladder, mundane to nasty
fn digit_rule(symbol: char, rng: &mut GameRng) -> Option<DigitRule> {
    let (monster, object) = match symbol {
        '1' => {
            if rng.one_in(2) {
                (Some(2), None)
            } else {
                (None, Some((2, false, false)))
            }
        }
        '2' => (Some(4), None),
        '3' => (None, Some((4, true, false))),
        '4' => (Some(6), Some((6, false, false))),
        '5' => (None, Some((8, true, false))),
        '6' => (Some(10), None),
        '7' => (Some(12), Some((12, true, false))),
        '0' => (Some(15), None),
        '9' => (Some(9), Some((7, true, false))),
        '8' => (Some(40), Some((20, true, true))),
        _ => return None,
    };
    Some(DigitRule { monster, object })
}

/// Terrain a template symbol lays down
fn symbol_terrain(symbol: char) -> Option<Feat> {
    let feat = match symbol {
        '%' => Feat::OuterWall,
        '#' => Feat::InnerWall,
        'X' => Feat::PermInner,
        '*' => Feat::MagmaTreasure,
        '+' => Feat::SecretDoor,
        '<' => Feat::UpStair,
        '>' => Feat::DownStair,
        ';' => Feat::Rubble,
        ':' => Feat::PassRubble,
        '~' => Feat::Water,
        '&' => Feat::Lava,
        '_' => Feat::Void,
        '|' => Feat::Tree,
        ',' => Feat::Grass,
        '.' | '^' | '$' => Feat::Floor,
        ch if ch.is_ascii_digit() || ch.is_ascii_alphabetic() => Feat::Floor,
        _ => return None,
    };
    Some(feat)
}

/// Place a template centered on `center`
///
/// Refused on mountaintops and on levels holding a dungeon entrance. The
/// whole template must fit strictly inside the level.
pub fn build_vault(
    cave: &mut Cave,
    ctx: &mut GenContext,
    center: Coord,
    template: &VaultTemplate,
    populator: &mut dyn Populator,
    rng: &mut GameRng,
) -> Result<(), GenError> {
    if ctx.kind == LevelKind::Mountaintop || cave.dungeon_entrance {
        return Err(GenError::VaultRefused(ctx.kind));
    }
    template.validate()?;

    let height = template.height();
    let width = template.width();
    let y1 = center.y - height / 2;
    let x1 = center.x - width / 2;
    let y2 = y1 + height - 1;
    let x2 = x1 + width - 1;

    if !cave.in_bounds_fully(Coord::new(y1, x1)) || !cave.in_bounds_fully(Coord::new(y2, x2)) {
        return Err(GenError::TemplateTooLarge {
            name: template.name.clone(),
            height,
            width,
        });
    }

    // Wilderness vaults blend in: no room flags, and they stay dark
    let is_room = template.kind != VaultKind::Wilderness;
    let light = is_room && ctx.depth <= rng.rnd(25);

    // Pass one: terrain
    for dy in 0..height {
        for dx in 0..width {
            let symbol = template.symbol(dy, dx);
            let Some(feat) = symbol_terrain(symbol) else {
                continue;
            };
            let at = Coord::new(y1 + dy, x1 + dx);
            cave.set_feat(at, feat);

            let flags = &mut cave.cell_mut(at).flags;
            flags.insert(CellFlags::ICKY);
            if is_room {
                flags.insert(CellFlags::ROOM);
            }
            if light {
                flags.insert(CellFlags::GLOW);
            }
        }
    }

    // Pass two: what stands on the terrain
    let mut letters = Vec::new();
    for dy in 0..height {
        for dx in 0..width {
            let at = Coord::new(y1 + dy, x1 + dx);
            let symbol = template.symbol(dy, dx);
            match symbol {
                '^' => {
                    populator.place_trap(cave, at, ctx.depth, rng);
                }
                '$' => {
                    populator.place_gold(cave, at, ctx.depth, rng);
                }
                '*' if rng.one_in(4) => {
                    populator.place_object(cave, at, ctx.depth, false, false, rng);
                }
                ch if ch.is_ascii_alphabetic() => letters.push((at, ch)),
                ch => {
                    if let Some(rule) = digit_rule(ch, rng) {
                        if let Some(boost) = rule.monster {
                            populator.place_monster(cave, at, ctx.depth + boost, true, rng);
                        }
                        if let Some((boost, good, great)) = rule.object {
                            populator.place_object(cave, at, ctx.depth + boost, good, great, rng);
                        }
                    }
                }
            }
        }
    }

    if !letters.is_empty() {
        populator.populate_vault_symbols(cave, &letters, ctx.depth, rng);
    }

    ctx.rating += template.rating;
    debug!(
        "placed {} vault '{}' at ({}, {})",
        template.kind, template.name, center.y, center.x
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::SpeciesPopulator;
    use crate::monster::{Race, RaceTable};

    /// Counts what the vault asked for
    #[derive(Default)]
    struct Tally {
        monsters: Vec<i32>,
        objects: Vec<(i32, bool, bool)>,
        traps: usize,
        gold: usize,
        letters: Vec<char>,
    }

    impl Populator for Tally {
        fn place_monster(&mut self, _: &mut Cave, _: Coord, depth: i32, _: bool, _: &mut GameRng) -> bool {
            self.monsters.push(depth);
            true
        }

        fn place_object(
            &mut self,
            _: &mut Cave,
            _: Coord,
            depth: i32,
            good: bool,
            great: bool,
            _: &mut GameRng,
        ) -> bool {
            self.objects.push((depth, good, great));
            true
        }

        fn place_gold(&mut self, _: &mut Cave, _: Coord, _: i32, _: &mut GameRng) -> bool {
            self.gold += 1;
            true
        }

        fn place_trap(&mut self, _: &mut Cave, _: Coord, _: i32, _: &mut GameRng) -> bool {
            self.traps += 1;
            true
        }

        fn populate_vault_symbols(&mut self, _: &mut Cave, spots: &[(Coord, char)], _: i32, _: &mut GameRng) {
            self.letters.extend(spots.iter().map(|&(_, ch)| ch));
        }
    }

    fn template(rows: &[&str]) -> VaultTemplate {
        VaultTemplate {
            name: "Test".into(),
            kind: VaultKind::Lesser,
            rating: 7,
            rows: rows.iter().map(|row| row.to_string()).collect(),
        }
    }

    #[test]
    fn test_terrain_pass() {
        let mut cave = Cave::new();
        let mut ctx = GenContext::new(10, LevelKind::Dungeon);
        let mut rng = GameRng::new(1);
        let vault = template(&["%%%%%", "%.X>%", "%+;~%", "%%%%%"]);
        build_vault(&mut cave, &mut ctx, Coord::new(20, 40), &vault, &mut Tally::default(), &mut rng)
            .unwrap();

        // Top-left is (18, 38)
        assert_eq!(cave.feat(Coord::new(18, 38)), Feat::OuterWall);
        assert_eq!(cave.feat(Coord::new(19, 39)), Feat::Floor);
        assert_eq!(cave.feat(Coord::new(19, 40)), Feat::PermInner);
        assert_eq!(cave.feat(Coord::new(19, 41)), Feat::DownStair);
        assert_eq!(cave.feat(Coord::new(20, 39)), Feat::SecretDoor);
        assert_eq!(cave.feat(Coord::new(20, 40)), Feat::Rubble);
        assert_eq!(cave.feat(Coord::new(20, 41)), Feat::Water);
        assert!(cave.has_flag(Coord::new(19, 39), CellFlags::ICKY | CellFlags::ROOM));
        assert_eq!(ctx.rating, 7);
    }

    #[test]
    fn test_blank_symbols_leave_terrain() {
        let mut cave = Cave::new();
        let mut ctx = GenContext::new(10, LevelKind::Plain);
        let mut rng = GameRng::new(2);
        let mut vault = template(&[" . ", "...", " . "]);
        vault.kind = VaultKind::Wilderness;
        build_vault(&mut cave, &mut ctx, Coord::new(10, 10), &vault, &mut Tally::default(), &mut rng)
            .unwrap();
        assert_eq!(cave.feat(Coord::new(9, 9)), Feat::Granite);
        assert!(!cave.has_flag(Coord::new(9, 9), CellFlags::ICKY));
        assert_eq!(cave.feat(Coord::new(10, 10)), Feat::Floor);
        assert!(!cave.has_flag(Coord::new(10, 10), CellFlags::ROOM));
    }

    #[test]
    fn test_population_pass() {
        let mut cave = Cave::new();
        let mut ctx = GenContext::new(10, LevelKind::Dungeon);
        let mut rng = GameRng::new(3);
        let vault = template(&["%%%%%%%", "%2^$8o%", "%%%%%%%"]);
        let mut tally = Tally::default();
        build_vault(&mut cave, &mut ctx, Coord::new(20, 40), &vault, &mut tally, &mut rng).unwrap();

        assert_eq!(tally.monsters, vec![14, 50]);
        assert_eq!(tally.objects, vec![(30, true, true)]);
        assert_eq!(tally.traps, 1);
        assert_eq!(tally.gold, 1);
        assert_eq!(tally.letters, vec!['o']);
    }

    #[test]
    fn test_refused_levels() {
        let mut cave = Cave::new();
        let mut rng = GameRng::new(4);
        let vault = template(&["%%%", "%.%", "%%%"]);

        let mut ctx = GenContext::new(10, LevelKind::Mountaintop);
        let err = build_vault(&mut cave, &mut ctx, Coord::new(20, 40), &vault, &mut Tally::default(), &mut rng);
        assert_eq!(err, Err(GenError::VaultRefused(LevelKind::Mountaintop)));

        let mut ctx = GenContext::new(10, LevelKind::Forest);
        cave.dungeon_entrance = true;
        let err = build_vault(&mut cave, &mut ctx, Coord::new(20, 40), &vault, &mut Tally::default(), &mut rng);
        assert_eq!(err, Err(GenError::VaultRefused(LevelKind::Forest)));
        assert_eq!(cave.feat(Coord::new(20, 40)), Feat::Granite);
    }

    #[test]
    fn test_too_large_for_level() {
        let mut cave = Cave::new();
        let mut ctx = GenContext::new(10, LevelKind::Dungeon);
        let mut rng = GameRng::new(5);
        let vault = template(&["%%%%%", "%...%", "%%%%%"]);
        let err = build_vault(&mut cave, &mut ctx, Coord::new(1, 40), &vault, &mut Tally::default(), &mut rng);
        assert!(matches!(err, Err(GenError::TemplateTooLarge { .. })));
    }

    #[test]
    fn test_letters_become_monsters() {
        let mut races = RaceTable::new();
        let mut orc = Race::new("snaga", 3);
        orc.symbol = 'o';
        races.push(orc);

        let mut cave = Cave::new();
        let mut ctx = GenContext::new(5, LevelKind::Dungeon);
        let mut rng = GameRng::new(6);
        let vault = template(&["%%%%%", "%ooo%", "%%%%%"]);
        let mut populator = SpeciesPopulator::new(&races);
        build_vault(&mut cave, &mut ctx, Coord::new(20, 40), &vault, &mut populator, &mut rng).unwrap();
        assert_eq!(cave.monster_count(), 3);
    }
}
