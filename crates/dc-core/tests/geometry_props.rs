use dc_core::dungeon::{distance, Cave, Coord, Feat, ProjectFlags, DDD};
use dc_core::MAX_RANGE;
use proptest::collection::vec;
use proptest::prelude::*;

const ORIGIN: i32 = 2;
const SIDE: i32 = 24;
const AREA: usize = (SIDE * SIDE) as usize;

/// A floor patch with granite scattered over roughly 30% of it
fn walled(pattern: &[u8]) -> Cave {
    let mut cave = Cave::new();
    cave.fill_rect(ORIGIN, ORIGIN, ORIGIN + SIDE - 1, ORIGIN + SIDE - 1, Feat::Floor);
    for (i, &roll) in pattern.iter().enumerate() {
        if roll < 3 {
            let i = i as i32;
            cave.set_feat(Coord::new(ORIGIN + i / SIDE, ORIGIN + i % SIDE), Feat::Granite);
        }
    }
    cave
}

fn grid() -> impl Strategy<Value = Coord> {
    (0..SIDE, 0..SIDE).prop_map(|(y, x)| Coord::new(ORIGIN + y, ORIGIN + x))
}

#[test]
fn test_distance_scenarios() {
    let origin = Coord::new(0, 0);
    assert_eq!(distance(origin, Coord::new(0, 5)), 5);
    assert_eq!(distance(origin, Coord::new(3, 4)), 5);
    assert_eq!(distance(origin, origin), 0);
}

#[test]
fn test_los_scenario() {
    let mut cave = Cave::new();
    cave.fill_rect(1, 1, 20, 20, Feat::Floor);
    assert!(cave.los(Coord::new(5, 5), Coord::new(5, 8)));
    cave.set_feat(Coord::new(5, 6), Feat::Granite);
    assert!(!cave.los(Coord::new(5, 5), Coord::new(5, 8)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn distance_is_symmetric_and_exact_on_axes(a in grid(), b in grid()) {
        prop_assert_eq!(distance(a, b), distance(b, a));
        prop_assert_eq!(distance(a, a), 0);

        let along_row = Coord::new(a.y, b.x);
        prop_assert_eq!(distance(a, along_row), (a.x - b.x).abs());
        let along_column = Coord::new(b.y, a.x);
        prop_assert_eq!(distance(a, along_column), (a.y - b.y).abs());
    }

    #[test]
    fn los_is_symmetric_away_from_knight_moves(
        pattern in vec(0u8..10, AREA),
        a in grid(),
        b in grid(),
    ) {
        let dy = (a.y - b.y).abs();
        let dx = (a.x - b.x).abs();
        prop_assume!(!matches!((dy, dx), (1, 2) | (2, 1)));

        let cave = walled(&pattern);
        prop_assert_eq!(cave.los(a, b), cave.los(b, a), "{:?} <-> {:?}", a, b);
    }

    #[test]
    fn neighbours_always_see_each_other(pattern in vec(0u8..10, AREA), a in grid(), dir in 0usize..8) {
        let cave = walled(&pattern);
        let b = a.step(DDD[dir]);
        prop_assert!(cave.los(a, a));
        prop_assert!(cave.los(a, b));
        prop_assert!(cave.los(b, a));
    }

    #[test]
    fn trace_path_stays_inside_its_buffer(
        pattern in vec(0u8..10, AREA),
        src in grid(),
        dst in grid(),
        len in 2usize..48,
        range in 1..=MAX_RANGE,
        bits in 0u8..8,
    ) {
        let cave = walled(&pattern);
        let flags = ProjectFlags::from_bits_truncate(bits);
        let mut path = vec![Coord::default(); len];

        let n = cave.trace_path(&mut path, range, src, dst, flags);
        prop_assert!((n.unsigned_abs() as usize) < len);
        prop_assert_eq!(n == 0, src == dst);
    }
}
