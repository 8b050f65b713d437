//! Coarse block allocator
//!
//! The level is divided into `BLOCK_HGT` x `BLOCK_WID` blocks. A room
//! reserves a rectangle of whole blocks, so rooms never overlap.

use crate::consts::{BLOCK_HGT, BLOCK_WID, FIND_SPACE_TRIES, MAX_ROOMS_COL, MAX_ROOMS_ROW};
use crate::dungeon::Coord;
use crate::rng::GameRng;

/// A rectangle of blocks, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRect {
    pub by1: usize,
    pub bx1: usize,
    pub by2: usize,
    pub bx2: usize,
}

impl BlockRect {
    pub fn height(&self) -> usize {
        self.by2 + 1 - self.by1
    }

    pub fn width(&self) -> usize {
        self.bx2 + 1 - self.bx1
    }

    /// Check if this rectangle shares a block with another
    pub fn intersects(&self, other: &BlockRect) -> bool {
        !(self.bx2 < other.bx1
            || self.bx1 > other.bx2
            || self.by2 < other.by1
            || self.by1 > other.by2)
    }

    /// Grid coordinate at the middle of the rectangle
    pub fn center(&self) -> Coord {
        Coord::new(
            ((self.by1 + self.by2 + 1) * BLOCK_HGT / 2) as i32,
            ((self.bx1 + self.bx2 + 1) * BLOCK_WID / 2) as i32,
        )
    }
}

/// A successful reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub center: Coord,
    pub blocks: BlockRect,
}

/// Which blocks are taken
#[derive(Debug, Clone, Default)]
pub struct BlockMap {
    used: [[bool; MAX_ROOMS_COL]; MAX_ROOMS_ROW],
    reserved: Vec<BlockRect>,
}

impl BlockMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_used(&self, by: usize, bx: usize) -> bool {
        by < MAX_ROOMS_ROW && bx < MAX_ROOMS_COL && self.used[by][bx]
    }

    /// True if every block of `rect` is free and on the map
    pub fn is_free(&self, rect: &BlockRect) -> bool {
        if rect.by2 >= MAX_ROOMS_ROW || rect.bx2 >= MAX_ROOMS_COL {
            return false;
        }
        (rect.by1..=rect.by2).all(|by| (rect.bx1..=rect.bx2).all(|bx| !self.used[by][bx]))
    }

    /// Mark every block of `rect` as used
    pub fn reserve(&mut self, rect: BlockRect) {
        for by in rect.by1..=rect.by2.min(MAX_ROOMS_ROW - 1) {
            for bx in rect.bx1..=rect.bx2.min(MAX_ROOMS_COL - 1) {
                self.used[by][bx] = true;
            }
        }
        self.reserved.push(rect);
    }

    /// Reservations in the order they were made
    pub fn reserved(&self) -> &[BlockRect] {
        &self.reserved
    }

    pub fn free_blocks(&self) -> usize {
        self.used.iter().flatten().filter(|used| !**used).count()
    }

    pub fn is_full(&self) -> bool {
        self.free_blocks() == 0
    }

    /// Find and reserve blocks for a `height` x `width` room
    ///
    /// Makes `FIND_SPACE_TRIES` random attempts. Narrow rooms are sometimes
    /// widened and snapped to shared columns so the overview map looks less
    /// like a grid; wide rooms drift toward the side they started nearer to.
    pub fn find_space(&mut self, height: i32, width: i32, rng: &mut GameRng) -> Option<Placement> {
        if height <= 0 || width <= 0 {
            return None;
        }

        let blocks_high = 1 + (height as usize - 1) / BLOCK_HGT;
        let mut blocks_wide = 1 + (width as usize - 1) / BLOCK_WID;
        if blocks_high > MAX_ROOMS_ROW || blocks_wide > MAX_ROOMS_COL {
            return None;
        }

        if blocks_wide == 2 && rng.one_in(3) {
            blocks_wide = 3;
        } else if blocks_wide == 1 && rng.one_in(2) {
            blocks_wide = 1 + rng.rnd(2) as usize;
        }

        for _ in 0..FIND_SPACE_TRIES {
            let by1 = rng.rn2(MAX_ROOMS_ROW as i32) as usize;
            let mut bx1 = rng.rn2(MAX_ROOMS_COL as i32) as usize;

            if blocks_wide <= 3 {
                // Snap to a multiple of the width
                bx1 -= bx1 % blocks_wide;
            } else if blocks_wide >= MAX_ROOMS_COL / 3 {
                let last = MAX_ROOMS_COL.saturating_sub(blocks_wide);
                if bx1 + blocks_wide / 2 <= MAX_ROOMS_COL / 2 {
                    bx1 /= 2;
                } else {
                    bx1 = (bx1.min(last) + last).div_ceil(2);
                }
            }

            let rect = BlockRect {
                by1,
                bx1,
                by2: by1 + blocks_high - 1,
                bx2: bx1 + blocks_wide - 1,
            };
            if !self.is_free(&rect) {
                continue;
            }

            self.reserve(rect);
            return Some(Placement {
                center: rect.center(),
                blocks: rect,
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_rect_intersects() {
        let a = BlockRect { by1: 0, bx1: 0, by2: 1, bx2: 2 };
        let b = BlockRect { by1: 1, bx1: 2, by2: 3, bx2: 4 };
        let c = BlockRect { by1: 2, bx1: 0, by2: 3, bx2: 1 };
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.height(), 2);
        assert_eq!(a.width(), 3);
    }

    #[test]
    fn test_center_of_single_block() {
        let rect = BlockRect { by1: 2, bx1: 3, by2: 2, bx2: 3 };
        assert_eq!(rect.center(), Coord::new(27, 38));
    }

    #[test]
    fn test_reservations_never_overlap() {
        let mut map = BlockMap::new();
        let mut rng = GameRng::new(99);
        for i in 0..200 {
            let _ = map.find_space(5 + i % 20, 5 + (i * 7) % 40, &mut rng);
        }
        let placed = map.reserved();
        assert!(!placed.is_empty());
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_fills_up_and_fails() {
        let mut map = BlockMap::new();
        let mut rng = GameRng::new(5);
        let mut failures = 0;
        for _ in 0..1000 {
            if map.find_space(BLOCK_HGT as i32, BLOCK_WID as i32, &mut rng).is_none() {
                failures += 1;
            }
        }
        assert!(failures > 0);
        assert!(map.reserved().len() <= MAX_ROOMS_ROW * MAX_ROOMS_COL);

        let mut full = BlockMap::new();
        full.reserve(BlockRect {
            by1: 0,
            bx1: 0,
            by2: MAX_ROOMS_ROW - 1,
            bx2: MAX_ROOMS_COL - 1,
        });
        assert!(full.is_full());
        assert!(full.is_used(0, 0));
        assert!(!full.is_used(MAX_ROOMS_ROW, 0));
        assert!(full.find_space(3, 3, &mut rng).is_none());
    }

    #[test]
    fn test_oversized_room_rejected() {
        let mut map = BlockMap::new();
        let mut rng = GameRng::new(1);
        assert!(map.find_space(1000, 10, &mut rng).is_none());
        assert!(map.find_space(0, 10, &mut rng).is_none());
        assert_eq!(map.free_blocks(), MAX_ROOMS_ROW * MAX_ROOMS_COL);
    }
}
