use crate::goals::GoalProgress;
use crate::grid::Grid;
use crate::types::{Coord, EndCondition, Phase, PowerUp, Status, Tag, TileKind};

/// One cell as seen by renderers and observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellSnapshot {
    /// 0 when the cell is empty
    pub piece_id: u32,
    pub tag: Option<Tag>,
    pub power: PowerUp,
    pub blank: bool,
    pub obstacle: Option<TileKind>,
    pub hit_points: i32,
}

impl CellSnapshot {
    pub fn of(grid: &Grid, at: Coord) -> Self {
        let piece = grid.piece(at);
        let obstacle = grid.obstacle(at);
        Self {
            piece_id: piece.map_or(0, |p| p.id),
            tag: piece.map(|p| p.tag),
            power: piece.map_or(PowerUp::None, |p| p.power),
            blank: grid.is_blank(at).unwrap_or(false),
            obstacle: obstacle.map(|o| o.kind),
            hit_points: obstacle.map_or(0, |o| o.hit_points),
        }
    }

    /// Bytes that define what the cell looks like (identity excluded)
    fn visual_bytes(&self) -> [u8; 5] {
        [
            self.tag.map_or(0, |t| t.0.wrapping_add(1)),
            power_code(self.power),
            self.blank as u8,
            self.obstacle.map_or(0, tile_code),
            self.hit_points.clamp(0, u8::MAX as i32) as u8,
        ]
    }
}

fn power_code(power: PowerUp) -> u8 {
    match power {
        PowerUp::None => 0,
        PowerUp::RowBomb => 1,
        PowerUp::ColumnBomb => 2,
        PowerUp::ColorBomb => 3,
        PowerUp::AdjacentBomb => 4,
    }
}

fn tile_code(kind: TileKind) -> u8 {
    match kind {
        TileKind::Normal => 0,
        TileKind::Blank => 1,
        TileKind::Breakable => 2,
        TileKind::Lock => 3,
        TileKind::Dirt => 4,
        TileKind::Chocolate => 5,
    }
}

/// FNV-1a 64-bit
pub fn fnv1a64(bytes: impl Iterator<Item = u8>) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(0x00000100000001B3);
    }
    h
}

/// Point-in-time view of a game
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameSnapshot {
    pub width: usize,
    pub height: usize,
    /// Row-major, bottom row first: `cells[row * width + col]`
    pub cells: Vec<CellSnapshot>,
    /// FNV-1a over the visual bytes of every cell, in `cells` order
    pub board_hash: u64,
    pub score: u32,
    pub streak: u32,
    pub phase: Phase,
    pub status: Status,
    pub started: bool,
    /// End condition with the remaining counter
    pub end_condition: EndCondition,
    pub moves_made: u32,
    pub stars: u32,
    pub goals: Vec<GoalProgress>,
    pub episode_id: u32,
}

impl GameSnapshot {
    pub fn cell(&self, col: usize, row: usize) -> Option<&CellSnapshot> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.cells.get(row * self.width + col)
    }

    pub fn hash_cells(cells: &[CellSnapshot]) -> u64 {
        fnv1a64(cells.iter().flat_map(|c| c.visual_bytes()))
    }

    /// Accepting swaps right now
    pub fn playable(&self) -> bool {
        self.started && self.status == Status::Playing && self.phase == Phase::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv_reference_values() {
        assert_eq!(fnv1a64(std::iter::empty()), 0xcbf29ce484222325);
        assert_eq!(fnv1a64(b"a".iter().copied()), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn test_hash_ignores_identity() {
        let a = Grid::from_ascii(&["AB", "BA"]);
        let mut b = Grid::from_ascii(&["AB", "BA"]);
        let piece = b.piece(Coord::new(0, 0)).copied();
        let renumbered = piece.map(|mut p| {
            p.id += 100;
            p
        });
        b.set(Coord::new(0, 0), renumbered).unwrap();

        let cells = |g: &Grid| -> Vec<CellSnapshot> {
            (0..2)
                .flat_map(|row| (0..2).map(move |col| Coord::new(col, row)))
                .map(|at| CellSnapshot::of(g, at))
                .collect()
        };
        assert_eq!(
            GameSnapshot::hash_cells(&cells(&a)),
            GameSnapshot::hash_cells(&cells(&b))
        );

        let c = Grid::from_ascii(&["AB", "BB"]);
        assert_ne!(
            GameSnapshot::hash_cells(&cells(&a)),
            GameSnapshot::hash_cells(&cells(&c))
        );
    }

    #[test]
    fn test_cell_lookup_bounds() {
        let snap = GameSnapshot {
            width: 2,
            height: 1,
            cells: vec![CellSnapshot::default(); 2],
            ..Default::default()
        };
        assert!(snap.cell(1, 0).is_some());
        assert!(snap.cell(2, 0).is_none());
        assert!(snap.cell(0, 1).is_none());
    }
}
