//! Grid module - owns every cell of the board
//!
//! The grid is a `width x height` array of cells stored flat in column-major order
//! (`col * height + row`) so a column is contiguous, which is what gravity walks.
//! Row 0 is the bottom row.
//!
//! Each cell has three layers:
//! - an optional [`Piece`]
//! - a blank flag (never holds a piece, fixed by the layout)
//! - an optional [`Obstacle`] (Breakable/Lock overlay a piece, Dirt/Chocolate block the cell)
//!
//! All other components mutate pieces through the grid; nobody else holds piece records.

use thiserror::Error;

use crate::types::{Coord, PowerUp, Tag, TileKind, DEFAULT_HIT_POINTS};

/// Coordinate access outside the board. Always a caller bug, never recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell ({col}, {row}) is outside the {width}x{height} board")]
    OutOfBounds {
        col: usize,
        row: usize,
        width: usize,
        height: usize,
    },
}

/// A single tagged piece.
///
/// `id` is assigned by the grid when the piece is created and never changes;
/// reshuffling moves records around without renumbering them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub id: u32,
    pub tag: Tag,
    pub power: PowerUp,
    pub matched: bool,
}

impl Piece {
    pub fn new(id: u32, tag: Tag) -> Self {
        Self {
            id,
            tag,
            power: PowerUp::None,
            matched: false,
        }
    }

    /// Tag used for run detection. Color bombs never take part in runs.
    pub fn match_tag(&self) -> Option<Tag> {
        if self.power == PowerUp::ColorBomb {
            None
        } else {
            Some(self.tag)
        }
    }
}

/// Obstacle covering a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Obstacle {
    pub kind: TileKind,
    pub hit_points: i32,
}

/// Result of one hit on an obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObstacleHit {
    pub kind: TileKind,
    /// Remaining hit points, clamped at zero
    pub remaining: i32,
    pub cleared: bool,
}

/// The board: pieces plus the parallel blank and obstacle masks
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    pieces: Vec<Option<Piece>>,
    blank: Vec<bool>,
    obstacles: Vec<Option<Obstacle>>,
    next_id: u32,
}

impl Grid {
    /// Create an empty grid where every cell is a normal, unoccupied cell
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            pieces: vec![None; size],
            blank: vec![false; size],
            obstacles: vec![None; size],
            next_id: 1,
        }
    }

    /// Build a grid from ASCII rows, listed top row first.
    ///
    /// - `A`..`Z`: a piece with tag 0..25
    /// - `.`: empty playable cell
    /// - `#`: blank cell
    /// - `x`: dirt, `c`: chocolate (blocked, one hit point)
    /// - `b`: empty breakable cell, `l`: empty lock cell
    ///
    /// Rows shorter than the widest row are padded with blank cells.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = Grid::new(width, height);
        for (i, line) in rows.iter().enumerate() {
            let row = height - 1 - i;
            let mut chars = line.chars();
            for col in 0..width {
                let at = Coord::new(col, row);
                let idx = grid.idx(at);
                match chars.next() {
                    Some(ch @ 'A'..='Z') => {
                        let piece = grid.new_piece(Tag(ch as u8 - b'A'));
                        grid.pieces[idx] = Some(piece);
                    }
                    Some('.') => {}
                    Some('x') => grid.obstacles[idx] = Some(Obstacle::new(TileKind::Dirt)),
                    Some('c') => grid.obstacles[idx] = Some(Obstacle::new(TileKind::Chocolate)),
                    Some('b') => grid.obstacles[idx] = Some(Obstacle::new(TileKind::Breakable)),
                    Some('l') => grid.obstacles[idx] = Some(Obstacle::new(TileKind::Lock)),
                    _ => grid.blank[idx] = true,
                }
            }
        }
        grid
    }

    /// Render as ASCII rows (top row first), the inverse of [`Grid::from_ascii`]
    /// for tags, empty cells, blanks and blockers. Overlays are not shown.
    pub fn to_ascii(&self) -> Vec<String> {
        (0..self.height)
            .rev()
            .map(|row| {
                (0..self.width)
                    .map(|col| {
                        let at = Coord::new(col, row);
                        let idx = self.idx(at);
                        if self.blank[idx] {
                            return '#';
                        }
                        match (self.pieces[idx], self.obstacles[idx]) {
                            (Some(p), _) => (b'A' + p.tag.0.min(25)) as char,
                            (None, Some(o)) if o.kind == TileKind::Dirt => 'x',
                            (None, Some(o)) if o.kind == TileKind::Chocolate => 'c',
                            _ => '.',
                        }
                    })
                    .collect()
            })
            .collect()
    }

    #[inline(always)]
    fn idx(&self, at: Coord) -> usize {
        at.col * self.height + at.row
    }

    /// Flat index of a coordinate, or `OutOfBounds`
    pub fn index(&self, at: Coord) -> Result<usize, GridError> {
        if self.contains(at) {
            Ok(self.idx(at))
        } else {
            Err(GridError::OutOfBounds {
                col: at.col,
                row: at.row,
                width: self.width,
                height: self.height,
            })
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, at: Coord) -> bool {
        at.col < self.width && at.row < self.height
    }

    /// Piece at `at` (copied out)
    pub fn get(&self, at: Coord) -> Result<Option<Piece>, GridError> {
        let idx = self.index(at)?;
        Ok(self.pieces[idx])
    }

    /// Place or clear the piece at `at`
    pub fn set(&mut self, at: Coord, piece: Option<Piece>) -> Result<(), GridError> {
        let idx = self.index(at)?;
        self.pieces[idx] = piece;
        Ok(())
    }

    /// Remove and return the piece at `at`
    pub fn take(&mut self, at: Coord) -> Result<Option<Piece>, GridError> {
        let idx = self.index(at)?;
        Ok(self.pieces[idx].take())
    }

    /// Borrow the piece at `at`; `None` when empty or outside the board
    pub fn piece(&self, at: Coord) -> Option<&Piece> {
        if !self.contains(at) {
            return None;
        }
        self.pieces[self.idx(at)].as_ref()
    }

    pub fn piece_mut(&mut self, at: Coord) -> Option<&mut Piece> {
        if !self.contains(at) {
            return None;
        }
        let idx = self.idx(at);
        self.pieces[idx].as_mut()
    }

    pub fn is_blank(&self, at: Coord) -> Result<bool, GridError> {
        let idx = self.index(at)?;
        Ok(self.blank[idx])
    }

    /// True while a Dirt/Chocolate obstacle covers the cell
    pub fn is_blocked(&self, at: Coord) -> Result<bool, GridError> {
        let idx = self.index(at)?;
        Ok(self.obstacles[idx].is_some_and(|o| o.kind.blocks_pieces()))
    }

    /// In bounds, not blank and not blocked: the cell should hold a piece at rest
    pub fn is_playable(&self, at: Coord) -> bool {
        self.contains(at)
            && !self.blank[self.idx(at)]
            && !self.obstacles[self.idx(at)].is_some_and(|o| o.kind.blocks_pieces())
    }

    /// A Lock obstacle pins the piece on this cell
    pub fn is_locked(&self, at: Coord) -> bool {
        self.obstacle(at).is_some_and(|o| o.kind == TileKind::Lock)
    }

    pub fn obstacle(&self, at: Coord) -> Option<Obstacle> {
        if !self.contains(at) {
            return None;
        }
        self.obstacles[self.idx(at)]
    }

    /// Apply a layout classification to a cell.
    ///
    /// `Normal` clears any obstacle, `Blank` removes the piece and marks the cell blank,
    /// obstacle kinds install an obstacle with `hit_points` (default 1, at least 1).
    pub fn set_tile(
        &mut self,
        at: Coord,
        kind: TileKind,
        hit_points: Option<i32>,
    ) -> Result<(), GridError> {
        let idx = self.index(at)?;
        match kind {
            TileKind::Normal => {
                self.blank[idx] = false;
                self.obstacles[idx] = None;
            }
            TileKind::Blank => {
                self.blank[idx] = true;
                self.obstacles[idx] = None;
                self.pieces[idx] = None;
            }
            _ => {
                self.blank[idx] = false;
                self.obstacles[idx] = Some(Obstacle {
                    kind,
                    hit_points: hit_points.unwrap_or(DEFAULT_HIT_POINTS).max(1),
                });
                if kind.blocks_pieces() {
                    self.pieces[idx] = None;
                }
            }
        }
        Ok(())
    }

    /// Apply one point of damage to the obstacle at `at`.
    ///
    /// Hit points are clamped at zero; an obstacle at zero is removed.
    pub fn damage(&mut self, at: Coord) -> Option<ObstacleHit> {
        if !self.contains(at) {
            return None;
        }
        let idx = self.idx(at);
        let obstacle = self.obstacles[idx].as_mut()?;
        obstacle.hit_points = (obstacle.hit_points - 1).max(0);
        let hit = ObstacleHit {
            kind: obstacle.kind,
            remaining: obstacle.hit_points,
            cleared: obstacle.hit_points == 0,
        };
        if hit.cleared {
            self.obstacles[idx] = None;
        }
        Some(hit)
    }

    /// Create a fresh piece record with the next identity
    pub fn new_piece(&mut self, tag: Tag) -> Piece {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        Piece::new(id, tag)
    }

    /// Create a piece and place it at `at`
    pub fn spawn(&mut self, at: Coord, tag: Tag) -> Result<Piece, GridError> {
        self.index(at)?;
        let piece = self.new_piece(tag);
        self.set(at, Some(piece))?;
        Ok(piece)
    }

    /// Exchange the contents of two cells
    pub fn swap(&mut self, a: Coord, b: Coord) -> Result<(), GridError> {
        let ia = self.index(a)?;
        let ib = self.index(b)?;
        self.pieces.swap(ia, ib);
        Ok(())
    }

    /// Gravity: compact every column toward row 0.
    ///
    /// Pieces keep their relative order and fall past blank and blocked cells into the
    /// lowest free playable cells. Returns the number of pieces that moved.
    pub fn collapse(&mut self) -> usize {
        let mut moved = 0;
        let mut targets = Vec::with_capacity(self.height);
        for col in 0..self.width {
            targets.clear();
            targets.extend(
                (0..self.height)
                    .map(|row| Coord::new(col, row))
                    .filter(|&at| self.is_playable(at))
                    .map(|at| self.idx(at)),
            );
            // targets[next] never lies above the cell being read.
            let mut next = 0usize;
            for &src in &targets {
                if let Some(piece) = self.pieces[src].take() {
                    let dst = targets[next];
                    if dst != src {
                        moved += 1;
                    }
                    self.pieces[dst] = Some(piece);
                    next += 1;
                }
            }
        }
        moved
    }

    /// All coordinates, column by column, bottom-up
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        let height = self.height;
        (0..self.width).flat_map(move |col| (0..height).map(move |row| Coord::new(col, row)))
    }

    /// Playable coordinates in column-major order
    pub fn playable_coords(&self) -> Vec<Coord> {
        self.coords().filter(|&at| self.is_playable(at)).collect()
    }

    /// Playable cells without a piece
    pub fn empty_playable(&self) -> Vec<Coord> {
        self.coords()
            .filter(|&at| self.is_playable(at) && self.piece(at).is_none())
            .collect()
    }

    /// Number of playable cells holding a piece
    pub fn occupied_playable(&self) -> usize {
        self.coords()
            .filter(|&at| self.is_playable(at) && self.piece(at).is_some())
            .count()
    }

    /// Number of playable cells
    pub fn playable_count(&self) -> usize {
        self.coords().filter(|&at| self.is_playable(at)).count()
    }

    /// Locate a piece by identity
    pub fn find_piece(&self, id: u32) -> Option<Coord> {
        self.coords()
            .find(|&at| self.piece(at).is_some_and(|p| p.id == id))
    }

    /// Coordinates whose piece is flagged matched
    pub fn matched_coords(&self) -> Vec<Coord> {
        self.coords()
            .filter(|&at| self.piece(at).is_some_and(|p| p.matched))
            .collect()
    }

    pub fn clear_matched_flags(&mut self) {
        for piece in self.pieces.iter_mut().flatten() {
            piece.matched = false;
        }
    }

    /// Obstacles still on the board
    pub fn obstacle_count(&self, kind: TileKind) -> usize {
        self.obstacles
            .iter()
            .flatten()
            .filter(|o| o.kind == kind)
            .count()
    }
}

impl Obstacle {
    pub fn new(kind: TileKind) -> Self {
        Self {
            kind,
            hit_points: DEFAULT_HIT_POINTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_roundtrip() {
        let mut grid = Grid::new(4, 3);
        let piece = grid.spawn(Coord::new(1, 2), Tag(2)).unwrap();
        assert_eq!(grid.get(Coord::new(1, 2)).unwrap(), Some(piece));
        grid.set(Coord::new(1, 2), None).unwrap();
        assert_eq!(grid.get(Coord::new(1, 2)).unwrap(), None);
    }

    #[test]
    fn test_out_of_bounds_is_an_error() {
        let mut grid = Grid::new(4, 3);
        let err = grid.get(Coord::new(4, 0)).unwrap_err();
        assert_eq!(
            err,
            GridError::OutOfBounds {
                col: 4,
                row: 0,
                width: 4,
                height: 3
            }
        );
        assert!(grid.set(Coord::new(0, 3), None).is_err());
        assert!(grid.is_blank(Coord::new(9, 9)).is_err());
        assert!(grid.is_blocked(Coord::new(0, 3)).is_err());
        assert!(grid.swap(Coord::new(0, 0), Coord::new(0, 3)).is_err());
        assert!(err.to_string().contains("outside"));
    }

    #[test]
    fn test_ascii_rows_are_top_first() {
        let grid = Grid::from_ascii(&["AB", "C#"]);
        assert_eq!(grid.piece(Coord::new(0, 1)).unwrap().tag, Tag(0));
        assert_eq!(grid.piece(Coord::new(1, 1)).unwrap().tag, Tag(1));
        assert_eq!(grid.piece(Coord::new(0, 0)).unwrap().tag, Tag(2));
        assert!(grid.is_blank(Coord::new(1, 0)).unwrap());
        assert_eq!(grid.to_ascii(), vec!["AB".to_string(), "C#".to_string()]);
    }

    #[test]
    fn test_ids_are_unique() {
        let grid = Grid::from_ascii(&["ABC", "ABC"]);
        let mut ids: Vec<u32> = grid.coords().filter_map(|c| grid.piece(c)).map(|p| p.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn test_collapse_preserves_order() {
        let mut grid = Grid::from_ascii(&["A", "B", ".", "C", "."]);
        let moved = grid.collapse();
        assert_eq!(grid.to_ascii(), vec![".", ".", "A", "B", "C"]);
        assert_eq!(moved, 3);
    }

    #[test]
    fn test_collapse_falls_through_blank_and_blocked() {
        let mut grid = Grid::from_ascii(&["A", "#", "x", "."]);
        grid.collapse();
        assert_eq!(grid.to_ascii(), vec![".", "#", "x", "A"]);
    }

    #[test]
    fn test_blocked_cells_are_not_playable() {
        let grid = Grid::from_ascii(&["x.c"]);
        assert!(grid.is_blocked(Coord::new(0, 0)).unwrap());
        assert!(!grid.is_playable(Coord::new(0, 0)));
        assert!(grid.is_playable(Coord::new(1, 0)));
        assert!(grid.is_blocked(Coord::new(2, 0)).unwrap());
        assert_eq!(grid.playable_count(), 1);
    }

    #[test]
    fn test_damage_clamps_and_removes() {
        let mut grid = Grid::new(2, 1);
        grid.set_tile(Coord::new(0, 0), TileKind::Breakable, Some(2)).unwrap();
        let hit = grid.damage(Coord::new(0, 0)).unwrap();
        assert_eq!(hit.remaining, 1);
        assert!(!hit.cleared);
        let hit = grid.damage(Coord::new(0, 0)).unwrap();
        assert_eq!(hit.remaining, 0);
        assert!(hit.cleared);
        assert!(grid.obstacle(Coord::new(0, 0)).is_none());
        assert!(grid.damage(Coord::new(0, 0)).is_none());
        assert!(grid.damage(Coord::new(1, 0)).is_none());
    }

    #[test]
    fn test_set_tile_hit_points_at_least_one() {
        let mut grid = Grid::new(1, 1);
        grid.set_tile(Coord::new(0, 0), TileKind::Lock, Some(-3)).unwrap();
        assert_eq!(grid.obstacle(Coord::new(0, 0)).unwrap().hit_points, 1);
        assert!(grid.is_locked(Coord::new(0, 0)));
    }

    #[test]
    fn test_find_piece_after_swap() {
        let mut grid = Grid::from_ascii(&["AB"]);
        let id = grid.piece(Coord::new(0, 0)).unwrap().id;
        grid.swap(Coord::new(0, 0), Coord::new(1, 0)).unwrap();
        assert_eq!(grid.find_piece(id), Some(Coord::new(1, 0)));
    }

    #[test]
    fn test_color_bomb_has_no_match_tag() {
        let mut piece = Piece::new(1, Tag(3));
        assert_eq!(piece.match_tag(), Some(Tag(3)));
        piece.power = PowerUp::ColorBomb;
        assert_eq!(piece.match_tag(), None);
        piece.power = PowerUp::RowBomb;
        assert_eq!(piece.match_tag(), Some(Tag(3)));
    }
}
