//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core logic, move search, external protocol).
//!
//! # Coordinates
//!
//! Cells are addressed as `(col, row)`:
//!
//! - **col**: 0 is the leftmost column
//! - **row**: 0 is the **bottom** row; pieces fall toward row 0
//! - [`Direction::Up`] therefore means `row + 1`
//!
//! # Resolution Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `MATCH_RETRY_LIMIT` | 100 | Redraws before accepting a placement that completes a run |
//! | `MAX_SHUFFLE_PASSES` | 32 | Full reshuffles attempted before giving up on a deadlock |
//! | `MAX_CASCADE_PASSES` | 64 | Cascade passes per swap before the loop gives up |
//! | `POWER_UP_MIN_MATCH` | 4 | Matched cells needed before a power-up can be created |
//! | `DEFAULT_BASE_PIECE_VALUE` | 20 | Points per destroyed piece at streak 1 |
//! | `REFILL_DELAY_MS` | 200 | Pacing pause around refill (headless callers use none) |
//!
//! # Examples
//!
//! ```
//! use dotmatch_types::{Coord, Direction, PowerUp, SwapRequest};
//!
//! // Parse a direction (case-insensitive)
//! let dir = Direction::from_str("Right").unwrap();
//! assert_eq!(dir, Direction::Right);
//!
//! // Swipes map to directions by angle
//! assert_eq!(Direction::from_swipe_angle(100.0), Direction::Up);
//!
//! // Neighbor lookup is bounds-checked at zero
//! assert_eq!(Coord::new(0, 3).step(Direction::Left), None);
//! assert_eq!(Coord::new(0, 3).step(Direction::Up), Some(Coord::new(0, 4)));
//!
//! let req = SwapRequest::new(2, 3, Direction::Right);
//! assert_eq!(req.target(), Some(Coord::new(3, 3)));
//! assert_eq!(PowerUp::from_str("rowBomb"), Some(PowerUp::RowBomb));
//! ```

/// Redraw limit when a random placement would complete a run.
///
/// Reaching the limit accepts the last candidate (degraded randomness, never a hang).
pub const MATCH_RETRY_LIMIT: u32 = 100;

/// Maximum number of full reshuffles for one deadlock.
pub const MAX_SHUFFLE_PASSES: u32 = 32;

/// Minimum number of matched cells before a power-up may be created.
pub const POWER_UP_MIN_MATCH: usize = 4;

/// Cascade passes per swap before the loop stops with matches left on the board.
///
/// Only reachable on degenerate palettes where refill cannot avoid runs.
pub const MAX_CASCADE_PASSES: u32 = 64;

/// Points per destroyed piece at streak 1.
pub const DEFAULT_BASE_PIECE_VALUE: u32 = 20;

/// Hit points of an obstacle when the layout does not specify them.
pub const DEFAULT_HIT_POINTS: i32 = 1;

/// Largest supported board side.
pub const MAX_BOARD_SIDE: usize = 64;

/// Largest supported palette.
pub const MAX_PALETTE: usize = 32;

/// Pacing pause around refill (milliseconds). Collapse uses half of it.
pub const REFILL_DELAY_MS: u32 = 200;

/// Time-limited levels count down in whole seconds.
pub const COUNTDOWN_STEP_MS: u32 = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_defaults() {
        assert_eq!(MATCH_RETRY_LIMIT, 100);
        assert_eq!(POWER_UP_MIN_MATCH, 4);
        assert_eq!(COUNTDOWN_STEP_MS, 1000);
        assert!(MAX_SHUFFLE_PASSES > 0);
    }

    #[test]
    fn direction_from_swipe_angle_boundaries() {
        assert_eq!(Direction::from_swipe_angle(0.0), Direction::Right);
        assert_eq!(Direction::from_swipe_angle(45.0), Direction::Right);
        assert_eq!(Direction::from_swipe_angle(45.1), Direction::Up);
        assert_eq!(Direction::from_swipe_angle(135.0), Direction::Up);
        assert_eq!(Direction::from_swipe_angle(135.1), Direction::Left);
        assert_eq!(Direction::from_swipe_angle(-135.0), Direction::Left);
        assert_eq!(Direction::from_swipe_angle(-134.9), Direction::Down);
        assert_eq!(Direction::from_swipe_angle(-45.0), Direction::Down);
        assert_eq!(Direction::from_swipe_angle(-44.9), Direction::Right);
    }

    #[test]
    fn direction_angle_roundtrip() {
        for dir in Direction::ALL {
            assert_eq!(Direction::from_swipe_angle(dir.swipe_angle()), dir);
        }
    }

    #[test]
    fn coord_step_at_edges() {
        let c = Coord::new(0, 0);
        assert_eq!(c.step(Direction::Down), None);
        assert_eq!(c.step(Direction::Left), None);
        assert_eq!(c.step(Direction::Right), Some(Coord::new(1, 0)));
        assert_eq!(c.step(Direction::Up), Some(Coord::new(0, 1)));
    }

    #[test]
    fn tile_kind_strings() {
        for kind in TileKind::ALL {
            assert_eq!(TileKind::from_str(kind.as_str()), Some(kind));
        }
        assert!(TileKind::Dirt.blocks_pieces());
        assert!(TileKind::Chocolate.blocks_pieces());
        assert!(!TileKind::Lock.blocks_pieces());
        assert!(TileKind::Lock.is_overlay());
        assert!(!TileKind::Blank.is_obstacle());
    }

    #[test]
    fn invalid_swap_codes_are_distinct() {
        let all = [
            InvalidSwap::OutOfBounds,
            InvalidSwap::Blank,
            InvalidSwap::Empty,
            InvalidSwap::Locked,
            InvalidSwap::NotPlayable,
            InvalidSwap::Busy,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.code(), b.code());
            }
        }
    }
}

/// A piece's color/kind: an index into the level palette.
///
/// Palette names are strings owned by the level configuration; the core only
/// compares indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u8);

impl Tag {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Grid position. Row 0 is the bottom row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub col: usize,
    pub row: usize,
}

impl Coord {
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    /// Neighbor one cell away in `dir`.
    ///
    /// Returns `None` only when the step would go below zero; the upper bound is the
    /// grid's concern.
    pub fn step(self, dir: Direction) -> Option<Coord> {
        let (dc, dr) = dir.delta();
        Some(Coord {
            col: self.col.checked_add_signed(dc)?,
            row: self.row.checked_add_signed(dr)?,
        })
    }
}

/// Swap direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Column/row delta. Up increases the row.
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Direction selected by a swipe angle in degrees (atan2 convention, y up).
    ///
    /// - right: (-45, 45]
    /// - up: (45, 135]
    /// - left: > 135 or <= -135
    /// - down: [-135, -45)
    pub fn from_swipe_angle(angle: f32) -> Self {
        if angle > -45.0 && angle <= 45.0 {
            Direction::Right
        } else if angle > 45.0 && angle <= 135.0 {
            Direction::Up
        } else if angle > 135.0 || angle <= -135.0 {
            Direction::Left
        } else {
            Direction::Down
        }
    }

    /// Canonical swipe angle for a direction.
    pub fn swipe_angle(self) -> f32 {
        match self {
            Direction::Right => 0.0,
            Direction::Up => 90.0,
            Direction::Left => 180.0,
            Direction::Down => -90.0,
        }
    }

    /// Parse direction from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "up" | "u" => Some(Direction::Up),
            "down" | "d" => Some(Direction::Down),
            "left" | "l" => Some(Direction::Left),
            "right" | "r" => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Power-up carried by a piece
///
/// - **RowBomb**: clears its whole row when matched
/// - **ColumnBomb**: clears its whole column when matched
/// - **ColorBomb**: swapped with a piece, clears every piece of that piece's tag
/// - **AdjacentBomb**: clears the 3x3 neighborhood around it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PowerUp {
    #[default]
    None,
    RowBomb,
    ColumnBomb,
    ColorBomb,
    AdjacentBomb,
}

impl PowerUp {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(PowerUp::None),
            "rowbomb" | "row" => Some(PowerUp::RowBomb),
            "columnbomb" | "column" => Some(PowerUp::ColumnBomb),
            "colorbomb" | "color" => Some(PowerUp::ColorBomb),
            "adjacentbomb" | "adjacent" => Some(PowerUp::AdjacentBomb),
            _ => None,
        }
    }

    /// camelCase name used by the external protocol
    pub fn as_str(self) -> &'static str {
        match self {
            PowerUp::None => "none",
            PowerUp::RowBomb => "rowBomb",
            PowerUp::ColumnBomb => "columnBomb",
            PowerUp::ColorBomb => "colorBomb",
            PowerUp::AdjacentBomb => "adjacentBomb",
        }
    }

    pub fn is_some(self) -> bool {
        self != PowerUp::None
    }
}

/// Static per-cell layout classification
///
/// - **Normal**: playable cell
/// - **Blank**: never holds a piece
/// - **Breakable** / **Lock**: overlay a playable cell, take a hit when the piece on
///   top is destroyed; a locked piece cannot be swapped
/// - **Dirt** / **Chocolate**: block the cell until destroyed by adjacent matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileKind {
    #[default]
    Normal,
    Blank,
    Breakable,
    Lock,
    Dirt,
    Chocolate,
}

impl TileKind {
    pub const ALL: [TileKind; 6] = [
        TileKind::Normal,
        TileKind::Blank,
        TileKind::Breakable,
        TileKind::Lock,
        TileKind::Dirt,
        TileKind::Chocolate,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Some(TileKind::Normal),
            "blank" => Some(TileKind::Blank),
            "breakable" => Some(TileKind::Breakable),
            "lock" => Some(TileKind::Lock),
            "dirt" => Some(TileKind::Dirt),
            "chocolate" => Some(TileKind::Chocolate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TileKind::Normal => "normal",
            TileKind::Blank => "blank",
            TileKind::Breakable => "breakable",
            TileKind::Lock => "lock",
            TileKind::Dirt => "dirt",
            TileKind::Chocolate => "chocolate",
        }
    }

    /// Kinds that carry hit points.
    pub fn is_obstacle(self) -> bool {
        !matches!(self, TileKind::Normal | TileKind::Blank)
    }

    /// Overlay obstacles sit under a piece without blocking occupancy.
    pub fn is_overlay(self) -> bool {
        matches!(self, TileKind::Breakable | TileKind::Lock)
    }

    /// Blocking obstacles keep pieces out of the cell while present.
    pub fn blocks_pieces(self) -> bool {
        matches!(self, TileKind::Dirt | TileKind::Chocolate)
    }
}

/// Match classification used only to decide power-up creation.
///
/// The numeric codes follow the classic board scripts: 0 none, 1 long line, 2 corner,
/// 3 line of four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchShape {
    #[default]
    None,
    /// Five or more of one tag in a line (color bomb candidate)
    LongLine,
    /// A row run and a column run sharing a piece (adjacent bomb candidate)
    Corner,
    /// Four in a line (row/column bomb candidate)
    Line,
}

impl MatchShape {
    pub fn code(self) -> u8 {
        match self {
            MatchShape::None => 0,
            MatchShape::LongLine => 1,
            MatchShape::Corner => 2,
            MatchShape::Line => 3,
        }
    }
}

/// Resolution phase. Input is only accepted in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    Resolving,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Validating => "validating",
            Phase::Resolving => "resolving",
        }
    }
}

/// Play status. Paused, Won and Lost suspend input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Playing,
    Paused,
    Won,
    Lost,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Playing => "playing",
            Status::Paused => "paused",
            Status::Won => "won",
            Status::Lost => "lost",
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, Status::Won | Status::Lost)
    }
}

/// Steps between which a resolution cycle may pause for pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveStep {
    SwapApplied,
    Destroyed,
    Collapsed,
    Refilled,
}

/// Level end condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndCondition {
    /// Number of accepted swaps available
    Moves(u32),
    /// Seconds available
    Time(u32),
}

impl EndCondition {
    pub fn counter(self) -> u32 {
        match self {
            EndCondition::Moves(n) | EndCondition::Time(n) => n,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EndCondition::Moves(_) => "moves",
            EndCondition::Time(_) => "time",
        }
    }
}

impl Default for EndCondition {
    fn default() -> Self {
        EndCondition::Moves(30)
    }
}

/// A swap request: move the piece at `origin` one cell in `direction`.
///
/// `swipe_angle` is kept separately from the direction because the power-up classifier
/// decides row vs. column bombs from the raw angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapRequest {
    pub origin: Coord,
    pub direction: Direction,
    pub swipe_angle: f32,
}

impl SwapRequest {
    pub fn new(col: usize, row: usize, direction: Direction) -> Self {
        Self {
            origin: Coord::new(col, row),
            direction,
            swipe_angle: direction.swipe_angle(),
        }
    }

    /// Build a request from a swipe angle in degrees.
    pub fn from_swipe(col: usize, row: usize, swipe_angle: f32) -> Self {
        Self {
            origin: Coord::new(col, row),
            direction: Direction::from_swipe_angle(swipe_angle),
            swipe_angle,
        }
    }

    /// Cell the origin piece moves into (not bounds-checked against the grid).
    pub fn target(&self) -> Option<Coord> {
        self.origin.step(self.direction)
    }
}

/// Why a swap request was rejected. The board is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidSwap {
    OutOfBounds,
    Blank,
    Empty,
    Locked,
    NotPlayable,
    Busy,
}

impl InvalidSwap {
    pub fn code(self) -> &'static str {
        match self {
            InvalidSwap::OutOfBounds => "out_of_bounds",
            InvalidSwap::Blank => "blank_cell",
            InvalidSwap::Empty => "empty_cell",
            InvalidSwap::Locked => "locked_cell",
            InvalidSwap::NotPlayable => "not_playable",
            InvalidSwap::Busy => "busy",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            InvalidSwap::OutOfBounds => "swap targets a cell outside the board",
            InvalidSwap::Blank => "swap involves a blank cell",
            InvalidSwap::Empty => "swap involves a cell without a piece",
            InvalidSwap::Locked => "swap involves a locked piece",
            InvalidSwap::NotPlayable => "game is not accepting input",
            InvalidSwap::Busy => "a swap is already being resolved",
        }
    }
}

/// Core-side events, drained by observers after each operation.
///
/// Goal tracking, scoring displays, sound and effects all consume these; the core
/// never calls out to collaborators directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoreEvent {
    /// Once per destroyed piece, keyed by its tag.
    MatchDestroyed { tag: Tag, at: Coord },
    /// Once per destroyed piece: `base_piece_value * streak`.
    ScoreDelta { amount: u32, streak: u32 },
    /// Once per destroyed piece, for visual/sound effects.
    DestroyEffect { at: Coord },
    ObstacleDamaged { at: Coord, kind: TileKind, remaining: i32 },
    ObstacleCleared { at: Coord, kind: TileKind },
    PowerUpCreated { at: Coord, power: PowerUp },
    DeadlockShuffled { passes: u32 },
    /// A refill placement accepted a tile after the retry limit.
    RefillExhausted { at: Coord },
    /// A shuffle placement accepted a piece after the retry limit.
    ShuffleExhausted { at: Coord },
    GoalCompleted { index: usize },
    GameWon,
    GameLost,
}

impl CoreEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CoreEvent::MatchDestroyed { .. } => "match_destroyed",
            CoreEvent::ScoreDelta { .. } => "score_delta",
            CoreEvent::DestroyEffect { .. } => "destroy_effect",
            CoreEvent::ObstacleDamaged { .. } => "obstacle_damaged",
            CoreEvent::ObstacleCleared { .. } => "obstacle_cleared",
            CoreEvent::PowerUpCreated { .. } => "power_up_created",
            CoreEvent::DeadlockShuffled { .. } => "deadlock_shuffled",
            CoreEvent::RefillExhausted { .. } => "refill_exhausted",
            CoreEvent::ShuffleExhausted { .. } => "shuffle_exhausted",
            CoreEvent::GoalCompleted { .. } => "goal_completed",
            CoreEvent::GameWon => "game_won",
            CoreEvent::GameLost => "game_lost",
        }
    }

    /// Diagnostics worth logging rather than showing to a player.
    pub fn is_diagnostic(&self) -> bool {
        matches!(
            self,
            CoreEvent::DeadlockShuffled { .. }
                | CoreEvent::RefillExhausted { .. }
                | CoreEvent::ShuffleExhausted { .. }
        )
    }
}
