//! Level configuration - everything a game reads from the outside at setup
//!
//! A [`LevelConfig`] is plain data: board size, per-cell layout, palette, goals, score
//! goals and the end condition. It is validated once when a game is created and then
//! only read.

use thiserror::Error;

use crate::grid::{Grid, GridError};
use crate::types::{
    Coord, EndCondition, Tag, TileKind, DEFAULT_BASE_PIECE_VALUE, MAX_BOARD_SIDE, MAX_PALETTE,
};

/// Level validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("board size {width}x{height} is outside 1..={max}")]
    BoardSize {
        width: usize,
        height: usize,
        max: usize,
    },
    #[error("palette must hold between 1 and {max} tags, got {len}")]
    PaletteSize { len: usize, max: usize },
    #[error("duplicate palette entry {0:?}")]
    DuplicateTag(String),
    #[error("layout tile at ({col}, {row}) is outside the board")]
    TileOutOfBounds { col: usize, row: usize },
    #[error("goal {index} targets tag {tag} which is not in the palette")]
    UnknownGoalTag { index: usize, tag: u8 },
    #[error("goal {index} targets {kind}, which is not an obstacle")]
    InvalidGoalObstacle { index: usize, kind: &'static str },
    #[error("goal {index} needs zero pieces")]
    EmptyGoal { index: usize },
    #[error("end condition {0} needs a positive counter")]
    EmptyEndCondition(&'static str),
    #[error("level has no playable cells")]
    NoPlayableCells,
    #[error("grid is {got_width}x{got_height} but the level is {width}x{height}")]
    GridMismatch {
        width: usize,
        height: usize,
        got_width: usize,
        got_height: usize,
    },
}

impl From<GridError> for ConfigError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::OutOfBounds { col, row, .. } => ConfigError::TileOutOfBounds { col, row },
        }
    }
}

/// One layout entry. Cells not listed are `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpec {
    pub at: Coord,
    pub kind: TileKind,
    pub hit_points: Option<i32>,
}

impl TileSpec {
    pub fn new(col: usize, row: usize, kind: TileKind) -> Self {
        Self {
            at: Coord::new(col, row),
            kind,
            hit_points: None,
        }
    }

    pub fn with_hit_points(mut self, hit_points: i32) -> Self {
        self.hit_points = Some(hit_points);
        self
    }
}

/// What a goal counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalTarget {
    /// Destroyed pieces of a tag
    Tag(Tag),
    /// Cleared obstacles of a kind
    Obstacle(TileKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalSpec {
    pub target: GoalTarget,
    pub needed: u32,
}

/// Static description of one level
#[derive(Debug, Clone, PartialEq)]
pub struct LevelConfig {
    pub width: usize,
    pub height: usize,
    pub layout: Vec<TileSpec>,
    /// Tag names; `Tag(i)` is `palette[i]`
    pub palette: Vec<String>,
    /// Ascending score thresholds, one star each
    pub score_goals: Vec<u32>,
    pub end_condition: EndCondition,
    pub goals: Vec<GoalSpec>,
    pub base_piece_value: u32,
}

impl LevelConfig {
    /// A plain level: no layout entries, no goals, default moves.
    pub fn new(width: usize, height: usize, palette: &[&str]) -> Self {
        Self {
            width,
            height,
            layout: Vec::new(),
            palette: palette.iter().map(|s| s.to_string()).collect(),
            score_goals: Vec::new(),
            end_condition: EndCondition::default(),
            goals: Vec::new(),
            base_piece_value: DEFAULT_BASE_PIECE_VALUE,
        }
    }

    pub fn with_tile(mut self, tile: TileSpec) -> Self {
        self.layout.push(tile);
        self
    }

    pub fn with_goal(mut self, target: GoalTarget, needed: u32) -> Self {
        self.goals.push(GoalSpec { target, needed });
        self
    }

    pub fn with_end_condition(mut self, end: EndCondition) -> Self {
        self.end_condition = end;
        self
    }

    pub fn with_score_goals(mut self, goals: &[u32]) -> Self {
        self.score_goals = goals.to_vec();
        self
    }

    pub fn with_base_piece_value(mut self, value: u32) -> Self {
        self.base_piece_value = value;
        self
    }

    pub fn palette_len(&self) -> usize {
        self.palette.len()
    }

    pub fn tag_name(&self, tag: Tag) -> Option<&str> {
        self.palette.get(tag.index()).map(String::as_str)
    }

    pub fn tag_named(&self, name: &str) -> Option<Tag> {
        self.palette
            .iter()
            .position(|p| p.eq_ignore_ascii_case(name))
            .map(|i| Tag(i as u8))
    }

    /// Check the configuration without building anything
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0
            || self.height == 0
            || self.width > MAX_BOARD_SIDE
            || self.height > MAX_BOARD_SIDE
        {
            return Err(ConfigError::BoardSize {
                width: self.width,
                height: self.height,
                max: MAX_BOARD_SIDE,
            });
        }
        if self.palette.is_empty() || self.palette.len() > MAX_PALETTE {
            return Err(ConfigError::PaletteSize {
                len: self.palette.len(),
                max: MAX_PALETTE,
            });
        }
        for (i, name) in self.palette.iter().enumerate() {
            if self.palette[..i].iter().any(|p| p.eq_ignore_ascii_case(name)) {
                return Err(ConfigError::DuplicateTag(name.clone()));
            }
        }
        for tile in &self.layout {
            if tile.at.col >= self.width || tile.at.row >= self.height {
                return Err(ConfigError::TileOutOfBounds {
                    col: tile.at.col,
                    row: tile.at.row,
                });
            }
        }
        for (index, goal) in self.goals.iter().enumerate() {
            if goal.needed == 0 {
                return Err(ConfigError::EmptyGoal { index });
            }
            match goal.target {
                GoalTarget::Tag(tag) if tag.index() >= self.palette.len() => {
                    return Err(ConfigError::UnknownGoalTag { index, tag: tag.0 });
                }
                GoalTarget::Obstacle(kind) if !kind.is_obstacle() => {
                    return Err(ConfigError::InvalidGoalObstacle {
                        index,
                        kind: kind.as_str(),
                    });
                }
                _ => {}
            }
        }
        if self.end_condition.counter() == 0 {
            return Err(ConfigError::EmptyEndCondition(self.end_condition.as_str()));
        }
        Ok(())
    }

    /// Build the empty grid described by the layout (no pieces yet)
    pub fn build_grid(&self) -> Result<Grid, ConfigError> {
        self.validate()?;
        let mut grid = Grid::new(self.width, self.height);
        for tile in &self.layout {
            grid.set_tile(tile.at, tile.kind, tile.hit_points)?;
        }
        if grid.playable_count() == 0 {
            return Err(ConfigError::NoPlayableCells);
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_level_validates() {
        let level = LevelConfig::new(8, 8, &["red", "green", "blue"]);
        assert!(level.validate().is_ok());
        assert_eq!(level.tag_named("GREEN"), Some(Tag(1)));
        assert_eq!(level.tag_name(Tag(2)), Some("blue"));
        assert_eq!(level.tag_name(Tag(3)), None);
    }

    #[test]
    fn test_rejects_bad_sizes() {
        let level = LevelConfig::new(0, 8, &["red"]);
        assert!(matches!(level.validate(), Err(ConfigError::BoardSize { .. })));
        let level = LevelConfig::new(8, MAX_BOARD_SIDE + 1, &["red"]);
        assert!(matches!(level.validate(), Err(ConfigError::BoardSize { .. })));
        let level = LevelConfig::new(8, 8, &[]);
        assert!(matches!(level.validate(), Err(ConfigError::PaletteSize { .. })));
    }

    #[test]
    fn test_rejects_duplicate_palette() {
        let level = LevelConfig::new(4, 4, &["red", "Red"]);
        assert_eq!(
            level.validate(),
            Err(ConfigError::DuplicateTag("Red".to_string()))
        );
    }

    #[test]
    fn test_rejects_tile_outside_board() {
        let level =
            LevelConfig::new(4, 4, &["a", "b", "c"]).with_tile(TileSpec::new(4, 0, TileKind::Blank));
        assert_eq!(
            level.validate(),
            Err(ConfigError::TileOutOfBounds { col: 4, row: 0 })
        );
    }

    #[test]
    fn test_rejects_bad_goals() {
        let level = LevelConfig::new(4, 4, &["a", "b"]).with_goal(GoalTarget::Tag(Tag(5)), 3);
        assert!(matches!(
            level.validate(),
            Err(ConfigError::UnknownGoalTag { index: 0, tag: 5 })
        ));
        let level =
            LevelConfig::new(4, 4, &["a", "b"]).with_goal(GoalTarget::Obstacle(TileKind::Blank), 1);
        assert!(matches!(
            level.validate(),
            Err(ConfigError::InvalidGoalObstacle { .. })
        ));
        let level = LevelConfig::new(4, 4, &["a", "b"]).with_goal(GoalTarget::Tag(Tag(0)), 0);
        assert_eq!(level.validate(), Err(ConfigError::EmptyGoal { index: 0 }));
    }

    #[test]
    fn test_rejects_zero_end_counter() {
        let level =
            LevelConfig::new(4, 4, &["a", "b"]).with_end_condition(EndCondition::Time(0));
        assert_eq!(
            level.validate(),
            Err(ConfigError::EmptyEndCondition("time"))
        );
    }

    #[test]
    fn test_build_grid_applies_layout() {
        let level = LevelConfig::new(3, 3, &["a", "b", "c"])
            .with_tile(TileSpec::new(0, 0, TileKind::Blank))
            .with_tile(TileSpec::new(1, 1, TileKind::Dirt).with_hit_points(2));
        let grid = level.build_grid().unwrap();
        assert!(grid.is_blank(Coord::new(0, 0)).unwrap());
        assert!(grid.is_blocked(Coord::new(1, 1)).unwrap());
        assert_eq!(grid.obstacle(Coord::new(1, 1)).unwrap().hit_points, 2);
        assert_eq!(grid.playable_count(), 7);
    }

    #[test]
    fn test_build_grid_needs_playable_cells() {
        let level = LevelConfig::new(1, 1, &["a"]).with_tile(TileSpec::new(0, 0, TileKind::Blank));
        assert_eq!(level.build_grid(), Err(ConfigError::NoPlayableCells));
    }
}
