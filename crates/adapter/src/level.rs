//! JSON level and world files
//!
//! ```json
//! {
//!   "width": 8, "height": 8,
//!   "palette": ["red", "green", "blue", "yellow"],
//!   "layout": [{"x": 0, "y": 0, "kind": "blank"}, {"x": 3, "y": 4, "kind": "dirt", "hit_points": 2}],
//!   "score_goals": [1000, 2500, 4000],
//!   "end": {"type": "moves", "value": 20},
//!   "goals": [{"tag": "red", "needed": 15}, {"obstacle": "dirt", "needed": 1}]
//! }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{GoalTarget, LevelConfig, TileSpec};
use crate::types::{EndCondition, TileKind, DEFAULT_BASE_PIECE_VALUE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileEntry {
    pub x: usize,
    pub y: usize,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_points: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: u32,
}

/// Exactly one of `tag` and `obstacle` must be set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obstacle: Option<String>,
    pub needed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelFile {
    pub width: usize,
    pub height: usize,
    pub palette: Vec<String>,
    #[serde(default)]
    pub layout: Vec<TileEntry>,
    #[serde(default)]
    pub score_goals: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EndEntry>,
    #[serde(default)]
    pub goals: Vec<GoalEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_piece_value: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub levels: Vec<LevelFile>,
}

impl LevelFile {
    /// Convert names to core types and validate the result
    pub fn into_config(self) -> Result<LevelConfig> {
        let palette: Vec<&str> = self.palette.iter().map(String::as_str).collect();
        let mut level = LevelConfig::new(self.width, self.height, &palette)
            .with_score_goals(&self.score_goals)
            .with_base_piece_value(self.base_piece_value.unwrap_or(DEFAULT_BASE_PIECE_VALUE));

        for (i, tile) in self.layout.iter().enumerate() {
            let kind = TileKind::from_str(&tile.kind)
                .ok_or_else(|| anyhow!("layout entry {}: unknown tile kind {:?}", i, tile.kind))?;
            let mut spec = TileSpec::new(tile.x, tile.y, kind);
            spec.hit_points = tile.hit_points;
            level = level.with_tile(spec);
        }

        if let Some(end) = &self.end {
            let end = match end.kind.to_ascii_lowercase().as_str() {
                "moves" => EndCondition::Moves(end.value),
                "time" => EndCondition::Time(end.value),
                other => bail!("unknown end condition {:?}", other),
            };
            level = level.with_end_condition(end);
        }

        for (i, goal) in self.goals.iter().enumerate() {
            let target = match (&goal.tag, &goal.obstacle) {
                (Some(tag), None) => GoalTarget::Tag(
                    level
                        .tag_named(tag)
                        .ok_or_else(|| anyhow!("goal {}: tag {:?} is not in the palette", i, tag))?,
                ),
                (None, Some(kind)) => GoalTarget::Obstacle(
                    TileKind::from_str(kind)
                        .ok_or_else(|| anyhow!("goal {}: unknown obstacle {:?}", i, kind))?,
                ),
                _ => bail!("goal {}: set exactly one of \"tag\" and \"obstacle\"", i),
            };
            level = level.with_goal(target, goal.needed);
        }

        level.validate().context("invalid level")?;
        Ok(level)
    }

    /// Inverse of [`LevelFile::into_config`]
    pub fn from_config(level: &LevelConfig) -> Self {
        Self {
            width: level.width,
            height: level.height,
            palette: level.palette.clone(),
            layout: level
                .layout
                .iter()
                .map(|t| TileEntry {
                    x: t.at.col,
                    y: t.at.row,
                    kind: t.kind.as_str().to_string(),
                    hit_points: t.hit_points,
                })
                .collect(),
            score_goals: level.score_goals.clone(),
            end: Some(EndEntry {
                kind: level.end_condition.as_str().to_string(),
                value: level.end_condition.counter(),
            }),
            goals: level
                .goals
                .iter()
                .map(|g| match g.target {
                    GoalTarget::Tag(tag) => GoalEntry {
                        tag: level.tag_name(tag).map(str::to_string),
                        obstacle: None,
                        needed: g.needed,
                    },
                    GoalTarget::Obstacle(kind) => GoalEntry {
                        tag: None,
                        obstacle: Some(kind.as_str().to_string()),
                        needed: g.needed,
                    },
                })
                .collect(),
            base_piece_value: Some(level.base_piece_value),
        }
    }
}

pub fn parse_level(json: &str) -> Result<LevelConfig> {
    let file: LevelFile = serde_json::from_str(json).context("malformed level JSON")?;
    file.into_config()
}

pub fn load_level(path: impl AsRef<Path>) -> Result<LevelConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read level file {}", path.display()))?;
    parse_level(&text).with_context(|| format!("in level file {}", path.display()))
}

pub fn parse_world(json: &str) -> Result<Vec<LevelConfig>> {
    let file: WorldFile = serde_json::from_str(json).context("malformed world JSON")?;
    if file.levels.is_empty() {
        bail!("world has no levels");
    }
    file.levels
        .into_iter()
        .enumerate()
        .map(|(i, level)| level.into_config().with_context(|| format!("level {}", i)))
        .collect()
}

pub fn load_world(path: impl AsRef<Path>) -> Result<Vec<LevelConfig>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read world file {}", path.display()))?;
    parse_world(&text).with_context(|| format!("in world file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coord, Tag};

    const LEVEL: &str = r#"{
        "width": 6, "height": 5,
        "palette": ["red", "green", "blue", "yellow"],
        "layout": [
            {"x": 0, "y": 0, "kind": "blank"},
            {"x": 2, "y": 3, "kind": "dirt", "hit_points": 2},
            {"x": 4, "y": 1, "kind": "lock"}
        ],
        "score_goals": [500, 1000],
        "end": {"type": "time", "value": 60},
        "goals": [{"tag": "Green", "needed": 12}, {"obstacle": "dirt", "needed": 1}]
    }"#;

    #[test]
    fn test_parse_level() {
        let level = parse_level(LEVEL).unwrap();
        assert_eq!((level.width, level.height), (6, 5));
        assert_eq!(level.palette_len(), 4);
        assert_eq!(level.layout.len(), 3);
        assert_eq!(level.layout[1].at, Coord::new(2, 3));
        assert_eq!(level.layout[1].hit_points, Some(2));
        assert_eq!(level.end_condition, EndCondition::Time(60));
        assert_eq!(level.goals[0].target, GoalTarget::Tag(Tag(1)));
        assert_eq!(level.goals[1].target, GoalTarget::Obstacle(TileKind::Dirt));
        assert_eq!(level.base_piece_value, DEFAULT_BASE_PIECE_VALUE);

        let grid = level.build_grid().unwrap();
        assert_eq!(grid.playable_count(), 28);
    }

    #[test]
    fn test_defaults() {
        let level = parse_level(r#"{"width":3,"height":3,"palette":["a","b","c"]}"#).unwrap();
        assert!(level.layout.is_empty());
        assert!(level.goals.is_empty());
        assert_eq!(level.end_condition, EndCondition::default());
    }

    #[test]
    fn test_bad_levels_are_reported() {
        let err = parse_level(r#"{"width":3,"height":3,"palette":["a"],"layout":[{"x":0,"y":0,"kind":"lava"}]}"#)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("lava"));

        let err = parse_level(r#"{"width":3,"height":3,"palette":["a"],"goals":[{"tag":"b","needed":1}]}"#)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("not in the palette"));

        let err = parse_level(r#"{"width":3,"height":3,"palette":["a"],"goals":[{"needed":1}]}"#)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("exactly one"));

        let err = parse_level(r#"{"width":0,"height":3,"palette":["a"]}"#).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid level"));

        assert!(parse_level("{").is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let level = parse_level(LEVEL).unwrap();
        let json = serde_json::to_string(&LevelFile::from_config(&level)).unwrap();
        assert_eq!(parse_level(&json).unwrap(), level);
    }

    #[test]
    fn test_world_reports_failing_level() {
        let world = format!(r#"{{"name":"one","levels":[{},{{"width":2}}]}}"#, LEVEL);
        let err = parse_world(&world).unwrap_err();
        assert!(format!("{:#}", err).contains("malformed world JSON"));

        let world = format!(
            r#"{{"levels":[{},{{"width":2,"height":2,"palette":["a","a"]}}]}}"#,
            LEVEL
        );
        let err = parse_world(&world).unwrap_err();
        assert!(format!("{:#}", err).contains("level 1"));

        assert!(parse_world(r#"{"levels":[]}"#).is_err());
    }

    #[test]
    fn test_load_level_from_disk() {
        let dir = std::env::temp_dir().join(format!("dotmatch-level-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("level.json");
        fs::write(&path, LEVEL).unwrap();
        assert_eq!(load_level(&path).unwrap().width, 6);

        let missing = dir.join("missing.json");
        let err = load_level(&missing).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to read level file"));
        let _ = fs::remove_dir_all(&dir);
    }
}
