//! Line-protocol runner (default binary).
//!
//! Reads one JSON request per line on stdin and writes every reply as a JSON line on
//! stdout. The level comes from `DOTMATCH_LEVEL_PATH` when set, otherwise a plain 8x8
//! board with four tags and twenty moves is used. Session settings are read from the
//! `DOTMATCH_*` variables documented in [`dotmatch::adapter::session`].

use std::env;

use anyhow::{Context, Result};
use tokio::io::{self, BufReader};

use dotmatch::adapter::{load_level, serve_lines, Session, SessionConfig, SessionHandle};
use dotmatch::core::LevelConfig;
use dotmatch::types::EndCondition;

fn default_level() -> LevelConfig {
    LevelConfig::new(8, 8, &["red", "green", "blue", "yellow"])
        .with_score_goals(&[1_000, 2_500, 4_000])
        .with_end_condition(EndCondition::Moves(20))
}

fn level_from_env() -> Result<LevelConfig> {
    match env::var("DOTMATCH_LEVEL_PATH") {
        Ok(path) if !path.trim().is_empty() => load_level(path.trim()),
        _ => Ok(default_level()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let level = level_from_env()?;
    let config = SessionConfig::from_env();
    eprintln!(
        "[dotmatch] {}x{} board, seed {}, reading requests from stdin",
        level.width, level.height, config.seed
    );

    let session = Session::new(level, config).context("failed to start session")?;
    let handle = SessionHandle::spawn(session)?;

    let handled = serve_lines(&handle, BufReader::new(io::stdin()), io::stdout()).await?;
    eprintln!("[dotmatch] stdin closed after {} requests", handled);

    handle.shutdown()
}
