//! Core game logic module - pure, deterministic, and testable
//!
//! This crate contains the board simulation and match-resolution engine.
//! It has **zero dependencies** on UI, networking, or I/O, making it:
//!
//! - **Deterministic**: the same level and random source produce identical games
//! - **Testable**: every rule is unit tested against hand-built boards
//! - **Portable**: runs headless, under a session actor, or behind any renderer
//!
//! # Module Structure
//!
//! - [`rng`]: pluggable random source (seeded LCG, scripted replay)
//! - [`grid`]: the board, with blank and obstacle masks and gravity
//! - [`level`]: level configuration and validation
//! - [`matcher`]: run detection, power-up expansion and shape classification
//! - [`powerup`]: power-up creation from a classified match
//! - [`deadlock`]: productive-move search and reshuffling
//! - [`goals`]: per-level collection goals
//! - [`scoring`]: cascade scoring and stars
//! - [`game_state`]: the swap/resolve state machine tying it all together
//! - [`snapshot`]: read-only board views with a stable hash
//!
//! # Rules
//!
//! - **Swap**: two orthogonally adjacent pieces trade places; a swap that completes no
//!   run is reversed and costs nothing
//! - **Cascade**: matched pieces are destroyed, columns fall, empty cells refill, and the
//!   board is scanned again with the streak raised by one
//! - **Power-ups**: four in a line makes a row or column bomb (by swipe axis), a corner
//!   makes an adjacent bomb, five in a line makes a color bomb
//! - **Deadlock**: when no swap can match, the pieces are reshuffled in place
//!
//! # Example
//!
//! ```
//! use dotmatch_core::{GameState, LevelConfig, SwapOutcome};
//! use dotmatch_core::deadlock::productive_swaps;
//! use dotmatch_types::SwapRequest;
//!
//! let level = LevelConfig::new(8, 8, &["red", "green", "blue", "yellow"]);
//! let mut game = GameState::with_seed(level, 12345).unwrap();
//! game.start();
//!
//! // The board never starts deadlocked, so there is always a productive swap
//! let (at, dir) = productive_swaps(game.grid())[0];
//! let outcome = game.apply_swap(SwapRequest::new(at.col, at.row, dir));
//! assert!(matches!(outcome, SwapOutcome::Resolved(_)));
//! assert!(game.score() > 0);
//! ```

pub mod deadlock;
pub mod game_state;
pub mod goals;
pub mod grid;
pub mod level;
pub mod matcher;
pub mod powerup;
pub mod rng;
pub mod scoring;
pub mod snapshot;

pub use dotmatch_types as types;

// Re-export commonly used types for convenience
pub use deadlock::{is_deadlocked, shuffle, ShuffleReport};
pub use game_state::{
    GameState, NoDelay, PhaseDelay, ResolveReport, SleepDelay, SwapOutcome,
};
pub use goals::{GoalProgress, GoalTracker};
pub use grid::{Grid, GridError, Obstacle, Piece};
pub use level::{ConfigError, GoalSpec, GoalTarget, LevelConfig, TileSpec};
pub use matcher::{scan, MatchSet, SwapContext};
pub use powerup::{classify_and_upgrade, Upgrade};
pub use rng::{RandomSource, ScriptedRng, SimpleRng};
pub use snapshot::{CellSnapshot, GameSnapshot};
