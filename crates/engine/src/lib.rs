//! Move search on top of the core simulation
//!
//! - [`hint`]: every swap that would match, a random pick, and an idle timer that decides
//!   when to show one
//! - [`play`]: apply a move through the game state and a greedy best-move policy

pub mod hint;
pub mod play;

pub use hint::{find_possible_moves, pick_hint, HintTimer, Move};
pub use play::{apply_move, best_move, evaluate_moves, MoveError};
