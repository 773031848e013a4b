//! dotmatch (workspace facade crate).
//!
//! Re-exports the workspace crates as `dotmatch::{core,engine,adapter,types}` so binaries,
//! tests and benches share one import path.

pub use dotmatch_adapter as adapter;
pub use dotmatch_core as core;
pub use dotmatch_engine as engine;
pub use dotmatch_types as types;
