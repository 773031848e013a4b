//! Adapter module - the game's external interfaces
//!
//! Everything here sits outside the deterministic core: files, wire messages, saved
//! progress and the thread that owns a running game.
//!
//! - [`level`]: JSON level and world files
//! - [`protocol`]: line-delimited JSON messages (`swap`/`swipe` in, `event`/`ack` out)
//! - [`store`]: save-data persistence port
//! - [`session`]: one game driven by protocol messages, with a JSONL event log
//! - [`runtime`]: single-owner session thread behind an async handle
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Session: {"type":"swap","seq":1,"col":4,"row":3,"dir":"right"}
//! Session -> Client: {"type":"event","event":"match_destroyed","col":4,"row":4,"tag":"blue"}
//! Session -> Client: {"type":"event","event":"score_delta","amount":20,"streak":1}
//! ...
//! Session -> Client: {"type":"ack","seq":1,"status":"ok","result":{"passes":1,...}}
//! Client -> Session: {"type":"observe","seq":2}
//! Session -> Client: {"type":"observation","seq":2,"playable":true,...}
//! ```

pub mod level;
pub mod protocol;
pub mod runtime;
pub mod session;
pub mod store;

pub use dotmatch_core as core;
pub use dotmatch_engine as engine;
pub use dotmatch_types as types;

pub use level::{load_level, load_world, parse_level, parse_world, LevelFile, WorldFile};
pub use protocol::*;
pub use runtime::{serve_lines, Inbound, SessionHandle};
pub use session::{Session, SessionConfig};
pub use store::{JsonFileStore, MemoryStore, SaveData, SaveStore};
