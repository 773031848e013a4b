//! Session - one game driven by protocol messages
//!
//! A [`Session`] owns the [`GameState`], turns client messages into core calls and core
//! events into server messages, appends every outbound message to an optional JSONL log
//! and records the result of each finished game in a [`SaveStore`].
//!
//! # Environment Variables
//!
//! - `DOTMATCH_SEED`: seed for the built-in random source (default: 1)
//! - `DOTMATCH_LOG_PATH`: append outbound messages here as JSON lines
//! - `DOTMATCH_PACE_MS`: pause between resolution phases (default: 0, no pacing)
//! - `DOTMATCH_SAVE_PATH`: JSON save file (default: in-memory progress)
//! - `DOTMATCH_HINT_DELAY_MS`: idle time before a hint is pushed on `tick` (default: 3000)
//! - `DOTMATCH_LEVEL_INDEX`: level number used for saved progress (default: 0)

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};

use crate::core::{GameState, LevelConfig, NoDelay, PhaseDelay, SimpleRng, SleepDelay, SwapOutcome};
use crate::engine::{pick_hint, HintTimer, Move};
use crate::protocol::{
    build_observation, create_ack, create_error, parse_message, AckStatus, ClientMessage,
    ErrorCode, EventMessage, HintMessage, ParsedMessage, ServerMessage, SwapResult,
};
use crate::store::{JsonFileStore, MemoryStore, SaveStore};
use crate::types::{Direction, Status, SwapRequest};

pub const DEFAULT_HINT_DELAY_MS: u32 = 3_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub seed: u32,
    pub log_path: Option<String>,
    pub pace_ms: u32,
    pub save_path: Option<String>,
    pub hint_delay_ms: u32,
    pub level_index: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            log_path: None,
            pace_ms: 0,
            save_path: None,
            hint_delay_ms: DEFAULT_HINT_DELAY_MS,
            level_index: 0,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        use std::env;

        fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
            env::var(key).ok().and_then(|s| s.trim().parse().ok())
        }
        fn path(key: &str) -> Option<String> {
            env::var(key)
                .ok()
                .map(|s| s.trim().to_string())
                .and_then(|s| if s.is_empty() { None } else { Some(s) })
        }

        let defaults = Self::default();
        Self {
            seed: parsed("DOTMATCH_SEED").unwrap_or(defaults.seed),
            log_path: path("DOTMATCH_LOG_PATH"),
            pace_ms: parsed("DOTMATCH_PACE_MS").unwrap_or(defaults.pace_ms),
            save_path: path("DOTMATCH_SAVE_PATH"),
            hint_delay_ms: parsed("DOTMATCH_HINT_DELAY_MS").unwrap_or(defaults.hint_delay_ms),
            level_index: parsed("DOTMATCH_LEVEL_INDEX").unwrap_or(defaults.level_index),
        }
    }
}

pub struct Session {
    game: GameState<SimpleRng>,
    config: SessionConfig,
    store: Box<dyn SaveStore + Send>,
    log: Option<BufWriter<File>>,
    hints: HintTimer,
    hint_rng: SimpleRng,
    /// The current episode's result is already saved
    recorded: bool,
}

impl Session {
    /// Start a session, using a file store when `save_path` is set
    pub fn new(level: LevelConfig, config: SessionConfig) -> Result<Self> {
        let store: Box<dyn SaveStore + Send> = match &config.save_path {
            Some(path) => Box::new(JsonFileStore::new(path)),
            None => Box::new(MemoryStore::new()),
        };
        Self::with_store(level, config, store)
    }

    pub fn with_store(
        level: LevelConfig,
        config: SessionConfig,
        store: Box<dyn SaveStore + Send>,
    ) -> Result<Self> {
        let mut game = GameState::with_seed(level, config.seed).context("invalid level")?;
        game.start();

        let log = match &config.log_path {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("failed to open event log {}", path))?;
                Some(BufWriter::new(file))
            }
            None => None,
        };

        let mut session = Self {
            game,
            hints: HintTimer::new(config.hint_delay_ms),
            hint_rng: SimpleRng::new(config.seed.wrapping_add(1)),
            config,
            store,
            log,
            recorded: false,
        };
        // Setup may already have reshuffled; surface that in the log.
        let setup = session.drain_events();
        session.emit(&setup);
        Ok(session)
    }

    pub fn game(&self) -> &GameState<SimpleRng> {
        &self.game
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store_mut(&mut self) -> &mut dyn SaveStore {
        self.store.as_mut()
    }

    pub fn current_hint(&self) -> Option<Move> {
        self.hints.current()
    }

    /// Handle one raw protocol line
    pub fn handle_line(&mut self, line: &str) -> Vec<ServerMessage> {
        let out = match parse_message(line) {
            Ok(ParsedMessage::Client(msg)) => return self.handle(msg),
            Ok(ParsedMessage::Unknown(m)) => vec![create_error(
                m.seq,
                ErrorCode::UnknownType,
                "unknown message type",
            )],
            Err(e) => vec![create_error(
                0,
                ErrorCode::InvalidCommand,
                &format!("malformed message: {}", e),
            )],
        };
        self.emit(&out);
        out
    }

    /// Handle one parsed message. Events come first, the reply last.
    pub fn handle(&mut self, msg: ClientMessage) -> Vec<ServerMessage> {
        let seq = msg.seq();
        let mut out = Vec::new();
        match msg {
            ClientMessage::Swap { col, row, dir, .. } => match Direction::from_str(&dir) {
                Some(direction) => {
                    self.swap(seq, SwapRequest::new(col, row, direction), &mut out)
                }
                None => out.push(create_error(
                    seq,
                    ErrorCode::InvalidCommand,
                    &format!("unknown direction {:?}", dir),
                )),
            },
            ClientMessage::Swipe { col, row, angle, .. } => {
                if angle.is_finite() {
                    self.swap(seq, SwapRequest::from_swipe(col, row, angle), &mut out)
                } else {
                    out.push(create_error(seq, ErrorCode::InvalidCommand, "angle must be finite"))
                }
            }
            ClientMessage::Pause { .. } => {
                self.game.set_paused(true);
                out.push(create_ack(seq, AckStatus::Ok, None));
            }
            ClientMessage::Resume { .. } => {
                self.game.set_paused(false);
                out.push(create_ack(seq, AckStatus::Ok, None));
            }
            ClientMessage::Restart { .. } => {
                self.game.restart();
                self.hints.clear();
                self.recorded = false;
                eprintln!("[Session] Episode {} started", self.game.episode_id());
                out.extend(self.drain_events());
                out.push(create_ack(seq, AckStatus::Ok, None));
            }
            ClientMessage::Hint { .. } => {
                let mv = pick_hint(self.game.grid(), &mut self.hint_rng);
                out.push(hint_message(seq, mv));
            }
            ClientMessage::Observe { .. } => {
                let obs = build_observation(seq, &self.game.snapshot(), self.game.level());
                out.push(ServerMessage::Observation(obs));
            }
            ClientMessage::Tick { elapsed_ms, .. } => {
                self.game.tick(elapsed_ms);
                if self.game.accepts_input() {
                    if let Some(mv) = self
                        .hints
                        .tick(elapsed_ms, self.game.grid(), &mut self.hint_rng)
                    {
                        out.push(hint_message(seq, Some(mv)));
                    }
                }
                out.extend(self.drain_events());
                self.record_if_finished();
                out.push(create_ack(seq, AckStatus::Ok, None));
            }
        }
        self.emit(&out);
        out
    }

    fn swap(&mut self, seq: u64, request: SwapRequest, out: &mut Vec<ServerMessage>) {
        self.hints.clear();
        let mut sleep = SleepDelay {
            step_ms: self.config.pace_ms,
        };
        let mut instant = NoDelay;
        let delay: &mut dyn PhaseDelay = if self.config.pace_ms > 0 {
            &mut sleep
        } else {
            &mut instant
        };
        let outcome = self.game.apply_swap_paced(request, delay);
        match outcome {
            SwapOutcome::Rejected(reason) => {
                out.push(create_error(seq, reason.into(), reason.message()));
            }
            SwapOutcome::NoMatch => {
                out.push(create_ack(seq, AckStatus::NoMatch, None));
            }
            SwapOutcome::Resolved(report) => {
                out.extend(self.drain_events());
                self.record_if_finished();
                out.push(create_ack(seq, AckStatus::Ok, Some(SwapResult::from(&report))));
            }
        }
    }

    /// Drain core events into event messages, reporting diagnostics on stderr
    fn drain_events(&mut self) -> Vec<ServerMessage> {
        let events = self.game.take_events();
        let level = self.game.level();
        let mut out = Vec::with_capacity(events.len());
        for ev in events {
            if ev.is_diagnostic() {
                eprintln!("[Session] {:?}", ev);
            }
            out.push(ServerMessage::Event(EventMessage::from_core(&ev, level)));
        }
        out
    }

    /// Save the result once per finished episode
    fn record_if_finished(&mut self) {
        let status = self.game.status();
        if !status.is_finished() || self.recorded {
            return;
        }
        self.recorded = true;
        let won = status == Status::Won;
        eprintln!(
            "[Session] Episode {} {} with score {}",
            self.game.episode_id(),
            status.as_str(),
            self.game.score()
        );
        let level = self.config.level_index;
        let (score, stars) = (self.game.score(), self.game.stars());
        let result = self.store.load().and_then(|mut data| {
            if data.record(level, score, stars, won) {
                self.store.save(&data)?;
            }
            Ok(())
        });
        if let Err(e) = result {
            eprintln!("[Session] Failed to save progress: {:#}", e);
        }
    }

    fn emit(&mut self, messages: &[ServerMessage]) {
        let Some(log) = self.log.as_mut() else {
            return;
        };
        let mut write = || -> std::io::Result<()> {
            for msg in messages {
                serde_json::to_writer(&mut *log, msg)?;
                log.write_all(b"\n")?;
            }
            log.flush()
        };
        if let Err(e) = write() {
            eprintln!("[Session] Event log disabled: {}", e);
            self.log = None;
        }
    }
}

fn hint_message(seq: u64, mv: Option<Move>) -> ServerMessage {
    ServerMessage::Hint(HintMessage {
        seq,
        col: mv.map(|m| m.origin.col),
        row: mv.map(|m| m.origin.row),
        dir: mv.map(|m| m.direction.as_str().to_string()),
    })
}
