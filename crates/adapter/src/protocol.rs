//! Protocol module - line-delimited JSON messages between a client and a session
//!
//! Every message is one JSON object with a `type` field. Clients send commands (`swap`,
//! `swipe`, `pause`, `resume`, `restart`, `hint`, `observe`, `tick`); the session answers
//! with `ack`/`error`, streams `event` messages produced by the core, and sends
//! `observation` and `hint` messages on request.

use serde::{Deserialize, Serialize};

use crate::core::{GameSnapshot, GoalTarget, LevelConfig, ResolveReport};
use crate::types::{CoreEvent, Coord, EndCondition, InvalidSwap, Tag};

// ============== Client -> Session Messages ==============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Swap {
        #[serde(default)]
        seq: u64,
        col: usize,
        row: usize,
        dir: String,
    },
    Swipe {
        #[serde(default)]
        seq: u64,
        col: usize,
        row: usize,
        /// Degrees, counter-clockwise from the positive column axis
        angle: f32,
    },
    Pause {
        #[serde(default)]
        seq: u64,
    },
    Resume {
        #[serde(default)]
        seq: u64,
    },
    Restart {
        #[serde(default)]
        seq: u64,
    },
    Hint {
        #[serde(default)]
        seq: u64,
    },
    Observe {
        #[serde(default)]
        seq: u64,
    },
    Tick {
        #[serde(default)]
        seq: u64,
        elapsed_ms: u32,
    },
}

impl ClientMessage {
    pub fn seq(&self) -> u64 {
        match *self {
            ClientMessage::Swap { seq, .. }
            | ClientMessage::Swipe { seq, .. }
            | ClientMessage::Pause { seq }
            | ClientMessage::Resume { seq }
            | ClientMessage::Restart { seq }
            | ClientMessage::Hint { seq }
            | ClientMessage::Observe { seq }
            | ClientMessage::Tick { seq, .. } => seq,
        }
    }
}

/// Parsed incoming line
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedMessage {
    Client(ClientMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

const KNOWN_TYPES: [&str; 8] = [
    "swap", "swipe", "pause", "resume", "restart", "hint", "observe", "tick",
];

/// Parse one line. An unrecognized `type` is not a hard error: it comes back as
/// [`ParsedMessage::Unknown`] so the session can answer with its `seq`.
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    match serde_json::from_str::<ClientMessage>(json) {
        Ok(m) => Ok(ParsedMessage::Client(m)),
        Err(e) => {
            #[derive(Debug, Deserialize)]
            struct TypeOnly<'a> {
                #[serde(rename = "type")]
                msg_type: Option<&'a str>,
            }
            let msg_type = serde_json::from_str::<TypeOnly>(json)?
                .msg_type
                .unwrap_or("unknown");
            if !KNOWN_TYPES.contains(&msg_type) {
                #[derive(Debug, Deserialize)]
                struct SeqOnly {
                    seq: Option<u64>,
                }
                let seq = serde_json::from_str::<SeqOnly>(json)?.seq.unwrap_or(0);
                return Ok(ParsedMessage::Unknown(UnknownMessage { seq }));
            }
            Err(e)
        }
    }
}

// ============== Session -> Client Messages ==============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Ack(AckMessage),
    Error(ErrorMessage),
    Event(EventMessage),
    Observation(ObservationMessage),
    Hint(HintMessage),
}

impl ServerMessage {
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckStatus {
    /// Command applied
    Ok,
    /// Swap was valid but produced no match and was reversed
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckMessage {
    pub seq: u64,
    pub status: AckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<SwapResult>,
}

/// Summary of an accepted swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapResult {
    pub passes: u32,
    pub destroyed: usize,
    pub score_gained: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub power_ups: Vec<PowerUpView>,
    pub shuffled: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub truncated: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpView {
    pub col: usize,
    pub row: usize,
    pub power: String,
}

impl From<&ResolveReport> for SwapResult {
    fn from(report: &ResolveReport) -> Self {
        Self {
            passes: report.passes,
            destroyed: report.destroyed,
            score_gained: report.score_gained,
            power_ups: report
                .power_ups
                .iter()
                .map(|u| PowerUpView {
                    col: u.at.col,
                    row: u.at.row,
                    power: u.power.as_str().to_string(),
                })
                .collect(),
            shuffled: report.shuffle.is_some(),
            truncated: report.truncated,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "invalid_command")]
    InvalidCommand,
    #[serde(rename = "unknown_type")]
    UnknownType,
    #[serde(rename = "out_of_bounds")]
    OutOfBounds,
    #[serde(rename = "blank_cell")]
    BlankCell,
    #[serde(rename = "empty_cell")]
    EmptyCell,
    #[serde(rename = "locked_cell")]
    LockedCell,
    #[serde(rename = "not_playable")]
    NotPlayable,
    #[serde(rename = "busy")]
    Busy,
}

impl From<InvalidSwap> for ErrorCode {
    fn from(value: InvalidSwap) -> Self {
        match value {
            InvalidSwap::OutOfBounds => ErrorCode::OutOfBounds,
            InvalidSwap::Blank => ErrorCode::BlankCell,
            InvalidSwap::Empty => ErrorCode::EmptyCell,
            InvalidSwap::Locked => ErrorCode::LockedCell,
            InvalidSwap::NotPlayable => ErrorCode::NotPlayable,
            InvalidSwap::Busy => ErrorCode::Busy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub seq: u64,
    pub code: ErrorCode,
    pub message: String,
}

/// One core event. Only the fields relevant to `event` are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventMessage {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    /// Palette name of the destroyed piece
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
    /// Obstacle kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passes: Option<u32>,
    /// Goal index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl EventMessage {
    pub fn from_core(event: &CoreEvent, level: &LevelConfig) -> Self {
        let mut msg = EventMessage {
            event: event.name().to_string(),
            ..Default::default()
        };
        match *event {
            CoreEvent::MatchDestroyed { tag, at: c } => {
                msg.place(c);
                msg.tag = Some(tag_label(level, tag));
            }
            CoreEvent::ScoreDelta { amount, streak } => {
                msg.amount = Some(amount);
                msg.streak = Some(streak);
            }
            CoreEvent::DestroyEffect { at: c }
            | CoreEvent::RefillExhausted { at: c }
            | CoreEvent::ShuffleExhausted { at: c } => msg.place(c),
            CoreEvent::ObstacleDamaged {
                at: c,
                kind,
                remaining,
            } => {
                msg.place(c);
                msg.kind = Some(kind.as_str().to_string());
                msg.remaining = Some(remaining);
            }
            CoreEvent::ObstacleCleared { at: c, kind } => {
                msg.place(c);
                msg.kind = Some(kind.as_str().to_string());
            }
            CoreEvent::PowerUpCreated { at: c, power } => {
                msg.place(c);
                msg.power = Some(power.as_str().to_string());
            }
            CoreEvent::DeadlockShuffled { passes } => msg.passes = Some(passes),
            CoreEvent::GoalCompleted { index } => msg.index = Some(index),
            CoreEvent::GameWon | CoreEvent::GameLost => {}
        }
        msg
    }
}

impl EventMessage {
    fn place(&mut self, at: Coord) {
        self.col = Some(at.col);
        self.row = Some(at.row);
    }
}

fn tag_label(level: &LevelConfig, tag: Tag) -> String {
    level
        .tag_name(tag)
        .map(str::to_string)
        .unwrap_or_else(|| tag.0.to_string())
}

/// Deterministic board hash serialized as 16 lowercase hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHash(pub u64);

impl Serialize for StateHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut buf = [0u8; 16];
        let mut v = self.0;
        for i in 0..16 {
            buf[15 - i] = HEX[(v & 0x0f) as usize];
            v >>= 4;
        }
        let s = std::str::from_utf8(&buf).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(s)
    }
}

impl<'de> Deserialize<'de> for StateHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        u64::from_str_radix(s.trim(), 16)
            .map(StateHash)
            .map_err(|_| serde::de::Error::custom("invalid hex"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleView {
    pub col: usize,
    pub row: usize,
    pub kind: String,
    pub hit_points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    pub width: usize,
    pub height: usize,
    /// `tags[row][col]`, bottom row first: palette index, -1 for no piece
    pub tags: Vec<Vec<i16>>,
    /// Same layout: 0 none, 1 row bomb, 2 column bomb, 3 color bomb, 4 adjacent bomb
    pub powers: Vec<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blanks: Vec<[usize; 2]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obstacles: Vec<ObstacleView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalView {
    /// Palette name or obstacle kind
    pub target: String,
    pub needed: u32,
    pub collected: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationMessage {
    pub seq: u64,
    pub playable: bool,
    pub status: String,
    pub phase: String,
    pub episode_id: u32,
    pub palette: Vec<String>,
    pub board: BoardView,
    pub state_hash: StateHash,
    pub score: u32,
    pub streak: u32,
    pub stars: u32,
    /// "moves" or "time"
    pub end_type: String,
    /// Moves or seconds left
    pub remaining: u32,
    pub moves_made: u32,
    pub goals: Vec<GoalView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintMessage {
    pub seq: u64,
    /// `None` when the board has no productive swap
    pub col: Option<usize>,
    pub row: Option<usize>,
    pub dir: Option<String>,
}

// ============== Builders ==============

pub fn create_ack(seq: u64, status: AckStatus, result: Option<SwapResult>) -> ServerMessage {
    ServerMessage::Ack(AckMessage {
        seq,
        status,
        result,
    })
}

pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ServerMessage {
    ServerMessage::Error(ErrorMessage {
        seq,
        code,
        message: message.to_string(),
    })
}

pub fn build_observation(seq: u64, snap: &GameSnapshot, level: &LevelConfig) -> ObservationMessage {
    let mut tags = Vec::with_capacity(snap.height);
    let mut powers = Vec::with_capacity(snap.height);
    let mut blanks = Vec::new();
    let mut obstacles = Vec::new();
    for row in 0..snap.height {
        let mut tag_row = Vec::with_capacity(snap.width);
        let mut power_row = Vec::with_capacity(snap.width);
        for col in 0..snap.width {
            let cell = snap.cell(col, row).copied().unwrap_or_default();
            tag_row.push(cell.tag.map_or(-1, |t| t.0 as i16));
            power_row.push(power_code(cell.power));
            if cell.blank {
                blanks.push([col, row]);
            }
            if let Some(kind) = cell.obstacle {
                obstacles.push(ObstacleView {
                    col,
                    row,
                    kind: kind.as_str().to_string(),
                    hit_points: cell.hit_points,
                });
            }
        }
        tags.push(tag_row);
        powers.push(power_row);
    }

    let goals = snap
        .goals
        .iter()
        .map(|g| GoalView {
            target: match g.target {
                GoalTarget::Tag(tag) => tag_label(level, tag),
                GoalTarget::Obstacle(kind) => kind.as_str().to_string(),
            },
            needed: g.needed,
            collected: g.collected,
        })
        .collect();

    let (end_type, remaining) = match snap.end_condition {
        EndCondition::Moves(n) => ("moves", n),
        EndCondition::Time(n) => ("time", n),
    };

    ObservationMessage {
        seq,
        playable: snap.playable(),
        status: snap.status.as_str().to_string(),
        phase: snap.phase.as_str().to_string(),
        episode_id: snap.episode_id,
        palette: level.palette.clone(),
        board: BoardView {
            width: snap.width,
            height: snap.height,
            tags,
            powers,
            blanks,
            obstacles,
        },
        state_hash: StateHash(snap.board_hash),
        score: snap.score,
        streak: snap.streak,
        stars: snap.stars,
        end_type: end_type.to_string(),
        remaining,
        moves_made: snap.moves_made,
        goals,
    }
}

fn power_code(power: crate::types::PowerUp) -> u8 {
    use crate::types::PowerUp;
    match power {
        PowerUp::None => 0,
        PowerUp::RowBomb => 1,
        PowerUp::ColumnBomb => 2,
        PowerUp::ColorBomb => 3,
        PowerUp::AdjacentBomb => 4,
    }
}
