//! Game state module - the resolution engine
//!
//! [`GameState`] owns the grid, the random source, score, goals and the end condition.
//! A swap runs the whole cycle synchronously:
//!
//! ```text
//! Idle -> Validating (tentative swap + scan)
//!      -> no match: swap reversed, back to Idle
//!      -> match: Resolving
//!           upgrade -> destroy -> collapse -> refill -> scan, repeat with streak + 1
//!           deadlock check (+ reshuffle)
//!      -> Idle, streak back to 1, end condition checked
//! ```
//!
//! Pacing between phases is injected through [`PhaseDelay`]; headless callers use
//! [`NoDelay`] and the cycle runs instantly. Once resolving starts it always completes.

use std::thread;
use std::time::Duration;

use crate::deadlock::{is_deadlocked, shuffle, ShuffleReport};
use crate::goals::GoalTracker;
use crate::grid::Grid;
use crate::level::{ConfigError, GoalTarget, LevelConfig};
use crate::matcher::{creates_match_at, scan, MatchSet, SwapContext};
use crate::powerup::{classify_and_upgrade, Upgrade};
use crate::rng::{RandomSource, SimpleRng};
use crate::scoring::{piece_score, stars};
use crate::snapshot::{CellSnapshot, GameSnapshot};
use crate::types::*;

/// Pacing hook called between resolution phases.
///
/// Pauses only affect presentation; the resolved board is the same with or without them.
pub trait PhaseDelay {
    fn pause(&mut self, step: ResolveStep);
}

/// No pacing (headless)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl PhaseDelay for NoDelay {
    fn pause(&mut self, _step: ResolveStep) {}
}

/// Blocks the calling thread between phases. Collapse waits half as long.
#[derive(Debug, Clone, Copy)]
pub struct SleepDelay {
    pub step_ms: u32,
}

impl Default for SleepDelay {
    fn default() -> Self {
        Self {
            step_ms: REFILL_DELAY_MS,
        }
    }
}

impl PhaseDelay for SleepDelay {
    fn pause(&mut self, step: ResolveStep) {
        let ms = match step {
            ResolveStep::Collapsed => self.step_ms / 2,
            _ => self.step_ms,
        };
        if ms > 0 {
            thread::sleep(Duration::from_millis(ms as u64));
        }
    }
}

impl<F: FnMut(ResolveStep)> PhaseDelay for F {
    fn pause(&mut self, step: ResolveStep) {
        self(step)
    }
}

/// What one accepted swap did
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolveReport {
    /// Match passes, including the one triggered by the swap
    pub passes: u32,
    pub destroyed: usize,
    pub score_gained: u32,
    pub power_ups: Vec<Upgrade>,
    /// Reshuffle performed after the cascade settled
    pub shuffle: Option<ShuffleReport>,
    /// The cascade hit `MAX_CASCADE_PASSES` with matches left
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwapOutcome {
    /// Input error; nothing changed
    Rejected(InvalidSwap),
    /// Swap produced no match and was reversed
    NoMatch,
    Resolved(ResolveReport),
}

impl SwapOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, SwapOutcome::Resolved(_))
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState<R: RandomSource = SimpleRng> {
    level: LevelConfig,
    /// Layout with no pieces, kept for restarts
    template: Grid,
    grid: Grid,
    rng: R,
    phase: Phase,
    status: Status,
    started: bool,
    streak: u32,
    score: u32,
    counter: u32,
    countdown_ms: u32,
    moves_made: u32,
    episode_id: u32,
    goals: GoalTracker,
    events: Vec<CoreEvent>,
}

impl GameState<SimpleRng> {
    /// Create a game driven by the built-in LCG
    pub fn with_seed(level: LevelConfig, seed: u32) -> Result<Self, ConfigError> {
        Self::new(level, SimpleRng::new(seed))
    }
}

impl<R: RandomSource> GameState<R> {
    /// Validate the level, fill the board without runs and reshuffle if it starts
    /// deadlocked.
    pub fn new(level: LevelConfig, rng: R) -> Result<Self, ConfigError> {
        let template = level.build_grid()?;
        let mut state = Self::assemble(level, template.clone(), template, rng);
        state.populate();
        Ok(state)
    }

    /// Use a prepared board as-is (tests, replays). Empty playable cells are filled.
    pub fn from_grid(level: LevelConfig, grid: Grid, rng: R) -> Result<Self, ConfigError> {
        let template = level.build_grid()?;
        if grid.width() != level.width || grid.height() != level.height {
            return Err(ConfigError::GridMismatch {
                width: level.width,
                height: level.height,
                got_width: grid.width(),
                got_height: grid.height(),
            });
        }
        let mut state = Self::assemble(level, template, grid, rng);
        state.fill_empty();
        Ok(state)
    }

    fn assemble(level: LevelConfig, template: Grid, grid: Grid, rng: R) -> Self {
        let goals = GoalTracker::new(&level.goals);
        let counter = level.end_condition.counter();
        Self {
            level,
            template,
            grid,
            rng,
            phase: Phase::Idle,
            status: Status::Playing,
            started: false,
            streak: 1,
            score: 0,
            counter,
            countdown_ms: 0,
            moves_made: 0,
            episode_id: 0,
            goals,
            events: Vec::new(),
        }
    }

    /// Initial fill followed by the deadlock guard
    fn populate(&mut self) {
        self.fill_empty();
        if is_deadlocked(&self.grid) {
            self.reshuffle();
        }
    }

    /// Enable input
    pub fn start(&mut self) {
        self.started = true;
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Moves or seconds left
    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn moves_made(&self) -> u32 {
        self.moves_made
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn stars(&self) -> u32 {
        stars(self.score, &self.level.score_goals)
    }

    pub fn goals(&self) -> &GoalTracker {
        &self.goals
    }

    pub fn rng(&self) -> &R {
        &self.rng
    }

    /// Input is accepted only while started, playing and idle
    pub fn accepts_input(&self) -> bool {
        self.started && self.status == Status::Playing && self.phase == Phase::Idle
    }

    /// Drain queued events
    pub fn take_events(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[CoreEvent] {
        &self.events
    }

    /// Swap without pacing
    pub fn apply_swap(&mut self, request: SwapRequest) -> SwapOutcome {
        self.apply_swap_paced(request, &mut NoDelay)
    }

    /// Run a full swap cycle, calling `delay` between phases
    pub fn apply_swap_paced(
        &mut self,
        request: SwapRequest,
        delay: &mut dyn PhaseDelay,
    ) -> SwapOutcome {
        let (origin, target) = match self.validate_swap(&request) {
            Ok(cells) => cells,
            Err(reason) => return SwapOutcome::Rejected(reason),
        };

        self.phase = Phase::Validating;
        let (Some(primary), Some(partner)) = (self.grid.piece(origin), self.grid.piece(target))
        else {
            self.phase = Phase::Idle;
            return SwapOutcome::Rejected(InvalidSwap::Empty);
        };
        let ctx = SwapContext {
            origin,
            target,
            primary_id: primary.id,
            partner_id: partner.id,
            swipe_angle: request.swipe_angle,
        };

        if self.grid.swap(origin, target).is_err() {
            self.phase = Phase::Idle;
            return SwapOutcome::Rejected(InvalidSwap::OutOfBounds);
        }
        delay.pause(ResolveStep::SwapApplied);

        let set = scan(&mut self.grid, Some(&ctx));
        if set.is_empty() {
            // Both cells were validated above.
            let _ = self.grid.swap(origin, target);
            self.phase = Phase::Idle;
            return SwapOutcome::NoMatch;
        }

        self.phase = Phase::Resolving;
        self.streak = 1;
        self.moves_made += 1;
        if let EndCondition::Moves(_) = self.level.end_condition {
            self.counter = self.counter.saturating_sub(1);
        }

        let report = self.resolve(set, &ctx, delay);

        self.phase = Phase::Idle;
        self.streak = 1;
        self.check_end();
        SwapOutcome::Resolved(report)
    }

    fn validate_swap(&self, request: &SwapRequest) -> Result<(Coord, Coord), InvalidSwap> {
        if !self.started || self.status != Status::Playing {
            return Err(InvalidSwap::NotPlayable);
        }
        if self.phase != Phase::Idle {
            return Err(InvalidSwap::Busy);
        }
        let origin = request.origin;
        let target = request
            .target()
            .filter(|&t| self.grid.contains(t))
            .ok_or(InvalidSwap::OutOfBounds)?;
        if !self.grid.contains(origin) {
            return Err(InvalidSwap::OutOfBounds);
        }
        for at in [origin, target] {
            if self.grid.is_blank(at).unwrap_or(true) {
                return Err(InvalidSwap::Blank);
            }
        }
        for at in [origin, target] {
            if self.grid.piece(at).is_none() {
                return Err(InvalidSwap::Empty);
            }
        }
        if self.grid.is_locked(origin) || self.grid.is_locked(target) {
            return Err(InvalidSwap::Locked);
        }
        Ok((origin, target))
    }

    /// Destroy/collapse/refill/scan until the board settles
    fn resolve(
        &mut self,
        mut set: MatchSet,
        ctx: &SwapContext,
        delay: &mut dyn PhaseDelay,
    ) -> ResolveReport {
        let mut report = ResolveReport::default();
        loop {
            report.passes += 1;

            if let Some(upgrade) = classify_and_upgrade(&mut self.grid, &mut set, ctx) {
                self.events.push(CoreEvent::PowerUpCreated {
                    at: upgrade.at,
                    power: upgrade.power,
                });
                report.power_ups.push(upgrade);
            }

            let (destroyed, gained) = self.destroy_matches(&set);
            report.destroyed += destroyed;
            report.score_gained = report.score_gained.saturating_add(gained);
            delay.pause(ResolveStep::Destroyed);

            self.grid.collapse();
            delay.pause(ResolveStep::Collapsed);

            self.fill_empty();
            delay.pause(ResolveStep::Refilled);

            set = scan(&mut self.grid, None);
            if set.is_empty() {
                break;
            }
            if report.passes >= MAX_CASCADE_PASSES {
                self.grid.clear_matched_flags();
                report.truncated = true;
                break;
            }
            self.streak += 1;
        }

        if is_deadlocked(&self.grid) {
            report.shuffle = Some(self.reshuffle());
        }
        report
    }

    /// Destroy every cell of the set. Returns (pieces destroyed, points gained).
    fn destroy_matches(&mut self, set: &MatchSet) -> (usize, u32) {
        let amount = piece_score(self.level.base_piece_value, self.streak);
        let mut destroyed = 0;
        let mut gained = 0u32;
        let mut blockers: Vec<Coord> = Vec::new();

        for &at in &set.cells {
            let Some(piece) = self.grid.piece(at).copied() else {
                continue;
            };
            if self.grid.obstacle(at).is_some_and(|o| o.kind.is_overlay()) {
                self.hit_obstacle(at);
            }

            self.events.push(CoreEvent::MatchDestroyed { tag: piece.tag, at });
            for index in self.goals.record(GoalTarget::Tag(piece.tag)) {
                self.events.push(CoreEvent::GoalCompleted { index });
            }

            self.score = self.score.saturating_add(amount);
            gained = gained.saturating_add(amount);
            self.events.push(CoreEvent::ScoreDelta {
                amount,
                streak: self.streak,
            });
            self.events.push(CoreEvent::DestroyEffect { at });
            let _ = self.grid.set(at, None);
            destroyed += 1;

            for dir in Direction::ALL {
                let Some(near) = at.step(dir) else {
                    continue;
                };
                if self
                    .grid
                    .obstacle(near)
                    .is_some_and(|o| o.kind.blocks_pieces())
                    && !blockers.contains(&near)
                {
                    blockers.push(near);
                }
            }
        }

        for at in blockers {
            self.hit_obstacle(at);
        }
        (destroyed, gained)
    }

    fn hit_obstacle(&mut self, at: Coord) {
        let Some(hit) = self.grid.damage(at) else {
            return;
        };
        self.events.push(CoreEvent::ObstacleDamaged {
            at,
            kind: hit.kind,
            remaining: hit.remaining,
        });
        if hit.cleared {
            self.events.push(CoreEvent::ObstacleCleared { at, kind: hit.kind });
            for index in self.goals.record(GoalTarget::Obstacle(hit.kind)) {
                self.events.push(CoreEvent::GoalCompleted { index });
            }
        }
    }

    /// Put a random piece on every empty playable cell, avoiding immediate runs.
    ///
    /// Cells are visited column by column, bottom-up. Returns the number placed.
    fn fill_empty(&mut self) -> usize {
        let palette = self.level.palette_len() as u32;
        let mut placed = 0;
        for at in self.grid.empty_playable() {
            let mut tag = Tag(self.rng.next_below(palette) as u8);
            let mut tries = 0;
            while creates_match_at(&self.grid, at, tag) {
                if tries == MATCH_RETRY_LIMIT {
                    self.events.push(CoreEvent::RefillExhausted { at });
                    break;
                }
                tag = Tag(self.rng.next_below(palette) as u8);
                tries += 1;
            }
            if self.grid.spawn(at, tag).is_ok() {
                placed += 1;
            }
        }
        placed
    }

    fn reshuffle(&mut self) -> ShuffleReport {
        let report = shuffle(&mut self.grid, &mut self.rng);
        for &at in &report.exhausted {
            self.events.push(CoreEvent::ShuffleExhausted { at });
        }
        self.events.push(CoreEvent::DeadlockShuffled {
            passes: report.passes,
        });
        report
    }

    /// Win when every goal is complete, lose when the counter runs out.
    /// A win on the final move takes priority.
    fn check_end(&mut self) {
        if self.status.is_finished() {
            return;
        }
        if self.goals.all_complete() {
            self.status = Status::Won;
            self.events.push(CoreEvent::GameWon);
        } else if self.counter == 0 {
            self.status = Status::Lost;
            self.events.push(CoreEvent::GameLost);
        }
    }

    /// Advance wall-clock time. Time-limited levels count down in whole seconds while
    /// playing. Returns true if the counter changed.
    pub fn tick(&mut self, elapsed_ms: u32) -> bool {
        if !self.started || self.status != Status::Playing {
            return false;
        }
        let EndCondition::Time(_) = self.level.end_condition else {
            return false;
        };
        self.countdown_ms = self.countdown_ms.saturating_add(elapsed_ms);
        let mut changed = false;
        while self.countdown_ms >= COUNTDOWN_STEP_MS && self.counter > 0 {
            self.countdown_ms -= COUNTDOWN_STEP_MS;
            self.counter -= 1;
            changed = true;
        }
        if self.counter == 0 {
            self.check_end();
        }
        changed
    }

    /// Pause or resume. Finished games ignore this. Returns true if the status changed.
    pub fn set_paused(&mut self, paused: bool) -> bool {
        match (self.status, paused) {
            (Status::Playing, true) => {
                self.status = Status::Paused;
                true
            }
            (Status::Paused, false) => {
                self.status = Status::Playing;
                true
            }
            _ => false,
        }
    }

    /// Rebuild the board from the level and reset score, goals and counter.
    ///
    /// The random source carries on, so a restart deals a new board.
    pub fn restart(&mut self) {
        self.grid = self.template.clone();
        self.phase = Phase::Idle;
        self.status = Status::Playing;
        self.streak = 1;
        self.score = 0;
        self.counter = self.level.end_condition.counter();
        self.countdown_ms = 0;
        self.moves_made = 0;
        self.episode_id = self.episode_id.wrapping_add(1);
        self.goals.reset();
        self.events.clear();
        self.populate();
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.width = self.grid.width();
        out.height = self.grid.height();
        out.cells.clear();
        for row in 0..self.grid.height() {
            for col in 0..self.grid.width() {
                out.cells.push(CellSnapshot::of(&self.grid, Coord::new(col, row)));
            }
        }
        out.board_hash = GameSnapshot::hash_cells(&out.cells);
        out.score = self.score;
        out.streak = self.streak;
        out.phase = self.phase;
        out.status = self.status;
        out.started = self.started;
        out.end_condition = match self.level.end_condition {
            EndCondition::Moves(_) => EndCondition::Moves(self.counter),
            EndCondition::Time(_) => EndCondition::Time(self.counter),
        };
        out.moves_made = self.moves_made;
        out.stars = self.stars();
        out.goals.clear();
        out.goals.extend_from_slice(self.goals.progress());
        out.episode_id = self.episode_id;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }
}
