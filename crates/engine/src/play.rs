use dotmatch_core::{GameState, RandomSource, ResolveReport, SwapOutcome};
use dotmatch_types::InvalidSwap;

use crate::hint::{find_possible_moves, Move};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    Rejected(InvalidSwap),
    NoMatch,
}

impl MoveError {
    pub fn code(self) -> &'static str {
        match self {
            MoveError::Rejected(reason) => reason.code(),
            MoveError::NoMatch => "no_match",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            MoveError::Rejected(reason) => reason.message(),
            MoveError::NoMatch => "swap produced no match and was reversed",
        }
    }
}

/// Play one move to completion
pub fn apply_move<R: RandomSource>(
    state: &mut GameState<R>,
    mv: Move,
) -> Result<ResolveReport, MoveError> {
    match state.apply_swap(mv.to_request()) {
        SwapOutcome::Resolved(report) => Ok(report),
        SwapOutcome::NoMatch => Err(MoveError::NoMatch),
        SwapOutcome::Rejected(reason) => Err(MoveError::Rejected(reason)),
    }
}

/// Score every possible move by playing it on a copy of the game.
///
/// The copy carries the random source, so the refill it sees is the one the real game
/// would deal.
pub fn evaluate_moves<R>(state: &GameState<R>) -> Vec<(Move, ResolveReport)>
where
    R: RandomSource + Clone,
{
    if !state.accepts_input() {
        return Vec::new();
    }
    find_possible_moves(state.grid())
        .into_iter()
        .filter_map(|mv| {
            let mut trial = state.clone();
            apply_move(&mut trial, mv).ok().map(|report| (mv, report))
        })
        .collect()
}

/// Greedy policy: the move gaining the most points, then the most power-ups.
/// Ties go to the earliest move in scan order.
pub fn best_move<R: RandomSource + Clone>(state: &GameState<R>) -> Option<Move> {
    let mut best: Option<(Move, (u32, usize))> = None;
    for (mv, report) in evaluate_moves(state) {
        let key = (report.score_gained, report.power_ups.len());
        if best.map_or(true, |(_, k)| key > k) {
            best = Some((mv, key));
        }
    }
    best.map(|(mv, _)| mv)
}
