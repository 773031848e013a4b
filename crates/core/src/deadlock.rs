//! Deadlock detection and reshuffling
//!
//! A board is deadlocked when no single swap produces a run. Every piece tries its
//! right neighbor and then its up neighbor; a swap involving a color bomb is always
//! productive because the bomb clears its partner's color.
//!
//! Reshuffling keeps piece identities: the pieces on playable cells are pooled and dealt
//! back onto the same cells.

use crate::grid::Grid;
use crate::matcher::{creates_match_at, has_any_run, swap_makes_run};
use crate::rng::RandomSource;
use crate::types::{Coord, Direction, PowerUp, MATCH_RETRY_LIMIT, MAX_SHUFFLE_PASSES};

/// Outcome of [`shuffle`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShuffleReport {
    /// Full reshuffles performed
    pub passes: u32,
    /// Cells where a placement was accepted after the retry limit
    pub exhausted: Vec<Coord>,
    /// The pass cap was hit and the board still has no productive swap
    pub still_deadlocked: bool,
}

/// Both cells hold a swappable piece: on the board, playable, unlocked
pub fn can_swap(grid: &Grid, a: Coord, b: Coord) -> bool {
    [a, b].iter().all(|&c| {
        grid.is_playable(c) && grid.piece(c).is_some() && !grid.is_locked(c)
    })
}

/// Whether swapping `a` and `b` would produce a match
pub fn is_productive(grid: &Grid, a: Coord, b: Coord) -> bool {
    if !can_swap(grid, a, b) {
        return false;
    }
    let color_bomb = |c: Coord| grid.piece(c).is_some_and(|p| p.power == PowerUp::ColorBomb);
    color_bomb(a) || color_bomb(b) || swap_makes_run(grid, a, b)
}

fn candidate_swaps(grid: &Grid) -> impl Iterator<Item = (Coord, Direction)> + '_ {
    grid.coords().flat_map(|at| {
        [Direction::Right, Direction::Up]
            .into_iter()
            .map(move |dir| (at, dir))
    })
}

/// Every productive swap, as `(origin, direction)` with direction Right or Up
pub fn productive_swaps(grid: &Grid) -> Vec<(Coord, Direction)> {
    candidate_swaps(grid)
        .filter(|&(at, dir)| {
            at.step(dir)
                .is_some_and(|other| grid.contains(other) && is_productive(grid, at, other))
        })
        .collect()
}

/// No swap anywhere on the board produces a match
pub fn is_deadlocked(grid: &Grid) -> bool {
    !candidate_swaps(grid).any(|(at, dir)| {
        at.step(dir)
            .is_some_and(|other| grid.contains(other) && is_productive(grid, at, other))
    })
}

/// Deal the pooled pieces back onto `cells`, avoiding immediate runs where the retry
/// bound allows. Returns the cells where the bound was hit.
fn deal<R: RandomSource>(grid: &mut Grid, cells: &[Coord], rng: &mut R) -> Vec<Coord> {
    let mut pool = Vec::with_capacity(cells.len());
    for &at in cells {
        if let Ok(Some(piece)) = grid.take(at) {
            pool.push(piece);
        }
    }

    let mut exhausted = Vec::new();
    for &at in cells {
        if pool.is_empty() {
            break;
        }
        let mut idx = rng.next_below(pool.len() as u32) as usize;
        let mut tries = 0;
        while pool[idx]
            .match_tag()
            .is_some_and(|tag| creates_match_at(grid, at, tag))
        {
            if tries == MATCH_RETRY_LIMIT {
                exhausted.push(at);
                break;
            }
            idx = rng.next_below(pool.len() as u32) as usize;
            tries += 1;
        }
        let piece = pool.remove(idx);
        if grid.set(at, Some(piece)).is_err() {
            break;
        }
    }
    exhausted
}

/// Reshuffle until the board has a productive swap and no standing run, at most
/// [`MAX_SHUFFLE_PASSES`] times.
pub fn shuffle<R: RandomSource>(grid: &mut Grid, rng: &mut R) -> ShuffleReport {
    let cells: Vec<Coord> = grid
        .playable_coords()
        .into_iter()
        .filter(|&at| grid.piece(at).is_some())
        .collect();

    let mut report = ShuffleReport::default();
    while report.passes < MAX_SHUFFLE_PASSES {
        report.passes += 1;
        let exhausted = deal(grid, &cells, rng);
        report.exhausted.extend(exhausted);
        if !is_deadlocked(grid) && !has_any_run(grid) {
            return report;
        }
    }
    report.still_deadlocked = is_deadlocked(grid);
    report
}
