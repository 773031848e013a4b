use dotmatch_core::deadlock::productive_swaps;
use dotmatch_core::{Grid, RandomSource};
use dotmatch_types::{Coord, Direction, SwapRequest};

/// A swap of the piece at `origin` with its neighbor in `direction`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub origin: Coord,
    pub direction: Direction,
}

impl Move {
    pub fn new(col: usize, row: usize, direction: Direction) -> Self {
        Self {
            origin: Coord::new(col, row),
            direction,
        }
    }

    pub fn target(&self) -> Option<Coord> {
        self.origin.step(self.direction)
    }

    pub fn to_request(self) -> SwapRequest {
        SwapRequest::new(self.origin.col, self.origin.row, self.direction)
    }
}

/// Every swap that would produce a match, scanning column by column and trying the
/// right neighbor before the upper one.
pub fn find_possible_moves(grid: &Grid) -> Vec<Move> {
    productive_swaps(grid)
        .into_iter()
        .map(|(origin, direction)| Move { origin, direction })
        .collect()
}

/// One possible move chosen uniformly at random, or `None` when the board is deadlocked
pub fn pick_hint<R: RandomSource>(grid: &Grid, rng: &mut R) -> Option<Move> {
    let moves = find_possible_moves(grid);
    if moves.is_empty() {
        return None;
    }
    let idx = rng.next_below(moves.len() as u32) as usize;
    moves.get(idx).copied()
}

/// Shows a hint after the player has been idle for `delay_ms`.
///
/// The countdown only runs while no hint is shown. Any input clears the hint and
/// restarts the countdown.
#[derive(Debug, Clone)]
pub struct HintTimer {
    delay_ms: u32,
    remaining_ms: u32,
    current: Option<Move>,
}

impl HintTimer {
    pub fn new(delay_ms: u32) -> Self {
        Self {
            delay_ms,
            remaining_ms: delay_ms,
            current: None,
        }
    }

    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    pub fn current(&self) -> Option<Move> {
        self.current
    }

    /// Advance the countdown. Returns the hint when one is newly shown.
    pub fn tick<R: RandomSource>(
        &mut self,
        elapsed_ms: u32,
        grid: &Grid,
        rng: &mut R,
    ) -> Option<Move> {
        if self.current.is_some() {
            return None;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed_ms);
        if self.remaining_ms > 0 {
            return None;
        }
        self.remaining_ms = self.delay_ms;
        self.current = pick_hint(grid, rng);
        self.current
    }

    /// Drop the shown hint (if any) and restart the countdown
    pub fn clear(&mut self) {
        self.current = None;
        self.remaining_ms = self.delay_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotmatch_core::{ScriptedRng, SimpleRng};

    #[test]
    fn test_possible_moves_on_small_board() {
        let grid = Grid::from_ascii(&["BCA", "AAB"]);
        let moves = find_possible_moves(&grid);
        assert!(moves.contains(&Move::new(2, 0, Direction::Up)));
        for m in &moves {
            assert!(matches!(m.direction, Direction::Right | Direction::Up));
            assert!(grid.contains(m.target().unwrap()));
        }
    }

    #[test]
    fn test_no_hint_on_deadlocked_board() {
        let grid = Grid::from_ascii(&["ABC", "BCA", "CAB"]);
        assert!(find_possible_moves(&grid).is_empty());
        assert_eq!(pick_hint(&grid, &mut SimpleRng::new(1)), None);
    }

    #[test]
    fn test_pick_hint_uses_random_index() {
        let grid = Grid::from_ascii(&["BCA", "AAB"]);
        let moves = find_possible_moves(&grid);
        let last = moves.len() as u32 - 1;
        let mut rng = ScriptedRng::new(vec![last]);
        assert_eq!(pick_hint(&grid, &mut rng), moves.last().copied());
    }

    #[test]
    fn test_hint_timer_waits_for_delay() {
        let grid = Grid::from_ascii(&["BCA", "AAB"]);
        let mut rng = ScriptedRng::new(vec![0]);
        let mut timer = HintTimer::new(3_000);

        assert_eq!(timer.tick(1_000, &grid, &mut rng), None);
        assert_eq!(timer.tick(1_999, &grid, &mut rng), None);
        let shown = timer.tick(1, &grid, &mut rng);
        assert!(shown.is_some());
        assert_eq!(timer.current(), shown);

        // no second hint while one is shown
        assert_eq!(timer.tick(10_000, &grid, &mut rng), None);
        assert_eq!(timer.current(), shown);
    }

    #[test]
    fn test_hint_timer_clear_restarts_countdown() {
        let grid = Grid::from_ascii(&["BCA", "AAB"]);
        let mut rng = ScriptedRng::new(vec![0]);
        let mut timer = HintTimer::new(500);
        assert!(timer.tick(500, &grid, &mut rng).is_some());

        timer.clear();
        assert_eq!(timer.current(), None);
        assert_eq!(timer.tick(499, &grid, &mut rng), None);
        assert!(timer.tick(1, &grid, &mut rng).is_some());
    }

    #[test]
    fn test_move_request() {
        let req = Move::new(3, 4, Direction::Up).to_request();
        assert_eq!(req.origin, Coord::new(3, 4));
        assert_eq!(req.direction, Direction::Up);
        assert_eq!(req.target(), Some(Coord::new(3, 5)));
    }
}
