//! Property tests for the swap/resolve kernel.
//!
//! Generated seeds, board sizes and move choices drive short games; every accepted move
//! must leave the board full, settled and playable, and rejected or fruitless swaps must
//! leave it untouched.

use proptest::prelude::*;

use dotmatch::core::deadlock::{is_deadlocked, productive_swaps};
use dotmatch::core::matcher::has_any_run;
use dotmatch::core::{GameState, LevelConfig, SwapOutcome};
use dotmatch::engine::{evaluate_moves, find_possible_moves};
use dotmatch::types::{Coord, CoreEvent, Direction, SwapRequest, MAX_SHUFFLE_PASSES};

const PALETTE: [&str; 6] = ["red", "green", "blue", "yellow", "purple", "orange"];

fn level(width: usize, height: usize, tags: usize) -> LevelConfig {
    LevelConfig::new(width, height, &PALETTE[..tags])
}

proptest! {
    #[test]
    fn generated_games_keep_the_board_settled(
        seed in any::<u32>(),
        width in 5usize..10,
        height in 5usize..10,
        tags in 4usize..7,
        picks in proptest::collection::vec(any::<usize>(), 1..8),
    ) {
        let mut gs = GameState::with_seed(level(width, height, tags), seed).unwrap();
        gs.start();
        let playable = gs.grid().playable_count();
        prop_assert_eq!(gs.grid().occupied_playable(), playable);
        prop_assert!(!has_any_run(gs.grid()));

        for pick in picks {
            if !gs.accepts_input() {
                break;
            }
            let moves = productive_swaps(gs.grid());
            if moves.is_empty() {
                break;
            }
            let (at, dir) = moves[pick % moves.len()];
            let before = gs.score();

            let report = match gs.apply_swap(SwapRequest::new(at.col, at.row, dir)) {
                SwapOutcome::Resolved(report) => report,
                other => {
                    return Err(TestCaseError::fail(format!("productive swap gave {:?}", other)));
                }
            };

            prop_assert!(report.destroyed >= 3 || !report.power_ups.is_empty());
            prop_assert_eq!(gs.score(), before + report.score_gained);
            prop_assert_eq!(gs.streak(), 1);
            prop_assert_eq!(gs.grid().occupied_playable(), playable);
            let shuffle_settled = report
                .shuffle
                .as_ref()
                .map_or(true, |s| s.passes < MAX_SHUFFLE_PASSES);
            if !report.truncated && shuffle_settled {
                prop_assert!(!has_any_run(gs.grid()));
            }
            if report.shuffle.as_ref().map_or(true, |s| !s.still_deadlocked) {
                prop_assert!(!is_deadlocked(gs.grid()));
            }

            let mut streak = 1;
            for ev in gs.take_events() {
                if let CoreEvent::ScoreDelta { streak: s, .. } = ev {
                    prop_assert!(s >= streak);
                    streak = s;
                }
            }
        }
    }

    #[test]
    fn fruitless_swaps_leave_the_game_untouched(
        seed in any::<u32>(),
        col in 0usize..7,
        row in 0usize..7,
        dir_index in 0usize..4,
    ) {
        let mut gs = GameState::with_seed(level(7, 7, 5), seed).unwrap();
        gs.start();
        let _ = gs.take_events();
        let grid = gs.grid().clone();
        let dir = Direction::ALL[dir_index];

        let outcome = gs.apply_swap(SwapRequest::new(col, row, dir));
        if !outcome.is_resolved() {
            prop_assert_eq!(gs.grid(), &grid);
            prop_assert_eq!(gs.score(), 0);
            prop_assert_eq!(gs.moves_made(), 0);
            prop_assert!(gs.take_events().is_empty());
        }

        let origin = Coord::new(col, row);
        let listed = find_possible_moves(&grid)
            .iter()
            .any(|m| m.origin == origin && m.direction == dir)
            || origin.step(dir).is_some_and(|t| {
                find_possible_moves(&grid)
                    .iter()
                    .any(|m| m.origin == t && m.direction == dir.opposite())
            });
        prop_assert_eq!(outcome.is_resolved(), listed);
    }

    #[test]
    fn evaluation_never_touches_the_live_game(seed in any::<u32>()) {
        let mut gs = GameState::with_seed(level(6, 6, 4), seed).unwrap();
        gs.start();
        let snapshot = gs.snapshot();

        let evaluated = evaluate_moves(&gs);
        prop_assert_eq!(evaluated.len(), find_possible_moves(gs.grid()).len());
        prop_assert_eq!(gs.snapshot(), snapshot);
    }
}
