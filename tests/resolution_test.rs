//! End-to-end swap resolution through the public game API

use dotmatch::core::deadlock::{is_deadlocked, productive_swaps};
use dotmatch::core::matcher::has_any_run;
use dotmatch::core::{GameState, Grid, LevelConfig, SimpleRng, SwapOutcome};
use dotmatch::types::{
    Coord, CoreEvent, Direction, Phase, ResolveStep, SwapRequest, Tag, MAX_SHUFFLE_PASSES,
};

const BOARD: [&str; 8] = [
    "ABABABAB", "BABABABA", "ABABCBAB", "BABACCBA", "ABABACAB", "BABABABA", "ABABABAB",
    "BABABABA",
];

fn checkerboard_game() -> GameState<SimpleRng> {
    let level = LevelConfig::new(8, 8, &["red", "green", "blue"]);
    let grid = Grid::from_ascii(&BOARD);
    let mut gs = GameState::from_grid(level, grid, SimpleRng::new(1)).unwrap();
    gs.start();
    gs
}

#[test]
fn test_single_pass_swap_on_prepared_board() {
    let mut gs = checkerboard_game();
    assert!(gs.take_events().is_empty());

    let outcome = gs.apply_swap(SwapRequest::new(4, 3, Direction::Right));
    let report = match outcome {
        SwapOutcome::Resolved(report) => report,
        other => panic!("Expected a resolved swap, got {:?}", other),
    };
    assert_eq!(report.passes, 1);
    assert_eq!(report.destroyed, 3);
    assert_eq!(report.score_gained, 60);
    assert!(report.power_ups.is_empty());
    assert!(report.shuffle.is_none());
    assert!(!report.truncated);

    let events = gs.take_events();
    let mut destroyed: Vec<Coord> = events
        .iter()
        .filter_map(|e| match e {
            CoreEvent::MatchDestroyed { tag, at } => {
                assert_eq!(*tag, Tag(2));
                Some(*at)
            }
            _ => None,
        })
        .collect();
    destroyed.sort_by_key(|c| (c.col, c.row));
    assert_eq!(
        destroyed,
        vec![Coord::new(4, 3), Coord::new(4, 4), Coord::new(4, 5)]
    );

    let deltas: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, CoreEvent::ScoreDelta { .. }))
        .collect();
    assert_eq!(deltas.len(), 3);
    for delta in deltas {
        assert_eq!(*delta, CoreEvent::ScoreDelta { amount: 20, streak: 1 });
    }
    assert!(!events.iter().any(|e| e.is_diagnostic()));

    assert_eq!(gs.score(), 60);
    assert_eq!(gs.streak(), 1);
    assert_eq!(gs.moves_made(), 1);
    assert_eq!(gs.phase(), Phase::Idle);
    assert_eq!(
        gs.grid().to_ascii(),
        vec![
            "ABABABAB", "BABABABA", "ABABCBAB", "BABAACBA", "ABABBAAB", "BABABABA", "ABABABAB",
            "BABABABA",
        ]
    );
    assert!(!has_any_run(gs.grid()));
}

#[test]
fn test_swap_without_match_changes_nothing() {
    let mut gs = checkerboard_game();
    let before = gs.grid().clone();

    let outcome = gs.apply_swap(SwapRequest::new(0, 0, Direction::Right));
    assert_eq!(outcome, SwapOutcome::NoMatch);
    assert_eq!(gs.grid(), &before);
    assert_eq!(gs.score(), 0);
    assert_eq!(gs.moves_made(), 0);
    assert!(gs.take_events().is_empty());
    assert!(gs.accepts_input());
}

#[test]
fn test_paced_swap_reports_phases_in_order() {
    let mut gs = checkerboard_game();
    let mut steps = Vec::new();
    let mut record = |s: ResolveStep| steps.push(s);
    let outcome = gs.apply_swap_paced(SwapRequest::new(4, 3, Direction::Right), &mut record);
    assert!(outcome.is_resolved());
    assert_eq!(
        steps,
        vec![
            ResolveStep::SwapApplied,
            ResolveStep::Destroyed,
            ResolveStep::Collapsed,
            ResolveStep::Refilled,
        ]
    );
}

#[test]
fn test_cascades_keep_the_board_full_and_settled() {
    for seed in [1u32, 7, 42, 99, 2024, 12345] {
        let level = LevelConfig::new(8, 8, &["a", "b", "c", "d"]);
        let mut gs = GameState::with_seed(level, seed).unwrap();
        gs.start();
        let playable = gs.grid().playable_count();
        assert_eq!(gs.grid().occupied_playable(), playable);

        for _ in 0..12 {
            if !gs.accepts_input() {
                break;
            }
            let Some(&(at, dir)) = productive_swaps(gs.grid()).first() else {
                break;
            };
            let score_before = gs.score();
            let outcome = gs.apply_swap(SwapRequest::new(at.col, at.row, dir));
            let report = match outcome {
                SwapOutcome::Resolved(report) => report,
                other => panic!("seed {}: productive swap gave {:?}", seed, other),
            };

            // Streak rises by one per pass and never falls inside a cascade.
            let mut last_streak = 1;
            for ev in gs.take_events() {
                if let CoreEvent::ScoreDelta { streak, .. } = ev {
                    assert!(streak == last_streak || streak == last_streak + 1);
                    last_streak = streak;
                }
            }
            assert!(last_streak <= report.passes);

            assert_eq!(gs.score(), score_before + report.score_gained);
            assert_eq!(gs.grid().occupied_playable(), playable, "seed {}", seed);
            assert!(gs.grid().matched_coords().is_empty());
            let shuffle_settled = report
                .shuffle
                .as_ref()
                .map_or(true, |s| s.passes < MAX_SHUFFLE_PASSES);
            if !report.truncated && shuffle_settled {
                assert!(!has_any_run(gs.grid()), "seed {}", seed);
            }
            let stuck = report.shuffle.as_ref().is_some_and(|s| s.still_deadlocked);
            if !stuck {
                assert!(!is_deadlocked(gs.grid()), "seed {}", seed);
            }
        }
    }
}

#[test]
fn test_same_seed_same_game() {
    let play = || {
        let level = LevelConfig::new(7, 7, &["a", "b", "c", "d", "e"]);
        let mut gs = GameState::with_seed(level, 31).unwrap();
        gs.start();
        for _ in 0..5 {
            let (at, dir) = productive_swaps(gs.grid())[0];
            gs.apply_swap(SwapRequest::new(at.col, at.row, dir));
        }
        (gs.grid().to_ascii(), gs.score(), gs.take_events())
    };
    assert_eq!(play(), play());
}
