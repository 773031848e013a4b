//! Scoring module - per-piece cascade scoring and star thresholds
//!
//! Every destroyed piece is worth `base_piece_value * streak`, where the streak is 1 for
//! the pass triggered by the swap and grows by one for each cascade pass after it.

/// Points for one destroyed piece during the given cascade pass
pub fn piece_score(base_piece_value: u32, streak: u32) -> u32 {
    base_piece_value.saturating_mul(streak.max(1))
}

/// Points for a whole pass
pub fn pass_score(base_piece_value: u32, streak: u32, destroyed: usize) -> u32 {
    piece_score(base_piece_value, streak).saturating_mul(destroyed as u32)
}

/// Number of score goals reached (one star each)
pub fn stars(score: u32, score_goals: &[u32]) -> u32 {
    score_goals.iter().filter(|&&goal| score >= goal).count() as u32
}

/// Progress toward the last score goal, in [0, 1]
pub fn score_progress(score: u32, score_goals: &[u32]) -> f32 {
    match score_goals.iter().max() {
        Some(&top) if top > 0 => (score as f32 / top as f32).min(1.0),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_score_scales_with_streak() {
        assert_eq!(piece_score(20, 1), 20);
        assert_eq!(piece_score(20, 3), 60);
        assert_eq!(piece_score(20, 0), 20);
        assert_eq!(piece_score(u32::MAX, 2), u32::MAX);
    }

    #[test]
    fn test_pass_score() {
        assert_eq!(pass_score(20, 2, 3), 120);
        assert_eq!(pass_score(20, 1, 0), 0);
    }

    #[test]
    fn test_stars() {
        let goals = [100, 250, 500];
        assert_eq!(stars(0, &goals), 0);
        assert_eq!(stars(100, &goals), 1);
        assert_eq!(stars(499, &goals), 2);
        assert_eq!(stars(10_000, &goals), 3);
        assert_eq!(stars(10_000, &[]), 0);
    }

    #[test]
    fn test_score_progress() {
        assert_eq!(score_progress(50, &[100, 200]), 0.25);
        assert_eq!(score_progress(500, &[100, 200]), 1.0);
        assert_eq!(score_progress(500, &[]), 0.0);
    }
}
