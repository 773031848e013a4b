//! Goal tracking - counts destroyed pieces and cleared obstacles per level goal

use arrayvec::ArrayVec;

use crate::level::{GoalSpec, GoalTarget};

/// Maximum number of goals that can complete from a single record
const MAX_COMPLETIONS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalProgress {
    pub target: GoalTarget,
    pub needed: u32,
    pub collected: u32,
}

impl GoalProgress {
    pub fn is_complete(&self) -> bool {
        self.collected >= self.needed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GoalTracker {
    goals: Vec<GoalProgress>,
}

impl GoalTracker {
    pub fn new(specs: &[GoalSpec]) -> Self {
        Self {
            goals: specs
                .iter()
                .map(|s| GoalProgress {
                    target: s.target,
                    needed: s.needed,
                    collected: 0,
                })
                .collect(),
        }
    }

    /// Count one item toward every goal with this target.
    ///
    /// Returns the indices of goals completed by this record.
    pub fn record(&mut self, target: GoalTarget) -> ArrayVec<usize, MAX_COMPLETIONS> {
        let mut completed = ArrayVec::new();
        for (i, goal) in self.goals.iter_mut().enumerate() {
            if goal.target != target {
                continue;
            }
            let was_complete = goal.is_complete();
            goal.collected = goal.collected.saturating_add(1);
            if !was_complete && goal.is_complete() && !completed.is_full() {
                completed.push(i);
            }
        }
        completed
    }

    pub fn has_goals(&self) -> bool {
        !self.goals.is_empty()
    }

    /// A level without goals is never won by goals.
    pub fn all_complete(&self) -> bool {
        self.has_goals() && self.goals.iter().all(GoalProgress::is_complete)
    }

    pub fn progress(&self) -> &[GoalProgress] {
        &self.goals
    }

    pub fn reset(&mut self) {
        for goal in &mut self.goals {
            goal.collected = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Tag, TileKind};

    fn spec(target: GoalTarget, needed: u32) -> GoalSpec {
        GoalSpec { target, needed }
    }

    #[test]
    fn test_record_completes_once() {
        let mut goals = GoalTracker::new(&[spec(GoalTarget::Tag(Tag(0)), 2)]);
        assert!(goals.record(GoalTarget::Tag(Tag(0))).is_empty());
        assert_eq!(goals.record(GoalTarget::Tag(Tag(0))).as_slice(), &[0]);
        assert!(goals.record(GoalTarget::Tag(Tag(0))).is_empty());
        assert_eq!(goals.progress()[0].collected, 3);
        assert!(goals.all_complete());
    }

    #[test]
    fn test_other_targets_are_ignored() {
        let mut goals = GoalTracker::new(&[
            spec(GoalTarget::Tag(Tag(1)), 1),
            spec(GoalTarget::Obstacle(TileKind::Breakable), 1),
        ]);
        goals.record(GoalTarget::Tag(Tag(0)));
        goals.record(GoalTarget::Obstacle(TileKind::Lock));
        assert!(goals.progress().iter().all(|g| g.collected == 0));
        goals.record(GoalTarget::Obstacle(TileKind::Breakable));
        assert!(!goals.all_complete());
        goals.record(GoalTarget::Tag(Tag(1)));
        assert!(goals.all_complete());
    }

    #[test]
    fn test_no_goals_is_never_complete() {
        let goals = GoalTracker::new(&[]);
        assert!(!goals.has_goals());
        assert!(!goals.all_complete());
    }

    #[test]
    fn test_reset() {
        let mut goals = GoalTracker::new(&[spec(GoalTarget::Tag(Tag(0)), 1)]);
        goals.record(GoalTarget::Tag(Tag(0)));
        goals.reset();
        assert!(!goals.all_complete());
    }
}
