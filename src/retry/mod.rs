use serde::{Deserialize, Serialize};

/// Per-workflow-instance counter of how many times a step has been
/// re-entered. Owned by the calling workflow and mutated only by the driving
/// loop; steps reconstruct their decisions purely from this plus a fresh
/// external query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryState {
    pub attempt_count: u32,
}

impl RetryState {
    pub fn reset(&mut self) {
        self.attempt_count = 0;
    }

    pub fn bump(&mut self) {
        self.attempt_count += 1;
    }
}

/// Bounds the number of retries granted to *transient infrastructure errors*
/// encountered while querying status. Legitimate "not yet complete" states
/// never consume this budget; those retry indefinitely under the host's
/// wall-clock timeout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryBudget {
    pub max_attempts: u32,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

impl RetryBudget {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// True once a failing query must be re-raised instead of suppressed.
    pub fn exhausted(&self, state: &RetryState) -> bool {
        state.attempt_count > self.max_attempts.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempts(n: u32) -> RetryState {
        RetryState { attempt_count: n }
    }

    #[test]
    fn test_default_budget_is_two_attempts() {
        assert_eq!(RetryBudget::default().max_attempts, 2);
    }

    #[test]
    fn test_budget_boundary() {
        let budget = RetryBudget::default();
        assert!(!budget.exhausted(&attempts(0)));
        assert!(!budget.exhausted(&attempts(1)));
        assert!(budget.exhausted(&attempts(2)));
        assert!(budget.exhausted(&attempts(3)));
    }

    #[test]
    fn test_zero_budget_never_suppresses() {
        let budget = RetryBudget::new(0);
        assert!(budget.exhausted(&attempts(0)));
    }

    #[test]
    fn test_state_reset_and_bump() {
        let mut state = RetryState::default();
        state.bump();
        state.bump();
        assert_eq!(state.attempt_count, 2);
        state.reset();
        assert_eq!(state.attempt_count, 0);
    }
}
