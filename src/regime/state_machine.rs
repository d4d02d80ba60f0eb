// =============================================================================
// Regime State Machine — hysteresis / persistence filter
// =============================================================================
//
// Prevents label flapping: a proposed regime change only commits after it has
// been re-proposed on `persist_n` consecutive calls beyond the first, and each
// commit opens a `transition_bars`-long window during which snapshots are
// flagged as "in transition".
//
// Note on small `persist_n`: the commit check `pending_count >= persist_n`
// runs only when a *second* matching proposal increments the counter, so
// `persist_n = 0` and `persist_n = 1` both require exactly one confirming
// occurrence after the initial proposal. This off-by-one is intentional and
// preserved for output compatibility.

use tracing::{debug, info};

use crate::types::RegimeLabel;

/// Hysteresis filter over proposed regime labels.
#[derive(Debug, Clone)]
pub struct RegimeStateMachine {
    persist_n: u32,
    transition_bars: u32,
    current: RegimeLabel,
    pending: Option<RegimeLabel>,
    pending_count: u32,
    transition_countdown: u32,
}

impl RegimeStateMachine {
    pub fn new(persist_n: u32, transition_bars: u32) -> Self {
        Self {
            persist_n,
            transition_bars,
            current: RegimeLabel::WarmingUp,
            pending: None,
            pending_count: 0,
            transition_countdown: 0,
        }
    }

    /// The committed label as of the last update.
    pub fn current(&self) -> RegimeLabel {
        self.current
    }

    /// Feed one proposed label; returns `(committed_label, is_transition)`.
    ///
    /// `is_transition` is true on the exact call that commits a change and
    /// for the `transition_bars` calls that follow it.
    pub fn update(&mut self, proposed: RegimeLabel) -> (RegimeLabel, bool) {
        if self.current == RegimeLabel::WarmingUp {
            // First committed label: adopt immediately, no transition window.
            self.current = proposed;
            self.pending = None;
            self.pending_count = 0;
            debug!(regime = %proposed, "initial regime adopted");
            return (self.current, false);
        }

        if proposed == self.current {
            self.pending = None;
            self.pending_count = 0;
        } else if self.pending == Some(proposed) {
            self.pending_count += 1;
            if self.pending_count >= self.persist_n {
                let previous = self.current;
                self.current = proposed;
                self.pending = None;
                self.pending_count = 0;
                self.transition_countdown = self.transition_bars;
                info!(from = %previous, to = %proposed, "regime change committed");
                // The commit call itself reports in-transition without
                // consuming the countdown.
                return (self.current, true);
            }
        } else {
            self.pending = Some(proposed);
            self.pending_count = 1;
        }

        let counting_down = self.transition_countdown > 0;
        if counting_down {
            self.transition_countdown -= 1;
        }
        (self.current, counting_down)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, Volatility};

    const BULL: RegimeLabel = RegimeLabel::Regime(Direction::Bull, Volatility::Contraction);
    const BEAR: RegimeLabel = RegimeLabel::Regime(Direction::Bear, Volatility::Contraction);
    const NEUTRAL: RegimeLabel = RegimeLabel::Regime(Direction::Neutral, Volatility::Contraction);

    #[test]
    fn first_label_adopted_immediately() {
        let mut sm = RegimeStateMachine::new(3, 2);
        let (label, transition) = sm.update(BULL);
        assert_eq!(label, BULL);
        assert!(!transition);
    }

    #[test]
    fn persist_three_commits_on_third_occurrence() {
        let mut sm = RegimeStateMachine::new(3, 2);
        sm.update(BULL);

        // Two differing proposals: committed regime unchanged, no transition.
        assert_eq!(sm.update(BEAR), (BULL, false));
        assert_eq!(sm.update(BEAR), (BULL, false));

        // Third consecutive occurrence commits.
        assert_eq!(sm.update(BEAR), (BEAR, true));

        // The next `transition_bars` calls still report in-transition.
        assert_eq!(sm.update(BEAR), (BEAR, true));
        assert_eq!(sm.update(BEAR), (BEAR, true));

        // And the call after that does not.
        assert_eq!(sm.update(BEAR), (BEAR, false));
    }

    #[test]
    fn interrupted_proposal_resets_pending() {
        let mut sm = RegimeStateMachine::new(3, 0);
        sm.update(BULL);
        sm.update(BEAR);
        sm.update(BEAR);
        // Back to the current label: pending cleared.
        assert_eq!(sm.update(BULL), (BULL, false));
        // Two fresh BEAR proposals no longer suffice.
        assert_eq!(sm.update(BEAR), (BULL, false));
        assert_eq!(sm.update(BEAR), (BULL, false));
        assert_eq!(sm.update(BEAR), (BEAR, true));
    }

    #[test]
    fn competing_proposal_replaces_pending() {
        let mut sm = RegimeStateMachine::new(2, 0);
        sm.update(BULL);
        sm.update(BEAR);
        // A different challenger restarts the count at 1.
        assert_eq!(sm.update(NEUTRAL), (BULL, false));
        assert_eq!(sm.update(NEUTRAL), (NEUTRAL, true));
    }

    #[test]
    fn persist_one_needs_one_confirmation() {
        // persist_n = 1 commits on the second occurrence, not the first.
        let mut sm = RegimeStateMachine::new(1, 0);
        sm.update(BULL);
        assert_eq!(sm.update(BEAR), (BULL, false));
        assert_eq!(sm.update(BEAR), (BEAR, true));
    }

    #[test]
    fn persist_zero_behaves_like_persist_one() {
        let mut sm = RegimeStateMachine::new(0, 0);
        sm.update(BULL);
        assert_eq!(sm.update(BEAR), (BULL, false));
        assert_eq!(sm.update(BEAR), (BEAR, true));
    }

    #[test]
    fn zero_transition_bars_flags_commit_call_only() {
        let mut sm = RegimeStateMachine::new(1, 0);
        sm.update(BULL);
        sm.update(BEAR);
        assert_eq!(sm.update(BEAR), (BEAR, true));
        assert_eq!(sm.update(BEAR), (BEAR, false));
    }

    #[test]
    fn countdown_persists_across_matching_labels() {
        let mut sm = RegimeStateMachine::new(1, 3);
        sm.update(BULL);
        sm.update(BEAR);
        assert_eq!(sm.update(BEAR), (BEAR, true)); // commit
        assert_eq!(sm.update(BEAR), (BEAR, true));
        assert_eq!(sm.update(BEAR), (BEAR, true));
        assert_eq!(sm.update(BEAR), (BEAR, true));
        assert_eq!(sm.update(BEAR), (BEAR, false));
    }
}
