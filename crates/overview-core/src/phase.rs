//! Round phase state machine and round timer.
//!
//! Phases are driven by match events; this module only knows which
//! transitions are legal and how much time is left. The allowed table:
//!
//! ```text
//! Warmup     -> Freezetime
//! Freezetime -> Regular
//! Regular    -> Planted | Restart
//! Planted    -> Restart
//! Restart    -> Freezetime | Halftime
//! Halftime   -> Freezetime
//! ```
//!
//! Remaining time is derived from the tick the phase started on, never
//! stored and decremented. It is therefore non-increasing within a phase
//! and only jumps back up on a transition.

use overview_types::{Phase, Timer};

use crate::config::TimingConfig;
use crate::error::TransitionViolation;

/// Whether the round may move from `from` to `to`.
pub const fn can_transition(from: Phase, to: Phase) -> bool {
    matches!(
        (from, to),
        (Phase::Warmup | Phase::Halftime, Phase::Freezetime)
            | (Phase::Freezetime, Phase::Regular)
            | (Phase::Regular, Phase::Planted | Phase::Restart)
            | (Phase::Planted, Phase::Restart)
            | (Phase::Restart, Phase::Freezetime | Phase::Halftime)
    )
}

/// Check a transition against the table.
///
/// # Errors
///
/// Returns [`TransitionViolation`] if the transition is not allowed.
pub const fn check_transition(from: Phase, to: Phase) -> Result<(), TransitionViolation> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(TransitionViolation { from, to })
    }
}

/// Convert a tick count to milliseconds at the given tick rate.
pub fn ticks_to_ms(ticks: u64, tick_rate: u32) -> u64 {
    ticks
        .saturating_mul(1_000)
        .checked_div(u64::from(tick_rate))
        .unwrap_or(0)
}

/// Tracks the current phase and when it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTimer {
    phase: Phase,
    started_at: u64,
    tick_rate: u32,
    timing: TimingConfig,
}

impl RoundTimer {
    /// Start a timer in `phase` at `tick`.
    pub fn new(timing: &TimingConfig, tick_rate: u32, phase: Phase, tick: u64) -> Self {
        Self {
            phase,
            started_at: tick,
            tick_rate,
            timing: timing.clone(),
        }
    }

    /// The current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Tick the current phase started on.
    pub const fn started_at(&self) -> u64 {
        self.started_at
    }

    /// Move to a new phase at `tick`, resetting the remaining time.
    ///
    /// Re-entering the current phase is a no-op and keeps the running
    /// timer.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionViolation`] if the table forbids the change; the
    /// timer is left untouched.
    pub fn transition(&mut self, to: Phase, tick: u64) -> Result<(), TransitionViolation> {
        if to == self.phase {
            return Ok(());
        }
        check_transition(self.phase, to)?;
        self.restart(to, tick);
        Ok(())
    }

    /// Force the timer into `phase` at `tick` without consulting the table.
    ///
    /// Used to synchronize with a stream that starts mid-match.
    pub const fn restart(&mut self, phase: Phase, tick: u64) {
        self.phase = phase;
        self.started_at = tick;
    }

    /// Remaining time at `tick`, clamped at zero.
    pub fn remaining_at(&self, tick: u64) -> u64 {
        let elapsed_ticks = tick.saturating_sub(self.started_at);
        let elapsed_ms = ticks_to_ms(elapsed_ticks, self.tick_rate);
        self.timing
            .phase_duration_ms(self.phase)
            .saturating_sub(elapsed_ms)
    }

    /// The schema timer value at `tick`.
    pub fn timer_at(&self, tick: u64) -> Timer {
        Timer {
            phase: self.phase,
            time_remaining_ms: self.remaining_at(tick),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_PHASES: [Phase; 6] = [
        Phase::Warmup,
        Phase::Freezetime,
        Phase::Regular,
        Phase::Planted,
        Phase::Restart,
        Phase::Halftime,
    ];

    fn make_timer(phase: Phase, tick: u64) -> RoundTimer {
        RoundTimer::new(&TimingConfig::default(), 64, phase, tick)
    }

    #[test]
    fn table_has_exactly_eight_transitions() {
        let allowed = ALL_PHASES
            .iter()
            .flat_map(|from| ALL_PHASES.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| can_transition(*from, *to))
            .count();
        assert_eq!(allowed, 8);
    }

    #[test]
    fn round_cycle_is_allowed() {
        assert!(can_transition(Phase::Warmup, Phase::Freezetime));
        assert!(can_transition(Phase::Freezetime, Phase::Regular));
        assert!(can_transition(Phase::Regular, Phase::Planted));
        assert!(can_transition(Phase::Regular, Phase::Restart));
        assert!(can_transition(Phase::Planted, Phase::Restart));
        assert!(can_transition(Phase::Restart, Phase::Freezetime));
        assert!(can_transition(Phase::Restart, Phase::Halftime));
        assert!(can_transition(Phase::Halftime, Phase::Freezetime));
    }

    #[test]
    fn planted_to_freezetime_is_rejected() {
        assert_eq!(
            check_transition(Phase::Planted, Phase::Freezetime),
            Err(TransitionViolation {
                from: Phase::Planted,
                to: Phase::Freezetime,
            })
        );
        assert!(!can_transition(Phase::Warmup, Phase::Regular));
        assert!(!can_transition(Phase::Halftime, Phase::Warmup));
        assert!(!can_transition(Phase::Regular, Phase::Regular));
    }

    #[test]
    fn remaining_time_counts_down_and_clamps() {
        let timer = make_timer(Phase::Planted, 1_000);
        assert_eq!(timer.remaining_at(1_000), 40_000);
        // 64 ticks at 64 tick = one second
        assert_eq!(timer.remaining_at(1_064), 39_000);
        assert_eq!(timer.remaining_at(1_032), 39_500);
        // Long past the bomb timer
        assert_eq!(timer.remaining_at(100_000), 0);
    }

    #[test]
    fn remaining_time_is_non_increasing() {
        let timer = make_timer(Phase::Regular, 0);
        let mut previous = timer.remaining_at(0);
        for tick in 1..10_000 {
            let current = timer.remaining_at(tick);
            assert!(current <= previous);
            previous = current;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn transition_resets_timer() {
        let mut timer = make_timer(Phase::Regular, 0);
        assert_eq!(timer.remaining_at(640), 105_000);
        assert!(timer.transition(Phase::Planted, 640).is_ok());
        assert_eq!(timer.phase(), Phase::Planted);
        assert_eq!(timer.started_at(), 640);
        assert_eq!(timer.remaining_at(640), 40_000);
    }

    #[test]
    fn same_phase_keeps_running_timer() {
        let mut timer = make_timer(Phase::Regular, 0);
        assert!(timer.transition(Phase::Regular, 640).is_ok());
        assert_eq!(timer.started_at(), 0);
    }

    #[test]
    fn rejected_transition_leaves_timer_untouched() {
        let mut timer = make_timer(Phase::Planted, 10);
        let before = timer.clone();
        assert!(timer.transition(Phase::Freezetime, 20).is_err());
        assert_eq!(timer, before);
    }

    #[test]
    fn restart_bypasses_table() {
        let mut timer = make_timer(Phase::Warmup, 0);
        timer.restart(Phase::Planted, 5);
        assert_eq!(timer.timer_at(5).phase, Phase::Planted);
    }

    #[test]
    fn ticks_to_ms_handles_zero_rate() {
        assert_eq!(ticks_to_ms(128, 128), 1_000);
        assert_eq!(ticks_to_ms(128, 0), 0);
    }
}
