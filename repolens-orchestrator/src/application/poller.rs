//! Client-side status poller
//!
//! Pure decision logic for a polling client: feed it one observation of
//! the project per tick and it answers with what to do next. It derives
//! a smoothed progress figure, detects a stalled run (no observable
//! change for a while), heals a stuck client-side guard after a few
//! stale ticks, and enforces a hard ceiling on total run duration.
//!
//! Time is injected through [`Clock`] so the logic is testable without
//! real waiting.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_objects::AnalysisStatus;

/// Time source for the poller.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time; the default outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Poller tuning knobs.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// No observable change for this long counts as a stale tick
    pub stale_after: Duration,
    /// Consecutive stale ticks before the guard is told to clear
    pub guard_reset_ticks: u32,
    /// Hard ceiling on run duration as seen from the client
    pub max_duration: Duration,
    /// Smoothing offset applied to both progress counters
    pub progress_offset: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::seconds(30),
            guard_reset_ticks: 3,
            max_duration: Duration::seconds(600),
            progress_offset: 1,
        }
    }
}

/// One observation of the project, as read back by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct PollObservation {
    pub status: AnalysisStatus,
    /// Reports persisted so far for this run
    pub completed: u32,
    /// Reports requested for this run
    pub total: u32,
}

/// What the client should do after an observation.
#[derive(Debug, Clone, PartialEq)]
pub enum PollDirective {
    /// Keep polling; display the given progress
    Continue { progress: u8 },
    /// Keep polling, but clear any client-side in-flight guard first;
    /// the run looks stalled and a retrigger must not be blocked
    ClearGuard { progress: u8 },
    /// Run finished successfully
    Finished,
    /// Run failed; read the project's error message
    Failed,
    /// The run exceeded the duration ceiling; treat as failed
    TimedOut,
}

/// Stateful poll-loop driver for one run.
pub struct StatusPoller {
    clock: Arc<dyn Clock>,
    config: PollerConfig,
    started_at: DateTime<Utc>,
    last_change_at: DateTime<Utc>,
    last_seen: Option<PollObservation>,
    stale_ticks: u32,
}

impl StatusPoller {
    pub fn new(clock: Arc<dyn Clock>, config: PollerConfig) -> Self {
        let now = clock.now();
        Self {
            clock,
            config,
            started_at: now,
            last_change_at: now,
            last_seen: None,
            stale_ticks: 0,
        }
    }

    /// Smoothed progress: both counters get the configured offset so the
    /// bar moves off zero as soon as the run is accepted and only hits
    /// 100 when everything requested has landed.
    pub fn progress(&self, completed: u32, total: u32) -> u8 {
        let offset = self.config.progress_offset;
        let numerator = f64::from(completed + offset);
        let denominator = f64::from(total + offset);
        if denominator <= 0.0 {
            return 0;
        }
        let pct = (numerator / denominator * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }

    /// Feed one observation; decide what the client does next.
    pub fn observe(&mut self, observation: PollObservation) -> PollDirective {
        let now = self.clock.now();

        match observation.status {
            AnalysisStatus::Completed => return PollDirective::Finished,
            AnalysisStatus::Error => return PollDirective::Failed,
            _ => {}
        }

        if now - self.started_at >= self.config.max_duration {
            return PollDirective::TimedOut;
        }

        let progress = self.progress(observation.completed, observation.total);

        let changed = self
            .last_seen
            .as_ref()
            .map(|last| *last != observation)
            .unwrap_or(true);
        self.last_seen = Some(observation);

        if changed {
            self.last_change_at = now;
            self.stale_ticks = 0;
            return PollDirective::Continue { progress };
        }

        if now - self.last_change_at >= self.config.stale_after {
            self.stale_ticks += 1;
            if self.stale_ticks >= self.config.guard_reset_ticks {
                self.stale_ticks = 0;
                self.last_change_at = now;
                return PollDirective::ClearGuard { progress };
            }
        }

        PollDirective::Continue { progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::AnalysisType;
    use std::sync::Mutex;

    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                now: Mutex::new(Utc::now()),
            })
        }

        fn advance(&self, seconds: i64) {
            let mut now = self.now.lock().unwrap();
            *now += Duration::seconds(seconds);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn generating(completed: u32, total: u32) -> PollObservation {
        PollObservation {
            status: AnalysisStatus::Generating(AnalysisType::Prd),
            completed,
            total,
        }
    }

    #[test]
    fn test_progress_offset_smoothing() {
        let poller = StatusPoller::new(ManualClock::new(), PollerConfig::default());
        // 0 of 3 done still shows motion; 3 of 3 is exactly 100
        assert_eq!(poller.progress(0, 3), 25);
        assert_eq!(poller.progress(1, 3), 50);
        assert_eq!(poller.progress(3, 3), 100);
    }

    #[test]
    fn test_terminal_statuses() {
        let clock = ManualClock::new();
        let mut poller = StatusPoller::new(clock, PollerConfig::default());

        let finished = poller.observe(PollObservation {
            status: AnalysisStatus::Completed,
            completed: 3,
            total: 3,
        });
        assert_eq!(finished, PollDirective::Finished);

        let failed = poller.observe(PollObservation {
            status: AnalysisStatus::Error,
            completed: 0,
            total: 3,
        });
        assert_eq!(failed, PollDirective::Failed);
    }

    #[test]
    fn test_guard_clears_after_three_stale_ticks() {
        let clock = ManualClock::new();
        let mut poller = StatusPoller::new(clock.clone(), PollerConfig::default());

        assert!(matches!(
            poller.observe(generating(1, 3)),
            PollDirective::Continue { .. }
        ));

        // Identical observation, stale threshold crossed each tick
        for _ in 0..2 {
            clock.advance(31);
            assert!(matches!(
                poller.observe(generating(1, 3)),
                PollDirective::Continue { .. }
            ));
        }
        clock.advance(31);
        assert!(matches!(
            poller.observe(generating(1, 3)),
            PollDirective::ClearGuard { .. }
        ));

        // Counter reset: the next stale tick starts a new cycle
        clock.advance(31);
        assert!(matches!(
            poller.observe(generating(1, 3)),
            PollDirective::Continue { .. }
        ));
    }

    #[test]
    fn test_change_resets_staleness() {
        let clock = ManualClock::new();
        let mut poller = StatusPoller::new(clock.clone(), PollerConfig::default());

        poller.observe(generating(1, 3));
        clock.advance(31);
        poller.observe(generating(1, 3));
        clock.advance(31);
        // Progress moved: stale counter goes back to zero
        assert!(matches!(
            poller.observe(generating(2, 3)),
            PollDirective::Continue { .. }
        ));
        clock.advance(31);
        assert!(matches!(
            poller.observe(generating(2, 3)),
            PollDirective::Continue { .. }
        ));
    }

    #[test]
    fn test_fresh_observations_never_go_stale() {
        let clock = ManualClock::new();
        let mut poller = StatusPoller::new(clock.clone(), PollerConfig::default());

        for completed in 0..4 {
            clock.advance(31);
            assert!(matches!(
                poller.observe(generating(completed, 8)),
                PollDirective::Continue { .. }
            ));
        }
    }

    #[test]
    fn test_duration_ceiling() {
        let clock = ManualClock::new();
        let mut poller = StatusPoller::new(clock.clone(), PollerConfig::default());

        poller.observe(generating(1, 3));
        clock.advance(601);
        assert_eq!(poller.observe(generating(1, 3)), PollDirective::TimedOut);
    }

    #[test]
    fn test_ceiling_beats_terminal_check_only_for_active_runs() {
        let clock = ManualClock::new();
        let mut poller = StatusPoller::new(clock.clone(), PollerConfig::default());

        clock.advance(601);
        // A completed run observed late still counts as finished
        assert_eq!(
            poller.observe(PollObservation {
                status: AnalysisStatus::Completed,
                completed: 3,
                total: 3,
            }),
            PollDirective::Finished
        );
    }
}
