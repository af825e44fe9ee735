use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;

use crate::constants::{
    DIAG_MDLOG_PERSIST_PROPERTY, DIAG_MDLOG_PROPERTY, DIAG_MDLOG_STATUS_PROPERTY, DIAG_POLL_INTERVAL,
};
use crate::properties::PropertyStore;

/// Source of delays for the quiesce loop.
#[cfg_attr(test, mockall::automock)]
pub trait Clock {
    fn sleep(&self, duration: Duration);
}

/// Blocks the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Last observed state of the diag_mdlog daemon.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagLoggerState {
    Unknown,
    Running,
    Stopped,
}

/// How the wait for the daemon to stop ended.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum QuiesceOutcome {
    /// Status read stopped on poll `polls` (1-based), followed by the settle delay
    Quiesced { polls: u32 },
    /// Budget exhausted with the daemon still reporting running
    TimedOut { polls: u32 },
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopReport {
    pub was_running: bool,
    pub quiesce: QuiesceOutcome,
}

/// Pauses diag_mdlog around log collection and puts it back afterwards.
///
/// The controller is the only writer of the command flag during a run; the
/// daemon acknowledges through the status flag.
pub struct DiagLoggerController<'a> {
    props: &'a dyn PropertyStore,
    clock: &'a dyn Clock,
    state: DiagLoggerState,
    was_running: bool,
}

impl<'a> DiagLoggerController<'a> {
    pub fn new(props: &'a dyn PropertyStore, clock: &'a dyn Clock) -> Self {
        Self {
            props,
            clock,
            state: DiagLoggerState::Unknown,
            was_running: false,
        }
    }

    /// Persisted switch that enables diag log collection at all
    pub fn is_enabled(&self) -> bool {
        self.props.get_bool(DIAG_MDLOG_PERSIST_PROPERTY, false)
    }

    pub fn state(&self) -> DiagLoggerState {
        self.state
    }

    /// Whether the daemon was running when `stop_and_wait` was entered
    pub fn was_running(&self) -> bool {
        self.was_running
    }

    fn observe(&mut self) -> DiagLoggerState {
        self.state = if self.props.get_bool(DIAG_MDLOG_STATUS_PROPERTY, false) {
            DiagLoggerState::Running
        } else {
            DiagLoggerState::Stopped
        };
        self.state
    }

    /// Write the command flag; false when the store rejected the write
    fn command(&self, running: bool) -> bool {
        let value = if running { "true" } else { "false" };
        match self.props.set(DIAG_MDLOG_PROPERTY, value) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to set {}={}: {:#}", DIAG_MDLOG_PROPERTY, value, e);
                false
            }
        }
    }

    /// Ask a running daemon to stop, then poll its status once per interval
    /// for up to `poll_budget` polls. Reaching the budget is not an error;
    /// collection proceeds either way.
    pub fn stop_and_wait(&mut self, poll_budget: u32) -> StopReport {
        self.was_running = self.observe() == DiagLoggerState::Running;

        if self.was_running {
            info!("Stopping diag_mdlog...");
            let _ = self.command(false);
        } else {
            debug!("diag_mdlog is not running");
        }

        let mut quiesce = QuiesceOutcome::TimedOut { polls: poll_budget };
        for poll in 1..=poll_budget {
            if self.observe() == DiagLoggerState::Stopped {
                debug!("diag_mdlog exited");
                self.clock.sleep(DIAG_POLL_INTERVAL);
                quiesce = QuiesceOutcome::Quiesced { polls: poll };
                break;
            }
            self.clock.sleep(DIAG_POLL_INTERVAL);
        }

        if let QuiesceOutcome::TimedOut { polls } = quiesce {
            warn!("diag_mdlog still running after {} polls, collecting anyway", polls);
        }

        StopReport {
            was_running: self.was_running,
            quiesce,
        }
    }

    /// Restart the daemon if it was running before `stop_and_wait`.
    /// Returns whether the command flag was written.
    pub fn restore(&self, was_running: bool) -> bool {
        if !was_running {
            return false;
        }
        info!("Restarting diag_mdlog...");
        self.command(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::MemoryPropertyStore;
    use anyhow::{bail, Result};
    use std::sync::Arc;

    /// Store whose command flag is read-only, as on a device without the sepolicy grant
    struct ReadOnlyCommandFlag(MemoryPropertyStore);

    impl PropertyStore for ReadOnlyCommandFlag {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if key == DIAG_MDLOG_PROPERTY {
                bail!("permission denied setting {}", key);
            }
            self.0.set(key, value)
        }
    }

    #[test]
    fn test_already_stopped_is_detected_on_first_poll() {
        let props = MemoryPropertyStore::with_values([(DIAG_MDLOG_STATUS_PROPERTY, "false")]);
        let mut clock = MockClock::new();
        clock.expect_sleep().times(1).return_const(());

        let mut controller = DiagLoggerController::new(&props, &clock);
        let report = controller.stop_and_wait(30);

        assert!(!report.was_running);
        assert_eq!(report.quiesce, QuiesceOutcome::Quiesced { polls: 1 });
        assert_eq!(props.get(DIAG_MDLOG_PROPERTY), None);
        assert!(!controller.restore(report.was_running));
        assert_eq!(props.get(DIAG_MDLOG_PROPERTY), None);
    }

    #[test]
    fn test_running_daemon_is_stopped_and_polled_until_quiet() {
        let props = Arc::new(MemoryPropertyStore::with_values([(DIAG_MDLOG_STATUS_PROPERTY, "true")]));

        // The daemon acknowledges the stop after three poll intervals
        let daemon = Arc::clone(&props);
        let mut elapsed = 0u32;
        let mut clock = MockClock::new();
        clock.expect_sleep().times(4).returning(move |interval| {
            assert_eq!(interval, Duration::from_secs(1));
            elapsed += 1;
            if elapsed == 3 {
                daemon.set(DIAG_MDLOG_STATUS_PROPERTY, "false").unwrap();
            }
        });

        let mut controller = DiagLoggerController::new(props.as_ref(), &clock);
        let report = controller.stop_and_wait(30);

        assert!(report.was_running);
        assert_eq!(report.quiesce, QuiesceOutcome::Quiesced { polls: 4 });
        assert_eq!(props.get(DIAG_MDLOG_PROPERTY).as_deref(), Some("false"));
        assert_eq!(controller.state(), DiagLoggerState::Stopped);

        assert!(controller.restore(controller.was_running()));
        assert_eq!(props.get(DIAG_MDLOG_PROPERTY).as_deref(), Some("true"));
    }

    #[test]
    fn test_budget_exhaustion_is_not_an_error() {
        let props = MemoryPropertyStore::with_values([(DIAG_MDLOG_STATUS_PROPERTY, "1")]);
        let mut clock = MockClock::new();
        clock.expect_sleep().times(5).return_const(());

        let mut controller = DiagLoggerController::new(&props, &clock);
        let report = controller.stop_and_wait(5);

        assert!(report.was_running);
        assert_eq!(report.quiesce, QuiesceOutcome::TimedOut { polls: 5 });
        assert_eq!(controller.state(), DiagLoggerState::Running);
        assert!(controller.restore(report.was_running));
        assert_eq!(props.get(DIAG_MDLOG_PROPERTY).as_deref(), Some("true"));
    }

    #[test]
    fn test_state_is_unknown_until_observed() {
        let props = MemoryPropertyStore::new();
        let clock = MockClock::new();
        let controller = DiagLoggerController::new(&props, &clock);

        assert_eq!(controller.state(), DiagLoggerState::Unknown);
        assert!(!controller.is_enabled());

        props.set(DIAG_MDLOG_PERSIST_PROPERTY, "true").unwrap();
        assert!(controller.is_enabled());
    }

    #[test]
    fn test_restore_reports_rejected_command_flag() {
        let props = ReadOnlyCommandFlag(MemoryPropertyStore::with_values([(DIAG_MDLOG_STATUS_PROPERTY, "true")]));
        let mut clock = MockClock::new();
        clock.expect_sleep().times(2).return_const(());

        let mut controller = DiagLoggerController::new(&props, &clock);
        let report = controller.stop_and_wait(2);

        assert!(report.was_running);
        assert!(!controller.restore(report.was_running));
        assert_eq!(props.get(DIAG_MDLOG_PROPERTY), None);
    }
}
