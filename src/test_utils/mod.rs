//! Test utilities for the dumpstate collector
//!
//! Fakes for the command runner and clock seams plus small fixture helpers.

#![cfg(test)]

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use crate::collectors::modem::Clock;
use crate::models::StepStatus;
use crate::utils::command::{CommandOptions, CommandRunner, SystemCommandRunner};

/// A command the collector asked to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub title: String,
    pub argv: Vec<String>,
}

type ArgvMatcher = Box<dyn Fn(&[String]) -> bool + Send + Sync>;

/// Records every command and answers with scripted statuses.
///
/// Unscripted commands report success without running, unless the runner
/// was built with [`RecordingRunner::passthrough`].
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<RecordedCall>>,
    failures: Vec<(ArgvMatcher, StepStatus)>,
    echo_titles: bool,
    delegate: Option<SystemCommandRunner>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run unscripted commands for real
    pub fn passthrough() -> Self {
        Self {
            delegate: Some(SystemCommandRunner::new()),
            ..Self::default()
        }
    }

    /// Answer `status` for every argv matching `matcher`
    pub fn fail_when<F>(mut self, matcher: F, status: StepStatus) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.failures.push((Box::new(matcher), status));
        self
    }

    /// Write a section header for each faked command
    pub fn echo_titles(mut self) -> Self {
        self.echo_titles = true;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.title).collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, title: &str, argv: &[String], options: &CommandOptions, sink: &mut dyn Write) -> StepStatus {
        self.calls.lock().unwrap().push(RecordedCall {
            title: title.to_string(),
            argv: argv.to_vec(),
        });

        if let Some((_, status)) = self.failures.iter().find(|(matches, _)| matches(argv)) {
            return status.clone();
        }

        match &self.delegate {
            Some(runner) => runner.run(title, argv, options, sink),
            None => {
                if self.echo_titles {
                    writeln!(sink, "------ {} ({}) ------", title, argv.join(" ")).unwrap();
                }
                StepStatus::Completed
            }
        }
    }
}

/// Clock whose sleeps return immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSleepClock;

impl Clock for NoSleepClock {
    fn sleep(&self, _duration: Duration) {}
}

/// Create `names` under `dir`, each containing its own name
pub fn create_named_files(dir: &Path, names: &[&str]) {
    for name in names {
        fs::write(dir.join(name), name).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_runner_scripts_failures() {
        let runner = RecordingRunner::new().fail_when(|argv| argv[0] == "tar", StepStatus::ExitFailure { code: Some(2) });
        let options = CommandOptions::with_timeout_secs(1);
        let mut sink = Vec::new();

        let cp = runner.run("CP", &["cp".to_string()], &options, &mut sink);
        let tar = runner.run("TAR", &["tar".to_string()], &options, &mut sink);

        assert_eq!(cp, StepStatus::Completed);
        assert_eq!(tar, StepStatus::ExitFailure { code: Some(2) });
        assert_eq!(runner.titles(), vec!["CP", "TAR"]);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_passthrough_runs_commands() {
        let runner = RecordingRunner::passthrough();
        let mut sink = Vec::new();

        let status = runner.run(
            "ECHO",
            &["echo".to_string(), "hi".to_string()],
            &CommandOptions::with_timeout_secs(5),
            &mut sink,
        );

        assert_eq!(status, StepStatus::Completed);
        assert!(String::from_utf8_lossy(&sink).contains("hi"));
    }
}
