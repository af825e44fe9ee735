use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::models::StepStatus;

/// How often a running child is checked against its deadline
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Time given to the drain threads to hand over buffered output after a kill
const KILL_DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Read size used by the drain threads
const DRAIN_CHUNK_SIZE: usize = 8192;

/// Options applied to a single command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOptions {
    pub timeout: Duration,
}

impl CommandOptions {
    pub fn with_timeout_secs(secs: u64) -> Self {
        Self { timeout: Duration::from_secs(secs) }
    }
}

/// Runs external commands on behalf of the collectors.
///
/// Implementations write a section header followed by the command output to
/// `sink` and report how the command ended. They never fail the caller.
pub trait CommandRunner {
    fn run(
        &self,
        title: &str,
        argv: &[String],
        options: &CommandOptions,
        sink: &mut dyn Write,
    ) -> StepStatus;
}

/// Spawns real processes and enforces the timeout by killing the child.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        SystemCommandRunner
    }

    fn spawn(argv: &[String]) -> std::io::Result<Child> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line"))?;

        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
    }
}

/// Drain a child pipe on a helper thread so the child never blocks on a full pipe.
///
/// Chunks are forwarded as they arrive; the channel disconnects at EOF. A
/// grandchild that inherited the pipe keeps the thread alive after the
/// receiver is gone, so the thread is detached rather than joined.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buffer = vec![0u8; DRAIN_CHUNK_SIZE];
            loop {
                match pipe.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buffer[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        });
        rx
    })
}

/// Output gathered from one pipe before a deadline.
#[derive(Debug, Default)]
struct Drained {
    bytes: Vec<u8>,
    /// Writer end still open when the deadline passed
    still_open: bool,
}

fn collect(pipe: Option<Receiver<Vec<u8>>>, deadline: Instant) -> Drained {
    let mut drained = Drained::default();
    let Some(rx) = pipe else {
        return drained;
    };

    loop {
        match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(chunk) => drained.bytes.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => return drained,
            Err(RecvTimeoutError::Timeout) => {
                drained.still_open = true;
                return drained;
            }
        }
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(
        &self,
        title: &str,
        argv: &[String],
        options: &CommandOptions,
        sink: &mut dyn Write,
    ) -> StepStatus {
        let command_line = argv.join(" ");
        let _ = writeln!(sink, "------ {} ({}) ------", title, command_line);
        debug!("Running '{}': {}", title, command_line);

        let start = Instant::now();
        let mut child = match Self::spawn(argv) {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to run '{}': {}", command_line, e);
                let _ = writeln!(sink, "*** command '{}' failed: {}", command_line, e);
                return StepStatus::error(e);
            }
        };

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let deadline = start + options.timeout;

        let status = loop {
            match child.try_wait() {
                Ok(Some(exit)) => break Ok(exit),
                Ok(None) if Instant::now() >= deadline => break Err(None),
                Ok(None) => thread::sleep(WAIT_POLL_INTERVAL),
                Err(e) => break Err(Some(e)),
            }
        };

        let result = match status {
            Ok(exit) => {
                // Pipes hit EOF once the child is gone, unless it left grandchildren holding them
                let out = collect(stdout, deadline);
                let err = collect(stderr, deadline);
                let _ = sink.write_all(&out.bytes);
                let _ = sink.write_all(&err.bytes);
                if out.still_open || err.still_open {
                    warn!("'{}' left its output open past the deadline, detaching", command_line);
                    let _ = writeln!(sink, "*** output of '{}' still open after {:.3}s, detached", command_line, options.timeout.as_secs_f64());
                }

                if exit.success() {
                    StepStatus::Completed
                } else {
                    warn!("'{}' {}", command_line, exit);
                    StepStatus::ExitFailure { code: exit.code() }
                }
            }
            Err(None) => {
                let _ = child.kill();
                let _ = child.wait();

                // Keep whatever the command printed before it was killed
                let grace = Instant::now() + KILL_DRAIN_GRACE;
                let _ = sink.write_all(&collect(stdout, grace).bytes);
                let _ = sink.write_all(&collect(stderr, grace).bytes);

                let after_secs = options.timeout.as_secs();
                warn!("'{}' timed out after {:?}, killed pid {}", command_line, options.timeout, child.id());
                let _ = writeln!(
                    sink,
                    "*** command '{}' timed out after {:.3}s (killing pid {})",
                    command_line,
                    options.timeout.as_secs_f64(),
                    child.id()
                );
                StepStatus::TimedOut { after_secs }
            }
            Err(Some(e)) => {
                let _ = child.kill();
                let _ = child.wait();
                warn!("Failed waiting for '{}': {}", command_line, e);
                StepStatus::error(e)
            }
        };

        let _ = writeln!(
            sink,
            "------ {:.3}s was the duration of '{}' ------",
            start.elapsed().as_secs_f64(),
            title
        );

        result
    }
}
