use serde::{Deserialize, Serialize};

/// Result of a single best-effort step (subprocess, archive write, permission change).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    ExitFailure { code: Option<i32> },
    TimedOut { after_secs: u64 },
    Error { reason: String },
}

impl StepStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, StepStatus::Completed)
    }

    pub fn error(reason: impl std::fmt::Display) -> Self {
        StepStatus::Error { reason: reason.to_string() }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Completed => write!(f, "completed"),
            StepStatus::ExitFailure { code: Some(code) } => write!(f, "exited with status {}", code),
            StepStatus::ExitFailure { code: None } => write!(f, "terminated by signal"),
            StepStatus::TimedOut { after_secs } => write!(f, "timed out after {}s", after_secs),
            StepStatus::Error { reason } => write!(f, "error: {}", reason),
        }
    }
}
