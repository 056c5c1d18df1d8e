//! Per-batch lifecycle states.
//!
//! A batch moves `Idle -> Running -> Paused -> Running -> ... -> Completed`.
//! `Completed` is terminal: resume against it is a no-op notification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Batch lifecycle state as observed between engine steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    /// Created (or loaded) with no processing task ever started.
    Idle,
    /// A record loop is active for this batch.
    Running,
    /// Explicitly stopped; cursor retained for resume.
    Paused,
    /// Cursor reached the end of the record list.
    Completed,
}

impl BatchState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Check if this is an active state (a record loop is running)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Check if a start/resume command may spawn a loop from this state
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Idle | Self::Paused)
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for BatchState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "running" => Ok(Self::Running),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid batch state: {s}")),
        }
    }
}

impl Default for BatchState {
    fn default() -> Self {
        Self::Idle
    }
}
