//! Time codes used to sample attributes

use std::fmt;

use serde::{Deserialize, Serialize};

/// Point on the animation timeline at which attributes are read or written.
///
/// `Default` addresses the time-independent value of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum TimeCode {
    #[default]
    Default,
    Frame(f64),
}

impl TimeCode {
    pub fn is_default(&self) -> bool {
        matches!(self, TimeCode::Default)
    }

    /// The same time code, with NaN and infinite frames read as `Default`
    pub fn finite(self) -> TimeCode {
        match self {
            TimeCode::Frame(frame) if !frame.is_finite() => TimeCode::Default,
            other => other,
        }
    }

    /// Frame value, `None` for the default time
    pub fn frame(&self) -> Option<f64> {
        match self {
            TimeCode::Default => None,
            TimeCode::Frame(frame) => Some(*frame),
        }
    }
}

impl From<f64> for TimeCode {
    fn from(frame: f64) -> Self {
        TimeCode::Frame(frame).finite()
    }
}

impl fmt::Display for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeCode::Default => f.write_str("DEFAULT"),
            TimeCode::Frame(frame) => write!(f, "{frame}"),
        }
    }
}
