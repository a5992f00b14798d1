//! Error types for spectrum construction and statistics

use std::fmt;

/// Result type for spectrum operations
pub type SpectrumResult<T> = Result<T, SpectrumError>;

/// Errors that can occur while building spectra or computing statistics
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpectrumError {
    /// Malformed or inconsistent spectrum/gate configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Statistic undefined for the given weights (zero total weight, zero variance)
    #[error("Division by zero: {0}")]
    DivideByZero(String),
}

impl SpectrumError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        SpectrumError::Configuration(msg.into())
    }

    pub fn divide_by_zero(msg: impl Into<String>) -> Self {
        SpectrumError::DivideByZero(msg.into())
    }

    /// True for numerical degeneracies (empty or flat data), as opposed to bad input
    pub fn is_degenerate(&self) -> bool {
        matches!(self, SpectrumError::DivideByZero(_))
    }
}

/// What happened to a row whose channel fell outside `[0, bins)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutOfRangeAction {
    /// Channel was moved to the nearest valid bin
    Clamped(i64),
    /// Row was removed from the table
    Dropped,
    /// Row was mapped unchanged
    Kept,
}

/// Non-fatal report of a channel coordinate outside its axis range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRangeWarning {
    /// Index of the row in the original channel data
    pub row: usize,
    /// Axis index (0 = x, 1 = y)
    pub axis: usize,
    /// Offending channel value
    pub channel: i64,
    /// Number of bins on that axis
    pub bins: u32,
    /// Action taken
    pub action: OutOfRangeAction,
}

impl fmt::Display for OutOfRangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = if self.axis == 0 { "x" } else { "y" };
        match self.action {
            OutOfRangeAction::Clamped(to) => write!(
                f,
                "row {}: {} channel {} outside [0, {}), clamped to {}",
                self.row, axis, self.channel, self.bins, to
            ),
            OutOfRangeAction::Dropped => write!(
                f,
                "row {}: {} channel {} outside [0, {}), dropped",
                self.row, axis, self.channel, self.bins
            ),
            OutOfRangeAction::Kept => write!(
                f,
                "row {}: {} channel {} outside [0, {}), kept",
                self.row, axis, self.channel, self.bins
            ),
        }
    }
}
