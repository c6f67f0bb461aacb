//! Session configuration, validation, and error types.
//!
//! [`SessionConfig`] is the builder-input for starting a session.
//! [`validate()`](SessionConfig::validate) checks structural invariants
//! at startup, before the catalog is fetched.

use std::error::Error;
use std::fmt;
use std::time::Duration;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SessionConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// `max_accuracy_m` is NaN, infinite, zero, or negative.
    InvalidAccuracyBound {
        /// The invalid value.
        value: f64,
    },
    /// The report channel capacity is zero.
    ReportCapacityZero,
    /// The shutdown timeout is zero.
    ShutdownTimeoutZero,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAccuracyBound { value } => {
                write!(f, "max_accuracy_m must be finite and positive, got {value}")
            }
            Self::ReportCapacityZero => write!(f, "report_capacity must be at least 1"),
            Self::ShutdownTimeoutZero => write!(f, "shutdown_timeout_ms must be at least 1"),
        }
    }
}

impl Error for ConfigError {}

// ── SessionConfig ──────────────────────────────────────────────────

/// Configuration for a lockstep or realtime session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    /// Drop a sample whose position equals the last successfully
    /// reconciled one. Default: true.
    pub skip_repeated_positions: bool,
    /// Drop samples whose accuracy radius (metres) is worse than this
    /// bound. Default: `None` (accept every accuracy).
    pub max_accuracy_m: Option<f64>,
    /// Create audio resources for every spot with sound at session
    /// start instead of on first entry. Default: true.
    pub prebind_resources: bool,
    /// Capacity of the realtime cycle-report channel. Reports beyond it
    /// are dropped, never blocking the worker. Default: 64.
    pub report_capacity: usize,
    /// How long realtime shutdown waits for the worker. Default: 2000.
    pub shutdown_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            skip_repeated_positions: true,
            max_accuracy_m: None,
            prebind_resources: true,
            report_capacity: 64,
            shutdown_timeout_ms: 2000,
        }
    }
}

impl SessionConfig {
    /// Validate all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(bound) = self.max_accuracy_m {
            if !bound.is_finite() || bound <= 0.0 {
                return Err(ConfigError::InvalidAccuracyBound { value: bound });
            }
        }
        if self.report_capacity == 0 {
            return Err(ConfigError::ReportCapacityZero);
        }
        if self.shutdown_timeout_ms == 0 {
            return Err(ConfigError::ShutdownTimeoutZero);
        }
        Ok(())
    }

    /// The shutdown budget as a [`Duration`].
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}
