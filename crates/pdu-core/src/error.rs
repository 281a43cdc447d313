//! Error types for PDU port control.
//!
//! `PduError` is the single error type returned by the PDU layer. Using the
//! `thiserror` crate it keeps the taxonomy small and explicit:
//!
//! - **`Configuration`**: raised while building a PDU: unknown driver name,
//!   malformed driver config, inventory files that fail to load. Permanent;
//!   fix the configuration.
//! - **`Driver`**: whatever the vendor driver reported, propagated unchanged.
//!   The PDU layer never retries or hides these.
//! - **`InvalidAction`**: a caller tried to command a state that is only
//!   observable (`Unknown`). Rejected before any driver is reached.
//! - **`Timeout`** / **`Join`**: only produced by the async port wrapper.
//!
//! A PDU with no bound driver is *not* an error: reads report `Unknown` and
//! writes report "nothing happened".

use crate::power_state::PowerState;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Driver Errors
// =============================================================================

/// Coarse category of a driver failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// Driver could not be set up
    Initialization,
    /// Driver config rejected by the hardware
    Configuration,
    /// Link to the PDU failed (network, serial)
    Communication,
    /// PDU answered with a fault
    Hardware,
    /// PDU did not answer in time
    Timeout,
    /// Credentials rejected
    Permission,
    /// Outlet id not known to the hardware
    InvalidPort,
    /// Anything else
    Unknown,
}

impl std::fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DriverErrorKind::Initialization => "initialization",
            DriverErrorKind::Configuration => "configuration",
            DriverErrorKind::Communication => "communication",
            DriverErrorKind::Hardware => "hardware",
            DriverErrorKind::Timeout => "timeout",
            DriverErrorKind::Permission => "permission",
            DriverErrorKind::InvalidPort => "invalid_port",
            DriverErrorKind::Unknown => "unknown",
        };
        write!(f, "{}", label)
    }
}

/// Failure reported by a [`crate::PduDriver`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Driver '{driver_type}' {kind} error: {message}")]
pub struct DriverError {
    /// Registry name of the driver that failed
    pub driver_type: String,
    /// Failure category
    pub kind: DriverErrorKind,
    /// Driver-provided detail
    pub message: String,
}

impl DriverError {
    /// Build a driver error.
    pub fn new(
        driver_type: impl Into<String>,
        kind: DriverErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            driver_type: driver_type.into(),
            kind,
            message: message.into(),
        }
    }
}

// =============================================================================
// PDU Errors
// =============================================================================

/// Convenience alias for results using [`PduError`].
pub type PduResult<T> = std::result::Result<T, PduError>;

/// Primary error type for the PDU layer.
#[derive(Error, Debug)]
pub enum PduError {
    /// PDU construction or inventory loading failed.
    ///
    /// **Error Type**: Permanent - not retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The bound driver failed; passed through unchanged.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// `Unknown` (or another non-action) was commanded.
    #[error("{0} is not a valid power action")]
    InvalidAction(PowerState),

    /// An async power operation did not finish within its deadline.
    #[error("Power operation did not complete within {0:?}")]
    Timeout(Duration),

    /// The blocking task running a power operation panicked or was cancelled.
    #[error("Power operation task failed: {0}")]
    Join(String),
}

impl PduError {
    /// `true` when the failure came from the driver rather than the PDU layer.
    pub fn is_driver_error(&self) -> bool {
        matches!(self, PduError::Driver(_))
    }
}
