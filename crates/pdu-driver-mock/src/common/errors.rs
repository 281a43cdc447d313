//! Error injection for mock PDUs.
//!
//! Failures are produced as [`DriverError`]s so the PDU layer sees exactly
//! what a real vendor driver would hand it.

use super::rng::MockRng;
use parking_lot::Mutex;
use pdu_core::{DriverError, DriverErrorKind, PortId};
use std::collections::HashMap;
use std::sync::Arc;

/// Operation name of [`PduDriver::get_state`](pdu_core::PduDriver::get_state).
pub const GET_STATE: &str = "get_state";
/// Operation name of [`PduDriver::set_state`](pdu_core::PduDriver::set_state).
pub const SET_STATE: &str = "set_state";

/// Error injection configuration.
///
/// Clones share scenario state, so a test can keep a handle and
/// [`reset`](Self::reset) the driver it configured.
#[derive(Clone, Debug)]
pub struct ErrorConfig {
    /// Per-operation failure rate (0.0 to 1.0); `"*"` matches any operation
    failure_rates: Arc<HashMap<&'static str, f64>>,
    scenarios: Arc<Vec<ErrorScenario>>,
    rng: Arc<MockRng>,
    state: Arc<Mutex<ErrorState>>,
}

/// Scripted failure behaviour.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorScenario {
    /// Fail every call of `operation` after the first `count` succeed
    FailAfterN {
        /// [`GET_STATE`] or [`SET_STATE`]
        operation: &'static str,
        /// Successful calls before failures start
        count: u32,
    },
    /// Every call of `operation` times out
    Timeout {
        /// [`GET_STATE`] or [`SET_STATE`]
        operation: &'static str,
    },
    /// First call loses the link; every later call fails too
    CommunicationLoss,
    /// One outlet is faulty; calls for other outlets succeed
    OutletFault {
        /// Faulty outlet
        port: PortId,
    },
}

#[derive(Default, Debug)]
struct ErrorState {
    operation_counts: HashMap<&'static str, u32>,
    communication_lost: bool,
}

impl ErrorConfig {
    /// No injected errors.
    pub fn none() -> Self {
        Self::build(HashMap::new(), Vec::new(), None)
    }

    /// Uniform random failures on every operation.
    pub fn random_failures(rate: f64) -> Self {
        Self::random_failures_seeded(rate, None)
    }

    /// Uniform random failures with a fixed seed.
    pub fn random_failures_seeded(rate: f64, seed: Option<u64>) -> Self {
        Self::build(HashMap::from([("*", rate)]), Vec::new(), seed)
    }

    /// A single scenario.
    pub fn scenario(scenario: ErrorScenario) -> Self {
        Self::scenarios(vec![scenario])
    }

    /// Several scenarios, checked in order.
    pub fn scenarios(scenarios: Vec<ErrorScenario>) -> Self {
        Self::build(HashMap::new(), scenarios, None)
    }

    /// Custom failure rates per operation.
    pub fn with_rates(rates: HashMap<&'static str, f64>, seed: Option<u64>) -> Self {
        Self::build(rates, Vec::new(), seed)
    }

    fn build(
        rates: HashMap<&'static str, f64>,
        scenarios: Vec<ErrorScenario>,
        seed: Option<u64>,
    ) -> Self {
        Self {
            failure_rates: Arc::new(rates),
            scenarios: Arc::new(scenarios),
            rng: Arc::new(MockRng::new(seed)),
            state: Arc::new(Mutex::new(ErrorState::default())),
        }
    }

    /// Decide whether `operation` on `port` fails.
    pub fn check_operation(
        &self,
        driver_type: &str,
        operation: &'static str,
        port: &PortId,
    ) -> Result<(), DriverError> {
        let mut state = self.state.lock();

        if state.communication_lost {
            return Err(communication_lost(driver_type));
        }

        for scenario in self.scenarios.iter() {
            match scenario {
                ErrorScenario::FailAfterN {
                    operation: op,
                    count,
                } if *op == operation => {
                    let current = state.operation_counts.entry(operation).or_insert(0);
                    *current += 1;
                    if *current > *count {
                        return Err(DriverError::new(
                            driver_type,
                            DriverErrorKind::Hardware,
                            format!("Injected failure after {} operations", count),
                        ));
                    }
                }
                ErrorScenario::Timeout { operation: op } if *op == operation => {
                    return Err(DriverError::new(
                        driver_type,
                        DriverErrorKind::Timeout,
                        format!("Operation '{}' timed out", operation),
                    ));
                }
                ErrorScenario::CommunicationLoss => {
                    state.communication_lost = true;
                    return Err(communication_lost(driver_type));
                }
                ErrorScenario::OutletFault { port: faulty } if faulty == port => {
                    return Err(DriverError::new(
                        driver_type,
                        DriverErrorKind::Hardware,
                        format!("Outlet {} reports a fault", port),
                    ));
                }
                _ => {}
            }
        }

        let rate = self
            .failure_rates
            .get(operation)
            .or_else(|| self.failure_rates.get("*"))
            .copied()
            .unwrap_or(0.0);

        if self.rng.should_fail(rate) {
            return Err(DriverError::new(
                driver_type,
                DriverErrorKind::Communication,
                format!("Random failure on operation '{}'", operation),
            ));
        }

        Ok(())
    }

    /// Clear counters and restore a lost link.
    pub fn reset(&self) {
        *self.state.lock() = ErrorState::default();
    }
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self::none()
    }
}

fn communication_lost(driver_type: &str) -> DriverError {
    DriverError::new(
        driver_type,
        DriverErrorKind::Communication,
        "Communication lost",
    )
}
