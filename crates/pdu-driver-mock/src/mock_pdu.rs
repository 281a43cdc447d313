//! Mock PDU driver.
//!
//! Keeps per-outlet state in memory, records every call it receives and can
//! be scripted to report arbitrary states, refuse commands or fail through
//! [`ErrorConfig`].

use crate::common::{ErrorConfig, GET_STATE, SET_STATE};
use anyhow::Result;
use parking_lot::Mutex;
use pdu_core::{DriverError, DriverFactory, PduDriver, PortId, PowerState};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Driver name registered by [`MockPduFactory`].
pub const MOCK_DRIVER: &str = "mock";

// =============================================================================
// MockPduFactory
// =============================================================================

/// Configuration read by [`MockPduFactory`].
///
/// Keys not listed here (such as `ports`) are ignored.
///
/// ```toml
/// initial_state = "ON"
/// refuse_commands = false
/// failure_rate = 0.05
/// seed = 42
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MockPduConfig {
    /// State reported by outlets that were never commanded (default `OFF`)
    #[serde(default)]
    pub initial_state: Option<PowerState>,
    /// Make every `set_state` return `false`
    #[serde(default)]
    pub refuse_commands: bool,
    /// Random failure rate applied to every operation
    #[serde(default)]
    pub failure_rate: Option<f64>,
    /// Seed for random failures
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Factory for creating [`MockPdu`] instances.
pub struct MockPduFactory;

impl DriverFactory for MockPduFactory {
    fn driver_type(&self) -> &str {
        MOCK_DRIVER
    }

    fn name(&self) -> &str {
        "Mock PDU"
    }

    fn validate(&self, config: &toml::Value) -> Result<()> {
        let cfg: MockPduConfig = config.clone().try_into()?;
        if let Some(rate) = cfg.failure_rate {
            if !(0.0..=1.0).contains(&rate) {
                anyhow::bail!("failure_rate must be between 0.0 and 1.0, got {}", rate);
            }
        }
        Ok(())
    }

    fn build(&self, config: toml::Value) -> Result<Box<dyn PduDriver>> {
        let cfg: MockPduConfig = config.try_into()?;
        Ok(Box::new(MockPdu::with_config(cfg)))
    }
}

// =============================================================================
// MockPdu
// =============================================================================

/// A call received by [`MockPdu`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// `get_state(port)`
    GetState(PortId),
    /// `set_state(port, state)`
    SetState(PortId, PowerState),
}

/// In-memory PDU.
///
/// - Outlets start in the configured initial state (default `Off`)
/// - `Reboot` settles to `On`
/// - Every call is logged, including ones that fail
pub struct MockPdu {
    initial_state: PowerState,
    outlets: Mutex<HashMap<PortId, PowerState>>,
    calls: Mutex<Vec<MockCall>>,
    refuse: AtomicBool,
    errors: ErrorConfig,
}

impl MockPdu {
    /// Create a mock PDU with every outlet `Off`.
    pub fn new() -> Self {
        Self::with_initial_state(PowerState::Off)
    }

    /// Create a mock PDU whose outlets start in `state`.
    pub fn with_initial_state(state: PowerState) -> Self {
        Self {
            initial_state: state,
            outlets: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            refuse: AtomicBool::new(false),
            errors: ErrorConfig::none(),
        }
    }

    /// Create a mock PDU from factory configuration.
    pub fn with_config(config: MockPduConfig) -> Self {
        let errors = match config.failure_rate {
            Some(rate) => ErrorConfig::random_failures_seeded(rate, config.seed),
            None => ErrorConfig::none(),
        };
        let pdu = Self::with_initial_state(config.initial_state.unwrap_or(PowerState::Off))
            .with_error_config(errors);
        pdu.refuse_commands(config.refuse_commands);
        pdu
    }

    /// Builder: attach an error injection configuration.
    pub fn with_error_config(mut self, errors: ErrorConfig) -> Self {
        self.errors = errors;
        self
    }

    /// Script the state `port` reports, as if changed outside the driver.
    pub fn set_reported_state(&self, port: impl Into<PortId>, state: PowerState) {
        self.outlets.lock().insert(port.into(), state);
    }

    /// State `port` currently reports.
    pub fn reported_state(&self, port: impl Into<PortId>) -> PowerState {
        self.outlets
            .lock()
            .get(&port.into())
            .copied()
            .unwrap_or(self.initial_state)
    }

    /// Make `set_state` return `false` without changing anything.
    pub fn refuse_commands(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Only the `set_state` calls, oldest first.
    pub fn commands(&self) -> Vec<(PortId, PowerState)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                MockCall::SetState(port, state) => Some((port.clone(), *state)),
                MockCall::GetState(_) => None,
            })
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Error injection handle shared with this driver.
    pub fn error_config(&self) -> &ErrorConfig {
        &self.errors
    }
}

impl Default for MockPdu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockPdu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPdu")
            .field("initial_state", &self.initial_state)
            .field("outlets", &*self.outlets.lock())
            .field("refuse", &self.refuse.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl PduDriver for MockPdu {
    fn get_state(&self, port_id: &PortId) -> Result<PowerState, DriverError> {
        self.calls.lock().push(MockCall::GetState(port_id.clone()));
        self.errors.check_operation(MOCK_DRIVER, GET_STATE, port_id)?;
        Ok(self.reported_state(port_id))
    }

    fn set_state(&self, port_id: &PortId, state: PowerState) -> Result<bool, DriverError> {
        self.calls
            .lock()
            .push(MockCall::SetState(port_id.clone(), state));
        self.errors.check_operation(MOCK_DRIVER, SET_STATE, port_id)?;

        if self.refuse.load(Ordering::SeqCst) {
            tracing::debug!(port = %port_id, %state, "Mock PDU refusing command");
            return Ok(false);
        }

        let settled = match state {
            PowerState::Reboot => PowerState::On,
            other => other,
        };
        self.outlets.lock().insert(port_id.clone(), settled);
        tracing::trace!(port = %port_id, %state, "Mock PDU outlet switched");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorScenario;
    use pdu_core::DriverErrorKind;

    #[test]
    fn test_outlets_start_off() {
        let pdu = MockPdu::new();
        assert_eq!(pdu.get_state(&PortId::from(1u8)).unwrap(), PowerState::Off);
    }

    #[test]
    fn test_set_then_get() {
        let pdu = MockPdu::new();
        let port = PortId::from(2u8);
        assert!(pdu.set_state(&port, PowerState::On).unwrap());
        assert_eq!(pdu.get_state(&port).unwrap(), PowerState::On);
        assert_eq!(pdu.reported_state(3), PowerState::Off);
    }

    #[test]
    fn test_reboot_settles_on() {
        let pdu = MockPdu::new();
        let port = PortId::from("a");
        pdu.set_state(&port, PowerState::Reboot).unwrap();
        assert_eq!(pdu.reported_state("a"), PowerState::On);
    }

    #[test]
    fn test_call_log() {
        let pdu = MockPdu::new();
        let port = PortId::from(1u8);
        pdu.get_state(&port).unwrap();
        pdu.set_state(&port, PowerState::Off).unwrap();

        assert_eq!(
            pdu.calls(),
            vec![
                MockCall::GetState(port.clone()),
                MockCall::SetState(port.clone(), PowerState::Off),
            ]
        );
        assert_eq!(pdu.commands(), vec![(port, PowerState::Off)]);

        pdu.clear_calls();
        assert!(pdu.calls().is_empty());
    }

    #[test]
    fn test_refuse_commands() {
        let pdu = MockPdu::with_initial_state(PowerState::On);
        pdu.refuse_commands(true);
        let port = PortId::from(1u8);
        assert!(!pdu.set_state(&port, PowerState::Off).unwrap());
        assert_eq!(pdu.reported_state(1), PowerState::On);
    }

    #[test]
    fn test_injected_errors_are_logged_and_returned() {
        let pdu = MockPdu::new().with_error_config(ErrorConfig::scenario(ErrorScenario::Timeout {
            operation: SET_STATE,
        }));
        let port = PortId::from(1u8);

        let err = pdu.set_state(&port, PowerState::On).unwrap_err();
        assert_eq!(err.kind, DriverErrorKind::Timeout);
        assert_eq!(err.driver_type, "mock");
        assert_eq!(pdu.commands().len(), 1);
        assert_eq!(pdu.reported_state(1), PowerState::Off);
    }

    #[test]
    fn test_factory_config() {
        let config: toml::Value = toml::from_str(
            r#"
            initial_state = "ON"
            refuse_commands = true
            ports = ["a", "b"]
            "#,
        )
        .unwrap();

        assert!(MockPduFactory.validate(&config).is_ok());
        let driver = MockPduFactory.build(config).unwrap();
        let port = PortId::from(0u8);
        assert_eq!(driver.get_state(&port).unwrap(), PowerState::On);
        assert!(!driver.set_state(&port, PowerState::Off).unwrap());
    }

    #[test]
    fn test_factory_rejects_bad_rate() {
        let config: toml::Value = toml::from_str("failure_rate = 1.5").unwrap();
        let err = MockPduFactory.validate(&config).unwrap_err();
        assert!(err.to_string().contains("failure_rate"));
    }
}
