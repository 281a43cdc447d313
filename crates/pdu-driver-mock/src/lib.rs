//! Mock PDU driver
//!
//! Simulated power distribution unit for exercising the PDU layer without
//! hardware.
//!
//! - [`MockPdu`] - in-memory outlets, call log, scripted reported states
//! - [`ErrorConfig`] - random and scripted failures (`FailAfterN`, `Timeout`,
//!   `CommunicationLoss`, `OutletFault`)
//!
//! # Driver Factory Pattern
//!
//! ```rust,ignore
//! use pdu_driver_mock::register_all;
//! use pdu_hardware::{DriverRegistry, Pdu};
//!
//! let registry = DriverRegistry::new();
//! register_all(&registry);
//!
//! let config = toml::toml! { initial_state = "ON" ports = ["a", "b"] };
//! let pdu = Pdu::create_with(&registry, "mock", "bench", config.into(), [0])?;
//! ```

pub mod common;
mod mock_pdu;

pub use common::{ErrorConfig, ErrorScenario, MockRng};
pub use mock_pdu::{MockCall, MockPdu, MockPduConfig, MockPduFactory, MOCK_DRIVER};

use pdu_core::FactoryRegistry;

/// Register every mock driver factory with `registry`.
///
/// # Example
///
/// ```rust,ignore
/// let registry = pdu_hardware::DriverRegistry::new();
/// pdu_driver_mock::register_all(&registry);
/// assert!(registry.has_driver("mock"));
/// ```
pub fn register_all(registry: &impl FactoryRegistry) {
    registry.register_factory(Box::new(MockPduFactory));
}
