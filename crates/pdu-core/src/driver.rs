//! Driver Boundary and Factory Types
//!
//! Vendor integrations (SNMP power strips, HTTP relay boards, serial switches)
//! implement [`PduDriver`] and expose a [`DriverFactory`] that the registry in
//! `pdu-hardware` uses to build drivers by name.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Composition Root                        │
//! │  registry.register_factory(Box::new(SnmpPduFactory));          │
//! │  registry.register_factory(Box::new(RelayBoardFactory));       │
//! └─────────────────────────────────────────────────────────────────┘
//!                                   │
//!                                   ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        DriverRegistry                           │
//! │  factories: DashMap<driver_type, Arc<dyn DriverFactory>>       │
//! └─────────────────────────────────────────────────────────────────┘
//!                                   │
//!                                   ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    DriverFactory::build()                       │
//! │  Parses TOML config, returns Box<dyn PduDriver>                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example: Implementing a Driver Factory
//!
//! ```rust,ignore
//! use pdu_core::{DriverFactory, PduDriver};
//!
//! pub struct SnmpPduFactory;
//!
//! impl DriverFactory for SnmpPduFactory {
//!     fn driver_type(&self) -> &str { "snmp" }
//!     fn name(&self) -> &str { "Generic SNMP PDU" }
//!
//!     fn validate(&self, config: &toml::Value) -> anyhow::Result<()> {
//!         if config.get("hostname").and_then(|v| v.as_str()).is_none() {
//!             anyhow::bail!("missing 'hostname' field");
//!         }
//!         Ok(())
//!     }
//!
//!     fn build(&self, config: toml::Value) -> anyhow::Result<Box<dyn PduDriver>> {
//!         Ok(Box::new(SnmpPdu::connect(&config)?))
//!     }
//! }
//! ```

use crate::error::DriverError;
use crate::port_id::PortId;
use crate::power_state::PowerState;
use anyhow::Result;

// =============================================================================
// Driver Trait
// =============================================================================

/// Capability interface to one physical PDU.
///
/// The PDU layer depends on exactly these two operations. Retry and timeout
/// behavior is the driver's own business; a call either returns or fails with
/// a [`DriverError`] that is handed back to the caller unchanged.
///
/// `set_state` is only ever called with a state for which
/// [`PowerState::is_valid_action`] holds.
pub trait PduDriver: Send + Sync {
    /// Read the current state of an outlet.
    ///
    /// Returning `Unknown` is legitimate and means the hardware did not answer
    /// conclusively.
    fn get_state(&self, port_id: &PortId) -> Result<PowerState, DriverError>;

    /// Command an outlet. Returns the driver's success indicator.
    fn set_state(&self, port_id: &PortId, state: PowerState) -> Result<bool, DriverError>;
}

impl<T: PduDriver + ?Sized> PduDriver for std::sync::Arc<T> {
    fn get_state(&self, port_id: &PortId) -> Result<PowerState, DriverError> {
        (**self).get_state(port_id)
    }

    fn set_state(&self, port_id: &PortId, state: PowerState) -> Result<bool, DriverError> {
        (**self).set_state(port_id, state)
    }
}

// =============================================================================
// Driver Factory Trait
// =============================================================================

/// Trait for factories that create driver instances.
///
/// Each vendor driver implements this trait to register itself with the
/// `DriverRegistry`. The factory is responsible for:
///
/// 1. Declaring the driver name used in PDU descriptions (`driver = "..."`)
/// 2. Validating configuration before instantiation
/// 3. Creating the driver
///
/// # Lifetime
///
/// Factories are registered once at startup and live for the program's
/// lifetime. They must be `Send + Sync + 'static` because they may be called
/// from any thread.
pub trait DriverFactory: Send + Sync + 'static {
    /// Driver name matched against the PDU description's `driver` field.
    fn driver_type(&self) -> &str;

    /// Human-readable name for documentation and error messages.
    fn name(&self) -> &str;

    /// Validate configuration without instantiating.
    ///
    /// Called before `build()` to give early, descriptive feedback.
    fn validate(&self, config: &toml::Value) -> Result<()>;

    /// Instantiate the driver from its (already validated) configuration.
    fn build(&self, config: toml::Value) -> Result<Box<dyn PduDriver>>;
}

/// Trait for registries that can accept driver factories.
///
/// Lets driver crates offer a `register_all` helper without depending on the
/// crate that owns the concrete registry.
pub trait FactoryRegistry {
    /// Register a driver factory.
    fn register_factory(&self, factory: Box<dyn DriverFactory>);
}
