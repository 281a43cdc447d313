//! Power distribution units.
//!
//! A [`Pdu`] aggregates one physical power strip: its driver, its outlets
//! ([`PduPort`]) and the set of reserved outlets that automation must never
//! switch. Reserved outlets always read as `On` and silently ignore commands.
//!
//! ```rust,ignore
//! use pdu_hardware::Pdu;
//! use pdu_core::PowerState;
//!
//! let config: toml::Value = toml::from_str(r#"ports = ["switch", "dut-1"]"#)?;
//! let mut pdu = Pdu::create("dummy", "rack-a", config, [0])?;
//!
//! let port = pdu.port_mut(1).expect("configured");
//! port.set(PowerState::Off)?;
//! port.set(PowerState::On)?; // waits out the minimum off time first
//! ```

use crate::config::schema::{empty_table, resolve_ports, seconds_value};
use crate::port::{PduPort, PortSnapshot};
use crate::registry::DriverRegistry;
use parking_lot::RwLock;
use pdu_core::{Clock, PduDriver, PduError, PduResult, PortId, PowerState, SystemClock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Command outcome
// =============================================================================

/// What happened to a commanded state change.
///
/// [`Pdu::set_port_state`] collapses this to the boolean "did the driver
/// report success"; callers that need to tell a reserved no-op from a driver
/// refusal use [`Pdu::apply_port_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOutcome {
    /// Driver accepted the command
    Applied,
    /// Driver returned `false`
    Refused,
    /// Port is reserved; driver not contacted
    Ignored,
    /// PDU has no driver bound; nothing to contact
    NoDriver,
}

impl SetOutcome {
    /// The boolean success indicator of the plain driver contract.
    pub fn succeeded(self) -> bool {
        matches!(self, SetOutcome::Applied)
    }

    /// `true` if the command was forwarded to a driver.
    pub fn reached_driver(self) -> bool {
        matches!(self, SetOutcome::Applied | SetOutcome::Refused)
    }
}

// =============================================================================
// Shared state (PDU <-> ports)
// =============================================================================

/// State shared between a [`Pdu`] and every port it hands out.
pub(crate) struct PduShared {
    name: String,
    driver_type: Option<String>,
    driver: Option<Box<dyn PduDriver>>,
    reserved: RwLock<BTreeSet<PortId>>,
    clock: RwLock<Arc<dyn Clock>>,
}

impl PduShared {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn clock(&self) -> Arc<dyn Clock> {
        self.clock.read().clone()
    }

    pub(crate) fn is_reserved(&self, port_id: &PortId) -> bool {
        self.reserved.read().contains(port_id)
    }

    pub(crate) fn get_port_state(&self, port_id: &PortId) -> PduResult<PowerState> {
        if self.is_reserved(port_id) {
            return Ok(PowerState::On);
        }
        match &self.driver {
            Some(driver) => Ok(driver.get_state(port_id)?),
            None => Ok(PowerState::Unknown),
        }
    }

    pub(crate) fn apply_port_state(
        &self,
        port_id: &PortId,
        state: PowerState,
    ) -> PduResult<SetOutcome> {
        if !state.is_valid_action() {
            return Err(PduError::InvalidAction(state));
        }
        if self.is_reserved(port_id) {
            tracing::debug!(pdu = %self.name, port = %port_id, %state, "Ignoring command for reserved port");
            return Ok(SetOutcome::Ignored);
        }
        let Some(driver) = &self.driver else {
            return Ok(SetOutcome::NoDriver);
        };
        if driver.set_state(port_id, state)? {
            Ok(SetOutcome::Applied)
        } else {
            Ok(SetOutcome::Refused)
        }
    }
}

// =============================================================================
// Pdu
// =============================================================================

/// One physical power strip.
pub struct Pdu {
    shared: Arc<PduShared>,
    config: toml::Value,
    ports: Vec<PduPort>,
    default_min_off_time: Duration,
}

impl Pdu {
    /// Minimum off time applied to ports built from configuration.
    pub const DEFAULT_MIN_OFF_TIME: Duration = Duration::from_secs(30);

    /// Build a PDU whose driver is resolved against [`DriverRegistry::global`].
    pub fn create<I, P>(
        driver_name: &str,
        name: impl Into<String>,
        config: toml::Value,
        reserved_port_ids: I,
    ) -> PduResult<Pdu>
    where
        I: IntoIterator<Item = P>,
        P: Into<PortId>,
    {
        Self::create_with(
            DriverRegistry::global(),
            driver_name,
            name,
            config,
            reserved_port_ids,
        )
    }

    /// Build a PDU whose driver is resolved against `registry`.
    ///
    /// Fails with [`PduError::Configuration`] when `driver_name` is not
    /// registered, the factory rejects `config`, or the `ports` list is
    /// malformed.
    pub fn create_with<I, P>(
        registry: &DriverRegistry,
        driver_name: &str,
        name: impl Into<String>,
        config: toml::Value,
        reserved_port_ids: I,
    ) -> PduResult<Pdu>
    where
        I: IntoIterator<Item = P>,
        P: Into<PortId>,
    {
        let name = name.into();
        let driver = registry
            .build_driver(driver_name, &config)
            .map_err(|e| match e {
                PduError::Configuration(msg) => {
                    PduError::Configuration(format!("PDU '{}': {}", name, msg))
                }
                other => other,
            })?;
        let pdu = Self::assemble(
            name,
            Some(driver_name.to_string()),
            Some(driver),
            config,
            reserved_port_ids,
        )?;
        tracing::info!(
            pdu = %pdu.name(),
            driver = %driver_name,
            ports = pdu.ports.len(),
            reserved = ?pdu.reserved_port_ids(),
            "Created PDU"
        );
        Ok(pdu)
    }

    /// Build a PDU around an already constructed driver.
    pub fn from_driver<I, P>(
        name: impl Into<String>,
        driver: Box<dyn PduDriver>,
        config: toml::Value,
        reserved_port_ids: I,
    ) -> PduResult<Pdu>
    where
        I: IntoIterator<Item = P>,
        P: Into<PortId>,
    {
        Self::assemble(name.into(), None, Some(driver), config, reserved_port_ids)
    }

    /// A PDU with no driver and no ports: reads give `Unknown`, writes do nothing.
    pub fn without_driver(name: impl Into<String>) -> Pdu {
        Pdu {
            shared: Arc::new(PduShared {
                name: name.into(),
                driver_type: None,
                driver: None,
                reserved: RwLock::new(BTreeSet::new()),
                clock: RwLock::new(Arc::new(SystemClock)),
            }),
            config: empty_table(),
            ports: Vec::new(),
            default_min_off_time: Self::DEFAULT_MIN_OFF_TIME,
        }
    }

    fn assemble<I, P>(
        name: String,
        driver_type: Option<String>,
        driver: Option<Box<dyn PduDriver>>,
        config: toml::Value,
        reserved_port_ids: I,
    ) -> PduResult<Pdu>
    where
        I: IntoIterator<Item = P>,
        P: Into<PortId>,
    {
        let default_min_off_time = match config.get("min_off_time") {
            Some(value) => seconds_value(value, "min_off_time")?,
            None => Self::DEFAULT_MIN_OFF_TIME,
        };
        let specs = resolve_ports(&config)
            .map_err(|e| PduError::Configuration(format!("PDU '{}': {}", name, e)))?;

        let shared = Arc::new(PduShared {
            name,
            driver_type,
            driver,
            reserved: RwLock::new(reserved_port_ids.into_iter().map(Into::into).collect()),
            clock: RwLock::new(Arc::new(SystemClock)),
        });
        let ports = specs
            .into_iter()
            .map(|spec| {
                PduPort::attach(
                    shared.clone(),
                    spec.id,
                    spec.label,
                    spec.min_off_time.unwrap_or(default_min_off_time),
                )
            })
            .collect();

        Ok(Pdu {
            shared,
            config,
            ports,
            default_min_off_time,
        })
    }

    /// Replace the time source used by this PDU and all of its ports.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        self.set_clock(clock);
        self
    }

    /// Replace the time source in place.
    pub fn set_clock(&self, clock: Arc<dyn Clock>) {
        *self.shared.clock.write() = clock;
    }

    pub(crate) fn shared(&self) -> Arc<PduShared> {
        self.shared.clone()
    }

    /// PDU name.
    pub fn name(&self) -> &str {
        self.shared.name()
    }

    /// Registry name of the bound driver, when built through a registry.
    pub fn driver_type(&self) -> Option<&str> {
        self.shared.driver_type.as_deref()
    }

    /// `true` if a driver is bound.
    pub fn has_driver(&self) -> bool {
        self.shared.driver.is_some()
    }

    /// Driver-specific configuration this PDU was built from.
    pub fn config(&self) -> &toml::Value {
        &self.config
    }

    /// Minimum off time given to ports that do not override it.
    pub fn default_min_off_time(&self) -> Duration {
        self.default_min_off_time
    }

    // =========================================================================
    // Ports
    // =========================================================================

    /// All ports, in configuration order.
    pub fn ports(&self) -> &[PduPort] {
        &self.ports
    }

    /// Mutable access to all ports. Each port may be driven from its own thread.
    pub fn ports_mut(&mut self) -> impl Iterator<Item = &mut PduPort> {
        self.ports.iter_mut()
    }

    /// Look up a port by id.
    pub fn port(&self, port_id: impl Into<PortId>) -> Option<&PduPort> {
        let port_id = port_id.into();
        self.ports.iter().find(|p| *p.port_id() == port_id)
    }

    /// Look up a port by id for power operations.
    pub fn port_mut(&mut self, port_id: impl Into<PortId>) -> Option<&mut PduPort> {
        let port_id = port_id.into();
        self.ports.iter_mut().find(|p| *p.port_id() == port_id)
    }

    /// Remove a port from this PDU, handing ownership to the caller.
    ///
    /// The port keeps talking to this PDU's driver and reservation set.
    pub fn take_port(&mut self, port_id: impl Into<PortId>) -> Option<PduPort> {
        let port_id = port_id.into();
        let index = self.ports.iter().position(|p| *p.port_id() == port_id)?;
        Some(self.ports.remove(index))
    }

    /// Consume the PDU, returning its ports.
    pub fn into_ports(self) -> Vec<PduPort> {
        self.ports
    }

    // =========================================================================
    // Power operations
    // =========================================================================

    /// Current state of an outlet.
    ///
    /// Reserved outlets read `On` without consulting the driver; with no
    /// driver bound every outlet reads `Unknown`.
    pub fn get_port_state(&self, port_id: impl Into<PortId>) -> PduResult<PowerState> {
        self.shared.get_port_state(&port_id.into())
    }

    /// Command an outlet, returning the driver's success indicator.
    ///
    /// Reserved outlets and driverless PDUs return `Ok(false)` without error.
    pub fn set_port_state(
        &self,
        port_id: impl Into<PortId>,
        state: PowerState,
    ) -> PduResult<bool> {
        self.apply_port_state(port_id, state).map(SetOutcome::succeeded)
    }

    /// Command an outlet and report exactly what happened.
    pub fn apply_port_state(
        &self,
        port_id: impl Into<PortId>,
        state: PowerState,
    ) -> PduResult<SetOutcome> {
        self.shared.apply_port_state(&port_id.into(), state)
    }

    // =========================================================================
    // Reservation
    // =========================================================================

    /// Exclude an outlet from automated power management. Idempotent.
    pub fn reserve_port(&self, port_id: impl Into<PortId>) {
        let port_id = port_id.into();
        if self.shared.reserved.write().insert(port_id.clone()) {
            tracing::info!(pdu = %self.name(), port = %port_id, "Reserved port");
        }
    }

    /// Return an outlet to automated power management. Idempotent.
    pub fn unreserve_port(&self, port_id: impl Into<PortId>) {
        let port_id = port_id.into();
        if self.shared.reserved.write().remove(&port_id) {
            tracing::info!(pdu = %self.name(), port = %port_id, "Unreserved port");
        }
    }

    /// `true` if the outlet is reserved.
    pub fn is_reserved(&self, port_id: impl Into<PortId>) -> bool {
        self.shared.is_reserved(&port_id.into())
    }

    /// Currently reserved outlet ids, sorted.
    pub fn reserved_port_ids(&self) -> BTreeSet<PortId> {
        self.shared.reserved.read().clone()
    }

    /// Serializable view of the PDU and its ports.
    pub fn snapshot(&self) -> PduSnapshot {
        PduSnapshot {
            name: self.name().to_string(),
            driver: self.driver_type().map(str::to_string),
            ports: self.ports.iter().map(PduPort::snapshot).collect(),
            reserved_port_ids: self.reserved_port_ids().into_iter().collect(),
        }
    }
}

impl fmt::Debug for Pdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pdu")
            .field("name", &self.name())
            .field("driver", &self.driver_type())
            .field("has_driver", &self.has_driver())
            .field("ports", &self.ports)
            .field("reserved_port_ids", &self.reserved_port_ids())
            .field("default_min_off_time", &self.default_min_off_time)
            .finish()
    }
}

/// Names of all drivers in the global registry.
pub fn supported_pdus() -> BTreeSet<String> {
    DriverRegistry::global().supported()
}

/// Serializable view of a [`Pdu`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PduSnapshot {
    /// PDU name
    pub name: String,
    /// Registry driver name
    pub driver: Option<String>,
    /// Ports in configuration order
    pub ports: Vec<PortSnapshot>,
    /// Reserved outlet ids
    pub reserved_port_ids: Vec<PortId>,
}
