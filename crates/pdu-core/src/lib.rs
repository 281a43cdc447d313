//! `pdu-core`
//!
//! Core types and traits for power distribution unit (PDU) port control.
//!
//! This crate holds the pieces shared by the PDU layer and every vendor driver:
//!
//! - [`PowerState`]: the closed set of states an outlet reports or is commanded into
//! - [`PortId`]: normalized outlet identifier (string or integer in config)
//! - [`PduDriver`] / [`DriverFactory`]: the boundary to vendor hardware
//! - [`Clock`]: injectable time source used by the debounce logic
//! - [`PduError`] / [`DriverError`]: error taxonomy
//!
//! Concrete PDUs and the driver registry live in `pdu-hardware`.

pub mod clock;
pub mod driver;
pub mod error;
pub mod port_id;
pub mod power_state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use driver::{DriverFactory, FactoryRegistry, PduDriver};
pub use error::{DriverError, DriverErrorKind, PduError, PduResult};
pub use port_id::PortId;
pub use power_state::{ParsePowerStateError, PowerState};
