//! `pdu-hardware`
//!
//! Power distribution unit control on top of the driver boundary defined in
//! `pdu-core`.
//!
//! # Modules
//!
//! - [`pdu`]: [`Pdu`], one power strip with its driver and reserved outlets
//! - [`port`]: [`PduPort`], one outlet with minimum-off-time debounce
//! - [`registry`]: [`DriverRegistry`], driver name to factory lookup
//! - [`drivers`]: built-in drivers (`dummy`)
//! - [`config`]: inventory files
//! - [`async_port`]: [`AsyncPduPort`] for use from tokio tasks
//!
//! # Example
//!
//! ```rust,ignore
//! use pdu_hardware::{config::load_inventory, DriverRegistry};
//! use pdu_core::PowerState;
//!
//! let mut pdus = load_inventory("pdus.toml".as_ref())?.build(DriverRegistry::global())?;
//! let rack = pdus.get_mut("rack-a").expect("configured");
//! rack.port_mut("7").expect("configured").set(PowerState::Reboot)?;
//! ```

pub mod async_port;
pub mod config;
pub mod drivers;
pub mod pdu;
pub mod port;
pub mod registry;

pub use async_port::AsyncPduPort;
pub use config::{load_inventory, Inventory, PduConfig};
pub use pdu::{supported_pdus, Pdu, PduSnapshot, SetOutcome};
pub use port::{PduPort, PortSnapshot};
pub use registry::{DriverConstructor, DriverRegistry, FactoryInfo};

pub use pdu_core::{PduError, PduResult, PortId, PowerState};
