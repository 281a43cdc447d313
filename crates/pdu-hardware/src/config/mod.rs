//! PDU inventory configuration.
//!
//! An inventory file describes every PDU an executor controls:
//!
//! ```toml
//! [pdus.rack-a]
//! driver = "dummy"
//! reserved_port_ids = [0, "uplink"]
//!
//! [pdus.rack-a.config]
//! min_off_time = 10.0
//! ports = ["switch", "dut-1", { id = "7", label = "dut-7", min_off_time = 3.0 }]
//! ```
//!
//! - **Schema** ([`schema`]) - serde types for the file and for `config.ports`
//! - **Loader** ([`loader`]) - figment-based loading with environment overrides
//!
//! Everything under `config` except `ports` and `min_off_time` is opaque to
//! this crate and handed to the driver factory as-is.

pub mod loader;
pub mod schema;

pub use loader::{load_inventory, ENV_PREFIX};
pub use schema::{Inventory, PduConfig, PortSpec};
