//! Inventory loading.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pdu_hardware::config::load_inventory;
//! use pdu_hardware::DriverRegistry;
//! use std::path::Path;
//!
//! let inventory = load_inventory(Path::new("config/pdus.toml"))?;
//! let pdus = inventory.build(DriverRegistry::global())?;
//! ```
//!
//! Environment variables prefixed with `PDU_` override file values; nested
//! keys are separated by `__` (`PDU_PDUS__BENCH__DRIVER=mock`). Keys are
//! lowercased and cannot contain `-`, so only PDUs whose names are lowercase
//! letters, digits and `_` can be overridden this way.

use super::schema::{Inventory, PduConfig};
use crate::pdu::Pdu;
use crate::registry::DriverRegistry;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use pdu_core::{PduError, PduResult};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Prefix of environment variables that override inventory values.
pub const ENV_PREFIX: &str = "PDU_";

/// Load an inventory file, applying `PDU_` environment overrides.
pub fn load_inventory(path: &Path) -> PduResult<Inventory> {
    if !path.exists() {
        return Err(PduError::Configuration(format!(
            "Inventory file not found: {}",
            path.display()
        )));
    }

    debug!("Loading PDU inventory from: {}", path.display());

    let inventory: Inventory = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| {
            PduError::Configuration(format!(
                "Failed to parse inventory file {}: {}",
                path.display(),
                e
            ))
        })?;

    info!(
        "Loaded {} PDU descriptions from {}",
        inventory.pdus.len(),
        path.display()
    );
    Ok(inventory)
}

impl Inventory {
    /// Parse an inventory from TOML text. No environment overrides apply.
    pub fn from_toml_str(text: &str) -> PduResult<Inventory> {
        toml::from_str(text)
            .map_err(|e| PduError::Configuration(format!("Failed to parse inventory: {}", e)))
    }

    /// Create every PDU in the inventory, stopping at the first failure.
    pub fn build(&self, registry: &DriverRegistry) -> PduResult<BTreeMap<String, Pdu>> {
        self.pdus
            .iter()
            .map(|(name, config)| Ok((name.clone(), Self::build_pdu(registry, name, config)?)))
            .collect()
    }

    /// Create a single PDU from its description.
    pub fn build_pdu(registry: &DriverRegistry, name: &str, config: &PduConfig) -> PduResult<Pdu> {
        Pdu::create_with(
            registry,
            &config.driver,
            name,
            config.config.clone(),
            config.reserved_port_ids.iter().cloned(),
        )
    }
}
