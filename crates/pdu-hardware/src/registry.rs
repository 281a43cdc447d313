//! Driver Registry
//!
//! Maps a driver name (the `driver` field of a PDU description) to the
//! [`DriverFactory`] that builds it. The built-in `dummy` driver is always
//! present so test and simulation setups work without vendor hardware.
//!
//! The registry is an explicit value handed to [`crate::Pdu::create_with`];
//! [`DriverRegistry::global`] provides the process-wide default instance that
//! vendor driver crates register into at startup.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use pdu_hardware::DriverRegistry;
//!
//! let registry = DriverRegistry::new();
//! registry.register_factory(Box::new(SnmpPduFactory));
//! registry.register_driver("relay", |config| Ok(Box::new(RelayBoard::open(config)?)));
//!
//! assert!(registry.supported().contains("dummy"));
//! ```

use crate::drivers::{DummyFactory, DUMMY_DRIVER};
use anyhow::Result;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use pdu_core::{DriverFactory, FactoryRegistry, PduDriver, PduError, PduResult};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Constructor signature accepted by [`DriverRegistry::register_driver`].
pub type DriverConstructor = dyn Fn(&toml::Value) -> Result<Box<dyn PduDriver>> + Send + Sync;

/// Introspection record for a registered factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactoryInfo {
    /// Name used in PDU descriptions
    pub driver_type: String,
    /// Human-readable name
    pub name: String,
}

// =============================================================================
// Closure-backed factory
// =============================================================================

struct FnFactory {
    driver_type: String,
    constructor: Box<DriverConstructor>,
}

impl DriverFactory for FnFactory {
    fn driver_type(&self) -> &str {
        &self.driver_type
    }

    fn name(&self) -> &str {
        &self.driver_type
    }

    fn validate(&self, _config: &toml::Value) -> Result<()> {
        Ok(())
    }

    fn build(&self, config: toml::Value) -> Result<Box<dyn PduDriver>> {
        (self.constructor)(&config)
    }
}

// =============================================================================
// Driver Registry
// =============================================================================

/// Table of driver factories keyed by driver name.
///
/// Registration takes `&self` and is safe to call concurrently.
pub struct DriverRegistry {
    factories: DashMap<String, Arc<dyn DriverFactory>>,
}

static GLOBAL_REGISTRY: Lazy<DriverRegistry> = Lazy::new(DriverRegistry::new);

impl DriverRegistry {
    /// Create a registry containing only the built-in `dummy` driver.
    pub fn new() -> Self {
        let factories: DashMap<String, Arc<dyn DriverFactory>> = DashMap::new();
        factories.insert(DUMMY_DRIVER.to_string(), Arc::new(DummyFactory));
        Self { factories }
    }

    /// Process-wide default registry.
    pub fn global() -> &'static DriverRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register a driver factory, returning the one it replaced, if any.
    pub fn register_factory(
        &self,
        factory: Box<dyn DriverFactory>,
    ) -> Option<Arc<dyn DriverFactory>> {
        let driver_type = factory.driver_type().to_string();
        tracing::info!(
            driver_type = %driver_type,
            name = %factory.name(),
            "Registering PDU driver factory"
        );
        let previous = self.factories.insert(driver_type.clone(), Arc::from(factory));
        if previous.is_some() {
            tracing::warn!(driver_type = %driver_type, "Replaced existing PDU driver factory");
        }
        previous
    }

    /// Register a plain constructor under `name`.
    pub fn register_driver<F>(
        &self,
        name: impl Into<String>,
        constructor: F,
    ) -> Option<Arc<dyn DriverFactory>>
    where
        F: Fn(&toml::Value) -> Result<Box<dyn PduDriver>> + Send + Sync + 'static,
    {
        self.register_factory(Box::new(FnFactory {
            driver_type: name.into(),
            constructor: Box::new(constructor),
        }))
    }

    /// Remove a factory. The built-in `dummy` driver cannot be removed.
    pub fn unregister_factory(&self, driver_type: &str) -> Option<Arc<dyn DriverFactory>> {
        if driver_type == DUMMY_DRIVER {
            tracing::warn!("Refusing to unregister the built-in dummy driver");
            return None;
        }
        self.factories
            .remove(driver_type)
            .map(|(_, factory)| factory)
    }

    /// Check if a driver name is registered.
    pub fn has_driver(&self, driver_type: &str) -> bool {
        self.factories.contains_key(driver_type)
    }

    /// All registered driver names, sorted.
    pub fn supported(&self) -> BTreeSet<String> {
        self.factories
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Get factory information for debugging/introspection.
    pub fn factory_info(&self, driver_type: &str) -> Option<FactoryInfo> {
        self.factories.get(driver_type).map(|entry| FactoryInfo {
            driver_type: entry.driver_type().to_string(),
            name: entry.name().to_string(),
        })
    }

    /// Validate `config` and build a driver. `None` if `driver_type` is unknown.
    pub fn resolve(
        &self,
        driver_type: &str,
        config: &toml::Value,
    ) -> Option<Result<Box<dyn PduDriver>>> {
        // Clone the Arc out so no map guard is held while the factory runs.
        let factory = self.factories.get(driver_type).map(|entry| entry.value().clone())?;
        Some(
            factory
                .validate(config)
                .and_then(|()| factory.build(config.clone())),
        )
    }

    /// [`resolve`](Self::resolve) with failures mapped to configuration errors.
    pub(crate) fn build_driver(
        &self,
        driver_type: &str,
        config: &toml::Value,
    ) -> PduResult<Box<dyn PduDriver>> {
        match self.resolve(driver_type, config) {
            Some(Ok(driver)) => Ok(driver),
            Some(Err(e)) => Err(PduError::Configuration(format!(
                "Driver '{}' rejected its configuration: {:#}",
                driver_type, e
            ))),
            None => Err(PduError::Configuration(format!(
                "Unknown PDU driver '{}'. Supported drivers: {:?}",
                driver_type,
                self.supported()
            ))),
        }
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.supported())
            .finish()
    }
}

impl FactoryRegistry for DriverRegistry {
    fn register_factory(&self, factory: Box<dyn DriverFactory>) {
        DriverRegistry::register_factory(self, factory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::DummyDriver;
    use pdu_core::{PortId, PowerState};

    fn empty_config() -> toml::Value {
        toml::Value::Table(toml::map::Map::new())
    }

    #[test]
    fn test_new_registry_has_dummy() {
        let registry = DriverRegistry::new();
        assert!(registry.has_driver("dummy"));
        assert_eq!(
            registry.supported().into_iter().collect::<Vec<_>>(),
            vec!["dummy".to_string()]
        );
    }

    #[test]
    fn test_global_registry_has_dummy() {
        assert!(DriverRegistry::global().supported().contains("dummy"));
    }

    #[test]
    fn test_register_driver_closure() {
        let registry = DriverRegistry::new();
        assert!(registry
            .register_driver("always_on", |_config| Ok(Box::new(DummyDriver)))
            .is_none());

        let driver = registry
            .resolve("always_on", &empty_config())
            .expect("registered")
            .unwrap();
        assert_eq!(
            driver.get_state(&PortId::from(1u8)).unwrap(),
            PowerState::On
        );
        assert_eq!(
            registry.factory_info("always_on"),
            Some(FactoryInfo {
                driver_type: "always_on".into(),
                name: "always_on".into(),
            })
        );
    }

    #[test]
    fn test_register_driver_with_runtime_name() {
        let registry = DriverRegistry::new();
        let names: Vec<String> = (1..=2).map(|n| format!("relay-{}", n)).collect();
        for name in &names {
            registry.register_driver(name.clone(), |_| Ok(Box::new(DummyDriver)));
        }

        assert!(registry.has_driver("relay-1"));
        assert!(registry.has_driver("relay-2"));
        assert_eq!(
            registry.factory_info("relay-2").map(|info| info.driver_type),
            Some("relay-2".to_string())
        );
        assert!(registry.resolve("relay-1", &empty_config()).is_some());
    }

    #[test]
    fn test_register_replaces_previous() {
        let registry = DriverRegistry::new();
        registry.register_driver("relay", |_| Ok(Box::new(DummyDriver)));
        let previous = registry.register_driver("relay", |_| Ok(Box::new(DummyDriver)));
        assert!(previous.is_some());
        assert_eq!(registry.supported().len(), 2);
    }

    #[test]
    fn test_unregister_refuses_dummy() {
        let registry = DriverRegistry::new();
        registry.register_driver("relay", |_| Ok(Box::new(DummyDriver)));

        assert!(registry.unregister_factory("dummy").is_none());
        assert!(registry.has_driver("dummy"));

        assert!(registry.unregister_factory("relay").is_some());
        assert!(!registry.has_driver("relay"));
        assert!(registry.unregister_factory("relay").is_none());
    }

    #[test]
    fn test_resolve_unknown_is_none() {
        let registry = DriverRegistry::new();
        assert!(registry.resolve("not-a-real-driver", &empty_config()).is_none());
    }

    #[test]
    fn test_build_driver_errors_are_configuration() {
        let registry = DriverRegistry::new();
        registry.register_driver("broken", |_| anyhow::bail!("missing 'hostname' field"));

        let err = registry
            .build_driver("broken", &empty_config())
            .err()
            .unwrap();
        assert!(matches!(err, PduError::Configuration(_)));
        assert!(err.to_string().contains("missing 'hostname' field"));

        let err = registry
            .build_driver("nope", &empty_config())
            .err()
            .unwrap();
        assert!(err.to_string().contains("Unknown PDU driver 'nope'"));
        assert!(err.to_string().contains("dummy"));
    }
}
