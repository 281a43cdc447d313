//! No-op PDU driver.
//!
//! Reports every outlet as `On` and accepts every command. Used for dry runs
//! and for exercising the port/debounce logic without vendor hardware.

use anyhow::Result;
use pdu_core::{DriverError, DriverFactory, PduDriver, PortId, PowerState};

/// Registry name of the built-in driver.
pub const DUMMY_DRIVER: &str = "dummy";

/// Driver that always answers `On` and always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyDriver;

impl PduDriver for DummyDriver {
    fn get_state(&self, _port_id: &PortId) -> Result<PowerState, DriverError> {
        Ok(PowerState::On)
    }

    fn set_state(&self, port_id: &PortId, state: PowerState) -> Result<bool, DriverError> {
        tracing::trace!(port = %port_id, %state, "dummy driver accepted command");
        Ok(true)
    }
}

/// Factory for [`DummyDriver`]. Accepts any configuration.
pub struct DummyFactory;

impl DriverFactory for DummyFactory {
    fn driver_type(&self) -> &str {
        DUMMY_DRIVER
    }

    fn name(&self) -> &str {
        "Dummy PDU"
    }

    fn validate(&self, _config: &toml::Value) -> Result<()> {
        Ok(())
    }

    fn build(&self, _config: toml::Value) -> Result<Box<dyn PduDriver>> {
        Ok(Box::new(DummyDriver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_always_on() {
        let driver = DummyDriver;
        for id in ["0", "1", "uplink"] {
            assert_eq!(
                driver.get_state(&PortId::from(id)).unwrap(),
                PowerState::On
            );
        }
    }

    #[test]
    fn test_dummy_accepts_every_action() {
        let driver = DummyDriver;
        for &state in PowerState::valid_actions() {
            assert!(driver.set_state(&PortId::from(3u8), state).unwrap());
        }
    }

    #[test]
    fn test_factory_builds_from_any_config() {
        let factory = DummyFactory;
        let config = toml::Value::Table(toml::map::Map::new());
        assert!(factory.validate(&config).is_ok());
        let driver = factory.build(config).unwrap();
        assert_eq!(
            driver.get_state(&PortId::from(1u8)).unwrap(),
            PowerState::On
        );
    }
}
