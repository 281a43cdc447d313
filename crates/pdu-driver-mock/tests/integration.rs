//! Integration tests for the mock PDU driver through its public API.

use parking_lot::Mutex;
use pdu_core::{DriverErrorKind, DriverFactory, FactoryRegistry, PduDriver, PortId, PowerState};
use pdu_driver_mock::*;
use std::sync::Arc;

#[derive(Default)]
struct CollectingRegistry {
    driver_types: Mutex<Vec<String>>,
}

impl FactoryRegistry for CollectingRegistry {
    fn register_factory(&self, factory: Box<dyn DriverFactory>) {
        self.driver_types.lock().push(factory.driver_type().to_string());
    }
}

/// register_all exposes the mock factory under its driver name
#[test]
fn test_register_all() {
    let registry = CollectingRegistry::default();
    register_all(&registry);
    assert_eq!(*registry.driver_types.lock(), vec![MOCK_DRIVER.to_string()]);
}

/// A driver built by the factory behaves like MockPdu
#[test]
fn test_factory_built_driver() {
    let config: toml::Value = toml::from_str("seed = 7\nfailure_rate = 0.0").unwrap();
    let driver = MockPduFactory.build(config).unwrap();

    let port = PortId::from(5u8);
    assert_eq!(driver.get_state(&port).unwrap(), PowerState::Off);
    assert!(driver.set_state(&port, PowerState::Reboot).unwrap());
    assert_eq!(driver.get_state(&port).unwrap(), PowerState::On);
}

/// Scenarios combine: a faulty outlet fails while others work until the link drops
#[test]
fn test_combined_scenarios() {
    let errors = ErrorConfig::scenarios(vec![
        ErrorScenario::OutletFault {
            port: PortId::from(2u8),
        },
        ErrorScenario::FailAfterN {
            operation: "set_state",
            count: 2,
        },
    ]);
    let pdu = MockPdu::new().with_error_config(errors.clone());

    let healthy = PortId::from(1u8);
    let faulty = PortId::from(2u8);

    assert!(pdu.set_state(&healthy, PowerState::On).unwrap());
    assert_eq!(
        pdu.get_state(&faulty).unwrap_err().kind,
        DriverErrorKind::Hardware
    );
    assert!(pdu.set_state(&healthy, PowerState::Off).unwrap());
    assert!(pdu.set_state(&healthy, PowerState::On).is_err());

    errors.reset();
    assert!(pdu.set_state(&healthy, PowerState::On).unwrap());
}

/// Shared behind an Arc the driver is usable from several threads
#[test]
fn test_shared_across_threads() {
    let pdu = Arc::new(MockPdu::new());

    let handles: Vec<_> = (0..4u8)
        .map(|i| {
            let pdu = pdu.clone();
            std::thread::spawn(move || {
                pdu.set_state(&PortId::from(i), PowerState::On).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(pdu.commands().len(), 4);
    for i in 0..4u8 {
        assert_eq!(pdu.reported_state(i), PowerState::On);
    }
}
