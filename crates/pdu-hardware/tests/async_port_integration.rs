//! Driving ports from tokio tasks.

use pdu_driver_mock::MockPdu;
use pdu_hardware::{AsyncPduPort, Pdu, PduError, PduPort, PortId, PowerState, SetOutcome};
use std::sync::Arc;
use std::time::Duration;

fn bench(min_off_time: Duration) -> (Arc<MockPdu>, AsyncPduPort) {
    let driver = Arc::new(MockPdu::new());
    let pdu = Pdu::from_driver(
        "bench",
        Box::new(driver.clone()),
        toml::Value::Table(Default::default()),
        Vec::<PortId>::new(),
    )
    .unwrap();
    let port = PduPort::new(&pdu, 1, "dut").with_min_off_time(min_off_time);
    (driver, AsyncPduPort::new(port))
}

#[tokio::test]
async fn test_state_and_set() {
    let (driver, port) = bench(Duration::ZERO);

    assert_eq!(port.state().await.unwrap(), PowerState::Off);
    assert_eq!(port.set(PowerState::On).await.unwrap(), SetOutcome::Applied);
    assert_eq!(port.state().await.unwrap(), PowerState::On);
    assert_eq!(driver.commands().len(), 1);
    assert_eq!(port.snapshot().state, PowerState::On);
}

#[tokio::test]
async fn test_set_with_timeout_expires_during_debounce() {
    let (driver, port) = bench(Duration::from_millis(500));

    port.set(PowerState::Off).await.unwrap();
    let err = port
        .set_with_timeout(PowerState::On, Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(matches!(err, PduError::Timeout(t) if t == Duration::from_millis(20)));

    // The blocking command is not cancelled; it lands once the wait is over.
    let outcome = port.set(PowerState::On).await.unwrap();
    assert_eq!(outcome, SetOutcome::Applied);
    assert_eq!(
        driver.commands(),
        vec![
            (PortId::from(1u8), PowerState::Off),
            (PortId::from(1u8), PowerState::On),
            (PortId::from(1u8), PowerState::On),
        ]
    );
}

#[tokio::test]
async fn test_set_with_timeout_succeeds_without_debounce() {
    let (_driver, port) = bench(Duration::from_millis(500));
    let outcome = port
        .set_with_timeout(PowerState::On, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(outcome, SetOutcome::Applied);
}

#[tokio::test]
async fn test_invalid_action_through_async_wrapper() {
    let (_driver, port) = bench(Duration::ZERO);
    let err = port.set(PowerState::Unknown).await.unwrap_err();
    assert!(matches!(err, PduError::InvalidAction(PowerState::Unknown)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_clones_share_one_port() {
    let (driver, port) = bench(Duration::ZERO);
    let other = port.clone();

    let (a, b) = tokio::join!(port.set(PowerState::On), other.set(PowerState::Off));
    assert!(a.unwrap().succeeded());
    assert!(b.unwrap().succeeded());
    assert_eq!(driver.commands().len(), 2);

    drop(other);
    let inner = port.into_inner().unwrap();
    assert_eq!(inner.port_id(), &PortId::from(1u8));
}
