//! Async access to a port.
//!
//! [`PduPort`] blocks its caller while waiting out the minimum off time.
//! [`AsyncPduPort`] moves each call onto tokio's blocking pool and lets the
//! caller bound how long it is willing to wait.
//!
//! ```rust,ignore
//! let port = AsyncPduPort::new(pdu.take_port(3).expect("configured"));
//! port.set(PowerState::Off).await?;
//! match port.set_with_timeout(PowerState::On, Duration::from_secs(2)).await {
//!     Err(PduError::Timeout(_)) => { /* still debouncing, command continues in background */ }
//!     other => { other?; }
//! }
//! ```

use crate::pdu::SetOutcome;
use crate::port::{PduPort, PortSnapshot};
use parking_lot::Mutex;
use pdu_core::{PduError, PduResult, PowerState};
use std::sync::Arc;
use std::time::Duration;

/// A [`PduPort`] that can be shared between tasks.
///
/// Calls are serialized by a mutex, so one port still has a single writer.
#[derive(Clone)]
pub struct AsyncPduPort {
    inner: Arc<Mutex<PduPort>>,
}

impl AsyncPduPort {
    /// Wrap an owned port.
    pub fn new(port: PduPort) -> Self {
        Self {
            inner: Arc::new(Mutex::new(port)),
        }
    }

    /// Read the outlet state.
    pub async fn state(&self) -> PduResult<PowerState> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let mut port = inner.lock();
            port.state()
        })
        .await
        .map_err(|e| PduError::Join(e.to_string()))?
    }

    /// Command the outlet, waiting as long as the debounce requires.
    pub async fn set(&self, desired: PowerState) -> PduResult<SetOutcome> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let mut port = inner.lock();
            port.set(desired)
        })
        .await
        .map_err(|e| PduError::Join(e.to_string()))?
    }

    /// Command the outlet, giving up after `timeout`.
    ///
    /// On timeout the blocking call is not cancelled: the command is still
    /// delivered once the debounce wait ends, and the port stays locked
    /// until then.
    pub async fn set_with_timeout(
        &self,
        desired: PowerState,
        timeout: Duration,
    ) -> PduResult<SetOutcome> {
        match tokio::time::timeout(timeout, self.set(desired)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(state = %desired, ?timeout, "Timed out waiting for port command");
                Err(PduError::Timeout(timeout))
            }
        }
    }

    /// Serializable view of the port. Blocks while a command is in flight.
    pub fn snapshot(&self) -> PortSnapshot {
        self.inner.lock().snapshot()
    }

    /// Recover the port if this is the last handle.
    pub fn into_inner(self) -> Result<PduPort, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl From<PduPort> for AsyncPduPort {
    fn from(port: PduPort) -> Self {
        Self::new(port)
    }
}

impl std::fmt::Debug for AsyncPduPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_lock() {
            Some(port) => f.debug_tuple("AsyncPduPort").field(&*port).finish(),
            None => f.write_str("AsyncPduPort(<busy>)"),
        }
    }
}
