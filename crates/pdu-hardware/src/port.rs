//! A single switchable outlet.
//!
//! [`PduPort`] adds runtime bookkeeping on top of its [`Pdu`](crate::Pdu):
//! the last observed state, when the outlet last went off, and the minimum
//! off time enforced before it may be powered back on.
//!
//! Power operations take `&mut self`, so one port has at most one caller
//! mutating it at a time. Different ports of the same PDU can be driven
//! concurrently.

use crate::pdu::{Pdu, PduShared, SetOutcome};
use chrono::{DateTime, Utc};
use pdu_core::{PduError, PduResult, PortId, PowerState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// One physical outlet on a [`Pdu`].
pub struct PduPort {
    pdu: Arc<PduShared>,
    port_id: PortId,
    label: String,
    min_off_time: Duration,
    last_known_state: PowerState,
    last_shutdown: Option<DateTime<Utc>>,
    /// Monotonic reading taken with `last_shutdown`
    shutdown_mark: Option<Duration>,
    last_polled: Option<DateTime<Utc>>,
}

impl PduPort {
    /// Minimum off time of a port constructed directly with [`PduPort::new`].
    pub const DEFAULT_MIN_OFF_TIME: Duration = Duration::from_secs(5);

    /// Create a port on `pdu`.
    ///
    /// The port is not added to `pdu.ports()`; it shares the PDU's driver,
    /// clock and reservation set.
    pub fn new(pdu: &Pdu, port_id: impl Into<PortId>, label: impl Into<String>) -> Self {
        Self::attach(
            pdu.shared(),
            port_id.into(),
            label.into(),
            Self::DEFAULT_MIN_OFF_TIME,
        )
    }

    pub(crate) fn attach(
        pdu: Arc<PduShared>,
        port_id: PortId,
        label: String,
        min_off_time: Duration,
    ) -> Self {
        Self {
            pdu,
            port_id,
            label,
            min_off_time,
            last_known_state: PowerState::Unknown,
            last_shutdown: None,
            shutdown_mark: None,
            last_polled: None,
        }
    }

    /// Builder: override the minimum off time.
    pub fn with_min_off_time(mut self, min_off_time: Duration) -> Self {
        self.min_off_time = min_off_time;
        self
    }

    /// Change the minimum off time of a live port.
    ///
    /// Applies from the next [`set`](Self::set), including to an off period
    /// already in progress.
    pub fn set_min_off_time(&mut self, min_off_time: Duration) {
        self.min_off_time = min_off_time;
    }

    /// Read the outlet state from the PDU and record it.
    ///
    /// Never sleeps.
    pub fn state(&mut self) -> PduResult<PowerState> {
        let state = self.pdu.get_port_state(&self.port_id)?;
        let stamp = self.stamp();
        self.last_polled = Some(stamp.0);
        self.record_transition(state, stamp);
        Ok(state)
    }

    /// Command the outlet into `desired`.
    ///
    /// Powering on (or rebooting) an outlet that went off less than
    /// [`min_off_time`](Self::min_off_time) ago blocks the calling thread
    /// for the remainder first.
    ///
    /// The port records `desired` as its last known state for every outcome
    /// except [`SetOutcome::Ignored`]: a reserved outlet returns immediately
    /// and its bookkeeping is left alone. A driverless PDU
    /// ([`SetOutcome::NoDriver`]) still records the transition, so its ports
    /// debounce like real ones. Driver errors leave the bookkeeping untouched.
    pub fn set(&mut self, desired: PowerState) -> PduResult<SetOutcome> {
        if !desired.is_valid_action() {
            return Err(PduError::InvalidAction(desired));
        }
        if self.is_reserved() {
            tracing::debug!(pdu = %self.pdu.name(), port = %self.port_id, state = %desired, "Ignoring command for reserved port");
            return Ok(SetOutcome::Ignored);
        }

        if let Some(wait) = self.remaining_off_time(desired) {
            tracing::debug!(
                pdu = %self.pdu.name(),
                port = %self.port_id,
                wait_ms = wait.as_millis() as u64,
                "Waiting out minimum off time"
            );
            self.pdu.clock().sleep(wait);
        }

        let outcome = self.pdu.apply_port_state(&self.port_id, desired)?;
        if outcome != SetOutcome::Ignored {
            let stamp = self.stamp();
            self.record_transition(desired, stamp);
        }
        Ok(outcome)
    }

    /// Time still to wait before `desired` may be sent, if any.
    fn remaining_off_time(&self, desired: PowerState) -> Option<Duration> {
        if desired == PowerState::Off || self.last_known_state != PowerState::Off {
            return None;
        }
        let shutdown = self.shutdown_mark?;
        let elapsed = self.pdu.clock().elapsed_since(shutdown);
        self.min_off_time
            .checked_sub(elapsed)
            .filter(|wait| !wait.is_zero())
    }

    /// Wall-clock time for reporting and a monotonic reading for waits.
    fn stamp(&self) -> (DateTime<Utc>, Duration) {
        let clock = self.pdu.clock();
        (clock.now(), clock.monotonic())
    }

    fn record_transition(&mut self, state: PowerState, (now, mark): (DateTime<Utc>, Duration)) {
        let previous = self.last_known_state;
        if state == PowerState::Off && previous != PowerState::Off {
            self.last_shutdown = Some(now);
            self.shutdown_mark = Some(mark);
        }
        if state != previous {
            tracing::debug!(
                pdu = %self.pdu.name(),
                port = %self.port_id,
                from = %previous,
                to = %state,
                "Port state changed"
            );
        }
        self.last_known_state = state;
    }

    /// Outlet id.
    pub fn port_id(&self) -> &PortId {
        &self.port_id
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Name of the owning PDU.
    pub fn pdu_name(&self) -> &str {
        self.pdu.name()
    }

    /// Minimum time between power-off and the next power-on.
    pub fn min_off_time(&self) -> Duration {
        self.min_off_time
    }

    /// State from the most recent read or non-ignored command.
    pub fn last_known_state(&self) -> PowerState {
        self.last_known_state
    }

    /// When the outlet was last seen going off.
    pub fn last_shutdown(&self) -> Option<DateTime<Utc>> {
        self.last_shutdown
    }

    /// When [`state`](Self::state) last completed.
    pub fn last_polled(&self) -> Option<DateTime<Utc>> {
        self.last_polled
    }

    /// `true` if the outlet is currently reserved on its PDU.
    pub fn is_reserved(&self) -> bool {
        self.pdu.is_reserved(&self.port_id)
    }

    /// Serializable view of the port.
    pub fn snapshot(&self) -> PortSnapshot {
        PortSnapshot {
            port_id: self.port_id.clone(),
            label: self.label.clone(),
            min_off_time: self.min_off_time.as_secs_f64(),
            state: self.last_known_state,
            last_shutdown: self.last_shutdown,
            last_polled: self.last_polled,
            reserved: self.is_reserved(),
        }
    }
}

impl PartialEq for PduPort {
    fn eq(&self, other: &Self) -> bool {
        self.pdu.name() == other.pdu.name()
            && self.port_id == other.port_id
            && self.label == other.label
            && self.min_off_time == other.min_off_time
    }
}

impl Eq for PduPort {}

impl fmt::Debug for PduPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PduPort")
            .field("pdu", &self.pdu.name())
            .field("port_id", &self.port_id)
            .field("label", &self.label)
            .field("min_off_time", &self.min_off_time)
            .field("last_known_state", &self.last_known_state)
            .field("last_shutdown", &self.last_shutdown)
            .finish()
    }
}

/// Serializable view of a [`PduPort`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortSnapshot {
    /// Outlet id
    pub port_id: PortId,
    /// Human-readable label
    pub label: String,
    /// Minimum off time in seconds
    pub min_off_time: f64,
    /// Last known state
    pub state: PowerState,
    /// Last observed power-off
    pub last_shutdown: Option<DateTime<Utc>>,
    /// Last completed read
    pub last_polled: Option<DateTime<Utc>>,
    /// Reserved on its PDU
    pub reserved: bool,
}
