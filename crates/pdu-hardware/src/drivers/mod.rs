//! Built-in drivers.
//!
//! Only the no-op `dummy` driver ships with the PDU layer; vendor drivers live
//! in their own crates and register through [`crate::DriverRegistry`].

pub mod dummy;

pub use dummy::{DummyDriver, DummyFactory, DUMMY_DRIVER};
