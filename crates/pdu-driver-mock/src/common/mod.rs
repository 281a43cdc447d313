//! Shared infrastructure for mock drivers.
//!
//! - **errors**: error injection framework
//! - **rng**: seeded random number generator

pub mod errors;
pub mod rng;

pub use errors::{ErrorConfig, ErrorScenario, GET_STATE, SET_STATE};
pub use rng::MockRng;
