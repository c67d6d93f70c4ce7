//! Event-triggered communication primitives.
//!
//! This crate provides the stateful pieces that sit between the plant and
//! the feedback controller:
//! - trigger policies (static and dynamic) deciding when to re-transmit
//!   the plant state
//! - the transmission zero-order hold that keeps the last transmitted
//!   state between events
//! - the static state-feedback controller
//!
//! Every policy and hold owns its per-run mutable state exclusively and is
//! reset explicitly at the start of each simulation run; nothing is shared
//! across runs.

pub mod controller;
pub mod error;
pub mod hold;
pub mod trigger;

pub use controller::StateFeedback;
pub use error::{ControlError, ControlResult};
pub use hold::TransmissionHold;
pub use trigger::{DynamicPolicy, StaticPolicy, TriggerCondition, TriggerPolicy};
