//! Mode coordination: the single authority over which mode owns the
//! robot's camera, motors and face at any moment.
//!
//! Split into the pure pieces and the effectful one:
//! - [`state`]: the mode enums and the coordinator's observable state
//! - [`admission`]: the pure accept/noop/refuse decision
//! - [`core`]: the [`ModeCoordinator`] that executes transitions

mod admission;
mod core;
mod state;

#[cfg(test)]
mod tests;

pub use admission::{decide, Decision, RefuseReason};
pub use core::ModeCoordinator;
pub use state::{CoordinatorState, Mode, ModeRequest};
