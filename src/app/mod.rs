//! Application runtime: owns the mode coordinator, consumes the command
//! channel fed by the IR router (and the bench keyboard), drives the
//! camera display tick and handles process signals.
//!
//! Every mode transition happens here, on the one task that owns the
//! coordinator; input sources only ever send commands.

mod runtime;
mod shutdown;

#[cfg(test)]
mod tests;

pub use runtime::App;

/// Why the main loop ended.
#[derive(Debug, Clone)]
pub enum ShutdownReason {
    Signal(String),
    UserRequest,
}
