mod sim;

#[cfg(all(target_os = "linux", feature = "hardware"))]
mod i2c;

pub use sim::{HwCommand, SimulatedHardware};

#[cfg(all(target_os = "linux", feature = "hardware"))]
pub use i2c::I2cHardware;

use crate::error::Result;
use async_trait::async_trait;

/// LED bar state. Color indices follow the expansion board's convention:
/// red=0, green=1, blue=2, yellow=3, purple=4, cyan=5, white=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    Off,
    Color(u8),
}

/// Thin facade over the robot's expansion board: motors, LED strip, buzzer
/// and the IR receiver register. Imperative commands only; every call is
/// independently fallible so that cleanup sequences can isolate failures.
#[async_trait]
pub trait Hardware: Send + Sync {
    /// Enable or disable the IR receiver.
    async fn set_ir_receiver(&self, enabled: bool) -> Result<()>;

    /// Read the IR code register. 0x00 means no code pending; values of
    /// 0xFF and above are invalid reads.
    async fn read_ir_register(&self) -> Result<u8>;

    /// Halt all four wheel motors.
    async fn motor_stop(&self) -> Result<()>;

    /// Set the whole LED bar to one state.
    async fn set_led(&self, state: LedState) -> Result<()>;

    /// Fire the 50ms acknowledgment chirp.
    async fn beep(&self) -> Result<()>;
}
