use super::{Hardware, LedState};
use crate::error::{Result, RobomuxError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// What the simulated board was told to do, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwCommand {
    IrReceiver(bool),
    MotorStop,
    Led(LedState),
    Beep,
}

/// In-process stand-in for the expansion board. Records every command and
/// serves IR codes from a queue, so the whole input path (register poll,
/// debounce, dispatch, beep) can run on a bench with no robot attached.
#[derive(Default)]
pub struct SimulatedHardware {
    commands: Mutex<Vec<HwCommand>>,
    ir_queue: Mutex<VecDeque<u8>>,
    fail_reads: AtomicBool,
    fail_commands: AtomicBool,
}

impl SimulatedHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an IR code to be returned by the next register read.
    pub fn push_ir_code(&self, code: u8) {
        self.ir_queue.lock().push_back(code);
    }

    /// Make subsequent register reads fail (driver-error simulation).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent commands fail (loose-wire simulation).
    pub fn set_fail_commands(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::Relaxed);
    }

    /// Commands issued so far.
    pub fn commands(&self) -> Vec<HwCommand> {
        self.commands.lock().clone()
    }

    /// Drain and return the recorded commands.
    pub fn take_commands(&self) -> Vec<HwCommand> {
        std::mem::take(&mut *self.commands.lock())
    }

    fn record(&self, command: HwCommand) -> Result<()> {
        if self.fail_commands.load(Ordering::Relaxed) {
            return Err(RobomuxError::hardware(format!(
                "simulated command failure: {:?}",
                command
            )));
        }
        debug!("hardware: {:?}", command);
        self.commands.lock().push(command);
        Ok(())
    }
}

#[async_trait]
impl Hardware for SimulatedHardware {
    async fn set_ir_receiver(&self, enabled: bool) -> Result<()> {
        self.record(HwCommand::IrReceiver(enabled))
    }

    async fn read_ir_register(&self) -> Result<u8> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(RobomuxError::hardware("simulated IR read failure"));
        }
        Ok(self.ir_queue.lock().pop_front().unwrap_or(0x00))
    }

    async fn motor_stop(&self) -> Result<()> {
        self.record(HwCommand::MotorStop)
    }

    async fn set_led(&self, state: LedState) -> Result<()> {
        self.record(HwCommand::Led(state))
    }

    async fn beep(&self) -> Result<()> {
        self.record(HwCommand::Beep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_commands_in_order() {
        let hw = SimulatedHardware::new();
        hw.set_ir_receiver(true).await.unwrap();
        hw.motor_stop().await.unwrap();
        hw.set_led(LedState::Color(2)).await.unwrap();
        hw.beep().await.unwrap();

        assert_eq!(
            hw.commands(),
            vec![
                HwCommand::IrReceiver(true),
                HwCommand::MotorStop,
                HwCommand::Led(LedState::Color(2)),
                HwCommand::Beep,
            ]
        );
    }

    #[tokio::test]
    async fn serves_queued_ir_codes_then_idles() {
        let hw = SimulatedHardware::new();
        hw.push_ir_code(0x10);
        hw.push_ir_code(0x19);

        assert_eq!(hw.read_ir_register().await.unwrap(), 0x10);
        assert_eq!(hw.read_ir_register().await.unwrap(), 0x19);
        assert_eq!(hw.read_ir_register().await.unwrap(), 0x00);
    }

    #[tokio::test]
    async fn simulated_failures_surface_as_errors() {
        let hw = SimulatedHardware::new();
        hw.set_fail_commands(true);
        assert!(hw.motor_stop().await.is_err());
        hw.set_fail_reads(true);
        assert!(hw.read_ir_register().await.is_err());
    }
}
