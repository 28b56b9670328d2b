use super::{Hardware, LedState};
use crate::config::HardwareConfig;
use crate::error::{Result, RobomuxError};
use async_trait::async_trait;
use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{debug, info};

// Expansion board register map.
const REG_MOTOR_STOP: u8 = 0x01;
const REG_BEEP: u8 = 0x02;
const REG_LED_ALL: u8 = 0x07;
const REG_IR_ENABLE: u8 = 0x0B;
const REG_IR_READ: u8 = 0x0C;

const LED_OFF_INDEX: u8 = 0xFF;
const BEEP_DURATION: Duration = Duration::from_millis(50);

/// Real expansion-board binding over Linux I2C.
pub struct I2cHardware {
    device: Mutex<LinuxI2CDevice>,
}

impl I2cHardware {
    pub fn new(config: &HardwareConfig) -> Result<Self> {
        let path = format!("/dev/i2c-{}", config.i2c_bus);
        info!(
            "Opening expansion board at {} address 0x{:02X}",
            path, config.i2c_address
        );
        let device = LinuxI2CDevice::new(&path, config.i2c_address as u16)
            .map_err(|e| RobomuxError::hardware(format!("cannot open {}: {}", path, e)))?;
        Ok(Self {
            device: Mutex::new(device),
        })
    }

    fn write(&self, register: u8, value: u8) -> Result<()> {
        self.device
            .lock()
            .smbus_write_byte_data(register, value)
            .map_err(|e| {
                RobomuxError::hardware(format!("write 0x{:02X} <- 0x{:02X}: {}", register, value, e))
            })
    }

    fn read(&self, register: u8) -> Result<u8> {
        self.device
            .lock()
            .smbus_read_byte_data(register)
            .map_err(|e| RobomuxError::hardware(format!("read 0x{:02X}: {}", register, e)))
    }
}

#[async_trait]
impl Hardware for I2cHardware {
    async fn set_ir_receiver(&self, enabled: bool) -> Result<()> {
        debug!("IR receiver {}", if enabled { "on" } else { "off" });
        self.write(REG_IR_ENABLE, enabled as u8)
    }

    async fn read_ir_register(&self) -> Result<u8> {
        self.read(REG_IR_READ)
    }

    async fn motor_stop(&self) -> Result<()> {
        self.write(REG_MOTOR_STOP, 0x00)
    }

    async fn set_led(&self, state: LedState) -> Result<()> {
        match state {
            LedState::Off => self.write(REG_LED_ALL, LED_OFF_INDEX),
            LedState::Color(index) => self.write(REG_LED_ALL, index),
        }
    }

    async fn beep(&self) -> Result<()> {
        // Guard dropped across the sleep so other commands are not blocked
        // for the chirp duration.
        self.write(REG_BEEP, 0x01)?;
        tokio::time::sleep(BEEP_DURATION).await;
        self.write(REG_BEEP, 0x00)
    }
}
