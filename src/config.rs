use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RobomuxConfig {
    #[serde(default)]
    pub ir: IrConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
}

/// IR remote layout and input-router tuning.
///
/// Code bytes are whatever the remote in use emits on the expansion board's
/// IR register; the defaults match the stock Raspbot remote. 0x00 is the
/// "no code" sentinel and 0xFF marks an invalid read, so neither may be
/// assigned to a button.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IrConfig {
    #[serde(default = "default_color_red")]
    pub color_red: u8,

    #[serde(default = "default_color_blue")]
    pub color_blue: u8,

    #[serde(default = "default_color_green")]
    pub color_green: u8,

    #[serde(default = "default_color_yellow")]
    pub color_yellow: u8,

    #[serde(default = "default_face_mode")]
    pub face_mode: u8,

    #[serde(default = "default_gesture_mode")]
    pub gesture_mode: u8,

    #[serde(default = "default_object_mode")]
    pub object_mode: u8,

    #[serde(default = "default_plate_mode")]
    pub plate_mode: u8,

    #[serde(default = "default_rps_game")]
    pub rps_game: u8,

    #[serde(default = "default_presentation")]
    pub presentation: u8,

    #[serde(default = "default_ai_toggle")]
    pub ai_toggle: u8,

    #[serde(default = "default_stop_all")]
    pub stop_all: u8,

    #[serde(default = "default_exit_app")]
    pub exit_app: u8,

    /// Window in which a repeated identical code is dropped
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Interval between IR register reads
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Log every code and bypass debouncing (for mapping a new remote)
    #[serde(default = "default_ir_debug")]
    pub debug: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Camera device index (e.g., 0 for /dev/video0)
    #[serde(default = "default_camera_index")]
    pub index: u32,
}

/// Model and font assets required by the object and plate detectors.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AssetConfig {
    /// Frozen inference graph for object recognition
    #[serde(default = "default_object_model")]
    pub object_model: String,

    /// Label map matching the object model
    #[serde(default = "default_object_labels")]
    pub object_labels: String,

    /// TrueType font used to render recognized plates
    #[serde(default = "default_plate_font")]
    pub plate_font: String,

    /// Plate detection sensitivity ("low", "medium", "high")
    #[serde(default = "default_plate_sensitivity")]
    pub plate_sensitivity: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HardwareConfig {
    /// I2C bus number of the expansion board
    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: u8,

    /// I2C address of the expansion board
    #[serde(default = "default_i2c_address")]
    pub i2c_address: u8,
}

impl RobomuxConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("robomux.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            // Configuration file is optional; defaults cover everything
            .add_source(File::with_name(&path_str).required(false))
            // Environment variables with ROBOMUX_ prefix
            .add_source(Environment::with_prefix("ROBOMUX").separator("_"))
            .build()?;

        let config: RobomuxConfig = settings.try_deserialize()?;
        config.validate()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ir.debounce_ms == 0 {
            return Err(ConfigError::Message(
                "IR debounce_ms must be greater than 0".to_string(),
            ));
        }

        if self.ir.poll_interval_ms == 0 {
            return Err(ConfigError::Message(
                "IR poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        let codes = self.ir.assigned_codes();
        for code in &codes {
            if *code == 0x00 || *code >= 0xFF {
                return Err(ConfigError::Message(format!(
                    "IR code 0x{:02X} collides with a reserved sentinel value",
                    code
                )));
            }
        }

        let mut sorted = codes.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != codes.len() {
            return Err(ConfigError::Message(
                "IR code table assigns the same code to more than one action".to_string(),
            ));
        }

        match self.assets.plate_sensitivity.as_str() {
            "low" | "medium" | "high" => {}
            other => {
                return Err(ConfigError::Message(format!(
                    "Unknown plate sensitivity '{}' (expected low, medium or high)",
                    other
                )));
            }
        }

        Ok(())
    }

    /// Serialize to TOML (used by --print-config)
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl IrConfig {
    /// Every code byte currently bound to an action.
    pub fn assigned_codes(&self) -> Vec<u8> {
        vec![
            self.color_red,
            self.color_blue,
            self.color_green,
            self.color_yellow,
            self.face_mode,
            self.gesture_mode,
            self.object_mode,
            self.plate_mode,
            self.rps_game,
            self.presentation,
            self.ai_toggle,
            self.stop_all,
            self.exit_app,
        ]
    }
}

impl Default for IrConfig {
    fn default() -> Self {
        Self {
            color_red: default_color_red(),
            color_blue: default_color_blue(),
            color_green: default_color_green(),
            color_yellow: default_color_yellow(),
            face_mode: default_face_mode(),
            gesture_mode: default_gesture_mode(),
            object_mode: default_object_mode(),
            plate_mode: default_plate_mode(),
            rps_game: default_rps_game(),
            presentation: default_presentation(),
            ai_toggle: default_ai_toggle(),
            stop_all: default_stop_all(),
            exit_app: default_exit_app(),
            debounce_ms: default_debounce_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            debug: default_ir_debug(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: default_camera_index(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            object_model: default_object_model(),
            object_labels: default_object_labels(),
            plate_font: default_plate_font(),
            plate_sensitivity: default_plate_sensitivity(),
        }
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            i2c_bus: default_i2c_bus(),
            i2c_address: default_i2c_address(),
        }
    }
}

fn default_color_red() -> u8 {
    0x01
}

fn default_color_blue() -> u8 {
    0x04
}

fn default_color_green() -> u8 {
    0x06
}

fn default_color_yellow() -> u8 {
    0x09
}

fn default_face_mode() -> u8 {
    0x10
}

fn default_gesture_mode() -> u8 {
    0x11
}

fn default_object_mode() -> u8 {
    0x12
}

fn default_plate_mode() -> u8 {
    0x14
}

fn default_rps_game() -> u8 {
    0x19
}

fn default_presentation() -> u8 {
    0x15
}

fn default_ai_toggle() -> u8 {
    0x02
}

fn default_stop_all() -> u8 {
    0x05
}

// 0x00 is the "no code" sentinel, so the exit button keeps its pre-remap
// value from the stock remote.
fn default_exit_app() -> u8 {
    0x1A
}

fn default_debounce_ms() -> u64 {
    400
}

fn default_poll_interval_ms() -> u64 {
    50
}

fn default_ir_debug() -> bool {
    false
}

fn default_camera_index() -> u32 {
    0
}

fn default_object_model() -> String {
    "models/object/frozen_inference_graph.pb".to_string()
}

fn default_object_labels() -> String {
    "models/object/mscoco_label_map.pbtxt".to_string()
}

fn default_plate_font() -> String {
    "models/plate/platech.ttf".to_string()
}

fn default_plate_sensitivity() -> String {
    "low".to_string()
}

fn default_i2c_bus() -> u8 {
    1
}

fn default_i2c_address() -> u8 {
    0x2B
}
