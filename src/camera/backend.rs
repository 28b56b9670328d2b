use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

/// Colors the color-tracking detector can lock onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackColor {
    Red,
    Green,
    Blue,
    Yellow,
}

impl TrackColor {
    /// LED bar color index matching the tracked color.
    pub fn led_index(self) -> u8 {
        match self {
            TrackColor::Red => 0,
            TrackColor::Green => 1,
            TrackColor::Blue => 2,
            TrackColor::Yellow => 3,
        }
    }
}

impl fmt::Display for TrackColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackColor::Red => "red",
            TrackColor::Green => "green",
            TrackColor::Blue => "blue",
            TrackColor::Yellow => "yellow",
        };
        write!(f, "{}", name)
    }
}

/// The five camera-backed detection sub-modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    Color,
    Face,
    Gesture,
    Object,
    Plate,
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectorKind::Color => "color-tracking",
            DetectorKind::Face => "face-tracking",
            DetectorKind::Gesture => "gesture-following",
            DetectorKind::Object => "object-recognition",
            DetectorKind::Plate => "plate-recognition",
        };
        write!(f, "{}", name)
    }
}

/// Full start parameters for one detector.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorSpec {
    ColorTracking(TrackColor),
    FaceTracking,
    /// `actions: false` runs detection only, with the motors left alone
    /// (used by the RPS game to read the player's hand).
    GestureFollowing {
        actions: bool,
    },
    ObjectRecognition {
        model: PathBuf,
        labels: PathBuf,
    },
    PlateRecognition {
        font: PathBuf,
        sensitivity: String,
    },
}

impl DetectorSpec {
    pub fn kind(&self) -> DetectorKind {
        match self {
            DetectorSpec::ColorTracking(_) => DetectorKind::Color,
            DetectorSpec::FaceTracking => DetectorKind::Face,
            DetectorSpec::GestureFollowing { .. } => DetectorKind::Gesture,
            DetectorSpec::ObjectRecognition { .. } => DetectorKind::Object,
            DetectorSpec::PlateRecognition { .. } => DetectorKind::Plate,
        }
    }
}

/// Result of a non-blocking display poll.
#[derive(Debug, Clone, PartialEq)]
pub enum FramePoll {
    /// No device held, or a release is in progress.
    Idle,
    /// A rendered frame is available.
    Frame { seq: u64 },
    /// The display window reported a key press.
    Key(char),
}

/// Boundary to the computer-vision camera stack. One shared device,
/// demultiplexed into independently start/stop-able detectors. Vision
/// algorithms live behind this trait; the manager above it only deals in
/// lifecycle.
#[async_trait]
pub trait CameraBackend: Send {
    /// Open the capture device. Fails if it is held by another process,
    /// missing, or the driver errors.
    async fn open(&mut self, index: u32) -> Result<()>;

    /// Release the capture device.
    async fn close(&mut self) -> Result<()>;

    async fn start(&mut self, spec: &DetectorSpec) -> Result<()>;

    async fn stop(&mut self, kind: DetectorKind) -> Result<()>;

    /// Latest rendered frame or window key event; must not block.
    async fn poll_frame(&mut self) -> Result<FramePoll>;
}
