use crate::camera::TrackColor;
use std::fmt;

/// The single currently-active robot behavior. At most one non-Idle mode
/// drives the motors/camera/face at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Color(TrackColor),
    Face,
    Gesture { actions: bool },
    Object,
    Plate,
    Rps,
    Presentation,
}

impl Mode {
    /// Modes that hold the shared camera device.
    pub fn uses_camera(&self) -> bool {
        matches!(
            self,
            Mode::Color(_) | Mode::Face | Mode::Gesture { .. } | Mode::Object | Mode::Plate | Mode::Rps
        )
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Idle => write!(f, "idle"),
            Mode::Color(color) => write!(f, "color({})", color),
            Mode::Face => write!(f, "face"),
            Mode::Gesture { actions } => write!(f, "gesture(actions={})", actions),
            Mode::Object => write!(f, "object"),
            Mode::Plate => write!(f, "plate"),
            Mode::Rps => write!(f, "rps"),
            Mode::Presentation => write!(f, "presentation"),
        }
    }
}

/// A requested transition into a non-Idle mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequest {
    Color(TrackColor),
    Face,
    Gesture { actions: bool },
    Object,
    Plate,
    Rps,
    Presentation,
}

impl ModeRequest {
    /// The mode this request enters on acceptance.
    pub fn target(&self) -> Mode {
        match *self {
            ModeRequest::Color(color) => Mode::Color(color),
            ModeRequest::Face => Mode::Face,
            ModeRequest::Gesture { actions } => Mode::Gesture { actions },
            ModeRequest::Object => Mode::Object,
            ModeRequest::Plate => Mode::Plate,
            ModeRequest::Rps => Mode::Rps,
            ModeRequest::Presentation => Mode::Presentation,
        }
    }
}

impl fmt::Display for ModeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.target().fmt(f)
    }
}

/// Authoritative coordinator state. Mutated only through the coordinator's
/// entry points; admission decisions are pure functions over this.
#[derive(Debug, Clone)]
pub struct CoordinatorState {
    pub active: Mode,
    /// Orthogonal to `active`; never true while any non-Idle mode runs.
    pub ai_enabled: bool,
    /// Set on the first AI enable; later enables skip the greeting.
    pub has_greeted: bool,
}

impl CoordinatorState {
    pub fn new() -> Self {
        Self {
            active: Mode::Idle,
            ai_enabled: false,
            has_greeted: false,
        }
    }
}

impl Default for CoordinatorState {
    fn default() -> Self {
        Self::new()
    }
}
