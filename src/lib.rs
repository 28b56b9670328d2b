pub mod app;
pub mod camera;
pub mod cleanup;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod face;
pub mod hardware;
pub mod input;
pub mod keys;
pub mod services;
pub mod worker;

pub use app::{App, ShutdownReason};
pub use camera::{
    CameraBackend, CameraManager, DetectorKind, DetectorSpec, FramePoll, SimCameraBackend,
    TrackColor,
};
pub use config::RobomuxConfig;
pub use coordinator::{decide, CoordinatorState, Decision, Mode, ModeCoordinator, ModeRequest, RefuseReason};
pub use error::{Result, RobomuxError};
pub use face::{Emotion, FaceService, NullFace};
pub use hardware::{Hardware, HwCommand, LedState, SimulatedHardware};
pub use input::{Command, Debounce, InputRouter};
pub use keys::KeyboardInput;
pub use services::{
    ConversationService, GameService, PresentationService, SimConversation, SimGame,
    SimPresentation,
};
pub use worker::{StopOutcome, Worker};
