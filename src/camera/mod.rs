mod backend;
mod manager;
mod sim;


pub use backend::{CameraBackend, DetectorKind, DetectorSpec, FramePoll, TrackColor};
pub use manager::CameraManager;
pub use sim::SimCameraBackend;
