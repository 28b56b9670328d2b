use super::*;
use crate::camera::{CameraManager, DetectorKind, DetectorSpec, SimCameraBackend, TrackColor};
use crate::config::AssetConfig;
use crate::error::RobomuxError;
use crate::face::{Emotion, FaceCall, FaceService, RecordingFace};
use crate::hardware::{Hardware, HwCommand, LedState, SimulatedHardware};
use crate::services::{SimConversation, SimGame, SimPresentation};
use std::sync::Arc;

struct Rig {
    coordinator: ModeCoordinator,
    backend: SimCameraBackend,
    hardware: Arc<SimulatedHardware>,
    face: Arc<RecordingFace>,
}

fn rig_with_assets(assets: AssetConfig) -> Rig {
    let backend = SimCameraBackend::new();
    let hardware = Arc::new(SimulatedHardware::new());
    let face = Arc::new(RecordingFace::new());
    let camera = Arc::new(CameraManager::new(Box::new(backend.clone()), 0));

    let coordinator = ModeCoordinator::new(
        camera,
        Arc::clone(&hardware) as Arc<dyn Hardware>,
        Arc::clone(&face) as Arc<dyn FaceService>,
        Arc::new(SimConversation),
        Arc::new(SimGame),
        Arc::new(SimPresentation),
        assets,
    );

    Rig {
        coordinator,
        backend,
        hardware,
        face,
    }
}

fn rig() -> Rig {
    rig_with_assets(AssetConfig::default())
}

/// Asset paths that actually exist on disk, backed by a temp dir.
fn real_assets(dir: &tempfile::TempDir) -> AssetConfig {
    let touch = |name: &str| {
        let path = dir.path().join(name);
        std::fs::write(&path, b"stub").unwrap();
        path.to_string_lossy().into_owned()
    };
    AssetConfig {
        object_model: touch("frozen.pb"),
        object_labels: touch("labels.txt"),
        plate_font: touch("platech.ttf"),
        plate_sensitivity: "medium".to_string(),
    }
}

#[tokio::test]
async fn face_mode_opens_camera_and_starts_detector() {
    let mut rig = rig();

    rig.coordinator.request_mode(ModeRequest::Face).await.unwrap();

    assert_eq!(rig.coordinator.active_mode(), Mode::Face);
    assert!(rig.backend.is_open());
    assert_eq!(rig.backend.active_detectors(), vec![DetectorKind::Face]);
    assert!(rig
        .hardware
        .commands()
        .contains(&HwCommand::Led(LedState::Color(Emotion::Happy.led_index()))));
}

#[tokio::test]
async fn repeated_request_for_active_mode_is_a_noop() {
    let mut rig = rig();

    rig.coordinator
        .request_mode(ModeRequest::Color(TrackColor::Red))
        .await
        .unwrap();
    let commands_before = rig.hardware.commands().len();

    rig.coordinator
        .request_mode(ModeRequest::Color(TrackColor::Red))
        .await
        .unwrap();

    // Same mode again: no restart, no extra hardware traffic
    assert_eq!(rig.backend.started_log().len(), 1);
    assert_eq!(rig.hardware.commands().len(), commands_before);
    assert_eq!(
        rig.coordinator.active_mode(),
        Mode::Color(TrackColor::Red)
    );
}

#[tokio::test]
async fn switching_modes_stops_the_previous_detector_first() {
    let mut rig = rig();

    rig.coordinator.request_mode(ModeRequest::Face).await.unwrap();
    rig.coordinator
        .request_mode(ModeRequest::Color(TrackColor::Blue))
        .await
        .unwrap();

    assert_eq!(rig.coordinator.active_mode(), Mode::Color(TrackColor::Blue));
    assert_eq!(rig.backend.active_detectors(), vec![DetectorKind::Color]);
    // The transition issued a motor stop between the two modes
    assert!(rig.hardware.commands().contains(&HwCommand::MotorStop));
}

#[tokio::test]
async fn face_to_rps_reuses_the_camera_with_actions_disabled() {
    let mut rig = rig();

    rig.coordinator.request_mode(ModeRequest::Face).await.unwrap();
    rig.coordinator.request_mode(ModeRequest::Rps).await.unwrap();

    assert_eq!(rig.coordinator.active_mode(), Mode::Rps);
    assert!(rig.backend.is_open());
    assert_eq!(rig.backend.active_detectors(), vec![DetectorKind::Gesture]);
    assert!(rig
        .backend
        .started_log()
        .contains(&DetectorSpec::GestureFollowing { actions: false }));

    rig.coordinator.stop_current_mode().await;
    assert_eq!(rig.coordinator.active_mode(), Mode::Idle);
}

#[tokio::test]
async fn presentation_refuses_camera_modes() {
    let mut rig = rig();

    rig.coordinator
        .request_mode(ModeRequest::Presentation)
        .await
        .unwrap();
    assert_eq!(rig.coordinator.active_mode(), Mode::Presentation);

    rig.coordinator.request_mode(ModeRequest::Face).await.unwrap();

    // Refused without disturbing the running presentation
    assert_eq!(rig.coordinator.active_mode(), Mode::Presentation);
    assert!(!rig.backend.is_open());

    rig.coordinator.request_mode(ModeRequest::Rps).await.unwrap();
    assert_eq!(rig.coordinator.active_mode(), Mode::Presentation);

    rig.coordinator.stop_current_mode().await;
}

#[tokio::test]
async fn ai_refuses_all_mode_requests() {
    let mut rig = rig();

    rig.coordinator.toggle_ai().await.unwrap();
    assert!(rig.coordinator.ai_enabled());

    rig.coordinator.request_mode(ModeRequest::Face).await.unwrap();
    rig.coordinator
        .request_mode(ModeRequest::Presentation)
        .await
        .unwrap();

    assert_eq!(rig.coordinator.active_mode(), Mode::Idle);
    assert!(!rig.backend.is_open());

    rig.coordinator.shutdown().await;
}

#[tokio::test]
async fn camera_open_failure_falls_back_to_idle_and_is_retryable() {
    let mut rig = rig();
    rig.backend.fail_next_open(true);

    let err = rig
        .coordinator
        .request_mode(ModeRequest::Face)
        .await
        .unwrap_err();
    assert!(matches!(err, RobomuxError::CameraUnavailable { .. }));
    assert_eq!(rig.coordinator.active_mode(), Mode::Idle);
    assert!(!rig.backend.is_open());

    rig.backend.fail_next_open(false);
    rig.coordinator.request_mode(ModeRequest::Face).await.unwrap();
    assert_eq!(rig.coordinator.active_mode(), Mode::Face);
}

#[tokio::test]
async fn missing_assets_refuse_the_mode_before_the_detector_starts() {
    let mut rig = rig(); // default asset paths do not exist on the bench

    let err = rig
        .coordinator
        .request_mode(ModeRequest::Object)
        .await
        .unwrap_err();
    assert!(matches!(err, RobomuxError::AssetMissing { .. }));

    assert_eq!(rig.coordinator.active_mode(), Mode::Idle);
    assert!(rig.backend.started_log().is_empty());
}

#[tokio::test]
async fn object_mode_starts_with_assets_present() {
    let dir = tempfile::tempdir().unwrap();
    let mut rig = rig_with_assets(real_assets(&dir));

    rig.coordinator.request_mode(ModeRequest::Object).await.unwrap();

    assert_eq!(rig.coordinator.active_mode(), Mode::Object);
    assert_eq!(rig.backend.active_detectors(), vec![DetectorKind::Object]);
}

#[tokio::test]
async fn toggle_ai_during_plate_releases_the_camera_entirely() {
    let dir = tempfile::tempdir().unwrap();
    let mut rig = rig_with_assets(real_assets(&dir));

    rig.coordinator.request_mode(ModeRequest::Plate).await.unwrap();
    assert!(rig.backend.is_open());

    rig.coordinator.toggle_ai().await.unwrap();

    assert!(rig.coordinator.ai_enabled());
    assert_eq!(rig.coordinator.active_mode(), Mode::Idle);
    // Device handed back, not just the detector stopped
    assert!(!rig.backend.is_open());
    assert!(rig.face.count(&FaceCall::Resume) >= 1);
    assert!(rig
        .hardware
        .commands()
        .contains(&HwCommand::Led(LedState::Color(Emotion::Happy.led_index()))));

    rig.coordinator.shutdown().await;
}

#[tokio::test]
async fn toggle_ai_off_suspends_the_face() {
    let mut rig = rig();

    rig.coordinator.toggle_ai().await.unwrap();
    rig.coordinator.toggle_ai().await.unwrap();

    assert!(!rig.coordinator.ai_enabled());
    assert!(rig.face.count(&FaceCall::Suspend) >= 1);
    assert!(rig
        .hardware
        .commands()
        .contains(&HwCommand::Led(LedState::Off)));
}

#[tokio::test]
async fn greeting_plays_only_on_the_first_ai_enable() {
    let mut rig = rig();
    assert!(!rig.coordinator.state().has_greeted);

    rig.coordinator.toggle_ai().await.unwrap();
    assert!(rig.coordinator.state().has_greeted);

    rig.coordinator.toggle_ai().await.unwrap();
    rig.coordinator.toggle_ai().await.unwrap();
    // Still marked greeted; subsequent enables suppress the greeting
    assert!(rig.coordinator.state().has_greeted);

    rig.coordinator.shutdown().await;
}

#[tokio::test]
async fn stop_current_mode_is_idempotent() {
    let mut rig = rig();

    rig.coordinator.request_mode(ModeRequest::Face).await.unwrap();
    rig.coordinator.stop_current_mode().await;
    assert_eq!(rig.coordinator.active_mode(), Mode::Idle);
    assert!(rig.backend.active_detectors().is_empty());

    // Nothing running; must not panic or error
    rig.coordinator.stop_current_mode().await;
    assert_eq!(rig.coordinator.active_mode(), Mode::Idle);
}

#[tokio::test]
async fn shutdown_drains_everything_and_is_idempotent() {
    let mut rig = rig();

    rig.coordinator.request_mode(ModeRequest::Rps).await.unwrap();
    rig.coordinator.shutdown().await;

    assert_eq!(rig.coordinator.active_mode(), Mode::Idle);
    assert!(!rig.backend.is_open());
    let commands = rig.hardware.take_commands();
    assert!(commands.contains(&HwCommand::IrReceiver(false)));
    assert!(commands.contains(&HwCommand::MotorStop));

    // Second call does nothing at all
    rig.coordinator.shutdown().await;
    assert!(rig.hardware.take_commands().is_empty());
}

/// Game loop that never polls its cancellation token, so stopping it
/// always runs out the grace period.
struct StubbornGame;

#[async_trait::async_trait]
impl crate::services::GameService for StubbornGame {
    async fn run(
        &self,
        _face: Arc<dyn FaceService>,
        _camera: Arc<CameraManager>,
        _cancel: tokio_util::sync::CancellationToken,
    ) {
        std::future::pending::<()>().await;
    }
}

#[tokio::test(start_paused = true)]
async fn refused_rps_restart_does_not_leave_a_detector_running() {
    let backend = SimCameraBackend::new();
    let hardware = Arc::new(SimulatedHardware::new());
    let camera = Arc::new(CameraManager::new(Box::new(backend.clone()), 0));
    let mut coordinator = ModeCoordinator::new(
        camera,
        Arc::clone(&hardware) as _,
        Arc::new(RecordingFace::new()) as _,
        Arc::new(SimConversation),
        Arc::new(StubbornGame),
        Arc::new(SimPresentation),
        AssetConfig::default(),
    );

    coordinator.request_mode(ModeRequest::Rps).await.unwrap();

    // Switching away leaks the game task past its grace period
    coordinator.request_mode(ModeRequest::Face).await.unwrap();
    assert_eq!(coordinator.active_mode(), Mode::Face);

    // Re-entering RPS is refused while the leaked task is still live,
    // and the gesture detector started for it must not stay behind
    let err = coordinator
        .request_mode(ModeRequest::Rps)
        .await
        .unwrap_err();
    assert!(matches!(err, RobomuxError::WorkerBusy { .. }));
    assert_eq!(coordinator.active_mode(), Mode::Idle);
    assert!(backend.active_detectors().is_empty());
}

#[tokio::test]
async fn hardware_errors_do_not_abort_a_transition() {
    let mut rig = rig();
    rig.hardware.set_fail_commands(true);

    rig.coordinator.request_mode(ModeRequest::Face).await.unwrap();
    assert_eq!(rig.coordinator.active_mode(), Mode::Face);

    rig.coordinator.stop_current_mode().await;
    assert_eq!(rig.coordinator.active_mode(), Mode::Idle);
    assert!(rig.backend.active_detectors().is_empty());
}
