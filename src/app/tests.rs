use super::runtime::Flow;
use super::App;
use crate::camera::{CameraManager, SimCameraBackend};
use crate::config::{AssetConfig, IrConfig};
use crate::coordinator::{Mode, ModeCoordinator, ModeRequest};
use crate::face::{FaceService, RecordingFace};
use crate::hardware::{Hardware, HwCommand, SimulatedHardware};
use crate::input::{Command, InputRouter};
use crate::services::{SimConversation, SimGame, SimPresentation};
use std::sync::Arc;
use std::time::Duration;

struct Rig {
    app: App,
    backend: SimCameraBackend,
    hardware: Arc<SimulatedHardware>,
}

fn rig() -> Rig {
    let backend = SimCameraBackend::new();
    let hardware = Arc::new(SimulatedHardware::new());
    let camera = Arc::new(CameraManager::new(Box::new(backend.clone()), 0));

    let coordinator = ModeCoordinator::new(
        Arc::clone(&camera),
        Arc::clone(&hardware) as Arc<dyn Hardware>,
        Arc::new(RecordingFace::new()) as Arc<dyn FaceService>,
        Arc::new(SimConversation),
        Arc::new(SimGame),
        Arc::new(SimPresentation),
        AssetConfig::default(),
    );

    let router = InputRouter::new(
        Arc::clone(&hardware) as Arc<dyn Hardware>,
        IrConfig {
            poll_interval_ms: 5,
            debounce_ms: 1,
            ..IrConfig::default()
        },
    );

    let app = App::new(coordinator, camera, router, None);

    Rig {
        app,
        backend,
        hardware,
    }
}

#[tokio::test]
async fn exit_command_ends_the_run_loop() {
    let mut rig = rig();
    let tx = rig.app.command_sender();
    rig.app.start().await.unwrap();

    tx.send(Command::Exit).unwrap();

    let exit_code = tokio::time::timeout(Duration::from_secs(5), rig.app.run())
        .await
        .expect("run loop never exited")
        .unwrap();
    assert_eq!(exit_code, 0);

    // Shutdown disabled the IR receiver on the way out
    assert!(rig
        .hardware
        .commands()
        .contains(&HwCommand::IrReceiver(false)));
}

#[tokio::test]
async fn ir_code_drives_a_mode_transition_end_to_end() {
    let mut rig = rig();
    let tx = rig.app.command_sender();
    rig.app.start().await.unwrap();

    let face_code = IrConfig::default().face_mode;
    rig.hardware.push_ir_code(face_code);

    // Give the poll loop time to dispatch, then exit
    let backend = rig.backend.clone();
    tokio::spawn(async move {
        for _ in 0..200 {
            if backend.is_open() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tx.send(Command::Exit).unwrap();
    });

    let exit_code = tokio::time::timeout(Duration::from_secs(5), rig.app.run())
        .await
        .expect("run loop never exited")
        .unwrap();
    assert_eq!(exit_code, 0);

    // The mode ran, and shutdown released the device afterwards
    assert!(!rig.backend.is_open());
    assert!(rig
        .backend
        .started_log()
        .iter()
        .any(|spec| spec.kind() == crate::camera::DetectorKind::Face));
}

#[tokio::test]
async fn stop_all_clears_mode_and_ai() {
    let mut rig = rig();

    rig.app.handle_command(Command::Mode(ModeRequest::Face)).await;
    rig.app.handle_command(Command::ToggleAi).await;
    assert!(rig.app.coordinator.ai_enabled());

    let flow = rig.app.handle_command(Command::StopAll).await;

    assert_eq!(flow, Flow::Continue);
    assert!(!rig.app.coordinator.ai_enabled());
    assert_eq!(rig.app.coordinator.active_mode(), Mode::Idle);
    assert!(rig.backend.active_detectors().is_empty());
    assert!(!rig.backend.is_open());

    rig.app.coordinator.shutdown().await;
}

#[tokio::test]
async fn stop_all_releases_the_camera_device() {
    let mut rig = rig();

    rig.app.handle_command(Command::Mode(ModeRequest::Face)).await;
    assert!(rig.backend.is_open());

    rig.app.handle_command(Command::StopAll).await;

    // The device handle is torn down, not just the detector
    assert!(!rig.backend.is_open());
    assert_eq!(rig.app.coordinator.active_mode(), Mode::Idle);

    // And a later mode request re-acquires cleanly
    rig.app.handle_command(Command::Mode(ModeRequest::Face)).await;
    assert_eq!(rig.app.coordinator.active_mode(), Mode::Face);
    assert!(rig.backend.is_open());
}

#[tokio::test]
async fn mode_errors_do_not_end_the_loop() {
    let mut rig = rig();
    rig.backend.fail_next_open(true);

    // Camera failure is logged, not propagated
    let flow = rig.app.handle_command(Command::Mode(ModeRequest::Face)).await;
    assert_eq!(flow, Flow::Continue);
    assert_eq!(rig.app.coordinator.active_mode(), Mode::Idle);
}
