use super::admission::{self, Decision};
use super::state::{CoordinatorState, Mode, ModeRequest};
use crate::camera::{CameraManager, DetectorSpec};
use crate::cleanup::IsolatedSteps;
use crate::config::AssetConfig;
use crate::error::Result;
use crate::face::{Emotion, FaceService};
use crate::hardware::{Hardware, LedState};
use crate::services::{ConversationService, GameService, PresentationService};
use crate::worker::{StopOutcome, Worker};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The mode coordinator: sole owner of "what is the robot doing right
/// now". It serializes transitions, lazily acquires and releases the
/// camera, spawns and cancels the background workers, and guarantees that
/// at most one mode controls the motors, camera and face at a time.
///
/// Collaborators never start detectors or workers themselves; the only
/// path is through these entry points.
pub struct ModeCoordinator {
    state: CoordinatorState,
    animations_started: bool,
    shut_down: bool,

    chat: Worker,
    rps: Worker,
    presentation: Worker,

    camera: Arc<CameraManager>,
    hardware: Arc<dyn Hardware>,
    face: Arc<dyn FaceService>,
    chat_service: Arc<dyn ConversationService>,
    game_service: Arc<dyn GameService>,
    presentation_service: Arc<dyn PresentationService>,

    assets: AssetConfig,
}

impl ModeCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        camera: Arc<CameraManager>,
        hardware: Arc<dyn Hardware>,
        face: Arc<dyn FaceService>,
        chat_service: Arc<dyn ConversationService>,
        game_service: Arc<dyn GameService>,
        presentation_service: Arc<dyn PresentationService>,
        assets: AssetConfig,
    ) -> Self {
        Self {
            state: CoordinatorState::new(),
            animations_started: false,
            shut_down: false,
            chat: Worker::new("chatbot"),
            rps: Worker::new("rps-game"),
            presentation: Worker::new("presentation"),
            camera,
            hardware,
            face,
            chat_service,
            game_service,
            presentation_service,
            assets,
        }
    }

    pub fn active_mode(&self) -> Mode {
        self.state.active
    }

    pub fn ai_enabled(&self) -> bool {
        self.state.ai_enabled
    }

    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    /// Request a transition into a mode. Admission rules are evaluated
    /// first; on acceptance the current mode is fully stopped before the
    /// target starts. If the target's camera acquisition or detector start
    /// fails, the coordinator stays in Idle - the previous mode is not
    /// restored.
    pub async fn request_mode(&mut self, request: ModeRequest) -> Result<()> {
        let decision = admission::decide(
            &self.state,
            &request,
            self.rps.is_running(),
            self.presentation.is_running(),
        );

        match decision {
            Decision::Noop => {
                debug!("Mode {} already active; nothing to do", request);
                Ok(())
            }
            Decision::Refuse(reason) => {
                warn!("Mode request {} refused: {}", request, reason);
                Ok(())
            }
            Decision::Accept => {
                info!("Mode transition: {} -> {}", self.state.active, request);
                self.stop_current_mode().await;
                self.start_mode(request).await
            }
        }
    }

    async fn start_mode(&mut self, request: ModeRequest) -> Result<()> {
        match request {
            ModeRequest::Color(color) => {
                self.start_detector_mode(
                    DetectorSpec::ColorTracking(color),
                    Mode::Color(color),
                    LedState::Color(color.led_index()),
                    Emotion::Happy,
                )
                .await
            }
            ModeRequest::Face => {
                self.start_detector_mode(
                    DetectorSpec::FaceTracking,
                    Mode::Face,
                    LedState::Color(Emotion::Happy.led_index()),
                    Emotion::Happy,
                )
                .await
            }
            ModeRequest::Gesture { actions } => {
                self.start_detector_mode(
                    DetectorSpec::GestureFollowing { actions },
                    Mode::Gesture { actions },
                    LedState::Color(Emotion::Happy.led_index()),
                    Emotion::Happy,
                )
                .await
            }
            ModeRequest::Object => {
                self.start_detector_mode(
                    DetectorSpec::ObjectRecognition {
                        model: PathBuf::from(&self.assets.object_model),
                        labels: PathBuf::from(&self.assets.object_labels),
                    },
                    Mode::Object,
                    LedState::Color(Emotion::Neutral.led_index()),
                    Emotion::Neutral,
                )
                .await
            }
            ModeRequest::Plate => {
                self.start_detector_mode(
                    DetectorSpec::PlateRecognition {
                        font: PathBuf::from(&self.assets.plate_font),
                        sensitivity: self.assets.plate_sensitivity.clone(),
                    },
                    Mode::Plate,
                    LedState::Color(Emotion::Neutral.led_index()),
                    Emotion::Neutral,
                )
                .await
            }
            ModeRequest::Rps => self.start_rps().await,
            ModeRequest::Presentation => self.start_presentation().await,
        }
    }

    /// Shared start path for the plain camera modes.
    async fn start_detector_mode(
        &mut self,
        spec: DetectorSpec,
        mode: Mode,
        led: LedState,
        emotion: Emotion,
    ) -> Result<()> {
        self.camera.acquire().await?;
        self.camera.start_detector(spec).await?;
        self.state.active = mode;

        if let Err(e) = self.hardware.set_led(led).await {
            warn!("LED update failed entering {}: {}", mode, e);
        }
        // The face is only rendered while AI chat is active
        if self.state.ai_enabled {
            if let Err(e) = self.face.set_emotion(emotion).await {
                warn!("Emotion update failed entering {}: {}", mode, e);
            }
        }

        info!("Mode {} active", mode);
        Ok(())
    }

    /// RPS needs the camera for gesture detection (with robot actions
    /// disabled so the motors stay put), the face for the game display,
    /// and its own worker loop.
    async fn start_rps(&mut self) -> Result<()> {
        self.camera.acquire().await?;

        if let Err(e) = self
            .camera
            .start_detector(DetectorSpec::GestureFollowing { actions: false })
            .await
        {
            // The game can still run on raw frames; detection quality only
            warn!("RPS: gesture detection unavailable: {}", e);
        }

        self.ensure_animations().await;
        if let Err(e) = self.face.resume().await {
            warn!("RPS: could not resume face: {}", e);
        }

        let service = Arc::clone(&self.game_service);
        let face = Arc::clone(&self.face);
        let camera = Arc::clone(&self.camera);
        let started = self.rps.start(move |token| async move {
            service.run(face, camera, token).await;
        });
        if let Err(e) = started {
            // Do not leave the gesture detector running with no game
            // loop attached
            self.camera.stop_all().await;
            return Err(e);
        }

        self.state.active = Mode::Rps;
        info!("Mode rps active");
        Ok(())
    }

    /// The presentation needs no camera, only the face and the hardware.
    async fn start_presentation(&mut self) -> Result<()> {
        self.ensure_animations().await;
        if let Err(e) = self.face.resume().await {
            warn!("Presentation: could not resume face: {}", e);
        }

        let service = Arc::clone(&self.presentation_service);
        let face = Arc::clone(&self.face);
        let hardware = Arc::clone(&self.hardware);
        self.presentation.start(move |token| async move {
            service.run(face, hardware, token).await;
        })?;

        self.state.active = Mode::Presentation;
        info!("Mode presentation active");
        Ok(())
    }

    /// Stop whatever is running and return to Idle. Idempotent; every
    /// cleanup step is isolated so one failure never blocks the rest.
    pub async fn stop_current_mode(&mut self) {
        let outcome = self.rps.stop().await;
        log_stop_outcome("rps-game", outcome);
        let outcome = self.presentation.stop().await;
        log_stop_outcome("presentation", outcome);

        self.camera.stop_all().await;

        let mut steps = IsolatedSteps::new("stop_current_mode");
        steps.run("motor_stop", self.hardware.motor_stop()).await;
        steps.run("led_off", self.hardware.set_led(LedState::Off)).await;

        self.state.active = Mode::Idle;

        if self.state.ai_enabled {
            steps
                .run("face_neutral", self.face.set_emotion(Emotion::Neutral))
                .await;
        } else {
            // Save resources: the face is only rendered while something
            // needs it
            steps.run("face_suspend", self.face.suspend()).await;
        }

        debug!("Current mode stopped; idle");
    }

    /// Toggle the AI assistant. Enabling always drains the current mode
    /// first; camera and AI never coexist.
    pub async fn toggle_ai(&mut self) -> Result<()> {
        self.state.ai_enabled = !self.state.ai_enabled;

        if self.state.ai_enabled {
            info!("AI enabling: draining current mode");
            let outcome = self.rps.stop().await;
            log_stop_outcome("rps-game", outcome);
            let outcome = self.presentation.stop().await;
            log_stop_outcome("presentation", outcome);

            if self.camera.is_initialized().await {
                // Chains into start_ai_components once the device is gone
                self.release_camera_completely().await
            } else {
                self.start_ai_components().await
            }
        } else {
            info!("AI disabling");
            let outcome = self.chat.stop().await;
            log_stop_outcome("chatbot", outcome);

            let mut steps = IsolatedSteps::new("ai_disable");
            steps.run("face_suspend", self.face.suspend()).await;
            steps
                .run("face_neutral", self.face.set_emotion(Emotion::Neutral))
                .await;
            steps.run("led_off", self.hardware.set_led(LedState::Off)).await;
            Ok(())
        }
    }

    /// Bring up the conversational assistant: best-effort model preload,
    /// worker spawn, animation loops, face resume, positive emotion.
    async fn start_ai_components(&mut self) -> Result<()> {
        if let Err(e) = self.chat_service.preload().await {
            // The service degrades to a canned response on its own
            warn!("Conversational backend preload failed: {}", e);
        }

        let suppress_greeting = self.state.has_greeted;
        self.state.has_greeted = true;

        let service = Arc::clone(&self.chat_service);
        let face = Arc::clone(&self.face);
        self.chat.start(move |token| async move {
            service.run(face, token, suppress_greeting).await;
        })?;

        self.ensure_animations().await;

        let mut steps = IsolatedSteps::new("ai_enable");
        steps.run("face_resume", self.face.resume()).await;
        steps
            .run("face_happy", self.face.set_emotion(Emotion::Happy))
            .await;
        steps
            .run(
                "led_happy",
                self.hardware
                    .set_led(LedState::Color(Emotion::Happy.led_index())),
            )
            .await;

        info!("AI assistant running");
        Ok(())
    }

    /// Tear down the camera device itself, not just the detectors, so the
    /// next mode request re-acquires a fresh device. Chains into the AI
    /// startup when the toggle is what triggered the release.
    pub async fn release_camera_completely(&mut self) -> Result<()> {
        info!("Releasing camera completely");

        let outcome = self.rps.stop().await;
        log_stop_outcome("rps-game", outcome);
        let outcome = self.presentation.stop().await;
        log_stop_outcome("presentation", outcome);

        self.camera.release().await;
        self.state.active = Mode::Idle;

        let mut steps = IsolatedSteps::new("camera_release");
        steps.run("motor_stop", self.hardware.motor_stop()).await;
        steps.run("led_off", self.hardware.set_led(LedState::Off)).await;

        if self.state.ai_enabled {
            steps
                .run("face_neutral", self.face.set_emotion(Emotion::Neutral))
                .await;
            self.start_ai_components().await
        } else {
            Ok(())
        }
    }

    /// Full teardown at process exit. Idempotent; never propagates.
    pub async fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        info!("Coordinator shutting down");

        let mut steps = IsolatedSteps::new("shutdown");
        steps
            .run("ir_receiver_off", self.hardware.set_ir_receiver(false))
            .await;

        let outcome = self.chat.stop().await;
        log_stop_outcome("chatbot", outcome);
        let outcome = self.presentation.stop().await;
        log_stop_outcome("presentation", outcome);
        let outcome = self.rps.stop().await;
        log_stop_outcome("rps-game", outcome);

        self.stop_current_mode().await;
        self.camera.release().await;

        steps.run("motor_stop", self.hardware.motor_stop()).await;
        steps.run("led_off", self.hardware.set_led(LedState::Off)).await;

        info!("Coordinator shutdown complete");
    }

    /// Start the face animation loops once; they stay running for the
    /// life of the presentation layer.
    async fn ensure_animations(&mut self) {
        if self.animations_started {
            return;
        }
        match self.face.start_animation_loops().await {
            Ok(()) => {
                self.animations_started = true;
                debug!("Face animation loops started");
            }
            Err(e) => warn!("Could not start face animations: {}", e),
        }
    }
}

fn log_stop_outcome(name: &str, outcome: StopOutcome) {
    match outcome {
        StopOutcome::NotRunning => {}
        StopOutcome::Stopped => debug!("Worker '{}' drained", name),
        StopOutcome::Leaked => warn!("Worker '{}' leaked past its grace period", name),
    }
}
