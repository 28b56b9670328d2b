use crate::camera::CameraManager;
use crate::error::Result;
use crate::face::{Emotion, FaceService};
use crate::hardware::Hardware;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Conversational voice-assistant entry point. The loop owns speech
/// recognition and response generation internally; the coordinator only
/// starts and cancels it.
///
/// A failed `preload` must degrade inside `run` to a canned apology
/// response rather than abort the loop.
#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Best-effort model warm-up before the worker spawns.
    async fn preload(&self) -> Result<()>;

    async fn run(
        &self,
        face: Arc<dyn FaceService>,
        cancel: CancellationToken,
        suppress_greeting: bool,
    );
}

/// Rock-Paper-Scissors game loop entry point. Reads the player's hand
/// through the camera manager's gesture detector.
#[async_trait]
pub trait GameService: Send + Sync {
    async fn run(
        &self,
        face: Arc<dyn FaceService>,
        camera: Arc<CameraManager>,
        cancel: CancellationToken,
    );
}

/// Scripted self-introduction sequence entry point.
#[async_trait]
pub trait PresentationService: Send + Sync {
    async fn run(
        &self,
        face: Arc<dyn FaceService>,
        hardware: Arc<dyn Hardware>,
        cancel: CancellationToken,
    );
}

// Sleep that wakes early on cancellation; the contract every service loop
// owes its worker wrapper.
async fn cancellable_sleep(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Bench-mode conversation loop: greets, then idles while polling its
/// token. Stands in for the real speech pipeline.
#[derive(Default)]
pub struct SimConversation;

#[async_trait]
impl ConversationService for SimConversation {
    async fn preload(&self) -> Result<()> {
        debug!("sim chat: model preload (no-op)");
        Ok(())
    }

    async fn run(
        &self,
        face: Arc<dyn FaceService>,
        cancel: CancellationToken,
        suppress_greeting: bool,
    ) {
        if suppress_greeting {
            debug!("sim chat: greeting suppressed");
        } else {
            info!("sim chat: hello!");
            if let Err(e) = face.set_emotion(Emotion::Happy).await {
                warn!("sim chat: emotion update failed: {}", e);
            }
        }

        while cancellable_sleep(&cancel, Duration::from_millis(200)).await {}
        info!("sim chat: loop exited");
    }
}

/// Bench-mode RPS loop: ticks until cancelled.
#[derive(Default)]
pub struct SimGame;

#[async_trait]
impl GameService for SimGame {
    async fn run(
        &self,
        face: Arc<dyn FaceService>,
        camera: Arc<CameraManager>,
        cancel: CancellationToken,
    ) {
        info!("sim rps: game loop running");
        if let Err(e) = face
            .display_game_image(std::path::Path::new("assets/rps/ready.png"))
            .await
        {
            warn!("sim rps: could not show the ready screen: {}", e);
        }

        while cancellable_sleep(&cancel, Duration::from_millis(200)).await {
            let _ = camera.poll_frame().await;
        }

        if let Err(e) = face.clear_game_image().await {
            warn!("sim rps: could not clear the game screen: {}", e);
        }
        info!("sim rps: game loop exited");
    }
}

/// Bench-mode presentation: a couple of emotion beats, then waits for
/// cancellation.
#[derive(Default)]
pub struct SimPresentation;

#[async_trait]
impl PresentationService for SimPresentation {
    async fn run(
        &self,
        face: Arc<dyn FaceService>,
        hardware: Arc<dyn Hardware>,
        cancel: CancellationToken,
    ) {
        info!("sim presentation: sequence running");
        for emotion in [Emotion::Happy, Emotion::Shy, Emotion::Happy] {
            if !cancellable_sleep(&cancel, Duration::from_millis(300)).await {
                break;
            }
            if let Err(e) = face.set_emotion(emotion).await {
                warn!("sim presentation: emotion update failed: {}", e);
            }
        }
        while cancellable_sleep(&cancel, Duration::from_millis(200)).await {}

        if let Err(e) = hardware.motor_stop().await {
            warn!("sim presentation: motor stop failed: {}", e);
        }
        info!("sim presentation: sequence exited");
    }
}
