use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Face emotions. Each maps to an LED bar color so the body matches
/// the expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emotion {
    Happy,
    Neutral,
    Angry,
    Shy,
    Confused,
    Scared,
}

impl Emotion {
    /// LED color index for this emotion (expansion board convention:
    /// red=0, green=1, blue=2, yellow=3, purple=4).
    pub fn led_index(self) -> u8 {
        match self {
            Emotion::Happy => 1,
            Emotion::Neutral => 2,
            Emotion::Angry => 0,
            Emotion::Shy => 4,
            Emotion::Confused => 3,
            Emotion::Scared => 0,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Emotion::Happy => "happy",
            Emotion::Neutral => "neutral",
            Emotion::Angry => "angry",
            Emotion::Shy => "shy",
            Emotion::Confused => "confused",
            Emotion::Scared => "scared",
        };
        write!(f, "{}", name)
    }
}

/// Boundary to the face rendering/animation/voice-synthesis service.
///
/// The coordinator only ever drives this surface; rendering internals live
/// behind it. `start_animation_loops` must be idempotent: once the loops
/// run they stay running for the life of the service.
#[async_trait]
pub trait FaceService: Send + Sync {
    /// Show the face window.
    async fn resume(&self) -> Result<()>;

    /// Hide the face window to save resources.
    async fn suspend(&self) -> Result<()>;

    async fn set_emotion(&self, emotion: Emotion) -> Result<()>;

    /// Start blink/idle animation loops. No-op if already started.
    async fn start_animation_loops(&self) -> Result<()>;

    /// Overlay a game image (RPS move reveal) on the face canvas.
    async fn display_game_image(&self, path: &Path) -> Result<()>;

    async fn clear_game_image(&self) -> Result<()>;
}

/// Headless face service: logs the calls and does nothing else. Used when
/// no display is attached.
#[derive(Default)]
pub struct NullFace;

impl NullFace {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FaceService for NullFace {
    async fn resume(&self) -> Result<()> {
        debug!("face: resume");
        Ok(())
    }

    async fn suspend(&self) -> Result<()> {
        debug!("face: suspend");
        Ok(())
    }

    async fn set_emotion(&self, emotion: Emotion) -> Result<()> {
        debug!("face: emotion -> {}", emotion);
        Ok(())
    }

    async fn start_animation_loops(&self) -> Result<()> {
        debug!("face: animation loops started");
        Ok(())
    }

    async fn display_game_image(&self, path: &Path) -> Result<()> {
        debug!("face: show game image {}", path.display());
        Ok(())
    }

    async fn clear_game_image(&self) -> Result<()> {
        debug!("face: clear game image");
        Ok(())
    }
}

/// Test double that records every call.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingFace {
    calls: parking_lot::Mutex<Vec<FaceCall>>,
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum FaceCall {
    Resume,
    Suspend,
    Emotion(Emotion),
    Animations,
    ShowImage(std::path::PathBuf),
    ClearImage,
}

#[cfg(test)]
impl RecordingFace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<FaceCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &FaceCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }
}

#[cfg(test)]
#[async_trait]
impl FaceService for RecordingFace {
    async fn resume(&self) -> Result<()> {
        self.calls.lock().push(FaceCall::Resume);
        Ok(())
    }

    async fn suspend(&self) -> Result<()> {
        self.calls.lock().push(FaceCall::Suspend);
        Ok(())
    }

    async fn set_emotion(&self, emotion: Emotion) -> Result<()> {
        self.calls.lock().push(FaceCall::Emotion(emotion));
        Ok(())
    }

    async fn start_animation_loops(&self) -> Result<()> {
        self.calls.lock().push(FaceCall::Animations);
        Ok(())
    }

    async fn display_game_image(&self, path: &Path) -> Result<()> {
        self.calls.lock().push(FaceCall::ShowImage(path.to_path_buf()));
        Ok(())
    }

    async fn clear_game_image(&self) -> Result<()> {
        self.calls.lock().push(FaceCall::ClearImage);
        Ok(())
    }
}
