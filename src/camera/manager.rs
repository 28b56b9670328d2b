use super::backend::{CameraBackend, DetectorKind, DetectorSpec, FramePoll};
use crate::error::{Result, RobomuxError};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

struct Inner {
    backend: Box<dyn CameraBackend>,
    initialized: bool,
    active: Vec<DetectorKind>,
}

/// Owns the lifecycle of the shared camera device and its detection
/// sub-modes. The device is acquired lazily on the first camera mode and
/// held until a full release; detectors start and stop independently, but
/// the coordinator only ever drives one at a time.
pub struct CameraManager {
    inner: Mutex<Inner>,
    // Checked lock-free by the display poll so it reports idle instead of
    // racing a half-torn-down device.
    shutting_down: AtomicBool,
    device_index: u32,
}

impl CameraManager {
    pub fn new(backend: Box<dyn CameraBackend>, device_index: u32) -> Self {
        Self {
            inner: Mutex::new(Inner {
                backend,
                initialized: false,
                active: Vec::new(),
            }),
            shutting_down: AtomicBool::new(false),
            device_index,
        }
    }

    /// Open the device if it is not already held. Failure leaves the
    /// manager uninitialized so the next mode request can retry.
    pub async fn acquire(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.initialized {
            return Ok(());
        }

        match inner.backend.open(self.device_index).await {
            Ok(()) => {
                inner.initialized = true;
                info!("Camera device {} acquired", self.device_index);
                Ok(())
            }
            Err(e) => {
                inner.initialized = false;
                Err(RobomuxError::camera(format!(
                    "device {} could not be opened: {}",
                    self.device_index, e
                )))
            }
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.inner.lock().await.initialized
    }

    /// Start one detector. Requires a prior successful `acquire`. Object
    /// and plate detection validate their asset files up front and refuse
    /// without touching the device when anything is missing.
    pub async fn start_detector(&self, spec: DetectorSpec) -> Result<()> {
        validate_assets(&spec)?;

        let mut inner = self.inner.lock().await;
        if !inner.initialized {
            return Err(RobomuxError::camera("device not acquired"));
        }

        let kind = spec.kind();
        inner.backend.start(&spec).await?;
        if !inner.active.contains(&kind) {
            inner.active.push(kind);
        }
        info!("Detector started: {}", kind);
        Ok(())
    }

    /// Stop every active detector. Each stop is isolated so one failing
    /// detector does not block stopping the others. Safe no-op when none
    /// are active.
    pub async fn stop_all(&self) {
        let mut inner = self.inner.lock().await;
        let active = std::mem::take(&mut inner.active);
        for kind in active {
            if let Err(e) = inner.backend.stop(kind).await {
                warn!("Failed to stop {}: {}", kind, e);
            } else {
                debug!("Detector stopped: {}", kind);
            }
        }
    }

    /// Active detector kinds (for tests and diagnostics).
    pub async fn active_detectors(&self) -> Vec<DetectorKind> {
        self.inner.lock().await.active.clone()
    }

    /// Stop all detectors and release the device itself, returning the
    /// manager to the uninitialized state. Safe to call when never
    /// acquired.
    pub async fn release(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);

        {
            let mut inner = self.inner.lock().await;
            let active = std::mem::take(&mut inner.active);
            for kind in active {
                if let Err(e) = inner.backend.stop(kind).await {
                    warn!("Failed to stop {} during release: {}", kind, e);
                }
            }
            if inner.initialized {
                if let Err(e) = inner.backend.close().await {
                    warn!("Camera device release failed: {}", e);
                }
                inner.initialized = false;
                info!("Camera device released");
            }
        }

        self.shutting_down.store(false, Ordering::SeqCst);
    }

    /// Non-blocking display poll. Reports idle when no device is held or a
    /// release is in progress.
    pub async fn poll_frame(&self) -> FramePoll {
        if self.shutting_down.load(Ordering::SeqCst) {
            return FramePoll::Idle;
        }

        // Never wait on the lock from the UI loop; a mode transition
        // holding it just means this tick shows nothing.
        let Ok(mut inner) = self.inner.try_lock() else {
            return FramePoll::Idle;
        };
        if !inner.initialized {
            return FramePoll::Idle;
        }

        match inner.backend.poll_frame().await {
            Ok(poll) => poll,
            Err(e) => {
                warn!("Frame poll failed: {}", e);
                FramePoll::Idle
            }
        }
    }
}

/// Check that the asset files a detector needs actually exist, and build a
/// remediation diagnostic when they do not.
fn validate_assets(spec: &DetectorSpec) -> Result<()> {
    match spec {
        DetectorSpec::ObjectRecognition { model, labels } => {
            let mut missing = Vec::new();
            if !model.exists() {
                missing.push(format!("  missing model: {}", model.display()));
            }
            if !labels.exists() {
                missing.push(format!("  missing label map: {}", labels.display()));
            }
            if missing.is_empty() {
                return Ok(());
            }
            let diagnostic = format!(
                "{}\n  expected layout:\n    models/object/frozen_inference_graph.pb\n    models/object/mscoco_label_map.pbtxt\n  (COCO SSD Lite; heavy on a Pi - consider skipping object mode)",
                missing.join("\n")
            );
            Err(RobomuxError::AssetMissing { diagnostic })
        }
        DetectorSpec::PlateRecognition { font, .. } => {
            if font.exists() {
                return Ok(());
            }
            let diagnostic = format!(
                "  missing plate font: {}\n  expected layout:\n    models/plate/platech.ttf",
                font.display()
            );
            Err(RobomuxError::AssetMissing { diagnostic })
        }
        _ => Ok(()),
    }
}

impl CameraManager {
    /// Asset validation entry point for tests.
    #[cfg(test)]
    pub fn check_assets(spec: &DetectorSpec) -> Result<()> {
        validate_assets(spec)
    }
}
