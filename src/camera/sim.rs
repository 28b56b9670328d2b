use super::backend::{CameraBackend, DetectorKind, DetectorSpec, FramePoll};
use crate::error::{Result, RobomuxError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Default)]
struct SimState {
    open: bool,
    fail_open: bool,
    seq: u64,
    active: Vec<DetectorSpec>,
    pending_keys: VecDeque<char>,
    started_log: Vec<DetectorSpec>,
}

/// In-process camera backend: tracks open/detector state and synthesizes
/// frame sequence numbers. Lets the whole mode machine run on a bench with
/// no camera attached, and doubles as the test backend. Clones share state
/// so a handle kept outside the manager observes everything it does.
#[derive(Clone, Default)]
pub struct SimCameraBackend {
    state: Arc<Mutex<SimState>>,
}

impl SimCameraBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `open` calls fail, simulating a held or missing
    /// device.
    pub fn fail_next_open(&self, fail: bool) {
        self.state.lock().fail_open = fail;
    }

    /// Queue a key event to be reported by a later poll.
    pub fn push_key(&self, key: char) {
        self.state.lock().pending_keys.push_back(key);
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    pub fn active_detectors(&self) -> Vec<DetectorKind> {
        self.state.lock().active.iter().map(DetectorSpec::kind).collect()
    }

    /// Every detector ever started, in order.
    pub fn started_log(&self) -> Vec<DetectorSpec> {
        self.state.lock().started_log.clone()
    }
}

#[async_trait]
impl CameraBackend for SimCameraBackend {
    async fn open(&mut self, index: u32) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_open {
            return Err(RobomuxError::camera(format!(
                "simulated open failure for device {}",
                index
            )));
        }
        info!("sim camera: device {} opened", index);
        state.open = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        info!("sim camera: device closed");
        let mut state = self.state.lock();
        state.open = false;
        state.active.clear();
        Ok(())
    }

    async fn start(&mut self, spec: &DetectorSpec) -> Result<()> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(RobomuxError::camera("device not open"));
        }
        debug!("sim camera: start {}", spec.kind());
        let kind = spec.kind();
        state.active.retain(|s| s.kind() != kind);
        state.active.push(spec.clone());
        state.started_log.push(spec.clone());
        Ok(())
    }

    async fn stop(&mut self, kind: DetectorKind) -> Result<()> {
        debug!("sim camera: stop {}", kind);
        self.state.lock().active.retain(|s| s.kind() != kind);
        Ok(())
    }

    async fn poll_frame(&mut self) -> Result<FramePoll> {
        let mut state = self.state.lock();
        if !state.open {
            return Ok(FramePoll::Idle);
        }
        if let Some(key) = state.pending_keys.pop_front() {
            return Ok(FramePoll::Key(key));
        }
        state.seq += 1;
        Ok(FramePoll::Frame { seq: state.seq })
    }
}
