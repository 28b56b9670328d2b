use super::ShutdownReason;
use crate::camera::{CameraManager, FramePoll};
use crate::coordinator::ModeCoordinator;
use crate::error::{Result, RobomuxError};
use crate::input::{Command, InputRouter};
use crate::keys::KeyboardInput;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

/// How often the display tick polls for a rendered camera frame.
const FRAME_TICK: Duration = Duration::from_millis(50);

/// What the command handler tells the main loop to do next.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Flow {
    Continue,
    Exit,
}

pub struct App {
    pub(super) coordinator: ModeCoordinator,
    pub(super) camera: Arc<CameraManager>,
    pub(super) router: InputRouter,
    pub(super) keyboard: Option<KeyboardInput>,

    pub(super) command_tx: mpsc::UnboundedSender<Command>,
    pub(super) command_rx: mpsc::UnboundedReceiver<Command>,

    pub(super) shutdown_sender: Option<oneshot::Sender<ShutdownReason>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
}

impl App {
    pub fn new(
        coordinator: ModeCoordinator,
        camera: Arc<CameraManager>,
        router: InputRouter,
        keyboard: Option<KeyboardInput>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        Self {
            coordinator,
            camera,
            router,
            keyboard,
            command_tx,
            command_rx,
            shutdown_sender: Some(shutdown_sender),
            shutdown_receiver: Some(shutdown_receiver),
        }
    }

    /// A sender for injecting commands from outside the input router.
    pub fn command_sender(&self) -> mpsc::UnboundedSender<Command> {
        self.command_tx.clone()
    }

    /// Bring up the input sources.
    pub async fn start(&mut self) -> Result<()> {
        self.router.start(self.command_tx.clone()).await?;
        if let Some(keyboard) = &self.keyboard {
            keyboard.start();
        }
        Ok(())
    }

    /// Run the main loop until an exit command, a window quit key or a
    /// process signal, then shut everything down. Returns the exit code.
    pub async fn run(&mut self) -> Result<i32> {
        info!("Robot control loop running");
        self.router.print_command_map();

        let shutdown_sender = self
            .shutdown_sender
            .take()
            .ok_or_else(|| RobomuxError::component("app", "shutdown sender already taken"))?;
        let mut shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| RobomuxError::component("app", "shutdown receiver already taken"))?;

        Self::setup_signal_handlers(shutdown_sender).await;

        let mut frame_tick = tokio::time::interval(FRAME_TICK);
        frame_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let reason = loop {
            tokio::select! {
                result = &mut shutdown_receiver => {
                    match result {
                        Ok(reason) => break reason,
                        Err(_) => break ShutdownReason::UserRequest,
                    }
                }
                command = self.command_rx.recv() => {
                    match command {
                        Some(command) => {
                            if self.handle_command(command).await == Flow::Exit {
                                break ShutdownReason::UserRequest;
                            }
                        }
                        // All senders dropped; nothing left to wait for
                        None => break ShutdownReason::UserRequest,
                    }
                }
                _ = frame_tick.tick() => {
                    if let FramePoll::Key(key) = self.camera.poll_frame().await {
                        debug!("Display window key: {:?}", key);
                        if key == 'q' {
                            break ShutdownReason::UserRequest;
                        }
                    }
                }
            }
        };

        info!("Shutdown initiated: {:?}", reason);
        let exit_code = self.shutdown().await;
        info!("Robot control loop exited");
        Ok(exit_code)
    }

    /// Apply one command to the coordinator. Errors are logged, never
    /// fatal: a missing camera or asset must not take down the control
    /// loop.
    pub(super) async fn handle_command(&mut self, command: Command) -> Flow {
        debug!("Handling command: {:?}", command);
        match command {
            Command::Mode(request) => {
                if let Err(e) = self.coordinator.request_mode(request).await {
                    warn!("Could not enter mode {}: {}", request, e);
                }
            }
            Command::ToggleAi => {
                if let Err(e) = self.coordinator.toggle_ai().await {
                    warn!("AI toggle failed: {}", e);
                }
            }
            Command::StopAll => {
                self.coordinator.stop_current_mode().await;
                if self.coordinator.ai_enabled() {
                    if let Err(e) = self.coordinator.toggle_ai().await {
                        warn!("AI shutdown failed: {}", e);
                    }
                }
                // Stop-all hands the camera device itself back, not just
                // the detectors; AI is already off so this cannot respawn
                // the assistant.
                if let Err(e) = self.coordinator.release_camera_completely().await {
                    warn!("Stop-all camera release failed: {}", e);
                }
                self.router.print_command_map();
            }
            Command::Exit => return Flow::Exit,
        }
        Flow::Continue
    }

    /// Register SIGTERM (Unix) and Ctrl+C handlers that end the main
    /// loop through the shutdown channel.
    async fn setup_signal_handlers(shutdown_sender: oneshot::Sender<ShutdownReason>) {
        let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));

        #[cfg(unix)]
        {
            let sender = Arc::clone(&shutdown_sender);
            tokio::spawn(async move {
                let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate())
                {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };
                if sigterm.recv().await.is_some() {
                    info!("Received SIGTERM signal");
                    if let Some(sender) = sender.lock().await.take() {
                        let _ = sender.send(ShutdownReason::Signal("SIGTERM".to_string()));
                    }
                }
            });
        }

        let sender = Arc::clone(&shutdown_sender);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received SIGINT signal (Ctrl+C)");
                if let Some(sender) = sender.lock().await.take() {
                    let _ = sender.send(ShutdownReason::Signal("SIGINT".to_string()));
                }
            }
        });
    }
}
