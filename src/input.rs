//! IR remote input path: poll the expansion board's IR register on a
//! fixed interval, debounce repeats, translate codes into [`Command`]s
//! and hand them to the control loop over a channel.
//!
//! The router never touches the coordinator directly; everything it
//! produces is marshalled through the channel so mode transitions always
//! happen on the loop that owns the coordinator.

use crate::camera::TrackColor;
use crate::config::IrConfig;
use crate::coordinator::ModeRequest;
use crate::hardware::Hardware;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// IR register value meaning "no button pressed".
const CODE_NONE: u8 = 0x00;
/// Register values at or above this mark a failed read.
const CODE_INVALID: u8 = 0xFF;

/// Everything the remote (or the keyboard stand-in) can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Mode(ModeRequest),
    ToggleAi,
    StopAll,
    Exit,
}

/// Drops repeats of the same code inside a fixed window. A different
/// code is always let through and resets the window.
#[derive(Debug)]
pub struct Debounce {
    window: Duration,
    bypass: bool,
    last: Option<(u8, Instant)>,
}

impl Debounce {
    pub fn new(window: Duration, bypass: bool) -> Self {
        Self {
            window,
            bypass,
            last: None,
        }
    }

    /// Returns true if the code should be acted on.
    pub fn observe(&mut self, code: u8, now: Instant) -> bool {
        if self.bypass {
            return true;
        }
        let accept = match self.last {
            Some((prev, at)) => prev != code || now.duration_since(at) >= self.window,
            None => true,
        };
        if accept {
            self.last = Some((code, now));
        }
        accept
    }
}

/// Translate a raw IR code into a command using the configured layout.
/// Returns None for codes with no assigned button.
pub fn map_code(ir: &IrConfig, code: u8) -> Option<Command> {
    let command = if code == ir.color_red {
        Command::Mode(ModeRequest::Color(TrackColor::Red))
    } else if code == ir.color_blue {
        Command::Mode(ModeRequest::Color(TrackColor::Blue))
    } else if code == ir.color_green {
        Command::Mode(ModeRequest::Color(TrackColor::Green))
    } else if code == ir.color_yellow {
        Command::Mode(ModeRequest::Color(TrackColor::Yellow))
    } else if code == ir.face_mode {
        Command::Mode(ModeRequest::Face)
    } else if code == ir.gesture_mode {
        Command::Mode(ModeRequest::Gesture { actions: true })
    } else if code == ir.object_mode {
        Command::Mode(ModeRequest::Object)
    } else if code == ir.plate_mode {
        Command::Mode(ModeRequest::Plate)
    } else if code == ir.rps_game {
        Command::Mode(ModeRequest::Rps)
    } else if code == ir.presentation {
        Command::Mode(ModeRequest::Presentation)
    } else if code == ir.ai_toggle {
        Command::ToggleAi
    } else if code == ir.stop_all {
        Command::StopAll
    } else if code == ir.exit_app {
        Command::Exit
    } else {
        return None;
    };
    Some(command)
}

/// Background task that polls the IR register and feeds the command
/// channel.
pub struct InputRouter {
    hardware: Arc<dyn Hardware>,
    config: IrConfig,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl InputRouter {
    pub fn new(hardware: Arc<dyn Hardware>, config: IrConfig) -> Self {
        Self {
            hardware,
            config,
            cancel: CancellationToken::new(),
            handle: None,
        }
    }

    /// Enable the receiver and spawn the poll loop.
    pub async fn start(&mut self, tx: mpsc::UnboundedSender<Command>) -> crate::error::Result<()> {
        self.hardware.set_ir_receiver(true).await?;

        let hardware = Arc::clone(&self.hardware);
        let config = self.config.clone();
        let cancel = self.cancel.clone();
        let handle = tokio::spawn(async move {
            poll_loop(hardware, config, tx, cancel).await;
        });
        self.handle = Some(handle);
        info!(
            "IR input router started (poll {}ms, debounce {}ms{})",
            self.config.poll_interval_ms,
            self.config.debounce_ms,
            if self.config.debug { ", debug" } else { "" }
        );
        Ok(())
    }

    /// Print the remote layout so the user knows which button does what.
    pub fn print_command_map(&self) {
        let ir = &self.config;
        println!("IR remote commands:");
        println!(
            "  {:#04x}/{:#04x}/{:#04x}/{:#04x}  track red/blue/green/yellow",
            ir.color_red, ir.color_blue, ir.color_green, ir.color_yellow
        );
        println!("  {:#04x}  face tracking", ir.face_mode);
        println!("  {:#04x}  gesture following", ir.gesture_mode);
        println!("  {:#04x}  object recognition", ir.object_mode);
        println!("  {:#04x}  plate recognition", ir.plate_mode);
        println!("  {:#04x}  rock-paper-scissors", ir.rps_game);
        println!("  {:#04x}  presentation", ir.presentation);
        println!("  {:#04x}  AI assistant on/off", ir.ai_toggle);
        println!("  {:#04x}  stop everything", ir.stop_all);
        println!("  {:#04x}  exit", ir.exit_app);
    }

    /// Stop the poll loop and disable the receiver.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("IR poll loop did not exit cleanly: {}", e);
            }
        }
        if let Err(e) = self.hardware.set_ir_receiver(false).await {
            warn!("Could not disable IR receiver: {}", e);
        }
        debug!("IR input router stopped");
    }
}

async fn poll_loop(
    hardware: Arc<dyn Hardware>,
    config: IrConfig,
    tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
) {
    let interval = Duration::from_millis(config.poll_interval_ms);
    let mut debounce = Debounce::new(Duration::from_millis(config.debounce_ms), config.debug);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }

        let code = match hardware.read_ir_register().await {
            Ok(code) => code,
            Err(e) => {
                warn!("IR register read failed: {}", e);
                continue;
            }
        };

        if code == CODE_NONE || code >= CODE_INVALID {
            continue;
        }

        if config.debug {
            info!("IR code received: {:#04x}", code);
        }

        if !debounce.observe(code, Instant::now()) {
            continue;
        }

        match map_code(&config, code) {
            Some(command) => {
                debug!("IR {:#04x} -> {:?}", code, command);
                if let Err(e) = hardware.beep().await {
                    warn!("Acknowledge beep failed: {}", e);
                }
                if tx.send(command).is_err() {
                    // Receiver gone; the app is shutting down
                    break;
                }
            }
            None => {
                if config.debug {
                    if let Err(e) = hardware.beep().await {
                        warn!("Acknowledge beep failed: {}", e);
                    }
                    info!("IR code {:#04x} has no assigned command", code);
                } else {
                    debug!("Ignoring unassigned IR code {:#04x}", code);
                }
            }
        }
    }

    debug!("IR poll loop exited");
}
