//! Bench keyboard input: translates key presses into IR codes and feeds
//! them into the simulated expansion board, so the whole input path
//! (register poll, debounce, dispatch) runs exactly as it would with the
//! real remote.

use crate::config::IrConfig;
use crate::hardware::SimulatedHardware;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub struct KeyboardInput {
    hardware: Arc<SimulatedHardware>,
    config: IrConfig,
    cancellation_token: CancellationToken,
}

impl KeyboardInput {
    pub fn new(hardware: Arc<SimulatedHardware>, config: IrConfig) -> Self {
        Self {
            hardware,
            config,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Map a key to the IR code of the corresponding remote button.
    fn code_for(config: &IrConfig, key: KeyCode) -> Option<u8> {
        match key {
            KeyCode::Char('r') => Some(config.color_red),
            KeyCode::Char('b') => Some(config.color_blue),
            KeyCode::Char('g') => Some(config.color_green),
            KeyCode::Char('y') => Some(config.color_yellow),
            KeyCode::Char('f') => Some(config.face_mode),
            KeyCode::Char('j') => Some(config.gesture_mode),
            KeyCode::Char('o') => Some(config.object_mode),
            KeyCode::Char('p') => Some(config.plate_mode),
            KeyCode::Char('s') => Some(config.rps_game),
            KeyCode::Char('m') => Some(config.presentation),
            KeyCode::Char('a') => Some(config.ai_toggle),
            KeyCode::Char('x') => Some(config.stop_all),
            KeyCode::Char('q') | KeyCode::Esc => Some(config.exit_app),
            _ => None,
        }
    }

    /// Start listening for key presses on a blocking task.
    pub fn start(&self) {
        info!("Keyboard input active - press 'h' for the key map, 'q' to quit");

        let hardware = Arc::clone(&self.hardware);
        let config = self.config.clone();
        let cancellation_token = self.cancellation_token.clone();

        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            loop {
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard input stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        if let Ok(Event::Key(key_event)) = event::read() {
                            if key_event.kind != KeyEventKind::Press {
                                continue;
                            }
                            if key_event.code == KeyCode::Char('h') {
                                print_key_map();
                                continue;
                            }
                            match Self::code_for(&config, key_event.code) {
                                Some(code) => {
                                    debug!("Key {:?} -> IR {:#04x}", key_event.code, code);
                                    hardware.push_ir_code(code);
                                    if key_event.code == KeyCode::Char('q')
                                        || key_event.code == KeyCode::Esc
                                    {
                                        break;
                                    }
                                }
                                None => {
                                    debug!("Unbound key: {:?}", key_event.code);
                                }
                            }
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            }
            debug!("Keyboard input task exited");
        });
    }

    /// Stop the listener and restore the terminal.
    pub async fn stop(&self) {
        self.cancellation_token.cancel();

        // Give the task a moment to clean up and disable raw mode
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = disable_raw_mode();
    }
}

fn print_key_map() {
    // Raw mode is active, so \r\n
    print!(
        "\r\nkeys: r/b/g/y color tracking  f face  j gesture  o object  p plate\r\n      \
         s rock-paper-scissors  m presentation  a AI toggle  x stop all  q quit\r\n"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_cover_every_remote_button() {
        let config = IrConfig::default();

        assert_eq!(
            KeyboardInput::code_for(&config, KeyCode::Char('r')),
            Some(config.color_red)
        );
        assert_eq!(
            KeyboardInput::code_for(&config, KeyCode::Char('s')),
            Some(config.rps_game)
        );
        assert_eq!(
            KeyboardInput::code_for(&config, KeyCode::Char('a')),
            Some(config.ai_toggle)
        );
        assert_eq!(
            KeyboardInput::code_for(&config, KeyCode::Esc),
            Some(config.exit_app)
        );
        assert_eq!(KeyboardInput::code_for(&config, KeyCode::Char('z')), None);
    }

    #[tokio::test]
    async fn stop_cancels_the_listener() {
        let hardware = Arc::new(SimulatedHardware::new());
        let input = KeyboardInput::new(hardware, IrConfig::default());

        input.stop().await;
        assert!(input.cancellation_token.is_cancelled());
    }
}
