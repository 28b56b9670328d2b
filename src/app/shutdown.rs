use super::App;
use tracing::{error, info};

impl App {
    /// Stop components in reverse dependency order: input sources first
    /// so no new commands arrive, then the coordinator, which drains the
    /// workers and hands back the hardware.
    pub(super) async fn shutdown(&mut self) -> i32 {
        info!("Beginning graceful shutdown");

        let mut exit_code = 0;

        if let Some(keyboard) = &self.keyboard {
            keyboard.stop().await;
        }

        self.router.stop().await;
        self.coordinator.shutdown().await;

        if self.camera.is_initialized().await {
            // The coordinator should have released it; do not leave the
            // device held on exit
            error!("Camera still held after coordinator shutdown; releasing");
            self.camera.release().await;
            exit_code = 1;
        }

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        exit_code
    }
}
