use notify_rust::Notification;
use thiserror::Error;

use crate::pomodoro::pomodoro::Alert;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("desktop notification failed: {0}")]
    Desktop(String),
}

/// Desktop popup for phase boundary alerts. Does not block the event loop
/// waiting for the user; the popup stays until dismissed.
pub struct DesktopNotifier {
    enabled: bool,
}

impl DesktopNotifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn send(&self, alert: Alert) -> Result<(), NotifyError> {
        if !self.enabled {
            return Ok(());
        }
        Notification::new()
            .summary(&format!("Pomodoro - {}", alert.title()))
            .body(alert.message())
            .timeout(0) // No auto-dismiss
            .show()
            .map_err(|e| NotifyError::Desktop(e.to_string()))?;
        Ok(())
    }
}
