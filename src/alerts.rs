use std::io::Write;

use crossterm::{queue, style::Print};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlertConfig {
    pub bell: bool,
    pub notification: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            bell: true,
            notification: true,
        }
    }
}

/// Ring the terminal bell and hand back the notification line, if enabled.
pub fn fire_alert<W: Write>(config: &AlertConfig, out: &mut W, message: &str) -> Option<String> {
    if config.bell {
        if let Err(e) = queue!(out, Print('\u{0007}')).and_then(|_| out.flush()) {
            log::warn!("bell failed: {}", e);
        }
    }
    config.notification.then(|| message.to_string())
}
