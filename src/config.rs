//! Frontend configuration.

use crate::keyboard::XkbConfig;

/// Tunables for the protocol frontend.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the listening socket under `XDG_RUNTIME_DIR`.
    pub socket_name: String,
    /// Keep a recurring 60 ms timer in the protocol loop.
    ///
    /// The tick flushes queued client events, which also covers events
    /// emitted by coordinator threads while the loop is parked in poll.
    pub loop_watchdog: bool,
    /// Keymap compilation names.
    pub xkb: XkbConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            socket_name: "wayland-0".into(),
            loop_watchdog: true,
            xkb: XkbConfig::default(),
        }
    }
}
