//! Application-wide constants
//!
//! Magic numbers and string literals used throughout the application.

/// X11 protocol constants
pub mod x11 {
    /// Size of PID property value in bytes
    pub const PID_PROPERTY_SIZE: usize = 4;

    /// Longest title read from `_NET_WM_NAME` / `WM_NAME`, in 32-bit units
    pub const MAX_TITLE_LENGTH: u32 = 1024;
}

/// RandR monitor discovery
pub mod randr {
    /// GetMonitors needs RandR 1.5
    pub const MAJOR_VERSION: u32 = 1;
    pub const MINOR_VERSION: u32 = 5;

    /// Name of the single display used when RandR cannot list monitors
    pub const FALLBACK_DISPLAY_NAME: &str = "screen-0";
}

/// Config file location
pub mod config {
    pub const APP_DIR: &str = "monitor-mover";
    pub const FILENAME: &str = "config.json";
}

/// Runtime files
pub mod paths {
    /// Held for the duration of a relocation pass
    pub const LOCK_FILE: &str = "monitor-mover/relocate.lock";
}

/// Environment variables
pub mod env {
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const ROUNDING: &str = "MONITOR_MOVER_ROUNDING";
    pub const CONTAINMENT: &str = "MONITOR_MOVER_CONTAINMENT";
}
