// primus/src/config.rs
//
//! Compile-time defaults and their environment overrides.
//!
//! Every knob has a baked-in default that an environment variable of the
//! same name can override at load time; distributions are expected to patch
//! the defaults rather than wrap the library in shell scripts.

use std::env;

/// Default X display of the accelerating GPU.
const DEFAULT_ACCEL_DISPLAY: &str = ":8";
/// Default candidate list for the accelerating vendor's libGL.
const DEFAULT_ACCEL_LIBGL: &str = "/usr/lib/nvidia/libGL.so.1";
/// Default candidate list for the displaying vendor's libGL.
const DEFAULT_DISPLAY_LIBGL: &str = "/usr/lib/libGL.so.1";
/// Library that must be visible process-wide before the accelerating GL is
/// loaded (Mesa resolves its dispatch table through it).
const DEFAULT_LOAD_GLOBAL: &str = "libglapi.so.0";
/// Socket of the daemon that powers up the secondary display.
#[cfg(feature = "bridge")]
const DEFAULT_BRIDGE_SOCKET: &str = "/var/run/bumblebee.socket";

/// Readback/display synchronization method.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SyncMode {
    /// The application is released as soon as the readback is queued; frames
    /// may be dropped when the display side cannot keep up.
    None,
    /// The display lags one frame behind, overlapping the GPU readback of a
    /// frame with the upload of the previous one.
    Lagged,
    /// The application is released only after its frame was presented.
    Strict,
}

impl SyncMode {
    pub fn from_env() -> SyncMode {
        SyncMode::parse(env::var("PRIMUS_SYNC").ok().as_deref())
    }

    fn parse(value: Option<&str>) -> SyncMode {
        match value.and_then(|v| v.parse::<u32>().ok()).unwrap_or(0) {
            1 => SyncMode::Lagged,
            2 => SyncMode::Strict,
            _ => SyncMode::None,
        }
    }
}

fn getconf(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

/// 0: only errors, 1: also warnings, 2: also profiling.
pub fn verbosity() -> u32 {
    getconf("PRIMUS_VERBOSE", "1").parse().unwrap_or(1)
}

pub fn accel_display() -> String {
    getconf("PRIMUS_DISPLAY", DEFAULT_ACCEL_DISPLAY)
}

pub fn accel_libgl() -> String {
    getconf("PRIMUS_libGLa", DEFAULT_ACCEL_LIBGL)
}

pub fn display_libgl() -> String {
    getconf("PRIMUS_libGLd", DEFAULT_DISPLAY_LIBGL)
}

pub fn load_global() -> String {
    getconf("PRIMUS_LOAD_GLOBAL", DEFAULT_LOAD_GLOBAL)
}

#[cfg(feature = "bridge")]
pub fn bridge_socket() -> String {
    getconf("BUMBLEBEE_SOCKET", DEFAULT_BRIDGE_SOCKET)
}

#[cfg(test)]
mod tests {
    use super::SyncMode;

    #[test]
    fn sync_mode_parsing() {
        assert_eq!(SyncMode::parse(None), SyncMode::None);
        assert_eq!(SyncMode::parse(Some("0")), SyncMode::None);
        assert_eq!(SyncMode::parse(Some("1")), SyncMode::Lagged);
        assert_eq!(SyncMode::parse(Some("2")), SyncMode::Strict);
        assert_eq!(SyncMode::parse(Some("junk")), SyncMode::None);
        assert_eq!(SyncMode::parse(Some("7")), SyncMode::None);
    }
}
