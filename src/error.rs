//! Startup failures
//!
//! Every failure the clock can hit happens before the first frame. Each one
//! is a distinct terminal condition: it is logged and the process exits.

use std::error::Error;
use std::fmt;

use smithay_client_toolkit::reexports::calloop;
use wayland_client::ConnectError;
use wayland_client::globals::{BindError, GlobalError};

#[derive(Debug)]
pub enum StartupError {
    /// No Wayland compositor to connect to
    Connect(ConnectError),
    /// The initial registry roundtrip failed
    Registry(GlobalError),
    /// A required protocol global is not advertised
    MissingGlobal(&'static str, BindError),
    /// The compositor reported no outputs
    NoMonitor,
    /// The requested output name does not exist
    MonitorNotFound(String),
    /// The selected output has no display modes
    NoDisplayMode(String),
    /// The idle-inhibit protocol is unavailable
    ScreensaverControl(BindError),
    EventLoop(calloop::Error),
    /// The compositor never sized the clock surface
    NotConfigured,
    /// The Wayland display or surface pointer is null
    RawHandle,
    Surface(wgpu::CreateSurfaceError),
    NoAdapter,
    /// The surface accepts no texture format on the chosen adapter
    NoSurfaceFormat,
    Device(wgpu::RequestDeviceError),
    /// Shader compilation or pipeline validation failed
    Shader(String),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StartupError::Connect(e) => write!(f, "failed to connect to Wayland: {}", e),
            StartupError::Registry(e) => write!(f, "failed to read Wayland globals: {}", e),
            StartupError::MissingGlobal(name, e) => {
                write!(f, "compositor does not provide {}: {}", name, e)
            }
            StartupError::NoMonitor => write!(f, "no monitor"),
            StartupError::MonitorNotFound(name) => write!(f, "monitor {} not found", name),
            StartupError::NoDisplayMode(name) => write!(f, "monitor {} has no display modes", name),
            StartupError::ScreensaverControl(e) => {
                write!(f, "cannot suspend the screensaver (idle inhibit unavailable): {}", e)
            }
            StartupError::EventLoop(e) => write!(f, "event loop error: {}", e),
            StartupError::NotConfigured => write!(f, "clock surface was never configured"),
            StartupError::RawHandle => write!(f, "invalid Wayland handle"),
            StartupError::Surface(e) => write!(f, "failed to create GPU surface: {}", e),
            StartupError::NoAdapter => write!(f, "no compatible GPU adapter"),
            StartupError::NoSurfaceFormat => write!(f, "GPU surface supports no texture format"),
            StartupError::Device(e) => write!(f, "failed to open GPU device: {}", e),
            StartupError::Shader(msg) => write!(f, "segment shader rejected: {}", msg),
        }
    }
}

impl Error for StartupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StartupError::Connect(e) => Some(e),
            StartupError::Registry(e) => Some(e),
            StartupError::MissingGlobal(_, e) | StartupError::ScreensaverControl(e) => Some(e),
            StartupError::EventLoop(e) => Some(e),
            StartupError::Surface(e) => Some(e),
            StartupError::Device(e) => Some(e),
            StartupError::NoMonitor
            | StartupError::MonitorNotFound(_)
            | StartupError::NoDisplayMode(_)
            | StartupError::NotConfigured
            | StartupError::RawHandle
            | StartupError::NoAdapter
            | StartupError::NoSurfaceFormat
            | StartupError::Shader(_) => None,
        }
    }
}

impl From<ConnectError> for StartupError {
    fn from(e: ConnectError) -> Self {
        StartupError::Connect(e)
    }
}

impl From<GlobalError> for StartupError {
    fn from(e: GlobalError) -> Self {
        StartupError::Registry(e)
    }
}

impl From<calloop::Error> for StartupError {
    fn from(e: calloop::Error) -> Self {
        StartupError::EventLoop(e)
    }
}

impl From<wgpu::CreateSurfaceError> for StartupError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        StartupError::Surface(e)
    }
}

impl From<wgpu::RequestDeviceError> for StartupError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        StartupError::Device(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_errors_name_the_monitor() {
        assert_eq!(StartupError::NoMonitor.to_string(), "no monitor");
        assert_eq!(
            StartupError::MonitorNotFound("HDMI-A-1".into()).to_string(),
            "monitor HDMI-A-1 not found"
        );
        assert_eq!(
            StartupError::NoDisplayMode("DP-2".into()).to_string(),
            "monitor DP-2 has no display modes"
        );
    }

    #[test]
    fn shader_error_has_no_source() {
        let err = StartupError::Shader("bad entry point".into());
        assert!(err.source().is_none());
        assert!(err.to_string().contains("bad entry point"));
    }

    #[test]
    fn missing_surface_format_is_not_a_missing_adapter() {
        let err = StartupError::NoSurfaceFormat;
        assert!(err.source().is_none());
        assert_ne!(err.to_string(), StartupError::NoAdapter.to_string());
        assert!(err.to_string().contains("format"));
    }
}
