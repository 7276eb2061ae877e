//! Monitor and display-mode selection
//!
//! Outputs are reported by the compositor through `OutputState`; this module
//! keeps a plain copy of what the clock needs and picks the output and mode
//! the clock runs on.

use crate::error::StartupError;
use log::debug;
use smithay_client_toolkit::output::OutputInfo;

/// A display mode of a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMode {
    pub width: i32,
    pub height: i32,
    /// Refresh rate in mHz
    pub refresh: i32,
    pub current: bool,
    pub preferred: bool,
}

/// Information about a connected monitor
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorInfo {
    pub name: String,
    pub description: Option<String>,
    pub modes: Vec<DisplayMode>,
}

impl MonitorInfo {
    pub fn from_output(info: &OutputInfo) -> Self {
        Self {
            name: info
                .name
                .clone()
                .unwrap_or_else(|| format!("output-{}", info.id)),
            description: info.description.clone(),
            modes: info
                .modes
                .iter()
                .map(|m| DisplayMode {
                    width: m.dimensions.0,
                    height: m.dimensions.1,
                    refresh: m.refresh_rate,
                    current: m.current,
                    preferred: m.preferred,
                })
                .collect(),
        }
    }

    /// Mode to run in: the current one, else the preferred one, else the last listed
    pub fn selected_mode(&self) -> Option<DisplayMode> {
        self.modes
            .iter()
            .find(|m| m.current)
            .or_else(|| self.modes.iter().find(|m| m.preferred))
            .or_else(|| self.modes.last())
            .copied()
    }
}

/// A monitor together with the mode the clock uses on it
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub index: usize,
    pub monitor: MonitorInfo,
    pub mode: DisplayMode,
}

/// Pick the monitor named `wanted`, or the first one
pub fn select_monitor(monitors: &[MonitorInfo], wanted: Option<&str>) -> Result<Selection, StartupError> {
    if monitors.is_empty() {
        return Err(StartupError::NoMonitor);
    }

    let index = match wanted {
        Some(name) => monitors
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| StartupError::MonitorNotFound(name.to_string()))?,
        None => 0,
    };

    let monitor = monitors[index].clone();
    let mode = monitor
        .selected_mode()
        .ok_or_else(|| StartupError::NoDisplayMode(monitor.name.clone()))?;

    debug!(
        "Selected monitor {} ({}x{} @ {} mHz)",
        monitor.name, mode.width, mode.height, mode.refresh
    );

    Ok(Selection { index, monitor, mode })
}

/// Whether enumeration can stop: some output is known and, when a name is
/// wanted, that output is among them
pub fn outputs_ready(monitors: &[MonitorInfo], wanted: Option<&str>) -> bool {
    match wanted {
        Some(name) => monitors.iter().any(|m| m.name == name),
        None => !monitors.is_empty(),
    }
}

/// Print monitors and their modes for `--list-monitors`
pub fn print_monitors(monitors: &[MonitorInfo]) {
    println!("Available monitors:");
    println!();
    for monitor in monitors {
        let description = monitor.description.as_deref().unwrap_or("");
        println!("  {:<16} {}", monitor.name, description);
        for mode in &monitor.modes {
            let flags = match (mode.current, mode.preferred) {
                (true, true) => " (current, preferred)",
                (true, false) => " (current)",
                (false, true) => " (preferred)",
                (false, false) => "",
            };
            println!(
                "      {}x{} @ {:.2} Hz{}",
                mode.width,
                mode.height,
                f64::from(mode.refresh) / 1000.0,
                flags
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(width: i32, height: i32, current: bool, preferred: bool) -> DisplayMode {
        DisplayMode {
            width,
            height,
            refresh: 60_000,
            current,
            preferred,
        }
    }

    fn monitor(name: &str, modes: Vec<DisplayMode>) -> MonitorInfo {
        MonitorInfo {
            name: name.to_string(),
            description: None,
            modes,
        }
    }

    #[test]
    fn no_monitors_is_an_error() {
        assert!(matches!(select_monitor(&[], None), Err(StartupError::NoMonitor)));
    }

    #[test]
    fn defaults_to_first_monitor() {
        let monitors = vec![
            monitor("DP-1", vec![mode(2560, 1440, true, true)]),
            monitor("HDMI-A-1", vec![mode(1920, 1080, true, true)]),
        ];
        let selection = select_monitor(&monitors, None).unwrap();
        assert_eq!(selection.index, 0);
        assert_eq!(selection.monitor.name, "DP-1");
        assert_eq!(selection.mode.width, 2560);
    }

    #[test]
    fn picks_monitor_by_name() {
        let monitors = vec![
            monitor("DP-1", vec![mode(2560, 1440, true, true)]),
            monitor("HDMI-A-1", vec![mode(1920, 1080, true, true)]),
        ];
        let selection = select_monitor(&monitors, Some("HDMI-A-1")).unwrap();
        assert_eq!(selection.index, 1);
        assert_eq!(selection.mode.height, 1080);

        match select_monitor(&monitors, Some("eDP-1")) {
            Err(StartupError::MonitorNotFound(name)) => assert_eq!(name, "eDP-1"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn monitor_without_modes_is_an_error() {
        let monitors = vec![monitor("DP-1", vec![])];
        match select_monitor(&monitors, None) {
            Err(StartupError::NoDisplayMode(name)) => assert_eq!(name, "DP-1"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn enumeration_waits_for_the_named_output() {
        assert!(!outputs_ready(&[], None));
        assert!(!outputs_ready(&[], Some("DP-2")));

        let first = vec![monitor("DP-1", vec![mode(2560, 1440, true, true)])];
        assert!(outputs_ready(&first, None));
        assert!(!outputs_ready(&first, Some("DP-2")));

        let both = vec![
            monitor("DP-1", vec![mode(2560, 1440, true, true)]),
            monitor("DP-2", vec![mode(1920, 1080, true, true)]),
        ];
        assert!(outputs_ready(&both, Some("DP-2")));
    }

    #[test]
    fn mode_preference_order() {
        let m = monitor(
            "DP-1",
            vec![
                mode(1024, 768, false, false),
                mode(1920, 1080, false, true),
                mode(1280, 720, true, false),
                mode(800, 600, false, false),
            ],
        );
        assert_eq!(m.selected_mode().unwrap().width, 1280);

        let m = monitor(
            "DP-1",
            vec![mode(1024, 768, false, false), mode(1920, 1080, false, true)],
        );
        assert_eq!(m.selected_mode().unwrap().width, 1920);

        let m = monitor(
            "DP-1",
            vec![mode(1024, 768, false, false), mode(800, 600, false, false)],
        );
        assert_eq!(m.selected_mode().unwrap().width, 800);
    }
}
