mod config;
mod display;
mod error;
mod gpu;
mod inhibit;
mod monitor;
mod renderer;

use std::time::{Duration, Instant};

use clap::Parser;
use display::ClockRenderer;
use error::StartupError;
use log::{error, info, warn};
use renderer::WaylandState;
use smithay_client_toolkit::reexports::calloop::EventLoop;
use smithay_client_toolkit::reexports::calloop::timer::{TimeoutAction, Timer};
use smithay_client_toolkit::reexports::calloop_wayland_source::WaylandSource;

/// segclock - A full-screen seven-segment clock screensaver for Wayland
#[derive(Parser, Debug)]
#[command(name = "segclock", version, about)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "~/.config/segclock/segclock.toml")]
    config: String,

    /// Run in verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Output to show the clock on (overrides the config file)
    #[arg(short, long)]
    monitor: Option<String>,

    /// Frame ticks per second (overrides the config file)
    #[arg(long)]
    fps: Option<u32>,

    /// Redraw every tick even when the second has not changed
    #[arg(long)]
    no_skip: bool,

    /// List available monitors and their modes
    #[arg(long)]
    list_monitors: bool,
}

/// Attempts at 100ms each while waiting on the compositor
const STARTUP_ATTEMPTS: usize = 20;

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("segclock v{} starting", env!("CARGO_PKG_VERSION"));

    // List monitors and exit
    if cli.list_monitors {
        if let Err(e) = list_monitors() {
            error!("{}", e);
            std::process::exit(1);
        }
        return;
    }

    // Load config
    let config_path = shellexpand(&cli.config);
    let mut cfg = match config::Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config from {}: {}", config_path, e);
            info!("Using default configuration");
            config::Config::default()
        }
    };

    if let Some(monitor) = cli.monitor {
        cfg.general.monitor = Some(monitor);
    }
    if let Some(fps) = cli.fps {
        cfg.general.fps = fps;
    }
    if cli.no_skip {
        cfg.general.skip_unchanged = false;
    }

    if let Err(e) = run(&cfg) {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Show the clock until Escape is pressed or the surface is closed
fn run(cfg: &config::Config) -> Result<(), StartupError> {
    let (mut state, event_queue, conn) = WaylandState::new(cfg.general.suspend_screensaver)?;
    let qh = event_queue.handle();

    let mut event_loop: EventLoop<WaylandState> = EventLoop::try_new()?;
    WaylandSource::new(conn.clone(), event_queue)
        .insert(event_loop.handle())
        .map_err(|e| StartupError::EventLoop(e.error))?;

    wait_for_outputs(&mut event_loop, &mut state, cfg.general.monitor.as_deref())?;

    let (outputs, monitors): (Vec<_>, Vec<_>) = state.monitors().into_iter().unzip();
    let selection = monitor::select_monitor(&monitors, cfg.general.monitor.as_deref())?;
    state.open_clock(&qh, &outputs[selection.index], &selection, &cfg.surface.namespace);

    // Wait for the compositor to size the surface
    for _ in 0..STARTUP_ATTEMPTS {
        if state.clock_configured() || state.exit {
            break;
        }
        event_loop.dispatch(Duration::from_millis(100), &mut state)?;
    }
    if let Err(e) = state.attach_canvas(&conn) {
        state.close(&conn);
        return Err(e);
    }

    let fps = cfg.general.effective_fps();
    if fps != cfg.general.fps {
        warn!("Frame rate {} out of range, using {}", cfg.general.fps, fps);
    }
    let interval = Duration::from_secs_f64(1.0 / f64::from(fps));
    let mut clock = ClockRenderer::new(cfg.general.skip_unchanged);
    let start = Instant::now();

    event_loop
        .handle()
        .insert_source(Timer::immediate(), move |_, _, state: &mut WaylandState| {
            if state.frame(&mut clock, start.elapsed().as_secs_f64()) {
                TimeoutAction::ToDuration(interval)
            } else {
                state.exit = true;
                TimeoutAction::Drop
            }
        })
        .map_err(|e| StartupError::EventLoop(e.error))?;

    info!("Clock running at {} fps. Press Escape to exit.", fps);

    loop {
        if let Err(e) = event_loop.dispatch(None::<Duration>, &mut state) {
            error!("Event loop error: {}", e);
            break;
        }
        if state.exit {
            break;
        }
    }

    info!("segclock shutting down");
    state.close(&conn);
    Ok(())
}

/// Dispatch until the compositor has described at least one output, or
/// the `wanted` one when a name is given
fn wait_for_outputs(
    event_loop: &mut EventLoop<WaylandState>,
    state: &mut WaylandState,
    wanted: Option<&str>,
) -> Result<(), StartupError> {
    info!("Waiting for output enumeration...");
    for _ in 0..STARTUP_ATTEMPTS {
        event_loop.dispatch(Duration::from_millis(100), state)?;
        if monitor::outputs_ready(&state.monitor_infos(), wanted) {
            break;
        }
    }
    Ok(())
}

fn list_monitors() -> Result<(), StartupError> {
    let (mut state, event_queue, conn) = WaylandState::new(false)?;
    let mut event_loop: EventLoop<WaylandState> = EventLoop::try_new()?;
    WaylandSource::new(conn, event_queue)
        .insert(event_loop.handle())
        .map_err(|e| StartupError::EventLoop(e.error))?;

    wait_for_outputs(&mut event_loop, &mut state, None)?;

    let monitors = state.monitor_infos();
    if monitors.is_empty() {
        return Err(StartupError::NoMonitor);
    }
    monitor::print_monitors(&monitors);
    Ok(())
}

/// Expand ~ to home directory in paths
fn shellexpand(path: &str) -> String {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return format!("{}/{}", home, stripped);
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_parse() {
        let cli = Cli::parse_from(["segclock", "-m", "DP-1", "--fps", "10", "--no-skip"]);
        assert_eq!(cli.monitor.as_deref(), Some("DP-1"));
        assert_eq!(cli.fps, Some(10));
        assert!(cli.no_skip);
        assert!(!cli.list_monitors);
    }

    #[test]
    fn shellexpand_leaves_absolute_paths() {
        assert_eq!(shellexpand("/etc/segclock.toml"), "/etc/segclock.toml");
    }
}
