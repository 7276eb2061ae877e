//! Wayland surface renderer
//!
//! Creates a wlr-layer-shell surface covering the selected output and
//! renders the clock on it using wgpu.
//!
//! Architecture:
//! - One overlay layer surface on the selected monitor, anchored to all
//!   edges with exclusive keyboard focus
//! - The screensaver is suspended through an idle inhibitor on that surface
//! - A calloop timer calls `frame` at the configured rate; Escape ends it

use log::{debug, error, info, warn};
use smithay_client_toolkit::compositor::{CompositorHandler, CompositorState};
use smithay_client_toolkit::output::{OutputHandler, OutputState};
use smithay_client_toolkit::registry::{ProvidesRegistryState, RegistryState};
use smithay_client_toolkit::seat::{Capability, SeatHandler, SeatState};
use smithay_client_toolkit::shell::WaylandSurface;
use smithay_client_toolkit::shell::wlr_layer::{
    Anchor, KeyboardInteractivity, Layer, LayerShell, LayerShellHandler, LayerSurface,
    LayerSurfaceConfigure,
};
use smithay_client_toolkit::{
    delegate_compositor, delegate_layer, delegate_output, delegate_registry, delegate_seat,
    registry_handlers,
};
use wayland_client::globals::registry_queue_init;
use wayland_client::protocol::{wl_keyboard, wl_output, wl_seat, wl_surface};
use wayland_client::{Connection, Dispatch, EventQueue, Proxy, QueueHandle, WEnum, delegate_noop};
use wayland_protocols::wp::idle_inhibit::zv1::client::zwp_idle_inhibit_manager_v1::ZwpIdleInhibitManagerV1;
use wayland_protocols::wp::idle_inhibit::zv1::client::zwp_idle_inhibitor_v1::ZwpIdleInhibitorV1;

use crate::display::{ClockRenderer, FrameOutcome};
use crate::error::StartupError;
use crate::gpu::GpuCanvas;
use crate::inhibit::{ScreensaverControl, Suspension};
use crate::monitor::{MonitorInfo, Selection};

/// evdev code of the Escape key
const KEY_ESC: u32 = 1;

/// The clock's layer surface and what is attached to it
struct ClockSurface {
    // Dropped in order: GPU surface, inhibitor, layer surface
    canvas: Option<GpuCanvas>,
    suspension: Option<Suspension>,
    layer: LayerSurface,
    /// Size in surface-local coordinates
    logical_size: (u32, u32),
    scale: i32,
    configured: bool,
    resized: bool,
}

impl ClockSurface {
    fn pixel_size(&self) -> (u32, u32) {
        let scale = self.scale.max(1) as u32;
        (self.logical_size.0 * scale, self.logical_size.1 * scale)
    }

    fn owns(&self, surface: &wl_surface::WlSurface) -> bool {
        self.layer.wl_surface() == surface
    }
}

/// Wayland client state for the clock
pub struct WaylandState {
    registry_state: RegistryState,
    output_state: OutputState,
    seat_state: SeatState,
    compositor: CompositorState,
    layer_shell: LayerShell,
    screensaver: Option<ScreensaverControl>,
    keyboard: Option<wl_keyboard::WlKeyboard>,
    clock: Option<ClockSurface>,
    escape_pressed: bool,
    pub exit: bool,
}

impl WaylandState {
    /// Connect to the compositor and bind the globals the clock needs.
    /// With `suspend_screensaver` the idle-inhibit protocol is required.
    pub fn new(
        suspend_screensaver: bool,
    ) -> Result<(Self, EventQueue<Self>, Connection), StartupError> {
        info!("Connecting to Wayland");
        let conn = Connection::connect_to_env()?;
        let (globals, event_queue) = registry_queue_init::<Self>(&conn)?;
        let qh = event_queue.handle();

        let compositor = CompositorState::bind(&globals, &qh)
            .map_err(|e| StartupError::MissingGlobal("wl_compositor", e))?;
        let layer_shell = LayerShell::bind(&globals, &qh)
            .map_err(|e| StartupError::MissingGlobal("zwlr_layer_shell_v1", e))?;
        let screensaver = if suspend_screensaver {
            Some(ScreensaverControl::bind(&globals, &qh).map_err(StartupError::ScreensaverControl)?)
        } else {
            info!("Screensaver suspension disabled");
            None
        };

        let state = Self {
            registry_state: RegistryState::new(&globals),
            output_state: OutputState::new(&globals, &qh),
            seat_state: SeatState::new(&globals, &qh),
            compositor,
            layer_shell,
            screensaver,
            keyboard: None,
            clock: None,
            escape_pressed: false,
            exit: false,
        };

        Ok((state, event_queue, conn))
    }

    /// Outputs with complete information, in enumeration order
    pub fn monitors(&self) -> Vec<(wl_output::WlOutput, MonitorInfo)> {
        self.output_state
            .outputs()
            .filter_map(|output| {
                let info = self.output_state.info(&output)?;
                Some((output, MonitorInfo::from_output(&info)))
            })
            .collect()
    }

    /// Output info only, in enumeration order
    pub fn monitor_infos(&self) -> Vec<MonitorInfo> {
        self.monitors().into_iter().map(|(_, info)| info).collect()
    }

    /// Create the full-screen clock surface on `output` and suspend the
    /// system screensaver for it
    pub fn open_clock(
        &mut self,
        qh: &QueueHandle<Self>,
        output: &wl_output::WlOutput,
        selection: &Selection,
        namespace: &str,
    ) {
        info!(
            "Opening clock on {} ({}x{})",
            selection.monitor.name, selection.mode.width, selection.mode.height
        );

        let surface = self.compositor.create_surface(qh);
        let layer = self.layer_shell.create_layer_surface(
            qh,
            surface,
            Layer::Overlay,
            Some(namespace.to_string()),
            Some(output),
        );
        layer.set_anchor(Anchor::TOP | Anchor::BOTTOM | Anchor::LEFT | Anchor::RIGHT);
        layer.set_exclusive_zone(-1);
        layer.set_keyboard_interactivity(KeyboardInteractivity::Exclusive);
        layer.set_size(0, 0);
        layer.commit();

        let suspension = self
            .screensaver
            .as_ref()
            .map(|control| control.suspend(layer.wl_surface(), qh));

        self.clock = Some(ClockSurface {
            canvas: None,
            suspension,
            layer,
            logical_size: (
                selection.mode.width.max(1) as u32,
                selection.mode.height.max(1) as u32,
            ),
            scale: 1,
            configured: false,
            resized: false,
        });
    }

    pub fn clock_configured(&self) -> bool {
        self.clock.as_ref().is_some_and(|c| c.configured)
    }

    /// Create the GPU canvas once the compositor has sized the surface
    pub fn attach_canvas(&mut self, conn: &Connection) -> Result<(), StartupError> {
        let clock = self.clock.as_mut().ok_or(StartupError::NotConfigured)?;
        if !clock.configured {
            return Err(StartupError::NotConfigured);
        }
        let (width, height) = clock.pixel_size();
        clock.canvas = Some(GpuCanvas::new(conn, clock.layer.wl_surface(), width, height)?);
        clock.resized = false;
        Ok(())
    }

    /// Frame callback: draw the clock at `elapsed` seconds.
    /// Returns false once the clock should close.
    pub fn frame(&mut self, renderer: &mut ClockRenderer, elapsed: f64) -> bool {
        if self.escape_pressed {
            info!("Escape pressed, closing clock");
            return false;
        }
        if self.exit {
            return false;
        }

        let Some(clock) = self.clock.as_mut() else {
            return true;
        };
        let (width, height) = clock.pixel_size();
        let Some(canvas) = clock.canvas.as_mut() else {
            return true;
        };

        if clock.resized {
            canvas.resize(width, height);
            renderer.invalidate();
            clock.resized = false;
        }

        let (width, height) = canvas.size();
        match renderer.render(canvas, width, height, elapsed) {
            FrameOutcome::Drawn { bars } => {
                if !canvas.present() {
                    // Draw again on the next tick
                    renderer.invalidate();
                }
                debug!("Drew {} bars at {:.3}s", bars, elapsed);
            }
            FrameOutcome::Unchanged => {}
        }
        true
    }

    /// Release the GPU surface, resume the screensaver and destroy the
    /// clock surface
    pub fn close(&mut self, conn: &Connection) {
        if let Some(mut clock) = self.clock.take() {
            clock.canvas = None;
            clock.suspension = None;
            drop(clock);
        }
        self.screensaver = None;
        if let Some(keyboard) = self.keyboard.take()
            && keyboard.version() >= 3
        {
            keyboard.release();
        }
        if let Err(e) = conn.flush() {
            error!("Failed to flush Wayland connection: {}", e);
        }
        info!("Clock closed");
    }
}

impl CompositorHandler for WaylandState {
    fn scale_factor_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        surface: &wl_surface::WlSurface,
        new_factor: i32,
    ) {
        if let Some(clock) = self.clock.as_mut()
            && clock.owns(surface)
            && clock.scale != new_factor
        {
            debug!("Clock surface scale factor is now {}", new_factor);
            surface.set_buffer_scale(new_factor);
            clock.scale = new_factor;
            clock.resized = true;
        }
    }

    fn transform_changed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _new_transform: wl_output::Transform,
    ) {
    }

    fn frame(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _time: u32,
    ) {
        // Frames are paced by the timer
    }

    fn surface_enter(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }

    fn surface_leave(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _surface: &wl_surface::WlSurface,
        _output: &wl_output::WlOutput,
    ) {
    }
}

impl OutputHandler for WaylandState {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.output_state
    }

    fn new_output(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, output: wl_output::WlOutput) {
        debug!("New output {}", output.id());
    }

    fn update_output(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _output: wl_output::WlOutput,
    ) {
    }

    fn output_destroyed(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        output: wl_output::WlOutput,
    ) {
        debug!("Output {} removed", output.id());
    }
}

impl LayerShellHandler for WaylandState {
    fn closed(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, layer: &LayerSurface) {
        if self.clock.as_ref().is_some_and(|c| c.owns(layer.wl_surface())) {
            warn!("Compositor closed the clock surface");
            self.exit = true;
        }
    }

    fn configure(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        layer: &LayerSurface,
        configure: LayerSurfaceConfigure,
        _serial: u32,
    ) {
        let Some(clock) = self.clock.as_mut() else {
            return;
        };
        if !clock.owns(layer.wl_surface()) {
            return;
        }

        let (width, height) = configure.new_size;
        if width > 0 && height > 0 && (width, height) != clock.logical_size {
            debug!("Clock surface resized to {}x{}", width, height);
            clock.logical_size = (width, height);
            clock.resized = true;
        }
        if !clock.configured {
            info!(
                "Clock surface configured at {}x{}",
                clock.logical_size.0, clock.logical_size.1
            );
            clock.configured = true;
        }
    }
}

impl SeatHandler for WaylandState {
    fn seat_state(&mut self) -> &mut SeatState {
        &mut self.seat_state
    }

    fn new_seat(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat) {}

    fn new_capability(
        &mut self,
        _conn: &Connection,
        qh: &QueueHandle<Self>,
        seat: wl_seat::WlSeat,
        capability: Capability,
    ) {
        if capability == Capability::Keyboard && self.keyboard.is_none() {
            debug!("Keyboard available");
            self.keyboard = Some(seat.get_keyboard(qh, ()));
        }
    }

    fn remove_capability(
        &mut self,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
        _seat: wl_seat::WlSeat,
        capability: Capability,
    ) {
        if capability == Capability::Keyboard
            && let Some(keyboard) = self.keyboard.take()
            && keyboard.version() >= 3
        {
            keyboard.release();
        }
    }

    fn remove_seat(&mut self, _conn: &Connection, _qh: &QueueHandle<Self>, _seat: wl_seat::WlSeat) {}
}

impl Dispatch<wl_keyboard::WlKeyboard, ()> for WaylandState {
    fn event(
        state: &mut Self,
        _keyboard: &wl_keyboard::WlKeyboard,
        event: wl_keyboard::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_keyboard::Event::Key {
            key,
            state: WEnum::Value(wl_keyboard::KeyState::Pressed),
            ..
        } = event
            && key == KEY_ESC
        {
            state.escape_pressed = true;
        }
    }
}

delegate_compositor!(WaylandState);
delegate_output!(WaylandState);
delegate_seat!(WaylandState);
delegate_layer!(WaylandState);
delegate_registry!(WaylandState);
delegate_noop!(WaylandState: ZwpIdleInhibitManagerV1);
delegate_noop!(WaylandState: ZwpIdleInhibitorV1);

impl ProvidesRegistryState for WaylandState {
    fn registry(&mut self) -> &mut RegistryState {
        &mut self.registry_state
    }
    registry_handlers![OutputState, SeatState];
}
