//! Screensaver suspension
//!
//! Uses the idle-inhibit protocol (zwp_idle_inhibit_manager_v1): while an
//! inhibitor exists for a visible surface, the compositor does not start its
//! own screensaver, blank the outputs, or lock the session.

use log::{debug, info};
use wayland_client::globals::{BindError, GlobalList};
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{Dispatch, QueueHandle};
use wayland_protocols::wp::idle_inhibit::zv1::client::zwp_idle_inhibit_manager_v1::ZwpIdleInhibitManagerV1;
use wayland_protocols::wp::idle_inhibit::zv1::client::zwp_idle_inhibitor_v1::ZwpIdleInhibitorV1;

/// Connection to the compositor's screensaver control
#[derive(Debug)]
pub struct ScreensaverControl {
    manager: ZwpIdleInhibitManagerV1,
}

impl ScreensaverControl {
    pub fn bind<D>(globals: &GlobalList, qh: &QueueHandle<D>) -> Result<Self, BindError>
    where
        D: Dispatch<ZwpIdleInhibitManagerV1, ()> + 'static,
    {
        let manager = globals.bind(qh, 1..=1, ())?;
        debug!("Bound zwp_idle_inhibit_manager_v1");
        Ok(Self { manager })
    }

    /// Suspend the system screensaver while `surface` is shown
    pub fn suspend<D>(&self, surface: &WlSurface, qh: &QueueHandle<D>) -> Suspension
    where
        D: Dispatch<ZwpIdleInhibitorV1, ()> + 'static,
    {
        info!("Suspending system screensaver");
        Suspension {
            inhibitor: self.manager.create_inhibitor(surface, qh, ()),
        }
    }
}

impl Drop for ScreensaverControl {
    fn drop(&mut self) {
        self.manager.destroy();
    }
}

/// An active suspension; dropping it lets the screensaver run again
#[derive(Debug)]
pub struct Suspension {
    inhibitor: ZwpIdleInhibitorV1,
}

impl Drop for Suspension {
    fn drop(&mut self) {
        info!("Resuming system screensaver");
        self.inhibitor.destroy();
    }
}
