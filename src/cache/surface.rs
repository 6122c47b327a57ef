//! Per-surface resource bookkeeping.

use std::collections::VecDeque;

use tracing::debug;
use wayland_server::backend::ObjectId;
use wayland_server::protocol::wl_buffer::WlBuffer;
use wayland_server::protocol::wl_callback::WlCallback;
use wayland_server::protocol::wl_shell_surface::WlShellSurface;
use wayland_server::protocol::wl_surface::WlSurface;
use wayland_server::Resource;

use crate::protocols::xdg::xdg_surface::XdgSurface;

/// The roles a wire resource can fill on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceResourceKind {
    /// The `wl_surface` itself.
    Main,
    /// The currently attached `wl_buffer`.
    Buffer,
    /// A queued one-shot frame callback.
    Frame,
    /// A `wl_shell_surface` role resource.
    ShellSurface,
    /// An `xdg_surface` role resource.
    XdgSurface,
}

/// A typed wire resource headed for one of the surface's role slots.
#[derive(Debug, Clone)]
pub enum SurfaceResource {
    /// The `wl_surface` itself.
    Main(WlSurface),
    /// The currently attached buffer.
    Buffer(WlBuffer),
    /// A queued frame callback.
    Frame(WlCallback),
    /// A `wl_shell_surface` role resource.
    ShellSurface(WlShellSurface),
    /// An `xdg_surface` role resource.
    XdgSurface(XdgSurface),
}

/// One live surface as the frontend sees it: a slot per role, plus the FIFO
/// list of pending frame callbacks (Qt routinely queues two or more).
///
/// Every non-frame slot holds at most one resource. The buffer slot becomes
/// occupied on attach and must be emptied by exactly one `wl_buffer.release`
/// before being replaced, except at surface teardown where the remaining
/// slots are dropped without replaying release events.
#[derive(Debug, Default)]
pub struct SurfaceRecord {
    main: Option<WlSurface>,
    buffer: Option<WlBuffer>,
    frames: VecDeque<WlCallback>,
    shell_surface: Option<WlShellSurface>,
    xdg_surface: Option<XdgSurface>,
}

impl SurfaceRecord {
    /// Writes the resource into its role slot; frame callbacks append to
    /// the FIFO list instead. An occupied slot is overwritten with a note
    /// in the log.
    pub fn add_resource(&mut self, resource: SurfaceResource) {
        match resource {
            SurfaceResource::Frame(callback) => self.frames.push_back(callback),
            SurfaceResource::Main(rc) => {
                if self.main.replace(rc).is_some() {
                    debug!(kind = ?SurfaceResourceKind::Main, "surface resource already present");
                }
            }
            SurfaceResource::Buffer(rc) => {
                if self.buffer.replace(rc).is_some() {
                    debug!(kind = ?SurfaceResourceKind::Buffer, "surface resource already present");
                }
            }
            SurfaceResource::ShellSurface(rc) => {
                if self.shell_surface.replace(rc).is_some() {
                    debug!(kind = ?SurfaceResourceKind::ShellSurface, "surface resource already present");
                }
            }
            SurfaceResource::XdgSurface(rc) => {
                if self.xdg_surface.replace(rc).is_some() {
                    debug!(kind = ?SurfaceResourceKind::XdgSurface, "surface resource already present");
                }
            }
        }
    }

    /// Clears the role slot when it still holds the given resource, or
    /// removes one matching entry from the frame list. The id check keeps
    /// the late destruction of a replaced resource from evicting its
    /// successor.
    pub fn remove_resource(&mut self, kind: SurfaceResourceKind, id: &ObjectId) {
        match kind {
            SurfaceResourceKind::Main => clear_slot(&mut self.main, id),
            SurfaceResourceKind::Buffer => clear_slot(&mut self.buffer, id),
            SurfaceResourceKind::ShellSurface => clear_slot(&mut self.shell_surface, id),
            SurfaceResourceKind::XdgSurface => clear_slot(&mut self.xdg_surface, id),
            SurfaceResourceKind::Frame => self.frames.retain(|cb| cb.id() != *id),
        }
    }

    /// The main `wl_surface` resource, when bound.
    pub fn main(&self) -> Option<&WlSurface> {
        self.main.as_ref()
    }

    /// The attached buffer, when present.
    pub fn buffer(&self) -> Option<&WlBuffer> {
        self.buffer.as_ref()
    }

    /// Empties the buffer slot, handing ownership to the caller.
    pub fn take_buffer(&mut self) -> Option<WlBuffer> {
        self.buffer.take()
    }

    /// Drains all queued frame callbacks in FIFO order.
    pub fn take_frames(&mut self) -> VecDeque<WlCallback> {
        std::mem::take(&mut self.frames)
    }

    /// Number of queued frame callbacks.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// The `wl_shell_surface` role resource, when present.
    pub fn shell_surface(&self) -> Option<&WlShellSurface> {
        self.shell_surface.as_ref()
    }

    /// The `xdg_surface` role resource, when present.
    pub fn xdg_surface(&self) -> Option<&XdgSurface> {
        self.xdg_surface.as_ref()
    }
}

fn clear_slot<R: Resource>(slot: &mut Option<R>, id: &ObjectId) {
    if slot.as_ref().map(|rc| rc.id()).as_ref() == Some(id) {
        *slot = None;
    }
}
