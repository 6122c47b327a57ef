//! The inbound boundary: every mutation a client requests goes through one
//! facade entry.
//!
//! Protocol handlers translate their wire arguments and call exactly one
//! entry per semantic action. Entries update the cache under its mutex,
//! forward to the coordinator, and return nothing but new identifiers;
//! failures are logged and leave the caller's wire state consistent.

use std::os::unix::io::{AsFd, OwnedFd};

use tracing::{debug, warn};
use wayland_server::backend::ObjectId;
use wayland_server::protocol::wl_keyboard::WlKeyboard;
use wayland_server::protocol::wl_pointer::WlPointer;
use wayland_server::protocol::wl_surface::WlSurface;
use wayland_server::Resource;

use crate::cache::{SurfaceResource, SurfaceResourceKind};
use crate::context::Context;
use crate::coordinator::{PixelSource, ShowReason};
use crate::transfer::{Transfer, TransferRef};
use crate::utils::{Area, Position, RegionId, Size, SurfaceId};

/// Borrowed view over the context exposing the inbound operations.
#[derive(Debug)]
pub struct Facade<'a> {
    ctx: &'a Context,
}

impl<'a> Facade<'a> {
    pub(crate) fn new(ctx: &'a Context) -> Self {
        Facade { ctx }
    }

    /// Asks the coordinator for a fresh surface.
    pub fn create_surface(&self) -> SurfaceId {
        self.ctx.coordinator().surface_create()
    }

    /// Creates the surface record and registers its main resource.
    pub fn add_surface(&self, sid: SurfaceId, resource: WlSurface) {
        let mut cache = self.ctx.cache().lock();
        cache.create_surface(sid);
        cache.add_surface_resource(sid, SurfaceResource::Main(resource));
    }

    /// Tears the surface down: coordinator destroy, main resource removal
    /// and record removal happen in one locked section so nothing observes
    /// a half-dead surface.
    pub fn remove_surface(&self, sid: SurfaceId, id: &ObjectId) {
        let mut cache = self.ctx.cache().lock();
        self.ctx.coordinator().surface_destroy(sid);
        cache.remove_surface_resource(sid, SurfaceResourceKind::Main, id);
        cache.remove_surface(sid);
    }

    /// Latches pending surface state.
    pub fn commit(&self, sid: SurfaceId) {
        self.ctx.coordinator().surface_commit(sid);
    }

    /// Caches the attached buffer and hands the coordinator the new pixel
    /// source. A null buffer unmaps the surface instead.
    pub fn surface_attach(&self, sid: SurfaceId, buffer: Option<wayland_server::protocol::wl_buffer::WlBuffer>, source: PixelSource) {
        match buffer {
            None => {
                if let Some(record) = self.ctx.cache().lock().find_surface_mut(sid) {
                    record.take_buffer();
                }
                self.ctx.coordinator().surface_unrelate(sid);
                self.ctx.coordinator().surface_detach(sid);
            }
            Some(buffer) => {
                self.ctx
                    .cache()
                    .lock()
                    .add_surface_resource(sid, SurfaceResource::Buffer(buffer));
                self.ctx.coordinator().surface_attach(sid, source);
            }
        }
    }

    /// Queues a one-shot frame callback.
    pub fn add_frame_resource(&self, sid: SurfaceId, callback: wayland_server::protocol::wl_callback::WlCallback) {
        self.ctx
            .cache()
            .lock()
            .add_surface_resource(sid, SurfaceResource::Frame(callback));
    }

    /// Drops a frame callback that died before being fired.
    pub fn remove_frame_resource(&self, sid: SurfaceId, id: &ObjectId) {
        self.ctx
            .cache()
            .lock()
            .remove_surface_resource(sid, SurfaceResourceKind::Frame, id);
    }

    /// Caches a shell-role resource and tells the coordinator the surface
    /// is mappable.
    pub fn add_shell_surface(&self, sid: SurfaceId, resource: SurfaceResource) {
        self.ctx.cache().lock().add_surface_resource(sid, resource);
        self.ctx.coordinator().surface_show(sid, ShowReason::InShell);
    }

    /// Removes a shell-role resource.
    pub fn remove_shell_surface(&self, sid: SurfaceId, kind: SurfaceResourceKind, id: &ObjectId) {
        self.ctx.cache().lock().remove_surface_resource(sid, kind, id);
    }

    /// Forwards the size the client asked for.
    pub fn set_requested_size(&self, sid: SurfaceId, size: Size) {
        self.ctx.coordinator().surface_set_requested_size(sid, size);
    }

    /// Forwards a surface offset.
    pub fn set_offset(&self, sid: SurfaceId, pos: Position) {
        self.ctx.coordinator().surface_set_offset(sid, pos);
    }

    /// Puts offset and requested size back to their defaults.
    pub fn reset_offset_and_requested_size(&self, sid: SurfaceId) {
        self.ctx
            .coordinator()
            .surface_reset_offset_and_requested_size(sid);
    }

    /// Positions a subsurface relative to its parent.
    pub fn set_subsurface_position(&self, sid: SurfaceId, x: i32, y: i32) {
        self.ctx
            .coordinator()
            .surface_set_relative_position(sid, Position::new(x, y));
    }

    /// Establishes a parent/child relation and places the child.
    pub fn add_subsurface(&self, sid: SurfaceId, parent_sid: SurfaceId, x: i32, y: i32) {
        self.ctx.coordinator().surface_relate(sid, parent_sid);
        self.set_subsurface_position(sid, x, y);
    }

    /// Moves `sid` directly above or below `sibling_sid` among its parent's
    /// satellites. Quietly does nothing when they are not siblings.
    pub fn reorder_satellites(&self, sid: SurfaceId, sibling_sid: SurfaceId, above: bool) {
        self.ctx.coordinator().surface_reorder(sid, sibling_sid, above);
    }

    /// Applies a region as the surface's input region; the sentinel (or a
    /// vanished region) resets it.
    pub fn set_input_region(&self, sid: SurfaceId, rid: RegionId) {
        let area = {
            let cache = self.ctx.cache().lock();
            cache.find_region(rid).map(|region| region.area())
        };
        match area {
            Some(area) => {
                self.set_offset(sid, area.pos);
                self.set_requested_size(sid, area.size);
            }
            None => self.reset_offset_and_requested_size(sid),
        }
    }

    /// Records the hotspot and makes the surface the cursor image.
    pub fn set_cursor(&self, _serial: u32, hotspot_x: i32, hotspot_y: i32, sid: SurfaceId) {
        self.ctx
            .coordinator()
            .surface_set_offset(sid, Position::new(hotspot_x, hotspot_y));
        self.ctx.coordinator().surface_set_as_cursor(sid);
    }

    /// Creates a region with a fresh identifier.
    pub fn create_region(&self) -> RegionId {
        self.ctx.cache().lock().create_region()
    }

    /// Grows a region to contain `area`.
    pub fn inflate_region(&self, rid: RegionId, area: Area) {
        let mut cache = self.ctx.cache().lock();
        match cache.find_region_mut(rid) {
            Some(region) => region.inflate(area),
            None => warn!(%rid, "region not found"),
        }
    }

    /// Drops a region.
    pub fn remove_region(&self, rid: RegionId) {
        self.ctx.cache().lock().remove_region(rid);
    }

    /// Registers a keyboard resource. When the owning client already holds
    /// keyboard focus the resource immediately receives `enter` with the
    /// current serial, so late-binding keyboards do not miss the focus they
    /// already have.
    pub fn add_keyboard_resource(&self, keyboard: WlKeyboard) {
        let focused_sid = self.ctx.state().keyboard_focused_sid;

        let mut cache = self.ctx.cache().lock();
        let focused = cache.resource_and_client_for(focused_sid);
        if let (Some((surface, client)), Some(owner)) = (focused, keyboard.client()) {
            if client.id() == owner.id() {
                let serial = self.ctx.next_serial();
                keyboard.enter(serial.into(), &surface, Vec::new());
            }
        }
        cache.add_keyboard(keyboard);
    }

    /// Unregisters a keyboard resource.
    pub fn remove_keyboard_resource(&self, id: &ObjectId) {
        self.ctx.cache().lock().remove_keyboard(id);
    }

    /// Registers a pointer resource.
    pub fn add_pointer_resource(&self, pointer: WlPointer) {
        self.ctx.cache().lock().add_pointer(pointer);
    }

    /// Unregisters a pointer resource.
    pub fn remove_pointer_resource(&self, id: &ObjectId) {
        self.ctx.cache().lock().remove_pointer(id);
    }

    /// Registers a data-device resource.
    pub fn add_data_device_resource(&self, device: wayland_server::protocol::wl_data_device::WlDataDevice) {
        self.ctx.cache().lock().add_data_device(device);
    }

    /// Unregisters a data-device resource.
    pub fn remove_data_device_resource(&self, id: &ObjectId) {
        self.ctx.cache().lock().remove_data_device(id);
    }

    /// Tracks a miscellaneous resource for the teardown audit.
    pub fn add_general_resource(&self, id: ObjectId) {
        self.ctx.cache().lock().add_other(id);
    }

    /// Forgets a miscellaneous resource.
    pub fn remove_general_resource(&self, id: &ObjectId) {
        self.ctx.cache().lock().remove_other(id);
    }

    /// Starts a selection transfer owned by `source`.
    pub fn create_transfer(&self, source: wayland_server::protocol::wl_data_source::WlDataSource) -> TransferRef {
        Transfer::new(source)
    }

    /// Drops a transfer; if it was the current selection the selection is
    /// cleared, so a destroyed source is never offered again.
    pub fn destroy_transfer(&self, transfer: &TransferRef) {
        let mut state = self.ctx.state();
        if let Some(current) = &state.current_transfer {
            if std::sync::Arc::ptr_eq(current, transfer) {
                state.current_transfer = None;
            }
        }
    }

    /// Appends an announced MIME type to a transfer.
    pub fn add_mime_type(&self, transfer: &TransferRef, mime_type: String) {
        transfer
            .lock()
            .expect("transfer mutex poisoned")
            .add_mime_type(mime_type);
    }

    /// Makes the transfer the current selection and offers it to the
    /// focused client right away.
    pub fn send_selection(&self, transfer: TransferRef) {
        self.ctx.state().current_transfer = Some(transfer);
        self.ctx.gateway().send_selection();
    }

    /// Unsets the current selection (the client passed a null source).
    pub fn clear_selection(&self) {
        self.ctx.state().current_transfer = None;
    }

    /// Forwards a paste request to the selection owner and closes our copy
    /// of the fd.
    pub fn receive_data_offer(&self, transfer: &TransferRef, mime_type: String, fd: OwnedFd) {
        let transfer = transfer.lock().expect("transfer mutex poisoned");
        debug!(mime = %mime_type, "forwarding selection receive");
        transfer.source().send(mime_type, fd.as_fd());
        // fd drops here, closing our duplicate.
    }
}

/// Moves `sid` next to `sibling_sid` inside an ordered satellite list,
/// above (after) or below (before) it. Returns `false` and leaves the list
/// untouched unless both surfaces are present.
///
/// Coordinator implementations can use this directly for their satellite
/// lists.
pub fn reorder_satellite_list(
    satellites: &mut Vec<SurfaceId>,
    sid: SurfaceId,
    sibling_sid: SurfaceId,
    above: bool,
) -> bool {
    if sid == sibling_sid {
        return false;
    }
    let Some(from) = satellites.iter().position(|&s| s == sid) else {
        return false;
    };
    if !satellites.iter().any(|&s| s == sibling_sid) {
        return false;
    }
    satellites.remove(from);
    // Position of the sibling after the removal.
    let anchor = satellites
        .iter()
        .position(|&s| s == sibling_sid)
        .expect("sibling vanished");
    let to = if above { anchor + 1 } else { anchor };
    satellites.insert(to, sid);
    true
}
