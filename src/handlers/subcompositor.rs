//! `wl_subcompositor` and `wl_subsurface`.

use tracing::debug;
use wayland_server::protocol::wl_subcompositor::{self, WlSubcompositor};
use wayland_server::protocol::wl_subsurface::{self, WlSubsurface};
use wayland_server::{
    Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource,
};

use super::Dispatcher;
use crate::utils::SurfaceId;

impl GlobalDispatch<WlSubcompositor, ()> for Dispatcher {
    fn bind(
        state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlSubcompositor>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let subcompositor = data_init.init(resource, ());
        debug!(id = ?subcompositor.id(), "bound subcompositor");
        state.ctx.facade().add_general_resource(subcompositor.id());
    }
}

impl Dispatch<WlSubcompositor, ()> for Dispatcher {
    fn request(
        state: &mut Self,
        _client: &Client,
        _subcompositor: &WlSubcompositor,
        request: wl_subcompositor::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_subcompositor::Request::Destroy => {}
            wl_subcompositor::Request::GetSubsurface {
                id,
                surface,
                parent,
            } => {
                let sid = surface.data::<SurfaceId>().copied().unwrap_or(SurfaceId::NONE);
                let parent_sid = parent.data::<SurfaceId>().copied().unwrap_or(SurfaceId::NONE);
                debug!(%sid, %parent_sid, "get subsurface");
                data_init.init(id, sid);
                state.ctx.facade().add_subsurface(sid, parent_sid, 0, 0);
            }
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        subcompositor: &WlSubcompositor,
        _data: &(),
    ) {
        state
            .ctx
            .facade()
            .remove_general_resource(&subcompositor.id());
    }
}

impl Dispatch<WlSubsurface, SurfaceId> for Dispatcher {
    fn request(
        state: &mut Self,
        _client: &Client,
        _subsurface: &WlSubsurface,
        request: wl_subsurface::Request,
        sid: &SurfaceId,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        let sid = *sid;
        let facade = state.ctx.facade();
        match request {
            wl_subsurface::Request::Destroy => {}
            wl_subsurface::Request::SetPosition { x, y } => {
                debug!(%sid, x, y, "subsurface set position");
                facade.set_subsurface_position(sid, x, y);
            }
            wl_subsurface::Request::PlaceAbove { sibling } => {
                let sibling_sid = sibling
                    .data::<SurfaceId>()
                    .copied()
                    .unwrap_or(SurfaceId::NONE);
                debug!(%sid, %sibling_sid, "subsurface place above");
                facade.reorder_satellites(sid, sibling_sid, true);
            }
            wl_subsurface::Request::PlaceBelow { sibling } => {
                let sibling_sid = sibling
                    .data::<SurfaceId>()
                    .copied()
                    .unwrap_or(SurfaceId::NONE);
                debug!(%sid, %sibling_sid, "subsurface place below");
                facade.reorder_satellites(sid, sibling_sid, false);
            }
            wl_subsurface::Request::SetSync => {
                debug!(%sid, "nyimp: subsurface set sync");
            }
            wl_subsurface::Request::SetDesync => {
                debug!(%sid, "nyimp: subsurface set desync");
            }
            _ => {}
        }
    }
}
