//! `wl_compositor`, `wl_surface`, `wl_region` and frame callbacks.

use tracing::{debug, warn};
use wayland_server::protocol::wl_callback::{self, WlCallback};
use wayland_server::protocol::wl_compositor::{self, WlCompositor};
use wayland_server::protocol::wl_region::{self, WlRegion};
use wayland_server::protocol::wl_surface::{self, WlSurface};
use wayland_server::{
    Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource,
};

use super::Dispatcher;
use crate::coordinator::PixelSource;
use crate::shm;
use crate::utils::{Area, RegionId, SurfaceId};

impl GlobalDispatch<WlCompositor, ()> for Dispatcher {
    fn bind(
        state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlCompositor>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let compositor = data_init.init(resource, ());
        debug!(id = ?compositor.id(), "bound compositor");
        state.ctx.facade().add_general_resource(compositor.id());
    }
}

impl Dispatch<WlCompositor, ()> for Dispatcher {
    fn request(
        state: &mut Self,
        _client: &Client,
        _compositor: &WlCompositor,
        request: wl_compositor::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        let facade = state.ctx.facade();
        match request {
            wl_compositor::Request::CreateSurface { id } => {
                let sid = facade.create_surface();
                let surface = data_init.init(id, sid);
                debug!(%sid, "created surface");
                facade.add_surface(sid, surface);
            }
            wl_compositor::Request::CreateRegion { id } => {
                let rid = facade.create_region();
                data_init.init(id, rid);
            }
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        compositor: &WlCompositor,
        _data: &(),
    ) {
        state.ctx.facade().remove_general_resource(&compositor.id());
    }
}

impl Dispatch<WlSurface, SurfaceId> for Dispatcher {
    fn request(
        state: &mut Self,
        _client: &Client,
        _surface: &WlSurface,
        request: wl_surface::Request,
        sid: &SurfaceId,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        let sid = *sid;
        let facade = state.ctx.facade();
        match request {
            wl_surface::Request::Destroy => {}
            wl_surface::Request::Attach { buffer, x, y } => {
                debug!(%sid, x, y, "surface attach");
                let source = match &buffer {
                    None => PixelSource::default(),
                    Some(buffer) => match shm::buffer_contents(buffer) {
                        Some((width, height, stride, view)) => PixelSource {
                            width,
                            height,
                            stride,
                            view: Some(view),
                        },
                        None => {
                            warn!(%sid, "attached buffer is not shm-backed");
                            PixelSource::default()
                        }
                    },
                };
                facade.surface_attach(sid, buffer, source);
            }
            wl_surface::Request::Damage {
                x,
                y,
                width,
                height,
            } => {
                // Damage is acknowledged but not tracked.
                debug!(%sid, x, y, width, height, "surface damage");
            }
            wl_surface::Request::Frame { callback } => {
                let callback: WlCallback = data_init.init(callback, sid);
                facade.add_frame_resource(sid, callback);
            }
            wl_surface::Request::SetOpaqueRegion { region } => {
                let rid = region_id(&region);
                debug!(%sid, %rid, "nyimp: set opaque region");
            }
            wl_surface::Request::SetInputRegion { region } => {
                facade.set_input_region(sid, region_id(&region));
            }
            wl_surface::Request::Commit => {
                debug!(%sid, "commit");
                facade.commit(sid);
            }
            wl_surface::Request::SetBufferTransform { transform } => {
                debug!(%sid, ?transform, "nyimp: set buffer transform");
            }
            wl_surface::Request::SetBufferScale { scale } => {
                debug!(%sid, scale, "nyimp: set buffer scale");
            }
            wl_surface::Request::DamageBuffer {
                x,
                y,
                width,
                height,
            } => {
                debug!(%sid, x, y, width, height, "nyimp: damage buffer");
            }
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        surface: &WlSurface,
        sid: &SurfaceId,
    ) {
        debug!(%sid, "surface unbound");
        state.ctx.facade().remove_surface(*sid, &surface.id());
    }
}

impl Dispatch<WlCallback, SurfaceId> for Dispatcher {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _callback: &WlCallback,
        _request: wl_callback::Request,
        _sid: &SurfaceId,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        callback: &WlCallback,
        sid: &SurfaceId,
    ) {
        state
            .ctx
            .facade()
            .remove_frame_resource(*sid, &callback.id());
    }
}

impl Dispatch<WlRegion, RegionId> for Dispatcher {
    fn request(
        state: &mut Self,
        _client: &Client,
        _region: &WlRegion,
        request: wl_region::Request,
        rid: &RegionId,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        let rid = *rid;
        let facade = state.ctx.facade();
        match request {
            wl_region::Request::Destroy => {}
            wl_region::Request::Add {
                x,
                y,
                width,
                height,
            } => {
                debug!(%rid, x, y, width, height, "region add");
                facade.inflate_region(rid, Area::new(x, y, width, height));
            }
            wl_region::Request::Subtract {
                x,
                y,
                width,
                height,
            } => {
                debug!(%rid, x, y, width, height, "nyimp: region subtract");
            }
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _region: &WlRegion,
        rid: &RegionId,
    ) {
        state.ctx.facade().remove_region(*rid);
    }
}

fn region_id(region: &Option<WlRegion>) -> RegionId {
    region
        .as_ref()
        .and_then(|region| region.data::<RegionId>().copied())
        .unwrap_or(RegionId::NONE)
}
