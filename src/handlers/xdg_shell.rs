//! Unstable `xdg_shell` (v5): `xdg_shell`, `xdg_surface`, `xdg_popup`.

use tracing::debug;
use wayland_server::{
    Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource,
};

use super::Dispatcher;
use crate::cache::{SurfaceResource, SurfaceResourceKind};
use crate::protocols::xdg::xdg_popup::{self, XdgPopup};
use crate::protocols::xdg::xdg_shell::{self, XdgShell};
use crate::protocols::xdg::xdg_surface::{self, XdgSurface};
use crate::utils::{Size, SurfaceId};

impl GlobalDispatch<XdgShell, ()> for Dispatcher {
    fn bind(
        state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<XdgShell>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let shell = data_init.init(resource, ());
        debug!(id = ?shell.id(), "bound xdg shell");
        state.ctx.facade().add_general_resource(shell.id());
    }
}

impl Dispatch<XdgShell, ()> for Dispatcher {
    fn request(
        state: &mut Self,
        _client: &Client,
        _shell: &XdgShell,
        request: xdg_shell::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        let facade = state.ctx.facade();
        match request {
            xdg_shell::Request::Destroy => {}
            xdg_shell::Request::UseUnstableVersion { version } => {
                // Accepted but not acted upon.
                debug!(version, "use unstable version");
            }
            xdg_shell::Request::GetXdgSurface { id, surface } => {
                let sid = surface.data::<SurfaceId>().copied().unwrap_or(SurfaceId::NONE);
                let xdg_surface: XdgSurface = data_init.init(id, sid);
                debug!(%sid, "get xdg surface");
                facade.add_shell_surface(sid, SurfaceResource::XdgSurface(xdg_surface));
            }
            xdg_shell::Request::GetXdgPopup {
                id,
                surface,
                parent,
                serial,
                x,
                y,
                ..
            } => {
                let popup_sid = surface.data::<SurfaceId>().copied().unwrap_or(SurfaceId::NONE);
                let parent_sid = parent
                    .data::<SurfaceId>()
                    .copied()
                    .unwrap_or(SurfaceId::NONE);
                debug!(%popup_sid, %parent_sid, serial, x, y, "get xdg popup");
                facade.add_subsurface(popup_sid, parent_sid, x, y);
                let popup: XdgPopup = data_init.init(id, popup_sid);
                facade.add_general_resource(popup.id());
            }
            xdg_shell::Request::Pong { serial } => {
                debug!(serial, "nyimp: xdg pong");
            }
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        shell: &XdgShell,
        _data: &(),
    ) {
        state.ctx.facade().remove_general_resource(&shell.id());
    }
}

impl Dispatch<XdgSurface, SurfaceId> for Dispatcher {
    fn request(
        state: &mut Self,
        _client: &Client,
        _xdg_surface: &XdgSurface,
        request: xdg_surface::Request,
        sid: &SurfaceId,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        let sid = *sid;
        let facade = state.ctx.facade();
        match request {
            xdg_surface::Request::Destroy => {}
            xdg_surface::Request::SetParent { parent } => {
                let parent_sid = parent
                    .as_ref()
                    .and_then(|parent| parent.data::<SurfaceId>().copied())
                    .unwrap_or(SurfaceId::NONE);
                debug!(%sid, %parent_sid, "xdg surface set parent");
                if !parent_sid.is_none() {
                    facade.add_subsurface(sid, parent_sid, 0, 0);
                }
            }
            xdg_surface::Request::SetTitle { title } => {
                debug!(%sid, title, "nyimp: xdg set title");
            }
            xdg_surface::Request::SetAppId { app_id } => {
                debug!(%sid, app_id, "nyimp: xdg set app id");
            }
            xdg_surface::Request::ShowWindowMenu { serial, x, y, .. } => {
                debug!(%sid, serial, x, y, "nyimp: xdg show window menu");
            }
            xdg_surface::Request::Move { serial, .. } => {
                debug!(%sid, serial, "nyimp: xdg move");
            }
            xdg_surface::Request::Resize { serial, edges, .. } => {
                debug!(%sid, serial, ?edges, "nyimp: xdg resize");
            }
            xdg_surface::Request::AckConfigure { serial } => {
                debug!(%sid, serial, "nyimp: xdg ack configure");
            }
            xdg_surface::Request::SetWindowGeometry {
                x,
                y,
                width,
                height,
            } => {
                debug!(%sid, x, y, width, height, "xdg set window geometry");
                facade.set_requested_size(sid, Size::new(width, height));
            }
            xdg_surface::Request::SetMaximized => {
                debug!(%sid, "nyimp: xdg set maximized");
            }
            xdg_surface::Request::UnsetMaximized => {
                debug!(%sid, "nyimp: xdg unset maximized");
            }
            xdg_surface::Request::SetFullscreen { .. } => {
                debug!(%sid, "nyimp: xdg set fullscreen");
            }
            xdg_surface::Request::UnsetFullscreen => {
                debug!(%sid, "nyimp: xdg unset fullscreen");
            }
            xdg_surface::Request::SetMinimized => {
                debug!(%sid, "nyimp: xdg set minimized");
            }
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        xdg_surface: &XdgSurface,
        sid: &SurfaceId,
    ) {
        debug!(sid = %sid, "xdg surface unbound");
        state.ctx.facade().remove_shell_surface(
            *sid,
            SurfaceResourceKind::XdgSurface,
            &xdg_surface.id(),
        );
    }
}

impl Dispatch<XdgPopup, SurfaceId> for Dispatcher {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _popup: &XdgPopup,
        request: xdg_popup::Request,
        sid: &SurfaceId,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            xdg_popup::Request::Destroy => {
                debug!(sid = %sid, "xdg popup destroy");
            }
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        popup: &XdgPopup,
        sid: &SurfaceId,
    ) {
        debug!(sid = %sid, "xdg popup unbound");
        state.ctx.facade().remove_general_resource(&popup.id());
    }
}
