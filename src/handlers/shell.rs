//! `wl_shell` and `wl_shell_surface`.

use tracing::debug;
use wayland_server::protocol::wl_shell::{self, WlShell};
use wayland_server::protocol::wl_shell_surface::{self, WlShellSurface};
use wayland_server::{
    Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource,
};

use super::Dispatcher;
use crate::cache::{SurfaceResource, SurfaceResourceKind};
use crate::utils::SurfaceId;

impl GlobalDispatch<WlShell, ()> for Dispatcher {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlShell>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let shell = data_init.init(resource, ());
        debug!(id = ?shell.id(), "bound shell");
    }
}

impl Dispatch<WlShell, ()> for Dispatcher {
    fn request(
        state: &mut Self,
        _client: &Client,
        _shell: &WlShell,
        request: wl_shell::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_shell::Request::GetShellSurface { id, surface } => {
                let sid = surface.data::<SurfaceId>().copied().unwrap_or(SurfaceId::NONE);
                let shell_surface: WlShellSurface = data_init.init(id, sid);
                debug!(%sid, "get shell surface");
                state
                    .ctx
                    .facade()
                    .add_shell_surface(sid, SurfaceResource::ShellSurface(shell_surface));
            }
            _ => {}
        }
    }
}

impl Dispatch<WlShellSurface, SurfaceId> for Dispatcher {
    fn request(
        state: &mut Self,
        _client: &Client,
        _shell_surface: &WlShellSurface,
        request: wl_shell_surface::Request,
        sid: &SurfaceId,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        let sid = *sid;
        let facade = state.ctx.facade();
        match request {
            wl_shell_surface::Request::Pong { serial } => {
                debug!(%sid, serial, "nyimp: pong");
            }
            wl_shell_surface::Request::Move { serial, .. } => {
                debug!(%sid, serial, "nyimp: shell surface move");
            }
            wl_shell_surface::Request::Resize { serial, edges, .. } => {
                debug!(%sid, serial, ?edges, "nyimp: shell surface resize");
            }
            wl_shell_surface::Request::SetToplevel => {
                debug!(%sid, "nyimp: set toplevel");
            }
            wl_shell_surface::Request::SetTransient { x, y, flags, .. } => {
                debug!(%sid, x, y, ?flags, "nyimp: set transient");
            }
            wl_shell_surface::Request::SetFullscreen {
                method, framerate, ..
            } => {
                debug!(%sid, ?method, framerate, "nyimp: set fullscreen");
            }
            wl_shell_surface::Request::SetPopup {
                serial,
                parent,
                x,
                y,
                flags,
                ..
            } => {
                let parent_sid = parent
                    .data::<SurfaceId>()
                    .copied()
                    .unwrap_or(SurfaceId::NONE);
                debug!(%sid, %parent_sid, serial, x, y, ?flags, "set popup");
                facade.add_subsurface(sid, parent_sid, x, y);
            }
            wl_shell_surface::Request::SetMaximized { .. } => {
                debug!(%sid, "nyimp: set maximized");
            }
            wl_shell_surface::Request::SetTitle { title } => {
                debug!(%sid, title, "nyimp: set title");
            }
            wl_shell_surface::Request::SetClass { class_ } => {
                debug!(%sid, class = class_, "nyimp: set class");
            }
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        shell_surface: &WlShellSurface,
        sid: &SurfaceId,
    ) {
        debug!(sid = %sid, "shell surface unbound");
        state.ctx.facade().remove_shell_surface(
            *sid,
            SurfaceResourceKind::ShellSurface,
            &shell_surface.id(),
        );
    }
}
