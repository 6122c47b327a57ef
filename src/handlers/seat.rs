//! `wl_seat` with its keyboard, pointer and (stubbed) touch devices.

use tracing::debug;
use wayland_server::protocol::wl_keyboard::{self, KeymapFormat, WlKeyboard};
use wayland_server::protocol::wl_pointer::{self, WlPointer};
use wayland_server::protocol::wl_seat::{self, Capability, WlSeat};
use wayland_server::protocol::wl_touch::{self, WlTouch};
use wayland_server::{
    Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource,
};

use super::Dispatcher;
use crate::utils::SurfaceId;

impl GlobalDispatch<WlSeat, ()> for Dispatcher {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlSeat>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let seat = data_init.init(resource, ());
        debug!(id = ?seat.id(), version = seat.version(), "bound seat");

        seat.capabilities(Capability::Pointer | Capability::Keyboard);
        if seat.version() >= 2 {
            seat.name("seat0".into());
        }
    }
}

impl Dispatch<WlSeat, ()> for Dispatcher {
    fn request(
        state: &mut Self,
        _client: &Client,
        _seat: &WlSeat,
        request: wl_seat::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        let facade = state.ctx.facade();
        match request {
            wl_seat::Request::GetPointer { id } => {
                let pointer: WlPointer = data_init.init(id, ());
                debug!(id = ?pointer.id(), "bound pointer");
                facade.add_pointer_resource(pointer);
            }
            wl_seat::Request::GetKeyboard { id } => {
                let keyboard: WlKeyboard = data_init.init(id, ());
                debug!(id = ?keyboard.id(), "bound keyboard");

                // Late-binding keyboards may receive enter immediately.
                facade.add_keyboard_resource(keyboard.clone());

                // All clients share the compositor's keymap.
                let keymap = state.ctx.keymap();
                keyboard.keymap(KeymapFormat::XkbV1, keymap.fd(), keymap.size());
            }
            wl_seat::Request::GetTouch { id } => {
                // Touch is advertised nowhere; create the resource so the
                // client keeps a consistent object tree, but events never
                // flow.
                let touch: WlTouch = data_init.init(id, ());
                debug!(id = ?touch.id(), "nyimp: get touch");
            }
            wl_seat::Request::Release => {}
            _ => {}
        }
    }
}

impl Dispatch<WlKeyboard, ()> for Dispatcher {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _keyboard: &WlKeyboard,
        request: wl_keyboard::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_keyboard::Request::Release => {}
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        keyboard: &WlKeyboard,
        _data: &(),
    ) {
        debug!("keyboard unbound");
        state.ctx.facade().remove_keyboard_resource(&keyboard.id());
    }
}

impl Dispatch<WlPointer, ()> for Dispatcher {
    fn request(
        state: &mut Self,
        _client: &Client,
        _pointer: &WlPointer,
        request: wl_pointer::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_pointer::Request::SetCursor {
                serial,
                surface,
                hotspot_x,
                hotspot_y,
            } => {
                let Some(surface) = surface else {
                    return;
                };
                let sid = surface.data::<SurfaceId>().copied().unwrap_or(SurfaceId::NONE);
                debug!(%sid, serial, hotspot_x, hotspot_y, "set cursor");
                state
                    .ctx
                    .facade()
                    .set_cursor(serial, hotspot_x, hotspot_y, sid);
            }
            wl_pointer::Request::Release => {}
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        pointer: &WlPointer,
        _data: &(),
    ) {
        debug!("pointer unbound");
        state.ctx.facade().remove_pointer_resource(&pointer.id());
    }
}

impl Dispatch<WlTouch, ()> for Dispatcher {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _touch: &WlTouch,
        request: wl_touch::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_touch::Request::Release => {}
            _ => {}
        }
    }
}
