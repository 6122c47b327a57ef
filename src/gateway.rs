//! The outbound boundary: coordinator notifications become Wayland events.
//!
//! The gateway is the only place that emits protocol events. Each entry
//! locks the state and/or cache (state first), collects the matching
//! resources, and emits the exact sequence each protocol expects. Emission
//! is non-blocking (events are queued on the wire), so enumerating under
//! the cache lock is safe; clients that disconnected in the meantime are
//! skipped because their resources have already left the cache.
//!
//! Ordering guarantees kept here:
//! - enter always precedes any input event of a focus epoch;
//! - serials within one enter/leave/key sequence increase monotonically;
//! - a buffer release precedes every frame callback of the same refresh.

use tracing::{debug, warn};
use wayland_server::protocol::wl_data_device_manager::DndAction;
use wayland_server::protocol::wl_data_offer::WlDataOffer;
use wayland_server::protocol::wl_keyboard;
use wayland_server::protocol::wl_pointer::{self, Axis};
use wayland_server::protocol::wl_shell_surface;
use wayland_server::Resource;

use crate::context::Context;
use crate::coordinator::{KeyState, SurfaceStateFlags};
use crate::handlers::Dispatcher;
use crate::protocols::xdg::xdg_surface;
use crate::transfer::TransferRef;
use crate::utils::{Position, Size, SurfaceId};

/// Borrowed view over the context exposing the outbound operations.
#[derive(Debug)]
pub struct Gateway<'a> {
    ctx: &'a Context,
}

impl<'a> Gateway<'a> {
    pub(crate) fn new(ctx: &'a Context) -> Self {
        Gateway { ctx }
    }

    /// A frame finished for `sid`: release the attached buffer, then fire
    /// and consume the queued frame callbacks in FIFO order.
    pub fn screen_refresh(&self, sid: SurfaceId, milliseconds: u32) {
        debug!(%sid, "screen refresh");

        let (buffer, frames) = {
            let mut cache = self.ctx.cache().lock();
            match cache.find_surface_mut(sid) {
                Some(record) => (record.take_buffer(), record.take_frames()),
                None => {
                    warn!(%sid, "screen refresh for unknown surface");
                    return;
                }
            }
        };

        // The release must reach the client before any callback for the
        // same frame.
        if let Some(buffer) = buffer {
            buffer.release();
        }
        for callback in frames {
            // done is a destructor event; the callback dies with it.
            callback.done(milliseconds);
        }
    }

    /// Keyboard focus moved between surfaces. Leave/enter pairs are only
    /// emitted when the two surfaces belong to different clients; in every
    /// case the new selection is offered and both surfaces get their state
    /// flags refreshed.
    #[allow(clippy::too_many_arguments)]
    pub fn keyboard_focus_update(
        &self,
        old_sid: SurfaceId,
        old_size: Size,
        old_flags: SurfaceStateFlags,
        new_sid: SurfaceId,
        new_size: Size,
        new_flags: SurfaceStateFlags,
    ) {
        let clients_differ = {
            let mut state = self.ctx.state();
            let cache = self.ctx.cache().lock();

            let old = cache.resource_and_client_for(old_sid);
            let new = cache.resource_and_client_for(new_sid);
            let old_client = old.as_ref().map(|(_, client)| client.id());
            let new_client = new.as_ref().map(|(_, client)| client.id());
            let differ = old_client != new_client;

            if differ {
                debug!(%old_sid, %new_sid, "keyboard focus update");
                state.keyboard_focused_sid = SurfaceId::NONE;

                if let Some((old_surface, _)) = &old {
                    let serial = self.ctx.next_serial();
                    for keyboard in cache.keyboards() {
                        if keyboard.client().map(|c| c.id()) == old_client {
                            keyboard.leave(serial.into(), old_surface);
                        }
                    }
                }
                if let Some((new_surface, _)) = &new {
                    let serial = self.ctx.next_serial();
                    for keyboard in cache.keyboards() {
                        if keyboard.client().map(|c| c.id()) == new_client {
                            keyboard.enter(serial.into(), new_surface, Vec::new());
                        }
                    }
                }
            }

            state.keyboard_focused_sid = new_sid;
            differ
        };

        if clients_differ {
            // The freshly focused client must see the clipboard before any
            // further key event.
            self.send_selection();
        }

        self.surface_reconfigured(old_sid, old_size, old_flags);
        self.surface_reconfigured(new_sid, new_size, new_flags);
    }

    /// A key went down or up. The xkb state is updated first; the focused
    /// client gets the key with a fresh serial, followed by `modifiers`
    /// under the same serial when the quadruple changed.
    pub fn key(&self, time: u32, code: u32, key_state: KeyState) {
        let (mods_changed, mods, focused_sid) = {
            let mut state = self.ctx.state();
            let old_mods = state.keyboard.modifiers();
            state.keyboard.update_key(code, key_state);
            let new_mods = state.keyboard.modifiers();
            (old_mods != new_mods, new_mods, state.keyboard_focused_sid)
        };

        if focused_sid.is_none() {
            return;
        }

        let cache = self.ctx.cache().lock();
        let Some((_, client)) = cache.resource_and_client_for(focused_sid) else {
            return;
        };

        let serial = self.ctx.next_serial();
        let wire_state = match key_state {
            KeyState::Pressed => wl_keyboard::KeyState::Pressed,
            KeyState::Released => wl_keyboard::KeyState::Released,
        };
        for keyboard in cache.keyboards() {
            if keyboard.client().map(|c| c.id()) == Some(client.id()) {
                keyboard.key(serial.into(), time, code, wire_state);
                if mods_changed {
                    keyboard.modifiers(
                        serial.into(),
                        mods.depressed,
                        mods.latched,
                        mods.locked,
                        mods.effective,
                    );
                }
            }
        }
    }

    /// Pointer focus moved to `new_sid` at the given surface-local
    /// position.
    pub fn pointer_focus_update(&self, new_sid: SurfaceId, pos: Position) {
        let mut state = self.ctx.state();
        let cache = self.ctx.cache().lock();

        let old_sid = state.pointer_focused_sid;
        let old = cache.resource_and_client_for(old_sid);
        let new = cache.resource_and_client_for(new_sid);

        state.pointer_focused_sid = SurfaceId::NONE;

        if let Some((old_surface, old_client)) = &old {
            let serial = self.ctx.next_serial();
            for pointer in cache.pointers() {
                if pointer.client().map(|c| c.id()) == Some(old_client.id()) {
                    pointer.leave(serial.into(), old_surface);
                }
            }
        }
        if let Some((new_surface, new_client)) = &new {
            let serial = self.ctx.next_serial();
            for pointer in cache.pointers() {
                if pointer.client().map(|c| c.id()) == Some(new_client.id()) {
                    pointer.enter(serial.into(), new_surface, pos.x as f64, pos.y as f64);
                }
            }
        }

        state.pointer_focused_sid = new_sid;
    }

    /// Pointer motion in surface-local coordinates of `sid`.
    pub fn pointer_motion(&self, sid: SurfaceId, pos: Position, milliseconds: u32) {
        let cache = self.ctx.cache().lock();
        let Some((_, client)) = cache.resource_and_client_for(sid) else {
            return;
        };
        for pointer in cache.pointers() {
            if pointer.client().map(|c| c.id()) == Some(client.id()) {
                pointer.motion(milliseconds, pos.x as f64, pos.y as f64);
            }
        }
    }

    /// A button event for the pointer-focused client.
    pub fn pointer_button(&self, time: u32, button: u32, button_state: KeyState) {
        let focused_sid = self.ctx.state().pointer_focused_sid;
        let cache = self.ctx.cache().lock();
        let Some((_, client)) = cache.resource_and_client_for(focused_sid) else {
            return;
        };

        let wire_state = match button_state {
            KeyState::Pressed => wl_pointer::ButtonState::Pressed,
            KeyState::Released => wl_pointer::ButtonState::Released,
        };
        for pointer in cache.pointers() {
            if pointer.client().map(|c| c.id()) == Some(client.id()) {
                let serial = self.ctx.next_serial();
                pointer.button(serial.into(), time, button, wire_state);
            }
        }
    }

    /// Scroll events for the pointer-focused client. Per direction
    /// (horizontal first) a discrete step precedes the continuous value;
    /// a zero continuous value becomes `axis_stop`.
    pub fn pointer_axis(&self, horizontal: f64, vertical: f64, h_discrete: i32, v_discrete: i32) {
        let focused_sid = self.ctx.state().pointer_focused_sid;
        let cache = self.ctx.cache().lock();
        let Some((_, client)) = cache.resource_and_client_for(focused_sid) else {
            return;
        };

        for pointer in cache.pointers() {
            if pointer.client().map(|c| c.id()) != Some(client.id()) {
                continue;
            }
            emit_axis(pointer, Axis::HorizontalScroll, horizontal, h_discrete);
            emit_axis(pointer, Axis::VerticalScroll, vertical, v_discrete);
            if pointer.version() >= 5 {
                pointer.frame();
            }
        }
    }

    /// Tells the surface its size or state flags changed. A `wl_shell`
    /// role takes precedence over an xdg role when both are present.
    pub fn surface_reconfigured(&self, sid: SurfaceId, size: Size, flags: SurfaceStateFlags) {
        if sid.is_none() {
            return;
        }

        let focused_sid = self.ctx.state().keyboard_focused_sid;
        let cache = self.ctx.cache().lock();
        let Some(record) = cache.find_surface(sid) else {
            return;
        };

        debug!(%sid, width = size.width, height = size.height, "surface reconfiguration");

        if let Some(shell_surface) = record.shell_surface() {
            shell_surface.configure(wl_shell_surface::Resize::None, size.width, size.height);
        } else if let Some(xdg_surface) = record.xdg_surface() {
            let mut states: Vec<u32> = Vec::new();
            if flags.contains(SurfaceStateFlags::MAXIMIZED) {
                states.push(xdg_surface::State::Maximized as u32);
            }
            if sid == focused_sid {
                states.push(xdg_surface::State::Activated as u32);
            }
            let states = states.iter().flat_map(|s| s.to_ne_bytes()).collect();
            let serial = self.ctx.next_serial();
            xdg_surface.configure(size.width, size.height, states, serial.into());
        } else {
            debug!(%sid, "reconfiguration for surface without shell role");
        }
    }

    /// Offers the current selection to the keyboard-focused client: one
    /// fresh data offer per data-device resource, the stored MIME types
    /// replayed in order, then the selection event.
    pub fn send_selection(&self) {
        let Some(dh) = self.ctx.display_handle().cloned() else {
            return;
        };

        let (transfer, focused_sid) = {
            let state = self.ctx.state();
            match state.current_transfer.clone() {
                Some(transfer) => (transfer, state.keyboard_focused_sid),
                None => return,
            }
        };

        let cache = self.ctx.cache().lock();
        let Some((_, focused_client)) = cache.resource_and_client_for(focused_sid) else {
            return;
        };

        debug!(%focused_sid, "sending selection");
        let mime_types = transfer
            .lock()
            .expect("transfer mutex poisoned")
            .mime_types()
            .to_vec();

        for device in cache.data_devices() {
            let Some(client) = device.client() else {
                continue;
            };
            if client.id() != focused_client.id() {
                continue;
            }

            let offer = match client.create_resource::<WlDataOffer, TransferRef, Dispatcher>(
                &dh,
                device.version(),
                transfer.clone(),
            ) {
                Ok(offer) => offer,
                Err(err) => {
                    warn!("could not create data offer: {err}");
                    continue;
                }
            };

            device.data_offer(&offer);
            for mime_type in &mime_types {
                offer.offer(mime_type.clone());
            }
            if offer.version() >= 3 {
                offer.action(DndAction::Copy);
            }
            device.selection(Some(&offer));
        }
    }
}

fn emit_axis(pointer: &wl_pointer::WlPointer, axis: Axis, value: f64, discrete: i32) {
    if discrete != 0 && pointer.version() >= 5 {
        pointer.axis_discrete(axis, discrete);
    }
    if value != 0.0 {
        pointer.axis(0, axis, value);
    } else if pointer.version() >= 5 {
        pointer.axis_stop(0, axis);
    }
}
