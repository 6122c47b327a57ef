//! The public face of the crate: start the frontend, feed it coordinator
//! events, stop it.

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::context::Context;
use crate::coordinator::{Coordinator, KeyState, OutputRecord, SurfaceStateFlags};
use crate::engine::{Engine, EngineError};
use crate::utils::{monotonic_ms, Position, Size, SurfaceId};

/// A running Wayland frontend.
///
/// Constructed with [`WaylandFrontend::start`]; the coordinator then calls
/// the `on_*` entries from its own threads whenever something happened that
/// clients should hear about. Dropping the value stops the protocol thread.
#[derive(Debug)]
pub struct WaylandFrontend {
    pub(crate) ctx: Context,
    engine: Engine,
}

impl WaylandFrontend {
    /// Creates the display, binds the socket, registers the globals and
    /// spawns the protocol thread.
    pub fn start(coordinator: Arc<dyn Coordinator>, config: Config) -> Result<Self, EngineError> {
        info!("initializing wayland frontend");
        let ctx = Context::new(coordinator, config)?;
        let mut engine = Engine::new(ctx.clone());
        engine.initialize()?;
        engine.start()?;
        Ok(WaylandFrontend { ctx, engine })
    }

    /// The coordinator finished drawing a frame of `sid`.
    pub fn on_surface_frame(&self, sid: SurfaceId) {
        self.ctx.gateway().screen_refresh(sid, monotonic_ms());
    }

    /// Keyboard focus moved from `old_sid` to `new_sid`; the sizes and
    /// state flags accompany the reconfiguration of both surfaces.
    #[allow(clippy::too_many_arguments)]
    pub fn on_keyboard_focus_changed(
        &self,
        old_sid: SurfaceId,
        old_size: Size,
        old_flags: SurfaceStateFlags,
        new_sid: SurfaceId,
        new_size: Size,
        new_flags: SurfaceStateFlags,
    ) {
        self.ctx.gateway().keyboard_focus_update(
            old_sid, old_size, old_flags, new_sid, new_size, new_flags,
        );
    }

    /// A key event to deliver to the focused client.
    pub fn on_keyboard_event(&self, time: u32, code: u32, state: KeyState) {
        self.ctx.gateway().key(time, code, state);
    }

    /// Pointer focus moved to `sid` at the given surface-local position.
    pub fn on_pointer_focus_changed(&self, sid: SurfaceId, pos: Position) {
        self.ctx.gateway().pointer_focus_update(sid, pos);
    }

    /// Pointer motion within `sid`.
    pub fn on_pointer_relative_motion(&self, sid: SurfaceId, pos: Position) {
        self.ctx.gateway().pointer_motion(sid, pos, monotonic_ms());
    }

    /// A button event for the pointer-focused client.
    pub fn on_pointer_button(&self, time: u32, code: u32, state: KeyState) {
        self.ctx.gateway().pointer_button(time, code, state);
    }

    /// A scroll event for the pointer-focused client.
    pub fn on_pointer_axis(&self, horizontal: f64, vertical: f64, h_discrete: i32, v_discrete: i32) {
        self.ctx
            .gateway()
            .pointer_axis(horizontal, vertical, h_discrete, v_discrete);
    }

    /// The coordinator resized a surface or changed its state flags.
    pub fn on_surface_reconfigured(&self, sid: SurfaceId, size: Size, flags: SurfaceStateFlags) {
        self.ctx.gateway().surface_reconfigured(sid, size, flags);
    }

    /// A new output appeared.
    pub fn on_output_found(&self, record: OutputRecord) {
        self.engine.advertise_output(record);
    }

    /// An output went away.
    pub fn on_output_lost(&self, name: &str) {
        self.engine.destroy_output(name);
    }

    /// Stops the protocol thread and drops every cached resource.
    pub fn finalize(mut self) {
        info!("finalizing wayland frontend");
        self.engine.stop();
    }
}

impl Drop for WaylandFrontend {
    fn drop(&mut self) {
        self.engine.stop();
    }
}
