//! Protocol handlers: one bind/dispatch/unbind triad per interface.
//!
//! Handlers are thin shells. Each request is translated into exactly one
//! facade entry; each resource destruction removes the resource from the
//! cache. Surface-carrying resources keep their [`SurfaceId`] as user data,
//! regions their [`RegionId`], selection resources the transfer they belong
//! to.
//!
//! [`SurfaceId`]: crate::utils::SurfaceId
//! [`RegionId`]: crate::utils::RegionId

mod compositor;
pub(crate) mod data_device;
mod output;
mod screenshooter;
mod seat;
mod shell;
mod subcompositor;
mod xdg_shell;

use wayland_server::backend::{ClientId, DisconnectReason};

use crate::context::Context;

/// The protocol-thread dispatch state: every `Dispatch`/`GlobalDispatch`
/// implementation in the crate targets this type.
#[derive(Debug)]
pub(crate) struct Dispatcher {
    pub(crate) ctx: Context,
}

impl Dispatcher {
    pub(crate) fn new(ctx: Context) -> Self {
        Dispatcher { ctx }
    }
}

/// Per-client data attached when a connection is accepted. Resource
/// cleanup happens in the `destroyed` hooks, so nothing is needed here.
#[derive(Debug)]
pub(crate) struct ClientState;

impl wayland_server::backend::ClientData for ClientState {
    fn initialized(&self, _client_id: ClientId) {}
    fn disconnected(&self, _client_id: ClientId, _reason: DisconnectReason) {}
}
