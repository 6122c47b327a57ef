//! The `screenshooter` protocol used by the companion diagnostic tool.
//!
//! The interface surface is kept so the tool can bind; the capture path
//! itself is a future feature.

use tracing::debug;
use wayland_server::{
    Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource,
};

use super::Dispatcher;
use crate::protocols::screenshooter::screenshooter::{self, Screenshooter};

impl GlobalDispatch<Screenshooter, ()> for Dispatcher {
    fn bind(
        state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<Screenshooter>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let screenshooter = data_init.init(resource, ());
        debug!(id = ?screenshooter.id(), "bound screenshooter");
        state.ctx.facade().add_general_resource(screenshooter.id());
    }
}

impl Dispatch<Screenshooter, ()> for Dispatcher {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _screenshooter: &Screenshooter,
        request: screenshooter::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            screenshooter::Request::Shoot { .. } => {
                debug!("nyimp: screenshooter shoot");
            }
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        screenshooter: &Screenshooter,
        _data: &(),
    ) {
        state
            .ctx
            .facade()
            .remove_general_resource(&screenshooter.id());
    }
}
