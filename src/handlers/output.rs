//! `wl_output` globals, one per advertised output.

use tracing::debug;
use wayland_server::protocol::wl_output::{self, Mode, Subpixel, Transform, WlOutput};
use wayland_server::{
    Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource,
};

use super::Dispatcher;
use crate::coordinator::OutputRecord;

impl GlobalDispatch<WlOutput, OutputRecord> for Dispatcher {
    fn bind(
        state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlOutput>,
        record: &OutputRecord,
        data_init: &mut DataInit<'_, Self>,
    ) {
        let output = data_init.init(resource, ());
        debug!(
            id = ?output.id(),
            name = %record.name,
            width = record.area.size.width,
            height = record.area.size.height,
            "bound output"
        );

        output.geometry(
            record.area.pos.x,
            record.area.pos.y,
            record.physical_size.width,
            record.physical_size.height,
            Subpixel::Unknown,
            record.make.clone(),
            record.model.clone(),
            Transform::Normal,
        );
        output.mode(
            Mode::Current,
            record.area.size.width,
            record.area.size.height,
            record.refresh,
        );
        if output.version() >= 2 {
            output.scale(1);
            output.done();
        }

        state.ctx.facade().add_general_resource(output.id());
    }
}

impl Dispatch<WlOutput, ()> for Dispatcher {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _output: &WlOutput,
        request: wl_output::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_output::Request::Release => {}
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        output: &WlOutput,
        _data: &(),
    ) {
        debug!("output unbound");
        state.ctx.facade().remove_general_resource(&output.id());
    }
}
