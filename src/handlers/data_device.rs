//! The selection family: `wl_data_device_manager`, `wl_data_device`,
//! `wl_data_source` and `wl_data_offer`.

use std::sync::OnceLock;

use tracing::{debug, warn};
use wayland_server::protocol::wl_data_device::{self, WlDataDevice};
use wayland_server::protocol::wl_data_device_manager::{self, WlDataDeviceManager};
use wayland_server::protocol::wl_data_offer::{self, WlDataOffer};
use wayland_server::protocol::wl_data_source::{self, WlDataSource};
use wayland_server::{
    Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource,
};

use super::Dispatcher;
use crate::transfer::TransferRef;

/// User data of a `wl_data_source`: the transfer it owns. Filled right
/// after the resource is created (the transfer needs the resource handle).
#[derive(Debug, Default)]
pub(crate) struct DataSourceData {
    transfer: OnceLock<TransferRef>,
}

impl DataSourceData {
    pub(crate) fn transfer(&self) -> Option<&TransferRef> {
        self.transfer.get()
    }

    pub(crate) fn attach_transfer(&self, transfer: TransferRef) {
        let _ = self.transfer.set(transfer);
    }
}

impl GlobalDispatch<WlDataDeviceManager, ()> for Dispatcher {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlDataDeviceManager>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let manager = data_init.init(resource, ());
        debug!(id = ?manager.id(), "bound data device manager");
    }
}

impl Dispatch<WlDataDeviceManager, ()> for Dispatcher {
    fn request(
        state: &mut Self,
        _client: &Client,
        _manager: &WlDataDeviceManager,
        request: wl_data_device_manager::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        let facade = state.ctx.facade();
        match request {
            wl_data_device_manager::Request::CreateDataSource { id } => {
                let source: WlDataSource = data_init.init(id, DataSourceData::default());
                debug!(id = ?source.id(), "created data source");
                let transfer = facade.create_transfer(source.clone());
                source
                    .data::<DataSourceData>()
                    .expect("data source user data")
                    .attach_transfer(transfer);
            }
            wl_data_device_manager::Request::GetDataDevice { id, .. } => {
                let device: WlDataDevice = data_init.init(id, ());
                debug!(id = ?device.id(), "bound data device");
                facade.add_data_device_resource(device);
            }
            _ => {}
        }
    }
}

impl Dispatch<WlDataDevice, ()> for Dispatcher {
    fn request(
        state: &mut Self,
        _client: &Client,
        _device: &WlDataDevice,
        request: wl_data_device::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        let facade = state.ctx.facade();
        match request {
            wl_data_device::Request::StartDrag { serial, .. } => {
                debug!(serial, "nyimp: data device start drag");
            }
            wl_data_device::Request::SetSelection { source, serial } => {
                debug!(serial, "data device set selection");
                match source {
                    Some(source) => {
                        let transfer = source
                            .data::<DataSourceData>()
                            .and_then(|data| data.transfer().cloned());
                        match transfer {
                            Some(transfer) => facade.send_selection(transfer),
                            None => warn!("data source without transfer"),
                        }
                    }
                    None => facade.clear_selection(),
                }
            }
            wl_data_device::Request::Release => {}
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        device: &WlDataDevice,
        _data: &(),
    ) {
        debug!("data device unbound");
        state.ctx.facade().remove_data_device_resource(&device.id());
    }
}

impl Dispatch<WlDataSource, DataSourceData> for Dispatcher {
    fn request(
        state: &mut Self,
        _client: &Client,
        _source: &WlDataSource,
        request: wl_data_source::Request,
        data: &DataSourceData,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        let facade = state.ctx.facade();
        match request {
            wl_data_source::Request::Offer { mime_type } => {
                debug!(mime = %mime_type, "data source offer");
                match data.transfer() {
                    Some(transfer) => facade.add_mime_type(transfer, mime_type),
                    None => warn!("data source without transfer"),
                }
            }
            wl_data_source::Request::Destroy => {}
            wl_data_source::Request::SetActions { dnd_actions } => {
                debug!(?dnd_actions, "nyimp: data source set actions");
            }
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _source: &WlDataSource,
        data: &DataSourceData,
    ) {
        debug!("data source destroyed");
        if let Some(transfer) = data.transfer() {
            state.ctx.facade().destroy_transfer(transfer);
        }
    }
}

impl Dispatch<WlDataOffer, TransferRef> for Dispatcher {
    fn request(
        state: &mut Self,
        _client: &Client,
        offer: &WlDataOffer,
        request: wl_data_offer::Request,
        transfer: &TransferRef,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        let facade = state.ctx.facade();
        match request {
            wl_data_offer::Request::Accept { serial, mime_type } => {
                // Only meaningful during drag-and-drop; selection offers
                // take no feedback.
                debug!(serial, ?mime_type, "data offer accept");
            }
            wl_data_offer::Request::Receive { mime_type, fd } => {
                facade.receive_data_offer(transfer, mime_type, fd);
            }
            wl_data_offer::Request::Destroy => {}
            wl_data_offer::Request::Finish => {
                // Every offer minted here is a selection offer.
                offer.post_error(
                    wl_data_offer::Error::InvalidFinish,
                    "finish is only valid on drag-and-drop offers",
                );
            }
            wl_data_offer::Request::SetActions {
                dnd_actions,
                preferred_action,
            } => {
                debug!(?dnd_actions, ?preferred_action, "data offer set actions");
                offer.post_error(
                    wl_data_offer::Error::InvalidOffer,
                    "set_actions is only valid on drag-and-drop offers",
                );
            }
            _ => {}
        }
    }
}
