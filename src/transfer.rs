//! Selection (clipboard) transfers.

use std::sync::{Arc, Mutex};

use wayland_server::protocol::wl_data_source::WlDataSource;

/// A selection offer: the owning data-source resource plus the ordered list
/// of MIME types the client announced for it.
#[derive(Debug)]
pub struct Transfer {
    source: WlDataSource,
    mime_types: Vec<String>,
}

/// Shared handle to a [`Transfer`].
///
/// The same transfer is reachable from the data-source resource that owns
/// it, from every data-offer resource minted for it, and from the current
/// selection slot in the frontend state.
pub type TransferRef = Arc<Mutex<Transfer>>;

impl Transfer {
    /// Creates a transfer owned by `source` with no MIME types yet.
    pub fn new(source: WlDataSource) -> TransferRef {
        Arc::new(Mutex::new(Transfer {
            source,
            mime_types: Vec::new(),
        }))
    }

    /// Appends an announced MIME type.
    pub fn add_mime_type(&mut self, mime_type: String) {
        self.mime_types.push(mime_type);
    }

    /// The MIME types in announcement order.
    pub fn mime_types(&self) -> &[String] {
        &self.mime_types
    }

    /// The data-source resource owning this transfer.
    pub fn source(&self) -> &WlDataSource {
        &self.source
    }
}
