//! SHM buffer handling.
//!
//! The wire library does not ship a `wl_shm` implementation, so the
//! frontend carries its own: `wl_shm.create_pool` maps the client's fd,
//! `wl_shm_pool` hands out buffers described by offset/size/stride, and
//! attached buffers are resolved into [`ShmView`]s the coordinator can read.
//! Advertised formats are `argb8888` and `xrgb8888`, the two the protocol
//! mandates.

mod pool;

use std::sync::Arc;

use tracing::debug;
use wayland_server::protocol::wl_buffer::{self, WlBuffer};
use wayland_server::protocol::wl_shm::{self, Format, WlShm};
use wayland_server::protocol::wl_shm_pool::{self, WlShmPool};
use wayland_server::{
    Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource, WEnum,
};

use crate::handlers::Dispatcher;

pub use pool::{Pool, ResizeError, ShmView};

/// User data of a `wl_shm_pool` resource.
#[derive(Debug)]
pub struct ShmPoolData {
    pool: Arc<Pool>,
}

/// User data of an SHM-backed `wl_buffer` resource.
#[derive(Debug)]
pub struct ShmBufferData {
    pool: Arc<Pool>,
    /// Byte offset of the buffer inside the pool.
    pub offset: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Bytes per row.
    pub stride: i32,
    /// Pixel format.
    pub format: Format,
}

impl ShmBufferData {
    pub(crate) fn new(
        pool: Arc<Pool>,
        offset: i32,
        width: i32,
        height: i32,
        stride: i32,
        format: Format,
    ) -> Self {
        ShmBufferData {
            pool,
            offset,
            width,
            height,
            stride,
            format,
        }
    }
}

/// Resolves a buffer into its dimensions and a shared view of its bytes.
/// Returns `None` for buffers that are not SHM-backed.
pub fn buffer_contents(buffer: &WlBuffer) -> Option<(i32, i32, i32, ShmView)> {
    let data = buffer.data::<ShmBufferData>()?;
    let len = (data.stride as usize).saturating_mul(data.height as usize);
    let view = ShmView::new(data.pool.clone(), data.offset as usize, len);
    Some((data.width, data.height, data.stride, view))
}

impl GlobalDispatch<WlShm, ()> for Dispatcher {
    fn bind(
        _state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlShm>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let shm = data_init.init(resource, ());
        shm.format(Format::Argb8888);
        shm.format(Format::Xrgb8888);
    }
}

impl Dispatch<WlShm, ()> for Dispatcher {
    fn request(
        _state: &mut Self,
        _client: &Client,
        shm: &WlShm,
        request: wl_shm::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_shm::Request::CreatePool { id, fd, size } => {
                if size <= 0 {
                    shm.post_error(wl_shm::Error::InvalidStride, "pool size must be positive");
                    return;
                }
                match Pool::new(fd, size as usize) {
                    Ok(pool) => {
                        data_init.init(id, ShmPoolData { pool });
                    }
                    Err(err) => {
                        shm.post_error(wl_shm::Error::InvalidFd, format!("mmap failed: {err}"));
                    }
                }
            }
            _ => {}
        }
    }
}

impl Dispatch<WlShmPool, ShmPoolData> for Dispatcher {
    fn request(
        _state: &mut Self,
        _client: &Client,
        pool: &WlShmPool,
        request: wl_shm_pool::Request,
        data: &ShmPoolData,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_shm_pool::Request::CreateBuffer {
                id,
                offset,
                width,
                height,
                stride,
                format,
            } => {
                let format = match format {
                    WEnum::Value(format @ (Format::Argb8888 | Format::Xrgb8888)) => format,
                    WEnum::Value(other) => {
                        pool.post_error(
                            wl_shm::Error::InvalidFormat,
                            format!("format {other:?} is not advertised"),
                        );
                        return;
                    }
                    WEnum::Unknown(raw) => {
                        pool.post_error(
                            wl_shm::Error::InvalidFormat,
                            format!("unknown format 0x{raw:x}"),
                        );
                        return;
                    }
                };

                if offset < 0
                    || width <= 0
                    || height <= 0
                    || (stride as i64) < (width as i64) * 4
                    || (offset as i64) + (stride as i64) * (height as i64)
                        > data.pool.size() as i64
                {
                    pool.post_error(
                        wl_shm::Error::InvalidStride,
                        format!(
                            "invalid buffer geometry: offset {offset}, {width}x{height}, stride {stride}"
                        ),
                    );
                    return;
                }

                data_init.init(
                    id,
                    ShmBufferData::new(data.pool.clone(), offset, width, height, stride, format),
                );
            }
            wl_shm_pool::Request::Resize { size } => {
                if size <= 0 {
                    pool.post_error(wl_shm::Error::InvalidFd, "pool size must be positive");
                    return;
                }
                if let Err(err) = data.pool.resize(size as usize) {
                    pool.post_error(wl_shm::Error::InvalidFd, format!("resize failed: {err}"));
                }
            }
            wl_shm_pool::Request::Destroy => {
                // Buffers keep the mapping alive through their own Arc.
            }
            _ => {}
        }
    }
}

impl Dispatch<WlBuffer, ShmBufferData> for Dispatcher {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _buffer: &WlBuffer,
        request: wl_buffer::Request,
        _data: &ShmBufferData,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            wl_buffer::Request::Destroy => {}
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        buffer: &WlBuffer,
        _data: &ShmBufferData,
    ) {
        debug!("buffer destroyed");
        state.ctx.cache().lock().scrub_buffer(&buffer.id());
    }
}
