//! The contract between the frontend and the compositor core.
//!
//! The coordinator owns surface state, the framing tree, focus decisions and
//! rendering. The frontend only talks to it through the [`Coordinator`]
//! trait; everything the coordinator wants to tell clients comes back in
//! through [`WaylandFrontend`](crate::frontend::WaylandFrontend).

use std::fmt;

use crate::shm::ShmView;
use crate::utils::{Area, Position, Size, SurfaceId};

bitflags::bitflags! {
    /// State bits reported alongside a surface reconfiguration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SurfaceStateFlags: u32 {
        /// The surface occupies the whole workspace area.
        const MAXIMIZED = 0x1;
    }
}

/// Why a surface became eligible for showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowReason {
    /// The surface acquired a shell role and can be mapped.
    InShell,
}

/// Pressed/released state of a key or button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// The key or button was released.
    Released,
    /// The key or button was pressed.
    Pressed,
}

impl KeyState {
    /// Maps the raw wire value (0 = released, anything else = pressed).
    pub fn from_raw(value: u32) -> Self {
        if value == 0 {
            KeyState::Released
        } else {
            KeyState::Pressed
        }
    }
}

/// Description of the pixel source a client attached to a surface.
///
/// For SHM buffers `view` grants shared read access to the mapped pool. For
/// anything else the dimensions are zeroed and `view` is absent; the attach
/// is still forwarded so the coordinator can refuse it.
#[derive(Debug, Clone, Default)]
pub struct PixelSource {
    /// Buffer width in pixels.
    pub width: i32,
    /// Buffer height in pixels.
    pub height: i32,
    /// Bytes per row.
    pub stride: i32,
    /// Shared view into the client's mapped memory, when SHM-backed.
    pub view: Option<ShmView>,
}

/// Everything the frontend needs to advertise one output.
#[derive(Debug, Clone)]
pub struct OutputRecord {
    /// Unique output name; keys the engine's global table.
    pub name: String,
    /// Position and resolution inside the global space.
    pub area: Area,
    /// Physical dimensions in millimeters.
    pub physical_size: Size,
    /// Monitor make.
    pub make: String,
    /// Monitor model.
    pub model: String,
    /// Refresh rate of the single advertised mode, in millihertz.
    pub refresh: i32,
}

/// The inbound half of the compositor core, as seen from the frontend.
///
/// Implementations synchronize internally; every entry may be called from
/// the protocol thread, and a few (surface lookups during reconfiguration)
/// from coordinator threads as well. All entries are fire-and-forget.
///
/// Entries must not call back into the frontend synchronously: a few facade
/// sequences hold the cache mutex across the coordinator call (surface
/// teardown), so a synchronous callback would self-deadlock. Post an event
/// and deliver it from a coordinator thread instead.
pub trait Coordinator: Send + Sync {
    /// Allocates a fresh surface and returns its identifier.
    fn surface_create(&self) -> SurfaceId;

    /// Destroys a surface and everything that hangs off it.
    fn surface_destroy(&self, sid: SurfaceId);

    /// Latches the pending buffer/region/offset state of a surface.
    fn surface_commit(&self, sid: SurfaceId);

    /// Marks a surface as mappable.
    fn surface_show(&self, sid: SurfaceId, reason: ShowReason);

    /// Hands the surface a new pixel source.
    fn surface_attach(&self, sid: SurfaceId, source: PixelSource);

    /// Removes the surface's pixel source (the client attached nothing).
    fn surface_detach(&self, sid: SurfaceId);

    /// Makes the surface the pointer cursor image.
    fn surface_set_as_cursor(&self, sid: SurfaceId);

    /// Sets the surface offset inside its frame.
    fn surface_set_offset(&self, sid: SurfaceId, pos: Position);

    /// Sets the size the client asked for.
    fn surface_set_requested_size(&self, sid: SurfaceId, size: Size);

    /// Clears offset and requested size back to their defaults.
    fn surface_reset_offset_and_requested_size(&self, sid: SurfaceId);

    /// Positions a satellite relative to its parent.
    fn surface_set_relative_position(&self, sid: SurfaceId, pos: Position);

    /// Attaches `sid` to `parent` as a satellite.
    fn surface_relate(&self, sid: SurfaceId, parent: SurfaceId);

    /// Detaches `sid` from its parent.
    fn surface_unrelate(&self, sid: SurfaceId);

    /// Moves `sid` directly above or below `sibling` on the parent's
    /// ordered satellite list. Does nothing when the two surfaces are not
    /// satellites of the same parent.
    fn surface_reorder(&self, sid: SurfaceId, sibling: SurfaceId, above: bool);
}

impl fmt::Debug for dyn Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Coordinator")
    }
}
