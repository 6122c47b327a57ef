//! Mutable frontend state outside the cache: focus, xkb, selection.

use crate::keyboard::{KeyboardState, KeymapError, XkbConfig};
use crate::transfer::TransferRef;
use crate::utils::SurfaceId;

/// Focus tracking, the xkb triple and the current selection.
///
/// Guarded by its own mutex in the context. Lock order is state before
/// cache; neither lock is held across coordinator calls.
#[derive(Debug)]
pub struct WaylandState {
    /// Surface currently holding keyboard focus, or the sentinel.
    pub keyboard_focused_sid: SurfaceId,
    /// Surface currently holding pointer focus, or the sentinel.
    pub pointer_focused_sid: SurfaceId,
    /// The xkb context/keymap/state triple.
    pub keyboard: KeyboardState,
    /// The selection offered to newly focused clients, if any.
    pub current_transfer: Option<TransferRef>,
}

impl WaylandState {
    /// Creates the state with an initialized keymap and no focus.
    pub fn new(xkb: &XkbConfig) -> Result<Self, KeymapError> {
        Ok(WaylandState {
            keyboard_focused_sid: SurfaceId::NONE,
            pointer_focused_sid: SurfaceId::NONE,
            keyboard: KeyboardState::new(xkb)?,
            current_transfer: None,
        })
    }
}
