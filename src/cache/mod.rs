//! The shared registry tying protocol objects to compositor surfaces.
//!
//! The cache is the single source of truth for "which client owns what": it
//! maps surface identifiers to their role resources, region identifiers to
//! their rectangles, and keeps the categorized lists of input and data
//! resources used for event fan-out.
//!
//! One mutex guards everything. [`Cache::lock`] hands out a guard exposing
//! the primitives; the facade and gateway bracket their access sequences
//! with it and keep held-lock sections short. No I/O and no coordinator
//! call happens while the lock is held, with one documented exception
//! (surface teardown, which must be atomic with the coordinator's own
//! destroy). Resource unbind callbacks run on the protocol thread with no
//! other lock held and take this same mutex.

pub mod region;
pub mod surface;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use rand::Rng;
use tracing::{debug, warn};
use wayland_server::backend::ObjectId;
use wayland_server::protocol::wl_data_device::WlDataDevice;
use wayland_server::protocol::wl_keyboard::WlKeyboard;
use wayland_server::protocol::wl_pointer::WlPointer;
use wayland_server::protocol::wl_surface::WlSurface;
use wayland_server::{Client, Resource};

use crate::utils::{RegionId, SurfaceId};

pub use region::RegionRecord;
pub use surface::{SurfaceRecord, SurfaceResource, SurfaceResourceKind};

#[derive(Debug, Default)]
struct CacheInner {
    surfaces: HashMap<SurfaceId, SurfaceRecord>,
    regions: HashMap<RegionId, RegionRecord>,
    keyboards: Vec<WlKeyboard>,
    pointers: Vec<WlPointer>,
    data_devices: Vec<WlDataDevice>,
    others: Vec<ObjectId>,
}

/// The thread-safe registry of surfaces, regions and categorized resources.
#[derive(Debug, Default)]
pub struct Cache {
    inner: Mutex<CacheInner>,
}

impl Cache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Cache::default()
    }

    /// Takes the cache mutex for a sequence of primitive operations.
    pub fn lock(&self) -> CacheGuard<'_> {
        CacheGuard {
            inner: self.inner.lock().expect("cache mutex poisoned"),
        }
    }
}

/// Exclusive access to the cache; all primitives live here so the borrow
/// makes the locking discipline visible at every call site.
#[derive(Debug)]
pub struct CacheGuard<'a> {
    inner: MutexGuard<'a, CacheInner>,
}

impl CacheGuard<'_> {
    /// Creates an empty surface record for `sid`. Adding the sentinel is a
    /// silent no-op.
    pub fn create_surface(&mut self, sid: SurfaceId) {
        if sid.is_none() {
            return;
        }
        debug!(%sid, "creating surface");
        self.inner.surfaces.insert(sid, SurfaceRecord::default());
    }

    /// Drops the surface record for `sid`, with whatever resources were
    /// still in its slots.
    pub fn remove_surface(&mut self, sid: SurfaceId) {
        if sid.is_none() {
            return;
        }
        debug!(%sid, "removing surface");
        if let Some(record) = self.inner.surfaces.remove(&sid) {
            if record.frame_count() > 2 {
                warn!(%sid, count = record.frame_count(), "frame resources not released");
            }
        }
    }

    /// Looks the surface record up.
    pub fn find_surface(&self, sid: SurfaceId) -> Option<&SurfaceRecord> {
        if sid.is_none() {
            return None;
        }
        self.inner.surfaces.get(&sid)
    }

    /// Looks the surface record up for mutation.
    pub fn find_surface_mut(&mut self, sid: SurfaceId) -> Option<&mut SurfaceRecord> {
        if sid.is_none() {
            return None;
        }
        self.inner.surfaces.get_mut(&sid)
    }

    /// Creates a region with a freshly generated identifier.
    pub fn create_region(&mut self) -> RegionId {
        let rid = loop {
            let candidate = RegionId::new(rand::thread_rng().gen());
            if !candidate.is_none() && !self.inner.regions.contains_key(&candidate) {
                break candidate;
            }
        };
        debug!(%rid, "creating region");
        self.inner.regions.insert(rid, RegionRecord::new());
        rid
    }

    /// Looks the region up.
    pub fn find_region(&self, rid: RegionId) -> Option<&RegionRecord> {
        if rid.is_none() {
            return None;
        }
        self.inner.regions.get(&rid)
    }

    /// Looks the region up for mutation.
    pub fn find_region_mut(&mut self, rid: RegionId) -> Option<&mut RegionRecord> {
        if rid.is_none() {
            return None;
        }
        self.inner.regions.get_mut(&rid)
    }

    /// Drops the region.
    pub fn remove_region(&mut self, rid: RegionId) {
        if rid.is_none() {
            return;
        }
        debug!(%rid, "removing region");
        self.inner.regions.remove(&rid);
    }

    /// Stores a role resource on a surface. A missing surface is tolerated
    /// with a warning; some clients destroy the surface before its role
    /// resources.
    pub fn add_surface_resource(&mut self, sid: SurfaceId, resource: SurfaceResource) {
        match self.inner.surfaces.get_mut(&sid) {
            Some(record) => record.add_resource(resource),
            None => warn!(%sid, "surface not found"),
        }
    }

    /// Removes a role resource from a surface; same tolerance as adding.
    pub fn remove_surface_resource(
        &mut self,
        sid: SurfaceId,
        kind: SurfaceResourceKind,
        id: &ObjectId,
    ) {
        match self.inner.surfaces.get_mut(&sid) {
            Some(record) => record.remove_resource(kind, id),
            None => warn!(%sid, "surface not found"),
        }
    }

    /// Registers a keyboard resource for event fan-out.
    pub fn add_keyboard(&mut self, keyboard: WlKeyboard) {
        self.inner.keyboards.push(keyboard);
    }

    /// Unregisters a keyboard resource.
    pub fn remove_keyboard(&mut self, id: &ObjectId) {
        self.inner.keyboards.retain(|kb| kb.id() != *id);
    }

    /// The registered keyboard resources.
    pub fn keyboards(&self) -> &[WlKeyboard] {
        &self.inner.keyboards
    }

    /// Registers a pointer resource for event fan-out.
    pub fn add_pointer(&mut self, pointer: WlPointer) {
        self.inner.pointers.push(pointer);
    }

    /// Unregisters a pointer resource.
    pub fn remove_pointer(&mut self, id: &ObjectId) {
        self.inner.pointers.retain(|ptr| ptr.id() != *id);
    }

    /// The registered pointer resources.
    pub fn pointers(&self) -> &[WlPointer] {
        &self.inner.pointers
    }

    /// Registers a data-device resource for selection delivery.
    pub fn add_data_device(&mut self, device: WlDataDevice) {
        self.inner.data_devices.push(device);
    }

    /// Unregisters a data-device resource.
    pub fn remove_data_device(&mut self, id: &ObjectId) {
        self.inner.data_devices.retain(|dd| dd.id() != *id);
    }

    /// The registered data-device resources.
    pub fn data_devices(&self) -> &[WlDataDevice] {
        &self.inner.data_devices
    }

    /// Tracks a miscellaneous resource so teardown can audit leftovers.
    pub fn add_other(&mut self, id: ObjectId) {
        self.inner.others.push(id);
    }

    /// Forgets a miscellaneous resource.
    pub fn remove_other(&mut self, id: &ObjectId) {
        self.inner.others.retain(|other| other != id);
    }

    /// Clears every buffer slot holding the given (destroyed) buffer, so a
    /// later refresh does not try to release a dead resource.
    pub fn scrub_buffer(&mut self, id: &ObjectId) {
        for record in self.inner.surfaces.values_mut() {
            if record.buffer().map(|b| b.id()).as_ref() == Some(id) {
                record.take_buffer();
            }
        }
    }

    /// The main resource and owning client for a surface, when both are
    /// still alive.
    pub fn resource_and_client_for(&self, sid: SurfaceId) -> Option<(WlSurface, Client)> {
        let record = self.find_surface(sid)?;
        let main = record.main()?.clone();
        let client = main.client()?;
        Some((main, client))
    }

    /// Number of live surface records.
    pub fn surface_count(&self) -> usize {
        self.inner.surfaces.len()
    }

    /// Number of live region records.
    pub fn region_count(&self) -> usize {
        self.inner.regions.len()
    }

    /// Logs anything still registered and clears every table. Called once
    /// when the protocol thread winds down.
    pub fn finalize(&mut self) {
        let inner = &mut *self.inner;
        for (name, len) in [
            ("keyboard", inner.keyboards.len()),
            ("pointer", inner.pointers.len()),
            ("data-device", inner.data_devices.len()),
            ("other", inner.others.len()),
        ] {
            if len > 0 {
                warn!(category = name, count = len, "resources were not released");
            }
        }
        inner.keyboards.clear();
        inner.pointers.clear();
        inner.data_devices.clear();
        inner.others.clear();
        inner.surfaces.clear();
        inner.regions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Area;
    use proptest::prelude::*;

    #[test]
    fn sentinel_surface_is_not_created() {
        let cache = Cache::new();
        let mut guard = cache.lock();
        guard.create_surface(SurfaceId::NONE);
        assert_eq!(guard.surface_count(), 0);
        assert!(guard.find_surface(SurfaceId::NONE).is_none());
    }

    #[test]
    fn surface_roundtrip() {
        let cache = Cache::new();
        let mut guard = cache.lock();
        let sid = SurfaceId::new(7);
        guard.create_surface(sid);
        assert!(guard.find_surface(sid).is_some());
        guard.remove_surface(sid);
        assert!(guard.find_surface(sid).is_none());
    }

    #[test]
    fn region_roundtrip_leaves_table_empty() {
        let cache = Cache::new();
        let mut guard = cache.lock();
        let rid = guard.create_region();
        guard
            .find_region_mut(rid)
            .unwrap()
            .inflate(Area::new(0, 0, 5, 5));
        guard.remove_region(rid);
        assert_eq!(guard.region_count(), 0);
        assert!(guard.find_region(rid).is_none());
    }

    #[test]
    fn generated_region_ids_are_unique_and_nonzero() {
        let cache = Cache::new();
        let mut guard = cache.lock();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..64 {
            let rid = guard.create_region();
            assert!(!rid.is_none());
            assert!(seen.insert(rid));
        }
    }

    proptest! {
        // Every surface created and not removed stays findable, whatever
        // interleaving of creates and removes happens around it.
        #[test]
        fn live_surfaces_stay_findable(ops in proptest::collection::vec((1u64..32, any::<bool>()), 0..64)) {
            let cache = Cache::new();
            let mut guard = cache.lock();
            let mut live = std::collections::HashSet::new();
            for (raw, create) in ops {
                let sid = SurfaceId::new(raw);
                if create {
                    guard.create_surface(sid);
                    live.insert(sid);
                } else {
                    guard.remove_surface(sid);
                    live.remove(&sid);
                }
            }
            for sid in &live {
                prop_assert!(guard.find_surface(*sid).is_some());
            }
            prop_assert_eq!(guard.surface_count(), live.len());
        }

        // Inflating by the same rectangle twice never changes the result.
        #[test]
        fn region_inflation_idempotent(
            rects in proptest::collection::vec((-100i32..100, -100i32..100, 1i32..100, 1i32..100), 1..8)
        ) {
            let cache = Cache::new();
            let mut guard = cache.lock();
            let rid = guard.create_region();
            for (x, y, w, h) in &rects {
                guard.find_region_mut(rid).unwrap().inflate(Area::new(*x, *y, *w, *h));
            }
            let before = *guard.find_region(rid).unwrap();
            for (x, y, w, h) in &rects {
                guard.find_region_mut(rid).unwrap().inflate(Area::new(*x, *y, *w, *h));
            }
            prop_assert_eq!(before, *guard.find_region(rid).unwrap());
        }
    }
}
