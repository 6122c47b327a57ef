//! The explicit context value threaded through facade, gateway and
//! handlers.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use wayland_server::DisplayHandle;

use crate::cache::Cache;
use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::facade::Facade;
use crate::gateway::Gateway;
use crate::keyboard::{KeymapError, KeymapFile};
use crate::state::WaylandState;
use crate::utils::{Serial, SerialCounter};

#[derive(Debug)]
struct ContextInner {
    cache: Cache,
    state: Mutex<WaylandState>,
    serials: SerialCounter,
    coordinator: Arc<dyn Coordinator>,
    keymap: KeymapFile,
    config: Config,
    display: OnceLock<DisplayHandle>,
}

/// Shared handle to everything the frontend components need: the cache, the
/// wayland state, the serial counter, the coordinator and the display.
///
/// Cloning is cheap; one context is shared by the protocol thread and every
/// coordinator thread for the lifetime of the frontend.
#[derive(Debug, Clone)]
pub(crate) struct Context {
    inner: Arc<ContextInner>,
}

impl Context {
    pub fn new(coordinator: Arc<dyn Coordinator>, config: Config) -> Result<Self, KeymapError> {
        let state = WaylandState::new(&config.xkb)?;
        let keymap = KeymapFile::new(&state.keyboard.keymap_string()).map_err(|_| KeymapError)?;
        Ok(Context {
            inner: Arc::new(ContextInner {
                cache: Cache::new(),
                state: Mutex::new(state),
                serials: SerialCounter::new(),
                coordinator,
                keymap,
                config,
                display: OnceLock::new(),
            }),
        })
    }

    pub fn cache(&self) -> &Cache {
        &self.inner.cache
    }

    /// Locks the wayland state. Never acquire the cache lock first.
    pub fn state(&self) -> MutexGuard<'_, WaylandState> {
        self.inner.state.lock().expect("state mutex poisoned")
    }

    pub fn next_serial(&self) -> Serial {
        self.inner.serials.next_serial()
    }

    pub fn coordinator(&self) -> &dyn Coordinator {
        &*self.inner.coordinator
    }

    pub fn keymap(&self) -> &KeymapFile {
        &self.inner.keymap
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn set_display_handle(&self, handle: DisplayHandle) {
        let _ = self.inner.display.set(handle);
    }

    pub fn display_handle(&self) -> Option<&DisplayHandle> {
        self.inner.display.get()
    }

    pub fn facade(&self) -> Facade<'_> {
        Facade::new(self)
    }

    pub fn gateway(&self) -> Gateway<'_> {
        Gateway::new(self)
    }
}
