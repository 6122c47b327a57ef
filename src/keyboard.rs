//! Keyboard state tracking and keymap handoff.
//!
//! The frontend keeps one xkb context/keymap/state triple. Every key event
//! reported by the coordinator updates it before the gateway reads the
//! modifier quadruple, and every new `wl_keyboard` resource receives the
//! serialized keymap as an fd so all clients share the compositor's layout.

use std::ffi::CString;
use std::fmt;
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::os::unix::io::{AsFd, BorrowedFd};
use std::path::PathBuf;

use rustix::fs::{MemfdFlags, SealFlags};
use tracing::warn;
use xkbcommon::xkb;

use crate::coordinator::KeyState;

/// Names passed to xkb to compile the keymap.
#[derive(Debug, Clone)]
pub struct XkbConfig {
    /// Ruleset, e.g. `evdev`.
    pub rules: String,
    /// Keyboard model, e.g. `evdev`.
    pub model: String,
    /// Layout, e.g. `us`.
    pub layout: String,
    /// Layout variant.
    pub variant: String,
    /// Extra compile options.
    pub options: Option<String>,
}

impl Default for XkbConfig {
    fn default() -> Self {
        XkbConfig {
            rules: "evdev".into(),
            model: "evdev".into(),
            layout: "us".into(),
            variant: String::new(),
            options: None,
        }
    }
}

/// The modifier quadruple reported to clients with `wl_keyboard.modifiers`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyMods {
    /// Currently held modifiers.
    pub depressed: u32,
    /// Latched modifiers.
    pub latched: u32,
    /// Locked modifiers.
    pub locked: u32,
    /// Effective layout group.
    pub effective: u32,
}

/// Failure to compile the configured keymap.
#[derive(Debug, thiserror::Error)]
#[error("xkb rejected the keymap configuration")]
pub struct KeymapError;

/// The xkb context/keymap/state triple.
///
/// libxkbcommon is not thread safe; the triple is confined behind the
/// frontend's state mutex so Rust's mutability rules keep it sound.
pub struct KeyboardState {
    _context: xkb::Context,
    keymap: xkb::Keymap,
    state: xkb::State,
}

// All xkb access happens under the state mutex.
unsafe impl Send for KeyboardState {}

impl fmt::Debug for KeyboardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyboardState")
            .field("keymap", &self.keymap.get_raw_ptr())
            .field("state", &self.state.get_raw_ptr())
            .finish()
    }
}

impl KeyboardState {
    /// Compiles a keymap from the given names and creates a fresh state.
    pub fn new(config: &XkbConfig) -> Result<Self, KeymapError> {
        let context = xkb::Context::new(xkb::CONTEXT_NO_FLAGS);
        let keymap = xkb::Keymap::new_from_names(
            &context,
            &config.rules,
            &config.model,
            &config.layout,
            &config.variant,
            config.options.clone(),
            xkb::KEYMAP_COMPILE_NO_FLAGS,
        )
        .ok_or(KeymapError)?;
        let state = xkb::State::new(&keymap);
        Ok(KeyboardState {
            _context: context,
            keymap,
            state,
        })
    }

    /// Feeds one key event into the state.
    ///
    /// The keycode is offset by 8, as the evdev XKB rules reflect X's
    /// broken keycode system, which starts at 8.
    pub fn update_key(&mut self, keycode: u32, state: KeyState) {
        let direction = match state {
            KeyState::Pressed => xkb::KeyDirection::Down,
            KeyState::Released => xkb::KeyDirection::Up,
        };
        self.state.update_key((keycode + 8).into(), direction);
    }

    /// Reads the current modifier quadruple.
    pub fn modifiers(&self) -> KeyMods {
        KeyMods {
            depressed: self.state.serialize_mods(xkb::STATE_MODS_DEPRESSED),
            latched: self.state.serialize_mods(xkb::STATE_MODS_LATCHED),
            locked: self.state.serialize_mods(xkb::STATE_MODS_LOCKED),
            effective: self.state.serialize_layout(xkb::STATE_LAYOUT_EFFECTIVE),
        }
    }

    /// Serializes the keymap in the text format clients expect.
    pub fn keymap_string(&self) -> String {
        self.keymap.get_as_string(xkb::KEYMAP_FORMAT_TEXT_V1)
    }
}

/// A sealed in-memory file holding the serialized keymap.
///
/// New keyboard resources are sent this fd with `wl_keyboard.keymap`. The
/// seals keep clients from resizing the mapping under us; when sealing is
/// unavailable a plain unlinked temp file under `XDG_RUNTIME_DIR` is used.
#[derive(Debug)]
pub struct KeymapFile {
    file: File,
    size: usize,
}

impl KeymapFile {
    /// Writes `keymap` (with a trailing NUL) into a new sealed memfd.
    pub fn new(keymap: &str) -> std::io::Result<Self> {
        let keymap = CString::new(keymap).map_err(|_| std::io::ErrorKind::InvalidData)?;
        let bytes = keymap.as_bytes_with_nul();

        let mut file = match Self::sealed(bytes) {
            Ok(file) => file,
            Err(err) => {
                warn!("Sealed keymap file unavailable, falling back to tempfile: {err}");
                let dir = std::env::var_os("XDG_RUNTIME_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(std::env::temp_dir);
                let mut file = tempfile::tempfile_in(dir)?;
                file.write_all(bytes)?;
                file
            }
        };
        file.flush()?;
        file.seek(SeekFrom::Start(0))?;

        Ok(KeymapFile {
            file,
            size: bytes.len(),
        })
    }

    fn sealed(bytes: &[u8]) -> std::io::Result<File> {
        let fd = rustix::fs::memfd_create(
            "wayfront-keymap",
            MemfdFlags::CLOEXEC | MemfdFlags::ALLOW_SEALING,
        )?;
        let mut file = File::from(fd);
        file.write_all(bytes)?;
        rustix::fs::fcntl_add_seals(
            &file,
            SealFlags::SHRINK | SealFlags::GROW | SealFlags::WRITE | SealFlags::SEAL,
        )?;
        Ok(file)
    }

    /// Borrows the fd to pass on the wire.
    pub fn fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }

    /// Size of the serialized keymap, including the trailing NUL.
    pub fn size(&self) -> u32 {
        self.size as u32
    }
}
