//! The engine: display lifecycle, listening socket, protocol thread,
//! global advertisement and per-output globals.
//!
//! Exactly one protocol thread exists between `start` and `stop`. It alone
//! drives protocol I/O and handler callbacks; coordinator threads reach the
//! wire only through the gateway, whose events are queued and flushed by
//! this loop. The thread blocks SIGINT/SIGTERM so the embedding process can
//! keep signal handling on its main thread.

use std::collections::HashMap;
use std::io;
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;

use calloop::generic::Generic;
use calloop::timer::{TimeoutAction, Timer};
use calloop::{EventLoop, Interest, LoopSignal, Mode, PostAction};
use tracing::{debug, error, info, warn};
use wayland_server::backend::GlobalId;
use wayland_server::protocol::wl_compositor::WlCompositor;
use wayland_server::protocol::wl_data_device_manager::WlDataDeviceManager;
use wayland_server::protocol::wl_output::WlOutput;
use wayland_server::protocol::wl_seat::WlSeat;
use wayland_server::protocol::wl_shell::WlShell;
use wayland_server::protocol::wl_shm::WlShm;
use wayland_server::protocol::wl_subcompositor::WlSubcompositor;
use wayland_server::{Display, ListeningSocket};

use crate::context::Context;
use crate::coordinator::OutputRecord;
use crate::handlers::{ClientState, Dispatcher};
use crate::protocols::screenshooter::screenshooter::Screenshooter;
use crate::protocols::xdg::xdg_shell::XdgShell;

/// Interval of the event-loop watchdog timer.
const WATCHDOG_INTERVAL: Duration = Duration::from_millis(60);

/// Fatal startup failures. Everything after a successful `start` is
/// fire-and-forget.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The display could not be created.
    #[error("could not create the wayland display: {0}")]
    Display(#[from] wayland_server::backend::InitError),
    /// The socket name is taken or the runtime dir is unusable.
    #[error("could not bind the wayland socket: {0}")]
    SocketBind(#[from] wayland_server::BindError),
    /// The protocol thread could not be spawned or came up broken.
    #[error("could not start the protocol thread: {0}")]
    Thread(#[source] io::Error),
    /// The configured keymap did not compile.
    #[error(transparent)]
    Keymap(#[from] crate::keyboard::KeymapError),
}

struct LoopData {
    display: Display<Dispatcher>,
    dispatcher: Dispatcher,
}

/// Owner of the display, the socket and the protocol thread.
pub struct Engine {
    ctx: Context,
    display: Option<Display<Dispatcher>>,
    socket: Option<ListeningSocket>,
    signal: Option<LoopSignal>,
    thread: Option<JoinHandle<()>>,
    outputs: Mutex<HashMap<String, GlobalId>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("running", &self.thread.is_some())
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub(crate) fn new(ctx: Context) -> Self {
        Engine {
            ctx,
            display: None,
            socket: None,
            signal: None,
            thread: None,
            outputs: Mutex::new(HashMap::new()),
        }
    }

    /// Creates the display and binds the listening socket under the
    /// configured name. A taken name is a fatal error reported to the
    /// caller.
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        let display: Display<Dispatcher> = Display::new()?;
        self.ctx.set_display_handle(display.handle());

        let socket_name = self.ctx.config().socket_name.clone();
        let socket = ListeningSocket::bind(socket_name.as_str())?;
        info!(name = %socket_name, "wayland socket bound");

        self.display = Some(display);
        self.socket = Some(socket);
        Ok(())
    }

    /// Registers the protocol globals and spawns the protocol thread.
    pub fn start(&mut self) -> Result<(), EngineError> {
        let display = self
            .display
            .take()
            .expect("engine started before initialize");
        let socket = self.socket.take().expect("engine started before initialize");

        let dh = display.handle();
        dh.create_global::<Dispatcher, WlCompositor, _>(3, ());
        dh.create_global::<Dispatcher, WlSubcompositor, _>(1, ());
        dh.create_global::<Dispatcher, WlShell, _>(1, ());
        dh.create_global::<Dispatcher, XdgShell, _>(1, ());
        dh.create_global::<Dispatcher, WlSeat, _>(5, ());
        dh.create_global::<Dispatcher, WlDataDeviceManager, _>(3, ());
        dh.create_global::<Dispatcher, WlShm, _>(1, ());
        dh.create_global::<Dispatcher, Screenshooter, _>(1, ());
        debug!("protocol globals registered");

        let ctx = self.ctx.clone();
        let (signal_tx, signal_rx) = mpsc::channel();
        let thread = std::thread::Builder::new()
            .name("wayfront".into())
            .spawn(move || run_protocol_thread(ctx, display, socket, signal_tx))
            .map_err(EngineError::Thread)?;

        // The thread reports its loop signal once the loop exists; a closed
        // channel means it died during setup.
        let signal = match signal_rx.recv() {
            Ok(signal) => signal,
            Err(_) => {
                let _ = thread.join();
                return Err(EngineError::Thread(io::Error::new(
                    io::ErrorKind::Other,
                    "protocol thread died during setup",
                )));
            }
        };

        self.signal = Some(signal);
        self.thread = Some(thread);
        info!("protocol thread started");
        Ok(())
    }

    /// Allocates the next event serial.
    pub fn next_serial(&self) -> crate::utils::Serial {
        self.ctx.next_serial()
    }

    /// Stops the event loop and joins the protocol thread.
    pub fn stop(&mut self) {
        if let Some(signal) = self.signal.take() {
            info!("waiting for protocol thread to exit");
            signal.stop();
            signal.wakeup();
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("protocol thread panicked");
            } else {
                info!("protocol thread joined");
            }
        }
    }

    /// Creates a `wl_output` global for the given output record.
    pub fn advertise_output(&self, record: OutputRecord) {
        let Some(dh) = self.ctx.display_handle() else {
            warn!("output advertised before the engine was initialized");
            return;
        };
        let name = record.name.clone();
        debug!(name = %name, "advertising output");
        let global = dh.create_global::<Dispatcher, WlOutput, _>(2, record);
        if let Some(previous) = self.outputs.lock().expect("outputs mutex poisoned").insert(name, global) {
            dh.remove_global::<Dispatcher>(previous);
        }
    }

    /// Removes the `wl_output` global of the given output.
    pub fn destroy_output(&self, name: &str) {
        let Some(dh) = self.ctx.display_handle() else {
            return;
        };
        debug!(name = %name, "destroying output");
        if let Some(global) = self.outputs.lock().expect("outputs mutex poisoned").remove(name) {
            dh.remove_global::<Dispatcher>(global);
        }
    }
}

fn run_protocol_thread(
    ctx: Context,
    display: Display<Dispatcher>,
    socket: ListeningSocket,
    signal_tx: mpsc::Sender<LoopSignal>,
) {
    block_termination_signals();
    info!("protocol thread running");

    let ctx_for_teardown = ctx.clone();
    if let Err(err) = drive_event_loop(ctx, display, socket, signal_tx) {
        error!("protocol loop failed: {err}");
    }

    // Whatever ended the loop, leave no resource behind.
    ctx_for_teardown.cache().lock().finalize();
    info!("protocol thread exiting");
}

fn drive_event_loop(
    ctx: Context,
    display: Display<Dispatcher>,
    socket: ListeningSocket,
    signal_tx: mpsc::Sender<LoopSignal>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut event_loop: EventLoop<'_, LoopData> = EventLoop::try_new()?;
    let handle = event_loop.handle();

    let mut data = LoopData {
        dispatcher: Dispatcher::new(ctx.clone()),
        display,
    };

    // Client I/O: dispatch requests whenever the display fd is readable.
    let display_fd = data.display.backend().poll_fd().try_clone_to_owned()?;
    handle.insert_source(
        Generic::new(display_fd, Interest::READ, Mode::Level),
        |_, _, data: &mut LoopData| {
            data.display.dispatch_clients(&mut data.dispatcher)?;
            let _ = data.display.flush_clients();
            Ok(PostAction::Continue)
        },
    )?;

    // New connections on the listening socket.
    handle.insert_source(
        Generic::new(socket, Interest::READ, Mode::Level),
        |_, socket, data: &mut LoopData| {
            while let Some(stream) = socket.accept()? {
                debug!(client = ?stream, "new client connected");
                if let Err(err) = data
                    .display
                    .handle()
                    .insert_client(stream, std::sync::Arc::new(ClientState))
                {
                    warn!("could not insert client: {err}");
                }
            }
            Ok(PostAction::Continue)
        },
    )?;

    // The watchdog keeps the loop turning when no client activity exists
    // and flushes events queued by coordinator threads.
    if ctx.config().loop_watchdog {
        handle.insert_source(
            Timer::from_duration(WATCHDOG_INTERVAL),
            |_deadline, _, data: &mut LoopData| {
                let _ = data.display.flush_clients();
                TimeoutAction::ToDuration(WATCHDOG_INTERVAL)
            },
        )?;
    }

    signal_tx
        .send(event_loop.get_signal())
        .map_err(|_| "engine went away during startup")?;

    event_loop.run(None, &mut data, |data| {
        let _ = data.display.flush_clients();
    })?;

    Ok(())
}

fn block_termination_signals() {
    // Signal handling belongs to the embedding process's main thread.
    unsafe {
        let mut set = std::mem::MaybeUninit::<libc::sigset_t>::uninit();
        libc::sigemptyset(set.as_mut_ptr());
        libc::sigaddset(set.as_mut_ptr(), libc::SIGINT);
        libc::sigaddset(set.as_mut_ptr(), libc::SIGTERM);
        libc::pthread_sigmask(libc::SIG_BLOCK, set.as_ptr(), std::ptr::null_mut());
    }
}
