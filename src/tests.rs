//! Scenario tests driving the frontend against a headless display.
//!
//! Clients are socketpair halves inserted straight into the display;
//! their resources are created server-side, so every facade/gateway flow
//! runs for real and the emitted events can be decoded from the raw bytes
//! arriving on the client half of the pair.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Read;
use std::os::unix::io::OwnedFd;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use wayland_server::protocol::wl_buffer::WlBuffer;
use wayland_server::protocol::wl_callback::WlCallback;
use wayland_server::protocol::wl_data_device::WlDataDevice;
use wayland_server::protocol::wl_data_source::WlDataSource;
use wayland_server::protocol::wl_keyboard::WlKeyboard;
use wayland_server::protocol::wl_shell_surface::WlShellSurface;
use wayland_server::protocol::wl_shm::Format;
use wayland_server::protocol::wl_surface::WlSurface;
use wayland_server::{Client, Display, Resource};

use crate::cache::SurfaceResource;
use crate::config::Config;
use crate::context::Context;
use crate::coordinator::{
    Coordinator, PixelSource, ShowReason, SurfaceStateFlags,
};
use crate::facade::reorder_satellite_list;
use crate::handlers::data_device::DataSourceData;
use crate::handlers::{ClientState, Dispatcher};
use crate::shm::{buffer_contents, Pool, ShmBufferData};
use crate::transfer::TransferRef;
use crate::utils::{Position, Size, SurfaceId};

// Event opcodes of the interfaces the assertions below decode.
const WL_KEYBOARD_ENTER: u16 = 1;
const WL_KEYBOARD_LEAVE: u16 = 2;
const WL_BUFFER_RELEASE: u16 = 0;
const WL_CALLBACK_DONE: u16 = 0;
const WL_DATA_DEVICE_DATA_OFFER: u16 = 0;
const WL_DATA_DEVICE_SELECTION: u16 = 5;
const WL_DATA_OFFER_OFFER: u16 = 0;
const WL_DATA_OFFER_ACTION: u16 = 2;

#[derive(Debug, PartialEq, Eq, Clone)]
enum Call {
    Create(SurfaceId),
    Destroy(SurfaceId),
    Commit(SurfaceId),
    Show(SurfaceId),
    Attach {
        sid: SurfaceId,
        width: i32,
        height: i32,
        stride: i32,
        shm: bool,
    },
    Detach(SurfaceId),
    SetAsCursor(SurfaceId),
    SetOffset(SurfaceId, Position),
    SetRequestedSize(SurfaceId, Size),
    ResetOffsetAndRequestedSize(SurfaceId),
    SetRelativePosition(SurfaceId, Position),
    Relate(SurfaceId, SurfaceId),
    Unrelate(SurfaceId),
}

#[derive(Debug, Default)]
struct RecordingCoordinator {
    next_sid: AtomicU64,
    calls: Mutex<Vec<Call>>,
    satellites: Mutex<HashMap<SurfaceId, Vec<SurfaceId>>>,
}

impl RecordingCoordinator {
    fn new() -> Arc<Self> {
        Arc::new(RecordingCoordinator {
            next_sid: AtomicU64::new(1),
            ..Default::default()
        })
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn children_of(&self, parent: SurfaceId) -> Vec<SurfaceId> {
        self.satellites
            .lock()
            .unwrap()
            .get(&parent)
            .cloned()
            .unwrap_or_default()
    }
}

impl Coordinator for RecordingCoordinator {
    fn surface_create(&self) -> SurfaceId {
        let sid = SurfaceId::new(self.next_sid.fetch_add(1, Ordering::Relaxed));
        self.record(Call::Create(sid));
        sid
    }

    fn surface_destroy(&self, sid: SurfaceId) {
        self.record(Call::Destroy(sid));
    }

    fn surface_commit(&self, sid: SurfaceId) {
        self.record(Call::Commit(sid));
    }

    fn surface_show(&self, sid: SurfaceId, _reason: ShowReason) {
        self.record(Call::Show(sid));
    }

    fn surface_attach(&self, sid: SurfaceId, source: PixelSource) {
        self.record(Call::Attach {
            sid,
            width: source.width,
            height: source.height,
            stride: source.stride,
            shm: source.view.is_some(),
        });
    }

    fn surface_detach(&self, sid: SurfaceId) {
        self.record(Call::Detach(sid));
    }

    fn surface_set_as_cursor(&self, sid: SurfaceId) {
        self.record(Call::SetAsCursor(sid));
    }

    fn surface_set_offset(&self, sid: SurfaceId, pos: Position) {
        self.record(Call::SetOffset(sid, pos));
    }

    fn surface_set_requested_size(&self, sid: SurfaceId, size: Size) {
        self.record(Call::SetRequestedSize(sid, size));
    }

    fn surface_reset_offset_and_requested_size(&self, sid: SurfaceId) {
        self.record(Call::ResetOffsetAndRequestedSize(sid));
    }

    fn surface_set_relative_position(&self, sid: SurfaceId, pos: Position) {
        self.record(Call::SetRelativePosition(sid, pos));
    }

    fn surface_relate(&self, sid: SurfaceId, parent: SurfaceId) {
        self.record(Call::Relate(sid, parent));
        self.satellites
            .lock()
            .unwrap()
            .entry(parent)
            .or_default()
            .push(sid);
    }

    fn surface_unrelate(&self, sid: SurfaceId) {
        self.record(Call::Unrelate(sid));
    }

    fn surface_reorder(&self, sid: SurfaceId, sibling: SurfaceId, above: bool) {
        let mut satellites = self.satellites.lock().unwrap();
        for children in satellites.values_mut() {
            if reorder_satellite_list(children, sid, sibling, above) {
                return;
            }
        }
    }
}

struct Harness {
    ctx: Context,
    display: RefCell<Display<Dispatcher>>,
    coordinator: Arc<RecordingCoordinator>,
}

impl Harness {
    fn new() -> Self {
        let coordinator = RecordingCoordinator::new();
        let ctx = Context::new(coordinator.clone(), Config::default()).unwrap();
        let display: Display<Dispatcher> = Display::new().unwrap();
        ctx.set_display_handle(display.handle());
        Harness {
            ctx,
            display: RefCell::new(display),
            coordinator,
        }
    }

    fn connect_client(&self) -> (Client, UnixStream) {
        let (server_end, client_end) = UnixStream::pair().unwrap();
        client_end.set_nonblocking(true).unwrap();
        let client = self
            .display
            .borrow_mut()
            .handle()
            .insert_client(server_end, Arc::new(ClientState))
            .unwrap();
        (client, client_end)
    }

    fn surface_for(&self, client: &Client) -> (SurfaceId, WlSurface) {
        let facade = self.ctx.facade();
        let sid = facade.create_surface();
        let surface = client
            .create_resource::<WlSurface, SurfaceId, Dispatcher>(
                &self.display.borrow_mut().handle(),
                3,
                sid,
            )
            .unwrap();
        facade.add_surface(sid, surface.clone());
        (sid, surface)
    }

    fn keyboard_for(&self, client: &Client) -> WlKeyboard {
        let keyboard = client
            .create_resource::<WlKeyboard, (), Dispatcher>(&self.display.borrow_mut().handle(), 5, ())
            .unwrap();
        self.ctx.facade().add_keyboard_resource(keyboard.clone());
        keyboard
    }

    fn data_device_for(&self, client: &Client) -> WlDataDevice {
        let device = client
            .create_resource::<WlDataDevice, (), Dispatcher>(&self.display.borrow_mut().handle(), 3, ())
            .unwrap();
        self.ctx.facade().add_data_device_resource(device.clone());
        device
    }

    fn selection_for(&self, client: &Client, mime_types: &[&str]) -> (WlDataSource, TransferRef) {
        let source = client
            .create_resource::<WlDataSource, DataSourceData, Dispatcher>(
                &self.display.borrow_mut().handle(),
                3,
                DataSourceData::default(),
            )
            .unwrap();
        let transfer = self.ctx.facade().create_transfer(source.clone());
        source
            .data::<DataSourceData>()
            .unwrap()
            .attach_transfer(transfer.clone());
        for mime_type in mime_types {
            self.ctx
                .facade()
                .add_mime_type(&transfer, (*mime_type).into());
        }
        (source, transfer)
    }

    fn shm_buffer(&self, client: &Client, width: i32, height: i32, stride: i32) -> WlBuffer {
        let file = tempfile::tempfile().unwrap();
        file.set_len((stride as u64) * (height as u64)).unwrap();
        let pool = Pool::new(OwnedFd::from(file), (stride * height) as usize).unwrap();
        client
            .create_resource::<WlBuffer, ShmBufferData, Dispatcher>(
                &self.display.borrow_mut().handle(),
                1,
                ShmBufferData::new(pool, 0, width, height, stride, Format::Argb8888),
            )
            .unwrap()
    }

    fn attach(&self, sid: SurfaceId, buffer: &WlBuffer) {
        let (width, height, stride, view) = buffer_contents(buffer).unwrap();
        self.ctx.facade().surface_attach(
            sid,
            Some(buffer.clone()),
            PixelSource {
                width,
                height,
                stride,
                view: Some(view),
            },
        );
    }

    fn frame_callback(&self, client: &Client, sid: SurfaceId) -> WlCallback {
        let callback = client
            .create_resource::<WlCallback, SurfaceId, Dispatcher>(
                &self.display.borrow_mut().handle(),
                1,
                sid,
            )
            .unwrap();
        self.ctx.facade().add_frame_resource(sid, callback.clone());
        callback
    }

    fn shell_surface_for(&self, client: &Client, sid: SurfaceId) -> WlShellSurface {
        let shell_surface = client
            .create_resource::<WlShellSurface, SurfaceId, Dispatcher>(
                &self.display.borrow_mut().handle(),
                1,
                sid,
            )
            .unwrap();
        self.ctx
            .facade()
            .add_shell_surface(sid, SurfaceResource::ShellSurface(shell_surface.clone()));
        shell_surface
    }

    /// Flushes and decodes `(object, opcode)` pairs from a client stream.
    fn messages(&self, stream: &mut UnixStream) -> Vec<(u32, u16)> {
        self.display.borrow_mut().flush_clients().unwrap();

        let mut bytes = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => bytes.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(err) => panic!("reading client stream: {err}"),
            }
        }

        let mut messages = Vec::new();
        let mut cursor = 0;
        while bytes.len() >= cursor + 8 {
            let object = u32::from_ne_bytes(bytes[cursor..cursor + 4].try_into().unwrap());
            let word = u32::from_ne_bytes(bytes[cursor + 4..cursor + 8].try_into().unwrap());
            let opcode = (word & 0xffff) as u16;
            let size = ((word >> 16) as usize).max(8);
            messages.push((object, opcode));
            cursor += size;
        }
        messages
    }
}

fn proto_id<I: Resource>(resource: &I) -> u32 {
    resource.id().protocol_id()
}

fn index_of(messages: &[(u32, u16)], message: (u32, u16)) -> Option<usize> {
    messages.iter().position(|&m| m == message)
}

#[test]
fn single_client_toplevel_attach_commit() {
    let harness = Harness::new();
    let (client, mut stream) = harness.connect_client();

    let (sid, _surface) = harness.surface_for(&client);
    harness.shell_surface_for(&client, sid);

    let buffer = harness.shm_buffer(&client, 100, 50, 400);
    harness.attach(sid, &buffer);
    harness.ctx.facade().commit(sid);

    let calls = harness.coordinator.calls();
    assert_eq!(
        calls,
        vec![
            Call::Create(sid),
            Call::Show(sid),
            Call::Attach {
                sid,
                width: 100,
                height: 50,
                stride: 400,
                shm: true
            },
            Call::Commit(sid),
        ]
    );

    // Nothing has been emitted to the client yet.
    assert!(harness.messages(&mut stream).is_empty());
}

#[test]
fn focus_handoff_carries_selection() {
    let harness = Harness::new();
    let gateway = harness.ctx.gateway();

    let (client_a, mut stream_a) = harness.connect_client();
    let (client_b, mut stream_b) = harness.connect_client();

    let (sid_a, _surface_a) = harness.surface_for(&client_a);
    let (sid_b, _surface_b) = harness.surface_for(&client_b);
    let keyboard_a = harness.keyboard_for(&client_a);
    let keyboard_b = harness.keyboard_for(&client_b);
    harness.data_device_for(&client_a);
    let device_b = harness.data_device_for(&client_b);

    // A owns the focus and the selection.
    gateway.keyboard_focus_update(
        SurfaceId::NONE,
        Size::default(),
        SurfaceStateFlags::empty(),
        sid_a,
        Size::new(200, 100),
        SurfaceStateFlags::empty(),
    );
    let (_source, transfer) = harness.selection_for(&client_a, &["text/plain"]);
    harness.ctx.facade().send_selection(transfer);
    harness.messages(&mut stream_a);
    harness.messages(&mut stream_b);

    // Focus moves to B.
    gateway.keyboard_focus_update(
        sid_a,
        Size::new(200, 100),
        SurfaceStateFlags::empty(),
        sid_b,
        Size::new(300, 200),
        SurfaceStateFlags::empty(),
    );

    let to_a = harness.messages(&mut stream_a);
    assert!(index_of(&to_a, (proto_id(&keyboard_a), WL_KEYBOARD_LEAVE)).is_some());
    assert!(index_of(&to_a, (proto_id(&keyboard_a), WL_KEYBOARD_ENTER)).is_none());

    let to_b = harness.messages(&mut stream_b);
    let enter = index_of(&to_b, (proto_id(&keyboard_b), WL_KEYBOARD_ENTER)).unwrap();
    let data_offer = index_of(&to_b, (proto_id(&device_b), WL_DATA_DEVICE_DATA_OFFER)).unwrap();
    let selection = index_of(&to_b, (proto_id(&device_b), WL_DATA_DEVICE_SELECTION)).unwrap();
    assert!(index_of(&to_b, (proto_id(&keyboard_b), WL_KEYBOARD_LEAVE)).is_none());
    assert!(enter < data_offer);
    assert!(data_offer < selection);

    // The offer object shows up through its own events; opcode 0 on the
    // data device is the data_offer announcement, so skip that object.
    let offer_object = to_b
        .iter()
        .find(|&&(object, opcode)| opcode == WL_DATA_OFFER_OFFER && object != proto_id(&device_b))
        .map(|&(object, _)| object)
        .unwrap();
    let offer = index_of(&to_b, (offer_object, WL_DATA_OFFER_OFFER)).unwrap();
    let action = index_of(&to_b, (offer_object, WL_DATA_OFFER_ACTION)).unwrap();
    assert!(data_offer < offer);
    assert!(offer < action);
    assert!(action < selection);

    assert_eq!(
        harness.ctx.state().keyboard_focused_sid,
        sid_b,
        "focus must land on the new surface"
    );
}

#[test]
fn frame_refresh_releases_then_drains_fifo() {
    let harness = Harness::new();
    let gateway = harness.ctx.gateway();
    let (client, mut stream) = harness.connect_client();

    let (sid, _surface) = harness.surface_for(&client);
    let buffer1 = harness.shm_buffer(&client, 16, 16, 64);
    harness.attach(sid, &buffer1);
    let callback1 = harness.frame_callback(&client, sid);

    gateway.screen_refresh(sid, 1_000);

    let messages = harness.messages(&mut stream);
    let release = index_of(&messages, (proto_id(&buffer1), WL_BUFFER_RELEASE)).unwrap();
    let done = index_of(&messages, (proto_id(&callback1), WL_CALLBACK_DONE)).unwrap();
    assert!(release < done);

    // The callback was consumed; a second refresh emits nothing new.
    gateway.screen_refresh(sid, 2_000);
    assert!(harness.messages(&mut stream).is_empty());

    // Two queued callbacks drain in FIFO order after the buffer release.
    let buffer2 = harness.shm_buffer(&client, 16, 16, 64);
    harness.attach(sid, &buffer2);
    let callback2 = harness.frame_callback(&client, sid);
    let callback3 = harness.frame_callback(&client, sid);

    gateway.screen_refresh(sid, 3_000);

    let messages = harness.messages(&mut stream);
    let release = index_of(&messages, (proto_id(&buffer2), WL_BUFFER_RELEASE)).unwrap();
    let done2 = index_of(&messages, (proto_id(&callback2), WL_CALLBACK_DONE)).unwrap();
    let done3 = index_of(&messages, (proto_id(&callback3), WL_CALLBACK_DONE)).unwrap();
    assert!(release < done2);
    assert!(done2 < done3);
}

#[test]
fn satellite_reorder() {
    let harness = Harness::new();
    let (client, _stream) = harness.connect_client();
    let facade = harness.ctx.facade();

    let (parent, _) = harness.surface_for(&client);
    let (a, _) = harness.surface_for(&client);
    let (b, _) = harness.surface_for(&client);
    let (c, _) = harness.surface_for(&client);
    facade.add_subsurface(a, parent, 0, 0);
    facade.add_subsurface(b, parent, 0, 0);
    facade.add_subsurface(c, parent, 0, 0);
    assert_eq!(harness.coordinator.children_of(parent), vec![a, b, c]);

    facade.reorder_satellites(a, c, true);
    assert_eq!(harness.coordinator.children_of(parent), vec![b, c, a]);

    facade.reorder_satellites(a, b, false);
    assert_eq!(harness.coordinator.children_of(parent), vec![a, b, c]);
}

#[test]
fn late_keyboard_bind_gets_enter() {
    let harness = Harness::new();
    let gateway = harness.ctx.gateway();
    let (client, mut stream) = harness.connect_client();

    let (sid, _surface) = harness.surface_for(&client);
    gateway.keyboard_focus_update(
        SurfaceId::NONE,
        Size::default(),
        SurfaceStateFlags::empty(),
        sid,
        Size::new(100, 100),
        SurfaceStateFlags::empty(),
    );
    harness.messages(&mut stream);

    // The keyboard binds after the focus change and still sees enter.
    let keyboard = harness.keyboard_for(&client);
    let messages = harness.messages(&mut stream);
    assert!(index_of(&messages, (proto_id(&keyboard), WL_KEYBOARD_ENTER)).is_some());
    assert!(index_of(&messages, (proto_id(&keyboard), WL_KEYBOARD_LEAVE)).is_none());
}

#[test]
fn same_client_focus_change_emits_no_enter_leave() {
    let harness = Harness::new();
    let gateway = harness.ctx.gateway();
    let (client, mut stream) = harness.connect_client();

    let (sid_1, _s1) = harness.surface_for(&client);
    let (sid_2, _s2) = harness.surface_for(&client);
    let keyboard = harness.keyboard_for(&client);

    gateway.keyboard_focus_update(
        SurfaceId::NONE,
        Size::default(),
        SurfaceStateFlags::empty(),
        sid_1,
        Size::new(100, 100),
        SurfaceStateFlags::empty(),
    );
    harness.messages(&mut stream);

    gateway.keyboard_focus_update(
        sid_1,
        Size::new(100, 100),
        SurfaceStateFlags::empty(),
        sid_2,
        Size::new(100, 100),
        SurfaceStateFlags::empty(),
    );

    let messages = harness.messages(&mut stream);
    assert!(index_of(&messages, (proto_id(&keyboard), WL_KEYBOARD_ENTER)).is_none());
    assert!(index_of(&messages, (proto_id(&keyboard), WL_KEYBOARD_LEAVE)).is_none());
    assert_eq!(harness.ctx.state().keyboard_focused_sid, sid_2);
}

#[test]
fn reconfiguration_prefers_wl_shell_over_xdg() {
    let harness = Harness::new();
    let gateway = harness.ctx.gateway();
    let (client, mut stream) = harness.connect_client();

    let (sid, _surface) = harness.surface_for(&client);
    let shell_surface = harness.shell_surface_for(&client, sid);
    let xdg_surface = client
        .create_resource::<crate::protocols::xdg::xdg_surface::XdgSurface, SurfaceId, Dispatcher>(
            &harness.display.borrow_mut().handle(),
            1,
            sid,
        )
        .unwrap();
    harness
        .ctx
        .facade()
        .add_shell_surface(sid, SurfaceResource::XdgSurface(xdg_surface.clone()));
    harness.messages(&mut stream);

    gateway.surface_reconfigured(sid, Size::new(640, 480), SurfaceStateFlags::MAXIMIZED);

    // wl_shell_surface.configure is opcode 1; the xdg surface stays silent.
    let messages = harness.messages(&mut stream);
    assert!(index_of(&messages, (proto_id(&shell_surface), 1)).is_some());
    assert!(!messages
        .iter()
        .any(|&(object, _)| object == proto_id(&xdg_surface)));

    // With the wl_shell role gone, the xdg configure (opcode 0) goes out.
    harness
        .ctx
        .cache()
        .lock()
        .remove_surface_resource(
            sid,
            crate::cache::SurfaceResourceKind::ShellSurface,
            &shell_surface.id(),
        );
    gateway.surface_reconfigured(sid, Size::new(640, 480), SurfaceStateFlags::MAXIMIZED);
    let messages = harness.messages(&mut stream);
    assert!(index_of(&messages, (proto_id(&xdg_surface), 0)).is_some());
}

#[test]
fn stale_role_resource_destruction_keeps_successor() {
    let harness = Harness::new();
    let gateway = harness.ctx.gateway();
    let (client, mut stream) = harness.connect_client();

    let (sid, _surface) = harness.surface_for(&client);
    let first = harness.shell_surface_for(&client, sid);
    let second = harness.shell_surface_for(&client, sid);

    // The first role resource was replaced by the second; its (late)
    // removal must not evict the live one.
    harness.ctx.cache().lock().remove_surface_resource(
        sid,
        crate::cache::SurfaceResourceKind::ShellSurface,
        &first.id(),
    );

    gateway.surface_reconfigured(sid, Size::new(320, 200), SurfaceStateFlags::empty());
    let messages = harness.messages(&mut stream);
    assert!(index_of(&messages, (proto_id(&second), 1)).is_some());
}

#[test]
fn key_event_reaches_focused_client_with_modifiers() {
    const WL_KEYBOARD_KEY: u16 = 3;
    const WL_KEYBOARD_MODIFIERS: u16 = 4;
    const KEY_LEFTSHIFT: u32 = 42;
    const KEY_A: u32 = 30;

    let harness = Harness::new();
    let gateway = harness.ctx.gateway();
    let (client, mut stream) = harness.connect_client();
    let (other_client, mut other_stream) = harness.connect_client();

    let (sid, _surface) = harness.surface_for(&client);
    let keyboard = harness.keyboard_for(&client);
    let other_keyboard = harness.keyboard_for(&other_client);

    // No focus yet: the event goes nowhere.
    gateway.key(1, KEY_A, crate::coordinator::KeyState::Pressed);
    gateway.key(2, KEY_A, crate::coordinator::KeyState::Released);
    assert!(harness.messages(&mut stream).is_empty());

    gateway.keyboard_focus_update(
        SurfaceId::NONE,
        Size::default(),
        SurfaceStateFlags::empty(),
        sid,
        Size::new(100, 100),
        SurfaceStateFlags::empty(),
    );
    harness.messages(&mut stream);

    // A plain key press carries no modifiers event.
    gateway.key(3, KEY_A, crate::coordinator::KeyState::Pressed);
    let messages = harness.messages(&mut stream);
    assert!(index_of(&messages, (proto_id(&keyboard), WL_KEYBOARD_KEY)).is_some());
    assert!(index_of(&messages, (proto_id(&keyboard), WL_KEYBOARD_MODIFIERS)).is_none());

    // Shift changes the quadruple, so key is followed by modifiers.
    gateway.key(4, KEY_LEFTSHIFT, crate::coordinator::KeyState::Pressed);
    let messages = harness.messages(&mut stream);
    let key = index_of(&messages, (proto_id(&keyboard), WL_KEYBOARD_KEY)).unwrap();
    let modifiers = index_of(&messages, (proto_id(&keyboard), WL_KEYBOARD_MODIFIERS)).unwrap();
    assert!(key < modifiers);

    // The unfocused client hears nothing.
    assert!(!harness
        .messages(&mut other_stream)
        .iter()
        .any(|&(object, _)| object == proto_id(&other_keyboard)));
}

#[test]
fn axis_order_is_discrete_then_value_per_direction() {
    const WL_POINTER_ENTER: u16 = 0;
    const WL_POINTER_AXIS: u16 = 4;
    const WL_POINTER_FRAME: u16 = 5;
    const WL_POINTER_AXIS_STOP: u16 = 7;
    const WL_POINTER_AXIS_DISCRETE: u16 = 8;

    let harness = Harness::new();
    let gateway = harness.ctx.gateway();
    let (client, mut stream) = harness.connect_client();

    let (sid, _surface) = harness.surface_for(&client);
    let pointer = client
        .create_resource::<wayland_server::protocol::wl_pointer::WlPointer, (), Dispatcher>(
            &harness.display.borrow_mut().handle(),
            5,
            (),
        )
        .unwrap();
    harness.ctx.facade().add_pointer_resource(pointer.clone());

    gateway.pointer_focus_update(sid, Position::new(10, 10));
    let messages = harness.messages(&mut stream);
    assert!(index_of(&messages, (proto_id(&pointer), WL_POINTER_ENTER)).is_some());

    // Vertical scroll only: the idle horizontal direction stops first,
    // then the vertical discrete step precedes the continuous value.
    gateway.pointer_axis(0.0, 15.0, 0, 1);
    let messages = harness.messages(&mut stream);
    let events: Vec<u16> = messages
        .iter()
        .filter(|&&(object, _)| object == proto_id(&pointer))
        .map(|&(_, opcode)| opcode)
        .collect();
    assert_eq!(
        events,
        vec![
            WL_POINTER_AXIS_STOP,
            WL_POINTER_AXIS_DISCRETE,
            WL_POINTER_AXIS,
            WL_POINTER_FRAME,
        ]
    );
}

#[test]
fn shutdown_clears_cache() {
    if std::env::var_os("XDG_RUNTIME_DIR").is_none() {
        std::env::set_var("XDG_RUNTIME_DIR", std::env::temp_dir());
    }

    let coordinator = RecordingCoordinator::new();
    let config = Config {
        socket_name: format!("wayfront-test-{}", std::process::id()),
        ..Config::default()
    };
    let frontend = crate::WaylandFrontend::start(coordinator, config).unwrap();
    let ctx = frontend.ctx.clone();

    // Ten clients with one surface each, inserted from this thread; the
    // display handle is shared with the protocol thread.
    let mut streams = Vec::new();
    for _ in 0..10 {
        let (server_end, client_end) = UnixStream::pair().unwrap();
        let client = ctx
            .display_handle()
            .unwrap()
            .clone()
            .insert_client(server_end, Arc::new(ClientState))
            .unwrap();
        let facade = ctx.facade();
        let sid = facade.create_surface();
        let surface = client
            .create_resource::<WlSurface, SurfaceId, Dispatcher>(
                ctx.display_handle().unwrap(),
                3,
                sid,
            )
            .unwrap();
        facade.add_surface(sid, surface);
        streams.push(client_end);
    }
    assert_eq!(ctx.cache().lock().surface_count(), 10);

    frontend.finalize();

    let cache = ctx.cache().lock();
    assert_eq!(cache.surface_count(), 0);
    assert!(cache.find_surface(SurfaceId::new(1)).is_none());
    assert_eq!(cache.region_count(), 0);
}
