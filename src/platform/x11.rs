//! X11 platform: connection, key grabs, focus queries, event thread.
//!
//! Wraps `x11rb::rust_connection::RustConnection`. Hotkey claims become
//! passive key grabs on the owning window, the foreground window comes from
//! `_NET_ACTIVE_WINDOW`, and forwarded keys are synthetic `SendEvent`
//! key presses. A polling thread feeds raw key events to the host's async
//! loop, which turns them into [`FiredNotification`]s via
//! [`X11Platform::translate`].

use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use std::collections::{HashMap, HashSet};
use std::os::fd::{AsRawFd, BorrowedFd};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{
    self, Atom, EventMask, GrabMode, KeyButMask, KeyPressEvent, Keycode, ModMask, Window,
};
use x11rb::rust_connection::RustConnection;

use super::keysym::keysym_for;
use super::{
    FiredNotification, HotkeyBackend, KeyForwarder, NotificationSource, PlatformError,
    WindowHandle,
};
use crate::keyspec::{Modifiers, VirtualKey};

/// Lock modifier bits to mask during grab registration.
///
/// NumLock = Mod2 (bit 4), CapsLock = Lock (bit 1). Each hotkey is grabbed
/// 4 times with all combinations of these bits so it fires regardless of
/// lock state.
const LOCK_MASK: u16 = 0x0002;
const NUM_LOCK_MASK: u16 = 0x0010;
const LOCK_MASKS: [u16; 4] = [0, LOCK_MASK, NUM_LOCK_MASK, LOCK_MASK | NUM_LOCK_MASK];

const SHIFT_MASK: u16 = 0x0001;
const CONTROL_MASK: u16 = 0x0004;
const MOD1_MASK: u16 = 0x0008;
const MOD4_MASK: u16 = 0x0040;
const HOTKEY_MASK: u16 = SHIFT_MASK | CONTROL_MASK | MOD1_MASK | MOD4_MASK;

/// X11 modifier mask for a modifier set. `NO_REPEAT` has no grab-level
/// equivalent and is dropped.
pub fn x11_modifiers(modifiers: Modifiers) -> u16 {
    let mut mask = 0;
    if modifiers.contains(Modifiers::SHIFT) {
        mask |= SHIFT_MASK;
    }
    if modifiers.contains(Modifiers::CTRL) {
        mask |= CONTROL_MASK;
    }
    if modifiers.contains(Modifiers::ALT) {
        mask |= MOD1_MASK;
    }
    if modifiers.contains(Modifiers::WIN) {
        mask |= MOD4_MASK;
    }
    mask
}

/// A held key grab, kept so it can be released and matched against events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Grab {
    keycode: Keycode,
    modifiers: u16,
}

/// X11 adapter for the hotkey registry.
pub struct X11Platform {
    conn: Arc<RustConnection>,
    root: Window,
    net_active_window: Atom,
    keycodes: HashMap<u32, Keycode>,
    grabs: HashMap<(WindowHandle, i16), Grab>,
    subscribed: HashSet<WindowHandle>,
}

impl X11Platform {
    /// Connect to the X11 display, intern atoms and load the keyboard
    /// mapping.
    pub fn connect() -> Result<Self, PlatformError> {
        let (conn, screen_num) = RustConnection::connect(None)
            .map_err(|e| PlatformError::X11(format!("connect failed: {e}")))?;

        let root = conn.setup().roots[screen_num].root;

        let net_active_window = xproto::intern_atom(&conn, false, b"_NET_ACTIVE_WINDOW")
            .map_err(|e| PlatformError::X11(format!("intern_atom: {e}")))?
            .reply()
            .map_err(|e| PlatformError::X11(format!("intern_atom reply: {e}")))?
            .atom;

        let keycodes = load_keycodes(&conn)?;
        tracing::debug!(keysyms = keycodes.len(), "loaded keyboard mapping");

        Ok(Self {
            conn: Arc::new(conn),
            root,
            net_active_window,
            keycodes,
            grabs: HashMap::new(),
            subscribed: HashSet::new(),
        })
    }

    /// The root window; grabs on it are global.
    pub fn root_window(&self) -> WindowHandle {
        WindowHandle(self.root)
    }

    /// Shared reference to the connection, for [`spawn_event_thread`].
    pub fn conn(&self) -> &Arc<RustConnection> {
        &self.conn
    }

    /// Match a raw key event against the held grabs.
    ///
    /// Lock bits are ignored. Events for windows without a subscription
    /// yield nothing.
    pub fn translate(&self, event: &Event) -> Option<FiredNotification> {
        let Event::KeyPress(press) = event else {
            return None;
        };
        let state = u16::from(press.state) & HOTKEY_MASK;

        self.grabs
            .iter()
            .find(|((window, _), grab)| {
                window.0 == press.event && grab.keycode == press.detail && grab.modifiers == state
            })
            .map(|(&(window, id), _)| FiredNotification { window, id })
            .filter(|n| self.subscribed.contains(&n.window))
    }

    fn keycode_for(&self, key: VirtualKey) -> Result<Keycode, PlatformError> {
        keysym_for(key)
            .and_then(|sym| self.keycodes.get(&sym).copied())
            .ok_or(PlatformError::UnmappedKey(key))
    }

    /// Grab all lock-mask variants. `Ok(false)` if any grab conflicts, in
    /// which case the variants already taken are released again.
    fn grab_key(&self, window: Window, grab: Grab) -> Result<bool, PlatformError> {
        for (taken, &lock_mask) in LOCK_MASKS.iter().enumerate() {
            let mods = ModMask::from(grab.modifiers | lock_mask);

            let cookie = xproto::grab_key(
                &*self.conn,
                true, // owner_events
                window,
                mods,
                grab.keycode,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            )
            .map_err(|e| PlatformError::X11(format!("grab_key send: {e}")))?;

            if let Err(e) = cookie.check() {
                tracing::warn!(
                    keycode = grab.keycode,
                    lock_mask,
                    error = %e,
                    "XGrabKey failed, combination may be held by another application"
                );
                self.ungrab_masks(window, grab, &LOCK_MASKS[..taken]);
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Best-effort ungrab; errors are logged.
    fn ungrab_masks(&self, window: Window, grab: Grab, lock_masks: &[u16]) {
        for &lock_mask in lock_masks {
            let mods = ModMask::from(grab.modifiers | lock_mask);

            if let Err(e) = xproto::ungrab_key(&*self.conn, grab.keycode, window, mods) {
                tracing::debug!(keycode = grab.keycode, error = %e, "XUngrabKey failed");
            }
        }

        if let Err(e) = self.conn.flush() {
            tracing::debug!(error = %e, "flush after ungrab failed");
        }
    }
}

impl HotkeyBackend for X11Platform {
    fn register(
        &mut self,
        window: WindowHandle,
        id: i16,
        modifiers: Modifiers,
        key: VirtualKey,
    ) -> Result<bool, PlatformError> {
        if key.is_none() || self.grabs.contains_key(&(window, id)) {
            return Ok(false);
        }

        let grab = Grab {
            keycode: self.keycode_for(key)?,
            modifiers: x11_modifiers(modifiers),
        };
        // The server accepts a repeat grab from the same client, so a second
        // id on one combination has to be refused here.
        if let Some(holder) = grab_holder(&self.grabs, window, grab) {
            tracing::warn!(id, holder, keycode = grab.keycode, "combination already grabbed");
            return Ok(false);
        }
        if !self.grab_key(window.0, grab)? {
            return Ok(false);
        }

        self.grabs.insert((window, id), grab);
        Ok(true)
    }

    fn unregister(&mut self, window: WindowHandle, id: i16) -> Result<bool, PlatformError> {
        let Some(grab) = self.grabs.remove(&(window, id)) else {
            return Ok(false);
        };
        self.ungrab_masks(window.0, grab, &LOCK_MASKS);
        Ok(true)
    }
}

impl NotificationSource for X11Platform {
    fn subscribe(&mut self, window: WindowHandle) -> Result<(), PlatformError> {
        self.subscribed.insert(window);
        Ok(())
    }

    fn unsubscribe(&mut self, window: WindowHandle) {
        self.subscribed.remove(&window);
    }
}

impl KeyForwarder for X11Platform {
    /// Read `_NET_ACTIVE_WINDOW` on the root window.
    ///
    /// Returns `None` if the property is missing or unset.
    fn foreground_window(&self) -> Result<Option<WindowHandle>, PlatformError> {
        let reply = xproto::get_property(
            &*self.conn,
            false,
            self.root,
            self.net_active_window,
            xproto::AtomEnum::WINDOW,
            0,
            1, // We need one 32-bit value.
        )
        .map_err(|e| PlatformError::X11(format!("get_property _NET_ACTIVE_WINDOW: {e}")))?
        .reply()
        .map_err(|e| PlatformError::X11(format!("get_property reply: {e}")))?;

        if reply.format != 32 || reply.value.len() < 4 {
            return Ok(None);
        }

        let window_id = u32::from_ne_bytes([
            reply.value[0],
            reply.value[1],
            reply.value[2],
            reply.value[3],
        ]);

        Ok((window_id != 0).then_some(WindowHandle(window_id)))
    }

    fn post_key(&mut self, window: WindowHandle, key: VirtualKey) -> Result<(), PlatformError> {
        let keycode = self.keycode_for(key)?;

        for (response_type, mask) in [
            (xproto::KEY_PRESS_EVENT, EventMask::KEY_PRESS),
            (xproto::KEY_RELEASE_EVENT, EventMask::KEY_RELEASE),
        ] {
            let event = KeyPressEvent {
                response_type,
                detail: keycode,
                sequence: 0,
                time: x11rb::CURRENT_TIME,
                root: self.root,
                event: window.0,
                child: x11rb::NONE,
                root_x: 0,
                root_y: 0,
                event_x: 0,
                event_y: 0,
                state: KeyButMask::from(0u16),
                same_screen: true,
            };
            xproto::send_event(&*self.conn, true, window.0, mask, event)
                .map_err(|e| PlatformError::X11(format!("send_event: {e}")))?;
        }

        self.conn
            .flush()
            .map_err(|e| PlatformError::X11(format!("flush after send_event: {e}")))
    }
}

impl Drop for X11Platform {
    fn drop(&mut self) {
        for ((window, _), grab) in std::mem::take(&mut self.grabs) {
            self.ungrab_masks(window.0, grab, &LOCK_MASKS);
        }
    }
}

/// Id already holding `grab` on `window`, if any.
fn grab_holder(
    grabs: &HashMap<(WindowHandle, i16), Grab>,
    window: WindowHandle,
    grab: Grab,
) -> Option<i16> {
    grabs
        .iter()
        .find(|&(&(held_window, _), &held)| held_window == window && held == grab)
        .map(|(&(_, id), _)| id)
}

/// Build a keysym → keycode map from the server's keyboard mapping. The
/// lowest keycode producing a keysym wins.
fn load_keycodes(conn: &RustConnection) -> Result<HashMap<u32, Keycode>, PlatformError> {
    let setup = conn.setup();
    let min = setup.min_keycode;
    let count = setup.max_keycode - min + 1;

    let reply = xproto::get_keyboard_mapping(conn, min, count)
        .map_err(|e| PlatformError::X11(format!("get_keyboard_mapping: {e}")))?
        .reply()
        .map_err(|e| PlatformError::X11(format!("get_keyboard_mapping reply: {e}")))?;

    let per_keycode = usize::from(reply.keysyms_per_keycode);
    let mut keycodes = HashMap::new();
    if per_keycode == 0 {
        return Ok(keycodes);
    }

    for (offset, syms) in reply.keysyms.chunks(per_keycode).enumerate() {
        let Ok(offset) = u8::try_from(offset) else {
            break;
        };
        for &sym in syms.iter().filter(|&&sym| sym != 0) {
            keycodes.entry(sym).or_insert(min + offset);
        }
    }

    Ok(keycodes)
}

/// Spawn a dedicated thread that polls the X11 connection for key presses.
///
/// Uses `nix::poll()` on the connection fd with a 100ms timeout. When
/// readable, drains all available events via `poll_for_event()` and
/// forwards the `KeyPress` ones. Checks the `stop` flag each iteration for
/// clean shutdown.
pub fn spawn_event_thread(
    conn: Arc<RustConnection>,
    stop: Arc<AtomicBool>,
) -> Result<(tokio::sync::mpsc::UnboundedReceiver<Event>, JoinHandle<()>), PlatformError> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    let handle = std::thread::Builder::new()
        .name("hotkey-x11-events".into())
        .spawn(move || {
            let raw_fd = conn.stream().as_raw_fd();

            while !stop.load(Ordering::Relaxed) {
                // SAFETY: raw_fd is the X11 connection fd, valid while conn is alive.
                let borrowed = unsafe { BorrowedFd::borrow_raw(raw_fd) };
                let mut fds = [PollFd::new(borrowed, PollFlags::POLLIN)];

                match poll(&mut fds, PollTimeout::from(100u16)) {
                    Ok(0) => continue,
                    Ok(_) => loop {
                        match conn.poll_for_event() {
                            Ok(Some(event @ Event::KeyPress(_))) => {
                                if tx.send(event).is_err() {
                                    return;
                                }
                            }
                            Ok(Some(_)) => {}
                            Ok(None) => break,
                            Err(e) => {
                                tracing::error!(error = %e, "X11 connection error");
                                return;
                            }
                        }
                    },
                    Err(nix::Error::EINTR) => continue,
                    Err(e) => {
                        tracing::error!(error = %e, "poll error on X11 fd");
                        return;
                    }
                }
            }
        })
        .map_err(|e| PlatformError::X11(format!("spawn event thread: {e}")))?;

    Ok((rx, handle))
}
