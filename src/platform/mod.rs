//! Platform seams: hotkey claims, fired notifications, key forwarding.
//!
//! The registry never talks to the windowing system directly. It drives
//! these traits, which an adapter implements for a concrete platform:
//! [`x11::X11Platform`] for X11 desktops, [`memory::MemoryPlatform`] as an
//! in-process emulation of the per-process hotkey table.

pub mod keysym;
pub mod memory;
pub mod x11;

use std::fmt;

use crate::keyspec::{Modifiers, VirtualKey};

/// Platform message code for a fired hotkey.
pub const WM_HOTKEY: u32 = 0x0312;

/// Opaque handle of the window that owns hotkey claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowHandle(pub u32);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Platform adapter error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("X11 error: {0}")]
    X11(String),
    /// The key has no physical counterpart on this platform.
    #[error("virtual key {0} has no mapping on this platform")]
    UnmappedKey(VirtualKey),
    /// Injected by [`memory::MemoryPlatform`].
    #[error("simulated platform failure: {0}")]
    Simulated(String),
}

/// A hotkey-fired signal delivered by the window collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredNotification {
    pub window: WindowHandle,
    pub id: i16,
}

impl FiredNotification {
    /// Decode a raw window message. Only [`WM_HOTKEY`] yields a
    /// notification; the id is the low 16 bits of the payload.
    pub fn from_message(window: WindowHandle, msg: u32, wparam: usize) -> Option<Self> {
        (msg == WM_HOTKEY).then(|| Self {
            window,
            id: (wparam & 0xFFFF) as u16 as i16,
        })
    }
}

/// The register/unregister primitive pair.
///
/// Claims live in a process-wide table keyed by `(window, id)`, shared by
/// every registry in the process.
pub trait HotkeyBackend {
    /// Claim `id` on `window` for the given combination.
    ///
    /// `Ok(false)` means the platform refused the claim (id already used,
    /// combination held elsewhere); `Err` means the call itself failed.
    fn register(
        &mut self,
        window: WindowHandle,
        id: i16,
        modifiers: Modifiers,
        key: VirtualKey,
    ) -> Result<bool, PlatformError>;

    /// Release a claim. `Ok(false)` if nothing was claimed under `(window, id)`.
    fn unregister(&mut self, window: WindowHandle, id: i16) -> Result<bool, PlatformError>;
}

/// Subscription to fired notifications for one window.
///
/// Delivery itself is pushed by the host's message loop into
/// [`HotkeyRegistry::on_hotkey`](crate::registry::HotkeyRegistry::on_hotkey).
pub trait NotificationSource {
    fn subscribe(&mut self, window: WindowHandle) -> Result<(), PlatformError>;
    fn unsubscribe(&mut self, window: WindowHandle);
}

/// Foreground detection and synthetic key injection, used when hotkeys are
/// window-scoped.
pub trait KeyForwarder {
    /// The window that currently has input focus, if known.
    fn foreground_window(&self) -> Result<Option<WindowHandle>, PlatformError>;

    /// Send a key-down/key-up pair for `key` to `window`. No modifiers.
    fn post_key(&mut self, window: WindowHandle, key: VirtualKey) -> Result<(), PlatformError>;
}

/// Everything a registry needs from its platform.
pub trait Platform: HotkeyBackend + NotificationSource + KeyForwarder {}

impl<T: HotkeyBackend + NotificationSource + KeyForwarder> Platform for T {}
