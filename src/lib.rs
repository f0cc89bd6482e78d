//! Global hotkey registry.
//!
//! `keyspec` turns `{CTRL}{ALT}X`-style strings into modifier flags and a
//! virtual-key code. `registry` keeps the id ↔ spec table and drives a
//! [`platform::Platform`] through register / unregister. `platform` holds
//! the in-memory backend and the X11 one.

pub mod config;
pub mod keyspec;
pub mod platform;
pub mod registry;

pub use keyspec::{KeySpec, Modifiers, ParseError, VirtualKey};
pub use platform::{FiredNotification, Platform, PlatformError, WindowHandle};
pub use registry::{
    ErrorPolicy, HotkeyEntry, HotkeyEvent, HotkeyRegistry, RegistryError, RegistryOptions,
};
