//! In-process emulation of the per-process hotkey table.
//!
//! Clones share one table, the way every registry in a process shares the
//! platform's. Failure hooks let callers force rejected claims, primitive
//! errors and unregister failures.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use super::{HotkeyBackend, KeyForwarder, NotificationSource, PlatformError, WindowHandle};
use crate::keyspec::{Modifiers, VirtualKey};

/// A live claim in the emulated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    pub modifiers: Modifiers,
    pub key: VirtualKey,
}

#[derive(Debug, Default)]
struct State {
    claims: BTreeMap<(WindowHandle, i16), Claim>,
    subscribed: BTreeSet<WindowHandle>,
    foreground: Option<WindowHandle>,
    posted: Vec<(WindowHandle, VirtualKey)>,
    reject_keys: BTreeSet<VirtualKey>,
    fail_keys: BTreeSet<VirtualKey>,
    fail_unregister: BTreeSet<i16>,
    register_calls: usize,
    unregister_calls: usize,
}

/// Shared, single-threaded hotkey table.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlatform {
    state: Rc<RefCell<State>>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse claims for `key` with `Ok(false)`.
    pub fn reject_register(&self, key: VirtualKey) {
        self.state.borrow_mut().reject_keys.insert(key);
    }

    /// Fail claims for `key` with a primitive error.
    pub fn fail_register(&self, key: VirtualKey) {
        self.state.borrow_mut().fail_keys.insert(key);
    }

    /// Fail releases of `id` with a primitive error.
    pub fn fail_unregister(&self, id: i16) {
        self.state.borrow_mut().fail_unregister.insert(id);
    }

    /// Clear all injected failures.
    pub fn heal(&self) {
        let mut state = self.state.borrow_mut();
        state.reject_keys.clear();
        state.fail_keys.clear();
        state.fail_unregister.clear();
    }

    pub fn set_foreground(&self, window: Option<WindowHandle>) {
        self.state.borrow_mut().foreground = window;
    }

    pub fn claim(&self, window: WindowHandle, id: i16) -> Option<Claim> {
        self.state.borrow().claims.get(&(window, id)).copied()
    }

    pub fn claim_count(&self) -> usize {
        self.state.borrow().claims.len()
    }

    pub fn is_subscribed(&self, window: WindowHandle) -> bool {
        self.state.borrow().subscribed.contains(&window)
    }

    /// Keys forwarded so far, oldest first.
    pub fn posted(&self) -> Vec<(WindowHandle, VirtualKey)> {
        self.state.borrow().posted.clone()
    }

    pub fn register_calls(&self) -> usize {
        self.state.borrow().register_calls
    }

    pub fn unregister_calls(&self) -> usize {
        self.state.borrow().unregister_calls
    }
}

impl HotkeyBackend for MemoryPlatform {
    fn register(
        &mut self,
        window: WindowHandle,
        id: i16,
        modifiers: Modifiers,
        key: VirtualKey,
    ) -> Result<bool, PlatformError> {
        let mut state = self.state.borrow_mut();
        state.register_calls += 1;

        if state.fail_keys.contains(&key) {
            return Err(PlatformError::Simulated(format!("register {key} failed")));
        }
        if key.is_none() || state.reject_keys.contains(&key) {
            return Ok(false);
        }
        if state.claims.contains_key(&(window, id)) {
            return Ok(false);
        }

        let combo = modifiers - Modifiers::NO_REPEAT;
        let taken = state
            .claims
            .values()
            .any(|c| c.key == key && c.modifiers - Modifiers::NO_REPEAT == combo);
        if taken {
            return Ok(false);
        }

        state.claims.insert((window, id), Claim { modifiers, key });
        Ok(true)
    }

    fn unregister(&mut self, window: WindowHandle, id: i16) -> Result<bool, PlatformError> {
        let mut state = self.state.borrow_mut();
        state.unregister_calls += 1;

        if state.fail_unregister.contains(&id) {
            return Err(PlatformError::Simulated(format!("unregister {id} failed")));
        }
        Ok(state.claims.remove(&(window, id)).is_some())
    }
}

impl NotificationSource for MemoryPlatform {
    fn subscribe(&mut self, window: WindowHandle) -> Result<(), PlatformError> {
        self.state.borrow_mut().subscribed.insert(window);
        Ok(())
    }

    fn unsubscribe(&mut self, window: WindowHandle) {
        self.state.borrow_mut().subscribed.remove(&window);
    }
}

impl KeyForwarder for MemoryPlatform {
    fn foreground_window(&self) -> Result<Option<WindowHandle>, PlatformError> {
        Ok(self.state.borrow().foreground)
    }

    fn post_key(&mut self, window: WindowHandle, key: VirtualKey) -> Result<(), PlatformError> {
        self.state.borrow_mut().posted.push((window, key));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: WindowHandle = WindowHandle(1);

    #[test]
    fn claim_and_release() {
        let mut p = MemoryPlatform::new();
        assert!(p.register(W, 1, Modifiers::CTRL, VirtualKey::A).unwrap());
        assert_eq!(
            p.claim(W, 1),
            Some(Claim {
                modifiers: Modifiers::CTRL,
                key: VirtualKey::A
            })
        );
        assert!(p.unregister(W, 1).unwrap());
        assert!(!p.unregister(W, 1).unwrap());
        assert_eq!(p.claim_count(), 0);
    }

    #[test]
    fn id_is_claimed_once_per_window() {
        let mut p = MemoryPlatform::new();
        assert!(p.register(W, 1, Modifiers::empty(), VirtualKey::F1).unwrap());
        assert!(!p.register(W, 1, Modifiers::empty(), VirtualKey::A).unwrap());
        assert!(p.register(WindowHandle(2), 1, Modifiers::empty(), VirtualKey::A).unwrap());
    }

    #[test]
    fn combination_is_claimed_once_per_process() {
        let mut a = MemoryPlatform::new();
        let mut b = a.clone();
        assert!(a.register(W, 1, Modifiers::ALT, VirtualKey::A).unwrap());
        assert!(!b.register(WindowHandle(2), 9, Modifiers::ALT, VirtualKey::A).unwrap());
        assert!(
            !b.register(
                WindowHandle(2),
                9,
                Modifiers::ALT | Modifiers::NO_REPEAT,
                VirtualKey::A
            )
            .unwrap()
        );
    }

    #[test]
    fn modifier_only_claims_are_rejected() {
        let mut p = MemoryPlatform::new();
        assert!(!p.register(W, 1, Modifiers::CTRL, VirtualKey::NONE).unwrap());
    }

    #[test]
    fn injected_failures() {
        let mut p = MemoryPlatform::new();
        p.reject_register(VirtualKey::F2);
        p.fail_register(VirtualKey::F3);
        p.fail_unregister(1);

        assert!(!p.register(W, 2, Modifiers::empty(), VirtualKey::F2).unwrap());
        assert!(p.register(W, 3, Modifiers::empty(), VirtualKey::F3).is_err());
        assert!(p.register(W, 1, Modifiers::empty(), VirtualKey::F1).unwrap());
        assert!(p.unregister(W, 1).is_err());

        p.heal();
        assert!(p.unregister(W, 1).unwrap());
        assert_eq!(p.register_calls(), 3);
        assert_eq!(p.unregister_calls(), 2);
    }
}
