//! Hotkey registry: id ↔ spec table, registration lifecycle, dispatch.
//!
//! The registry owns the table and drives the platform's register /
//! unregister primitive. `start` is fail-fast: a failure for any entry
//! rolls back every claim taken in that pass. `stop` and the other bulk
//! releases are best-effort: one failed release never blocks the rest.
//!
//! Single-threaded by contract. The host's message loop is the only
//! caller, and fired notifications arrive through [`HotkeyRegistry::on_hotkey`].

mod error;
mod events;
mod table;

use std::collections::HashSet;

use tokio::sync::mpsc::UnboundedReceiver;

pub use error::RegistryError;
pub use events::HotkeyEvent;
pub use table::{HotkeyEntry, HotkeyTable, MAX_ID, RegistrationState};

use crate::keyspec::{self, KeySpec, Modifiers};
use crate::platform::{FiredNotification, Platform, WindowHandle};
use events::EventBus;

/// What happens to a precondition violation at the call boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Return the error.
    #[default]
    Strict,
    /// Log it and return `Ok(())`.
    Lenient,
}

/// Runtime switches. All of them may change while the registry runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Fire regardless of focus. When `false`, a hotkey pressed while
    /// another window has focus is forwarded to that window instead.
    pub global: bool,
    pub policy: ErrorPolicy,
    /// OR `NO_REPEAT` into every registration.
    pub no_repeat: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            global: true,
            policy: ErrorPolicy::Strict,
            no_repeat: false,
        }
    }
}

pub struct HotkeyRegistry<P: Platform> {
    platform: P,
    window: WindowHandle,
    options: RegistryOptions,
    table: HotkeyTable,
    running: bool,
    subscribed: bool,
    disposed: bool,
    events: EventBus,
}

impl<P: Platform> HotkeyRegistry<P> {
    /// Create a registry owned by `window` and subscribe to its fired
    /// notifications.
    ///
    /// In lenient mode a failed subscription is logged and the registry is
    /// returned unsubscribed; it will then never fire.
    pub fn new(
        platform: P,
        window: WindowHandle,
        options: RegistryOptions,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self {
            platform,
            window,
            options,
            table: HotkeyTable::new(),
            running: false,
            subscribed: false,
            disposed: false,
            events: EventBus::default(),
        };

        let subscribed = registry
            .platform
            .subscribe(window)
            .map_err(RegistryError::from);
        registry.subscribed = subscribed.is_ok();
        registry.settle("subscribe", subscribed)?;

        Ok(registry)
    }

    /// Create a registry seeded with `specs`. Duplicates are dropped and ids
    /// are assigned from 1 in list order.
    pub fn with_specs<S: AsRef<str>>(
        platform: P,
        window: WindowHandle,
        options: RegistryOptions,
        specs: &[S],
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new(platform, window, options)?;
        registry.add_many(specs, None, false)?;
        Ok(registry)
    }

    // -- table edits ------------------------------------------------------

    /// Add a spec under `id`, or under `max(id) + 1` when `id` is `None`.
    ///
    /// While running, the new entry is registered immediately; if that
    /// fails the entry is dropped again and the failure returned.
    pub fn add(&mut self, spec: &str, id: Option<i16>) -> Result<(), RegistryError> {
        let result = self.try_add(spec, id);
        self.settle("add", result)
    }

    /// Add several specs at once.
    ///
    /// Duplicates within `specs` are dropped first (first occurrence wins).
    /// With explicit `ids`, the id list must match `specs` one-to-one and
    /// `specs` must be free of duplicates. With `replace`, every current
    /// entry is released and removed before adding. The input is checked
    /// against the table before anything is added.
    pub fn add_many<S: AsRef<str>>(
        &mut self,
        specs: &[S],
        ids: Option<&[i16]>,
        replace: bool,
    ) -> Result<(), RegistryError> {
        let result = self.try_add_many(specs, ids, replace);
        self.settle("add_many", result)
    }

    /// Remove the entry matching `spec`, releasing its claim first if held.
    pub fn remove(&mut self, spec: &str) -> Result<(), RegistryError> {
        let result = self.try_remove(spec);
        self.settle("remove", result)
    }

    // -- lifecycle --------------------------------------------------------

    /// Register every entry with the platform.
    ///
    /// On the first parse failure, refused claim or primitive error, every
    /// claim taken so far is released, the registry returns to the stopped
    /// state and the failure is returned.
    pub fn start(&mut self) -> Result<(), RegistryError> {
        let result = self.try_start();
        self.settle("start", result)
    }

    /// Release every held claim.
    pub fn stop(&mut self) -> Result<(), RegistryError> {
        let result = self.try_stop();
        self.settle("stop", result)
    }

    /// `stop` (if running) then `start`.
    pub fn restart(&mut self) -> Result<(), RegistryError> {
        let result = self.try_restart();
        self.settle("restart", result)
    }

    /// Stop, unsubscribe and clear the table. Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if self.running {
            self.running = false;
            self.unregister_all(false);
        }
        if self.subscribed {
            self.platform.unsubscribe(self.window);
            self.subscribed = false;
        }
        self.table.clear();
        self.disposed = true;
        tracing::debug!(window = %self.window, "hotkey registry disposed");
    }

    /// Release every held claim, best-effort. With `clear`, also remove
    /// every entry from the table.
    pub fn unregister_all(&mut self, clear: bool) {
        for id in self.table.ids() {
            self.release(id);
            if clear {
                self.table.remove(id);
            }
        }
    }

    // -- dispatch ---------------------------------------------------------

    /// Handle a fired notification from the window collaborator.
    ///
    /// Unknown ids and notifications for other windows are ignored. In
    /// window-scoped mode, when another window has focus, the entry's base
    /// key is forwarded there instead of firing.
    pub fn on_hotkey(&mut self, notification: FiredNotification) {
        if self.disposed || !self.subscribed || notification.window != self.window {
            return;
        }
        let Some(entry) = self.table.get(notification.id) else {
            tracing::trace!(id = notification.id, "hotkey id not in table");
            return;
        };
        let spec = entry.raw_spec().to_string();

        if !self.options.global {
            match self.platform.foreground_window() {
                Ok(Some(focused)) if focused != self.window => {
                    self.forward(focused, &spec);
                    return;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(error = %e, "foreground query failed, firing locally");
                }
            }
        }

        tracing::debug!(id = notification.id, spec = %spec, "hotkey fired");
        self.events.emit(HotkeyEvent::Fired {
            window: notification.window,
            id: notification.id,
            spec,
        });
    }

    /// New receiver for lifecycle events.
    pub fn subscribe(&mut self) -> UnboundedReceiver<HotkeyEvent> {
        self.events.subscribe()
    }

    // -- configuration and views ------------------------------------------

    pub fn set_global(&mut self, global: bool) {
        self.options.global = global;
    }

    pub fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.options.policy = policy;
    }

    /// Takes effect at the next registration of each entry.
    pub fn set_no_repeat(&mut self, no_repeat: bool) {
        self.options.no_repeat = no_repeat;
    }

    pub fn options(&self) -> RegistryOptions {
        self.options
    }

    pub fn window(&self) -> WindowHandle {
        self.window
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn get(&self, id: i16) -> Option<&HotkeyEntry> {
        self.table.get(id)
    }

    pub fn find(&self, spec: &str) -> Option<&HotkeyEntry> {
        self.table.find(spec)
    }

    /// Entries in ascending id order.
    pub fn entries(&self) -> impl Iterator<Item = &HotkeyEntry> {
        self.table.iter()
    }

    // -- internals --------------------------------------------------------

    /// Apply the error policy at the public boundary.
    fn settle(&self, op: &'static str, result: Result<(), RegistryError>) -> Result<(), RegistryError> {
        match result {
            Err(e) if self.options.policy == ErrorPolicy::Lenient => {
                tracing::warn!(op, error = %e, "suppressed hotkey registry error");
                Ok(())
            }
            result => result,
        }
    }

    fn ensure_live(&self) -> Result<(), RegistryError> {
        if self.disposed {
            return Err(RegistryError::Disposed);
        }
        Ok(())
    }

    fn try_add(&mut self, spec: &str, id: Option<i16>) -> Result<(), RegistryError> {
        self.ensure_live()?;

        let raw = keyspec::normalize(spec);
        if self.table.contains_spec(&raw) {
            return Err(RegistryError::DuplicateSpec(raw));
        }
        let id = match id {
            Some(id) => id,
            None => self.table.next_id()?,
        };
        self.table.insert(id, &raw)?;
        tracing::debug!(id, spec = %raw, "hotkey added");

        if self.running {
            if let Err(e) = self.register_entry(id) {
                self.table.remove(id);
                return Err(e);
            }
        }
        Ok(())
    }

    fn try_add_many<S: AsRef<str>>(
        &mut self,
        specs: &[S],
        ids: Option<&[i16]>,
        replace: bool,
    ) -> Result<(), RegistryError> {
        self.ensure_live()?;

        let mut seen = HashSet::new();
        let unique: Vec<String> = specs
            .iter()
            .map(|s| keyspec::normalize(s.as_ref()))
            .filter(|s| seen.insert(keyspec::canonical_spec(s)))
            .collect();

        if let Some(ids) = ids {
            if ids.len() != specs.len() {
                return Err(RegistryError::LengthMismatch {
                    specs: specs.len(),
                    ids: ids.len(),
                });
            }
            if unique.len() != ids.len() {
                return Err(RegistryError::DuplicateSpecsInInput);
            }
            let mut seen_ids = HashSet::new();
            for &id in ids {
                if id < 1 {
                    return Err(RegistryError::InvalidId(id));
                }
                if !seen_ids.insert(id) {
                    return Err(RegistryError::DuplicateId(id));
                }
            }
        }

        if replace {
            self.unregister_all(true);
        }

        if let Some(spec) = unique.iter().find(|s| self.table.contains_spec(s)) {
            return Err(RegistryError::DuplicateSpec(spec.clone()));
        }
        if let Some(&id) = ids
            .unwrap_or_default()
            .iter()
            .find(|&&id| self.table.contains_id(id))
        {
            return Err(RegistryError::DuplicateId(id));
        }

        for (i, spec) in unique.iter().enumerate() {
            self.try_add(spec, ids.map(|ids| ids[i]))?;
        }
        Ok(())
    }

    fn try_remove(&mut self, spec: &str) -> Result<(), RegistryError> {
        self.ensure_live()?;

        let raw = keyspec::normalize(spec);
        let id = self
            .table
            .find(&raw)
            .map(HotkeyEntry::id)
            .ok_or(RegistryError::NotFound(raw))?;

        self.release(id);
        if let Some(entry) = self.table.remove(id) {
            tracing::debug!(id, spec = %entry.raw_spec(), "hotkey removed");
        }
        Ok(())
    }

    fn try_start(&mut self) -> Result<(), RegistryError> {
        self.ensure_live()?;
        if self.running {
            return Err(RegistryError::AlreadyRunning);
        }
        self.running = true;
        tracing::info!(window = %self.window, entries = self.table.len(), "starting hotkeys");

        for id in self.table.ids() {
            if let Err(e) = self.register_entry(id) {
                tracing::warn!(id, error = %e, "hotkey registration failed, rolling back");
                self.unregister_all(false);
                self.running = false;
                return Err(e);
            }
        }
        Ok(())
    }

    fn try_stop(&mut self) -> Result<(), RegistryError> {
        self.ensure_live()?;
        if !self.running {
            return Err(RegistryError::NotRunning);
        }
        self.running = false;
        tracing::info!(window = %self.window, "stopping hotkeys");
        self.unregister_all(false);
        Ok(())
    }

    fn try_restart(&mut self) -> Result<(), RegistryError> {
        if self.running {
            self.try_stop()?;
        }
        self.try_start()
    }

    /// Parse an entry and claim it. Emits `Registered` whenever the
    /// primitive answered.
    fn register_entry(&mut self, id: i16) -> Result<(), RegistryError> {
        let Some(entry) = self.table.get(id) else {
            return Ok(());
        };
        let spec = entry.raw_spec().to_string();

        let parsed = KeySpec::parse(&spec).map_err(|source| RegistryError::ParseFailure {
            spec: spec.clone(),
            source,
        })?;
        let parsed = if self.options.no_repeat {
            parsed.with_modifiers(Modifiers::NO_REPEAT)
        } else {
            parsed
        };

        let success = self
            .platform
            .register(self.window, id, parsed.modifiers(), parsed.key())
            .map_err(|e| RegistryError::OsRegistrationFailure {
                id,
                source: Some(e),
            })?;

        if let Some(entry) = self.table.get_mut(id) {
            entry.set_parsed(parsed);
            if success {
                entry.set_state(RegistrationState::Registered);
            }
        }
        self.events.emit(HotkeyEvent::Registered {
            success,
            spec: spec.clone(),
            id,
        });

        if !success {
            tracing::warn!(id, spec = %spec, "platform refused hotkey");
            return Err(RegistryError::OsRegistrationFailure { id, source: None });
        }
        tracing::debug!(id, spec = %spec, "hotkey registered");
        Ok(())
    }

    /// Release one claim if held. Failures are logged; the entry is marked
    /// unregistered either way.
    fn release(&mut self, id: i16) {
        let Some(entry) = self.table.get_mut(id) else {
            return;
        };
        if !entry.is_registered() {
            return;
        }
        entry.set_state(RegistrationState::Unregistered);
        let spec = entry.raw_spec().to_string();

        match self.platform.unregister(self.window, id) {
            Ok(true) => {
                tracing::debug!(id, spec = %spec, "hotkey unregistered");
                self.events.emit(HotkeyEvent::Unregistered { spec, id });
            }
            Ok(false) => {
                tracing::debug!(id, spec = %spec, "platform held no claim for hotkey");
            }
            Err(e) => {
                tracing::warn!(id, spec = %spec, error = %e, "hotkey unregister failed");
            }
        }
    }

    fn forward(&mut self, target: WindowHandle, spec: &str) {
        let key = match KeySpec::parse(spec) {
            Ok(parsed) if !parsed.key().is_none() => parsed.key(),
            _ => {
                tracing::debug!(spec, "nothing to forward");
                return;
            }
        };
        if let Err(e) = self.platform.post_key(target, key) {
            tracing::debug!(spec, window = %target, error = %e, "key forward failed");
        }
    }
}

impl<P: Platform> Drop for HotkeyRegistry<P> {
    fn drop(&mut self) {
        self.dispose();
    }
}
