//! The id ↔ spec table.
//!
//! Two maps kept in lockstep: `entries` (id → entry, ordered) and
//! `by_spec` (canonical spec → id). Every mutation goes through this type
//! so both uniqueness invariants hold after each call.

use std::collections::{BTreeMap, HashMap};

use super::RegistryError;
use crate::keyspec::{self, KeySpec};

/// Highest id the platform accepts.
pub const MAX_ID: i16 = i16::MAX;

/// Whether a table entry currently holds a platform claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationState {
    #[default]
    Unregistered,
    Registered,
}

/// One hotkey in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyEntry {
    id: i16,
    raw_spec: String,
    canonical: String,
    parsed: Option<KeySpec>,
    state: RegistrationState,
}

impl HotkeyEntry {
    pub fn id(&self) -> i16 {
        self.id
    }

    /// Spec as added, trimmed and uppercased.
    pub fn raw_spec(&self) -> &str {
        &self.raw_spec
    }

    /// Parse result from the last registration attempt that got that far.
    pub fn parsed(&self) -> Option<KeySpec> {
        self.parsed
    }

    pub fn state(&self) -> RegistrationState {
        self.state
    }

    pub fn is_registered(&self) -> bool {
        self.state == RegistrationState::Registered
    }

    pub(crate) fn set_parsed(&mut self, parsed: KeySpec) {
        self.parsed = Some(parsed);
    }

    pub(crate) fn set_state(&mut self, state: RegistrationState) {
        self.state = state;
    }
}

#[derive(Debug, Default)]
pub struct HotkeyTable {
    entries: BTreeMap<i16, HotkeyEntry>,
    by_spec: HashMap<String, i16>,
}

impl HotkeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an unregistered entry. Fails if either the id or the spec is
    /// already present; nothing changes on failure.
    pub fn insert(&mut self, id: i16, spec: &str) -> Result<&HotkeyEntry, RegistryError> {
        if id < 1 {
            return Err(RegistryError::InvalidId(id));
        }
        let raw_spec = keyspec::normalize(spec);
        let canonical = keyspec::canonical_spec(&raw_spec);
        if self.by_spec.contains_key(&canonical) {
            return Err(RegistryError::DuplicateSpec(raw_spec));
        }
        if self.entries.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }

        self.by_spec.insert(canonical.clone(), id);
        let entry = self.entries.entry(id).or_insert(HotkeyEntry {
            id,
            raw_spec,
            canonical,
            parsed: None,
            state: RegistrationState::Unregistered,
        });
        Ok(entry)
    }

    pub fn remove(&mut self, id: i16) -> Option<HotkeyEntry> {
        let entry = self.entries.remove(&id)?;
        self.by_spec.remove(&entry.canonical);
        Some(entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_spec.clear();
    }

    pub fn get(&self, id: i16) -> Option<&HotkeyEntry> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: i16) -> Option<&mut HotkeyEntry> {
        self.entries.get_mut(&id)
    }

    /// Look up by value, ignoring case and modifier order.
    pub fn find(&self, spec: &str) -> Option<&HotkeyEntry> {
        self.by_spec
            .get(&keyspec::canonical_spec(spec))
            .and_then(|id| self.entries.get(id))
    }

    pub fn contains_spec(&self, spec: &str) -> bool {
        self.by_spec.contains_key(&keyspec::canonical_spec(spec))
    }

    pub fn contains_id(&self, id: i16) -> bool {
        self.entries.contains_key(&id)
    }

    /// `max(ids) + 1`, or 1 for an empty table. Ids of removed entries are
    /// only reused once every higher id is gone.
    pub fn next_id(&self) -> Result<i16, RegistryError> {
        match self.entries.keys().next_back() {
            None => Ok(1),
            Some(&MAX_ID) => Err(RegistryError::IdSpaceExhausted),
            Some(&max) => Ok(max + 1),
        }
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> Vec<i16> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HotkeyEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_invariants(table: &HotkeyTable) {
        let ids: HashSet<i16> = table.iter().map(HotkeyEntry::id).collect();
        let specs: HashSet<String> = table
            .iter()
            .map(|e| keyspec::canonical_spec(e.raw_spec()))
            .collect();
        assert_eq!(ids.len(), table.len());
        assert_eq!(specs.len(), table.len());
        assert_eq!(table.by_spec.len(), table.entries.len());
    }

    #[test]
    fn insert_normalizes() {
        let mut table = HotkeyTable::new();
        let entry = table.insert(1, "  {ctrl}a ").unwrap();
        assert_eq!(entry.raw_spec(), "{CTRL}A");
        assert_eq!(entry.state(), RegistrationState::Unregistered);
        assert!(entry.parsed().is_none());
    }

    #[test]
    fn spec_duplicates_ignore_case_and_modifier_order() {
        let mut table = HotkeyTable::new();
        table.insert(1, "{CTRL}{SHIFT}A").unwrap();
        assert_eq!(
            table.insert(2, "{shift}{ctrl}a"),
            Err(RegistryError::DuplicateSpec("{SHIFT}{CTRL}A".into()))
        );
        assert_eq!(table.len(), 1);
        assert_invariants(&table);
    }

    #[test]
    fn unknown_modifiers_do_not_make_a_new_spec() {
        let mut table = HotkeyTable::new();
        table.insert(1, "{CTRL}A").unwrap();
        assert_eq!(
            table.insert(2, "{FOO}{CTRL}A"),
            Err(RegistryError::DuplicateSpec("{FOO}{CTRL}A".into()))
        );
        assert_eq!(table.find("{ctrl}{foo}a").map(HotkeyEntry::id), Some(1));
    }

    #[test]
    fn id_duplicates_are_rejected() {
        let mut table = HotkeyTable::new();
        table.insert(5, "F1").unwrap();
        assert_eq!(table.insert(5, "F2"), Err(RegistryError::DuplicateId(5)));
        assert!(!table.contains_spec("F2"));
    }

    #[test]
    fn invalid_ids() {
        let mut table = HotkeyTable::new();
        assert_eq!(table.insert(0, "F1"), Err(RegistryError::InvalidId(0)));
        assert_eq!(table.insert(-3, "F1"), Err(RegistryError::InvalidId(-3)));
        assert!(table.is_empty());
    }

    #[test]
    fn next_id_is_max_plus_one() {
        let mut table = HotkeyTable::new();
        assert_eq!(table.next_id(), Ok(1));
        table.insert(1, "F1").unwrap();
        table.insert(2, "F2").unwrap();
        table.insert(3, "F3").unwrap();
        table.remove(2);
        assert_eq!(table.next_id(), Ok(4));
        table.insert(10, "F10").unwrap();
        assert_eq!(table.next_id(), Ok(11));
    }

    #[test]
    fn next_id_exhausted() {
        let mut table = HotkeyTable::new();
        table.insert(MAX_ID, "F1").unwrap();
        assert_eq!(table.next_id(), Err(RegistryError::IdSpaceExhausted));
    }

    #[test]
    fn find_and_remove_keep_maps_in_sync() {
        let mut table = HotkeyTable::new();
        table.insert(1, "{ALT}X").unwrap();
        table.insert(2, "F5").unwrap();

        assert_eq!(table.find("{alt}x").map(HotkeyEntry::id), Some(1));
        let removed = table.remove(1).unwrap();
        assert_eq!(removed.raw_spec(), "{ALT}X");
        assert!(table.find("{ALT}X").is_none());
        assert!(table.remove(1).is_none());

        table.insert(3, "{ALT}X").unwrap();
        assert_invariants(&table);
        assert_eq!(table.ids(), vec![2, 3]);
    }

    #[test]
    fn mixed_sequence_preserves_invariants() {
        let mut table = HotkeyTable::new();
        let specs = ["F1", "f1", "{CTRL}A", "{CONTROL}a", "B", "{SHIFT}{ALT}C"];
        for (i, spec) in specs.iter().enumerate() {
            let _ = table.insert(i as i16 + 1, spec);
            assert_invariants(&table);
        }
        assert_eq!(table.len(), 4);

        table.remove(3);
        let _ = table.insert(7, "{ctrl}A");
        let _ = table.insert(7, "Z");
        assert_invariants(&table);

        table.clear();
        assert!(table.is_empty());
        assert_invariants(&table);
    }
}
