//! Group Object Table: local data-point URI → group-address mapping,
//! gated by load state, persisted as CBOR per entry.

use serde::{Deserialize, Serialize};

use knx_storage::Storage;
use knx_types::{GroupAddress, LoadState};

use crate::cflags::CommFlags;
use crate::{GroupsError, Result};

/// Default bound on the number of Group Object Table entries.
pub const DEFAULT_CAPACITY: usize = 20;

const STORAGE_PREFIX: &str = "GOT_STORE";

/// One Group Object Table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupObjectEntry {
    pub id: u16,
    pub href: String,
    pub ga: Vec<GroupAddress>,
    pub cflags: CommFlags,
}

impl GroupObjectEntry {
    /// An entry is valid iff `href` is non-empty, `ga` is non-empty, and
    /// `cflags` is non-zero.
    fn validate(&self) -> Result<()> {
        if self.href.is_empty() || self.ga.is_empty() || self.cflags.is_empty() {
            return Err(GroupsError::MissingField);
        }
        Ok(())
    }
}

/// The Group Object Table: a bounded set of slots, each either empty or
/// holding one [`GroupObjectEntry`], persisted individually under
/// `GOT_STORE_{index}`.
pub struct GroupObjectTable {
    slots: Vec<Option<GroupObjectEntry>>,
    fingerprint: u64,
}

impl GroupObjectTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            fingerprint: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    fn bump_fingerprint(&mut self) {
        self.fingerprint = self.fingerprint.wrapping_add(1);
    }

    fn slot_for_id(&self, id: u16) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|e| e.id == id))
    }

    pub fn entry(&self, id: u16) -> Option<&GroupObjectEntry> {
        self.slots
            .iter()
            .flatten()
            .find(|e| e.id == id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &GroupObjectEntry> {
        self.slots.iter().flatten()
    }

    /// `POST /fp/g` with a full entry: create or update. Only
    /// permitted during `LOADING`; every mutation bumps the fingerprint and
    /// persists the slot.
    pub fn create_or_update(
        &mut self,
        entry: GroupObjectEntry,
        load_state: LoadState,
        storage: &dyn Storage,
    ) -> Result<()> {
        if !load_state.accepts_table_mutation() {
            return Err(GroupsError::NotLoading);
        }
        entry.validate()?;

        let slot_index = match self.slot_for_id(entry.id) {
            Some(idx) => idx,
            None => self
                .slots
                .iter()
                .position(Option::is_none)
                .ok_or(GroupsError::TableFull)?,
        };

        self.persist_slot(slot_index, Some(&entry), storage)?;
        self.slots[slot_index] = Some(entry);
        self.bump_fingerprint();
        Ok(())
    }

    /// An id-only `POST /fp/g` deletes the matching entry.
    pub fn delete(&mut self, id: u16, load_state: LoadState, storage: &dyn Storage) -> Result<()> {
        if !load_state.accepts_table_mutation() {
            return Err(GroupsError::NotLoading);
        }
        let slot_index = self.slot_for_id(id).ok_or(GroupsError::NotFound)?;
        self.persist_slot(slot_index, None, storage)?;
        self.slots[slot_index] = None;
        self.bump_fingerprint();
        Ok(())
    }

    fn persist_slot(
        &self,
        index: usize,
        entry: Option<&GroupObjectEntry>,
        storage: &dyn Storage,
    ) -> Result<()> {
        let key = knx_storage::slot_key(STORAGE_PREFIX, index);
        match entry {
            Some(entry) => {
                let bytes = knx_storage::cbor::to_vec(entry).map_err(|e| GroupsError::Storage(e.to_string()))?;
                storage.write(&key, &bytes)?;
            }
            None => storage.erase(&key)?,
        }
        Ok(())
    }

    /// Reload all slots from storage at startup. A slot whose stored bytes
    /// fail to CBOR-decode (partial write from a power loss) is left empty
    /// rather than aborting the whole load.
    pub fn reload(&mut self, storage: &dyn Storage) -> Result<()> {
        for index in 0..self.slots.len() {
            let key = knx_storage::slot_key(STORAGE_PREFIX, index);
            self.slots[index] = match storage.read(&key)? {
                Some(bytes) => knx_storage::cbor::from_slice::<GroupObjectEntry>(&bytes).ok(),
                None => None,
            };
        }
        Ok(())
    }

    /// Entries with `cflags & INIT` set, whose first group address should
    /// receive a start-up s-mode READ.
    pub fn init_entries(&self) -> impl Iterator<Item = &GroupObjectEntry> {
        self.entries().filter(|e| e.cflags.contains(CommFlags::INIT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knx_storage::MemoryStorage;

    fn entry(id: u16, href: &str, ga: Vec<GroupAddress>, cflags: CommFlags) -> GroupObjectEntry {
        GroupObjectEntry {
            id,
            href: href.to_string(),
            ga,
            cflags,
        }
    }

    #[test]
    fn create_outside_loading_is_rejected() {
        let storage = MemoryStorage::default();
        let mut table = GroupObjectTable::new(DEFAULT_CAPACITY);
        let err = table.create_or_update(
            entry(1, "/p/1", vec![1], CommFlags::WRITE),
            LoadState::Loaded,
            &storage,
        );
        assert_eq!(err, Err(GroupsError::NotLoading));
    }

    #[test]
    fn create_requires_non_empty_fields() {
        let storage = MemoryStorage::default();
        let mut table = GroupObjectTable::new(DEFAULT_CAPACITY);
        let err = table.create_or_update(
            entry(1, "/p/1", vec![], CommFlags::WRITE),
            LoadState::Loading,
            &storage,
        );
        assert_eq!(err, Err(GroupsError::MissingField));
    }

    #[test]
    fn create_then_update_then_delete_roundtrips_and_persists() {
        let storage = MemoryStorage::default();
        let mut table = GroupObjectTable::new(DEFAULT_CAPACITY);
        table
            .create_or_update(entry(1, "/p/1", vec![1], CommFlags::WRITE), LoadState::Loading, &storage)
            .expect("create");
        assert_eq!(table.fingerprint(), 1);
        assert_eq!(table.entry(1).expect("present").ga, vec![1]);

        table
            .create_or_update(entry(1, "/p/1", vec![1, 2], CommFlags::WRITE), LoadState::Loading, &storage)
            .expect("update");
        assert_eq!(table.fingerprint(), 2);
        assert_eq!(table.entry(1).expect("present").ga, vec![1, 2]);

        table.delete(1, LoadState::Loading, &storage).expect("delete");
        assert_eq!(table.fingerprint(), 3);
        assert!(table.entry(1).is_none());
    }

    #[test]
    fn reload_skips_corrupt_slots_rather_than_failing() {
        let storage = MemoryStorage::default();
        let mut table = GroupObjectTable::new(4);
        table
            .create_or_update(entry(1, "/p/1", vec![1], CommFlags::WRITE), LoadState::Loading, &storage)
            .expect("create");

        // Corrupt a different, still-empty slot directly.
        storage.write(&knx_storage::slot_key("GOT_STORE", 1), b"not cbor").expect("write");

        let mut reloaded = GroupObjectTable::new(4);
        reloaded.reload(&storage).expect("reload");
        assert!(reloaded.entry(1).is_some());
        assert_eq!(reloaded.slots[1], None);
    }

    #[test]
    fn table_full_when_all_slots_occupied_by_distinct_ids() {
        let storage = MemoryStorage::default();
        let mut table = GroupObjectTable::new(1);
        table
            .create_or_update(entry(1, "/p/1", vec![1], CommFlags::WRITE), LoadState::Loading, &storage)
            .expect("create");
        let err = table.create_or_update(
            entry(2, "/p/2", vec![1], CommFlags::WRITE),
            LoadState::Loading,
            &storage,
        );
        assert_eq!(err, Err(GroupsError::TableFull));
    }

    #[test]
    fn init_flagged_entries_are_selected_for_startup_read() {
        let storage = MemoryStorage::default();
        let mut table = GroupObjectTable::new(DEFAULT_CAPACITY);
        table
            .create_or_update(
                entry(1, "/p/1", vec![1], CommFlags::WRITE | CommFlags::INIT),
                LoadState::Loading,
                &storage,
            )
            .expect("create");
        table
            .create_or_update(entry(2, "/p/2", vec![2], CommFlags::READ), LoadState::Loading, &storage)
            .expect("create");

        let init_ids: Vec<u16> = table.init_entries().map(|e| e.id).collect();
        assert_eq!(init_ids, vec![1]);
    }
}
