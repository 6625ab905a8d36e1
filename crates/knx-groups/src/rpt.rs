//! Recipient/Publisher Table: group address → remote endpoint mapping used
//! for outbound s-mode fan-out.

use serde::{Deserialize, Serialize};

use knx_storage::Storage;
use knx_types::{GroupAddress, IndividualAddress, LoadState};

use crate::dispatch::MulticastScope;
use crate::{GroupsError, Result};

pub const DEFAULT_CAPACITY: usize = 20;

const STORAGE_PREFIX: &str = "RPT_STORE";

/// Where a publisher entry's traffic for its group address should be sent:
/// a unicast individual address plus path, an explicit URL reached as a
/// unicast POST, or a derived multicast group address at the given scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublisherTarget {
    Unicast { ia: IndividualAddress, path: String },
    Url(String),
    Multicast { scope: MulticastScope },
}

/// One Recipient/Publisher Table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherEntry {
    pub id: u16,
    pub ga: GroupAddress,
    pub target: PublisherTarget,
}

impl PublisherEntry {
    fn validate(&self) -> Result<()> {
        match &self.target {
            PublisherTarget::Unicast { path, .. } if path.is_empty() => Err(GroupsError::MissingField),
            PublisherTarget::Url(url) if url.is_empty() => Err(GroupsError::MissingField),
            _ => Ok(()),
        }
    }
}

/// The Recipient/Publisher Table: a bounded set of slots mapping group
/// addresses to remote fan-out targets.
pub struct RecipientPublisherTable {
    slots: Vec<Option<PublisherEntry>>,
}

impl RecipientPublisherTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
        }
    }

    fn slot_for_id(&self, id: u16) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|e| e.id == id))
    }

    pub fn entry(&self, id: u16) -> Option<&PublisherEntry> {
        self.slots.iter().flatten().find(|e| e.id == id)
    }

    /// All publisher entries whose group address matches `ga`.
    pub fn by_group_address(&self, ga: GroupAddress) -> impl Iterator<Item = &PublisherEntry> {
        self.slots.iter().flatten().filter(move |e| e.ga == ga)
    }

    pub fn create_or_update(
        &mut self,
        entry: PublisherEntry,
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
        Ok(())
    }

    pub fn delete(&mut self, id: u16, load_state: LoadState, storage: &dyn Storage) -> Result<()> {
        if !load_state.accepts_table_mutation() {
            return Err(GroupsError::NotLoading);
        }
        let slot_index = self.slot_for_id(id).ok_or(GroupsError::NotFound)?;
        self.persist_slot(slot_index, None, storage)?;
        self.slots[slot_index] = None;
        Ok(())
    }

    fn persist_slot(&self, index: usize, entry: Option<&PublisherEntry>, storage: &dyn Storage) -> Result<()> {
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

    pub fn reload(&mut self, storage: &dyn Storage) -> Result<()> {
        for index in 0..self.slots.len() {
            let key = knx_storage::slot_key(STORAGE_PREFIX, index);
            self.slots[index] = match storage.read(&key)? {
                Some(bytes) => knx_storage::cbor::from_slice::<PublisherEntry>(&bytes).ok(),
                None => None,
            };
        }
        Ok(())
    }
}
