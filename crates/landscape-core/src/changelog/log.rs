// ── Ordered changelog with redo stashes ──

use indexmap::IndexMap;
use tracing::debug;

use super::bundle::detect_bundle;
use super::entry::ChangeLogEntry;
use crate::model::{EntityId, EntryId, RestoreKey};

/// Default number of undo stashes kept for redo.
pub const DEFAULT_MAX_STASHES: usize = 50;

/// The user-visible log of structural edits.
///
/// Live entries are kept in sequence order. Undone entries move into a
/// stash under a [`RestoreKey`] until they are redone or evicted.
#[derive(Debug, Clone)]
pub struct Changelog {
    entries: Vec<ChangeLogEntry>,
    stashes: IndexMap<RestoreKey, Vec<ChangeLogEntry>>,
    next_seq: u64,
    max_stashes: usize,
}

impl Default for Changelog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STASHES)
    }
}

impl Changelog {
    pub fn new(max_stashes: usize) -> Self {
        Self {
            entries: Vec::new(),
            stashes: IndexMap::new(),
            next_seq: 0,
            max_stashes,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn entries(&self) -> &[ChangeLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&ChangeLogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn last(&self) -> Option<&ChangeLogEntry> {
        self.entries.last()
    }

    /// One human-readable line per live entry, in creation order.
    ///
    /// Each call returns a fresh iterator over the current log.
    pub fn descriptions(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.iter().map(ToString::to_string)
    }

    /// The bundle `id` belongs to, or `None` if it is not a CREATE entry.
    pub fn create_bundle(&self, id: EntryId) -> Option<Vec<ChangeLogEntry>> {
        detect_bundle(&self.entries, self.position(id)?)
    }

    pub fn stash(&self, key: RestoreKey) -> Option<&[ChangeLogEntry]> {
        self.stashes.get(&key).map(Vec::as_slice)
    }

    /// Most recent stash first.
    pub fn stash_keys(&self) -> impl Iterator<Item = RestoreKey> + '_ {
        self.stashes.keys().rev().copied()
    }

    /// `true` if a live or stashed entry is about `entity_id`.
    pub fn mentions(&self, entity_id: &EntityId) -> bool {
        self.entries
            .iter()
            .chain(self.stashes.values().flatten())
            .any(|e| &e.entity_id == entity_id)
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Append an entry. An id already in the log is ignored and `false`
    /// returned.
    pub(crate) fn append(&mut self, mut entry: ChangeLogEntry) -> bool {
        if self.get(entry.id).is_some() || self.stashed(entry.id) {
            debug!(entry = %entry.id, "entry already recorded");
            return false;
        }
        entry.seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(entry);
        true
    }

    /// The most recent live entry about `entity_id`.
    pub(crate) fn latest_for_mut(&mut self, entity_id: &EntityId) -> Option<&mut ChangeLogEntry> {
        self.entries
            .iter_mut()
            .rev()
            .find(|e| &e.entity_id == entity_id)
    }

    pub(crate) fn drop_entry(&mut self, id: EntryId) -> Option<ChangeLogEntry> {
        let index = self.position(id)?;
        Some(self.entries.remove(index))
    }

    /// Move `ids` out of the live log into the stash under `key`.
    ///
    /// Unknown ids are skipped. Returns the removed entries plus any
    /// stashes evicted to stay within the limit; evicted entries are gone
    /// for good and their entities may be purged.
    pub(crate) fn remove_entries(
        &mut self,
        ids: &[EntryId],
        key: RestoreKey,
    ) -> (Vec<ChangeLogEntry>, Vec<ChangeLogEntry>) {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| ids.contains(&e.id));
        self.entries = kept;
        if removed.is_empty() {
            return (removed, Vec::new());
        }

        self.stashes
            .entry(key)
            .or_default()
            .extend(removed.iter().cloned());

        let mut evicted = Vec::new();
        while self.stashes.len() > self.max_stashes {
            match self.stashes.shift_remove_index(0) {
                Some((old, entries)) => {
                    debug!(key = %old, entries = entries.len(), "evicted redo stash");
                    evicted.extend(entries);
                }
                None => break,
            }
        }
        (removed, evicted)
    }

    /// Put the entries stashed under `key` back at their original
    /// positions. Returns them in creation order, or `None` for an
    /// unknown key.
    pub(crate) fn restore_entries(&mut self, key: RestoreKey) -> Option<Vec<ChangeLogEntry>> {
        let mut restored = self.stashes.shift_remove(&key)?;
        restored.sort_by_key(|e| e.seq);
        for entry in &restored {
            if self.get(entry.id).is_some() {
                continue;
            }
            let at = self.entries.partition_point(|e| e.seq < entry.seq);
            self.entries.insert(at, entry.clone());
        }
        Some(restored)
    }

    /// Forget everything: live entries and stashes. Returns every
    /// discarded entry.
    pub(crate) fn clear(&mut self) -> Vec<ChangeLogEntry> {
        let mut all = std::mem::take(&mut self.entries);
        all.extend(std::mem::take(&mut self.stashes).into_values().flatten());
        all
    }

    fn stashed(&self, id: EntryId) -> bool {
        self.stashes.values().flatten().any(|e| e.id == id)
    }
}
