use log::{trace, warn};

use crate::runtime::{leak_detector, value::Value};

/// Key of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RegistryKey {
    /// Refers to nothing; releasing it is a no-op.
    #[default]
    NoRef,
    /// Reference to `nil`; owns no slot.
    RefNil,
    Slot(u32),
}

impl RegistryKey {
    pub fn owns_slot(self) -> bool {
        matches!(self, RegistryKey::Slot(_))
    }
}

/// Persistent reference table with slot reuse.
///
/// Freed slots are reused through the free list before growing storage.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<Option<Value>>,
    free_list: Vec<u32>,
    live: usize,
    total_refs: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`; `nil` yields [`RegistryKey::RefNil`] and allocates nothing.
    pub fn reference(&mut self, value: Value) -> RegistryKey {
        if value.is_nil() {
            return RegistryKey::RefNil;
        }

        leak_detector::record_ref();
        self.live += 1;
        self.total_refs += 1;

        let key = if let Some(slot) = self.free_list.pop() {
            self.entries[slot as usize] = Some(value);
            slot
        } else {
            let slot = self.entries.len() as u32;
            self.entries.push(Some(value));
            slot
        };
        trace!("registry: ref slot {} ({} live)", key, self.live);
        RegistryKey::Slot(key)
    }

    /// Value behind `key`; `nil` for non-owning keys.
    pub fn get(&self, key: RegistryKey) -> Value {
        match key {
            RegistryKey::Slot(slot) => self
                .entries
                .get(slot as usize)
                .and_then(|entry| entry.clone())
                .unwrap_or_default(),
            RegistryKey::NoRef | RegistryKey::RefNil => Value::Nil,
        }
    }

    /// Frees the slot behind `key`. Returns `false` if nothing was freed.
    ///
    /// Releasing a slot twice is a host bug; it trips a debug assertion and
    /// is otherwise ignored.
    pub fn release(&mut self, key: RegistryKey) -> bool {
        let RegistryKey::Slot(slot) = key else {
            return false;
        };

        match self.entries.get_mut(slot as usize) {
            Some(entry) if entry.is_some() => {
                *entry = None;
                self.free_list.push(slot);
                self.live -= 1;
                leak_detector::record_unref();
                trace!("registry: unref slot {} ({} live)", slot, self.live);
                true
            }
            _ => {
                debug_assert!(false, "registry slot {} released twice", slot);
                warn!("registry: slot {} released twice", slot);
                false
            }
        }
    }

    /// Number of slots currently owned by some reference.
    pub fn outstanding(&self) -> usize {
        self.live
    }

    pub fn total_refs(&self) -> usize {
        self.total_refs
    }

    /// Values currently referenced, for root scanning.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().flatten()
    }
}
