use std::{
    cell::{BorrowError, BorrowMutError, Ref, RefCell, RefMut},
    collections::HashMap,
    fmt,
    rc::Rc,
};

use crate::runtime::{leak_detector, table_key::TableKey, value::Value};

/// Hash table with insertion-ordered traversal and an optional metatable.
///
/// Removing a key leaves a tombstone so `next` keeps working while a
/// traversal assigns `nil` to existing fields. Tombstones are compacted when a
/// new key is inserted and they outnumber the live entries.
#[derive(Default)]
pub struct Table {
    slots: Vec<(TableKey, Value)>,
    index: HashMap<TableKey, usize>,
    tombstones: usize,
    metatable: Option<TableRef>,
}

impl Table {
    pub fn get(&self, key: &TableKey) -> Value {
        match self.index.get(key) {
            Some(&slot) => self.slots[slot].1.clone(),
            None => Value::Nil,
        }
    }

    pub fn get_str(&self, name: &str) -> Value {
        self.get(&TableKey::str(name))
    }

    pub fn contains(&self, key: &TableKey) -> bool {
        !self.get(key).is_nil()
    }

    /// Assigning `nil` removes the key.
    pub fn set(&mut self, key: TableKey, value: Value) {
        if let Some(&slot) = self.index.get(&key) {
            let was_nil = self.slots[slot].1.is_nil();
            match (was_nil, value.is_nil()) {
                (false, true) => self.tombstones += 1,
                (true, false) => self.tombstones -= 1,
                _ => {}
            }
            self.slots[slot].1 = value;
            return;
        }

        if value.is_nil() {
            return;
        }

        if self.tombstones > 8 && self.tombstones * 2 > self.slots.len() {
            self.compact();
        }
        self.index.insert(key.clone(), self.slots.len());
        self.slots.push((key, value));
    }

    pub fn set_str(&mut self, name: &str, value: Value) {
        self.set(TableKey::str(name), value);
    }

    /// Border: number of consecutive non-nil integer keys starting at 1.
    pub fn len(&self) -> i64 {
        let mut n = 0;
        while self.contains(&TableKey::Integer(n + 1)) {
            n += 1;
        }
        n
    }

    pub fn is_empty(&self) -> bool {
        self.slots.len() == self.tombstones
    }

    /// Entry after `key` in traversal order; `None` starts the traversal.
    /// `Err` when `key` is not present in the table.
    pub fn next(&self, key: Option<&TableKey>) -> Result<Option<(TableKey, Value)>, ()> {
        let start = match key {
            None => 0,
            Some(key) => *self.index.get(key).ok_or(())? + 1,
        };
        Ok(self.slots[start.min(self.slots.len())..]
            .iter()
            .find(|(_, value)| !value.is_nil())
            .cloned())
    }

    pub fn metatable(&self) -> Option<TableRef> {
        self.metatable.clone()
    }

    pub fn set_metatable(&mut self, metatable: Option<TableRef>) {
        self.metatable = metatable;
    }

    /// Live entries in traversal order.
    pub fn entries(&self) -> impl Iterator<Item = (&TableKey, &Value)> {
        self.slots
            .iter()
            .filter(|(_, value)| !value.is_nil())
            .map(|(key, value)| (key, value))
    }

    /// Drops every entry and the metatable.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.tombstones = 0;
        self.metatable = None;
    }

    fn compact(&mut self) {
        self.slots.retain(|(_, value)| !value.is_nil());
        self.index.clear();
        for (slot, (key, _)) in self.slots.iter().enumerate() {
            self.index.insert(key.clone(), slot);
        }
        self.tombstones = 0;
    }
}

/// Shared, identity-compared reference to a [`Table`].
#[derive(Clone)]
pub struct TableRef(Rc<RefCell<Table>>);

impl Default for TableRef {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRef {
    pub fn new() -> Self {
        leak_detector::record_table();
        TableRef(Rc::new(RefCell::new(Table::default())))
    }

    pub fn borrow(&self) -> Ref<'_, Table> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Table> {
        self.0.borrow_mut()
    }

    pub fn try_borrow(&self) -> Result<Ref<'_, Table>, BorrowError> {
        self.0.try_borrow()
    }

    pub fn try_borrow_mut(&self) -> Result<RefMut<'_, Table>, BorrowMutError> {
        self.0.try_borrow_mut()
    }

    pub fn ptr_eq(&self, other: &TableRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub fn get(&self, key: &TableKey) -> Value {
        self.borrow().get(key)
    }

    pub fn get_str(&self, name: &str) -> Value {
        self.borrow().get_str(name)
    }

    pub fn set(&self, key: TableKey, value: Value) {
        self.borrow_mut().set(key, value);
    }

    pub fn set_str(&self, name: &str, value: Value) {
        self.borrow_mut().set_str(name, value);
    }

    pub fn metatable(&self) -> Option<TableRef> {
        self.borrow().metatable()
    }
}

impl fmt::Debug for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Table(0x{:08x})", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_and_remove() {
        let table = TableRef::new();
        table.set_str("a", Value::Integer(1));
        assert!(matches!(table.get_str("a"), Value::Integer(1)));

        table.set_str("a", Value::Nil);
        assert!(table.get_str("a").is_nil());
        assert!(table.borrow().is_empty());
    }

    #[test]
    fn test_length_is_border() {
        let table = TableRef::new();
        for i in 1..=3 {
            table.set(TableKey::Integer(i), Value::Integer(i * 10));
        }
        table.set(TableKey::Integer(5), Value::Integer(50));
        assert_eq!(table.borrow().len(), 3);
    }

    #[test]
    fn test_next_survives_removal_during_traversal() {
        let table = TableRef::new();
        table.set_str("x", Value::Integer(1));
        table.set_str("y", Value::Integer(2));
        table.set_str("z", Value::Integer(3));

        let mut seen = Vec::new();
        let mut key = None;
        loop {
            let entry = table.borrow().next(key.as_ref()).unwrap();
            let Some((k, _)) = entry else { break };
            table.set(k.clone(), Value::Nil);
            seen.push(k.to_string());
            key = Some(k);
        }
        assert_eq!(seen, vec!["\"x\"", "\"y\"", "\"z\""]);
        assert!(table.borrow().is_empty());
    }

    #[test]
    fn test_next_rejects_unknown_key() {
        let table = TableRef::new();
        assert!(table.borrow().next(Some(&TableKey::str("missing"))).is_err());
    }
}
