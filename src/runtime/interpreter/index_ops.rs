use crate::runtime::{
    fault::Fault,
    state::State,
    table::TableRef,
    table_key::TableKey,
    value::Value,
};

use super::MAX_META_CHAIN;

impl State {
    /// Only tables carry metatables.
    pub(crate) fn metatable_of(&self, value: &Value) -> Option<TableRef> {
        match value {
            Value::Table(table) => table.metatable(),
            _ => None,
        }
    }

    /// Non-nil field `event` of the value's metatable.
    pub(crate) fn metamethod(&self, value: &Value, event: &str) -> Option<Value> {
        let handler = self.metatable_of(value)?.get_str(event);
        (!handler.is_nil()).then_some(handler)
    }

    /// `target[key]` following `__index` tables and functions.
    pub(crate) fn index_value(&mut self, target: &Value, key: &Value) -> Result<Value, Fault> {
        let mut current = target.clone();
        for _ in 0..MAX_META_CHAIN {
            let Value::Table(table) = &current else {
                return Err(self.error(format!(
                    "attempt to index a {} value",
                    current.type_name()
                )));
            };

            let raw = match TableKey::from_value(key) {
                Ok(key) => table.get(&key),
                Err(_) => Value::Nil,
            };
            if !raw.is_nil() {
                return Ok(raw);
            }

            match self.metamethod(&current, "__index") {
                None => return Ok(Value::Nil),
                Some(handler @ Value::Function(_)) => {
                    return self.call_first(&handler, vec![current.clone(), key.clone()]);
                }
                Some(next) => current = next,
            }
        }
        Err(self.error("loop in gettable"))
    }

    /// `target[key] = value` following `__newindex` tables and functions.
    pub(crate) fn set_index(&mut self, target: &Value, key: Value, value: Value) -> Result<(), Fault> {
        let mut current = target.clone();
        for _ in 0..MAX_META_CHAIN {
            let Value::Table(table) = &current else {
                return Err(self.error(format!(
                    "attempt to index a {} value",
                    current.type_name()
                )));
            };

            let table_key = TableKey::from_value(&key).map_err(|e| self.error(e.message()));
            let present = match &table_key {
                Ok(table_key) => table.borrow().contains(table_key),
                Err(_) => false,
            };

            let handler = if present {
                None
            } else {
                self.metamethod(&current, "__newindex")
            };
            match handler {
                None => {
                    table.set(table_key?, value);
                    return Ok(());
                }
                Some(handler @ Value::Function(_)) => {
                    self.call_value(&handler, vec![current.clone(), key, value])?;
                    return Ok(());
                }
                Some(next) => current = next,
            }
        }
        Err(self.error("loop in settable"))
    }
}
