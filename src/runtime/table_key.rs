use std::{
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

use crate::runtime::{
    function::Function,
    table::TableRef,
    value::{Value, float_to_integer},
};

/// Hashable form of a non-nil, non-NaN value used as a table key.
///
/// Floats with an integral value are stored as integers so `t[1]` and
/// `t[1.0]` address the same slot. Tables and functions hash by identity.
#[derive(Debug, Clone)]
pub enum TableKey {
    Integer(i64),
    Boolean(bool),
    String(Rc<str>),
    Float(u64),
    Table(TableRef),
    Function(Rc<Function>),
}

/// Why a value cannot be used as a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyError {
    Nil,
    NaN,
}

impl KeyError {
    pub fn message(self) -> &'static str {
        match self {
            KeyError::Nil => "table index is nil",
            KeyError::NaN => "table index is NaN",
        }
    }
}

impl TableKey {
    pub fn from_value(value: &Value) -> Result<TableKey, KeyError> {
        match value {
            Value::Nil => Err(KeyError::Nil),
            Value::Boolean(b) => Ok(TableKey::Boolean(*b)),
            Value::Integer(i) => Ok(TableKey::Integer(*i)),
            Value::Float(f) if f.is_nan() => Err(KeyError::NaN),
            Value::Float(f) => Ok(match float_to_integer(*f) {
                Some(i) => TableKey::Integer(i),
                None => TableKey::Float(f.to_bits()),
            }),
            Value::String(s) => Ok(TableKey::String(s.clone())),
            Value::Table(t) => Ok(TableKey::Table(t.clone())),
            Value::Function(f) => Ok(TableKey::Function(f.clone())),
        }
    }

    pub fn str(name: &str) -> TableKey {
        TableKey::String(Rc::from(name))
    }

    pub fn to_value(&self) -> Value {
        match self {
            TableKey::Integer(i) => Value::Integer(*i),
            TableKey::Boolean(b) => Value::Boolean(*b),
            TableKey::String(s) => Value::String(s.clone()),
            TableKey::Float(bits) => Value::Float(f64::from_bits(*bits)),
            TableKey::Table(t) => Value::Table(t.clone()),
            TableKey::Function(f) => Value::Function(f.clone()),
        }
    }
}

impl PartialEq for TableKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TableKey::Integer(a), TableKey::Integer(b)) => a == b,
            (TableKey::Boolean(a), TableKey::Boolean(b)) => a == b,
            (TableKey::String(a), TableKey::String(b)) => a == b,
            (TableKey::Float(a), TableKey::Float(b)) => a == b,
            (TableKey::Table(a), TableKey::Table(b)) => a.ptr_eq(b),
            (TableKey::Function(a), TableKey::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for TableKey {}

impl Hash for TableKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            TableKey::Integer(i) => i.hash(state),
            TableKey::Boolean(b) => b.hash(state),
            TableKey::String(s) => s.hash(state),
            TableKey::Float(bits) => bits.hash(state),
            TableKey::Table(t) => t.id().hash(state),
            TableKey::Function(f) => (Rc::as_ptr(f) as *const () as usize).hash(state),
        }
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKey::String(s) => write!(f, "\"{}\"", s),
            other => write!(f, "{}", other.to_value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_normalize_to_integers() {
        let key = TableKey::from_value(&Value::Float(2.0)).unwrap();
        assert_eq!(key, TableKey::Integer(2));

        let key = TableKey::from_value(&Value::Float(2.5)).unwrap();
        assert!(matches!(key, TableKey::Float(_)));
    }

    #[test]
    fn nil_and_nan_are_rejected() {
        assert_eq!(TableKey::from_value(&Value::Nil).unwrap_err(), KeyError::Nil);
        assert_eq!(
            TableKey::from_value(&Value::Float(f64::NAN)).unwrap_err(),
            KeyError::NaN
        );
    }

    #[test]
    fn tables_hash_by_identity() {
        let a = TableRef::new();
        let b = TableRef::new();
        assert_ne!(
            TableKey::from_value(&Value::Table(a.clone())).unwrap(),
            TableKey::from_value(&Value::Table(b)).unwrap()
        );
        assert_eq!(
            TableKey::from_value(&Value::Table(a.clone())).unwrap(),
            TableKey::Table(a)
        );
    }
}
