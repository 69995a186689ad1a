use std::{fmt, rc::Rc};

use crate::runtime::{function::Function, table::TableRef};

/// Runtime value held on the value stack, in tables, in the registry and in
/// local variables.
///
/// ## Memory Management Model
///
/// Strings, tables and functions are `Rc`-shared; primitives are unboxed.
/// Tables are mutable (`Rc<RefCell<_>>`) so scripts can build cycles such as
/// `Class.__index = Class`. The owning [`State`](crate::runtime::state::State)
/// severs every table and captured variable reachable from its roots when it
/// is dropped, which breaks those cycles.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absence of value.
    #[default]
    Nil,
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Immutable byte-exact string.
    String(Rc<str>),
    Table(TableRef),
    /// Script closure or builtin.
    Function(Rc<Function>),
}

/// Runtime type tag as reported by `type()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Nil,
    Boolean,
    Number,
    String,
    Table,
    Function,
}

impl TypeTag {
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Nil => "nil",
            TypeTag::Boolean => "boolean",
            TypeTag::Number => "number",
            TypeTag::String => "string",
            TypeTag::Table => "table",
            TypeTag::Function => "function",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Nil => TypeTag::Nil,
            Value::Boolean(_) => TypeTag::Boolean,
            Value::Integer(_) | Value::Float(_) => TypeTag::Number,
            Value::String(_) => TypeTag::String,
            Value::Table(_) => TypeTag::Table,
            Value::Function(_) => TypeTag::Function,
        }
    }

    /// Returns the type label used in error messages and by `type()`.
    pub fn type_name(&self) -> &'static str {
        self.type_tag().name()
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Equality without metamethods: numbers numerically, strings by content,
    /// tables and functions by identity.
    pub fn raw_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                float_to_integer(*b) == Some(*a)
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Numeric view with string coercion, as used by arithmetic.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::String(s) => match parse_number(s)? {
                Value::Integer(v) => Some(v as f64),
                Value::Float(v) => Some(v),
                _ => None,
            },
            _ => None,
        }
    }

    /// Integer view: integers, integral floats and numeric strings.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Float(v) => float_to_integer(*v),
            Value::String(s) => match parse_number(s)? {
                Value::Integer(v) => Some(v),
                Value::Float(v) => float_to_integer(v),
                _ => None,
            },
            _ => None,
        }
    }

    /// Arithmetic operand: numbers as-is, numeric strings converted.
    pub fn to_arith(&self) -> Option<Value> {
        match self {
            Value::Integer(_) | Value::Float(_) => Some(self.clone()),
            Value::String(s) => parse_number(s),
            _ => None,
        }
    }

    /// String view of strings and numbers (the coercion used by `..`).
    pub fn to_str(&self) -> Option<Rc<str>> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Integer(v) => Some(Rc::from(v.to_string())),
            Value::Float(v) => Some(Rc::from(format_float(*v))),
            _ => None,
        }
    }

    /// Address used to print tables and functions.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Table(table) => Some(table.id()),
            Value::Function(function) => Some(Rc::as_ptr(function) as *const () as usize),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Rc::from(value))
    }
}

impl From<TableRef> for Value {
    fn from(value: TableRef) -> Self {
        Value::Table(value)
    }
}

/// Plain rendering without metamethods (what `tostring` falls back to).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", format_float(*v)),
            Value::String(v) => write!(f, "{}", v),
            Value::Table(table) => write!(f, "table: 0x{:08x}", table.id()),
            Value::Function(function) => match function.as_ref() {
                Function::Builtin(builtin) => write!(f, "builtin: {}", builtin.name),
                Function::Closure(_) => write!(
                    f,
                    "function: 0x{:08x}",
                    Rc::as_ptr(function) as *const () as usize
                ),
            },
        }
    }
}

pub fn float_to_integer(value: f64) -> Option<i64> {
    if value.fract() == 0.0 && value >= -9.223_372_036_854_776e18 && value < 9.223_372_036_854_776e18
    {
        Some(value as i64)
    } else {
        None
    }
}

/// Formats a float the way `%.14g` does, keeping a `.0` on integral values.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return if value.is_sign_negative() {
            String::from("-nan")
        } else {
            String::from("nan")
        };
    }
    if value.is_infinite() {
        return if value > 0.0 {
            String::from("inf")
        } else {
            String::from("-inf")
        };
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e15).contains(&magnitude) {
        let rendered = format!("{:e}", value);
        // Rust prints `1e100`; scripts expect `1e+100`
        return match rendered.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => rendered,
        };
    }

    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        let rendered = format!("{:.14}", value);
        let trimmed = rendered.trim_end_matches('0');
        trimmed.to_string()
    }
}

/// Parses a numeral the way `tonumber` does: surrounding whitespace, an
/// optional sign, decimal integers, hex integers and decimal floats.
pub fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let (negative, body) = match text.as_bytes()[0] {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        let value = u64::from_str_radix(hex, 16).ok()? as i64;
        return Some(Value::Integer(if negative {
            value.wrapping_neg()
        } else {
            value
        }));
    }

    if body.is_empty() || !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let is_integer_literal = body.bytes().all(|b| b.is_ascii_digit());
    if is_integer_literal {
        if let Ok(value) = body.parse::<i64>() {
            return Some(Value::Integer(if negative { -value } else { value }));
        }
    }

    // Reject forms Rust accepts but scripts do not (`inf`, `nan`)
    if body.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return None;
    }
    let value = body.parse::<f64>().ok()?;
    Some(Value::Float(if negative { -value } else { value }))
}
