//! Moving primitive values between the host and the value stack.
//!
//! Reads follow a named fallback policy: [`FromStack::read`] returns `None`
//! when the slot holds nothing convertible, and [`read_or_default`] collapses
//! that to the type's zero-equivalent (`0`, `""`, `false`). Handle accessors
//! such as `get_as` use the fallback.
use std::borrow::Cow;

use crate::{
    handle::object::ObjectHandle,
    runtime::{
        state::{StackPos, State},
        value::Value,
    },
};

/// A host type that can be read from a stack slot.
pub trait FromStack: Sized {
    /// `None` for unacceptable positions and non-convertible values.
    fn read(state: &State, pos: StackPos) -> Option<Self>;
}

/// Reads `pos`, falling back to `T::default()`.
pub fn read_or_default<T: FromStack + Default>(state: &State, pos: StackPos) -> T {
    T::read(state, pos).unwrap_or_default()
}

/// A host value that pushes exactly one value onto the stack.
pub trait ToStack {
    fn push_to(&self, state: &mut State);
}

// Integral view: integers, numeric strings and floats truncated toward zero.
fn integer_at(state: &State, pos: StackPos) -> Option<i64> {
    state.to_integer(pos).or_else(|| {
        state
            .to_number(pos)
            .filter(|n| n.is_finite())
            .map(|n| n.trunc() as i64)
    })
}

impl FromStack for bool {
    fn read(state: &State, pos: StackPos) -> Option<Self> {
        state.is_acceptable(pos).then(|| state.to_boolean(pos))
    }
}

impl FromStack for i64 {
    fn read(state: &State, pos: StackPos) -> Option<Self> {
        integer_at(state, pos)
    }
}

impl FromStack for i32 {
    fn read(state: &State, pos: StackPos) -> Option<Self> {
        integer_at(state, pos).and_then(|v| i32::try_from(v).ok())
    }
}

impl FromStack for u32 {
    fn read(state: &State, pos: StackPos) -> Option<Self> {
        integer_at(state, pos).and_then(|v| u32::try_from(v).ok())
    }
}

impl FromStack for f64 {
    fn read(state: &State, pos: StackPos) -> Option<Self> {
        state.to_number(pos)
    }
}

impl FromStack for f32 {
    fn read(state: &State, pos: StackPos) -> Option<Self> {
        state.to_number(pos).map(|n| n as f32)
    }
}

impl FromStack for String {
    fn read(state: &State, pos: StackPos) -> Option<Self> {
        state.to_str(pos).map(|s| s.to_string())
    }
}

impl FromStack for Value {
    fn read(state: &State, pos: StackPos) -> Option<Self> {
        state.is_acceptable(pos).then(|| state.value_at(pos))
    }
}

macro_rules! push_via_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToStack for $ty {
                fn push_to(&self, state: &mut State) {
                    state.push(Value::from(*self));
                }
            }
        )*
    };
}

push_via_value!(bool, i64, f64);

impl ToStack for i32 {
    fn push_to(&self, state: &mut State) {
        state.push(i64::from(*self));
    }
}

impl ToStack for u32 {
    fn push_to(&self, state: &mut State) {
        state.push(i64::from(*self));
    }
}

impl ToStack for f32 {
    fn push_to(&self, state: &mut State) {
        state.push(f64::from(*self));
    }
}

impl ToStack for str {
    fn push_to(&self, state: &mut State) {
        state.push(self);
    }
}

impl ToStack for String {
    fn push_to(&self, state: &mut State) {
        state.push(self.as_str());
    }
}

impl ToStack for Value {
    fn push_to(&self, state: &mut State) {
        state.push_value(self.clone());
    }
}

impl ToStack for () {
    fn push_to(&self, state: &mut State) {
        state.push_nil();
    }
}

impl<T: ToStack> ToStack for Option<T> {
    fn push_to(&self, state: &mut State) {
        match self {
            Some(value) => value.push_to(state),
            None => state.push_nil(),
        }
    }
}

impl<T: ToStack + ?Sized> ToStack for &T {
    fn push_to(&self, state: &mut State) {
        (**self).push_to(state);
    }
}

/// One already-marshalled call argument or table key.
///
/// Results and their items have no conversion into `CallArg`: their values
/// live on the very stack a call rearranges. Promote them to an
/// [`ObjectHandle`] first.
#[derive(Debug, Clone)]
pub enum CallArg<'a> {
    Nil,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(Cow<'a, str>),
    Value(Value),
    Object(&'a ObjectHandle),
}

impl ToStack for CallArg<'_> {
    fn push_to(&self, state: &mut State) {
        match self {
            CallArg::Nil => state.push_nil(),
            CallArg::Boolean(v) => state.push(*v),
            CallArg::Integer(v) => state.push(*v),
            CallArg::Number(v) => state.push(*v),
            CallArg::String(v) => state.push(v.as_ref()),
            CallArg::Value(v) => state.push_value(v.clone()),
            CallArg::Object(object) => object.push_onto(state),
        }
    }
}

impl From<()> for CallArg<'_> {
    fn from(_: ()) -> Self {
        CallArg::Nil
    }
}

impl From<bool> for CallArg<'_> {
    fn from(value: bool) -> Self {
        CallArg::Boolean(value)
    }
}

impl From<i32> for CallArg<'_> {
    fn from(value: i32) -> Self {
        CallArg::Integer(i64::from(value))
    }
}

impl From<i64> for CallArg<'_> {
    fn from(value: i64) -> Self {
        CallArg::Integer(value)
    }
}

impl From<u32> for CallArg<'_> {
    fn from(value: u32) -> Self {
        CallArg::Integer(i64::from(value))
    }
}

impl From<f32> for CallArg<'_> {
    fn from(value: f32) -> Self {
        CallArg::Number(f64::from(value))
    }
}

impl From<f64> for CallArg<'_> {
    fn from(value: f64) -> Self {
        CallArg::Number(value)
    }
}

impl<'a> From<&'a str> for CallArg<'a> {
    fn from(value: &'a str) -> Self {
        CallArg::String(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for CallArg<'a> {
    fn from(value: &'a String) -> Self {
        CallArg::String(Cow::Borrowed(value.as_str()))
    }
}

impl From<String> for CallArg<'_> {
    fn from(value: String) -> Self {
        CallArg::String(Cow::Owned(value))
    }
}

impl From<Value> for CallArg<'_> {
    fn from(value: Value) -> Self {
        CallArg::Value(value)
    }
}

impl<'a> From<&'a ObjectHandle> for CallArg<'a> {
    fn from(value: &'a ObjectHandle) -> Self {
        CallArg::Object(value)
    }
}

/// Builds a `&[CallArg]` from heterogeneous host values.
///
/// ```
/// use tether::{args, handle::{FunctionHandle, Lua}};
///
/// let lua = Lua::new();
/// let third = FunctionHandle::from(&lua.eval("function(a, b, c) return c end"));
/// assert!(third.call(args![1, 2.5, "three"]) == "three");
/// ```
#[macro_export]
macro_rules! args {
    () => {
        &[] as &[$crate::handle::CallArg<'_>]
    };
    ($($arg:expr),+ $(,)?) => {
        &[$($crate::handle::CallArg::from($arg)),+]
    };
}

/// Read access shared by the value views, used by the comparison sugar.
pub(crate) trait ValueView {
    fn view<T: FromStack + Default>(&self) -> T;
}

/// `view == literal` comparisons through the fallback read.
macro_rules! impl_value_eq {
    ($($target:ty),* $(,)?) => {
        $(
            impl PartialEq<i32> for $target {
                fn eq(&self, other: &i32) -> bool {
                    $crate::handle::marshal::ValueView::view::<i32>(self) == *other
                }
            }

            impl PartialEq<i64> for $target {
                fn eq(&self, other: &i64) -> bool {
                    $crate::handle::marshal::ValueView::view::<i64>(self) == *other
                }
            }

            impl PartialEq<f64> for $target {
                fn eq(&self, other: &f64) -> bool {
                    $crate::handle::marshal::ValueView::view::<f64>(self) == *other
                }
            }

            impl PartialEq<bool> for $target {
                fn eq(&self, other: &bool) -> bool {
                    $crate::handle::marshal::ValueView::view::<bool>(self) == *other
                }
            }

            impl PartialEq<&str> for $target {
                fn eq(&self, other: &&str) -> bool {
                    $crate::handle::marshal::ValueView::view::<String>(self) == *other
                }
            }

            impl PartialEq<String> for $target {
                fn eq(&self, other: &String) -> bool {
                    $crate::handle::marshal::ValueView::view::<String>(self) == *other
                }
            }
        )*
    };
}

pub(crate) use impl_value_eq;
