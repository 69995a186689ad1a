use crate::{
    handle::{
        error::RuntimeError,
        marshal::{CallArg, FromStack, ToStack, ValueView, impl_value_eq},
        object::{ObjectHandle, capability_handle},
        pending::PendingResult,
        stack_mark::StackMark,
    },
    runtime::state::State,
};

/// Owned reference to a table: field access on top of [`ObjectHandle`].
///
/// Keys of any [`CallArg`] kind are accepted and go through `__index` and
/// `__newindex`.
#[derive(Debug, Clone)]
pub struct TableHandle(ObjectHandle);

capability_handle!(TableHandle);

impl TableHandle {
    pub fn has_field<'k>(&self, key: impl Into<CallArg<'k>>) -> bool {
        let key = key.into();
        self.0
            .with_pushed(|stack| {
                key.push_to(stack);
                stack.get_table(-2)?;
                debug_assert!(stack.will_pop(2));
                Ok(!stack.value_at(-1).is_nil())
            })
            .unwrap_or(false)
    }

    /// `t[key]` as a one-value result.
    pub fn get_field<'k>(&self, key: impl Into<CallArg<'k>>) -> PendingResult {
        field_of(&self.0, key.into())
    }

    pub fn set_field<'k>(
        &self,
        key: impl Into<CallArg<'k>>,
        value: impl ToStack,
    ) -> Result<(), RuntimeError> {
        let key = key.into();
        self.0.with_pushed(|stack| {
            key.push_to(stack);
            value.push_to(stack);
            stack.set_table(-3)?;
            debug_assert!(stack.will_pop(1));
            Ok(())
        })
    }

    /// Removes `key` by assigning `nil`.
    pub fn del_field<'k>(&self, key: impl Into<CallArg<'k>>) -> Result<(), RuntimeError> {
        self.set_field(key, ())
    }

    /// Lazy `t[key]`: nothing is read until the field is used.
    pub fn field<'t, 'k>(&'t self, key: impl Into<CallArg<'k>>) -> Field<'t, 'k> {
        Field {
            table: self,
            key: key.into(),
        }
    }

    /// Border length, ignoring metamethods.
    pub fn len(&self) -> usize {
        self.0
            .with_pushed(|stack| {
                debug_assert!(stack.will_pop(1));
                Ok(stack.raw_len(-1))
            })
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `object[key]` as a one-value result, for any indexable handle.
pub(crate) fn field_of(object: &ObjectHandle, key: CallArg<'_>) -> PendingResult {
    let Some(lua) = object.connection() else {
        return PendingResult::detached();
    };
    let mut state = lua.state();
    let mark = StackMark::new(&state);
    object.push_onto(&mut state);
    key.push_to(&mut state);
    let outcome = state.get_table(-2).map(|()| state.remove(-2));
    let id = if object.id().is_empty() {
        "<anonymous>"
    } else {
        object.id()
    };
    let prefix = format!("Field access in {}", id);
    PendingResult::from_outcome(lua, &mut state, mark, outcome, &prefix)
}

/// Proxy for `table[key]`, read or assigned on use.
#[derive(Debug, Clone)]
pub struct Field<'t, 'k> {
    table: &'t TableHandle,
    key: CallArg<'k>,
}

impl Field<'_, '_> {
    pub fn key(&self) -> &CallArg<'_> {
        &self.key
    }

    pub fn get(&self) -> PendingResult {
        self.table.get_field(self.key.clone())
    }

    pub fn set(&self, value: impl ToStack) -> Result<(), RuntimeError> {
        self.table.set_field(self.key.clone(), value)
    }

    pub fn delete(&self) -> Result<(), RuntimeError> {
        self.table.del_field(self.key.clone())
    }

    pub fn exists(&self) -> bool {
        self.table.has_field(self.key.clone())
    }

    pub fn is_nil(&self) -> bool {
        !self.exists()
    }

    pub fn read<T: FromStack>(&self) -> Option<T> {
        self.get().read(1)
    }

    pub fn get_as<T: FromStack + Default>(&self) -> T {
        self.get().get_as(1)
    }

    /// Promotes the current value into an owned handle.
    pub fn to_object(&self) -> ObjectHandle {
        ObjectHandle::from(&self.get())
    }
}

impl ToStack for Field<'_, '_> {
    fn push_to(&self, state: &mut State) {
        self.table.push_onto(state);
        self.key.push_to(state);
        if state.get_table(-2).is_err() {
            state.push_nil();
        }
        state.remove(-2);
    }
}

impl ValueView for Field<'_, '_> {
    fn view<T: FromStack + Default>(&self) -> T {
        self.get_as()
    }
}

impl_value_eq!(Field<'_, '_>);
