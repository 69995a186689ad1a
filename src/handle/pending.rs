use log::{trace, warn};

use crate::{
    handle::{
        lua::Lua,
        marshal::{FromStack, ValueView, impl_value_eq},
        object::ObjectHandle,
        stack_mark::StackMark,
    },
    runtime::{
        error_code::ErrorCode,
        fault::Fault,
        state::{NO_POSITION, StackPos, State},
        value::{TypeTag, Value},
    },
};

/// The values one operation left on the stack, read in place.
///
/// A result claims every slot above the depth recorded before the operation
/// and truncates the stack back to that depth when dropped. It cannot be
/// cloned: two owners of one claim would restore the stack twice. Values
/// that must outlive the result are promoted into an [`ObjectHandle`].
///
/// On error exactly one value is resident: the message, rewritten as
/// `"<prefix>: <message>"`.
#[derive(Debug)]
pub struct PendingResult {
    lua: Option<Lua>,
    depth: StackPos,
    count: usize,
    code: ErrorCode,
}

impl PendingResult {
    /// Claims everything above `mark`. When `code` is an error the single
    /// value above the mark is taken as the message and prefixed.
    pub fn from_mark(
        lua: &Lua,
        state: &mut State,
        mark: StackMark,
        code: ErrorCode,
        prefix: &str,
    ) -> Self {
        let depth = mark.depth();
        let mut count = mark.count(state);

        if code.is_error() {
            debug_assert!(
                mark.verify(state, 1),
                "a failed operation leaves exactly one value"
            );
            if count == 0 {
                state.push(code.to_string());
            } else if count > 1 {
                state.replace(depth + 1);
                state.set_top(depth + 1);
            }
            count = 1;

            let message = match state.to_str(depth + 1) {
                Some(message) => message.to_string(),
                None => state.value_at(depth + 1).to_string(),
            };
            if !prefix.is_empty() {
                state.push(format!("{}: {}", prefix, message));
                state.replace(depth + 1);
            }
        }

        trace!("pending result: {} values above {} ({})", count, depth, code);
        Self {
            lua: Some(lua.clone()),
            depth,
            count,
            code,
        }
    }

    /// Claims the single value pushed by a raw operation, or its fault.
    pub fn from_outcome(
        lua: &Lua,
        state: &mut State,
        mark: StackMark,
        outcome: Result<(), Fault>,
        prefix: &str,
    ) -> Self {
        match outcome {
            Ok(()) => Self::from_mark(lua, state, mark, ErrorCode::NoError, prefix),
            Err(fault) => {
                state.set_top(mark.depth());
                state.push_value(fault.value);
                Self::from_mark(lua, state, mark, fault.code, prefix)
            }
        }
    }

    /// A result produced without any runtime connection.
    pub fn detached() -> Self {
        Self {
            lua: None,
            depth: 0,
            count: 0,
            code: ErrorCode::NoConnection,
        }
    }

    pub fn ok(&self) -> bool {
        self.code.is_ok()
    }

    pub fn is_error(&self) -> bool {
        self.code.is_error()
    }

    pub fn error_code(&self) -> ErrorCode {
        self.code
    }

    pub fn connection(&self) -> Option<&Lua> {
        self.lua.as_ref()
    }

    /// Values resident above the mark: the error message counts as one.
    pub fn item_count(&self) -> usize {
        self.count
    }

    /// Normal values only; `0` on error.
    pub fn value_count(&self) -> usize {
        if self.is_error() { 0 } else { self.count }
    }

    /// The prefixed error message, or `""` when the operation succeeded.
    pub fn error_message(&self) -> String {
        match self.code {
            ErrorCode::NoError => String::new(),
            ErrorCode::NoConnection if self.lua.is_none() => String::from("No runtime connection"),
            _ => self.read::<String>(1).unwrap_or_default(),
        }
    }

    /// Absolute stack position of value `index`: `1..=n` from the first
    /// value, `-1..=-n` from the last. Out of range yields [`NO_POSITION`];
    /// on error both `1` and `-1` address the message.
    pub fn position(&self, index: i32) -> StackPos {
        let count = self.count as i32;
        let in_range = (index > 0 && index <= count) || (index < 0 && index >= -count);
        if !in_range || self.lua.is_none() {
            return NO_POSITION;
        }
        if self.is_error() {
            self.depth + 1
        } else if index > 0 {
            self.depth + index
        } else {
            self.depth + count + 1 + index
        }
    }

    pub fn item(&self, index: i32) -> Item<'_> {
        Item {
            result: self,
            pos: self.position(index),
        }
    }

    /// The normal values as items, first to last.
    pub fn items(&self) -> impl Iterator<Item = Item<'_>> {
        (1..=self.value_count() as i32).map(|index| self.item(index))
    }

    pub fn read<T: FromStack>(&self, index: i32) -> Option<T> {
        self.read_at(self.position(index))
    }

    /// Value `index` through the fallback read; `T::default()` on error or
    /// when out of range.
    pub fn get_as<T: FromStack + Default>(&self, index: i32) -> T {
        if self.is_error() {
            return T::default();
        }
        self.read(index).unwrap_or_default()
    }

    pub fn is_nil(&self, index: i32) -> bool {
        self.type_of(index) == TypeTag::Nil
    }

    /// Type of value `index`; errors and unacceptable positions read as nil.
    pub fn type_of(&self, index: i32) -> TypeTag {
        if self.is_error() {
            return TypeTag::Nil;
        }
        self.type_at(self.position(index))
    }

    /// Copies of the normal values.
    pub fn values(&self) -> Vec<Value> {
        self.items().map(|item| item.value()).collect()
    }

    /// Pushes a copy of value `index` (`nil` if out of range) for use by a
    /// following raw operation.
    pub fn push_onto(&self, state: &mut State, index: i32) {
        state.push_copy(self.position(index));
    }

    fn read_at<T: FromStack>(&self, pos: StackPos) -> Option<T> {
        if pos == NO_POSITION {
            return None;
        }
        let lua = self.lua.as_ref()?;
        T::read(&lua.state_ref(), pos)
    }

    fn type_at(&self, pos: StackPos) -> TypeTag {
        match &self.lua {
            Some(lua) if pos != NO_POSITION => lua.state_ref().type_at(pos),
            _ => TypeTag::Nil,
        }
    }
}

impl Drop for PendingResult {
    fn drop(&mut self) {
        let Some(lua) = &self.lua else {
            return;
        };
        let Ok(mut state) = lua.try_state() else {
            warn!("pending result dropped while the state is busy; stack not restored");
            return;
        };
        let top = state.top();
        if top > self.depth {
            trace!("pending result: restore {} -> {}", top, self.depth);
            state.set_top(self.depth);
        } else if top < self.depth {
            warn!(
                "pending result: stack already below its mark ({} < {})",
                top, self.depth
            );
        }
    }
}

impl ValueView for PendingResult {
    fn view<T: FromStack + Default>(&self) -> T {
        self.get_as(1)
    }
}

/// Borrowed view of one value of a [`PendingResult`].
///
/// Valid as long as its result; the borrow makes that a compile-time rule.
#[derive(Debug, Clone, Copy)]
pub struct Item<'r> {
    result: &'r PendingResult,
    pos: StackPos,
}

impl<'r> Item<'r> {
    pub fn result(&self) -> &'r PendingResult {
        self.result
    }

    /// Absolute stack position, or [`NO_POSITION`].
    pub fn position(&self) -> StackPos {
        self.pos
    }

    pub fn is_error(&self) -> bool {
        self.result.is_error()
    }

    pub fn error_code(&self) -> ErrorCode {
        self.result.code
    }

    pub fn is_nil(&self) -> bool {
        self.type_of() == TypeTag::Nil
    }

    pub fn type_of(&self) -> TypeTag {
        if self.is_error() {
            return TypeTag::Nil;
        }
        self.result.type_at(self.pos)
    }

    pub fn read<T: FromStack>(&self) -> Option<T> {
        self.result.read_at(self.pos)
    }

    pub fn get_as<T: FromStack + Default>(&self) -> T {
        if self.is_error() {
            return T::default();
        }
        self.read().unwrap_or_default()
    }

    /// Copy of the raw value, including the message of an error item.
    pub fn value(&self) -> Value {
        self.read().unwrap_or_default()
    }

    pub fn push_onto(&self, state: &mut State) {
        state.push_copy(self.pos);
    }

    /// Promotes the value into a registry-backed handle that outlives the
    /// result.
    pub fn to_object(&self) -> ObjectHandle {
        ObjectHandle::from(*self)
    }
}

impl ValueView for Item<'_> {
    fn view<T: FromStack + Default>(&self) -> T {
        self.get_as()
    }
}

impl_value_eq!(PendingResult, Item<'_>);
