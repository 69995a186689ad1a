use crate::{
    handle::{
        error::RuntimeError,
        function::FunctionHandle,
        lua::Lua,
        marshal::{FromStack, ToStack, ValueView, impl_value_eq},
        pending::{Item, PendingResult},
        registry_handle::RegistryHandle,
        stack_mark::{StackGuard, StackMark},
        table::TableHandle,
    },
    runtime::{
        error_code::ErrorCode,
        fault::Fault,
        state::{StackPos, State},
        value::{TypeTag, Value},
    },
};

const PROTECTED_MARKER: &str = "protected!";

/// Operator hooks that can be installed in a metatable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaMethod {
    Add,
    Subtract,
    Multiply,
    Divide,
    UnaryMinus,
    Concatenate,
    Equal,
    LessThan,
    LessOrEqual,
    ToString,
    Index,
    NewIndex,
}

impl MetaMethod {
    /// Metatable field the hook is stored under.
    pub fn event_name(self) -> &'static str {
        match self {
            MetaMethod::Add => "__add",
            MetaMethod::Subtract => "__sub",
            MetaMethod::Multiply => "__mul",
            MetaMethod::Divide => "__div",
            MetaMethod::UnaryMinus => "__unm",
            MetaMethod::Concatenate => "__concat",
            MetaMethod::Equal => "__eq",
            MetaMethod::LessThan => "__lt",
            MetaMethod::LessOrEqual => "__le",
            MetaMethod::ToString => "__tostring",
            MetaMethod::Index => "__index",
            MetaMethod::NewIndex => "__newindex",
        }
    }
}

/// Owned reference to any runtime value.
///
/// A handle carries an error code next to its registry slot. While the code
/// is set the handle reads as nil whatever the slot holds; the slot then
/// holds the error message, available through [`error_message`].
///
/// The default handle has no connection and reports
/// [`ErrorCode::NoConnection`].
///
/// [`error_message`]: ObjectHandle::error_message
#[derive(Debug, Clone)]
pub struct ObjectHandle {
    reg: RegistryHandle,
    id: String,
    code: ErrorCode,
}

impl Default for ObjectHandle {
    fn default() -> Self {
        Self::nil("nil")
    }
}

impl ObjectHandle {
    /// An unconnected nil handle with a display id.
    pub fn nil(id: impl Into<String>) -> Self {
        Self {
            reg: RegistryHandle::nil(),
            id: id.into(),
            code: ErrorCode::NoConnection,
        }
    }

    /// References the value at `pos` of a raw state.
    pub fn from_stack(lua: &Lua, state: &mut State, pos: StackPos) -> Self {
        Self {
            reg: RegistryHandle::create(lua, state, pos),
            id: String::new(),
            code: ErrorCode::NoError,
        }
    }

    /// Re-points the handle at `item`, taking over its error state.
    pub fn reset(&mut self, item: Item<'_>) {
        let result = item.result();
        match result.connection() {
            Some(lua) => {
                if !self.reg.connection().is_some_and(|own| own.ptr_eq(lua)) {
                    self.reg = RegistryHandle::nil();
                }
                self.reg.reset(lua, &mut lua.state(), item.position());
                self.code = result.error_code();
            }
            None => {
                self.reg = RegistryHandle::nil();
                self.code = ErrorCode::NoConnection;
            }
        }
    }

    /// Releases the value; the handle stays connected and reads as nil.
    pub fn set_nil(&mut self) {
        self.reg.set_nil();
        if self.reg.connection().is_some() {
            self.code = ErrorCode::NoError;
        }
    }

    pub fn is_nil(&self) -> bool {
        self.is_error() || self.reg.is_nil()
    }

    pub fn type_of(&self) -> TypeTag {
        if self.is_error() {
            return TypeTag::Nil;
        }
        self.reg.type_of()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_of().name()
    }

    pub fn is_error(&self) -> bool {
        self.code.is_error()
    }

    pub fn error_code(&self) -> ErrorCode {
        self.code
    }

    /// The error message, or `""` when the handle is not in error.
    pub fn error_message(&self) -> String {
        match self.code {
            ErrorCode::NoError => String::new(),
            ErrorCode::NoConnection => String::from("No runtime connection"),
            _ => self.read_slot::<String>().unwrap_or_default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Builder form of [`set_id`](Self::set_id).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn connection(&self) -> Option<&Lua> {
        self.reg.connection()
    }

    pub fn registry(&self) -> &RegistryHandle {
        &self.reg
    }

    /// `None` when in error, nil or not convertible.
    pub fn read<T: FromStack>(&self) -> Option<T> {
        if self.is_error() {
            return None;
        }
        self.read_slot()
    }

    /// The value through the fallback read: `T::default()` on nil, error or
    /// mismatch.
    pub fn get_as<T: FromStack + Default>(&self) -> T {
        self.read().unwrap_or_default()
    }

    /// Copy of the raw value (`nil` in error).
    pub fn value(&self) -> Value {
        self.read().unwrap_or_default()
    }

    fn read_slot<T: FromStack>(&self) -> Option<T> {
        let lua = self.reg.connection()?;
        let mut state = lua.state();
        let mut guard = StackGuard::new(&mut state);
        self.reg.push_onto(&mut guard);
        T::read(&guard, -1)
    }

    /// Pushes the value, or `nil` while in error.
    pub fn push_onto(&self, state: &mut State) {
        if self.is_error() {
            state.push_nil();
        } else {
            self.reg.push_onto(state);
        }
    }

    /// Runs `op` with the value pushed on a guarded stack.
    pub(crate) fn with_pushed<R>(
        &self,
        op: impl FnOnce(&mut StackGuard<'_>) -> Result<R, Fault>,
    ) -> Result<R, RuntimeError> {
        let lua = self.connection().ok_or_else(RuntimeError::no_connection)?;
        let mut state = lua.state();
        let mut guard = StackGuard::new(&mut state);
        self.push_onto(&mut guard);
        Ok(op(&mut guard)?)
    }

    // Metatables

    pub fn has_meta_table(&self) -> bool {
        self.with_pushed(|stack| {
            let found = stack.get_metatable(-1);
            debug_assert!(stack.will_pop(1 + usize::from(found)));
            Ok(found)
        })
        .unwrap_or(false)
    }

    /// The metatable as a one-value result (`nil` if there is none).
    pub fn meta_table(&self) -> PendingResult {
        let Some(lua) = self.connection() else {
            return PendingResult::detached();
        };
        let mut state = lua.state();
        let mark = StackMark::new(&state);
        self.push_onto(&mut state);
        if state.get_metatable(-1) {
            state.remove(-2);
        } else {
            state.pop(1);
            state.push_nil();
        }
        PendingResult::from_mark(lua, &mut state, mark, ErrorCode::NoError, "")
    }

    pub fn set_meta_table(&self, metatable: &TableHandle) -> Result<(), RuntimeError> {
        self.with_pushed(|stack| {
            metatable.push_onto(stack);
            let installed = stack.set_metatable(-2);
            debug_assert!(stack.will_pop(1));
            if installed {
                Ok(())
            } else {
                Err(Fault::runtime(format!(
                    "cannot set a metatable on a {} value",
                    stack.type_at(-1)
                )))
            }
        })
    }

    /// Makes missing fields fall back to `base`, creating the metatable if
    /// needed.
    pub fn set_meta_base(&self, base: &TableHandle) -> Result<(), RuntimeError> {
        self.with_pushed(|stack| {
            ensure_metatable(stack)?;
            base.push_onto(stack);
            stack.set_field(-2, "__index")?;
            debug_assert!(stack.will_pop(2));
            Ok(())
        })
    }

    /// Whether a metatable with an `__index` entry is installed.
    pub fn has_meta_base(&self) -> bool {
        self.with_pushed(|stack| {
            if !stack.get_metatable(-1) {
                debug_assert!(stack.will_pop(1));
                return Ok(false);
            }
            stack.push("__index");
            stack.raw_get(-2);
            debug_assert!(stack.will_pop(3));
            Ok(!stack.value_at(-1).is_nil())
        })
        .unwrap_or(false)
    }

    /// Installs `function` as the `method` hook, creating the metatable if
    /// needed.
    pub fn set_meta_method(
        &self,
        method: MetaMethod,
        function: &FunctionHandle,
    ) -> Result<(), RuntimeError> {
        self.with_pushed(|stack| {
            ensure_metatable(stack)?;
            function.push_onto(stack);
            stack.set_field(-2, method.event_name())?;
            debug_assert!(stack.will_pop(2));
            Ok(())
        })
    }

    /// Blocks (or unblocks) script-side `setmetatable` on this value.
    /// `false` when there is no metatable to protect.
    pub fn set_meta_protected(&self, protect: bool) -> bool {
        self.with_pushed(|stack| {
            if !stack.get_metatable(-1) {
                debug_assert!(stack.will_pop(1));
                return Ok(false);
            }
            stack.push("__metatable");
            if protect {
                stack.push(PROTECTED_MARKER);
            } else {
                stack.push_nil();
            }
            stack.raw_set(-3)?;
            debug_assert!(stack.will_pop(2));
            Ok(true)
        })
        .unwrap_or(false)
    }
}

// Leaves the value's metatable on top of the value, installing a new one if
// it has none.
fn ensure_metatable(stack: &mut StackGuard<'_>) -> Result<(), Fault> {
    if stack.get_metatable(-1) {
        return Ok(());
    }
    stack.new_table();
    stack.push_copy(-1);
    if stack.set_metatable(-3) {
        Ok(())
    } else {
        Err(Fault::runtime(format!(
            "cannot set a metatable on a {} value",
            stack.type_at(-2)
        )))
    }
}

impl From<Item<'_>> for ObjectHandle {
    fn from(item: Item<'_>) -> Self {
        let result = item.result();
        match result.connection() {
            Some(lua) => Self {
                reg: RegistryHandle::create(lua, &mut lua.state(), item.position()),
                id: String::new(),
                code: result.error_code(),
            },
            None => Self::default(),
        }
    }
}

impl From<&Item<'_>> for ObjectHandle {
    fn from(item: &Item<'_>) -> Self {
        Self::from(*item)
    }
}

/// Promotes the first value (or the error message).
impl From<&PendingResult> for ObjectHandle {
    fn from(result: &PendingResult) -> Self {
        Self::from(result.item(1))
    }
}

impl From<PendingResult> for ObjectHandle {
    fn from(result: PendingResult) -> Self {
        Self::from(&result)
    }
}

impl ValueView for ObjectHandle {
    fn view<T: FromStack + Default>(&self) -> T {
        self.get_as()
    }
}

impl_value_eq!(ObjectHandle);

/// Wraps [`ObjectHandle`] into a capability handle that adds operations but
/// no state.
macro_rules! capability_handle {
    ($name:ident) => {
        impl $name {
            pub fn nil(id: impl Into<String>) -> Self {
                Self($crate::handle::object::ObjectHandle::nil(id))
            }

            pub fn as_object(&self) -> &$crate::handle::object::ObjectHandle {
                &self.0
            }

            pub fn into_object(self) -> $crate::handle::object::ObjectHandle {
                self.0
            }

            pub fn with_id(self, id: impl Into<String>) -> Self {
                Self(self.0.with_id(id))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self($crate::handle::object::ObjectHandle::default())
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::handle::object::ObjectHandle;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl From<$crate::handle::object::ObjectHandle> for $name {
            fn from(object: $crate::handle::object::ObjectHandle) -> Self {
                Self(object)
            }
        }

        impl From<$crate::handle::pending::Item<'_>> for $name {
            fn from(item: $crate::handle::pending::Item<'_>) -> Self {
                Self($crate::handle::object::ObjectHandle::from(item))
            }
        }

        impl From<&$crate::handle::pending::PendingResult> for $name {
            fn from(result: &$crate::handle::pending::PendingResult) -> Self {
                Self($crate::handle::object::ObjectHandle::from(result))
            }
        }

        impl From<$crate::handle::pending::PendingResult> for $name {
            fn from(result: $crate::handle::pending::PendingResult) -> Self {
                Self($crate::handle::object::ObjectHandle::from(&result))
            }
        }

        impl<'a> From<&'a $name> for $crate::handle::marshal::CallArg<'a> {
            fn from(handle: &'a $name) -> Self {
                $crate::handle::marshal::CallArg::Object(&handle.0)
            }
        }

        impl $crate::handle::marshal::ToStack for $name {
            fn push_to(&self, state: &mut $crate::runtime::state::State) {
                self.0.push_onto(state);
            }
        }

        impl $crate::handle::marshal::ValueView for $name {
            fn view<T: $crate::handle::marshal::FromStack + Default>(&self) -> T {
                self.0.get_as()
            }
        }

        $crate::handle::marshal::impl_value_eq!($name);
    };
}

pub(crate) use capability_handle;

impl ToStack for ObjectHandle {
    fn push_to(&self, state: &mut State) {
        self.push_onto(state);
    }
}
