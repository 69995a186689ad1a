use std::fmt;

use log::{trace, warn};

use crate::{
    handle::{lua::Lua, stack_mark::StackChecker},
    runtime::{
        registry::RegistryKey,
        state::{NO_POSITION, StackPos, State},
        value::TypeTag,
    },
};

/// Strong reference to one value through a registry slot.
///
/// Move-only in spirit: `Clone` is the explicit duplicate operation and
/// allocates a fresh slot for the same value. Dropping the handle releases
/// its slot exactly once.
pub struct RegistryHandle {
    lua: Option<Lua>,
    key: RegistryKey,
}

impl RegistryHandle {
    /// A handle that owns nothing and has no connection.
    pub fn nil() -> Self {
        Self {
            lua: None,
            key: RegistryKey::NoRef,
        }
    }

    /// References the value at `pos` without disturbing it. An unacceptable
    /// position yields a nil handle.
    pub fn create(lua: &Lua, state: &mut State, pos: StackPos) -> Self {
        let key = Self::register(state, pos);
        Self {
            lua: Some(lua.clone()),
            key,
        }
    }

    fn register(state: &mut State, pos: StackPos) -> RegistryKey {
        if pos == NO_POSITION || !state.is_acceptable(pos) {
            return RegistryKey::NoRef;
        }
        let mut checker = StackChecker::new(state);
        checker.push_copy(pos);
        checker.reference()
    }

    /// Releases the current slot and references the value at `pos` instead.
    pub fn reset(&mut self, lua: &Lua, state: &mut State, pos: StackPos) {
        self.release_in(state);
        self.lua = Some(lua.clone());
        self.key = Self::register(state, pos);
    }

    /// Releases the current slot; the handle stays connected but is nil.
    pub fn set_nil(&mut self) {
        if !self.key.owns_slot() {
            self.key = RegistryKey::RefNil;
            return;
        }
        if let Some(lua) = self.lua.clone() {
            self.release_in(&mut lua.state());
        }
    }

    fn release_in(&mut self, state: &mut State) {
        if self.key.owns_slot() {
            state.unreference(self.key);
        }
        self.key = RegistryKey::RefNil;
    }

    pub fn is_nil(&self) -> bool {
        !self.key.owns_slot()
    }

    pub fn key(&self) -> RegistryKey {
        self.key
    }

    pub fn connection(&self) -> Option<&Lua> {
        self.lua.as_ref()
    }

    /// Pushes the referenced value (`nil` if none). Ownership is unchanged.
    pub fn push_onto(&self, state: &mut State) {
        state.push_ref(self.key);
    }

    pub fn type_of(&self) -> TypeTag {
        match &self.lua {
            Some(lua) if self.key.owns_slot() => {
                let mut state = lua.state();
                state.push_ref(self.key);
                let tag = state.type_at(-1);
                state.pop(1);
                tag
            }
            _ => TypeTag::Nil,
        }
    }
}

impl Clone for RegistryHandle {
    fn clone(&self) -> Self {
        let key = match &self.lua {
            Some(lua) if self.key.owns_slot() => {
                let mut state = lua.state();
                state.push_ref(self.key);
                state.reference()
            }
            _ => self.key,
        };
        Self {
            lua: self.lua.clone(),
            key,
        }
    }
}

impl Default for RegistryHandle {
    fn default() -> Self {
        Self::nil()
    }
}

impl Drop for RegistryHandle {
    fn drop(&mut self) {
        if !self.key.owns_slot() {
            return;
        }
        let Some(lua) = &self.lua else {
            return;
        };
        match lua.try_state() {
            Ok(mut state) => state.unreference(self.key),
            Err(_) => warn!("registry: state busy, leaking {:?}", self.key),
        }
        trace!("registry handle dropped: {:?}", self.key);
    }
}

impl fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryHandle")
            .field("key", &self.key)
            .field("connected", &self.lua.is_some())
            .finish()
    }
}
