use std::{
    collections::HashSet,
    fs,
    io::{self, Write},
    path::Path,
    rc::Rc,
};

use log::{debug, warn};

use crate::{
    frontend::{self, Chunk},
    runtime::{
        builtins,
        chunk_cache::ChunkCache,
        closure::Closure,
        config::RuntimeConfig,
        error_code::ErrorCode,
        fault::Fault,
        function::Function,
        leak_detector,
        registry::{Registry, RegistryKey},
        scope::Scope,
        table::TableRef,
        table_key::TableKey,
        value::{TypeTag, Value},
    },
};

/// Position on the value stack: `1..=top` from the bottom, `-1..=-top` from
/// the top.
pub type StackPos = i32;

/// The "no acceptable position" sentinel.
pub const NO_POSITION: StackPos = 0;

/// Chunk and line of the code currently executing, used to locate errors.
#[derive(Debug, Clone)]
pub(crate) struct Location {
    pub chunk: Rc<str>,
    pub line: usize,
}

impl Location {
    fn host() -> Self {
        Self {
            chunk: Rc::from("?"),
            line: 0,
        }
    }
}

/// One runtime instance: value stack, registry, globals and interpreter.
///
/// Positions follow the usual embedding conventions. Operations that may run
/// metamethods return `Result<_, Fault>`; loading and protected calls return
/// an [`ErrorCode`] and leave exactly one error value on the stack on failure.
pub struct State {
    pub(crate) stack: Vec<Value>,
    pub(crate) registry: Registry,
    pub(crate) globals: TableRef,
    pub(crate) config: RuntimeConfig,
    pub(crate) cache: ChunkCache,
    pub(crate) call_depth: usize,
    pub(crate) location: Location,
    output: Option<String>,
}

impl State {
    pub fn new(config: RuntimeConfig) -> Self {
        leak_detector::record_state();
        let output = config.capture_output.then(String::new);
        let mut state = Self {
            stack: Vec::with_capacity(64),
            registry: Registry::new(),
            globals: TableRef::new(),
            config,
            cache: ChunkCache::new(),
            call_depth: 0,
            location: Location::host(),
            output,
        };
        if state.config.open_libs {
            builtins::open_base(&mut state);
        }
        state
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn globals(&self) -> TableRef {
        self.globals.clone()
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    // Stack positions

    pub fn top(&self) -> StackPos {
        self.stack.len() as StackPos
    }

    /// Non-negative: absolute new top (grows with `nil`); negative: relative
    /// to the current top (`-1` keeps it unchanged).
    pub fn set_top(&mut self, top: StackPos) {
        let new_len = if top >= 0 {
            top as usize
        } else {
            (self.top() + top + 1).max(0) as usize
        };
        self.stack.resize(new_len, Value::Nil);
    }

    /// Converts a relative position to an absolute one. The result is not
    /// range-checked.
    pub fn abs_index(&self, pos: StackPos) -> StackPos {
        if pos < 0 { self.top() + 1 + pos } else { pos }
    }

    pub fn is_acceptable(&self, pos: StackPos) -> bool {
        let abs = self.abs_index(pos);
        abs >= 1 && abs <= self.top()
    }

    /// Whether `extra` more values fit under `max_stack_size`.
    pub fn check_stack(&self, extra: usize) -> bool {
        self.stack.len() + extra <= self.config.max_stack_size
    }

    // Pushing and popping

    pub fn push(&mut self, value: impl Into<Value>) {
        self.push_value(value.into());
    }

    pub fn push_value(&mut self, value: Value) {
        if self.stack.len() >= self.config.max_stack_size {
            warn!(
                "value stack above its configured size ({} slots)",
                self.config.max_stack_size
            );
        }
        self.stack.push(value);
    }

    pub fn push_nil(&mut self) {
        self.push_value(Value::Nil);
    }

    /// Pushes a copy of the value at `pos` (`nil` if unacceptable).
    pub fn push_copy(&mut self, pos: StackPos) {
        let value = self.value_at(pos);
        self.push_value(value);
    }

    pub fn pop(&mut self, n: usize) {
        let new_len = self.stack.len().saturating_sub(n);
        self.stack.truncate(new_len);
    }

    pub(crate) fn pop_value(&mut self) -> Value {
        self.stack.pop().unwrap_or_default()
    }

    /// Removes the value at `pos`, shifting the ones above it down.
    pub fn remove(&mut self, pos: StackPos) {
        if let Some(index) = self.slot(pos) {
            self.stack.remove(index);
        }
    }

    /// Moves the top value into `pos`, shifting the ones above it up.
    pub fn insert(&mut self, pos: StackPos) {
        if let Some(index) = self.slot(pos) {
            let value = self.pop_value();
            self.stack.insert(index, value);
        }
    }

    /// Pops the top value into `pos`.
    pub fn replace(&mut self, pos: StackPos) {
        if let Some(index) = self.slot(pos) {
            let value = self.pop_value();
            if index < self.stack.len() {
                self.stack[index] = value;
            }
        }
    }

    fn slot(&self, pos: StackPos) -> Option<usize> {
        self.is_acceptable(pos)
            .then(|| (self.abs_index(pos) - 1) as usize)
    }

    // Reading

    pub fn type_at(&self, pos: StackPos) -> TypeTag {
        self.value_ref(pos).map_or(TypeTag::Nil, Value::type_tag)
    }

    pub fn value_at(&self, pos: StackPos) -> Value {
        self.value_ref(pos).cloned().unwrap_or_default()
    }

    pub(crate) fn value_ref(&self, pos: StackPos) -> Option<&Value> {
        self.slot(pos).map(|index| &self.stack[index])
    }

    pub fn to_boolean(&self, pos: StackPos) -> bool {
        self.value_ref(pos).is_some_and(Value::is_truthy)
    }

    pub fn to_integer(&self, pos: StackPos) -> Option<i64> {
        self.value_ref(pos)?.to_integer()
    }

    pub fn to_number(&self, pos: StackPos) -> Option<f64> {
        self.value_ref(pos)?.to_number()
    }

    pub fn to_str(&self, pos: StackPos) -> Option<Rc<str>> {
        self.value_ref(pos)?.to_str()
    }

    /// Equality without metamethods; `false` if either position is unacceptable.
    pub fn raw_equal(&self, a: StackPos, b: StackPos) -> bool {
        match (self.value_ref(a), self.value_ref(b)) {
            (Some(a), Some(b)) => a.raw_equals(b),
            _ => false,
        }
    }

    // Tables

    pub fn new_table(&mut self) {
        self.push_value(Value::Table(TableRef::new()));
    }

    /// Pops a key and pushes `t[key]`, honouring `__index`.
    pub fn get_table(&mut self, pos: StackPos) -> Result<(), Fault> {
        let target = self.value_at(pos);
        let key = self.pop_value();
        let value = self.index_value(&target, &key)?;
        self.push_value(value);
        Ok(())
    }

    pub fn get_field(&mut self, pos: StackPos, name: &str) -> Result<(), Fault> {
        let target = self.value_at(pos);
        let value = self.index_value(&target, &Value::string(name))?;
        self.push_value(value);
        Ok(())
    }

    /// Pops a value and a key (value on top) and assigns `t[key] = value`,
    /// honouring `__newindex`.
    pub fn set_table(&mut self, pos: StackPos) -> Result<(), Fault> {
        let target = self.value_at(pos);
        let value = self.pop_value();
        let key = self.pop_value();
        self.set_index(&target, key, value)
    }

    pub fn set_field(&mut self, pos: StackPos, name: &str) -> Result<(), Fault> {
        let target = self.value_at(pos);
        let value = self.pop_value();
        self.set_index(&target, Value::string(name), value)
    }

    /// Pops a key and pushes the raw `t[key]`; `nil` for non-tables.
    pub fn raw_get(&mut self, pos: StackPos) {
        let target = self.value_at(pos);
        let key = self.pop_value();
        let value = match (&target, TableKey::from_value(&key)) {
            (Value::Table(table), Ok(key)) => table.get(&key),
            _ => Value::Nil,
        };
        self.push_value(value);
    }

    /// Pops a value and a key and assigns them without metamethods.
    pub fn raw_set(&mut self, pos: StackPos) -> Result<(), Fault> {
        let target = self.value_at(pos);
        let value = self.pop_value();
        let key = self.pop_value();
        let Value::Table(table) = target else {
            return Err(self.error(format!(
                "attempt to index a {} value",
                target.type_name()
            )));
        };
        let key = TableKey::from_value(&key).map_err(|e| self.error(e.message()))?;
        table.set(key, value);
        Ok(())
    }

    /// Length without metamethods: border of tables, byte length of strings.
    pub fn raw_len(&self, pos: StackPos) -> usize {
        match self.value_ref(pos) {
            Some(Value::Table(table)) => table.borrow().len() as usize,
            Some(Value::String(s)) => s.len(),
            _ => 0,
        }
    }

    /// Pushes the metatable of the value at `pos`; `false` (nothing pushed) if
    /// it has none.
    pub fn get_metatable(&mut self, pos: StackPos) -> bool {
        match self.metatable_of(&self.value_at(pos)) {
            Some(metatable) => {
                self.push_value(Value::Table(metatable));
                true
            }
            None => false,
        }
    }

    /// Pops a table (or `nil`) and installs it as the metatable of the table
    /// at `pos`. Returns `false` if the target is not a table or the popped
    /// value is neither table nor `nil`.
    pub fn set_metatable(&mut self, pos: StackPos) -> bool {
        let target = self.value_at(pos);
        let metatable = self.pop_value();
        let Value::Table(table) = target else {
            return false;
        };
        match metatable {
            Value::Nil => table.borrow_mut().set_metatable(None),
            Value::Table(mt) => table.borrow_mut().set_metatable(Some(mt)),
            _ => return false,
        }
        true
    }

    /// Pushes the environment table of the function at `pos`. Builtins report
    /// the globals table; non-functions push `nil`.
    pub fn get_env(&mut self, pos: StackPos) {
        let env = match self.value_at(pos) {
            Value::Function(function) => {
                Value::Table(function.env().unwrap_or_else(|| self.globals.clone()))
            }
            _ => Value::Nil,
        };
        self.push_value(env);
    }

    /// Pops a table and makes it the environment of the function at `pos`.
    pub fn set_env(&mut self, pos: StackPos) -> bool {
        let target = self.value_at(pos);
        let env = self.pop_value();
        match (target, env) {
            (Value::Function(function), Value::Table(env)) => function.set_env(env),
            _ => false,
        }
    }

    // Registry

    /// Pops the top value into a new registry slot.
    pub fn reference(&mut self) -> RegistryKey {
        let value = self.pop_value();
        self.registry.reference(value)
    }

    pub fn unreference(&mut self, key: RegistryKey) {
        self.registry.release(key);
    }

    /// Pushes the value behind `key` (`nil` for non-owning keys).
    pub fn push_ref(&mut self, key: RegistryKey) {
        let value = self.registry.get(key);
        self.push_value(value);
    }

    pub fn registry_outstanding(&self) -> usize {
        self.registry.outstanding()
    }

    // Globals

    pub fn get_global(&mut self, name: &str) -> Result<(), Fault> {
        let globals = Value::Table(self.globals.clone());
        let value = self.index_value(&globals, &Value::string(name))?;
        self.push_value(value);
        Ok(())
    }

    /// Pops a value into the global `name`.
    pub fn set_global(&mut self, name: &str) -> Result<(), Fault> {
        let globals = Value::Table(self.globals.clone());
        let value = self.pop_value();
        self.set_index(&globals, Value::string(name), value)
    }

    // Loading and calling

    /// Parses `source` and pushes it as a function, or pushes the message and
    /// returns [`ErrorCode::SyntaxError`].
    pub fn load_string(&mut self, source: &str, chunk_name: &str) -> ErrorCode {
        debug!("loading chunk {}", chunk_name);
        let parsed = if self.config.cache_chunks {
            self.cache.get_or_parse(source, chunk_name)
        } else {
            frontend::parse_chunk(source, chunk_name)
        };

        match parsed {
            Ok(chunk) => {
                self.push_chunk(chunk);
                ErrorCode::NoError
            }
            Err(error) => {
                debug!("syntax error in {}: {}", chunk_name, error.message);
                self.push_value(Value::from(error.to_string()));
                ErrorCode::SyntaxError
            }
        }
    }

    /// Reads and parses a file; a missing file yields [`ErrorCode::FileError`]
    /// with `cannot open <path>`.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> ErrorCode {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(source) => self.load_string(&source, &path.display().to_string()),
            Err(error) => {
                debug!("cannot open {}: {}", path.display(), error);
                self.push_value(Value::from(format!("cannot open {}", path.display())));
                ErrorCode::FileError
            }
        }
    }

    fn push_chunk(&mut self, chunk: Chunk) {
        let closure = Closure::new(
            chunk.function,
            Scope::root(),
            self.globals.clone(),
            Rc::from(chunk.name),
        );
        self.push_value(Value::Function(Rc::new(Function::Closure(closure))));
    }

    /// Calls the function below the top `nargs` values in protected mode.
    ///
    /// Function and arguments are popped. On success the results are pushed
    /// (adjusted to `nresults` when given); on failure exactly one error value
    /// is pushed and its code returned.
    pub fn pcall(&mut self, nargs: usize, nresults: Option<usize>) -> ErrorCode {
        if self.stack.len() < nargs + 1 {
            debug_assert!(false, "pcall with {} arguments on a stack of {}", nargs, self.stack.len());
            warn!("pcall: not enough values on the stack");
            self.push_value(Value::string("attempt to call a nil value"));
            return ErrorCode::RuntimeError;
        }

        let func_index = self.stack.len() - nargs - 1;
        let args = self.stack.split_off(func_index + 1);
        let callee = self.pop_value();

        let depth = self.call_depth;
        let location = self.location.clone();
        let outcome = self.call_value(&callee, args);
        self.call_depth = depth;
        self.location = location;

        match outcome {
            Ok(mut results) => {
                if let Some(n) = nresults {
                    results.resize(n, Value::Nil);
                }
                if !self.check_stack(results.len()) {
                    self.push_value(Value::string("stack overflow"));
                    return ErrorCode::RuntimeError;
                }
                self.stack.extend(results);
                ErrorCode::NoError
            }
            Err(fault) => {
                self.push_value(fault.value);
                fault.code
            }
        }
    }

    // Output

    /// Sink for `print`: the capture buffer, or stdout.
    pub(crate) fn write_output(&mut self, text: &str) {
        match &mut self.output {
            Some(buffer) => buffer.push_str(text),
            None => {
                let mut stdout = io::stdout().lock();
                let _ = stdout.write_all(text.as_bytes());
            }
        }
    }

    /// Drains the captured `print` output (empty when capture is off).
    pub fn take_output(&mut self) -> String {
        self.output.as_mut().map(std::mem::take).unwrap_or_default()
    }
}

/// Name used for chunks loaded from strings: the first line of the source,
/// shortened.
pub fn string_chunk_name(source: &str) -> String {
    const MAX_LEN: usize = 40;
    let first_line = source.lines().next().unwrap_or("");
    let truncated = first_line.len() < source.trim_end().len();
    if first_line.chars().count() > MAX_LEN || truncated {
        let short: String = first_line.chars().take(MAX_LEN).collect();
        format!("[string \"{}...\"]", short)
    } else {
        format!("[string \"{}\"]", first_line)
    }
}

impl Drop for State {
    /// Severs tables and captured variables reachable from the roots so
    /// reference cycles do not outlive the state.
    fn drop(&mut self) {
        let mut work: Vec<Value> = self.stack.drain(..).collect();
        work.extend(self.registry.values().cloned());
        work.push(Value::Table(self.globals.clone()));

        let mut seen_tables = HashSet::new();
        let mut seen_functions = HashSet::new();
        let mut seen_scopes = HashSet::new();
        let mut tables = Vec::new();
        let mut scopes = Vec::new();

        while let Some(value) = work.pop() {
            match value {
                Value::Table(table) => {
                    if !seen_tables.insert(table.id()) {
                        continue;
                    }
                    if let Ok(inner) = table.try_borrow() {
                        for (key, value) in inner.entries() {
                            work.push(key.to_value());
                            work.push(value.clone());
                        }
                        if let Some(metatable) = inner.metatable() {
                            work.push(Value::Table(metatable));
                        }
                    }
                    tables.push(table);
                }
                Value::Function(function) => {
                    if !seen_functions.insert(Rc::as_ptr(&function) as *const () as usize) {
                        continue;
                    }
                    if let Function::Closure(closure) = function.as_ref() {
                        if let Ok(env) = closure.env.try_borrow() {
                            work.push(Value::Table(env.clone()));
                        }
                        let mut scope = Some(closure.upvalues.clone());
                        while let Some(current) = scope {
                            if !seen_scopes.insert(Rc::as_ptr(&current) as usize) {
                                break;
                            }
                            for cell in current.cells() {
                                if let Ok(value) = cell.try_borrow() {
                                    work.push(value.clone());
                                }
                            }
                            scope = current.parent().cloned();
                            scopes.push(current);
                        }
                    }
                }
                _ => {}
            }
        }

        for table in tables {
            if let Ok(mut inner) = table.try_borrow_mut() {
                inner.clear();
            }
        }
        for scope in scopes {
            for cell in scope.cells() {
                if let Ok(mut value) = cell.try_borrow_mut() {
                    *value = Value::Nil;
                }
            }
        }
    }
}

