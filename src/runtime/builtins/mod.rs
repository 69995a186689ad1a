use std::rc::Rc;

use crate::runtime::{
    builtin_function::BuiltinFunction, function::Function, state::State, value::Value,
};

mod base_ops;
mod helpers;
mod table_ops;

#[cfg(test)]
mod base_ops_test;
#[cfg(test)]
mod table_ops_test;

use base_ops::{
    builtin_assert, builtin_error, builtin_pcall, builtin_print, builtin_select, builtin_tonumber,
    builtin_tostring, builtin_type, builtin_unpack,
};
use table_ops::{
    builtin_getmetatable, builtin_ipairs, builtin_next, builtin_pairs, builtin_rawequal,
    builtin_rawget, builtin_rawlen, builtin_rawset, builtin_setmetatable,
};

/// The base library, installed as globals by [`open_base`].
pub static BUILTINS: &[BuiltinFunction] = &[
    BuiltinFunction {
        name: "print",
        func: builtin_print,
    },
    BuiltinFunction {
        name: "type",
        func: builtin_type,
    },
    BuiltinFunction {
        name: "tostring",
        func: builtin_tostring,
    },
    BuiltinFunction {
        name: "tonumber",
        func: builtin_tonumber,
    },
    BuiltinFunction {
        name: "error",
        func: builtin_error,
    },
    BuiltinFunction {
        name: "assert",
        func: builtin_assert,
    },
    BuiltinFunction {
        name: "pcall",
        func: builtin_pcall,
    },
    BuiltinFunction {
        name: "select",
        func: builtin_select,
    },
    BuiltinFunction {
        name: "unpack",
        func: builtin_unpack,
    },
    BuiltinFunction {
        name: "rawget",
        func: builtin_rawget,
    },
    BuiltinFunction {
        name: "rawset",
        func: builtin_rawset,
    },
    BuiltinFunction {
        name: "rawequal",
        func: builtin_rawequal,
    },
    BuiltinFunction {
        name: "rawlen",
        func: builtin_rawlen,
    },
    BuiltinFunction {
        name: "setmetatable",
        func: builtin_setmetatable,
    },
    BuiltinFunction {
        name: "getmetatable",
        func: builtin_getmetatable,
    },
    BuiltinFunction {
        name: "next",
        func: builtin_next,
    },
    BuiltinFunction {
        name: "pairs",
        func: builtin_pairs,
    },
    BuiltinFunction {
        name: "ipairs",
        func: builtin_ipairs,
    },
];

pub fn get_builtin(name: &str) -> Option<&'static BuiltinFunction> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// Installs [`BUILTINS`] and `_G` into the globals table.
pub fn open_base(state: &mut State) {
    let globals = state.globals();
    for builtin in BUILTINS {
        globals.set_str(
            builtin.name,
            Value::Function(Rc::new(Function::Builtin(builtin.clone()))),
        );
    }
    globals.set_str("_G", Value::Table(globals.clone()));
}
