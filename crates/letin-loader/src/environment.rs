//! The linked program: every function and global variable from every loaded
//! module, addressed by one flat, post-relocation index space.

use letin_value::Value;
use letin_vm::{Function, Functions};
use rustc_hash::FxHashMap;

pub struct Environment {
    functions: Vec<Function>,
    global_vars: Vec<Value>,
    fun_symbols: FxHashMap<String, u32>,
    var_symbols: FxHashMap<String, u32>,
    entry_fun_index: Option<u32>,
}

impl Environment {
    pub(crate) fn new(
        functions: Vec<Function>,
        global_vars: Vec<Value>,
        fun_symbols: FxHashMap<String, u32>,
        var_symbols: FxHashMap<String, u32>,
        entry_fun_index: Option<u32>,
    ) -> Self {
        Environment { functions, global_vars, fun_symbols, var_symbols, entry_fun_index }
    }

    pub fn fun_index_of(&self, name: &str) -> Option<u32> {
        self.fun_symbols.get(name).copied()
    }

    pub fn var_index_of(&self, name: &str) -> Option<u32> {
        self.var_symbols.get(name).copied()
    }

    pub fn entry_fun_index(&self) -> Option<u32> {
        self.entry_fun_index
    }
}

impl Functions for Environment {
    fn function(&self, index: u32) -> Option<&Function> {
        self.functions.get(index as usize)
    }

    fn global_var(&self, index: u32) -> Option<Value> {
        self.global_vars.get(index as usize).copied()
    }

    fn fun_count(&self) -> usize {
        self.functions.len()
    }
}
