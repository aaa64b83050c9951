//! Dispatch for `INCALL`/`FNCALL`/`RNCALL`: the eight default native
//! functions at indices `0..=7`, plus whatever a loaded native library
//! registered starting at `MIN_UNRESERVED_NATIVE_FUN_INDEX` (1024, §6).

use crate::defaults;
use letin_gc::GarbageCollector;
use letin_value::consts::MIN_UNRESERVED_NATIVE_FUN_INDEX;
use letin_value::Value;
use letin_vm::{NativeHook, Result, RuntimeError, ThreadContext, Thrown};
use rustc_hash::FxHashMap;

type NativeFn = Box<dyn Fn(&GarbageCollector, Vec<Value>) -> Result<Value> + Send + Sync>;

/// The native-function table a [`VirtualMachine`](letin_vm) is started with.
/// Implements [`NativeHook`] directly; registering a function after start is
/// not supported (libraries are loaded up front, matching the original's
/// "load native libraries, then start" sequencing).
pub struct NativeTable {
    registered: FxHashMap<u32, NativeFn>,
}

impl NativeTable {
    pub fn new() -> Self {
        NativeTable { registered: FxHashMap::default() }
    }

    /// Register a native function at `index`. Indices below
    /// `MIN_UNRESERVED_NATIVE_FUN_INDEX` are reserved for the defaults and
    /// refused to prevent a library from shadowing them.
    pub fn register(
        &mut self,
        index: u32,
        f: impl Fn(&GarbageCollector, Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    ) -> std::result::Result<(), u32> {
        if index < MIN_UNRESERVED_NATIVE_FUN_INDEX {
            return Err(index);
        }
        self.registered.insert(index, Box::new(f));
        Ok(())
    }
}

impl Default for NativeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeHook for NativeTable {
    fn call_native(
        &self,
        gc: &GarbageCollector,
        _ctx: &ThreadContext,
        index: u32,
        args: Vec<Value>,
    ) -> Result<Value> {
        match index {
            0 => defaults::atoi(gc, args),
            1 => defaults::itoa(gc, args),
            2 => defaults::atof(gc, args),
            3 => defaults::ftoa(gc, args),
            4 => defaults::get_char(gc, args),
            5 => defaults::put_char(gc, args),
            6 => defaults::get_line(gc, args),
            7 => defaults::put_string(gc, args),
            other => match self.registered.get(&other) {
                Some(f) => f(gc, args),
                None => Err(Thrown::new(RuntimeError::NoNativeFun)),
            },
        }
    }
}
