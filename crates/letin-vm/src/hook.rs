//! Seams the interpreter calls through instead of owning evaluation-strategy
//! or native-function dispatch itself. `letin-eval` and `letin-native`
//! provide the real implementations; [`EagerCallHook`] is a minimal one good
//! enough for this crate's own unit tests (strict call-by-value, no lazy
//! forcing, no native functions).

use crate::error::{Result, RuntimeError, Thrown};
use crate::program::Functions;
use crate::thread::ThreadContext;
use letin_gc::GarbageCollector;
use letin_value::{Ref, Value};

/// How a `CALL` (`ICALL`/`FCALL`/`RCALL`) and a forced lazy reference are
/// actually evaluated — eager recursion, by default, but `letin-eval`
/// substitutes lazy/memoized handling per callee without `letin-vm` knowing
/// strategy exists.
pub trait CallHook: Send + Sync {
    fn call(
        &self,
        gc: &GarbageCollector,
        funcs: &dyn Functions,
        ctx: &ThreadContext,
        fun_index: u32,
        args: Vec<Value>,
    ) -> Result<Value>;

    fn force(&self, gc: &GarbageCollector, funcs: &dyn Functions, ctx: &ThreadContext, r: Ref) -> Result<Value>;
}

/// Dispatch for `INCALL`/`FNCALL`/`RNCALL`, implemented by `letin-native`.
pub trait NativeHook: Send + Sync {
    fn call_native(&self, gc: &GarbageCollector, ctx: &ThreadContext, index: u32, args: Vec<Value>) -> Result<Value>;
}

/// Strict, non-lazy evaluation: every call runs immediately and a forced
/// reference that isn't already a plain object is an error. Used by this
/// crate's own tests; real programs run under `letin-eval`'s strategy-aware
/// hook instead.
pub struct EagerCallHook;

impl CallHook for EagerCallHook {
    fn call(
        &self,
        gc: &GarbageCollector,
        funcs: &dyn Functions,
        ctx: &ThreadContext,
        fun_index: u32,
        args: Vec<Value>,
    ) -> Result<Value> {
        crate::interp::call(gc, funcs, ctx, self, &NoNativeHook, fun_index, args)
    }

    fn force(&self, _gc: &GarbageCollector, _funcs: &dyn Functions, _ctx: &ThreadContext, _r: Ref) -> Result<Value> {
        Err(Thrown::new(RuntimeError::IncorrectValue))
    }
}

pub(crate) struct NoNativeHook;

impl NativeHook for NoNativeHook {
    fn call_native(&self, _gc: &GarbageCollector, _ctx: &ThreadContext, _index: u32, _args: Vec<Value>) -> Result<Value> {
        Err(Thrown::new(RuntimeError::NoNativeFun))
    }
}
