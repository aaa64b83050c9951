//! The evaluation-strategy-aware [`CallHook`] implementation: the one piece
//! that actually decides whether a call runs now, becomes a thunk, or is
//! served from the memoization cache.

use crate::cache::MemoCache;
use letin_gc::GarbageCollector;
use letin_value::consts::{EVAL_STRATEGY_LAZY, EVAL_STRATEGY_MEMO};
use letin_value::{LazyValue, Object, ObjectFlags, ObjectPayload, Ref, Value, ValueType};
use letin_vm::{CallHook, Functions, NativeHook, Result, RuntimeError, ThreadContext, Thrown};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::trace;

/// Evaluates letin functions under their declared per-function strategy
/// (`Function::eval_strategy`, a bitmask of `EVAL_STRATEGY_*`): eager calls
/// run immediately; lazy calls are wrapped as thunks (`LAZY`/`LOCKED_LAZY`
/// references) forced on first demand; memoized calls (`MEMO`, alone or
/// combined with `LAZY` — "composite" strategy) are served from
/// [`MemoCache`] after their first real evaluation.
pub struct EvalCallHook {
    cache: MemoCache,
    native: Arc<dyn NativeHook>,
    entry_counts: Mutex<FxHashMap<u32, u64>>,
}

impl EvalCallHook {
    pub fn new(native: Arc<dyn NativeHook>) -> Self {
        EvalCallHook { cache: MemoCache::new(), native, entry_counts: Mutex::new(FxHashMap::default()) }
    }

    pub fn cache(&self) -> &MemoCache {
        &self.cache
    }

    /// Number of times `fun_index`'s body has actually run (i.e. excluding
    /// cache hits and thunks that were never forced) — what the memoized
    /// fibonacci scenario measures.
    pub fn entry_count(&self, fun_index: u32) -> u64 {
        *self.entry_counts.lock().get(&fun_index).unwrap_or(&0)
    }

    fn pre_enter_to_fun(&self, fun_index: u32) {
        *self.entry_counts.lock().entry(fun_index).or_insert(0) += 1;
        trace!(fun_index, "entering function body");
    }

    fn post_leave_from_fun(&self, fun_index: u32) {
        trace!(fun_index, "left function body");
    }

    fn run_eagerly(
        &self,
        gc: &GarbageCollector,
        funcs: &dyn Functions,
        ctx: &ThreadContext,
        fun_index: u32,
        args: Vec<Value>,
    ) -> Result<Value> {
        self.pre_enter_to_fun(fun_index);
        let result = letin_vm::call(gc, funcs, ctx, self, self.native.as_ref(), fun_index, args);
        self.post_leave_from_fun(fun_index);
        result
    }

    /// Forces `v` and any lazy value it forces to, until a non-lazy value
    /// comes back. Each step takes and releases `MemoCache`'s force lock on
    /// its own, so forcing a thunk whose body forces another thunk doesn't
    /// try to reacquire the lock this frame is already holding.
    fn force_value(&self, gc: &GarbageCollector, funcs: &dyn Functions, ctx: &ThreadContext, v: Value) -> Result<Value> {
        let mut v = v;
        while let Value::LazyRef(r) | Value::LockedLazyRef(r) = v {
            v = self.force(gc, funcs, ctx, r)?;
        }
        Ok(v)
    }

    fn force_args(
        &self,
        gc: &GarbageCollector,
        funcs: &dyn Functions,
        ctx: &ThreadContext,
        args: Vec<Value>,
    ) -> Result<Vec<Value>> {
        args.into_iter().map(|v| self.force_value(gc, funcs, ctx, v)).collect()
    }

    /// A unique (linear) argument can't be safely reused from the cache: a
    /// later call with an equal-looking but distinct unique reference would
    /// get back a result keyed on a now-consumed object. A still-lazy
    /// argument at this point means forcing itself failed to settle it
    /// (shouldn't happen after `force_args`, but disable memo rather than
    /// key on an unsettled value).
    fn arg_disables_memo(&self, gc: &GarbageCollector, v: Value) -> bool {
        match v {
            Value::LazyRef(_) | Value::LockedLazyRef(_) => true,
            Value::Ref(r) => unsafe { gc.object(r) }.flags.unique,
            _ => false,
        }
    }
}

impl CallHook for EvalCallHook {
    fn call(
        &self,
        gc: &GarbageCollector,
        funcs: &dyn Functions,
        ctx: &ThreadContext,
        fun_index: u32,
        args: Vec<Value>,
    ) -> Result<Value> {
        let func = funcs.function(fun_index).ok_or_else(|| Thrown::new(RuntimeError::NoFun))?;
        let lazy = func.eval_strategy & EVAL_STRATEGY_LAZY != 0;
        let memo = func.eval_strategy & EVAL_STRATEGY_MEMO != 0;

        // Memoization keys on argument values, so they must be fully forced
        // first or two calls that are really the same call could hash to
        // different keys (or the same key for different lazy thunks).
        let (args, cacheable) = if memo {
            let forced = self.force_args(gc, funcs, ctx, args)?;
            let cacheable = !forced.iter().any(|v| self.arg_disables_memo(gc, *v));
            (forced, cacheable)
        } else {
            (args, false)
        };

        if memo && cacheable {
            if let Some(cached) = self.cache.get(fun_index, &args) {
                return Ok(cached);
            }
        }

        if lazy {
            // A memoized+lazy ("composite") function must write its forced
            // value back somewhere every subsequent forcer can see, so it
            // becomes a locked thunk; a purely lazy one is an ordinary,
            // unshared thunk.
            let lazy_value = LazyValue::new(fun_index, args, ValueType::Ref, memo);
            let r = gc.allocate(Object::new(ObjectFlags::NONE, ObjectPayload::LazyValue(lazy_value)));
            return Ok(if memo { Value::LockedLazyRef(r) } else { Value::LazyRef(r) });
        }

        let result = self.run_eagerly(gc, funcs, ctx, fun_index, args.clone())?;
        if memo && cacheable {
            self.cache.insert(fun_index, &args, result);
        }
        Ok(result)
    }

    fn force(&self, gc: &GarbageCollector, funcs: &dyn Functions, ctx: &ThreadContext, r: Ref) -> Result<Value> {
        // SAFETY: `r` was produced by this hook's own `call`, which only
        // ever allocates `LazyValue` objects through this same collector.
        let snapshot = unsafe {
            let obj = gc.object(r);
            match &obj.payload {
                ObjectPayload::LazyValue(lv) if lv.forced => return Ok(lv.value),
                ObjectPayload::LazyValue(lv) => (lv.fun_index, lv.args.clone(), lv.must_be_shared),
                _ => return Err(Thrown::new(RuntimeError::IncorrectObject)),
            }
        };

        let guard = self.cache.lock_for_force();
        // Re-check: another thread may have forced this exact thunk while
        // we were waiting for the lock.
        unsafe {
            if let ObjectPayload::LazyValue(lv) = &gc.object(r).payload {
                if lv.forced {
                    return Ok(lv.value);
                }
            }
        }

        let (fun_index, args, must_be_shared) = snapshot;
        let result = self.run_eagerly(gc, funcs, ctx, fun_index, args)?;
        // Release before possibly forcing a nested thunk through this same
        // lock — it guards "is this one ref forced yet", not reentrant.
        drop(guard);
        let result = self.force_value(gc, funcs, ctx, result)?;

        if must_be_shared {
            // SAFETY: see above.
            unsafe {
                if let ObjectPayload::LazyValue(lv) = &mut gc.object_mut(r).payload {
                    lv.forced = true;
                    lv.value = result;
                }
            }
        }
        Ok(result)
    }
}
