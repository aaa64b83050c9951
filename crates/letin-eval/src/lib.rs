//! Evaluation strategy on top of `letin-vm`'s interpreter (§4.3): eager,
//! lazy, memoized, and composite (lazy+memoized) function calls, selected
//! per function by `Function::eval_strategy`.

mod cache;
mod hook;
mod key;

pub use cache::MemoCache;
pub use hook::EvalCallHook;
pub use key::Key;

#[cfg(test)]
mod tests {
    use super::*;
    use letin_gc::{GarbageCollector, GcConfig};
    use letin_value::consts::{EVAL_STRATEGY_LAZY, EVAL_STRATEGY_MEMO};
    use letin_value::Value;
    use letin_vm::{Arg, CallHook, Function, Functions, Instr, InstrKind, NativeHook, Op, Result, RuntimeError, Thrown, ThreadContext};
    use std::sync::Arc;

    struct NoNative;
    impl NativeHook for NoNative {
        fn call_native(&self, _gc: &GarbageCollector, _ctx: &ThreadContext, _i: u32, _a: Vec<Value>) -> Result<Value> {
            Err(Thrown::new(RuntimeError::NoNativeFun))
        }
    }

    fn imm(v: i64) -> Arg {
        Arg::Imm(v)
    }

    /// fib(n): the classic doubly-recursive definition, used both as a plain
    /// correctness check and, under `EVAL_STRATEGY_MEMO`, to confirm the
    /// cache collapses repeated sub-calls to a single body entry each.
    fn fib_function(eval_strategy: u32) -> Function {
        // 0: let base = (n <= 1)
        // 1: jc base -> 7 (return n directly)
        // 2: arg (n - 1); 3: let a = fib(n - 1)   -- ICALL to self, fun index 0
        // 4: arg (n - 2); 5: let b = fib(n - 2)
        // 6: ret (a + b)
        // 7: ret n
        let instrs = vec![
            Instr { kind: InstrKind::Let, op: Op::ILe, arg1: Arg::Arg(0), arg2: imm(1), local_var_count: 1 },
            Instr { kind: InstrKind::Jc, op: Op::ILoad, arg1: Arg::LocalVar(0), arg2: imm(7), local_var_count: 0 },
            Instr { kind: InstrKind::Arg, op: Op::ISub, arg1: Arg::Arg(0), arg2: imm(1), local_var_count: 0 },
            Instr { kind: InstrKind::Let, op: Op::ICall, arg1: imm(0), arg2: imm(0), local_var_count: 1 },
            Instr { kind: InstrKind::Arg, op: Op::ISub, arg1: Arg::Arg(0), arg2: imm(2), local_var_count: 0 },
            Instr { kind: InstrKind::Let, op: Op::ICall, arg1: imm(0), arg2: imm(0), local_var_count: 1 },
            Instr { kind: InstrKind::Ret, op: Op::IAdd, arg1: Arg::LocalVar(1), arg2: Arg::LocalVar(2), local_var_count: 0 },
            Instr { kind: InstrKind::Ret, op: Op::ILoad, arg1: Arg::Arg(0), arg2: imm(0), local_var_count: 0 },
        ];
        Function::new(1, instrs, eval_strategy)
    }

    struct FibFuncs(Function);
    impl Functions for FibFuncs {
        fn function(&self, index: u32) -> Option<&Function> {
            (index == 0).then_some(&self.0)
        }
        fn global_var(&self, _index: u32) -> Option<Value> {
            None
        }
        fn fun_count(&self) -> usize {
            1
        }
    }

    #[test]
    fn eager_fib_computes_correct_values() {
        let funcs = FibFuncs(fib_function(0));
        let gc = GarbageCollector::new(GcConfig::default());
        let ctx = ThreadContext::new();
        let hook = EvalCallHook::new(Arc::new(NoNative));
        let result = hook.call(&gc, &funcs, &ctx, 0, vec![Value::Int(10)]).unwrap();
        assert_eq!(result, Value::Int(55));
    }

    #[test]
    fn memoized_fib_of_20_enters_the_body_exactly_21_times() {
        let funcs = FibFuncs(fib_function(EVAL_STRATEGY_MEMO));
        let gc = GarbageCollector::new(GcConfig::default());
        let ctx = ThreadContext::new();
        let hook = EvalCallHook::new(Arc::new(NoNative));
        let result = hook.call(&gc, &funcs, &ctx, 0, vec![Value::Int(20)]).unwrap();
        assert_eq!(result, Value::Int(6765));
        // fib(0..=20) is 21 distinct argument tuples; memoization means each
        // is computed exactly once no matter how many times it's demanded.
        assert_eq!(hook.entry_count(0), 21);
        assert_eq!(hook.cache().len(), 21);
    }

    #[test]
    fn lazy_call_returns_a_thunk_until_forced() {
        let funcs = FibFuncs(fib_function(EVAL_STRATEGY_LAZY));
        let gc = GarbageCollector::new(GcConfig::default());
        let ctx = ThreadContext::new();
        let hook = EvalCallHook::new(Arc::new(NoNative));
        let thunk = hook.call(&gc, &funcs, &ctx, 0, vec![Value::Int(6)]).unwrap();
        assert!(matches!(thunk, Value::LazyRef(_)));
        let r = match thunk {
            Value::LazyRef(r) => r,
            _ => unreachable!(),
        };
        let forced = hook.force(&gc, &funcs, &ctx, r).unwrap();
        assert_eq!(forced, Value::Int(8));
    }
}
