//! Wires a loaded environment, GC, native handler, and evaluation strategy
//! into a runnable program and implements the `start` contract (§6). This is
//! the Rust counterpart of `letin/main.cpp`'s setup sequence, minus argument
//! parsing and result printing — those live in the `letin-run` binary.

mod error;
mod vm;

pub use error::{Result, RuntimeError};
pub use vm::{EntryOutcome, VirtualMachine};

#[cfg(test)]
mod tests {
    use super::*;
    use letin_eval::EvalCallHook;
    use letin_gc::GcConfig;
    use letin_native::NativeTable;
    use letin_value::Value;
    use letin_vm::{Arg, Function, Functions, Instr, InstrKind, Op};
    use std::sync::Arc;

    struct OneFn(Function);

    impl Functions for OneFn {
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
    fn plain_entry_returns_its_value_directly() {
        // fn main(argv) = ret (length of argv as an rarray, cast trivially via 0 + arg-count stand-in)
        // kept simple: just return the constant 7 regardless of argv, to exercise
        // the one-argument (non-IO) start path end to end.
        let instrs =
            vec![Instr { kind: InstrKind::Ret, op: Op::ILoad, arg1: Arg::Imm(7), arg2: Arg::Imm(0), local_var_count: 0 }];
        let env: Arc<dyn Functions> = Arc::new(OneFn(Function::new(1, instrs, 0)));
        let native = Arc::new(NativeTable::new());
        let strategy = Arc::new(EvalCallHook::new(native.clone()));
        let vm = VirtualMachine::new(env, GcConfig::default(), native, strategy);
        let outcome = vm.start(0, &["prog".to_string(), "a".to_string()]).unwrap();
        assert_eq!(outcome, EntryOutcome::Value(Value::Int(7)));
    }
}
