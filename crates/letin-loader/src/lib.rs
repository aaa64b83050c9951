//! Loads and links letin module files (§4.5): parses the on-disk, big-endian
//! format into functions and global variables, computes each module's
//! offset in the combined address space, and applies relocations so a
//! cross-module call or global-variable reference resolves correctly
//! regardless of load order.

mod environment;
mod error;
mod format;
mod linker;

pub use environment::Environment;
pub use error::{LoaderError, ModuleError, Result};
pub use format::{parse_module, write_module, RawFunction, RawModule, RawReloc, RelocKind, Slot};
pub use linker::link_modules;

use std::path::Path;

pub fn load_module_file(path: &Path) -> Result<RawModule> {
    let bytes = std::fs::read(path)?;
    parse_module(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use letin_value::Value;
    use letin_vm::{Arg, Function, Functions, Instr, InstrKind, Op};
    use rustc_hash::FxHashMap;

    fn imm(v: i64) -> Arg {
        Arg::Imm(v)
    }

    #[test]
    fn parse_module_round_trips_through_write_module() {
        let instrs = vec![Instr {
            kind: InstrKind::Ret,
            op: Op::IAdd,
            arg1: imm(1),
            arg2: imm(2),
            local_var_count: 0,
        }];
        let raw = RawModule {
            functions: vec![RawFunction { arg_count: 0, eval_strategy: 0, instrs }],
            global_vars: vec![Value::Int(42)],
            fun_syms: vec![("main".into(), 0)],
            var_syms: vec![],
            relocs: vec![],
            entry_fun_sym: Some("main".into()),
            relocatable: true,
        };
        let bytes = write_module(&raw);
        let back = parse_module(&bytes).unwrap();
        assert_eq!(back.functions.len(), 1);
        assert_eq!(back.functions[0].instrs.len(), 1);
        assert_eq!(back.global_vars, vec![Value::Int(42)]);
        assert_eq!(back.fun_syms, vec![("main".to_string(), 0)]);
        assert_eq!(back.entry_fun_sym.as_deref(), Some("main"));
    }

    #[test]
    fn duplicate_function_symbol_across_modules_is_rejected() {
        let module = |sym: &str| RawModule {
            functions: vec![RawFunction {
                arg_count: 0,
                eval_strategy: 0,
                instrs: vec![Instr { kind: InstrKind::Ret, op: Op::ILoad, arg1: imm(0), arg2: imm(0), local_var_count: 0 }],
            }],
            global_vars: vec![],
            fun_syms: vec![(sym.to_string(), 0)],
            var_syms: vec![],
            relocs: vec![],
            entry_fun_sym: None,
            relocatable: true,
        };
        let err = link_modules(vec![module("dup"), module("dup")], &FxHashMap::default()).unwrap_err();
        let LoaderError::Modules { errors } = err else { panic!("expected Modules, got {err:?}") };
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0].error, LoaderError::FunSym(name) if name == "dup"));
        assert_eq!(errors[0].module, 1);
    }

    /// Module A exports function `a` returning global var `x` (set to 1);
    /// module B exports function `b` that calls `a` *by symbol* and adds
    /// its own global var `y` (set to 1), resolved through a `SymFun`
    /// relocation rather than a local offset shift — the only way a call
    /// can cross a module boundary at all.
    #[test]
    fn cross_module_call_and_global_var_resolve_after_linking() {
        let module_a = RawModule {
            functions: vec![RawFunction {
                arg_count: 0,
                eval_strategy: 0,
                instrs: vec![Instr {
                    kind: InstrKind::Ret,
                    op: Op::ILoad,
                    arg1: Arg::GlobalVar(0),
                    arg2: imm(0),
                    local_var_count: 0,
                }],
            }],
            global_vars: vec![Value::Int(1)],
            fun_syms: vec![("a".into(), 0)],
            var_syms: vec![("x".into(), 0)],
            relocs: vec![],
            entry_fun_sym: None,
            relocatable: true,
        };

        let module_b = RawModule {
            functions: vec![RawFunction {
                arg_count: 0,
                eval_strategy: 0,
                instrs: vec![
                    // placeholder target; relocated to "a"'s global index below
                    Instr { kind: InstrKind::Let, op: Op::ICall, arg1: imm(0), arg2: imm(0), local_var_count: 1 },
                    Instr {
                        kind: InstrKind::Ret,
                        op: Op::IAdd,
                        arg1: Arg::LocalVar(0),
                        arg2: Arg::GlobalVar(0),
                        local_var_count: 0,
                    },
                ],
            }],
            global_vars: vec![Value::Int(1)],
            fun_syms: vec![("b".into(), 0)],
            var_syms: vec![("y".into(), 0)],
            relocs: vec![
                RawReloc { kind: RelocKind::SymFun("a".into()), fun_index: 0, instr_index: 0, slot: Slot::Arg1 },
                RawReloc { kind: RelocKind::GlobalVar, fun_index: 0, instr_index: 1, slot: Slot::Arg2 },
            ],
            entry_fun_sym: Some("b".into()),
            relocatable: true,
        };

        let env = link_modules(vec![module_a, module_b], &FxHashMap::default()).unwrap();
        let b_index = env.fun_index_of("b").unwrap();
        assert_eq!(env.entry_fun_index(), Some(b_index));

        let gc = letin_gc::GarbageCollector::new(letin_gc::GcConfig::default());
        let ctx = letin_vm::ThreadContext::new();
        let result =
            letin_vm::call(&gc, &env, &ctx, &letin_vm::EagerCallHook, &NoNative, b_index, vec![]).unwrap();
        assert_eq!(result, Value::Int(2));
    }

    #[test]
    fn unresolved_symbolic_relocation_reports_no_fun_sym() {
        let module_b = RawModule {
            functions: vec![RawFunction {
                arg_count: 0,
                eval_strategy: 0,
                instrs: vec![Instr { kind: InstrKind::Let, op: Op::ICall, arg1: imm(0), arg2: imm(0), local_var_count: 1 }],
            }],
            global_vars: vec![],
            fun_syms: vec![],
            var_syms: vec![],
            relocs: vec![RawReloc {
                kind: RelocKind::SymFun("missing".into()),
                fun_index: 0,
                instr_index: 0,
                slot: Slot::Arg1,
            }],
            entry_fun_sym: None,
            relocatable: true,
        };

        let err = link_modules(vec![module_b], &FxHashMap::default()).unwrap_err();
        let LoaderError::Modules { errors } = err else { panic!("expected Modules, got {err:?}") };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].module, 0);
        assert!(matches!(&errors[0].error, LoaderError::NoFunSym(name) if name == "missing"));
    }

    #[test]
    fn non_first_module_without_relocatable_flag_reports_no_reloc() {
        let module = |relocatable: bool| RawModule {
            functions: vec![RawFunction {
                arg_count: 0,
                eval_strategy: 0,
                instrs: vec![Instr { kind: InstrKind::Ret, op: Op::ILoad, arg1: imm(0), arg2: imm(0), local_var_count: 0 }],
            }],
            global_vars: vec![],
            fun_syms: vec![],
            var_syms: vec![],
            relocs: vec![],
            entry_fun_sym: None,
            relocatable,
        };

        let err = link_modules(vec![module(true), module(false)], &FxHashMap::default()).unwrap_err();
        let LoaderError::Modules { errors } = err else { panic!("expected Modules, got {err:?}") };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].module, 1);
        assert!(matches!(errors[0].error, LoaderError::NoReloc));
    }

    #[test]
    fn multiple_modules_each_report_their_own_error() {
        let module = |sym: &str| RawModule {
            functions: vec![RawFunction {
                arg_count: 0,
                eval_strategy: 0,
                instrs: vec![Instr { kind: InstrKind::Ret, op: Op::ILoad, arg1: imm(0), arg2: imm(0), local_var_count: 0 }],
            }],
            global_vars: vec![],
            fun_syms: vec![(sym.to_string(), 0)],
            var_syms: vec![],
            relocs: vec![RawReloc {
                kind: RelocKind::SymFun("nope".into()),
                fun_index: 0,
                instr_index: 0,
                slot: Slot::Arg1,
            }],
            entry_fun_sym: None,
            relocatable: true,
        };

        let err = link_modules(vec![module("p"), module("q")], &FxHashMap::default()).unwrap_err();
        let LoaderError::Modules { errors } = err else { panic!("expected Modules, got {err:?}") };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].module, 0);
        assert_eq!(errors[1].module, 1);
    }

    struct NoNative;
    impl letin_vm::NativeHook for NoNative {
        fn call_native(
            &self,
            _gc: &letin_gc::GarbageCollector,
            _ctx: &letin_vm::ThreadContext,
            _index: u32,
            _args: Vec<Value>,
        ) -> letin_vm::Result<Value> {
            Err(letin_vm::Thrown::new(letin_vm::RuntimeError::NoNativeFun))
        }
    }
}
