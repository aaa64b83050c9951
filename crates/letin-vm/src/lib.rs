//! The stack-register hybrid bytecode interpreter (§4.2): instruction
//! encoding, the per-thread register file, and the dispatch loop itself.
//! Evaluation strategy (eager/lazy/memoized) and native-function dispatch
//! are deliberately kept out of this crate and reached through the
//! [`CallHook`]/[`NativeHook`] seams so this crate only has to know how to
//! run one instruction stream, not what laziness means.

mod error;
mod hook;
mod interp;
mod opcode;
mod program;
mod thread;

pub use error::{Result, RuntimeError, Thrown};
pub use hook::{CallHook, EagerCallHook, NativeHook};
pub use interp::call;
pub use opcode::{Arg, ArgType, DecodeError, Instr, InstrKind, Op};
pub use program::{Function, Functions};
pub use thread::{Registers, ThreadContext};

#[cfg(test)]
mod tests {
    use super::*;
    use letin_gc::{GarbageCollector, GcConfig};
    use letin_value::Value;

    struct FixedFunctions(Vec<Function>);

    impl Functions for FixedFunctions {
        fn function(&self, index: u32) -> Option<&Function> {
            self.0.get(index as usize)
        }
        fn global_var(&self, _index: u32) -> Option<Value> {
            None
        }
        fn fun_count(&self) -> usize {
            self.0.len()
        }
    }

    fn int(v: i64) -> Arg {
        Arg::Imm(v)
    }

    #[test]
    fn adds_two_immediates_and_returns() {
        // fn f() = ret (2 + 3)
        let instrs = vec![Instr {
            kind: InstrKind::Ret,
            op: Op::IAdd,
            arg1: int(2),
            arg2: int(3),
            local_var_count: 0,
        }];
        let funcs = FixedFunctions(vec![Function::new(0, instrs, 0)]);
        let gc = GarbageCollector::new(GcConfig::default());
        let ctx = ThreadContext::new();
        let result = call(&gc, &funcs, &ctx, &EagerCallHook, &hook::NoNativeHook, 0, vec![]).unwrap();
        assert_eq!(result, Value::Int(5));
    }

    #[test]
    fn tail_recursive_factorial_via_retry_stays_bounded() {
        // fn fact(n, acc):
        //   0: let c0 = (n <= 1)
        //   1: jc c0 -> 8 (ret)
        //   2: arg n
        //   3: arg (n - 1)
        //   4: arg acc
        //   5: arg (acc * n)
        //   (retry consumes the last two ARGs as the new (n, acc))
        let instrs = vec![
            Instr { kind: InstrKind::Let, op: Op::ILe, arg1: Arg::Arg(0), arg2: int(1), local_var_count: 1 },
            // offsets are relative to the instruction after the jump: ip=1, target=7 -> 1+1+6
            Instr { kind: InstrKind::Jc, arg1: Arg::LocalVar(0), arg2: int(6), op: Op::ILoad, local_var_count: 0 },
            Instr { kind: InstrKind::Arg, op: Op::ISub, arg1: Arg::Arg(0), arg2: int(1), local_var_count: 0 },
            Instr { kind: InstrKind::Arg, op: Op::IMul, arg1: Arg::Arg(1), arg2: Arg::Arg(0), local_var_count: 0 },
            Instr { kind: InstrKind::Retry, op: Op::ILoad, arg1: int(0), arg2: int(0), local_var_count: 0 },
            // same target (ip=5): 5+1+2 -> 8
            Instr { kind: InstrKind::Jump, op: Op::ILoad, arg1: int(2), arg2: int(0), local_var_count: 0 },
            Instr { kind: InstrKind::In, op: Op::ILoad, arg1: int(0), arg2: int(0), local_var_count: 0 },
            Instr { kind: InstrKind::In, op: Op::ILoad, arg1: int(0), arg2: int(0), local_var_count: 0 },
            Instr { kind: InstrKind::Ret, op: Op::ILoad, arg1: Arg::Arg(1), arg2: int(0), local_var_count: 0 },
        ];
        let funcs = FixedFunctions(vec![Function::new(2, instrs, 0)]);
        let gc = GarbageCollector::new(GcConfig::default());
        let ctx = ThreadContext::new();
        let result =
            call(&gc, &funcs, &ctx, &EagerCallHook, &hook::NoNativeHook, 0, vec![Value::Int(10), Value::Int(1)])
                .unwrap();
        assert_eq!(result, Value::Int(3628800));
    }

    #[test]
    fn try_catches_division_by_zero_and_binds_the_error_code() {
        // try { ret (1 / 0) } catch e { ret e }
        let instrs = vec![
            Instr { kind: InstrKind::Try, op: Op::ILoad, arg1: int(2), arg2: int(0), local_var_count: 0 },
            Instr { kind: InstrKind::Ret, op: Op::IDiv, arg1: int(1), arg2: int(0), local_var_count: 0 },
            Instr { kind: InstrKind::Ret, op: Op::ILoad, arg1: Arg::LocalVar(0), arg2: int(0), local_var_count: 0 },
        ];
        let funcs = FixedFunctions(vec![Function::new(0, instrs, 0)]);
        let gc = GarbageCollector::new(GcConfig::default());
        let ctx = ThreadContext::new();
        let result = call(&gc, &funcs, &ctx, &EagerCallHook, &hook::NoNativeHook, 0, vec![]).unwrap();
        assert_eq!(result, Value::Int(RuntimeError::DivByZero.as_i32() as i64));
    }

    #[test]
    fn nested_let_blocks_compute_a_four_argument_expression() {
        // fn f(a, b, c, d):
        //   let l0 = a + b; let l1 = c * c; in
        //   let l2 = l0 - l1; let l3 = d / 2; in
        //   let l4 = l3 + 10; in
        //   ret l3 * l4
        // called with (10, 5, 2, 8): 15-4=11 (unused further), 8/2=4, 4+10=14, 4*14=56.
        let instrs = vec![
            Instr { kind: InstrKind::Let, op: Op::IAdd, arg1: Arg::Arg(0), arg2: Arg::Arg(1), local_var_count: 1 },
            Instr { kind: InstrKind::Let, op: Op::IMul, arg1: Arg::Arg(2), arg2: Arg::Arg(2), local_var_count: 1 },
            Instr { kind: InstrKind::In, op: Op::ILoad, arg1: int(0), arg2: int(0), local_var_count: 0 },
            Instr {
                kind: InstrKind::Let,
                op: Op::ISub,
                arg1: Arg::LocalVar(0),
                arg2: Arg::LocalVar(1),
                local_var_count: 1,
            },
            Instr { kind: InstrKind::Let, op: Op::IDiv, arg1: Arg::Arg(3), arg2: int(2), local_var_count: 1 },
            Instr { kind: InstrKind::In, op: Op::ILoad, arg1: int(0), arg2: int(0), local_var_count: 0 },
            Instr { kind: InstrKind::Let, op: Op::IAdd, arg1: Arg::LocalVar(3), arg2: int(10), local_var_count: 1 },
            Instr { kind: InstrKind::In, op: Op::ILoad, arg1: int(0), arg2: int(0), local_var_count: 0 },
            Instr {
                kind: InstrKind::Ret,
                op: Op::IMul,
                arg1: Arg::LocalVar(3),
                arg2: Arg::LocalVar(4),
                local_var_count: 0,
            },
        ];
        let funcs = FixedFunctions(vec![Function::new(4, instrs, 0)]);
        let gc = GarbageCollector::new(GcConfig::default());
        let ctx = ThreadContext::new();
        let args = vec![Value::Int(10), Value::Int(5), Value::Int(2), Value::Int(8)];
        let result = call(&gc, &funcs, &ctx, &EagerCallHook, &hook::NoNativeHook, 0, args).unwrap();
        assert_eq!(result, Value::Int(56));
    }

    #[test]
    fn reference_round_trip_tuple_preserves_each_slot_by_type_and_bytes() {
        use letin_value::{ObjectPayload, TupleElem};

        // fn f(): build "abc", "df", and "abcdf" as iarray8 literals, then
        // ret the tuple (1, "abc", "df", "abcdf", 2, 'd', 3).
        fn push_byte(c: u8) -> Instr {
            Instr { kind: InstrKind::Arg, op: Op::ILoad, arg1: int(c as i64), arg2: int(0), local_var_count: 0 }
        }
        fn push_ref(local: u32) -> Instr {
            Instr { kind: InstrKind::Arg, op: Op::RLoad, arg1: Arg::LocalVar(local), arg2: int(0), local_var_count: 0 }
        }
        fn push_int(v: i64) -> Instr {
            Instr { kind: InstrKind::Arg, op: Op::ILoad, arg1: int(v), arg2: int(0), local_var_count: 0 }
        }

        let mut instrs = vec![
            push_byte(b'a'),
            push_byte(b'b'),
            push_byte(b'c'),
            Instr { kind: InstrKind::Let, op: Op::RIArray8, arg1: int(0), arg2: int(0), local_var_count: 1 },
            push_byte(b'd'),
            push_byte(b'f'),
            Instr { kind: InstrKind::Let, op: Op::RIArray8, arg1: int(0), arg2: int(0), local_var_count: 1 },
            push_byte(b'a'),
            push_byte(b'b'),
            push_byte(b'c'),
            push_byte(b'd'),
            push_byte(b'f'),
            Instr { kind: InstrKind::Let, op: Op::RIArray8, arg1: int(0), arg2: int(0), local_var_count: 1 },
        ];
        instrs.push(push_int(1));
        instrs.push(push_ref(0));
        instrs.push(push_ref(1));
        instrs.push(push_ref(2));
        instrs.push(push_int(2));
        instrs.push(push_byte(b'd'));
        instrs.push(push_int(3));
        instrs.push(Instr {
            kind: InstrKind::Ret,
            op: Op::RTuple,
            arg1: int(0),
            arg2: int(0),
            local_var_count: 0,
        });

        let funcs = FixedFunctions(vec![Function::new(0, instrs, 0)]);
        let gc = GarbageCollector::new(GcConfig::default());
        let ctx = ThreadContext::new();
        let result = call(&gc, &funcs, &ctx, &EagerCallHook, &hook::NoNativeHook, 0, vec![]).unwrap();

        let tuple_ref = result.as_ref().unwrap();
        // SAFETY: `tuple_ref` was just allocated by this same `gc` and is
        // kept alive by `result` for the duration of this check.
        let tuple_obj = unsafe { gc.object(tuple_ref) };
        let ObjectPayload::Tuple(elems) = &tuple_obj.payload else {
            panic!("expected a tuple");
        };
        assert_eq!(elems.len(), 7);

        fn byte_string_of<'a>(gc: &'a GarbageCollector, elem: &TupleElem) -> &'a [u8] {
            let r = elem.value.as_ref().unwrap();
            // SAFETY: same allocation lifetime as `tuple_ref` above.
            let obj = unsafe { gc.object(r) };
            let ObjectPayload::IArray8(bytes) = &obj.payload else {
                panic!("expected an iarray8");
            };
            bytes
        }

        assert_eq!(elems[0].value, Value::Int(1));
        assert_eq!(byte_string_of(&gc, &elems[1]), b"abc");
        assert_eq!(byte_string_of(&gc, &elems[2]), b"df");
        assert_eq!(byte_string_of(&gc, &elems[3]), b"abcdf");
        assert_eq!(elems[4].value, Value::Int(2));
        assert_eq!(elems[5].value, Value::Int(b'd' as i64));
        assert_eq!(elems[6].value, Value::Int(3));
    }

    #[test]
    fn division_by_zero_without_a_handler_propagates() {
        let instrs = vec![Instr {
            kind: InstrKind::Ret,
            op: Op::IDiv,
            arg1: int(1),
            arg2: int(0),
            local_var_count: 0,
        }];
        let funcs = FixedFunctions(vec![Function::new(0, instrs, 0)]);
        let gc = GarbageCollector::new(GcConfig::default());
        let ctx = ThreadContext::new();
        let err = call(&gc, &funcs, &ctx, &EagerCallHook, &hook::NoNativeHook, 0, vec![]).unwrap_err();
        assert_eq!(err.error, RuntimeError::DivByZero);
    }
}
