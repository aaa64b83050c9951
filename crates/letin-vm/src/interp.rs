//! The stack-register hybrid interpreter.
//!
//! Each call runs as one Rust function activation holding three growable
//! buffers — `locals` (bound by `LET`/`LETTUPLE`), `pending` (accumulated by
//! `ARG`, consumed by a call or a constructor), and the function's own
//! `args` — plus an explicit `try_stack` for exception handlers. `RETRY`
//! restarts this activation in place (the `'tailcall` loop below), so
//! self-tail-recursive letin code runs in constant native stack space;
//! ordinary calls recurse through [`CallHook::call`], which costs a native
//! stack frame the way any non-tail call would in a naively compiled
//! language.

use crate::error::{Result, RuntimeError, Thrown};
use crate::hook::{CallHook, NativeHook};
use crate::opcode::{Arg, Instr, InstrKind, Op};
use crate::program::Functions;
use crate::thread::ThreadContext;
use letin_gc::GarbageCollector;
use letin_value::{Object, ObjectFlags, ObjectPayload, Ref, TupleElem, Value};

struct TryFrame {
    handler_ip: usize,
    locals_len: usize,
}

enum InstrOutcome {
    Next,
    Jump(usize),
    Return(Value),
    Retry(Vec<Value>),
}

/// Run function `fun_index` to completion with `args`, recursing through
/// `hook` for nested calls and forced lazy references and through `native`
/// for `*NCALL` instructions.
pub fn call(
    gc: &GarbageCollector,
    funcs: &dyn Functions,
    ctx: &ThreadContext,
    hook: &dyn CallHook,
    native: &dyn NativeHook,
    fun_index: u32,
    args: Vec<Value>,
) -> Result<Value> {
    let mut args = args;
    'tailcall: loop {
        let func = funcs.function(fun_index).ok_or_else(|| Thrown::new(RuntimeError::NoFun))?;
        if args.len() as u32 != func.arg_count {
            return Err(Thrown::new(RuntimeError::IncorrectArgCount));
        }

        let mut locals: Vec<Value> = Vec::new();
        let mut pending: Vec<Value> = Vec::new();
        let mut try_stack: Vec<TryFrame> = Vec::new();
        let mut ip: usize = 0;
        let _frame_guard = ctx.push_frame(&args, &locals, &pending);

        loop {
            gc.poll();
            let instr = *func.instrs.get(ip).ok_or_else(|| Thrown::new(RuntimeError::NoInstr))?;

            let outcome = step(instr, ip, &mut locals, &mut args, &mut pending, &mut try_stack, funcs, gc, ctx, hook, native);

            match outcome {
                Ok(InstrOutcome::Next) => ip += 1,
                Ok(InstrOutcome::Jump(target)) => ip = target,
                Ok(InstrOutcome::Return(v)) => return Ok(v),
                Ok(InstrOutcome::Retry(new_args)) => {
                    if new_args.len() as u32 != func.arg_count {
                        return Err(Thrown::new(RuntimeError::IncorrectArgCount));
                    }
                    args = new_args;
                    continue 'tailcall;
                }
                Err(thrown) => match try_stack.pop() {
                    Some(frame) => {
                        locals.truncate(frame.locals_len);
                        locals.push(Value::Int(thrown.code as i64));
                        ip = frame.handler_ip;
                    }
                    None => return Err(thrown),
                },
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn step(
    instr: Instr,
    ip: usize,
    locals: &mut Vec<Value>,
    args: &mut [Value],
    pending: &mut Vec<Value>,
    try_stack: &mut Vec<TryFrame>,
    funcs: &dyn Functions,
    gc: &GarbageCollector,
    ctx: &ThreadContext,
    hook: &dyn CallHook,
    native: &dyn NativeHook,
) -> Result<InstrOutcome> {
    match instr.kind {
        InstrKind::Let => {
            let v = eval_op(instr.op, instr.arg1, instr.arg2, locals, args, pending, funcs, gc, ctx, hook, native)?;
            locals.push(v);
            Ok(InstrOutcome::Next)
        }
        InstrKind::In => Ok(InstrOutcome::Next),
        InstrKind::Ret => {
            let v = eval_op(instr.op, instr.arg1, instr.arg2, locals, args, pending, funcs, gc, ctx, hook, native)?;
            Ok(InstrOutcome::Return(v))
        }
        InstrKind::Jc => {
            let cond = resolve_value(instr.arg1, locals, args, funcs)?;
            if as_int_operand(cond)? != 0 {
                Ok(InstrOutcome::Jump(jump_target(ip, instr.arg2)?))
            } else {
                Ok(InstrOutcome::Next)
            }
        }
        InstrKind::Jump => Ok(InstrOutcome::Jump(jump_target(ip, instr.arg1)?)),
        InstrKind::Arg => {
            let v = eval_op(instr.op, instr.arg1, instr.arg2, locals, args, pending, funcs, gc, ctx, hook, native)?;
            pending.push(v);
            Ok(InstrOutcome::Next)
        }
        InstrKind::Retry => Ok(InstrOutcome::Retry(std::mem::take(pending))),
        InstrKind::LetTuple => {
            let tuple_val = resolve_value(instr.arg1, locals, args, funcs)?;
            let r = as_ref_operand(tuple_val)?;
            let n = instr.local_var_count as usize;
            // SAFETY: `r` was produced by this same interpreter's `gc`, and
            // the owning frame keeps it rooted for the duration of this call.
            let obj = unsafe { gc.object(r) };
            let ObjectPayload::Tuple(elems) = &obj.payload else {
                return Err(Thrown::new(RuntimeError::IncorrectObject));
            };
            if elems.len() != n {
                return Err(Thrown::new(RuntimeError::IncorrectObject));
            }
            for elem in elems {
                locals.push(elem.value);
            }
            Ok(InstrOutcome::Next)
        }
        InstrKind::Try => {
            let offset = imm_of(instr.arg1)?;
            try_stack.push(TryFrame { handler_ip: (ip as i64 + offset) as usize, locals_len: locals.len() });
            Ok(InstrOutcome::Next)
        }
        InstrKind::Throw => {
            let code_val = resolve_value(instr.arg1, locals, args, funcs)?;
            Err(Thrown::user(as_int_operand(code_val)? as i32))
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn eval_op(
    op: Op,
    arg1: Arg,
    arg2: Arg,
    locals: &mut [Value],
    args: &mut [Value],
    pending: &mut Vec<Value>,
    funcs: &dyn Functions,
    gc: &GarbageCollector,
    ctx: &ThreadContext,
    hook: &dyn CallHook,
    native: &dyn NativeHook,
) -> Result<Value> {
    use Op::*;

    if op.is_variadic() {
        let operands = std::mem::take(pending);
        return eval_variadic(op, arg1, arg2, operands, locals, args, funcs, gc, ctx, hook, native);
    }

    let a1 = resolve_value(arg1, locals, args, funcs)?;
    let a2 = resolve_value(arg2, locals, args, funcs)?;

    Ok(match op {
        ILoad => Value::Int(as_int_operand(a1)?),
        FLoad => Value::Float(as_float_operand(a1)?),
        RLoad => {
            // Loading a reference transfers it (§3.1): a unique source slot
            // is canceled on read, so a second load of the same slot fails
            // with AGAIN_USED_UNIQUE instead of silently duplicating a
            // linear resource.
            let r = match a1 {
                Value::Ref(r) => r,
                Value::CanceledRef(_) => return Err(Thrown::new(RuntimeError::AgainUsedUnique)),
                _ => return Err(Thrown::new(RuntimeError::IncorrectValue)),
            };
            // SAFETY: see `LetTuple` in `step` above.
            if unsafe { gc.object(r) }.flags.unique {
                cancel_source_slot(arg1, locals, args, r)?;
            }
            Value::Ref(r)
        }
        IAdd => Value::Int(as_int_operand(a1)?.wrapping_add(as_int_operand(a2)?)),
        ISub => Value::Int(as_int_operand(a1)?.wrapping_sub(as_int_operand(a2)?)),
        IMul => Value::Int(as_int_operand(a1)?.wrapping_mul(as_int_operand(a2)?)),
        IDiv => {
            let (x, y) = (as_int_operand(a1)?, as_int_operand(a2)?);
            if y == 0 {
                return Err(Thrown::new(RuntimeError::DivByZero));
            }
            Value::Int(x.wrapping_div(y))
        }
        IMod => {
            let (x, y) = (as_int_operand(a1)?, as_int_operand(a2)?);
            if y == 0 {
                return Err(Thrown::new(RuntimeError::DivByZero));
            }
            Value::Int(x.wrapping_rem(y))
        }
        IAnd => Value::Int(as_int_operand(a1)? & as_int_operand(a2)?),
        IOr => Value::Int(as_int_operand(a1)? | as_int_operand(a2)?),
        IXor => Value::Int(as_int_operand(a1)? ^ as_int_operand(a2)?),
        IShl => Value::Int(as_int_operand(a1)?.wrapping_shl(as_int_operand(a2)? as u32)),
        IShr => Value::Int(as_int_operand(a1)?.wrapping_shr(as_int_operand(a2)? as u32)),
        IEq => Value::Int((as_int_operand(a1)? == as_int_operand(a2)?) as i64),
        INe => Value::Int((as_int_operand(a1)? != as_int_operand(a2)?) as i64),
        ILt => Value::Int((as_int_operand(a1)? < as_int_operand(a2)?) as i64),
        ILe => Value::Int((as_int_operand(a1)? <= as_int_operand(a2)?) as i64),
        IGt => Value::Int((as_int_operand(a1)? > as_int_operand(a2)?) as i64),
        IGe => Value::Int((as_int_operand(a1)? >= as_int_operand(a2)?) as i64),
        FAdd => Value::Float(as_float_operand(a1)? + as_float_operand(a2)?),
        FSub => Value::Float(as_float_operand(a1)? - as_float_operand(a2)?),
        FMul => Value::Float(as_float_operand(a1)? * as_float_operand(a2)?),
        FDiv => Value::Float(as_float_operand(a1)? / as_float_operand(a2)?),
        FEq => Value::Int((as_float_operand(a1)? == as_float_operand(a2)?) as i64),
        FNe => Value::Int((as_float_operand(a1)? != as_float_operand(a2)?) as i64),
        FLt => Value::Int((as_float_operand(a1)? < as_float_operand(a2)?) as i64),
        FLe => Value::Int((as_float_operand(a1)? <= as_float_operand(a2)?) as i64),
        FGt => Value::Int((as_float_operand(a1)? > as_float_operand(a2)?) as i64),
        FGe => Value::Int((as_float_operand(a1)? >= as_float_operand(a2)?) as i64),
        REq => Value::Int((as_ref_operand(a1)? == as_ref_operand(a2)?) as i64),
        RNe => Value::Int((as_ref_operand(a1)? != as_ref_operand(a2)?) as i64),
        ItoF => Value::Float(as_int_operand(a1)? as f64),
        FtoI => Value::Int(as_float_operand(a1)? as i64),
        RI8Nth | RI16Nth | RI32Nth | RI64Nth | RSfNth | RDfNth | RRNth | RTNth => {
            let r = as_ref_operand(a1)?;
            let index = as_int_operand(a2)? as usize;
            // SAFETY: see `LetTuple` in `step` above.
            let obj = unsafe { gc.object(r) };
            obj.elem(index).ok_or_else(|| Thrown::new(RuntimeError::IndexOutOfBounds))?
        }
        RLength => {
            let r = as_ref_operand(a1)?;
            // SAFETY: see `LetTuple` in `step` above.
            let obj = unsafe { gc.object(r) };
            Value::Int(obj.len() as i64)
        }
        RIACat8 => {
            let (r1, r2) = (as_ref_operand(a1)?, as_ref_operand(a2)?);
            let mut out = Vec::new();
            // SAFETY: see `LetTuple` in `step` above.
            unsafe {
                let ObjectPayload::IArray8(v1) = &gc.object(r1).payload else {
                    return Err(Thrown::new(RuntimeError::IncorrectObject));
                };
                out.extend_from_slice(v1);
                let ObjectPayload::IArray8(v2) = &gc.object(r2).payload else {
                    return Err(Thrown::new(RuntimeError::IncorrectObject));
                };
                out.extend_from_slice(v2);
            }
            Value::Ref(gc.allocate(Object::new(ObjectFlags::NONE, ObjectPayload::IArray8(out))))
        }
        IForce | FForce | RForce => {
            let r = as_ref_operand(a1)?;
            hook.force(gc, funcs, ctx, r)?
        }
        _ => unreachable!("variadic op {op:?} reached the non-variadic match arm"),
    })
}

#[allow(clippy::too_many_arguments)]
fn eval_variadic(
    op: Op,
    arg1: Arg,
    arg2: Arg,
    operands: Vec<Value>,
    locals: &[Value],
    args: &[Value],
    funcs: &dyn Functions,
    gc: &GarbageCollector,
    ctx: &ThreadContext,
    hook: &dyn CallHook,
    native: &dyn NativeHook,
) -> Result<Value> {
    use Op::*;
    Ok(match op {
        RIArray8 => {
            let v = operands.into_iter().map(|o| as_int_operand(o).map(|i| i as u8)).collect::<Result<Vec<_>>>()?;
            Value::Ref(gc.allocate(Object::new(ObjectFlags::NONE, ObjectPayload::IArray8(v))))
        }
        RIArray16 => {
            let v = operands.into_iter().map(|o| as_int_operand(o).map(|i| i as i16)).collect::<Result<Vec<_>>>()?;
            Value::Ref(gc.allocate(Object::new(ObjectFlags::NONE, ObjectPayload::IArray16(v))))
        }
        RIArray32 => {
            let v = operands.into_iter().map(|o| as_int_operand(o).map(|i| i as i32)).collect::<Result<Vec<_>>>()?;
            Value::Ref(gc.allocate(Object::new(ObjectFlags::NONE, ObjectPayload::IArray32(v))))
        }
        RIArray64 => {
            let v = operands.into_iter().map(as_int_operand).collect::<Result<Vec<_>>>()?;
            Value::Ref(gc.allocate(Object::new(ObjectFlags::NONE, ObjectPayload::IArray64(v))))
        }
        RSfArray => {
            let v =
                operands.into_iter().map(|o| as_float_operand(o).map(|f| f as f32)).collect::<Result<Vec<_>>>()?;
            Value::Ref(gc.allocate(Object::new(ObjectFlags::NONE, ObjectPayload::SfArray(v))))
        }
        RDfArray => {
            let v = operands.into_iter().map(as_float_operand).collect::<Result<Vec<_>>>()?;
            Value::Ref(gc.allocate(Object::new(ObjectFlags::NONE, ObjectPayload::DfArray(v))))
        }
        RRArray => {
            reject_unique_elements(gc, &operands)?;
            Value::Ref(gc.allocate(Object::new(ObjectFlags::NONE, ObjectPayload::RArray(operands))))
        }
        RTuple => {
            reject_unique_elements(gc, &operands)?;
            let elems = operands.into_iter().map(TupleElem::new).collect();
            Value::Ref(gc.allocate(Object::new(ObjectFlags::NONE, ObjectPayload::Tuple(elems))))
        }
        ICall | FCall | RCall => {
            let fun_index = imm_of(arg1)? as u32;
            hook.call(gc, funcs, ctx, fun_index, operands)?
        }
        RUiaFill8 => {
            let r = as_ref_operand(resolve_value(arg1, locals, args, funcs)?)?;
            let mut it = operands.into_iter();
            let index = as_int_operand(it.next().ok_or_else(|| Thrown::new(RuntimeError::IncorrectArgCount))?)? as usize;
            let byte = as_int_operand(it.next().ok_or_else(|| Thrown::new(RuntimeError::IncorrectArgCount))?)? as u8;
            // SAFETY: see `LetTuple` in `step` above.
            let obj = unsafe { gc.object_mut(r) };
            let ObjectPayload::IArray8(v) = &mut obj.payload else {
                return Err(Thrown::new(RuntimeError::IncorrectObject));
            };
            let slot = v.get_mut(index).ok_or_else(|| Thrown::new(RuntimeError::IndexOutOfBounds))?;
            *slot = byte;
            Value::Ref(r)
        }
        RUtFillI | RUtFillF => {
            let r = as_ref_operand(resolve_value(arg1, locals, args, funcs)?)?;
            let mut it = operands.into_iter();
            let index = as_int_operand(it.next().ok_or_else(|| Thrown::new(RuntimeError::IncorrectArgCount))?)? as usize;
            let new_value = it.next().ok_or_else(|| Thrown::new(RuntimeError::IncorrectArgCount))?;
            ut_fill(gc, r, index, new_value)?
        }
        RUtFillR => {
            let r = as_ref_operand(resolve_value(arg1, locals, args, funcs)?)?;
            let mut it = operands.into_iter();
            let index = as_int_operand(it.next().ok_or_else(|| Thrown::new(RuntimeError::IncorrectArgCount))?)? as usize;
            let new_value = it.next().ok_or_else(|| Thrown::new(RuntimeError::IncorrectArgCount))?;
            // Filling a shared tuple's slot with a unique reference is the
            // one case the uniqueness invariant tie-breaks to
            // AGAIN_USED_UNIQUE rather than the general UNIQUE_OBJECT (§4.2).
            if let Value::Ref(vr) = new_value {
                // SAFETY: see `LetTuple` in `step` above.
                if unsafe { gc.object(vr) }.flags.unique {
                    return Err(Thrown::new(RuntimeError::AgainUsedUnique));
                }
            }
            ut_fill(gc, r, index, new_value)?
        }
        INCall | FNCall | RNCall => {
            let index = imm_of(arg1)? as u32;
            native.call_native(gc, ctx, index, operands)?
        }
        _ => {
            let _ = arg2;
            unreachable!("non-variadic op reached eval_variadic: {op:?}")
        }
    })
}

/// Overwrite the slot `arg` was read from with `Value::CanceledRef(r)`, the
/// mechanical half of consuming a unique reference. Only `LocalVar`/`Arg`
/// slots can hold a `Ref` at all (global vars are always `Int`/`Float`,
/// `Imm` is always an `Int`), so other operands are left alone.
fn cancel_source_slot(arg: Arg, locals: &mut [Value], args: &mut [Value], r: Ref) -> Result<()> {
    match arg {
        Arg::LocalVar(i) => {
            *locals.get_mut(i as usize).ok_or_else(|| Thrown::new(RuntimeError::NoLocalVar))? = Value::CanceledRef(r);
        }
        Arg::Arg(i) => {
            *args.get_mut(i as usize).ok_or_else(|| Thrown::new(RuntimeError::NoArg))? = Value::CanceledRef(r);
        }
        Arg::GlobalVar(_) | Arg::Imm(_) => {}
    }
    Ok(())
}

/// Reject any unique reference among `values`, the check a freshly built
/// shared container (`RRARRAY`/`RTUPLE`) applies to each element it's given
/// (§3.1: storing a unique object into a shared container is an error).
fn reject_unique_elements(gc: &GarbageCollector, values: &[Value]) -> Result<()> {
    for v in values {
        if let Value::Ref(r) = v {
            // SAFETY: see `LetTuple` in `step` above.
            if unsafe { gc.object(*r) }.flags.unique {
                return Err(Thrown::new(RuntimeError::UniqueObject));
            }
        }
    }
    Ok(())
}

fn ut_fill(gc: &GarbageCollector, r: Ref, index: usize, new_value: Value) -> Result<Value> {
    // SAFETY: see `LetTuple` in `step` above.
    let obj = unsafe { gc.object_mut(r) };
    let ObjectPayload::Tuple(elems) = &mut obj.payload else {
        return Err(Thrown::new(RuntimeError::IncorrectObject));
    };
    let slot = elems.get_mut(index).ok_or_else(|| Thrown::new(RuntimeError::IndexOutOfBounds))?;
    *slot = TupleElem::new(new_value);
    Ok(Value::Ref(r))
}

fn resolve_value(arg: Arg, locals: &[Value], args: &[Value], funcs: &dyn Functions) -> Result<Value> {
    match arg {
        Arg::LocalVar(i) => locals.get(i as usize).copied().ok_or_else(|| Thrown::new(RuntimeError::NoLocalVar)),
        Arg::Arg(i) => args.get(i as usize).copied().ok_or_else(|| Thrown::new(RuntimeError::NoArg)),
        Arg::GlobalVar(i) => funcs.global_var(i).ok_or_else(|| Thrown::new(RuntimeError::NoGlobalVar)),
        Arg::Imm(bits) => Ok(Value::Int(bits)),
    }
}

/// `JC`/`JUMP` offsets are relative to the instruction after the jump
/// (§4.2), matching how `TRY`'s handler offset is already interpreted.
fn jump_target(ip: usize, arg: Arg) -> Result<usize> {
    match arg {
        Arg::Imm(v) => Ok((ip as i64 + 1 + v) as usize),
        _ => Err(Thrown::new(RuntimeError::IncorrectInstr)),
    }
}

fn imm_of(arg: Arg) -> Result<i64> {
    match arg {
        Arg::Imm(v) => Ok(v),
        _ => Err(Thrown::new(RuntimeError::IncorrectInstr)),
    }
}

fn as_int_operand(v: Value) -> Result<i64> {
    match v {
        Value::Int(i) => Ok(i),
        _ => Err(Thrown::new(RuntimeError::IncorrectValue)),
    }
}

fn as_float_operand(v: Value) -> Result<f64> {
    match v {
        Value::Float(f) => Ok(f),
        Value::Int(bits) => Ok(f64::from_bits(bits as u64)),
        _ => Err(Thrown::new(RuntimeError::IncorrectValue)),
    }
}

fn as_ref_operand(v: Value) -> Result<Ref> {
    match v {
        Value::Ref(r) => Ok(r),
        _ => Err(Thrown::new(RuntimeError::IncorrectValue)),
    }
}
