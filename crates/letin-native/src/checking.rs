//! Argument checkers, the Rust counterpart of `native.hpp`'s
//! `FunctionReferenceChecker`/`FunctionObjectChecker`/`TupleChecker` template
//! combinators. A checker validates one argument's shape and either extracts
//! a plain Rust value from it or hands back the typed pieces a native
//! function body needs, raising the matching [`RuntimeError`] on mismatch.
//!
//! Values are expected already forced: `*NCALL` resolves its operands the
//! same way any other variadic op does, so a lazy argument reaching here is
//! itself a shape error rather than something this layer forces on demand
//! (forcing needs the interpreter's [`letin_vm::CallHook`], which native
//! dispatch has no access to).

use letin_gc::GarbageCollector;
use letin_value::{ObjectKind, Ref, Value};
use letin_vm::{Result, RuntimeError, Thrown};

pub fn check_int(value: Value) -> Result<i64> {
    value.as_int().map_err(|_| Thrown::new(RuntimeError::IncorrectValue))
}

pub fn check_float(value: Value) -> Result<f64> {
    value.as_float().map_err(|_| Thrown::new(RuntimeError::IncorrectValue))
}

pub fn check_ref(value: Value) -> Result<Ref> {
    value.as_ref().map_err(|_| Thrown::new(RuntimeError::IncorrectValue))
}

/// Check that `value` is a reference to an object of the given `kind`,
/// returning the underlying [`Ref`] for a caller to inspect via
/// [`GarbageCollector::object`].
pub fn check_object(gc: &GarbageCollector, value: Value, kind: ObjectKind) -> Result<Ref> {
    let r = check_ref(value)?;
    let actual = unsafe { gc.object(r) }.payload.kind();
    if actual != kind {
        return Err(Thrown::new(RuntimeError::IncorrectObject));
    }
    Ok(r)
}

/// `check_object` plus a uniqueness requirement: a consumed `unique` I/O
/// token must in fact be unique, not a shared alias (§3.1).
pub fn check_unique_object(gc: &GarbageCollector, value: Value, kind: ObjectKind) -> Result<Ref> {
    let r = check_ref(value)?;
    let object = unsafe { gc.object(r) };
    if object.payload.kind() != kind {
        return Err(Thrown::new(RuntimeError::IncorrectObject));
    }
    if !object.flags.unique {
        return Err(Thrown::new(RuntimeError::IncorrectObject));
    }
    Ok(r)
}

/// Read a byte-array object's contents as owned bytes, the checker/converter
/// pair `atoi`/`atof`/`put_string` all need.
pub fn check_byte_string(gc: &GarbageCollector, value: Value) -> Result<Vec<u8>> {
    let r = check_object(gc, value, ObjectKind::IArray8)?;
    match &unsafe { gc.object(r) }.payload {
        letin_value::ObjectPayload::IArray8(bytes) => Ok(bytes.clone()),
        _ => unreachable!("check_object already validated the kind"),
    }
}
