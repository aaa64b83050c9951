//! Assembles a loaded [`Environment`](letin_loader::Environment) with a GC, a
//! native-function handler, and an evaluation strategy into a runnable
//! program, and implements the `start` contract (§6): build the immortal
//! argv array, append a unique `IO` token if the entry wants one, run the
//! entry function on its own thread, and read back either the raw result or
//! — for the two-argument IO-threading convention — the process exit status
//! its result tuple carries.

use crate::error::{Result, RuntimeError};
use letin_gc::{GarbageCollector, GcConfig};
use letin_value::{Object, ObjectFlags, ObjectKind, ObjectPayload, Value};
use letin_vm::{CallHook, Functions, NativeHook, ThreadContext};
use std::sync::Arc;
use std::thread;

/// What an entry function's result means, per the arity of the entry itself
/// (§6's "start contract"): a one-argument entry hands back its return value
/// directly; a two-argument entry is threading a unique `IO` token and its
/// result is read only for the exit status it carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryOutcome {
    Value(Value),
    ExitStatus(i32),
}

pub struct VirtualMachine {
    env: Arc<dyn Functions>,
    gc: Arc<GarbageCollector>,
    native: Arc<dyn NativeHook>,
    strategy: Arc<dyn CallHook>,
}

impl VirtualMachine {
    pub fn new(
        env: Arc<dyn Functions>,
        gc_config: GcConfig,
        native: Arc<dyn NativeHook>,
        strategy: Arc<dyn CallHook>,
    ) -> Self {
        VirtualMachine { env, gc: Arc::new(GarbageCollector::new(gc_config)), native, strategy }
    }

    pub fn gc(&self) -> &Arc<GarbageCollector> {
        &self.gc
    }

    pub fn env(&self) -> &Arc<dyn Functions> {
        &self.env
    }

    /// Run `entry_index` to completion on a freshly spawned thread,
    /// `program_args` turned into an immortal `rarray` of `iarray8`
    /// elements. Blocks until the entry thread finishes, mirroring the
    /// original driver's `thread.system_thread().join()`.
    pub fn start(&self, entry_index: u32, program_args: &[String]) -> Result<EntryOutcome> {
        let func = self.env.function(entry_index).ok_or(RuntimeError::NoEntry)?;
        let is_unique_result = func.arg_count == 2;

        let mut args = vec![self.build_argv(program_args)];
        if is_unique_result {
            args.push(self.new_unique_io());
        }

        let gc = self.gc.clone();
        let env = self.env.clone();
        let native = self.native.clone();
        let strategy = self.strategy.clone();

        let handle = thread::Builder::new()
            .name("letin-entry".into())
            .spawn(move || {
                gc.register_mutator_thread();
                let ctx = ThreadContext::new();
                let result =
                    letin_vm::call(&gc, env.as_ref(), &ctx, strategy.as_ref(), native.as_ref(), entry_index, args);
                gc.unregister_mutator_thread();
                result
            })
            .expect("failed to spawn entry thread");

        let result = handle.join().map_err(|_| RuntimeError::EntryPanicked)?;
        let value = result?;

        if is_unique_result {
            Ok(EntryOutcome::ExitStatus(self.exit_status_of(value)?))
        } else {
            Ok(EntryOutcome::Value(value))
        }
    }

    fn build_argv(&self, program_args: &[String]) -> Value {
        let elems: Vec<Value> = program_args
            .iter()
            .map(|s| {
                let r = self
                    .gc
                    .allocate_immortal(Object::new(ObjectFlags::NONE, ObjectPayload::IArray8(s.as_bytes().to_vec())));
                Value::Ref(r)
            })
            .collect();
        let r = self.gc.allocate_immortal(Object::new(ObjectFlags::NONE, ObjectPayload::RArray(elems)));
        Value::Ref(r)
    }

    fn new_unique_io(&self) -> Value {
        let r = self.gc.allocate_immortal(Object::new(ObjectFlags::UNIQUE, ObjectPayload::Io));
        Value::Ref(r)
    }

    /// Validate the `(int, unique io)` result tuple the two-argument entry
    /// convention requires and pull out its status code. Rust's allocator
    /// aborts the process on exhaustion rather than raising a catchable
    /// error the way the original's `bad_alloc` handler did — there is no
    /// counterpart to that `catch` here; `GarbageCollector::allocate` is
    /// infallible by construction (§4.4 carries no allocation-failure path).
    fn exit_status_of(&self, value: Value) -> Result<i32> {
        let r = value.as_ref().map_err(|_| letin_vm::Thrown::new(letin_vm::RuntimeError::IncorrectValue))?;
        let object = unsafe { self.gc.object(r) };
        if !object.flags.unique {
            return Err(letin_vm::Thrown::new(letin_vm::RuntimeError::IncorrectObject).into());
        }
        let ObjectPayload::Tuple(elems) = &object.payload else {
            return Err(letin_vm::Thrown::new(letin_vm::RuntimeError::IncorrectObject).into());
        };
        if elems.len() != 2 {
            return Err(letin_vm::Thrown::new(letin_vm::RuntimeError::IncorrectObject).into());
        }
        let status = elems[0]
            .value
            .as_int()
            .map_err(|_| letin_vm::Thrown::new(letin_vm::RuntimeError::IncorrectObject))?;
        let io_ref = elems[1]
            .value
            .as_ref()
            .map_err(|_| letin_vm::Thrown::new(letin_vm::RuntimeError::IncorrectObject))?;
        let io_object = unsafe { self.gc.object(io_ref) };
        if io_object.payload.kind() != ObjectKind::Io || !io_object.flags.unique {
            return Err(letin_vm::Thrown::new(letin_vm::RuntimeError::IncorrectObject).into());
        }
        Ok(status as i32)
    }
}
