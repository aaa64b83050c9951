//! Per-thread interpreter state: the register file kept for introspection and
//! parity with the original design, and the active-frame registry the
//! collector walks as [`GcRoots`].

use letin_gc::GcRoots;
use letin_value::{Ref, Value};
use parking_lot::Mutex;

/// The register file named in the design notes. `letin-vm`'s interpreter is
/// recursive rather than a single flat dispatch loop over one shared stack,
/// so most of these fields are diagnostic snapshots of the *current* frame
/// rather than registers the dispatch loop reads on every instruction; `ip`
/// and `rv` are the two that are live.
#[derive(Debug, Clone, Copy, Default)]
pub struct Registers {
    pub abp: usize,
    pub ac: usize,
    pub abp2: usize,
    pub ac2: usize,
    pub sec: usize,
    pub ip: usize,
    pub rv: i64,
    pub tmp_r: i64,
    /// Carried for fidelity with the register list; under cooperative
    /// polling safepoints `allocate` cannot be preempted mid-operation, so
    /// nothing actually races on it the way it would under the original's
    /// signal-based quiescence (see `letin-gc`).
    pub tmp_ptr: usize,
}

struct FrameRoots {
    args: *const Vec<Value>,
    locals: *const Vec<Value>,
    pending_args: *const Vec<Value>,
}

// SAFETY: the pointers are only ever read while the owning stack frame is
// still alive (pushed/popped in strict LIFO order matching Rust's own call
// stack) and only while that thread is parked at a safepoint during a
// stop-the-world collection, never concurrently with the owning thread's own
// mutation of those `Vec`s.
unsafe impl Send for FrameRoots {}

/// Owns the register snapshot and the GC-root registry for one interpreter
/// thread. One `ThreadContext` per OS thread running letin code.
pub struct ThreadContext {
    pub registers: Mutex<Registers>,
    active_frames: Mutex<Vec<FrameRoots>>,
}

impl ThreadContext {
    pub fn new() -> Self {
        ThreadContext { registers: Mutex::new(Registers::default()), active_frames: Mutex::new(Vec::new()) }
    }

    /// Register the currently-executing frame's value buffers as GC roots
    /// for the lifetime of the returned guard.
    pub(crate) fn push_frame(
        &self,
        args: &Vec<Value>,
        locals: &Vec<Value>,
        pending_args: &Vec<Value>,
    ) -> FrameGuard<'_> {
        self.active_frames.lock().push(FrameRoots { args, locals, pending_args });
        FrameGuard { ctx: self }
    }
}

impl Default for ThreadContext {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct FrameGuard<'a> {
    ctx: &'a ThreadContext,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.ctx.active_frames.lock().pop();
    }
}

impl GcRoots for ThreadContext {
    fn collect_roots(&self, out: &mut Vec<Ref>) {
        let frames = self.active_frames.lock();
        for frame in frames.iter() {
            // SAFETY: see the `unsafe impl Send for FrameRoots` justification above.
            unsafe {
                collect_value_refs(&*frame.args, out);
                collect_value_refs(&*frame.locals, out);
                collect_value_refs(&*frame.pending_args, out);
            }
        }
    }
}

fn collect_value_refs(values: &[Value], out: &mut Vec<Ref>) {
    for v in values {
        if let Value::Ref(r) | Value::LazyRef(r) | Value::LockedLazyRef(r) = *v {
            out.push(r);
        }
    }
}
