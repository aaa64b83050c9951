use crate::config::GcConfig;
use crate::header::{header_of, object_ptr_of, sentinel, GcHeader};
use crate::roots::{ForkHandler, GcRoots};
use crate::stats::GcStats;
use crate::Quiescence;
use letin_value::{Object, Ref};
use parking_lot::{Mutex, RwLock};
use std::ptr;
use std::sync::{Arc, Weak};
use std::time::Instant;

struct CollectorState {
    list_first: *mut GcHeader,
    immortal_first: *mut GcHeader,
    allocated_bytes: usize,
}

// SAFETY: every raw pointer reachable from `CollectorState` is a `Box::into_raw`'d
// `GcHeader` that this collector exclusively owns; all mutation of the list goes
// through `state`'s mutex, and all mutation of object *contents* happens only
// while no collection is in progress (enforced by `Quiescence`).
unsafe impl Send for CollectorState {}

/// A stop-the-world, non-moving, mark-and-sweep collector (§4.4).
pub struct GarbageCollector {
    config: GcConfig,
    state: Mutex<CollectorState>,
    quiescence: Quiescence,
    thread_roots: RwLock<Vec<Weak<dyn GcRoots>>>,
    global_roots: RwLock<Vec<Arc<dyn GcRoots>>>,
    fork_handlers: Mutex<Vec<(u8, Arc<dyn ForkHandler>)>>,
    stats: GcStats,
}

impl GarbageCollector {
    pub fn new(config: GcConfig) -> Self {
        GarbageCollector {
            config,
            state: Mutex::new(CollectorState {
                list_first: ptr::null_mut(),
                immortal_first: ptr::null_mut(),
                allocated_bytes: 0,
            }),
            quiescence: Quiescence::new(),
            thread_roots: RwLock::new(Vec::new()),
            global_roots: RwLock::new(Vec::new()),
            fork_handlers: Mutex::new(Vec::new()),
            stats: GcStats::new(),
        }
    }

    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    pub fn stats(&self) -> &GcStats {
        &self.stats
    }

    // --- Thread / root registration -----------------------------------------

    pub fn register_mutator_thread(&self) {
        self.quiescence.register_thread();
    }

    pub fn unregister_mutator_thread(&self) {
        self.quiescence.unregister_thread();
    }

    pub fn register_thread_roots(&self, roots: Weak<dyn GcRoots>) {
        self.thread_roots.write().push(roots);
    }

    pub fn register_global_roots(&self, roots: Arc<dyn GcRoots>) {
        self.global_roots.write().push(roots);
    }

    pub fn register_fork_handler(&self, priority: u8, handler: Arc<dyn ForkHandler>) {
        self.fork_handlers.lock().push((priority, handler));
    }

    /// Call at a loop back-edge or call boundary. Blocks for the duration of any
    /// in-progress collection requested by another thread.
    pub fn poll(&self) {
        self.quiescence.poll();
    }

    pub fn should_collect(&self) -> bool {
        self.config.collect_threshold_bytes > 0
            && self.state.lock().allocated_bytes >= self.config.collect_threshold_bytes
    }

    // --- Fork safety ----------------------------------------------------------

    pub fn run_pre_fork_handlers(&self) {
        let mut handlers = self.fork_handlers.lock();
        handlers.sort_by_key(|(prio, _)| *prio);
        for (_, h) in handlers.iter() {
            h.pre_fork();
        }
    }

    pub fn run_post_fork_handlers(&self) {
        let mut handlers = self.fork_handlers.lock();
        handlers.sort_by_key(|(prio, _)| std::cmp::Reverse(*prio));
        for (_, h) in handlers.iter() {
            h.post_fork();
        }
    }

    // --- Allocation -------------------------------------------------------

    /// Allocate a collectible object. Treated as a safepoint: a collection
    /// requested by another thread is allowed to run to completion before this
    /// call links the new object into the list, so there is no window in which a
    /// concurrent sweep can observe a half-published object (the race the
    /// original's `tmp_ptr` register exists to guard against under signal-based
    /// preemption does not arise under polling safepoints).
    pub fn allocate(&self, object: Object) -> Ref {
        self.quiescence.poll();
        let size = approx_size(&object);
        let boxed = Box::new(GcHeader::new(object));
        let header = Box::into_raw(boxed);
        let mut state = self.state.lock();
        unsafe {
            (*header).list_next.set(state.list_first);
        }
        state.list_first = header;
        state.allocated_bytes += size;
        drop(state);
        unsafe { Ref::from_raw(object_ptr_of(header) as *mut ()) }
    }

    /// Allocate an object that is never swept (§3: immortal roots — argv arrays,
    /// the environment's top-level data). Linked into its own list and treated as
    /// an always-live root during marking.
    pub fn allocate_immortal(&self, object: Object) -> Ref {
        let boxed = Box::new(GcHeader::new(object));
        let header = Box::into_raw(boxed);
        let mut state = self.state.lock();
        unsafe {
            (*header).list_next.set(state.immortal_first);
        }
        state.immortal_first = header;
        drop(state);
        unsafe { Ref::from_raw(object_ptr_of(header) as *mut ()) }
    }

    /// # Safety
    /// `r` must have been produced by [`allocate`](Self::allocate) or
    /// [`allocate_immortal`](Self::allocate_immortal) on this collector and must
    /// not have been swept.
    pub unsafe fn object(&self, r: Ref) -> &Object {
        &*(r.as_ptr() as *const Object)
    }

    /// # Safety
    /// Same as [`object`](Self::object). The caller must also ensure no other
    /// reference to the same object is read or written concurrently — the
    /// stop-the-world design gives this for free between safepoints, but a
    /// `letin-vm` interpreter thread must not alias a `&mut Object` across a
    /// `poll()` call.
    pub unsafe fn object_mut(&self, r: Ref) -> &mut Object {
        &mut *(r.as_ptr() as *mut Object)
    }

    // --- Collection ---------------------------------------------------------

    pub fn collect(&self) {
        let start = Instant::now();
        let _world_stopped = self.quiescence.stop_world();
        let mut state = self.state.lock();

        let mut roots = Vec::new();
        for weak in self.thread_roots.read().iter() {
            if let Some(source) = weak.upgrade() {
                source.collect_roots(&mut roots);
            }
        }
        for source in self.global_roots.read().iter() {
            source.collect_roots(&mut roots);
        }
        // Every immortal object is itself a permanent root, so anything it
        // references transitively survives even though the immortal list is
        // never swept.
        let mut immortal = state.immortal_first;
        while !immortal.is_null() {
            unsafe {
                roots.push(Ref::from_raw(object_ptr_of(immortal) as *mut ()));
                immortal = (*immortal).list_next.get();
            }
        }

        mark(&roots);
        let (freed_objects, freed_bytes, live_objects) = sweep(&mut state);
        state.allocated_bytes = 0;
        drop(state);

        if self.config.stats_enabled {
            self.stats.record_cycle(freed_objects, freed_bytes, live_objects, start.elapsed());
        }
        if self.config.verbose {
            tracing::debug!(
                freed_objects,
                freed_bytes,
                live_objects,
                pause_us = start.elapsed().as_micros() as u64,
                "gc cycle complete"
            );
        }
    }
}

fn approx_size(object: &Object) -> usize {
    use letin_value::ObjectPayload::*;
    let payload_bytes = match &object.payload {
        IArray8(v) => v.len(),
        IArray16(v) => v.len() * 2,
        IArray32(v) => v.len() * 4,
        IArray64(v) => v.len() * 8,
        SfArray(v) => v.len() * 4,
        DfArray(v) => v.len() * 8,
        RArray(v) => v.len() * std::mem::size_of::<letin_value::Value>(),
        Tuple(v) => v.len() * std::mem::size_of::<letin_value::TupleElem>(),
        Io => 0,
        LazyValue(l) => l.args.len() * std::mem::size_of::<letin_value::Value>(),
        NativeObject(_) => std::mem::size_of::<usize>(),
        HashTable(v) => v.len() * std::mem::size_of::<Option<Ref>>(),
        HashTableEntry { key, .. } => key.len() * std::mem::size_of::<letin_value::Value>(),
    };
    payload_bytes + std::mem::size_of::<GcHeader>()
}

fn push_if_unmarked(r: Ref, top: &mut *mut GcHeader) {
    let header = unsafe { header_of(r.as_ptr() as *mut Object) };
    if header.is_null() {
        return;
    }
    let marked = unsafe { (*header).is_marked() };
    if !marked {
        unsafe {
            (*header).stack_prev.set(*top);
        }
        *top = header;
    }
}

fn trace_children(object: &Object, out: &mut Vec<Ref>) {
    use letin_value::{ObjectPayload::*, Value};
    match &object.payload {
        RArray(values) => {
            for v in values {
                push_ref_child(*v, out);
            }
        }
        Tuple(elems) => {
            for e in elems {
                push_ref_child(e.value, out);
            }
        }
        LazyValue(lazy) => {
            push_ref_child(lazy.value, out);
            for a in &lazy.args {
                push_ref_child(*a, out);
            }
        }
        HashTable(entries) => {
            for e in entries.iter().flatten() {
                out.push(*e);
            }
        }
        HashTableEntry { key, result } => {
            for v in key {
                push_ref_child(*v, out);
            }
            push_ref_child(*result, out);
        }
        IArray8(_) | IArray16(_) | IArray32(_) | IArray64(_) | SfArray(_) | DfArray(_) | Io
        | NativeObject(_) => {}
    }
}

fn push_ref_child(v: letin_value::Value, out: &mut Vec<Ref>) {
    match v {
        letin_value::Value::Ref(r) | letin_value::Value::CanceledRef(r) => out.push(r),
        letin_value::Value::LazyRef(r) | letin_value::Value::LockedLazyRef(r) => out.push(r),
        _ => {}
    }
}

/// The explicit worklist mark phase: a singly-linked stack threaded through each
/// header's `stack_prev` field rather than recursion, so marking a deep object
/// graph costs no native call-stack depth (§4.4).
fn mark(roots: &[Ref]) {
    let mut top = sentinel();
    for r in roots {
        push_if_unmarked(*r, &mut top);
    }
    while top != sentinel() {
        let header = top;
        top = unsafe { (*header).stack_prev.get() };
        let mut children = Vec::new();
        trace_children(unsafe { &(*header).object }, &mut children);
        for child in children {
            push_if_unmarked(child, &mut top);
        }
    }
}

/// One pass over the main object list: unmarked headers are freed and unlinked;
/// marked headers have their mark bit cleared for the next cycle.
fn sweep(state: &mut CollectorState) -> (u64, u64, usize) {
    let mut freed_objects = 0u64;
    let mut freed_bytes = 0u64;
    let mut live = 0usize;
    let mut prev: *mut GcHeader = ptr::null_mut();
    let mut cur = state.list_first;
    while !cur.is_null() {
        let next = unsafe { (*cur).list_next.get() };
        if unsafe { (*cur).is_marked() } {
            unsafe { (*cur).clear_mark() };
            live += 1;
            prev = cur;
        } else {
            if prev.is_null() {
                state.list_first = next;
            } else {
                unsafe { (*prev).list_next.set(next) };
            }
            let freed = unsafe { Box::from_raw(cur) };
            freed_bytes += approx_size(&freed.object) as u64;
            freed_objects += 1;
            drop(freed);
        }
        cur = next;
    }
    (freed_objects, freed_bytes, live)
}

impl Drop for GarbageCollector {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let mut cur = state.list_first;
        while !cur.is_null() {
            let next = unsafe { (*cur).list_next.get() };
            drop(unsafe { Box::from_raw(cur) });
            cur = next;
        }
        let mut cur = state.immortal_first;
        while !cur.is_null() {
            let next = unsafe { (*cur).list_next.get() };
            drop(unsafe { Box::from_raw(cur) });
            cur = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use letin_value::{ObjectFlags, ObjectPayload};

    fn iarray8(bytes: &[u8]) -> Object {
        Object::new(ObjectFlags::NONE, ObjectPayload::IArray8(bytes.to_vec()))
    }

    #[test]
    fn allocate_then_collect_with_no_roots_frees_everything() {
        let gc = GarbageCollector::new(GcConfig::default());
        gc.allocate(iarray8(b"abc"));
        gc.allocate(iarray8(b"def"));
        gc.collect();
        assert_eq!(gc.stats().objects_freed(), 2);
        assert_eq!(gc.stats().live_objects(), 0);
    }

    struct OneRef(Mutex<Option<Ref>>);
    impl GcRoots for OneRef {
        fn collect_roots(&self, out: &mut Vec<Ref>) {
            if let Some(r) = *self.0.lock() {
                out.push(r);
            }
        }
    }

    #[test]
    fn rooted_object_and_its_children_survive_collection() {
        let gc = GarbageCollector::new(GcConfig::default());
        let child = gc.allocate(iarray8(b"child"));
        let parent = gc.allocate(Object::new(
            ObjectFlags::NONE,
            ObjectPayload::RArray(vec![letin_value::Value::Ref(child)]),
        ));
        let unrooted = gc.allocate(iarray8(b"garbage"));
        let _ = unrooted;

        let root_source: Arc<dyn GcRoots> = Arc::new(OneRef(Mutex::new(Some(parent))));
        gc.register_global_roots(root_source);

        gc.collect();
        assert_eq!(gc.stats().objects_freed(), 1);
        assert_eq!(gc.stats().live_objects(), 2);
    }

    #[test]
    fn immortal_objects_are_never_swept() {
        let gc = GarbageCollector::new(GcConfig::default());
        gc.allocate_immortal(iarray8(b"argv"));
        gc.collect();
        assert_eq!(gc.stats().objects_freed(), 0);
    }
}
