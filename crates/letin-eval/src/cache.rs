//! The memoization cache backing `EVAL_STRATEGY_MEMO`.
//!
//! The original keys this off internal `OBJECT_TYPE_HASH_TABLE`/
//! `HASH_TABLE_ENTRY` heap objects so the cache participates in GC like any
//! other value. This crate keeps the entries in a plain `FxHashMap` instead
//! (indexed the same way: function index + argument key) and implements
//! [`GcRoots`] over it directly, which traces identically without paying for
//! a heap-object representation of the cache's own bookkeeping — a
//! deliberate simplification, not a semantic change: a cached result is
//! exactly as reachable to the collector either way.

use crate::key::Key;
use letin_gc::GcRoots;
use letin_value::{Ref, Value};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

type CacheKey = (u32, Vec<Key>);

#[derive(Default)]
pub struct MemoCache {
    entries: RwLock<FxHashMap<CacheKey, Value>>,
    /// Serializes "force the same not-yet-computed thunk from two threads"
    /// so only one caller actually runs the body; matches
    /// `VALUE_TYPE_LOCKED_LAZY_VALUE_REF`'s must-be-shared contract.
    force_lock: Mutex<()>,
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fun_index: u32, args: &[Value]) -> Option<Value> {
        let key = (fun_index, Key::of_args(args));
        self.entries.read().get(&key).copied()
    }

    pub fn insert(&self, fun_index: u32, args: &[Value], result: Value) {
        let key = (fun_index, Key::of_args(args));
        self.entries.write().insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Held for the duration of computing a not-yet-cached result so
    /// concurrent forcers of the same thunk serialize instead of racing.
    pub fn lock_for_force(&self) -> parking_lot::MutexGuard<'_, ()> {
        self.force_lock.lock()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl GcRoots for MemoCache {
    fn collect_roots(&self, out: &mut Vec<Ref>) {
        for v in self.entries.read().values() {
            if let Value::Ref(r) | Value::LazyRef(r) | Value::LockedLazyRef(r) = *v {
                out.push(r);
            }
        }
    }
}
