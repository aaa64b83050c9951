//! A hashable, memoization-cache-friendly projection of [`Value`]. `Value`
//! itself can't implement `Hash`/`Eq` (it carries an `f64`), so calls are
//! keyed on this instead.

use letin_value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    FloatBits(u64),
    Ref(usize),
    CanceledRef(usize),
    Pair(i32, i32),
    Error(i32),
}

impl Key {
    pub fn of(v: Value) -> Key {
        match v {
            Value::Int(i) => Key::Int(i),
            Value::Float(f) => Key::FloatBits(f.to_bits()),
            Value::Ref(r) => Key::Ref(r.as_ptr() as usize),
            Value::CanceledRef(r) => Key::CanceledRef(r.as_ptr() as usize),
            Value::LazyRef(r) | Value::LockedLazyRef(r) => Key::Ref(r.as_ptr() as usize),
            Value::Pair(a, b) => Key::Pair(a, b),
            Value::Error(e) => Key::Error(e),
        }
    }

    pub fn of_args(args: &[Value]) -> Vec<Key> {
        args.iter().copied().map(Key::of).collect()
    }
}
