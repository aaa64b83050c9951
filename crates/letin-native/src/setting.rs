//! Setters build a return [`Value`], the counterpart of `native.hpp`'s
//! `set_string_value`/`set_cstring_value`/`set_object_value_for_fun`: each
//! one allocates through the [`GarbageCollector`] and hands back a plain
//! reference (never `unique`; the result is freshly allocated and has
//! exactly one owner by construction, but native results aren't linearity
//! tracked past the call boundary).

use letin_gc::GarbageCollector;
use letin_value::{Object, ObjectFlags, ObjectPayload, TupleElem, Value};

pub fn set_byte_string(gc: &GarbageCollector, bytes: Vec<u8>) -> Value {
    let r = gc.allocate(Object::new(ObjectFlags::NONE, ObjectPayload::IArray8(bytes)));
    Value::Ref(r)
}

pub fn set_io(gc: &GarbageCollector) -> Value {
    let r = gc.allocate_immortal(Object::new(ObjectFlags::UNIQUE, ObjectPayload::Io));
    Value::Ref(r)
}

pub fn set_pair(gc: &GarbageCollector, a: Value, b: Value) -> Value {
    let r = gc.allocate(Object::new(
        ObjectFlags::NONE,
        ObjectPayload::Tuple(vec![TupleElem::new(a), TupleElem::new(b)]),
    ));
    Value::Ref(r)
}
