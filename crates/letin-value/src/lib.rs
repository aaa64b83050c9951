//! The value and object model of the letin virtual machine (§4.1).
//!
//! This crate owns only the *shape* of data: the tagged [`Value`] union, the
//! [`Object`] variants it may reference, and the numeric identities ([`consts`])
//! that are part of the on-disk module format and the native-function ABI.
//! Allocation, garbage collection, and the interpreter that executes bytecode
//! against these types live in `letin-gc` and `letin-vm` respectively.

pub mod consts;
mod error;
mod object;
mod value;

pub use error::{Result, ValueError};
pub use object::{
    LazyValue, NativeObjectPayload, Object, ObjectFlags, ObjectKind, ObjectPayload, TupleElem,
};
pub use value::{Ref, Value, ValueType};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_round_trips_through_i32() {
        for ty in [
            ValueType::Int,
            ValueType::Float,
            ValueType::Ref,
            ValueType::Pair,
            ValueType::CanceledRef,
            ValueType::LazyValueRef,
            ValueType::LockedLazyValueRef,
            ValueType::Error,
        ] {
            assert_eq!(ValueType::from_i32(ty.to_i32()), Some(ty));
        }
    }

    #[test]
    fn cancel_unique_produces_canceled_ref_and_rejects_reuse() {
        let r = unsafe { Ref::from_raw(0x1000 as *mut ()) };
        let v = Value::Ref(r);
        let (extracted, remaining) = v.cancel_unique().unwrap();
        assert_eq!(extracted, r);
        assert_eq!(remaining, Value::CanceledRef(r));
        assert_eq!(remaining.cancel_unique(), Err(ValueError::AgainUsedUnique));
    }

    #[test]
    fn tuple_elem_cancel_keeps_ref_readable_by_gc_but_not_by_program() {
        let r = unsafe { Ref::from_raw(0x2000 as *mut ()) };
        let mut elem = TupleElem::new(Value::Ref(r));
        assert_eq!(elem.ty, ValueType::Ref);
        elem.cancel();
        assert_eq!(elem.ty, ValueType::CanceledRef);
        // The slot's value is untouched, so a GC trace over tuple elements still
        // finds the reference even though the program can no longer read it.
        assert_eq!(elem.value, Value::Ref(r));
    }

    #[test]
    fn object_elem_widens_packed_arrays_to_value() {
        let obj = Object::new(ObjectFlags::NONE, ObjectPayload::IArray8(vec![1, 2, 3]));
        assert_eq!(obj.elem(1), Some(Value::Int(2)));
        assert_eq!(obj.elem(3), None);
        assert_eq!(obj.type_i32(), consts::OBJECT_TYPE_IARRAY8);
    }

    #[test]
    fn unique_flag_is_or_ed_into_type_encoding() {
        let obj = Object::new(ObjectFlags::UNIQUE, ObjectPayload::Io);
        assert_eq!(obj.type_i32(), consts::OBJECT_TYPE_IO | consts::OBJECT_TYPE_UNIQUE);
    }
}
