use letin_value::Object;
use std::cell::Cell;
use std::ptr;

/// A sentinel used to mark "this header has been pushed onto the mark worklist at
/// least once" without it being a real list link. Never dereferenced; only ever
/// compared against.
///
/// Mirrors `mark_sweep_gc.hpp`'s `_S_nil`: a terminator distinct from null so that
/// "unmarked" (`stack_prev == null`) and "marked, currently at the bottom of the
/// worklist" (`stack_prev == &_S_nil`) are different, inspectable states.
pub(crate) fn sentinel() -> *mut GcHeader {
    static SENTINEL_ADDR: u8 = 0;
    &SENTINEL_ADDR as *const u8 as *mut GcHeader
}

/// The GC's own bookkeeping, prepended to every allocated [`Object`] (the "arena
/// with typed headers" design note: the logical object and its GC metadata are
/// separate types, joined only by allocation, never by inheritance).
///
/// `#[repr(C)]` with `object` first is load-bearing: [`header_of`] recovers the
/// header from a `*mut Object` by relying on the "pointer to the first field
/// equals pointer to the struct" guarantee this layout gives.
#[repr(C)]
pub struct GcHeader {
    pub object: Object,
    /// Next header in the collector's singly-linked object list (or null at the
    /// tail). Walked by `sweep`.
    pub(crate) list_next: Cell<*mut GcHeader>,
    /// Doubles as the mark bit and the explicit mark-worklist link: null means
    /// unmarked; non-null (a real header pointer or [`sentinel`]) means marked,
    /// and while actively on the worklist, points at the next item to mark.
    pub(crate) stack_prev: Cell<*mut GcHeader>,
}

impl GcHeader {
    pub(crate) fn new(object: Object) -> Self {
        GcHeader { object, list_next: Cell::new(ptr::null_mut()), stack_prev: Cell::new(ptr::null_mut()) }
    }

    pub(crate) fn is_marked(&self) -> bool {
        !self.stack_prev.get().is_null()
    }

    pub(crate) fn clear_mark(&self) {
        self.stack_prev.set(ptr::null_mut());
    }
}

/// Recover the [`GcHeader`] that owns `object`, by construction identical to the
/// pointer that [`crate::collector::GarbageCollector::allocate`] boxed it from.
///
/// # Safety
/// `object` must be a `&Object` borrowed from a `GcHeader` allocated by this crate
/// (i.e. obtained via [`letin_value::Ref`] pointing at a live `GcHeader`), not an
/// arbitrary stack-local `Object`.
pub(crate) unsafe fn header_of(object: *mut Object) -> *mut GcHeader {
    object as *mut GcHeader
}

/// The inverse of [`header_of`]: the address of the `Object` field within a given
/// header, valid to hand out as a [`letin_value::Ref`]'s payload.
pub(crate) fn object_ptr_of(header: *mut GcHeader) -> *mut Object {
    header as *mut Object
}
