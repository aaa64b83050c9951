use crate::consts::*;
use crate::error::ValueError;
use std::fmt;

/// An opaque handle to a heap object.
///
/// `letin-value` does not own allocation or collection; a [`Ref`] is just a tagged
/// pointer into whatever arena `letin-gc` allocated it from. Equality is pointer
/// identity, matching `REQ`/`RNE`'s semantics (§4.2).
#[derive(Clone, Copy, Eq)]
pub struct Ref(pub *mut ());

impl Ref {
    /// # Safety
    /// `ptr` must either be null (never dereferenced, used only as a sentinel by
    /// tests) or point at a valid object allocated by a `letin-gc` collector that
    /// outlives every use of the resulting `Ref`.
    pub unsafe fn from_raw(ptr: *mut ()) -> Self {
        Ref(ptr)
    }

    pub fn as_ptr(self) -> *mut () {
        self.0
    }
}

impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl std::hash::Hash for Ref {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (self.0 as usize).hash(state)
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref({:p})", self.0)
    }
}

// SAFETY: a Ref is just an address; the objects it points to are made safe to share
// across threads by the GC's own locking discipline (§5), not by this type.
unsafe impl Send for Ref {}
unsafe impl Sync for Ref {}

/// The discriminant of a [`Value`], as seen by instructions that check argument
/// shape (`INCORRECT_INSTR` on mismatch) and by the loader's variable-table entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int,
    Float,
    Ref,
    Pair,
    CanceledRef,
    LazyValueRef,
    LockedLazyValueRef,
    Error,
}

impl ValueType {
    pub fn to_i32(self) -> i32 {
        match self {
            ValueType::Int => VALUE_TYPE_INT,
            ValueType::Float => VALUE_TYPE_FLOAT,
            ValueType::Ref => VALUE_TYPE_REF,
            ValueType::Pair => VALUE_TYPE_PAIR,
            ValueType::CanceledRef => VALUE_TYPE_CANCELED_REF,
            ValueType::LazyValueRef => VALUE_TYPE_LAZY_VALUE_REF,
            ValueType::LockedLazyValueRef => VALUE_TYPE_LOCKED_LAZY_VALUE_REF,
            ValueType::Error => VALUE_TYPE_ERROR,
        }
    }

    pub fn from_i32(v: i32) -> Option<Self> {
        Some(match v {
            VALUE_TYPE_INT => ValueType::Int,
            VALUE_TYPE_FLOAT => ValueType::Float,
            VALUE_TYPE_REF => ValueType::Ref,
            VALUE_TYPE_PAIR => ValueType::Pair,
            VALUE_TYPE_CANCELED_REF => ValueType::CanceledRef,
            VALUE_TYPE_LAZY_VALUE_REF => ValueType::LazyValueRef,
            VALUE_TYPE_LOCKED_LAZY_VALUE_REF => ValueType::LockedLazyValueRef,
            VALUE_TYPE_ERROR => ValueType::Error,
            _ => return None,
        })
    }

    /// Whether a value of this type is still lazy and must be forced (§4.3) before a
    /// checker in `letin-native` may inspect it.
    pub fn is_lazy(self) -> bool {
        matches!(self, ValueType::LazyValueRef | ValueType::LockedLazyValueRef)
    }
}

/// A tagged immediate value (§3). Cloning a `Value` never allocates and never
/// touches GC bookkeeping on its own — unique-reference cancellation is a property
/// of *where* a value is stored, enforced by the interpreter and native bridge, not
/// by `Value` itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Ref(Ref),
    CanceledRef(Ref),
    LazyRef(Ref),
    LockedLazyRef(Ref),
    Pair(i32, i32),
    Error(i32),
}

impl Value {
    pub fn value_type(self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Ref(_) => ValueType::Ref,
            Value::CanceledRef(_) => ValueType::CanceledRef,
            Value::LazyRef(_) => ValueType::LazyValueRef,
            Value::LockedLazyRef(_) => ValueType::LockedLazyValueRef,
            Value::Pair(..) => ValueType::Pair,
            Value::Error(_) => ValueType::Error,
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_lazy(self) -> bool {
        self.value_type().is_lazy()
    }

    pub fn as_int(self) -> Result<i64, ValueError> {
        match self {
            Value::Int(i) => Ok(i),
            other => Err(ValueError::UnexpectedType {
                expected: ValueType::Int,
                actual: other.value_type(),
            }),
        }
    }

    pub fn as_float(self) -> Result<f64, ValueError> {
        match self {
            Value::Float(f) => Ok(f),
            other => Err(ValueError::UnexpectedType {
                expected: ValueType::Float,
                actual: other.value_type(),
            }),
        }
    }

    pub fn as_ref(self) -> Result<Ref, ValueError> {
        match self {
            Value::Ref(r) => Ok(r),
            other => Err(ValueError::UnexpectedType {
                expected: ValueType::Ref,
                actual: other.value_type(),
            }),
        }
    }

    /// Consume a unique reference: returns the underlying [`Ref`] and the value the
    /// source slot must now hold (`CanceledRef`), per the uniqueness invariant (§3.1).
    pub fn cancel_unique(self) -> Result<(Ref, Value), ValueError> {
        match self {
            Value::Ref(r) => Ok((r, Value::CanceledRef(r))),
            Value::CanceledRef(_) => Err(ValueError::AgainUsedUnique),
            other => Err(ValueError::UnexpectedType {
                expected: ValueType::Ref,
                actual: other.value_type(),
            }),
        }
    }
}
