use crate::consts::*;
use crate::value::{Ref, Value, ValueType};

/// The base kind of an object, independent of the `UNIQUE`/`INTERNAL` flag bits
/// that may be OR'd onto its numeric encoding (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    IArray8,
    IArray16,
    IArray32,
    IArray64,
    SfArray,
    DfArray,
    RArray,
    Tuple,
    Io,
    LazyValue,
    NativeObject,
    HashTable,
    HashTableEntry,
}

impl ObjectKind {
    pub fn base_i32(self) -> i32 {
        match self {
            ObjectKind::IArray8 => OBJECT_TYPE_IARRAY8,
            ObjectKind::IArray16 => OBJECT_TYPE_IARRAY16,
            ObjectKind::IArray32 => OBJECT_TYPE_IARRAY32,
            ObjectKind::IArray64 => OBJECT_TYPE_IARRAY64,
            ObjectKind::SfArray => OBJECT_TYPE_SFARRAY,
            ObjectKind::DfArray => OBJECT_TYPE_DFARRAY,
            ObjectKind::RArray => OBJECT_TYPE_RARRAY,
            ObjectKind::Tuple => OBJECT_TYPE_TUPLE,
            ObjectKind::Io => OBJECT_TYPE_IO,
            ObjectKind::LazyValue => OBJECT_TYPE_LAZY_VALUE,
            ObjectKind::NativeObject => OBJECT_TYPE_NATIVE_OBJECT,
            ObjectKind::HashTable => OBJECT_TYPE_HASH_TABLE,
            ObjectKind::HashTableEntry => OBJECT_TYPE_HASH_TABLE_ENTRY,
        }
    }

    pub fn from_base_i32(v: i32) -> Option<Self> {
        Some(match v {
            OBJECT_TYPE_IARRAY8 => ObjectKind::IArray8,
            OBJECT_TYPE_IARRAY16 => ObjectKind::IArray16,
            OBJECT_TYPE_IARRAY32 => ObjectKind::IArray32,
            OBJECT_TYPE_IARRAY64 => ObjectKind::IArray64,
            OBJECT_TYPE_SFARRAY => ObjectKind::SfArray,
            OBJECT_TYPE_DFARRAY => ObjectKind::DfArray,
            OBJECT_TYPE_RARRAY => ObjectKind::RArray,
            OBJECT_TYPE_TUPLE => ObjectKind::Tuple,
            OBJECT_TYPE_IO => ObjectKind::Io,
            OBJECT_TYPE_LAZY_VALUE => ObjectKind::LazyValue,
            OBJECT_TYPE_NATIVE_OBJECT => ObjectKind::NativeObject,
            OBJECT_TYPE_HASH_TABLE => ObjectKind::HashTable,
            OBJECT_TYPE_HASH_TABLE_ENTRY => ObjectKind::HashTableEntry,
            _ => return None,
        })
    }
}

/// The `UNIQUE`/`INTERNAL` bits that may be OR'd onto an object-type encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectFlags {
    pub unique: bool,
    pub internal: bool,
}

impl ObjectFlags {
    pub const NONE: ObjectFlags = ObjectFlags { unique: false, internal: false };
    pub const UNIQUE: ObjectFlags = ObjectFlags { unique: true, internal: false };

    pub fn to_bits(self) -> i32 {
        (if self.unique { OBJECT_TYPE_UNIQUE } else { 0 })
            | (if self.internal { OBJECT_TYPE_INTERNAL } else { 0 })
    }
}

/// One element of a [`ObjectPayload::Tuple`]: the raw slot plus its *current* type
/// tag, stored separately so that cancelling a unique element only has to rewrite
/// the tag to `CanceledRef` — the underlying reference stays in place and
/// traceable by the GC (§3 invariant 2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TupleElem {
    pub ty: ValueType,
    pub value: Value,
}

impl TupleElem {
    pub fn new(value: Value) -> Self {
        TupleElem { ty: value.value_type(), value }
    }

    pub fn cancel(&mut self) {
        self.ty = ValueType::CanceledRef;
    }
}

/// A thunk: a captured function index and its pending arguments, forced to a value
/// on first demand (§4.3).
#[derive(Debug, Clone)]
pub struct LazyValue {
    pub fun_index: u32,
    pub args: Vec<Value>,
    /// Result value type the callee declares, needed so a checker can validate a
    /// forced value without re-deriving it from the function table.
    pub result_type: ValueType,
    /// Set once `value` holds the final, non-lazy result.
    pub forced: bool,
    pub value: Value,
    /// Mirrors `VALUE_TYPE_LOCKED_LAZY_VALUE_REF` vs `VALUE_TYPE_LAZY_VALUE_REF`:
    /// whether the forced value must be written back under the thunk's lock for
    /// sharing with concurrent forcers.
    pub must_be_shared: bool,
}

impl LazyValue {
    pub fn new(fun_index: u32, args: Vec<Value>, result_type: ValueType, must_be_shared: bool) -> Self {
        LazyValue {
            fun_index,
            args,
            result_type,
            forced: false,
            value: Value::Error(ERROR_SUCCESS),
            must_be_shared,
        }
    }
}

/// A host-defined opaque payload (`NATIVE_OBJECT`), with virtual dispatch in place
/// of the source's vtable (`finalize`/`copy`/`hash`).
pub trait NativeObjectPayload: std::fmt::Debug + Send + Sync {
    fn type_name(&self) -> &'static str;
    fn hash_value(&self) -> u64;
}

/// The data carried by an object, keyed by [`ObjectKind`].
#[derive(Debug)]
pub enum ObjectPayload {
    IArray8(Vec<u8>),
    IArray16(Vec<i16>),
    IArray32(Vec<i32>),
    IArray64(Vec<i64>),
    SfArray(Vec<f32>),
    DfArray(Vec<f64>),
    RArray(Vec<Value>),
    Tuple(Vec<TupleElem>),
    Io,
    LazyValue(LazyValue),
    NativeObject(Box<dyn NativeObjectPayload>),
    /// Internal memoization-cache object types (`vm/priv.hpp`'s
    /// `OBJECT_TYPE_HASH_TABLE*`); opaque to everything but `letin-eval`.
    HashTable(Vec<Option<Ref>>),
    HashTableEntry { key: Vec<Value>, result: Value },
}

impl ObjectPayload {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectPayload::IArray8(_) => ObjectKind::IArray8,
            ObjectPayload::IArray16(_) => ObjectKind::IArray16,
            ObjectPayload::IArray32(_) => ObjectKind::IArray32,
            ObjectPayload::IArray64(_) => ObjectKind::IArray64,
            ObjectPayload::SfArray(_) => ObjectKind::SfArray,
            ObjectPayload::DfArray(_) => ObjectKind::DfArray,
            ObjectPayload::RArray(_) => ObjectKind::RArray,
            ObjectPayload::Tuple(_) => ObjectKind::Tuple,
            ObjectPayload::Io => ObjectKind::Io,
            ObjectPayload::LazyValue(_) => ObjectKind::LazyValue,
            ObjectPayload::NativeObject(_) => ObjectKind::NativeObject,
            ObjectPayload::HashTable(_) => ObjectKind::HashTable,
            ObjectPayload::HashTableEntry { .. } => ObjectKind::HashTableEntry,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ObjectPayload::IArray8(v) => v.len(),
            ObjectPayload::IArray16(v) => v.len(),
            ObjectPayload::IArray32(v) => v.len(),
            ObjectPayload::IArray64(v) => v.len(),
            ObjectPayload::SfArray(v) => v.len(),
            ObjectPayload::DfArray(v) => v.len(),
            ObjectPayload::RArray(v) => v.len(),
            ObjectPayload::Tuple(v) => v.len(),
            ObjectPayload::Io => 0,
            ObjectPayload::LazyValue(_) => 0,
            ObjectPayload::NativeObject(_) => 0,
            ObjectPayload::HashTable(v) => v.len(),
            ObjectPayload::HashTableEntry { .. } => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The logical contents of an object: its flags plus its payload. GC link fields
/// (list-next, mark state) are not part of this type — `letin-gc` prepends them in
/// its own allocation header, consistent with the "arena with typed headers"
/// design note rather than baking GC bookkeeping into the value model.
#[derive(Debug)]
pub struct Object {
    pub flags: ObjectFlags,
    pub payload: ObjectPayload,
}

impl Object {
    pub fn new(flags: ObjectFlags, payload: ObjectPayload) -> Self {
        Object { flags, payload }
    }

    pub fn type_i32(&self) -> i32 {
        self.payload.kind().base_i32() | self.flags.to_bits()
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Read element `i` as a [`Value`], the way `R*NTH` instructions and native
    /// checkers do. Arrays of scalars widen their element to the matching
    /// [`Value`] variant; `RArray`/`Tuple` return the stored value directly.
    pub fn elem(&self, i: usize) -> Option<Value> {
        match &self.payload {
            ObjectPayload::IArray8(v) => v.get(i).map(|&b| Value::Int(b as i64)),
            ObjectPayload::IArray16(v) => v.get(i).map(|&x| Value::Int(x as i64)),
            ObjectPayload::IArray32(v) => v.get(i).map(|&x| Value::Int(x as i64)),
            ObjectPayload::IArray64(v) => v.get(i).map(|&x| Value::Int(x)),
            ObjectPayload::SfArray(v) => v.get(i).map(|&x| Value::Float(x as f64)),
            ObjectPayload::DfArray(v) => v.get(i).map(|&x| Value::Float(x)),
            ObjectPayload::RArray(v) => v.get(i).copied(),
            ObjectPayload::Tuple(v) => v.get(i).map(|e| e.value),
            _ => None,
        }
    }
}
