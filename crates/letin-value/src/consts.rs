//! Numeric identities that cross the ABI boundary: value types, object types,
//! default native function indices, and the error taxonomy.
//!
//! These mirror `letin/const.hpp` field-for-field. Native code and loaded modules
//! observe these as plain integers, so the values themselves, not just their names,
//! are part of the contract and must never be renumbered.

pub const VALUE_TYPE_INT: i32 = 0;
pub const VALUE_TYPE_FLOAT: i32 = 1;
pub const VALUE_TYPE_REF: i32 = 2;
pub const VALUE_TYPE_PAIR: i32 = 3;
pub const VALUE_TYPE_CANCELED_REF: i32 = 4;
pub const VALUE_TYPE_LAZY_VALUE_REF: i32 = 5;
pub const VALUE_TYPE_LOCKED_LAZY_VALUE_REF: i32 = 6;
pub const VALUE_TYPE_LAZILY_CANCELED: i32 = 64;
pub const VALUE_TYPE_ERROR: i32 = -1;

pub const OBJECT_TYPE_IARRAY8: i32 = 0;
pub const OBJECT_TYPE_IARRAY16: i32 = 1;
pub const OBJECT_TYPE_IARRAY32: i32 = 2;
pub const OBJECT_TYPE_IARRAY64: i32 = 3;
pub const OBJECT_TYPE_SFARRAY: i32 = 4;
pub const OBJECT_TYPE_DFARRAY: i32 = 5;
pub const OBJECT_TYPE_RARRAY: i32 = 6;
pub const OBJECT_TYPE_TUPLE: i32 = 7;
pub const OBJECT_TYPE_IO: i32 = 8;
pub const OBJECT_TYPE_LAZY_VALUE: i32 = 9;
pub const OBJECT_TYPE_NATIVE_OBJECT: i32 = 10;
// Internal-only object kinds used by the memoization cache (letin-eval); numbered
// past the public kinds the way `vm/priv.hpp` numbers them from `INTERNAL` up.
pub const OBJECT_TYPE_HASH_TABLE: i32 = 11;
pub const OBJECT_TYPE_HASH_TABLE_ENTRY: i32 = 12;

pub const OBJECT_TYPE_UNIQUE: i32 = 256;
pub const OBJECT_TYPE_INTERNAL: i32 = 512;
pub const OBJECT_TYPE_ERROR: i32 = -1;

pub const ERROR_SUCCESS: i32 = 0;
pub const ERROR_NO_INSTR: i32 = 1;
pub const ERROR_INCORRECT_INSTR: i32 = 2;
pub const ERROR_INCORRECT_VALUE: i32 = 3;
pub const ERROR_INCORRECT_OBJECT: i32 = 4;
pub const ERROR_INCORRECT_FUN: i32 = 5;
pub const ERROR_EMPTY_STACK: i32 = 6;
pub const ERROR_STACK_OVERFLOW: i32 = 7;
pub const ERROR_OUT_OF_MEMORY: i32 = 8;
pub const ERROR_NO_FUN: i32 = 9;
pub const ERROR_NO_GLOBAL_VAR: i32 = 10;
pub const ERROR_NO_LOCAL_VAR: i32 = 11;
pub const ERROR_NO_ARG: i32 = 12;
pub const ERROR_INCORRECT_ARG_COUNT: i32 = 13;
pub const ERROR_DIV_BY_ZERO: i32 = 14;
pub const ERROR_INDEX_OUT_OF_BOUNDS: i32 = 15;
pub const ERROR_EXCEPTION: i32 = 16;
pub const ERROR_NO_ENTRY: i32 = 17;
pub const ERROR_NO_NATIVE_FUN: i32 = 18;
pub const ERROR_UNIQUE_OBJECT: i32 = 19;
pub const ERROR_AGAIN_USED_UNIQUE: i32 = 20;
pub const ERROR_USER_EXCEPTION: i32 = 21;
pub const ERROR_NO_EXPR: i32 = 22;

pub const NATIVE_FUN_ATOI: u32 = 0;
pub const NATIVE_FUN_ITOA: u32 = 1;
pub const NATIVE_FUN_ATOF: u32 = 2;
pub const NATIVE_FUN_FTOA: u32 = 3;
pub const NATIVE_FUN_GET_CHAR: u32 = 4;
pub const NATIVE_FUN_PUT_CHAR: u32 = 5;
pub const NATIVE_FUN_GET_LINE: u32 = 6;
pub const NATIVE_FUN_PUT_STRING: u32 = 7;

pub const MAX_DEFAULT_NATIVE_FUN_INDEX: u32 = 7;
pub const MIN_UNRESERVED_NATIVE_FUN_INDEX: u32 = 1024;

pub const LOADING_ERROR_IO: i32 = 0;
pub const LOADING_ERROR_FORMAT: i32 = 1;
pub const LOADING_ERROR_NO_FUN_SYM: i32 = 2;
pub const LOADING_ERROR_FUN_SYM: i32 = 3;
pub const LOADING_ERROR_NO_VAR_SYM: i32 = 4;
pub const LOADING_ERROR_VAR_SYM: i32 = 5;
pub const LOADING_ERROR_RELOC: i32 = 6;
pub const LOADING_ERROR_ENTRY: i32 = 7;
pub const LOADING_ERROR_NO_RELOC: i32 = 8;
pub const LOADING_ERROR_FUN_INDEX: i32 = 9;
pub const LOADING_ERROR_VAR_INDEX: i32 = 10;
pub const LOADING_ERROR_ALLOC: i32 = 11;
pub const LOADING_ERROR_NO_NATIVE_FUN_SYM: i32 = 12;

pub const FORK_HANDLER_PRIO_ALLOC: u8 = 0;
pub const FORK_HANDLER_PRIO_GC: u8 = 1;
pub const FORK_HANDLER_PRIO_INTERNAL: u8 = 2;
pub const FORK_HANDLER_PRIO_EVAL_STRATEGY: u8 = 3;
pub const FORK_HANDLER_PRIO_NATIVE_FUN: u8 = 4;
pub const FORK_HANDLER_PRIO_VM: u8 = 5;

pub const EVAL_STRATEGY_LAZY: u32 = 1 << 0;
pub const EVAL_STRATEGY_MEMO: u32 = 1 << 1;
pub const MAX_EVAL_STRATEGY: u32 = 1 << 1;
