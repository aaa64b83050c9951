use crate::value::ValueType;
use thiserror::Error;

/// Errors raised while constructing or reading a [`crate::Value`]/[`crate::Object`]
/// directly, outside of a running interpreter (which instead reports these through
/// its own `RuntimeError` taxonomy, §7). Used by `letin-native`'s checkers and by
/// tests that build values by hand.
#[derive(Debug, Error, PartialEq)]
pub enum ValueError {
    #[error("expected a {expected:?} value, found {actual:?}")]
    UnexpectedType { expected: ValueType, actual: ValueType },
    #[error("index {index} out of bounds for object of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("object already used as a unique value")]
    AgainUsedUnique,
    #[error("a unique object cannot be stored into a shared container")]
    UniqueObject,
}

pub type Result<T> = std::result::Result<T, ValueError>;
