//! The stable runtime error taxonomy, kept numerically aligned with
//! `letin_value::consts::ERROR_*` so a caught [`RuntimeError`] round-trips to
//! the same `i32` a native caller or a `letin-loader` relocation failure
//! would see.

use letin_value::consts::*;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("no instruction at the current instruction pointer")]
    NoInstr,
    #[error("incorrect instruction")]
    IncorrectInstr,
    #[error("incorrect value")]
    IncorrectValue,
    #[error("incorrect object")]
    IncorrectObject,
    #[error("incorrect function")]
    IncorrectFun,
    #[error("empty stack")]
    EmptyStack,
    #[error("stack overflow")]
    StackOverflow,
    #[error("out of memory")]
    OutOfMemory,
    #[error("no such function")]
    NoFun,
    #[error("no such global variable")]
    NoGlobalVar,
    #[error("no such local variable")]
    NoLocalVar,
    #[error("no such argument")]
    NoArg,
    #[error("incorrect argument count")]
    IncorrectArgCount,
    #[error("division by zero")]
    DivByZero,
    #[error("index out of bounds")]
    IndexOutOfBounds,
    #[error("unhandled exception")]
    Exception,
    #[error("no entry point")]
    NoEntry,
    #[error("no such native function")]
    NoNativeFun,
    #[error("operation on a already-canceled unique object")]
    UniqueObject,
    #[error("unique object used more than once")]
    AgainUsedUnique,
    #[error("user exception (code {0})")]
    UserException(i32),
    #[error("no expression")]
    NoExpr,
}

impl RuntimeError {
    pub fn as_i32(self) -> i32 {
        match self {
            RuntimeError::NoInstr => ERROR_NO_INSTR,
            RuntimeError::IncorrectInstr => ERROR_INCORRECT_INSTR,
            RuntimeError::IncorrectValue => ERROR_INCORRECT_VALUE,
            RuntimeError::IncorrectObject => ERROR_INCORRECT_OBJECT,
            RuntimeError::IncorrectFun => ERROR_INCORRECT_FUN,
            RuntimeError::EmptyStack => ERROR_EMPTY_STACK,
            RuntimeError::StackOverflow => ERROR_STACK_OVERFLOW,
            RuntimeError::OutOfMemory => ERROR_OUT_OF_MEMORY,
            RuntimeError::NoFun => ERROR_NO_FUN,
            RuntimeError::NoGlobalVar => ERROR_NO_GLOBAL_VAR,
            RuntimeError::NoLocalVar => ERROR_NO_LOCAL_VAR,
            RuntimeError::NoArg => ERROR_NO_ARG,
            RuntimeError::IncorrectArgCount => ERROR_INCORRECT_ARG_COUNT,
            RuntimeError::DivByZero => ERROR_DIV_BY_ZERO,
            RuntimeError::IndexOutOfBounds => ERROR_INDEX_OUT_OF_BOUNDS,
            RuntimeError::Exception => ERROR_EXCEPTION,
            RuntimeError::NoEntry => ERROR_NO_ENTRY,
            RuntimeError::NoNativeFun => ERROR_NO_NATIVE_FUN,
            RuntimeError::UniqueObject => ERROR_UNIQUE_OBJECT,
            RuntimeError::AgainUsedUnique => ERROR_AGAIN_USED_UNIQUE,
            RuntimeError::UserException(_) => ERROR_USER_EXCEPTION,
            RuntimeError::NoExpr => ERROR_NO_EXPR,
        }
    }

    /// Reconstruct a [`RuntimeError`] from a wire code. `user_payload` supplies
    /// the thrown value for [`ERROR_USER_EXCEPTION`]; ignored otherwise.
    pub fn from_i32(code: i32, user_payload: i32) -> Option<RuntimeError> {
        Some(match code {
            ERROR_NO_INSTR => RuntimeError::NoInstr,
            ERROR_INCORRECT_INSTR => RuntimeError::IncorrectInstr,
            ERROR_INCORRECT_VALUE => RuntimeError::IncorrectValue,
            ERROR_INCORRECT_OBJECT => RuntimeError::IncorrectObject,
            ERROR_INCORRECT_FUN => RuntimeError::IncorrectFun,
            ERROR_EMPTY_STACK => RuntimeError::EmptyStack,
            ERROR_STACK_OVERFLOW => RuntimeError::StackOverflow,
            ERROR_OUT_OF_MEMORY => RuntimeError::OutOfMemory,
            ERROR_NO_FUN => RuntimeError::NoFun,
            ERROR_NO_GLOBAL_VAR => RuntimeError::NoGlobalVar,
            ERROR_NO_LOCAL_VAR => RuntimeError::NoLocalVar,
            ERROR_NO_ARG => RuntimeError::NoArg,
            ERROR_INCORRECT_ARG_COUNT => RuntimeError::IncorrectArgCount,
            ERROR_DIV_BY_ZERO => RuntimeError::DivByZero,
            ERROR_INDEX_OUT_OF_BOUNDS => RuntimeError::IndexOutOfBounds,
            ERROR_EXCEPTION => RuntimeError::Exception,
            ERROR_NO_ENTRY => RuntimeError::NoEntry,
            ERROR_NO_NATIVE_FUN => RuntimeError::NoNativeFun,
            ERROR_UNIQUE_OBJECT => RuntimeError::UniqueObject,
            ERROR_AGAIN_USED_UNIQUE => RuntimeError::AgainUsedUnique,
            ERROR_USER_EXCEPTION => RuntimeError::UserException(user_payload),
            ERROR_NO_EXPR => RuntimeError::NoExpr,
            _ => return None,
        })
    }
}

/// A propagating runtime error together with the value bound to it, if any
/// (the operand of `THROW`, or the error value produced by a failing op).
/// Caught by the nearest `TRY` in the dynamic call chain; uncaught, it
/// terminates the thread.
#[derive(Debug, Clone, Copy)]
pub struct Thrown {
    pub error: RuntimeError,
    pub code: i32,
}

impl Thrown {
    pub fn new(error: RuntimeError) -> Thrown {
        Thrown { code: error.as_i32(), error }
    }

    pub fn user(code: i32) -> Thrown {
        Thrown { error: RuntimeError::UserException(code), code: ERROR_USER_EXCEPTION }
    }
}

pub type Result<T> = std::result::Result<T, Thrown>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_round_trip() {
        for err in [
            RuntimeError::NoInstr,
            RuntimeError::DivByZero,
            RuntimeError::IndexOutOfBounds,
            RuntimeError::AgainUsedUnique,
        ] {
            let code = err.as_i32();
            assert_eq!(RuntimeError::from_i32(code, 0), Some(err));
        }
    }

    #[test]
    fn user_exception_carries_its_payload() {
        let thrown = Thrown::user(42);
        assert_eq!(thrown.code, ERROR_USER_EXCEPTION);
        assert_eq!(RuntimeError::from_i32(thrown.code, 42), Some(RuntimeError::UserException(42)));
    }
}
