//! The loading error taxonomy, numerically aligned with
//! `letin_value::consts::LOADING_ERROR_*`.

use letin_value::consts::*;
use std::fmt;
use thiserror::Error;

/// One module's failure within a multi-module link, tagged with the index
/// of the module that produced it (§7: "one failure does not prevent
/// reporting the rest").
#[derive(Debug)]
pub struct ModuleError {
    pub module: usize,
    pub error: LoaderError,
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "module {}: {}", self.module, self.error)
    }
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed module format: {0}")]
    Format(String),
    #[error("no such function symbol: {0}")]
    NoFunSym(String),
    #[error("duplicate function symbol: {0}")]
    FunSym(String),
    #[error("no such variable symbol: {0}")]
    NoVarSym(String),
    #[error("duplicate variable symbol: {0}")]
    VarSym(String),
    #[error("invalid relocation in module {module}, function {fun_index}, instruction {instr_index}")]
    Reloc { module: usize, fun_index: u32, instr_index: u32 },
    #[error("no entry point function")]
    Entry,
    #[error("missing relocation table")]
    NoReloc,
    #[error("function index out of range: {0}")]
    FunIndex(u32),
    #[error("global variable index out of range: {0}")]
    VarIndex(u32),
    #[error("allocation failure while loading")]
    Alloc,
    #[error("no such native function symbol: {0}")]
    NoNativeFunSym(String),
    #[error("loading failed in {} module(s)", errors.len())]
    Modules { errors: Vec<ModuleError> },
}

impl LoaderError {
    pub fn as_i32(&self) -> i32 {
        match self {
            LoaderError::Io(_) => LOADING_ERROR_IO,
            LoaderError::Format(_) => LOADING_ERROR_FORMAT,
            LoaderError::NoFunSym(_) => LOADING_ERROR_NO_FUN_SYM,
            LoaderError::FunSym(_) => LOADING_ERROR_FUN_SYM,
            LoaderError::NoVarSym(_) => LOADING_ERROR_NO_VAR_SYM,
            LoaderError::VarSym(_) => LOADING_ERROR_VAR_SYM,
            LoaderError::Reloc { .. } => LOADING_ERROR_RELOC,
            LoaderError::Entry => LOADING_ERROR_ENTRY,
            LoaderError::NoReloc => LOADING_ERROR_NO_RELOC,
            LoaderError::FunIndex(_) => LOADING_ERROR_FUN_INDEX,
            LoaderError::VarIndex(_) => LOADING_ERROR_VAR_INDEX,
            LoaderError::Alloc => LOADING_ERROR_ALLOC,
            LoaderError::NoNativeFunSym(_) => LOADING_ERROR_NO_NATIVE_FUN_SYM,
            LoaderError::Modules { errors } => {
                errors.first().map(|e| e.error.as_i32()).unwrap_or(LOADING_ERROR_FORMAT)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, LoaderError>;
