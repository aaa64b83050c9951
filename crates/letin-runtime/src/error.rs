use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("module has no entry function")]
    NoEntry,
    #[error("vm error: {0:?}")]
    Vm(letin_vm::Thrown),
    #[error("entry thread panicked")]
    EntryPanicked,
}

impl From<letin_vm::Thrown> for RuntimeError {
    fn from(t: letin_vm::Thrown) -> Self {
        RuntimeError::Vm(t)
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
