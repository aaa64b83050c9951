use thiserror::Error;

#[derive(Debug, Error)]
pub enum GcError {
    #[error("out of memory allocating {requested} bytes")]
    OutOfMemory { requested: usize },
    #[error("{field} must be {constraint}, got {value}")]
    InvalidConfig { field: &'static str, constraint: &'static str, value: String },
    #[error("a GC lock was poisoned by a panicking thread")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, GcError>;
