use thiserror::Error;

#[derive(Debug, Error)]
pub enum NativeError {
    #[error("native function index out of range: {0}")]
    UnknownFun(u32),
    #[error("native library {0} exposes no `new_native_function_handler` symbol")]
    BadLibrary(String),
}

pub type Result<T> = std::result::Result<T, NativeError>;
