use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("missing value for argument {0}")]
    MissingValue(String),
    #[error("invalid value {value:?} for argument {flag}: {reason}")]
    InvalidValue {
        flag: String,
        value: String,
        reason: String,
    },
    #[error("matrix of {rows}x{cols} elements is too large")]
    TooLarge { rows: usize, cols: usize },
    #[error("unknown argument: {0}")]
    UnknownArgument(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("matmul error: {0}")]
    Matmul(#[from] bm_matrix::MatmulError),
}

pub type Result<T> = std::result::Result<T, BenchError>;
