use thiserror::Error;

use crate::shape::Shape;

#[derive(Error, Debug)]
pub enum MatmulError {
    #[error("dimension mismatch: {left} @ {right} cannot produce {result}")]
    DimensionMismatch {
        left: Shape,
        right: Shape,
        result: Shape,
    },
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, MatmulError>;
