use std::cell::RefCell;
use std::ffi::CString;

use bm_matrix::MatmulError;

use crate::types::BMStatus;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Record `msg` as this thread's last error and return `status`.
pub fn fail(status: BMStatus, msg: impl Into<String>) -> BMStatus {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg.into()).ok();
    });
    status
}

/// Map a matmul error to its status code, recording the message.
pub fn fail_matmul(err: MatmulError) -> BMStatus {
    let status = match err {
        MatmulError::DimensionMismatch { .. } => BMStatus::ErrorDimensionMismatch,
        MatmulError::ThreadPool(_) => BMStatus::ErrorInternal,
    };
    fail(status, err.to_string())
}

/// Take the last error message, leaving `None` in its place.
pub fn take_last_error() -> Option<CString> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}
