/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BMStatus {
    Ok = 0,
    ErrorInvalidArgument = 1,
    ErrorDimensionMismatch = 2,
    ErrorInternal = 3,
}
