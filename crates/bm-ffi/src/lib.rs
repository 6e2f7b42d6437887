mod error;
mod handle;
mod types;

pub use error::*;
pub use handle::*;
pub use types::*;

use std::ffi::CString;
use std::os::raw::c_char;

use bm_matrix::{
    multiply, multiply_parallel, vanilla_mul, vanilla_mul_parallel, Matrix, TilePlan, TileSize,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Execute a closure that returns a `BMStatus`, catching any panics
/// and converting them into `BMStatus::ErrorInternal`.
fn catch_panic<F: FnOnce() -> BMStatus + std::panic::UnwindSafe>(f: F) -> BMStatus {
    match std::panic::catch_unwind(f) {
        Ok(status) => status,
        Err(_) => fail(BMStatus::ErrorInternal, "internal panic"),
    }
}

/// Allocate a zero-filled `rows x cols` matrix.
///
/// On success, writes the new handle into `*mat_out`. The caller must later
/// call `bm_matrix_free` to release it.
#[no_mangle]
pub extern "C" fn bm_matrix_create(
    rows: usize,
    cols: usize,
    mat_out: *mut *mut BMMatrix,
) -> BMStatus {
    catch_panic(|| {
        if mat_out.is_null() {
            return fail(BMStatus::ErrorInvalidArgument, "mat_out is null");
        }
        if rows.checked_mul(cols).is_none() {
            return fail(
                BMStatus::ErrorInvalidArgument,
                format!("matrix of {}x{} elements is too large", rows, cols),
            );
        }
        let handle = Box::new(BMMatrix {
            matrix: Matrix::zeros(rows, cols),
        });
        unsafe {
            *mat_out = Box::into_raw(handle);
        }
        BMStatus::Ok
    })
}

/// Release a matrix created by `bm_matrix_create`.
///
/// Passing a null pointer is a no-op. Any plan still referring to the
/// matrix must be closed first.
#[no_mangle]
pub unsafe extern "C" fn bm_matrix_free(mat: *mut BMMatrix) -> BMStatus {
    if mat.is_null() {
        return BMStatus::Ok;
    }
    drop(Box::from_raw(mat));
    BMStatus::Ok
}

/// Number of rows, or 0 for a null handle.
#[no_mangle]
pub unsafe extern "C" fn bm_matrix_rows(mat: *const BMMatrix) -> usize {
    mat.as_ref().map_or(0, |m| m.matrix.rows())
}

/// Number of columns, or 0 for a null handle.
#[no_mangle]
pub unsafe extern "C" fn bm_matrix_cols(mat: *const BMMatrix) -> usize {
    mat.as_ref().map_or(0, |m| m.matrix.cols())
}

/// Pointer to the `rows * cols` row-major elements, or null for a null
/// handle. Valid until the matrix is freed.
#[no_mangle]
pub unsafe extern "C" fn bm_matrix_data(mat: *mut BMMatrix) -> *mut f32 {
    match mat.as_mut() {
        Some(m) => m.matrix.as_mut_slice().as_mut_ptr(),
        None => std::ptr::null_mut(),
    }
}

/// Set every element to zero.
#[no_mangle]
pub unsafe extern "C" fn bm_matrix_zero(mat: *mut BMMatrix) -> BMStatus {
    catch_panic(|| match unsafe { mat.as_mut() } {
        Some(m) => {
            m.matrix.fill_zero();
            BMStatus::Ok
        }
        None => fail(BMStatus::ErrorInvalidArgument, "null matrix"),
    })
}

/// Fill with values drawn uniformly from `[0, max_value)` using a generator
/// seeded with `seed`.
#[no_mangle]
pub unsafe extern "C" fn bm_matrix_fill_random(
    mat: *mut BMMatrix,
    max_value: f32,
    seed: u64,
) -> BMStatus {
    catch_panic(|| {
        let m = match unsafe { mat.as_mut() } {
            Some(m) => m,
            None => return fail(BMStatus::ErrorInvalidArgument, "null matrix"),
        };
        if !max_value.is_finite() || max_value < 0.0 {
            return fail(
                BMStatus::ErrorInvalidArgument,
                format!("invalid max_value {}", max_value),
            );
        }
        let mut rng = StdRng::seed_from_u64(seed);
        m.matrix.fill_random(max_value, &mut rng);
        BMStatus::Ok
    })
}

/// Prepare a block multiplication `c += a @ b`.
///
/// `row_split` tiles the rows of `a` and the columns of `b`; `col_split`
/// tiles the shared dimension. Non-positive splits disable tiling on that
/// axis. On success, writes the plan into `*plan_out`; close it with
/// `bm_plan_close` before freeing any of the matrices.
#[no_mangle]
pub unsafe extern "C" fn bm_plan_prepare(
    a: *const BMMatrix,
    b: *const BMMatrix,
    c: *mut BMMatrix,
    row_split: i64,
    col_split: i64,
    plan_out: *mut *mut BMPlan,
) -> BMStatus {
    catch_panic(|| {
        if a.is_null() || b.is_null() || c.is_null() || plan_out.is_null() {
            return fail(BMStatus::ErrorInvalidArgument, "null argument");
        }
        let (left, right, result) = unsafe { (&(*a).matrix, &(*b).matrix, &(*c).matrix) };
        let tiles = match TilePlan::new(
            left.shape(),
            right.shape(),
            result.shape(),
            TileSize::from_split(row_split),
            TileSize::from_split(col_split),
        ) {
            Ok(t) => t,
            Err(e) => return fail_matmul(e),
        };
        let plan = BMPlan {
            tiles,
            left: a,
            right: b,
            result: c,
        };
        if plan.result_aliases_operand() {
            return fail(
                BMStatus::ErrorInvalidArgument,
                "result matrix must differ from both operands",
            );
        }
        unsafe {
            *plan_out = Box::into_raw(Box::new(plan));
        }
        BMStatus::Ok
    })
}

/// Run a prepared plan, accumulating into its result matrix.
///
/// The result is not cleared first; call `bm_matrix_zero` beforehand for a
/// plain product. With `parallel`, right tile columns are spread across
/// the global worker pool.
#[no_mangle]
pub unsafe extern "C" fn bm_plan_multiply(plan: *mut BMPlan, parallel: bool) -> BMStatus {
    catch_panic(|| {
        let plan = match unsafe { plan.as_mut() } {
            Some(p) => p,
            None => return fail(BMStatus::ErrorInvalidArgument, "null plan"),
        };
        let (left, right, result) = unsafe {
            (
                &(*plan.left).matrix,
                &(*plan.right).matrix,
                &mut (*plan.result).matrix,
            )
        };
        let mut bound = match plan.tiles.clone().bind(left, right, result) {
            Ok(b) => b,
            Err(e) => return fail_matmul(e),
        };
        if parallel {
            multiply_parallel(&mut bound);
        } else {
            multiply(&mut bound);
        }
        BMStatus::Ok
    })
}

/// Release a plan created by `bm_plan_prepare`. The matrices are untouched.
///
/// Passing a null pointer is a no-op.
#[no_mangle]
pub unsafe extern "C" fn bm_plan_close(plan: *mut BMPlan) -> BMStatus {
    if plan.is_null() {
        return BMStatus::Ok;
    }
    drop(Box::from_raw(plan));
    BMStatus::Ok
}

/// Untiled `c = a @ b`, optionally parallel over the rows of `c`.
#[no_mangle]
pub unsafe extern "C" fn bm_vanilla_mul(
    a: *const BMMatrix,
    b: *const BMMatrix,
    c: *mut BMMatrix,
    parallel: bool,
) -> BMStatus {
    catch_panic(|| {
        if a.is_null() || b.is_null() || c.is_null() {
            return fail(BMStatus::ErrorInvalidArgument, "null argument");
        }
        let c_const = c as *const BMMatrix;
        if c_const == a || c_const == b {
            return fail(
                BMStatus::ErrorInvalidArgument,
                "result matrix must differ from both operands",
            );
        }
        let (left, right, result) = unsafe { (&(*a).matrix, &(*b).matrix, &mut (*c).matrix) };
        let res = if parallel {
            vanilla_mul_parallel(left, right, result)
        } else {
            vanilla_mul(left, right, result)
        };
        match res {
            Ok(()) => BMStatus::Ok,
            Err(e) => fail_matmul(e),
        }
    })
}

/// Retrieve the last error message.
///
/// Returns a pointer to a C string describing the most recent error on the
/// calling thread, or null if there is none. The caller must free the
/// returned string with `bm_free_string`.
#[no_mangle]
pub extern "C" fn bm_last_error() -> *const c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null(),
    }
}

/// Free a string previously returned by `bm_last_error`.
#[no_mangle]
pub unsafe extern "C" fn bm_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
