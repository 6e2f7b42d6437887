use bm_matrix::{Matrix, TilePlan};

/// Opaque matrix handle owned by the C caller.
pub struct BMMatrix {
    pub matrix: Matrix,
}

/// Opaque handle for a prepared block multiplication.
///
/// Stores the tile grids together with the three matrix handles it was
/// prepared for. The handles must stay alive and keep their shapes until the
/// plan is closed.
pub struct BMPlan {
    pub tiles: TilePlan,
    pub left: *const BMMatrix,
    pub right: *const BMMatrix,
    pub result: *mut BMMatrix,
}

impl BMPlan {
    /// True if the result handle is also one of the operands.
    pub fn result_aliases_operand(&self) -> bool {
        let result = self.result as *const BMMatrix;
        result == self.left || result == self.right
    }
}
