//! `bm-matrix` - Dense matrices and tiled block multiplication for block-matmul.
//!
//! This crate provides:
//! - A row-major `Matrix` that owns its buffer
//! - Tile index calculation and `TileGrid`s over a matrix
//! - `build_plan`, which pairs the operand grids of a multiplication
//! - Sequential and parallel block multipliers over a plan
//! - Untiled baseline multipliers used for validation
//! - A `Multiplier` trait unifying all strategies

pub mod baseline;
pub mod block;
pub mod error;
pub mod matrix;
pub mod multiplier;
pub mod plan;
pub mod shape;
pub mod tiling;

// Re-export primary types at the crate root for convenience.
pub use baseline::{vanilla_mul, vanilla_mul_parallel};
pub use block::{multiply, multiply_parallel, multiply_parallel_in};
pub use error::{MatmulError, Result};
pub use matrix::{nan_max, Matrix};
pub use multiplier::{worker_pool, Blocked, Multiplier, ParallelBlocked, ParallelVanilla, Vanilla};
pub use plan::{build_plan, operand_grids, MultiplicationPlan, TilePlan};
pub use shape::Shape;
pub use tiling::{compute_tiles, tile_count, TileBounds, TileGrid, TileSize};
