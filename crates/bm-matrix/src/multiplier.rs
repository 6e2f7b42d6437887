use std::fmt::Debug;
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, instrument};

use crate::baseline::{vanilla_mul, vanilla_mul_parallel};
use crate::block::{multiply, multiply_parallel};
use crate::error::Result;
use crate::matrix::Matrix;
use crate::plan::build_plan;
use crate::tiling::TileSize;

/// Build a fixed-size worker pool for the parallel multipliers.
pub fn worker_pool(threads: usize) -> Result<Arc<ThreadPool>> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("bm-worker-{}", i))
        .build()?;
    debug!(threads = pool.current_num_threads(), "built worker pool");
    Ok(Arc::new(pool))
}

fn run_on<R: Send>(pool: Option<&ThreadPool>, f: impl FnOnce() -> R + Send) -> R {
    match pool {
        Some(pool) => pool.install(f),
        None => f(),
    }
}

/// A complete `result = left @ right` strategy.
///
/// Every implementation leaves the full product in `result`, zeroing it
/// first where the underlying kernel only accumulates.
pub trait Multiplier: Send + Sync + Debug {
    /// Short identifier used in reports (e.g. "block", "vanilla-par").
    fn name(&self) -> &str;

    /// Compute `left @ right` into `result`.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` if the shapes are incompatible.
    fn multiply(&self, left: &Matrix, right: &Matrix, result: &mut Matrix) -> Result<()>;
}

/// Untiled triple loop.
#[derive(Debug, Clone, Default)]
pub struct Vanilla;

impl Multiplier for Vanilla {
    fn name(&self) -> &str {
        "vanilla"
    }

    #[instrument(skip_all, name = "vanilla")]
    fn multiply(&self, left: &Matrix, right: &Matrix, result: &mut Matrix) -> Result<()> {
        vanilla_mul(left, right, result)
    }
}

/// Untiled triple loop, parallel over result rows.
#[derive(Debug, Clone, Default)]
pub struct ParallelVanilla {
    pool: Option<Arc<ThreadPool>>,
}

impl ParallelVanilla {
    /// Run on the global rayon pool.
    pub fn new() -> Self {
        Self { pool: None }
    }

    /// Run on a dedicated pool.
    pub fn with_pool(pool: Arc<ThreadPool>) -> Self {
        Self { pool: Some(pool) }
    }
}

impl Multiplier for ParallelVanilla {
    fn name(&self) -> &str {
        "vanilla-par"
    }

    #[instrument(skip_all, name = "vanilla_par")]
    fn multiply(&self, left: &Matrix, right: &Matrix, result: &mut Matrix) -> Result<()> {
        run_on(self.pool.as_deref(), || vanilla_mul_parallel(left, right, result))
    }
}

/// Sequential tiled multiplication with a fixed pair of tile sizes.
#[derive(Debug, Clone)]
pub struct Blocked {
    row_tile: TileSize,
    col_tile: TileSize,
}

impl Blocked {
    pub fn new(row_tile: TileSize, col_tile: TileSize) -> Self {
        Self { row_tile, col_tile }
    }
}

impl Multiplier for Blocked {
    fn name(&self) -> &str {
        "block"
    }

    #[instrument(skip_all, name = "block")]
    fn multiply(&self, left: &Matrix, right: &Matrix, result: &mut Matrix) -> Result<()> {
        let mut plan = build_plan(left, right, result, self.row_tile, self.col_tile)?;
        plan.clear_result();
        multiply(&mut plan);
        Ok(())
    }
}

/// Tiled multiplication with right tile columns spread across workers.
#[derive(Debug, Clone)]
pub struct ParallelBlocked {
    row_tile: TileSize,
    col_tile: TileSize,
    pool: Option<Arc<ThreadPool>>,
}

impl ParallelBlocked {
    /// Run on the global rayon pool.
    pub fn new(row_tile: TileSize, col_tile: TileSize) -> Self {
        Self {
            row_tile,
            col_tile,
            pool: None,
        }
    }

    /// Run on a dedicated pool.
    pub fn with_pool(row_tile: TileSize, col_tile: TileSize, pool: Arc<ThreadPool>) -> Self {
        Self {
            row_tile,
            col_tile,
            pool: Some(pool),
        }
    }
}

impl Multiplier for ParallelBlocked {
    fn name(&self) -> &str {
        "block-par"
    }

    #[instrument(skip_all, name = "block_par")]
    fn multiply(&self, left: &Matrix, right: &Matrix, result: &mut Matrix) -> Result<()> {
        let mut plan = build_plan(left, right, result, self.row_tile, self.col_tile)?;
        plan.clear_result();
        run_on(self.pool.as_deref(), || multiply_parallel(&mut plan));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all(pool: Arc<ThreadPool>) -> Vec<Box<dyn Multiplier>> {
        vec![
            Box::new(Vanilla),
            Box::new(ParallelVanilla::with_pool(pool.clone())),
            Box::new(Blocked::new(TileSize::new(2), TileSize::new(3))),
            Box::new(ParallelBlocked::with_pool(TileSize::new(2), TileSize::new(3), pool)),
        ]
    }

    #[test]
    fn test_all_multipliers_agree() {
        let pool = worker_pool(2).unwrap();
        let a = Matrix::from_fn(7, 5, |r, c| (r * 5 + c) as f32);
        let b = Matrix::from_fn(5, 6, |r, c| (r * 6 + c) as f32);
        let mut expected = Matrix::zeros(7, 6);
        vanilla_mul(&a, &b, &mut expected).unwrap();

        for m in all(pool) {
            // Start from garbage to check the result is fully overwritten.
            let mut c = Matrix::new(7, 6, vec![-1.0; 42]);
            m.multiply(&a, &b, &mut c).unwrap();
            assert_eq!(c, expected, "{} disagrees with vanilla", m.name());
        }
    }

    #[test]
    fn test_all_multipliers_reject_mismatch() {
        let pool = worker_pool(2).unwrap();
        let a = Matrix::zeros(3, 4);
        let b = Matrix::zeros(3, 4);
        let mut c = Matrix::zeros(3, 4);
        for m in all(pool) {
            assert!(m.multiply(&a, &b, &mut c).is_err(), "{}", m.name());
        }
    }

    #[test]
    fn test_names_are_distinct() {
        let pool = worker_pool(1).unwrap();
        let mut names: Vec<String> = all(pool).iter().map(|m| m.name().to_string()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_global_pool_variants() {
        let a = Matrix::from_fn(4, 4, |r, c| (r * 4 + c) as f32);
        let mut c1 = Matrix::zeros(4, 4);
        let mut c2 = Matrix::zeros(4, 4);
        ParallelVanilla::new().multiply(&a, &a, &mut c1).unwrap();
        ParallelBlocked::new(TileSize::new(2), TileSize::Whole)
            .multiply(&a, &a, &mut c2)
            .unwrap();
        assert_eq!(c1, c2);
        assert_eq!(c1.get(3, 3), 506.0);
    }
}
