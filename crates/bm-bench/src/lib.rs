//! `bm-bench` - Command-line timing harness for block-matmul.
//!
//! Fills two random operands, prints their tiling, and times the block
//! multipliers against the untiled baselines, checking every result against
//! the vanilla product.

pub mod config;
pub mod error;
pub mod format;
pub mod timing;

use std::io::Write;
use std::time::{Duration, Instant};

use bm_matrix::{
    build_plan, multiply, multiply_parallel, multiply_parallel_in, nan_max, worker_pool, Matrix,
    Multiplier, ParallelVanilla, Vanilla,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

pub use config::{BenchConfig, Command, USAGE};
pub use error::{BenchError, Result};
pub use timing::{timed, Timing};

/// Timings collected by [`run`].
#[derive(Debug, Clone)]
pub struct Report {
    /// Time spent deriving the tile grids.
    pub plan_time: Duration,
    pub timings: Vec<Timing>,
}

impl Report {
    /// Largest deviation from the vanilla product over all strategies, NaN
    /// if any strategy produced NaN where the reference did not.
    pub fn max_abs_diff(&self) -> f32 {
        self.timings
            .iter()
            .map(|t| t.max_abs_diff)
            .fold(0.0, nan_max)
    }

    /// True when every strategy reproduced the vanilla product exactly.
    pub fn is_exact(&self) -> bool {
        self.max_abs_diff() == 0.0
    }
}

/// Run every strategy once on random operands described by `config`,
/// writing progress and results to `out`.
pub fn run(config: &BenchConfig, out: &mut dyn Write) -> Result<Report> {
    info!(?config, "starting benchmark");
    let pool = config.threads.map(worker_pool).transpose()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let a = Matrix::random(config.m, config.n, config.max_value, &mut rng);
    let b = Matrix::random(config.n, config.q, config.max_value, &mut rng);
    let mut c = Matrix::zeros(config.m, config.q);

    let (row_tile, col_tile) = (config.row_tile(), config.col_tile());
    if config.print_len > 0 {
        write!(out, "{}", format::render_matrix("A", &a, row_tile, col_tile, config.print_len))?;
        // B's rows share A's column tiling; its columns use the row tile.
        write!(out, "{}", format::render_matrix("B", &b, col_tile, row_tile, config.print_len))?;
    }

    let mut timings = Vec::new();

    let vanilla: [Box<dyn Multiplier>; 2] = [
        Box::new(Vanilla),
        Box::new(match &pool {
            Some(pool) => ParallelVanilla::with_pool(pool.clone()),
            None => ParallelVanilla::new(),
        }),
    ];
    let mut reference = None;
    for m in &vanilla {
        writeln!(out, "running {}", m.name())?;
        let (res, elapsed) = timed(|| m.multiply(&a, &b, &mut c));
        res?;
        let reference = reference.get_or_insert_with(|| c.clone());
        timings.push(Timing {
            name: m.name().to_string(),
            elapsed,
            max_abs_diff: c.max_abs_diff(reference),
        });
    }
    let reference = reference.unwrap_or_else(|| c.clone());

    c.fill_zero();
    let start = Instant::now();
    let mut plan = build_plan(&a, &b, &mut c, row_tile, col_tile)?;
    let plan_time = start.elapsed();
    writeln!(
        out,
        "planned {}x{} left tiles, {}x{} right tiles in {:.3} ms",
        plan.left_tiles().rows(),
        plan.left_tiles().cols(),
        plan.right_tiles().rows(),
        plan.right_tiles().cols(),
        plan_time.as_secs_f64() * 1e3
    )?;
    if config.print_len > 0 {
        write!(out, "{}", format::render_tile_grid("A", plan.left_tiles(), config.print_len))?;
        write!(out, "{}", format::render_tile_grid("B", plan.right_tiles(), config.print_len))?;
    }

    writeln!(out, "running block")?;
    let ((), elapsed) = timed(|| multiply(&mut plan));
    timings.push(Timing {
        name: "block".to_string(),
        elapsed,
        max_abs_diff: plan.result().max_abs_diff(&reference),
    });

    plan.clear_result();
    writeln!(out, "running block-par")?;
    let ((), elapsed) = timed(|| match &pool {
        Some(pool) => multiply_parallel_in(&mut plan, pool),
        None => multiply_parallel(&mut plan),
    });
    timings.push(Timing {
        name: "block-par".to_string(),
        elapsed,
        max_abs_diff: plan.result().max_abs_diff(&reference),
    });

    for t in &timings {
        writeln!(out, "{}", t)?;
    }
    info!(plan_ms = plan_time.as_secs_f64() * 1e3, "benchmark finished");

    Ok(Report {
        plan_time,
        timings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> BenchConfig {
        BenchConfig {
            m: 4,
            n: 3,
            q: 5,
            row_split: 2,
            col_split: 2,
            threads: Some(2),
            ..BenchConfig::default()
        }
    }

    #[test]
    fn test_run_small() {
        let mut out = Vec::new();
        let report = run(&small(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let names: Vec<&str> = report.timings.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["vanilla", "vanilla-par", "block", "block-par"]);
        assert_eq!(report.max_abs_diff(), 0.0);
        assert!(text.contains("matrix A [4x3]"));
        assert!(text.contains("matrix B [3x5]"));
        assert!(text.contains("planned 2x2 left tiles, 2x3 right tiles"));
        assert!(text.contains("tile grid B [2x3]"));
        assert!(text.contains("B1,2[2..3, 4..5] "));
    }

    #[test]
    fn test_run_without_tiling_or_printing() {
        let config = BenchConfig {
            row_split: 0,
            col_split: -1,
            print_len: 0,
            threads: None,
            ..small()
        };
        let mut out = Vec::new();
        let report = run(&config, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("matrix A"));
        assert!(text.contains("planned 1x1 left tiles, 1x1 right tiles"));
        assert_eq!(report.max_abs_diff(), 0.0);
    }

    #[test]
    fn test_report_flags_nan_result() {
        let timing = |name: &str, diff: f32| Timing {
            name: name.to_string(),
            elapsed: Duration::from_millis(1),
            max_abs_diff: diff,
        };
        let report = Report {
            plan_time: Duration::ZERO,
            timings: vec![timing("vanilla", 0.0), timing("block", f32::NAN), timing("block-par", 0.0)],
        };
        assert!(report.max_abs_diff().is_nan());
        assert!(!report.is_exact());

        let exact = Report {
            plan_time: Duration::ZERO,
            timings: vec![timing("vanilla", 0.0), timing("block", 0.0)],
        };
        assert!(exact.is_exact());
    }
}
